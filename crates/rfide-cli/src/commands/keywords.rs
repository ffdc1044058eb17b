// RFIDE - Robot Framework IDE core
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Namespace queries - keywords and variables visible in a file

use super::open_single;
use crate::error::CliError;
use colored::Colorize;
use rfide_core::names::normalize;
use rfide_namespace::{KeywordInfo, KeywordSource, Resolution, VariableValue};
use rfide_project::Project;

fn source_label(source: &KeywordSource) -> String {
    match source {
        KeywordSource::CurrentFile => "<this file>".to_string(),
        KeywordSource::Resource(path) => path.display().to_string(),
        KeywordSource::Library(name) => name.clone(),
    }
}

fn print_keyword(kw: &KeywordInfo) {
    let args = if kw.args.is_empty() {
        String::new()
    } else {
        format!("  [{}]", kw.args.join(" | "))
    };
    println!("{}  {}{}", kw.name.bold(), source_label(&kw.source).dimmed(), args);
}

/// List the keywords visible in `file`, optionally only those whose
/// normalized name starts with `prefix`.
pub fn keywords(project: &mut Project, file: &str, prefix: Option<&str>) -> Result<(), CliError> {
    let id = open_single(project, file)?;
    let scope = project
        .scope(id)
        .ok_or_else(|| CliError::invalid_input(format!("'{}' is not open", file)))?;
    let wanted = prefix.map(normalize).unwrap_or_default();
    let mut shown = 0;
    for kw in project.namespace().keywords(&scope) {
        if normalize(&kw.name).starts_with(&wanted) {
            print_keyword(&kw);
            shown += 1;
        }
    }
    tracing::debug!(file, shown, "Listed keywords");
    Ok(())
}

/// Resolve a keyword name as a call in `file` would.
///
/// # Errors
///
/// Returns [`CliError::Unresolved`] if the name matches no keyword or
/// several.
pub fn resolve(project: &mut Project, file: &str, name: &str) -> Result<(), CliError> {
    let id = open_single(project, file)?;
    let controller = project
        .file(id)
        .ok_or_else(|| CliError::invalid_input(format!("'{}' is not open", file)))?;
    match controller.resolve(name) {
        Resolution::Keyword(kw) => {
            print_keyword(&kw);
            if !kw.doc.is_empty() {
                println!("  {}", kw.doc.lines().next().unwrap_or_default());
            }
            Ok(())
        }
        Resolution::Ambiguous(candidates) => {
            for kw in &candidates {
                print_keyword(kw);
            }
            Err(CliError::Unresolved(format!(
                "Multiple keywords with name '{}' found",
                name
            )))
        }
        Resolution::NotFound => Err(CliError::Unresolved(format!(
            "No keyword with name '{}' found",
            name
        ))),
    }
}

fn value_text(value: &VariableValue) -> String {
    match value {
        VariableValue::Value(v) => v.repr(),
        VariableValue::Cells(cells) => cells.join("    "),
        VariableValue::Unknown => "<unknown>".to_string(),
    }
}

/// List the variables visible at file level in `file`.
pub fn variables(project: &mut Project, file: &str) -> Result<(), CliError> {
    let id = open_single(project, file)?;
    let controller = project
        .file(id)
        .ok_or_else(|| CliError::invalid_input(format!("'{}' is not open", file)))?;
    for var in controller.variables_in_scope(None) {
        println!(
            "{} = {}  {}",
            var.name.bold(),
            value_text(&var.value),
            var.source.label().dimmed()
        );
    }
    Ok(())
}

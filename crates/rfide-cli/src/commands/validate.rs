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

//! Validate command - parse files and resolve their imports, keywords and
//! variables

use crate::error::CliError;
use colored::Colorize;
use rayon::prelude::*;
use rfide_core::{Diagnostic, Severity};
use rfide_project::{Project, ProjectConfig};
use std::path::PathBuf;
use tracing::debug;

/// Diagnostics of one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub tests: usize,
    pub keywords: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    /// Diagnostics that fail validation. With `strict`, warnings count too.
    pub fn problems(&self, strict: bool) -> usize {
        let floor = if strict { Severity::Warning } else { Severity::Error };
        self.diagnostics.iter().filter(|d| d.severity() >= floor).count()
    }
}

fn check_path(path: &str, config: ProjectConfig) -> Result<Vec<FileReport>, CliError> {
    let mut project = Project::new(config)?;
    let ids = project.open_suite(path)?;
    let mut reports = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(file) = project.file(id) else {
            continue;
        };
        file.await_imports();
        let data = file.data();
        reports.push(FileReport {
            path: data.source.clone().unwrap_or_else(|| PathBuf::from(path)),
            tests: data.tests.items.len(),
            keywords: data.keywords.items.len(),
            diagnostics: file.diagnostics(),
        });
    }
    debug!(path, files = reports.len(), "Validated");
    Ok(reports)
}

/// Validate files and directory suites.
///
/// Parses every file, loads its imports and reports unknown settings,
/// failed imports, unresolved variables and keywords that resolve to
/// nothing or to several candidates. Paths are checked in parallel when
/// `parallel` is set.
///
/// # Errors
///
/// Returns [`CliError::Diagnostics`] if any file has an error, or a warning
/// in `strict` mode.
///
/// # Examples
///
/// ```no_run
/// use rfide_cli::commands::validate;
/// use rfide_project::ProjectConfig;
///
/// # fn main() -> Result<(), rfide_cli::error::CliError> {
/// let paths = vec!["tests/".to_string()];
/// validate(&paths, &ProjectConfig::new(), false, true)?;
/// # Ok(())
/// # }
/// ```
pub fn validate(
    paths: &[String],
    config: &ProjectConfig,
    strict: bool,
    parallel: bool,
) -> Result<Vec<FileReport>, CliError> {
    let results: Vec<Result<Vec<FileReport>, CliError>> = if parallel {
        paths.par_iter().map(|p| check_path(p, config.clone())).collect()
    } else {
        paths.iter().map(|p| check_path(p, config.clone())).collect()
    };

    let mut reports = Vec::new();
    for result in results {
        reports.extend(result?);
    }

    let mut failed_files = 0;
    let mut problems = 0;
    for report in &reports {
        let count = report.problems(strict);
        if count == 0 {
            println!("{} {}", "✓".green().bold(), report.path.display());
        } else {
            failed_files += 1;
            problems += count;
            println!("{} {}", "✗".red().bold(), report.path.display());
        }
        println!("  Tests: {}", report.tests);
        println!("  Keywords: {}", report.keywords);
        for diag in &report.diagnostics {
            let label = match diag.severity() {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
                Severity::Hint => "hint".cyan(),
            };
            let line = diag.line().map(|l| format!("{}: ", l)).unwrap_or_default();
            println!("  {}{}[{}]: {}", line, label, diag.kind().code(), diag.message());
        }
    }

    if problems > 0 {
        return Err(CliError::Diagnostics {
            files: failed_files,
            count: problems,
        });
    }
    Ok(reports)
}

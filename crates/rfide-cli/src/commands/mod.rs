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

//! CLI command implementations

mod completion;
mod format;
mod keywords;
mod run_args;
mod validate;

pub use completion::{generate_completion_for_command, print_installation_instructions};
pub use format::{format, FormatOptions};
pub use keywords::{keywords, resolve, variables};
pub use run_args::{run_args, RunArgsOptions};
pub use validate::{validate, FileReport};

use crate::error::CliError;
use rfide_core::ParseOptions;
use rfide_namespace::FileId;
use rfide_project::{ExcludeList, Project, ProjectConfig, Settings};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Settings from `path`, or the defaults.
pub fn load_settings(path: Option<&str>) -> Result<Settings, CliError> {
    match path {
        Some(path) => Ok(Settings::load(path)?),
        None => Ok(Settings::new()),
    }
}

/// Project configuration from the settings, with an optional exclude list.
pub fn project_config(settings: &Settings, excludes: Option<&str>) -> Result<ProjectConfig, CliError> {
    let mut parse = ParseOptions::builder();
    if let Some(path) = excludes {
        let list = ExcludeList::load(path)?;
        debug!(path, patterns = list.len(), "Loaded exclude list");
        parse = parse.exclude(Arc::new(list));
    }
    Ok(ProjectConfig::new()
        .with_namespace(settings.namespace_config()?)
        .with_parse_options(parse.build())
        .with_writer(settings.writer_config()?))
}

pub fn new_project(settings: &Settings, excludes: Option<&str>) -> Result<Project, CliError> {
    Ok(Project::new(project_config(settings, excludes)?)?)
}

/// Open one file and wait for its imports.
pub fn open_single(project: &mut Project, path: &str) -> Result<FileId, CliError> {
    let id = project.open_file(path)?;
    if let Some(file) = project.file(id) {
        file.await_imports();
    }
    Ok(id)
}

/// Write output to a file or stdout.
pub fn write_output(content: &str, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => fs::write(path, content).map_err(|e| CliError::io_error(path, e)),
        None => io::stdout()
            .write_all(content.as_bytes())
            .map_err(|e| CliError::io_error("<stdout>", e)),
    }
}

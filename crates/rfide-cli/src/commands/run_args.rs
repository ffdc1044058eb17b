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

//! Run-args command - print the Robot Framework command line for a run

use super::write_output;
use crate::error::CliError;
use rfide_project::{Listener, RunCommand, RunProfile, Selection, Settings};
use std::path::PathBuf;

/// Options of the run-args command.
#[derive(Debug, Clone, Default)]
pub struct RunArgsOptions {
    /// Suite file or directory to run.
    pub source: PathBuf,
    /// Long names of suites to run.
    pub suites: Vec<String>,
    /// Long names of tests to run, such as `Root.Login.Valid Login`.
    pub tests: Vec<String>,
    /// Listener module; the port comes from `--port` or the settings.
    pub listener: Option<String>,
    pub port: Option<u16>,
    pub pause_on_failure: bool,
    /// Argument file receiving the profile arguments.
    pub argument_file: Option<PathBuf>,
}

fn selection_for_test(long_name: &str) -> Result<Selection, CliError> {
    match long_name.rsplit_once('.') {
        Some((suite, test)) if !suite.is_empty() && !test.is_empty() => {
            Ok(Selection::test(suite, test))
        }
        _ => Err(CliError::invalid_input(format!(
            "Test '{}' is not a long name like Suite.Test",
            long_name
        ))),
    }
}

fn listener(settings: &Settings, options: &RunArgsOptions) -> Result<Option<Listener>, CliError> {
    let Some(module) = &options.listener else {
        return Ok(None);
    };
    let configured = RunProfile::listener_from_settings(settings, module)?;
    let listener = match (options.port, configured) {
        (Some(port), _) => Listener::new(module.as_str(), port),
        (None, Some(listener)) => listener,
        (None, None) => {
            return Err(CliError::invalid_input(
                "A listener needs a port from --port or the settings",
            ))
        }
    };
    let pause = options.pause_on_failure || listener.pause_on_failure;
    Ok(Some(listener.with_pause_on_failure(pause)))
}

/// Build the run command for `options`.
pub fn build_run_command(settings: &Settings, options: &RunArgsOptions) -> Result<RunCommand, CliError> {
    let mut command = RunCommand::new(RunProfile::from_settings(settings)?, &options.source);
    if let Some(path) = &options.argument_file {
        command = command.with_argument_file(path);
    }
    if let Some(listener) = listener(settings, options)? {
        command = command.with_listener(listener);
    }
    for suite in &options.suites {
        command = command.select(Selection::suite(suite.as_str()));
    }
    for test in &options.tests {
        command = command.select(selection_for_test(test)?);
    }
    Ok(command)
}

/// Print the command line, one argument per line, and write the argument
/// file if one was requested.
pub fn run_args(settings: &Settings, options: &RunArgsOptions) -> Result<(), CliError> {
    let command = build_run_command(settings, options)?;
    command.write_argument_file()?;
    let mut text = command.argv().join("\n");
    text.push('\n');
    write_output(&text, None)
}

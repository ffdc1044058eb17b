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

//! CLI command definitions and argument parsing.
//!
//! Commands are grouped by what they work on:
//!
//! - [`core`]: commands on test data files (validate, format)
//! - [`project`]: namespace queries and run command lines (keywords,
//!   resolve, variables, run-args)
//! - [`utility`]: shell completion
//!
//! All groups are flattened so every command appears at the top level.

mod core;
mod project;
mod utility;

use crate::commands;
use crate::error::CliError;
use clap::{Args, Parser, Subcommand};
use rfide_project::{Project, ProjectConfig, Settings};

pub use core::CoreCommands;
pub use project::ProjectCommands;
pub use utility::UtilityCommands;

/// RFIDE - Robot Framework test data toolkit
///
/// Validate, format and convert test data, query the keywords and variables
/// a file sees, and build test runner command lines.
///
/// # Examples
///
/// ```bash
/// # Validate a suite directory
/// rfide validate tests/ --strict
///
/// # Convert a TSV file to the space separated format
/// rfide format login.tsv --to robot --output login.robot
///
/// # Which keyword does a call resolve to?
/// rfide resolve tests/login.robot "Open Browser To Login Page"
/// ```
#[derive(Parser)]
#[command(name = "rfide")]
#[command(author, version, about = "RFIDE - Robot Framework test data toolkit", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Settings and exclusions shared by the commands that open a project.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Settings file (INI with Python literal values)
    #[arg(long, value_name = "FILE")]
    pub settings: Option<String>,

    /// File with paths to leave out of directory suites, one per line
    #[arg(long, value_name = "FILE")]
    pub exclude: Option<String>,
}

impl ProjectArgs {
    pub fn settings(&self) -> Result<Settings, CliError> {
        commands::load_settings(self.settings.as_deref())
    }

    pub fn config(&self) -> Result<ProjectConfig, CliError> {
        commands::project_config(&self.settings()?, self.exclude.as_deref())
    }

    pub fn project(&self) -> Result<Project, CliError> {
        commands::new_project(&self.settings()?, self.exclude.as_deref())
    }
}

/// Top-level commands.
///
/// ```text
/// Commands
/// ├── Core (validate, format)
/// ├── Project (keywords, resolve, variables, run-args)
/// └── Utility (completion)
/// ```
#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Core(CoreCommands),

    #[command(flatten)]
    Project(ProjectCommands),

    #[command(flatten)]
    Utility(UtilityCommands),
}

impl Commands {
    /// Run the command.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a file cannot be read or written, the settings are
    /// invalid, or the command reports problems in the test data.
    pub fn execute(self) -> Result<(), CliError> {
        match self {
            Commands::Core(cmd) => cmd.execute(),
            Commands::Project(cmd) => cmd.execute(),
            Commands::Utility(cmd) => cmd.execute(),
        }
    }
}

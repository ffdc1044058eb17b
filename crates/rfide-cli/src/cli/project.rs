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

//! Namespace queries and test runner command lines.

use super::ProjectArgs;
use crate::commands::{self, RunArgsOptions};
use crate::error::CliError;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// List the keywords a file can call
    Keywords {
        #[arg(value_name = "FILE")]
        file: String,

        /// Only keywords whose normalized name starts with this
        #[arg(short = 'x', long)]
        prefix: Option<String>,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Show which keyword a call in a file resolves to
    Resolve {
        #[arg(value_name = "FILE")]
        file: String,

        /// Keyword name as written in a step, optionally qualified
        #[arg(value_name = "NAME")]
        name: String,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// List the variables a file can use
    Variables {
        #[arg(value_name = "FILE")]
        file: String,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Print the Robot Framework command line for a run
    RunArgs {
        /// Suite file or directory to run
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Suite long name to run (repeatable)
        #[arg(long = "suite")]
        suites: Vec<String>,

        /// Test long name to run, like Suite.Test (repeatable)
        #[arg(long = "test")]
        tests: Vec<String>,

        /// Listener module reporting progress back
        #[arg(long)]
        listener: Option<String>,

        /// Listener port (defaults to the settings)
        #[arg(long)]
        port: Option<u16>,

        /// Pause the run on the first failure
        #[arg(long)]
        pause_on_failure: bool,

        /// Write the configured arguments to this argument file
        #[arg(long, value_name = "FILE")]
        argument_file: Option<PathBuf>,

        #[command(flatten)]
        project: ProjectArgs,
    },
}

impl ProjectCommands {
    pub fn execute(self) -> Result<(), CliError> {
        match self {
            ProjectCommands::Keywords {
                file,
                prefix,
                project,
            } => commands::keywords(&mut project.project()?, &file, prefix.as_deref()),
            ProjectCommands::Resolve {
                file,
                name,
                project,
            } => commands::resolve(&mut project.project()?, &file, &name),
            ProjectCommands::Variables { file, project } => {
                commands::variables(&mut project.project()?, &file)
            }
            ProjectCommands::RunArgs {
                source,
                suites,
                tests,
                listener,
                port,
                pause_on_failure,
                argument_file,
                project,
            } => {
                let options = RunArgsOptions {
                    source,
                    suites,
                    tests,
                    listener,
                    port,
                    pause_on_failure,
                    argument_file,
                };
                commands::run_args(&project.settings()?, &options)
            }
        }
    }
}

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

//! Commands on test data files.

use super::ProjectArgs;
use crate::commands::{self, FormatOptions};
use crate::error::CliError;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum CoreCommands {
    /// Validate test data files and directory suites
    ///
    /// Parses every file, loads its imports and reports unknown settings,
    /// failed imports, unknown variables and keyword calls that resolve to
    /// no keyword or to several.
    Validate {
        /// Files or directories
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,

        /// Fail on warnings too
        #[arg(short, long)]
        strict: bool,

        /// Check paths in parallel
        #[arg(short, long)]
        parallel: bool,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Rewrite a test data file in a normalized layout or another format
    Format {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: String,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target format: robot, txt, tsv, html or rest
        #[arg(short, long)]
        to: Option<String>,

        /// Check only (exit 1 if the file would change)
        #[arg(short, long)]
        check: bool,

        /// Spaces between cells in the space separated format
        #[arg(long)]
        separator_width: Option<usize>,

        /// Cells per row before wrapping with `...`
        #[arg(long)]
        max_cells: Option<usize>,

        /// Write the pipe separated dialect
        #[arg(long)]
        pipes: bool,

        #[command(flatten)]
        project: ProjectArgs,
    },
}

impl CoreCommands {
    pub fn execute(self) -> Result<(), CliError> {
        match self {
            CoreCommands::Validate {
                paths,
                strict,
                parallel,
                project,
            } => commands::validate(&paths, &project.config()?, strict, parallel).map(|_| ()),
            CoreCommands::Format {
                file,
                output,
                to,
                check,
                separator_width,
                max_cells,
                pipes,
                project,
            } => {
                let options = FormatOptions {
                    output,
                    to,
                    check,
                    separator_width,
                    max_cells,
                    pipes,
                };
                commands::format(&file, &options, project.settings()?.writer_config()?)
            }
        }
    }
}

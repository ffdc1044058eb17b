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

//! RFIDE command line library.
//!
//! The `rfide` binary is a thin wrapper over this crate: [`cli`] holds the
//! clap definitions and [`commands`] the implementations, which can also be
//! called directly.
//!
//! # Commands
//!
//! - **validate**: parse files and suites, load imports and report problems
//! - **format**: rewrite a file in normalized layout or another format
//! - **keywords** / **variables**: what a file can call and use
//! - **resolve**: which keyword a call resolves to
//! - **run-args**: the Robot Framework command line for a run
//! - **completion**: shell completion scripts
//!
//! # Examples
//!
//! ```no_run
//! use rfide_cli::commands::{format, validate, FormatOptions};
//! use rfide_project::ProjectConfig;
//! use rfide_writer::WriterConfig;
//!
//! # fn main() -> Result<(), rfide_cli::error::CliError> {
//! validate(&["tests/".to_string()], &ProjectConfig::new(), true, false)?;
//!
//! let options = FormatOptions { check: true, ..Default::default() };
//! format("tests/login.robot", &options, WriterConfig::default())?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod error;

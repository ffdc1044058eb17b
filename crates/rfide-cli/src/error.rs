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

//! Structured error types for the RFIDE CLI.

use rfide_core::RfError;
use rfide_project::{CommandError, ConfigError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for CLI commands.
///
/// Implements `Clone` so batch validation can collect errors from worker
/// threads.
#[derive(Error, Debug, Clone)]
pub enum CliError {
    /// Reading or writing a file failed.
    #[error("I/O error for '{path}': {message}")]
    Io {
        /// The file path that caused the error
        path: PathBuf,
        /// The error message
        message: String,
    },

    /// Test data could not be read or written.
    #[error("{0}")]
    Data(String),

    /// A project command was rejected.
    #[error("Command failed: {0}")]
    Command(String),

    /// The settings file is invalid.
    #[error("Settings error: {0}")]
    Config(String),

    /// Validation found problems.
    #[error("{files} file(s) with {count} problem(s)")]
    Diagnostics {
        /// Files with at least one reported problem
        files: usize,
        /// Problems reported
        count: usize,
    },

    /// `format --check` found a file that would change.
    #[error("'{0}' is not formatted")]
    NotFormatted(PathBuf),

    /// A keyword name resolved to nothing or to several keywords.
    #[error("{0}")]
    Unresolved(String),

    /// A flag value is not usable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    pub fn io_error(path: impl Into<PathBuf>, err: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl From<RfError> for CliError {
    fn from(err: RfError) -> Self {
        match err.path.clone() {
            Some(path) if err.kind == rfide_core::RfErrorKind::IO => Self::Io {
                path,
                message: err.message,
            },
            _ => Self::Data(err.to_string()),
        }
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Data(inner) => inner.into(),
            other => Self::Command(other.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = CliError::io_error(
            "suite.robot",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        let msg = err.to_string();
        assert!(msg.contains("suite.robot"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn test_diagnostics_display() {
        let err = CliError::Diagnostics { files: 2, count: 5 };
        assert_eq!(err.to_string(), "2 file(s) with 5 problem(s)");
    }

    #[test]
    fn test_rf_io_error_keeps_path() {
        let err: CliError = RfError::io("Cannot open").with_path("/x/a.robot").into();
        assert!(matches!(err, CliError::Io { ref path, .. } if path == &PathBuf::from("/x/a.robot")));
    }

    #[test]
    fn test_command_error_conversion() {
        let err: CliError = CommandError::NothingToUndo.into();
        assert_eq!(err.to_string(), "Command failed: Nothing to undo");
        let err: CliError = CommandError::Data(RfError::data("broken")).into();
        assert!(matches!(err, CliError::Data(_)));
    }

    #[test]
    fn test_error_cloning() {
        let err = CliError::invalid_input("bad port");
        assert_eq!(err.to_string(), err.clone().to_string());
    }
}

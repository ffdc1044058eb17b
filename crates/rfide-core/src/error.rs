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

//! Error types for reading Robot Framework test data.
//!
//! Problems inside a file that was read successfully are reported as
//! [`Diagnostic`](crate::Diagnostic) values attached to the model. The errors
//! in this module are for the cases where no model can be produced at all.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The kind of error that occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RfErrorKind {
    /// The file could not be read or is not test data.
    Data,
    /// A pipe-separated row has no cell separator.
    MalformedRow,
    /// A library, resource or variable file could not be loaded.
    Import,
    /// A variable reference could not be expanded.
    UnresolvedVariable,
    /// A keyword name matched several candidates.
    AmbiguousKeyword,
    /// Output could not be produced.
    Serialization,
    /// Settings are invalid or written by a newer version.
    Config,
    /// Security limit exceeded.
    Security,
    /// I/O error.
    IO,
}

impl fmt::Display for RfErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => write!(f, "DataError"),
            Self::MalformedRow => write!(f, "MalformedRow"),
            Self::Import => write!(f, "ImportError"),
            Self::UnresolvedVariable => write!(f, "UnresolvedVariable"),
            Self::AmbiguousKeyword => write!(f, "AmbiguousKeyword"),
            Self::Serialization => write!(f, "SerializationError"),
            Self::Config => write!(f, "ConfigError"),
            Self::Security => write!(f, "SecurityError"),
            Self::IO => write!(f, "IOError"),
        }
    }
}

/// An error raised while reading, resolving or writing test data.
#[derive(Debug, Clone, Error)]
#[error("{kind} at line {line}: {message}")]
pub struct RfError {
    /// The kind of error.
    pub kind: RfErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Line number (1-based, 0 when not tied to a line).
    pub line: usize,
    /// File the error refers to.
    pub path: Option<PathBuf>,
    /// Additional context.
    pub context: Option<String>,
}

impl RfError {
    /// Create a new error.
    pub fn new(kind: RfErrorKind, message: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            path: None,
            context: None,
        }
    }

    /// Attach the file the error refers to.
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Add context information.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    // Convenience constructors for each error kind
    pub fn data(message: impl Into<String>) -> Self {
        Self::new(RfErrorKind::Data, message, 0)
    }

    pub fn malformed_row(message: impl Into<String>, line: usize) -> Self {
        Self::new(RfErrorKind::MalformedRow, message, line)
    }

    pub fn import(message: impl Into<String>) -> Self {
        Self::new(RfErrorKind::Import, message, 0)
    }

    pub fn unresolved_variable(message: impl Into<String>) -> Self {
        Self::new(RfErrorKind::UnresolvedVariable, message, 0)
    }

    pub fn ambiguous_keyword(message: impl Into<String>) -> Self {
        Self::new(RfErrorKind::AmbiguousKeyword, message, 0)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(RfErrorKind::Serialization, message, 0)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(RfErrorKind::Config, message, 0)
    }

    pub fn security(message: impl Into<String>, line: usize) -> Self {
        Self::new(RfErrorKind::Security, message, line)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(RfErrorKind::IO, message, 0)
    }
}

impl From<std::io::Error> for RfError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

/// Result type for core operations.
pub type RfResult<T> = Result<T, RfError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== RfErrorKind Display tests ====================

    #[test]
    fn test_error_kind_display() {
        assert_eq!(RfErrorKind::Data.to_string(), "DataError");
        assert_eq!(RfErrorKind::Import.to_string(), "ImportError");
        assert_eq!(RfErrorKind::Serialization.to_string(), "SerializationError");
        assert_eq!(RfErrorKind::Config.to_string(), "ConfigError");
    }

    // ==================== RfError tests ====================

    #[test]
    fn test_error_display_includes_line() {
        let err = RfError::malformed_row("no separator", 7);
        assert_eq!(err.to_string(), "MalformedRow at line 7: no separator");
    }

    #[test]
    fn test_error_with_path_and_context() {
        let err = RfError::data("cannot read")
            .with_path("/tmp/x.robot")
            .with_context("opening suite");
        assert_eq!(err.path.as_deref(), Some(Path::new("/tmp/x.robot")));
        assert_eq!(err.context.as_deref(), Some("opening suite"));
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RfError = io.into();
        assert_eq!(err.kind, RfErrorKind::IO);
        assert!(err.message.contains("gone"));
    }
}

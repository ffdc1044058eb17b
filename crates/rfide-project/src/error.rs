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

//! Error types for project operations.

use rfide_core::RfError;
use rfide_namespace::{FileId, ItemRef};
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a command. A failed command leaves the model unchanged.
#[derive(Error, Debug, Clone)]
pub enum CommandError {
    /// The target file is not open in the project.
    #[error("No open file {0:?}")]
    UnknownFile(FileId),

    /// The target test or keyword does not exist.
    #[error("No {item:?} in '{file}'")]
    UnknownItem {
        /// Display name of the file
        file: String,
        /// The missing item
        item: ItemRef,
    },

    /// A row or cell index is outside the table.
    #[error("Row {row} is out of range, the table has {len} rows")]
    RowOutOfRange { row: usize, len: usize },

    /// An item, variable or import index is outside its table.
    #[error("Index {index} is out of range, the table has {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    /// A test, keyword or variable with the name already exists.
    #[error("'{0}' already exists")]
    Duplicate(String),

    /// The command does not apply to its target.
    #[error("Command '{command}' cannot be applied: {reason}")]
    InvalidTarget {
        /// Name of the command
        command: &'static str,
        /// Why the command was rejected
        reason: String,
    },

    /// The undo stack is empty.
    #[error("Nothing to undo")]
    NothingToUndo,

    /// The redo stack is empty.
    #[error("Nothing to redo")]
    NothingToRedo,

    /// The file has no path to save to.
    #[error("'{0}' has no source path")]
    NoSource(String),

    /// Reading, parsing or writing test data failed.
    #[error(transparent)]
    Data(#[from] RfError),
}

impl CommandError {
    pub(crate) fn invalid(command: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            command,
            reason: reason.into(),
        }
    }
}

/// Result type for commands.
pub type CommandResult<T> = Result<T, CommandError>;

/// Failure to read or write persisted settings.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// The settings file could not be read or written.
    #[error("I/O error for '{path}': {message}")]
    Io {
        /// The settings file
        path: PathBuf,
        /// The error message
        message: String,
    },

    /// The settings file is not valid INI.
    #[error("Invalid settings file: {0}")]
    Parse(String),

    /// The settings file was written by a newer version.
    #[error("Settings version {found} is newer than the supported version {supported}")]
    TooNew { found: i64, supported: i64 },

    /// A stored value has the wrong type.
    #[error("Setting '{key}' expected {expected}, found '{found}'")]
    InvalidValue {
        /// Section-qualified key
        key: String,
        /// Expected type name
        expected: &'static str,
        /// Stored text
        found: String,
    },

    /// An exclude pattern is not a valid glob.
    #[error("Invalid exclude pattern '{pattern}': {message}")]
    Pattern {
        /// The rejected pattern
        pattern: String,
        /// The error message
        message: String,
    },
}

impl From<ConfigError> for RfError {
    fn from(err: ConfigError) -> Self {
        RfError::config(err.to_string())
    }
}

/// Result type for settings operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

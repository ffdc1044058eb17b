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

//! Context helpers for errors crossing crate boundaries.
//!
//! ```rust
//! use rfide::{parse, RfResultExt};
//!
//! fn load(path: &str) -> rfide::RfResult<rfide::DataFile> {
//!     let text = std::fs::read_to_string(path)
//!         .with_context(|| format!("reading {}", path))?;
//!     parse(&text).context("while loading the suite")
//! }
//! ```

use crate::RfError;
use std::fmt;

/// Extension trait for adding context to results that fail with an
/// [`RfError`] or an I/O error.
///
/// Context is stored in the error's `context` field; the message is kept.
/// Outer context comes first: `"outer; inner"`.
pub trait RfResultExt<T> {
    /// Add context to an error.
    ///
    /// ```rust
    /// use rfide::{RfError, RfResultExt};
    ///
    /// let result: Result<(), RfError> = Err(RfError::data("bad row"));
    /// let err = result
    ///     .context("in test 'Login'")
    ///     .context("while opening login.robot")
    ///     .unwrap_err();
    /// assert_eq!(
    ///     err.context.as_deref(),
    ///     Some("while opening login.robot; in test 'Login'")
    /// );
    /// ```
    fn context<C>(self, context: C) -> Result<T, RfError>
    where
        C: fmt::Display;

    /// Add context computed only when there is an error.
    fn with_context<C, F>(self, f: F) -> Result<T, RfError>
    where
        C: fmt::Display,
        F: FnOnce() -> C;

    /// Convert the error with `f`. A no-op for results that already hold an
    /// [`RfError`].
    fn map_err_to_rf<F>(self, f: F) -> Result<T, RfError>
    where
        F: FnOnce(Self::ErrorType) -> RfError,
        Self: Sized;

    /// The error type for this Result
    type ErrorType;
}

impl<T> RfResultExt<T> for Result<T, RfError> {
    type ErrorType = RfError;

    fn context<C>(self, context: C) -> Result<T, RfError>
    where
        C: fmt::Display,
    {
        self.map_err(|e| add_context_to_error(e, context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, RfError>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| add_context_to_error(e, f().to_string()))
    }

    fn map_err_to_rf<F>(self, _f: F) -> Result<T, RfError>
    where
        F: FnOnce(Self::ErrorType) -> RfError,
    {
        self
    }
}

impl<T> RfResultExt<T> for Result<T, std::io::Error> {
    type ErrorType = std::io::Error;

    fn context<C>(self, context: C) -> Result<T, RfError>
    where
        C: fmt::Display,
    {
        self.map_err(|e| add_context_to_error(RfError::from(e), context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, RfError>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| add_context_to_error(RfError::from(e), f().to_string()))
    }

    fn map_err_to_rf<F>(self, f: F) -> Result<T, RfError>
    where
        F: FnOnce(Self::ErrorType) -> RfError,
    {
        self.map_err(f)
    }
}

impl<T> RfResultExt<T> for Result<T, rfide_project::CommandError> {
    type ErrorType = rfide_project::CommandError;

    fn context<C>(self, context: C) -> Result<T, RfError>
    where
        C: fmt::Display,
    {
        self.map_err(|e| add_context_to_error(command_error(e), context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, RfError>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| add_context_to_error(command_error(e), f().to_string()))
    }

    fn map_err_to_rf<F>(self, f: F) -> Result<T, RfError>
    where
        F: FnOnce(Self::ErrorType) -> RfError,
    {
        self.map_err(f)
    }
}

/// Data errors pass through; other command failures become data errors
/// carrying the command's message.
fn command_error(error: rfide_project::CommandError) -> RfError {
    match error {
        rfide_project::CommandError::Data(inner) => inner,
        other => RfError::data(other.to_string()),
    }
}

fn add_context_to_error(mut error: RfError, new_context: String) -> RfError {
    if new_context.is_empty() {
        return error;
    }
    error.context = Some(match error.context {
        Some(existing) => format!("{}; {}", new_context, existing),
        None => new_context,
    });
    error
}

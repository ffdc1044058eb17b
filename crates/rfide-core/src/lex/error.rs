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

//! Error type for splitting rows.

use crate::error::RfError;
use thiserror::Error;

/// Errors raised while splitting a row into cells.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LexError {
    /// A `| ` row whose content has no `|` separator after the opening pipe.
    #[error("line {line}: pipe-separated row has no cell separator")]
    MalformedRow { line: usize },

    /// The TSV reader rejected the input.
    #[error("line {line}: invalid TSV data: {message}")]
    Tsv { line: usize, message: String },

    /// The HTML reader rejected the input.
    #[error("line {line}: invalid HTML data: {message}")]
    Html { line: usize, message: String },
}

impl LexError {
    /// Line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            Self::MalformedRow { line } | Self::Tsv { line, .. } | Self::Html { line, .. } => *line,
        }
    }
}

impl From<LexError> for RfError {
    fn from(err: LexError) -> Self {
        let line = err.line();
        match err {
            LexError::MalformedRow { .. } => RfError::malformed_row(err.to_string(), line),
            _ => RfError::new(crate::error::RfErrorKind::Data, err.to_string(), line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RfErrorKind;

    #[test]
    fn test_malformed_row_converts() {
        let err: RfError = LexError::MalformedRow { line: 5 }.into();
        assert_eq!(err.kind, RfErrorKind::MalformedRow);
        assert_eq!(err.line, 5);
    }

    #[test]
    fn test_html_error_message() {
        let err = LexError::Html {
            line: 2,
            message: "unexpected end".into(),
        };
        assert_eq!(err.to_string(), "line 2: invalid HTML data: unexpected end");
    }
}

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

//! Diagnostics attached to parsed files and namespace queries.

use std::path::{Path, PathBuf};

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// Informational hint
    Hint,
    /// Warning - might be an issue
    Warning,
    /// Error - definitely an issue
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hint => write!(f, "hint"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Kind of diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    /// Unreadable file or invalid row
    Parse,
    /// Bytes that were not valid UTF-8
    Encoding,
    /// Setting name not recognised in the table it appears in
    UnknownSetting,
    /// Table header not recognised
    UnknownTable,
    /// Variable, test or keyword defined twice
    DuplicateName,
    /// Variable name or value does not match its sigil
    InvalidVariable,
    /// Library, resource or variable file could not be loaded
    Import,
    /// Variable reference could not be expanded
    UnresolvedVariable,
    /// Keyword name matched several candidates
    AmbiguousKeyword,
    /// Keyword name matched nothing
    UnknownKeyword,
}

impl DiagnosticKind {
    /// Short identifier used in CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Encoding => "encoding",
            Self::UnknownSetting => "unknown-setting",
            Self::UnknownTable => "unknown-table",
            Self::DuplicateName => "duplicate-name",
            Self::InvalidVariable => "invalid-variable",
            Self::Import => "import",
            Self::UnresolvedVariable => "unresolved-variable",
            Self::AmbiguousKeyword => "ambiguous-keyword",
            Self::UnknownKeyword => "unknown-keyword",
        }
    }
}

/// A problem found in test data.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    severity: Severity,
    kind: DiagnosticKind,
    message: String,
    line: Option<usize>,
    source: Option<PathBuf>,
}

impl Diagnostic {
    pub fn new(severity: Severity, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            line: None,
            source: None,
        }
    }

    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, message)
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, kind, message)
    }

    pub fn hint(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Hint, kind, message)
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_source(mut self, source: impl AsRef<Path>) -> Self {
        self.source = Some(source.as_ref().to_path_buf());
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn kind(&self) -> &DiagnosticKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "{}:", source.display())?;
        }
        if let Some(line) = self.line {
            write!(f, "{}: ", line)?;
        } else if self.source.is_some() {
            write!(f, " ")?;
        }
        write!(f, "[{}] {}: {}", self.kind.code(), self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Severity tests ====================

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Hint < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    // ==================== Display tests ====================

    #[test]
    fn test_display_with_line_and_source() {
        let diag = Diagnostic::error(DiagnosticKind::Import, "Resource 'x.robot' does not exist")
            .with_line(3)
            .with_source("suite.robot");
        assert_eq!(
            diag.to_string(),
            "suite.robot:3: [import] error: Resource 'x.robot' does not exist"
        );
    }

    #[test]
    fn test_display_without_location() {
        let diag = Diagnostic::warning(DiagnosticKind::Encoding, "invalid UTF-8 replaced");
        assert_eq!(diag.to_string(), "[encoding] warning: invalid UTF-8 replaced");
        assert!(!diag.is_error());
    }
}

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

//! Data files, directories and suite naming.

use super::items::{KeywordTable, TestCaseTable};
use super::settings::SettingTable;
use super::variables::VariableTable;
use crate::diagnostic::Diagnostic;
use crate::language::Language;
use crate::lex::Dialect;
use std::path::{Path, PathBuf};

/// Source format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    #[default]
    Robot,
    Resource,
    Txt,
    Tsv,
    Html,
}

impl Format {
    /// Format for a file extension (without the dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "robot" => Some(Self::Robot),
            "resource" => Some(Self::Resource),
            "txt" => Some(Self::Txt),
            "tsv" => Some(Self::Tsv),
            "html" | "htm" | "xhtml" => Some(Self::Html),
            _ => None,
        }
    }

    /// Format of a path, or `None` if the extension is not test data.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Robot => "robot",
            Self::Resource => "resource",
            Self::Txt => "txt",
            Self::Tsv => "tsv",
            Self::Html => "html",
        }
    }

    /// True for the space or pipe separated formats.
    pub fn is_plain_text(&self) -> bool {
        matches!(self, Self::Robot | Self::Resource | Self::Txt)
    }
}

/// What a data file is used as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileKind {
    #[default]
    TestCaseFile,
    /// `__init__.*` of a directory suite.
    InitFile,
    Resource,
}

/// Header row of a table, kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableHeader {
    pub cells: Vec<String>,
}

impl TableHeader {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            cells: vec![label.into()],
        }
    }

    /// Standard `*** Label ***` header.
    pub fn standard(label: &str) -> Self {
        Self::new(format!("*** {} ***", label))
    }

    /// Header label without asterisks.
    pub fn label(&self) -> &str {
        self.cells
            .first()
            .map(|c| c.trim_matches(|ch: char| ch == '*' || ch.is_whitespace()))
            .unwrap_or("")
    }
}

/// A `*** Comments ***` table, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommentTable {
    pub header: TableHeader,
    pub rows: Vec<Vec<String>>,
}

/// A parsed test data file.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataFile {
    pub source: Option<PathBuf>,
    pub kind: FileKind,
    pub format: Format,
    pub dialect: Dialect,
    /// Value of the `Language:` marker, if any.
    pub language: Option<String>,
    /// Rows before the first table.
    pub preamble: Vec<Vec<String>>,
    pub settings: SettingTable,
    pub variables: VariableTable,
    pub tests: TestCaseTable,
    pub keywords: KeywordTable,
    pub comment_tables: Vec<CommentTable>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DataFile {
    pub fn new(kind: FileKind, format: Format) -> Self {
        Self {
            kind,
            format,
            ..Self::default()
        }
    }

    /// Empty file bound to a path; format follows the extension.
    pub fn with_source(path: impl AsRef<Path>, kind: FileKind) -> Self {
        let path = path.as_ref();
        Self {
            source: Some(path.to_path_buf()),
            kind,
            format: Format::from_path(path).unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Language used for headers and setting names.
    pub fn language(&self) -> &'static Language {
        self.language
            .as_deref()
            .and_then(Language::from_name)
            .unwrap_or_else(Language::english)
    }

    pub fn is_resource(&self) -> bool {
        self.kind == FileKind::Resource
    }

    /// File name without directories.
    pub fn display_name(&self) -> String {
        self.source
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "<unsaved>".to_string())
    }

    /// Directory containing the file.
    pub fn directory(&self) -> Option<&Path> {
        self.source.as_deref().and_then(Path::parent)
    }

    /// True if the file has no tables and no preamble.
    pub fn is_empty(&self) -> bool {
        self.preamble.is_empty()
            && self.settings.is_empty()
            && self.variables.is_empty()
            && self.tests.is_empty()
            && self.keywords.is_empty()
            && self.comment_tables.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Equality over the content of the file; `source` and `diagnostics` are
/// ignored so a file read back from a new location compares equal.
impl PartialEq for DataFile {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.format == other.format
            && self.dialect == other.dialect
            && self.language == other.language
            && self.preamble == other.preamble
            && self.settings == other.settings
            && self.variables == other.variables
            && self.tests == other.tests
            && self.keywords == other.keywords
            && self.comment_tables == other.comment_tables
    }
}

impl Eq for DataFile {}

/// A directory suite.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestDataDirectory {
    pub source: PathBuf,
    pub init: Option<DataFile>,
    pub children: Vec<Suite>,
}

impl TestDataDirectory {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            init: None,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> String {
        suite_name_from_path(&self.source)
    }

    /// All data files, depth first, init files before children.
    pub fn files(&self) -> Vec<&DataFile> {
        let mut out = Vec::new();
        out.extend(self.init.iter());
        for child in &self.children {
            match child {
                Suite::File(file) => out.push(file),
                Suite::Directory(dir) => out.extend(dir.files()),
            }
        }
        out
    }
}

/// A suite is a test case file or a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Suite {
    File(DataFile),
    Directory(TestDataDirectory),
}

impl Suite {
    pub fn source(&self) -> Option<&Path> {
        match self {
            Suite::File(file) => file.source.as_deref(),
            Suite::Directory(dir) => Some(&dir.source),
        }
    }

    pub fn name(&self) -> String {
        self.source().map(suite_name_from_path).unwrap_or_default()
    }
}

/// Suite name derived from a file or directory name.
///
/// The extension and an ordering prefix (`01__`) are dropped, underscores
/// become spaces, and all-lowercase words are title-cased.
///
/// ```
/// use rfide_core::model::suite_name_from_path;
/// use std::path::Path;
///
/// assert_eq!(suite_name_from_path(Path::new("/x/01__my_tests.robot")), "My Tests");
/// assert_eq!(suite_name_from_path(Path::new("/x/API tests")), "API Tests");
/// ```
pub fn suite_name_from_path(path: &Path) -> String {
    let base = if path.is_dir() || Format::from_path(path).is_none() {
        path.file_name()
    } else {
        path.file_stem()
    };
    let base = base.map(|b| b.to_string_lossy().into_owned()).unwrap_or_default();
    let unprefixed = match base.split_once("__") {
        Some((_, rest)) if !rest.is_empty() => Some(rest.to_string()),
        _ => None,
    };
    let base = unprefixed.unwrap_or(base);
    base.replace('_', " ")
        .split(' ')
        .map(|word| {
            if word.chars().any(char::is_uppercase) {
                word.to_string()
            } else {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Format tests ====================

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a.robot")), Some(Format::Robot));
        assert_eq!(Format::from_path(Path::new("a.RESOURCE")), Some(Format::Resource));
        assert_eq!(Format::from_path(Path::new("a.xhtml")), Some(Format::Html));
        assert_eq!(Format::from_path(Path::new("a.py")), None);
        assert!(Format::Txt.is_plain_text());
        assert!(!Format::Tsv.is_plain_text());
    }

    // ==================== DataFile tests ====================

    #[test]
    fn test_equality_ignores_source_and_diagnostics() {
        let mut a = DataFile::with_source("/a/x.robot", FileKind::TestCaseFile);
        let b = DataFile::with_source("/b/x.robot", FileKind::TestCaseFile);
        a.diagnostics.push(Diagnostic::hint(
            crate::diagnostic::DiagnosticKind::Parse,
            "x",
        ));
        assert_eq!(a, b);
    }

    #[test]
    fn test_language_default() {
        let mut file = DataFile::default();
        assert_eq!(file.language().code(), "en");
        file.language = Some("Finnish".into());
        assert_eq!(file.language().code(), "fi");
    }

    #[test]
    fn test_table_header_label() {
        assert_eq!(TableHeader::new("*** Test Cases ***").label(), "Test Cases");
        assert_eq!(TableHeader::new("*Setting*").label(), "Setting");
    }

    // ==================== Suite name tests ====================

    #[test]
    fn test_suite_names() {
        assert_eq!(suite_name_from_path(Path::new("login_tests.robot")), "Login Tests");
        assert_eq!(suite_name_from_path(Path::new("02__Smoke.txt")), "Smoke");
        assert_eq!(suite_name_from_path(Path::new("my.suite.robot")), "My.suite");
    }
}

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

//! Reading test data into the model.
//!
//! Parsing runs in phases:
//!
//! 1. preprocess bytes (BOM, line endings, lenient UTF-8)
//! 2. tokenize rows for the file's format
//! 3. pick the language from `Language:` markers before the first table
//! 4. split rows into tables and merge `...` continuation rows
//! 5. populate each table
//!
//! Problems inside the data never abort parsing; they are attached to the
//! resulting [`DataFile`] as diagnostics. Only unreadable input is an error.

mod directory;
mod populate;

pub use directory::{is_init_file, parse_directory, parse_suite};

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::error::{RfError, RfResult};
use crate::language::{language_marker, Language};
use crate::lex::{tokenize, Row};
use crate::limits::Limits;
use crate::model::{DataFile, FileKind, Format};
use crate::preprocess::preprocess;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Decides which paths directory parsing skips.
pub trait PathFilter: Send + Sync + std::fmt::Debug {
    fn is_excluded(&self, path: &Path) -> bool;
}

/// Parsing options.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Resource limits.
    pub limits: Limits,
    /// Force the kind of the parsed file instead of deriving it from the path.
    pub kind: Option<FileKind>,
    /// Language used when a file has no `Language:` marker.
    pub language: Option<&'static Language>,
    /// Paths skipped by directory parsing.
    pub exclude: Option<Arc<dyn PathFilter>>,
}

impl ParseOptions {
    /// Create a new builder for ParseOptions.
    ///
    /// # Examples
    ///
    /// ```
    /// use rfide_core::{FileKind, ParseOptions};
    ///
    /// let opts = ParseOptions::builder()
    ///     .max_file_size(1024 * 1024)
    ///     .kind(FileKind::Resource)
    ///     .build();
    /// assert_eq!(opts.kind, Some(FileKind::Resource));
    /// ```
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder::new()
    }

    /// Options for opening a resource file.
    pub fn resource() -> Self {
        Self {
            kind: Some(FileKind::Resource),
            ..Self::default()
        }
    }
}

/// Builder for [`ParseOptions`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptionsBuilder {
    options: ParseOptions,
}

impl ParseOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum file size in bytes.
    pub fn max_file_size(mut self, bytes: usize) -> Self {
        self.options.limits.max_file_size = bytes;
        self
    }

    /// Set the maximum line length in bytes.
    pub fn max_line_length(mut self, bytes: usize) -> Self {
        self.options.limits.max_line_length = bytes;
        self
    }

    /// Set all limits at once.
    pub fn limits(mut self, limits: Limits) -> Self {
        self.options.limits = limits;
        self
    }

    /// Parse as the given kind of file.
    pub fn kind(mut self, kind: FileKind) -> Self {
        self.options.kind = Some(kind);
        self
    }

    /// Default language for files without a `Language:` marker.
    pub fn language(mut self, language: &'static Language) -> Self {
        self.options.language = Some(language);
        self
    }

    /// Skip paths matched by `filter` when reading directories.
    pub fn exclude(mut self, filter: Arc<dyn PathFilter>) -> Self {
        self.options.exclude = Some(filter);
        self
    }

    pub fn build(self) -> ParseOptions {
        self.options
    }
}

/// Parse test data from bytes.
pub fn parse_bytes(input: &[u8], format: Format, options: &ParseOptions) -> RfResult<DataFile> {
    let start = Instant::now();
    let preprocessed = preprocess(input, &options.limits)?;
    let tokens = tokenize(&preprocessed, format, &options.limits);

    let mut file = DataFile::new(options.kind.unwrap_or_default(), format);
    file.dialect = tokens.dialect;
    file.diagnostics = tokens.diagnostics;
    if preprocessed.is_lossy() {
        file.diagnostics.push(Diagnostic::warning(
            DiagnosticKind::Encoding,
            "File is not valid UTF-8; invalid bytes were replaced",
        ));
    }

    let sections = split_sections(tokens.rows);
    let marker = detect_language(&sections);
    let language = match marker.as_deref() {
        Some(name) => Language::from_name(name).unwrap_or_else(|| {
            file.diagnostics.push(Diagnostic::error(
                DiagnosticKind::Parse,
                format!("Invalid language configuration: Language '{}' not found", name),
            ));
            Language::english()
        }),
        None => options.language.unwrap_or_else(Language::english),
    };
    file.language = marker;

    let mut populator = populate::Populator::new(&mut file, language);
    for section in sections {
        populator.section(section);
    }

    debug!(
        format = ?format,
        rows = preprocessed.line_count(),
        diagnostics = file.diagnostics.len(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "parsed test data"
    );
    Ok(file)
}

/// Parse test data from text.
pub fn parse_str(text: &str, format: Format, options: &ParseOptions) -> RfResult<DataFile> {
    parse_bytes(text.as_bytes(), format, options)
}

/// Parse a file from disk.
///
/// The format follows the extension; the kind follows `options.kind`, then
/// the file name (`__init__.*` is an init file, `*.resource` a resource).
pub fn parse_file(path: &Path, options: &ParseOptions) -> RfResult<DataFile> {
    let format = Format::from_path(path).ok_or_else(|| {
        RfError::data(format!("Unsupported file format '{}'", path.display())).with_path(path)
    })?;
    let bytes = std::fs::read(path).map_err(|e| {
        RfError::data(format!("Reading file '{}' failed: {}", path.display(), e)).with_path(path)
    })?;
    let kind = options.kind.unwrap_or_else(|| kind_from_path(path));
    let options = ParseOptions {
        kind: Some(kind),
        ..options.clone()
    };
    let mut file = parse_bytes(&bytes, format, &options).map_err(|e| e.with_path(path))?;
    file.source = Some(path.to_path_buf());
    let source = path.to_path_buf();
    for diag in &mut file.diagnostics {
        if diag.source().is_none() {
            *diag = diag.clone().with_source(&source);
        }
    }
    Ok(file)
}

/// Parse a file, turning a read failure into an empty file that carries the
/// error as a diagnostic.
pub fn parse_file_lenient(path: &Path, options: &ParseOptions) -> DataFile {
    match parse_file(path, options) {
        Ok(file) => file,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "opening file failed");
            let kind = options.kind.unwrap_or_else(|| kind_from_path(path));
            let mut file = DataFile::with_source(path, kind);
            file.diagnostics.push(
                Diagnostic::error(DiagnosticKind::Parse, err.message).with_source(path),
            );
            file
        }
    }
}

fn kind_from_path(path: &Path) -> FileKind {
    if is_init_file(path) {
        FileKind::InitFile
    } else if Format::from_path(path) == Some(Format::Resource) {
        FileKind::Resource
    } else {
        FileKind::TestCaseFile
    }
}

// --- Sections ---

/// Rows between two table headers. The first section holds the rows before
/// any header.
#[derive(Debug)]
pub(crate) struct Section {
    pub(crate) header: Option<Row>,
    pub(crate) rows: Vec<Row>,
}

/// Split rows at header rows. Table kinds are resolved by the populator,
/// once the language is known.
fn split_sections(rows: Vec<Row>) -> Vec<Section> {
    let mut sections = vec![Section {
        header: None,
        rows: Vec::new(),
    }];
    for row in rows {
        if row.is_header() {
            sections.push(Section {
                header: Some(row),
                rows: Vec::new(),
            });
        } else if let Some(current) = sections.last_mut() {
            current.rows.push(row);
        }
    }
    sections
}

fn detect_language(sections: &[Section]) -> Option<String> {
    sections.first()?.rows.iter().find_map(|row| {
        row.cells
            .iter()
            .find(|c| !c.is_empty())
            .and_then(|c| language_marker(c))
            .map(str::to_string)
    })
}

/// Merge `...` rows into the preceding logical row.
///
/// The marker may be preceded by empty cells and `\` cells. Comment rows are
/// skipped when looking for the row to extend.
pub(crate) fn merge_continuations(rows: Vec<Row>, diagnostics: &mut Vec<Diagnostic>) -> Vec<Row> {
    let mut out: Vec<Row> = Vec::with_capacity(rows.len());
    let mut last_data: Option<usize> = None;
    for row in rows {
        let first = row.cells.iter().position(|c| !(c.is_empty() || c == "\\"));
        if let Some(at) = first.filter(|&i| row.cells[i] == "...") {
            match last_data {
                Some(idx) => {
                    out[idx].cells.extend(row.cells[at + 1..].iter().cloned());
                    continue;
                }
                None => diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::Parse,
                        "Row continuation '...' without a row to continue",
                    )
                    .with_line(row.line),
                ),
            }
        }
        if !row.is_comment() {
            last_data = Some(out.len());
        }
        out.push(row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForFlavor, Setting, Step};

    fn parse(text: &str) -> DataFile {
        parse_str(text, Format::Robot, &ParseOptions::default()).unwrap()
    }

    fn row(line: usize, cells: &[&str]) -> Row {
        Row::new(line, 0, cells.iter().map(|c| c.to_string()).collect())
    }

    // ==================== Section tests ====================

    #[test]
    fn test_split_sections() {
        let sections = split_sections(vec![
            row(1, &["# preamble"]),
            row(2, &["*** Settings ***"]),
            row(3, &["Library", "X"]),
        ]);
        assert_eq!(sections.len(), 2);
        assert!(sections[0].header.is_none());
        assert_eq!(sections[1].rows.len(), 1);
    }

    #[test]
    fn test_merge_continuations() {
        let mut diags = Vec::new();
        let rows = merge_continuations(
            vec![
                row(1, &["Documentation", "first"]),
                row(2, &["# interleaved comment"]),
                row(3, &["...", "second"]),
                row(4, &["", "\\", "...", "third"]),
            ],
            &mut diags,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells, vec!["Documentation", "first", "second", "third"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_orphan_continuation_reported() {
        let mut diags = Vec::new();
        let rows = merge_continuations(vec![row(1, &["...", "x"])], &mut diags);
        assert_eq!(rows.len(), 1);
        assert_eq!(diags.len(), 1);
    }

    // ==================== parse_str tests ====================

    #[test]
    fn test_parse_settings_only() {
        let file = parse("*Settings*\nLibrary    OperatingSystem\n");
        assert_eq!(
            file.settings.header.as_ref().map(|h| h.cells.clone()),
            Some(vec!["*Settings*".to_string()])
        );
        let imports: Vec<_> = file.settings.imports().collect();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].name, "OperatingSystem");
        assert!(file.diagnostics.is_empty());
    }

    #[test]
    fn test_parse_old_style_loop() {
        let file = parse(
            "*** Test Cases ***\nT\n    : FOR    ${i}    IN    1    2    3\n        Log    ${i}\n",
        );
        let test = &file.tests.items[0];
        assert_eq!(test.steps.len(), 1);
        let Step::For(lp) = &test.steps[0] else {
            panic!("expected loop")
        };
        assert_eq!(lp.flavor, ForFlavor::In);
        assert_eq!(lp.body.len(), 1);
    }

    #[test]
    fn test_language_marker() {
        let file = parse("Language: Finnish\n\n*** Asetukset ***\nKirjasto    OperatingSystem\n");
        assert_eq!(file.language.as_deref(), Some("Finnish"));
        assert_eq!(file.settings.imports().count(), 1);
        assert!(file.preamble.is_empty());
    }

    #[test]
    fn test_unknown_language_reported() {
        let file = parse("Language: Klingon\n*** Settings ***\n");
        assert_eq!(file.diagnostics.len(), 1);
    }

    #[test]
    fn test_unknown_table_discarded() {
        let file = parse("*** Bogus ***\nwhatever    x\n*** Settings ***\nDocumentation    d\n");
        assert_eq!(file.diagnostics.len(), 1);
        assert_eq!(file.diagnostics[0].kind(), &DiagnosticKind::UnknownTable);
        assert!(matches!(file.settings.items[0], Setting::Documentation(_)));
        assert_eq!(file.settings.items.len(), 1);
        assert!(file.preamble.is_empty() && file.comment_tables.is_empty());
        assert_eq!(file.diagnostics[0].line(), Some(1));
    }

    #[test]
    fn test_lossy_decoding_diagnostic() {
        let file = parse_bytes(
            b"*** Settings ***\nDocumentation    \xFF\n",
            Format::Robot,
            &ParseOptions::default(),
        )
        .unwrap();
        assert!(file
            .diagnostics
            .iter()
            .any(|d| d.kind() == &DiagnosticKind::Encoding));
    }

    #[test]
    fn test_options_builder() {
        let opts = ParseOptions::builder()
            .max_file_size(10)
            .max_line_length(5)
            .language(crate::language::Language::from_name("de").unwrap())
            .build();
        assert_eq!(opts.limits.max_file_size, 10);
        assert!(parse_str("0123456789abc", Format::Txt, &opts).is_err());
    }
}

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

//! Tokenizing test data into rows of cells.
//!
//! Every supported source format is reduced to the same [`Row`] shape so the
//! parser does not care where the data came from.
//!
//! # Module Structure
//!
//! - [`error`] - Lexer error type
//! - [`row`] - Space and pipe separated plain text rows
//! - [`tsv`] - Tab separated files, read with the `csv` crate
//! - [`html`] - HTML tables, read with `quick-xml`
//!
//! # Row shape
//!
//! - Leading indentation becomes a single empty first cell, and
//!   [`Row::indent`] records how deep it was.
//! - Trailing empty cells are dropped.
//! - Backslash escapes are kept verbatim.
//!
//! ```
//! use rfide_core::lex::split_line;
//!
//! let row = split_line("    Log    Hello world", 3).unwrap();
//! assert_eq!(row.cells, vec!["", "Log", "Hello world"]);
//! assert_eq!(row.indent, 4);
//!
//! let row = split_line("| | Log | Hello |", 4).unwrap();
//! assert_eq!(row.cells, vec!["", "Log", "Hello"]);
//! ```

pub mod error;
pub mod html;
pub mod row;
pub mod tsv;

pub use error::LexError;
pub use row::{is_pipe_row, split_line, split_pipe_row, split_space_row};

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::limits::Limits;
use crate::model::Format;
use crate::preprocess::PreprocessedInput;

/// Indentation width given to each leading empty cell in TSV, HTML and pipe
/// rows, so they compare with space-indented rows.
pub const CELL_INDENT: usize = 4;

/// Column separator dialect of a plain text row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dialect {
    /// Two or more spaces, or a tab.
    #[default]
    Space,
    /// `| cell | cell |`
    Pipe,
}

/// One physical row of test data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Line number (1-based) in the source.
    pub line: usize,
    /// Indentation width in columns; 0 for rows starting at the margin.
    pub indent: usize,
    /// Cells, with indentation collapsed into one leading empty cell.
    pub cells: Vec<String>,
}

impl Row {
    pub fn new(line: usize, indent: usize, cells: Vec<String>) -> Self {
        Self {
            line,
            indent,
            cells,
        }
    }

    /// True if the row starts with the indentation marker cell.
    pub fn is_indented(&self) -> bool {
        self.cells.first().is_some_and(|c| c.is_empty())
    }

    /// True if the first cell opens a table (`*** Settings ***`).
    pub fn is_header(&self) -> bool {
        self.cells.first().is_some_and(|c| c.starts_with('*'))
    }

    /// True if the first non-empty cell starts a comment.
    pub fn is_comment(&self) -> bool {
        self.cells
            .iter()
            .find(|c| !c.is_empty())
            .is_some_and(|c| c.starts_with('#'))
    }

    /// True if there are no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }
}

/// Output of [`tokenize`].
#[derive(Debug, Default)]
pub struct TokenizedInput {
    /// Non-blank rows in source order.
    pub rows: Vec<Row>,
    /// Problems found while splitting rows.
    pub diagnostics: Vec<Diagnostic>,
    /// Dominant dialect of plain text input.
    pub dialect: Dialect,
}

/// Split preprocessed input into rows according to its format.
pub fn tokenize(input: &PreprocessedInput, format: Format, limits: &Limits) -> TokenizedInput {
    let mut out = match format {
        Format::Tsv => tsv::read_rows(input.text()),
        Format::Html => html::read_rows(input.text()),
        Format::Robot | Format::Resource | Format::Txt => tokenize_plain(input),
    };
    for row in &mut out.rows {
        if row.cells.len() > limits.max_cells_per_row {
            out.diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::Parse,
                    format!(
                        "row has more than {} cells; the rest were dropped",
                        limits.max_cells_per_row
                    ),
                )
                .with_line(row.line),
            );
            row.cells.truncate(limits.max_cells_per_row);
        }
    }
    out
}

fn tokenize_plain(input: &PreprocessedInput) -> TokenizedInput {
    let mut out = TokenizedInput::default();
    let mut pipe_rows = 0usize;
    for (line_num, line) in input.lines() {
        let row = match split_line(line, line_num) {
            Ok(row) => {
                if is_pipe_row(line) {
                    pipe_rows += 1;
                }
                row
            }
            Err(err) => {
                out.diagnostics.push(
                    Diagnostic::error(DiagnosticKind::Parse, err.to_string()).with_line(line_num),
                );
                split_space_row(line, line_num)
            }
        };
        if !row.is_empty() {
            out.rows.push(row);
        }
    }
    if pipe_rows * 2 > out.rows.len() {
        out.dialect = Dialect::Pipe;
    }
    out
}

/// Collapse leading empty cells into a single marker cell and drop trailing
/// empty cells. Used by the cell-based readers.
pub(crate) fn normalize_cells(line: usize, mut cells: Vec<String>) -> Row {
    while cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    let leading = cells.iter().take_while(|c| c.is_empty()).count();
    if leading > 1 {
        cells.drain(..leading - 1);
    }
    Row::new(line, leading * CELL_INDENT, cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::preprocess;

    fn tok(text: &str, format: Format) -> TokenizedInput {
        let input = preprocess(text.as_bytes(), &Limits::default()).unwrap();
        tokenize(&input, format, &Limits::default())
    }

    // ==================== Row predicate tests ====================

    #[test]
    fn test_row_predicates() {
        let row = Row::new(1, 4, vec!["".into(), "# note".into()]);
        assert!(row.is_indented());
        assert!(row.is_comment());
        assert!(!row.is_header());
        assert!(Row::new(1, 0, vec!["*** Settings ***".into()]).is_header());
    }

    // ==================== tokenize tests ====================

    #[test]
    fn test_blank_rows_skipped() {
        let out = tok("*Settings*\n\n   \nLibrary    OperatingSystem\n", Format::Txt);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[1].line, 4);
        assert_eq!(out.dialect, Dialect::Space);
    }

    #[test]
    fn test_pipe_dialect_detected() {
        let out = tok("| *Settings* |\n| Library | OperatingSystem |\n", Format::Robot);
        assert_eq!(out.dialect, Dialect::Pipe);
        assert_eq!(out.rows[1].cells, vec!["Library", "OperatingSystem"]);
    }

    #[test]
    fn test_malformed_pipe_row_reported_and_kept() {
        let out = tok("| lonely", Format::Robot);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.rows[0].cells, vec!["| lonely"]);
    }

    #[test]
    fn test_cell_limit() {
        let input = preprocess(b"a  b  c  d", &Limits::default()).unwrap();
        let limits = Limits {
            max_cells_per_row: 2,
            ..Limits::default()
        };
        let out = tokenize(&input, Format::Txt, &limits);
        assert_eq!(out.rows[0].cells, vec!["a", "b"]);
        assert_eq!(out.diagnostics.len(), 1);
    }

    // ==================== normalize_cells tests ====================

    #[test]
    fn test_normalize_cells() {
        let row = normalize_cells(
            2,
            vec!["".into(), "".into(), "Log".into(), "".into()],
        );
        assert_eq!(row.cells, vec!["", "Log"]);
        assert_eq!(row.indent, 8);
    }
}

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

//! Tab separated test data.
//!
//! Cells are separated by single tabs; quoting is not interpreted, so quote
//! characters stay part of the cell text exactly as in plain text files.

use super::{normalize_cells, Dialect, LexError, TokenizedInput};
use crate::diagnostic::{Diagnostic, DiagnosticKind};

/// Read TSV text into rows.
pub fn read_rows(text: &str) -> TokenizedInput {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut out = TokenizedInput {
        dialect: Dialect::Space,
        ..TokenizedInput::default()
    };
    for (idx, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                let line = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(idx + 1);
                let cells: Vec<String> = record.iter().map(str::to_string).collect();
                let row = normalize_cells(line, cells);
                if !row.is_empty() {
                    out.rows.push(row);
                }
            }
            Err(err) => {
                let line = err.position().map(|p| p.line() as usize).unwrap_or(idx + 1);
                let err = LexError::Tsv {
                    line,
                    message: err.to_string(),
                };
                out.diagnostics
                    .push(Diagnostic::error(DiagnosticKind::Parse, err.to_string()).with_line(line));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tsv_header_and_rows() {
        let out = read_rows("*Setting*\t*Value*\nLibrary\tOperatingSystem\n");
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].cells, vec!["*Setting*", "*Value*"]);
        assert_eq!(out.rows[1].cells, vec!["Library", "OperatingSystem"]);
        assert_eq!(out.rows[1].line, 2);
    }

    #[test]
    fn test_tsv_indentation() {
        let out = read_rows("T\tLog\tx\n\tNo Operation\n\t\tNested\t\t\n");
        assert_eq!(out.rows[1].cells, vec!["", "No Operation"]);
        assert_eq!(out.rows[1].indent, 4);
        assert_eq!(out.rows[2].cells, vec!["", "Nested"]);
        assert_eq!(out.rows[2].indent, 8);
    }

    #[test]
    fn test_tsv_quotes_kept() {
        let out = read_rows("Log\t\"quoted\"\n");
        assert_eq!(out.rows[0].cells, vec!["Log", "\"quoted\""]);
    }

    #[test]
    fn test_tsv_empty_lines_skipped() {
        let out = read_rows("a\n\n\t\t\nb\n");
        assert_eq!(out.rows.len(), 2);
    }
}

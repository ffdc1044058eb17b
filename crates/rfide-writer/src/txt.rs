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

//! Space and pipe separated plain text.

use crate::config::WriterConfig;
use crate::layout::{Layout, OutRow};
use rfide_core::lex::Dialect;

/// Cell written for an empty cell in the space separated format.
const EMPTY_CELL: &str = "\\";

/// True if a cell cannot be written in the space separated format without
/// changing how it splits.
pub fn needs_pipes(cell: &str) -> bool {
    cell.contains("  ") || cell.contains('\t')
}

/// Pick the plain text dialect for a layout.
pub fn choose_dialect(layout: &Layout, source: Dialect, config: &WriterConfig) -> Dialect {
    match config.dialect {
        Some(dialect) => dialect,
        None if source == Dialect::Space && layout.cells().any(|c| needs_pipes(c)) => Dialect::Pipe,
        None => source,
    }
}

pub fn render(layout: &Layout, dialect: Dialect, config: &WriterConfig) -> String {
    let eol = config.line_ending.as_str();
    let mut out = String::with_capacity(4096);

    let mut blocks: Vec<Vec<String>> = Vec::new();
    if !layout.preamble.is_empty() {
        blocks.push(layout.preamble.iter().map(|r| line(r, dialect, config)).collect());
    }
    for table in &layout.tables {
        let mut lines = Vec::with_capacity(table.rows.len() + 1);
        lines.push(line(
            &OutRow {
                level: 0,
                cells: table.header.clone(),
                is_name: false,
            },
            dialect,
            config,
        ));
        lines.extend(table.rows.iter().map(|r| line(r, dialect, config)));
        blocks.push(lines);
    }

    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            out.push_str(eol);
        }
        for text in block {
            out.push_str(text);
            out.push_str(eol);
        }
    }
    out
}

fn line(row: &OutRow, dialect: Dialect, config: &WriterConfig) -> String {
    match dialect {
        Dialect::Space => space_line(row, config),
        Dialect::Pipe => pipe_line(row),
    }
}

fn space_line(row: &OutRow, config: &WriterConfig) -> String {
    let cells: Vec<&str> = row
        .cells
        .iter()
        .map(|c| if c.is_empty() { EMPTY_CELL } else { c.as_str() })
        .collect();
    let mut text = config.indent(row.level);
    text.push_str(&cells.join(&config.separator()));
    text.trim_end().to_string()
}

fn pipe_line(row: &OutRow) -> String {
    let mut cells: Vec<&str> = vec![""; row.level];
    cells.extend(row.cells.iter().map(String::as_str));
    let mut text = String::from("| ");
    text.push_str(&cells.join(" | "));
    text.push_str(" |");
    text
}

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

//! Tab separated values.
//!
//! Every row of a table is padded to the table's column count. Cells are
//! written unquoted, matching how the reader splits on tabs only.

use crate::config::{LineEnding, WriterConfig};
use crate::layout::{Layout, OutRow};
use rfide_core::{RfError, RfResult};

pub fn render(layout: &Layout, config: &WriterConfig) -> RfResult<String> {
    let eol = config.line_ending.as_str();
    let mut chunks = Vec::new();

    if !layout.preamble.is_empty() {
        let width = layout.preamble.iter().map(OutRow::width).max().unwrap_or(1);
        let records: Vec<Vec<String>> = layout.preamble.iter().map(|r| record(r, width)).collect();
        chunks.push(write_records(&records, config)?);
    }
    for table in &layout.tables {
        let width = table.width();
        let mut records = Vec::with_capacity(table.rows.len() + 1);
        let mut header = table.header.clone();
        header.resize(width, String::new());
        records.push(header);
        records.extend(table.rows.iter().map(|r| record(r, width)));
        chunks.push(write_records(&records, config)?);
    }
    Ok(chunks.join(eol))
}

fn record(row: &OutRow, width: usize) -> Vec<String> {
    let mut cells = vec![String::new(); row.level];
    cells.extend(row.cells.iter().map(|c| c.replace('\t', " ")));
    cells.resize(width.max(cells.len()), String::new());
    cells
}

fn write_records(records: &[Vec<String>], config: &WriterConfig) -> RfResult<String> {
    let terminator = match config.line_ending {
        LineEnding::CrLf => csv::Terminator::CRLF,
        LineEnding::Native if cfg!(windows) => csv::Terminator::CRLF,
        _ => csv::Terminator::Any(b'\n'),
    };
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .terminator(terminator)
        .flexible(true)
        .from_writer(Vec::new());
    for record in records {
        writer
            .write_record(record)
            .map_err(|e| RfError::serialization(format!("Writing TSV row failed: {}", e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| RfError::serialization(format!("Flushing TSV output failed: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| RfError::serialization(format!("TSV output is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::OutTable;
    use rfide_core::TableKind;

    fn s(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_rows_padded_to_table_width() {
        let layout = Layout {
            preamble: Vec::new(),
            tables: vec![OutTable {
                kind: TableKind::Keywords,
                header: s(&["*Keyword*"]),
                rows: vec![
                    OutRow {
                        level: 0,
                        cells: s(&["K"]),
                        is_name: true,
                    },
                    OutRow {
                        level: 1,
                        cells: s(&["Log", "a"]),
                        is_name: false,
                    },
                ],
            }],
        };
        let config = WriterConfig::builder().line_ending(LineEnding::Lf).build();
        let text = render(&layout, &config).unwrap();
        assert_eq!(text, "*Keyword*\t\t\nK\t\t\n\tLog\ta\n");
    }

    #[test]
    fn test_quotes_not_escaped() {
        let row = OutRow {
            level: 0,
            cells: s(&["Log", "\"quoted\""]),
            is_name: false,
        };
        let config = WriterConfig::builder().line_ending(LineEnding::Lf).build();
        let text = write_records(&[record(&row, 2)], &config).unwrap();
        assert_eq!(text, "Log\t\"quoted\"\n");
    }
}

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

//! HTML table test data.
//!
//! Each `<table>` is one test data table; its first row is the header. Text
//! outside table cells is ignored. Tag names are matched case-insensitively
//! and unclosed elements such as `<br>` are tolerated.

use super::{normalize_cells, Dialect, LexError, TokenizedInput};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;

/// Upper bound for `colspan` to keep a hostile file from exploding a row.
const MAX_COLSPAN: usize = 256;

struct OpenCell {
    text: String,
    colspan: usize,
}

/// Read HTML text into rows.
pub fn read_rows(text: &str) -> TokenizedInput {
    let mut reader = Reader::from_str(text);
    reader.trim_text(false);
    reader.check_end_names(false);

    let newlines: Vec<usize> = memchr::memchr_iter(b'\n', text.as_bytes()).collect();
    let line_at = |pos: usize| newlines.partition_point(|&nl| nl < pos) + 1;

    let mut out = TokenizedInput {
        dialect: Dialect::Space,
        ..TokenizedInput::default()
    };
    let mut first_row_of_table = false;
    let mut row: Option<(usize, Vec<String>)> = None;
    let mut cell: Option<OpenCell> = None;

    loop {
        let pos = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(e)) => match tag_name(&e).as_str() {
                "table" => first_row_of_table = true,
                "tr" => row = Some((line_at(pos), Vec::new())),
                "td" | "th" => {
                    cell = Some(OpenCell {
                        text: String::new(),
                        colspan: colspan(&e),
                    })
                }
                "br" => push_text(&mut cell, " "),
                _ => {}
            },
            Ok(Event::Empty(e)) => match tag_name(&e).as_str() {
                "br" => push_text(&mut cell, " "),
                "td" | "th" => {
                    if let Some((_, cells)) = row.as_mut() {
                        cells.push(String::new());
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if cell.is_some() {
                    push_text(&mut cell, &decode_text(&e));
                }
            }
            Ok(Event::CData(e)) => {
                if cell.is_some() {
                    push_text(&mut cell, &String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(e)) => match lowercase(e.name().as_ref()).as_str() {
                "td" | "th" => finish_cell(&mut cell, &mut row),
                "tr" => {
                    finish_cell(&mut cell, &mut row);
                    if let Some((line, mut cells)) = row.take() {
                        if first_row_of_table {
                            first_row_of_table = false;
                            mark_header(&mut cells);
                        }
                        let row = normalize_cells(line, cells);
                        if !row.is_empty() {
                            out.rows.push(row);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                let err = LexError::Html {
                    line: line_at(reader.buffer_position()),
                    message: err.to_string(),
                };
                out.diagnostics.push(
                    Diagnostic::error(DiagnosticKind::Parse, err.to_string()).with_line(err.line()),
                );
                break;
            }
            _ => {}
        }
    }
    out
}

fn lowercase(name: &[u8]) -> String {
    String::from_utf8_lossy(name).to_ascii_lowercase()
}

fn tag_name(e: &BytesStart<'_>) -> String {
    lowercase(e.name().as_ref())
}

fn colspan(e: &BytesStart<'_>) -> usize {
    e.attributes()
        .with_checks(false)
        .flatten()
        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(b"colspan"))
        .and_then(|attr| String::from_utf8_lossy(&attr.value).trim().parse().ok())
        .unwrap_or(1usize)
        .clamp(1, MAX_COLSPAN)
}

fn decode_text(e: &BytesText<'_>) -> String {
    e.unescape_with(|entity| match entity {
        "nbsp" => Some(" "),
        _ => None,
    })
    .map(|text| text.into_owned())
    .unwrap_or_else(|_| String::from_utf8_lossy(e).into_owned())
    .replace('\u{a0}', " ")
}

fn push_text(cell: &mut Option<OpenCell>, text: &str) {
    if let Some(cell) = cell.as_mut() {
        cell.text.push_str(text);
    }
}

fn finish_cell(cell: &mut Option<OpenCell>, row: &mut Option<(usize, Vec<String>)>) {
    let (Some(open), Some((_, cells))) = (cell.take(), row.as_mut()) else {
        return;
    };
    cells.push(open.text.split_whitespace().collect::<Vec<_>>().join(" "));
    cells.extend(std::iter::repeat(String::new()).take(open.colspan - 1));
}

fn mark_header(cells: &mut [String]) {
    if let Some(first) = cells.first_mut() {
        if !first.starts_with('*') && !first.is_empty() {
            *first = format!("*{}*", first);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE: &str = r#"<html><body>
<table border="1">
<tr><th>Setting</th><th>Value</th></tr>
<tr><td>Library</td><td>OperatingSystem</td></tr>
</table>
<table>
<tr><th colspan="3">Test Case</th></tr>
<tr><td><a name="test_T">T</a></td><td>Log</td><td>a &amp; b</td></tr>
<tr><td></td><td>No&nbsp;Operation</td><td></td></tr>
</table>
</body></html>"#;

    // ==================== Table tests ====================

    #[test]
    fn test_header_rows_marked() {
        let out = read_rows(SUITE);
        assert_eq!(out.rows[0].cells, vec!["*Setting*", "Value"]);
        assert_eq!(out.rows[2].cells, vec!["*Test Case*"]);
    }

    #[test]
    fn test_cells_and_entities() {
        let out = read_rows(SUITE);
        assert_eq!(out.rows[1].cells, vec!["Library", "OperatingSystem"]);
        assert_eq!(out.rows[3].cells, vec!["T", "Log", "a & b"]);
        assert_eq!(out.rows[4].cells, vec!["", "No Operation"]);
        assert_eq!(out.rows[4].indent, 4);
    }

    #[test]
    fn test_line_numbers() {
        let out = read_rows(SUITE);
        assert_eq!(out.rows[0].line, 3);
        assert_eq!(out.rows[1].line, 4);
    }

    #[test]
    fn test_unclosed_br_tolerated() {
        let out = read_rows("<table><tr><th>Keywords</th></tr><tr><td>K</td><td>Log<br>x</td></tr></table>");
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.rows[1].cells, vec!["K", "Log x"]);
    }

    #[test]
    fn test_uppercase_tags() {
        let out = read_rows("<TABLE><TR><TH>Variables</TH></TR><TR><TD>${x}</TD><TD>1</TD></TR></TABLE>");
        assert_eq!(out.rows[1].cells, vec!["${x}", "1"]);
    }
}

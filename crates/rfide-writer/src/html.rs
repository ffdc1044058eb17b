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

//! HTML tables.
//!
//! The file is written into a fixed page template with one `<table>` per
//! test data table. Test and keyword names carry an `<a name>` anchor so the
//! page can be linked into.

use crate::config::WriterConfig;
use crate::layout::{Layout, OutRow, OutTable};
use quick_xml::escape::escape;
use rfide_core::TableKind;

const TEMPLATE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta http-equiv="Content-Type" content="text/html; charset=UTF-8">
<style type="text/css">
html { font-family: Arial, Helvetica, sans-serif; }
table { border: 1px solid gray; border-collapse: collapse; empty-cells: show; margin: 1em 0; }
th, td { border: 1px solid gray; padding: 0.1em 0.3em; height: 1.2em; }
th { background-color: #c6e2ff; color: black; }
td.name { background-color: #eeeeee; font-weight: bold; }
</style>
"#;

fn table_id(kind: TableKind) -> &'static str {
    match kind {
        TableKind::Settings => "settings",
        TableKind::Variables => "variables",
        TableKind::TestCases | TableKind::Tasks => "testcases",
        TableKind::Keywords => "keywords",
        TableKind::Comments => "comments",
    }
}

fn anchor_prefix(kind: TableKind) -> &'static str {
    match kind {
        TableKind::Keywords => "keyword_",
        _ => "test_",
    }
}

pub fn render(layout: &Layout, title: &str, config: &WriterConfig) -> String {
    let eol = config.line_ending.as_str();
    let mut lines: Vec<String> = Vec::new();
    lines.extend(TEMPLATE_HEAD.lines().map(str::to_string));
    lines.push(format!("<title>{}</title>", escape(title)));
    lines.push("</head>".to_string());
    lines.push("<body>".to_string());
    lines.push(format!("<h1>{}</h1>", escape(title)));
    preamble_lines(&layout.preamble, &mut lines);
    for table in &layout.tables {
        table_lines(table, &mut lines);
    }
    lines.push("</body>".to_string());
    lines.push("</html>".to_string());

    let mut out = lines.join(eol);
    out.push_str(eol);
    out
}

/// Rows before the first table go into a table with an empty header row,
/// so reading the page back keeps them ahead of every test data table.
fn preamble_lines(preamble: &[OutRow], lines: &mut Vec<String>) {
    if preamble.is_empty() {
        return;
    }
    let width = preamble.iter().map(OutRow::width).max().unwrap_or(1);
    lines.push(r#"<table id="preamble" border="1">"#.to_string());
    lines.push(format!("<tr>{}</tr>", "<th></th>".repeat(width)));
    for row in preamble {
        lines.push(row_html(row, TableKind::Comments, width));
    }
    lines.push("</table>".to_string());
}

fn table_lines(table: &OutTable, lines: &mut Vec<String>) {
    let width = table.width();
    lines.push(format!(
        r#"<table id="{}" border="1">"#,
        table_id(table.kind)
    ));

    let mut header = String::from("<tr>");
    for (i, cell) in table.header.iter().enumerate() {
        let text = if i == 0 {
            cell.trim_matches(|c: char| c == '*' || c.is_whitespace())
        } else {
            cell.as_str()
        };
        header.push_str(&format!("<th>{}</th>", escape(text)));
    }
    for _ in table.header.len()..width {
        header.push_str("<th></th>");
    }
    header.push_str("</tr>");
    lines.push(header);

    for row in &table.rows {
        lines.push(row_html(row, table.kind, width));
    }
    lines.push("</table>".to_string());
}

fn row_html(row: &OutRow, kind: TableKind, width: usize) -> String {
    let mut html = String::from("<tr>");
    for _ in 0..row.level {
        html.push_str("<td></td>");
    }
    for (i, cell) in row.cells.iter().enumerate() {
        if i == 0 && row.is_name {
            html.push_str(&format!(
                r#"<td class="name"><a name="{}{}">{}</a></td>"#,
                anchor_prefix(kind),
                escape(cell.as_str()),
                escape(cell.as_str())
            ));
        } else {
            html.push_str(&format!("<td>{}</td>", escape(cell.as_str())));
        }
    }
    for _ in row.width()..width {
        html.push_str("<td></td>");
    }
    html.push_str("</tr>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineEnding;

    fn s(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_row_with_anchor_and_escaping() {
        let row = OutRow {
            level: 0,
            cells: s(&["A & B"]),
            is_name: true,
        };
        assert_eq!(
            row_html(&row, TableKind::TestCases, 2),
            r#"<tr><td class="name"><a name="test_A &amp; B">A &amp; B</a></td><td></td></tr>"#
        );
    }

    #[test]
    fn test_indented_row() {
        let row = OutRow {
            level: 1,
            cells: s(&["Log", "<b>"]),
            is_name: false,
        };
        assert_eq!(
            row_html(&row, TableKind::Keywords, 3),
            "<tr><td></td><td>Log</td><td>&lt;b&gt;</td></tr>"
        );
    }

    #[test]
    fn test_preamble_table_precedes_data_tables() {
        let layout = Layout {
            preamble: vec![OutRow {
                level: 0,
                cells: s(&["Language: Finnish"]),
                is_name: false,
            }],
            tables: vec![OutTable {
                kind: TableKind::TestCases,
                header: s(&["*** Testit ***"]),
                rows: Vec::new(),
            }],
        };
        let config = WriterConfig::builder().line_ending(LineEnding::Lf).build();
        let page = render(&layout, "Suite", &config);
        let preamble = page.find(r#"<table id="preamble""#).unwrap();
        let language = page.find("<tr><td>Language: Finnish</td></tr>").unwrap();
        let tests = page.find("<th>Testit</th>").unwrap();
        assert!(preamble < language && language < tests);
        assert!(page.contains("<tr><th></th></tr>"));
    }

    #[test]
    fn test_no_preamble_table_without_preamble() {
        let config = WriterConfig::builder().line_ending(LineEnding::Lf).build();
        let page = render(&Layout::default(), "Empty", &config);
        assert!(!page.contains("preamble"));
    }

    #[test]
    fn test_page_template() {
        let layout = Layout {
            preamble: Vec::new(),
            tables: vec![OutTable {
                kind: TableKind::Settings,
                header: s(&["*** Settings ***"]),
                rows: vec![OutRow {
                    level: 0,
                    cells: s(&["Library", "X"]),
                    is_name: false,
                }],
            }],
        };
        let config = WriterConfig::builder().line_ending(LineEnding::Lf).build();
        let page = render(&layout, "Suite", &config);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Suite</title>"));
        assert!(page.contains("<tr><th>Settings</th><th></th></tr>"));
        assert!(page.ends_with("</html>\n"));
    }
}

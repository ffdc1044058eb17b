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

//! Plain text row splitting.
//!
//! A row is pipe separated when it begins with `| ` (or is a lone `|`), and
//! space separated otherwise. Space separated cells are delimited by two or
//! more spaces or any tab; pipe separated cells by `space(s) | space(s)` or
//! `space(s) |` at the end of the line.

use super::{normalize_cells, LexError, Row};

/// Width counted for a tab in leading indentation.
const TAB_WIDTH: usize = 4;

/// Returns `true` if the line uses the pipe-separated dialect.
#[inline]
pub fn is_pipe_row(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.first() == Some(&b'|') && (bytes.len() == 1 || matches!(bytes[1], b' ' | b'\t'))
}

/// Split one line, choosing the dialect from its first characters.
pub fn split_line(line: &str, line_num: usize) -> Result<Row, LexError> {
    if is_pipe_row(line) {
        split_pipe_row(line, line_num)
    } else {
        Ok(split_space_row(line, line_num))
    }
}

/// Split a space-separated line.
pub fn split_space_row(line: &str, line_num: usize) -> Row {
    let line = line.trim_end();
    let content = line.trim_start();
    let lead = &line[..line.len() - content.len()];
    let indent = lead
        .chars()
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum();

    let mut cells = Vec::new();
    if content.is_empty() {
        return Row::new(line_num, 0, cells);
    }
    if !lead.is_empty() {
        cells.push(String::new());
    }

    let mut cell = String::new();
    let mut gap = String::new();
    for ch in content.chars() {
        if ch == ' ' || ch == '\t' {
            gap.push(ch);
            continue;
        }
        if !gap.is_empty() {
            if gap.len() >= 2 || gap.contains('\t') {
                cells.push(std::mem::take(&mut cell));
            } else {
                cell.push_str(&gap);
            }
            gap.clear();
        }
        cell.push(ch);
    }
    cells.push(cell);
    Row::new(line_num, indent, cells)
}

/// Split a pipe-separated line.
///
/// Fails with [`LexError::MalformedRow`] when the content after the opening
/// pipe contains no separator and no closing pipe.
pub fn split_pipe_row(line: &str, line_num: usize) -> Result<Row, LexError> {
    let line = line.trim_end();
    let mut body = &line[1..];
    if body.trim().is_empty() {
        return Ok(Row::new(line_num, 0, Vec::new()));
    }
    let closed = body.ends_with(" |") || body.ends_with("\t|");
    if closed {
        body = &body[..body.len() - 1];
    }

    let bytes = body.as_bytes();
    let mut cells = Vec::new();
    let mut start = 0;
    for i in 0..bytes.len() {
        let is_separator = bytes[i] == b'|'
            && i > 0
            && matches!(bytes[i - 1], b' ' | b'\t')
            && (i + 1 == bytes.len() || matches!(bytes[i + 1], b' ' | b'\t'));
        if is_separator {
            cells.push(body[start..i].trim().to_string());
            start = i + 1;
        }
    }
    if cells.is_empty() && !closed {
        return Err(LexError::MalformedRow { line: line_num });
    }
    cells.push(body[start..].trim().to_string());
    Ok(normalize_cells(line_num, cells))
}

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

//! Finding variable tokens in cell text.

/// A variable token found in text, such as `${x}`, `@{list}[1:]` or `%{HOME}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableMatch<'a> {
    /// Byte offset of the sigil.
    pub start: usize,
    /// Byte offset just past the last closing brace or bracket.
    pub end: usize,
    pub sigil: char,
    /// Text between the braces; may contain nested variables.
    pub body: &'a str,
    /// Item accessors after the closing brace, without brackets.
    pub items: Vec<&'a str>,
}

impl<'a> VariableMatch<'a> {
    /// The token without item accessors, e.g. `${x}`.
    pub fn base_token(&self) -> String {
        format!("{}{{{}}}", self.sigil, self.body)
    }

    /// Inline evaluation `${{ expression }}`.
    pub fn is_inline_eval(&self) -> bool {
        self.body.len() >= 2 && self.body.starts_with('{') && self.body.ends_with('}')
    }

    /// True if the body contains another variable.
    pub fn is_nested(&self) -> bool {
        search_variable(self.body).is_some()
    }
}

fn is_escaped(bytes: &[u8], index: usize) -> bool {
    let backslashes = bytes[..index].iter().rev().take_while(|b| **b == b'\\').count();
    backslashes % 2 == 1
}

/// Index of the bracket closing the one at `open`, honoring nesting and
/// backslash escapes.
fn matching_close(bytes: &[u8], open: usize, open_ch: u8, close_ch: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            i += 2;
            continue;
        }
        if b == open_ch {
            depth += 1;
        } else if b == close_ch {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Find the first unescaped variable token in `text`.
pub fn search_variable(text: &str) -> Option<VariableMatch<'_>> {
    search_variable_from(text, 0)
}

/// Find the first unescaped variable token at or after byte `from`.
pub fn search_variable_from(text: &str, from: usize) -> Option<VariableMatch<'_>> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i + 1 < bytes.len() {
        let b = bytes[i];
        if matches!(b, b'$' | b'@' | b'&' | b'%') && bytes[i + 1] == b'{' && !is_escaped(bytes, i) {
            if let Some(close) = matching_close(bytes, i + 1, b'{', b'}') {
                let mut end = close + 1;
                let mut items = Vec::new();
                if b != b'%' {
                    while end < bytes.len() && bytes[end] == b'[' {
                        match matching_close(bytes, end, b'[', b']') {
                            Some(item_end) => {
                                items.push(&text[end + 1..item_end]);
                                end = item_end + 1;
                            }
                            None => break,
                        }
                    }
                }
                return Some(VariableMatch {
                    start: i,
                    end,
                    sigil: b as char,
                    body: &text[i + 2..close],
                    items,
                });
            }
        }
        i += 1;
    }
    None
}

/// All top-level variable tokens in `text`, left to right.
pub fn find_variables(text: &str) -> Vec<VariableMatch<'_>> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(m) = search_variable_from(text, from) {
        from = m.end;
        found.push(m);
    }
    found
}

/// True if `text` is exactly one variable token, item accessors allowed.
pub fn is_single_variable(text: &str) -> bool {
    matches!(search_variable(text), Some(m) if m.start == 0 && m.end == text.len())
}

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

//! Steps of tests and user keywords.
//!
//! Steps are built from rows of cells. A row inside a loop body carries a
//! marker as its first cell: `\` for the old backslash syntax, or an empty
//! cell for rows indented deeper than the surrounding steps. The same row
//! representation is used by the parser and by grid editing, so
//! [`build_steps`] and [`flatten_steps`] are inverses of each other.

use super::{split_comment, with_comment};
use crate::names::{is_assign, is_variable, normalize, strip_assign_mark};

/// Sentinel keyword used for commented-out rows.
pub const COMMENT_KEYWORD: &str = "Comment";
/// Marker cell of old-style loop body rows.
pub const LOOP_CONTINUATION: &str = "\\";
/// Closes a `FOR` block.
pub const END_MARKER: &str = "END";

/// Block openers closed by [`END_MARKER`].
const BLOCK_OPENERS: [&str; 4] = ["FOR", "IF", "WHILE", "TRY"];

/// A keyword invocation, or a row holding only a comment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeywordCall {
    /// Assignment targets without the optional trailing `=`.
    pub assign: Vec<String>,
    /// Keyword name; `None` for comment-only and empty rows.
    pub keyword: Option<String>,
    pub args: Vec<String>,
    /// Trailing comment cells, each as written (the first starts with `#`).
    pub comment: Vec<String>,
    /// Loop body marker of a row standing outside any loop, such as a body
    /// row whose loop header was edited away.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub marker: Option<LoopStyle>,
}

impl KeywordCall {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Some(keyword.into()),
            ..Self::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_assign<I, S>(mut self, assign: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assign = assign.into_iter().map(Into::into).collect();
        self
    }

    /// Build a call from the cells of one row.
    pub fn from_cells(cells: &[String]) -> Self {
        let (data, comment) = split_comment(cells);
        let mut n_assign = data.iter().take_while(|c| is_assign(c)).count();
        if n_assign == data.len() {
            n_assign = n_assign.saturating_sub(1);
        }
        let assign = data[..n_assign]
            .iter()
            .map(|c| strip_assign_mark(c).to_string())
            .collect();
        Self {
            assign,
            keyword: data.get(n_assign).cloned(),
            args: data.get(n_assign + 1..).map(<[String]>::to_vec).unwrap_or_default(),
            comment,
            marker: None,
        }
    }

    /// Cells of the row, in order, without the loop marker.
    pub fn to_cells(&self) -> Vec<String> {
        let mut cells = self.assign.clone();
        if self.keyword.is_some() || !self.args.is_empty() {
            cells.push(self.keyword.clone().unwrap_or_default());
        }
        cells.extend(self.args.iter().cloned());
        with_comment(cells, &self.comment)
    }

    /// True for a row with no cells at all.
    pub fn is_empty(&self) -> bool {
        self.assign.is_empty() && self.keyword.is_none() && self.args.is_empty() && self.comment.is_empty()
    }

    /// True for a row holding only a comment.
    pub fn is_comment(&self) -> bool {
        self.keyword.is_none() && self.assign.is_empty() && !self.comment.is_empty()
    }

    /// True if the row was commented out with the `Comment` sentinel.
    pub fn is_commented_out(&self) -> bool {
        self.keyword.as_deref() == Some(COMMENT_KEYWORD)
    }
}

/// Loop flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ForFlavor {
    In,
    InRange,
    InEnumerate,
    InZip,
}

impl ForFlavor {
    /// Recognise a flavor separator cell (`IN`, `IN RANGE`, ...).
    pub fn from_token(token: &str) -> Option<Self> {
        match normalize(token).as_str() {
            "in" => Some(Self::In),
            "inrange" => Some(Self::InRange),
            "inenumerate" => Some(Self::InEnumerate),
            "inzip" => Some(Self::InZip),
            _ => None,
        }
    }

    /// Canonical spelling.
    pub fn label(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::InRange => "IN RANGE",
            Self::InEnumerate => "IN ENUMERATE",
            Self::InZip => "IN ZIP",
        }
    }
}

/// How a loop body is laid out in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoopStyle {
    /// Body rows start with a `\` cell.
    Backslash,
    /// Body rows are indented one level deeper than the header.
    Indented,
}

impl LoopStyle {
    /// Marker cell of body rows in grid form.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Backslash => LOOP_CONTINUATION,
            Self::Indented => "",
        }
    }
}

/// A `FOR` or `: FOR` loop with its body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForLoop {
    /// Header cell as written: `FOR`, `: FOR` or `:FOR`.
    pub header: String,
    pub variables: Vec<String>,
    pub flavor: ForFlavor,
    /// Flavor cell as written.
    pub separator: String,
    pub values: Vec<String>,
    pub comment: Vec<String>,
    pub body: Vec<Step>,
    pub style: LoopStyle,
    /// Closing `END` row cells, when present.
    pub end: Option<Vec<String>>,
}

impl ForLoop {
    /// A new-style loop `FOR  <var>  IN  <values>` ... `END`.
    pub fn new<I, S>(variable: impl Into<String>, flavor: ForFlavor, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: "FOR".to_string(),
            variables: vec![variable.into()],
            flavor,
            separator: flavor.label().to_string(),
            values: values.into_iter().map(Into::into).collect(),
            comment: Vec::new(),
            body: Vec::new(),
            style: LoopStyle::Indented,
            end: Some(vec![END_MARKER.to_string()]),
        }
    }

    /// True for the `: FOR` syntax.
    pub fn is_old_style(&self) -> bool {
        self.header != "FOR"
    }

    /// Header row cells.
    pub fn header_cells(&self) -> Vec<String> {
        let mut cells = vec![self.header.clone()];
        cells.extend(self.variables.iter().cloned());
        cells.push(self.separator.clone());
        cells.extend(self.values.iter().cloned());
        with_comment(cells, &self.comment)
    }

    /// Marker cell prefixed to flattened body rows.
    pub fn body_marker(&self) -> &'static str {
        self.style.marker()
    }

    fn parse_header(cells: &[String]) -> Option<Self> {
        let header = cells.first()?;
        if !is_loop_header(header) {
            return None;
        }
        let (data, comment) = split_comment(&cells[1..]);
        let sep = data.iter().position(|c| ForFlavor::from_token(c).is_some())?;
        let variables: Vec<String> = data[..sep]
            .iter()
            .map(|c| strip_assign_mark(c).to_string())
            .collect();
        if variables.is_empty() || !variables.iter().all(|v| is_variable(v)) {
            return None;
        }
        let flavor = ForFlavor::from_token(&data[sep])?;
        Some(Self {
            header: header.clone(),
            variables,
            flavor,
            separator: data[sep].clone(),
            values: data[sep + 1..].to_vec(),
            comment,
            body: Vec::new(),
            style: if header == "FOR" {
                LoopStyle::Indented
            } else {
                LoopStyle::Backslash
            },
            end: None,
        })
    }
}

/// True for `FOR`, `: FOR` and `:FOR` (the old forms are case-insensitive).
pub fn is_loop_header(cell: &str) -> bool {
    cell == "FOR" || normalize(cell) == ":for"
}

/// One row of a test or keyword body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Step {
    Call(KeywordCall),
    For(ForLoop),
}

impl Step {
    /// Keyword name of a call; `None` for loops, comments and empty rows.
    pub fn keyword(&self) -> Option<&str> {
        match self {
            Step::Call(call) => call.keyword.as_deref(),
            Step::For(_) => None,
        }
    }

    pub fn as_call(&self) -> Option<&KeywordCall> {
        match self {
            Step::Call(call) => Some(call),
            Step::For(_) => None,
        }
    }

    /// Rows of cells this step occupies.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        match self {
            Step::Call(call) => {
                let mut cells: Vec<String> =
                    call.marker.iter().map(|m| m.marker().to_string()).collect();
                cells.extend(call.to_cells());
                vec![cells]
            }
            Step::For(lp) => {
                let mut rows = vec![lp.header_cells()];
                let marker = lp.body_marker();
                for row in flatten_steps(&lp.body) {
                    let mut cells = vec![marker.to_string()];
                    cells.extend(row);
                    rows.push(cells);
                }
                if let Some(end) = &lp.end {
                    rows.push(end.clone());
                }
                rows
            }
        }
    }

    /// True for a call without any cells.
    pub fn is_empty(&self) -> bool {
        matches!(self, Step::Call(call) if call.is_empty())
    }
}

impl From<KeywordCall> for Step {
    fn from(call: KeywordCall) -> Self {
        Step::Call(call)
    }
}

/// Flatten steps into rows of cells.
pub fn flatten_steps(steps: &[Step]) -> Vec<Vec<String>> {
    steps.iter().flat_map(Step::to_rows).collect()
}

/// Build steps from rows of cells, grouping loop bodies.
pub fn build_steps(rows: &[Vec<String>]) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut i = 0;
    while i < rows.len() {
        let row = &rows[i];
        if let Some(header) = ForLoop::parse_header(row) {
            let (lp, consumed) = collect_loop(header, &rows[i + 1..]);
            steps.push(Step::For(lp));
            i += 1 + consumed;
            continue;
        }
        let marker = marker_of(row).filter(|_| row.len() > 1);
        let cells = if marker.is_some() { &row[1..] } else { &row[..] };
        let mut call = KeywordCall::from_cells(cells);
        call.marker = marker;
        steps.push(Step::Call(call));
        i += 1;
    }
    steps
}

fn marker_of(row: &[String]) -> Option<LoopStyle> {
    match row.first().map(String::as_str) {
        Some("") => Some(LoopStyle::Indented),
        Some(LOOP_CONTINUATION) => Some(LoopStyle::Backslash),
        _ => None,
    }
}

fn is_end_row(row: &[String]) -> bool {
    row.first().is_some_and(|c| c == END_MARKER)
}

/// Index of the `END` row closing a block that starts before `rows`.
fn matching_end(rows: &[Vec<String>]) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, row) in rows.iter().enumerate() {
        if marker_of(row).is_some() {
            continue;
        }
        match row.first().map(String::as_str) {
            Some(END_MARKER) if depth == 0 => return Some(idx),
            Some(END_MARKER) => depth -= 1,
            Some(opener) if BLOCK_OPENERS.contains(&opener) => depth += 1,
            _ => {}
        }
    }
    None
}

fn collect_loop(mut lp: ForLoop, rest: &[Vec<String>]) -> (ForLoop, usize) {
    let mut body_rows = Vec::new();
    let mut style = None;
    let consumed;

    match (!lp.is_old_style()).then(|| matching_end(rest)).flatten() {
        Some(end_idx) => {
            for row in &rest[..end_idx] {
                match marker_of(row) {
                    Some(marker) => {
                        style.get_or_insert(marker);
                        body_rows.push(row[1..].to_vec());
                    }
                    None => {
                        style.get_or_insert(LoopStyle::Indented);
                        body_rows.push(row.clone());
                    }
                }
            }
            lp.end = Some(rest[end_idx].clone());
            consumed = end_idx + 1;
        }
        None => {
            let mut j = 0;
            while let Some(marker) = rest.get(j).and_then(|row| marker_of(row)) {
                style.get_or_insert(marker);
                body_rows.push(rest[j][1..].to_vec());
                j += 1;
            }
            if lp.is_old_style() && rest.get(j).is_some_and(|row| is_end_row(row)) {
                lp.end = Some(rest[j].clone());
                j += 1;
            }
            consumed = j;
        }
    }

    if let Some(style) = style {
        lp.style = style;
    }
    lp.body = build_steps(&body_rows);
    (lp, consumed)
}

/// Visit every keyword call, including those inside loop bodies.
pub fn for_each_call<'a>(steps: &'a [Step], f: &mut impl FnMut(&'a KeywordCall)) {
    for step in steps {
        match step {
            Step::Call(call) => f(call),
            Step::For(lp) => for_each_call(&lp.body, f),
        }
    }
}

/// Mutable variant of [`for_each_call`].
pub fn for_each_call_mut(steps: &mut [Step], f: &mut impl FnMut(&mut KeywordCall)) {
    for step in steps {
        match step {
            Step::Call(call) => f(call),
            Step::For(lp) => for_each_call_mut(&mut lp.body, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn rows(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter().map(|r| s(r)).collect()
    }

    // ==================== KeywordCall tests ====================

    #[test]
    fn test_call_from_cells() {
        let call = KeywordCall::from_cells(&s(&["${a}=", "${b}", "Get Values", "x", "# why"]));
        assert_eq!(call.assign, s(&["${a}", "${b}"]));
        assert_eq!(call.keyword.as_deref(), Some("Get Values"));
        assert_eq!(call.args, s(&["x"]));
        assert_eq!(call.comment, s(&["# why"]));
    }

    #[test]
    fn test_call_comment_only() {
        let call = KeywordCall::from_cells(&s(&["# just a note"]));
        assert!(call.is_comment());
        assert_eq!(call.to_cells(), s(&["# just a note"]));
    }

    #[test]
    fn test_call_lone_variable_is_keyword() {
        let call = KeywordCall::from_cells(&s(&["${x}"]));
        assert!(call.assign.is_empty());
        assert_eq!(call.keyword.as_deref(), Some("${x}"));
    }

    #[test]
    fn test_call_cells_roundtrip() {
        let call = KeywordCall::new("Log").with_args(["a", "b"]).with_assign(["${r}"]);
        assert_eq!(KeywordCall::from_cells(&call.to_cells()), call);
    }

    #[test]
    fn test_commented_out() {
        let call = KeywordCall::from_cells(&s(&["Comment", "Log", "x"]));
        assert!(call.is_commented_out());
    }

    // ==================== build_steps tests ====================

    #[test]
    fn test_old_style_loop_indented_body() {
        let steps = build_steps(&rows(&[
            &[": FOR", "${i}", "IN", "1", "2", "3"],
            &["", "Log", "${i}"],
            &["No Operation"],
        ]));
        assert_eq!(steps.len(), 2);
        let Step::For(lp) = &steps[0] else {
            panic!("expected loop")
        };
        assert_eq!(lp.variables, s(&["${i}"]));
        assert_eq!(lp.flavor, ForFlavor::In);
        assert_eq!(lp.values, s(&["1", "2", "3"]));
        assert_eq!(lp.style, LoopStyle::Indented);
        assert_eq!(lp.body.len(), 1);
        assert_eq!(lp.body[0].keyword(), Some("Log"));
        assert_eq!(steps[1].keyword(), Some("No Operation"));
    }

    #[test]
    fn test_old_style_loop_backslash_body() {
        let steps = build_steps(&rows(&[
            &[":FOR", "${i}", "IN RANGE", "10"],
            &["\\", "Log", "${i}"],
            &["\\", "Log", "again"],
        ]));
        let Step::For(lp) = &steps[0] else {
            panic!("expected loop")
        };
        assert_eq!(lp.flavor, ForFlavor::InRange);
        assert_eq!(lp.style, LoopStyle::Backslash);
        assert_eq!(lp.body.len(), 2);
    }

    #[test]
    fn test_new_style_loop_with_end() {
        let steps = build_steps(&rows(&[
            &["FOR", "${x}", "IN", "a", "b"],
            &["", "Log", "${x}"],
            &["END"],
            &["Log", "done"],
        ]));
        assert_eq!(steps.len(), 2);
        let Step::For(lp) = &steps[0] else {
            panic!("expected loop")
        };
        assert_eq!(lp.end, Some(s(&["END"])));
        assert_eq!(lp.body.len(), 1);
    }

    #[test]
    fn test_new_style_loop_flat_body_with_nested_if() {
        let steps = build_steps(&rows(&[
            &["FOR", "${x}", "IN", "a"],
            &["IF", "$x == 'a'"],
            &["Log", "${x}"],
            &["END"],
            &["END"],
        ]));
        assert_eq!(steps.len(), 1);
        let Step::For(lp) = &steps[0] else {
            panic!("expected loop")
        };
        assert_eq!(lp.body.len(), 3);
    }

    #[test]
    fn test_nested_loops() {
        let steps = build_steps(&rows(&[
            &["FOR", "${x}", "IN", "a"],
            &["", "FOR", "${y}", "IN", "b"],
            &["", "", "Log", "${y}"],
            &["", "END"],
            &["END"],
        ]));
        let Step::For(outer) = &steps[0] else {
            panic!("expected loop")
        };
        let Step::For(inner) = &outer.body[0] else {
            panic!("expected inner loop")
        };
        assert_eq!(inner.body.len(), 1);
        assert!(inner.end.is_some());
    }

    #[test]
    fn test_stray_marker_outside_loop_is_kept() {
        let input = rows(&[&["", "Log", "x"], &["\\", "No Operation"], &["Log", "y"]]);
        let steps = build_steps(&input);
        assert_eq!(steps[0].keyword(), Some("Log"));
        assert_eq!(steps[1].keyword(), Some("No Operation"));
        assert_eq!(steps[0].as_call().and_then(|c| c.marker), Some(LoopStyle::Indented));
        assert_eq!(steps[2].as_call().and_then(|c| c.marker), None);
        assert_eq!(flatten_steps(&steps), input);
    }

    #[test]
    fn test_loop_body_keeps_markers_when_header_breaks() {
        let original = rows(&[
            &[": FOR", "${i}", "IN", "1", "2", "3"],
            &["", "Log", "${i}"],
            &["No Operation"],
        ]);
        let mut edited = original.clone();
        edited[0][0] = "Log".to_string();
        let detached = flatten_steps(&build_steps(&edited));
        assert_eq!(detached, edited);

        let mut restored = detached;
        restored[0][0] = ": FOR".to_string();
        let steps = build_steps(&restored);
        assert!(matches!(&steps[0], Step::For(lp) if lp.body.len() == 1));
        assert_eq!(flatten_steps(&steps), original);
    }

    #[test]
    fn test_header_without_flavor_is_a_call() {
        let steps = build_steps(&rows(&[&["FOR", "${x}", "a"]]));
        assert_eq!(steps[0].keyword(), Some("FOR"));
    }

    // ==================== flatten_steps tests ====================

    #[test]
    fn test_flatten_is_inverse_of_build() {
        let input = rows(&[
            &[": FOR", "${i}", "IN", "1", "2"],
            &["\\", "Log", "${i}"],
            &["\\"],
            &["FOR", "${x}", "IN ZIP", "${a}", "${b}"],
            &["", "Log", "${x}"],
            &["END"],
            &["${v}", "Get", "# c"],
        ]);
        let steps = build_steps(&input);
        assert_eq!(flatten_steps(&steps), input);
        assert_eq!(build_steps(&flatten_steps(&steps)), steps);
    }

    #[test]
    fn test_for_each_call_visits_bodies() {
        let steps = build_steps(&rows(&[
            &["FOR", "${x}", "IN", "a"],
            &["", "Log", "${x}"],
            &["END"],
            &["Log", "after"],
        ]));
        let mut names = Vec::new();
        for_each_call(&steps, &mut |call| names.extend(call.keyword.clone()));
        assert_eq!(names, s(&["Log", "Log"]));
    }
}

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

//! Format-independent layout of a data file as rows of cells.
//!
//! Every format writer renders the same [`Layout`], so the three formats only
//! differ in how a row with a nesting level is spelled out.

use rfide_core::model::{
    flatten_steps, DataFile, ItemSetting, LoopStyle, Step, TableHeader, LOOP_CONTINUATION,
};
use rfide_core::{Language, TableKind};

/// Marker of a continuation row.
pub const CONTINUATION: &str = "...";

/// One physical output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutRow {
    /// Nesting level; level 1 is the body of a test or keyword.
    pub level: usize,
    pub cells: Vec<String>,
    /// True if the first cell is the name of a test or keyword.
    pub is_name: bool,
}

impl OutRow {
    /// Cells counting one empty cell per nesting level.
    pub fn width(&self) -> usize {
        self.level + self.cells.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutTable {
    pub kind: TableKind,
    pub header: Vec<String>,
    pub rows: Vec<OutRow>,
}

impl OutTable {
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(OutRow::width)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    /// Rows before the first table, including the `Language:` marker.
    pub preamble: Vec<OutRow>,
    pub tables: Vec<OutTable>,
}

impl Layout {
    /// Visit every data cell.
    pub fn cells(&self) -> impl Iterator<Item = &String> {
        self.preamble
            .iter()
            .chain(self.tables.iter().flat_map(|t| t.rows.iter()))
            .flat_map(|row| row.cells.iter())
            .chain(self.tables.iter().flat_map(|t| t.header.iter()))
    }
}

fn is_comment_row(cells: &[String]) -> bool {
    cells
        .iter()
        .find(|c| !(c.is_empty() || *c == LOOP_CONTINUATION))
        .is_some_and(|c| c.starts_with('#'))
}

struct Builder {
    max_cells: usize,
    rows: Vec<OutRow>,
}

impl Builder {
    fn new(max_cells: usize) -> Self {
        Self {
            max_cells,
            rows: Vec::new(),
        }
    }

    /// Add a logical row, wrapping long rows onto continuation rows.
    ///
    /// Comment rows are never wrapped: a continuation row always extends the
    /// last data row when read back.
    fn push(&mut self, level: usize, cells: Vec<String>, is_name: bool) {
        if cells.len() <= self.max_cells || is_comment_row(&cells) {
            self.rows.push(OutRow {
                level,
                cells,
                is_name,
            });
            return;
        }
        let mut rest = cells.into_iter();
        let first: Vec<String> = rest.by_ref().take(self.max_cells).collect();
        self.rows.push(OutRow {
            level,
            cells: first,
            is_name,
        });
        loop {
            let chunk: Vec<String> = rest.by_ref().take(self.max_cells - 1).collect();
            if chunk.is_empty() {
                break;
            }
            let mut cells = Vec::with_capacity(chunk.len() + 1);
            cells.push(CONTINUATION.to_string());
            cells.extend(chunk);
            self.rows.push(OutRow {
                level,
                cells,
                is_name: false,
            });
        }
    }

    /// A row kept as read; a leading empty cell means one level of indent.
    fn push_raw(&mut self, cells: &[String]) {
        match cells.split_first() {
            Some((first, rest)) if first.is_empty() && !rest.is_empty() => {
                self.push(1, rest.to_vec(), false)
            }
            _ => self.push(0, cells.to_vec(), false),
        }
    }

    fn push_steps(&mut self, steps: &[Step], level: usize) {
        for step in steps {
            match step {
                Step::Call(call) => match call.marker {
                    Some(LoopStyle::Indented) => self.push(level + 1, call.to_cells(), false),
                    Some(LoopStyle::Backslash) => {
                        let mut cells = vec![LOOP_CONTINUATION.to_string()];
                        cells.extend(call.to_cells());
                        self.push(level, cells, false);
                    }
                    None if !call.is_empty() => self.push(level, call.to_cells(), false),
                    None => {}
                },
                Step::For(lp) => {
                    self.push(level, lp.header_cells(), false);
                    if lp.body_marker() == LOOP_CONTINUATION {
                        for row in flatten_steps(&lp.body) {
                            let mut cells = Vec::with_capacity(row.len() + 1);
                            cells.push(LOOP_CONTINUATION.to_string());
                            cells.extend(row);
                            self.push(level, cells, false);
                        }
                    } else {
                        self.push_steps(&lp.body, level + 1);
                    }
                    if let Some(end) = &lp.end {
                        self.push(level, end.clone(), false);
                    }
                }
            }
        }
    }

    fn push_item(
        &mut self,
        name: &str,
        settings: &[ItemSetting],
        steps: &[Step],
        language: &Language,
    ) {
        self.push(0, vec![name.to_string()], true);
        let (trailing, leading): (Vec<&ItemSetting>, Vec<&ItemSetting>) = settings
            .iter()
            .partition(|s| matches!(s, ItemSetting::Return(_)));
        for setting in leading {
            self.push(1, setting.to_cells(language), false);
        }
        self.push_steps(steps, 1);
        for setting in trailing {
            self.push(1, setting.to_cells(language), false);
        }
    }

    fn finish(self) -> Vec<OutRow> {
        self.rows
    }
}

fn header_cells(header: Option<&TableHeader>, kind: TableKind, language: &Language) -> Vec<String> {
    match header {
        Some(header) => header.cells.clone(),
        None => TableHeader::standard(language.table_label(kind)).cells,
    }
}

/// Lay out a file in canonical table order.
pub fn layout(file: &DataFile, max_cells: usize) -> Layout {
    let language = file.language();
    let max_cells = max_cells.max(2);
    let mut out = Layout::default();

    let mut preamble = Builder::new(max_cells);
    if let Some(name) = &file.language {
        preamble.push(0, vec![format!("Language: {}", name)], false);
    }
    for row in &file.preamble {
        preamble.push_raw(row);
    }
    out.preamble = preamble.finish();

    let settings = &file.settings;
    if settings.header.is_some() || !settings.is_empty() {
        let mut rows = Builder::new(max_cells);
        for setting in &settings.items {
            rows.push(0, setting.to_cells(language), false);
        }
        out.tables.push(OutTable {
            kind: TableKind::Settings,
            header: header_cells(settings.header.as_ref(), TableKind::Settings, language),
            rows: rows.finish(),
        });
    }

    let variables = &file.variables;
    if variables.header.is_some() || !variables.is_empty() {
        let mut rows = Builder::new(max_cells);
        for variable in &variables.items {
            rows.push(0, variable.to_cells(), false);
        }
        out.tables.push(OutTable {
            kind: TableKind::Variables,
            header: header_cells(variables.header.as_ref(), TableKind::Variables, language),
            rows: rows.finish(),
        });
    }

    let tests = &file.tests;
    if tests.header.is_some() || !tests.is_empty() {
        let mut rows = Builder::new(max_cells);
        for comment in &tests.comments {
            rows.push_raw(comment);
        }
        for test in &tests.items {
            rows.push_item(&test.name, &test.settings, &test.steps, language);
        }
        let header = header_cells(tests.header.as_ref(), TableKind::TestCases, language);
        let kind = header
            .first()
            .and_then(|cell| language.table_kind(cell))
            .unwrap_or(TableKind::TestCases);
        out.tables.push(OutTable {
            kind,
            header,
            rows: rows.finish(),
        });
    }

    let keywords = &file.keywords;
    if keywords.header.is_some() || !keywords.is_empty() {
        let mut rows = Builder::new(max_cells);
        for comment in &keywords.comments {
            rows.push_raw(comment);
        }
        for keyword in &keywords.items {
            rows.push_item(&keyword.name, &keyword.settings, &keyword.steps, language);
        }
        out.tables.push(OutTable {
            kind: TableKind::Keywords,
            header: header_cells(keywords.header.as_ref(), TableKind::Keywords, language),
            rows: rows.finish(),
        });
    }

    for table in &file.comment_tables {
        let mut rows = Builder::new(max_cells);
        for row in &table.rows {
            rows.push_raw(row);
        }
        out.tables.push(OutTable {
            kind: TableKind::Comments,
            header: table.header.cells.clone(),
            rows: rows.finish(),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfide_core::model::{
        ForFlavor, ForLoop, Import, ItemSetting, KeywordCall, LoopStyle, ReturnValues, Setting,
        UserKeyword,
    };
    use rfide_core::{FileKind, Format};

    fn s(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_synthesized_headers() {
        let mut file = DataFile::new(FileKind::TestCaseFile, Format::Robot);
        file.settings.items.push(Setting::Import(Import::library("Collections")));
        let layout = layout(&file, 8);
        assert_eq!(layout.tables.len(), 1);
        assert_eq!(layout.tables[0].header, s(&["*** Settings ***"]));
        assert_eq!(layout.tables[0].rows[0].cells, s(&["Library", "Collections"]));
    }

    #[test]
    fn test_long_rows_wrap() {
        let mut file = DataFile::default();
        let mut kw = UserKeyword::new("K");
        kw.steps.push(
            KeywordCall::new("Log Many")
                .with_args(["1", "2", "3", "4", "5", "6", "7", "8", "9"])
                .into(),
        );
        file.keywords.items.push(kw);
        let rows = &layout(&file, 4).tables[0].rows;
        let cells: Vec<_> = rows.iter().map(|r| (r.level, r.cells.clone())).collect();
        assert_eq!(
            cells,
            vec![
                (0, s(&["K"])),
                (1, s(&["Log Many", "1", "2", "3"])),
                (1, s(&["...", "4", "5", "6"])),
                (1, s(&["...", "7", "8", "9"])),
            ]
        );
        assert!(rows[0].is_name);
    }

    #[test]
    fn test_long_comment_rows_not_wrapped() {
        let mut file = DataFile::default();
        let mut kw = UserKeyword::new("K");
        kw.steps.push(KeywordCall::new("Log").with_args(["x"]).into());
        let comment = KeywordCall {
            comment: s(&["# a", "b", "c", "d", "e", "f", "g"]),
            ..KeywordCall::default()
        };
        kw.steps.push(comment.into());
        file.keywords.items.push(kw);
        let rows = &layout(&file, 4).tables[0].rows;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].cells.len(), 7);
        assert!(rows.iter().all(|r| r.cells.first().map(String::as_str) != Some(CONTINUATION)));
    }

    #[test]
    fn test_detached_body_rows_keep_their_marker() {
        let mut file = DataFile::default();
        let mut kw = UserKeyword::new("K");
        let mut indented = KeywordCall::new("Log").with_args(["${i}"]);
        indented.marker = Some(LoopStyle::Indented);
        let mut backslash = KeywordCall::new("No Operation");
        backslash.marker = Some(LoopStyle::Backslash);
        kw.steps.push(indented.into());
        kw.steps.push(backslash.into());
        file.keywords.items.push(kw);
        let rows = &layout(&file, 8).tables[0].rows;
        let cells: Vec<_> = rows.iter().map(|r| (r.level, r.cells.clone())).collect();
        assert_eq!(
            cells[1..],
            [(2, s(&["Log", "${i}"])), (1, s(&["\\", "No Operation"]))]
        );
    }

    #[test]
    fn test_return_setting_written_last() {
        let mut file = DataFile::default();
        let mut kw = UserKeyword::new("K");
        kw.settings.push(ItemSetting::Return(ReturnValues {
            values: s(&["${x}"]),
            comment: Vec::new(),
        }));
        kw.steps.push(KeywordCall::new("No Operation").into());
        file.keywords.items.push(kw);
        let rows = &layout(&file, 8).tables[0].rows;
        assert_eq!(rows[1].cells, s(&["No Operation"]));
        assert_eq!(rows[2].cells, s(&["[Return]", "${x}"]));
    }

    #[test]
    fn test_loop_levels() {
        let mut file = DataFile::default();
        let mut lp = ForLoop::new("${i}", ForFlavor::In, ["a"]);
        lp.body.push(KeywordCall::new("Log").with_args(["${i}"]).into());
        let mut old = lp.clone();
        old.header = ": FOR".into();
        old.style = LoopStyle::Backslash;
        old.end = None;
        let mut kw = UserKeyword::new("K");
        kw.steps.push(Step::For(lp));
        kw.steps.push(Step::For(old));
        file.keywords.items.push(kw);

        let rows = &layout(&file, 8).tables[0].rows;
        let cells: Vec<_> = rows.iter().map(|r| (r.level, r.cells.clone())).collect();
        assert_eq!(
            cells[1..],
            [
                (1, s(&["FOR", "${i}", "IN", "a"])),
                (2, s(&["Log", "${i}"])),
                (1, s(&["END"])),
                (1, s(&[": FOR", "${i}", "IN", "a"])),
                (1, s(&["\\", "Log", "${i}"])),
            ]
        );
    }

    #[test]
    fn test_language_marker_in_preamble() {
        let mut file = DataFile::default();
        file.language = Some("German".into());
        file.settings.items.push(Setting::Import(Import::library("X")));
        let layout = layout(&file, 8);
        assert_eq!(layout.preamble[0].cells, s(&["Language: German"]));
        assert_eq!(layout.tables[0].rows[0].cells, s(&["Bibliothek", "X"]));
    }
}

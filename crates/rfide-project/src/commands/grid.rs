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

//! Commands on the step grid of a test or keyword.
//!
//! The grid is the flattened row view of the steps: a loop contributes its
//! header row, one row per body step prefixed with the loop marker cell,
//! and its `END` row. Every command rebuilds the steps from the edited rows.

use super::primitive::{set_rows, ReplaceRows};
use super::{Command, CommandContext};
use crate::error::{CommandError, CommandResult};
use rfide_core::model::{COMMENT_KEYWORD, LOOP_CONTINUATION};
use rfide_core::names::eq_normalized;
use rfide_namespace::{FileId, ItemRef};

type Rows = Vec<Vec<String>>;

/// Top-left and bottom-right corners of a cell area, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

impl Area {
    pub fn new(top_left: (usize, usize), bottom_right: (usize, usize)) -> Self {
        Self {
            top: top_left.0.min(bottom_right.0),
            left: top_left.1.min(bottom_right.1),
            bottom: top_left.0.max(bottom_right.0),
            right: top_left.1.max(bottom_right.1),
        }
    }

    fn width(&self) -> usize {
        self.right - self.left + 1
    }
}

fn trim_row(row: &mut Vec<String>) {
    while row.last().is_some_and(|c| c.is_empty()) {
        row.pop();
    }
}

fn set_cell(rows: &mut Rows, row: usize, col: usize, value: &str) {
    if rows.len() <= row {
        rows.resize_with(row + 1, Vec::new);
    }
    let cells = &mut rows[row];
    if cells.len() <= col {
        cells.resize(col + 1, String::new());
    }
    cells[col] = value.to_string();
    trim_row(cells);
}

/// Number of leading loop marker cells of a body row.
pub(super) fn data_start(row: &[String]) -> usize {
    if row.len() > 1 && (row[0].is_empty() || row[0] == LOOP_CONTINUATION) {
        1
    } else {
        0
    }
}

fn is_empty_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

fn is_commented(row: &[String]) -> bool {
    row.get(data_start(row))
        .is_some_and(|c| eq_normalized(c, COMMENT_KEYWORD))
}

fn check_row(rows: &Rows, row: usize) -> CommandResult<()> {
    if row >= rows.len() {
        return Err(CommandError::RowOutOfRange { row, len: rows.len() });
    }
    Ok(())
}

/// Apply `edit` to the rows of the target item; the inverse restores the
/// whole grid.
fn rewrite_rows(
    ctx: &mut CommandContext<'_>,
    command: &'static str,
    edit: impl FnOnce(&mut Rows) -> CommandResult<()>,
) -> CommandResult<Option<Box<dyn Command>>> {
    let (file, item) = ctx.target_item(command)?;
    let old = ctx.rows(file, item)?;
    let mut rows = old.clone();
    edit(&mut rows)?;
    if rows == old {
        return Ok(None);
    }
    set_rows(ctx, file, item, &rows)?;
    let new_len = ctx.rows(file, item)?.len();
    Ok(Some(Box::new(ReplaceRows::all(file, item, new_len, old))))
}

/// Write `rows` and return `local` as the inverse, unless rebuilding the
/// steps reshaped other rows.
///
/// Continuation cells can merge rows and a loop header can stop being one.
/// Then only a full restore reverts the edit, and it must not merge with
/// later edits.
fn write_with_inverse(
    ctx: &mut CommandContext<'_>,
    file: FileId,
    item: ItemRef,
    rows: &Rows,
    old: Rows,
    local: ReplaceRows,
) -> CommandResult<Option<Box<dyn Command>>> {
    set_rows(ctx, file, item, rows)?;
    let rebuilt = ctx.rows(file, item)?;
    if rebuilt != *rows {
        return Ok(Some(Box::new(ReplaceRows::all(file, item, rebuilt.len(), old))));
    }
    Ok(Some(Box::new(local)))
}

/// Set one cell, growing the grid as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeCellValue {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

impl ChangeCellValue {
    pub fn new(row: usize, col: usize, value: impl Into<String>) -> Self {
        Self {
            row,
            col,
            value: value.into(),
        }
    }
}

impl Command for ChangeCellValue {
    fn name(&self) -> &'static str {
        "change cell value"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let (file, item) = ctx.target_item(self.name())?;
        let old = ctx.rows(file, item)?;
        let len = old.len();
        let inverse = if self.row < len {
            if old[self.row].get(self.col).map_or(self.value.is_empty(), |c| *c == self.value) {
                return Ok(None);
            }
            ReplaceRows::new(file, item, self.row, 1, vec![old[self.row].clone()])
        } else {
            ReplaceRows::new(file, item, len, self.row + 1 - len, Vec::new())
        };
        let mut rows = old.clone();
        set_cell(&mut rows, self.row, self.col, &self.value);
        write_with_inverse(ctx, file, item, &rows, old, inverse.for_cell(self.row, self.col))
    }
}

/// Insert an empty row before `index`; `index == len` appends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddRow {
    pub index: usize,
}

impl AddRow {
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

impl Command for AddRow {
    fn name(&self) -> &'static str {
        "add row"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let (file, item) = ctx.target_item(self.name())?;
        let old = ctx.rows(file, item)?;
        let mut rows = old.clone();
        if self.index > rows.len() {
            return Err(CommandError::RowOutOfRange {
                row: self.index,
                len: rows.len(),
            });
        }
        // Inside a loop body the new row keeps the body marker.
        let row = match rows.get(self.index) {
            Some(next) if data_start(next) == 1 => vec![next[0].clone()],
            _ => Vec::new(),
        };
        rows.insert(self.index, row);
        let inverse = ReplaceRows::new(file, item, self.index, 1, Vec::new());
        write_with_inverse(ctx, file, item, &rows, old, inverse)
    }
}

/// Remove the row at `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteRow {
    pub index: usize,
}

impl DeleteRow {
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

impl Command for DeleteRow {
    fn name(&self) -> &'static str {
        "delete row"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let (file, item) = ctx.target_item(self.name())?;
        let old = ctx.rows(file, item)?;
        check_row(&old, self.index)?;
        let mut rows = old.clone();
        let removed = rows.remove(self.index);
        let inverse = ReplaceRows::new(file, item, self.index, 0, vec![removed]);
        write_with_inverse(ctx, file, item, &rows, old, inverse)
    }
}

/// Insert empty cells in an area, shifting the cells right of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertCells {
    pub area: Area,
}

impl InsertCells {
    pub fn new(top_left: (usize, usize), bottom_right: (usize, usize)) -> Self {
        Self {
            area: Area::new(top_left, bottom_right),
        }
    }
}

impl Command for InsertCells {
    fn name(&self) -> &'static str {
        "insert cells"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let area = self.area;
        rewrite_rows(ctx, self.name(), |rows| {
            check_row(rows, area.top)?;
            for row in rows.iter_mut().take(area.bottom + 1).skip(area.top) {
                if area.left < row.len() {
                    let blanks = std::iter::repeat(String::new()).take(area.width());
                    row.splice(area.left..area.left, blanks);
                }
            }
            Ok(())
        })
    }
}

/// Remove the cells of an area, shifting the cells right of it left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteCells {
    pub area: Area,
}

impl DeleteCells {
    pub fn new(top_left: (usize, usize), bottom_right: (usize, usize)) -> Self {
        Self {
            area: Area::new(top_left, bottom_right),
        }
    }
}

impl Command for DeleteCells {
    fn name(&self) -> &'static str {
        "delete cells"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let area = self.area;
        rewrite_rows(ctx, self.name(), |rows| {
            check_row(rows, area.top)?;
            for row in rows.iter_mut().take(area.bottom + 1).skip(area.top) {
                if area.left < row.len() {
                    let end = (area.right + 1).min(row.len());
                    row.drain(area.left..end);
                }
            }
            Ok(())
        })
    }
}

/// Empty every cell of an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearArea {
    pub area: Area,
}

impl ClearArea {
    pub fn new(top_left: (usize, usize), bottom_right: (usize, usize)) -> Self {
        Self {
            area: Area::new(top_left, bottom_right),
        }
    }
}

impl Command for ClearArea {
    fn name(&self) -> &'static str {
        "clear area"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let area = self.area;
        rewrite_rows(ctx, self.name(), |rows| {
            for row in rows.iter_mut().take(area.bottom + 1).skip(area.top) {
                for cell in row.iter_mut().take(area.right + 1).skip(area.left) {
                    cell.clear();
                }
                trim_row(row);
            }
            Ok(())
        })
    }
}

/// Overwrite cells starting at `top_left` with a block of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteArea {
    pub top_left: (usize, usize),
    pub data: Vec<Vec<String>>,
}

impl PasteArea {
    pub fn new(top_left: (usize, usize), data: Vec<Vec<String>>) -> Self {
        Self { top_left, data }
    }

    /// Parse clipboard text: rows on lines, cells separated by tabs.
    pub fn from_clipboard(top_left: (usize, usize), text: &str) -> Self {
        let data = text
            .lines()
            .map(|line| line.split('\t').map(str::to_string).collect())
            .collect();
        Self::new(top_left, data)
    }
}

impl Command for PasteArea {
    fn name(&self) -> &'static str {
        "paste area"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let (top, left) = self.top_left;
        let data = &self.data;
        rewrite_rows(ctx, self.name(), |rows| {
            for (i, line) in data.iter().enumerate() {
                for (j, value) in line.iter().enumerate() {
                    set_cell(rows, top + i, left + j, value);
                }
                if line.is_empty() && rows.len() <= top + i {
                    rows.resize_with(top + i + 1, Vec::new);
                }
            }
            Ok(())
        })
    }
}

/// Comment rows out by prepending the `Comment` keyword. Empty and already
/// commented rows are left as they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRows {
    pub rows: Vec<usize>,
}

impl CommentRows {
    pub fn new(rows: impl IntoIterator<Item = usize>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }
}

impl Command for CommentRows {
    fn name(&self) -> &'static str {
        "comment rows"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let selected = &self.rows;
        rewrite_rows(ctx, self.name(), |rows| {
            for &index in selected {
                check_row(rows, index)?;
            }
            for &index in selected {
                let row = &mut rows[index];
                if is_empty_row(row) || is_commented(row) {
                    continue;
                }
                let at = data_start(row);
                row.insert(at, COMMENT_KEYWORD.to_string());
            }
            Ok(())
        })
    }
}

/// Remove the `Comment` keyword added by [`CommentRows`]. Fails unless every
/// selected row starts with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncommentRows {
    pub rows: Vec<usize>,
}

impl UncommentRows {
    pub fn new(rows: impl IntoIterator<Item = usize>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }
}

impl Command for UncommentRows {
    fn name(&self) -> &'static str {
        "uncomment rows"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let selected = &self.rows;
        let name = self.name();
        rewrite_rows(ctx, name, |rows| {
            for &index in selected {
                check_row(rows, index)?;
                if !is_commented(&rows[index]) {
                    return Err(CommandError::invalid(
                        name,
                        format!("row {} is not commented out", index),
                    ));
                }
            }
            for &index in selected {
                let row = &mut rows[index];
                let at = data_start(row);
                row.remove(at);
            }
            Ok(())
        })
    }
}

/// Move rows `first..=last` up by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRowsUp {
    pub first: usize,
    pub last: usize,
}

impl MoveRowsUp {
    pub fn new(first: usize, last: usize) -> Self {
        Self {
            first: first.min(last),
            last: first.max(last),
        }
    }
}

impl Command for MoveRowsUp {
    fn name(&self) -> &'static str {
        "move rows up"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let (first, last) = (self.first, self.last);
        let name = self.name();
        rewrite_rows(ctx, name, |rows| {
            check_row(rows, last)?;
            if first == 0 {
                return Err(CommandError::invalid(name, "the first row cannot move up"));
            }
            rows[first - 1..=last].rotate_left(1);
            Ok(())
        })
    }
}

/// Move rows `first..=last` down by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRowsDown {
    pub first: usize,
    pub last: usize,
}

impl MoveRowsDown {
    pub fn new(first: usize, last: usize) -> Self {
        Self {
            first: first.min(last),
            last: first.max(last),
        }
    }
}

impl Command for MoveRowsDown {
    fn name(&self) -> &'static str {
        "move rows down"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let (first, last) = (self.first, self.last);
        let name = self.name();
        rewrite_rows(ctx, name, |rows| {
            check_row(rows, last)?;
            if last + 1 >= rows.len() {
                return Err(CommandError::invalid(name, "the last row cannot move down"));
            }
            rows[first..=last + 1].rotate_right(1);
            Ok(())
        })
    }
}

/// Drop rows whose cells are all empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Purify;

impl Command for Purify {
    fn name(&self) -> &'static str {
        "purify"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        rewrite_rows(ctx, self.name(), |rows| {
            rows.retain(|row| !is_empty_row(row));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    // ==================== Row helper tests ====================

    #[test]
    fn test_set_cell_pads_and_trims() {
        let mut rows = Rows::new();
        set_cell(&mut rows, 1, 2, "x");
        assert_eq!(rows, vec![Vec::<String>::new(), s(&["", "", "x"])]);
        set_cell(&mut rows, 1, 2, "");
        assert_eq!(rows[1], Vec::<String>::new());
    }

    #[test]
    fn test_data_start_skips_loop_marker() {
        assert_eq!(data_start(&s(&["", "Log", "x"])), 1);
        assert_eq!(data_start(&s(&["\\", "Log"])), 1);
        assert_eq!(data_start(&s(&["Log", "x"])), 0);
        assert_eq!(data_start(&s(&[""])), 0);
    }

    #[test]
    fn test_is_commented() {
        assert!(is_commented(&s(&["Comment", "Log"])));
        assert!(is_commented(&s(&["", "comment", "Log"])));
        assert!(!is_commented(&s(&["Log", "Comment"])));
    }

    #[test]
    fn test_area_normalizes_corners() {
        let area = Area::new((3, 4), (1, 2));
        assert_eq!((area.top, area.left, area.bottom, area.right), (1, 2, 3, 4));
        assert_eq!(area.width(), 3);
    }
}

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

//! In-memory model of Robot Framework test data.
//!
//! Every entity keeps the cells it was read from closely enough that writing
//! it back and reading it again produces an equal value.

mod file;
mod items;
mod settings;
mod step;
mod variables;

pub use file::{
    suite_name_from_path, CommentTable, DataFile, FileKind, Format, Suite, TableHeader,
    TestDataDirectory,
};
pub use items::{
    Arguments, ItemSetting, KeywordTable, ReturnValues, TestCase, TestCaseTable, UserKeyword,
};
pub use settings::{
    Alias, Documentation, Fixture, Import, ImportKind, Metadata, Setting, SettingTable, Tags,
    Template, Timeout,
};
pub use step::{
    build_steps, flatten_steps, for_each_call, for_each_call_mut, ForFlavor, ForLoop,
    KeywordCall, LoopStyle, Step, COMMENT_KEYWORD, END_MARKER, LOOP_CONTINUATION,
};
pub use variables::{Variable, VariableTable};

/// Split cells at the first cell starting with `#`.
///
/// Returns the data cells, with trailing empty cells dropped, and the comment
/// cells.
pub fn split_comment(cells: &[String]) -> (Vec<String>, Vec<String>) {
    let at = cells
        .iter()
        .position(|c| c.starts_with('#'))
        .unwrap_or(cells.len());
    let mut data = cells[..at].to_vec();
    while data.last().is_some_and(|c| c.is_empty()) {
        data.pop();
    }
    (data, cells[at..].to_vec())
}

/// Append comment cells to a row.
pub(crate) fn with_comment(mut cells: Vec<String>, comment: &[String]) -> Vec<String> {
    cells.extend(comment.iter().cloned());
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_split_comment() {
        let (data, comment) = split_comment(&s(&["Log", "x", "", "# note", "more"]));
        assert_eq!(data, s(&["Log", "x"]));
        assert_eq!(comment, s(&["# note", "more"]));
    }

    #[test]
    fn test_split_comment_without_comment() {
        let (data, comment) = split_comment(&s(&["a", "b"]));
        assert_eq!(data, s(&["a", "b"]));
        assert!(comment.is_empty());
    }

    #[test]
    fn test_escaped_hash_is_data() {
        let (data, comment) = split_comment(&s(&["Log", "\\# not a comment"]));
        assert_eq!(data.len(), 2);
        assert!(comment.is_empty());
    }
}

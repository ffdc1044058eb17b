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

//! Read-only views over open files for UI code.
//!
//! Controllers borrow the project, so they cannot outlive a change. Edits go
//! through [`Project::execute`](crate::Project::execute) with the
//! controller's [`target`](ItemController::target).

use crate::commands::{item_name, item_steps, Target};
use crate::project::{OpenFile, Project};
use rfide_core::model::flatten_steps;
use rfide_core::{DataFile, Diagnostic, ItemSetting, Step};
use rfide_namespace::{Cursor, FileId, FileScope, ImportStatus, ItemRef, Resolution, Suggestion, VariableInfo};
use std::path::Path;

/// View of one open file and its namespace.
#[derive(Debug, Clone, Copy)]
pub struct FileController<'a> {
    project: &'a Project,
    file: &'a OpenFile,
}

impl<'a> FileController<'a> {
    pub(crate) fn new(project: &'a Project, file: &'a OpenFile) -> Self {
        Self { project, file }
    }

    pub fn id(&self) -> FileId {
        self.file.id
    }

    pub fn data(&self) -> &'a DataFile {
        &self.file.data
    }

    pub fn source(&self) -> Option<&'a Path> {
        self.file.data.source.as_deref()
    }

    pub fn display_name(&self) -> String {
        self.file.data.display_name()
    }

    pub fn is_dirty(&self) -> bool {
        self.file.dirty
    }

    pub fn version(&self) -> u64 {
        self.file.version
    }

    pub fn target(&self) -> Target {
        Target::File(self.file.id)
    }

    pub fn tests(&self) -> Vec<ItemController<'a>> {
        (0..self.file.data.tests.items.len())
            .map(|i| self.item_unchecked(ItemRef::Test(i)))
            .collect()
    }

    pub fn keywords(&self) -> Vec<ItemController<'a>> {
        (0..self.file.data.keywords.items.len())
            .map(|i| self.item_unchecked(ItemRef::Keyword(i)))
            .collect()
    }

    pub fn item(&self, item: ItemRef) -> Option<ItemController<'a>> {
        item_steps(&self.file.data, item).map(|_| self.item_unchecked(item))
    }

    /// Test case by normalized name.
    pub fn find_test(&self, name: &str) -> Option<ItemController<'a>> {
        self.file
            .data
            .tests
            .position(name)
            .map(|i| self.item_unchecked(ItemRef::Test(i)))
    }

    /// User keyword by normalized name.
    pub fn find_keyword(&self, name: &str) -> Option<ItemController<'a>> {
        self.file
            .data
            .keywords
            .position(name)
            .map(|i| self.item_unchecked(ItemRef::Keyword(i)))
    }

    fn item_unchecked(&self, item: ItemRef) -> ItemController<'a> {
        ItemController {
            file: self.file.id,
            item,
            data: &self.file.data,
        }
    }

    pub fn scope(&self) -> FileScope<'a> {
        FileScope::new(self.file.id, self.file.version, &self.file.data)
    }

    pub fn suggestions(&self, cursor: Option<&Cursor>, prefix: &str) -> Vec<Suggestion> {
        self.project.namespace.suggestions(&self.scope(), cursor, prefix)
    }

    pub fn resolve(&self, name: &str) -> Resolution {
        self.project.namespace.resolve(&self.scope(), name)
    }

    pub fn variables_in_scope(&self, cursor: Option<&Cursor>) -> Vec<VariableInfo> {
        self.project.namespace.variables_in_scope(&self.scope(), cursor)
    }

    pub fn import_status(&self) -> Vec<ImportStatus> {
        self.project.namespace.import_status(&self.scope())
    }

    /// Read problems followed by namespace problems.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = self.file.data.diagnostics.clone();
        out.extend(self.project.namespace.diagnostics(&self.scope()));
        out
    }

    /// Wait for background imports of this file. Meant for tests and batch
    /// tools.
    pub fn await_imports(&self) {
        self.project.namespace.await_imports(&self.scope());
    }

    pub fn has_been_modified_on_disk(&self) -> bool {
        self.project.has_been_modified_on_disk(self.file.id)
    }
}

/// View of one test case or user keyword.
#[derive(Debug, Clone, Copy)]
pub struct ItemController<'a> {
    file: FileId,
    item: ItemRef,
    data: &'a DataFile,
}

impl<'a> ItemController<'a> {
    pub fn item(&self) -> ItemRef {
        self.item
    }

    pub fn target(&self) -> Target {
        Target::Item(self.file, self.item)
    }

    pub fn is_keyword(&self) -> bool {
        matches!(self.item, ItemRef::Keyword(_))
    }

    pub fn name(&self) -> &'a str {
        item_name(self.data, self.item).unwrap_or_default()
    }

    pub fn steps(&self) -> &'a [Step] {
        item_steps(self.data, self.item).map_or(&[], Vec::as_slice)
    }

    /// Grid rows of the body.
    pub fn rows(&self) -> Vec<Vec<String>> {
        flatten_steps(self.steps())
    }

    /// Cell value; empty outside the grid.
    pub fn cell(&self, row: usize, col: usize) -> String {
        self.rows()
            .get(row)
            .and_then(|r| r.get(col))
            .cloned()
            .unwrap_or_default()
    }

    pub fn settings(&self) -> &'a [ItemSetting] {
        match self.item {
            ItemRef::Test(i) => self.data.tests.items.get(i).map_or(&[], |t| t.settings.as_slice()),
            ItemRef::Keyword(i) => self.data.keywords.items.get(i).map_or(&[], |k| k.settings.as_slice()),
        }
    }

    /// Cursor for namespace queries inside this item.
    pub fn cursor(&self, row: Option<usize>) -> Cursor {
        match row {
            Some(row) => Cursor::at_row(self.item, row),
            None => Cursor::new(self.item),
        }
    }
}

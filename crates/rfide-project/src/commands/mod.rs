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

//! Undoable commands.
//!
//! Every change to an open file goes through [`Project::execute`]. A command
//! validates its target, mutates the model and returns the command that
//! reverts it. The project then clears the redo stack, pushes the inverse
//! onto the undo stack of the target's file (or the project stack), marks
//! the touched files dirty and finally publishes the events the command
//! raised.
//!
//! Inverses are built from the primitives in [`primitive`], which address
//! their file and item explicitly so they can be replayed from any target.
//!
//! [`Project::execute`]: crate::Project::execute

mod grid;
mod history;
mod items;
pub mod primitive;
mod refactor;
mod tables;

pub use grid::{
    AddRow, ChangeCellValue, ClearArea, CommentRows, DeleteCells, DeleteRow, InsertCells,
    MoveRowsDown, MoveRowsUp, PasteArea, Purify, UncommentRows,
};
pub use history::{Redo, SaveFile, Undo};
pub use items::{AddKeyword, AddTestCase, CopyItem, DeleteItem, MoveItem, RenameItem};
pub use primitive::Batch;
pub use refactor::{ExtractKeyword, ExtractVariable, RenameKeywordOccurrences};
pub use tables::{
    AddLibrary, AddMetadata, AddResource, AddVariable, ChangeImport, ChangeSetting,
    ChangeVariable, SettingKey,
};

use crate::error::{CommandError, CommandResult};
use crate::events::RideEvent;
use crate::project::OpenFile;
use rfide_core::model::{flatten_steps, Step};
use rfide_core::DataFile;
use rfide_namespace::{FileId, FileScope, ItemRef, Namespace};
use rfide_writer::WriterConfig;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// What a command is executed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// A whole file: its tables, settings and imports.
    File(FileId),
    /// A test case or user keyword of a file.
    Item(FileId, ItemRef),
    /// Every open file. Used by refactorings spanning files.
    Project,
}

impl Target {
    /// The file owning the target; `None` for the project.
    pub fn file(&self) -> Option<FileId> {
        match self {
            Self::File(id) | Self::Item(id, _) => Some(*id),
            Self::Project => None,
        }
    }
}

impl From<FileId> for Target {
    fn from(id: FileId) -> Self {
        Self::File(id)
    }
}

/// How the project treats a command around its execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Mutates the model; its inverse is pushed onto the undo stack.
    Edit,
    /// Moves a command from the undo stack to the redo stack.
    Undo,
    /// Moves a command from the redo stack to the undo stack.
    Redo,
    /// Writes a file to disk without changing the model.
    Save,
}

/// Identity of a cell edit, used to coalesce consecutive edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeKey {
    pub file: FileId,
    pub item: ItemRef,
    pub row: usize,
    pub col: usize,
}

/// An undoable change.
pub trait Command: fmt::Debug + Send {
    /// Short name used in errors and logs.
    fn name(&self) -> &'static str;

    fn kind(&self) -> CommandKind {
        CommandKind::Edit
    }

    /// Apply the command. Returns the command that reverts it, or `None`
    /// when there is nothing to revert.
    ///
    /// Implementations validate before mutating, so an error leaves the
    /// model unchanged.
    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>>;

    /// Inverses with equal keys on top of each other are merged into the
    /// older one, which restores the state before both edits.
    fn merge_key(&self) -> Option<MergeKey> {
        None
    }
}

/// Undo and redo stacks of one file or of the project.
#[derive(Debug, Default)]
pub struct History {
    pub(crate) undo: Vec<Box<dyn Command>>,
    pub(crate) redo: Vec<Box<dyn Command>>,
}

impl History {
    /// Push an inverse, merging it into the top entry when both revert the
    /// same cell.
    pub(crate) fn push_undo(&mut self, inverse: Box<dyn Command>) {
        let mergeable = match (self.undo.last().and_then(|top| top.merge_key()), inverse.merge_key()) {
            (Some(top), Some(new)) => top == new,
            _ => false,
        };
        if !mergeable {
            self.undo.push(inverse);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

/// Access to the project while a command runs.
pub struct CommandContext<'a> {
    target: Target,
    files: &'a mut BTreeMap<FileId, OpenFile>,
    namespace: &'a Namespace,
    writer: &'a WriterConfig,
    pub(crate) history: &'a mut History,
    events: Vec<RideEvent>,
    touched: BTreeSet<FileId>,
    saved: Vec<(FileId, PathBuf)>,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(
        target: Target,
        files: &'a mut BTreeMap<FileId, OpenFile>,
        namespace: &'a Namespace,
        writer: &'a WriterConfig,
        history: &'a mut History,
    ) -> Self {
        Self {
            target,
            files,
            namespace,
            writer,
            history,
            events: Vec::new(),
            touched: BTreeSet::new(),
            saved: Vec::new(),
        }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// File of the target, or an error for project targets.
    pub fn target_file(&self, command: &'static str) -> CommandResult<FileId> {
        self.target
            .file()
            .ok_or_else(|| CommandError::invalid(command, "the command needs a file target"))
    }

    /// Test or keyword of the target, or an error for other targets.
    pub fn target_item(&self, command: &'static str) -> CommandResult<(FileId, ItemRef)> {
        match self.target {
            Target::Item(file, item) => {
                self.steps(file, item)?;
                Ok((file, item))
            }
            _ => Err(CommandError::invalid(command, "the command needs a test or keyword target")),
        }
    }

    /// Ids of all open files.
    pub fn file_ids(&self) -> Vec<FileId> {
        self.files.keys().copied().collect()
    }

    pub fn data(&self, id: FileId) -> CommandResult<&DataFile> {
        self.files
            .get(&id)
            .map(|f| &f.data)
            .ok_or(CommandError::UnknownFile(id))
    }

    /// Mutable model of a file. The file is marked dirty if the command
    /// succeeds.
    pub fn data_mut(&mut self, id: FileId) -> CommandResult<&mut DataFile> {
        let file = self.files.get_mut(&id).ok_or(CommandError::UnknownFile(id))?;
        self.touched.insert(id);
        Ok(&mut file.data)
    }

    /// Namespace view of an open file at its current version.
    pub fn scope(&self, id: FileId) -> CommandResult<FileScope<'_>> {
        let file = self.files.get(&id).ok_or(CommandError::UnknownFile(id))?;
        Ok(FileScope::new(id, file.version, &file.data))
    }

    pub fn namespace(&self) -> &Namespace {
        self.namespace
    }

    pub fn writer(&self) -> &WriterConfig {
        self.writer
    }

    /// Queue an event; it is published after the command completes.
    pub fn publish(&mut self, event: RideEvent) {
        self.events.push(event);
    }

    pub(crate) fn mark_saved(&mut self, id: FileId, path: PathBuf) {
        self.saved.push((id, path));
    }

    /// Steps of a test or keyword.
    pub fn steps(&self, file: FileId, item: ItemRef) -> CommandResult<&Vec<Step>> {
        let data = self.data(file)?;
        item_steps(data, item).ok_or_else(|| CommandError::UnknownItem {
            file: data.display_name(),
            item,
        })
    }

    /// Flattened rows of a test or keyword, as shown in the grid.
    pub fn rows(&self, file: FileId, item: ItemRef) -> CommandResult<Vec<Vec<String>>> {
        Ok(flatten_steps(self.steps(file, item)?))
    }

    pub(crate) fn finish(self) -> ContextOutcome {
        ContextOutcome {
            events: self.events,
            touched: self.touched,
            saved: self.saved,
        }
    }
}

pub(crate) struct ContextOutcome {
    pub events: Vec<RideEvent>,
    pub touched: BTreeSet<FileId>,
    pub saved: Vec<(FileId, PathBuf)>,
}

/// Steps of a test or keyword of `file`.
pub fn item_steps(file: &DataFile, item: ItemRef) -> Option<&Vec<Step>> {
    match item {
        ItemRef::Test(i) => file.tests.items.get(i).map(|t| &t.steps),
        ItemRef::Keyword(i) => file.keywords.items.get(i).map(|k| &k.steps),
    }
}

pub(crate) fn item_steps_mut(file: &mut DataFile, item: ItemRef) -> Option<&mut Vec<Step>> {
    match item {
        ItemRef::Test(i) => file.tests.items.get_mut(i).map(|t| &mut t.steps),
        ItemRef::Keyword(i) => file.keywords.items.get_mut(i).map(|k| &mut k.steps),
    }
}

/// Name of a test or keyword of `file`.
pub fn item_name(file: &DataFile, item: ItemRef) -> Option<&str> {
    match item {
        ItemRef::Test(i) => file.tests.items.get(i).map(|t| t.name.as_str()),
        ItemRef::Keyword(i) => file.keywords.items.get(i).map(|k| k.name.as_str()),
    }
}

/// Number of items in the table `item` belongs to.
pub(crate) fn table_len(file: &DataFile, item: ItemRef) -> usize {
    match item {
        ItemRef::Test(_) => file.tests.items.len(),
        ItemRef::Keyword(_) => file.keywords.items.len(),
    }
}

/// True if the table of `item` already has an entry called `name`, other
/// than `item` itself.
pub(crate) fn name_taken(file: &DataFile, item: ItemRef, name: &str) -> bool {
    let position = match item {
        ItemRef::Test(_) => file.tests.position(name).map(ItemRef::Test),
        ItemRef::Keyword(_) => file.keywords.position(name).map(ItemRef::Keyword),
    };
    position.is_some_and(|found| found != item)
}

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

//! The set of open files and the command execution loop.

use crate::commands::{Command, CommandContext, CommandKind, History, Redo, SaveFile, Target, Undo};
use crate::controller::FileController;
use crate::error::{CommandError, CommandResult};
use crate::events::{EventBus, RideEvent};
use crate::watcher::DiskStamp;
use rfide_core::{parse_file_lenient, parse_suite, DataFile, FileKind, ParseOptions, RfError, RfResult, Suite, TestDataDirectory};
use rfide_namespace::{FileId, FileScope, Namespace, NamespaceConfig};
use rfide_writer::WriterConfig;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// An open data file with its editing state.
#[derive(Debug, Clone)]
pub struct OpenFile {
    pub(crate) id: FileId,
    pub(crate) data: DataFile,
    /// Bumped on every change, keys namespace memoization.
    pub(crate) version: u64,
    pub(crate) dirty: bool,
    /// Modification time and size when last read or written.
    pub(crate) stamp: Option<DiskStamp>,
    /// Directory suite the file was opened through.
    pub(crate) parent: Option<PathBuf>,
}

impl OpenFile {
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn data(&self) -> &DataFile {
        &self.data
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn parent(&self) -> Option<&Path> {
        self.parent.as_deref()
    }
}

/// Configuration of a [`Project`].
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    pub namespace: NamespaceConfig,
    pub parse: ParseOptions,
    pub writer: WriterConfig,
}

impl ProjectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: NamespaceConfig) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    pub fn with_writer(mut self, writer: WriterConfig) -> Self {
        self.writer = writer;
        self
    }
}

/// Open files, their undo histories, the namespace and the event bus.
///
/// All model changes go through [`Project::execute`]:
///
/// 1. the command runs against a context holding the target's history,
/// 2. on success the redo stack is cleared and the inverse pushed,
/// 3. touched files are marked dirty and their version bumped,
/// 4. open resources are pushed into the import cache,
/// 5. queued events are published.
///
/// A failed command changes nothing and publishes nothing.
pub struct Project {
    pub(crate) files: BTreeMap<FileId, OpenFile>,
    /// Keyed by file; `None` holds project-wide commands.
    pub(crate) histories: HashMap<Option<FileId>, History>,
    next_id: u64,
    pub(crate) namespace: Namespace,
    pub(crate) bus: EventBus,
    pub(crate) config: ProjectConfig,
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("files", &self.files.len())
            .field("histories", &self.histories.len())
            .field("next_id", &self.next_id)
            .field("bus", &self.bus)
            .finish()
    }
}

impl Project {
    pub fn new(config: ProjectConfig) -> RfResult<Self> {
        let namespace = Namespace::new(config.namespace.clone())?;
        Ok(Self {
            files: BTreeMap::new(),
            histories: HashMap::new(),
            next_id: 1,
            namespace,
            bus: EventBus::new(),
            config,
        })
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Open a single file. Opening a file twice returns the existing id.
    ///
    /// Read problems are attached to the file as diagnostics; only a path
    /// that cannot be resolved is an error.
    pub fn open_file(&mut self, path: impl AsRef<Path>) -> RfResult<FileId> {
        let path = canonical(path.as_ref())?;
        if let Some(id) = self.find_file(&path) {
            debug!(path = %path.display(), "File already open");
            return Ok(id);
        }
        let data = parse_file_lenient(&path, &self.config.parse);
        let parent = path.parent().map(Path::to_path_buf);
        let id = self.insert(data, parent);
        info!(path = %path.display(), id = id.0, "Opened file");
        Ok(id)
    }

    /// Open a file or a directory suite with all its files.
    pub fn open_suite(&mut self, path: impl AsRef<Path>) -> RfResult<Vec<FileId>> {
        let path = canonical(path.as_ref())?;
        let suite = parse_suite(&path, &self.config.parse)?;
        let mut found = Vec::new();
        match suite {
            Suite::File(file) => {
                let parent = path.parent().map(Path::to_path_buf);
                found.push((file, parent));
            }
            Suite::Directory(dir) => collect_files(dir, &mut found),
        }
        let mut ids = Vec::with_capacity(found.len());
        for (data, parent) in found {
            let existing = data.source.as_deref().and_then(|p| self.find_file(p));
            ids.push(match existing {
                Some(id) => id,
                None => self.insert(data, parent),
            });
        }
        info!(path = %path.display(), files = ids.len(), "Opened suite");
        Ok(ids)
    }

    /// Add an in-memory file, such as a new unsaved one.
    pub fn add_file(&mut self, data: DataFile) -> FileId {
        let parent = data
            .source
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf);
        self.insert(data, parent)
    }

    pub(crate) fn insert(&mut self, data: DataFile, parent: Option<PathBuf>) -> FileId {
        let id = FileId(self.next_id);
        self.next_id += 1;
        let stamp = data.source.as_deref().and_then(DiskStamp::read);
        share_with_importers(&self.namespace, &data);
        let path = data.source.clone();
        self.files.insert(
            id,
            OpenFile {
                id,
                data,
                version: 0,
                dirty: false,
                stamp,
                parent,
            },
        );
        self.bus.publish(&RideEvent::FileOpened { file: id, path });
        id
    }

    /// Read-only view of an open file.
    pub fn file(&self, id: FileId) -> Option<FileController<'_>> {
        self.files.get(&id).map(|file| FileController::new(self, file))
    }

    /// Ids of the open files in opening order.
    pub fn file_ids(&self) -> Vec<FileId> {
        self.files.keys().copied().collect()
    }

    pub fn files(&self) -> impl Iterator<Item = &OpenFile> {
        self.files.values()
    }

    /// Id of the open file read from `path`.
    pub fn find_file(&self, path: &Path) -> Option<FileId> {
        let wanted = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.files
            .values()
            .find(|f| f.data.source.as_deref() == Some(wanted.as_path()))
            .map(|f| f.id)
    }

    pub fn data(&self, id: FileId) -> Option<&DataFile> {
        self.files.get(&id).map(|f| &f.data)
    }

    pub fn is_dirty(&self, id: FileId) -> bool {
        self.files.get(&id).is_some_and(|f| f.dirty)
    }

    /// Files with unsaved changes.
    pub fn dirty_files(&self) -> Vec<FileId> {
        self.files.values().filter(|f| f.dirty).map(|f| f.id).collect()
    }

    pub fn version(&self, id: FileId) -> Option<u64> {
        self.files.get(&id).map(|f| f.version)
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Namespace view of an open file at its current version.
    pub fn scope(&self, id: FileId) -> Option<FileScope<'_>> {
        self.files
            .get(&id)
            .map(|f| FileScope::new(id, f.version, &f.data))
    }

    /// Run a command on `target`.
    pub fn execute<C: Command>(&mut self, target: impl Into<Target>, command: C) -> CommandResult<()> {
        self.execute_dyn(target.into(), &command)
    }

    /// Run a boxed command on `target`.
    pub fn execute_boxed(&mut self, target: impl Into<Target>, command: Box<dyn Command>) -> CommandResult<()> {
        self.execute_dyn(target.into(), command.as_ref())
    }

    fn execute_dyn(&mut self, target: Target, command: &dyn Command) -> CommandResult<()> {
        if let Some(id) = target.file() {
            if !self.files.contains_key(&id) {
                return Err(CommandError::UnknownFile(id));
            }
        }
        let key = target.file();
        let mut history = self.histories.remove(&key).unwrap_or_default();
        let mut ctx = CommandContext::new(
            target,
            &mut self.files,
            &self.namespace,
            &self.config.writer,
            &mut history,
        );
        let result = command.execute(&mut ctx);
        let outcome = ctx.finish();
        let inverse = match result {
            Ok(inverse) => inverse,
            Err(err) => {
                self.histories.insert(key, history);
                debug!(command = command.name(), error = %err, "Command failed");
                return Err(err);
            }
        };

        if command.kind() == CommandKind::Edit {
            if let Some(inverse) = inverse {
                history.redo.clear();
                history.push_undo(inverse);
            }
        }
        self.histories.insert(key, history);

        for id in &outcome.touched {
            let Some(file) = self.files.get_mut(id) else {
                continue;
            };
            file.dirty = true;
            file.version += 1;
            share_with_importers(&self.namespace, &file.data);
        }
        for (id, path) in &outcome.saved {
            if let Some(file) = self.files.get_mut(id) {
                file.dirty = false;
                file.stamp = DiskStamp::read(path);
                info!(path = %path.display(), "Saved file");
            }
        }
        debug!(
            command = command.name(),
            touched = outcome.touched.len(),
            events = outcome.events.len(),
            "Command executed"
        );
        self.bus.publish_all(&outcome.events);
        Ok(())
    }

    pub fn undo(&mut self, target: impl Into<Target>) -> CommandResult<()> {
        self.execute(target, Undo)
    }

    pub fn redo(&mut self, target: impl Into<Target>) -> CommandResult<()> {
        self.execute(target, Redo)
    }

    /// Undo and redo stacks used for `target`.
    pub fn history(&self, target: impl Into<Target>) -> Option<&History> {
        self.histories.get(&target.into().file())
    }

    pub fn can_undo(&self, target: impl Into<Target>) -> bool {
        self.history(target).is_some_and(History::can_undo)
    }

    pub fn can_redo(&self, target: impl Into<Target>) -> bool {
        self.history(target).is_some_and(History::can_redo)
    }

    pub fn undo_depth(&self, target: impl Into<Target>) -> usize {
        self.history(target).map_or(0, History::undo_depth)
    }

    pub fn save(&mut self, id: FileId) -> CommandResult<()> {
        self.execute(id, SaveFile)
    }

    /// Save every dirty file that has a source path. Returns the number of
    /// files written.
    pub fn save_all(&mut self) -> CommandResult<usize> {
        let dirty: Vec<FileId> = self
            .files
            .values()
            .filter(|f| f.dirty && f.data.source.is_some())
            .map(|f| f.id)
            .collect();
        for id in &dirty {
            self.save(*id)?;
        }
        Ok(dirty.len())
    }
}

/// Make the in-memory content of an open file visible to files importing
/// it. Applies to resource files and to any file already requested as an
/// import.
pub(crate) fn share_with_importers(namespace: &Namespace, data: &DataFile) {
    let Some(source) = &data.source else {
        return;
    };
    let cache = namespace.cache();
    if !data.is_resource() && cache.peek(source).is_none() {
        return;
    }
    let mut shared = data.clone();
    shared.kind = FileKind::Resource;
    cache.update(source, Arc::new(shared));
}

fn canonical(path: &Path) -> RfResult<PathBuf> {
    path.canonicalize()
        .map_err(|e| RfError::io(format!("Cannot open '{}': {}", path.display(), e)).with_path(path))
}

fn collect_files(dir: TestDataDirectory, out: &mut Vec<(DataFile, Option<PathBuf>)>) {
    let parent = Some(dir.source.clone());
    if let Some(init) = dir.init {
        out.push((init, parent.clone()));
    }
    for child in dir.children {
        match child {
            Suite::File(file) => out.push((file, parent.clone())),
            Suite::Directory(sub) => collect_files(sub, out),
        }
    }
}

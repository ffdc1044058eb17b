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

//! Detection of external changes to open files, reload and close.

use crate::events::RideEvent;
use crate::project::{share_with_importers, Project};
use rfide_core::{parse_file_lenient, RfError, RfResult};
use rfide_namespace::FileId;
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info};

/// Modification time and size of a file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskStamp {
    pub modified: Option<SystemTime>,
    pub size: u64,
}

impl DiskStamp {
    /// Stamp of `path`, or `None` if it cannot be read.
    pub fn read(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok(),
            size: meta.len(),
        })
    }
}

impl Project {
    /// True if the file's modification time or size differs from when it was
    /// last read or saved. A file that disappeared counts as modified; an
    /// unsaved file never does.
    pub fn has_been_modified_on_disk(&self, id: FileId) -> bool {
        let Some(file) = self.files.get(&id) else {
            return false;
        };
        let Some(source) = &file.data.source else {
            return false;
        };
        DiskStamp::read(source) != file.stamp
    }

    /// Open files changed on disk since they were read.
    pub fn modified_files(&self) -> Vec<FileId> {
        self.files
            .keys()
            .copied()
            .filter(|id| self.has_been_modified_on_disk(*id))
            .collect()
    }

    /// Re-read a file from disk in place.
    ///
    /// The file keeps its id and parent suite. Unsaved changes and the undo
    /// history are discarded.
    pub fn reload(&mut self, id: FileId) -> RfResult<()> {
        let file = self
            .files
            .get_mut(&id)
            .ok_or_else(|| RfError::data(format!("No open file {:?}", id)))?;
        let source = file
            .data
            .source
            .clone()
            .ok_or_else(|| RfError::io(format!("'{}' has no source path", file.data.display_name())))?;

        let options = match self.config.parse.kind {
            Some(_) => self.config.parse.clone(),
            None => {
                let mut options = self.config.parse.clone();
                options.kind = Some(file.data.kind);
                options
            }
        };
        file.data = parse_file_lenient(&source, &options);
        file.version += 1;
        file.dirty = false;
        file.stamp = DiskStamp::read(&source);

        if let Some(history) = self.histories.get_mut(&Some(id)) {
            history.clear();
        }
        self.namespace.cache().invalidate(&source);
        share_with_importers(&self.namespace, &file.data);
        info!(path = %source.display(), "Reloaded file");
        self.bus.publish(&RideEvent::DataFileChanged { file: id, path: source });
        Ok(())
    }

    /// Close a file, dropping its history and cancelling background loads
    /// started for it. An open resource falls back to its saved content for
    /// other importers. Returns false if the file was not open.
    pub fn remove_file(&mut self, id: FileId) -> bool {
        let Some(file) = self.files.remove(&id) else {
            return false;
        };
        self.histories.remove(&Some(id));
        self.namespace.forget(id);
        if file.data.is_resource() {
            if let Some(source) = &file.data.source {
                self.namespace.cache().invalidate(source);
            }
        }
        debug!(id = id.0, "Closed file");
        self.bus.publish(&RideEvent::FileRemoved {
            file: id,
            path: file.data.source,
        });
        true
    }
}

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

//! Undo, redo and save.

use super::{Command, CommandContext, CommandKind};
use crate::error::{CommandError, CommandResult};
use crate::events::RideEvent;
use tracing::debug;

/// Revert the most recent edit of the target's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Undo;

impl Command for Undo {
    fn name(&self) -> &'static str {
        "undo"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Undo
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let command = ctx.history.undo.pop().ok_or(CommandError::NothingToUndo)?;
        debug!(command = command.name(), "Undoing");
        match command.execute(ctx) {
            Ok(inverse) => {
                ctx.history.redo.extend(inverse);
                Ok(None)
            }
            Err(err) => {
                ctx.history.undo.push(command);
                Err(err)
            }
        }
    }
}

/// Reapply the most recently undone edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Redo;

impl Command for Redo {
    fn name(&self) -> &'static str {
        "redo"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Redo
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let command = ctx.history.redo.pop().ok_or(CommandError::NothingToRedo)?;
        debug!(command = command.name(), "Redoing");
        match command.execute(ctx) {
            Ok(inverse) => {
                ctx.history.undo.extend(inverse);
                Ok(None)
            }
            Err(err) => {
                ctx.history.redo.push(command);
                Err(err)
            }
        }
    }
}

/// Write the target file to its source path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveFile;

impl Command for SaveFile {
    fn name(&self) -> &'static str {
        "save file"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Save
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let file = ctx.target_file(self.name())?;
        let data = ctx.data(file)?;
        let path = data
            .source
            .clone()
            .ok_or_else(|| CommandError::NoSource(data.display_name()))?;
        rfide_writer::write_to_path(data, &path, ctx.writer())?;
        ctx.mark_saved(file, path.clone());
        ctx.publish(RideEvent::FileSaved { file, path });
        Ok(None)
    }
}

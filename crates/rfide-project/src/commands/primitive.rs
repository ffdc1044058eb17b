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

//! Low-level model edits that address their location explicitly.
//!
//! Every higher level command reverts through these, so an inverse can be
//! replayed whatever target undo is invoked on.

use super::{
    item_name, item_steps_mut, table_len, Command, CommandContext, MergeKey,
};
use crate::error::{CommandError, CommandResult};
use crate::events::RideEvent;
use rfide_core::model::{build_steps, flatten_steps, ItemSetting, Setting, Variable};
use rfide_core::{TestCase, UserKeyword};
use rfide_namespace::{FileId, ItemRef};

/// Replace `count` grid rows of an item, starting at `start`, with `rows`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceRows {
    pub file: FileId,
    pub item: ItemRef,
    pub start: usize,
    pub count: usize,
    pub rows: Vec<Vec<String>>,
    /// Cell whose edit this reverts, for merging consecutive edits.
    pub cell: Option<(usize, usize)>,
}

impl ReplaceRows {
    pub fn new(file: FileId, item: ItemRef, start: usize, count: usize, rows: Vec<Vec<String>>) -> Self {
        Self {
            file,
            item,
            start,
            count,
            rows,
            cell: None,
        }
    }

    /// Replace every row of the item.
    pub fn all(file: FileId, item: ItemRef, current_len: usize, rows: Vec<Vec<String>>) -> Self {
        Self::new(file, item, 0, current_len, rows)
    }

    pub(crate) fn for_cell(mut self, row: usize, col: usize) -> Self {
        self.cell = Some((row, col));
        self
    }
}

impl Command for ReplaceRows {
    fn name(&self) -> &'static str {
        "replace rows"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let mut rows = ctx.rows(self.file, self.item)?;
        let end = self.start + self.count;
        if end > rows.len() {
            return Err(CommandError::RowOutOfRange { row: end, len: rows.len() });
        }
        let removed: Vec<Vec<String>> = rows.splice(self.start..end, self.rows.iter().cloned()).collect();
        set_rows(ctx, self.file, self.item, &rows)?;
        Ok(Some(Box::new(ReplaceRows {
            file: self.file,
            item: self.item,
            start: self.start,
            count: self.rows.len(),
            rows: removed,
            cell: self.cell,
        })))
    }

    fn merge_key(&self) -> Option<MergeKey> {
        self.cell.map(|(row, col)| MergeKey {
            file: self.file,
            item: self.item,
            row,
            col,
        })
    }
}

/// Rebuild the steps of an item from grid rows.
pub(crate) fn set_rows(
    ctx: &mut CommandContext<'_>,
    file: FileId,
    item: ItemRef,
    rows: &[Vec<String>],
) -> CommandResult<()> {
    let data = ctx.data_mut(file)?;
    let name = data.display_name();
    let steps = item_steps_mut(data, item).ok_or(CommandError::UnknownItem { file: name, item })?;
    *steps = build_steps(rows);
    ctx.publish(RideEvent::StepsChanged { file, item });
    Ok(())
}

/// A test case or user keyword, detached from its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValue {
    Test(TestCase),
    Keyword(UserKeyword),
}

impl ItemValue {
    pub fn name(&self) -> &str {
        match self {
            Self::Test(t) => &t.name,
            Self::Keyword(k) => &k.name,
        }
    }

    /// Grid rows of the body.
    pub fn rows(&self) -> Vec<Vec<String>> {
        match self {
            Self::Test(t) => flatten_steps(&t.steps),
            Self::Keyword(k) => flatten_steps(&k.steps),
        }
    }

    fn at(&self, index: usize) -> ItemRef {
        match self {
            Self::Test(_) => ItemRef::Test(index),
            Self::Keyword(_) => ItemRef::Keyword(index),
        }
    }
}

/// Insert a test or keyword at `index` of its table.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertItem {
    pub file: FileId,
    pub index: usize,
    pub value: ItemValue,
}

impl Command for InsertItem {
    fn name(&self) -> &'static str {
        "insert item"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let item = self.value.at(self.index);
        let len = table_len(ctx.data(self.file)?, item);
        if self.index > len {
            return Err(CommandError::IndexOutOfRange { index: self.index, len });
        }
        let data = ctx.data_mut(self.file)?;
        match &self.value {
            ItemValue::Test(t) => data.tests.items.insert(self.index, t.clone()),
            ItemValue::Keyword(k) => data.keywords.items.insert(self.index, k.clone()),
        }
        ctx.publish(RideEvent::ItemAdded {
            file: self.file,
            item,
            name: self.value.name().to_string(),
        });
        Ok(Some(Box::new(RemoveItem { file: self.file, item })))
    }
}

/// Remove a test or keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveItem {
    pub file: FileId,
    pub item: ItemRef,
}

impl Command for RemoveItem {
    fn name(&self) -> &'static str {
        "remove item"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        ctx.steps(self.file, self.item)?;
        let data = ctx.data_mut(self.file)?;
        let (index, value) = match self.item {
            ItemRef::Test(i) => (i, ItemValue::Test(data.tests.items.remove(i))),
            ItemRef::Keyword(i) => (i, ItemValue::Keyword(data.keywords.items.remove(i))),
        };
        ctx.publish(RideEvent::ItemRemoved {
            file: self.file,
            item: self.item,
            name: value.name().to_string(),
        });
        Ok(Some(Box::new(InsertItem {
            file: self.file,
            index,
            value,
        })))
    }
}

/// Set the name of a test or keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct SetItemName {
    pub file: FileId,
    pub item: ItemRef,
    pub name: String,
}

impl Command for SetItemName {
    fn name(&self) -> &'static str {
        "set item name"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        ctx.steps(self.file, self.item)?;
        let data = ctx.data_mut(self.file)?;
        let slot = match self.item {
            ItemRef::Test(i) => &mut data.tests.items[i].name,
            ItemRef::Keyword(i) => &mut data.keywords.items[i].name,
        };
        let old = std::mem::replace(slot, self.name.clone());
        ctx.publish(RideEvent::ItemRenamed {
            file: self.file,
            item: self.item,
            old: old.clone(),
            new: self.name.clone(),
        });
        Ok(Some(Box::new(SetItemName {
            file: self.file,
            item: self.item,
            name: old,
        })))
    }
}

/// Move a test or keyword to another position of its table.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveItemTo {
    pub file: FileId,
    pub item: ItemRef,
    pub to: usize,
}

impl Command for MoveItemTo {
    fn name(&self) -> &'static str {
        "move item"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        ctx.steps(self.file, self.item)?;
        let len = table_len(ctx.data(self.file)?, self.item);
        if self.to >= len {
            return Err(CommandError::IndexOutOfRange { index: self.to, len });
        }
        let data = ctx.data_mut(self.file)?;
        let from = match self.item {
            ItemRef::Test(i) => {
                let test = data.tests.items.remove(i);
                data.tests.items.insert(self.to, test);
                i
            }
            ItemRef::Keyword(i) => {
                let keyword = data.keywords.items.remove(i);
                data.keywords.items.insert(self.to, keyword);
                i
            }
        };
        ctx.publish(RideEvent::ItemsReordered { file: self.file });
        let moved = match self.item {
            ItemRef::Test(_) => ItemRef::Test(self.to),
            ItemRef::Keyword(_) => ItemRef::Keyword(self.to),
        };
        Ok(Some(Box::new(MoveItemTo {
            file: self.file,
            item: moved,
            to: from,
        })))
    }
}

/// Replace all settings of a test or keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceItemSettings {
    pub file: FileId,
    pub item: ItemRef,
    pub settings: Vec<ItemSetting>,
    /// Name reported in the change event.
    pub changed: String,
}

impl Command for ReplaceItemSettings {
    fn name(&self) -> &'static str {
        "replace item settings"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        ctx.steps(self.file, self.item)?;
        let data = ctx.data_mut(self.file)?;
        let slot = match self.item {
            ItemRef::Test(i) => &mut data.tests.items[i].settings,
            ItemRef::Keyword(i) => &mut data.keywords.items[i].settings,
        };
        let old = std::mem::replace(slot, self.settings.clone());
        ctx.publish(RideEvent::SettingChanged {
            file: self.file,
            item: Some(self.item),
            name: self.changed.clone(),
        });
        Ok(Some(Box::new(ReplaceItemSettings {
            file: self.file,
            item: self.item,
            settings: old,
            changed: self.changed.clone(),
        })))
    }
}

/// Replace `count` rows of the setting table, starting at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceSettings {
    pub file: FileId,
    pub start: usize,
    pub count: usize,
    pub rows: Vec<Setting>,
}

impl Command for ReplaceSettings {
    fn name(&self) -> &'static str {
        "replace settings"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let len = ctx.data(self.file)?.settings.items.len();
        let end = self.start + self.count;
        if end > len {
            return Err(CommandError::IndexOutOfRange { index: end, len });
        }
        let data = ctx.data_mut(self.file)?;
        let removed: Vec<Setting> = data
            .settings
            .items
            .splice(self.start..end, self.rows.iter().cloned())
            .collect();
        let imports = removed
            .iter()
            .chain(&self.rows)
            .any(|s| matches!(s, Setting::Import(_)));
        let language = ctx.data(self.file)?.language();
        let names: Vec<String> = removed
            .iter()
            .chain(&self.rows)
            .filter(|s| !matches!(s, Setting::Import(_)))
            .filter_map(|s| s.name())
            .map(|n| language.setting_label(n).to_string())
            .collect();
        if imports {
            ctx.publish(RideEvent::ImportsChanged { file: self.file });
        }
        if let Some(name) = names.into_iter().next() {
            ctx.publish(RideEvent::SettingChanged {
                file: self.file,
                item: None,
                name,
            });
        }
        Ok(Some(Box::new(ReplaceSettings {
            file: self.file,
            start: self.start,
            count: self.rows.len(),
            rows: removed,
        })))
    }
}

/// Replace `count` rows of the variable table, starting at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceVariables {
    pub file: FileId,
    pub start: usize,
    pub count: usize,
    pub rows: Vec<Variable>,
}

impl Command for ReplaceVariables {
    fn name(&self) -> &'static str {
        "replace variables"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let len = ctx.data(self.file)?.variables.items.len();
        let end = self.start + self.count;
        if end > len {
            return Err(CommandError::IndexOutOfRange { index: end, len });
        }
        let data = ctx.data_mut(self.file)?;
        let removed: Vec<Variable> = data
            .variables
            .items
            .splice(self.start..end, self.rows.iter().cloned())
            .collect();
        ctx.publish(RideEvent::VariablesChanged { file: self.file });
        Ok(Some(Box::new(ReplaceVariables {
            file: self.file,
            start: self.start,
            count: self.rows.len(),
            rows: removed,
        })))
    }
}

/// Commands applied in order as one undo step.
///
/// If a later command fails, the ones already applied are reverted, so the
/// batch fails atomically.
#[derive(Debug, Default)]
pub struct Batch {
    name: &'static str,
    commands: Vec<Box<dyn Command>>,
}

impl Batch {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: impl Command + 'static) {
        self.commands.push(Box::new(command));
    }

    pub fn with(mut self, command: impl Command + 'static) -> Self {
        self.push(command);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

impl Command for Batch {
    fn name(&self) -> &'static str {
        self.name
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let mut inverses: Vec<Box<dyn Command>> = Vec::with_capacity(self.commands.len());
        for command in &self.commands {
            match command.execute(ctx) {
                Ok(inverse) => inverses.extend(inverse),
                Err(err) => {
                    for inverse in inverses.iter().rev() {
                        let _ = inverse.execute(ctx);
                    }
                    return Err(err);
                }
            }
        }
        inverses.reverse();
        Ok(Some(Box::new(Batch {
            name: self.name,
            commands: inverses,
        })))
    }
}

/// Name of the item, or an error naming the file.
pub(crate) fn require_item_name(ctx: &CommandContext<'_>, file: FileId, item: ItemRef) -> CommandResult<String> {
    let data = ctx.data(file)?;
    item_name(data, item)
        .map(str::to_string)
        .ok_or_else(|| CommandError::UnknownItem {
            file: data.display_name(),
            item,
        })
}

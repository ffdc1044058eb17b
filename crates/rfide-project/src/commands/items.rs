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

//! Commands on the test case and keyword tables.

use super::primitive::{require_item_name, InsertItem, ItemValue, MoveItemTo, RemoveItem, SetItemName};
use super::{name_taken, table_len, Command, CommandContext};
use crate::error::{CommandError, CommandResult};
use rfide_core::model::Arguments;
use rfide_core::{FileKind, ItemSetting, TestCase, UserKeyword};
use rfide_namespace::ItemRef;

fn check_name(command: &'static str, name: &str) -> CommandResult<()> {
    if name.trim().is_empty() {
        return Err(CommandError::invalid(command, "the name is empty"));
    }
    Ok(())
}

/// Append a user keyword to the file's keyword table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddKeyword {
    pub name: String,
    pub args: Vec<String>,
}

impl AddKeyword {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
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
}

impl Command for AddKeyword {
    fn name(&self) -> &'static str {
        "add keyword"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let file = ctx.target_file(self.name())?;
        check_name(self.name(), &self.name)?;
        let data = ctx.data(file)?;
        if data.keywords.position(&self.name).is_some() {
            return Err(CommandError::Duplicate(self.name.clone()));
        }
        let index = data.keywords.items.len();
        let mut keyword = UserKeyword::new(self.name.clone());
        if !self.args.is_empty() {
            keyword.set_setting(ItemSetting::Arguments(Arguments {
                args: self.args.clone(),
                comment: Vec::new(),
            }));
        }
        InsertItem {
            file,
            index,
            value: ItemValue::Keyword(keyword),
        }
        .execute(ctx)
    }
}

/// Append a test case to the file's test case table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTestCase {
    pub name: String,
}

impl AddTestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Command for AddTestCase {
    fn name(&self) -> &'static str {
        "add test case"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let file = ctx.target_file(self.name())?;
        check_name(self.name(), &self.name)?;
        let data = ctx.data(file)?;
        if data.kind == FileKind::Resource {
            return Err(CommandError::invalid(self.name(), "resource files cannot contain tests"));
        }
        if data.tests.position(&self.name).is_some() {
            return Err(CommandError::Duplicate(self.name.clone()));
        }
        let index = data.tests.items.len();
        InsertItem {
            file,
            index,
            value: ItemValue::Test(TestCase::new(self.name.clone())),
        }
        .execute(ctx)
    }
}

/// Remove the target test or keyword.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteItem;

impl Command for DeleteItem {
    fn name(&self) -> &'static str {
        "delete item"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let (file, item) = ctx.target_item(self.name())?;
        RemoveItem { file, item }.execute(ctx)
    }
}

/// Rename the target test or keyword. Calls are not updated; see
/// [`RenameKeywordOccurrences`](super::RenameKeywordOccurrences).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameItem {
    pub name: String,
}

impl RenameItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Command for RenameItem {
    fn name(&self) -> &'static str {
        "rename item"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let (file, item) = ctx.target_item(self.name())?;
        check_name(self.name(), &self.name)?;
        if require_item_name(ctx, file, item)? == self.name {
            return Ok(None);
        }
        if name_taken(ctx.data(file)?, item, &self.name) {
            return Err(CommandError::Duplicate(self.name.clone()));
        }
        SetItemName {
            file,
            item,
            name: self.name.clone(),
        }
        .execute(ctx)
    }
}

/// Copy the target test or keyword under a new name, at the end of its
/// table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyItem {
    pub name: String,
}

impl CopyItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Command for CopyItem {
    fn name(&self) -> &'static str {
        "copy item"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let (file, item) = ctx.target_item(self.name())?;
        check_name(self.name(), &self.name)?;
        let data = ctx.data(file)?;
        let (index, value) = match item {
            ItemRef::Test(i) => {
                if data.tests.position(&self.name).is_some() {
                    return Err(CommandError::Duplicate(self.name.clone()));
                }
                let mut copy = data.tests.items[i].clone();
                copy.name = self.name.clone();
                (data.tests.items.len(), ItemValue::Test(copy))
            }
            ItemRef::Keyword(i) => {
                if data.keywords.position(&self.name).is_some() {
                    return Err(CommandError::Duplicate(self.name.clone()));
                }
                let mut copy = data.keywords.items[i].clone();
                copy.name = self.name.clone();
                (data.keywords.items.len(), ItemValue::Keyword(copy))
            }
        };
        InsertItem { file, index, value }.execute(ctx)
    }
}

/// Move the target test or keyword to position `to` of its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveItem {
    pub to: usize,
}

impl MoveItem {
    pub fn new(to: usize) -> Self {
        Self { to }
    }
}

impl Command for MoveItem {
    fn name(&self) -> &'static str {
        "move item"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let (file, item) = ctx.target_item(self.name())?;
        let len = table_len(ctx.data(file)?, item);
        let from = match item {
            ItemRef::Test(i) | ItemRef::Keyword(i) => i,
        };
        if self.to >= len {
            return Err(CommandError::IndexOutOfRange { index: self.to, len });
        }
        if from == self.to {
            return Ok(None);
        }
        MoveItemTo { file, item, to: self.to }.execute(ctx)
    }
}

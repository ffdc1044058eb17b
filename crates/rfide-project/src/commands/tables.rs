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

//! Commands on the setting and variable tables.

use super::primitive::{ReplaceItemSettings, ReplaceSettings, ReplaceVariables};
use super::{Command, CommandContext};
use crate::error::{CommandError, CommandResult};
use rfide_core::model::{Import, ImportKind, ItemSetting, Metadata, Setting, Variable};
use rfide_core::{DataFile, ItemSettingName, SettingName};
use rfide_namespace::ItemRef;

fn checked_variable(command: &'static str, variable: Variable) -> CommandResult<Variable> {
    if !variable.has_valid_name() {
        return Err(CommandError::invalid(
            command,
            format!("'{}' is not a valid variable name", variable.name),
        ));
    }
    if let Some(problem) = variable.shape_error() {
        return Err(CommandError::invalid(command, problem));
    }
    Ok(variable)
}

/// Append a variable to the variable table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddVariable {
    pub name: String,
    pub value: Vec<String>,
    pub comment: Option<String>,
}

impl AddVariable {
    pub fn new<I, S>(name: impl Into<String>, value: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            value: value.into_iter().map(Into::into).collect(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

impl Command for AddVariable {
    fn name(&self) -> &'static str {
        "add variable"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let file = ctx.target_file(self.name())?;
        let mut variable = Variable::new(self.name.clone(), self.value.clone());
        if let Some(comment) = &self.comment {
            variable.comment = vec![format!("# {}", comment)];
        }
        let variable = checked_variable(self.name(), variable)?;
        let data = ctx.data(file)?;
        if data.variables.get(&variable.name).is_some() {
            return Err(CommandError::Duplicate(variable.name));
        }
        let start = data.variables.items.len();
        ReplaceVariables {
            file,
            start,
            count: 0,
            rows: vec![variable],
        }
        .execute(ctx)
    }
}

/// Replace the name and value of the variable at `index`. The comment is
/// kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeVariable {
    pub index: usize,
    pub name: String,
    pub value: Vec<String>,
}

impl ChangeVariable {
    pub fn new<I, S>(index: usize, name: impl Into<String>, value: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            index,
            name: name.into(),
            value: value.into_iter().map(Into::into).collect(),
        }
    }
}

impl Command for ChangeVariable {
    fn name(&self) -> &'static str {
        "change variable"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let file = ctx.target_file(self.name())?;
        let data = ctx.data(file)?;
        let len = data.variables.items.len();
        let Some(current) = data.variables.items.get(self.index) else {
            return Err(CommandError::IndexOutOfRange { index: self.index, len });
        };
        let mut variable = Variable::new(self.name.clone(), self.value.clone());
        variable.comment = current.comment.clone();
        if variable == *current {
            return Ok(None);
        }
        let variable = checked_variable(self.name(), variable)?;
        if data
            .variables
            .position(&variable.name)
            .is_some_and(|pos| pos != self.index)
        {
            return Err(CommandError::Duplicate(variable.name));
        }
        ReplaceVariables {
            file,
            start: self.index,
            count: 1,
            rows: vec![variable],
        }
        .execute(ctx)
    }
}

/// Position a new import or metadata row goes to: after the last row of the
/// same kind, or at the end.
fn insert_position(data: &DataFile, same_kind: impl Fn(&Setting) -> bool) -> usize {
    data.settings
        .items
        .iter()
        .rposition(same_kind)
        .map_or(data.settings.items.len(), |pos| pos + 1)
}

fn add_setting_row(
    ctx: &mut CommandContext<'_>,
    command: &'static str,
    setting: Setting,
    same_kind: impl Fn(&Setting) -> bool,
) -> CommandResult<Option<Box<dyn Command>>> {
    let file = ctx.target_file(command)?;
    let start = insert_position(ctx.data(file)?, same_kind);
    ReplaceSettings {
        file,
        start,
        count: 0,
        rows: vec![setting],
    }
    .execute(ctx)
}

fn is_import(setting: &Setting) -> bool {
    matches!(setting, Setting::Import(_))
}

/// Import a library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLibrary {
    pub name: String,
    pub args: Vec<String>,
    pub alias: Option<String>,
}

impl AddLibrary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            alias: None,
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

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl Command for AddLibrary {
    fn name(&self) -> &'static str {
        "add library"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        if self.name.trim().is_empty() {
            return Err(CommandError::invalid(self.name(), "the library name is empty"));
        }
        let mut import = Import::library(self.name.clone()).with_args(self.args.clone());
        if let Some(alias) = &self.alias {
            import = import.with_alias(alias.clone());
        }
        add_setting_row(ctx, self.name(), Setting::Import(import), is_import)
    }
}

/// Import a resource file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddResource {
    pub path: String,
}

impl AddResource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Command for AddResource {
    fn name(&self) -> &'static str {
        "add resource"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        if self.path.trim().is_empty() {
            return Err(CommandError::invalid(self.name(), "the resource path is empty"));
        }
        let import = Import::resource(self.path.clone());
        add_setting_row(ctx, self.name(), Setting::Import(import), is_import)
    }
}

/// Replace the name, arguments and alias of the import at `index`, counting
/// imports only. The import kind and comment are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeImport {
    pub index: usize,
    pub name: String,
    pub args: Vec<String>,
    pub alias: Option<String>,
}

impl ChangeImport {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            args: Vec::new(),
            alias: None,
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

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl Command for ChangeImport {
    fn name(&self) -> &'static str {
        "change import"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let file = ctx.target_file(self.name())?;
        let data = ctx.data(file)?;
        let count = data.settings.imports().count();
        let position = data
            .settings
            .import_position(self.index)
            .ok_or(CommandError::IndexOutOfRange { index: self.index, len: count })?;
        let Setting::Import(current) = &data.settings.items[position] else {
            return Err(CommandError::invalid(self.name(), "the row is not an import"));
        };
        if current.kind != ImportKind::Library && self.alias.is_some() {
            return Err(CommandError::invalid(self.name(), "only libraries can have an alias"));
        }
        let mut import = Import::new(current.kind, self.name.clone()).with_args(self.args.clone());
        if let Some(alias) = &self.alias {
            let marker = current.alias.as_ref().map(|a| a.marker.clone());
            import = import.with_alias(alias.clone());
            if let (Some(marker), Some(new_alias)) = (marker, import.alias.as_mut()) {
                new_alias.marker = marker;
            }
        }
        import.comment = current.comment.clone();
        if import == *current {
            return Ok(None);
        }
        ReplaceSettings {
            file,
            start: position,
            count: 1,
            rows: vec![Setting::Import(import)],
        }
        .execute(ctx)
    }
}

/// Add a `Metadata` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMetadata {
    pub name: String,
    pub value: String,
}

impl AddMetadata {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Command for AddMetadata {
    fn name(&self) -> &'static str {
        "add metadata"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        if self.name.trim().is_empty() {
            return Err(CommandError::invalid(self.name(), "the metadata name is empty"));
        }
        let setting = Setting::Metadata(Metadata::new(self.name.clone(), self.value.clone()));
        add_setting_row(ctx, self.name(), setting, |s| matches!(s, Setting::Metadata(_)))
    }
}

/// Which setting [`ChangeSetting`] edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    /// A file-level singleton setting.
    File(SettingName),
    /// A bracketed test or keyword setting.
    Item(ItemSettingName),
}

/// Set or clear a setting. The value is given as the cells following the
/// setting name; `None` removes the setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetting {
    pub key: SettingKey,
    pub value: Option<Vec<String>>,
}

impl ChangeSetting {
    /// Change a file setting such as `Suite Setup`.
    pub fn file<I, S>(name: SettingName, value: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: SettingKey::File(name),
            value: value.map(|cells| cells.into_iter().map(Into::into).collect()),
        }
    }

    /// Change a test or keyword setting such as `[Tags]`.
    pub fn item<I, S>(name: ItemSettingName, value: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: SettingKey::Item(name),
            value: value.map(|cells| cells.into_iter().map(Into::into).collect()),
        }
    }

    /// Remove a setting.
    pub fn clear(key: SettingKey) -> Self {
        Self { key, value: None }
    }

    fn change_file_setting(
        &self,
        ctx: &mut CommandContext<'_>,
        name: SettingName,
    ) -> CommandResult<Option<Box<dyn Command>>> {
        let file = ctx.target_file(self.name())?;
        if matches!(
            name,
            SettingName::Metadata | SettingName::Library | SettingName::Resource | SettingName::Variables
        ) {
            return Err(CommandError::invalid(
                self.name(),
                "metadata and imports have their own commands",
            ));
        }
        let data = ctx.data(file)?;
        let existing = data
            .settings
            .items
            .iter()
            .position(|s| s.is_singleton() && s.name() == Some(name));
        let new = self.value.as_ref().map(|cells| Setting::from_cells(name, cells));
        let (start, count) = match (existing, &new) {
            (Some(pos), _) => {
                if new.as_ref() == Some(&data.settings.items[pos]) {
                    return Ok(None);
                }
                (pos, 1)
            }
            (None, Some(_)) => (data.settings.items.len(), 0),
            (None, None) => return Ok(None),
        };
        ReplaceSettings {
            file,
            start,
            count,
            rows: new.into_iter().collect(),
        }
        .execute(ctx)
    }

    fn change_item_setting(
        &self,
        ctx: &mut CommandContext<'_>,
        name: ItemSettingName,
    ) -> CommandResult<Option<Box<dyn Command>>> {
        let (file, item) = ctx.target_item(self.name())?;
        let data = ctx.data(file)?;
        let current = match item {
            ItemRef::Test(i) => {
                if matches!(name, ItemSettingName::Arguments | ItemSettingName::Return) {
                    return Err(CommandError::invalid(
                        self.name(),
                        "tests cannot have arguments or return values",
                    ));
                }
                &data.tests.items[i].settings
            }
            ItemRef::Keyword(i) => &data.keywords.items[i].settings,
        };
        let mut settings = current.clone();
        match &self.value {
            Some(cells) => {
                let setting = ItemSetting::from_cells(name, cells);
                match settings.iter_mut().find(|s| s.name() == name) {
                    Some(existing) => *existing = setting,
                    None => settings.push(setting),
                }
            }
            None => settings.retain(|s| s.name() != name),
        }
        if settings == *current {
            return Ok(None);
        }
        let changed = data.language().item_setting_label(name);
        ReplaceItemSettings {
            file,
            item,
            settings,
            changed,
        }
        .execute(ctx)
    }
}

impl Command for ChangeSetting {
    fn name(&self) -> &'static str {
        "change setting"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        match self.key {
            SettingKey::File(name) => self.change_file_setting(ctx, name),
            SettingKey::Item(name) => self.change_item_setting(ctx, name),
        }
    }
}

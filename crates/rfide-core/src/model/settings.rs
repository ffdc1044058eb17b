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

//! The setting table and the values shared by file and item settings.

use super::file::TableHeader;
use super::{split_comment, with_comment};
use crate::language::{Language, SettingName};

/// A keyword with arguments: setups, teardowns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fixture {
    pub name: String,
    pub args: Vec<String>,
    pub comment: Vec<String>,
}

impl Fixture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_cells(cells: &[String]) -> Self {
        let (data, comment) = split_comment(cells);
        let mut data = data.into_iter();
        Self {
            name: data.next().unwrap_or_default(),
            args: data.collect(),
            comment,
        }
    }

    pub fn to_cells(&self) -> Vec<String> {
        let mut cells = vec![self.name.clone()];
        cells.extend(self.args.iter().cloned());
        with_comment(cells, &self.comment)
    }
}

/// Documentation cells; [`Documentation::text`] joins them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Documentation {
    pub value: Vec<String>,
    pub comment: Vec<String>,
}

impl Documentation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            value: vec![text.into()],
            comment: Vec::new(),
        }
    }

    pub fn from_cells(cells: &[String]) -> Self {
        let (value, comment) = split_comment(cells);
        Self { value, comment }
    }

    pub fn to_cells(&self) -> Vec<String> {
        with_comment(self.value.clone(), &self.comment)
    }

    pub fn text(&self) -> String {
        self.value.join(" ")
    }
}

/// A list of tags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tags {
    pub tags: Vec<String>,
    pub comment: Vec<String>,
}

impl Tags {
    pub fn from_cells(cells: &[String]) -> Self {
        let (tags, comment) = split_comment(cells);
        Self { tags, comment }
    }

    pub fn to_cells(&self) -> Vec<String> {
        with_comment(self.tags.clone(), &self.comment)
    }
}

/// A timeout with an optional failure message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timeout {
    pub value: String,
    pub message: Vec<String>,
    pub comment: Vec<String>,
}

impl Timeout {
    pub fn from_cells(cells: &[String]) -> Self {
        let (data, comment) = split_comment(cells);
        let mut data = data.into_iter();
        Self {
            value: data.next().unwrap_or_default(),
            message: data.collect(),
            comment,
        }
    }

    pub fn to_cells(&self) -> Vec<String> {
        let mut cells = vec![self.value.clone()];
        cells.extend(self.message.iter().cloned());
        with_comment(cells, &self.comment)
    }
}

/// Template keyword. Extra cells are joined with a space.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Template {
    pub keyword: String,
    pub comment: Vec<String>,
}

impl Template {
    pub fn from_cells(cells: &[String]) -> Self {
        let (data, comment) = split_comment(cells);
        Self {
            keyword: data.join(" "),
            comment,
        }
    }

    pub fn to_cells(&self) -> Vec<String> {
        with_comment(vec![self.keyword.clone()], &self.comment)
    }
}

/// A `Metadata` entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    pub name: String,
    pub value: Vec<String>,
    pub comment: Vec<String>,
}

impl Metadata {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: vec![value.into()],
            comment: Vec::new(),
        }
    }

    pub fn from_cells(cells: &[String]) -> Self {
        let (data, comment) = split_comment(cells);
        let mut data = data.into_iter();
        Self {
            name: data.next().unwrap_or_default(),
            value: data.collect(),
            comment,
        }
    }

    pub fn to_cells(&self) -> Vec<String> {
        let mut cells = vec![self.name.clone()];
        cells.extend(self.value.iter().cloned());
        with_comment(cells, &self.comment)
    }
}

/// Kind of import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImportKind {
    Library,
    Resource,
    Variables,
}

impl ImportKind {
    pub fn setting_name(&self) -> SettingName {
        match self {
            Self::Library => SettingName::Library,
            Self::Resource => SettingName::Resource,
            Self::Variables => SettingName::Variables,
        }
    }
}

impl std::fmt::Display for ImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Library => write!(f, "Library"),
            Self::Resource => write!(f, "Resource"),
            Self::Variables => write!(f, "Variables"),
        }
    }
}

/// Library alias with the marker it was written with (`WITH NAME` or `AS`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alias {
    pub marker: String,
    pub name: String,
}

/// A `Library`, `Resource` or `Variables` import.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Import {
    pub kind: ImportKind,
    /// Name or path; may contain variables.
    pub name: String,
    pub args: Vec<String>,
    pub alias: Option<Alias>,
    pub comment: Vec<String>,
}

impl Import {
    pub fn new(kind: ImportKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            args: Vec::new(),
            alias: None,
            comment: Vec::new(),
        }
    }

    pub fn library(name: impl Into<String>) -> Self {
        Self::new(ImportKind::Library, name)
    }

    pub fn resource(path: impl Into<String>) -> Self {
        Self::new(ImportKind::Resource, path)
    }

    pub fn variables(path: impl Into<String>) -> Self {
        Self::new(ImportKind::Variables, path)
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
        self.alias = Some(Alias {
            marker: "AS".to_string(),
            name: alias.into(),
        });
        self
    }

    pub fn from_cells(kind: ImportKind, cells: &[String]) -> Self {
        let (data, comment) = split_comment(cells);
        let mut data = data.into_iter();
        let name = data.next().unwrap_or_default();
        let mut args: Vec<String> = data.collect();
        let mut alias = None;
        if kind == ImportKind::Library && args.len() >= 2 {
            let at = args.len() - 2;
            if args[at] == "WITH NAME" || args[at] == "AS" {
                let alias_name = args.pop().unwrap_or_default();
                let marker = args.pop().unwrap_or_default();
                alias = Some(Alias {
                    marker,
                    name: alias_name,
                });
            }
        }
        Self {
            kind,
            name,
            args,
            alias,
            comment,
        }
    }

    /// Cells after the setting name.
    pub fn to_cells(&self) -> Vec<String> {
        let mut cells = vec![self.name.clone()];
        cells.extend(self.args.iter().cloned());
        if let Some(alias) = &self.alias {
            cells.push(alias.marker.clone());
            cells.push(alias.name.clone());
        }
        with_comment(cells, &self.comment)
    }

    /// Name the imported symbols are qualified with.
    pub fn display_name(&self) -> &str {
        self.alias.as_ref().map_or(self.name.as_str(), |a| a.name.as_str())
    }
}

/// One row of the setting table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Setting {
    Documentation(Documentation),
    SuiteSetup(Fixture),
    SuiteTeardown(Fixture),
    TestSetup(Fixture),
    TestTeardown(Fixture),
    ForceTags(Tags),
    DefaultTags(Tags),
    TestTimeout(Timeout),
    TestTemplate(Template),
    Metadata(Metadata),
    Import(Import),
    /// A comment row, or a row that could not be read as a setting.
    Comment(Vec<String>),
}

impl Setting {
    /// Build a setting from the cells following its name.
    pub fn from_cells(name: SettingName, cells: &[String]) -> Self {
        match name {
            SettingName::Documentation => Self::Documentation(Documentation::from_cells(cells)),
            SettingName::SuiteSetup => Self::SuiteSetup(Fixture::from_cells(cells)),
            SettingName::SuiteTeardown => Self::SuiteTeardown(Fixture::from_cells(cells)),
            SettingName::TestSetup => Self::TestSetup(Fixture::from_cells(cells)),
            SettingName::TestTeardown => Self::TestTeardown(Fixture::from_cells(cells)),
            SettingName::ForceTags => Self::ForceTags(Tags::from_cells(cells)),
            SettingName::DefaultTags => Self::DefaultTags(Tags::from_cells(cells)),
            SettingName::TestTimeout => Self::TestTimeout(Timeout::from_cells(cells)),
            SettingName::TestTemplate => Self::TestTemplate(Template::from_cells(cells)),
            SettingName::Metadata => Self::Metadata(Metadata::from_cells(cells)),
            SettingName::Library => Self::Import(Import::from_cells(ImportKind::Library, cells)),
            SettingName::Resource => Self::Import(Import::from_cells(ImportKind::Resource, cells)),
            SettingName::Variables => {
                Self::Import(Import::from_cells(ImportKind::Variables, cells))
            }
        }
    }

    /// Setting name; `None` for comment rows.
    pub fn name(&self) -> Option<SettingName> {
        Some(match self {
            Self::Documentation(_) => SettingName::Documentation,
            Self::SuiteSetup(_) => SettingName::SuiteSetup,
            Self::SuiteTeardown(_) => SettingName::SuiteTeardown,
            Self::TestSetup(_) => SettingName::TestSetup,
            Self::TestTeardown(_) => SettingName::TestTeardown,
            Self::ForceTags(_) => SettingName::ForceTags,
            Self::DefaultTags(_) => SettingName::DefaultTags,
            Self::TestTimeout(_) => SettingName::TestTimeout,
            Self::TestTemplate(_) => SettingName::TestTemplate,
            Self::Metadata(_) => SettingName::Metadata,
            Self::Import(import) => import.kind.setting_name(),
            Self::Comment(_) => return None,
        })
    }

    /// True for settings allowed once per file.
    pub fn is_singleton(&self) -> bool {
        !matches!(self, Self::Metadata(_) | Self::Import(_) | Self::Comment(_))
    }

    /// Full row cells, with the setting name in `language`.
    pub fn to_cells(&self, language: &Language) -> Vec<String> {
        let values = match self {
            Self::Documentation(doc) => doc.to_cells(),
            Self::SuiteSetup(f) | Self::SuiteTeardown(f) | Self::TestSetup(f) | Self::TestTeardown(f) => {
                f.to_cells()
            }
            Self::ForceTags(tags) | Self::DefaultTags(tags) => tags.to_cells(),
            Self::TestTimeout(timeout) => timeout.to_cells(),
            Self::TestTemplate(template) => template.to_cells(),
            Self::Metadata(meta) => meta.to_cells(),
            Self::Import(import) => import.to_cells(),
            Self::Comment(cells) => return cells.clone(),
        };
        let mut cells = Vec::with_capacity(values.len() + 1);
        if let Some(name) = self.name() {
            cells.push(language.setting_label(name).to_string());
        }
        cells.extend(values);
        cells
    }
}

/// The `*** Settings ***` table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SettingTable {
    /// Header as written; `None` if the file has no setting table.
    pub header: Option<TableHeader>,
    /// Rows in source order.
    pub items: Vec<Setting>,
}

impl SettingTable {
    /// The singleton setting with the given name.
    pub fn get(&self, name: SettingName) -> Option<&Setting> {
        self.items.iter().find(|s| s.name() == Some(name))
    }

    /// Set a setting. Singletons replace an existing entry in place; metadata
    /// and imports are appended after the last entry of their kind.
    pub fn set(&mut self, setting: Setting) {
        if setting.is_singleton() {
            if let Some(existing) = self.items.iter_mut().find(|s| s.name() == setting.name()) {
                *existing = setting;
                return;
            }
            self.items.push(setting);
            return;
        }
        let kind = std::mem::discriminant(&setting);
        let last = self
            .items
            .iter()
            .rposition(|s| std::mem::discriminant(s) == kind);
        match last {
            Some(idx) => self.items.insert(idx + 1, setting),
            None => self.items.push(setting),
        }
    }

    /// Remove a singleton setting, returning it.
    pub fn remove(&mut self, name: SettingName) -> Option<Setting> {
        let idx = self.items.iter().position(|s| s.is_singleton() && s.name() == Some(name))?;
        Some(self.items.remove(idx))
    }

    pub fn documentation(&self) -> Option<&Documentation> {
        self.items.iter().find_map(|s| match s {
            Setting::Documentation(doc) => Some(doc),
            _ => None,
        })
    }

    /// Imports in declaration order.
    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.items.iter().filter_map(|s| match s {
            Setting::Import(import) => Some(import),
            _ => None,
        })
    }

    /// Mutable access to the `index`th import.
    pub fn import_mut(&mut self, index: usize) -> Option<&mut Import> {
        self.items
            .iter_mut()
            .filter_map(|s| match s {
                Setting::Import(import) => Some(import),
                _ => None,
            })
            .nth(index)
    }

    /// Position in `items` of the `index`th import.
    pub fn import_position(&self, index: usize) -> Option<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, Setting::Import(_)))
            .map(|(pos, _)| pos)
            .nth(index)
    }

    pub fn metadata(&self) -> impl Iterator<Item = &Metadata> {
        self.items.iter().filter_map(|s| match s {
            Setting::Metadata(meta) => Some(meta),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

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

//! Test cases, user keywords and their tables.

use super::file::TableHeader;
use super::settings::{Documentation, Fixture, Tags, Template, Timeout};
use super::step::Step;
use super::{split_comment, with_comment};
use crate::language::{ItemSettingName, Language};
use crate::names::eq_normalized;

/// `[Arguments]` of a user keyword.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arguments {
    pub args: Vec<String>,
    pub comment: Vec<String>,
}

/// `[Return]` of a user keyword.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReturnValues {
    pub values: Vec<String>,
    pub comment: Vec<String>,
}

/// A bracketed setting of a test case or user keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemSetting {
    Documentation(Documentation),
    Tags(Tags),
    Setup(Fixture),
    Teardown(Fixture),
    Template(Template),
    Timeout(Timeout),
    Arguments(Arguments),
    Return(ReturnValues),
}

impl ItemSetting {
    pub fn from_cells(name: ItemSettingName, cells: &[String]) -> Self {
        match name {
            ItemSettingName::Documentation => Self::Documentation(Documentation::from_cells(cells)),
            ItemSettingName::Tags => Self::Tags(Tags::from_cells(cells)),
            ItemSettingName::Setup => Self::Setup(Fixture::from_cells(cells)),
            ItemSettingName::Teardown => Self::Teardown(Fixture::from_cells(cells)),
            ItemSettingName::Template => Self::Template(Template::from_cells(cells)),
            ItemSettingName::Timeout => Self::Timeout(Timeout::from_cells(cells)),
            ItemSettingName::Arguments => {
                let (args, comment) = split_comment(cells);
                Self::Arguments(Arguments { args, comment })
            }
            ItemSettingName::Return => {
                let (values, comment) = split_comment(cells);
                Self::Return(ReturnValues { values, comment })
            }
        }
    }

    pub fn name(&self) -> ItemSettingName {
        match self {
            Self::Documentation(_) => ItemSettingName::Documentation,
            Self::Tags(_) => ItemSettingName::Tags,
            Self::Setup(_) => ItemSettingName::Setup,
            Self::Teardown(_) => ItemSettingName::Teardown,
            Self::Template(_) => ItemSettingName::Template,
            Self::Timeout(_) => ItemSettingName::Timeout,
            Self::Arguments(_) => ItemSettingName::Arguments,
            Self::Return(_) => ItemSettingName::Return,
        }
    }

    /// Full row cells, starting with the bracketed name in `language`.
    pub fn to_cells(&self, language: &Language) -> Vec<String> {
        let mut cells = vec![language.item_setting_label(self.name())];
        cells.extend(match self {
            Self::Documentation(doc) => doc.to_cells(),
            Self::Tags(tags) => tags.to_cells(),
            Self::Setup(f) | Self::Teardown(f) => f.to_cells(),
            Self::Template(t) => t.to_cells(),
            Self::Timeout(t) => t.to_cells(),
            Self::Arguments(a) => with_comment(a.args.clone(), &a.comment),
            Self::Return(r) => with_comment(r.values.clone(), &r.comment),
        });
        cells
    }

    /// True if the setting is allowed in test cases.
    pub fn allowed_in_test(&self) -> bool {
        !matches!(self, Self::Arguments(_) | Self::Return(_))
    }
}

macro_rules! body_item {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name {
            pub name: String,
            pub settings: Vec<ItemSetting>,
            pub steps: Vec<Step>,
        }

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self {
                    name: name.into(),
                    ..Self::default()
                }
            }

            /// The setting with the given name.
            pub fn setting(&self, name: ItemSettingName) -> Option<&ItemSetting> {
                self.settings.iter().find(|s| s.name() == name)
            }

            /// Replace or add a setting.
            pub fn set_setting(&mut self, setting: ItemSetting) {
                match self.settings.iter_mut().find(|s| s.name() == setting.name()) {
                    Some(existing) => *existing = setting,
                    None => self.settings.push(setting),
                }
            }

            /// Remove a setting, returning it.
            pub fn remove_setting(&mut self, name: ItemSettingName) -> Option<ItemSetting> {
                let idx = self.settings.iter().position(|s| s.name() == name)?;
                Some(self.settings.remove(idx))
            }

            pub fn documentation(&self) -> Option<&Documentation> {
                self.settings.iter().find_map(|s| match s {
                    ItemSetting::Documentation(doc) => Some(doc),
                    _ => None,
                })
            }
        }
    };
}

body_item!(
    /// A test case (or task).
    TestCase
);

body_item!(
    /// A user keyword.
    UserKeyword
);

impl UserKeyword {
    /// Argument specs (`${a}`, `${b}=default`, `@{rest}`, `&{kw}`).
    pub fn arguments(&self) -> &[String] {
        self.settings
            .iter()
            .find_map(|s| match s {
                ItemSetting::Arguments(a) => Some(a.args.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Argument variable names without default values.
    pub fn argument_names(&self) -> Vec<String> {
        self.arguments()
            .iter()
            .map(|spec| match spec.split_once('=') {
                Some((name, _)) => name.trim_end().to_string(),
                None => spec.clone(),
            })
            .collect()
    }

    /// True if the name contains `${...}` embedded arguments.
    pub fn has_embedded_arguments(&self) -> bool {
        self.name.contains("${")
    }
}

/// The `*** Test Cases ***` (or `*** Tasks ***`) table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestCaseTable {
    pub header: Option<TableHeader>,
    /// Comment rows before the first test.
    pub comments: Vec<Vec<String>>,
    pub items: Vec<TestCase>,
}

impl TestCaseTable {
    pub fn get(&self, name: &str) -> Option<&TestCase> {
        self.items.iter().find(|t| eq_normalized(&t.name, name))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|t| eq_normalized(&t.name, name))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.comments.is_empty()
    }
}

/// The `*** Keywords ***` table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeywordTable {
    pub header: Option<TableHeader>,
    /// Comment rows before the first keyword.
    pub comments: Vec<Vec<String>>,
    pub items: Vec<UserKeyword>,
}

impl KeywordTable {
    pub fn get(&self, name: &str) -> Option<&UserKeyword> {
        self.items.iter().find(|k| eq_normalized(&k.name, name))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|k| eq_normalized(&k.name, name))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.comments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KeywordCall;

    fn s(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_item_setting_cells() {
        let setting = ItemSetting::from_cells(ItemSettingName::Tags, &s(&["smoke", "# c"]));
        assert_eq!(
            setting.to_cells(Language::english()),
            s(&["[Tags]", "smoke", "# c"])
        );
        assert!(setting.allowed_in_test());
    }

    #[test]
    fn test_set_setting_replaces() {
        let mut test = TestCase::new("T");
        test.set_setting(ItemSetting::Documentation(Documentation::new("a")));
        test.set_setting(ItemSetting::Documentation(Documentation::new("b")));
        assert_eq!(test.settings.len(), 1);
        assert_eq!(test.documentation().map(|d| d.text()), Some("b".into()));
        assert!(test.remove_setting(ItemSettingName::Documentation).is_some());
        assert!(test.settings.is_empty());
    }

    #[test]
    fn test_keyword_arguments() {
        let mut kw = UserKeyword::new("Login As ${user}");
        kw.settings.push(ItemSetting::from_cells(
            ItemSettingName::Arguments,
            &s(&["${a}", "${b}=default", "@{rest}"]),
        ));
        kw.steps.push(KeywordCall::new("Log").with_args(["${a}"]).into());
        assert_eq!(kw.argument_names(), s(&["${a}", "${b}", "@{rest}"]));
        assert!(kw.has_embedded_arguments());
    }

    #[test]
    fn test_table_lookup() {
        let table = KeywordTable {
            header: None,
            comments: Vec::new(),
            items: vec![UserKeyword::new("My Keyword")],
        };
        assert!(table.get("my_keyword").is_some());
        assert_eq!(table.position("MYKEYWORD"), Some(0));
    }
}

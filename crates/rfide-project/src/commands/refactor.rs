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

//! Refactorings: keyword and variable extraction, keyword rename.

use super::grid::data_start;
use super::primitive::{Batch, InsertItem, ItemValue, ReplaceItemSettings, ReplaceRows, ReplaceSettings, ReplaceVariables, SetItemName};
use super::{Command, CommandContext};
use crate::error::{CommandError, CommandResult};
use crate::events::RideEvent;
use rfide_core::model::{build_steps, flatten_steps, Arguments, KeywordCall, Setting, Step};
use rfide_core::names::{eq_normalized, is_variable};
use rfide_core::{ItemSetting, Language, UserKeyword, Variable};
use rfide_namespace::{FileId, ItemRef};

/// Move rows `first..=last` of the target item into a new user keyword and
/// replace them with a call to it.
///
/// The new keyword takes `args` as its arguments and the call passes them
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractKeyword {
    pub name: String,
    pub args: Vec<String>,
    pub first: usize,
    pub last: usize,
}

impl ExtractKeyword {
    pub fn new(name: impl Into<String>, first: usize, last: usize) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            first: first.min(last),
            last: first.max(last),
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

impl Command for ExtractKeyword {
    fn name(&self) -> &'static str {
        "extract keyword"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let (file, item) = ctx.target_item(self.name())?;
        if self.name.trim().is_empty() {
            return Err(CommandError::invalid(self.name(), "the keyword name is empty"));
        }
        if let Some(bad) = self.args.iter().find(|a| !is_variable(a)) {
            return Err(CommandError::invalid(
                self.name(),
                format!("'{}' is not a variable", bad),
            ));
        }
        let rows = ctx.rows(file, item)?;
        if self.last >= rows.len() {
            return Err(CommandError::RowOutOfRange { row: self.last, len: rows.len() });
        }
        let data = ctx.data(file)?;
        if data.keywords.position(&self.name).is_some() {
            return Err(CommandError::Duplicate(self.name.clone()));
        }

        let extracted = &rows[self.first..=self.last];
        // Rows taken from a loop body keep their marker at the call site and
        // lose it in the new keyword.
        let indent = data_start(&extracted[0]);
        let marker = extracted[0][..indent].to_vec();
        let body: Vec<Vec<String>> = extracted
            .iter()
            .map(|row| {
                if indent > 0 && data_start(row) > 0 {
                    row[1..].to_vec()
                } else {
                    row.clone()
                }
            })
            .collect();

        let mut call_row = marker;
        call_row.push(self.name.clone());
        call_row.extend(self.args.iter().cloned());

        let mut keyword = UserKeyword::new(self.name.clone());
        if !self.args.is_empty() {
            keyword.set_setting(ItemSetting::Arguments(Arguments {
                args: self.args.clone(),
                comment: Vec::new(),
            }));
        }
        keyword.steps = build_steps(&body);
        let index = data.keywords.items.len();

        Batch::new(self.name())
            .with(ReplaceRows::new(file, item, self.first, extracted.len(), vec![call_row]))
            .with(InsertItem {
                file,
                index,
                value: ItemValue::Keyword(keyword),
            })
            .execute(ctx)
    }
}

/// Move the value of one cell of the target item into a new scalar in the
/// variable table, and put the variable in the cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractVariable {
    /// Variable name, with or without `${}`.
    pub name: String,
    pub row: usize,
    pub col: usize,
}

impl ExtractVariable {
    pub fn new(name: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            name: name.into(),
            row,
            col,
        }
    }

    fn variable_name(&self) -> String {
        if is_variable(&self.name) {
            self.name.clone()
        } else {
            format!("${{{}}}", self.name)
        }
    }
}

impl Command for ExtractVariable {
    fn name(&self) -> &'static str {
        "extract variable"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        let (file, item) = ctx.target_item(self.name())?;
        let rows = ctx.rows(file, item)?;
        let Some(row) = rows.get(self.row) else {
            return Err(CommandError::RowOutOfRange { row: self.row, len: rows.len() });
        };
        let value = match row.get(self.col) {
            Some(value) if !value.is_empty() => value.clone(),
            _ => return Err(CommandError::invalid(self.name(), "the cell is empty")),
        };
        let name = self.variable_name();
        let variable = Variable::new(name.clone(), [value]);
        if variable.sigil() != Some('$') || !variable.has_valid_name() {
            return Err(CommandError::invalid(
                self.name(),
                format!("'{}' is not a scalar variable name", name),
            ));
        }
        let data = ctx.data(file)?;
        if data.variables.get(&name).is_some() {
            return Err(CommandError::Duplicate(name));
        }
        let mut new_row = row.clone();
        new_row[self.col] = name;

        Batch::new(self.name())
            .with(ReplaceVariables {
                file,
                start: data.variables.items.len(),
                count: 0,
                rows: vec![variable],
            })
            .with(ReplaceRows::new(file, item, self.row, 1, vec![new_row]))
            .execute(ctx)
    }
}

/// Rename a user keyword and every call, fixture and template using it, in
/// every open file.
///
/// Calls keep their BDD prefix and library or resource qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameKeywordOccurrences {
    pub old: String,
    pub new: String,
}

impl RenameKeywordOccurrences {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    /// Old name without a qualifier.
    fn old_bare(&self) -> &str {
        self.old.rsplit_once('.').map_or(self.old.as_str(), |(_, name)| name)
    }

    fn matches(&self, name: &str) -> bool {
        eq_normalized(name, &self.old) || eq_normalized(name, self.old_bare())
    }

    /// The renamed form of a call, or `None` if the call does not name the
    /// keyword.
    fn rename_call(&self, call: &str, language: &Language) -> Option<String> {
        if self.matches(call) {
            return Some(self.new.clone());
        }
        let (prefix, bare) = match language.strip_bdd_prefix(call) {
            Some(bare) => (&call[..call.len() - bare.len()], bare),
            None => ("", call),
        };
        if !prefix.is_empty() && self.matches(bare) {
            return Some(format!("{}{}", prefix, self.new));
        }
        let (qualifier, name) = bare.rsplit_once('.')?;
        self.matches(name)
            .then(|| format!("{}{}.{}", prefix, qualifier, self.new))
    }

    fn rename_in_file(&self, ctx: &CommandContext<'_>, file: FileId, batch: &mut Batch) -> CommandResult<()> {
        let usages = {
            let scope = ctx.scope(file)?;
            ctx.namespace().keyword_usages(&scope, &self.old)
        };
        let data = ctx.data(file)?;
        let language = data.language();

        let mut by_item: Vec<(ItemRef, Vec<Vec<usize>>)> = Vec::new();
        for usage in usages {
            match by_item.iter_mut().find(|(item, _)| *item == usage.item) {
                Some((_, paths)) => paths.push(usage.steps),
                None => by_item.push((usage.item, vec![usage.steps])),
            }
        }
        for (item, paths) in by_item {
            let Some(steps) = super::item_steps(data, item) else {
                continue;
            };
            let mut steps = steps.clone();
            let mut changed = false;
            for path in &paths {
                let Some(call) = call_at_mut(&mut steps, path) else {
                    continue;
                };
                let Some(renamed) = call.keyword.as_deref().and_then(|k| self.rename_call(k, language)) else {
                    continue;
                };
                call.keyword = Some(renamed);
                changed = true;
            }
            if changed {
                let old_len = ctx.rows(file, item)?.len();
                batch.push(ReplaceRows::all(file, item, old_len, flatten_steps(&steps)));
            }
        }

        let items = data
            .tests
            .items
            .iter()
            .enumerate()
            .map(|(i, t)| (ItemRef::Test(i), &t.settings))
            .chain(
                data.keywords
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, k)| (ItemRef::Keyword(i), &k.settings)),
            );
        for (item, settings) in items {
            let mut settings = settings.clone();
            let mut changed = Vec::new();
            for setting in &mut settings {
                let name = match setting {
                    ItemSetting::Setup(f) | ItemSetting::Teardown(f) => &mut f.name,
                    ItemSetting::Template(t) => &mut t.keyword,
                    _ => continue,
                };
                if let Some(renamed) = self.rename_call(name, language) {
                    *name = renamed;
                    changed.push(language.item_setting_label(setting.name()));
                }
            }
            if !changed.is_empty() {
                batch.push(ReplaceItemSettings {
                    file,
                    item,
                    settings,
                    changed: changed.join(", "),
                });
            }
        }

        for (position, setting) in data.settings.items.iter().enumerate() {
            let mut setting = setting.clone();
            let name = match &mut setting {
                Setting::SuiteSetup(f)
                | Setting::SuiteTeardown(f)
                | Setting::TestSetup(f)
                | Setting::TestTeardown(f) => &mut f.name,
                Setting::TestTemplate(t) => &mut t.keyword,
                _ => continue,
            };
            if let Some(renamed) = self.rename_call(name, language) {
                *name = renamed;
                batch.push(ReplaceSettings {
                    file,
                    start: position,
                    count: 1,
                    rows: vec![setting],
                });
            }
        }

        let definition = data
            .keywords
            .position(&self.old)
            .or_else(|| data.keywords.position(self.old_bare()));
        if let Some(index) = definition {
            if data.keywords.position(&self.new).is_some_and(|other| other != index) {
                return Err(CommandError::Duplicate(self.new.clone()));
            }
            batch.push(SetItemName {
                file,
                item: ItemRef::Keyword(index),
                name: self.new.clone(),
            });
        }
        Ok(())
    }
}

impl Command for RenameKeywordOccurrences {
    fn name(&self) -> &'static str {
        "rename keyword occurrences"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult<Option<Box<dyn Command>>> {
        if self.new.trim().is_empty() {
            return Err(CommandError::invalid(self.name(), "the new name is empty"));
        }
        if self.old == self.new {
            return Ok(None);
        }
        let mut batch = Batch::new(self.name());
        for file in ctx.file_ids() {
            self.rename_in_file(ctx, file, &mut batch)?;
        }
        if batch.is_empty() {
            return Ok(None);
        }
        let inverse = batch.execute(ctx)?;
        ctx.publish(RideEvent::KeywordRenamed {
            old: self.old.clone(),
            new: self.new.clone(),
        });
        Ok(inverse)
    }
}

/// The call at a step path, descending into loop bodies.
fn call_at_mut<'a>(steps: &'a mut [Step], path: &[usize]) -> Option<&'a mut KeywordCall> {
    let (&first, rest) = path.split_first()?;
    match (steps.get_mut(first)?, rest.is_empty()) {
        (Step::Call(call), true) => Some(call),
        (Step::For(lp), false) => call_at_mut(&mut lp.body, rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfide_core::model::ForLoop;

    // ==================== Rename tests ====================

    #[test]
    fn test_rename_call_plain_and_normalized() {
        let cmd = RenameKeywordOccurrences::new("Open Page", "Visit Page");
        let lang = Language::english();
        assert_eq!(cmd.rename_call("open_page", lang), Some("Visit Page".to_string()));
        assert_eq!(cmd.rename_call("Close Page", lang), None);
    }

    #[test]
    fn test_rename_call_keeps_bdd_prefix() {
        let cmd = RenameKeywordOccurrences::new("user logs in", "user signs in");
        let lang = Language::english();
        assert_eq!(
            cmd.rename_call("Given user logs in", lang),
            Some("Given user signs in".to_string())
        );
    }

    #[test]
    fn test_rename_call_keeps_qualifier() {
        let cmd = RenameKeywordOccurrences::new("res2.KW", "KW2");
        let lang = Language::english();
        assert_eq!(cmd.rename_call("res2.KW", lang), Some("KW2".to_string()));
        assert_eq!(cmd.rename_call("other.KW", lang), Some("other.KW2".to_string()));
        assert_eq!(cmd.rename_call("KW", lang), Some("KW2".to_string()));
    }

    #[test]
    fn test_call_at_mut_descends_into_loops() {
        let mut steps = vec![
            Step::Call(KeywordCall::new("Log")),
            Step::For(ForLoop {
                body: vec![Step::Call(KeywordCall::new("Inner"))],
                ..ForLoop::new("${i}", rfide_core::model::ForFlavor::In, ["1"])
            }),
        ];
        assert!(call_at_mut(&mut steps, &[0]).is_some());
        let inner = call_at_mut(&mut steps, &[1, 0]).map(|c| c.keyword.clone());
        assert_eq!(inner, Some(Some("Inner".to_string())));
        assert!(call_at_mut(&mut steps, &[1]).is_none());
        assert!(call_at_mut(&mut steps, &[5]).is_none());
    }

    // ==================== Extract tests ====================

    #[test]
    fn test_extract_variable_wraps_plain_names() {
        assert_eq!(ExtractVariable::new("url", 0, 1).variable_name(), "${url}");
        assert_eq!(ExtractVariable::new("${url}", 0, 1).variable_name(), "${url}");
    }

    #[test]
    fn test_extract_keyword_orders_range() {
        let cmd = ExtractKeyword::new("Helper", 4, 2);
        assert_eq!((cmd.first, cmd.last), (2, 4));
    }
}

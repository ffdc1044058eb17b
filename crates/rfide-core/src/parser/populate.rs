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

//! Filling the model tables from tokenized sections.

use super::{merge_continuations, Section};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::language::{ItemSettingName, Language, SettingName, TableKind};
use crate::lex::Row;
use crate::model::{
    build_steps, CommentTable, DataFile, FileKind, Import, ImportKind, ItemSetting, Setting,
    TableHeader, TestCase, UserKeyword, Variable,
};
use crate::names::{normalize, normalize_variable};
use std::collections::HashSet;

/// Settings a resource file may contain.
const RESOURCE_SETTINGS: [SettingName; 4] = [
    SettingName::Documentation,
    SettingName::Library,
    SettingName::Resource,
    SettingName::Variables,
];

/// Settings an init file may not contain.
const NOT_IN_INIT: [SettingName; 2] = [SettingName::DefaultTags, SettingName::TestTemplate];

/// A test or keyword while its rows are being collected.
struct PendingItem {
    name: String,
    line: usize,
    settings: Vec<ItemSetting>,
    rows: Vec<Vec<String>>,
    base_indent: Option<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Test,
    Keyword,
}

pub(crate) struct Populator<'a> {
    file: &'a mut DataFile,
    language: &'static Language,
    variable_names: HashSet<String>,
    test_names: HashSet<String>,
    keyword_names: HashSet<String>,
}

impl<'a> Populator<'a> {
    pub(crate) fn new(file: &'a mut DataFile, language: &'static Language) -> Self {
        Self {
            file,
            language,
            variable_names: HashSet::new(),
            test_names: HashSet::new(),
            keyword_names: HashSet::new(),
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.file.diagnostics.push(diagnostic);
    }

    pub(crate) fn section(&mut self, section: Section) {
        let Some(header_row) = section.header else {
            self.preamble(section.rows);
            return;
        };
        let header = TableHeader {
            cells: header_row.cells.clone(),
        };
        let kind = self.language.table_kind(&header_row.cells[0]);
        let rows = merge_continuations(section.rows, &mut self.file.diagnostics);
        match kind {
            Some(TableKind::Settings) => {
                self.file.settings.header.get_or_insert(header);
                self.settings(rows);
            }
            Some(TableKind::Variables) => {
                self.file.variables.header.get_or_insert(header);
                self.variables(rows);
            }
            Some(TableKind::TestCases) | Some(TableKind::Tasks) => {
                if self.file.kind == FileKind::Resource {
                    self.report(
                        Diagnostic::error(
                            DiagnosticKind::Parse,
                            format!(
                                "Resource file with '{}' section is invalid",
                                header_row.cells[0].trim_matches('*').trim()
                            ),
                        )
                        .with_line(header_row.line),
                    );
                }
                self.file.tests.header.get_or_insert(header);
                let (comments, items) = self.items(rows, ItemKind::Test);
                self.file.tests.comments.extend(comments);
                for item in items {
                    let mut test = TestCase::new(item.name);
                    test.settings = item.settings;
                    test.steps = build_steps(&item.rows);
                    self.file.tests.items.push(test);
                }
            }
            Some(TableKind::Keywords) => {
                self.file.keywords.header.get_or_insert(header);
                let (comments, items) = self.items(rows, ItemKind::Keyword);
                self.file.keywords.comments.extend(comments);
                for item in items {
                    let mut keyword = UserKeyword::new(item.name);
                    keyword.settings = item.settings;
                    keyword.steps = build_steps(&item.rows);
                    self.file.keywords.items.push(keyword);
                }
            }
            Some(TableKind::Comments) => {
                self.file.comment_tables.push(CommentTable {
                    header,
                    rows: rows.into_iter().map(|r| r.cells).collect(),
                });
            }
            None => {
                self.report(
                    Diagnostic::error(
                        DiagnosticKind::UnknownTable,
                        format!("Unrecognized section header '{}'", header_row.cells[0]),
                    )
                    .with_line(header_row.line),
                );
            }
        }
    }

    fn preamble(&mut self, rows: Vec<Row>) {
        for row in rows {
            let is_marker = row
                .cells
                .iter()
                .find(|c| !c.is_empty())
                .is_some_and(|c| crate::language::language_marker(c).is_some());
            if !is_marker {
                self.file.preamble.push(row.cells);
            }
        }
    }

    // --- Settings ---

    fn settings(&mut self, rows: Vec<Row>) {
        for row in rows {
            let line = row.line;
            let cells = strip_indent(row.cells);
            if cells.first().is_some_and(|c| c.starts_with('#')) {
                self.file.settings.items.push(Setting::Comment(cells));
                continue;
            }
            let Some(name) = self.language.setting(&cells[0]) else {
                self.report(
                    Diagnostic::error(
                        DiagnosticKind::UnknownSetting,
                        format!("Non-existing setting '{}'", cells[0]),
                    )
                    .with_line(line),
                );
                self.file.settings.items.push(Setting::Comment(cells));
                continue;
            };
            let setting = Setting::from_cells(name, &cells[1..]);
            if setting.is_singleton() && self.file.settings.get(name).is_some() {
                self.report(
                    Diagnostic::error(
                        DiagnosticKind::DuplicateName,
                        format!(
                            "Setting '{}' is allowed only once. Only the first value is used",
                            cells[0]
                        ),
                    )
                    .with_line(line),
                );
                self.file.settings.items.push(Setting::Comment(cells));
                continue;
            }
            self.check_setting_placement(name, &cells[0], line);
            if let Setting::Import(import) = &setting {
                self.check_import(import, line);
            }
            self.file.settings.items.push(setting);
        }
    }

    fn check_setting_placement(&mut self, name: SettingName, label: &str, line: usize) {
        let allowed = match self.file.kind {
            FileKind::Resource => RESOURCE_SETTINGS.contains(&name),
            FileKind::InitFile => !NOT_IN_INIT.contains(&name),
            FileKind::TestCaseFile => true,
        };
        if !allowed {
            let place = match self.file.kind {
                FileKind::Resource => "resource file",
                _ => "suite initialization file",
            };
            self.report(
                Diagnostic::error(
                    DiagnosticKind::UnknownSetting,
                    format!("Setting '{}' is not allowed in {}", label, place),
                )
                .with_line(line),
            );
        }
    }

    fn check_import(&mut self, import: &Import, line: usize) {
        if import.name.is_empty() {
            self.report(
                Diagnostic::error(
                    DiagnosticKind::Import,
                    format!("{} setting requires value", import.kind),
                )
                .with_line(line),
            );
        } else if import.kind == ImportKind::Resource && !import.args.is_empty() {
            self.report(
                Diagnostic::warning(
                    DiagnosticKind::Import,
                    format!(
                        "Resource setting accepts only one value, got {}",
                        import.args.len() + 1
                    ),
                )
                .with_line(line),
            );
        }
    }

    // --- Variables ---

    fn variables(&mut self, rows: Vec<Row>) {
        for row in rows {
            let line = row.line;
            let cells = strip_indent(row.cells);
            if cells.first().is_some_and(|c| c.starts_with('#')) {
                self.file.variables.items.push(Variable::comment_row(cells));
                continue;
            }
            let variable = Variable::from_cells(&cells);
            if !variable.has_valid_name() {
                self.report(
                    Diagnostic::error(
                        DiagnosticKind::InvalidVariable,
                        format!("Invalid variable name '{}'", cells[0]),
                    )
                    .with_line(line),
                );
                self.file.variables.items.push(Variable::comment_row(cells));
                continue;
            }
            if let Some(message) = variable.shape_error() {
                self.report(
                    Diagnostic::error(DiagnosticKind::InvalidVariable, message).with_line(line),
                );
            }
            if !self.variable_names.insert(normalize_variable(&variable.name)) {
                self.report(
                    Diagnostic::warning(
                        DiagnosticKind::DuplicateName,
                        format!("Variable '{}' is defined multiple times", variable.name),
                    )
                    .with_line(line),
                );
            }
            self.file.variables.items.push(variable);
        }
    }

    // --- Tests and keywords ---

    fn items(&mut self, rows: Vec<Row>, kind: ItemKind) -> (Vec<Vec<String>>, Vec<PendingItem>) {
        let mut comments = Vec::new();
        let mut items: Vec<PendingItem> = Vec::new();

        for row in rows {
            if !row.is_indented() {
                if row.is_comment() {
                    match items.last_mut() {
                        Some(item) => item.rows.push(row.cells),
                        None => comments.push(row.cells),
                    }
                    continue;
                }
                let mut cells = row.cells.into_iter();
                let name = cells.next().unwrap_or_default();
                self.check_item_name(&name, kind, row.line);
                let mut item = PendingItem {
                    name,
                    line: row.line,
                    settings: Vec::new(),
                    rows: Vec::new(),
                    base_indent: None,
                };
                let rest: Vec<String> = cells.collect();
                if !rest.is_empty() {
                    self.body_row(&mut item, rest, None, kind, row.line);
                }
                items.push(item);
                continue;
            }

            let body: Vec<String> = row.cells[1..].to_vec();
            match items.last_mut() {
                Some(item) => self.body_row(item, body, Some(row.indent), kind, row.line),
                None => {
                    self.report(
                        Diagnostic::error(
                            DiagnosticKind::Parse,
                            "Row is indented but there is no test or keyword to attach it to",
                        )
                        .with_line(row.line),
                    );
                    comments.push(row.cells);
                }
            }
        }
        (comments, items)
    }

    fn check_item_name(&mut self, name: &str, kind: ItemKind, line: usize) {
        let names = match kind {
            ItemKind::Test => &mut self.test_names,
            ItemKind::Keyword => &mut self.keyword_names,
        };
        if !names.insert(normalize(name)) {
            let what = match kind {
                ItemKind::Test => "Test",
                ItemKind::Keyword => "Keyword",
            };
            self.report(
                Diagnostic::warning(
                    DiagnosticKind::DuplicateName,
                    format!("{} '{}' is defined multiple times", what, name),
                )
                .with_line(line),
            );
        }
    }

    fn body_row(
        &mut self,
        item: &mut PendingItem,
        cells: Vec<String>,
        indent: Option<usize>,
        kind: ItemKind,
        line: usize,
    ) {
        if let Some(first) = cells.first().filter(|c| c.starts_with('[') && c.ends_with(']')) {
            match self.language.item_setting(first) {
                Some(name) => {
                    if let Some(setting) = self.item_setting(item, name, &cells, kind, line) {
                        item.settings.push(setting);
                        return;
                    }
                }
                None => self.report(
                    Diagnostic::error(
                        DiagnosticKind::UnknownSetting,
                        format!("Non-existing setting '{}'", first),
                    )
                    .with_line(line),
                ),
            }
        }

        let deeper = match indent {
            Some(indent) => indent > *item.base_indent.get_or_insert(indent),
            None => false,
        };
        if deeper {
            let mut marked = Vec::with_capacity(cells.len() + 1);
            marked.push(String::new());
            marked.extend(cells);
            item.rows.push(marked);
        } else {
            item.rows.push(cells);
        }
    }

    /// Build an item setting, or report why the row stays a plain row.
    fn item_setting(
        &mut self,
        item: &PendingItem,
        name: ItemSettingName,
        cells: &[String],
        kind: ItemKind,
        line: usize,
    ) -> Option<ItemSetting> {
        let setting = ItemSetting::from_cells(name, &cells[1..]);
        if kind == ItemKind::Test && !setting.allowed_in_test() {
            self.report(
                Diagnostic::error(
                    DiagnosticKind::UnknownSetting,
                    format!("Setting '{}' is not allowed with tests or tasks", cells[0]),
                )
                .with_line(line),
            );
            return None;
        }
        if item.settings.iter().any(|s| s.name() == name) {
            self.report(
                Diagnostic::error(
                    DiagnosticKind::DuplicateName,
                    format!(
                        "Setting '{}' is allowed only once in '{}' (line {}). Only the first value is used",
                        cells[0], item.name, item.line
                    ),
                )
                .with_line(line),
            );
            return None;
        }
        Some(setting)
    }
}

/// Drop the indentation marker cell of rows in flat tables.
fn strip_indent(mut cells: Vec<String>) -> Vec<String> {
    if cells.len() > 1 && cells[0].is_empty() {
        cells.remove(0);
    }
    cells
}


#[cfg(test)]
mod tests {
    use crate::diagnostic::DiagnosticKind;
    use crate::model::{FileKind, Format, ItemSetting, Setting, Step};
    use crate::parser::{parse_str, ParseOptions};

    fn parse(text: &str) -> crate::model::DataFile {
        parse_str(text, Format::Robot, &ParseOptions::default()).unwrap()
    }

    fn kinds(file: &crate::model::DataFile) -> Vec<DiagnosticKind> {
        file.diagnostics.iter().map(|d| d.kind().clone()).collect()
    }

    // ==================== Setting table tests ====================

    #[test]
    fn test_settings_table() {
        let file = parse(
            "*** Settings ***\n\
             Documentation    Suite doc\n\
             ...    continued\n\
             Suite Setup    Open    url\n\
             Library    Collections\n\
             # a comment\n\
             Resource    common.resource\n\
             Metadata    Version    1.0\n",
        );
        assert_eq!(file.settings.items.len(), 6);
        assert_eq!(
            file.settings.documentation().map(|d| d.text()),
            Some("Suite doc continued".into())
        );
        assert!(matches!(file.settings.items[3], Setting::Comment(_)));
        assert_eq!(file.settings.imports().count(), 2);
        assert_eq!(file.settings.metadata().count(), 1);
        assert!(file.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_and_duplicate_settings() {
        let file = parse(
            "*** Settings ***\nBogus    x\nTest Timeout    1 min\nTest Timeout    2 min\n",
        );
        assert_eq!(
            kinds(&file),
            vec![DiagnosticKind::UnknownSetting, DiagnosticKind::DuplicateName]
        );
        assert_eq!(file.settings.items.len(), 3);
        assert!(matches!(file.settings.items[2], Setting::Comment(_)));
    }

    #[test]
    fn test_import_without_name() {
        let file = parse("*** Settings ***\nLibrary\n");
        assert_eq!(kinds(&file), vec![DiagnosticKind::Import]);
    }

    #[test]
    fn test_resource_file_restrictions() {
        let opts = ParseOptions::resource();
        let file = parse_str(
            "*** Settings ***\nSuite Setup    X\n*** Test Cases ***\nT\n    Log    x\n",
            Format::Resource,
            &opts,
        )
        .unwrap();
        assert_eq!(file.kind, FileKind::Resource);
        assert_eq!(
            kinds(&file),
            vec![DiagnosticKind::UnknownSetting, DiagnosticKind::Parse]
        );
        assert_eq!(file.tests.items.len(), 1);
    }

    // ==================== Variable table tests ====================

    #[test]
    fn test_variables_table() {
        let file = parse(
            "*** Variables ***\n\
             ${HOST}    localhost\n\
             @{LIST}    a    b\n\
             ...    c\n\
             &{DICT}    k=v\n\
             # comment\n\
             BAD    1\n\
             ${host}    again\n",
        );
        let vars: Vec<_> = file.variables.variables().map(|v| v.name.as_str()).collect();
        assert_eq!(vars, vec!["${HOST}", "@{LIST}", "&{DICT}", "${host}"]);
        assert_eq!(file.variables.get("@{LIST}").unwrap().value.len(), 3);
        assert_eq!(
            kinds(&file),
            vec![DiagnosticKind::InvalidVariable, DiagnosticKind::DuplicateName]
        );
        assert_eq!(file.variables.items.len(), 6);
    }

    // ==================== Test and keyword table tests ====================

    #[test]
    fn test_test_case_table() {
        let file = parse(
            "*** Test Cases ***\n\
             # leading comment\n\
             First    Log    on name row\n\
             \x20   [Tags]    smoke\n\
             \x20   ${x}=    Get Value\n\
             \x20   Log    ${x}    # trailing\n\
             Second\n\
             \x20   [Documentation]    doc\n\
             \x20   No Operation\n",
        );
        assert_eq!(file.tests.comments.len(), 1);
        let first = &file.tests.items[0];
        assert_eq!(first.name, "First");
        assert_eq!(first.steps.len(), 3);
        assert_eq!(first.steps[0].keyword(), Some("Log"));
        let call = first.steps[1].as_call().unwrap();
        assert_eq!(call.assign, vec!["${x}"]);
        assert!(matches!(first.settings[0], ItemSetting::Tags(_)));
        assert_eq!(file.tests.items[1].steps.len(), 1);
    }

    #[test]
    fn test_keyword_only_settings_rejected_in_tests() {
        let file = parse("*** Test Cases ***\nT\n    [Arguments]    ${a}\n    Log    x\n");
        assert_eq!(kinds(&file), vec![DiagnosticKind::UnknownSetting]);
        assert!(file.tests.items[0].settings.is_empty());
        assert_eq!(file.tests.items[0].steps.len(), 2);
    }

    #[test]
    fn test_keywords_table() {
        let file = parse(
            "*** Keywords ***\n\
             Login\n\
             \x20   [Arguments]    ${user}    ${pass}=secret\n\
             \x20   Input    ${user}\n\
             \x20   [Return]    ${user}\n",
        );
        let kw = &file.keywords.items[0];
        assert_eq!(kw.argument_names(), vec!["${user}", "${pass}"]);
        assert_eq!(kw.steps.len(), 1);
        assert_eq!(kw.settings.len(), 2);
    }

    #[test]
    fn test_duplicate_names_reported() {
        let file = parse("*** Keywords ***\nK\n    No Operation\nk\n    No Operation\n");
        assert_eq!(kinds(&file), vec![DiagnosticKind::DuplicateName]);
    }

    #[test]
    fn test_new_style_loop_in_test() {
        let file = parse(
            "*** Test Cases ***\nT\n    FOR    ${x}    IN    a    b\n        Log    ${x}\n    END\n    Log    done\n",
        );
        let steps = &file.tests.items[0].steps;
        assert_eq!(steps.len(), 2);
        assert!(matches!(steps[0], Step::For(_)));
    }

    #[test]
    fn test_orphan_indented_row() {
        let file = parse("*** Test Cases ***\n    Log    x\n");
        assert_eq!(kinds(&file), vec![DiagnosticKind::Parse]);
        assert_eq!(file.tests.comments.len(), 1);
    }

    #[test]
    fn test_comments_table_kept() {
        let file = parse("*** Comments ***\nanything    goes\n");
        assert_eq!(file.comment_tables.len(), 1);
        assert_eq!(file.comment_tables[0].rows[0], vec!["anything", "goes"]);
    }

    #[test]
    fn test_preamble_kept() {
        let file = parse("free text before tables\n*** Settings ***\n");
        assert_eq!(file.preamble, vec![vec!["free text before tables".to_string()]]);
    }
}

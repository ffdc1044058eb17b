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

//! Editing, undo, events and disk synchronisation through a `Project`.

use parking_lot::Mutex;
use proptest::prelude::*;
use rfide_core::model::Setting;
use rfide_core::{parse_str, Format, ItemSetting, ItemSettingName, ParseOptions, SettingName};
use rfide_namespace::{FileId, ItemRef, NamespaceConfig, Resolution};
use rfide_project::commands::{
    AddKeyword, AddLibrary, AddMetadata, AddRow, AddTestCase, AddVariable, ChangeCellValue,
    ChangeSetting, ChangeVariable, CommentRows, DeleteItem, DeleteRow, ExtractKeyword,
    ExtractVariable, MoveRowsUp, Purify, RenameItem, RenameKeywordOccurrences, SettingKey,
    UncommentRows,
};
use rfide_project::{
    CommandError, DiskStamp, ExcludeList, Project, ProjectConfig, RideEvent, Target,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}

fn project() -> Project {
    let config = ProjectConfig::new().with_namespace(NamespaceConfig::new().with_worker_threads(2));
    Project::new(config).unwrap()
}

fn s(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn rows(project: &Project, file: FileId, item: ItemRef) -> Vec<Vec<String>> {
    project.file(file).unwrap().item(item).unwrap().rows()
}

/// An unsaved file parsed from text.
fn add(project: &mut Project, text: &str) -> FileId {
    let data = parse_str(text, Format::Robot, &ParseOptions::default()).unwrap();
    project.add_file(data)
}

fn recorder(project: &Project, topic: &str) -> Arc<Mutex<Vec<RideEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    project.bus().subscribe(topic, move |event| sink.lock().push(event.clone()));
    seen
}

// =============================================================================
// Grid editing and undo
// =============================================================================

#[test]
fn test_change_cell_value_undo_redo() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nEmpty\n");
    let test = Target::Item(file, ItemRef::Test(0));

    project.execute(test, ChangeCellValue::new(0, 0, "Log")).unwrap();
    let steps = project.file(file).unwrap().item(ItemRef::Test(0)).unwrap().steps();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].keyword(), Some("Log"));

    project.undo(test).unwrap();
    assert!(rows(&project, file, ItemRef::Test(0)).is_empty());

    project.redo(test).unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0)), vec![s(&["Log"])]);
}

#[test]
fn test_failed_command_changes_nothing() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nT\n    Log    a\n");
    let test = Target::Item(file, ItemRef::Test(0));
    let events = recorder(&project, "");

    let err = project.execute(test, DeleteRow::new(5)).unwrap_err();
    assert!(matches!(err, CommandError::RowOutOfRange { row: 5, len: 1 }));
    assert!(!project.is_dirty(file));
    assert_eq!(project.undo_depth(test), 0);
    assert!(events.lock().is_empty());

    let err = project.execute(file, ChangeCellValue::new(0, 0, "x")).unwrap_err();
    assert!(matches!(err, CommandError::InvalidTarget { .. }));
    assert!(matches!(project.undo(test), Err(CommandError::NothingToUndo)));
}

#[test]
fn test_consecutive_edits_of_one_cell_merge() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nT\n    Log    a\n");
    let test = Target::Item(file, ItemRef::Test(0));

    project.execute(test, ChangeCellValue::new(0, 1, "b")).unwrap();
    project.execute(test, ChangeCellValue::new(0, 1, "bc")).unwrap();
    project.execute(test, ChangeCellValue::new(0, 1, "bcd")).unwrap();
    assert_eq!(project.undo_depth(test), 1);

    project.undo(test).unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0)), vec![s(&["Log", "a"])]);
    project.redo(test).unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0)), vec![s(&["Log", "bcd"])]);
}

#[test]
fn test_unchanged_value_is_a_no_op() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nT\n    Log    a\n");
    let test = Target::Item(file, ItemRef::Test(0));

    project.execute(test, ChangeCellValue::new(0, 0, "Log")).unwrap();
    assert!(!project.is_dirty(file));
    assert!(!project.can_undo(test));
}

#[test]
fn test_new_edit_clears_redo() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nT\n    Log    a\n");
    let test = Target::Item(file, ItemRef::Test(0));

    project.execute(test, AddRow::new(1)).unwrap();
    project.undo(test).unwrap();
    assert!(project.can_redo(test));
    project.execute(test, ChangeCellValue::new(0, 1, "z")).unwrap();
    assert!(!project.can_redo(test));
}

#[test]
fn test_item_and_file_targets_share_history() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nT\n    Log    a\n");
    let test = Target::Item(file, ItemRef::Test(0));

    project.execute(test, ChangeCellValue::new(0, 1, "b")).unwrap();
    project.execute(file, AddTestCase::new("Second")).unwrap();
    assert_eq!(project.undo_depth(file), 2);

    project.undo(file).unwrap();
    project.undo(file).unwrap();
    assert_eq!(project.data(file).unwrap().tests.items.len(), 1);
    assert_eq!(rows(&project, file, ItemRef::Test(0)), vec![s(&["Log", "a"])]);
}

#[test]
fn test_comment_and_uncomment_rows() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nT\n    Log    a\n    Sleep    1s\n");
    let test = Target::Item(file, ItemRef::Test(0));

    project.execute(test, CommentRows::new([0, 1])).unwrap();
    assert_eq!(
        rows(&project, file, ItemRef::Test(0)),
        vec![s(&["Comment", "Log", "a"]), s(&["Comment", "Sleep", "1s"])]
    );

    project.execute(test, UncommentRows::new([1])).unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0))[1], s(&["Sleep", "1s"]));

    // Row 1 is no longer commented.
    let err = project.execute(test, UncommentRows::new([0, 1])).unwrap_err();
    assert!(matches!(err, CommandError::InvalidTarget { .. }));
}

const OLD_STYLE_LOOP: &str =
    "*** Test Cases ***\nT\n    : FOR    ${i}    IN    1    2    3\n        Log    ${i}\n    No Operation\n";

#[test]
fn test_editing_loop_header_undoes_to_the_loop() {
    let mut project = project();
    let file = add(&mut project, OLD_STYLE_LOOP);
    let test = Target::Item(file, ItemRef::Test(0));
    let before = rows(&project, file, ItemRef::Test(0));
    assert_eq!(before[1], s(&["", "Log", "${i}"]));

    project.execute(test, ChangeCellValue::new(0, 0, "Log")).unwrap();
    let edited = rows(&project, file, ItemRef::Test(0));
    assert_eq!(edited[0][0], "Log");
    assert_eq!(edited[1], s(&["", "Log", "${i}"]));

    project.undo(test).unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0)), before);
    let steps = project.file(file).unwrap().item(ItemRef::Test(0)).unwrap().steps();
    assert_eq!(steps.len(), 2);

    project.redo(test).unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0)), edited);
}

#[test]
fn test_comment_and_uncomment_loop_header() {
    let mut project = project();
    let file = add(&mut project, OLD_STYLE_LOOP);
    let test = Target::Item(file, ItemRef::Test(0));
    let before = rows(&project, file, ItemRef::Test(0));

    project.execute(test, CommentRows::new([0])).unwrap();
    let commented = rows(&project, file, ItemRef::Test(0));
    assert_eq!(commented[0][..2], s(&["Comment", ": FOR"]));
    assert_eq!(commented[1], s(&["", "Log", "${i}"]));

    project.execute(test, UncommentRows::new([0])).unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0)), before);

    project.undo(test).unwrap();
    project.undo(test).unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0)), before);
}

#[test]
fn test_move_rows_and_purify() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nT\n    Log    a\n    Log    b\n");
    let test = Target::Item(file, ItemRef::Test(0));

    project.execute(test, MoveRowsUp::new(1, 1)).unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0))[0], s(&["Log", "b"]));
    assert!(project.execute(test, MoveRowsUp::new(0, 0)).is_err());

    project.execute(test, AddRow::new(1)).unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0)).len(), 3);
    project.execute(test, Purify).unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0)).len(), 2);
}

// =============================================================================
// Items, tables and refactorings
// =============================================================================

#[test]
fn test_extract_keyword() {
    let mut project = project();
    let file = add(
        &mut project,
        "*** Test Cases ***\nT\n    Log    a\n    Log    b\n    Log    c\n",
    );
    let test = Target::Item(file, ItemRef::Test(0));

    project.execute(test, ExtractKeyword::new("Log Twice", 0, 1)).unwrap();
    assert_eq!(
        rows(&project, file, ItemRef::Test(0)),
        vec![s(&["Log Twice"]), s(&["Log", "c"])]
    );
    let kw = project.file(file).unwrap().find_keyword("log twice").unwrap();
    assert_eq!(kw.rows(), vec![s(&["Log", "a"]), s(&["Log", "b"])]);
    assert_eq!(project.undo_depth(test), 1);

    project.undo(test).unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0)).len(), 3);
    assert!(project.data(file).unwrap().keywords.items.is_empty());
}

#[test]
fn test_extract_keyword_with_arguments() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nT\n    Log    ${msg}\n");
    let test = Target::Item(file, ItemRef::Test(0));

    project
        .execute(test, ExtractKeyword::new("Say", 0, 0).with_args(["${msg}"]))
        .unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0)), vec![s(&["Say", "${msg}"])]);
    let data = project.data(file).unwrap();
    assert_eq!(data.keywords.items[0].argument_names(), vec!["${msg}".to_string()]);
}

#[test]
fn test_extract_variable() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nT\n    Open    http://example.com\n");
    let test = Target::Item(file, ItemRef::Test(0));

    project.execute(test, ExtractVariable::new("url", 0, 1)).unwrap();
    assert_eq!(rows(&project, file, ItemRef::Test(0)), vec![s(&["Open", "${url}"])]);
    let var = project.data(file).unwrap().variables.get("${url}").cloned().unwrap();
    assert_eq!(var.value, s(&["http://example.com"]));

    project.undo(test).unwrap();
    assert!(project.data(file).unwrap().variables.get("${url}").is_none());
}

#[test]
fn test_add_and_change_variable() {
    let mut project = project();
    let file = add(&mut project, "*** Variables ***\n${HOST}    localhost\n");

    project.execute(file, AddVariable::new("@{USERS}", ["alice", "bob"])).unwrap();
    assert_eq!(project.data(file).unwrap().variables.items.len(), 2);

    assert!(matches!(
        project.execute(file, AddVariable::new("${host}", ["x"])),
        Err(CommandError::Duplicate(_))
    ));
    assert!(project.execute(file, AddVariable::new("plain", ["x"])).is_err());

    project.execute(file, ChangeVariable::new(0, "${HOST}", ["example.com"])).unwrap();
    assert_eq!(project.data(file).unwrap().variables.items[0].value, s(&["example.com"]));
    assert!(matches!(
        project.execute(file, ChangeVariable::new(1, "${HOST}", ["x"])),
        Err(CommandError::Duplicate(_))
    ));
}

#[test]
fn test_imports_and_metadata_keep_their_groups() {
    let mut project = project();
    let file = add(
        &mut project,
        "*** Settings ***\nLibrary    Collections\nMetadata    Owner    qa\nDocumentation    Suite\n",
    );

    project.execute(file, AddLibrary::new("Process").with_alias("P")).unwrap();
    project.execute(file, AddMetadata::new("Version", "1.0")).unwrap();
    let names: Vec<Option<SettingName>> = project
        .data(file)
        .unwrap()
        .settings
        .items
        .iter()
        .map(Setting::name)
        .collect();
    assert_eq!(
        names,
        vec![
            Some(SettingName::Library),
            Some(SettingName::Library),
            Some(SettingName::Metadata),
            Some(SettingName::Metadata),
            Some(SettingName::Documentation),
        ]
    );
    let imports: Vec<String> = project
        .data(file)
        .unwrap()
        .settings
        .imports()
        .map(|i| i.display_name().to_string())
        .collect();
    assert_eq!(imports, s(&["Collections", "P"]));
}

#[test]
fn test_change_file_and_item_settings() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nT\n    Log    a\n");
    let test = Target::Item(file, ItemRef::Test(0));

    project
        .execute(file, ChangeSetting::file(SettingName::SuiteSetup, Some(["Open Browser", "chrome"])))
        .unwrap();
    match project.data(file).unwrap().settings.get(SettingName::SuiteSetup) {
        Some(Setting::SuiteSetup(fixture)) => {
            assert_eq!(fixture.name, "Open Browser");
            assert_eq!(fixture.args, s(&["chrome"]));
        }
        other => panic!("unexpected {:?}", other),
    }

    project
        .execute(test, ChangeSetting::item(ItemSettingName::Tags, Some(["smoke"])))
        .unwrap();
    let settings = project.file(file).unwrap().item(ItemRef::Test(0)).unwrap().settings().to_vec();
    assert!(settings.iter().any(|s| matches!(s, ItemSetting::Tags(_))));

    assert!(project
        .execute(test, ChangeSetting::item(ItemSettingName::Arguments, Some(["${a}"])))
        .is_err());

    project
        .execute(test, ChangeSetting::clear(SettingKey::Item(ItemSettingName::Tags)))
        .unwrap();
    assert!(project.file(file).unwrap().item(ItemRef::Test(0)).unwrap().settings().is_empty());
}

#[test]
fn test_items_add_rename_delete() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nFirst\n    No Operation\n");

    project.execute(file, AddKeyword::new("Helper").with_args(["${x}"])).unwrap();
    project.execute(file, AddTestCase::new("Second")).unwrap();
    assert!(matches!(
        project.execute(file, AddTestCase::new("first")),
        Err(CommandError::Duplicate(_))
    ));

    let second = Target::Item(file, ItemRef::Test(1));
    project.execute(second, RenameItem::new("Renamed")).unwrap();
    assert!(project.file(file).unwrap().find_test("renamed").is_some());

    project.execute(second, DeleteItem).unwrap();
    assert_eq!(project.data(file).unwrap().tests.items.len(), 1);
    project.undo(file).unwrap();
    assert_eq!(project.data(file).unwrap().tests.items[1].name, "Renamed");
}

#[test]
fn test_resource_files_cannot_hold_tests() {
    let dir = TempDir::new().unwrap();
    let res = write(dir.path(), "common.resource", "*** Keywords ***\nKW\n    No Operation\n");
    let mut project = project();
    let file = project.open_file(&res).unwrap();
    assert!(project.execute(file, AddTestCase::new("T")).is_err());
}

// =============================================================================
// Cross-file rename
// =============================================================================

fn rename_fixture(dir: &Path) -> (PathBuf, PathBuf) {
    write(
        dir,
        "res.robot",
        "*** Settings ***\nResource    res2.robot\n\n*** Keywords ***\nOuter\n    KW\n",
    );
    let res2 = write(dir, "res2.robot", "*** Keywords ***\nKW\n    No Operation\n");
    let suite = write(
        dir,
        "suite.robot",
        "*** Settings ***\nResource    res.robot\nSuite Setup    KW\n\n*** Test Cases ***\nT\n    Outer\n    Given KW\n",
    );
    (suite, res2)
}

#[test]
fn test_rename_keyword_occurrences_across_files() {
    let dir = TempDir::new().unwrap();
    let (suite_path, res2_path) = rename_fixture(dir.path());
    let mut project = project();
    let suite = project.open_file(&suite_path).unwrap();
    let res2 = project.open_file(&res2_path).unwrap();
    project.file(suite).unwrap().await_imports();
    let renamed = recorder(&project, "ride.keyword");

    project
        .execute(Target::Project, RenameKeywordOccurrences::new("KW", "Do Work"))
        .unwrap();

    assert_eq!(project.data(res2).unwrap().keywords.items[0].name, "Do Work");
    let test_rows = rows(&project, suite, ItemRef::Test(0));
    assert_eq!(test_rows[1], s(&["Given Do Work"]));
    match project.data(suite).unwrap().settings.get(SettingName::SuiteSetup) {
        Some(Setting::SuiteSetup(fixture)) => assert_eq!(fixture.name, "Do Work"),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(renamed.lock().len(), 1);
    assert!(project.is_dirty(suite) && project.is_dirty(res2));

    let ctl = project.file(suite).unwrap();
    ctl.await_imports();
    assert!(ctl.resolve("Do Work").keyword().is_some());

    project.undo(Target::Project).unwrap();
    assert_eq!(project.data(res2).unwrap().keywords.items[0].name, "KW");
    assert_eq!(rows(&project, suite, ItemRef::Test(0))[1], s(&["Given KW"]));
}

#[test]
fn test_renaming_a_resource_keyword_updates_importers() {
    let dir = TempDir::new().unwrap();
    let (suite_path, res2_path) = rename_fixture(dir.path());
    let mut project = project();
    let suite = project.open_file(&suite_path).unwrap();
    project.file(suite).unwrap().await_imports();
    assert!(project.file(suite).unwrap().resolve("KW").keyword().is_some());

    let res2 = project.open_file(&res2_path).unwrap();
    project
        .execute(Target::Item(res2, ItemRef::Keyword(0)), RenameItem::new("KW2"))
        .unwrap();

    let ctl = project.file(suite).unwrap();
    ctl.await_imports();
    assert_eq!(ctl.resolve("KW"), Resolution::NotFound);
    assert_eq!(ctl.resolve("KW2").keyword().unwrap().name, "KW2");
}

// =============================================================================
// Events
// =============================================================================

#[test]
fn test_events_follow_topic_hierarchy() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nT\n");
    let items = recorder(&project, "ride.item");
    let all = recorder(&project, "");

    project.execute(file, AddTestCase::new("U")).unwrap();
    project
        .execute(Target::Item(file, ItemRef::Test(0)), ChangeCellValue::new(0, 0, "Log"))
        .unwrap();

    let topics: Vec<&str> = items.lock().iter().map(RideEvent::topic).collect();
    assert_eq!(topics, vec!["ride.item.added", "ride.item.steps.changed"]);
    assert_eq!(all.lock().len(), 2);
}

#[test]
fn test_unsubscribed_handler_sees_nothing() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nT\n");
    let seen = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&seen);
    let subscription = project.bus().subscribe("ride", move |_| *sink.lock() += 1);
    assert!(project.bus().unsubscribe(subscription));
    project.execute(file, AddTestCase::new("U")).unwrap();
    assert_eq!(*seen.lock(), 0);
}

// =============================================================================
// Saving and disk synchronisation
// =============================================================================

fn age(path: &Path) -> SystemTime {
    let old = SystemTime::now() - Duration::from_secs(3600);
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(old)
        .unwrap();
    old
}

#[test]
fn test_save_clears_dirty_and_advances_mtime() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "suite.robot", "*** Test Cases ***\nT\n    Log    a\n");
    let old = age(&path);
    let mut project = project();
    let file = project.open_file(&path).unwrap();
    let saved = recorder(&project, "ride.datafile.saved");

    project
        .execute(Target::Item(file, ItemRef::Test(0)), ChangeCellValue::new(0, 1, "b"))
        .unwrap();
    assert!(project.is_dirty(file));

    project.save(file).unwrap();
    assert!(!project.is_dirty(file));
    assert!(!project.has_been_modified_on_disk(file));
    assert!(DiskStamp::read(&path).unwrap().modified.unwrap() > old);
    assert!(fs::read_to_string(&path).unwrap().contains("Log    b"));
    assert_eq!(saved.lock().len(), 1);
    assert_eq!(project.save_all().unwrap(), 0);
}

#[test]
fn test_unsaved_file_cannot_be_saved() {
    let mut project = project();
    let file = add(&mut project, "*** Test Cases ***\nT\n");
    assert!(matches!(project.save(file), Err(CommandError::NoSource(_))));
}

#[test]
fn test_disk_changes_detected_and_reloaded() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "suite.robot", "*** Test Cases ***\nT\n    Log    a\n");
    age(&path);
    let mut project = project();
    let file = project.open_file(&path).unwrap();
    let test = Target::Item(file, ItemRef::Test(0));
    project.execute(test, ChangeCellValue::new(0, 1, "edited")).unwrap();
    assert!(!project.has_been_modified_on_disk(file));
    assert!(project.modified_files().is_empty());

    fs::write(&path, "*** Test Cases ***\nT\n    Log    external\nU\n    No Operation\n").unwrap();
    assert!(project.has_been_modified_on_disk(file));
    assert_eq!(project.modified_files(), vec![file]);

    let changed = recorder(&project, "ride.datafile.changed");
    project.reload(file).unwrap();
    assert!(!project.has_been_modified_on_disk(file));
    assert!(!project.is_dirty(file));
    assert!(!project.can_undo(test));
    assert_eq!(project.data(file).unwrap().tests.items.len(), 2);
    assert_eq!(rows(&project, file, ItemRef::Test(0)), vec![s(&["Log", "external"])]);
    assert_eq!(changed.lock().len(), 1);
    assert_eq!(project.find_file(&path), Some(file));
}

#[test]
fn test_touch_without_content_change_counts_as_modified() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "suite.robot", "*** Test Cases ***\nT\n");
    age(&path);
    let mut project = project();
    let file = project.open_file(&path).unwrap();
    fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now())
        .unwrap();
    assert!(project.has_been_modified_on_disk(file));
}

#[test]
fn test_remove_file() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "suite.robot", "*** Test Cases ***\nT\n");
    let mut project = project();
    let file = project.open_file(&path).unwrap();
    assert_eq!(project.open_file(&path).unwrap(), file);
    let removed = recorder(&project, "ride.datafile.removed");

    assert!(project.remove_file(file));
    assert!(!project.remove_file(file));
    assert!(project.file(file).is_none());
    assert_eq!(removed.lock().len(), 1);
}

#[test]
fn test_open_suite_honours_exclude_list() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.robot", "*** Test Cases ***\nA\n    No Operation\n");
    write(dir.path(), "skip/b.robot", "*** Test Cases ***\nB\n    No Operation\n");
    let excludes = ExcludeList::parse("skip/\n").unwrap();
    let parse = ParseOptions::builder().exclude(Arc::new(excludes)).build();
    let mut project = Project::new(ProjectConfig::new().with_parse_options(parse)).unwrap();

    let ids = project.open_suite(dir.path()).unwrap();
    let names: Vec<String> = ids
        .iter()
        .map(|id| project.file(*id).unwrap().display_name())
        .collect();
    assert_eq!(names, s(&["a.robot"]));
    assert!(project.files().all(|f| f.parent().is_some()));
}

// =============================================================================
// Property tests
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Cell(usize, usize, &'static str),
    Add(usize),
    Delete(usize),
    Up(usize),
    Comment(usize),
    Uncomment(usize),
    Purify,
}

fn apply(project: &mut Project, test: Target, op: &Op) -> Result<(), CommandError> {
    match *op {
        Op::Cell(r, c, v) => project.execute(test, ChangeCellValue::new(r, c, v)),
        Op::Add(i) => project.execute(test, AddRow::new(i)),
        Op::Delete(i) => project.execute(test, DeleteRow::new(i)),
        Op::Up(i) => project.execute(test, MoveRowsUp::new(i, i)),
        Op::Comment(i) => project.execute(test, CommentRows::new([i])),
        Op::Uncomment(i) => project.execute(test, UncommentRows::new([i])),
        Op::Purify => project.execute(test, Purify),
    }
}

fn op() -> impl Strategy<Value = Op> {
    let value = prop::sample::select(vec!["Log", "Sleep", "1s", "arg"]);
    prop_oneof![
        (0..4usize, 0..3usize, value).prop_map(|(r, c, v)| Op::Cell(r, c, v)),
        (0..4usize).prop_map(Op::Add),
        (0..4usize).prop_map(Op::Delete),
        (1..4usize).prop_map(Op::Up),
        (0..4usize).prop_map(Op::Comment),
        Just(Op::Purify),
    ]
}

const LOOP_FIXTURES: [&str; 3] = [
    OLD_STYLE_LOOP,
    "*** Test Cases ***\nT\n    :FOR    ${i}    IN RANGE    3\n    \\    Log    ${i}\n    \\    Sleep    1s\n    Log    done\n",
    "*** Test Cases ***\nT\n    FOR    ${x}    IN    a    b\n        Log    ${x}\n    END\n    Log    done\n",
];

fn loop_op() -> impl Strategy<Value = Op> {
    let value = prop::sample::select(vec!["Log", ": FOR", "FOR", "END", "IN", "${i}", ""]);
    prop_oneof![
        (0..5usize, 0..3usize, value).prop_map(|(r, c, v)| Op::Cell(r, c, v)),
        (0..5usize).prop_map(Op::Add),
        (0..5usize).prop_map(Op::Delete),
        (1..5usize).prop_map(Op::Up),
        (0..5usize).prop_map(Op::Comment),
        (0..5usize).prop_map(Op::Uncomment),
        Just(Op::Purify),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_undo_and_redo_restore_states(ops in prop::collection::vec(op(), 1..12)) {
        let mut project = project();
        let file = add(&mut project, "*** Test Cases ***\nT\n    Log    a\n    Sleep    1s\n");
        let test = Target::Item(file, ItemRef::Test(0));
        let initial = rows(&project, file, ItemRef::Test(0));

        for op in ops {
            // Rejected commands leave the model and history unchanged.
            let _ = apply(&mut project, test, &op);
        }
        let last = rows(&project, file, ItemRef::Test(0));

        let depth = project.undo_depth(test);
        for _ in 0..depth {
            project.undo(test).unwrap();
        }
        prop_assert_eq!(rows(&project, file, ItemRef::Test(0)), initial);

        while project.can_redo(test) {
            project.redo(test).unwrap();
        }
        prop_assert_eq!(rows(&project, file, ItemRef::Test(0)), last);
    }

    #[test]
    fn prop_each_edit_of_a_loop_undoes_exactly(
        fixture in prop::sample::select(LOOP_FIXTURES.to_vec()),
        ops in prop::collection::vec(loop_op(), 1..10),
    ) {
        let mut project = project();
        let file = add(&mut project, fixture);
        let test = Target::Item(file, ItemRef::Test(0));
        let initial = rows(&project, file, ItemRef::Test(0));

        for op in ops {
            let before = rows(&project, file, ItemRef::Test(0));
            let depth = project.undo_depth(test);
            if apply(&mut project, test, &op).is_ok() && project.undo_depth(test) > depth {
                let after = rows(&project, file, ItemRef::Test(0));
                project.undo(test).unwrap();
                prop_assert_eq!(rows(&project, file, ItemRef::Test(0)), before, "undo of {:?}", op);
                project.redo(test).unwrap();
                prop_assert_eq!(rows(&project, file, ItemRef::Test(0)), after, "redo of {:?}", op);
            }
        }

        while project.undo_depth(test) > 0 {
            project.undo(test).unwrap();
        }
        prop_assert_eq!(rows(&project, file, ItemRef::Test(0)), initial);
    }
}

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

//! Keyword and variable resolution across real files on disk.

use proptest::prelude::*;
use rfide_core::{parse_file, parse_str, DataFile, DiagnosticKind, Format, ParseOptions};
use rfide_namespace::{
    Cursor, FileId, FileScope, ImportState, ItemRef, KeywordSource, Loaded, Namespace,
    NamespaceConfig, Resolution, Value, VariableSource, VariableValue,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn namespace() -> Namespace {
    Namespace::new(NamespaceConfig::new().with_worker_threads(2)).unwrap()
}

fn open(path: &Path) -> DataFile {
    parse_file(path, &ParseOptions::default()).unwrap()
}

// =============================================================================
// Transitive resources
// =============================================================================

#[test]
fn test_transitive_resources_and_rename() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "res.robot",
        "*** Settings ***\nResource    res2.robot\n\n*** Keywords ***\nOuter\n    KW\n",
    );
    let res2 = write(dir.path(), "res2.robot", "*** Keywords ***\nKW\n    No Operation\n");
    let suite = write(
        dir.path(),
        "suite.robot",
        "*** Settings ***\nResource    res.robot\n\n*** Test Cases ***\nT\n    Outer\n    KW\n",
    );

    let ns = namespace();
    let file = open(&suite);
    let scope = FileScope::new(FileId(1), 0, &file);
    ns.await_imports(&scope);

    assert!(ns.resolve(&scope, "Outer").keyword().is_some());
    let kw = ns.resolve(&scope, "KW").keyword().cloned().unwrap();
    assert!(matches!(&kw.source, KeywordSource::Resource(p) if p.ends_with("res2.robot")));
    assert_eq!(ns.import_status(&scope).len(), 2);

    // Rename the keyword in res2 through the cache, as an editor would.
    let loaded = ns.cache().get_or_load(&res2, None).wait().unwrap();
    let mut edited = (**loaded.as_resource().unwrap()).clone();
    edited.keywords.items[0].name = "KW Renamed".to_string();
    ns.cache().update(&res2, Arc::new(edited));

    assert_eq!(ns.resolve(&scope, "KW"), Resolution::NotFound);
    assert_eq!(ns.resolve(&scope, "KW Renamed").keyword().unwrap().name, "KW Renamed");
}

#[test]
fn test_cyclic_resources_terminate() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.resource",
        "*** Settings ***\nResource    b.resource\n\n*** Keywords ***\nFrom A\n    No Operation\n",
    );
    write(
        dir.path(),
        "b.resource",
        "*** Settings ***\nResource    a.resource\n\n*** Keywords ***\nFrom B\n    No Operation\n",
    );
    let suite = write(dir.path(), "suite.robot", "*** Settings ***\nResource    a.resource\n");

    let ns = namespace();
    let file = open(&suite);
    let scope = FileScope::new(FileId(1), 0, &file);
    ns.await_imports(&scope);

    assert!(ns.resolve(&scope, "From A").keyword().is_some());
    assert!(ns.resolve(&scope, "From B").keyword().is_some());
    // b imports a again; a is only indexed once.
    assert_eq!(
        ns.keywords(&scope).iter().filter(|k| k.name == "From A").count(),
        1
    );
}

#[test]
fn test_disk_change_reloads_resource() {
    let dir = TempDir::new().unwrap();
    let res = write(dir.path(), "common.resource", "*** Keywords ***\nOld\n    No Operation\n");
    let suite = write(dir.path(), "suite.robot", "*** Settings ***\nResource    common.resource\n");

    let ns = namespace();
    let file = open(&suite);
    let scope = FileScope::new(FileId(1), 0, &file);
    ns.await_imports(&scope);
    assert!(ns.resolve(&scope, "Old").keyword().is_some());

    write(dir.path(), "common.resource", "*** Keywords ***\nNew Name\n    No Operation\n");
    ns.cache().invalidate(&res);
    ns.await_imports(&scope);
    assert!(ns.resolve(&scope, "New Name").keyword().is_some());
    assert_eq!(ns.resolve(&scope, "Old"), Resolution::NotFound);
}

// =============================================================================
// Import errors
// =============================================================================

#[test]
fn test_unresolvable_library_name() {
    let ns = namespace();
    let file = parse_str(
        "*** Settings ***\nLibrary    ${nope}\n\n*** Test Cases ***\nStill Parsed\n    Log    fine\n",
        Format::Robot,
        &ParseOptions::default(),
    )
    .unwrap();
    let scope = FileScope::new(FileId(1), 0, &file);

    let diags = ns.diagnostics(&scope);
    assert!(diags.iter().any(|d| *d.kind() == DiagnosticKind::Import));
    assert_eq!(file.tests.items[0].name, "Still Parsed");
    assert!(matches!(ns.import_status(&scope)[0].state, ImportState::Failed(_)));
    assert!(ns.resolve(&scope, "Log").keyword().is_some());
}

#[test]
fn test_variable_file_import() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "vars.yaml", "SERVER: example.com\nPORTS: [80, 443]\n");
    write(dir.path(), "dynamic.py", "def get_variables():\n    return {}\n");
    let suite = write(
        dir.path(),
        "suite.robot",
        "*** Settings ***\nVariables    vars.yaml\nVariables    dynamic.py\n",
    );

    let ns = namespace();
    let file = open(&suite);
    let scope = FileScope::new(FileId(1), 0, &file);
    ns.await_imports(&scope);

    let store = ns.variable_store(&scope, None);
    assert_eq!(store.replace_string("${SERVER}:${PORTS}[1]").unwrap(), "example.com:443");
    let statuses = ns.import_status(&scope);
    assert!(matches!(statuses[0].state, ImportState::Resolved));
    assert!(matches!(statuses[1].state, ImportState::Failed(_)));
}

#[test]
fn test_library_spec_on_search_path() {
    let dir = TempDir::new().unwrap();
    let specs = dir.path().join("specs");
    fs::create_dir(&specs).unwrap();
    write(
        &specs,
        "SeleniumLibrary.xml",
        r#"<keywordspec name="SeleniumLibrary"><kw name="Open Browser"><arguments><arg>url</arg><arg>browser=firefox</arg></arguments><doc>Opens a browser.</doc></kw></keywordspec>"#,
    );
    let suite = write(dir.path(), "suite.robot", "*** Settings ***\nLibrary    SeleniumLibrary\n");

    let ns = Namespace::new(NamespaceConfig::new().with_spec_path(&specs)).unwrap();
    let file = open(&suite);
    let scope = FileScope::new(FileId(1), 0, &file);
    ns.await_imports(&scope);

    let kw = ns.resolve(&scope, "open browser").keyword().cloned().unwrap();
    assert_eq!(kw.args, vec!["url", "browser=firefox"]);
    assert_eq!(kw.short_doc(), "Opens a browser.");
    let cached = ns.cache().peek(&specs.join("SeleniumLibrary.xml"));
    assert!(matches!(cached, Some(rfide_namespace::LoadState::Ready(Loaded::Library(_)))));
}

// =============================================================================
// Variable priority
// =============================================================================

#[test]
fn test_scope_priority_layers() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "common.resource",
        "*** Variables ***\n${X}    resource\n${Y}    resource\n${Z}    resource\n",
    );
    write(dir.path(), "vars.json", r#"{"X": "varfile", "Y": "varfile", "Z": "varfile", "W": "varfile"}"#);
    let suite = write(
        dir.path(),
        "suite.robot",
        "*** Settings ***\nResource    common.resource\nVariables    vars.json\n\n\
         *** Variables ***\n${X}    file\n${Y}    file\n\n\
         *** Keywords ***\nK\n    [Arguments]    ${X}\n    No Operation\n",
    );

    let ns = namespace();
    let file = open(&suite);
    let scope = FileScope::new(FileId(1), 0, &file);
    ns.await_imports(&scope);

    let cursor = Cursor::new(ItemRef::Keyword(0));
    let store = ns.variable_store(&scope, Some(&cursor));
    assert_eq!(store.get("${X}").unwrap().source, VariableSource::Argument);
    assert_eq!(store.get("${Y}").unwrap().source, VariableSource::File);
    assert!(matches!(store.get("${Z}").unwrap().source, VariableSource::Resource(_)));
    assert!(matches!(store.get("${W}").unwrap().source, VariableSource::VariableFile(_)));
    assert_eq!(store.get("${SPACE}").unwrap().value, VariableValue::Value(Value::from(" ")));
    assert_eq!(store.get("${SPACE}").unwrap().source, VariableSource::BuiltIn);
}

// =============================================================================
// Determinism
// =============================================================================

fn suggestion_fixture() -> DataFile {
    parse_str(
        "*** Settings ***\nLibrary    Collections\nLibrary    String\n\n\
         *** Keywords ***\nShould Log Things\n    No Operation\nGet Things\n    No Operation\n",
        Format::Robot,
        &ParseOptions::default(),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_suggestions_depend_only_on_versions(prefix in "[a-zA-Z ]{0,6}") {
        let file = suggestion_fixture();
        let first = namespace();
        let second = namespace();
        let scope = FileScope::new(FileId(1), 3, &file);

        let a = first.suggestions(&scope, None, &prefix);
        let b = first.suggestions(&scope, None, &prefix);
        let c = second.suggestions(&scope, None, &prefix);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);
    }
}

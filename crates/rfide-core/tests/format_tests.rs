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

//! Reading the same suite from every supported format.

use rfide_core::lex::Dialect;
use rfide_core::model::{ForFlavor, LoopStyle, Setting, Step};
use rfide_core::{
    parse_file, parse_str, DataFile, DiagnosticKind, FileKind, Format, ParseOptions,
};
use std::fs;
use tempfile::TempDir;

fn parse(text: &str, format: Format) -> DataFile {
    parse_str(text, format, &ParseOptions::default()).unwrap()
}

fn assert_example_suite(file: &DataFile) {
    assert_eq!(file.settings.imports().count(), 1);
    assert_eq!(file.variables.get("${GREETING}").unwrap().value, vec!["Hello"]);
    let test = file.tests.get("Greets").unwrap();
    assert_eq!(test.steps.len(), 2);
    assert_eq!(test.steps[0].keyword(), Some("Log"));
    assert_eq!(file.keywords.items[0].name, "My Keyword");
}

// =============================================================================
// Formats
// =============================================================================

#[test]
fn test_space_separated() {
    let file = parse(
        "*** Settings ***\n\
         Library    OperatingSystem\n\
         \n\
         *** Variables ***\n\
         ${GREETING}    Hello\n\
         \n\
         *** Test Cases ***\n\
         Greets\n\
         \x20   Log    ${GREETING}\n\
         \x20   My Keyword\n\
         \n\
         *** Keywords ***\n\
         My Keyword\n\
         \x20   No Operation\n",
        Format::Robot,
    );
    assert_example_suite(&file);
    assert_eq!(file.dialect, Dialect::Space);
}

#[test]
fn test_pipe_separated() {
    let file = parse(
        "| *** Settings *** |\n\
         | Library | OperatingSystem |\n\
         | *** Variables *** |\n\
         | ${GREETING} | Hello |\n\
         | *** Test Cases *** |\n\
         | Greets |\n\
         |        | Log | ${GREETING} |\n\
         |        | My Keyword |\n\
         | *** Keywords *** |\n\
         | My Keyword |\n\
         |            | No Operation |\n",
        Format::Txt,
    );
    assert_example_suite(&file);
    assert_eq!(file.dialect, Dialect::Pipe);
}

#[test]
fn test_tsv() {
    let file = parse(
        "*Setting*\t*Value*\n\
         Library\tOperatingSystem\n\
         *Variable*\t*Value*\n\
         ${GREETING}\tHello\n\
         *Test Case*\t*Action*\n\
         Greets\tLog\t${GREETING}\n\
         \tMy Keyword\n\
         *Keyword*\n\
         My Keyword\tNo Operation\n",
        Format::Tsv,
    );
    assert_example_suite(&file);
}

#[test]
fn test_html() {
    let file = parse(
        r#"<html><body>
<table><tr><th>Setting</th><th>Value</th></tr>
<tr><td>Library</td><td>OperatingSystem</td></tr></table>
<table><tr><th>Variable</th></tr>
<tr><td>${GREETING}</td><td>Hello</td></tr></table>
<table><tr><th>Test Case</th><th>Action</th></tr>
<tr><td>Greets</td><td>Log</td><td>${GREETING}</td></tr>
<tr><td></td><td>My Keyword</td></tr></table>
<table><tr><th>Keyword</th></tr>
<tr><td>My Keyword</td><td>No Operation</td></tr></table>
</body></html>"#,
        Format::Html,
    );
    assert_example_suite(&file);
}

// =============================================================================
// Loops
// =============================================================================

#[test]
fn test_backslash_loop_body() {
    let file = parse(
        "*** Test Cases ***\n\
         Loop\n\
         \x20   :FOR    ${i}    IN RANGE    3\n\
         \x20   \\    Log    ${i}\n\
         \x20   \\    Log    again\n\
         \x20   Log    after\n",
        Format::Robot,
    );
    let steps = &file.tests.items[0].steps;
    assert_eq!(steps.len(), 2);
    let Step::For(lp) = &steps[0] else {
        panic!("expected loop")
    };
    assert_eq!(lp.flavor, ForFlavor::InRange);
    assert_eq!(lp.style, LoopStyle::Backslash);
    assert_eq!(lp.body.len(), 2);
}

#[test]
fn test_nested_new_style_loops() {
    let file = parse(
        "*** Keywords ***\n\
         Nested\n\
         \x20   FOR    ${a}    IN    1    2\n\
         \x20       FOR    ${b}    IN ZIP    ${x}    ${y}\n\
         \x20           Log    ${a}${b}\n\
         \x20       END\n\
         \x20   END\n",
        Format::Robot,
    );
    let steps = &file.keywords.items[0].steps;
    assert_eq!(steps.len(), 1);
    let Step::For(outer) = &steps[0] else {
        panic!("expected loop")
    };
    assert!(outer.end.is_some());
    let Step::For(inner) = &outer.body[0] else {
        panic!("expected inner loop")
    };
    assert_eq!(inner.flavor, ForFlavor::InZip);
}

// =============================================================================
// Files on disk
// =============================================================================

#[test]
fn test_parse_file_sets_source_and_kind() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shared.resource");
    fs::write(&path, "*** Settings ***\nSuite Setup    X\n").unwrap();

    let file = parse_file(&path, &ParseOptions::default()).unwrap();
    assert_eq!(file.kind, FileKind::Resource);
    assert_eq!(file.source.as_deref(), Some(path.as_path()));
    assert_eq!(file.diagnostics.len(), 1);
    assert_eq!(file.diagnostics[0].source(), Some(path.as_path()));
    assert!(matches!(file.settings.items[0], Setting::SuiteSetup(_)));
}

#[test]
fn test_parse_file_rejects_unknown_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.md");
    fs::write(&path, "# hi").unwrap();
    assert!(parse_file(&path, &ParseOptions::default()).is_err());
}

#[test]
fn test_crlf_and_bom() {
    let file = parse(
        "\u{feff}*** Variables ***\r\n${A}    1\r\n",
        Format::Robot,
    );
    assert!(file.variables.get("${A}").is_some());
    assert!(!file
        .diagnostics
        .iter()
        .any(|d| d.kind() == &DiagnosticKind::Encoding));
}

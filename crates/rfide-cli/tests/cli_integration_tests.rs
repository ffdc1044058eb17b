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

//! End-to-end tests of the rfide binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn rfide_cmd() -> Command {
    Command::cargo_bin("rfide").expect("Failed to find rfide binary")
}

const SUITE: &str = "\
*** Settings ***
Resource    common.robot

*** Variables ***
${GREETING}    Hello

*** Test Cases ***
Greets
    Say Hello    world
    Log    ${GREETING}
";

const COMMON: &str = "\
*** Variables ***
${HOST}    localhost

*** Keywords ***
Say Hello
    [Arguments]    ${name}
    Log    Hello ${name}
";

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).expect("Failed to write test file");
    path
}

fn suite_dir() -> (TempDir, PathBuf) {
    let dir = tempdir().expect("Failed to create temp dir");
    write(dir.path(), "common.robot", COMMON);
    let suite = write(dir.path(), "greet.robot", SUITE);
    (dir, suite)
}

// ==================== validate tests ====================

#[test]
fn test_validate_clean_suite() {
    let (dir, _) = suite_dir();
    rfide_cmd()
        .arg("validate")
        .arg(dir.path())
        .arg("--strict")
        .assert()
        .success()
        .stdout(predicate::str::contains("greet.robot"))
        .stdout(predicate::str::contains("Tests: 1"));
}

#[test]
fn test_validate_failed_import_is_error() {
    let dir = tempdir().unwrap();
    let file = write(
        dir.path(),
        "broken.robot",
        "*** Settings ***\nResource    missing.robot\n\n*** Test Cases ***\nT\n    Log    x\n",
    );
    rfide_cmd()
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("[import]"))
        .stderr(predicate::str::contains("1 file(s) with 1 problem(s)"));
}

#[test]
fn test_validate_unknown_keyword_fails_only_when_strict() {
    let dir = tempdir().unwrap();
    let file = write(
        dir.path(),
        "typo.robot",
        "*** Test Cases ***\nT\n    Lgo    x\n",
    );
    rfide_cmd()
        .arg("validate")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown-keyword"));
    rfide_cmd()
        .arg("validate")
        .arg(&file)
        .arg("--strict")
        .assert()
        .failure();
}

#[test]
fn test_validate_parallel_many_paths() {
    let (dir, suite) = suite_dir();
    let other = write(dir.path(), "other.robot", "*** Test Cases ***\nA\n    No Operation\n");
    rfide_cmd()
        .arg("validate")
        .arg(&suite)
        .arg(&other)
        .arg("--parallel")
        .assert()
        .success()
        .stdout(predicate::str::contains("other.robot"));
}

#[test]
fn test_validate_respects_exclude_list() {
    let (dir, _) = suite_dir();
    write(dir.path(), "typo.robot", "*** Test Cases ***\nT\n    Lgo    x\n");
    let excludes = write(dir.path(), "excludes", "typo.robot\n");
    rfide_cmd()
        .arg("validate")
        .arg(dir.path())
        .arg("--strict")
        .arg("--exclude")
        .arg(&excludes)
        .assert()
        .success()
        .stdout(predicate::str::contains("typo.robot").not());
}

// ==================== format tests ====================

#[test]
fn test_format_output_then_check() {
    let (dir, suite) = suite_dir();
    let out = dir.path().join("formatted.robot");
    rfide_cmd()
        .arg("format")
        .arg(&suite)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();
    rfide_cmd()
        .arg("format")
        .arg(&out)
        .arg("--check")
        .assert()
        .success()
        .stdout(predicate::str::contains("is formatted"));
}

#[test]
fn test_format_check_reports_unformatted() {
    let dir = tempdir().unwrap();
    let file = write(dir.path(), "messy.robot", "*** Test Cases ***\nT\n    Log      x\n");
    rfide_cmd()
        .arg("format")
        .arg(&file)
        .arg("--check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not formatted"));
}

#[test]
fn test_format_converts_to_tsv() {
    let (_dir, suite) = suite_dir();
    rfide_cmd()
        .arg("format")
        .arg(&suite)
        .arg("--to")
        .arg("tsv")
        .assert()
        .success()
        .stdout(predicate::str::contains("Say Hello\tworld"));
}

#[test]
fn test_format_rejects_bad_width() {
    let (_dir, suite) = suite_dir();
    rfide_cmd()
        .arg("format")
        .arg(&suite)
        .arg("--separator-width")
        .arg("1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Separator width"));
}

#[test]
fn test_format_missing_file() {
    rfide_cmd()
        .arg("format")
        .arg("/nonexistent/suite.robot")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// ==================== namespace query tests ====================

#[test]
fn test_keywords_lists_resource_and_library_keywords() {
    let (_dir, suite) = suite_dir();
    rfide_cmd()
        .arg("keywords")
        .arg(&suite)
        .assert()
        .success()
        .stdout(predicate::str::contains("Say Hello"))
        .stdout(predicate::str::contains("common.robot"))
        .stdout(predicate::str::contains("BuiltIn"));
}

#[test]
fn test_keywords_prefix_filter() {
    let (_dir, suite) = suite_dir();
    rfide_cmd()
        .arg("keywords")
        .arg(&suite)
        .arg("--prefix")
        .arg("say h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Say Hello"))
        .stdout(predicate::str::contains("Should Be Equal").not());
}

#[test]
fn test_resolve_found_and_missing() {
    let (_dir, suite) = suite_dir();
    rfide_cmd()
        .arg("resolve")
        .arg(&suite)
        .arg("say_hello")
        .assert()
        .success()
        .stdout(predicate::str::contains("Say Hello"));
    rfide_cmd()
        .arg("resolve")
        .arg(&suite)
        .arg("Say Goodbye")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No keyword with name 'Say Goodbye' found"));
}

#[test]
fn test_variables_include_imported() {
    let (_dir, suite) = suite_dir();
    rfide_cmd()
        .arg("variables")
        .arg(&suite)
        .assert()
        .success()
        .stdout(predicate::str::contains("${GREETING}"))
        .stdout(predicate::str::contains("${HOST}"));
}

// ==================== run-args tests ====================

#[test]
fn test_run_args_default_profile() {
    rfide_cmd()
        .arg("run-args")
        .arg("suites")
        .arg("--test")
        .arg("Suites.Login.Valid Login")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("robot\n"))
        .stdout(predicate::str::contains("--test\nValid Login\n"))
        .stdout(predicate::str::ends_with("suites\n"));
}

#[test]
fn test_run_args_from_settings() {
    let dir = tempdir().unwrap();
    let settings = write(
        dir.path(),
        "settings.cfg",
        "settings_version = 3\n[Test Runner]\nexecutable = 'pybot'\narguments = '--loglevel DEBUG'\nlistener port = 5010\n",
    );
    let argfile = dir.path().join("args.txt");
    rfide_cmd()
        .arg("run-args")
        .arg("suites")
        .arg("--listener")
        .arg("Agent.py")
        .arg("--argument-file")
        .arg(&argfile)
        .arg("--settings")
        .arg(&settings)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("pybot\n"))
        .stdout(predicate::str::contains("Agent.py:5010:False"));
    assert_eq!(fs::read_to_string(&argfile).unwrap(), "--loglevel\nDEBUG\n");
}

#[test]
fn test_run_args_listener_without_port() {
    rfide_cmd()
        .arg("run-args")
        .arg("suites")
        .arg("--listener")
        .arg("Agent.py")
        .assert()
        .failure()
        .stderr(predicate::str::contains("port"));
}

// ==================== completion tests ====================

#[test]
fn test_completion_bash() {
    rfide_cmd()
        .arg("completion")
        .arg("bash")
        .assert()
        .success()
        .stdout(predicate::str::contains("rfide"));
}

#[test]
fn test_completion_unknown_shell() {
    rfide_cmd()
        .arg("completion")
        .arg("tcsh")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported shell"));
}

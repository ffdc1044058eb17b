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

//! Reading directory suites.

use super::{kind_from_path, parse_file_lenient, ParseOptions};
use crate::error::{RfError, RfResult};
use crate::model::{FileKind, Format, Suite, TestDataDirectory};
use std::path::Path;
use tracing::{debug, trace};

/// True for `__init__.<ext>` files with a test data extension.
pub fn is_init_file(path: &Path) -> bool {
    path.file_stem().and_then(|s| s.to_str()) == Some("__init__")
        && Format::from_path(path).is_some()
}

/// Parse a file or a directory into a suite.
pub fn parse_suite(path: &Path, options: &ParseOptions) -> RfResult<Suite> {
    if path.is_dir() {
        parse_directory(path, options).map(Suite::Directory)
    } else {
        Ok(Suite::File(super::parse_file(path, options)?))
    }
}

/// Parse a directory suite recursively.
///
/// Entries are visited in name order. Hidden entries and entries starting
/// with `_` are skipped, except the init file. A child file is a suite when
/// it has a test case table; a child directory when it has suites or an
/// init file. Files that fail to read become suites carrying a diagnostic.
pub fn parse_directory(path: &Path, options: &ParseOptions) -> RfResult<TestDataDirectory> {
    parse_directory_at(path, options, 0)
}

fn parse_directory_at(
    path: &Path,
    options: &ParseOptions,
    depth: usize,
) -> RfResult<TestDataDirectory> {
    if depth > options.limits.max_directory_depth {
        return Err(RfError::security(
            format!(
                "Directory nesting exceeds the limit of {} levels at '{}'",
                options.limits.max_directory_depth,
                path.display()
            ),
            0,
        )
        .with_path(path));
    }

    let mut entries = std::fs::read_dir(path)
        .map_err(|e| {
            RfError::data(format!("Reading directory '{}' failed: {}", path.display(), e))
                .with_path(path)
        })?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect::<Vec<_>>();
    entries.sort();

    let mut dir = TestDataDirectory::new(path);
    let child_options = ParseOptions {
        kind: None,
        ..options.clone()
    };

    for entry in entries {
        if is_excluded(&entry, options) {
            trace!(path = %entry.display(), "skipping excluded path");
            continue;
        }
        if is_init_file(&entry) {
            if dir.init.is_none() {
                let init_options = ParseOptions {
                    kind: Some(FileKind::InitFile),
                    ..child_options.clone()
                };
                dir.init = Some(parse_file_lenient(&entry, &init_options));
            }
            continue;
        }
        if is_ignored_name(&entry) {
            continue;
        }
        if entry.is_dir() {
            let child = parse_directory_at(&entry, &child_options, depth + 1)?;
            if child.init.is_some() || !child.children.is_empty() {
                dir.children.push(Suite::Directory(child));
            }
        } else if Format::from_path(&entry).is_some()
            && kind_from_path(&entry) == FileKind::TestCaseFile
        {
            let file = parse_file_lenient(&entry, &child_options);
            if file.tests.header.is_some() || file.has_errors() {
                dir.children.push(Suite::File(file));
            }
        }
    }

    debug!(
        path = %path.display(),
        children = dir.children.len(),
        has_init = dir.init.is_some(),
        "parsed directory suite"
    );
    Ok(dir)
}

fn is_ignored_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(true, |n| n.starts_with('.') || n.starts_with('_'))
}

fn is_excluded(path: &Path, options: &ParseOptions) -> bool {
    options
        .exclude
        .as_ref()
        .is_some_and(|filter| filter.is_excluded(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PathFilter;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    const TESTS: &str = "*** Test Cases ***\nT\n    Log    x\n";

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("__init__.robot"), "*** Settings ***\nDocumentation    root\n").unwrap();
        fs::write(root.join("b_suite.robot"), TESTS).unwrap();
        fs::write(root.join("a_suite.robot"), TESTS).unwrap();
        fs::write(root.join("common.resource"), "*** Keywords ***\nK\n    No Operation\n").unwrap();
        fs::write(root.join("only_keywords.robot"), "*** Keywords ***\nK\n    No Operation\n").unwrap();
        fs::write(root.join("_private.robot"), TESTS).unwrap();
        fs::write(root.join("notes.md"), "# notes").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("deep.robot"), TESTS).unwrap();
        fs::create_dir(root.join("empty")).unwrap();
        dir
    }

    #[test]
    fn test_is_init_file() {
        assert!(is_init_file(Path::new("/x/__init__.robot")));
        assert!(is_init_file(Path::new("__init__.txt")));
        assert!(!is_init_file(Path::new("__init__.py")));
        assert!(!is_init_file(Path::new("init.robot")));
    }

    #[test]
    fn test_parse_directory() {
        let dir = tree();
        let suite = parse_directory(dir.path(), &ParseOptions::default()).unwrap();

        let init = suite.init.as_ref().unwrap();
        assert_eq!(init.kind, FileKind::InitFile);

        let names: Vec<String> = suite.children.iter().map(Suite::name).collect();
        assert_eq!(names, vec!["A Suite", "B Suite", "Sub"]);
        assert_eq!(suite.files().len(), 4);
    }

    #[derive(Debug)]
    struct SkipPath(PathBuf);

    impl PathFilter for SkipPath {
        fn is_excluded(&self, path: &Path) -> bool {
            path.starts_with(&self.0)
        }
    }

    #[test]
    fn test_excluded_paths_skipped() {
        let dir = tree();
        let options = ParseOptions::builder()
            .exclude(Arc::new(SkipPath(dir.path().join("sub"))))
            .build();
        let suite = parse_directory(dir.path(), &options).unwrap();
        assert_eq!(suite.children.len(), 2);
    }

    #[test]
    fn test_depth_limit() {
        let dir = tree();
        let mut options = ParseOptions::default();
        options.limits.max_directory_depth = 0;
        let err = parse_directory(dir.path(), &options).unwrap_err();
        assert_eq!(err.kind, crate::error::RfErrorKind::Security);
    }

    #[test]
    fn test_parse_suite_file() {
        let dir = tree();
        let suite = parse_suite(&dir.path().join("a_suite.robot"), &ParseOptions::default()).unwrap();
        assert!(matches!(suite, Suite::File(_)));
        assert_eq!(suite.name(), "A Suite");
    }
}

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

//! Paths left out when a directory suite is read.
//!
//! One glob per line (`*`, `?`, `[seq]`, `[!seq]`). A pattern starting with
//! `/` or a drive letter matches whole paths; any other pattern matches the
//! trailing components of a path, so `*.txt` matches every `.txt` file and
//! `build/tmp` every `tmp` inside a `build` directory. A trailing `/` also
//! excludes everything under a matching directory. Blank lines and lines
//! starting with `#` are ignored.

use crate::error::{ConfigError, ConfigResult};
use glob::{MatchOptions, Pattern};
use rfide_core::PathFilter;
use std::fs;
use std::path::{Component, Path};
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    source: String,
    pattern: Pattern,
    directory: bool,
    absolute: bool,
}

impl Entry {
    fn parse(line: &str) -> ConfigResult<Self> {
        let normalized = line.replace('\\', "/");
        let directory = normalized.ends_with('/') && normalized.len() > 1;
        let body = if directory {
            normalized.trim_end_matches('/')
        } else {
            normalized.as_str()
        };
        let absolute = body.starts_with('/') || has_drive(body);
        let pattern = Pattern::new(body).map_err(|e| ConfigError::Pattern {
            pattern: line.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: line.to_string(),
            pattern,
            directory,
            absolute,
        })
    }
}

fn has_drive(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// True where paths differ only by case on the usual file systems.
fn default_case_sensitive() -> bool {
    !cfg!(any(windows, target_os = "macos"))
}

/// Glob patterns of excluded paths.
#[derive(Debug, Clone)]
pub struct ExcludeList {
    entries: Vec<Entry>,
    case_sensitive: bool,
}

impl Default for ExcludeList {
    fn default() -> Self {
        Self::new()
    }
}

impl ExcludeList {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            case_sensitive: default_case_sensitive(),
        }
    }

    /// Override the platform's case sensitivity.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Parse newline separated patterns.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let mut list = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            list.add(line)?;
        }
        Ok(list)
    }

    /// Read the list from `path`; a missing file is an empty list.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_text()).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The patterns, one per line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.source);
            out.push('\n');
        }
        out
    }

    /// Add a pattern. Adding a pattern twice has no effect.
    pub fn add(&mut self, pattern: &str) -> ConfigResult<()> {
        if self.entries.iter().any(|e| e.source == pattern) {
            return Ok(());
        }
        self.entries.push(Entry::parse(pattern)?);
        Ok(())
    }

    pub fn remove(&mut self, pattern: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.source != pattern);
        self.entries.len() != before
    }

    pub fn patterns(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.source.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: self.case_sensitive,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        }
    }

    fn matches(&self, entry: &Entry, path: &Path) -> bool {
        let options = self.options();
        if entry.absolute {
            let full = |p: &Path| p.to_string_lossy().replace('\\', "/");
            if entry.directory {
                path.ancestors()
                    .any(|a| entry.pattern.matches_with(&full(a), options))
            } else {
                entry.pattern.matches_with(&full(path), options)
            }
        } else {
            let parts: Vec<String> = path
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            let ends: Vec<usize> = if entry.directory {
                (1..=parts.len()).collect()
            } else {
                vec![parts.len()]
            };
            ends.into_iter().any(|end| {
                (0..end).any(|start| {
                    entry
                        .pattern
                        .matches_with(&parts[start..end].join("/"), options)
                })
            })
        }
    }
}

impl PathFilter for ExcludeList {
    fn is_excluded(&self, path: &Path) -> bool {
        let hit = self.entries.iter().find(|e| self.matches(e, path));
        if let Some(entry) = hit {
            debug!(path = %path.display(), pattern = %entry.source, "Excluded path");
        }
        hit.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn list(text: &str) -> ExcludeList {
        ExcludeList::parse(text).unwrap().with_case_sensitive(true)
    }

    // ==================== Relative pattern tests ====================

    #[test]
    fn test_relative_file_pattern() {
        let excludes = list("*.txt\n");
        assert!(excludes.is_excluded(Path::new("/project/suite/notes.txt")));
        assert!(!excludes.is_excluded(Path::new("/project/suite/tests.robot")));
    }

    #[test]
    fn test_sequences_and_single_char() {
        let excludes = list("test_[0-9].robot\ndraft?.robot\n[!a]*.tsv\n");
        assert!(excludes.is_excluded(Path::new("/p/test_3.robot")));
        assert!(!excludes.is_excluded(Path::new("/p/test_x.robot")));
        assert!(excludes.is_excluded(Path::new("/p/draft1.robot")));
        assert!(excludes.is_excluded(Path::new("/p/b.tsv")));
        assert!(!excludes.is_excluded(Path::new("/p/a.tsv")));
    }

    #[test]
    fn test_trailing_slash_excludes_subtree() {
        let excludes = list("results/\n");
        assert!(excludes.is_excluded(Path::new("/project/results")));
        assert!(excludes.is_excluded(Path::new("/project/results/output.robot")));
        assert!(!excludes.is_excluded(Path::new("/project/results.robot")));
    }

    #[test]
    fn test_multi_component_relative_pattern() {
        let excludes = list("build/tmp\n");
        assert!(excludes.is_excluded(Path::new("/a/build/tmp")));
        assert!(!excludes.is_excluded(Path::new("/a/build/other/tmp")));
    }

    // ==================== Absolute pattern tests ====================

    #[test]
    fn test_absolute_pattern() {
        let excludes = list("/project/generated/\n/project/*.resource\n");
        assert!(excludes.is_excluded(Path::new("/project/generated/a/b.robot")));
        assert!(excludes.is_excluded(Path::new("/project/common.resource")));
        assert!(!excludes.is_excluded(Path::new("/other/project/common.resource")));
    }

    #[test]
    fn test_case_insensitive_matching() {
        let excludes = ExcludeList::parse("*.TXT").unwrap().with_case_sensitive(false);
        assert!(excludes.is_excluded(Path::new("/p/readme.txt")));
        let strict = list("*.TXT");
        assert!(!strict.is_excluded(Path::new("/p/readme.txt")));
    }

    // ==================== Persistence tests ====================

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let excludes = list("# generated files\n\n*.log\n");
        assert_eq!(excludes.patterns(), vec!["*.log"]);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = ExcludeList::parse("[unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { .. }));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("excludes");
        let mut excludes = ExcludeList::new();
        excludes.add("*.txt").unwrap();
        excludes.add("tmp/").unwrap();
        excludes.add("*.txt").unwrap();
        excludes.save(&path).unwrap();
        let loaded = ExcludeList::load(&path).unwrap();
        assert_eq!(loaded.patterns(), vec!["*.txt", "tmp/"]);
        assert!(ExcludeList::load(dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_remove_pattern() {
        let mut excludes = list("*.txt\n*.log\n");
        assert!(excludes.remove("*.txt"));
        assert!(!excludes.remove("*.txt"));
        assert_eq!(excludes.len(), 1);
    }
}

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

//! Variable files.
//!
//! YAML and JSON files must contain a mapping at the top level; every key
//! becomes a `${key}` variable. Python modules are read without running
//! them: module-level `NAME = literal` assignments are evaluated as Python
//! literals, `LIST__name` and `DICT__name` define `@{name}` and `&{name}`,
//! and names starting with an underscore are private. Modules with a
//! `get_variables` function need a Python runtime and are rejected.

use crate::expr::evaluate;
use crate::value::Value;
use rfide_core::{RfError, RfResult};
use std::path::Path;
use tracing::{debug, warn};

/// Variables defined by one variable file, as `(token, value)` pairs in
/// definition order.
pub type VariableFileData = Vec<(String, Value)>;

/// File extensions read as variable files.
pub const VARIABLE_FILE_EXTENSIONS: &[&str] = &["py", "yaml", "yml", "json"];

pub fn is_variable_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VARIABLE_FILE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read a variable file from disk.
pub fn load_variable_file(path: &Path) -> RfResult<VariableFileData> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        RfError::import(format!("Reading variable file '{}' failed: {}", path.display(), e))
            .with_path(path)
    })?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let result = match ext.as_str() {
        "yaml" | "yml" => parse_yaml(&text),
        "json" => parse_json(&text),
        "py" => parse_python(&text),
        _ => Err(RfError::import(format!(
            "Unsupported variable file type '{}'",
            path.display()
        ))),
    };
    let variables = result.map_err(|e| e.with_path(path))?;
    debug!(path = %path.display(), count = variables.len(), "loaded variable file");
    Ok(variables)
}

fn from_mapping(value: Value, kind: &str) -> RfResult<VariableFileData> {
    let Value::Dict(pairs) = value else {
        return Err(RfError::import(format!(
            "{} variable file must be a mapping, got {}",
            kind,
            value.type_name()
        )));
    };
    pairs
        .into_iter()
        .map(|(key, value)| match key {
            Value::String(name) => Ok((format!("${{{}}}", name), value)),
            other => Err(RfError::import(format!(
                "{} variable file keys must be strings, got {}",
                kind,
                other.repr()
            ))),
        })
        .collect()
}

pub fn parse_yaml(text: &str) -> RfResult<VariableFileData> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text)
        .map_err(|e| RfError::import(format!("Invalid YAML variable file: {}", e)))?;
    if yaml.is_null() {
        return Ok(Vec::new());
    }
    from_mapping(Value::from_yaml(&yaml), "YAML")
}

pub fn parse_json(text: &str) -> RfResult<VariableFileData> {
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| RfError::import(format!("Invalid JSON variable file: {}", e)))?;
    from_mapping(Value::from_json(&json), "JSON")
}

/// Module-level assignments of a Python variable file.
pub fn parse_python(text: &str) -> RfResult<VariableFileData> {
    let mut variables: VariableFileData = Vec::new();
    let mut defined: Vec<(String, Value)> = Vec::new();

    for statement in statements(text) {
        let first = statement.text.trim_start();
        if first.starts_with("def get_variables") || first.starts_with("def getVariables") {
            return Err(RfError::import(
                "Dynamic variable files (get_variables) need a Python runtime and are not supported",
            )
            .with_context(format!("line {}", statement.line)));
        }
        let Some((name, source)) = assignment(&statement.text) else {
            continue;
        };
        let lookup = |n: &str| {
            defined
                .iter()
                .rev()
                .find(|(d, _)| d == n)
                .map(|(_, v)| v.clone())
        };
        let value = match evaluate(source, &lookup) {
            Ok(value) => value,
            Err(e) => {
                warn!(name, line = statement.line, error = %e, "skipping variable file assignment");
                continue;
            }
        };
        defined.push((name.to_string(), value.clone()));
        if name.starts_with('_') {
            continue;
        }
        let token = python_token(name, value.clone()).map_err(|message| {
            RfError::new(rfide_core::RfErrorKind::Import, message, statement.line)
        })?;
        variables.retain(|(existing, _)| existing != &token);
        variables.push((token, value));
    }
    Ok(variables)
}

fn python_token(name: &str, value: Value) -> Result<String, String> {
    if let Some(base) = name.strip_prefix("LIST__") {
        if !value.is_list() {
            return Err(format!(
                "Invalid variable '{}': Expected a list-like value, got {}",
                name,
                value.type_name()
            ));
        }
        return Ok(format!("@{{{}}}", base));
    }
    if let Some(base) = name.strip_prefix("DICT__") {
        if !value.is_dict() {
            return Err(format!(
                "Invalid variable '{}': Expected a dictionary-like value, got {}",
                name,
                value.type_name()
            ));
        }
        return Ok(format!("&{{{}}}", base));
    }
    Ok(format!("${{{}}}", name))
}

/// `NAME = source` at column zero.
fn assignment(statement: &str) -> Option<(&str, &str)> {
    if statement.starts_with(char::is_whitespace) {
        return None;
    }
    let (target, source) = statement.split_once('=')?;
    if source.starts_with('=') || target.ends_with(|c| matches!(c, '!' | '<' | '>')) {
        return None;
    }
    let target = target.trim();
    let valid = target.starts_with(|c: char| c.is_alphabetic() || c == '_')
        && target.chars().all(|c| c.is_alphanumeric() || c == '_');
    valid.then_some((target, source.trim()))
}

struct Statement {
    line: usize,
    text: String,
}

/// Logical lines: physical lines joined while brackets or triple-quoted
/// strings are open.
fn statements(text: &str) -> Vec<Statement> {
    let mut out = Vec::new();
    let mut current: Option<Statement> = None;
    let mut state = ScanState::default();

    for (i, line) in text.lines().enumerate() {
        match current.as_mut() {
            Some(statement) => {
                statement.text.push('\n');
                statement.text.push_str(line);
            }
            None => {
                if line.trim().is_empty() || line.trim_start().starts_with('#') {
                    continue;
                }
                current = Some(Statement {
                    line: i + 1,
                    text: line.to_string(),
                });
            }
        }
        state.scan(line);
        if !state.is_open() && !line.trim_end().ends_with('\\') {
            out.extend(current.take());
        }
    }
    out.extend(current);
    out
}

#[derive(Default)]
struct ScanState {
    depth: i32,
    triple: Option<char>,
}

impl ScanState {
    fn is_open(&self) -> bool {
        self.depth > 0 || self.triple.is_some()
    }

    fn scan(&mut self, line: &str) {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if let Some(q) = self.triple {
                if c == '\\' {
                    i += 2;
                    continue;
                }
                if c == q && chars.get(i + 1) == Some(&q) && chars.get(i + 2) == Some(&q) {
                    self.triple = None;
                    i += 3;
                    continue;
                }
                i += 1;
                continue;
            }
            match c {
                '#' => return,
                '\'' | '"' => {
                    if chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c) {
                        self.triple = Some(c);
                        i += 3;
                        continue;
                    }
                    i += 1;
                    while i < chars.len() && chars[i] != c {
                        if chars[i] == '\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                }
                '(' | '[' | '{' => self.depth += 1,
                ')' | ']' | '}' => self.depth -= 1,
                _ => {}
            }
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(vars: &VariableFileData) -> Vec<&str> {
        vars.iter().map(|(n, _)| n.as_str()).collect()
    }

    // ==================== Python tests ====================

    #[test]
    fn test_python_module_variables() {
        let source = r#"
import os
# comment
NAME = 'robot'
PORT = 8080
USERS = [
    'alice',  # first
    'bob',
]
LIST__ITEMS = ('a', 'b')
DICT__OPTS = {'debug': True}
_PRIVATE = 1
URL = 'http://' + NAME
TEXT = """multi
line"""

def helper():
    X = 1
"#;
        let vars = parse_python(source).unwrap();
        assert_eq!(
            names(&vars),
            vec!["${NAME}", "${PORT}", "${USERS}", "@{ITEMS}", "&{OPTS}", "${URL}", "${TEXT}"]
        );
        assert_eq!(vars[2].1, Value::list([Value::from("alice"), Value::from("bob")]));
        assert_eq!(vars[5].1, Value::from("http://robot"));
        assert_eq!(vars[6].1, Value::from("multi\nline"));
    }

    #[test]
    fn test_python_skips_non_literals() {
        let vars = parse_python("PATH = os.path.join('a', 'b')\nOK = 1\n").unwrap();
        assert_eq!(names(&vars), vec!["${OK}"]);
    }

    #[test]
    fn test_python_comparisons_are_not_assignments() {
        assert!(assignment("X == 1").is_none());
        assert!(assignment("    X = 1").is_none());
        assert_eq!(assignment("X=1"), Some(("X", "1")));
    }

    #[test]
    fn test_python_dynamic_rejected() {
        let err = parse_python("def get_variables(env):\n    return {}\n").unwrap_err();
        assert_eq!(err.kind, rfide_core::RfErrorKind::Import);
    }

    #[test]
    fn test_python_list_prefix_checked() {
        let err = parse_python("LIST__X = 'not a list'\n").unwrap_err();
        assert!(err.message.contains("list-like"));
    }

    // ==================== YAML and JSON tests ====================

    #[test]
    fn test_yaml_mapping() {
        let vars = parse_yaml("host: localhost\nports:\n  - 80\n  - 443\n").unwrap();
        assert_eq!(names(&vars), vec!["${host}", "${ports}"]);
        assert_eq!(vars[1].1, Value::list([Value::Int(80), Value::Int(443)]));
    }

    #[test]
    fn test_yaml_must_be_mapping() {
        let err = parse_yaml("- a\n- b\n").unwrap_err();
        assert!(err.message.contains("must be a mapping"));
    }

    #[test]
    fn test_json() {
        let vars = parse_json(r#"{"a": {"b": 1}}"#).unwrap();
        assert_eq!(vars[0].0, "${a}");
        assert!(parse_json("[1]").is_err());
        assert!(parse_json("{").is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vars.yaml");
        std::fs::write(&path, "x: 1\n").unwrap();
        let vars = load_variable_file(&path).unwrap();
        assert_eq!(vars, vec![("${x}".to_string(), Value::Int(1))]);

        let err = load_variable_file(&dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.path.as_deref(), Some(dir.path().join("missing.json").as_path()));
        assert!(is_variable_file(&path));
        assert!(!is_variable_file(Path::new("x.robot")));
    }
}

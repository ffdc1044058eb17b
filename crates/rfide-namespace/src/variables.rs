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

//! Variable storage and resolution.
//!
//! A [`VariableStore`] holds the variables visible at one point of a file.
//! Callers insert variables in priority order (keyword arguments, loop
//! variables and assignments, the file's own table, imported resources,
//! variable files, built-ins); the first definition of a name wins, so
//! lookups follow that order.
//!
//! Values defined in test data are kept as raw cells and resolved on
//! demand, innermost variable first:
//!
//! ```
//! use rfide_namespace::{Value, VariableSource, VariableStore};
//!
//! let mut store = VariableStore::new();
//! store.insert_cells("${HOST}", ["localhost"], VariableSource::File);
//! store.insert_cells("${URL}", ["http://${HOST}:${PORT}/"], VariableSource::File);
//! store.insert_value("${PORT}", Value::Int(8080), VariableSource::File);
//! assert_eq!(store.replace_string("${URL}").unwrap(), "http://localhost:8080/");
//! ```

use crate::expr::{self, ExprError};
use crate::search::{find_variables, search_variable, VariableMatch};
use crate::value::Value;
use rfide_core::names::normalize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where a variable was defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableSource {
    /// A user keyword argument.
    Argument,
    /// A `FOR` loop variable.
    LoopVariable,
    /// Assigned from a keyword return value.
    Assignment,
    /// The current file's variable table.
    File,
    /// A resource file's variable table.
    Resource(PathBuf),
    /// A variable file.
    VariableFile(PathBuf),
    BuiltIn,
}

impl VariableSource {
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Argument | Self::LoopVariable | Self::Assignment)
    }

    pub fn label(&self) -> String {
        match self {
            Self::Argument => "argument".to_string(),
            Self::LoopVariable => "loop variable".to_string(),
            Self::Assignment => "assignment".to_string(),
            Self::File => "variable table".to_string(),
            Self::Resource(path) => format!("resource {}", path.display()),
            Self::VariableFile(path) => format!("variable file {}", path.display()),
            Self::BuiltIn => "built-in".to_string(),
        }
    }
}

/// The value of a stored variable.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    Value(Value),
    /// Unresolved cells from a variable table.
    Cells(Vec<String>),
    /// Known to exist, value only available at run time.
    Unknown,
}

/// A variable with its definition site.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    /// Token as defined, e.g. `@{USERS}`.
    pub name: String,
    pub value: VariableValue,
    pub source: VariableSource,
}

impl VariableInfo {
    pub fn sigil(&self) -> char {
        self.name.chars().next().unwrap_or('$')
    }
}

/// Errors raised while resolving variables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VariableError {
    #[error("Variable '{0}' not found")]
    NotFound(String),
    #[error("Environment variable '{0}' not found")]
    EnvironmentNotFound(String),
    #[error("Recursive variable definition: '{0}'")]
    Recursive(String),
    #[error("Value of variable '{0}' is only known at run time")]
    RuntimeValue(String),
    #[error("Value of variable '{0}' is not list or list-like")]
    NotList(String),
    #[error("Value of variable '{0}' is not dictionary or dictionary-like")]
    NotDict(String),
    #[error("Invalid dictionary variable item '{0}'")]
    InvalidDictItem(String),
    #[error("Resolving variable '{name}' failed: {source}")]
    Expression { name: String, source: ExprError },
}

impl VariableError {
    /// True if the variable does not exist at all, as opposed to existing
    /// with a value that could not be computed.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::EnvironmentNotFound(_))
    }
}

pub type VariableResult<T> = Result<T, VariableError>;

/// Variables visible at one point, first definition wins.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    vars: Vec<VariableInfo>,
    index: HashMap<String, usize>,
}

/// Names that exist only while tests run.
const RUNTIME_BUILTINS: &[&str] = &[
    "TEST_NAME",
    "TEST_DOCUMENTATION",
    "TEST_STATUS",
    "TEST_MESSAGE",
    "PREV_TEST_NAME",
    "PREV_TEST_STATUS",
    "PREV_TEST_MESSAGE",
    "SUITE_NAME",
    "SUITE_SOURCE",
    "SUITE_DOCUMENTATION",
    "SUITE_STATUS",
    "SUITE_MESSAGE",
    "KEYWORD_STATUS",
    "KEYWORD_MESSAGE",
    "OUTPUT_DIR",
    "OUTPUT_FILE",
    "REPORT_FILE",
    "LOG_FILE",
    "DEBUG_FILE",
];

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable unless the name is already defined. Returns false if
    /// an earlier definition shadows it.
    pub fn insert(&mut self, info: VariableInfo) -> bool {
        let key = normalize_name(&info.name);
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.vars.len());
        self.vars.push(info);
        true
    }

    pub fn insert_value(&mut self, name: impl Into<String>, value: Value, source: VariableSource) -> bool {
        self.insert(VariableInfo {
            name: name.into(),
            value: VariableValue::Value(value),
            source,
        })
    }

    pub fn insert_cells<I, S>(&mut self, name: impl Into<String>, cells: I, source: VariableSource) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(VariableInfo {
            name: name.into(),
            value: VariableValue::Cells(cells.into_iter().map(Into::into).collect()),
            source,
        })
    }

    pub fn insert_unknown(&mut self, name: impl Into<String>, source: VariableSource) -> bool {
        self.insert(VariableInfo {
            name: name.into(),
            value: VariableValue::Unknown,
            source,
        })
    }

    /// Add the built-in variables. `curdir` is the directory of the file
    /// being resolved.
    pub fn add_builtins(&mut self, curdir: Option<&Path>) {
        let builtin = VariableSource::BuiltIn;
        let path_sep = if cfg!(windows) { ";" } else { ":" };
        let fixed: [(&str, Value); 12] = [
            ("${SPACE}", Value::from(" ")),
            ("${EMPTY}", Value::from("")),
            ("${True}", Value::Bool(true)),
            ("${False}", Value::Bool(false)),
            ("${None}", Value::None),
            ("${null}", Value::None),
            ("${/}", Value::from(std::path::MAIN_SEPARATOR.to_string())),
            ("${:}", Value::from(path_sep)),
            ("${\\n}", Value::from("\n")),
            ("${TEMPDIR}", Value::from(std::env::temp_dir().display().to_string())),
            ("${LOG_LEVEL}", Value::from("INFO")),
            ("&{OPTIONS}", Value::Dict(Vec::new())),
        ];
        for (name, value) in fixed {
            self.insert_value(name, value, builtin.clone());
        }
        if let Ok(dir) = std::env::current_dir() {
            self.insert_value("${EXECDIR}", Value::from(dir.display().to_string()), builtin.clone());
        }
        if let Some(dir) = curdir {
            self.insert_value("${CURDIR}", Value::from(dir.display().to_string()), builtin.clone());
        }
        for name in RUNTIME_BUILTINS {
            self.insert_unknown(format!("${{{}}}", name), builtin.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&VariableInfo> {
        self.index.get(&normalize_name(name)).map(|&i| &self.vars[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&normalize_name(name))
    }

    /// Variables in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &VariableInfo> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Resolve a variable token such as `${x}`, `@{list}[0]` or `%{HOME}`.
    pub fn value(&self, token: &str) -> VariableResult<Value> {
        match search_variable(token) {
            Some(m) if m.start == 0 && m.end == token.len() => self.resolve_match(&m, &mut Vec::new()),
            _ => Err(VariableError::NotFound(token.to_string())),
        }
    }

    /// Replace variables in a cell. A cell that is exactly one variable keeps
    /// the variable's type; other cells become strings.
    pub fn replace_scalar(&self, cell: &str) -> VariableResult<Value> {
        self.replace_scalar_with(cell, &mut Vec::new())
    }

    /// Replace variables in text; values are inserted as Python `str()`.
    pub fn replace_string(&self, text: &str) -> VariableResult<String> {
        self.replace_string_with(text, &mut Vec::new())
    }

    /// Replace variables in argument cells; cells that are exactly `@{list}`
    /// expand to their items.
    pub fn replace_list(&self, cells: &[String]) -> VariableResult<Vec<Value>> {
        self.replace_list_with(cells, &mut Vec::new())
    }

    /// Replace what can be replaced. Tokens that fail stay verbatim and their
    /// errors are returned alongside the text.
    pub fn resolve_lenient(&self, text: &str) -> (String, Vec<VariableError>) {
        let mut out = String::with_capacity(text.len());
        let mut errors = Vec::new();
        let mut last = 0;
        for m in find_variables(text) {
            out.push_str(&text[last..m.start]);
            match self.resolve_match(&m, &mut Vec::new()) {
                Ok(value) => out.push_str(&value.to_string()),
                Err(e) => {
                    out.push_str(&text[m.start..m.end]);
                    errors.push(e);
                }
            }
            last = m.end;
        }
        out.push_str(&text[last..]);
        (out, errors)
    }

    /// Names referenced in `text` that are not defined anywhere.
    ///
    /// Variables whose value is only known at run time count as defined;
    /// tokens with nested variables are not checked.
    pub fn undefined_in(&self, text: &str) -> Vec<String> {
        let mut missing = Vec::new();
        for m in find_variables(text) {
            if m.is_nested() {
                missing.extend(self.undefined_in(m.body));
                continue;
            }
            if m.is_inline_eval() || m.sigil == '%' {
                continue;
            }
            if !self.is_defined(m.body) {
                missing.push(m.base_token());
            }
            for item in &m.items {
                missing.extend(self.undefined_in(item));
            }
        }
        missing
    }

    fn is_defined(&self, body: &str) -> bool {
        self.contains_body(body)
            || parse_number(body).is_some()
            || extended_split(body).any(|(base, _)| self.contains_body(base))
    }

    fn contains_body(&self, body: &str) -> bool {
        self.index.contains_key(&normalize(body))
    }

    // ==================== Resolution ====================

    fn replace_scalar_with(&self, cell: &str, stack: &mut Vec<String>) -> VariableResult<Value> {
        match search_variable(cell) {
            Some(m) if m.start == 0 && m.end == cell.len() => self.resolve_match(&m, stack),
            Some(_) => self.replace_string_with(cell, stack).map(Value::String),
            None => Ok(Value::from(cell)),
        }
    }

    fn replace_string_with(&self, text: &str, stack: &mut Vec<String>) -> VariableResult<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for m in find_variables(text) {
            out.push_str(&text[last..m.start]);
            out.push_str(&self.resolve_match(&m, stack)?.to_string());
            last = m.end;
        }
        out.push_str(&text[last..]);
        Ok(out)
    }

    fn replace_list_with(&self, cells: &[String], stack: &mut Vec<String>) -> VariableResult<Vec<Value>> {
        let mut out = Vec::with_capacity(cells.len());
        for cell in cells {
            match search_variable(cell) {
                Some(m) if m.sigil == '@' && m.start == 0 && m.end == cell.len() => {
                    let value = self.resolve_match(&m, stack)?;
                    match value {
                        Value::List(items) => out.extend(items),
                        _ => return Err(VariableError::NotList(cell.clone())),
                    }
                }
                _ => out.push(self.replace_scalar_with(cell, stack)?),
            }
        }
        Ok(out)
    }

    fn resolve_match(&self, m: &VariableMatch<'_>, stack: &mut Vec<String>) -> VariableResult<Value> {
        let body = if m.is_nested() && !m.is_inline_eval() {
            self.replace_string_with(m.body, stack)?
        } else {
            m.body.to_string()
        };
        let token = format!("{}{{{}}}", m.sigil, body);

        let mut value = if m.sigil == '%' {
            environment(&body)?
        } else if m.is_inline_eval() {
            self.evaluate_inline(&body[1..body.len() - 1], &token, stack)?
        } else {
            self.lookup(&body, &token, stack)?
        };

        for item in &m.items {
            let item = self.replace_string_with(item, stack)?;
            value = item_access(value, &item).map_err(|source| VariableError::Expression {
                name: format!("{}[{}]", token, item),
                source,
            })?;
        }

        if m.items.is_empty() {
            value = apply_sigil(m.sigil, value, &token)?;
        }
        Ok(value)
    }

    fn lookup(&self, body: &str, token: &str, stack: &mut Vec<String>) -> VariableResult<Value> {
        if let Some(&i) = self.index.get(&normalize(body)) {
            return self.stored_value(&self.vars[i], stack);
        }
        if let Some(number) = parse_number(body) {
            return Ok(number);
        }
        for (base, suffix) in extended_split(body) {
            let Some(&i) = self.index.get(&normalize(base)) else {
                continue;
            };
            let base_value = self.stored_value(&self.vars[i], stack)?;
            let source = format!("__base{}", suffix);
            let lookup = |name: &str| {
                if name == "__base" {
                    Some(base_value.clone())
                } else {
                    None
                }
            };
            return expr::evaluate(&source, &lookup).map_err(|source| VariableError::Expression {
                name: token.to_string(),
                source,
            });
        }
        Err(VariableError::NotFound(token.to_string()))
    }

    fn evaluate_inline(&self, source: &str, token: &str, stack: &mut Vec<String>) -> VariableResult<Value> {
        // `$name` references are resolved up front so the evaluator's lookup
        // can stay a plain function.
        let parsed = expr::parse_expression(source).map_err(|source| VariableError::Expression {
            name: token.to_string(),
            source,
        })?;
        let mut names = Vec::new();
        collect_variables(&parsed, &mut names);
        let mut bound = HashMap::new();
        for name in names {
            let info = self
                .index
                .get(&normalize(&name))
                .map(|&i| &self.vars[i])
                .ok_or_else(|| VariableError::NotFound(format!("${{{}}}", name)))?;
            bound.insert(name, self.stored_value(info, stack)?);
        }
        let lookup = |name: &str| bound.get(name).cloned();
        expr::eval(&parsed, &lookup).map_err(|source| VariableError::Expression {
            name: token.to_string(),
            source,
        })
    }

    fn stored_value(&self, info: &VariableInfo, stack: &mut Vec<String>) -> VariableResult<Value> {
        let cells = match &info.value {
            VariableValue::Value(value) => return Ok(value.clone()),
            VariableValue::Unknown => return Err(VariableError::RuntimeValue(info.name.clone())),
            VariableValue::Cells(cells) => cells,
        };
        let key = normalize_name(&info.name);
        if stack.contains(&key) {
            return Err(VariableError::Recursive(info.name.clone()));
        }
        stack.push(key);
        let result = self.cells_value(info, cells, stack);
        stack.pop();
        result
    }

    fn cells_value(&self, info: &VariableInfo, cells: &[String], stack: &mut Vec<String>) -> VariableResult<Value> {
        match info.sigil() {
            '@' => self.replace_list_with(cells, stack).map(Value::List),
            '&' => {
                let mut pairs: Vec<(Value, Value)> = Vec::new();
                for cell in cells {
                    match search_variable(cell) {
                        Some(m) if m.sigil == '&' && m.start == 0 && m.end == cell.len() => {
                            match self.resolve_match(&m, stack)? {
                                Value::Dict(items) => {
                                    for (k, v) in items {
                                        insert_pair(&mut pairs, k, v);
                                    }
                                }
                                _ => return Err(VariableError::NotDict(cell.clone())),
                            }
                        }
                        _ => {
                            let (key, value) = split_dict_item(cell)
                                .ok_or_else(|| VariableError::InvalidDictItem(cell.clone()))?;
                            let key = self.replace_scalar_with(key, stack)?;
                            let value = self.replace_scalar_with(value, stack)?;
                            insert_pair(&mut pairs, key, value);
                        }
                    }
                }
                Ok(Value::Dict(pairs))
            }
            _ => match cells {
                [] => Ok(Value::from("")),
                [single] => self.replace_scalar_with(single, stack),
                [first, rest @ ..] => {
                    let (separator, parts) = match first.strip_prefix("SEPARATOR=") {
                        Some(sep) => (sep.to_string(), rest),
                        None => (" ".to_string(), cells),
                    };
                    let parts = parts
                        .iter()
                        .map(|c| self.replace_string_with(c, stack))
                        .collect::<VariableResult<Vec<_>>>()?;
                    Ok(Value::String(parts.join(separator.as_str())))
                }
            },
        }
    }
}

/// Normalized storage key; the sigil is ignored.
fn normalize_name(name: &str) -> String {
    rfide_core::names::normalize_variable(name)
}

fn insert_pair(pairs: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    match pairs.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => pairs.push((key, value)),
    }
}

/// Split `key=value` at the first unescaped `=`.
fn split_dict_item(cell: &str) -> Option<(&str, &str)> {
    let bytes = cell.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'=' => return Some((&cell[..i], &cell[i + 1..])),
            _ => i += 1,
        }
    }
    None
}

fn environment(body: &str) -> VariableResult<Value> {
    let (name, default) = match body.split_once('=') {
        Some((name, default)) => (name, Some(default)),
        None => (body, None),
    };
    match std::env::var(name) {
        Ok(value) => Ok(Value::String(value)),
        Err(_) => default
            .map(Value::from)
            .ok_or_else(|| VariableError::EnvironmentNotFound(format!("%{{{}}}", name))),
    }
}

/// Number variables: `${1}`, `${-2}`, `${1.5}`, `${0x1F}`, `${0b101}`, `${0o17}`.
pub fn parse_number(body: &str) -> Option<Value> {
    let text = body.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let lower = digits.to_ascii_lowercase();
    let radix = match lower.get(..2) {
        Some("0x") => 16,
        Some("0b") => 2,
        Some("0o") => 8,
        _ => 10,
    };
    if radix != 10 {
        // `from_str_radix` takes a sign of its own; only one is allowed.
        let rest = &lower[2..];
        if !rest.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return None;
        }
        let n = i64::from_str_radix(rest, radix).ok()?;
        let n = if negative { n.checked_neg()? } else { n };
        return Some(Value::Int(n));
    }
    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::Int(n));
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}

/// Candidate `(base, suffix)` splits for extended variable syntax: the base
/// ends before a character that is neither a word character nor a space.
fn extended_split(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.char_indices()
        .skip(1)
        .filter(|(_, c)| !c.is_alphanumeric() && *c != '_' && !c.is_whitespace())
        .map(move |(i, _)| (body[..i].trim(), &body[i..]))
        .filter(|(base, _)| !base.is_empty())
}

fn collect_variables(expr: &expr::Expr, names: &mut Vec<String>) {
    use expr::Expr;
    match expr {
        Expr::Variable(name) => {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        Expr::Literal(_) | Expr::Name(_) => {}
        Expr::List(items) => items.iter().for_each(|e| collect_variables(e, names)),
        Expr::Dict(pairs) => pairs.iter().for_each(|(k, v)| {
            collect_variables(k, names);
            collect_variables(v, names);
        }),
        Expr::Unary(_, e) | Expr::Attribute(e, _) => collect_variables(e, names),
        Expr::Binary(_, a, b) | Expr::And(a, b) | Expr::Or(a, b) | Expr::Subscript(a, b) => {
            collect_variables(a, names);
            collect_variables(b, names);
        }
        Expr::Compare(first, chain) => {
            collect_variables(first, names);
            chain.iter().for_each(|(_, e)| collect_variables(e, names));
        }
        Expr::Conditional {
            test,
            then,
            otherwise,
        } => {
            collect_variables(test, names);
            collect_variables(then, names);
            collect_variables(otherwise, names);
        }
        Expr::Slice {
            target,
            start,
            stop,
            step,
        } => {
            collect_variables(target, names);
            for e in [start, stop, step].into_iter().flatten() {
                collect_variables(e, names);
            }
        }
        Expr::Call(callee, args) => {
            collect_variables(callee, names);
            args.iter().for_each(|e| collect_variables(e, names));
        }
    }
}

/// `value[item]` where `item` is the accessor text after variable
/// replacement: an index, a slice or a dictionary key.
fn item_access(value: Value, item: &str) -> Result<Value, ExprError> {
    match &value {
        Value::List(_) | Value::String(_) => {
            if item.contains(':') {
                let mut parts = item.splitn(3, ':').map(|p| {
                    let p = p.trim();
                    if p.is_empty() {
                        Ok(None)
                    } else {
                        p.parse::<i64>()
                            .map(Some)
                            .map_err(|_| ExprError::Type(format!("slice index '{}' is not an integer", p)))
                    }
                });
                let start = parts.next().unwrap_or(Ok(None))?;
                let stop = parts.next().unwrap_or(Ok(None))?;
                let step = parts.next().unwrap_or(Ok(None))?;
                return expr::slice(&value, start, stop, step);
            }
            let index = item
                .trim()
                .parse::<i64>()
                .map_err(|_| ExprError::Type(format!("index '{}' is not an integer", item)))?;
            expr::subscript(&value, &Value::Int(index))
        }
        Value::Dict(_) => {
            let key = Value::from(item);
            if value.get(&key).is_some() {
                return expr::subscript(&value, &key);
            }
            match parse_number(item) {
                Some(number) => expr::subscript(&value, &number),
                None => expr::subscript(&value, &key),
            }
        }
        other => Err(ExprError::Type(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// `@{x}` requires a list, `&{x}` a dictionary. Dictionaries used as lists
/// yield their keys.
fn apply_sigil(sigil: char, value: Value, token: &str) -> VariableResult<Value> {
    match sigil {
        '@' => match value {
            Value::List(_) => Ok(value),
            Value::Dict(pairs) => Ok(Value::List(pairs.into_iter().map(|(k, _)| k).collect())),
            Value::String(s) if s.is_empty() => Ok(Value::List(Vec::new())),
            _ => Err(VariableError::NotList(token.to_string())),
        },
        '&' => match value {
            Value::Dict(_) => Ok(value),
            Value::String(s) if s.is_empty() => Ok(Value::Dict(Vec::new())),
            _ => Err(VariableError::NotDict(token.to_string())),
        },
        _ => Ok(value),
    }
}

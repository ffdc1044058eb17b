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

//! Values of variables.

use std::fmt;

/// A variable value.
///
/// Values mirror the Python objects Robot Framework variables hold, so their
/// string forms follow Python's `str` and `repr`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    /// Insertion-ordered mapping.
    Dict(Vec<(Value, Value)>),
}

impl Default for Value {
    fn default() -> Self {
        Self::String(String::new())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl Value {
    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Self::List(items.into_iter().collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn is_dict(&self) -> bool {
        matches!(self, Self::Dict(_))
    }

    /// Python truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(n) => *n != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Dict(items) => !items.is_empty(),
        }
    }

    /// Python type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "str",
            Self::List(_) => "list",
            Self::Dict(_) => "dict",
        }
    }

    /// Look up a dict item.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Self::Dict(items) => items.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up a dict item by string key.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Dict(items) => items
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Python `repr()`.
    pub fn repr(&self) -> String {
        match self {
            Self::String(s) => repr_str(s),
            Self::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Self::Dict(items) => {
                let inner: Vec<String> = items
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            other => other.to_string(),
        }
    }

    /// Convert JSON into a value.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(map) => Self::Dict(
                map.iter()
                    .map(|(k, v)| (Self::String(k.clone()), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert YAML into a value.
    pub fn from_yaml(yaml: &serde_yaml::Value) -> Self {
        match yaml {
            serde_yaml::Value::Null => Self::None,
            serde_yaml::Value::Bool(b) => Self::Bool(*b),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_yaml::Value::String(s) => Self::String(s.clone()),
            serde_yaml::Value::Sequence(items) => {
                Self::List(items.iter().map(Self::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(map) => Self::Dict(
                map.iter()
                    .map(|(k, v)| (Self::from_yaml(k), Self::from_yaml(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
        }
    }
}

/// Python `str()`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
                    write!(f, "{:.1}", n)
                } else if n.is_nan() {
                    write!(f, "nan")
                } else if n.is_infinite() {
                    write!(f, "{}inf", if *n < 0.0 { "-" } else { "" })
                } else {
                    write!(f, "{}", n)
                }
            }
            Self::String(s) => write!(f, "{}", s),
            Self::List(_) | Self::Dict(_) => write!(f, "{}", self.repr()),
        }
    }
}

fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_and_repr() {
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::from("a").repr(), "'a'");
        assert_eq!(Value::from("it's").repr(), "\"it's\"");
        let list = Value::list([Value::from("a"), Value::Int(1)]);
        assert_eq!(list.to_string(), "['a', 1]");
        let dict = Value::Dict(vec![(Value::from("k"), Value::None)]);
        assert_eq!(dict.to_string(), "{'k': None}");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::from("").is_truthy());
        assert!(Value::list([Value::None]).is_truthy());
        assert!(!Value::Int(0).is_truthy());
    }

    #[test]
    fn test_from_json() {
        let json: serde_json::Value = serde_json::from_str(r#"{"a": [1, 2.5, null], "b": true}"#).unwrap();
        let value = Value::from_json(&json);
        assert_eq!(
            value.get_str("a"),
            Some(&Value::list([Value::Int(1), Value::Float(2.5), Value::None]))
        );
        assert_eq!(value.get_str("b"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_from_yaml() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("name: x\nitems:\n  - 1\n  - two\n").unwrap();
        let value = Value::from_yaml(&yaml);
        assert_eq!(value.get_str("name"), Some(&Value::from("x")));
        assert_eq!(
            value.get_str("items"),
            Some(&Value::list([Value::Int(1), Value::from("two")]))
        );
    }
}

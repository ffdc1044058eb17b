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

//! The variable table.

use super::file::TableHeader;
use super::{split_comment, with_comment};
use crate::names::{eq_normalized, is_variable, normalize_variable, strip_assign_mark, variable_body};

/// A `${scalar}`, `@{list}` or `&{dict}` definition, or a comment row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    /// Variable token without the optional trailing `=`; empty for comment rows.
    pub name: String,
    pub value: Vec<String>,
    pub comment: Vec<String>,
}

impl Variable {
    pub fn new<I, S>(name: impl Into<String>, value: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            value: value.into_iter().map(Into::into).collect(),
            comment: Vec::new(),
        }
    }

    /// A comment-only row.
    pub fn comment_row(cells: Vec<String>) -> Self {
        Self {
            comment: cells,
            ..Self::default()
        }
    }

    pub fn from_cells(cells: &[String]) -> Self {
        let (data, comment) = split_comment(cells);
        let mut data = data.into_iter();
        match data.next() {
            Some(name) => Self {
                name: strip_assign_mark(&name).to_string(),
                value: data.collect(),
                comment,
            },
            None => Self::comment_row(comment),
        }
    }

    pub fn to_cells(&self) -> Vec<String> {
        if self.is_comment() {
            return self.comment.clone();
        }
        let mut cells = vec![self.name.clone()];
        cells.extend(self.value.iter().cloned());
        with_comment(cells, &self.comment)
    }

    pub fn is_comment(&self) -> bool {
        self.name.is_empty()
    }

    /// `$`, `@` or `&`.
    pub fn sigil(&self) -> Option<char> {
        self.name.chars().next().filter(|c| matches!(c, '$' | '@' | '&'))
    }

    /// Name between the braces.
    pub fn base_name(&self) -> &str {
        variable_body(&self.name).unwrap_or(&self.name)
    }

    /// True if the name is a well-formed variable token.
    pub fn has_valid_name(&self) -> bool {
        self.sigil().is_some() && is_variable(&self.name)
    }

    /// Check that the value shape matches the sigil.
    pub fn shape_error(&self) -> Option<String> {
        match self.sigil()? {
            '&' => self
                .value
                .iter()
                .find(|item| !is_dict_item(item))
                .map(|item| format!("Invalid dictionary variable item '{}': items must use 'name=value' syntax or be dictionary variables themselves", item)),
            _ => None,
        }
    }
}

fn is_dict_item(item: &str) -> bool {
    if item.starts_with("&{") && is_variable(item) {
        return true;
    }
    let bytes = item.as_bytes();
    bytes
        .iter()
        .enumerate()
        .any(|(i, &b)| b == b'=' && i > 0 && bytes[i - 1] != b'\\')
}

/// The `*** Variables ***` table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableTable {
    pub header: Option<TableHeader>,
    pub items: Vec<Variable>,
}

impl VariableTable {
    /// Find a variable by name, ignoring sigil, case, spaces and underscores.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        let wanted = normalize_variable(name);
        self.items
            .iter()
            .find(|v| !v.is_comment() && normalize_variable(&v.name) == wanted)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|v| !v.is_comment() && eq_normalized(v.base_name(), variable_body(name).unwrap_or(name)))
    }

    /// Variables without comment rows.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.items.iter().filter(|v| !v.is_comment())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_from_cells_strips_assign_mark() {
        let var = Variable::from_cells(&s(&["${HOST} =", "localhost", "# dev"]));
        assert_eq!(var.name, "${HOST}");
        assert_eq!(var.value, s(&["localhost"]));
        assert_eq!(var.to_cells(), s(&["${HOST}", "localhost", "# dev"]));
    }

    #[test]
    fn test_comment_row() {
        let var = Variable::from_cells(&s(&["# section"]));
        assert!(var.is_comment());
        assert_eq!(var.to_cells(), s(&["# section"]));
    }

    #[test]
    fn test_sigil_and_validity() {
        assert_eq!(Variable::new("@{L}", ["a"]).sigil(), Some('@'));
        assert!(Variable::new("&{D}", ["a=1"]).has_valid_name());
        assert!(!Variable::new("HOST", ["x"]).has_valid_name());
    }

    #[test]
    fn test_dict_shape() {
        assert!(Variable::new("&{D}", ["a=1", "&{other}"]).shape_error().is_none());
        assert!(Variable::new("&{D}", ["novalue"]).shape_error().is_some());
        assert!(Variable::new("&{D}", ["a\\=b"]).shape_error().is_some());
    }

    #[test]
    fn test_table_lookup_normalized() {
        let table = VariableTable {
            header: None,
            items: vec![Variable::comment_row(s(&["# c"])), Variable::new("${My Var}", ["1"])],
        };
        assert!(table.get("${my_var}").is_some());
        assert!(table.get("@{MYVAR}").is_some());
        assert_eq!(table.position("${myvar}"), Some(1));
        assert_eq!(table.variables().count(), 1);
    }
}

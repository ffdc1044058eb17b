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

//! Name normalization and variable-name predicates.
//!
//! Keyword, setting, table and variable names compare case-insensitively and
//! ignore spaces and underscores.

/// Normalize a name for comparison: lowercase, spaces and underscores removed.
///
/// ```
/// use rfide_core::names::normalize;
/// assert_eq!(normalize("Open_Browser  To Page"), "openbrowsertopage");
/// ```
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compare two names after normalization.
pub fn eq_normalized(a: &str, b: &str) -> bool {
    let mut left = a
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase);
    let mut right = b
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(l), Some(r)) if l == r => continue,
            _ => return false,
        }
    }
}

/// Normalize the body of a variable name (`${Foo Bar}` → `foobar`), ignoring
/// the sigil so `${x}`, `@{x}` and `&{x}` share storage.
pub fn normalize_variable(name: &str) -> String {
    match variable_body(name) {
        Some(body) => normalize(body),
        None => normalize(name),
    }
}

/// The text between the braces of a complete variable token.
pub fn variable_body(name: &str) -> Option<&str> {
    let name = name.trim();
    if name.len() < 3 || !is_sigil(name.as_bytes()[0]) {
        return None;
    }
    if name.as_bytes()[1] != b'{' || !name.ends_with('}') {
        return None;
    }
    Some(&name[2..name.len() - 1])
}

/// True for `$`, `@`, `&` and `%`.
#[inline]
pub fn is_sigil(b: u8) -> bool {
    matches!(b, b'$' | b'@' | b'&' | b'%')
}

/// True if the cell is exactly one variable token such as `${x}` or `@{list}`.
///
/// Item access (`${x}[0]`) and text around the token are not accepted.
pub fn is_variable(cell: &str) -> bool {
    let Some(body) = variable_body(cell) else {
        return false;
    };
    if cell.starts_with('%') || body.is_empty() {
        return false;
    }
    // The closing brace must match the opening one.
    let mut depth = 0i32;
    let bytes = body.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        let escaped = i > 0 && bytes[i - 1] == b'\\';
        match b {
            b'{' if !escaped => depth += 1,
            b'}' if !escaped => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// True if the cell can be the target of an assignment (`${x}` or `${x} =`).
pub fn is_assign(cell: &str) -> bool {
    is_variable(strip_assign_mark(cell))
}

/// Drop the optional trailing `=` of an assignment target.
pub fn strip_assign_mark(cell: &str) -> &str {
    match cell.trim_end().strip_suffix('=') {
        Some(rest) => rest.trim_end(),
        None => cell,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== normalize tests ====================

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Test Cases"), "testcases");
        assert_eq!(normalize("test_cases"), "testcases");
        assert_eq!(normalize("Schlüsselwörter"), "schlüsselwörter");
    }

    #[test]
    fn test_eq_normalized() {
        assert!(eq_normalized("Log Many", "log_many"));
        assert!(eq_normalized("LOG", "l o g"));
        assert!(!eq_normalized("Log", "Logs"));
    }

    #[test]
    fn test_normalize_variable_ignores_sigil() {
        assert_eq!(normalize_variable("${My Var}"), "myvar");
        assert_eq!(normalize_variable("@{my_var}"), "myvar");
        assert_eq!(normalize_variable("&{MYVAR}"), "myvar");
    }

    // ==================== Variable predicate tests ====================

    #[test]
    fn test_is_variable() {
        assert!(is_variable("${x}"));
        assert!(is_variable("@{list}"));
        assert!(is_variable("&{d}"));
        assert!(is_variable("${x${y}}"));
        assert!(!is_variable("${x}[0]"));
        assert!(!is_variable("${}"));
        assert!(!is_variable("%{HOME}"));
        assert!(!is_variable("text ${x}"));
        assert!(!is_variable("${a}${b}"));
    }

    #[test]
    fn test_is_assign() {
        assert!(is_assign("${x}="));
        assert!(is_assign("${x} ="));
        assert!(is_assign("@{x}"));
        assert!(!is_assign("Log"));
        assert_eq!(strip_assign_mark("${x} ="), "${x}");
        assert_eq!(strip_assign_mark("${x}"), "${x}");
    }
}

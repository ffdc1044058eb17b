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

//! Library keyword specifications.
//!
//! Keywords of the standard libraries come from an embedded catalogue.
//! Other libraries are described by libdoc XML spec files
//! (`<keywordspec>`), either imported directly or found as `<Name>.xml` on
//! the spec search path.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rfide_core::names::{eq_normalized, normalize};
use rfide_core::{RfError, RfResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::debug;

const CATALOGUE: &str = include_str!("../data/standard_libraries.txt");

/// Name of the library every file imports implicitly.
pub const BUILTIN: &str = "BuiltIn";

/// One library keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSpec {
    pub name: String,
    /// Argument specs as written by libdoc: `name`, `name=default`,
    /// `*varargs`, `**kwargs`.
    pub args: Vec<String>,
    pub doc: String,
    /// Name of the library that defines the keyword.
    pub library: String,
}

impl KeywordSpec {
    /// First line of the documentation.
    pub fn short_doc(&self) -> &str {
        self.doc.lines().next().unwrap_or("").trim()
    }

    /// Arguments without defaults that must be given.
    pub fn required_args(&self) -> usize {
        self.args
            .iter()
            .filter(|a| !a.contains('=') && !a.starts_with('*'))
            .count()
    }

    /// Upper bound for positional arguments; `None` with varargs.
    pub fn max_args(&self) -> Option<usize> {
        if self.args.iter().any(|a| a.starts_with('*')) {
            None
        } else {
            Some(self.args.len())
        }
    }
}

/// Keywords of one library.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LibrarySpec {
    pub name: String,
    pub version: Option<String>,
    pub doc: String,
    pub keywords: Vec<KeywordSpec>,
    /// Spec file the library was read from; `None` for embedded libraries.
    pub source: Option<PathBuf>,
}

impl LibrarySpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn keyword(&self, name: &str) -> Option<&KeywordSpec> {
        self.keywords.iter().find(|k| eq_normalized(&k.name, name))
    }

    pub fn add_keyword<I, S>(&mut self, name: impl Into<String>, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.push(KeywordSpec {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
            doc: String::new(),
            library: self.name.clone(),
        });
    }

    /// Read a libdoc XML spec file.
    pub fn load(path: &Path) -> RfResult<Self> {
        let xml = std::fs::read_to_string(path).map_err(|e| {
            RfError::import(format!("Reading library spec '{}' failed: {}", path.display(), e))
                .with_path(path)
        })?;
        let mut spec = Self::from_libdoc_xml(&xml).map_err(|e| e.with_path(path))?;
        spec.source = Some(path.to_path_buf());
        debug!(path = %path.display(), library = %spec.name, keywords = spec.keywords.len(), "loaded library spec");
        Ok(spec)
    }

    /// Parse libdoc XML. Both the old `<arg>text</arg>` layout and the newer
    /// `<arg repr="...">` layout are understood.
    pub fn from_libdoc_xml(xml: &str) -> RfResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut spec: Option<LibrarySpec> = None;
        let mut path: Vec<String> = Vec::new();
        let mut current: Option<KeywordSpec> = None;
        let mut arg_text: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = element_name(&e);
                    match name.as_str() {
                        "keywordspec" => spec = Some(library_from(&e)?),
                        "kw" if !path.iter().any(|p| p == "inits" || p == "init") => {
                            current = Some(keyword_from(&e, spec.as_ref())?);
                        }
                        "arg" if current.is_some() => {
                            arg_text = Some(attribute(&e, "repr")?.unwrap_or_default());
                        }
                        _ => {}
                    }
                    path.push(name);
                }
                Ok(Event::Empty(e)) => {
                    let name = element_name(&e);
                    match name.as_str() {
                        "keywordspec" => spec = Some(library_from(&e)?),
                        "kw" if !path.iter().any(|p| p == "inits" || p == "init") => {
                            let kw = keyword_from(&e, spec.as_ref())?;
                            if let Some(lib) = spec.as_mut() {
                                lib.keywords.push(kw);
                            }
                        }
                        "arg" => {
                            if let (Some(kw), Some(repr)) = (current.as_mut(), attribute(&e, "repr")?) {
                                kw.args.push(repr);
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| RfError::import(format!("Invalid library spec text: {}", e)))?;
                    let parent = path.last().map(String::as_str);
                    let grandparent = path.len().checked_sub(2).and_then(|i| path.get(i)).map(String::as_str);
                    match (parent, grandparent) {
                        (Some("arg"), _) => {
                            if let Some(arg) = arg_text.as_mut().filter(|a| a.is_empty()) {
                                arg.push_str(&text);
                            }
                        }
                        (Some("doc"), Some("kw")) => {
                            if let Some(kw) = current.as_mut() {
                                kw.doc = text.into_owned();
                            }
                        }
                        (Some("doc"), Some("keywordspec")) => {
                            if let Some(lib) = spec.as_mut() {
                                lib.doc = text.into_owned();
                            }
                        }
                        (Some("version"), Some("keywordspec")) => {
                            if let Some(lib) = spec.as_mut() {
                                lib.version = Some(text.into_owned()).filter(|v| !v.is_empty());
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::End(_)) => {
                    match path.pop().as_deref() {
                        Some("arg") => {
                            if let (Some(kw), Some(arg)) = (current.as_mut(), arg_text.take()) {
                                kw.args.push(arg);
                            }
                        }
                        Some("kw") => {
                            if let (Some(lib), Some(kw)) = (spec.as_mut(), current.take()) {
                                lib.keywords.push(kw);
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(RfError::import(format!(
                        "Invalid library spec at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
        }

        spec.ok_or_else(|| RfError::import("Library spec has no <keywordspec> root element"))
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> RfResult<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|e| RfError::import(format!("Invalid attribute '{}': {}", key, e)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn library_from(e: &BytesStart<'_>) -> RfResult<LibrarySpec> {
    let name = attribute(e, "name")?
        .ok_or_else(|| RfError::import("<keywordspec> has no name attribute"))?;
    Ok(LibrarySpec::new(name))
}

fn keyword_from(e: &BytesStart<'_>, spec: Option<&LibrarySpec>) -> RfResult<KeywordSpec> {
    let name = attribute(e, "name")?.ok_or_else(|| RfError::import("<kw> has no name attribute"))?;
    Ok(KeywordSpec {
        name,
        args: Vec::new(),
        doc: String::new(),
        library: spec.map(|s| s.name.clone()).unwrap_or_default(),
    })
}

fn parse_catalogue(text: &str) -> HashMap<String, Arc<LibrarySpec>> {
    let mut libraries = Vec::new();
    let mut current: Option<LibrarySpec> = None;
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            libraries.extend(current.take());
            current = Some(LibrarySpec::new(name));
            continue;
        }
        if let Some(lib) = current.as_mut() {
            let mut parts = line.split(" | ").map(str::trim);
            if let Some(name) = parts.next() {
                lib.add_keyword(name, parts);
            }
        }
    }
    libraries.extend(current);
    libraries
        .into_iter()
        .map(|lib| (normalize(&lib.name), Arc::new(lib)))
        .collect()
}

fn catalogue() -> &'static HashMap<String, Arc<LibrarySpec>> {
    static LIBRARIES: OnceLock<HashMap<String, Arc<LibrarySpec>>> = OnceLock::new();
    LIBRARIES.get_or_init(|| parse_catalogue(CATALOGUE))
}

/// An embedded standard library, looked up by normalized name.
pub fn standard_library(name: &str) -> Option<Arc<LibrarySpec>> {
    catalogue().get(&normalize(name)).cloned()
}

/// Names of the embedded standard libraries.
pub fn standard_library_names() -> Vec<String> {
    let mut names: Vec<String> = catalogue().values().map(|l| l.name.clone()).collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Catalogue tests ====================

    #[test]
    fn test_builtin_catalogue() {
        let builtin = standard_library("builtin").unwrap();
        assert_eq!(builtin.name, "BuiltIn");
        let log = builtin.keyword("log").unwrap();
        assert_eq!(log.args[0], "message");
        assert_eq!(log.library, "BuiltIn");
        assert_eq!(log.required_args(), 1);
        assert_eq!(builtin.keyword("Log Many").unwrap().max_args(), None);
        assert!(builtin.keyword("No Operation").unwrap().args.is_empty());
    }

    #[test]
    fn test_all_standard_libraries_present() {
        let names = standard_library_names();
        for lib in [
            "BuiltIn",
            "Collections",
            "OperatingSystem",
            "String",
            "DateTime",
            "Process",
            "XML",
            "Screenshot",
            "Dialogs",
            "Telnet",
        ] {
            assert!(names.iter().any(|n| n == lib), "missing {}", lib);
        }
        assert!(standard_library("Operating System").is_some());
        assert!(standard_library("SeleniumLibrary").is_none());
    }

    // ==================== Libdoc tests ====================

    #[test]
    fn test_libdoc_old_layout() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<keywordspec name="MyLib" type="library" generated="20200101 00:00:00">
<version>1.2</version>
<doc>Library docs.</doc>
<init>
<arguments><arg>host</arg></arguments>
<doc>Init docs.</doc>
</init>
<kw name="Connect">
<arguments>
<arg>host</arg>
<arg>port=80</arg>
</arguments>
<doc>Connects.

Longer description.</doc>
</kw>
<kw name="Disconnect">
<arguments>
</arguments>
<doc></doc>
</kw>
</keywordspec>
"#;
        let spec = LibrarySpec::from_libdoc_xml(xml).unwrap();
        assert_eq!(spec.name, "MyLib");
        assert_eq!(spec.version.as_deref(), Some("1.2"));
        assert_eq!(spec.doc, "Library docs.");
        assert_eq!(spec.keywords.len(), 2);
        let connect = spec.keyword("connect").unwrap();
        assert_eq!(connect.args, vec!["host", "port=80"]);
        assert_eq!(connect.short_doc(), "Connects.");
        assert_eq!(connect.library, "MyLib");
        assert!(spec.keyword("Disconnect").unwrap().args.is_empty());
    }

    #[test]
    fn test_libdoc_repr_layout() {
        let xml = r#"<keywordspec name="NewLib" specversion="3">
<inits>
<init name="Init"><arguments repr="a"><arg kind="POSITIONAL_OR_NAMED" repr="a"><name>a</name></arg></arguments></init>
</inits>
<keywords>
<kw name="Do Thing">
<arguments repr="x, *rest">
<arg kind="POSITIONAL_OR_NAMED" required="true" repr="x"><name>x</name></arg>
<arg kind="VAR_POSITIONAL" required="false" repr="*rest"><name>rest</name></arg>
</arguments>
<doc>Does it.</doc>
</kw>
</keywords>
</keywordspec>"#;
        let spec = LibrarySpec::from_libdoc_xml(xml).unwrap();
        assert_eq!(spec.keywords.len(), 1);
        assert_eq!(spec.keywords[0].args, vec!["x", "*rest"]);
        assert_eq!(spec.keywords[0].doc, "Does it.");
    }

    #[test]
    fn test_libdoc_errors() {
        assert!(LibrarySpec::from_libdoc_xml("<other/>").is_err());
        assert!(LibrarySpec::from_libdoc_xml("<keywordspec>").is_err());
    }
}

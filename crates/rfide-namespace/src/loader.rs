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

//! Loading imported files and locating import targets.

use crate::libspec::{standard_library, LibrarySpec};
use crate::varfile::{is_variable_file, load_variable_file, VariableFileData};
use rfide_core::{parse_file, DataFile, Format, ImportKind, ParseOptions, RfError, RfResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of loading one import target.
#[derive(Debug, Clone)]
pub enum Loaded {
    Resource(Arc<DataFile>),
    VariableFile(Arc<VariableFileData>),
    Library(Arc<LibrarySpec>),
}

impl Loaded {
    pub fn as_resource(&self) -> Option<&Arc<DataFile>> {
        match self {
            Self::Resource(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_variables(&self) -> Option<&Arc<VariableFileData>> {
        match self {
            Self::VariableFile(vars) => Some(vars),
            _ => None,
        }
    }

    pub fn as_library(&self) -> Option<&Arc<LibrarySpec>> {
        match self {
            Self::Library(lib) => Some(lib),
            _ => None,
        }
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// True for test data extensions (`.robot`, `.resource`, `.txt`, `.tsv`,
/// `.html`).
pub fn is_resource_file(path: &Path) -> bool {
    Format::from_path(path).is_some()
}

/// Load a file by extension: test data as a resource, `.py/.yaml/.yml/.json`
/// as a variable file and `.xml` as a libdoc spec.
pub fn load_path(path: &Path) -> RfResult<Loaded> {
    if is_resource_file(path) {
        let file = parse_file(path, &ParseOptions::resource()).map_err(|e| {
            RfError::import(format!("Resource file '{}' could not be read: {}", path.display(), e.message))
                .with_path(path)
        })?;
        return Ok(Loaded::Resource(Arc::new(file)));
    }
    if is_variable_file(path) {
        return load_variable_file(path).map(|vars| Loaded::VariableFile(Arc::new(vars)));
    }
    if extension(path) == "xml" {
        return LibrarySpec::load(path).map(|lib| Loaded::Library(Arc::new(lib)));
    }
    Err(RfError::import(format!("Unsupported import file type '{}'", path.display())).with_path(path))
}

/// Resolve a resource, variable file or library spec import to an existing
/// path: absolute paths as given, relative paths against the importing
/// file's directory and then each search path entry.
pub fn resolve_import_path(name: &str, base: Option<&Path>, search_path: &[PathBuf]) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.is_absolute() {
        return candidate.is_file().then(|| normalize_path(candidate));
    }
    base.into_iter()
        .chain(search_path.iter().map(PathBuf::as_path))
        .map(|dir| dir.join(candidate))
        .find(|p| p.is_file())
        .map(|p| normalize_path(&p))
}

/// Where a library import comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryLocation {
    /// An embedded standard library.
    Standard(String),
    /// A libdoc spec file.
    Spec(PathBuf),
}

/// Locate the keyword spec of a `Library` import. Names with a path
/// separator or `.xml` extension are spec files; other names are looked up
/// among the standard libraries and then as `<Name>.xml` on the spec path.
pub fn locate_library(name: &str, base: Option<&Path>, spec_path: &[PathBuf]) -> Option<LibraryLocation> {
    let looks_like_path = name.contains('/') || name.contains('\\') || extension(Path::new(name)) == "xml";
    if looks_like_path {
        return resolve_import_path(name, base, spec_path).map(LibraryLocation::Spec);
    }
    if let Some(lib) = standard_library(name) {
        return Some(LibraryLocation::Standard(lib.name.clone()));
    }
    let file_name = format!("{}.xml", name);
    spec_path
        .iter()
        .map(|dir| dir.join(&file_name))
        .find(|p| p.is_file())
        .map(|p| normalize_path(&p))
        .map(LibraryLocation::Spec)
}

/// Resolve an import of the given kind to a file path. Standard libraries
/// have no path and yield `None`.
pub fn import_target(
    kind: ImportKind,
    name: &str,
    base: Option<&Path>,
    module_path: &[PathBuf],
    spec_path: &[PathBuf],
) -> Option<PathBuf> {
    match kind {
        ImportKind::Resource | ImportKind::Variables => resolve_import_path(name, base, module_path),
        ImportKind::Library => match locate_library(name, base, spec_path)? {
            LibraryLocation::Spec(path) => Some(path),
            LibraryLocation::Standard(_) => None,
        },
    }
}

/// Canonical form used as the cache key; falls back to the path as given
/// when it cannot be canonicalized.
pub fn normalize_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, text).unwrap();
        path
    }

    // ==================== Path resolution tests ====================

    #[test]
    fn test_relative_then_search_path() {
        let dir = TempDir::new().unwrap();
        let local = write(dir.path(), "suite/common.resource", "*** Keywords ***\n");
        let shared = write(dir.path(), "lib/shared.resource", "*** Keywords ***\n");
        let base = dir.path().join("suite");
        let search = vec![dir.path().join("lib")];

        assert_eq!(
            resolve_import_path("common.resource", Some(&base), &search),
            Some(normalize_path(&local))
        );
        assert_eq!(
            resolve_import_path("shared.resource", Some(&base), &search),
            Some(normalize_path(&shared))
        );
        assert_eq!(resolve_import_path("missing.resource", Some(&base), &search), None);
    }

    #[test]
    fn test_locate_library() {
        let dir = TempDir::new().unwrap();
        let spec = write(dir.path(), "MyLib.xml", "<keywordspec name=\"MyLib\"/>");
        let spec_path = vec![dir.path().to_path_buf()];

        assert_eq!(
            locate_library("Collections", None, &spec_path),
            Some(LibraryLocation::Standard("Collections".to_string()))
        );
        assert_eq!(
            locate_library("MyLib", None, &spec_path),
            Some(LibraryLocation::Spec(normalize_path(&spec)))
        );
        assert_eq!(locate_library("Unknown", None, &spec_path), None);
    }

    // ==================== Loading tests ====================

    #[test]
    fn test_load_by_extension() {
        let dir = TempDir::new().unwrap();
        let res = write(dir.path(), "a.resource", "*** Keywords ***\nKW\n    No Operation\n");
        let vars = write(dir.path(), "v.json", "{\"x\": 1}");
        let lib = write(dir.path(), "L.xml", "<keywordspec name=\"L\"><kw name=\"Go\"/></keywordspec>");

        let loaded = load_path(&res).unwrap();
        let file = loaded.as_resource().unwrap();
        assert!(file.is_resource());
        assert_eq!(file.keywords.items[0].name, "KW");
        assert_eq!(load_path(&vars).unwrap().as_variables().unwrap().len(), 1);
        assert_eq!(load_path(&lib).unwrap().as_library().unwrap().keywords[0].name, "Go");

        let other = write(dir.path(), "x.bin", "");
        assert_eq!(load_path(&other).unwrap_err().kind, rfide_core::RfErrorKind::Import);
    }
}

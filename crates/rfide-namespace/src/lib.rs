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

//! Variable resolution, import cache and keyword namespace.
//!
//! Builds on the model of `rfide-core` to answer what a file can see:
//!
//! - [`variables`] stores variables in priority order and replaces
//!   `${scalar}`, `@{list}`, `&{dict}` and `%{ENV}` tokens, including item
//!   access and the extended `${var.method()}` syntax
//! - [`expr`] evaluates the Python expression subset used by extended
//!   variables, inline `${{ }}` evaluation and variable files
//! - [`varfile`] reads YAML, JSON and Python variable files
//! - [`libspec`] holds library keyword specifications
//! - [`cache`] loads imports on a worker pool and shares them by path
//! - [`namespace`] resolves keywords and variables through the import graph
//!
//! # Example
//!
//! ```
//! use rfide_core::{parse_str, Format, ParseOptions};
//! use rfide_namespace::{FileId, FileScope, Namespace, NamespaceConfig};
//!
//! let file = parse_str(
//!     "*** Keywords ***\nGreet\n    Log    Hello\n",
//!     Format::Robot,
//!     &ParseOptions::default(),
//! )
//! .unwrap();
//! let namespace = Namespace::new(NamespaceConfig::new()).unwrap();
//! let scope = FileScope::new(FileId(1), 0, &file);
//!
//! let log = namespace.resolve(&scope, "BuiltIn.Log");
//! assert_eq!(log.keyword().unwrap().name, "Log");
//! ```

pub mod cache;
pub mod expr;
pub mod libspec;
pub mod loader;
pub mod namespace;
pub mod search;
mod value;
pub mod varfile;
pub mod variables;

pub use cache::{CacheStatistics, Completed, ImportCache, LoadHandle, LoadResult, LoadState};
pub use expr::{evaluate, literal_eval, ExprError};
pub use libspec::{standard_library, standard_library_names, KeywordSpec, LibrarySpec};
pub use loader::Loaded;
pub use namespace::{
    Cursor, FileId, FileScope, ImportState, ImportStatus, ItemRef, KeywordInfo, KeywordSource,
    KeywordUsage, Namespace, NamespaceConfig, Resolution, SourceRank, Suggestion,
};
pub use search::{find_variables, search_variable, VariableMatch};
pub use value::Value;
pub use varfile::{load_variable_file, VariableFileData};
pub use variables::{
    VariableError, VariableInfo, VariableResult, VariableSource, VariableStore, VariableValue,
};

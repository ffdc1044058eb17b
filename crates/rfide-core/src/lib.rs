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

//! Tokenizer, parser and data model for Robot Framework test data.
//!
//! This crate reads test case files, resource files and directory suites in
//! the space separated, pipe separated, TSV and HTML formats into an
//! in-memory model that keeps enough of the original layout to be written
//! back without loss.
//!
//! # Reading
//!
//! ```
//! use rfide_core::{parse_str, Format, ParseOptions};
//!
//! let text = "*** Test Cases ***\nExample\n    Log    Hello\n";
//! let file = parse_str(text, Format::Robot, &ParseOptions::default()).unwrap();
//! assert_eq!(file.tests.items[0].name, "Example");
//! assert_eq!(file.tests.items[0].steps[0].keyword(), Some("Log"));
//! ```
//!
//! Problems inside the data (unknown settings, invalid variable names,
//! duplicate tests) do not fail parsing. They are collected as
//! [`Diagnostic`] values on the returned [`DataFile`].
//!
//! # Modules
//!
//! - [`preprocess`] decodes bytes and splits lines
//! - [`lex`] turns lines into rows of cells for each format
//! - [`language`] maps localized headers and setting names
//! - [`model`] holds the data model
//! - [`parser`] builds the model from rows

pub mod diagnostic;
mod error;
pub mod language;
pub mod lex;
mod limits;
pub mod model;
pub mod names;
pub mod parser;
pub mod preprocess;

pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use error::{RfError, RfErrorKind, RfResult};
pub use language::{ItemSettingName, Language, SettingName, TableKind};
pub use limits::Limits;
pub use model::{
    CommentTable, DataFile, FileKind, Format, Import, ImportKind, ItemSetting, KeywordCall,
    Setting, Step, Suite, TestCase, TestDataDirectory, UserKeyword, Variable,
};
pub use parser::{
    is_init_file, parse_bytes, parse_directory, parse_file, parse_file_lenient, parse_str,
    parse_suite, ParseOptions, ParseOptionsBuilder, PathFilter,
};

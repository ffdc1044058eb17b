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

//! Writers for Robot Framework test data.
//!
//! A [`DataFile`] is written back in the format chosen by the target file
//! extension: space or pipe separated plain text (`.robot`, `.resource`,
//! `.txt`), tab separated values (`.tsv`) or HTML tables (`.html`).
//!
//! Output read back with `rfide_core` produces a model equal to the one that
//! was written:
//!
//! ```
//! use rfide_core::{parse_str, Format, ParseOptions};
//! use rfide_writer::{write, LineEnding, WriterConfig};
//!
//! let text = "*Settings*\nLibrary    OperatingSystem\n";
//! let file = parse_str(text, Format::Robot, &ParseOptions::default()).unwrap();
//! let config = WriterConfig::builder().line_ending(LineEnding::Lf).build();
//! assert_eq!(write(&file, Format::Robot, &config).unwrap(), text);
//! ```
//!
//! Tables are written in the order Settings, Variables, Test Cases,
//! Keywords, Comments. Original header text is kept; files built in memory
//! get `*** Settings ***` style headers.

mod config;
pub mod layout;
mod html;
mod tsv;
mod txt;

pub use config::{LineEnding, WriterConfig, WriterConfigBuilder, MIN_SEPARATOR_WIDTH};
pub use layout::{layout, Layout};

use rfide_core::model::suite_name_from_path;
use rfide_core::{DataFile, Format, RfError, RfResult};
use std::path::Path;
use tracing::debug;

/// Write a file in the given format.
pub fn write(file: &DataFile, format: Format, config: &WriterConfig) -> RfResult<String> {
    let layout = layout::layout(file, config.max_cells);
    match format {
        Format::Robot | Format::Resource | Format::Txt => {
            let dialect = txt::choose_dialect(&layout, file.dialect, config);
            Ok(txt::render(&layout, dialect, config))
        }
        Format::Tsv => tsv::render(&layout, config),
        Format::Html => {
            let title = file
                .source
                .as_deref()
                .map(suite_name_from_path)
                .unwrap_or_else(|| "Test Data".to_string());
            Ok(html::render(&layout, &title, config))
        }
    }
}

/// Write a file in the format it was read from.
pub fn write_file(file: &DataFile, config: &WriterConfig) -> RfResult<String> {
    write(file, file.format, config)
}

/// Write a file to disk; the format follows the extension of `path`.
pub fn write_to_path(file: &DataFile, path: &Path, config: &WriterConfig) -> RfResult<()> {
    let format = Format::from_path(path).ok_or_else(|| {
        RfError::serialization(format!("Unsupported output format '{}'", path.display()))
            .with_path(path)
    })?;
    let text = write(file, format, config)?;
    std::fs::write(path, text.as_bytes()).map_err(|e| {
        RfError::serialization(format!("Writing '{}' failed: {}", path.display(), e))
            .with_path(path)
    })?;
    debug!(path = %path.display(), format = ?format, bytes = text.len(), "wrote test data");
    Ok(())
}

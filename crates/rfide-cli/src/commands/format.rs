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

//! Format command - rewrite test data in a normalized layout or another
//! format

use super::write_output;
use crate::error::CliError;
use rfide_core::lex::Dialect;
use rfide_core::{parse_file, Format, ParseOptions};
use rfide_writer::{write, LineEnding, WriterConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Options of the format command.
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// Output file; stdout if `None`.
    pub output: Option<PathBuf>,
    /// Target format by extension name (`robot`, `tsv`, `html`, ...).
    pub to: Option<String>,
    /// Only report whether the file would change.
    pub check: bool,
    pub separator_width: Option<usize>,
    pub max_cells: Option<usize>,
    /// Force the pipe separated dialect.
    pub pipes: bool,
}

fn target_format(source: Format, options: &FormatOptions) -> Result<Format, CliError> {
    if let Some(name) = &options.to {
        return Format::from_extension(name.trim_start_matches('.'))
            .ok_or_else(|| CliError::invalid_input(format!("Unknown format '{}'", name)));
    }
    Ok(options
        .output
        .as_deref()
        .and_then(Format::from_path)
        .unwrap_or(source))
}

fn writer_config(base: WriterConfig, options: &FormatOptions) -> Result<WriterConfig, CliError> {
    let mut config = base;
    if let Some(width) = options.separator_width {
        if width < rfide_writer::MIN_SEPARATOR_WIDTH {
            return Err(CliError::invalid_input(format!(
                "Separator width must be at least {}",
                rfide_writer::MIN_SEPARATOR_WIDTH
            )));
        }
        config = config.with_separator_width(width);
    }
    if let Some(cells) = options.max_cells {
        if cells == 0 {
            return Err(CliError::invalid_input("Max cells must be positive"));
        }
        config = config.with_max_cells(cells);
    }
    if options.pipes {
        config = config.with_dialect(Dialect::Pipe);
    }
    // Output is compared with files on disk; keep it independent of the
    // platform.
    Ok(config.with_line_ending(LineEnding::Lf))
}

/// Format a test data file.
///
/// # Errors
///
/// Returns `Err` if the file cannot be read or written, or in check mode if
/// the output differs from the file.
///
/// # Examples
///
/// ```no_run
/// use rfide_cli::commands::{format, FormatOptions};
/// use rfide_writer::WriterConfig;
///
/// # fn main() -> Result<(), rfide_cli::error::CliError> {
/// let options = FormatOptions { to: Some("tsv".into()), ..Default::default() };
/// format("login.robot", &options, WriterConfig::default())?;
/// # Ok(())
/// # }
/// ```
pub fn format(file: &str, options: &FormatOptions, base: WriterConfig) -> Result<(), CliError> {
    let path = Path::new(file);
    let data = parse_file(path, &ParseOptions::default())?;
    let format = target_format(data.format, options)?;
    let config = writer_config(base, options)?;
    let text = write(&data, format, &config)?;

    if options.check {
        let original = fs::read_to_string(path).map_err(|e| CliError::io_error(path, e))?;
        let original = original.trim_start_matches('\u{feff}').replace("\r\n", "\n");
        if original != text {
            return Err(CliError::NotFormatted(path.to_path_buf()));
        }
        println!("{} is formatted", file);
        return Ok(());
    }
    write_output(&text, options.output.as_deref())
}

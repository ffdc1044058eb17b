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

//! Writer configuration.

use rfide_core::lex::Dialect;

/// Smallest separator that still splits cells in the space separated format.
pub const MIN_SEPARATOR_WIDTH: usize = 2;

/// Line terminator of the written output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    Lf,
    CrLf,
    /// `\r\n` on Windows, `\n` elsewhere.
    #[default]
    Native,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Native => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
        }
    }
}

/// Configuration for written test data.
///
/// # Examples
///
/// ```
/// use rfide_writer::{LineEnding, WriterConfig};
///
/// let config = WriterConfig::default();
/// assert_eq!(config.separator_width, 4);
/// assert_eq!(config.max_cells, 8);
///
/// let config = WriterConfig::builder()
///     .separator_width(2)
///     .line_ending(LineEnding::Lf)
///     .build();
/// assert_eq!(config.separator(), "  ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Spaces between cells in the space separated format (at least two).
    pub separator_width: usize,
    /// Spaces per indentation level inside tests and keywords.
    pub indent_width: usize,
    /// Soft limit of data cells per physical row before wrapping onto `...`
    /// continuation rows.
    pub max_cells: usize,
    /// Plain text dialect. `None` keeps the dialect the file was read with,
    /// switching to pipes when a cell cannot be written with spaces.
    pub dialect: Option<Dialect>,
    pub line_ending: LineEnding,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            separator_width: 4,
            indent_width: 4,
            max_cells: 8,
            dialect: None,
            line_ending: LineEnding::Native,
        }
    }
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new builder for constructing a `WriterConfig`.
    pub fn builder() -> WriterConfigBuilder {
        WriterConfigBuilder::new()
    }

    pub fn with_separator_width(mut self, width: usize) -> Self {
        self.separator_width = width.max(MIN_SEPARATOR_WIDTH);
        self
    }

    pub fn with_max_cells(mut self, cells: usize) -> Self {
        self.max_cells = cells.max(2);
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Cell separator of the space separated format.
    pub fn separator(&self) -> String {
        " ".repeat(self.separator_width.max(MIN_SEPARATOR_WIDTH))
    }

    /// Indentation for a nesting level.
    pub fn indent(&self, level: usize) -> String {
        " ".repeat(self.indent_width.max(MIN_SEPARATOR_WIDTH) * level)
    }
}

/// Builder for [`WriterConfig`].
#[derive(Debug, Clone, Default)]
pub struct WriterConfigBuilder {
    config: WriterConfig,
}

impl WriterConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spaces between cells; values below two are raised to two.
    pub fn separator_width(mut self, width: usize) -> Self {
        self.config = self.config.with_separator_width(width);
        self
    }

    pub fn indent_width(mut self, width: usize) -> Self {
        self.config.indent_width = width;
        self
    }

    pub fn max_cells(mut self, cells: usize) -> Self {
        self.config = self.config.with_max_cells(cells);
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.config.dialect = Some(dialect);
        self
    }

    pub fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.config.line_ending = line_ending;
        self
    }

    pub fn build(self) -> WriterConfig {
        self.config
    }
}

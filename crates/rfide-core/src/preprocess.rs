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

//! Input preprocessing for test data files.

use crate::error::{RfError, RfResult};
use crate::limits::Limits;

/// Preprocessed input ready for tokenizing.
/// Stores normalized text and line offsets.
#[derive(Debug)]
pub struct PreprocessedInput {
    text: String,
    /// Line boundaries: (line_number, start_offset, end_offset)
    line_offsets: Vec<(usize, usize, usize)>,
    lossy: bool,
}

impl PreprocessedInput {
    /// Get lines as (line_num, &str) iterator.
    #[inline]
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.line_offsets
            .iter()
            .map(move |&(num, start, end)| (num, &self.text[start..end]))
    }

    /// The whole normalized text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True if invalid UTF-8 sequences were replaced while decoding.
    pub fn is_lossy(&self) -> bool {
        self.lossy
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }
}

/// Preprocess raw input bytes into lines.
///
/// This handles:
/// - lenient UTF-8 decoding (invalid sequences become U+FFFD)
/// - BOM skipping
/// - CRLF and bare CR normalization to LF
/// - size and line length limits
pub fn preprocess(input: &[u8], limits: &Limits) -> RfResult<PreprocessedInput> {
    if input.len() > limits.max_file_size {
        return Err(RfError::security(
            format!("file too large: exceeds limit of {} bytes", limits.max_file_size),
            0,
        ));
    }

    let input = input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(input);
    let decoded = String::from_utf8_lossy(input);
    let lossy = matches!(decoded, std::borrow::Cow::Owned(_));

    let text = if memchr::memchr(b'\r', decoded.as_bytes()).is_some() {
        decoded.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        decoded.into_owned()
    };

    let bytes = text.as_bytes();
    let mut line_offsets = Vec::with_capacity(memchr::memchr_iter(b'\n', bytes).count() + 1);
    let mut start = 0;
    let mut line_num = 1;
    for end in memchr::memchr_iter(b'\n', bytes).chain(std::iter::once(bytes.len())) {
        if end == bytes.len() && start == end && line_num > 1 {
            break;
        }
        if end - start > limits.max_line_length {
            return Err(RfError::security(
                format!(
                    "line too long: exceeds limit of {} bytes",
                    limits.max_line_length
                ),
                line_num,
            ));
        }
        line_offsets.push((line_num, start, end));
        start = end + 1;
        line_num += 1;
    }

    Ok(PreprocessedInput {
        text,
        line_offsets,
        lossy,
    })
}

/// Check if a line contains only whitespace.
#[inline]
pub fn is_blank_line(line: &str) -> bool {
    line.trim().is_empty()
}

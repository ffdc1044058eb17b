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

//! Resource limits for reading test data.

/// Configurable limits applied while reading test data.
///
/// These bound the memory a single malformed or hostile file can consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum file size in bytes (default: 64MB).
    pub max_file_size: usize,
    /// Maximum line length in bytes (default: 1MB).
    pub max_line_length: usize,
    /// Maximum cells in one physical row (default: 10k).
    pub max_cells_per_row: usize,
    /// Maximum directory depth when reading suites (default: 64).
    pub max_directory_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: 64 * 1024 * 1024,  // 64MB
            max_line_length: 1024 * 1024,     // 1MB
            max_cells_per_row: 10_000,
            max_directory_depth: 64,
        }
    }
}

impl Limits {
    /// Create limits with no restrictions (for testing).
    pub fn unlimited() -> Self {
        Self {
            max_file_size: usize::MAX,
            max_line_length: usize::MAX,
            max_cells_per_row: usize::MAX,
            max_directory_depth: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_file_size, 64 * 1024 * 1024);
        assert_eq!(limits.max_cells_per_row, 10_000);
    }

    #[test]
    fn test_unlimited() {
        let limits = Limits::unlimited();
        assert_eq!(limits.max_line_length, usize::MAX);
        assert_eq!(limits.max_directory_depth, usize::MAX);
    }
}

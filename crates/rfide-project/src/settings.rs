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

//! Persisted IDE settings.
//!
//! Settings live in an INI file. Every value is stored as a Python literal
//! (`'robot'`, `4`, `True`, `['a', 'b']`, `None`), so types survive a round
//! trip. Keys outside any section are general settings; `settings_version`
//! records the layout of the file and older layouts are migrated when the
//! file is loaded, then written back.

use crate::error::{ConfigError, ConfigResult};
use ini::{EscapePolicy, Ini, ParseOption};
use rfide_namespace::{literal_eval, NamespaceConfig, Value};
use rfide_writer::WriterConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current layout of the settings file.
pub const SETTINGS_VERSION: i64 = 3;

pub const TEST_RUNNER: &str = "Test Runner";
pub const GRID: &str = "Grid";

const VERSION_KEY: &str = "settings_version";
/// Section name used by version 2 files for the runner settings.
const LEGACY_RUNNER: &str = "Plugin Test Runner";

fn defaults() -> Vec<(Option<&'static str>, &'static str, Value)> {
    vec![
        (None, "default file format", Value::from("robot")),
        (None, "txt number of spaces", Value::Int(4)),
        (None, "txt max cells", Value::Int(8)),
        (None, "auto imports", Value::List(Vec::new())),
        (None, "pythonpath", Value::List(Vec::new())),
        (None, "spec path", Value::List(Vec::new())),
        (None, "worker threads", Value::Int(0)),
        (Some(TEST_RUNNER), "executable", Value::from("robot")),
        (Some(TEST_RUNNER), "arguments", Value::from("")),
        (Some(TEST_RUNNER), "listener port", Value::Int(0)),
        (Some(TEST_RUNNER), "pause on failure", Value::Bool(false)),
        (Some(GRID), "font size", Value::Int(10)),
        (Some(GRID), "col size", Value::Int(175)),
        (Some(GRID), "max col size", Value::Int(450)),
        (Some(GRID), "auto size cols", Value::Bool(false)),
        (Some(GRID), "word wrap", Value::Bool(true)),
    ]
}

/// Typed key-value settings backed by an INI file.
#[derive(Debug, Clone)]
pub struct Settings {
    ini: Ini,
    path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Default settings, not bound to a file.
    pub fn new() -> Self {
        let mut settings = Self {
            ini: Ini::new(),
            path: None,
        };
        settings.set(None, VERSION_KEY, SETTINGS_VERSION);
        settings.fill_defaults();
        settings
    }

    /// Load settings from `path`. A missing file gives the defaults; an older
    /// layout is migrated and written back.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            let mut settings = Self::new();
            settings.path = Some(path.to_path_buf());
            return Ok(settings);
        }
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let (mut settings, migrated) = Self::parse(&text)?;
        settings.path = Some(path.to_path_buf());
        if migrated {
            settings.save()?;
        }
        Ok(settings)
    }

    /// Settings from INI text, migrated to the current layout.
    pub fn from_ini_str(text: &str) -> ConfigResult<Self> {
        Self::parse(text).map(|(settings, _)| settings)
    }

    fn parse(text: &str) -> ConfigResult<(Self, bool)> {
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(text, options).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut settings = Self { ini, path: None };
        let migrated = settings.migrate()?;
        settings.fill_defaults();
        Ok((settings, migrated))
    }

    /// Path the settings are saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the settings back to the file they were loaded from.
    pub fn save(&self) -> ConfigResult<()> {
        match &self.path {
            Some(path) => self.save_to(path),
            None => Err(ConfigError::Io {
                path: PathBuf::new(),
                message: "settings are not bound to a file".to_string(),
            }),
        }
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let io_error = |e: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        let mut out = Vec::new();
        self.ini
            .write_to_policy(&mut out, EscapePolicy::Nothing)
            .map_err(io_error)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_error)?;
        }
        fs::write(path, out).map_err(io_error)?;
        debug!(path = %path.display(), "Saved settings");
        Ok(())
    }

    /// Layout version of the loaded file.
    pub fn version(&self) -> i64 {
        self.raw_version().unwrap_or(1)
    }

    fn raw_version(&self) -> Option<i64> {
        self.ini
            .get_from(None::<String>, VERSION_KEY)
            .and_then(|v| v.trim().parse().ok())
    }

    /// Value of a key; `section` is `None` for general settings.
    pub fn get(&self, section: Option<&str>, key: &str) -> ConfigResult<Option<Value>> {
        let Some(raw) = self.ini.get_from(section, key) else {
            return Ok(None);
        };
        literal_eval(raw).map(Some).map_err(|_| ConfigError::InvalidValue {
            key: qualified(section, key),
            expected: "a literal",
            found: raw.to_string(),
        })
    }

    pub fn set(&mut self, section: Option<&str>, key: &str, value: impl Into<Value>) {
        self.ini.with_section(section).set(key, value.into().repr());
    }

    /// Remove a key, returning its previous value.
    pub fn remove(&mut self, section: Option<&str>, key: &str) -> Option<Value> {
        self.ini
            .delete_from(section, key)
            .and_then(|raw| literal_eval(&raw).ok())
    }

    /// Keys of a section in file order.
    pub fn keys(&self, section: Option<&str>) -> Vec<String> {
        self.ini
            .section(section)
            .map(|props| props.iter().map(|(k, _)| k.to_string()).collect())
            .unwrap_or_default()
    }

    pub fn get_str(&self, section: Option<&str>, key: &str) -> ConfigResult<Option<String>> {
        self.typed(section, key, "a string", |v| v.as_str().map(str::to_string))
    }

    pub fn get_int(&self, section: Option<&str>, key: &str) -> ConfigResult<Option<i64>> {
        self.typed(section, key, "an integer", |v| match v {
            Value::Int(i) => Some(*i),
            _ => None,
        })
    }

    pub fn get_bool(&self, section: Option<&str>, key: &str) -> ConfigResult<Option<bool>> {
        self.typed(section, key, "a boolean", |v| match v {
            Value::Bool(b) => Some(*b),
            _ => None,
        })
    }

    /// A list of strings.
    pub fn get_list(&self, section: Option<&str>, key: &str) -> ConfigResult<Option<Vec<String>>> {
        self.typed(section, key, "a list of strings", |v| {
            v.as_list()?
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect()
        })
    }

    fn typed<T>(
        &self,
        section: Option<&str>,
        key: &str,
        expected: &'static str,
        convert: impl FnOnce(&Value) -> Option<T>,
    ) -> ConfigResult<Option<T>> {
        match self.get(section, key)? {
            None | Some(Value::None) => Ok(None),
            Some(value) => convert(&value).map(Some).ok_or_else(|| ConfigError::InvalidValue {
                key: qualified(section, key),
                expected,
                found: value.repr(),
            }),
        }
    }

    /// Namespace search paths and worker count.
    pub fn namespace_config(&self) -> ConfigResult<NamespaceConfig> {
        let mut config = NamespaceConfig::new();
        for dir in self.get_list(None, "spec path")?.unwrap_or_default() {
            config = config.with_spec_path(dir);
        }
        for dir in self.get_list(None, "pythonpath")?.unwrap_or_default() {
            config = config.with_module_path(dir);
        }
        if let Some(threads) = self.get_int(None, "worker threads")? {
            config = config.with_worker_threads(usize::try_from(threads).unwrap_or(0));
        }
        Ok(config)
    }

    /// Writer layout options.
    pub fn writer_config(&self) -> ConfigResult<WriterConfig> {
        let mut config = WriterConfig::new();
        if let Some(width) = self.get_int(None, "txt number of spaces")? {
            config = config.with_separator_width(positive(None, "txt number of spaces", width)?);
        }
        if let Some(cells) = self.get_int(None, "txt max cells")? {
            config = config.with_max_cells(positive(None, "txt max cells", cells)?);
        }
        Ok(config)
    }

    fn fill_defaults(&mut self) {
        for (section, key, value) in defaults() {
            if self.ini.get_from(section, key).is_none() {
                self.set(section, key, value);
            }
        }
    }

    /// Upgrade an older layout. Returns true if anything changed.
    fn migrate(&mut self) -> ConfigResult<bool> {
        let found = self.version();
        if found > SETTINGS_VERSION {
            return Err(ConfigError::TooNew {
                found,
                supported: SETTINGS_VERSION,
            });
        }
        if found == SETTINGS_VERSION {
            return Ok(false);
        }
        if found < 2 {
            self.migrate_pythonpath();
        }
        if found < 3 {
            self.migrate_runner_section();
        }
        self.set(None, VERSION_KEY, SETTINGS_VERSION);
        info!(from = found, to = SETTINGS_VERSION, "Migrated settings");
        Ok(true)
    }

    /// Version 1 stored `pythonpath` as one `;` or `:` separated string.
    fn migrate_pythonpath(&mut self) {
        let Some(Value::String(joined)) = self.get(None, "pythonpath").ok().flatten() else {
            return;
        };
        let dirs: Vec<Value> = joined
            .split([';', ':'])
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(Value::from)
            .collect();
        self.set(None, "pythonpath", Value::List(dirs));
    }

    /// Version 2 kept runner settings in their own plugin section.
    fn migrate_runner_section(&mut self) {
        let Some(section) = self.ini.delete(Some(LEGACY_RUNNER)) else {
            return;
        };
        for (key, value) in section.iter() {
            if self.ini.get_from(Some(TEST_RUNNER), key).is_none() {
                self.ini.with_section(Some(TEST_RUNNER)).set(key, value);
            }
        }
    }
}

fn qualified(section: Option<&str>, key: &str) -> String {
    match section {
        Some(section) => format!("{}.{}", section, key),
        None => key.to_string(),
    }
}

fn positive(section: Option<&str>, key: &str, value: i64) -> ConfigResult<usize> {
    usize::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: qualified(section, key),
            expected: "a positive integer",
            found: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Default tests ====================

    #[test]
    fn test_defaults_are_typed() {
        let settings = Settings::new();
        assert_eq!(settings.version(), SETTINGS_VERSION);
        assert_eq!(settings.get_int(None, "txt number of spaces").unwrap(), Some(4));
        assert_eq!(settings.get_bool(Some(GRID), "word wrap").unwrap(), Some(true));
        assert_eq!(
            settings.get_str(Some(TEST_RUNNER), "executable").unwrap().as_deref(),
            Some("robot")
        );
        assert_eq!(settings.get_list(None, "pythonpath").unwrap(), Some(Vec::new()));
    }

    // ==================== Value tests ====================

    #[test]
    fn test_multiline_string_round_trip() {
        let mut settings = Settings::new();
        settings.set(Some(TEST_RUNNER), "arguments", "--loglevel DEBUG\n--dryrun");
        let mut out = Vec::new();
        settings.ini.write_to_policy(&mut out, EscapePolicy::Nothing).unwrap();
        let text = String::from_utf8(out).unwrap();
        let loaded = Settings::from_ini_str(&text).unwrap();
        assert_eq!(
            loaded.get_str(Some(TEST_RUNNER), "arguments").unwrap().as_deref(),
            Some("--loglevel DEBUG\n--dryrun")
        );
    }

    #[test]
    fn test_dict_and_none_values() {
        let text = "settings_version = 3\n[Custom]\nmapping = {'a': 1, 'b': [True, None]}\nnothing = None\n";
        let settings = Settings::from_ini_str(text).unwrap();
        let mapping = settings.get(Some("Custom"), "mapping").unwrap().unwrap();
        assert!(mapping.is_dict());
        assert_eq!(mapping.get_str("a"), Some(&Value::Int(1)));
        assert_eq!(settings.get_int(Some("Custom"), "nothing").unwrap(), None);
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let text = "settings_version = 3\ntxt number of spaces = 'four'\n";
        let settings = Settings::from_ini_str(text).unwrap();
        let err = settings.get_int(None, "txt number of spaces").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { expected: "an integer", .. }));
        assert!(settings.writer_config().is_err());
    }

    #[test]
    fn test_unparsable_value_is_reported() {
        let text = "settings_version = 3\npythonpath = [unclosed\n";
        let settings = Settings::from_ini_str(text).unwrap();
        assert!(settings.get(None, "pythonpath").is_err());
    }

    // ==================== Migration tests ====================

    #[test]
    fn test_migrates_version_one() {
        let text = "pythonpath = '/opt/libs;/srv/keywords'\n[Plugin Test Runner]\nexecutable = 'pybot'\n";
        let settings = Settings::from_ini_str(text).unwrap();
        assert_eq!(settings.version(), SETTINGS_VERSION);
        assert_eq!(
            settings.get_list(None, "pythonpath").unwrap(),
            Some(vec!["/opt/libs".to_string(), "/srv/keywords".to_string()])
        );
        assert_eq!(
            settings.get_str(Some(TEST_RUNNER), "executable").unwrap().as_deref(),
            Some("pybot")
        );
        assert!(settings.keys(Some(LEGACY_RUNNER)).is_empty());
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let err = Settings::from_ini_str("settings_version = 99\n").unwrap_err();
        assert!(matches!(err, ConfigError::TooNew { found: 99, .. }));
    }

    // ==================== Conversion tests ====================

    #[test]
    fn test_namespace_and_writer_config() {
        let mut settings = Settings::new();
        settings.set(None, "pythonpath", Value::list([Value::from("/libs")]));
        settings.set(None, "txt number of spaces", 2i64);
        let ns = settings.namespace_config().unwrap();
        assert_eq!(ns.module_path, vec![PathBuf::from("/libs")]);
        let writer = settings.writer_config().unwrap();
        assert_eq!(writer.separator_width, 2);
    }
}

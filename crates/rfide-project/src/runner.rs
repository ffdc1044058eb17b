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

//! Command line for running selected tests with Robot Framework.
//!
//! The runner itself is outside this crate; it only builds the argv and
//! the argument file:
//!
//! ```text
//! <executable> --argumentfile <path> --listener <module>:<port>:<pause>
//!              --suite <suite> --test <test> ... <source>
//! ```
//!
//! The data source is the last element since Robot Framework reads options
//! before data sources.

use crate::error::{ConfigError, ConfigResult};
use crate::settings::{Settings, TEST_RUNNER};
use rfide_core::{RfError, RfResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Test listener reporting progress back to the IDE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    /// Listener module or file.
    pub module: String,
    pub port: u16,
    pub pause_on_failure: bool,
}

impl Listener {
    pub fn new(module: impl Into<String>, port: u16) -> Self {
        Self {
            module: module.into(),
            port,
            pause_on_failure: false,
        }
    }

    pub fn with_pause_on_failure(mut self, pause: bool) -> Self {
        self.pause_on_failure = pause;
        self
    }

    /// The `--listener` value.
    pub fn argument(&self) -> String {
        format!(
            "{}:{}:{}",
            self.module,
            self.port,
            if self.pause_on_failure { "True" } else { "False" }
        )
    }
}

/// A suite, or one test of it, selected for the run. Names are long names
/// such as `Root.Login.Valid Login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub suite: String,
    pub test: Option<String>,
}

impl Selection {
    pub fn suite(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            test: None,
        }
    }

    pub fn test(suite: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            test: Some(test.into()),
        }
    }
}

/// Runner executable and extra arguments, as stored in the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProfile {
    pub executable: String,
    /// Extra options, written to the argument file.
    pub arguments: Vec<String>,
}

impl Default for RunProfile {
    fn default() -> Self {
        Self {
            executable: "robot".to_string(),
            arguments: Vec::new(),
        }
    }
}

impl RunProfile {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_arguments<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = args.into_iter().map(Into::into).collect();
        self
    }

    /// Profile from the `[Test Runner]` section.
    pub fn from_settings(settings: &Settings) -> ConfigResult<Self> {
        let mut profile = Self::default();
        if let Some(executable) = settings.get_str(Some(TEST_RUNNER), "executable")? {
            profile.executable = executable;
        }
        if let Some(text) = settings.get_str(Some(TEST_RUNNER), "arguments")? {
            profile.arguments = split_arguments(&text).ok_or_else(|| ConfigError::InvalidValue {
                key: format!("{}.arguments", TEST_RUNNER),
                expected: "balanced quotes",
                found: text.clone(),
            })?;
        }
        Ok(profile)
    }

    /// Listener on the configured port, if one is set.
    pub fn listener_from_settings(settings: &Settings, module: &str) -> ConfigResult<Option<Listener>> {
        let port = settings.get_int(Some(TEST_RUNNER), "listener port")?.unwrap_or(0);
        if port <= 0 {
            return Ok(None);
        }
        let port = u16::try_from(port).map_err(|_| ConfigError::InvalidValue {
            key: format!("{}.listener port", TEST_RUNNER),
            expected: "a port number",
            found: port.to_string(),
        })?;
        let pause = settings
            .get_bool(Some(TEST_RUNNER), "pause on failure")?
            .unwrap_or(false);
        Ok(Some(Listener::new(module, port).with_pause_on_failure(pause)))
    }
}

/// One test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCommand {
    pub profile: RunProfile,
    pub argument_file: Option<PathBuf>,
    pub listener: Option<Listener>,
    pub selection: Vec<Selection>,
    /// Suite file or directory to run.
    pub source: PathBuf,
}

impl RunCommand {
    pub fn new(profile: RunProfile, source: impl Into<PathBuf>) -> Self {
        Self {
            profile,
            argument_file: None,
            listener: None,
            selection: Vec::new(),
            source: source.into(),
        }
    }

    pub fn with_argument_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.argument_file = Some(path.into());
        self
    }

    pub fn with_listener(mut self, listener: Listener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn select(mut self, selection: Selection) -> Self {
        self.selection.push(selection);
        self
    }

    /// The full command line, executable first.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.profile.executable.clone()];
        if let Some(path) = &self.argument_file {
            argv.push("--argumentfile".to_string());
            argv.push(path.display().to_string());
        }
        if let Some(listener) = &self.listener {
            argv.push("--listener".to_string());
            argv.push(listener.argument());
        }
        for selection in &self.selection {
            argv.push("--suite".to_string());
            argv.push(selection.suite.clone());
            if let Some(test) = &selection.test {
                argv.push("--test".to_string());
                argv.push(test.clone());
            }
        }
        argv.push(self.source.display().to_string());
        argv
    }

    /// Write the profile arguments to the argument file, if one is set.
    pub fn write_argument_file(&self) -> RfResult<()> {
        match &self.argument_file {
            Some(path) => write_argument_file(path, &self.profile.arguments),
            None => Ok(()),
        }
    }
}

/// Write `args` as a UTF-8 argument file, one token per line.
pub fn write_argument_file(path: &Path, args: &[String]) -> RfResult<()> {
    let mut text = String::new();
    for arg in args {
        text.push_str(arg);
        text.push('\n');
    }
    fs::write(path, text).map_err(|e| {
        RfError::io(format!("Cannot write argument file: {}", e)).with_path(path)
    })?;
    debug!(path = %path.display(), args = args.len(), "Wrote argument file");
    Ok(())
}

/// Split a command line into tokens. Single and double quotes group
/// characters, and a backslash escapes the next character outside single
/// quotes. `None` if a quote is not closed.
pub fn split_arguments(text: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_token = true;
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if quote.is_some() {
        return None;
    }
    if in_token {
        tokens.push(current);
    }
    Some(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(items: &[&str]) -> Vec<String> {
        items.iter().map(|i| i.to_string()).collect()
    }

    // ==================== argv tests ====================

    #[test]
    fn test_argv_order() {
        let command = RunCommand::new(RunProfile::new("robot"), "/p/suite")
            .with_argument_file("/tmp/args.txt")
            .with_listener(Listener::new("TestRunnerAgent.py", 5010).with_pause_on_failure(true))
            .select(Selection::test("Suite.Login", "Valid Login"))
            .select(Selection::suite("Suite.Logout"));
        assert_eq!(
            command.argv(),
            s(&[
                "robot",
                "--argumentfile",
                "/tmp/args.txt",
                "--listener",
                "TestRunnerAgent.py:5010:True",
                "--suite",
                "Suite.Login",
                "--test",
                "Valid Login",
                "--suite",
                "Suite.Logout",
                "/p/suite",
            ])
        );
    }

    #[test]
    fn test_minimal_argv() {
        let command = RunCommand::new(RunProfile::default(), "tests.robot");
        assert_eq!(command.argv(), s(&["robot", "tests.robot"]));
    }

    // ==================== Argument tests ====================

    #[test]
    fn test_split_arguments() {
        assert_eq!(
            split_arguments("--variable 'NAME:a b' -L DEBUG \"x\\\"y\""),
            Some(s(&["--variable", "NAME:a b", "-L", "DEBUG", "x\"y"]))
        );
        assert_eq!(split_arguments("  "), Some(Vec::new()));
        assert_eq!(split_arguments("''"), Some(s(&[""])));
        assert_eq!(split_arguments("'open"), None);
    }

    #[test]
    fn test_argument_file_one_token_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("args.txt");
        let command = RunCommand::new(
            RunProfile::new("robot").with_arguments(["--variable", "GREETING:hyvää päivää"]),
            "suite",
        )
        .with_argument_file(&path);
        command.write_argument_file().unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "--variable\nGREETING:hyvää päivää\n");
    }

    #[test]
    fn test_profile_from_settings() {
        let mut settings = Settings::new();
        settings.set(Some(TEST_RUNNER), "executable", "pabot");
        settings.set(Some(TEST_RUNNER), "arguments", "--processes 4 --outputdir 'out dir'");
        settings.set(Some(TEST_RUNNER), "listener port", 5010i64);
        let profile = RunProfile::from_settings(&settings).unwrap();
        assert_eq!(profile.executable, "pabot");
        assert_eq!(profile.arguments, s(&["--processes", "4", "--outputdir", "out dir"]));
        let listener = RunProfile::listener_from_settings(&settings, "agent.py").unwrap();
        assert_eq!(listener.map(|l| l.argument()), Some("agent.py:5010:False".to_string()));
    }
}

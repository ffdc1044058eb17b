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

//! Editing layer of the IDE: open files, undoable commands and change
//! events.
//!
//! - [`Project`] owns the open files, their undo histories, the
//!   [`Namespace`](rfide_namespace::Namespace) and the [`EventBus`]
//! - [`commands`] are the only way to change a file; each returns its
//!   inverse for undo
//! - [`controller`] gives read-only views for UI code
//! - [`watcher`] detects files changed on disk and reloads them
//! - [`settings`], [`exclude`] and [`runner`] cover persisted settings, the
//!   exclude list and the test runner command line
//!
//! # Example
//!
//! ```no_run
//! use rfide_namespace::ItemRef;
//! use rfide_project::commands::{AddTestCase, ChangeCellValue, Target};
//! use rfide_project::{Project, ProjectConfig};
//!
//! let mut project = Project::new(ProjectConfig::new()).unwrap();
//! let file = project.open_file("tests/login.robot").unwrap();
//! project.execute(file, AddTestCase::new("Valid Login")).unwrap();
//! let test = Target::Item(file, ItemRef::Test(0));
//! project.execute(test, ChangeCellValue::new(0, 0, "Log")).unwrap();
//! project.undo(test).unwrap();
//! project.save(file).unwrap();
//! ```

pub mod commands;
pub mod controller;
mod error;
pub mod events;
pub mod exclude;
mod project;
pub mod runner;
pub mod settings;
pub mod watcher;

pub use commands::{Command, CommandContext, CommandKind, History, Target};
pub use controller::{FileController, ItemController};
pub use error::{CommandError, CommandResult, ConfigError, ConfigResult};
pub use events::{topic_matches, EventBus, RideEvent, Subscription};
pub use exclude::ExcludeList;
pub use project::{OpenFile, Project, ProjectConfig};
pub use runner::{Listener, RunCommand, RunProfile, Selection};
pub use settings::Settings;
pub use watcher::DiskStamp;

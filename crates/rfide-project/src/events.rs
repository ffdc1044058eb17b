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

//! Publish/subscribe bus for model change events.
//!
//! Topics are dot-separated (`ride.datafile.changed`). A subscription to a
//! topic also receives every event below it, so a handler on `ride.datafile`
//! sees `ride.datafile.changed` and `ride.datafile.saved`, and a handler on
//! the empty topic sees everything. Delivery is synchronous, in subscription
//! order.

use parking_lot::Mutex;
use rfide_namespace::{FileId, ItemRef};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// A change to the project model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RideEvent {
    /// A file was opened.
    FileOpened { file: FileId, path: Option<PathBuf> },
    /// A file was closed.
    FileRemoved { file: FileId, path: Option<PathBuf> },
    /// A file was saved to disk.
    FileSaved { file: FileId, path: PathBuf },
    /// A file was re-read from disk.
    DataFileChanged { file: FileId, path: PathBuf },
    /// The body of a test or keyword changed.
    StepsChanged { file: FileId, item: ItemRef },
    /// A test or keyword was added.
    ItemAdded { file: FileId, item: ItemRef, name: String },
    /// A test or keyword was removed.
    ItemRemoved { file: FileId, item: ItemRef, name: String },
    /// A test or keyword was renamed.
    ItemRenamed { file: FileId, item: ItemRef, old: String, new: String },
    /// Tests or keywords were reordered.
    ItemsReordered { file: FileId },
    /// A file or item setting changed.
    SettingChanged { file: FileId, item: Option<ItemRef>, name: String },
    /// The variable table changed.
    VariablesChanged { file: FileId },
    /// An import was added, removed or edited.
    ImportsChanged { file: FileId },
    /// Calls to a keyword were renamed across the project.
    KeywordRenamed { old: String, new: String },
}

impl RideEvent {
    /// Hierarchical topic of the event.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::FileOpened { .. } => "ride.datafile.opened",
            Self::FileRemoved { .. } => "ride.datafile.removed",
            Self::FileSaved { .. } => "ride.datafile.saved",
            Self::DataFileChanged { .. } => "ride.datafile.changed",
            Self::StepsChanged { .. } => "ride.item.steps.changed",
            Self::ItemAdded { .. } => "ride.item.added",
            Self::ItemRemoved { .. } => "ride.item.removed",
            Self::ItemRenamed { .. } => "ride.item.renamed",
            Self::ItemsReordered { .. } => "ride.item.reordered",
            Self::SettingChanged { .. } => "ride.setting.changed",
            Self::VariablesChanged { .. } => "ride.variables.changed",
            Self::ImportsChanged { .. } => "ride.imports.changed",
            Self::KeywordRenamed { .. } => "ride.keyword.renamed",
        }
    }

    /// File the event is about, if any.
    pub fn file(&self) -> Option<FileId> {
        match self {
            Self::FileOpened { file, .. }
            | Self::FileRemoved { file, .. }
            | Self::FileSaved { file, .. }
            | Self::DataFileChanged { file, .. }
            | Self::StepsChanged { file, .. }
            | Self::ItemAdded { file, .. }
            | Self::ItemRemoved { file, .. }
            | Self::ItemRenamed { file, .. }
            | Self::ItemsReordered { file }
            | Self::SettingChanged { file, .. }
            | Self::VariablesChanged { file }
            | Self::ImportsChanged { file } => Some(*file),
            Self::KeywordRenamed { .. } => None,
        }
    }
}

/// True if `topic` is `prefix` or lies below it.
pub fn topic_matches(prefix: &str, topic: &str) -> bool {
    prefix.is_empty()
        || topic == prefix
        || (topic.starts_with(prefix) && topic.as_bytes().get(prefix.len()) == Some(&b'.'))
}

/// Event handler.
pub type EventHandler = Arc<dyn Fn(&RideEvent) + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

struct Listener {
    id: u64,
    topic: String,
    handler: EventHandler,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<Listener>,
}

/// Synchronous topic-based event bus.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Listeners>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.listeners.lock().entries.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic` and everything below it.
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&RideEvent) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock();
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners.entries.push(Listener {
            id,
            topic: topic.into(),
            handler: Arc::new(handler),
        });
        Subscription(id)
    }

    /// Remove a subscription. Returns false if it was already removed.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.entries.len();
        listeners.entries.retain(|l| l.id != subscription.0);
        listeners.entries.len() != before
    }

    /// Deliver `event` to every matching handler.
    ///
    /// Handlers run without the bus lock held, so they may subscribe or
    /// unsubscribe.
    pub fn publish(&self, event: &RideEvent) {
        let topic = event.topic();
        let handlers: Vec<EventHandler> = self
            .listeners
            .lock()
            .entries
            .iter()
            .filter(|l| topic_matches(&l.topic, topic))
            .map(|l| Arc::clone(&l.handler))
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    /// Deliver events in order.
    pub fn publish_all(&self, events: &[RideEvent]) {
        for event in events {
            self.publish(event);
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.listeners.lock().entries.len()
    }
}

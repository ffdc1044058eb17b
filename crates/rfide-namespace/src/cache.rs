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

//! Shared cache of imported files.
//!
//! Resource files, variable files and library specs are loaded once per
//! canonical path and shared by every file that imports them. Loads run on
//! a worker pool; finished loads are stored in the cache and announced on an
//! inbox that the owner drains before answering queries. Failed loads are
//! cached with their error until the file changes on disk.
//!
//! # Thread Safety
//!
//! All state sits behind one `parking_lot::Mutex`. Workers only take the
//! lock to store a finished result.

use crate::loader::{load_path, normalize_path, Loaded};
use parking_lot::Mutex;
use rfide_core::{DataFile, RfError, RfResult};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::SystemTime;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, warn};

pub type LoadResult = Result<Loaded, RfError>;

/// Identifies the file on whose behalf a load was started.
pub type ImporterId = u64;

/// File identity on disk at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    modified: Option<SystemTime>,
    size: u64,
}

fn stamp(path: &Path) -> Option<Stamp> {
    let meta = std::fs::metadata(path).ok()?;
    Some(Stamp {
        modified: meta.modified().ok(),
        size: meta.len(),
    })
}

enum Entry {
    Loading {
        id: u64,
        waiters: Vec<oneshot::Sender<LoadResult>>,
        cancel: Arc<AtomicBool>,
        importers: HashSet<ImporterId>,
    },
    Ready {
        result: LoadResult,
        stamp: Option<Stamp>,
    },
}

/// State of one cache entry as seen by a query.
#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Ready(Loaded),
    Failed(RfError),
}

impl From<LoadResult> for LoadState {
    fn from(result: LoadResult) -> Self {
        match result {
            Ok(loaded) => Self::Ready(loaded),
            Err(err) => Self::Failed(err),
        }
    }
}

/// A finished load, as delivered to the inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub path: PathBuf,
    pub ok: bool,
}

/// Cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    /// Requests answered by an existing entry.
    pub hits: u64,
    /// Requests that started a new load.
    pub misses: u64,
    /// Loads restarted because the file changed on disk.
    pub reloads: u64,
    pub loaded: u64,
    pub failed: u64,
}

struct CacheState {
    entries: HashMap<PathBuf, Entry>,
    next_id: u64,
    graph_version: u64,
    stats: CacheStatistics,
}

struct Shared {
    state: Mutex<CacheState>,
    inbox: Mutex<Vec<Completed>>,
}

impl Shared {
    fn complete(&self, path: PathBuf, id: u64, result: LoadResult, stamp: Option<Stamp>) {
        let ok = result.is_ok();
        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let waiters = match state.entries.get_mut(&path) {
                Some(Entry::Loading {
                    id: current,
                    waiters,
                    cancel,
                    ..
                }) if *current == id && !cancel.load(Ordering::Acquire) => std::mem::take(waiters),
                _ => {
                    debug!(path = %path.display(), "discarding superseded load");
                    return;
                }
            };
            match &result {
                Ok(_) => state.stats.loaded += 1,
                Err(err) => {
                    state.stats.failed += 1;
                    warn!(path = %path.display(), error = %err, "import failed to load");
                }
            }
            for waiter in waiters {
                let _ = waiter.send(result.clone());
            }
            state.entries.insert(path.clone(), Entry::Ready { result, stamp });
        }
        self.inbox.lock().push(Completed { path, ok });
    }
}

/// Cache of imported files keyed by canonical path.
pub struct ImportCache {
    shared: Arc<Shared>,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for ImportCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportCache")
            .field("entries", &self.len())
            .field("graph_version", &self.graph_version())
            .finish()
    }
}

impl ImportCache {
    /// Create a cache loading on `threads` workers (0 picks the CPU count).
    pub fn new(threads: usize) -> RfResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("rfide-loader-{}", i))
            .build()
            .map_err(|e| RfError::config(format!("Starting import workers failed: {}", e)))?;
        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(CacheState {
                    entries: HashMap::new(),
                    next_id: 0,
                    graph_version: 0,
                    stats: CacheStatistics::default(),
                }),
                inbox: Mutex::new(Vec::new()),
            }),
            pool,
        })
    }

    /// Start loading `path` unless it is cached, and return a handle to the
    /// result.
    pub fn get_or_load(&self, path: &Path, importer: Option<ImporterId>) -> LoadHandle {
        let path = normalize_path(path);
        let (tx, rx) = oneshot::channel();
        self.ensure(&path, importer, Some(tx));
        LoadHandle { path, rx }
    }

    /// Current state of `path`, starting a load when needed. Never blocks on
    /// I/O beyond a metadata check.
    pub fn request(&self, path: &Path, importer: Option<ImporterId>) -> LoadState {
        self.ensure(&normalize_path(path), importer, None)
    }

    /// Current state of `path` without starting a load.
    pub fn peek(&self, path: &Path) -> Option<LoadState> {
        let state = self.shared.state.lock();
        state.entries.get(&normalize_path(path)).map(|entry| match entry {
            Entry::Loading { .. } => LoadState::Loading,
            Entry::Ready { result, .. } => LoadState::from(result.clone()),
        })
    }

    /// Wait for an entry that was already requested. `None` if nothing was
    /// ever requested for `path`.
    pub fn await_cache(&self, path: &Path) -> Option<LoadHandle> {
        let path = normalize_path(path);
        let mut state = self.shared.state.lock();
        let (tx, rx) = oneshot::channel();
        match state.entries.get_mut(&path)? {
            Entry::Loading { waiters, .. } => waiters.push(tx),
            Entry::Ready { result, .. } => {
                let _ = tx.send(result.clone());
            }
        }
        Some(LoadHandle { path, rx })
    }

    fn ensure(
        &self,
        path: &Path,
        importer: Option<ImporterId>,
        waiter: Option<oneshot::Sender<LoadResult>>,
    ) -> LoadState {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        let reload = match state.entries.get_mut(path) {
            Some(Entry::Loading {
                waiters, importers, ..
            }) => {
                waiters.extend(waiter);
                importers.extend(importer);
                state.stats.hits += 1;
                return LoadState::Loading;
            }
            Some(Entry::Ready { result, stamp: loaded }) => {
                if *loaded == stamp(path) {
                    state.stats.hits += 1;
                    if let Some(waiter) = waiter {
                        let _ = waiter.send(result.clone());
                    }
                    return LoadState::from(result.clone());
                }
                true
            }
            None => false,
        };

        if reload {
            debug!(path = %path.display(), "file changed on disk, reloading");
            state.stats.reloads += 1;
            state.graph_version += 1;
        } else {
            state.stats.misses += 1;
        }
        let id = state.next_id;
        state.next_id += 1;
        let cancel = Arc::new(AtomicBool::new(false));
        state.entries.insert(
            path.to_path_buf(),
            Entry::Loading {
                id,
                waiters: waiter.into_iter().collect(),
                cancel: Arc::clone(&cancel),
                importers: importer.into_iter().collect(),
            },
        );
        drop(guard);

        let shared = Arc::clone(&self.shared);
        let path = path.to_path_buf();
        self.pool.spawn(move || {
            if cancel.load(Ordering::Acquire) {
                return;
            }
            let stamp = stamp(&path);
            let result = load_path(&path);
            shared.complete(path, id, result, stamp);
        });
        LoadState::Loading
    }

    /// Take finished loads from the inbox. Any finished load advances the
    /// import graph version.
    pub fn drain(&self) -> Vec<Completed> {
        let done = std::mem::take(&mut *self.shared.inbox.lock());
        if !done.is_empty() {
            self.shared.state.lock().graph_version += 1;
            debug!(count = done.len(), "drained finished imports");
        }
        done
    }

    /// Replace a cached resource with an in-memory version, e.g. after an
    /// edit in the IDE.
    pub fn update(&self, path: &Path, file: Arc<DataFile>) {
        let path = normalize_path(path);
        let result: LoadResult = Ok(Loaded::Resource(file));
        let mut state = self.shared.state.lock();
        if let Some(Entry::Loading { waiters, cancel, .. }) = state.entries.get_mut(&path) {
            cancel.store(true, Ordering::Release);
            for waiter in waiters.drain(..) {
                let _ = waiter.send(result.clone());
            }
        }
        let stamp = stamp(&path);
        state.entries.insert(path.clone(), Entry::Ready { result, stamp });
        state.graph_version += 1;
        debug!(path = %path.display(), "updated cached resource");
    }

    /// Drop the entry for `path`; the next request loads it again.
    pub fn invalidate(&self, path: &Path) {
        let path = normalize_path(path);
        let mut state = self.shared.state.lock();
        if let Some(entry) = state.entries.remove(&path) {
            if let Entry::Loading { cancel, .. } = entry {
                cancel.store(true, Ordering::Release);
            }
            state.graph_version += 1;
            debug!(path = %path.display(), "invalidated cached import");
        }
    }

    /// Forget `importer` as an interested party. Loads nobody else waits
    /// for are cancelled and their pending handles fail.
    pub fn release(&self, importer: ImporterId) {
        let mut state = self.shared.state.lock();
        state.entries.retain(|path, entry| match entry {
            Entry::Loading {
                importers, cancel, ..
            } => {
                if importers.remove(&importer) && importers.is_empty() {
                    cancel.store(true, Ordering::Release);
                    debug!(path = %path.display(), "cancelled import load");
                    false
                } else {
                    true
                }
            }
            Entry::Ready { .. } => true,
        });
    }

    /// Version advanced on every change visible to namespace queries.
    pub fn graph_version(&self) -> u64 {
        self.shared.state.lock().graph_version
    }

    pub fn statistics(&self) -> CacheStatistics {
        self.shared.state.lock().stats.clone()
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut state = self.shared.state.lock();
        for entry in state.entries.values() {
            if let Entry::Loading { cancel, .. } = entry {
                cancel.store(true, Ordering::Release);
            }
        }
        state.entries.clear();
        state.graph_version += 1;
    }
}

fn cancelled(path: &Path) -> RfError {
    RfError::import(format!("Loading '{}' was cancelled", path.display())).with_path(path)
}

/// Pending result of a load. Await it, or use [`LoadHandle::wait`] outside
/// an async runtime.
#[derive(Debug)]
pub struct LoadHandle {
    path: PathBuf,
    rx: oneshot::Receiver<LoadResult>,
}

impl LoadHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block the current thread until the load finishes. Must not be called
    /// from inside an async runtime.
    pub fn wait(self) -> LoadResult {
        let path = self.path;
        self.rx.blocking_recv().unwrap_or_else(|_| Err(cancelled(&path)))
    }

    /// The result if the load has finished.
    pub fn try_result(&mut self) -> Option<LoadResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(cancelled(&self.path))),
        }
    }
}

impl Future for LoadHandle {
    type Output = LoadResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(cancelled(&self.path))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn cache() -> ImportCache {
        ImportCache::new(2).unwrap()
    }

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    // ==================== Loading tests ====================

    #[test]
    fn test_load_and_hit() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.resource", "*** Keywords ***\nKW\n    No Operation\n");
        let cache = cache();

        let loaded = cache.get_or_load(&path, None).wait().unwrap();
        assert_eq!(loaded.as_resource().unwrap().keywords.items[0].name, "KW");
        assert_eq!(cache.drain().len(), 1);

        assert!(matches!(cache.request(&path, None), LoadState::Ready(_)));
        let stats = cache.statistics();
        assert_eq!((stats.misses, stats.hits, stats.loaded), (1, 1, 1));
    }

    #[test]
    fn test_shared_instance() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.resource", "*** Keywords ***\nKW\n    No Operation\n");
        let cache = cache();
        let first = cache.get_or_load(&path, None).wait().unwrap();
        let second = cache.get_or_load(&path, None).wait().unwrap();
        assert!(Arc::ptr_eq(first.as_resource().unwrap(), second.as_resource().unwrap()));
    }

    #[test]
    fn test_negative_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.resource");
        let cache = cache();

        let err = cache.get_or_load(&path, None).wait().unwrap_err();
        assert_eq!(err.kind, rfide_core::RfErrorKind::Import);
        assert!(matches!(cache.peek(&path), Some(LoadState::Failed(_))));
        assert!(matches!(cache.request(&path, None), LoadState::Failed(_)));
        assert_eq!(cache.statistics().failed, 1);
    }

    #[test]
    fn test_reload_on_disk_change() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "v.yaml", "a: 1\n");
        let cache = cache();
        cache.get_or_load(&path, None).wait().unwrap();
        cache.drain();

        write(dir.path(), "v.yaml", "a: 1\nb: 2\n");
        let loaded = cache.get_or_load(&path, None).wait().unwrap();
        assert_eq!(loaded.as_variables().unwrap().len(), 2);
        assert_eq!(cache.statistics().reloads, 1);
    }

    // ==================== Versioning tests ====================

    #[test]
    fn test_graph_version_advances() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.resource", "*** Keywords ***\nKW\n    No Operation\n");
        let cache = cache();
        let v0 = cache.graph_version();

        cache.get_or_load(&path, None).wait().unwrap();
        cache.drain();
        let v1 = cache.graph_version();
        assert!(v1 > v0);

        cache.update(&path, Arc::new(DataFile::default()));
        let v2 = cache.graph_version();
        assert!(v2 > v1);

        cache.invalidate(&path);
        assert!(cache.graph_version() > v2);
        assert!(cache.peek(&path).is_none());
        assert!(cache.await_cache(&path).is_none());
    }

    #[test]
    fn test_update_replaces_resource() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.resource", "*** Keywords ***\nKW\n    No Operation\n");
        let cache = cache();
        cache.get_or_load(&path, None).wait().unwrap();

        let mut edited = DataFile::default();
        edited.source = Some(path.clone());
        cache.update(&path, Arc::new(edited));
        let loaded = cache.await_cache(&path).unwrap().wait().unwrap();
        assert!(loaded.as_resource().unwrap().keywords.items.is_empty());
    }

    // ==================== Handle tests ====================

    #[test]
    fn test_try_result_and_release() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.json", "{}");
        let cache = cache();
        let mut handle = cache.get_or_load(&path, Some(7));
        let mut result = None;
        for _ in 0..200 {
            result = handle.try_result();
            if result.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(result.unwrap().is_ok());
        // Finished entries survive release.
        cache.release(7);
        assert!(cache.peek(&path).is_some());
    }

    #[test]
    fn test_handle_is_future() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.json", "{\"k\": \"v\"}");
        let cache = cache();
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let loaded = runtime.block_on(cache.get_or_load(&path, None)).unwrap();
        assert_eq!(loaded.as_variables().unwrap()[0].0, "${k}");
    }
}

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

//! Keyword and variable lookup across the import graph.
//!
//! A [`Namespace`] answers what is visible at a point of a file: keyword
//! suggestions, keyword resolution, variables in scope, import status and
//! diagnostics. Imports are followed breadth-first through resource files;
//! each resource is visited once, so cyclic imports terminate.
//!
//! Queries never block on I/O. Imports that are still loading are reported
//! as [`ImportState::Loading`] and show up in later answers once the worker
//! pool has finished them. The derived import index is memoized per file
//! by `(file version, import graph version)`.

use crate::cache::{ImportCache, ImporterId, LoadState};
use crate::libspec::{standard_library, LibrarySpec, BUILTIN};
use crate::loader::{locate_library, resolve_import_path, LibraryLocation, Loaded};
use crate::search::find_variables;
use crate::varfile::VariableFileData;
use crate::variables::{VariableInfo, VariableSource, VariableStore};
use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};
use rfide_core::model::{Step, VariableTable};
use rfide_core::names::{eq_normalized, normalize, normalize_variable, strip_assign_mark};
use rfide_core::{
    DataFile, Diagnostic, DiagnosticKind, ImportKind, Language, RfError, RfResult, UserKeyword,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Identity of an open file, stable while the file stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u64);

/// Namespace configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceConfig {
    /// Directories searched for libdoc `<Name>.xml` spec files.
    pub spec_path: Vec<PathBuf>,
    /// Directories searched for resource and variable files after the
    /// importing file's own directory.
    pub module_path: Vec<PathBuf>,
    /// Worker threads for background loading; 0 uses the CPU count.
    pub worker_threads: usize,
}

impl NamespaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spec_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spec_path.push(dir.into());
        self
    }

    pub fn with_module_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.module_path.push(dir.into());
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }
}

/// The file a query is about.
#[derive(Debug, Clone, Copy)]
pub struct FileScope<'a> {
    pub id: FileId,
    /// Bumped by the owner on every change to the file.
    pub version: u64,
    pub file: &'a DataFile,
}

impl<'a> FileScope<'a> {
    pub fn new(id: FileId, version: u64, file: &'a DataFile) -> Self {
        Self { id, version, file }
    }
}

/// A test case or user keyword of a file, by table index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRef {
    Test(usize),
    Keyword(usize),
}

/// Position inside a test or keyword. `row` is the index of the step the
/// cursor is on; `None` means the whole body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub item: ItemRef,
    pub row: Option<usize>,
}

impl Cursor {
    pub fn new(item: ItemRef) -> Self {
        Self { item, row: None }
    }

    pub fn at_row(item: ItemRef, row: usize) -> Self {
        Self { item, row: Some(row) }
    }
}

/// Where a keyword is defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeywordSource {
    CurrentFile,
    Resource(PathBuf),
    /// A library, by its real name.
    Library(String),
}

/// A visible keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordInfo {
    pub name: String,
    pub source: KeywordSource,
    /// Prefix for qualified calls: resource file stem, library name or alias.
    pub qualifier: String,
    pub args: Vec<String>,
    pub doc: String,
}

impl KeywordInfo {
    pub fn is_user_keyword(&self) -> bool {
        !matches!(self.source, KeywordSource::Library(_))
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.qualifier, self.name)
    }

    pub fn short_doc(&self) -> &str {
        self.doc.lines().next().unwrap_or("").trim()
    }

    fn user(kw: &UserKeyword, source: KeywordSource, qualifier: &str) -> Self {
        Self {
            name: kw.name.clone(),
            source,
            qualifier: qualifier.to_string(),
            args: kw.arguments().to_vec(),
            doc: kw.documentation().map(|d| d.text()).unwrap_or_default(),
        }
    }
}

/// Suggestion source, in rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceRank {
    /// Arguments and loop variables of the item at the cursor.
    Local,
    CurrentFile,
    Resource,
    Library,
    BuiltIn,
}

/// One completion candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion {
    Variable(VariableInfo),
    Keyword(KeywordInfo),
}

impl Suggestion {
    pub fn name(&self) -> &str {
        match self {
            Self::Variable(var) => &var.name,
            Self::Keyword(kw) => &kw.name,
        }
    }

    pub fn as_keyword(&self) -> Option<&KeywordInfo> {
        match self {
            Self::Keyword(kw) => Some(kw),
            Self::Variable(_) => None,
        }
    }
}

/// Outcome of keyword resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Keyword(KeywordInfo),
    Ambiguous(Vec<KeywordInfo>),
    NotFound,
}

impl Resolution {
    pub fn keyword(&self) -> Option<&KeywordInfo> {
        match self {
            Self::Keyword(kw) => Some(kw),
            _ => None,
        }
    }
}

/// State of one import.
#[derive(Debug, Clone)]
pub enum ImportState {
    Resolved,
    Loading,
    Failed(RfError),
}

/// An import of the file or of one of its resources.
#[derive(Debug, Clone)]
pub struct ImportStatus {
    /// File containing the import statement.
    pub importer: Option<PathBuf>,
    /// True for imports written in the queried file itself.
    pub direct: bool,
    pub kind: ImportKind,
    /// Name as written.
    pub name: String,
    /// Name after variable replacement.
    pub resolved_name: String,
    pub path: Option<PathBuf>,
    pub state: ImportState,
}

/// A step whose keyword resolves to a given keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordUsage {
    pub source: Option<PathBuf>,
    pub item: ItemRef,
    /// Step indices from the item body down into loop bodies.
    pub steps: Vec<usize>,
}

impl KeywordUsage {
    /// Index of the top-level step.
    pub fn row(&self) -> usize {
        self.steps.first().copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
struct Ranked {
    rank: SourceRank,
    /// Position of the defining file or library in import order.
    group: usize,
    info: KeywordInfo,
    pattern: Option<Regex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchKind {
    Exact,
    Embedded,
}

impl Ranked {
    fn new(rank: SourceRank, group: usize, info: KeywordInfo) -> Self {
        let pattern = embedded_pattern(&info.name);
        Self {
            rank,
            group,
            info,
            pattern,
        }
    }

    fn matches(&self, name: &str) -> Option<MatchKind> {
        if eq_normalized(&self.info.name, name) {
            return Some(MatchKind::Exact);
        }
        match &self.pattern {
            Some(pattern) if pattern.is_match(name) => Some(MatchKind::Embedded),
            _ => None,
        }
    }
}

/// Regex for a keyword name with embedded arguments, e.g.
/// `Open ${page} Page` or `Wait ${n:\d+} Seconds`.
fn embedded_pattern(name: &str) -> Option<Regex> {
    let vars = find_variables(name);
    if vars.is_empty() {
        return None;
    }
    let mut pattern = String::from("^");
    let mut last = 0;
    for var in vars {
        pattern.push_str(&regex::escape(&name[last..var.start]));
        match var.body.split_once(':') {
            Some((_, custom)) => {
                pattern.push('(');
                pattern.push_str(custom);
                pattern.push(')');
            }
            None => pattern.push_str("(.*?)"),
        }
        last = var.end;
    }
    pattern.push_str(&regex::escape(&name[last..]));
    pattern.push('$');
    RegexBuilder::new(&pattern).case_insensitive(true).build().ok()
}

#[derive(Debug, Clone)]
struct ResourceImport {
    path: PathBuf,
    file: Arc<DataFile>,
}

#[derive(Debug, Clone)]
struct VariableFileImport {
    path: PathBuf,
    variables: Arc<VariableFileData>,
}

/// Everything the imports of one file contribute.
#[derive(Debug, Default)]
struct ImportIndex {
    resources: Vec<ResourceImport>,
    variable_files: Vec<VariableFileImport>,
    /// Resource, library and BuiltIn keywords in rank order.
    keywords: Vec<Ranked>,
    statuses: Vec<ImportStatus>,
}

impl ImportIndex {
    fn is_complete(&self) -> bool {
        self.statuses
            .iter()
            .all(|s| matches!(s.state, ImportState::Resolved))
    }
}

struct Memo {
    version: u64,
    graph_version: u64,
    index: Arc<ImportIndex>,
}

/// Keyword and variable resolver over a shared [`ImportCache`].
pub struct Namespace {
    config: NamespaceConfig,
    cache: Arc<ImportCache>,
    memo: Mutex<HashMap<FileId, Memo>>,
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}

impl Namespace {
    /// Create a namespace with its own import cache.
    pub fn new(config: NamespaceConfig) -> RfResult<Self> {
        let cache = Arc::new(ImportCache::new(config.worker_threads)?);
        Ok(Self::with_cache(config, cache))
    }

    /// Create a namespace over an existing cache.
    pub fn with_cache(config: NamespaceConfig, cache: Arc<ImportCache>) -> Self {
        Self {
            config,
            cache,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &NamespaceConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ImportCache> {
        &self.cache
    }

    /// Drop memoized state for a closed file and cancel loads started only
    /// on its behalf.
    pub fn forget(&self, id: FileId) {
        self.memo.lock().remove(&id);
        self.cache.release(id.0);
    }

    fn index(&self, scope: &FileScope<'_>) -> Arc<ImportIndex> {
        self.cache.drain();
        let graph_version = self.cache.graph_version();
        if let Some(memo) = self.memo.lock().get(&scope.id) {
            if memo.version == scope.version && memo.graph_version == graph_version {
                return Arc::clone(&memo.index);
            }
        }
        let index = Arc::new(self.build_index(scope));
        debug!(
            file = ?scope.file.source,
            version = scope.version,
            graph_version,
            resources = index.resources.len(),
            keywords = index.keywords.len(),
            "rebuilt import index"
        );
        self.memo.lock().insert(
            scope.id,
            Memo {
                version: scope.version,
                graph_version,
                index: Arc::clone(&index),
            },
        );
        index
    }

    fn build_index(&self, scope: &FileScope<'_>) -> ImportIndex {
        let importer = scope.id.0;
        let mut index = ImportIndex::default();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut libraries: Vec<(String, Arc<LibrarySpec>)> = Vec::new();
        if let Some(source) = &scope.file.source {
            visited.insert(crate::loader::normalize_path(source));
        }

        let mut queue: VecDeque<Arc<DataFile>> = VecDeque::new();
        self.visit_imports(scope.file, true, importer, &mut index, &mut visited, &mut libraries, &mut queue);
        while let Some(file) = queue.pop_front() {
            self.visit_imports(&file, false, importer, &mut index, &mut visited, &mut libraries, &mut queue);
        }

        let mut keywords = Vec::new();
        for (group, res) in index.resources.iter().enumerate() {
            let qualifier = file_stem(&res.path);
            for kw in &res.file.keywords.items {
                let info = KeywordInfo::user(kw, KeywordSource::Resource(res.path.clone()), &qualifier);
                keywords.push(Ranked::new(SourceRank::Resource, group, info));
            }
        }
        for (group, (qualifier, lib)) in libraries.iter().enumerate() {
            keywords.extend(library_keywords(lib, qualifier, SourceRank::Library, group));
        }
        if let Some(builtin) = standard_library(BUILTIN) {
            keywords.extend(library_keywords(&builtin, BUILTIN, SourceRank::BuiltIn, 0));
        }
        index.keywords = keywords;
        index
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_imports(
        &self,
        file: &DataFile,
        direct: bool,
        importer: ImporterId,
        index: &mut ImportIndex,
        visited: &mut HashSet<PathBuf>,
        libraries: &mut Vec<(String, Arc<LibrarySpec>)>,
        queue: &mut VecDeque<Arc<DataFile>>,
    ) {
        let base = file.directory();
        let store = import_store(file, &index.variable_files);

        for import in file.settings.imports() {
            let mut status = ImportStatus {
                importer: file.source.clone(),
                direct,
                kind: import.kind,
                name: import.name.clone(),
                resolved_name: import.name.clone(),
                path: None,
                state: ImportState::Resolved,
            };
            let (name, errors) = store.resolve_lenient(&import.name);
            status.resolved_name = name.clone();
            if let Some(err) = errors.first() {
                status.state = ImportState::Failed(RfError::import(format!(
                    "Resolving {} import '{}' failed: {}",
                    import.kind, import.name, err
                )));
                index.statuses.push(status);
                continue;
            }

            match import.kind {
                ImportKind::Library => {
                    let qualifier = import
                        .alias
                        .as_ref()
                        .map(|a| store.resolve_lenient(&a.name).0)
                        .unwrap_or_else(|| name.clone());
                    match locate_library(&name, base, &self.config.spec_path) {
                        Some(LibraryLocation::Standard(lib_name)) => {
                            if let Some(lib) = standard_library(&lib_name) {
                                if lib.name != BUILTIN || import.alias.is_some() {
                                    add_library(libraries, qualifier, lib);
                                }
                            }
                        }
                        Some(LibraryLocation::Spec(path)) => {
                            status.path = Some(path.clone());
                            status.state = match self.cache.request(&path, Some(importer)) {
                                LoadState::Ready(Loaded::Library(lib)) => {
                                    add_library(libraries, qualifier, lib);
                                    ImportState::Resolved
                                }
                                LoadState::Ready(_) => ImportState::Failed(
                                    RfError::import(format!("'{}' is not a library spec", path.display()))
                                        .with_path(&path),
                                ),
                                LoadState::Loading => ImportState::Loading,
                                LoadState::Failed(err) => ImportState::Failed(err),
                            };
                        }
                        None => {
                            status.state = ImportState::Failed(RfError::import(format!(
                                "Importing library '{}' failed: no keyword specification found",
                                name
                            )));
                        }
                    }
                }
                ImportKind::Resource | ImportKind::Variables => {
                    let Some(path) = resolve_import_path(&name, base, &self.config.module_path) else {
                        status.state = ImportState::Failed(RfError::import(format!(
                            "{} file '{}' does not exist",
                            import.kind, name
                        )));
                        index.statuses.push(status);
                        continue;
                    };
                    status.path = Some(path.clone());
                    status.state = match (import.kind, self.cache.request(&path, Some(importer))) {
                        (_, LoadState::Loading) => ImportState::Loading,
                        (_, LoadState::Failed(err)) => ImportState::Failed(err),
                        (ImportKind::Resource, LoadState::Ready(Loaded::Resource(res))) => {
                            if visited.insert(path.clone()) {
                                index.resources.push(ResourceImport {
                                    path: path.clone(),
                                    file: Arc::clone(&res),
                                });
                                queue.push_back(res);
                            }
                            ImportState::Resolved
                        }
                        (ImportKind::Variables, LoadState::Ready(Loaded::VariableFile(vars))) => {
                            if !index.variable_files.iter().any(|v| v.path == path) {
                                index.variable_files.push(VariableFileImport {
                                    path: path.clone(),
                                    variables: vars,
                                });
                            }
                            ImportState::Resolved
                        }
                        (kind, LoadState::Ready(_)) => ImportState::Failed(
                            RfError::import(format!("'{}' is not a {} file", path.display(), kind))
                                .with_path(&path),
                        ),
                    };
                }
            }
            index.statuses.push(status);
        }
    }

    fn ranked_keywords(&self, scope: &FileScope<'_>, index: &ImportIndex) -> Vec<Ranked> {
        let qualifier = scope
            .file
            .source
            .as_deref()
            .map(file_stem)
            .unwrap_or_default();
        let mut keywords: Vec<Ranked> = scope
            .file
            .keywords
            .items
            .iter()
            .map(|kw| {
                let info = KeywordInfo::user(kw, KeywordSource::CurrentFile, &qualifier);
                Ranked::new(SourceRank::CurrentFile, 0, info)
            })
            .collect();
        keywords.extend(index.keywords.iter().cloned());
        keywords
    }

    /// Every visible keyword in rank order.
    pub fn keywords(&self, scope: &FileScope<'_>) -> Vec<KeywordInfo> {
        let index = self.index(scope);
        self.ranked_keywords(scope, &index)
            .into_iter()
            .map(|r| r.info)
            .collect()
    }

    /// Completion candidates for `prefix`.
    ///
    /// A prefix starting with a variable sigil lists variables in scope.
    /// Otherwise local variables come first, then keywords of the file, of
    /// resources in import order, of libraries and of BuiltIn. Within one
    /// source, names starting with the prefix come before names containing
    /// it, then alphabetical order.
    pub fn suggestions(&self, scope: &FileScope<'_>, cursor: Option<&Cursor>, prefix: &str) -> Vec<Suggestion> {
        let index = self.index(scope);
        let mut candidates: Vec<(SourceRank, usize, u8, String, Suggestion)> = Vec::new();
        let mut seen: HashSet<(String, SourceRank, usize)> = HashSet::new();

        if prefix.starts_with(['$', '@', '&', '%']) {
            let key = normalize_variable_prefix(prefix);
            let store = self.build_store(scope, &index, cursor);
            let mut group = 0;
            let mut previous: Option<&VariableSource> = None;
            for var in store.iter() {
                if previous.is_some_and(|p| p != &var.source) {
                    group += 1;
                }
                previous = Some(&var.source);
                let name_key = normalize_variable(&var.name);
                if let Some(class) = match_class(&name_key, &key) {
                    if seen.insert((name_key.clone(), SourceRank::Local, group)) {
                        candidates.push((SourceRank::Local, group, class, name_key, Suggestion::Variable(var.clone())));
                    }
                }
            }
        } else {
            let bdd_stripped = scope.file.language().strip_bdd_prefix(prefix).unwrap_or(prefix);
            let key = normalize(bdd_stripped);
            if let Some(cursor) = cursor {
                let mut locals = VariableStore::new();
                collect_locals(scope.file, cursor, &mut locals);
                for var in locals.iter().filter(|v| v.source != VariableSource::Assignment) {
                    let name_key = normalize_variable(&var.name);
                    if let Some(class) = match_class(&name_key, &key) {
                        if seen.insert((name_key.clone(), SourceRank::Local, 0)) {
                            candidates.push((SourceRank::Local, 0, class, name_key, Suggestion::Variable(var.clone())));
                        }
                    }
                }
            }
            for ranked in self.ranked_keywords(scope, &index) {
                let name_key = normalize(&ranked.info.name);
                if let Some(class) = match_class(&name_key, &key) {
                    if seen.insert((name_key.clone(), ranked.rank, ranked.group)) {
                        candidates.push((ranked.rank, ranked.group, class, name_key, Suggestion::Keyword(ranked.info)));
                    }
                }
            }
        }

        candidates.sort_by(|a, b| {
            (a.0, a.1, a.2, &a.3, a.4.name())
                .cmp(&(b.0, b.1, b.2, &b.3, b.4.name()))
        });
        candidates.into_iter().map(|c| c.4).collect()
    }

    /// Resolve a keyword name as written in a step.
    ///
    /// Qualified names (`BuiltIn.Log`, `resource.Keyword`, `Alias.Keyword`)
    /// only consider the named source. For bare names a keyword of the file
    /// wins, then a single resource keyword, then a single library keyword;
    /// several candidates of the same kind are ambiguous. Exact names beat
    /// embedded-argument patterns, and a BDD prefix is ignored when the full
    /// name does not match.
    pub fn resolve(&self, scope: &FileScope<'_>, name: &str) -> Resolution {
        let index = self.index(scope);
        let keywords = self.ranked_keywords(scope, &index);
        resolve_in(&keywords, scope.file.language(), name)
    }

    /// Variables visible at `cursor`, highest priority first.
    pub fn variables_in_scope(&self, scope: &FileScope<'_>, cursor: Option<&Cursor>) -> Vec<VariableInfo> {
        self.variable_store(scope, cursor).iter().cloned().collect()
    }

    /// Variable store for `cursor`: locals, the file's table, resources in
    /// import order, variable files, built-ins.
    pub fn variable_store(&self, scope: &FileScope<'_>, cursor: Option<&Cursor>) -> VariableStore {
        let index = self.index(scope);
        self.build_store(scope, &index, cursor)
    }

    fn build_store(&self, scope: &FileScope<'_>, index: &ImportIndex, cursor: Option<&Cursor>) -> VariableStore {
        let mut store = VariableStore::new();
        if let Some(cursor) = cursor {
            collect_locals(scope.file, cursor, &mut store);
        }
        add_table(&mut store, &scope.file.variables, &VariableSource::File);
        for res in &index.resources {
            add_table(&mut store, &res.file.variables, &VariableSource::Resource(res.path.clone()));
        }
        add_variable_files(&mut store, &index.variable_files);
        store.add_builtins(scope.file.directory());
        store
    }

    /// Every import of the file and of its resources.
    pub fn import_status(&self, scope: &FileScope<'_>) -> Vec<ImportStatus> {
        self.index(scope).statuses.clone()
    }

    /// Import failures of the file's own imports, variables that cannot be
    /// found and keyword calls that are ambiguous or unknown.
    pub fn diagnostics(&self, scope: &FileScope<'_>) -> Vec<Diagnostic> {
        let index = self.index(scope);
        let file = scope.file;
        let mut out = Vec::new();
        let attach = |diag: Diagnostic| match &file.source {
            Some(source) => diag.with_source(source),
            None => diag,
        };

        for status in index.statuses.iter().filter(|s| s.direct) {
            if let ImportState::Failed(err) = &status.state {
                out.push(attach(Diagnostic::error(DiagnosticKind::Import, err.message.clone())));
            }
        }

        let file_store = self.build_store(scope, &index, None);
        for var in file.variables.variables() {
            for cell in &var.value {
                for name in file_store.undefined_in(cell) {
                    out.push(attach(unresolved(&name, &var.name)));
                }
            }
        }

        let keywords = self.ranked_keywords(scope, &index);
        let language = file.language();
        let report_unknown = index.is_complete();
        let items = file
            .tests
            .items
            .iter()
            .enumerate()
            .map(|(i, t)| (ItemRef::Test(i), t.name.as_str(), t.steps.as_slice()))
            .chain(
                file.keywords
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, k)| (ItemRef::Keyword(i), k.name.as_str(), k.steps.as_slice())),
            );
        for (item, item_name, steps) in items {
            let store = self.build_store(scope, &index, Some(&Cursor::new(item)));
            visit_steps(steps, &mut Vec::new(), &mut |_, step| match step {
                Step::Call(call) => {
                    for cell in call.keyword.iter().chain(call.args.iter()) {
                        for name in store.undefined_in(cell) {
                            out.push(attach(unresolved(&name, item_name)));
                        }
                    }
                    let Some(keyword) = call.keyword.as_deref() else {
                        return;
                    };
                    match resolve_in(&keywords, language, keyword) {
                        Resolution::Ambiguous(candidates) => {
                            let names: Vec<String> = candidates.iter().map(KeywordInfo::qualified_name).collect();
                            out.push(attach(Diagnostic::error(
                                DiagnosticKind::AmbiguousKeyword,
                                format!(
                                    "Multiple keywords with name '{}' found: {}",
                                    keyword,
                                    names.join(", ")
                                ),
                            )));
                        }
                        Resolution::NotFound if report_unknown && find_variables(keyword).is_empty() => {
                            out.push(attach(Diagnostic::warning(
                                DiagnosticKind::UnknownKeyword,
                                format!("No keyword with name '{}' found", keyword),
                            )));
                        }
                        _ => {}
                    }
                }
                Step::For(lp) => {
                    for cell in &lp.values {
                        for name in store.undefined_in(cell) {
                            out.push(attach(unresolved(&name, item_name)));
                        }
                    }
                }
            });
        }
        out
    }

    /// Steps of the file whose keyword resolves to the keyword `name`
    /// resolves to. When `name` does not resolve, steps calling it by the
    /// same normalized name are returned.
    pub fn keyword_usages(&self, scope: &FileScope<'_>, name: &str) -> Vec<KeywordUsage> {
        let index = self.index(scope);
        let keywords = self.ranked_keywords(scope, &index);
        let language = scope.file.language();
        let target = resolve_in(&keywords, language, name);
        let file = scope.file;
        let mut usages = Vec::new();

        let items = file
            .tests
            .items
            .iter()
            .enumerate()
            .map(|(i, t)| (ItemRef::Test(i), t.steps.as_slice()))
            .chain(
                file.keywords
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, k)| (ItemRef::Keyword(i), k.steps.as_slice())),
            );
        for (item, steps) in items {
            visit_steps(steps, &mut Vec::new(), &mut |path, step| {
                let Some(keyword) = step.keyword() else {
                    return;
                };
                let hit = match (&target, resolve_in(&keywords, language, keyword)) {
                    (Resolution::Keyword(wanted), Resolution::Keyword(found)) => {
                        eq_normalized(&wanted.name, &found.name) && wanted.source == found.source
                    }
                    (Resolution::Keyword(_), _) => false,
                    _ => {
                        let bare = language.strip_bdd_prefix(keyword).unwrap_or(keyword);
                        eq_normalized(keyword, name) || eq_normalized(bare, name)
                    }
                };
                if hit {
                    usages.push(KeywordUsage {
                        source: file.source.clone(),
                        item,
                        steps: path.to_vec(),
                    });
                }
            });
        }
        usages
    }

    /// Block until every import reachable from the file has finished
    /// loading. Meant for tests and batch tools.
    pub fn await_imports(&self, scope: &FileScope<'_>) {
        loop {
            let pending: Vec<PathBuf> = self
                .index(scope)
                .statuses
                .iter()
                .filter(|s| matches!(s.state, ImportState::Loading))
                .filter_map(|s| s.path.clone())
                .collect();
            if pending.is_empty() {
                return;
            }
            for path in pending {
                if let Some(handle) = self.cache.await_cache(&path) {
                    let _ = handle.wait();
                }
            }
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn add_library(libraries: &mut Vec<(String, Arc<LibrarySpec>)>, qualifier: String, lib: Arc<LibrarySpec>) {
    let duplicate = libraries
        .iter()
        .any(|(q, l)| eq_normalized(q, &qualifier) && l.name == lib.name);
    if !duplicate {
        libraries.push((qualifier, lib));
    }
}

fn library_keywords(lib: &LibrarySpec, qualifier: &str, rank: SourceRank, group: usize) -> Vec<Ranked> {
    lib.keywords
        .iter()
        .map(|kw| {
            let info = KeywordInfo {
                name: kw.name.clone(),
                source: KeywordSource::Library(lib.name.clone()),
                qualifier: qualifier.to_string(),
                args: kw.args.clone(),
                doc: kw.doc.clone(),
            };
            Ranked::new(rank, group, info)
        })
        .collect()
}

/// Variables available to import names of `file`: its own table, variable
/// files seen so far, built-ins.
fn import_store(file: &DataFile, variable_files: &[VariableFileImport]) -> VariableStore {
    let mut store = VariableStore::new();
    add_table(&mut store, &file.variables, &VariableSource::File);
    add_variable_files(&mut store, variable_files);
    store.add_builtins(file.directory());
    store
}

fn add_table(store: &mut VariableStore, table: &VariableTable, source: &VariableSource) {
    for var in table.variables().filter(|v| v.has_valid_name()) {
        store.insert_cells(var.name.clone(), var.value.iter().cloned(), source.clone());
    }
}

fn add_variable_files(store: &mut VariableStore, variable_files: &[VariableFileImport]) {
    for vf in variable_files {
        let source = VariableSource::VariableFile(vf.path.clone());
        for (name, value) in vf.variables.iter() {
            store.insert_value(name.clone(), value.clone(), source.clone());
        }
    }
}

/// Arguments, loop variables and assignments visible at `cursor`.
fn collect_locals(file: &DataFile, cursor: &Cursor, store: &mut VariableStore) {
    let steps = match cursor.item {
        ItemRef::Keyword(i) => {
            let Some(kw) = file.keywords.items.get(i) else {
                return;
            };
            for var in find_variables(&kw.name) {
                let body = var.body.split_once(':').map_or(var.body, |(name, _)| name);
                store.insert_unknown(format!("${{{}}}", body), VariableSource::Argument);
            }
            for spec in kw.arguments() {
                match spec.split_once('=') {
                    Some((name, default)) => {
                        store.insert_cells(name.trim_end(), [default.to_string()], VariableSource::Argument);
                    }
                    None => {
                        store.insert_unknown(spec.clone(), VariableSource::Argument);
                    }
                }
            }
            kw.steps.as_slice()
        }
        ItemRef::Test(i) => match file.tests.items.get(i) {
            Some(test) => test.steps.as_slice(),
            None => return,
        },
    };

    let (before, current) = match cursor.row {
        Some(row) if row < steps.len() => (&steps[..row], Some(&steps[row])),
        _ => (steps, None),
    };
    let mut loops: Vec<&str> = Vec::new();
    let mut assigned: Vec<&str> = Vec::new();
    collect_step_locals(before, &mut loops, &mut assigned);
    if let Some(Step::For(lp)) = current {
        loops.extend(lp.variables.iter().map(String::as_str));
        collect_step_locals(&lp.body, &mut loops, &mut assigned);
    }
    for name in loops {
        store.insert_unknown(name, VariableSource::LoopVariable);
    }
    for name in assigned {
        store.insert_unknown(name, VariableSource::Assignment);
    }
}

fn collect_step_locals<'a>(steps: &'a [Step], loops: &mut Vec<&'a str>, assigned: &mut Vec<&'a str>) {
    for step in steps {
        match step {
            Step::Call(call) => assigned.extend(call.assign.iter().map(|a| strip_assign_mark(a).trim_end())),
            Step::For(lp) => {
                loops.extend(lp.variables.iter().map(String::as_str));
                collect_step_locals(&lp.body, loops, assigned);
            }
        }
    }
}

fn visit_steps<'a>(steps: &'a [Step], path: &mut Vec<usize>, f: &mut impl FnMut(&[usize], &'a Step)) {
    for (i, step) in steps.iter().enumerate() {
        path.push(i);
        f(path, step);
        if let Step::For(lp) = step {
            visit_steps(&lp.body, path, f);
        }
        path.pop();
    }
}

fn unresolved(name: &str, context: &str) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticKind::UnresolvedVariable,
        format!("Variable '{}' not found in '{}'", name, context),
    )
}

/// 0 for names starting with the key, 1 for names containing it.
fn match_class(name_key: &str, key: &str) -> Option<u8> {
    if name_key.starts_with(key) {
        Some(0)
    } else if name_key.contains(key) {
        Some(1)
    } else {
        None
    }
}

fn normalize_variable_prefix(prefix: &str) -> String {
    let body = prefix.trim_start_matches(['$', '@', '&', '%']);
    let body = body.strip_prefix('{').unwrap_or(body);
    normalize(body.strip_suffix('}').unwrap_or(body))
}

fn resolve_in(keywords: &[Ranked], language: &Language, name: &str) -> Resolution {
    let name = name.trim();
    if name.is_empty() {
        return Resolution::NotFound;
    }
    match lookup(keywords, name) {
        Resolution::NotFound => match language.strip_bdd_prefix(name) {
            Some(rest) => lookup(keywords, rest),
            None => Resolution::NotFound,
        },
        found => found,
    }
}

fn lookup(keywords: &[Ranked], name: &str) -> Resolution {
    for (dot, _) in name.match_indices('.') {
        let (qualifier, bare) = (&name[..dot], &name[dot + 1..]);
        if qualifier.is_empty() || bare.is_empty() {
            continue;
        }
        let matches: Vec<(&Ranked, MatchKind)> = keywords
            .iter()
            .filter(|k| eq_normalized(&k.info.qualifier, qualifier))
            .filter_map(|k| k.matches(bare).map(|m| (k, m)))
            .collect();
        if !matches.is_empty() {
            return choose(matches);
        }
    }
    let matches: Vec<(&Ranked, MatchKind)> = keywords
        .iter()
        .filter_map(|k| k.matches(name).map(|m| (k, m)))
        .collect();
    choose(matches)
}

fn choose(matches: Vec<(&Ranked, MatchKind)>) -> Resolution {
    let has_exact = matches.iter().any(|(_, m)| *m == MatchKind::Exact);
    let pool: Vec<&Ranked> = matches
        .into_iter()
        .filter(|(_, m)| !has_exact || *m == MatchKind::Exact)
        .map(|(k, _)| k)
        .collect();

    let local: Vec<&Ranked> = pool
        .iter()
        .copied()
        .filter(|k| k.rank == SourceRank::CurrentFile)
        .collect();
    match local.as_slice() {
        [] => {}
        [one] => return Resolution::Keyword(one.info.clone()),
        many => return ambiguous(many),
    }
    let (user, library): (Vec<&Ranked>, Vec<&Ranked>) = pool
        .into_iter()
        .partition(|k| k.rank == SourceRank::Resource);
    match (user.as_slice(), library.as_slice()) {
        ([], []) => Resolution::NotFound,
        ([one], _) | (_, [one]) => Resolution::Keyword(one.info.clone()),
        (user, library) => {
            let both: Vec<&Ranked> = user.iter().chain(library).copied().collect();
            ambiguous(&both)
        }
    }
}

fn ambiguous(candidates: &[&Ranked]) -> Resolution {
    Resolution::Ambiguous(candidates.iter().map(|k| k.info.clone()).collect())
}

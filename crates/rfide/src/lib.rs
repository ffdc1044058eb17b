//! # RFIDE - Robot Framework IDE core
//!
//! Parsing, writing, keyword and variable resolution and an undoable project
//! model for Robot Framework test data, in one crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use rfide::{parse, write};
//!
//! let text = "*** Test Cases ***\nGreet\n    Log    Hello\n";
//!
//! // Parse the file
//! let file = parse(text).expect("Failed to parse");
//! assert_eq!(file.tests.items[0].name, "Greet");
//!
//! // Write it back in the plain text format
//! let out = write(&file).expect("Failed to write");
//! assert!(out.contains("Log    Hello"));
//! ```
//!
//! ## Modules
//!
//! - [`model`]: Data model of test case and resource files
//! - [`names`]: Name normalization and variable syntax
//! - [`writer`]: Plain text, TSV and HTML writers
//! - [`namespace`]: Variables, imports and keyword resolution
//! - [`project`]: Open files, commands with undo and change events

// Re-export core types
pub use rfide_core::{
    // Functions
    parse_directory,
    parse_file,
    parse_file_lenient,
    parse_str,
    parse_suite,
    // Main types
    DataFile,
    // Diagnostics
    Diagnostic,
    DiagnosticKind,
    FileKind,
    Format,
    // Language tables
    ItemSettingName,
    Language,
    // Parser
    Limits,
    ParseOptions,
    PathFilter,
    // Errors
    RfError,
    RfErrorKind,
    RfResult,
    SettingName,
    Severity,
    Suite,
    TestDataDirectory,
};

// Error handling extensions
mod error_ext;
pub use error_ext::RfResultExt;

pub mod model {
    //! Data model of test case and resource files
    pub use rfide_core::model::*;
}

pub mod names {
    //! Name normalization and variable syntax
    pub use rfide_core::names::{
        eq_normalized, is_assign, is_variable, normalize, normalize_variable, strip_assign_mark,
        variable_body,
    };
}

pub mod writer {
    //! Plain text, TSV and HTML writers
    pub use rfide_writer::{
        layout, write, write_file, write_to_path, Layout, LineEnding, WriterConfig,
        WriterConfigBuilder, MIN_SEPARATOR_WIDTH,
    };
}

pub mod namespace {
    //! Variables, imports and keyword resolution
    pub use rfide_namespace::{
        evaluate, literal_eval, standard_library, standard_library_names, Cursor, FileId,
        FileScope, ImportCache, ImportState, ImportStatus, ItemRef, KeywordInfo, KeywordSource,
        KeywordUsage, LibrarySpec, Namespace, NamespaceConfig, Resolution, Suggestion, Value,
        VariableInfo, VariableSource, VariableStore,
    };
}

pub mod project {
    //! Open files, commands with undo and change events
    pub use rfide_project::commands;
    pub use rfide_project::{
        topic_matches, CommandError, CommandResult, ConfigError, DiskStamp, EventBus,
        ExcludeList, FileController, ItemController, Listener, Project, ProjectConfig,
        RideEvent, RunCommand, RunProfile, Selection, Settings, Subscription, Target,
    };
}

// Convenience functions at crate root

/// Parse space separated test data from a string.
///
/// For other formats use [`parse_str`] with an explicit [`Format`].
///
/// # Examples
///
/// ```rust
/// use rfide::parse;
///
/// let file = parse("*** Keywords ***\nGreet\n    Log    Hi\n").unwrap();
/// assert_eq!(file.keywords.items[0].name, "Greet");
/// ```
#[inline]
pub fn parse(input: &str) -> RfResult<DataFile> {
    parse_str(input, Format::Robot, &ParseOptions::default())
}

/// Write a file in the format it was read from, with default settings.
#[inline]
pub fn write(file: &DataFile) -> RfResult<String> {
    rfide_writer::write_file(file, &rfide_writer::WriterConfig::default())
}

/// Parse `input` and write it back in `format`.
///
/// # Examples
///
/// ```rust
/// use rfide::{convert, Format};
///
/// let tsv = convert("*** Test Cases ***\nT\n    Log    x\n", Format::Tsv).unwrap();
/// assert!(tsv.contains("Log\tx"));
/// ```
pub fn convert(input: &str, format: Format) -> RfResult<String> {
    let file = parse(input)?;
    rfide_writer::write(&file, format, &rfide_writer::WriterConfig::default())
}

/// Diagnostics of `input`, without resolving imports.
///
/// Returns an error only for input that cannot be read at all.
pub fn validate(input: &str) -> RfResult<Vec<Diagnostic>> {
    parse(input).map(|file| file.diagnostics)
}

/// Open a file or directory suite in a new project.
///
/// # Examples
///
/// ```no_run
/// let (project, files) = rfide::open_project("tests/").unwrap();
/// for id in files {
///     let file = project.file(id).unwrap();
///     println!("{}: {} tests", file.display_name(), file.tests().len());
/// }
/// ```
pub fn open_project(
    path: impl AsRef<std::path::Path>,
) -> RfResult<(project::Project, Vec<namespace::FileId>)> {
    let mut project = project::Project::new(project::ProjectConfig::new())?;
    let files = project.open_suite(path)?;
    Ok((project, files))
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

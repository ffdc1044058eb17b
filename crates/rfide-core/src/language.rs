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

//! Localized table headers, setting names and BDD prefixes.
//!
//! A file selects its language with a `Language: <name>` row before the first
//! table. English names are always accepted in addition to the selected
//! language.

use crate::names::{eq_normalized, normalize};

/// The kind of table a header opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableKind {
    Settings,
    Variables,
    TestCases,
    Tasks,
    Keywords,
    Comments,
}

/// File-level setting names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingName {
    Documentation,
    SuiteSetup,
    SuiteTeardown,
    TestSetup,
    TestTeardown,
    ForceTags,
    DefaultTags,
    TestTimeout,
    TestTemplate,
    Metadata,
    Library,
    Resource,
    Variables,
}

/// Test and keyword level setting names (written in brackets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemSettingName {
    Documentation,
    Tags,
    Setup,
    Teardown,
    Template,
    Timeout,
    Arguments,
    Return,
}

/// Localized vocabulary of one language.
///
/// The first entry for each variant in a table is its canonical spelling,
/// used when writing files.
#[derive(Debug, PartialEq, Eq)]
pub struct Language {
    code: &'static str,
    name: &'static str,
    aliases: &'static [&'static str],
    headers: &'static [(&'static str, TableKind)],
    settings: &'static [(&'static str, SettingName)],
    item_settings: &'static [(&'static str, ItemSettingName)],
    bdd_prefixes: &'static [&'static str],
}

pub static ENGLISH: Language = Language {
    code: "en",
    name: "English",
    aliases: &["English", "en"],
    headers: &[
        ("Settings", TableKind::Settings),
        ("Setting", TableKind::Settings),
        ("Metadata", TableKind::Settings),
        ("Variables", TableKind::Variables),
        ("Variable", TableKind::Variables),
        ("Test Cases", TableKind::TestCases),
        ("Test Case", TableKind::TestCases),
        ("Tasks", TableKind::Tasks),
        ("Task", TableKind::Tasks),
        ("Keywords", TableKind::Keywords),
        ("Keyword", TableKind::Keywords),
        ("User Keywords", TableKind::Keywords),
        ("User Keyword", TableKind::Keywords),
        ("Comments", TableKind::Comments),
        ("Comment", TableKind::Comments),
    ],
    settings: &[
        ("Documentation", SettingName::Documentation),
        ("Suite Setup", SettingName::SuiteSetup),
        ("Suite Precondition", SettingName::SuiteSetup),
        ("Suite Teardown", SettingName::SuiteTeardown),
        ("Suite Postcondition", SettingName::SuiteTeardown),
        ("Test Setup", SettingName::TestSetup),
        ("Task Setup", SettingName::TestSetup),
        ("Test Precondition", SettingName::TestSetup),
        ("Test Teardown", SettingName::TestTeardown),
        ("Task Teardown", SettingName::TestTeardown),
        ("Test Postcondition", SettingName::TestTeardown),
        ("Force Tags", SettingName::ForceTags),
        ("Test Tags", SettingName::ForceTags),
        ("Task Tags", SettingName::ForceTags),
        ("Default Tags", SettingName::DefaultTags),
        ("Test Timeout", SettingName::TestTimeout),
        ("Task Timeout", SettingName::TestTimeout),
        ("Test Template", SettingName::TestTemplate),
        ("Task Template", SettingName::TestTemplate),
        ("Metadata", SettingName::Metadata),
        ("Library", SettingName::Library),
        ("Resource", SettingName::Resource),
        ("Variables", SettingName::Variables),
    ],
    item_settings: &[
        ("Documentation", ItemSettingName::Documentation),
        ("Tags", ItemSettingName::Tags),
        ("Setup", ItemSettingName::Setup),
        ("Precondition", ItemSettingName::Setup),
        ("Teardown", ItemSettingName::Teardown),
        ("Postcondition", ItemSettingName::Teardown),
        ("Template", ItemSettingName::Template),
        ("Timeout", ItemSettingName::Timeout),
        ("Arguments", ItemSettingName::Arguments),
        ("Return", ItemSettingName::Return),
    ],
    bdd_prefixes: &["Given", "When", "Then", "And", "But"],
};

pub static GERMAN: Language = Language {
    code: "de",
    name: "German",
    aliases: &["German", "Deutsch", "de"],
    headers: &[
        ("Einstellungen", TableKind::Settings),
        ("Variablen", TableKind::Variables),
        ("Testfälle", TableKind::TestCases),
        ("Aufgaben", TableKind::Tasks),
        ("Schlüsselwörter", TableKind::Keywords),
        ("Kommentare", TableKind::Comments),
    ],
    settings: &[
        ("Dokumentation", SettingName::Documentation),
        ("Suitevorbereitung", SettingName::SuiteSetup),
        ("Suitenachbereitung", SettingName::SuiteTeardown),
        ("Testvorbereitung", SettingName::TestSetup),
        ("Testnachbereitung", SettingName::TestTeardown),
        ("Testmarker", SettingName::ForceTags),
        ("Standardmarker", SettingName::DefaultTags),
        ("Testzeitlimit", SettingName::TestTimeout),
        ("Testvorlage", SettingName::TestTemplate),
        ("Metadaten", SettingName::Metadata),
        ("Bibliothek", SettingName::Library),
        ("Ressource", SettingName::Resource),
        ("Variablen", SettingName::Variables),
    ],
    item_settings: &[
        ("Dokumentation", ItemSettingName::Documentation),
        ("Marker", ItemSettingName::Tags),
        ("Vorbereitung", ItemSettingName::Setup),
        ("Nachbereitung", ItemSettingName::Teardown),
        ("Vorlage", ItemSettingName::Template),
        ("Zeitlimit", ItemSettingName::Timeout),
        ("Argumente", ItemSettingName::Arguments),
        ("Rückgabe", ItemSettingName::Return),
    ],
    bdd_prefixes: &["Angenommen", "Wenn", "Dann", "Und", "Aber"],
};

pub static FINNISH: Language = Language {
    code: "fi",
    name: "Finnish",
    aliases: &["Finnish", "Suomi", "fi"],
    headers: &[
        ("Asetukset", TableKind::Settings),
        ("Muuttujat", TableKind::Variables),
        ("Testit", TableKind::TestCases),
        ("Tehtävät", TableKind::Tasks),
        ("Avainsanat", TableKind::Keywords),
        ("Kommentit", TableKind::Comments),
    ],
    settings: &[
        ("Dokumentaatio", SettingName::Documentation),
        ("Setin Alustus", SettingName::SuiteSetup),
        ("Setin Alasajo", SettingName::SuiteTeardown),
        ("Testin Alustus", SettingName::TestSetup),
        ("Testin Alasajo", SettingName::TestTeardown),
        ("Testin Tagit", SettingName::ForceTags),
        ("Oletustagit", SettingName::DefaultTags),
        ("Testin Aikaraja", SettingName::TestTimeout),
        ("Testin Malli", SettingName::TestTemplate),
        ("Metatiedot", SettingName::Metadata),
        ("Kirjasto", SettingName::Library),
        ("Resurssi", SettingName::Resource),
        ("Muuttujat", SettingName::Variables),
    ],
    item_settings: &[
        ("Dokumentaatio", ItemSettingName::Documentation),
        ("Tagit", ItemSettingName::Tags),
        ("Alustus", ItemSettingName::Setup),
        ("Alasajo", ItemSettingName::Teardown),
        ("Malli", ItemSettingName::Template),
        ("Aikaraja", ItemSettingName::Timeout),
        ("Argumentit", ItemSettingName::Arguments),
        ("Palauta", ItemSettingName::Return),
    ],
    bdd_prefixes: &["Oletetaan", "Kun", "Niin", "Ja", "Mutta"],
};

static BUILT_IN: [&Language; 3] = [&ENGLISH, &GERMAN, &FINNISH];

impl Language {
    /// The default language.
    pub fn english() -> &'static Language {
        &ENGLISH
    }

    /// Look up a built-in language by name, native name or code.
    pub fn from_name(name: &str) -> Option<&'static Language> {
        BUILT_IN
            .iter()
            .copied()
            .find(|lang| lang.aliases.iter().any(|a| eq_normalized(a, name)))
    }

    /// All built-in languages.
    pub fn all() -> &'static [&'static Language] {
        &BUILT_IN
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn is_english(&self) -> bool {
        std::ptr::eq(self, &ENGLISH)
    }

    fn vocabularies(&self) -> impl Iterator<Item = &Language> {
        std::iter::once(self).chain((!self.is_english()).then_some(&ENGLISH))
    }

    /// Table kind opened by a header cell such as `*** Test Cases ***`.
    pub fn table_kind(&self, header: &str) -> Option<TableKind> {
        let label = normalize(header.trim_matches(|c: char| c == '*' || c.is_whitespace()));
        self.vocabularies().find_map(|lang| {
            lang.headers
                .iter()
                .find(|(name, _)| normalize(name) == label)
                .map(|(_, kind)| *kind)
        })
    }

    /// File-level setting named by a settings table cell.
    pub fn setting(&self, cell: &str) -> Option<SettingName> {
        let label = normalize(cell.trim_end_matches(':'));
        self.vocabularies().find_map(|lang| {
            lang.settings
                .iter()
                .find(|(name, _)| normalize(name) == label)
                .map(|(_, setting)| *setting)
        })
    }

    /// Test or keyword setting named by a bracketed cell such as `[Tags]`.
    pub fn item_setting(&self, cell: &str) -> Option<ItemSettingName> {
        let inner = cell.trim().strip_prefix('[')?.strip_suffix(']')?;
        let label = normalize(inner);
        self.vocabularies().find_map(|lang| {
            lang.item_settings
                .iter()
                .find(|(name, _)| normalize(name) == label)
                .map(|(_, setting)| *setting)
        })
    }

    /// Canonical header label for a table kind in this language.
    pub fn table_label(&self, kind: TableKind) -> &'static str {
        self.vocabularies()
            .find_map(|lang| lang.headers.iter().find(|(_, k)| *k == kind))
            .map(|(name, _)| *name)
            .unwrap_or("Comments")
    }

    /// Canonical spelling of a file-level setting in this language.
    pub fn setting_label(&self, setting: SettingName) -> &'static str {
        self.vocabularies()
            .find_map(|lang| lang.settings.iter().find(|(_, s)| *s == setting))
            .map(|(name, _)| *name)
            .unwrap_or("Documentation")
    }

    /// Canonical bracketed spelling of an item setting in this language.
    pub fn item_setting_label(&self, setting: ItemSettingName) -> String {
        let name = self
            .vocabularies()
            .find_map(|lang| lang.item_settings.iter().find(|(_, s)| *s == setting))
            .map(|(name, _)| *name)
            .unwrap_or("Documentation");
        format!("[{}]", name)
    }

    /// Strip a leading BDD prefix (`Given`, `When`, ...) from a keyword name.
    ///
    /// Returns `None` if the name has no prefix.
    pub fn strip_bdd_prefix<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.vocabularies().find_map(|lang| {
            lang.bdd_prefixes.iter().find_map(|prefix| {
                let head = name.get(..prefix.len())?;
                let rest = name[prefix.len()..].strip_prefix(' ')?;
                (head.to_lowercase() == prefix.to_lowercase() && !rest.trim().is_empty())
                    .then(|| rest.trim_start())
            })
        })
    }
}

/// Parse a `Language: <name>` marker cell.
///
/// Returns the language name, or `None` if the cell is not a marker.
pub fn language_marker(cell: &str) -> Option<&str> {
    let (head, value) = cell.split_once(':')?;
    eq_normalized(head, "language").then(|| value.trim())
}

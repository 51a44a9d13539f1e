//! Per-language translation tables.
//!
//! A table is a flat TOML file named after its language, next to the pages:
//!
//! ```toml
//! # pages/_fr.toml
//! greeting = "Bonjour"
//! download = "Télécharger"
//! ```
//!
//! Lookups never fail. A missing key falls back to the key itself, which keeps
//! the source-language text on the page. The canonical language is written
//! directly in the templates, so its table may be empty; missing keys are only
//! reported for the other languages.

use crate::naming;
use log::warn;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocaleError {
    #[error("no locale table for '{lang}' (expected {path})")]
    NotFound { lang: String, path: PathBuf },
    #[error("cannot read locale table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid locale table {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Loads locale tables from the pages directory.
#[derive(Debug, Clone)]
pub struct LocaleStore {
    dir: PathBuf,
    canonical_lang: String,
}

impl LocaleStore {
    pub fn new(dir: &Path, canonical_lang: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            canonical_lang: canonical_lang.to_string(),
        }
    }

    /// Load the table for `lang`. Tables are small; nothing is cached.
    pub fn load(&self, lang: &str) -> Result<LocaleTable, LocaleError> {
        let path = naming::locale_path(&self.dir, lang);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LocaleError::NotFound {
                    lang: lang.to_string(),
                    path,
                });
            }
            Err(source) => return Err(LocaleError::Io { path, source }),
        };
        let raw: toml::Table = toml::from_str(&content)
            .map_err(|source| LocaleError::Toml {
                path: path.clone(),
                source,
            })?;
        Ok(LocaleTable::new(
            lang,
            raw,
            lang != self.canonical_lang,
        ))
    }
}

/// Outcome of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation<'a> {
    /// The key is in the table.
    Found(&'a str),
    /// The key is missing; the key itself is the text.
    Fallback(&'a str),
}

impl<'a> Translation<'a> {
    pub fn text(self) -> &'a str {
        match self {
            Translation::Found(text) | Translation::Fallback(text) => text,
        }
    }
}

/// Translation strings for one language.
#[derive(Debug, Clone, Default)]
pub struct LocaleTable {
    lang: String,
    entries: HashMap<String, String>,
    report_missing: bool,
}

impl LocaleTable {
    /// Build from a parsed table. Only string values are translations;
    /// anything else is ignored and its key falls back like a missing one.
    pub fn new(lang: &str, raw: toml::Table, report_missing: bool) -> Self {
        let entries = raw
            .into_iter()
            .filter_map(|(key, value)| match value {
                toml::Value::String(text) => Some((key, text)),
                _ => None,
            })
            .collect();
        Self {
            lang: lang.to_string(),
            entries,
            report_missing,
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a missing key produces a diagnostic.
    pub fn reports_missing(&self) -> bool {
        self.report_missing
    }

    /// Pure lookup with no side effects.
    pub fn lookup<'a>(&'a self, key: &'a str) -> Translation<'a> {
        match self.entries.get(key) {
            Some(text) => Translation::Found(text),
            None => Translation::Fallback(key),
        }
    }

    /// Lookup used by templates: warns on a miss unless this is the canonical language.
    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        let translation = self.lookup(key);
        if let Translation::Fallback(_) = translation
            && self.report_missing
        {
            warn!("Untranslated '{}': {}", key, self.lang);
        }
        translation.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::capture_logs;
    use tempfile::TempDir;

    fn store_with(files: &[(&str, &str)]) -> (TempDir, LocaleStore) {
        let tmp = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(tmp.path().join(name), content).unwrap();
        }
        let store = LocaleStore::new(tmp.path(), "en");
        (tmp, store)
    }

    #[test]
    fn load_reads_string_entries() {
        let (_tmp, store) = store_with(&[("_fr.toml", "greeting = \"Bonjour\"\n")]);
        let table = store.load("fr").unwrap();
        assert_eq!(table.lang(), "fr");
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("greeting"), Translation::Found("Bonjour"));
    }

    #[test]
    fn load_missing_table_is_not_found() {
        let (_tmp, store) = store_with(&[]);
        let err = store.load("de").unwrap_err();
        assert!(matches!(err, LocaleError::NotFound { ref lang, .. } if lang == "de"));
        assert!(err.to_string().contains("_de.toml"));
    }

    #[test]
    fn load_invalid_toml_names_file() {
        let (_tmp, store) = store_with(&[("_fr.toml", "greeting = ")]);
        let err = store.load("fr").unwrap_err();
        assert!(matches!(err, LocaleError::Toml { .. }));
        assert!(err.to_string().contains("_fr.toml"));
    }

    #[test]
    fn missing_key_falls_back_to_key() {
        let (_tmp, store) = store_with(&[("_fr.toml", "")]);
        let table = store.load("fr").unwrap();
        assert_eq!(table.lookup("greeting"), Translation::Fallback("greeting"));
        assert_eq!(table.translate("greeting"), "greeting");
    }

    #[test]
    fn non_string_values_fall_back() {
        let (_tmp, store) = store_with(&[("_fr.toml", "count = 3\n[nested]\nkey = \"x\"\n")]);
        let table = store.load("fr").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.lookup("count"), Translation::Fallback("count"));
        assert_eq!(table.lookup("nested"), Translation::Fallback("nested"));
    }

    #[test]
    fn lookup_is_idempotent() {
        let (_tmp, store) = store_with(&[("_fr.toml", "greeting = \"Bonjour\"\n")]);
        let table = store.load("fr").unwrap();
        assert_eq!(table.lookup("greeting"), table.lookup("greeting"));
        assert_eq!(table.lookup("absent"), table.lookup("absent"));
        assert_eq!(table.translate("greeting"), "Bonjour");
        assert_eq!(table.translate("greeting"), "Bonjour");
    }

    fn warnings(logs: &[(log::Level, String)]) -> Vec<&str> {
        logs.iter()
            .filter(|(level, _)| *level == log::Level::Warn)
            .map(|(_, msg)| msg.as_str())
            .collect()
    }

    #[test]
    fn missing_key_warns_once_for_other_languages() {
        let (_tmp, store) = store_with(&[("_fr.toml", "download = \"Télécharger\"\n")]);
        let table = store.load("fr").unwrap();

        let (text, logs) = capture_logs(|| table.translate("greeting").to_string());

        assert_eq!(text, "greeting");
        assert_eq!(warnings(&logs), vec!["Untranslated 'greeting': fr"]);
    }

    #[test]
    fn present_key_does_not_warn() {
        let (_tmp, store) = store_with(&[("_fr.toml", "greeting = \"Bonjour\"\n")]);
        let table = store.load("fr").unwrap();

        let (_, logs) = capture_logs(|| table.translate("greeting").to_string());

        assert!(warnings(&logs).is_empty());
    }

    #[test]
    fn canonical_missing_key_does_not_warn() {
        let (_tmp, store) = store_with(&[("_en.toml", "")]);
        let table = store.load("en").unwrap();

        let (text, logs) = capture_logs(|| table.translate("greeting").to_string());

        assert_eq!(text, "greeting");
        assert!(warnings(&logs).is_empty());
    }

    #[test]
    fn canonical_language_does_not_report_missing() {
        let (_tmp, store) = store_with(&[("_en.toml", ""), ("_fr.toml", "")]);
        assert!(!store.load("en").unwrap().reports_missing());
        assert!(store.load("fr").unwrap().reports_missing());
    }

    #[test]
    fn canonical_language_is_configurable() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("_de.toml"), "").unwrap();
        fs::write(tmp.path().join("_en.toml"), "").unwrap();
        let store = LocaleStore::new(tmp.path(), "de");
        assert!(!store.load("de").unwrap().reports_missing());
        assert!(store.load("en").unwrap().reports_missing());
    }
}

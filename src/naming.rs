//! Source file naming conventions.
//!
//! Every source directory mixes two kinds of files:
//!
//! - **Entries** start with a lowercase ASCII letter (`mac.html`, `style.scss`,
//!   `app.js`). Each entry produces one output file.
//! - **Partials** start with anything else, by convention `_`
//!   (`_default.toml`, `_fr.toml`, `_fonts.css`, `_mixins.scss`). They are
//!   inputs to entries and never produce output on their own.
//!
//! Sidecar files share the entry's stem: `mac.html` is overridden by
//! `mac.toml`. Locale tables are partials named after their language:
//! `_fr.toml`.

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension shared by page overrides, locale tables and the site config.
pub const CONFIG_EXTENSION: &str = "toml";

/// True when `path` is an entry file with the given extension.
///
/// - `"mac.html"`, `"html"` → true
/// - `"_default.toml"`, `"toml"` → false (partial)
/// - `"Mac.html"`, `"html"` → false (uppercase first letter)
/// - `"mac.htm"`, `"html"` → false
pub fn is_entry(path: &Path, extension: &str) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let starts_lowercase = name.chars().next().is_some_and(|c| c.is_ascii_lowercase());
    starts_lowercase && path.extension().and_then(|e| e.to_str()) == Some(extension)
}

/// Path of the override file for a page: same directory and stem, `.toml`.
pub fn override_path(page: &Path) -> PathBuf {
    page.with_extension(CONFIG_EXTENSION)
}

/// Path of the locale table for `lang` inside the pages directory.
pub fn locale_path(pages_dir: &Path, lang: &str) -> PathBuf {
    pages_dir.join(format!("_{lang}.{CONFIG_EXTENSION}"))
}

/// Output file name for an entry, with the extension swapped.
///
/// `style.scss` → `style.css`; `mac.html` → `mac.html`.
pub fn output_name(source: &Path, extension: &str) -> Option<PathBuf> {
    let stem = source.file_stem()?;
    Some(PathBuf::from(stem).with_extension(extension))
}

/// Name of the compressed sibling of an output file: `style.css` → `style.css.gz`.
pub fn compressed_name(name: &str) -> String {
    format!("{name}.gz")
}

/// List the entry files with `extension` directly inside `dir`.
///
/// Order is whatever the filesystem enumerates; callers must not rely on it.
pub fn entries(dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() && is_entry(entry.path(), extension) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

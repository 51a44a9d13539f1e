//! Per-page configuration.
//!
//! A page sees the site defaults with its own override file laid on top:
//!
//! ```text
//! pages/_default.toml   lang = "en", title = "Site", inline_style_file = "style.css"
//! pages/linux.toml      lang = "fr", title = "Linux"
//! ─────────────────────
//! linux.html renders    lang = "fr", title = "Linux", inline_style_file = "style.css", dev = false
//!                       + inline_style        (contents of public/style.css, production only)
//!                       + inline_fonts_style  (contents of style/_fonts.css, always)
//! ```
//!
//! The merge is shallow: a table in the override replaces the site table of the
//! same name whole. Override keys are not checked against the site keys; only
//! the keys the pipeline itself reads (`lang`, `inline_style_file`) are
//! type-checked, and `dev` always reflects the process mode.

use crate::config::{self, ConfigError, Project, SiteConfig};
use crate::naming;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key naming the built stylesheet to inline in production.
pub const INLINE_STYLE_FILE_KEY: &str = "inline_style_file";
/// Computed key holding the inlined stylesheet.
pub const INLINE_STYLE_KEY: &str = "inline_style";
/// Computed key holding the font fragment.
pub const INLINE_FONTS_STYLE_KEY: &str = "inline_fonts_style";

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("required file missing: {0}")]
    MissingFile(PathBuf),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid override {path}: {source}")]
    Override {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
    #[error("{path}: {message}")]
    InvalidKey { path: PathBuf, message: String },
}

/// Final configuration handed to the template renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPageConfig {
    lang: String,
    props: toml::Table,
}

impl ResolvedPageConfig {
    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn props(&self) -> &toml::Table {
        &self.props
    }

    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.props.get(key)
    }
}

/// Where the resolver finds the files it inlines.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// Built output; `inline_style_file` is relative to it.
    pub output_dir: PathBuf,
    /// Shared font fragment.
    pub fonts_fragment: PathBuf,
}

impl ResolveContext {
    pub fn from_project(project: &Project) -> Self {
        Self {
            output_dir: project.output_dir(),
            fonts_fragment: project.fonts_fragment_path(),
        }
    }
}

/// Shallow merge: every override key replaces the site key of the same name.
pub fn merge_shallow(site: &toml::Table, overlay: toml::Table) -> toml::Table {
    let mut merged = site.clone();
    for (key, value) in overlay {
        merged.insert(key, value);
    }
    merged
}

/// Resolve the configuration for one page.
pub fn resolve(
    site: &SiteConfig,
    page: &Path,
    ctx: &ResolveContext,
) -> Result<ResolvedPageConfig, ResolveError> {
    let override_path = naming::override_path(page);
    let overlay =
        config::read_optional_table(&override_path).map_err(|source| ResolveError::Override {
            path: override_path.clone(),
            source,
        })?;

    let mut props = match overlay {
        Some(overlay) => merge_shallow(site.props(), overlay),
        None => site.props().clone(),
    };
    // The mode flag belongs to the process, not to a page.
    props.insert("dev".to_string(), toml::Value::Boolean(site.dev()));

    let lang = match props.get("lang") {
        Some(toml::Value::String(lang)) if !lang.is_empty() => lang.clone(),
        _ => {
            return Err(ResolveError::InvalidKey {
                path: override_path,
                message: "lang must be a non-empty string".into(),
            });
        }
    };

    if !site.dev() {
        let inline_file = match props.get(INLINE_STYLE_FILE_KEY) {
            None => None,
            Some(toml::Value::String(file)) => Some(file.clone()),
            // The site value is checked on load, so a bad one came from the override.
            Some(_) => {
                return Err(ResolveError::InvalidKey {
                    path: override_path,
                    message: format!("{INLINE_STYLE_FILE_KEY} must be a string"),
                });
            }
        };
        if let Some(file) = inline_file {
            let style = read_required(&ctx.output_dir.join(file))?;
            props.insert(INLINE_STYLE_KEY.to_string(), toml::Value::String(style));
        }
    }

    let fonts = read_required(&ctx.fonts_fragment)?;
    props.insert(
        INLINE_FONTS_STYLE_KEY.to_string(),
        toml::Value::String(fonts),
    );

    Ok(ResolvedPageConfig { lang, props })
}

fn read_required(path: &Path) -> Result<String, ResolveError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ResolveError::MissingFile(path.to_path_buf())
        } else {
            ResolveError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

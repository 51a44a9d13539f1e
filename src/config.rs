//! Pipeline and site configuration.
//!
//! Two configuration sources drive a build:
//!
//! - **`pipeline.toml`** (optional, project root): the tool's own settings,
//!   such as directory layout, dev server port or compression effort. Stock defaults are
//!   overridden by whatever the file specifies. This is also the file the watch
//!   loop monitors to decide when the process must restart.
//! - **`pages/_default.toml`** (required): the site-wide template defaults,
//!   loaded into an immutable [`SiteConfig`]. Keys here are free-form and
//!   handed to templates as-is, except `lang`, which every page needs.
//!
//! ## Project Layout
//!
//! ```text
//! project/
//! ├── pipeline.toml            # Tool config (optional)
//! ├── pages/
//! │   ├── _default.toml        # Site defaults (lang, inline_style_file, ...)
//! │   ├── _en.toml             # Locale table for "en"
//! │   ├── _fr.toml             # Locale table for "fr"
//! │   ├── mac.html             # Page template
//! │   └── mac.toml             # Per-page override (optional)
//! ├── style/
//! │   ├── _fonts.css           # Font fragment, inlined into every page
//! │   └── style.scss
//! ├── js/
//! │   └── app.js
//! └── public/                  # Output
//! ```
//!
//! ## Pipeline Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! pages_dir = "pages"
//! style_dir = "style"
//! script_dir = "js"
//! output_dir = "public"
//! site_config = "pages/_default.toml"
//! fonts_fragment = "style/_fonts.css"
//! canonical_lang = "en"
//!
//! [server]
//! port = 4444
//! default_page = "/mac"
//! reload_delay_ms = 200
//! notify_ms = 3000
//!
//! [style]
//! browsers = ["defaults"]
//! inline_image_max_bytes = 10240
//!
//! [compress]
//! extensions = ["css", "html"]
//! iterations = 15
//!
//! [processing]
//! max_processes = 4         # omit for auto = CPU cores
//! ```
//!
//! Unknown keys in `pipeline.toml` are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the tool config, relative to the project root.
pub const PIPELINE_CONFIG_FILE: &str = "pipeline.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Misconfigured: {0}")]
    Misconfigured(String),
}

// =============================================================================
// Pipeline config (pipeline.toml)
// =============================================================================

/// Tool configuration loaded from `pipeline.toml`.
///
/// Paths are relative to the project root; [`Project`] joins them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding page templates, overrides and locale tables.
    pub pages_dir: String,
    /// Directory holding Sass sources and the font fragment.
    pub style_dir: String,
    /// Directory holding scripts copied verbatim.
    pub script_dir: String,
    /// Build output, also the web root served in watch mode.
    pub output_dir: String,
    /// Site-wide template defaults.
    pub site_config: String,
    /// CSS fragment inlined into every page as `inline_fonts_style`.
    pub fonts_fragment: String,
    /// Source language of the site; missing keys in it are not reported.
    pub canonical_lang: String,
    /// Dev server settings.
    pub server: ServerConfig,
    /// Stylesheet pipeline settings.
    pub style: StyleConfig,
    /// Compression pipeline settings.
    pub compress: CompressConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pages_dir: "pages".to_string(),
            style_dir: "style".to_string(),
            script_dir: "js".to_string(),
            output_dir: "public".to_string(),
            site_config: "pages/_default.toml".to_string(),
            fonts_fragment: "style/_fonts.css".to_string(),
            canonical_lang: "en".to_string(),
            server: ServerConfig::default(),
            style: StyleConfig::default(),
            compress: CompressConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be non-zero".into(),
            ));
        }
        if !self.server.default_page.starts_with('/') || self.server.default_page == "/" {
            return Err(ConfigError::Validation(
                "server.default_page must be an absolute path other than /".into(),
            ));
        }
        if self.style.browsers.is_empty() {
            return Err(ConfigError::Validation(
                "style.browsers must not be empty".into(),
            ));
        }
        if self.compress.iterations == 0 {
            return Err(ConfigError::Validation(
                "compress.iterations must be at least 1".into(),
            ));
        }
        if self.canonical_lang.is_empty() {
            return Err(ConfigError::Validation(
                "canonical_lang must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Dev server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Port the dev server listens on.
    pub port: u16,
    /// Where `/` redirects to (permanent redirect).
    pub default_page: String,
    /// Settle delay between an output change and the browser reload.
    pub reload_delay_ms: u64,
    /// How long a compile-error notice stays on screen.
    pub notify_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4444,
            default_page: "/mac".to_string(),
            reload_delay_ms: 200,
            notify_ms: 3000,
        }
    }
}

/// Stylesheet pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    /// Browserslist queries used for vendor prefixing.
    pub browsers: Vec<String>,
    /// Images at or below this size are inlined as data URIs.
    pub inline_image_max_bytes: u64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            browsers: vec!["defaults".to_string()],
            inline_image_max_bytes: 10 * 1024,
        }
    }
}

/// Compression pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    /// Output-root files with these extensions get a `.gz` sibling.
    pub extensions: Vec<String>,
    /// Zopfli iteration count. Higher is smaller and slower.
    pub iterations: u64,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["css".to_string(), "html".to_string()],
            iterations: 15,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers for page rendering and compression.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default pipeline config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
///
/// Only used for `pipeline.toml`. Page overrides are shallow on purpose, see
/// [`crate::resolve`].
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read an optional TOML table.
///
/// Returns `Ok(None)` when the file does not exist. A single read attempt is
/// made; there is no separate existence check.
pub fn read_optional_table(path: &Path) -> Result<Option<toml::Table>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let table: toml::Table = toml::from_str(&content)?;
    Ok(Some(table))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Table>) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, toml::Value::Table(ov)),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `pipeline.toml` from the project root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(root: &Path) -> Result<PipelineConfig, ConfigError> {
    let overlay = read_optional_table(&root.join(PIPELINE_CONFIG_FILE))?;
    resolve_config(overlay)
}

/// A project root together with its resolved pipeline config.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: PipelineConfig,
}

impl Project {
    /// Load the project rooted at `root`.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            root: root.to_path_buf(),
            config: load_config(root)?,
        })
    }

    pub fn new(root: &Path, config: PipelineConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(PIPELINE_CONFIG_FILE)
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.root.join(&self.config.pages_dir)
    }

    pub fn style_dir(&self) -> PathBuf {
        self.root.join(&self.config.style_dir)
    }

    pub fn script_dir(&self) -> PathBuf {
        self.root.join(&self.config.script_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.config.output_dir)
    }

    pub fn site_config_path(&self) -> PathBuf {
        self.root.join(&self.config.site_config)
    }

    pub fn fonts_fragment_path(&self) -> PathBuf {
        self.root.join(&self.config.fonts_fragment)
    }

    /// Load the site-wide defaults, injecting the `dev` flag.
    pub fn load_site_config(&self, dev: bool) -> Result<SiteConfig, ConfigError> {
        SiteConfig::load(&self.site_config_path(), dev)
    }
}

// =============================================================================
// Site config (pages/_default.toml)
// =============================================================================

/// Site-wide template defaults.
///
/// Built once at startup and never mutated; watch mode swaps in a freshly
/// loaded value instead. The `dev` flag comes from the CLI mode and always
/// replaces any `dev` key present in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    props: toml::Table,
    lang: String,
    dev: bool,
}

impl SiteConfig {
    /// Build from an already-parsed table.
    pub fn from_table(mut props: toml::Table, dev: bool) -> Result<Self, ConfigError> {
        let lang = match props.get("lang") {
            Some(toml::Value::String(lang)) if !lang.is_empty() => lang.clone(),
            Some(_) => {
                return Err(ConfigError::Validation(
                    "lang must be a non-empty string".into(),
                ));
            }
            None => return Err(ConfigError::Validation("lang is required".into())),
        };
        if let Some(value) = props.get("inline_style_file")
            && !value.is_str()
        {
            return Err(ConfigError::Validation(
                "inline_style_file must be a string".into(),
            ));
        }
        props.insert("dev".to_string(), toml::Value::Boolean(dev));
        Ok(Self { props, lang, dev })
    }

    /// Load from a TOML file. The file is required.
    pub fn load(path: &Path, dev: bool) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let props: toml::Table = toml::from_str(&content)?;
        Self::from_table(props, dev).map_err(|e| match e {
            ConfigError::Validation(msg) => {
                ConfigError::Validation(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// All site keys, including the injected `dev` flag.
    pub fn props(&self) -> &toml::Table {
        &self.props
    }

    /// Default page language.
    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn dev(&self) -> bool {
        self.dev
    }

    /// Fail unless this config was built for development.
    ///
    /// Watch mode calls this before doing anything else.
    pub fn require_dev(&self) -> Result<(), ConfigError> {
        if self.dev {
            Ok(())
        } else {
            Err(ConfigError::Misconfigured(
                "watch mode requires the site config to be loaded with dev = true".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table(src: &str) -> toml::Table {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn default_config_has_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.pages_dir, "pages");
        assert_eq!(config.output_dir, "public");
        assert_eq!(config.canonical_lang, "en");
    }

    #[test]
    fn default_server_settings() {
        let config = PipelineConfig::default();
        assert_eq!(config.server.port, 4444);
        assert_eq!(config.server.default_page, "/mac");
        assert_eq!(config.server.reload_delay_ms, 200);
        assert_eq!(config.server.notify_ms, 3000);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.server.port, 4444);
        assert_eq!(config.compress.extensions, vec!["css", "html"]);
    }

    #[test]
    fn load_config_reads_partial_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(PIPELINE_CONFIG_FILE),
            r#"
output_dir = "dist"

[server]
port = 8080
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.output_dir, "dist");
        assert_eq!(config.server.port, 8080);
        // Unspecified values should be defaults
        assert_eq!(config.server.default_page, "/mac");
        assert_eq!(config.pages_dir, "pages");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(PIPELINE_CONFIG_FILE), "this is not valid toml [[[").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let result = resolve_config(Some(table("outptu_dir = \"x\"")));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result = resolve_config(Some(table("[server]\nprot = 1")));
        assert!(result.is_err());
    }

    #[test]
    fn validate_port_zero() {
        let result = resolve_config(Some(table("[server]\nport = 0")));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_default_page_must_be_absolute() {
        let result = resolve_config(Some(table("[server]\ndefault_page = \"mac\"")));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
        let result = resolve_config(Some(table("[server]\ndefault_page = \"/\"")));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_iterations_zero() {
        let result = resolve_config(Some(table("[compress]\niterations = 0")));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base = toml::Value::Table(table("a = 1\nb = 2"));
        let overlay = toml::Value::Table(table("b = 3"));
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_nested_tables_merge() {
        let base = toml::Value::Table(table("[server]\nport = 1\ndefault_page = \"/a\""));
        let overlay = toml::Value::Table(table("[server]\nport = 2"));
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["server"]["port"].as_integer(), Some(2));
        assert_eq!(merged["server"]["default_page"].as_str(), Some("/a"));
    }

    #[test]
    fn read_optional_table_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        let result = read_optional_table(&tmp.path().join("absent.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn read_optional_table_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x.toml");
        fs::write(&path, "title = \"Hi\"").unwrap();
        let result = read_optional_table(&path).unwrap().unwrap();
        assert_eq!(result["title"].as_str(), Some("Hi"));
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_is_clamped_to_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn project_joins_paths_to_root() {
        let project = Project::new(Path::new("/site"), PipelineConfig::default());
        assert_eq!(project.pages_dir(), Path::new("/site/pages"));
        assert_eq!(project.output_dir(), Path::new("/site/public"));
        assert_eq!(
            project.fonts_fragment_path(),
            Path::new("/site/style/_fonts.css")
        );
        assert_eq!(project.config_path(), Path::new("/site/pipeline.toml"));
    }

    // =========================================================================
    // SiteConfig
    // =========================================================================

    #[test]
    fn site_config_injects_dev_flag() {
        let site = SiteConfig::from_table(table("lang = \"en\""), true).unwrap();
        assert!(site.dev());
        assert_eq!(site.props()["dev"].as_bool(), Some(true));
        assert_eq!(site.lang(), "en");
    }

    #[test]
    fn site_config_dev_flag_overrides_file() {
        let site = SiteConfig::from_table(table("lang = \"en\"\ndev = true"), false).unwrap();
        assert!(!site.dev());
        assert_eq!(site.props()["dev"].as_bool(), Some(false));
    }

    #[test]
    fn site_config_requires_lang() {
        let result = SiteConfig::from_table(table("title = \"x\""), false);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn site_config_rejects_non_string_lang() {
        let result = SiteConfig::from_table(table("lang = 3"), false);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn site_config_rejects_non_string_inline_style_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("_default.toml");
        fs::write(&path, "lang = \"en\"\ninline_style_file = 1").unwrap();

        let err = SiteConfig::load(&path, false).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
        let msg = err.to_string();
        assert!(msg.contains("_default.toml"));
        assert!(msg.contains("inline_style_file"));
    }

    #[test]
    fn site_config_missing_file_names_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("_default.toml");
        let err = SiteConfig::load(&path, false).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("_default.toml"));
    }

    #[test]
    fn require_dev_rejects_production_config() {
        let site = SiteConfig::from_table(table("lang = \"en\""), false).unwrap();
        assert!(matches!(
            site.require_dev(),
            Err(ConfigError::Misconfigured(_))
        ));
        let site = SiteConfig::from_table(table("lang = \"en\""), true).unwrap();
        assert!(site.require_dev().is_ok());
    }
}

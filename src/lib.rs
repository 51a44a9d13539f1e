//! # Pagesmith
//!
//! A small static-site asset pipeline. Stylesheets are compiled from Sass,
//! scripts are copied, and HTML pages are rendered from templates with
//! per-page configuration and per-language string tables. Production builds
//! minify and gzip the output; watch mode serves it with live reload.
//!
//! # Pipeline
//!
//! ```text
//! build:  style ──▶ pages ──▶ compress
//!           │         ▲
//!           └─────────┘  pages inline the built stylesheet
//!
//! watch:  style, scripts, pages once, then per changed file:
//!         source change ──▶ stage rebuild ──▶ output change ──▶ browser reload
//! ```
//!
//! A page goes through:
//!
//! ```text
//! pages/_default.toml ─┐
//! pages/mac.toml ──────┴─▶ resolve ─▶ ResolvedPageConfig ─┐
//! pages/_<lang>.toml ──────────────▶ LocaleTable ─────────┼─▶ render ─▶ minify ─▶ public/mac.html
//! pages/mac.html ─────────────────────────────────────────┘
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `pipeline.toml` loading/validation, project paths, the site config |
//! | [`naming`] | Entry vs partial files, sidecar and output names |
//! | [`locale`] | Per-language string tables and the lookup fallback |
//! | [`resolve`] | Site config + page override → the template context |
//! | [`render`] | minijinja environment with the `t` translation filter |
//! | [`pages`] | Page stage: resolve, render, minify, write (parallel) |
//! | [`style`] | Style stage: Sass, prefixing, image inlining, minification |
//! | [`scripts`] | Script stage: verbatim copy |
//! | [`compress`] | Gzip stage with the [`cache`] manifest |
//! | [`transform`] | Pure CSS/HTML/gzip transforms used by the stages |
//! | [`tasks`] | Stage ordering for build and watch |
//! | [`watch`] | Watch loop: change classification and rebuild dispatch |
//! | [`serve`] | Dev server routes |
//! | [`livereload`] | Browser reload channel and client script |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Strict Templates
//!
//! Undefined template variables are errors. A page that references a key no
//! config defines would otherwise ship with a silent hole in it. Production
//! builds are all-or-nothing for the same reason: one broken page fails the
//! build and nothing is written.
//!
//! ## Missing Translations Fall Back
//!
//! The opposite trade-off applies to strings. Templates are written in the
//! canonical language, and a missing key renders the key itself, so an
//! incomplete translation still produces a usable page. Misses are logged for
//! every language but the canonical one.
//!
//! ## Pure-Rust Transforms
//!
//! Sass (`grass`), CSS (`lightningcss`), HTML (`minify-html`) and gzip
//! (`zopfli`) are linked into the binary. There is no Node toolchain to
//! install, and a build is reproducible from the source tree alone.
//!
//! ## One Mode Flag
//!
//! Whether a run is a dev run is decided once from the command line and
//! carried by [`config::SiteConfig`]. Neither the site file nor a page
//! override can change it, and watch mode refuses to start without it.

pub mod cache;
pub mod compress;
pub mod config;
pub mod livereload;
pub mod locale;
pub mod naming;
pub mod output;
pub mod pages;
pub mod render;
pub mod resolve;
pub mod scripts;
pub mod serve;
pub mod style;
pub mod tasks;
pub mod transform;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;

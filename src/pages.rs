//! Page pipeline.
//!
//! Each entry `pages/<name>.html` is resolved, rendered with its language's
//! locale table, minified in production, and written to `<output>/<name>.html`.
//!
//! Pages are independent and render in parallel on the rayon pool. A failing
//! page never stops its siblings, but what happens afterwards depends on the
//! mode:
//!
//! - **Production**: all-or-nothing. If any page failed, no page is written and
//!   the stage fails with the list of failed pages.
//! - **Development**: the pages that rendered are written; the failures are
//!   logged and reported so the watch loop can keep going.

use crate::config::{Project, SiteConfig};
use crate::locale::{LocaleError, LocaleStore};
use crate::naming;
use crate::render::{self, RenderContext, RenderError};
use crate::resolve::{self, ResolveContext, ResolveError};
use crate::transform::{HtmlMinifyOptions, minify_html};
use log::{debug, error};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("cannot list pages in {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Locale(#[from] LocaleError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} page(s) failed, nothing written: {}", .0.len(), .0.join(", "))]
    Failed(Vec<String>),
}

/// One page that could not be built.
#[derive(Debug)]
pub struct PageFailure {
    pub page: PathBuf,
    pub error: PageError,
}

/// Result of a page run.
#[derive(Debug, Default)]
pub struct PageReport {
    /// Output file names, sorted.
    pub written: Vec<PathBuf>,
    /// Development failures, already logged. Always empty in production.
    pub failures: Vec<PageFailure>,
}

struct RenderedPage {
    name: PathBuf,
    html: Vec<u8>,
}

/// Build every page entry. The mode comes from `site.dev()`.
pub fn run(project: &Project, site: &SiteConfig) -> Result<PageReport, PageError> {
    let pages_dir = project.pages_dir();
    let sources = naming::entries(&pages_dir, "html").map_err(|source| PageError::List {
        path: pages_dir.clone(),
        source,
    })?;
    let ctx = ResolveContext::from_project(project);
    let store = LocaleStore::new(&pages_dir, &project.config.canonical_lang);

    let results: Vec<Result<RenderedPage, PageFailure>> = sources
        .par_iter()
        .map(|page| {
            build_page(site, page, &ctx, &store).map_err(|error| PageFailure {
                page: page.clone(),
                error,
            })
        })
        .collect();

    let mut rendered = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(page) => rendered.push(page),
            Err(failure) => {
                error!("{}: {}", failure.page.display(), failure.error);
                failures.push(failure);
            }
        }
    }

    if !site.dev() && !failures.is_empty() {
        let mut names: Vec<String> = failures.iter().map(|f| display_name(&f.page)).collect();
        names.sort();
        return Err(PageError::Failed(names));
    }

    let output_dir = project.output_dir();
    fs::create_dir_all(&output_dir).map_err(|source| PageError::Write {
        path: output_dir.clone(),
        source,
    })?;
    let mut written = Vec::new();
    for page in rendered {
        let path = output_dir.join(&page.name);
        fs::write(&path, &page.html).map_err(|source| PageError::Write {
            path: path.clone(),
            source,
        })?;
        debug!("wrote {} ({} bytes)", path.display(), page.html.len());
        written.push(page.name);
    }
    written.sort();

    Ok(PageReport { written, failures })
}

fn build_page(
    site: &SiteConfig,
    page: &Path,
    ctx: &ResolveContext,
    store: &LocaleStore,
) -> Result<RenderedPage, PageError> {
    let config = resolve::resolve(site, page, ctx)?;
    let locale = Arc::new(store.load(config.lang())?);
    let source = fs::read_to_string(page).map_err(|source| PageError::Read {
        path: page.to_path_buf(),
        source,
    })?;
    let name = display_name(page);
    let html = render::render(
        &source,
        &config,
        &RenderContext {
            name: name.clone(),
            locale,
        },
    )?;
    let html = if site.dev() {
        html.into_bytes()
    } else {
        minify_html(&html, HtmlMinifyOptions::production())
    };
    Ok(RenderedPage {
        name: PathBuf::from(name),
        html,
    })
}

fn display_name(page: &Path) -> String {
    page.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| page.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{file_names, setup_fixtures};

    fn build_style(project: &Project) {
        crate::style::run(project, false).unwrap();
    }

    #[test]
    fn production_renders_minifies_and_inlines_style() {
        let (_tmp, project) = setup_fixtures();
        build_style(&project);
        let site = project.load_site_config(false).unwrap();

        let report = run(&project, &site).unwrap();

        assert_eq!(
            report.written,
            vec![PathBuf::from("linux.html"), PathBuf::from("mac.html")]
        );
        let mac = fs::read_to_string(project.output_dir().join("mac.html")).unwrap();
        assert!(mac.contains("<h1>greeting</h1>"));
        assert!(mac.contains("Download"));
        assert!(mac.contains("@font-face"));
        assert!(!mac.contains("href=/style.css"));
        assert!(!mac.contains("\n<body>"));
    }

    #[test]
    fn override_switches_language() {
        let (_tmp, project) = setup_fixtures();
        build_style(&project);
        let site = project.load_site_config(false).unwrap();

        run(&project, &site).unwrap();

        let linux = fs::read_to_string(project.output_dir().join("linux.html")).unwrap();
        assert!(linux.contains("Bonjour"));
        assert!(linux.contains("Télécharger"));
        assert!(linux.contains("<title>Linux</title>"));
    }

    #[test]
    fn dev_links_stylesheet_and_skips_minify() {
        let (_tmp, project) = setup_fixtures();
        let site = project.load_site_config(true).unwrap();

        run(&project, &site).unwrap();

        let mac = fs::read_to_string(project.output_dir().join("mac.html")).unwrap();
        assert!(mac.contains("<link rel=\"stylesheet\" href=\"/style.css\">\n"));
        assert!(mac.starts_with("<!DOCTYPE html>\n"));
    }

    #[test]
    fn production_failure_writes_nothing() {
        let (_tmp, project) = setup_fixtures();
        build_style(&project);
        fs::write(project.pages_dir().join("broken.html"), "{{ nope }}").unwrap();
        let site = project.load_site_config(false).unwrap();

        let err = run(&project, &site).unwrap_err();

        assert!(matches!(err, PageError::Failed(ref names) if names == &["broken.html"]));
        assert_eq!(file_names(&project.output_dir()), vec!["style.css"]);
    }

    #[test]
    fn dev_failure_keeps_sibling_pages() {
        let (_tmp, project) = setup_fixtures();
        fs::write(project.pages_dir().join("broken.html"), "{{ nope }}").unwrap();
        let site = project.load_site_config(true).unwrap();

        let report = run(&project, &site).unwrap();

        assert_eq!(report.written.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, PageError::Render(_)));
        assert!(!project.output_dir().join("broken.html").exists());
    }

    #[test]
    fn missing_locale_fails_the_page() {
        let (_tmp, project) = setup_fixtures();
        fs::write(project.pages_dir().join("linux.toml"), "lang = \"de\"").unwrap();
        let site = project.load_site_config(true).unwrap();

        let report = run(&project, &site).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].error,
            PageError::Locale(LocaleError::NotFound { .. })
        ));
    }

    #[test]
    fn production_without_built_style_is_missing_file() {
        let (_tmp, project) = setup_fixtures();
        let site = project.load_site_config(false).unwrap();

        let err = run(&project, &site).unwrap_err();
        assert!(matches!(err, PageError::Failed(ref names) if names.len() == 2));
    }
}

//! Stylesheet pipeline.
//!
//! Every entry `style/<name>.scss` becomes `<output>/<name>.css`. Partials
//! (`_*.scss`) are only reachable through `@use`/`@import`.
//!
//! Production runs the full chain:
//!
//! ```text
//! compile → prefix → inline images → minify → write
//! ```
//!
//! Development only compiles, which keeps a save-to-reload cycle short. A
//! compile error in development does not fail the stage: it is logged and
//! returned in [`StyleReport::errors`] so the watch loop can show it in the
//! browser, and the remaining stylesheets are still built.

use crate::config::Project;
use crate::naming;
use crate::transform::{self, InlineReport, TransformError};
use log::{debug, error};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("cannot list stylesheets in {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to compile {path}: {source}")]
    Compile {
        path: PathBuf,
        #[source]
        source: TransformError,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One stylesheet written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOutput {
    pub source: PathBuf,
    /// Output file name relative to the output directory.
    pub name: PathBuf,
    pub bytes: usize,
    /// Image inlining counts. Empty in development.
    pub inline: InlineReport,
}

/// Result of a style run.
#[derive(Debug, Default)]
pub struct StyleReport {
    pub outputs: Vec<StyleOutput>,
    /// Development compile errors, already logged.
    pub errors: Vec<String>,
}

/// Build every stylesheet entry.
pub fn run(project: &Project, dev: bool) -> Result<StyleReport, StyleError> {
    let style_dir = project.style_dir();
    let output_dir = project.output_dir();
    let sources = naming::entries(&style_dir, "scss").map_err(|source| StyleError::List {
        path: style_dir.clone(),
        source,
    })?;
    fs::create_dir_all(&output_dir).map_err(|source| StyleError::Write {
        path: output_dir.clone(),
        source,
    })?;

    let mut report = StyleReport::default();
    for source in sources {
        match build_one(project, &source, dev) {
            Ok(output) => report.outputs.push(output),
            Err(e @ StyleError::Compile { .. }) if dev => {
                error!("{e}");
                report.errors.push(e.to_string());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(report)
}

fn build_one(project: &Project, source: &Path, dev: bool) -> Result<StyleOutput, StyleError> {
    let compile_err = |e: TransformError| StyleError::Compile {
        path: source.to_path_buf(),
        source: e,
    };
    let name = naming::output_name(source, "css").unwrap_or_else(|| PathBuf::from("style.css"));
    let output_dir = project.output_dir();

    let compiled = transform::compile_scss(source).map_err(compile_err)?;
    let (css, inline) = if dev {
        (compiled, InlineReport::default())
    } else {
        let browsers = &project.config.style.browsers;
        let label = name.to_string_lossy();
        let prefixed = transform::process_css(&label, &compiled, browsers, false)
            .map_err(compile_err)?;
        let (inlined, inline) = transform::inline_images(
            &prefixed,
            &output_dir,
            project.config.style.inline_image_max_bytes,
        );
        let minified =
            transform::process_css(&label, &inlined, browsers, true).map_err(compile_err)?;
        (minified, inline)
    };

    let path = output_dir.join(&name);
    fs::write(&path, &css).map_err(|source| StyleError::Write {
        path: path.clone(),
        source,
    })?;
    debug!("wrote {} ({} bytes)", path.display(), css.len());

    Ok(StyleOutput {
        source: source.to_path_buf(),
        name,
        bytes: css.len(),
        inline,
    })
}

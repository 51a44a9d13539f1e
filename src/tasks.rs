//! Task graph.
//!
//! ```text
//! build:      style (production) → pages → compress
//! dev build:  style (dev) → scripts → pages
//! ```
//!
//! Stages run in order because later ones read earlier outputs: pages inline
//! the built stylesheet, compression reads the built pages. The watch loop
//! re-runs single stages through [`run_task`].

use crate::compress::{self, CompressError, CompressReport};
use crate::config::{Project, SiteConfig};
use crate::pages::{self, PageError, PageReport};
use crate::scripts::{self, ScriptError};
use crate::style::{self, StyleError, StyleReport};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("style: {0}")]
    Style(#[from] StyleError),
    #[error("scripts: {0}")]
    Script(#[from] ScriptError),
    #[error("pages: {0}")]
    Page(#[from] PageError),
    #[error("compress: {0}")]
    Compress(#[from] CompressError),
}

/// A single pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Style,
    Scripts,
    Pages,
    Compress,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Task::Style => "style",
            Task::Scripts => "scripts",
            Task::Pages => "pages",
            Task::Compress => "compress",
        };
        f.write_str(name)
    }
}

/// What one stage produced.
#[derive(Debug)]
pub enum TaskReport {
    Style(StyleReport),
    Scripts(Vec<PathBuf>),
    Pages(PageReport),
    Compress(CompressReport),
}

/// Run one stage. The mode comes from `site.dev()`.
pub fn run_task(task: Task, project: &Project, site: &SiteConfig) -> Result<TaskReport, BuildError> {
    Ok(match task {
        Task::Style => TaskReport::Style(style::run(project, site.dev())?),
        Task::Scripts => TaskReport::Scripts(scripts::run(project)?),
        Task::Pages => TaskReport::Pages(pages::run(project, site)?),
        Task::Compress => TaskReport::Compress(compress::run(project, true)?),
    })
}

/// Stages of the one-shot production build.
pub const BUILD: &[Task] = &[Task::Style, Task::Pages, Task::Compress];

/// Stages run once when the dev server starts.
pub const DEV_BUILD: &[Task] = &[Task::Style, Task::Scripts, Task::Pages];

/// Run `tasks` in order, stopping at the first failing stage.
///
/// `on_report` sees each stage's report as soon as it finishes.
pub fn run_tasks(
    tasks: &[Task],
    project: &Project,
    site: &SiteConfig,
    mut on_report: impl FnMut(Task, &TaskReport),
) -> Result<(), BuildError> {
    for &task in tasks {
        let report = run_task(task, project, site)?;
        on_report(task, &report);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{file_names, setup_fixtures};
    use std::fs;

    #[test]
    fn production_build_writes_pages_styles_and_archives() {
        let (_tmp, project) = setup_fixtures();
        let site = project.load_site_config(false).unwrap();

        let mut seen = Vec::new();
        run_tasks(BUILD, &project, &site, |task, _| seen.push(task)).unwrap();

        assert_eq!(seen, BUILD);
        let names = file_names(&project.output_dir());
        for expected in [
            "linux.html",
            "linux.html.gz",
            "mac.html",
            "mac.html.gz",
            "style.css",
            "style.css.gz",
        ] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }
        assert!(!names.contains(&"app.js".to_string()));
    }

    #[test]
    fn dev_build_copies_scripts_and_skips_archives() {
        let (_tmp, project) = setup_fixtures();
        let site = project.load_site_config(true).unwrap();

        run_tasks(DEV_BUILD, &project, &site, |_, _| {}).unwrap();

        let names = file_names(&project.output_dir());
        assert!(names.contains(&"app.js".to_string()));
        assert!(names.contains(&"mac.html".to_string()));
        assert!(!names.iter().any(|n| n.ends_with(".gz")));
    }

    #[test]
    fn failing_stage_stops_the_build() {
        let (_tmp, project) = setup_fixtures();
        fs::write(project.style_dir().join("broken.scss"), "p { color: $nope; }").unwrap();
        let site = project.load_site_config(false).unwrap();

        let mut seen = Vec::new();
        let err = run_tasks(BUILD, &project, &site, |task, _| seen.push(task)).unwrap_err();

        assert!(matches!(err, BuildError::Style(_)));
        assert!(seen.is_empty());
        assert!(!project.output_dir().join("mac.html").exists());
    }

    #[test]
    fn task_names() {
        assert_eq!(Task::Pages.to_string(), "pages");
        assert_eq!(Task::Compress.to_string(), "compress");
    }
}

//! Watch mode: dev build, dev server, and rebuild-on-change.
//!
//! One `notify` watcher covers every source directory non-recursively. Each
//! changed path is classified into a [`Trigger`]:
//!
//! | Path | Action |
//! |---|---|
//! | `pipeline.toml` | stop; the operator restarts with the new config |
//! | site config | reload it, then rebuild pages |
//! | `style/*.scss` | dev style build, then `css` (or `notify` on error) |
//! | `js/*.js` | copy scripts |
//! | `pages/*.{html,toml}`, font fragment | rebuild pages |
//! | `public/*.{js,html}` | `reload` after the settle delay |
//!
//! Events are not coalesced. Every event spawns its own rebuild on the
//! blocking pool, so rebuilds can overlap; the last write wins. A failing
//! rebuild is logged and the loop keeps going.

use crate::config::{ConfigError, Project, SiteConfig};
use crate::livereload::{ReloadMessage, Reloader};
use crate::output;
use crate::serve;
use crate::tasks::{self, Task, TaskReport};
use log::{error, info, warn};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("file watcher: {0}")]
    Notify(#[from] notify::Error),
    #[error("cannot start dev server: {0}")]
    Io(#[from] io::Error),
}

/// Why watch mode stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    /// `pipeline.toml` changed.
    ConfigChanged,
    /// Ctrl-C.
    Interrupted,
}

/// What a changed path asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    PipelineConfig,
    SiteConfig,
    Style,
    Script,
    Page,
    Output,
}

/// Classify a changed path. Unrelated paths (editor swap files, partial
/// outputs, other extensions) yield `None`.
pub fn classify(path: &Path, project: &Project) -> Option<Trigger> {
    if path == project.config_path() {
        return Some(Trigger::PipelineConfig);
    }
    if path == project.site_config_path() {
        return Some(Trigger::SiteConfig);
    }
    if path == project.fonts_fragment_path() {
        return Some(Trigger::Page);
    }
    let parent = path.parent()?;
    let ext = path.extension()?.to_str()?;
    if parent == project.style_dir() && ext == "scss" {
        Some(Trigger::Style)
    } else if parent == project.script_dir() && ext == "js" {
        Some(Trigger::Script)
    } else if parent == project.pages_dir() && (ext == "html" || ext == "toml") {
        Some(Trigger::Page)
    } else if parent == project.output_dir() && (ext == "html" || ext == "js") {
        Some(Trigger::Output)
    } else {
        None
    }
}

/// Shared by the event loop and its rebuild tasks.
pub struct WatchState {
    pub project: Arc<Project>,
    /// Replaced, never mutated, when the site config file changes.
    pub site: RwLock<Arc<SiteConfig>>,
    pub reloader: Reloader,
}

impl WatchState {
    pub fn new(project: Project, site: SiteConfig, reloader: Reloader) -> Self {
        Self {
            project: Arc::new(project),
            site: RwLock::new(Arc::new(site)),
            reloader,
        }
    }
}

/// Run one stage on the blocking pool, logging the outcome.
async fn rebuild(state: &WatchState, task: Task) -> Option<TaskReport> {
    let project = Arc::clone(&state.project);
    let site = Arc::clone(&*state.site.read().await);
    let started = Instant::now();
    let result = tokio::task::spawn_blocking(move || tasks::run_task(task, &project, &site)).await;
    match result {
        Ok(Ok(report)) => {
            info!("{task} rebuilt ({:.1}s)", started.elapsed().as_secs_f64());
            Some(report)
        }
        Ok(Err(e)) => {
            error!("{task} rebuild failed: {e}");
            None
        }
        Err(e) => {
            error!("{task} rebuild panicked: {e}");
            None
        }
    }
}

async fn reload_site_config(state: &WatchState) {
    let project = Arc::clone(&state.project);
    let loaded = tokio::task::spawn_blocking(move || project.load_site_config(true)).await;
    match loaded {
        Ok(Ok(site)) => {
            *state.site.write().await = Arc::new(site);
            info!("site config reloaded");
        }
        Ok(Err(e)) => error!("keeping previous site config: {e}"),
        Err(e) => error!("keeping previous site config: {e}"),
    }
}

async fn style_changed(state: &WatchState) {
    let Some(TaskReport::Style(report)) = rebuild(state, Task::Style).await else {
        return;
    };
    let timeout_ms = state.project.config.server.notify_ms;
    for message in report.errors {
        state
            .reloader
            .send(ReloadMessage::Notify { message, timeout_ms });
    }
    for out in report.outputs {
        state.reloader.send(ReloadMessage::Css {
            path: format!("/{}", out.name.display()),
        });
    }
}

/// Start the work for one trigger. The pipeline config trigger is handled by
/// the event loop and does nothing here.
pub fn dispatch(trigger: Trigger, state: &Arc<WatchState>) -> JoinHandle<()> {
    let state = Arc::clone(state);
    tokio::spawn(async move {
        match trigger {
            Trigger::PipelineConfig => {}
            Trigger::SiteConfig => {
                reload_site_config(&state).await;
                rebuild(&state, Task::Pages).await;
            }
            Trigger::Style => style_changed(&state).await,
            Trigger::Script => {
                rebuild(&state, Task::Scripts).await;
            }
            Trigger::Page => {
                rebuild(&state, Task::Pages).await;
            }
            Trigger::Output => {
                let delay = state.project.config.server.reload_delay_ms;
                tokio::time::sleep(Duration::from_millis(delay)).await;
                state.reloader.send(ReloadMessage::Reload);
            }
        }
    })
}

fn setup_watcher() -> Result<(RecommendedWatcher, mpsc::Receiver<PathBuf>), notify::Error> {
    let (tx, rx) = mpsc::channel(256);
    let watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) if !matches!(event.kind, EventKind::Access(_)) => {
                for path in event.paths {
                    let _ = tx.blocking_send(path);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("watch error: {e}"),
        },
        notify::Config::default(),
    )?;
    Ok((watcher, rx))
}

fn watched_dirs(project: &Project) -> BTreeSet<PathBuf> {
    [
        Some(project.root.clone()),
        Some(project.pages_dir()),
        Some(project.style_dir()),
        Some(project.script_dir()),
        Some(project.output_dir()),
        project.site_config_path().parent().map(Path::to_path_buf),
        project.fonts_fragment_path().parent().map(Path::to_path_buf),
    ]
    .into_iter()
    .flatten()
    .filter(|dir| dir.is_dir())
    .collect()
}

/// Run watch mode until Ctrl-C or a pipeline config change.
///
/// Refuses to start unless `site` was loaded for development; nothing is
/// built or bound in that case.
pub async fn run(project: Project, site: SiteConfig) -> Result<WatchExit, WatchError> {
    site.require_dev()?;

    // Watcher events carry absolute paths.
    let root = project.root.canonicalize()?;
    let project = Project::new(&root, project.config);
    std::fs::create_dir_all(project.output_dir())?;

    let reloader = Reloader::new();
    let state = Arc::new(WatchState::new(project, site, reloader.clone()));

    {
        let project = Arc::clone(&state.project);
        let site = Arc::clone(&*state.site.read().await);
        let initial = tokio::task::spawn_blocking(move || {
            tasks::run_tasks(tasks::DEV_BUILD, &project, &site, |_, report| {
                output::print_task_report(report)
            })
        })
        .await;
        match initial {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("initial build failed: {e}"),
            Err(e) => error!("initial build panicked: {e}"),
        }
    }

    let (mut watcher, mut events) = setup_watcher()?;
    for dir in watched_dirs(&state.project) {
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    }

    let server_config = &state.project.config.server;
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", server_config.port)).await?;
    let app = serve::router(
        &state.project.output_dir(),
        &server_config.default_page,
        reloader,
    );
    info!(
        "serving {} on http://localhost:{}{}",
        state.project.output_dir().display(),
        server_config.port,
        server_config.default_page
    );
    let mut server = tokio::spawn(async move { axum::serve(listener, app).await });

    let exit = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break WatchExit::Interrupted;
            }
            result = &mut server => {
                return match result {
                    Ok(Ok(())) => Ok(WatchExit::Interrupted),
                    Ok(Err(e)) => Err(WatchError::Io(e)),
                    Err(e) => Err(WatchError::Io(io::Error::other(e))),
                };
            }
            Some(path) = events.recv() => {
                let Some(trigger) = classify(&path, &state.project) else {
                    continue;
                };
                if trigger == Trigger::PipelineConfig {
                    info!("{} changed, restart to apply", path.display());
                    break WatchExit::ConfigChanged;
                }
                dispatch(trigger, &state);
            }
        }
    };
    server.abort();
    Ok(exit)
}

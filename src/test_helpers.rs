//! Shared test utilities.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (tmp, project) = setup_fixtures();
//! let site = project.load_site_config(false).unwrap();
//! ```

use crate::config::{self, Project};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::path::Path;
use std::sync::Once;
use tempfile::TempDir;

/// Copy `fixtures/site/` to a temp directory and load it as a project.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures. Keep the `TempDir` alive for the test's duration.
pub fn setup_fixtures() -> (TempDir, Project) {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    let project = Project::load(tmp.path()).unwrap();
    (tmp, project)
}

/// Same as [`setup_fixtures`] with a custom `pipeline.toml`.
pub fn setup_fixtures_with_config(pipeline_toml: &str) -> (TempDir, Project) {
    let (tmp, _) = setup_fixtures();
    std::fs::write(tmp.path().join(config::PIPELINE_CONFIG_FILE), pipeline_toml).unwrap();
    let project = Project::load(tmp.path()).unwrap();
    (tmp, project)
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Names of the files directly inside `dir`, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

thread_local! {
    static CAPTURED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Records go to a per-thread buffer, so parallel tests do not see each
/// other's output.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED.with(|c| {
            c.borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT_LOGGER: Once = Once::new();

/// Run `f` and return its result with every log record it emitted on this thread.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<(Level, String)>) {
    INIT_LOGGER.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
    CAPTURED.with(|c| c.borrow_mut().clear());
    let result = f();
    let logs = CAPTURED.with(|c| c.borrow_mut().drain(..).collect());
    (result, logs)
}

//! Script pipeline: entry scripts are copied byte-for-byte to the output root.

use crate::config::Project;
use crate::naming;
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("cannot copy {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Copy every `js/[a-z]*.js`. Returns the output file names.
///
/// A project without a script directory has nothing to copy.
pub fn run(project: &Project) -> Result<Vec<PathBuf>, ScriptError> {
    let script_dir = project.script_dir();
    if !script_dir.is_dir() {
        return Ok(Vec::new());
    }
    let output_dir = project.output_dir();
    fs::create_dir_all(&output_dir).map_err(io_err(&output_dir))?;

    let mut copied = Vec::new();
    for source in naming::entries(&script_dir, "js").map_err(io_err(&script_dir))? {
        let Some(name) = source.file_name().map(PathBuf::from) else {
            continue;
        };
        let dest = output_dir.join(&name);
        fs::copy(&source, &dest).map_err(io_err(&source))?;
        debug!("copied {} -> {}", source.display(), dest.display());
        copied.push(name);
    }
    copied.sort();
    Ok(copied)
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ScriptError {
    let path = path.to_path_buf();
    move |source| ScriptError::Io { path, source }
}

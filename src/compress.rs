//! Compression pipeline.
//!
//! Every file directly in the output directory whose extension is listed in
//! `compress.extensions` gets a gzip sibling (`style.css` → `style.css.gz`).
//! Files are compressed in parallel. The [`cache`](crate::cache) manifest
//! skips files whose content and codec settings are unchanged.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::config::Project;
use crate::naming;
use crate::transform;
use log::debug;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("cannot list {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("cannot compress {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of a compression run.
#[derive(Debug, Default)]
pub struct CompressReport {
    /// Source file names that now have an up-to-date `.gz`, sorted.
    pub files: Vec<String>,
    pub stats: CacheStats,
}

enum Outcome {
    Cached,
    Compressed,
}

/// Compress the configured outputs. `use_cache = false` recompresses everything.
pub fn run(project: &Project, use_cache: bool) -> Result<CompressReport, CompressError> {
    let output_dir = project.output_dir();
    let targets = targets(&output_dir, &project.config.compress.extensions)?;
    let iterations = project.config.compress.iterations;
    let params_hash = cache::hash_compress_params(iterations);
    let manifest = if use_cache {
        CacheManifest::load(&output_dir)
    } else {
        CacheManifest::empty()
    };

    let results: Vec<Result<(String, String, Outcome), CompressError>> = targets
        .par_iter()
        .map(|name| {
            let path = output_dir.join(name);
            let io_err = |source| CompressError::Io {
                path: path.clone(),
                source,
            };
            let data = fs::read(&path).map_err(io_err)?;
            let source_hash = cache::hash_bytes(&data);
            if manifest.is_fresh(name, &source_hash, &params_hash, &output_dir) {
                debug!("{name}: unchanged");
                return Ok((name.clone(), source_hash, Outcome::Cached));
            }
            let gz = transform::gzip(&data, iterations).map_err(io_err)?;
            fs::write(output_dir.join(naming::compressed_name(name)), &gz).map_err(io_err)?;
            debug!("{name}: {} -> {} bytes", data.len(), gz.len());
            Ok((name.clone(), source_hash, Outcome::Compressed))
        })
        .collect();

    let mut manifest = manifest;
    let mut report = CompressReport::default();
    for result in results {
        let (name, source_hash, outcome) = result?;
        match outcome {
            Outcome::Cached => report.stats.hit(),
            Outcome::Compressed => report.stats.miss(),
        }
        manifest.insert(name.clone(), source_hash, params_hash.clone());
        report.files.push(name);
    }
    report.files.sort();

    manifest.retain_existing(&output_dir);
    manifest.save(&output_dir).map_err(|source| CompressError::Io {
        path: cache::manifest_path(&output_dir),
        source,
    })?;
    Ok(report)
}

/// Output-root files with one of `extensions`, by file name.
fn targets(output_dir: &Path, extensions: &[String]) -> Result<Vec<String>, CompressError> {
    let mut names = Vec::new();
    for entry in WalkDir::new(output_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| CompressError::List {
            path: output_dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|want| want == ext));
        if matches && let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

//! Compression cache for incremental builds.
//!
//! Zopfli is slow on purpose; a site with a handful of pages spends most of a
//! production build in the compression stage. This module lets that stage skip
//! files whose content and codec parameters have not changed since the last
//! build.
//!
//! ## Cache keys
//!
//! Entries are keyed by output file name (`mac.html`) and store two hashes:
//!
//! - **`source_hash`**: SHA-256 of the uncompressed file. Content-based rather
//!   than mtime-based, because every build rewrites the outputs and resets
//!   their modification times even when nothing changed.
//! - **`params_hash`**: SHA-256 of the codec parameters (format, iteration
//!   count). Raising `compress.iterations` recompresses everything.
//!
//! A hit requires a matching entry **and** the `.gz` sibling still on disk.
//!
//! ## Storage
//!
//! The manifest is `<output_dir>/.compress-cache.json`. It travels with the
//! output directory, and an unreadable or outdated manifest is treated as
//! empty.

use crate::naming;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".compress-cache.json";

/// Version of the manifest format. Bump to invalidate existing caches.
const MANIFEST_VERSION: u32 = 1;

/// Hashes recorded for one compressed output.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// On-disk manifest mapping output file names to their cache entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
}

impl CacheManifest {
    /// An empty manifest: the first build, or a corrupt/outdated file.
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from the output directory. Never fails.
    pub fn load(output_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(manifest_path(output_dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(m) if m.version == MANIFEST_VERSION => m,
            _ => Self::empty(),
        }
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// True when `name` was compressed from identical content with identical
    /// parameters and its `.gz` sibling still exists.
    pub fn is_fresh(
        &self,
        name: &str,
        source_hash: &str,
        params_hash: &str,
        output_dir: &Path,
    ) -> bool {
        let Some(entry) = self.entries.get(name) else {
            return false;
        };
        entry.source_hash == source_hash
            && entry.params_hash == params_hash
            && output_dir.join(naming::compressed_name(name)).exists()
    }

    pub fn insert(&mut self, name: String, source_hash: String, params_hash: String) {
        self.entries.insert(
            name,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }

    /// Drop entries for outputs that no longer exist.
    pub fn retain_existing(&mut self, output_dir: &Path) {
        self.entries
            .retain(|name, _| output_dir.join(name).exists());
    }
}

/// SHA-256 of a byte slice, as lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 of the compression parameters.
pub fn hash_compress_params(iterations: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"gzip-zopfli\0");
    hasher.update(iterations.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cache outcome counts for one compression run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cached, {} compressed", self.hits, self.misses)
    }
}

/// Path of the cache manifest inside an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}

//! Cache-Directory Scanner: walks a module cache and produces, for every
//! import path, the set of on-disk directories that provide it, each
//! tagged with a semantic version and modification time.
//!
//! Descent is `walkdir::WalkDir`, the same crate and `filter_entry`/
//! `follow_links` idiom the teacher uses for its own cache/index walks
//! (`examples/elba-elba/src/lib/retrieve/cache.rs:577-585`'s hashing walk
//! skips `target`/dot directories via `filter_entry`; `remote/index.rs:
//! 303-307`'s `packages()` walk bounds depth and strips the root prefix
//! the same way this module does). `follow_links(true)` gets symlink-loop
//! detection for free instead of hand-rolled `fs::canonicalize` bookkeeping.

use crate::cancel::Cancel;
use crate::types::{CacheDir, RelDir, Version};
use slog::{o, warn, Logger};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

const SOURCE_EXT: &str = "go";

/// One candidate directory discovered by a scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub rel_dir: RelDir,
    pub version: Version,
    pub mtime: SystemTime,
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub candidates: Vec<Candidate>,
    /// Human-readable descriptions of directories that were skipped due to
    /// a transient error or an unencodable path. Not authoritative; callers
    /// should rely on the logger for anything beyond test assertions.
    pub warnings: Vec<String>,
}

/// Characters the textual index format can't represent in a field.
fn has_unencodable_chars(s: &str) -> bool {
    s.contains('\u{1f}') || s.contains('\n') || s.contains('\r')
}

/// True if `name` (a single path component) should prune its whole subtree:
/// hidden (dotfile-style) or underscore-prefixed directories.
fn is_pruned_name(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

/// The version carried by the nearest ancestor (inclusive of `dir` itself)
/// that is a versioned root, i.e. whose basename contains `@`. `None` if
/// `dir` isn't under any versioned root at all.
fn version_for(root: &Path, dir: &Path) -> Option<Version> {
    let rel = dir.strip_prefix(root).ok()?;
    let mut version = None;
    for component in rel.components() {
        let name = component.as_os_str().to_string_lossy();
        if let Some(at) = name.find('@') {
            version = Some(Version::parse(&name[at + 1..]));
        }
    }
    version
}

/// Scans `cache_dir` for package directories whose modification time lies
/// in `[after, before)`.
pub fn scan(
    cache_dir: &CacheDir,
    after: SystemTime,
    before: SystemTime,
    cancel: &Cancel,
    logger: &Logger,
) -> ScanResult {
    let logger = logger.new(o!("component" => "scan"));
    let mut result = ScanResult::default();
    let root = cache_dir.as_path();

    let walker = WalkDir::new(root).follow_links(true).into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || entry.file_type().is_file()
            || !is_pruned_name(&entry.file_name().to_string_lossy())
    });

    // A package directory is recorded once, not once per source file, so
    // directories are gathered here and visited once below.
    let mut dirs_with_source: HashSet<PathBuf> = HashSet::new();

    for entry in walker {
        if cancel.is_cancelled() {
            return result;
        }
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                warn!(logger, "could not walk directory entry"; "path" => %path, "error" => %e);
                result.warnings.push(format!("could not walk {}: {}", path, e));
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().map(|e| e == SOURCE_EXT).unwrap_or(false) {
            if let Some(parent) = entry.path().parent() {
                dirs_with_source.insert(parent.to_path_buf());
            }
        }
    }

    for dir in &dirs_with_source {
        record(root, dir, after, before, &logger, &mut result);
    }

    result
}

fn record(
    root: &Path,
    dir: &Path,
    after: SystemTime,
    before: SystemTime,
    logger: &Logger,
    result: &mut ScanResult,
) {
    let version = match version_for(root, dir) {
        Some(v) => v,
        None => return,
    };

    let mtime = match std::fs::metadata(dir).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(e) => {
            warn!(logger, "could not read mtime"; "path" => %dir.display(), "error" => %e);
            result
                .warnings
                .push(format!("could not stat mtime of {}: {}", dir.display(), e));
            return;
        }
    };

    if mtime < after || mtime >= before {
        return;
    }

    let rel = match dir.strip_prefix(root) {
        Ok(r) => r.to_path_buf(),
        Err(_) => return,
    };
    let rel_str = rel.to_string_lossy();
    if has_unencodable_chars(&rel_str) {
        warn!(logger, "path has unencodable characters, skipping"; "path" => %rel_str);
        result
            .warnings
            .push(format!("skipping unencodable path {}", rel_str));
        return;
    }

    result.candidates.push(Candidate {
        rel_dir: RelDir(rel),
        version,
        mtime,
    });
}

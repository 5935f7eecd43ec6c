//! Incremental Updater: combines a prior on-disk index with a filesystem
//! scan restricted to directories changed since that index's timestamp,
//! producing a new index equivalent to a full rebuild without re-parsing
//! everything.
//!
//! The new index's timestamp is captured *before* scanning, and doubles as
//! the exclusive upper bound passed to the scan. The next update's scan
//! then uses that same timestamp as its inclusive lower bound, so a
//! directory can never be missed by falling in the gap between "when we
//! stopped scanning" and "what we recorded as having scanned up to" (see
//! DESIGN.md).

use crate::cancel::Cancel;
use crate::codec::{reader, writer};
use crate::err::{ErrorKind, Res};
use crate::extract::{self, Platform};
use crate::resolve;
use crate::scan::{self, Candidate};
use crate::types::{CacheDir, Entry, ImportPath, Index};
use chrono::{DateTime, Utc};
use slog::{debug, info, o, warn, Logger};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

fn system_time_from(dt: DateTime<Utc>) -> SystemTime {
    let secs = dt.timestamp().max(0) as u64;
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs) + Duration::from_nanos(u64::from(dt.timestamp_subsec_nanos()))
}

/// Extracts one entry for `import_path` from `candidate`'s directory.
/// Returns `None` if the directory parses to no package clause at all --
/// the extractor's "skip, not an error" case.
fn extract_entry(
    cache_dir: &CacheDir,
    import_path: &ImportPath,
    candidate: &Candidate,
    platform: Platform,
    cancel: &Cancel,
    logger: &Logger,
) -> Option<Entry> {
    let dir = cache_dir.as_path().join(candidate.rel_dir.as_path());
    let extracted = extract::extract_package(&dir, platform, cancel, logger)?;
    Some(Entry::new(
        extracted.pkg_name,
        import_path.clone(),
        candidate.rel_dir.clone(),
        candidate.version.clone(),
        extracted.symbols,
    ))
}

/// Runs a full build over `cache_dir`: scans every directory, resolves one
/// winner per import path, and extracts its symbols.
pub fn build_full(cache_dir: &CacheDir, platform: Platform, cancel: &Cancel, logger: &Logger) -> Res<Index> {
    let logger = logger.new(o!("component" => "update", "mode" => "full"));
    let now = Utc::now();
    let before = system_time_from(now);

    let scanned = scan::scan(cache_dir, SystemTime::UNIX_EPOCH, before, cancel, &logger);
    if cancel.is_cancelled() {
        return Err(ErrorKind::Cancelled.into());
    }

    let grouped = resolve::group_by_import_path(scanned.candidates);
    let resolved = resolve::resolve(&grouped);

    let mut entries = Vec::with_capacity(resolved.len());
    for (import_path, candidate) in &resolved {
        if cancel.is_cancelled() {
            return Err(ErrorKind::Cancelled.into());
        }
        if let Some(entry) = extract_entry(cache_dir, import_path, candidate, platform, cancel, &logger) {
            entries.push(entry);
        }
    }

    debug!(logger, "full build complete"; "entries" => entries.len(), "scan_warnings" => scanned.warnings.len());
    Ok(Index::new(now, cache_dir.clone(), entries))
}

/// Runs an incremental build against `prior`: scans only directories with
/// `mtime >= prior.timestamp`, re-extracts entries the Resolver's rule
/// says are displaced, and carries every other prior entry forward
/// verbatim.
pub fn build_incremental(
    prior: &Index,
    cache_dir: &CacheDir,
    platform: Platform,
    cancel: &Cancel,
    logger: &Logger,
) -> Res<Index> {
    let logger = logger.new(o!("component" => "update", "mode" => "incremental"));
    let now = Utc::now();
    let after = system_time_from(prior.timestamp);
    let before = system_time_from(now);

    let scanned = scan::scan(cache_dir, after, before, cancel, &logger);
    if cancel.is_cancelled() {
        return Err(ErrorKind::Cancelled.into());
    }

    let grouped = resolve::group_by_import_path(scanned.candidates);
    let new_resolved = resolve::resolve(&grouped);

    let prior_by_path: HashMap<&ImportPath, &Entry> =
        prior.entries.iter().map(|e| (&e.import_path, e)).collect();

    let mut touched: HashSet<ImportPath> = HashSet::new();
    let mut entries = Vec::new();

    for (import_path, candidate) in &new_resolved {
        if cancel.is_cancelled() {
            return Err(ErrorKind::Cancelled.into());
        }
        touched.insert(import_path.clone());

        match prior_by_path.get(import_path) {
            None => {
                if let Some(entry) = extract_entry(cache_dir, import_path, candidate, platform, cancel, &logger) {
                    entries.push(entry);
                }
            }
            Some(prior_entry) => {
                // The prior entry's real on-disk mtime isn't stored in the
                // index (only the build's overall timestamp is, per the
                // data model); the index's own timestamp is the tightest
                // available upper bound on it, so it stands in here for
                // the Resolver's mtime tie-break (documented in DESIGN.md).
                let prior_candidate = Candidate {
                    rel_dir: prior_entry.rel_dir.clone(),
                    version: prior_entry.version.clone(),
                    mtime: after,
                };
                match resolve::winner(candidate, &prior_candidate) {
                    Ordering::Greater => {
                        match extract_entry(cache_dir, import_path, candidate, platform, cancel, &logger) {
                            Some(entry) => entries.push(entry),
                            None => entries.push((*prior_entry).clone()),
                        }
                    }
                    Ordering::Equal | Ordering::Less => entries.push((*prior_entry).clone()),
                }
            }
        }
    }

    for entry in &prior.entries {
        if !touched.contains(&entry.import_path) {
            entries.push(entry.clone());
        }
    }

    debug!(logger, "incremental build complete"; "entries" => entries.len(), "new_candidates" => new_resolved.len());
    Ok(Index::new(now, cache_dir.clone(), entries))
}

/// Loads the prior index for `cache_dir`, if any. `NoIndex`,
/// `PermanentCorruption`, and `TransientIo` are absorbed here ("act as if
/// no index exists"); `Cancelled` and `Unknown` escalate to the caller.
fn load_prior(ixdir: &Path, logger: &Logger) -> Res<Option<Index>> {
    match reader::open(ixdir, logger) {
        Ok(loaded) => Ok(Some(loaded.index)),
        Err(e) if e.kind().is_recoverable_by_full_build() => {
            warn!(logger, "no usable prior index, falling back to full build"; "reason" => %e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Builds a fresh index for `cache_dir` -- incrementally against whatever
/// index is currently published under `ixdir`, or from scratch if none
/// loads cleanly -- and publishes it. Returns the path of the newly
/// written index file. Never publishes a partial index: on cancellation,
/// nothing is written and the previously published index, if any, is left
/// untouched.
pub fn update(ixdir: &Path, cache_dir: &CacheDir, platform: Platform, cancel: &Cancel, logger: &Logger) -> Res<PathBuf> {
    let logger = logger.new(o!("component" => "update"));
    let prior = load_prior(ixdir, &logger)?;

    let index = match prior {
        Some(prior) => build_incremental(&prior, cache_dir, platform, cancel, &logger)?,
        None => build_full(cache_dir, platform, cancel, &logger)?,
    };

    if cancel.is_cancelled() {
        return Err(ErrorKind::Cancelled.into());
    }

    info!(logger, "publishing updated index"; "entries" => index.entries.len());
    writer::publish(ixdir, &index, &logger)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use std::thread;
    use tempdir::TempDir;

    fn touch(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn full_build_picks_semver_latest() {
        let cache = TempDir::new("update").unwrap();
        touch(
            &cache.path().join("example.com/lib@v0.1.0/lib.go"),
            "package lib\n\nfunc F() {}\n",
        );
        touch(
            &cache.path().join("example.com/lib@v0.2.0/lib.go"),
            "package lib\n\nfunc F() {}\n",
        );

        let cache_dir = CacheDir(cache.path().to_path_buf());
        let cancel = Cancel::new();
        let logger = crate::log::discard();
        let index = build_full(&cache_dir, Platform::default(), &cancel, &logger).unwrap();

        assert_eq!(index.entries.len(), 1);
        assert_eq!(index.entries[0].version.as_str(), "v0.2.0");
    }

    #[test]
    fn incremental_build_carries_unchanged_entries_and_updates_changed_ones() {
        let cache = TempDir::new("update").unwrap();
        touch(
            &cache.path().join("example.com/a@v1.0.0/a.go"),
            "package a\n\nfunc A() {}\n",
        );
        touch(
            &cache.path().join("example.com/b@v1.0.0/b.go"),
            "package b\n\nfunc B() {}\n",
        );

        let cache_dir = CacheDir(cache.path().to_path_buf());
        let cancel = Cancel::new();
        let logger = crate::log::discard();
        let first = build_full(&cache_dir, Platform::default(), &cancel, &logger).unwrap();
        let a_before = first
            .entries
            .iter()
            .find(|e| e.import_path.as_str() == "example.com/a")
            .unwrap()
            .clone();

        // Filesystem mtime resolution on many platforms is coarse (whole
        // seconds); wait past it so the new directory's mtime reliably
        // lands at or after `first.timestamp`.
        thread::sleep(Duration::from_millis(1100));
        touch(
            &cache.path().join("example.com/b@v2.0.0/b.go"),
            "package b\n\nfunc B() {}\nfunc C() {}\n",
        );

        let second = build_incremental(&first, &cache_dir, Platform::default(), &cancel, &logger).unwrap();

        let a_after = second
            .entries
            .iter()
            .find(|e| e.import_path.as_str() == "example.com/a")
            .unwrap();
        assert_eq!(&a_before, a_after);

        let b_after = second
            .entries
            .iter()
            .find(|e| e.import_path.as_str() == "example.com/b")
            .unwrap();
        assert_eq!(b_after.version.as_str(), "v2.0.0");
        assert_eq!(b_after.symbols.len(), 2);
    }

    #[test]
    fn update_is_idempotent_with_no_filesystem_changes() {
        let cache = TempDir::new("update").unwrap();
        let ix = TempDir::new("update-ix").unwrap();
        touch(
            &cache.path().join("example.com/a@v1.0.0/a.go"),
            "package a\n\nfunc A() {}\n",
        );

        let cache_dir = CacheDir(cache.path().to_path_buf());
        let cancel = Cancel::new();
        let logger = crate::log::discard();

        update(ix.path(), &cache_dir, Platform::default(), &cancel, &logger).unwrap();
        let first = reader::open(ix.path(), &logger).unwrap().index;

        thread::sleep(Duration::from_millis(1100));
        update(ix.path(), &cache_dir, Platform::default(), &cancel, &logger).unwrap();
        let second = reader::open(ix.path(), &logger).unwrap().index;

        assert_eq!(first.entries, second.entries);
    }

    #[test]
    fn missing_prior_index_falls_back_to_full_build() {
        let cache = TempDir::new("update").unwrap();
        let ix = TempDir::new("update-ix").unwrap();
        touch(
            &cache.path().join("example.com/a@v1.0.0/a.go"),
            "package a\n\nfunc A() {}\n",
        );
        let cache_dir = CacheDir(cache.path().to_path_buf());
        let cancel = Cancel::new();
        let logger = crate::log::discard();

        let path = update(ix.path(), &cache_dir, Platform::default(), &cancel, &logger).unwrap();
        assert!(path.exists());
        let loaded = reader::open(ix.path(), &logger).unwrap();
        assert_eq!(loaded.index.entries.len(), 1);
    }
}

//! Lookup service: answers completion queries against a loaded, immutable
//! index snapshot, plus the consumer-facing entry points for opening,
//! building, and refreshing an index.
//!
//! A `Handle` is cheap to clone (an `Arc` around the loaded snapshot) and
//! safe to share across reader threads: lookups are read-only and the
//! snapshot they run against never mutates once loaded.

use crate::cancel::Cancel;
use crate::codec::reader::{self, Loaded};
use crate::codec::writer;
use crate::config;
use crate::err::Res;
use crate::extract::Platform;
use crate::types::{CacheDir, Entry, PkgName, Symbol};
use crate::update;
use slog::Logger;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which kind of build `build()`/`build_default()` should run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    /// Rescans the whole cache directory from scratch.
    Full,
    /// Reuses the index currently published at the index directory,
    /// rescanning only what changed since it was built.
    Incremental,
}

/// A frozen, shareable snapshot of a loaded index. Every `Handle` obtained
/// from `open`/`refresh` sees a consistent view; lookups never reach back
/// out to disk.
#[derive(Clone)]
pub struct Handle {
    ixdir: PathBuf,
    loaded: Arc<Loaded>,
}

impl Handle {
    /// Loads the most recent index at the default, platform-specific
    /// index directory (see `config::index_dir`).
    pub fn open(logger: &Logger) -> Res<Self> {
        Handle::open_at(&config::index_dir(), logger)
    }

    /// Loads the most recent index published under `ixdir`.
    pub fn open_at(ixdir: &Path, logger: &Logger) -> Res<Self> {
        let loaded = reader::open(ixdir, logger)?;
        Ok(Handle {
            ixdir: ixdir.to_path_buf(),
            loaded: Arc::new(loaded),
        })
    }

    /// Re-reads the pointer file and returns a new snapshot (or an
    /// equivalent one, if the pointer hasn't moved). Does not mutate
    /// `self`; returns the handle the caller should use going forward.
    pub fn refresh(&self, logger: &Logger) -> Res<Self> {
        Handle::open_at(&self.ixdir, logger)
    }

    /// The cache directory this handle's index was built over.
    pub fn cache_dir(&self) -> &CacheDir {
        &self.loaded.index.cache_dir
    }

    /// All exported symbols named `pkg_name` whose `Name` begins with (or,
    /// if `exact`, equals) `prefix`. Result order is grouped by Entry order
    /// then by Symbol order within an Entry, which is already ascending by
    /// name, so the returned list is sorted.
    pub fn lookup(&self, pkg_name: &str, prefix: &str, exact: bool) -> Vec<Symbol> {
        let key = PkgName(pkg_name.to_string());
        let mut out = Vec::new();
        let indices = match self.loaded.by_pkg_name.get(&key) {
            Some(indices) => indices,
            None => return out,
        };
        for &i in indices {
            let entry = &self.loaded.index.entries[i];
            for sym in &entry.symbols {
                let matches = if exact {
                    sym.name() == prefix
                } else {
                    sym.name().starts_with(prefix)
                };
                if matches {
                    out.push(sym.clone());
                }
            }
        }
        out
    }

    /// Entries named `pkg_name` whose symbol set is a superset of `names`.
    /// Used to prune candidate packages when several wanted symbols are
    /// already known. An empty `names` list matches nothing -- there is no
    /// useful signal to intersect on.
    pub fn lookup_all(&self, pkg_name: &str, names: &[&str]) -> Vec<Entry> {
        if names.is_empty() {
            return Vec::new();
        }
        let key = PkgName(pkg_name.to_string());
        let mut out = Vec::new();
        let indices = match self.loaded.by_pkg_name.get(&key) {
            Some(indices) => indices,
            None => return out,
        };
        for &i in indices {
            let entry = &self.loaded.index.entries[i];
            let have: HashSet<&str> = entry.symbols.iter().map(Symbol::name).collect();
            if names.iter().all(|n| have.contains(n)) {
                out.push(entry.clone());
            }
        }
        out
    }
}

/// Runs the writer over `cache_dir`: a full rebuild or an incremental
/// update, publishing the result under `ixdir`.
pub fn build(
    ixdir: &Path,
    cache_dir: &CacheDir,
    mode: BuildMode,
    platform: Platform,
    cancel: &Cancel,
    logger: &Logger,
) -> Res<PathBuf> {
    match mode {
        BuildMode::Full => {
            let index = update::build_full(cache_dir, platform, cancel, logger)?;
            writer::publish(ixdir, &index, logger)
        }
        BuildMode::Incremental => update::update(ixdir, cache_dir, platform, cancel, logger),
    }
}

/// Like `build`, but at the default index directory.
pub fn build_default(cache_dir: &CacheDir, mode: BuildMode, platform: Platform, cancel: &Cancel, logger: &Logger) -> Res<PathBuf> {
    build(&config::index_dir(), cache_dir, mode, platform, cancel, logger)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempdir::TempDir;

    fn touch(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn setup_foo_package(cache: &Path) {
        touch(
            &cache.join("example.com/foo@v1.0.0/foo.go"),
            "package foo\n\nconst FooC = 1\nvar FooV = 2\ntype FooT struct{}\nfunc Foo() {}\nfunc FooF() {}\nfunc Goo() {}\n",
        );
    }

    #[test]
    fn prefix_lookup_returns_ascending_matches_only() {
        let cache = TempDir::new("lookup").unwrap();
        let ix = TempDir::new("lookup-ix").unwrap();
        setup_foo_package(cache.path());

        let cache_dir = CacheDir(cache.path().to_path_buf());
        let cancel = Cancel::new();
        let logger = crate::log::discard();
        build(ix.path(), &cache_dir, BuildMode::Full, Platform::default(), &cancel, &logger).unwrap();

        let handle = Handle::open_at(ix.path(), &logger).unwrap();
        let syms = handle.lookup("foo", "Foo", false);
        let names: Vec<&str> = syms.iter().map(Symbol::name).collect();
        // Everything whose name begins with "Foo": Foo, FooC, FooF, FooT, FooV --
        // "Goo" does not share the prefix.
        assert_eq!(names, vec!["Foo", "FooC", "FooF", "FooT", "FooV"]);
    }

    #[test]
    fn exact_lookup_returns_at_most_one_symbol() {
        let cache = TempDir::new("lookup").unwrap();
        let ix = TempDir::new("lookup-ix").unwrap();
        setup_foo_package(cache.path());

        let cache_dir = CacheDir(cache.path().to_path_buf());
        let cancel = Cancel::new();
        let logger = crate::log::discard();
        build(ix.path(), &cache_dir, BuildMode::Full, Platform::default(), &cancel, &logger).unwrap();

        let handle = Handle::open_at(ix.path(), &logger).unwrap();
        let syms = handle.lookup("foo", "Foo", true);
        assert_eq!(syms.len(), 1);
        assert_eq!(syms[0].name(), "Foo");
    }

    #[test]
    fn lookup_all_intersects_across_modules() {
        let cache = TempDir::new("lookup").unwrap();
        let ix = TempDir::new("lookup-ix").unwrap();

        touch(
            &cache.path().join("example.com/m1@v1.0.0/m1.go"),
            "package foo\n\nfunc A() {}\nfunc B() {}\nfunc C() {}\nfunc D() {}\n",
        );
        touch(
            &cache.path().join("example.com/m2@v1.0.0/m2.go"),
            "package foo\n\nfunc A() {}\nfunc B() {}\nfunc C() {}\n",
        );
        touch(
            &cache.path().join("example.com/m3@v1.0.0/m3.go"),
            "package foo\n\nfunc A() {}\nfunc B() {}\nfunc C() {}\nfunc D() {}\nfunc E() {}\n",
        );

        let cache_dir = CacheDir(cache.path().to_path_buf());
        let cancel = Cancel::new();
        let logger = crate::log::discard();
        build(ix.path(), &cache_dir, BuildMode::Full, Platform::default(), &cancel, &logger).unwrap();

        let handle = Handle::open_at(ix.path(), &logger).unwrap();
        let entries = handle.lookup_all("foo", &["A", "B", "C", "D"]);
        assert_eq!(entries.len(), 2);
        let mut import_paths: Vec<&str> = entries.iter().map(|e| e.import_path.as_str()).collect();
        import_paths.sort();
        assert_eq!(import_paths, vec!["example.com/m1", "example.com/m3"]);
    }

    #[test]
    fn lookup_all_with_no_names_returns_nothing() {
        let cache = TempDir::new("lookup").unwrap();
        let ix = TempDir::new("lookup-ix").unwrap();
        setup_foo_package(cache.path());

        let cache_dir = CacheDir(cache.path().to_path_buf());
        let cancel = Cancel::new();
        let logger = crate::log::discard();
        build(ix.path(), &cache_dir, BuildMode::Full, Platform::default(), &cancel, &logger).unwrap();

        let handle = Handle::open_at(ix.path(), &logger).unwrap();
        assert!(handle.lookup_all("foo", &[]).is_empty());
    }

    #[test]
    fn lookup_on_unknown_package_returns_empty_not_an_error() {
        let cache = TempDir::new("lookup").unwrap();
        let ix = TempDir::new("lookup-ix").unwrap();
        setup_foo_package(cache.path());

        let cache_dir = CacheDir(cache.path().to_path_buf());
        let cancel = Cancel::new();
        let logger = crate::log::discard();
        build(ix.path(), &cache_dir, BuildMode::Full, Platform::default(), &cancel, &logger).unwrap();

        let handle = Handle::open_at(ix.path(), &logger).unwrap();
        assert!(handle.lookup("nonexistent", "X", false).is_empty());
    }
}

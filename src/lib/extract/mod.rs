//! Symbol Extractor: reads a package directory's source files and
//! recovers its package name and exported top-level declarations.

mod buildtag;
mod decls;
mod lexer;
mod signature;

pub use buildtag::Platform;

use crate::cancel::Cancel;
use crate::types::{PkgName, Symbol};
use slog::{o, warn, Logger};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const SOURCE_EXT: &str = "go";
const TEST_SUFFIX: &str = "_test.go";

/// The outcome of extracting one package directory.
pub struct Extracted {
    pub pkg_name: PkgName,
    /// Deduplicated (first occurrence wins), not yet sorted; callers that
    /// build an `Entry` get sorting from `Entry::new`.
    pub symbols: Vec<Symbol>,
}

/// Reads every non-test `.go` file directly inside `dir` (not recursive --
/// a package directory's source files are never nested), in deterministic
/// (sorted by filename) order, skipping files a build constraint comment
/// excludes for `platform`. Returns `None` if no file yielded a package
/// clause at all.
pub fn extract_package(
    dir: &Path,
    platform: Platform,
    cancel: &Cancel,
    logger: &Logger,
) -> Option<Extracted> {
    let logger = logger.new(o!("component" => "extract", "dir" => dir.display().to_string()));

    let mut filenames: Vec<_> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.file_name())
            .filter(|name| {
                let name = name.to_string_lossy();
                name.ends_with(&format!(".{}", SOURCE_EXT)) && !name.ends_with(TEST_SUFFIX)
            })
            .collect(),
        Err(e) => {
            warn!(logger, "could not read package directory"; "error" => %e);
            return None;
        }
    };
    filenames.sort();

    let mut pkg_name: Option<PkgName> = None;
    let mut symbols = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for name in filenames {
        if cancel.is_cancelled() {
            break;
        }
        let path = dir.join(&name);
        let src = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                warn!(logger, "could not read source file"; "file" => %path.display(), "error" => %e);
                continue;
            }
        };

        if buildtag::is_excluded(&src, platform) {
            continue;
        }

        let parsed = decls::parse_source(&src);
        if pkg_name.is_none() {
            if let Some(name) = parsed.package {
                pkg_name = Some(PkgName(name));
            }
        }
        for sym in parsed.symbols {
            if seen.insert(sym.name().to_string()) {
                symbols.push(sym);
            } else {
                warn!(logger, "duplicate top-level symbol name, keeping first"; "name" => sym.name());
            }
        }
    }

    pkg_name.map(|pkg_name| Extracted { pkg_name, symbols })
}

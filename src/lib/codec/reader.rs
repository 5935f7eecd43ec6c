//! Index Reader: parses a named index file into an in-memory `Index`, and
//! resolves the pointer file to find the current one.
//!
//! Reading is streaming and tolerant: a malformed entry block is skipped
//! with a warning rather than aborting the whole read. Header errors are
//! fatal -- they mean the file isn't this format at all, which the caller
//! (the Updater) treats as "no usable index, rebuild from scratch".

use super::{pointer_file_name, HT, MAGIC, US};
use crate::config::FORMAT_VERSION;
use crate::err::{Error, ErrorKind, Res};
use crate::types::{Arity, CacheDir, Entry, ImportPath, Index, Param, PkgName, RelDir, Symbol, SymbolKind, Version};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use slog::{o, warn, Logger};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A loaded index plus two ancillary lookup structures built at load time:
/// entries grouped by package name (for `Lookup`/`LookupAll`), and a
/// by-import-path map (for the updater's carry-over check).
pub struct Loaded {
    pub index: Index,
    pub by_pkg_name: IndexMap<PkgName, Vec<usize>>,
    pub by_import_path: HashMap<ImportPath, usize>,
}

impl Loaded {
    fn build(index: Index) -> Self {
        let mut by_pkg_name: IndexMap<PkgName, Vec<usize>> = IndexMap::new();
        let mut by_import_path = HashMap::new();
        for (i, entry) in index.entries.iter().enumerate() {
            by_pkg_name
                .entry(entry.pkg_name.clone())
                .or_insert_with(Vec::new)
                .push(i);
            by_import_path.insert(entry.import_path.clone(), i);
        }
        Loaded {
            index,
            by_pkg_name,
            by_import_path,
        }
    }
}

/// Resolves the pointer file under `ixdir` and loads the index it names.
pub fn open(ixdir: &Path, logger: &Logger) -> Res<Loaded> {
    let logger = logger.new(o!("component" => "reader"));
    let pointer_path = ixdir.join(pointer_file_name());

    let contents = match fs::read_to_string(&pointer_path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ErrorKind::NoIndex.into());
        }
        Err(e) => return Err(e.into()),
    };

    let name = contents.lines().next().unwrap_or("").trim();
    if name.is_empty() {
        return Err(ErrorKind::PermanentCorruption.into());
    }

    let index = read_index_file(&ixdir.join(name), &logger)?;
    Ok(Loaded::build(index))
}

struct PendingEntry {
    pkg_name: PkgName,
    import_path: ImportPath,
    rel_dir: RelDir,
    version: Version,
    symbols: Vec<Symbol>,
}

/// Parses one complete index file (not a pointer file) into an `Index`.
pub fn read_index_file(path: &Path, logger: &Logger) -> Res<Index> {
    let contents = fs::read_to_string(path)?;
    let mut lines = contents.lines();

    let header = lines
        .next()
        .ok_or_else(|| Error::from(ErrorKind::PermanentCorruption))?;
    let (cache_dir, timestamp) = parse_header(header)?;

    let mut entries = Vec::new();
    let mut pending: Option<PendingEntry> = None;

    for line in lines {
        if line.is_empty() {
            continue;
        }
        match line.as_bytes()[0] {
            b'P' => {
                if pending.is_some() {
                    warn!(logger, "entry block missing terminator, discarding");
                }
                pending = parse_entry_head(line);
                if pending.is_none() {
                    warn!(logger, "malformed entry header, skipping block"; "line" => line);
                }
            }
            b'S' => match &mut pending {
                Some(p) => match parse_symbol(line) {
                    Some(s) => p.symbols.push(s),
                    None => warn!(logger, "malformed symbol line, skipping"; "line" => line),
                },
                None => warn!(logger, "symbol line outside of any entry block, skipping"; "line" => line),
            },
            b'E' => match pending.take() {
                Some(p) => entries.push(Entry::new(
                    p.pkg_name,
                    p.import_path,
                    p.rel_dir,
                    p.version,
                    p.symbols,
                )),
                None => warn!(logger, "stray entry terminator, ignoring"),
            },
            _ => warn!(logger, "unrecognized line, skipping"; "line" => line),
        }
    }
    if pending.is_some() {
        warn!(logger, "trailing unterminated entry block discarded");
    }

    Ok(Index::new(timestamp, cache_dir, entries))
}

fn parse_header(line: &str) -> Res<(CacheDir, DateTime<Utc>)> {
    let fields: Vec<&str> = line.split(US).collect();
    if fields.len() != 4 || fields[0] != MAGIC {
        return Err(ErrorKind::PermanentCorruption.into());
    }
    if fields[1] != FORMAT_VERSION {
        return Err(ErrorKind::PermanentCorruption.into());
    }
    let cache_dir = CacheDir(PathBuf::from(fields[2]));
    let timestamp = DateTime::parse_from_rfc3339(fields[3])
        .map_err(|_| Error::from(ErrorKind::PermanentCorruption))?
        .with_timezone(&Utc);
    Ok((cache_dir, timestamp))
}

fn parse_entry_head(line: &str) -> Option<PendingEntry> {
    let fields: Vec<&str> = line.split(US).collect();
    if fields.len() != 5 || fields[0] != "P" {
        return None;
    }
    Some(PendingEntry {
        pkg_name: PkgName(fields[1].to_string()),
        import_path: ImportPath(fields[2].to_string()),
        rel_dir: RelDir(PathBuf::from(fields[3])),
        version: Version::parse(fields[4]),
        symbols: Vec::new(),
    })
}

fn parse_symbol(line: &str) -> Option<Symbol> {
    let fields: Vec<&str> = line.split(US).collect();
    if fields.len() < 3 || fields[0] != "S" {
        return None;
    }
    let name = fields[1].to_string();
    let kind = SymbolKind::from_code(fields[2].chars().next()?)?;
    match kind {
        SymbolKind::Const => Some(Symbol::Const { name }),
        SymbolKind::Var => Some(Symbol::Var { name }),
        SymbolKind::Type => Some(Symbol::Type { name }),
        SymbolKind::Func => {
            if fields.len() != 5 {
                return None;
            }
            let result_count: u8 = fields[3].parse().ok()?;
            let params = parse_params_field(fields[4]);
            Some(Symbol::Func {
                name,
                result_count: Arity(result_count.min(3)),
                params,
            })
        }
    }
}

fn parse_params_field(s: &str) -> Vec<Param> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split(HT)
        .map(|p| match p.find(' ') {
            Some(idx) => Param::new(&p[..idx], &p[idx + 1..]),
            None => Param::new("_", p),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::writer::{encode_index, publish};
    use crate::types::{Entry, Symbol};
    use std::path::PathBuf;
    use tempdir::TempDir;

    fn sample_index() -> Index {
        Index::new(
            Utc::now(),
            CacheDir(PathBuf::from("/cache")),
            vec![
                Entry::new(
                    PkgName("lib".into()),
                    ImportPath("example.com/lib".into()),
                    RelDir(PathBuf::from("example.com/lib@v0.2.0")),
                    Version::parse("v0.2.0"),
                    vec![Symbol::Func {
                        name: "F".into(),
                        result_count: Arity(0),
                        params: vec![],
                    }],
                ),
                Entry::new(
                    PkgName("sub".into()),
                    ImportPath("example.com/pkg/sub".into()),
                    RelDir(PathBuf::from("example.com/pkg@v1.1.0/sub")),
                    Version::parse("v1.1.0"),
                    vec![Symbol::Func {
                        name: "Hello".into(),
                        result_count: Arity(1),
                        params: vec![Param::new("x", "int")],
                    }],
                ),
            ],
        )
    }

    #[test]
    fn round_trips_an_encoded_index() {
        let logger = crate::log::discard();
        let index = sample_index();
        let encoded = encode_index(&index, &logger);

        let tmp = TempDir::new("reader").unwrap();
        let path = tmp.path().join("index-v1-test");
        std::fs::write(&path, encoded).unwrap();

        let read_back = read_index_file(&path, &logger).unwrap();
        assert_eq!(read_back.cache_dir, index.cache_dir);
        assert_eq!(read_back.entries, index.entries);
        assert!(read_back.timestamp >= index.timestamp);
    }

    #[test]
    fn open_resolves_pointer_file() {
        let logger = crate::log::discard();
        let tmp = TempDir::new("reader").unwrap();
        let index = sample_index();
        publish(tmp.path(), &index, &logger).unwrap();

        let loaded = open(tmp.path(), &logger).unwrap();
        assert_eq!(loaded.index.entries.len(), 2);
        assert_eq!(loaded.by_pkg_name.get(&PkgName("lib".into())).unwrap().len(), 1);
        assert!(loaded.by_import_path.contains_key(&ImportPath("example.com/pkg/sub".into())));
    }

    #[test]
    fn missing_pointer_file_is_no_index() {
        let logger = crate::log::discard();
        let tmp = TempDir::new("reader").unwrap();
        let err = open(tmp.path(), &logger).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoIndex);
    }

    #[test]
    fn header_with_wrong_format_version_is_permanent_corruption() {
        let logger = crate::log::discard();
        let tmp = TempDir::new("reader").unwrap();
        let path = tmp.path().join("index-v1-bogus");
        let bad = format!("goindex{}v99{}/cache{}2020-01-01T00:00:00Z\n", US, US, US);
        std::fs::write(&path, bad).unwrap();

        let err = read_index_file(&path, &logger).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermanentCorruption);
    }

    #[test]
    fn malformed_entry_block_is_skipped_not_fatal() {
        let logger = crate::log::discard();
        let tmp = TempDir::new("reader").unwrap();
        let path = tmp.path().join("index-v1-partial");
        let good = encode_index(&sample_index(), &logger);
        // Append a corrupt entry line (wrong field count) then a valid
        // terminator; the reader should ignore it and keep everything else.
        let corrupt = format!("{}P{}onlyonefield\nE\n", good, US);
        std::fs::write(&path, corrupt).unwrap();

        let read_back = read_index_file(&path, &logger).unwrap();
        assert_eq!(read_back.entries.len(), 2);
    }
}

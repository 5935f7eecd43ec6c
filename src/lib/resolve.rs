//! Package Resolver: chooses, for each import path, the single best
//! directory among all candidates the scanner found for it.

use crate::scan::Candidate;
use crate::types::{ImportPath, RelDir};
use indexmap::IndexMap;
use std::cmp::Ordering;

/// Derives the import path a `RelDir` provides, per the data model: a
/// cache-relative directory is either `<prefix>@<version>/<subpath>` or
/// `<prefix>@<version>`; the import path is obtained by dropping the
/// `@<version>` segment and rejoining.
pub fn import_path_of(rel_dir: &RelDir) -> ImportPath {
    let s = rel_dir.to_slash_string();
    let parts: Vec<&str> = s.split('/').collect();
    let version_idx = parts.iter().position(|p| p.contains('@'));

    let mut out = Vec::with_capacity(parts.len());
    match version_idx {
        Some(idx) => {
            for (i, p) in parts.iter().enumerate() {
                if i == idx {
                    if let Some(prefix) = p.split('@').next() {
                        if !prefix.is_empty() {
                            out.push(prefix);
                        }
                    }
                } else {
                    out.push(p);
                }
            }
        }
        None => out.extend(parts.iter()),
    }

    ImportPath(out.join("/"))
}

/// Groups scan candidates into a multimap from import path to every
/// directory that provides it.
pub fn group_by_import_path(candidates: Vec<Candidate>) -> IndexMap<ImportPath, Vec<Candidate>> {
    let mut grouped: IndexMap<ImportPath, Vec<Candidate>> = IndexMap::new();
    for c in candidates {
        let path = import_path_of(&c.rel_dir);
        grouped.entry(path).or_insert_with(Vec::new).push(c);
    }
    grouped
}

/// Picks the winner among candidates for one import path: greatest semver
/// precedence, then most recent mtime, then lexicographically smaller
/// `RelDir`, to make selection deterministic.
pub fn pick_best(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().max_by(|a, b| {
        a.version
            .cmp(&b.version)
            .then_with(|| a.mtime.cmp(&b.mtime))
            .then_with(|| b.rel_dir.cmp(&a.rel_dir))
    })
}

/// Resolves every import path in `grouped` to its single chosen candidate.
pub fn resolve(grouped: &IndexMap<ImportPath, Vec<Candidate>>) -> IndexMap<ImportPath, Candidate> {
    grouped
        .iter()
        .filter_map(|(path, cands)| pick_best(cands).map(|c| (path.clone(), c.clone())))
        .collect()
}

/// Compares two candidates under the resolver's rule, for use by the
/// incremental updater when deciding whether a new scan result displaces a
/// prior entry.
pub fn winner<'a>(a: &'a Candidate, b: &'a Candidate) -> Ordering {
    a.version
        .cmp(&b.version)
        .then_with(|| a.mtime.cmp(&b.mtime))
        .then_with(|| b.rel_dir.cmp(&a.rel_dir))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Version;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn cand(rel: &str, version: &str, mtime: SystemTime) -> Candidate {
        Candidate {
            rel_dir: RelDir(PathBuf::from(rel)),
            version: Version::parse(version),
            mtime,
        }
    }

    #[test]
    fn import_path_strips_version_segment() {
        let rel = RelDir(PathBuf::from("example.com/pkg@v1.1.0/sub"));
        assert_eq!(import_path_of(&rel).as_str(), "example.com/pkg/sub");

        let rel = RelDir(PathBuf::from("example.com/lib@v0.2.0"));
        assert_eq!(import_path_of(&rel).as_str(), "example.com/lib");
    }

    #[test]
    fn picks_semver_greatest() {
        let now = SystemTime::now();
        let cands = vec![
            cand("example.com/lib@v0.1.0", "v0.1.0", now),
            cand("example.com/lib@v0.2.0", "v0.2.0", now),
        ];
        let best = pick_best(&cands).unwrap();
        assert_eq!(best.version.as_str(), "v0.2.0");
    }

    #[test]
    fn ties_break_on_mtime_then_reldir() {
        let t0 = SystemTime::UNIX_EPOCH;
        let t1 = t0 + std::time::Duration::from_secs(10);
        let cands = vec![
            cand("example.com/lib@v1.0.0+a", "v1.0.0", t0),
            cand("example.com/lib@v1.0.0+b", "v1.0.0", t1),
        ];
        let best = pick_best(&cands).unwrap();
        assert_eq!(best.mtime, t1);

        let cands = vec![
            cand("b@v1.0.0", "v1.0.0", t0),
            cand("a@v1.0.0", "v1.0.0", t0),
        ];
        let best = pick_best(&cands).unwrap();
        assert_eq!(best.rel_dir.to_slash_string(), "a@v1.0.0");
    }
}

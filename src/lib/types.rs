//! Core data model for the index: import paths, package names, versions,
//! exported symbols, and the entries and index built from them. Kept as
//! plain data (no arena, no reflective dispatch) -- this scale doesn't
//! need one.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A slash-separated string identifying a package, e.g. `example.com/pkg/sub`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportPath(pub String);

impl ImportPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImportPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identifier declared by the package clause in a package's source
/// files. Distinct from the last segment of the import path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PkgName(pub String);

impl PkgName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PkgName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The absolute filesystem location of one concrete copy of a package.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheDir(pub PathBuf);

impl CacheDir {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// The cache-relative location of one concrete copy of a package, of the
/// form `<path-prefix>@<version>/<subpath>` or `<path-prefix>@<version>`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelDir(pub PathBuf);

impl RelDir {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn to_slash_string(&self) -> String {
        self.0.to_string_lossy().replace('\\', "/")
    }
}

impl fmt::Display for RelDir {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_slash_string())
    }
}

/// A semantic-version string as it appears after `@` in a versioned root's
/// basename, e.g. `v1.2.3` or `v0.0.0-20200101000000-abcdef123456`.
///
/// The canonical textual form always has a leading `v`. A directory name
/// can in principle carry a suffix that isn't valid semver (corrupted
/// cache, vendored copy, etc); rather than reject it outright we keep the
/// raw text around and fall back to the tie-break rule in the resolver
/// ("if a candidate's Version is not valid semver, treat it as less than
/// every valid semver; if all are invalid, keep the lexicographically
/// greatest").
#[derive(Clone, Debug, Eq, Hash)]
pub struct Version {
    raw: String,
    parsed: Option<semver::Version>,
}

impl Version {
    pub fn parse(raw: &str) -> Self {
        let stripped = raw.strip_prefix('v').unwrap_or(raw);
        let parsed = semver::Version::parse(stripped).ok();
        Version {
            raw: raw.to_string(),
            parsed,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_valid_semver(&self) -> bool {
        self.parsed.is_some()
    }

    pub fn semver(&self) -> Option<&semver::Version> {
        self.parsed.as_ref()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for Version {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Version::parse(s))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    /// Valid semver always outranks invalid; among invalid versions, the
    /// lexicographically greater raw string wins (see `Version::parse`'s
    /// doc comment and the resolver's tie-break policy).
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.parsed, &other.parsed) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.raw.cmp(&other.raw),
        }
    }
}

/// The number of return values of a function, saturating at 3 ("three or
/// more").
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Arity(pub u8);

impl Arity {
    pub fn from_count(n: usize) -> Self {
        Arity(n.min(3) as u8)
    }
}

/// One parameter of a function signature: a name (or `_` if absent in the
/// syntax) and the verbatim textual form of its type expression, after
/// comment stripping and whitespace normalization. Variadic parameters
/// carry a type prefixed with `...`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Const,
    Var,
    Type,
    Func,
}

impl SymbolKind {
    /// The one-character code used in the index file format.
    pub fn code(self) -> char {
        match self {
            SymbolKind::Const => 'C',
            SymbolKind::Var => 'V',
            SymbolKind::Type => 'T',
            SymbolKind::Func => 'F',
        }
    }

    pub fn from_code(c: char) -> Option<Self> {
        match c {
            'C' => Some(SymbolKind::Const),
            'V' => Some(SymbolKind::Var),
            'T' => Some(SymbolKind::Type),
            'F' => Some(SymbolKind::Func),
            _ => None,
        }
    }
}

/// One exported top-level declaration. Function-specific signature data is
/// part of the `Func` variant only, avoiding reflective dispatch over a
/// single do-it-all struct.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Const { name: String },
    Var { name: String },
    Type { name: String },
    Func {
        name: String,
        result_count: Arity,
        params: Vec<Param>,
    },
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Const { name }
            | Symbol::Var { name }
            | Symbol::Type { name }
            | Symbol::Func { name, .. } => name,
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Const { .. } => SymbolKind::Const,
            Symbol::Var { .. } => SymbolKind::Var,
            Symbol::Type { .. } => SymbolKind::Type,
            Symbol::Func { .. } => SymbolKind::Func,
        }
    }
}

/// The unit of storage in an index: one per import path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub pkg_name: PkgName,
    pub import_path: ImportPath,
    pub rel_dir: RelDir,
    pub version: Version,
    /// Sorted ascending by name; names are unique within an entry.
    pub symbols: Vec<Symbol>,
}

impl Entry {
    pub fn new(
        pkg_name: PkgName,
        import_path: ImportPath,
        rel_dir: RelDir,
        version: Version,
        mut symbols: Vec<Symbol>,
    ) -> Self {
        symbols.sort_by(|a, b| a.name().cmp(b.name()));
        symbols.dedup_by(|a, b| a.name() == b.name());
        Entry {
            pkg_name,
            import_path,
            rel_dir,
            version,
            symbols,
        }
    }
}

/// A complete built index: a timestamp, the cache directory it indexes, and
/// the entries themselves, sorted by (PkgName, ImportPath).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Index {
    pub timestamp: DateTime<Utc>,
    pub cache_dir: CacheDir,
    pub entries: Vec<Entry>,
}

impl Index {
    pub fn new(timestamp: DateTime<Utc>, cache_dir: CacheDir, mut entries: Vec<Entry>) -> Self {
        entries.sort_by(|a, b| {
            a.pkg_name
                .cmp(&b.pkg_name)
                .then_with(|| a.import_path.cmp(&b.import_path))
        });
        Index {
            timestamp,
            cache_dir,
            entries,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version_orders_valid_semver_by_precedence() {
        let a = Version::parse("v0.1.0");
        let b = Version::parse("v0.2.0");
        assert!(a < b);
    }

    #[test]
    fn version_invalid_is_less_than_valid() {
        let invalid = Version::parse("vbogus");
        let valid = Version::parse("v0.0.1");
        assert!(invalid < valid);
    }

    #[test]
    fn version_both_invalid_compares_lexicographically() {
        let a = Version::parse("vaaa");
        let b = Version::parse("vzzz");
        assert!(a < b);
    }

    #[test]
    fn entry_dedups_and_sorts_symbols() {
        let e = Entry::new(
            PkgName("foo".into()),
            ImportPath("example.com/foo".into()),
            RelDir(PathBuf::from("example.com/foo@v1.0.0")),
            Version::parse("v1.0.0"),
            vec![
                Symbol::Const { name: "B".into() },
                Symbol::Const { name: "A".into() },
                Symbol::Const { name: "A".into() },
            ],
        );
        let names: Vec<_> = e.symbols.iter().map(Symbol::name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}

//! A persistent, incrementally-maintained symbol index over a module
//! cache, built to serve unimported-symbol completion in an editor
//! service.
//!
//! The crate mirrors the data flow leaf-to-root:
//!
//!   - [`scan`] walks a module cache and reports every versioned package
//!     directory it finds, tagged with its semantic version and mtime.
//!   - [`resolve`] picks the single best directory per import path.
//!   - [`extract`] reads a chosen directory's source and recovers its
//!     package name and exported top-level declarations.
//!   - [`codec`] serializes a built index to the on-disk textual format
//!     (`codec::writer`) and parses it back (`codec::reader`), with
//!     atomic publication through a pointer file.
//!   - [`update`] combines a prior index with a restricted rescan to avoid
//!     re-parsing unchanged directories.
//!   - [`lookup`] answers completion queries against a loaded snapshot,
//!     and is the crate's main entry point (see [`lookup::Handle`]).
//!
//! [`types`] holds the shared data model; [`err`], [`log`], [`config`],
//! and [`cancel`] are the ambient error-handling, logging, configuration,
//! and cancellation plumbing used throughout.

pub mod cancel;
pub mod codec;
pub mod config;
pub mod err;
pub mod extract;
pub mod log;
pub mod lookup;
pub mod resolve;
pub mod scan;
pub mod types;
pub mod update;

pub use err::{Error, ErrorKind, Res};
pub use lookup::{build, build_default, BuildMode, Handle};
pub use types::{
    Arity, CacheDir, Entry, ImportPath, Index, Param, PkgName, RelDir, Symbol, SymbolKind, Version,
};

//! Index Writer and Reader: the on-disk textual format, atomic
//! publication, and parsing back into the in-memory `Index`.

pub mod reader;
pub mod writer;

pub use reader::{open, read_index_file};
pub use writer::{gc, publish};

use crate::config::FORMAT_VERSION;

/// ASCII unit separator: the field separator within a record line.
pub const US: char = '\u{1f}';
/// Separator between parameters within a `PARAMS` field.
pub const HT: char = '\t';

const MAGIC: &str = "goindex";

fn pointer_file_name() -> String {
    format!("index-name-{}", FORMAT_VERSION)
}

fn index_file_name(token: &str) -> String {
    format!("index-{}-{}", FORMAT_VERSION, token)
}

fn is_index_file_name(name: &str) -> bool {
    name.starts_with(&format!("index-{}-", FORMAT_VERSION))
}

fn has_unencodable_chars(s: &str) -> bool {
    s.contains(US) || s.contains('\n') || s.contains('\r')
}

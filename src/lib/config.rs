//! Resolves where the index directory lives on disk.
//!
//! The default is a platform-specific user cache directory plus a
//! product-specific subdirectory (`directories::ProjectDirs`). Debugging
//! builds may override the location by installing a hook before calling
//! into the rest of the API; the hook is process-wide configuration, not a
//! roving global variable, so it's modeled as a single `OnceCell`-backed
//! setter.

use directories::ProjectDirs;
use once_cell::sync::OnceCell;
use std::path::PathBuf;

static INDEX_DIR_HOOK: OnceCell<PathBuf> = OnceCell::new();

/// Install a process-wide override for the index directory. Must be called
/// before the first call to `index_dir()` or any public API that resolves
/// it implicitly; later calls are ignored (first-writer-wins).
pub fn set_index_dir_hook(path: PathBuf) {
    let _ = INDEX_DIR_HOOK.set(path);
}

/// The directory in which pointer files and index files are stored.
pub fn index_dir() -> PathBuf {
    if let Some(p) = INDEX_DIR_HOOK.get() {
        return p.clone();
    }

    ProjectDirs::from("", "", "modcache-index")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".modcache-index"))
}

pub const FORMAT_VERSION: &str = "v1";

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hook_overrides_default() {
        let want = PathBuf::from("/tmp/example-modcache-index-dir");
        set_index_dir_hook(want.clone());
        assert_eq!(index_dir(), want);
    }
}

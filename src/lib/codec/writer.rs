//! Serializes an `Index` to the textual on-disk format and publishes it
//! atomically: write a uniquely-named index file, then rename a temp
//! pointer file over the real pointer so readers never see a torn write.

use super::{has_unencodable_chars, index_file_name, is_index_file_name, pointer_file_name, HT, MAGIC, US};
use crate::config::FORMAT_VERSION;
use crate::err::Res;
use crate::types::{Index, Symbol};
use slog::{debug, warn, Logger};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn new_token() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

fn encode_symbol(out: &mut String, sym: &Symbol) {
    out.push('S');
    out.push(US);
    out.push_str(sym.name());
    out.push(US);
    out.push(sym.kind().code());
    if let Symbol::Func {
        result_count,
        params,
        ..
    } = sym
    {
        out.push(US);
        out.push_str(&result_count.0.to_string());
        out.push(US);
        let rendered: Vec<String> = params.iter().map(|p| format!("{} {}", p.name, p.ty)).collect();
        out.push_str(&rendered.join(&HT.to_string()));
    }
    out.push('\n');
}

/// Renders `index` into the textual format, skipping (with a logged
/// warning) any entry or symbol whose fields would corrupt the
/// separator-delimited grammar.
pub fn encode_index(index: &Index, logger: &Logger) -> String {
    let mut out = String::new();
    out.push_str(MAGIC);
    out.push(US);
    out.push_str(FORMAT_VERSION);
    out.push(US);
    out.push_str(&index.cache_dir.as_path().display().to_string());
    out.push(US);
    out.push_str(&index.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true));
    out.push('\n');

    for entry in &index.entries {
        let fields = [
            entry.pkg_name.as_str(),
            entry.import_path.as_str(),
            &entry.rel_dir.to_slash_string(),
            entry.version.as_str(),
        ];
        if fields.iter().any(|f| has_unencodable_chars(f)) {
            warn!(logger, "skipping entry with unencodable field"; "import_path" => entry.import_path.as_str());
            continue;
        }

        out.push('P');
        out.push(US);
        out.push_str(entry.pkg_name.as_str());
        out.push(US);
        out.push_str(entry.import_path.as_str());
        out.push(US);
        out.push_str(&entry.rel_dir.to_slash_string());
        out.push(US);
        out.push_str(entry.version.as_str());
        out.push('\n');

        for sym in &entry.symbols {
            encode_symbol(&mut out, sym);
        }
        out.push_str("E\n");
    }

    out
}

/// Writes `index` to a new uniquely-named file under `ixdir` and
/// atomically swaps the pointer file to reference it. Returns the path of
/// the newly published index file.
pub fn publish(ixdir: &Path, index: &Index, logger: &Logger) -> Res<PathBuf> {
    fs::create_dir_all(ixdir)?;

    let token = new_token();
    let file_name = index_file_name(&token);
    let file_path = ixdir.join(&file_name);
    let encoded = encode_index(index, logger);

    let mut file = File::create(&file_path)?;
    file.write_all(encoded.as_bytes())?;
    file.sync_all()?;

    let pointer_path = ixdir.join(pointer_file_name());
    let tmp_pointer_path = ixdir.join(format!("{}.tmp-{}", pointer_file_name(), token));
    {
        let mut tmp = File::create(&tmp_pointer_path)?;
        writeln!(tmp, "{}", file_name)?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_pointer_path, &pointer_path)?;

    debug!(logger, "published index"; "file" => %file_path.display(), "entries" => index.entries.len());
    Ok(file_path)
}

/// Removes every index file under `ixdir` except `keep`. Never called
/// automatically by the writer or updater; callers invoke it on their own
/// schedule, out of band from normal build/update operations.
pub fn gc(ixdir: &Path, keep: &Path, logger: &Logger) -> Res<()> {
    let keep_name = keep.file_name().map(|n| n.to_string_lossy().into_owned());
    let entries = fs::read_dir(ixdir)?;

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_index_file_name(&name) {
            continue;
        }
        if Some(&name) == keep_name.as_ref() {
            continue;
        }
        if let Err(e) = fs::remove_file(entry.path()) {
            warn!(logger, "gc: could not remove stale index file"; "file" => %name, "error" => %e);
        }
    }
    Ok(())
}

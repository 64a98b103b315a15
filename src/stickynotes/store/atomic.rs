use crate::error::{NoteError, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `bytes` all-or-nothing.
///
/// The data goes to a temporary file in the destination directory, is forced to
/// stable storage, then renamed over the target. If anything fails before the
/// rename the temporary file is removed and the previous file stays as it was.
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .suffix(".part")
        .tempfile_in(dir)?;
    write_and_sync(&mut tmp, bytes)?;
    tmp.persist(path).map_err(|e| NoteError::Io(e.error))?;

    sync_dir(dir);
    Ok(())
}

pub fn write_atomic_str(path: &Path, text: &str) -> Result<()> {
    write_atomic(path, text.as_bytes())
}

/// Pretty JSON with a trailing newline, written atomically.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    write_atomic_str(path, &text)
}

fn write_and_sync(tmp: &mut NamedTempFile, bytes: &[u8]) -> Result<()> {
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    Ok(())
}

// Makes the rename itself durable. Best effort: not every platform lets a
// directory be opened for syncing.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = fs::File::open(dir) {
        let _ = handle.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

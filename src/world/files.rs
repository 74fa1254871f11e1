//! Locked reads and writes of save files.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use fs2::FileExt;

use crate::world::errors::WorldError;

/// Write `content` to `path` while holding an exclusive lock on it.
///
/// With `safe` set the content goes to a temp file in the same directory that
/// is then renamed over `path`, so a crash never leaves a half-written save.
/// Without it the file is truncated and rewritten in place.
pub(crate) fn write_locked(path: &Path, content: &str, safe: bool) -> Result<(), WorldError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(path)?;
    lock_file.lock_exclusive()?;

    if !safe {
        let mut target = &lock_file;
        lock_file.set_len(0)?;
        target.write_all(content.as_bytes())?;
        target.flush()?;
        let _ = lock_file.sync_all();
        return Ok(());
    }

    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("world.json");
    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut tmp) => {
                tmp.write_all(content.as_bytes())?;
                tmp.flush()?;
                let _ = tmp.sync_all();
                break candidate;
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
            }
            Err(e) => return Err(e.into()),
        }
    };

    fs::rename(&tmp_path, path)?;
    // Best effort: persist the rename itself.
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    drop(lock_file);
    Ok(())
}

/// Read `path` under a shared lock.
pub(crate) fn read_locked(path: &Path) -> Result<String, WorldError> {
    let mut file = File::open(path)?;
    file.lock_shared()?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    let _ = file.unlock();
    Ok(content)
}

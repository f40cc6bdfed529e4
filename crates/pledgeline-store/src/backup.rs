use crate::db;
use crate::error::{Result, StoreError};
use crate::paths;
use rusqlite::backup::Backup;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PAGES_PER_STEP: i32 = 256;
const PAUSE_BETWEEN_STEPS: Duration = Duration::from_millis(10);

/// Copies the live database (file-backed or in-memory) to `path` with
/// SQLite's online backup API. Refuses to overwrite the database itself or
/// its WAL/SHM sidecars.
pub fn backup_to(conn: &Connection, path: &Path) -> Result<()> {
    paths::ensure_parent_dir(path)?;
    let target = absolute(path)?;

    if let Some(main) = conn.path().filter(|p| !p.is_empty()).map(PathBuf::from) {
        let main = absolute(&main)?;
        let clashes = [
            main.clone(),
            sidecar(&main, "-wal"),
            sidecar(&main, "-shm"),
        ];
        if clashes.iter().any(|candidate| *candidate == target) {
            return Err(StoreError::InvalidBackupPath(path.to_path_buf()));
        }
    }

    let mut dest = Connection::open(&target)?;
    {
        let backup = Backup::new(conn, &mut dest)?;
        backup.run_to_completion(PAGES_PER_STEP, PAUSE_BETWEEN_STEPS, None)?;
    }
    db::restrict_db_permissions(&target)?;
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(fs::canonicalize(path)?);
    }
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| StoreError::InvalidBackupPath(path.to_path_buf()))?;
    Ok(fs::canonicalize(parent)?.join(file_name))
}

fn sidecar(main: &Path, suffix: &str) -> PathBuf {
    let mut raw = main.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

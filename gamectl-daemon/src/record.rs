//! On-disk persistence for the singleton row.
//!
//! Persists a `RecordFile` YAML document at `<home>/.gamectl/globals.yaml`.
//! Writes use an atomic `.tmp` + rename. The file is also the daemon's
//! out-of-band edit surface: the runtime watches it and broadcasts changes
//! made behind the daemon's back.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gamectl_core::{GameState, RecordId};

use crate::error::{io_err, DaemonError};
use crate::paths::record_path;

/// Id assigned to the row on first insert. There is only ever one row.
pub const SINGLETON_ID: RecordId = RecordId(1);

/// On-disk payload wrapping the row with its last write time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordFile {
    pub updated_at: DateTime<Utc>,
    pub record: GameState,
}

impl RecordFile {
    pub fn now(record: GameState) -> Self {
        Self {
            updated_at: Utc::now(),
            record,
        }
    }
}

/// Load the persisted row, rooted at `home`.
///
/// Returns `Ok(None)` if the file does not yet exist — the row is created
/// lazily by the first `insert`.
pub fn load_at(home: &Path) -> Result<Option<RecordFile>, DaemonError> {
    let path = record_path(home);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| DaemonError::Parse { path, source: e })
}

/// Save the row atomically: write `<path>.tmp`, then rename.
pub fn save_at(home: &Path, file: &RecordFile) -> Result<(), DaemonError> {
    let path = record_path(home);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid record path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let yaml = serde_yaml::to_string(file)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, &yaml).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

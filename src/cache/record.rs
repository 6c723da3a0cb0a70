//! Cache sidecar records
//!
//! Every cached artifact lives at `<root>/<checksum>/<file name>` next to a
//! `<root>/<checksum>.toml` record holding the dependency that produced it.
//! A tier hits only when the record describes the requested dependency.

use crate::dependency::DependencyMetadata;
use crate::error::{PakError, PakResult};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Location of the sidecar record for `hash`
pub fn record_path(root: &Path, hash: &str) -> PathBuf {
    root.join(format!("{}.toml", hash))
}

/// Location of the artifact for `hash`
pub fn artifact_path(root: &Path, hash: &str, file_name: &str) -> PathBuf {
    root.join(hash).join(file_name)
}

/// Read the record for `hash`; `None` if there is none
pub fn read_record(root: &Path, hash: &str) -> PakResult<Option<DependencyMetadata>> {
    let path = record_path(root, hash);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PakError::io(format!("reading {}", path.display()), e)),
    };

    toml::from_str(&content)
        .map(Some)
        .map_err(|e| PakError::metadata(path.display().to_string(), e))
}

/// Write the record for `dependency` under `hash`
///
/// The record is written to a temporary file and renamed into place so a
/// crash never leaves a truncated record behind.
pub fn write_record(root: &Path, hash: &str, dependency: &DependencyMetadata) -> PakResult<()> {
    fs::create_dir_all(root)
        .map_err(|e| PakError::io(format!("creating {}", root.display()), e))?;

    let path = record_path(root, hash);
    let temp = root.join(format!(".{}.{}.tmp", hash, Uuid::new_v4()));
    let content = toml::to_string(dependency)?;

    fs::write(&temp, content)
        .map_err(|e| PakError::io(format!("writing {}", temp.display()), e))?;
    fs::rename(&temp, &path).map_err(|e| {
        let _ = fs::remove_file(&temp);
        PakError::io(format!("renaming {} to {}", temp.display(), path.display()), e)
    })
}

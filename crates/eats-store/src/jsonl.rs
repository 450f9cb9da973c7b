//! JSONL persistence for store records and name index rows.
//!
//! One JSON value per line. Blank lines and `#` comment lines are skipped.
//! Files are replaced whole: the new content goes to a sibling temp file
//! that is synced and then renamed over the old one.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors from JSONL operations. Line numbers are 1-based.
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}:{line}: parse error: {source}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("{}: corrupted file: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: &'static str },
}

impl JsonlError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| JsonlError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Parse JSONL `text`. `source` names the origin in error messages.
pub fn parse_records<T: DeserializeOwned>(
    source: &Path,
    text: &str,
) -> Result<Vec<T>, JsonlError> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, raw)| {
            serde_json::from_str(raw).map_err(|source_err| JsonlError::Parse {
                path: source.to_path_buf(),
                line,
                source: source_err,
            })
        })
        .collect()
}

/// Encode records as JSONL text, one line each.
pub fn encode_records<T: Serialize>(records: &[T]) -> Result<String, JsonlError> {
    let mut text = String::new();
    for record in records {
        text.push_str(&serde_json::to_string(record).map_err(JsonlError::Serialize)?);
        text.push('\n');
    }
    Ok(text)
}

/// Read records from a JSONL file. NUL bytes and invalid UTF-8 are
/// rejected as corruption before any line is parsed.
pub fn read_records_from_path<T: DeserializeOwned>(
    path: impl AsRef<Path>,
) -> Result<Vec<T>, JsonlError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(JsonlError::io(path))?;
    let corrupt = |reason| JsonlError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };
    if bytes.contains(&0) {
        return Err(corrupt("contains NUL byte(s)"));
    }
    let text = std::str::from_utf8(&bytes)
        .map_err(|_| corrupt("contains non-UTF-8 byte sequence(s)"))?;
    parse_records(path, text)
}

/// Replace the JSONL file at `path` with `records`.
pub fn write_records_to_path<T: Serialize>(
    path: impl AsRef<Path>,
    records: &[T],
) -> Result<(), JsonlError> {
    let path = path.as_ref();
    let text = encode_records(records)?;
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent).map_err(JsonlError::io(parent))?;
    }

    let tmp_path = temp_sibling(path);
    if let Err(error) = write_synced(&tmp_path, text.as_bytes()) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(JsonlError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    // Persist the rename itself.
    if let Some(parent) = parent {
        File::open(parent)
            .and_then(|dir| dir.sync_all())
            .map_err(JsonlError::io(parent))?;
    }
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), JsonlError> {
    let mut file = File::create(path).map_err(JsonlError::io(path))?;
    file.write_all(bytes).map_err(JsonlError::io(path))?;
    file.sync_all().map_err(JsonlError::io(path))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut name: OsString = path.as_os_str().to_os_string();
    name.push(format!(".tmp.{}.{nanos}", std::process::id()));
    PathBuf::from(name)
}

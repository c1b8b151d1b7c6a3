use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::error::{Error, ErrorKind, Result};

/// Writes `value` as JSON to `path` through a sibling temp file and an
/// atomic rename. Readers and restarts observe either the previous
/// file or the complete new one, never a truncated in-between state.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let tmp = tmp_path(path)?;
    if let Err(err) = write_file(&tmp, value) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
        Error::new(
            ErrorKind::Io,
            format!("invalid target path: {}", path.display()),
        )
    })?;
    Ok(path.with_file_name(format!("{}.tmp", file_name)))
}

fn write_file(path: &Path, value: &impl Serialize) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_complete_json_and_cleans_up_the_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value.json");

        write_json(&path, &json!({"a": 1})).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"a":1}"#);
        assert!(!path.with_file_name("value.json.tmp").exists());
    }

    #[test]
    fn replaces_existing_content_in_one_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value.json");

        write_json(&path, &json!({"a": 1})).unwrap();
        write_json(&path, &json!({"a": 2})).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"a":2}"#);
    }
}

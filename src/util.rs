// src/util.rs

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Read a UTF-8 file into a String with a clear error message.
///
/// This is mainly used for:
/// - suite and runnable JSON
/// - translated programs and lock artifacts
pub fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file {:?}", path))
}

/// Ensure a directory exists (create it if missing).
///
/// This is used when:
/// - creating recording folders
/// - initialising project scaffolding
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {:?}", path))
}

/// Append a suffix to the full file name of a path.
///
/// Example:
/// tests/login.json + ".lock"
///
/// → tests/login.json.lock
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_appended_to_whole_name() {
        assert_eq!(
            with_suffix(Path::new("tests/login.json"), ".lock"),
            PathBuf::from("tests/login.json.lock")
        );
    }

    #[test]
    fn read_to_string_names_missing_file() {
        let err = read_to_string(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}

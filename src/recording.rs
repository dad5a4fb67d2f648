// src/recording.rs

//! Per-step screenshots.
//!
//! Layout:
//! <recordings-root>/<executable-name>/00000.png
//! <recordings-root>/<executable-name>/00001.png
//!
//! One screenshot is taken before each command, numbered from zero.
//! Folders are derived from the executable name, so concurrent executables
//! never share one.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::util::ensure_dir;

/// Create (if needed) and return the screenshot folder for an executable.
pub fn recording_init(root: &Path, executable_name: &str) -> Result<PathBuf> {
    let dir = root.join(executable_name);
    ensure_dir(&dir)?;
    Ok(dir)
}

/// `<dir>/<step:05>.png`
pub fn screenshot_path(dir: &Path, step: usize) -> PathBuf {
    dir.join(format!("{:05}.png", step))
}

pub fn write_screenshot(dir: &Path, step: usize, png: &[u8]) -> Result<PathBuf> {
    let path = screenshot_path(dir, step);
    std::fs::write(&path, png)
        .with_context(|| format!("Failed to write screenshot {:?}", path))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screenshots_are_zero_padded() {
        let dir = Path::new("recordings/t1");
        assert_eq!(screenshot_path(dir, 0), PathBuf::from("recordings/t1/00000.png"));
        assert_eq!(screenshot_path(dir, 42), PathBuf::from("recordings/t1/00042.png"));
    }

    #[test]
    fn folders_are_created_on_demand() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("does/not/exist");

        let dir = recording_init(&nested, "login").unwrap();
        assert!(dir.is_dir());

        let shot = write_screenshot(&dir, 3, b"png").unwrap();
        assert_eq!(std::fs::read(shot).unwrap(), b"png");
    }
}

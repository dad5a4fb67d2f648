// src/validate.rs

//! Static checks over a suite and its runnables.
//!
//! Nothing is translated and no session is opened; this only answers
//! "would the run be able to start every executable?".

use serde::Serialize;
use std::path::Path;

use crate::suite::{ExecutableKind, PlatformKind, Runnable, Suite};

#[derive(Debug, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

#[derive(Debug, Serialize)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        let mut result = Self::ok();
        result.push_error(code, message);
        result
    }

    pub fn push_error(&mut self, code: &'static str, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            code,
            message: message.into(),
        });
    }

    pub fn is_valid(&self) -> bool {
        self.valid && self.errors.is_empty()
    }
}

pub fn validate_suite(suite_path: &Path) -> ValidationResult {
    let suite = match Suite::load(suite_path) {
        Ok(s) => s,
        Err(e) => return ValidationResult::error("SUITE_UNREADABLE", format!("{:#}", e)),
    };

    let mut result = ValidationResult::ok();

    if suite.runnables.is_empty() {
        result.push_error("SUITE_EMPTY", "Suite lists no runnables");
    }

    for runnable_path in &suite.runnables {
        validate_runnable(runnable_path, &mut result);
    }

    result
}

/* ---------------- runnables ---------------- */

fn validate_runnable(path: &Path, result: &mut ValidationResult) {
    let runnable = match Runnable::load(path) {
        Ok(r) => r,
        Err(e) => {
            result.push_error("RUNNABLE_UNREADABLE", format!("{:#}", e));
            return;
        }
    };

    if let Err(e) = runnable.platform.parse::<PlatformKind>() {
        result.push_error(
            "PLATFORM_UNSUPPORTED",
            format!("{} ({})", e, path.display()),
        );
    }

    for exe in &runnable.executables {
        match exe.kind {
            ExecutableKind::Unsupported => result.push_error(
                "EXECUTABLE_TYPE_UNSUPPORTED",
                format!("Executable {:?} has an unsupported type", exe.name),
            ),
            ExecutableKind::File if !exe.location.is_file() => result.push_error(
                "EXECUTABLE_NOT_FOUND",
                format!(
                    "Executable {:?} not found: {}",
                    exe.name,
                    exe.location.display()
                ),
            ),
            ExecutableKind::File => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn codes(r: &ValidationResult) -> Vec<&'static str> {
        r.errors.iter().map(|e| e.code).collect()
    }

    #[test]
    fn missing_suite_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let r = validate_suite(&dir.path().join("run.json"));
        assert!(!r.is_valid());
        assert_eq!(codes(&r), vec!["SUITE_UNREADABLE"]);
    }

    #[test]
    fn every_problem_is_collected() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("ok.txt");
        fs::write(&script, "open the login page").unwrap();

        let good = dir.path().join("good.json");
        fs::write(
            &good,
            serde_json::json!({
                "platform": "web",
                "executables": [{"name": "ok", "type": "file", "location": script}]
            })
            .to_string(),
        )
        .unwrap();

        let bad = dir.path().join("bad.json");
        fs::write(
            &bad,
            serde_json::json!({
                "platform": "windows",
                "executables": [
                    {"name": "ticket", "type": "jira", "location": "PROJ-1"},
                    {"name": "gone", "type": "file", "location": dir.path().join("gone.txt")}
                ]
            })
            .to_string(),
        )
        .unwrap();

        let suite = dir.path().join("run.json");
        fs::write(
            &suite,
            serde_json::json!({
                "execution-mode": "serial",
                "runnables": [good, bad, dir.path().join("missing.json")]
            })
            .to_string(),
        )
        .unwrap();

        let r = validate_suite(&suite);
        assert_eq!(
            codes(&r),
            vec![
                "PLATFORM_UNSUPPORTED",
                "EXECUTABLE_TYPE_UNSUPPORTED",
                "EXECUTABLE_NOT_FOUND",
                "RUNNABLE_UNREADABLE"
            ]
        );
    }

    #[test]
    fn clean_suite_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let runnable = dir.path().join("r.json");
        fs::write(&runnable, r#"{"platform":"mac","executables":[]}"#).unwrap();
        let suite = dir.path().join("run.json");
        fs::write(
            &suite,
            serde_json::json!({"execution-mode": "parallel", "runnables": [runnable]}).to_string(),
        )
        .unwrap();

        assert!(validate_suite(&suite).is_valid());
    }
}

//! Service record file format.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::registrar::{RegistrarError, RegistrarResult};

/// Keys written at install time, in file order.
pub const RECORD_KEYS: [&str; 8] = [
    "notify", "dir", "cmd", "pid", "log", "wait", "nix_user", "nix_group",
];

/// A stored service configuration: the file it came from and its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub filename: PathBuf,
    pub options: Vec<(String, String)>,
}

impl ServiceRecord {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            options: Vec::new(),
        }
    }

    /// Append an option, keeping insertion order.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.push((key.into(), value.into()));
    }

    /// Case-insensitive lookup; the first matching key wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Like `get`, but a missing or empty value is an error.
    pub fn require(&self, key: &str) -> RegistrarResult<&str> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(RegistrarError::MissingKey {
                path: self.filename.clone(),
                key: key.to_string(),
            }),
        }
    }

    /// Parse `key=value` lines. Blank lines are skipped.
    pub fn parse(filename: &Path, content: &str) -> RegistrarResult<Self> {
        let mut record = Self::new(filename);

        for (index, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) if !key.is_empty() => record.push(key, value),
                _ => {
                    return Err(RegistrarError::MalformedRecord {
                        path: filename.to_path_buf(),
                        line: index + 1,
                    })
                }
            }
        }

        Ok(record)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.options {
            let _ = writeln!(out, "{}={}", key, value);
        }
        out
    }

    pub fn to_json(&self) -> Value {
        let options: Map<String, Value> = self
            .options
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        serde_json::json!({
            "filename": self.filename.to_string_lossy(),
            "options": options,
        })
    }
}

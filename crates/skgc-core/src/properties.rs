//! `server.properties` codec.
//!
//! `key=value` lines split at the first `=`, `#` comment lines and blank lines.
//! Comments and blank lines are kept verbatim so a rewrite only touches the
//! values that were set.

use crate::{Result, SupervisorError};

use std::panic::Location;
use std::path::Path;

use error_location::ErrorLocation;

const COMMENT_PREFIX: char = '#';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry { key: String, value: String },
    Verbatim(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertiesFile {
    lines: Vec<Line>,
}

impl PropertiesFile {
    /// Parse properties text. `origin` is only used in error messages.
    #[track_caller]
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let mut lines = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
                lines.push(Line::Verbatim(raw.to_string()));
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(SupervisorError::Properties {
                    path: origin.to_path_buf(),
                    line: index + 1,
                    message: format!("expected key=value, found '{trimmed}'"),
                    location: ErrorLocation::from(Location::caller()),
                });
            };

            lines.push(Line::Entry {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            });
        }

        Ok(Self { lines })
    }

    #[track_caller]
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SupervisorError::io(path, e))?;
        Self::parse(&text, path)
    }

    /// Like `load`, but a missing file yields an empty document.
    #[track_caller]
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(SupervisorError::io(path, e)),
        }
    }

    /// Value of `key`; the last occurrence wins for duplicated keys.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .last()
    }

    /// Set `key` in place (every occurrence), or append it.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        let mut found = false;

        for line in &mut self.lines {
            if let Line::Entry { key: k, value: v } = line
                && *k == key
            {
                *v = value.clone();
                found = true;
            }
        }

        if !found {
            self.lines.push(Line::Entry {
                key: key.to_string(),
                value,
            });
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry { key, value } => Some((key.as_str(), value.as_str())),
            Line::Verbatim(_) => None,
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry { key, value } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(value);
                }
                Line::Verbatim(text) => out.push_str(text),
            }
            out.push('\n');
        }
        out
    }

    #[track_caller]
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render()).map_err(|e| SupervisorError::io(path, e))
    }
}

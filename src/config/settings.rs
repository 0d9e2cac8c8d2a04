//! Settings file: desired labels plus daemon options
//!
//! Stored as JSON under the XDG config dir. `labels` is a flat
//! identifier → label table written by the settings editor.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::sync::DesiredMapping;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Layout identifier → custom label
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub daemon: DaemonSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaemonSettings {
    /// Where the published label snapshot goes (runtime dir when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_file: Option<PathBuf>,
}

/// Result of normalizing one editor change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelEdit {
    Set(String),
    Removed,
    Unchanged,
}

impl Settings {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No settings file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).context(format!("Failed to read settings from {}", path.display()));
            }
        };

        serde_json::from_str(&contents)
            .context(format!("Failed to parse settings file {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)
            .context("Failed to serialize settings to JSON")?;
        fs::write(path, contents)
            .context(format!("Failed to write settings file to {}", path.display()))?;
        Ok(())
    }

    /// Apply an edit the way the settings editor does: trim, empty removes
    pub fn set_label(&mut self, id: &str, text: &str) -> LabelEdit {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return match self.labels.remove(id) {
                Some(_) => LabelEdit::Removed,
                None => LabelEdit::Unchanged,
            };
        }
        if self.labels.get(id).map(String::as_str) == Some(trimmed) {
            return LabelEdit::Unchanged;
        }
        self.labels.insert(id.to_string(), trimmed.to_string());
        LabelEdit::Set(trimmed.to_string())
    }

    pub fn label_for(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn desired_mapping(&self) -> DesiredMapping {
        DesiredMapping::from(self.labels.clone())
    }
}

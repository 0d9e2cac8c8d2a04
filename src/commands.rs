//! One-shot CLI commands: inspect and edit the label mapping

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::config::{LabelEdit, Settings};
use crate::host::gsettings::{self, default_status_path, read_status};
use crate::sync::SourceKind;

/// Ids of the keyboard layouts configured in GNOME, in configured order
pub fn configured_keyboard_ids() -> Result<Vec<String>> {
    Ok(gsettings::read_configured_sources()?
        .into_iter()
        .filter(|(source_type, _)| SourceKind::from_type(source_type).is_keyboard())
        .map(|(_, id)| id)
        .collect())
}

/// Text shown next to a layout: its custom label, or the id itself
pub fn shown_as<'a>(settings: &'a Settings, id: &'a str) -> &'a str {
    settings.label_for(id).unwrap_or(id)
}

pub fn list(settings_path: &Path) -> Result<()> {
    let settings = Settings::load_from(settings_path)?;
    let ids = match configured_keyboard_ids() {
        Ok(ids) => ids,
        Err(e) => {
            warn!(error = ?e, "Cannot read configured layouts, listing saved labels only");
            settings.labels.keys().cloned().collect()
        }
    };

    if ids.is_empty() {
        println!("No XKB layouts found. Add keyboard layouts in Settings to configure custom labels.");
        return Ok(());
    }

    for id in &ids {
        println!("{id:<20} shown as: {}", shown_as(&settings, id));
    }
    Ok(())
}

pub fn set(settings_path: &Path, id: &str, label: &str) -> Result<()> {
    let mut settings = Settings::load_from(settings_path)?;
    match settings.set_label(id, label) {
        LabelEdit::Set(label) => info!(id = %id, label = %label, "Saved custom label"),
        LabelEdit::Removed => info!(id = %id, "Removed custom label"),
        LabelEdit::Unchanged => {
            info!(id = %id, "Label unchanged");
            return Ok(());
        }
    }
    settings
        .save_to(settings_path)
        .context(format!("Failed to save label for '{id}'"))
}

pub fn unset(settings_path: &Path, id: &str) -> Result<()> {
    set(settings_path, id, "")
}

pub fn status(status_file: Option<&Path>) -> Result<()> {
    let path = match status_file {
        Some(path) => path.to_path_buf(),
        None => default_status_path()?,
    };
    let sources = read_status(&path).context("Is the daemon running?")?;

    for source in sources.iter().filter(|s| s.kind.is_keyboard()) {
        println!("{:<20} {}", source.id, source.label().unwrap_or("?"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shown_as_falls_back_to_id() {
        let mut settings = Settings::default();
        settings.set_label("us", "EN");

        assert_eq!(shown_as(&settings, "us"), "EN");
        assert_eq!(shown_as(&settings, "de"), "de");
    }

    #[test]
    fn test_set_and_unset_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        set(&path, "us", " EN ").unwrap();
        assert_eq!(Settings::load_from(&path).unwrap().label_for("us"), Some("EN"));

        unset(&path, "us").unwrap();
        assert_eq!(Settings::load_from(&path).unwrap().label_for("us"), None);
    }

    #[test]
    fn test_unset_missing_label_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        unset(&path, "us").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_status_without_snapshot_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(status(Some(dir.path().join("sources.json").as_path())).is_err());
    }
}

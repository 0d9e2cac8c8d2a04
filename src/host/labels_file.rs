use anyhow::Result;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use super::watch::watch_file;
use crate::config::Settings;
use crate::sync::{DesiredMapping, MappingStore, Subscription, SyncEvent};

/// Desired labels backed by the JSON settings file
#[derive(Debug, Clone)]
pub struct LabelsFile {
    path: PathBuf,
}

impl LabelsFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl MappingStore for LabelsFile {
    fn read(&self) -> Result<DesiredMapping> {
        Ok(Settings::load_from(&self.path)?.desired_mapping())
    }

    fn subscribe(&mut self, events: Sender<SyncEvent>) -> Result<Subscription> {
        watch_file(
            "labels-file",
            self.path.clone(),
            SyncEvent::MappingChanged,
            events,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_read_missing_file_is_empty_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let store = LabelsFile::new(dir.path().join("settings.json"));

        assert!(store.read().unwrap().is_empty());
    }

    #[test]
    fn test_read_reflects_saved_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = LabelsFile::new(path.clone());

        let mut settings = Settings::default();
        settings.set_label("us", "EN");
        settings.save_to(&path).unwrap();

        assert_eq!(store.read().unwrap().label_for("us"), Some("EN"));
    }

    #[test]
    fn test_subscribe_reports_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = LabelsFile::new(path.clone());
        let (tx, rx) = mpsc::channel();

        let _subscription = store.subscribe(tx).unwrap();

        let mut settings = Settings::default();
        settings.set_label("de", "DE");
        settings.save_to(&path).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), SyncEvent::MappingChanged);
    }
}

//! Live layout handles, the desired mapping and the collaborator traits
//! the synchronizer is driven through.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::mpsc::Sender;
use tracing::debug;

use crate::constants::kinds;

/// Kind of input source as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Xkb,
    Ibus,
    Other,
}

impl SourceKind {
    pub fn from_type(source_type: &str) -> Self {
        match source_type {
            kinds::XKB => SourceKind::Xkb,
            kinds::IBUS => SourceKind::Ibus,
            _ => SourceKind::Other,
        }
    }

    /// Only keyboard layouts take part in label overrides
    pub fn is_keyboard(self) -> bool {
        matches!(self, SourceKind::Xkb)
    }
}

/// Mutable handle to one live input source
///
/// The synchronizer only ever reads `id`/`kind` and reads or writes
/// `display_label`. A missing label or empty id marks a malformed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSource {
    pub id: String,
    pub kind: SourceKind,
    #[serde(rename = "label")]
    pub display_label: Option<String>,
}

impl InputSource {
    pub fn new(id: impl Into<String>, kind: SourceKind, display_label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            display_label: Some(display_label.into()),
        }
    }

    #[cfg(test)]
    pub fn keyboard(id: impl Into<String>, display_label: impl Into<String>) -> Self {
        Self::new(id, SourceKind::Xkb, display_label)
    }

    pub fn label(&self) -> Option<&str> {
        self.display_label.as_deref()
    }

    pub fn set_label(&mut self, label: &str) {
        self.display_label = Some(label.to_string());
    }

    /// Identifier and current label, or None when either is unusable
    pub(crate) fn parts(&self) -> Option<(&str, &str)> {
        if self.id.is_empty() {
            return None;
        }
        self.label().map(|label| (self.id.as_str(), label))
    }
}

/// Desired labels keyed by layout identifier, read wholesale from the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredMapping(BTreeMap<String, String>);

impl DesiredMapping {
    /// Desired label for `id`; blank values count as "no override"
    pub fn label_for(&self, id: &str) -> Option<&str> {
        self.0
            .get(id)
            .map(String::as_str)
            .filter(|label| !label.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, String>> for DesiredMapping {
    fn from(labels: BTreeMap<String, String>) -> Self {
        Self(labels)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DesiredMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Events delivered to the lifecycle controller, in arrival order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// The desired mapping was edited
    MappingChanged,
    /// The host rebuilt its list of input sources
    LayoutSetChanged,
    /// Stop the session and put every original label back
    Shutdown,
}

/// Scoped event subscription, released when dropped
pub struct Subscription {
    name: &'static str,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(name: &'static str, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            name,
            release: Some(Box::new(release)),
        }
    }

    /// Release now instead of waiting for drop
    pub fn cancel(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            debug!(subscription = self.name, "Releasing subscription");
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Host side owning the live input sources
pub trait LayoutProvider {
    /// Current live sources, or None when the host has no list right now
    fn layouts_mut(&mut self) -> Option<&mut [InputSource]>;

    /// Rebuild the handles after the host reported a new layout set
    fn reload(&mut self) -> Result<()> {
        Ok(())
    }

    /// Make label changes visible to the host after a pass
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Deliver `SyncEvent::LayoutSetChanged` whenever the set is rebuilt
    fn subscribe(&mut self, events: Sender<SyncEvent>) -> Result<Subscription>;
}

/// Where the desired mapping lives; written only by the settings editor
pub trait MappingStore {
    fn read(&self) -> Result<DesiredMapping>;

    /// Deliver `SyncEvent::MappingChanged` after every edit
    fn subscribe(&mut self, events: Sender<SyncEvent>) -> Result<Subscription>;
}

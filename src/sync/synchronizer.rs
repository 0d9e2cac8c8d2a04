//! Applies desired labels to live keyboard layouts and puts originals back

use tracing::{debug, warn};

use super::override_store::OverrideStore;
use super::source::{DesiredMapping, InputSource};

/// Outcome counters for one reconcile pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Layouts now showing a desired label
    pub applied: usize,
    /// Layouts now showing their original label
    pub restored: usize,
    /// Malformed entries left untouched
    pub skipped: usize,
}

/// Owns the session's OverrideStore and drives label changes
#[derive(Debug, Default)]
pub struct LabelSynchronizer {
    originals: OverrideStore,
}

impl LabelSynchronizer {
    pub fn new() -> Self {
        Self {
            originals: OverrideStore::new(),
        }
    }

    pub fn originals(&self) -> &OverrideStore {
        &self.originals
    }

    /// Drop captured originals; used when the host rebuilds its layouts
    pub fn reset(&mut self) {
        if self.originals.is_empty() {
            return;
        }
        debug!(count = self.originals.len(), "Clearing captured originals");
        self.originals.clear();
    }

    /// One pass over `layouts`: apply the desired label or restore the original
    ///
    /// Non-keyboard sources are ignored. Malformed entries are skipped and
    /// never abort the pass. Running it twice with the same inputs is a no-op
    /// the second time.
    pub fn reconcile(&mut self, desired: &DesiredMapping, layouts: &mut [InputSource]) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        for source in layouts.iter_mut() {
            if !source.kind.is_keyboard() {
                continue;
            }

            let Some((id, current)) = source.parts() else {
                warn!(source = ?source, "Skipping malformed input source");
                summary.skipped += 1;
                continue;
            };

            // Captured before any write so the true original survives re-runs
            if !self.originals.has(id) {
                self.originals.remember(id, current);
            }

            let id = id.to_string();
            if let Some(label) = desired.label_for(&id) {
                source.set_label(label);
                summary.applied += 1;
            } else if let Some(original) = self.originals.original_of(&id) {
                source.set_label(original);
                summary.restored += 1;
            }
        }

        debug!(
            applied = summary.applied,
            restored = summary.restored,
            skipped = summary.skipped,
            tracked = self.originals.len(),
            "Reconciled layout labels"
        );
        summary
    }

    /// Write every captured original back onto the live layout with that id
    ///
    /// Layouts that vanished are skipped. Returns how many labels were restored.
    pub fn restore_all(&self, layouts: &mut [InputSource]) -> usize {
        let mut restored = 0;
        for (id, original) in self.originals.entries() {
            for source in layouts.iter_mut().filter(|source| source.id == id) {
                source.set_label(original);
                restored += 1;
            }
        }
        debug!(restored, tracked = self.originals.len(), "Restored original labels");
        restored
    }
}

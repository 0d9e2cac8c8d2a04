use std::collections::HashMap;
use tracing::debug;

/// Original (pre-override) labels captured during one session
///
/// The first label seen for an identifier wins; later calls to `remember`
/// never overwrite it until the store is cleared.
#[derive(Debug, Default)]
pub struct OverrideStore {
    originals: HashMap<String, String>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `label` as the original for `id` unless one is already held.
    /// Returns true when the label was stored.
    pub fn remember(&mut self, id: &str, label: &str) -> bool {
        if self.originals.contains_key(id) {
            return false;
        }
        debug!(id = %id, original = %label, "Captured original label");
        self.originals.insert(id.to_string(), label.to_string());
        true
    }

    pub fn original_of(&self, id: &str) -> Option<&str> {
        self.originals.get(id).map(String::as_str)
    }

    pub fn has(&self, id: &str) -> bool {
        self.originals.contains_key(id)
    }

    /// Forget every original without touching live layouts
    pub fn clear(&mut self) {
        self.originals.clear();
    }

    /// Stored `(id, original)` pairs, used for restore sweeps
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.originals.iter().map(|(id, label)| (id.as_str(), label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.originals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_first_sight_wins() {
        let mut store = OverrideStore::new();

        assert!(store.remember("us", "en"));
        assert!(!store.remember("us", "EN"));
        assert_eq!(store.original_of("us"), Some("en"));
    }

    #[test]
    fn test_lookup_missing_id() {
        let store = OverrideStore::new();
        assert_eq!(store.original_of("de"), None);
        assert!(!store.has("de"));
    }

    #[test]
    fn test_clear_allows_recapture() {
        let mut store = OverrideStore::new();
        store.remember("us", "en");
        store.remember("de", "de");

        store.clear();
        assert!(store.is_empty());

        assert!(store.remember("us", "us"));
        assert_eq!(store.original_of("us"), Some("us"));
    }

    #[test]
    fn test_entries_lists_all_originals() {
        let mut store = OverrideStore::new();
        store.remember("us", "en");
        store.remember("de+neo", "de");

        let mut entries: Vec<_> = store.entries().collect();
        entries.sort();
        assert_eq!(entries, vec![("de+neo", "de"), ("us", "en")]);
        assert_eq!(store.len(), 2);
    }
}

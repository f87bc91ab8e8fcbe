//! Append-only message store.
//!
//! Ordered, id-keyed log of classified events. Arrival order is preserved
//! and is the only ordering guarantee. The unread count is always derived
//! from the entries - never an independently mutated counter that can
//! drift.

use std::collections::HashSet;

use crate::InboundEvent;

/// In-memory event log, exclusively owned by the session.
///
/// Presentation layers only see it through read accessors and the
/// explicit mutating operations here; nothing splices the log directly.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    entries: Vec<InboundEvent>,
    ids: HashSet<String>,
}

impl MessageStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event in arrival order.
    ///
    /// No-op when the id is already present: a duplicate frame never
    /// creates a second entry. Returns `true` when the event was newly
    /// inserted, which drives notification idempotence downstream.
    pub fn append(&mut self, event: InboundEvent) -> bool {
        if !self.ids.insert(event.id.clone()) {
            return false;
        }
        self.entries.push(event);
        true
    }

    /// Mark one entry read. No-op if the id is absent.
    ///
    /// Returns `true` when the entry was present and previously unread.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if !entry.read => {
                entry.read = true;
                true
            },
            _ => false,
        }
    }

    /// Remove one entry. No-op if the id is absent.
    pub fn remove(&mut self, id: &str) -> bool {
        if !self.ids.remove(id) {
            return false;
        }
        self.entries.retain(|e| e.id != id);
        true
    }

    /// Empty the store. Unread count derives back to zero.
    pub fn clear_all(&mut self) {
        self.entries.clear();
        self.ids.clear();
    }

    /// Number of stored entries not yet marked read. Always recomputed
    /// from the entries.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.read).count()
    }

    /// All entries in arrival order.
    #[must_use]
    pub fn messages(&self) -> &[InboundEvent] {
        &self.entries
    }

    /// Look up one entry by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&InboundEvent> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// True when the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tripline_proto::EventKind;

    use super::*;

    fn event(id: &str, kind: EventKind, read: bool) -> InboundEvent {
        InboundEvent { id: id.to_owned(), kind, data: json!({}), timestamp: 0, read }
    }

    #[test]
    fn append_preserves_arrival_order() {
        let mut store = MessageStore::new();
        store.append(event("b", EventKind::ChatMessage, false));
        store.append(event("a", EventKind::SystemMessage, false));
        store.append(event("c", EventKind::OrderUpdate, false));

        let ids: Vec<&str> = store.messages().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn duplicate_id_leaves_store_unchanged() {
        let mut store = MessageStore::new();
        assert!(store.append(event("m1", EventKind::ChatMessage, false)));
        store.mark_read("m1");

        let duplicate = event("m1", EventKind::ChatMessage, false);
        assert!(!store.append(duplicate));

        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 0, "duplicate must not resurrect unread state");
    }

    #[test]
    fn mark_read_decrements_by_exactly_one() {
        let mut store = MessageStore::new();
        store.append(event("m1", EventKind::ChatMessage, false));
        store.append(event("m2", EventKind::ChatMessage, false));
        assert_eq!(store.unread_count(), 2);

        assert!(store.mark_read("m1"));
        assert_eq!(store.unread_count(), 1);

        // Second mark of the same entry changes nothing
        assert!(!store.mark_read("m1"));
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn mark_read_absent_id_is_noop() {
        let mut store = MessageStore::new();
        store.append(event("m1", EventKind::ChatMessage, false));
        assert!(!store.mark_read("ghost"));
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn receipts_never_count_as_unread() {
        let mut store = MessageStore::new();
        store.append(event("r1", EventKind::MessageSent, true));
        store.append(event("m1", EventKind::SupportMessage, false));
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn remove_frees_the_id() {
        let mut store = MessageStore::new();
        store.append(event("m1", EventKind::ChatMessage, false));
        assert!(store.remove("m1"));
        assert!(!store.remove("m1"));
        assert!(store.is_empty());

        // The id can be appended again after removal
        assert!(store.append(event("m1", EventKind::ChatMessage, false)));
    }

    #[test]
    fn clear_all_empties_and_zeroes_unread() {
        let mut store = MessageStore::new();
        store.append(event("m1", EventKind::ChatMessage, false));
        store.append(event("m2", EventKind::ChatMessage, false));

        store.clear_all();
        assert!(store.is_empty());
        assert_eq!(store.unread_count(), 0);
    }
}

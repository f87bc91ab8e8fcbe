//! Property-based tests for the message store and reload coordinator.
//!
//! Verifies that the derived-count and debounce-spacing invariants hold
//! under arbitrary operation sequences, not just the scenario paths.

use std::time::{Duration, Instant};

use proptest::prelude::*;
use serde_json::json;
use tripline_core::{
    EventKind, InboundEvent, MessageStore, ReloadConfig, ReloadCoordinator,
};

/// Operations against the store.
#[derive(Debug, Clone)]
enum StoreOp {
    Append { id: u8, kind: EventKind },
    MarkRead { id: u8 },
    Remove { id: u8 },
    ClearAll,
}

fn kind_strategy() -> impl Strategy<Value = EventKind> {
    prop_oneof![
        Just(EventKind::BookingNotification),
        Just(EventKind::OrderUpdate),
        Just(EventKind::SystemMessage),
        Just(EventKind::ChatMessage),
        Just(EventKind::SupportMessage),
        Just(EventKind::MessageSent),
        Just(EventKind::Error),
        Just(EventKind::Unknown),
    ]
}

fn op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        4 => (any::<u8>(), kind_strategy()).prop_map(|(id, kind)| StoreOp::Append { id, kind }),
        2 => any::<u8>().prop_map(|id| StoreOp::MarkRead { id }),
        1 => any::<u8>().prop_map(|id| StoreOp::Remove { id }),
        1 => Just(StoreOp::ClearAll),
    ]
}

fn event(id: u8, kind: EventKind) -> InboundEvent {
    InboundEvent {
        id: format!("m{id}"),
        kind,
        data: json!({ "type": kind.as_wire() }),
        timestamp: u64::from(id),
        read: kind == EventKind::MessageSent,
    }
}

proptest! {
    /// unread_count always equals the number of stored unread entries,
    /// ids stay unique, and receipts never count as unread.
    #[test]
    fn unread_count_is_always_derivable(ops in prop::collection::vec(op_strategy(), 0..100)) {
        let mut store = MessageStore::new();

        for op in ops {
            match op {
                StoreOp::Append { id, kind } => { store.append(event(id, kind)); },
                StoreOp::MarkRead { id } => { store.mark_read(&format!("m{id}")); },
                StoreOp::Remove { id } => { store.remove(&format!("m{id}")); },
                StoreOp::ClearAll => store.clear_all(),
            }

            let derived = store.messages().iter().filter(|e| !e.read).count();
            prop_assert_eq!(store.unread_count(), derived);

            let mut ids: Vec<&str> = store.messages().iter().map(|e| e.id.as_str()).collect();
            let unique_before = ids.len();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), unique_before, "duplicate id in store");

            for entry in store.messages() {
                if entry.kind == EventKind::MessageSent {
                    prop_assert!(entry.read, "receipt counted as unread");
                }
            }
        }
    }

    /// Appending an existing id never changes the store.
    #[test]
    fn duplicate_append_is_identity(ids in prop::collection::vec(any::<u8>(), 1..40)) {
        let mut store = MessageStore::new();
        for id in &ids {
            store.append(event(*id, EventKind::ChatMessage));
        }
        let snapshot: Vec<String> = store.messages().iter().map(|e| e.id.clone()).collect();

        for id in &ids {
            prop_assert!(!store.append(event(*id, EventKind::ChatMessage)));
        }
        let after: Vec<String> = store.messages().iter().map(|e| e.id.clone()).collect();
        prop_assert_eq!(snapshot, after);
    }

    /// For triggers at arbitrary sub-window intervals, executed reloads
    /// never exceed ceil(T / window) + 1 and executions are never closer
    /// than the window.
    #[test]
    fn reload_executions_respect_window(
        gaps in prop::collection::vec(0u64..1900, 1..80),
    ) {
        let window = Duration::from_millis(2000);
        let config = ReloadConfig { debounce_window: window, post_send_settle: Duration::ZERO };
        let mut rc = ReloadCoordinator::new(config);

        let t0 = Instant::now();
        let mut now = t0;
        let mut executed_at: Vec<Instant> = Vec::new();

        for gap in &gaps {
            now += Duration::from_millis(*gap);
            if rc.tick(now) {
                executed_at.push(now);
                rc.complete(now);
            }
            if rc.trigger(now) {
                executed_at.push(now);
                rc.complete(now);
            }
        }
        // Drain the trailing reload
        let end = now + window + window;
        if rc.tick(end) {
            executed_at.push(end);
        }

        let elapsed = (end - t0).as_millis() as u64;
        let bound = elapsed.div_ceil(2000) + 1;
        prop_assert!(
            executed_at.len() as u64 <= bound,
            "{} executions over {}ms exceeds bound {}",
            executed_at.len(),
            elapsed,
            bound
        );

        for pair in executed_at.windows(2) {
            prop_assert!(pair[1] - pair[0] >= window, "executions closer than the window");
        }
    }
}

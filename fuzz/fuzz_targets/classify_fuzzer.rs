//! Fuzz target for frame classification
//!
//! Arbitrary bytes that parse as JSON must classify without panicking,
//! and the classified event must uphold the classification invariants.
//!
//! # Invariants
//!
//! - classification is total: no input panics or is dropped
//! - the event id is never empty (server id or fallback)
//! - only `message_sent` frames are born read
//! - the raw payload is preserved verbatim on the event

#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use tripline_core::classify;
use tripline_proto::{EventKind, Payload};

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let event = classify(frame.clone(), "fallback-id".to_owned(), 1000);

    assert!(!event.id.is_empty(), "classified event must always carry an id");
    assert_eq!(event.data, frame, "raw payload must be preserved verbatim");

    if event.read {
        assert_eq!(event.kind, EventKind::MessageSent, "only receipts are born read");
    }
    if event.kind == EventKind::Unknown {
        let declared = frame.get("type").and_then(Value::as_str);
        assert!(
            declared.is_none_or(|t| EventKind::from_wire(t) == EventKind::Unknown),
            "recognized type must not classify as unknown"
        );
    }

    // Typed payload extraction over the same frame must also be total
    let _ = Payload::from_value(&event.data);
});

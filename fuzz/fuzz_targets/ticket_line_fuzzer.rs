//! Fuzz target for support line attribution parsing
//!
//! Arbitrary strings must parse without panicking and without losing
//! content.
//!
//! # Invariants
//!
//! - parsing is total
//! - an attributed sender is non-empty and whitespace-free
//! - unattributed lines are retained byte-for-byte

#![no_main]

use libfuzzer_sys::fuzz_target;
use tripline_core::TicketLine;

fuzz_target!(|line: &str| {
    let parsed = TicketLine::parse(line);

    match &parsed.sender {
        Some(sender) => {
            assert!(!sender.is_empty(), "attributed sender must be non-empty");
            assert!(
                !sender.contains(char::is_whitespace),
                "attributed sender must be whitespace-free"
            );
            assert!(line.contains(':'), "attribution requires a colon in the input");
        }
        None => {
            assert_eq!(parsed.text, line, "unattributed lines are retained verbatim");
        }
    }
});

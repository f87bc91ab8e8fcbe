//! Fuzz target for the reload debounce coordinator
//!
//! Arbitrary trigger/tick/complete interleavings with advancing virtual
//! time must never violate the debounce guarantees.
//!
//! # Invariants
//!
//! - at least one debounce window separates two executions
//! - no execution starts while another is in flight
//! - a trigger is never silently lost: after triggers stop, ticking one
//!   full window forward drains any armed deadline

#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tripline_core::{ReloadConfig, ReloadCoordinator};

const WINDOW: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Arbitrary)]
enum ReloadOp {
    Trigger,
    TriggerPostSend,
    Tick,
    Complete,
    Advance { millis: u16 },
}

fuzz_target!(|ops: Vec<ReloadOp>| {
    let config = ReloadConfig {
        debounce_window: WINDOW,
        post_send_settle: Duration::from_millis(500),
    };
    let mut rc: ReloadCoordinator<Instant> = ReloadCoordinator::new(config);
    let mut now = Instant::now();
    let mut last_execution: Option<Instant> = None;
    let mut in_flight = false;

    let mut record_execution = |at: Instant, in_flight: &mut bool| {
        assert!(!*in_flight, "no execution may start while another is in flight");
        if let Some(last) = last_execution {
            assert!(at - last >= WINDOW, "executions closer than one window");
        }
        last_execution = Some(at);
        *in_flight = true;
    };

    for op in ops {
        match op {
            ReloadOp::Trigger => {
                if rc.trigger(now) {
                    record_execution(now, &mut in_flight);
                }
            }
            ReloadOp::TriggerPostSend => {
                if rc.trigger_post_send(now) {
                    record_execution(now, &mut in_flight);
                }
            }
            ReloadOp::Tick => {
                if rc.tick(now) {
                    record_execution(now, &mut in_flight);
                }
            }
            ReloadOp::Complete => {
                if in_flight {
                    rc.complete(now);
                    in_flight = false;
                }
            }
            ReloadOp::Advance { millis } => {
                now += Duration::from_millis(u64::from(millis));
            }
        }

        assert_eq!(rc.in_flight(), in_flight, "in-flight bookkeeping must agree");
    }

    // Drain: a surviving armed deadline fires within one window
    if !in_flight {
        now += WINDOW + WINDOW;
        if rc.tick(now) {
            record_execution(now, &mut in_flight);
        }
        assert!(rc.next_deadline().is_none_or(|d| d > now));
    }
});

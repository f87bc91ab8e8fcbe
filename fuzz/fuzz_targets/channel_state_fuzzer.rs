//! Fuzz target for the channel lifecycle state machine
//!
//! Drives arbitrary operation sequences with monotonically advancing
//! virtual time and checks the lifecycle invariants on every step.
//!
//! # Invariants
//!
//! - frozen implies no scheduled retry
//! - a retry is only ever scheduled while Disconnected
//! - sends succeed exactly in Connected
//! - an open transport action only follows connect() or a due retry

#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tripline_core::{Channel, ChannelAction, ChannelConfig, Identity, LinkState};

#[derive(Debug, Clone, Arbitrary)]
enum ChannelOp {
    Connect { empty_user: bool },
    OnOpen,
    OnClose,
    Send,
    Disconnect,
    Advance { millis: u16 },
    Tick,
}

fuzz_target!(|ops: Vec<ChannelOp>| {
    let config = ChannelConfig {
        retry_base: Duration::from_millis(100),
        retry_cap: Duration::from_secs(5),
    };
    let mut channel: Channel<Instant> = Channel::new(config);
    let mut now = Instant::now();

    for op in ops {
        match op {
            ChannelOp::Connect { empty_user } => {
                let user = if empty_user { "" } else { "user-1" };
                let result = channel.connect(Identity::new(user, "tok"), now);
                assert_eq!(result.is_err(), empty_user, "only an empty user id is rejected");
            }
            ChannelOp::OnOpen => {
                let actions = channel.on_open(now);
                if channel.is_frozen() {
                    assert_eq!(actions, vec![ChannelAction::CloseTransport]);
                }
            }
            ChannelOp::OnClose => {
                channel.on_close(now);
                assert_eq!(channel.state(), LinkState::Disconnected);
            }
            ChannelOp::Send => {
                let result = channel.send(serde_json::json!({ "type": "chat_message" }));
                assert_eq!(result.is_ok(), channel.state() == LinkState::Connected);
            }
            ChannelOp::Disconnect => {
                channel.disconnect(now);
                assert!(channel.is_frozen());
                assert_eq!(channel.state(), LinkState::Disconnected);
            }
            ChannelOp::Advance { millis } => {
                now += Duration::from_millis(u64::from(millis));
            }
            ChannelOp::Tick => {
                let actions = channel.tick(now);
                if actions.iter().any(|a| matches!(a, ChannelAction::OpenTransport(_))) {
                    assert_eq!(channel.state(), LinkState::Connecting);
                }
            }
        }

        // Core safety properties, checked after every operation
        if channel.is_frozen() {
            assert!(channel.retry_at().is_none(), "frozen channel must hold no retry");
        }
        if channel.retry_at().is_some() {
            assert_eq!(
                channel.state(),
                LinkState::Disconnected,
                "retry may only be scheduled while disconnected"
            );
        }
    }
});

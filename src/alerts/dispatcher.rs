//! Anti-flood policy.
//!
//! | Kind          | Sent when                          | Default cooldown |
//! |---------------|------------------------------------|------------------|
//! | Fall          | rising edge OR cooldown elapsed    | 5 s              |
//! | HeartRate     | rising edge OR cooldown elapsed    | 5 s              |
//! | Sos           | always (button edge found upstream)| 0                |
//! | VoiceCommand  | cooldown elapsed                   | 0                |
//! | Telemetry     | cooldown elapsed                   | 1 s              |
//!
//! A condition that stays true re-alerts once per cooldown.  A condition
//! that clears and returns alerts immediately, so a flapping input can
//! alert at tick rate; the cooldown only bounds a *continuous* condition.

use log::{debug, info};

use super::{AlertEvent, AlertKind, Outbox};
use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::config::{AlertCooldowns, secs_to_ms};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    pub cooldown_ms: u64,
    /// A rising edge bypasses the cooldown.
    pub edge_triggered: bool,
}

impl AlertPolicy {
    pub fn for_kind(kind: AlertKind, cooldowns: &AlertCooldowns) -> Self {
        match kind {
            AlertKind::Fall => Self {
                cooldown_ms: secs_to_ms(cooldowns.fall_secs),
                edge_triggered: true,
            },
            AlertKind::HeartRate => Self {
                cooldown_ms: secs_to_ms(cooldowns.heart_rate_secs),
                edge_triggered: true,
            },
            AlertKind::Sos => Self {
                cooldown_ms: 0,
                edge_triggered: false,
            },
            AlertKind::VoiceCommand => Self {
                cooldown_ms: secs_to_ms(cooldowns.voice_command_secs),
                edge_triggered: false,
            },
            AlertKind::Telemetry => Self {
                cooldown_ms: secs_to_ms(cooldowns.telemetry_secs),
                edge_triggered: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Gate {
    last_sent_ms: Option<u64>,
    /// Condition held on the previous evaluation.
    active: bool,
}

/// Per-kind last-sent timestamp and previous-tick condition.
///
/// Owned by the Scheduler as part of its schedule state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertLedger {
    gates: [Gate; AlertKind::COUNT],
}

impl AlertLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_sent_ms(&self, kind: AlertKind) -> Option<u64> {
        self.gates[kind.index()].last_sent_ms
    }

    pub fn is_active(&self, kind: AlertKind) -> bool {
        self.gates[kind.index()].active
    }

    /// Record that the condition for `kind` was evaluated and is false.
    pub fn observe_inactive(&mut self, kind: AlertKind) {
        self.gates[kind.index()].active = false;
    }
}

pub struct AlertDispatcher {
    policies: [AlertPolicy; AlertKind::COUNT],
}

impl AlertDispatcher {
    pub fn new(cooldowns: &AlertCooldowns) -> Self {
        Self {
            policies: AlertKind::ALL.map(|k| AlertPolicy::for_kind(k, cooldowns)),
        }
    }

    pub fn policy(&self, kind: AlertKind) -> AlertPolicy {
        self.policies[kind.index()]
    }

    /// Apply the policy for `event` and queue its message if it passes.
    ///
    /// Returns `true` when the message was queued.
    pub fn dispatch(
        &self,
        event: AlertEvent,
        now_ms: u64,
        ledger: &mut AlertLedger,
        outbox: &mut Outbox,
        sink: &mut impl EventSink,
    ) -> bool {
        let kind = event.kind();
        let policy = self.policy(kind);
        let gate = &mut ledger.gates[kind.index()];

        let rising = !gate.active;
        gate.active = true;

        let cooled = gate
            .last_sent_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= policy.cooldown_ms);

        if !(cooled || (policy.edge_triggered && rising)) {
            debug!("{} alert suppressed (cooldown)", kind);
            sink.emit(&AppEvent::AlertSuppressed(kind));
            return false;
        }

        gate.last_sent_ms = Some(now_ms);
        if kind != AlertKind::Telemetry {
            info!("{} alert queued at {} ms", kind, now_ms);
        }
        outbox.push(event.to_message(), sink);
        sink.emit(&AppEvent::AlertQueued(kind));
        true
    }
}

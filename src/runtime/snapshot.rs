//! Read-only diagnostics for inspectors and tests.

use serde::{Deserialize, Serialize};

use crate::triggers::{RejectReason, TriggerId, TriggerState};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub name: String,
    pub description: String,
    pub active: bool,
    pub subscribers: usize,
    pub raised_count: u64,
    pub failure_count: u64,
    pub last_raised_time: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerSnapshot {
    pub id: TriggerId,
    pub name: String,
    pub state: TriggerState,
    pub has_fired: bool,
    pub fire_count: u64,
    pub rejected_count: u64,
    pub last_rejection: Option<RejectReason>,
    pub cooldown_remaining: f32,
    pub is_executing: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListenerSnapshot {
    pub name: String,
    pub channel: Option<String>,
    pub enabled: bool,
    pub received_count: u64,
    pub is_executing: bool,
}

/// State of every channel, trigger and listener in a runtime.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSnapshot {
    /// Scene time in seconds.
    pub time: f64,
    pub ticks: u64,
    pub channels: Vec<ChannelSnapshot>,
    pub triggers: Vec<TriggerSnapshot>,
    pub listeners: Vec<ListenerSnapshot>,
}

impl RuntimeSnapshot {
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<&ChannelSnapshot> {
        self.channels.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn trigger(&self, id: TriggerId) -> Option<&TriggerSnapshot> {
        self.triggers.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn listener(&self, name: &str) -> Option<&ListenerSnapshot> {
        self.listeners.iter().find(|l| l.name == name)
    }
}

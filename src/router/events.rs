// Observable router events
// Administrative changes and completed swaps are appended here and logged
//
// Numan Thabit 2025 Nov

use crate::router::access::Role;
use crate::types::{Address, Amount};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RouterEvent {
    ExecutorSet {
        executor: Address,
        activation_block: u64,
    },
    ExecutorRemoved {
        executor: Address,
    },
    RoleGranted {
        role: Role,
        account: Address,
        sender: Address,
    },
    RoleRevoked {
        role: Role,
        account: Address,
        sender: Address,
    },
    Paused {
        account: Address,
    },
    Unpaused {
        account: Address,
    },
    Withdrawal {
        token: Address,
        amount: Amount,
        receiver: Address,
    },
    Swapped {
        sender: Address,
        receiver: Address,
        token_in: Address,
        token_out: Address,
        amount_in: Amount,
        amount_out: Amount,
    },
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<RouterEvent>,
}

impl EventLog {
    pub fn emit(&mut self, event: RouterEvent) {
        info!(event = ?event, "router event");
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop events emitted by a call that is being rolled back.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    pub fn all(&self) -> &[RouterEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&RouterEvent> {
        self.events.last()
    }
}

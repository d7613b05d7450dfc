use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use custody_types::{EscrowKey, EscrowVariant, PrincipalId, SettlementKind};
use serde::{Deserialize, Serialize};

/// What happened to an escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEventKind {
    Opened {
        key: EscrowKey,
        variant: EscrowVariant,
        #[serde(skip_serializing_if = "Option::is_none")]
        unlock_time: Option<DateTime<Utc>>,
    },
    Deposited {
        key: EscrowKey,
        amount: u64,
        balance: u64,
    },
    LockExtended {
        key: EscrowKey,
        previous: DateTime<Utc>,
        unlock_time: DateTime<Utc>,
    },
    Settled {
        key: EscrowKey,
        kind: SettlementKind,
        recipient: PrincipalId,
        amount: u64,
    },
}

/// Journal entry with its position in the ledger's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub sequence: u64,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: LedgerEventKind,
}

/// Append-only event history of one ledger.
///
/// With a capacity set, the oldest entries are dropped; sequence numbers keep
/// counting so gaps show what was dropped.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: VecDeque<LedgerEvent>,
    next_sequence: u64,
    capacity: Option<usize>,
}

impl Journal {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            next_sequence: 0,
            capacity,
        }
    }

    pub(crate) fn record(&mut self, at: DateTime<Utc>, kind: LedgerEventKind) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push_back(LedgerEvent { sequence, at, kind });
        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                self.entries.pop_front();
            }
        }
        sequence
    }

    pub fn entries(&self) -> impl Iterator<Item = &LedgerEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sequence number the next entry will get.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}

//! Audit Trail — hash-chained event log
//!
//! Every committed operation appends its events here. Each entry commits to
//! its predecessor with a SHA-256 hash, so a replayed history can be checked
//! against the head hash and any edited or dropped entry is detected.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AuditError;
use crate::events::ContractEvent;

/// Hash of the (empty) chain before the first entry.
pub const GENESIS_HASH: [u8; 32] = [0u8; 32];

/// A single committed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub sequence: u64,
    pub entry_id: Uuid,
    pub timestamp: i64,
    pub event: ContractEvent,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

/// An event raised inside a unit of work that has not committed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvent {
    pub timestamp: i64,
    pub event: ContractEvent,
}

/// Append-only event log.
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number.
    pub fn append(&mut self, event: ContractEvent, timestamp: i64) -> u64 {
        let sequence = self.entries.len() as u64;
        let prev_hash = self.head_hash();
        let hash = entry_hash(sequence, timestamp, &prev_hash, &event);

        self.entries.push(AuditEntry {
            sequence,
            entry_id: Uuid::now_v7(),
            timestamp,
            event,
            prev_hash,
            hash,
        });
        sequence
    }

    /// Append a committed unit of work's events in order. Returns how many
    /// entries were added.
    pub fn commit(&mut self, pending: Vec<PendingEvent>) -> usize {
        let count = pending.len();
        for PendingEvent { timestamp, event } in pending {
            self.append(event, timestamp);
        }
        count
    }

    /// Hash of the latest entry, or [`GENESIS_HASH`] when empty.
    pub fn head_hash(&self) -> [u8; 32] {
        self.entries.last().map_or(GENESIS_HASH, |e| e.hash)
    }

    /// Recompute the whole chain.
    pub fn verify(&self) -> Result<(), AuditError> {
        verify_entries(&self.entries)
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn events(&self) -> impl Iterator<Item = &ContractEvent> {
        self.entries.iter().map(|e| &e.event)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Check that `entries` form an unbroken chain starting at genesis.
pub fn verify_entries(entries: &[AuditEntry]) -> Result<(), AuditError> {
    let mut prev_hash = GENESIS_HASH;
    for (index, entry) in entries.iter().enumerate() {
        let expected_sequence = index as u64;
        let recomputed = entry_hash(entry.sequence, entry.timestamp, &prev_hash, &entry.event);
        if entry.sequence != expected_sequence
            || entry.prev_hash != prev_hash
            || entry.hash != recomputed
        {
            return Err(AuditError::BrokenChain {
                sequence: expected_sequence,
            });
        }
        prev_hash = entry.hash;
    }
    Ok(())
}

fn entry_hash(sequence: u64, timestamp: i64, prev_hash: &[u8; 32], event: &ContractEvent) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash);
    hasher.update(sequence.to_be_bytes());
    hasher.update(timestamp.to_be_bytes());
    match serde_json::to_vec(event) {
        Ok(payload) => hasher.update(&payload),
        Err(err) => {
            warn!(error = %err, event = event.label(), "event encoding failed, hashing debug form");
            hasher.update(format!("{event:?}").as_bytes());
        }
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{FinalPayoutSet, Mint};
    use types::ids::{AccountId, MarketId};

    fn mint_event(amount: u128) -> ContractEvent {
        ContractEvent::Mint(Mint {
            market: MarketId::new("ACME-IPO"),
            minter: AccountId::new(),
            amount,
        })
    }

    #[test]
    fn test_append_chains_hashes() {
        let mut trail = AuditTrail::new();
        assert_eq!(trail.head_hash(), GENESIS_HASH);

        trail.append(mint_event(1), 10);
        trail.append(mint_event(2), 20);

        let entries = trail.entries();
        assert_eq!(entries[0].prev_hash, GENESIS_HASH);
        assert_eq!(entries[1].prev_hash, entries[0].hash);
        assert_eq!(trail.head_hash(), entries[1].hash);
        assert!(trail.verify().is_ok());
    }

    #[test]
    fn test_commit_appends_in_order() {
        let mut trail = AuditTrail::new();
        trail.append(mint_event(1), 10);
        let added = trail.commit(vec![
            PendingEvent {
                timestamp: 20,
                event: mint_event(2),
            },
            PendingEvent {
                timestamp: 21,
                event: mint_event(3),
            },
        ]);
        assert_eq!(added, 2);
        assert_eq!(trail.len(), 3);
        assert_eq!(trail.entries()[2].timestamp, 21);
        assert!(matches!(&trail.entries()[2].event, ContractEvent::Mint(m) if m.amount == 3));
        assert!(trail.verify().is_ok());
        assert_eq!(trail.commit(Vec::new()), 0);
    }

    #[test]
    fn test_tampered_event_detected() {
        let mut trail = AuditTrail::new();
        trail.append(mint_event(1), 10);
        trail.append(mint_event(2), 20);

        let mut entries = trail.entries().to_vec();
        entries[0].event = ContractEvent::FinalPayoutSet(FinalPayoutSet {
            market: MarketId::new("ACME-IPO"),
            payout: 1,
        });
        assert_eq!(
            verify_entries(&entries),
            Err(AuditError::BrokenChain { sequence: 0 })
        );
    }

    #[test]
    fn test_dropped_entry_detected() {
        let mut trail = AuditTrail::new();
        trail.append(mint_event(1), 10);
        trail.append(mint_event(2), 20);
        trail.append(mint_event(3), 30);

        let mut entries = trail.entries().to_vec();
        entries.remove(1);
        assert!(verify_entries(&entries).is_err());
    }

    #[test]
    fn test_entries_serialize() {
        let mut trail = AuditTrail::new();
        trail.append(mint_event(7), 1);
        let json = serde_json::to_string(trail.entries()).unwrap();
        let back: Vec<AuditEntry> = serde_json::from_str(&json).unwrap();
        assert!(verify_entries(&back).is_ok());
    }
}

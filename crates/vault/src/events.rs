//! Ordered record of vault state changes.

use crate::fees::Bucket;
use crate::params::AdminParams;
use clmm_vault_domain::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Type of vault event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VaultEventType {
    /// Shares were minted against a deposit.
    Minted,
    /// Shares were burned for a withdrawal.
    Burned,
    /// Position fees were collected and split.
    FeesHarvested,
    /// Keeper rebalance completed.
    Rebalanced,
    /// Manager moved the position to a new range.
    ExecutiveRebalanced,
    /// Admin params update queued.
    AdminParamsQueued,
    /// Manager role changed hands or was renounced.
    OwnershipTransferred,
    /// Fee bucket withdrawn.
    FeesWithdrawn,
    /// Shares moved between holders.
    SharesTransferred,
    /// Share allowance set.
    SharesApproved,
}

/// A recorded vault event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEvent {
    /// Position in the log, starting at zero.
    pub sequence: u64,
    /// Unix time supplied by the caller.
    pub timestamp: u64,
    /// Event-specific data.
    pub data: EventData,
}

impl VaultEvent {
    pub fn event_type(&self) -> VaultEventType {
        match &self.data {
            EventData::Minted(_) => VaultEventType::Minted,
            EventData::Burned(_) => VaultEventType::Burned,
            EventData::FeesHarvested(_) => VaultEventType::FeesHarvested,
            EventData::Rebalanced(data) => match data.reason {
                RebalanceReason::Heartbeat => VaultEventType::Rebalanced,
                RebalanceReason::Executive => VaultEventType::ExecutiveRebalanced,
            },
            EventData::AdminParamsQueued(_) => VaultEventType::AdminParamsQueued,
            EventData::OwnershipTransferred(_) => VaultEventType::OwnershipTransferred,
            EventData::FeesWithdrawn(_) => VaultEventType::FeesWithdrawn,
            EventData::SharesTransferred(_) => VaultEventType::SharesTransferred,
            EventData::SharesApproved(_) => VaultEventType::SharesApproved,
        }
    }
}

/// Event-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventData {
    Minted(MintedData),
    Burned(BurnedData),
    FeesHarvested(FeesHarvestedData),
    Rebalanced(RebalanceData),
    AdminParamsQueued(AdminParamsQueuedData),
    OwnershipTransferred(OwnershipData),
    FeesWithdrawn(FeesWithdrawnData),
    SharesTransferred(ShareTransferData),
    SharesApproved(ShareApprovalData),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintedData {
    pub minter: Address,
    pub recipient: Address,
    pub shares: u128,
    pub amount0: u128,
    pub amount1: u128,
    pub liquidity_added: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnedData {
    pub owner: Address,
    pub recipient: Address,
    pub shares: u128,
    pub amount0: u128,
    pub amount1: u128,
    pub liquidity_burned: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeesHarvestedData {
    pub fees0: u128,
    pub fees1: u128,
    pub manager0: u128,
    pub manager1: u128,
    pub keeper0: u128,
    pub keeper1: u128,
}

/// Why the position was redeployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceReason {
    /// Periodic keeper rebalance on the current range.
    Heartbeat,
    /// Manager-directed move to a new range.
    Executive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceData {
    pub old_lower_tick: i32,
    pub old_upper_tick: i32,
    pub new_lower_tick: i32,
    pub new_upper_tick: i32,
    pub old_liquidity: u128,
    pub new_liquidity: u128,
    /// `(zero_for_one, amount_in, amount_out)` of the leftover swap.
    pub swap: Option<(bool, u128, u128)>,
    pub reason: RebalanceReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminParamsQueuedData {
    pub params: AdminParams,
    pub effective_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipData {
    pub previous: Option<Address>,
    /// `None` when ownership was renounced.
    pub new: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeesWithdrawnData {
    pub bucket: Bucket,
    pub token: Address,
    pub amount: u128,
    pub recipient: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareTransferData {
    pub from: Address,
    pub to: Address,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareApprovalData {
    pub owner: Address,
    pub spender: Address,
    pub amount: u128,
}

/// Counts over the whole log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub mints: usize,
    pub burns: usize,
    pub rebalances: usize,
    pub executive_rebalances: usize,
    pub harvests: usize,
    pub fees_harvested0: u128,
    pub fees_harvested1: u128,
}

/// Append-only event log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<VaultEvent>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event stamped with `timestamp`.
    pub fn record(&mut self, timestamp: u64, data: EventData) {
        let event = VaultEvent {
            sequence: self.events.len() as u64,
            timestamp,
            data,
        };
        debug!(
            sequence = event.sequence,
            event_type = ?event.event_type(),
            "Event recorded"
        );
        self.events.push(event);
    }

    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&VaultEvent> {
        self.events.last()
    }

    /// Drops events recorded after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    pub fn of_type(&self, event_type: VaultEventType) -> impl Iterator<Item = &VaultEvent> {
        self.events
            .iter()
            .filter(move |event| event.event_type() == event_type)
    }

    pub fn summary(&self) -> EventSummary {
        let mut summary = EventSummary::default();
        for event in &self.events {
            match &event.data {
                EventData::Minted(_) => summary.mints += 1,
                EventData::Burned(_) => summary.burns += 1,
                EventData::Rebalanced(data) => match data.reason {
                    RebalanceReason::Heartbeat => summary.rebalances += 1,
                    RebalanceReason::Executive => summary.executive_rebalances += 1,
                },
                EventData::FeesHarvested(data) => {
                    summary.harvests += 1;
                    summary.fees_harvested0 = summary.fees_harvested0.saturating_add(data.fees0);
                    summary.fees_harvested1 = summary.fees_harvested1.saturating_add(data.fees1);
                }
                _ => {}
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(amount: u128) -> EventData {
        EventData::SharesTransferred(ShareTransferData {
            from: Address::from_low_u64_be(1),
            to: Address::from_low_u64_be(2),
            amount,
        })
    }

    #[test]
    fn test_record_assigns_sequence() {
        let mut log = EventLog::new();
        log.record(10, transfer(1));
        log.record(11, transfer(2));

        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[1].sequence, 1);
        assert_eq!(log.events()[1].timestamp, 11);
        assert_eq!(
            log.last().map(VaultEvent::event_type),
            Some(VaultEventType::SharesTransferred)
        );

        log.truncate(1);
        log.record(12, transfer(3));
        assert_eq!(log.events()[1].sequence, 1);
    }

    #[test]
    fn test_summary() {
        let mut log = EventLog::new();
        log.record(
            1,
            EventData::FeesHarvested(FeesHarvestedData {
                fees0: 200,
                fees1: 5,
                manager0: 20,
                manager1: 0,
                keeper0: 10,
                keeper1: 0,
            }),
        );
        log.record(
            2,
            EventData::Rebalanced(RebalanceData {
                old_lower_tick: -60,
                old_upper_tick: 60,
                new_lower_tick: -120,
                new_upper_tick: 120,
                old_liquidity: 10,
                new_liquidity: 9,
                swap: None,
                reason: RebalanceReason::Executive,
            }),
        );

        let summary = log.summary();
        assert_eq!(summary.harvests, 1);
        assert_eq!(summary.fees_harvested0, 200);
        assert_eq!(summary.executive_rebalances, 1);
        assert_eq!(summary.rebalances, 0);
        assert_eq!(log.of_type(VaultEventType::ExecutiveRebalanced).count(), 1);
    }

    #[test]
    fn test_event_serializes_with_type_key() {
        let mut log = EventLog::new();
        log.record(7, transfer(3));
        let json = serde_json::to_value(&log.events()[0]).unwrap();
        assert_eq!(json["data"]["shares_transferred"]["amount"], 3);
        assert_eq!(json["timestamp"], 7);
    }
}

//! Manual stock adjustments and harvest intake

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{ItemId, Quantity};

/// Why a manual adjustment was made
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCategory {
    GeneralAdjustment,
    Production,
    Disposal,
    MarketingGift,
    PurchaseInflow,
    SelfConsumption,
    Harvest,
}

impl ReasonCategory {
    pub const ALL: [ReasonCategory; 7] = [
        ReasonCategory::GeneralAdjustment,
        ReasonCategory::Production,
        ReasonCategory::Disposal,
        ReasonCategory::MarketingGift,
        ReasonCategory::PurchaseInflow,
        ReasonCategory::SelfConsumption,
        ReasonCategory::Harvest,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReasonCategory::GeneralAdjustment => "General adjustment",
            ReasonCategory::Production => "Finished-good production",
            ReasonCategory::Disposal => "Disposal (loss)",
            ReasonCategory::MarketingGift => "Marketing gift",
            ReasonCategory::PurchaseInflow => "Purchase inflow",
            ReasonCategory::SelfConsumption => "Self-consumption",
            ReasonCategory::Harvest => "Harvest inflow",
        }
    }

    /// Category sent to the gateway; a general adjustment carries none
    pub fn wire_category(reason: Option<Self>) -> Option<Self> {
        reason.filter(|r| *r != ReasonCategory::GeneralAdjustment)
    }
}

impl std::fmt::Display for ReasonCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Compose the log memo from direction, reason and free-text note
pub fn compose_adjustment_memo(delta: Quantity, reason: Option<ReasonCategory>, note: &str) -> String {
    let direction = if delta > 0 {
        "Manual inflow"
    } else {
        "Manual adjustment"
    };
    let note = note.trim();
    match (note.is_empty(), reason) {
        (false, _) => format!("{} - {}", direction, note),
        (true, Some(reason)) => format!("{} - {}", direction, reason.label()),
        (true, None) => direction.to_string(),
    }
}

/// A pending manual delta for one item
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockAdjustment {
    pub item_id: ItemId,
    pub delta_quantity: Quantity,
    pub reason_category: Option<ReasonCategory>,
    pub memo: String,
}

impl StockAdjustment {
    /// A zero delta is no change at all
    pub fn is_committable(&self) -> bool {
        self.delta_quantity != 0
    }

    pub fn command(&self) -> AdjustmentCommand {
        AdjustmentCommand {
            item_id: self.item_id,
            delta_quantity: self.delta_quantity,
            memo: compose_adjustment_memo(self.delta_quantity, self.reason_category, &self.memo),
            reason_category: ReasonCategory::wire_category(self.reason_category),
        }
    }
}

/// Adjustment request for the stock mutation gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdjustmentCommand {
    pub item_id: ItemId,
    pub delta_quantity: Quantity,
    pub memo: String,
    pub reason_category: Option<ReasonCategory>,
}

/// Pending manual deltas, at most one per item
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdjustmentLedger {
    pending: HashMap<ItemId, StockAdjustment>,
}

impl AdjustmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite the pending delta for an item
    pub fn set_pending(
        &mut self,
        item_id: ItemId,
        delta_quantity: Quantity,
        reason_category: Option<ReasonCategory>,
        memo: impl Into<String>,
    ) {
        self.pending.insert(
            item_id,
            StockAdjustment {
                item_id,
                delta_quantity,
                reason_category,
                memo: memo.into(),
            },
        );
    }

    pub fn pending(&self, item_id: ItemId) -> Option<&StockAdjustment> {
        self.pending.get(&item_id)
    }

    pub fn delta(&self, item_id: ItemId) -> Quantity {
        self.pending(item_id).map_or(0, |adj| adj.delta_quantity)
    }

    /// Balance after the pending change is applied
    pub fn projected(&self, item_id: ItemId, current_stock: Quantity) -> Quantity {
        current_stock + self.delta(item_id)
    }

    pub fn can_commit(&self, item_id: ItemId) -> bool {
        self.pending(item_id).is_some_and(StockAdjustment::is_committable)
    }

    /// Gateway payload for an item, if it has a non-zero pending delta
    pub fn commit_payload(&self, item_id: ItemId) -> Option<AdjustmentCommand> {
        self.pending(item_id)
            .filter(|adj| adj.is_committable())
            .map(StockAdjustment::command)
    }

    /// Drop one item's pending change (after commit or item-level reset)
    pub fn clear(&mut self, item_id: ItemId) -> Option<StockAdjustment> {
        self.pending.remove(&item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Quality grade recorded on harvest intake
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum HarvestGrade {
    #[default]
    A,
    B,
    C,
}

impl std::fmt::Display for HarvestGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarvestGrade::A => write!(f, "A"),
            HarvestGrade::B => write!(f, "B"),
            HarvestGrade::C => write!(f, "C"),
        }
    }
}

/// One line of a harvest intake
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarvestLine {
    pub item_id: ItemId,
    pub quantity: Quantity,
    #[serde(default)]
    pub grade: HarvestGrade,
}

/// Adjustment commands for a harvest intake; lines without a positive quantity are skipped
pub fn harvest_commands(lines: &[HarvestLine], note: &str) -> Vec<AdjustmentCommand> {
    let note = note.trim();
    lines
        .iter()
        .filter(|line| line.quantity > 0)
        .map(|line| {
            let mut memo = format!("{} [grade {}]", ReasonCategory::Harvest.label(), line.grade);
            if !note.is_empty() {
                memo.push_str(" - ");
                memo.push_str(note);
            }
            AdjustmentCommand {
                item_id: line.item_id,
                delta_quantity: line.quantity,
                memo,
                reason_category: Some(ReasonCategory::Harvest),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projected_balance() {
        let mut ledger = AdjustmentLedger::new();
        ledger.set_pending(7, -3, Some(ReasonCategory::Disposal), "");
        assert_eq!(ledger.projected(7, 10), 7);
        assert_eq!(ledger.projected(8, 10), 10);
    }

    #[test]
    fn test_set_pending_overwrites() {
        let mut ledger = AdjustmentLedger::new();
        ledger.set_pending(7, 5, None, "");
        ledger.set_pending(7, 2, None, "");
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.delta(7), 2);
    }

    #[test]
    fn test_zero_delta_disables_commit() {
        let mut ledger = AdjustmentLedger::new();
        ledger.set_pending(7, 0, Some(ReasonCategory::Disposal), "broken");
        assert!(!ledger.can_commit(7));
        assert!(ledger.commit_payload(7).is_none());
        assert!(!ledger.can_commit(99));
    }

    #[test]
    fn test_clear_only_touches_one_item() {
        let mut ledger = AdjustmentLedger::new();
        ledger.set_pending(1, 1, None, "");
        ledger.set_pending(2, 2, None, "");
        ledger.clear(1);
        assert!(ledger.pending(1).is_none());
        assert_eq!(ledger.delta(2), 2);
    }

    #[test]
    fn test_memo_composition() {
        assert_eq!(
            compose_adjustment_memo(5, Some(ReasonCategory::PurchaseInflow), ""),
            "Manual inflow - Purchase inflow"
        );
        assert_eq!(
            compose_adjustment_memo(-2, Some(ReasonCategory::Disposal), "mould"),
            "Manual adjustment - mould"
        );
        assert_eq!(compose_adjustment_memo(-2, None, "  "), "Manual adjustment");
    }

    #[test]
    fn test_general_adjustment_sent_without_category() {
        let mut ledger = AdjustmentLedger::new();
        ledger.set_pending(3, 4, Some(ReasonCategory::GeneralAdjustment), "");
        let command = ledger.commit_payload(3).unwrap();
        assert_eq!(command.reason_category, None);
        assert_eq!(command.memo, "Manual inflow - General adjustment");
    }

    #[test]
    fn test_harvest_commands_skip_empty_lines() {
        let lines = vec![
            HarvestLine { item_id: 1, quantity: 12, grade: HarvestGrade::B },
            HarvestLine { item_id: 2, quantity: 0, grade: HarvestGrade::A },
        ];
        let commands = harvest_commands(&lines, "north field");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].memo, "Harvest inflow [grade B] - north field");
        assert_eq!(commands[0].reason_category, Some(ReasonCategory::Harvest));
    }
}

//! Adjustment ledger tests
//!
//! Covers pending deltas, projected balances, memo composition and
//! harvest intake commands.

use proptest::prelude::*;
use shared::{
    compose_adjustment_memo, harvest_commands, validate_adjustment_delta, validate_harvest_lines,
    AdjustmentLedger, HarvestGrade, HarvestLine, ReasonCategory,
};

#[cfg(test)]
mod ledger_tests {
    use super::*;

    #[test]
    fn test_pending_overwrites_previous_delta() {
        let mut ledger = AdjustmentLedger::new();
        ledger.set_pending(2, 5, None, "");
        ledger.set_pending(2, -3, Some(ReasonCategory::Disposal), "");

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.delta(2), -3);
        assert_eq!(ledger.projected(2, 10), 7);
    }

    #[test]
    fn test_unknown_item_projects_current_stock() {
        let ledger = AdjustmentLedger::new();
        assert_eq!(ledger.projected(42, 17), 17);
        assert!(!ledger.can_commit(42));
        assert!(ledger.commit_payload(42).is_none());
    }

    #[test]
    fn test_zero_delta_is_not_committable() {
        let mut ledger = AdjustmentLedger::new();
        ledger.set_pending(3, 0, Some(ReasonCategory::Production), "no change");
        assert!(!ledger.can_commit(3));
        assert!(ledger.commit_payload(3).is_none());
        assert!(validate_adjustment_delta(0).is_err());
    }

    #[test]
    fn test_clear_only_touches_one_item() {
        let mut ledger = AdjustmentLedger::new();
        ledger.set_pending(2, 5, None, "");
        ledger.set_pending(3, -1, None, "");

        let cleared = ledger.clear(2).unwrap();
        assert_eq!(cleared.delta_quantity, 5);
        assert!(ledger.pending(2).is_none());
        assert_eq!(ledger.delta(3), -1);
    }

    /// Scenario: -2 disposal with a note
    #[test]
    fn test_disposal_payload() {
        let mut ledger = AdjustmentLedger::new();
        ledger.set_pending(2, -2, Some(ReasonCategory::Disposal), "mould on crate 4");

        let command = ledger.commit_payload(2).unwrap();
        assert_eq!(command.item_id, 2);
        assert_eq!(command.delta_quantity, -2);
        assert_eq!(command.memo, "Manual adjustment - mould on crate 4");
        assert_eq!(command.reason_category, Some(ReasonCategory::Disposal));
        assert_eq!(ledger.projected(2, 100), 98);
    }

    #[test]
    fn test_general_adjustment_sends_no_category() {
        let mut ledger = AdjustmentLedger::new();
        ledger.set_pending(2, 4, Some(ReasonCategory::GeneralAdjustment), "");

        let command = ledger.commit_payload(2).unwrap();
        assert_eq!(command.reason_category, None);
        assert_eq!(command.memo, "Manual inflow - General adjustment");
    }
}

#[cfg(test)]
mod memo_tests {
    use super::*;

    #[test]
    fn test_direction_words() {
        assert_eq!(compose_adjustment_memo(3, None, ""), "Manual inflow");
        assert_eq!(compose_adjustment_memo(-3, None, "  "), "Manual adjustment");
    }

    #[test]
    fn test_note_wins_over_reason_label() {
        assert_eq!(
            compose_adjustment_memo(1, Some(ReasonCategory::MarketingGift), "farm fair"),
            "Manual inflow - farm fair"
        );
        assert_eq!(
            compose_adjustment_memo(-1, Some(ReasonCategory::SelfConsumption), ""),
            "Manual adjustment - Self-consumption"
        );
    }

    #[test]
    fn test_every_reason_has_a_label() {
        for reason in ReasonCategory::ALL {
            assert!(!reason.label().is_empty());
            assert_eq!(reason.to_string(), reason.label());
        }
    }
}

#[cfg(test)]
mod harvest_tests {
    use super::*;

    fn line(item_id: i32, quantity: i64, grade: HarvestGrade) -> HarvestLine {
        HarvestLine {
            item_id,
            quantity,
            grade,
        }
    }

    #[test]
    fn test_harvest_skips_empty_lines() {
        let lines = vec![
            line(2, 40, HarvestGrade::A),
            line(4, 0, HarvestGrade::B),
            line(4, 12, HarvestGrade::C),
        ];
        let commands = harvest_commands(&lines, "north field");

        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].memo, "Harvest inflow [grade A] - north field");
        assert_eq!(commands[1].memo, "Harvest inflow [grade C] - north field");
        assert!(commands
            .iter()
            .all(|c| c.reason_category == Some(ReasonCategory::Harvest) && c.delta_quantity > 0));
    }

    #[test]
    fn test_harvest_without_note() {
        let commands = harvest_commands(&[line(2, 5, HarvestGrade::B)], " ");
        assert_eq!(commands[0].memo, "Harvest inflow [grade B]");
    }

    #[test]
    fn test_harvest_needs_a_positive_line() {
        assert!(validate_harvest_lines(&[]).is_err());
        assert!(validate_harvest_lines(&[line(2, 0, HarvestGrade::A)]).is_err());
        assert!(validate_harvest_lines(&[line(2, 1, HarvestGrade::A)]).is_ok());
    }

    #[test]
    fn test_grade_defaults_to_a() {
        let line: HarvestLine = serde_json::from_str(r#"{"item_id": 2, "quantity": 3}"#).unwrap();
        assert_eq!(line.grade, HarvestGrade::A);
    }
}

proptest! {
    #[test]
    fn prop_projected_is_stock_plus_last_delta(
        stock in -1_000i64..1_000,
        deltas in proptest::collection::vec(-500i64..500, 1..8),
    ) {
        let mut ledger = AdjustmentLedger::new();
        for delta in &deltas {
            ledger.set_pending(7, *delta, None, "");
        }
        let last = *deltas.last().unwrap();
        prop_assert_eq!(ledger.projected(7, stock), stock + last);
        prop_assert_eq!(ledger.can_commit(7), last != 0);
    }
}

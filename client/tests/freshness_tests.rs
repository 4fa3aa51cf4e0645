//! Freshness evaluator tests

mod common;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use common::{farm_catalog, item};
use shared::{
    days_since_inflow, evaluate, FreshnessIndex, FreshnessRecord, FreshnessTier, ItemClass,
};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

#[cfg(test)]
mod tier_tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(FreshnessTier::for_days(0), FreshnessTier::Fresh);
        assert_eq!(FreshnessTier::for_days(3), FreshnessTier::Fresh);
        assert_eq!(FreshnessTier::for_days(4), FreshnessTier::RecommendSale);
        assert_eq!(FreshnessTier::for_days(7), FreshnessTier::RecommendSale);
        assert_eq!(FreshnessTier::for_days(8), FreshnessTier::Stale);
    }

    #[test]
    fn test_same_day_inflow_is_zero_days() {
        assert_eq!(days_since_inflow(at(10, 18), at(10, 7)), 0);
        assert_eq!(days_since_inflow(at(10, 7), at(10, 7)), 0);
    }

    #[test]
    fn test_partial_day_rounds_up_then_drops_inflow_day() {
        // 1 day 2 hours
        assert_eq!(days_since_inflow(at(11, 9), at(10, 7)), 1);
        // exactly 2 days
        assert_eq!(days_since_inflow(at(12, 7), at(10, 7)), 1);
    }

    #[test]
    fn test_inflow_in_the_future_uses_distance() {
        assert_eq!(days_since_inflow(at(10, 7), at(14, 9)), 4);
    }

    /// Scenario: 8 days and some hours since inflow
    #[test]
    fn test_eight_days_with_stock_is_stale() {
        let now = at(20, 14);
        let last = now - Duration::days(8) - Duration::hours(5);

        let info = evaluate(ItemClass::Finished, 5, Some(last), now).unwrap();
        assert_eq!(info.days, 8);
        assert_eq!(info.tier, FreshnessTier::Stale);
        assert_eq!(info.tier.label(), "Urgent");

        assert!(evaluate(ItemClass::Finished, 0, Some(last), now).is_none());
    }

    #[test]
    fn test_auxiliary_material_never_gets_a_tier() {
        let now = at(20, 14);
        assert!(evaluate(ItemClass::Auxiliary, 50, Some(at(1, 8)), now).is_none());
        assert!(evaluate(ItemClass::Raw, 50, None, now).is_none());
    }
}

#[cfg(test)]
mod index_tests {
    use super::*;

    #[test]
    fn test_index_covers_only_stocked_produce() {
        let mut items = farm_catalog();
        items.push(item(5, "Raspberry jam 250g", ItemClass::Finished, 8));
        let records = vec![
            FreshnessRecord { item_id: 1, last_inflow: Some(at(18, 9)) },
            FreshnessRecord { item_id: 2, last_inflow: Some(at(15, 6)) },
            FreshnessRecord { item_id: 3, last_inflow: Some(at(1, 6)) },
            FreshnessRecord { item_id: 4, last_inflow: None },
            FreshnessRecord { item_id: 5, last_inflow: Some(at(10, 6)) },
        ];
        let index = FreshnessIndex::build(&items, &records, at(20, 12));

        // jam has no stock, jar is auxiliary, blueberries have no inflow on record
        assert_eq!(index.len(), 2);
        assert!(index.get(1).is_none());
        assert!(index.get(3).is_none());
        assert!(index.get(4).is_none());
        assert_eq!(index.tier(2), Some(FreshnessTier::RecommendSale));
        assert_eq!(index.get(2).unwrap().days, 5);
        assert_eq!(index.tier(5), Some(FreshnessTier::Stale));
    }

    #[test]
    fn test_empty_records() {
        let index = FreshnessIndex::build(&farm_catalog(), &[], at(20, 12));
        assert!(index.is_empty());
    }
}

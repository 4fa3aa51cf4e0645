//! Inventory audit log and its grouped timeline view

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use super::ItemClass;
use crate::types::Quantity;

/// One immutable stock movement as recorded by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditLogEntry {
    /// Raw timestamp string, possibly without an offset
    pub timestamp: String,
    pub change_type: ChangeType,
    pub delta_quantity: Quantity,
    pub resulting_balance: Quantity,
    pub memo: Option<String>,
    pub product_name: String,
    /// Origin marker, e.g. `MANUAL`, `CONVERT_OUT`, `SALES_AUTO`
    pub reference_id: Option<String>,
}

impl AuditLogEntry {
    pub fn origin(&self) -> LogOrigin {
        LogOrigin::from_reference(self.reference_id.as_deref())
    }

    /// Sales postings and their cancellations written by the order pipeline
    pub fn is_automatic(&self) -> bool {
        matches!(
            self.change_type,
            ChangeType::Outbound | ChangeType::CancelReturn
        ) && !matches!(self.origin(), LogOrigin::Manual | LogOrigin::Conversion)
    }

    /// Case-insensitive match on product name, memo and change-type label
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.product_name.to_lowercase().contains(&needle)
            || self
                .memo
                .as_deref()
                .is_some_and(|memo| memo.to_lowercase().contains(&needle))
            || self.change_type.label().to_lowercase().contains(&needle)
    }
}

/// Kinds of stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Inbound,
    Outbound,
    Harvest,
    ProductionInbound,
    CancelReturn,
    Production,
    Adjustment,
    Disposal,
    MarketingGift,
    PurchaseInflow,
    SelfConsumption,
    #[serde(other)]
    Other,
}

impl ChangeType {
    pub fn label(&self) -> &'static str {
        match self {
            ChangeType::Inbound => "Inbound",
            ChangeType::Outbound => "Outbound",
            ChangeType::Harvest => "Harvest",
            ChangeType::ProductionInbound => "Production inbound",
            ChangeType::CancelReturn => "Cancellation return",
            ChangeType::Production => "Production",
            ChangeType::Adjustment => "Stock adjustment",
            ChangeType::Disposal => "Disposal",
            ChangeType::MarketingGift => "Marketing gift",
            ChangeType::PurchaseInflow => "Purchase inflow",
            ChangeType::SelfConsumption => "Self-consumption",
            ChangeType::Other => "Other",
        }
    }

    /// Parse a snake_case code; unknown codes are `Other`
    pub fn from_code(code: &str) -> Self {
        match code {
            "inbound" => ChangeType::Inbound,
            "outbound" => ChangeType::Outbound,
            "harvest" => ChangeType::Harvest,
            "production_inbound" => ChangeType::ProductionInbound,
            "cancel_return" => ChangeType::CancelReturn,
            "production" => ChangeType::Production,
            "adjustment" => ChangeType::Adjustment,
            "disposal" => ChangeType::Disposal,
            "marketing_gift" => ChangeType::MarketingGift,
            "purchase_inflow" => ChangeType::PurchaseInflow,
            "self_consumption" => ChangeType::SelfConsumption,
            _ => ChangeType::Other,
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Who wrote a log entry, derived from its reference id
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogOrigin {
    Manual,
    Conversion,
    SalesAutomatic,
    Other,
}

impl LogOrigin {
    pub fn from_reference(reference_id: Option<&str>) -> Self {
        match reference_id {
            Some("MANUAL") => LogOrigin::Manual,
            Some("CONVERT_IN") | Some("CONVERT_OUT") => LogOrigin::Conversion,
            Some(r) if r.starts_with("SALES_AUTO") => LogOrigin::SalesAutomatic,
            _ => LogOrigin::Other,
        }
    }
}

/// Filter passed to the audit log source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditQuery {
    pub limit: u32,
    pub item_class: Option<ItemClass>,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            item_class: None,
        }
    }
}

/// Local calendar date and wall-clock time of a log entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedTimestamp {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
}

/// Convert a raw log timestamp into the viewer's local date and time.
///
/// Strings with neither a `Z` suffix nor a `+` offset are read as UTC.
/// Anything that still fails to parse falls back to the text before the
/// first space as the date and the first five characters after it as the
/// time. This never fails.
pub fn normalize_timestamp<Tz>(raw: &str, tz: &Tz) -> NormalizedTimestamp
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let raw = raw.trim();
    let parsed = if raw.contains('Z') || raw.contains('+') {
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(&raw.replacen(' ', "T", 1)))
    } else {
        DateTime::parse_from_rfc3339(&format!("{}Z", raw.replacen(' ', "T", 1)))
    };

    match parsed {
        Ok(instant) => {
            let local = instant.with_timezone(tz);
            NormalizedTimestamp {
                date: local.format("%Y-%m-%d").to_string(),
                time: local.format("%H:%M").to_string(),
            }
        }
        Err(_) => {
            let (date, rest) = raw.split_once(' ').unwrap_or((raw, ""));
            NormalizedTimestamp {
                date: date.to_string(),
                time: rest.chars().take(5).collect(),
            }
        }
    }
}

/// Exclusion flag and free-text filter; both apply
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineFilter {
    pub exclude_automatic: bool,
    #[serde(default)]
    pub query: Option<String>,
}

impl TimelineFilter {
    pub fn accepts(&self, entry: &AuditLogEntry) -> bool {
        if self.exclude_automatic && entry.is_automatic() {
            return false;
        }
        self.query
            .as_deref()
            .map_or(true, |query| entry.matches_query(query))
    }
}

/// Display row of the timeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub entry: AuditLogEntry,
    pub local_date: String,
    pub local_time: String,
    pub origin: LogOrigin,
    pub is_inflow: bool,
    /// Signed quantity, `+N` or `-N`
    pub display_quantity: String,
}

impl TimelineEntry {
    fn new<Tz>(entry: &AuditLogEntry, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let NormalizedTimestamp { date, time } = normalize_timestamp(&entry.timestamp, tz);
        let is_inflow = entry.delta_quantity > 0;
        Self {
            local_date: date,
            local_time: time,
            origin: entry.origin(),
            is_inflow,
            display_quantity: if is_inflow {
                format!("+{}", entry.delta_quantity)
            } else {
                entry.delta_quantity.to_string()
            },
            entry: entry.clone(),
        }
    }
}

/// Entries sharing one local calendar date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateBucket {
    pub date: String,
    pub entries: Vec<TimelineEntry>,
}

/// Grouped timeline with totals over the filtered entries
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineView {
    /// Most recent date first
    pub buckets: Vec<DateBucket>,
    /// Sum of positive deltas
    pub inflow_total: Quantity,
    /// Sum of negative deltas (zero or below)
    pub outflow_total: Quantity,
}

impl TimelineView {
    pub fn entry_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.entries.len()).sum()
    }
}

/// Builds timeline views from raw log entries
pub struct AuditTimeline;

impl AuditTimeline {
    /// Filter, then bucket by local date; entry order inside a bucket follows the input
    pub fn build<Tz>(entries: &[AuditLogEntry], filter: &TimelineFilter, tz: &Tz) -> TimelineView
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut view = TimelineView::default();
        let mut by_date: BTreeMap<String, Vec<TimelineEntry>> = BTreeMap::new();

        for entry in entries.iter().filter(|entry| filter.accepts(entry)) {
            if entry.delta_quantity > 0 {
                view.inflow_total += entry.delta_quantity;
            } else {
                view.outflow_total += entry.delta_quantity;
            }
            let row = TimelineEntry::new(entry, tz);
            by_date.entry(row.local_date.clone()).or_default().push(row);
        }

        view.buckets = by_date
            .into_iter()
            .rev()
            .map(|(date, entries)| DateBucket { date, entries })
            .collect();
        view
    }
}

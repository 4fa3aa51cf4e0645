//! Stock screen session: conversion planning, manual adjustments and the
//! audit timeline over the last reload
//!
//! The session owns all in-memory state for one operator. Writes go through
//! the stock mutation gateway one at a time (every commit takes
//! `&mut self`); a successful write discards the local working state and
//! reloads everything from the backend, a failed write leaves it untouched
//! so the operator can retry.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use shared::{
    harvest_commands, validate_adjustment_delta, validate_harvest_lines, validate_memo,
    AdjustmentLedger, AuditLogEntry, AuditQuery, AuditTimeline, ConversionPlan, FreshnessIndex,
    FreshnessRecord, HarvestLine, Item, ItemClass, ItemId, PlanError, Quantity, ReasonCategory,
    Shortage, TimelineFilter, TimelineView,
};

use super::bom::BomResolver;
use super::gateway::StockBackend;
use crate::config::{AuditConfig, DisplayConfig};
use crate::error::{AppError, AppResult};

/// One operator's stock screen
pub struct StockSession<G: StockBackend> {
    gateway: Arc<G>,
    resolver: BomResolver,
    audit: AuditConfig,
    display: DisplayConfig,
    /// Item class whose log entries are fetched; all classes when `None`
    log_class: Option<ItemClass>,
    items: Vec<Item>,
    freshness_records: Vec<FreshnessRecord>,
    audit_log: Vec<AuditLogEntry>,
    plan: Option<ConversionPlan>,
    /// Anchor the operator picked; an auto-selected anchor is not carried to a new target
    chosen_anchor: Option<ItemId>,
    bom_source: Option<&'static str>,
    bom_load_failed: bool,
    ledger: AdjustmentLedger,
}

impl<G: StockBackend> StockSession<G> {
    pub fn new(gateway: Arc<G>, audit: AuditConfig, display: DisplayConfig) -> Self {
        Self {
            gateway,
            resolver: BomResolver::default(),
            audit,
            display,
            log_class: None,
            items: Vec::new(),
            freshness_records: Vec::new(),
            audit_log: Vec::new(),
            plan: None,
            chosen_anchor: None,
            bom_source: None,
            bom_load_failed: false,
            ledger: AdjustmentLedger::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: BomResolver) -> Self {
        self.resolver = resolver;
        self
    }

    // ------------------------------------------------------------------
    // Read model
    // ------------------------------------------------------------------

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, item_id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn audit_log(&self) -> &[AuditLogEntry] {
        &self.audit_log
    }

    pub fn plan(&self) -> Option<&ConversionPlan> {
        self.plan.as_ref()
    }

    /// Resolution step that produced the open plan's rows
    pub fn bom_source(&self) -> Option<&'static str> {
        self.bom_source
    }

    /// Whether the open plan started empty because the BOM could not be loaded
    pub fn bom_load_failed(&self) -> bool {
        self.bom_load_failed
    }

    pub fn ledger(&self) -> &AdjustmentLedger {
        &self.ledger
    }

    /// Restrict the audit log to one item class on the next reload
    pub fn set_log_class(&mut self, class: Option<ItemClass>) {
        self.log_class = class;
    }

    fn require_item(&self, item_id: ItemId) -> AppResult<&Item> {
        self.item(item_id)
            .ok_or_else(|| AppError::NotFound(format!("Item {}", item_id)))
    }

    // ------------------------------------------------------------------
    // Reload
    // ------------------------------------------------------------------

    /// Replace items, freshness records and the audit log with fresh copies
    pub async fn reload(&mut self) -> AppResult<()> {
        let query = AuditQuery {
            limit: self.audit.limit,
            item_class: self.log_class,
        };
        let gateway = self.gateway.as_ref();
        let (items, freshness, audit_log) = tokio::try_join!(
            gateway.list_items(),
            gateway.list_freshness(),
            gateway.list_audit_log(&query),
        )?;

        tracing::info!(
            items = items.len(),
            freshness = freshness.len(),
            log_entries = audit_log.len(),
            "Stock data reloaded"
        );
        self.items = items;
        self.freshness_records = freshness;
        self.audit_log = audit_log;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------

    /// Resolve the target's BOM and start a new plan
    pub async fn open_conversion(
        &mut self,
        target_item_id: ItemId,
        anchor_material_id: Option<ItemId>,
        produce_quantity: Option<Quantity>,
    ) -> AppResult<&ConversionPlan> {
        self.require_item(target_item_id)?;
        if let Some(anchor_id) = anchor_material_id {
            self.require_item(anchor_id)?;
        }

        let resolved = self
            .resolver
            .resolve(
                self.gateway.as_ref(),
                &self.items,
                target_item_id,
                anchor_material_id,
            )
            .await;

        self.bom_source = resolved.source;
        self.bom_load_failed = resolved.load_failed;
        self.chosen_anchor = anchor_material_id;
        let plan = ConversionPlan::new(
            target_item_id,
            anchor_material_id,
            &resolved.entries,
            produce_quantity,
        );
        Ok(&*self.plan.insert(plan))
    }

    /// Start over on another finished good; only an operator-chosen anchor is kept
    pub async fn change_target(&mut self, target_item_id: ItemId) -> AppResult<&ConversionPlan> {
        let anchor = self.chosen_anchor;
        self.open_conversion(target_item_id, anchor, None).await
    }

    /// Apply one planner operation to the open plan
    pub fn edit_plan<F>(&mut self, edit: F) -> AppResult<&ConversionPlan>
    where
        F: FnOnce(&ConversionPlan) -> Result<ConversionPlan, PlanError>,
    {
        let current = self
            .plan
            .as_ref()
            .ok_or_else(|| AppError::NothingToCommit("no conversion plan is open".into()))?;
        let next = edit(current)?;
        if next.anchor_material_id != current.anchor_material_id {
            self.chosen_anchor = next.anchor_material_id;
        }
        Ok(&*self.plan.insert(next))
    }

    /// Discard the open plan without writing anything
    pub fn close_conversion(&mut self) -> Option<ConversionPlan> {
        self.bom_source = None;
        self.bom_load_failed = false;
        self.chosen_anchor = None;
        self.plan.take()
    }

    /// Send the open plan to the backend.
    ///
    /// Every shortage is passed to `confirm`; a refusal aborts before any
    /// write and keeps the plan.
    pub async fn commit_conversion<F>(&mut self, memo: &str, mut confirm: F) -> AppResult<()>
    where
        F: FnMut(&Shortage) -> bool,
    {
        validate_memo(memo)?;
        let plan = self
            .plan
            .as_ref()
            .ok_or_else(|| AppError::NothingToCommit("no conversion plan is open".into()))?;

        for shortage in plan.shortages() {
            tracing::warn!(
                material_id = shortage.material_id,
                required = shortage.required,
                available = shortage.available,
                "Stock shortage on conversion"
            );
            if !confirm(&shortage) {
                tracing::warn!(material_id = shortage.material_id, "Conversion declined");
                return Err(AppError::ShortageDeclined {
                    material_id: shortage.material_id,
                });
            }
        }

        let command = plan.commit_payload(memo);
        if let Err(e) = self.gateway.convert(&command).await {
            tracing::error!(target_id = command.target_item_id, error = %e, "Conversion rejected");
            return Err(e);
        }

        tracing::info!(
            target_id = command.target_item_id,
            produced = command.produce_quantity,
            deductions = command.deductions.len(),
            "Conversion committed"
        );
        self.close_conversion();
        self.reload().await
    }

    // ------------------------------------------------------------------
    // Manual adjustments
    // ------------------------------------------------------------------

    /// Store or overwrite the pending delta for an item
    pub fn set_pending_adjustment(
        &mut self,
        item_id: ItemId,
        delta_quantity: Quantity,
        reason_category: Option<ReasonCategory>,
        memo: impl Into<String>,
    ) -> AppResult<()> {
        self.require_item(item_id)?;
        self.ledger
            .set_pending(item_id, delta_quantity, reason_category, memo);
        Ok(())
    }

    /// Current stock plus the pending delta
    pub fn projected(&self, item_id: ItemId) -> Option<Quantity> {
        self.item(item_id)
            .map(|item| self.ledger.projected(item_id, item.stock_quantity))
    }

    /// Drop an item's pending delta
    pub fn reset_adjustment(&mut self, item_id: ItemId) {
        self.ledger.clear(item_id);
    }

    /// Send one item's pending delta
    pub async fn commit_adjustment(&mut self, item_id: ItemId) -> AppResult<()> {
        let pending = self.ledger.pending(item_id).ok_or_else(|| {
            AppError::NothingToCommit(format!("no pending change for item {}", item_id))
        })?;
        validate_adjustment_delta(pending.delta_quantity)
            .map_err(|e| AppError::NothingToCommit(e.to_string()))?;
        let command = pending.command();

        if let Err(e) = self.gateway.adjust(&command).await {
            tracing::error!(item_id, error = %e, "Adjustment rejected");
            return Err(e);
        }

        tracing::info!(item_id, delta = command.delta_quantity, "Adjustment committed");
        self.ledger.clear(item_id);
        self.reload().await
    }

    /// Book a harvest intake, one adjustment per line with a positive quantity
    pub async fn commit_harvest(&mut self, lines: &[HarvestLine], note: &str) -> AppResult<usize> {
        validate_harvest_lines(lines)?;
        validate_memo(note)?;
        let commands = harvest_commands(lines, note);
        for command in &commands {
            self.require_item(command.item_id)?;
        }

        for (written, command) in commands.iter().enumerate() {
            if let Err(e) = self.gateway.adjust(command).await {
                tracing::error!(item_id = command.item_id, written, error = %e, "Harvest intake rejected");
                // earlier lines are already booked
                if written > 0 {
                    if let Err(reload_err) = self.reload().await {
                        tracing::warn!(error = %reload_err, "Reload after partial harvest failed");
                    }
                }
                return Err(e);
            }
        }

        tracing::info!(lines = commands.len(), "Harvest intake committed");
        self.reload().await?;
        Ok(commands.len())
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Filter preset from configuration
    pub fn default_filter(&self) -> TimelineFilter {
        TimelineFilter {
            exclude_automatic: self.audit.hide_automatic,
            query: None,
        }
    }

    /// Grouped audit timeline in the viewer's zone
    pub fn timeline(&self, filter: &TimelineFilter) -> TimelineView {
        match self.display.fixed_offset() {
            Some(offset) => AuditTimeline::build(&self.audit_log, filter, &offset),
            None => AuditTimeline::build(&self.audit_log, filter, &Local),
        }
    }

    /// Freshness lookup as of now
    pub fn freshness(&self) -> FreshnessIndex {
        self.freshness_at(Local::now().naive_local())
    }

    pub fn freshness_at(&self, now: NaiveDateTime) -> FreshnessIndex {
        FreshnessIndex::build(&self.items, &self.freshness_records, now)
    }
}

//! BOM resolution against the remote BOM source

use serde::Serialize;
use shared::{BomEntry, BomStrategy, Item, ItemId, ResolutionContext};

use super::gateway::BomSource;

/// Outcome of resolving a target's material list
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedBom {
    pub entries: Vec<BomEntry>,
    /// Name of the step that produced the rows, if any did
    pub source: Option<&'static str>,
    /// The BOM source could not be reached; the rows are empty
    pub load_failed: bool,
}

/// Resolves the material list for a conversion target
#[derive(Default)]
pub struct BomResolver {
    strategy: BomStrategy,
}

impl BomResolver {
    pub fn new(strategy: BomStrategy) -> Self {
        Self { strategy }
    }

    /// Fetch the structured BOM and run the resolution steps.
    ///
    /// A failed fetch is not an error: the plan starts with no rows.
    pub async fn resolve<S>(
        &self,
        source: &S,
        catalog: &[Item],
        target_id: ItemId,
        anchor_id: Option<ItemId>,
    ) -> ResolvedBom
    where
        S: BomSource + ?Sized,
    {
        let formal_bom = match source.get_bom(target_id).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(target_id, error = %e, "BOM load failed, starting with an empty plan");
                return ResolvedBom {
                    load_failed: true,
                    ..ResolvedBom::default()
                };
            }
        };

        let ctx = ResolutionContext {
            target_id,
            anchor_id,
            formal_bom: &formal_bom,
            catalog,
        };
        let (entries, source) = self.strategy.resolve(&ctx);
        tracing::debug!(target_id, rows = entries.len(), source = ?source, "BOM resolved");

        ResolvedBom {
            entries,
            source,
            load_failed: false,
        }
    }
}

//! stockctl - operator tools for the farm stock backend
//!
//! # Usage
//!
//! ```bash
//! # Audit timeline, sales postings hidden
//! stockctl timeline
//!
//! # Everything for raw materials mentioning "mould"
//! stockctl timeline --all --query mould --item-type harvest_item
//!
//! # Stock table for harvested produce, low stock flagged
//! stockctl stock --item-type harvest_item
//!
//! # Freshness tiers of stocked produce
//! stockctl freshness
//!
//! # Dry-run a conversion of item 12 measured on material 40
//! stockctl plan 12 --anchor 40 --anchor-actual 25
//! ```

use std::sync::Arc;

use clap::{Parser, Subcommand};
use farm_stock_client::config::LoggingConfig;
use farm_stock_client::{CommandApiClient, Config, StockSession};
use serde_json::json;
use shared::{ItemClass, ItemId, Quantity};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "farm_stock_client=info,stockctl=info";

/// `item_type` values the log endpoint filters on
const ITEM_TYPES: [&str; 3] = ["product", "harvest_item", "aux_material"];

#[derive(Parser)]
#[command(name = "stockctl")]
#[command(author, version, about = "Farm stock conversion and adjustment tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the audit timeline grouped by day
    Timeline {
        /// Include automatic sales postings and cancellations
        #[arg(long)]
        all: bool,

        /// Free-text filter on product, memo and change type
        #[arg(short, long)]
        query: Option<String>,

        /// Restrict to one item type
        #[arg(long, value_parser = ITEM_TYPES)]
        item_type: Option<String>,
    },
    /// Show stock levels with low-stock and freshness flags
    Stock {
        /// Restrict to one item type
        #[arg(long, value_parser = ITEM_TYPES)]
        item_type: Option<String>,
    },
    /// Show freshness tiers for stocked items
    Freshness,
    /// Build a conversion plan without committing it
    Plan {
        /// Finished good to produce
        target: ItemId,

        /// Material measured by the operator
        #[arg(short, long)]
        anchor: Option<ItemId>,

        /// Units to produce
        #[arg(short, long)]
        produce: Option<Quantity>,

        /// Measured consumption of the anchor material
        #[arg(long)]
        anchor_actual: Option<Quantity>,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        logging
            .filter
            .as_deref()
            .unwrap_or(DEFAULT_LOG_FILTER)
            .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    init_tracing(&config.logging);

    let cli = Cli::parse();
    tracing::debug!(environment = %config.environment, base_url = %config.api.base_url, "Starting stockctl");

    let client = Arc::new(CommandApiClient::new(&config.api)?);
    let mut session = StockSession::new(client, config.audit.clone(), config.display.clone());

    if let Err(e) = run(cli, &mut session).await {
        tracing::error!(code = e.code(), "Command failed: {e}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(
    cli: Cli,
    session: &mut StockSession<CommandApiClient>,
) -> farm_stock_client::AppResult<()> {
    match cli.command {
        Commands::Timeline {
            all,
            query,
            item_type,
        } => {
            session.set_log_class(
                item_type
                    .as_deref()
                    .map(|t| ItemClass::from_item_type(Some(t))),
            );
            session.reload().await?;
            let mut filter = session.default_filter();
            filter.exclude_automatic &= !all;
            filter.query = query;
            print_json(&session.timeline(&filter))?;
        }
        Commands::Stock { item_type } => {
            session.reload().await?;
            let class = item_type
                .as_deref()
                .map(|t| ItemClass::from_item_type(Some(t)));
            let index = session.freshness();
            let rows: Vec<_> = session
                .items()
                .iter()
                .filter(|item| class.map_or(true, |c| item.class == c))
                .map(|item| {
                    json!({
                        "item_id": item.id,
                        "name": item.name,
                        "class": item.class,
                        "stock_quantity": item.stock_quantity,
                        "safety_stock": item.safety_stock,
                        "low_stock": item.is_below_safety_stock(),
                        "freshness": index.tier(item.id),
                    })
                })
                .collect();
            print_json(&rows)?;
        }
        Commands::Freshness => {
            session.reload().await?;
            let index = session.freshness();
            let rows: Vec<_> = session
                .items()
                .iter()
                .filter_map(|item| {
                    index.get(item.id).map(|info| {
                        json!({
                            "item_id": item.id,
                            "name": item.name,
                            "stock_quantity": item.stock_quantity,
                            "days": info.days,
                            "tier": info.tier,
                            "label": info.tier.label(),
                        })
                    })
                })
                .collect();
            print_json(&rows)?;
        }
        Commands::Plan {
            target,
            anchor,
            produce,
            anchor_actual,
        } => {
            session.reload().await?;
            session.open_conversion(target, anchor, produce).await?;
            if let Some(qty) = anchor_actual {
                session.edit_plan(|plan| plan.with_anchor_actual(qty))?;
            }
            if let Some(plan) = session.plan() {
                let rows: Vec<_> = plan
                    .rows
                    .iter()
                    .map(|row| {
                        json!({
                            "material_id": row.material_id,
                            "name": row.name,
                            "anchor": plan.is_anchor(row),
                            "ratio": row.ratio,
                            "stock": row.stock,
                            "theoretical_qty": row.theoretical_qty,
                            "actual_qty": row.actual_qty,
                            "variance": row.variance().to_string(),
                        })
                    })
                    .collect();
                print_json(&json!({
                    "target_item_id": plan.target_item_id,
                    "produce_quantity": plan.produce_quantity,
                    "bom_source": session.bom_source(),
                    "bom_load_failed": session.bom_load_failed(),
                    "rows": rows,
                    "shortages": plan.shortages(),
                }))?;
            }
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> farm_stock_client::AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

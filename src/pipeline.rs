//! End-to-end runs: acquire edges, build parlays, select report categories.

use anyhow::Result;
use tracing::info;

use crate::config::AppConfig;
use crate::data::odds::OddsSource;
use crate::data::projections::ProjectionSource;
use crate::data::props::{EdgeRow, PropStore};
use crate::data::{fetch_edges, markets};
use crate::report::{ReportSelection, ReportSnapshot};
use crate::strategy::scorer::PromoTerms;
use crate::strategy::ParlayGenerator;

/// Fetch every market's Over props and merge them with projections.
pub async fn fetch(
    cfg: &AppConfig,
    odds: &dyn OddsSource,
    projections: &dyn ProjectionSource,
) -> Result<Vec<EdgeRow>> {
    let all: Vec<String> = markets::all_markets().into_iter().map(String::from).collect();
    let (rows, _) = fetch_edges(odds, projections, &all, cfg.projections.match_threshold).await?;
    Ok(rows)
}

/// Filter the store, generate parlays and select the report categories.
pub fn generate(cfg: &AppConfig, store: PropStore) -> Result<ReportSnapshot> {
    let store = store.filter(&cfg.filter);
    let generator = ParlayGenerator::new(cfg.generator.clone());
    let parlays = generator.generate(store.legs())?;

    let selection = ReportSelection::select(
        &parlays,
        store.legs(),
        &cfg.report,
        PromoTerms::from(&cfg.promo),
    );
    let snapshot = ReportSnapshot::new(cfg.generator.strategy.to_string(), store.len(), parlays, selection);
    info!(
        run_id = %snapshot.run_id,
        strategy = %snapshot.strategy,
        parlays = snapshot.parlays.len(),
        "Run complete"
    );
    Ok(snapshot)
}

/// Convenience for in-memory edge rows (fetch output fed straight in).
pub fn generate_from_rows(cfg: &AppConfig, rows: &[EdgeRow]) -> Result<ReportSnapshot> {
    let legs = rows.iter().map(EdgeRow::to_leg).collect();
    generate(cfg, PropStore::from_legs(legs))
}

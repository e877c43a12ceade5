//! Input data: odds feed, projections, name matching and the prop store.
//!
//! `fetch_edges` runs the whole acquisition pipeline: list games, pull
//! every game's Over props, fetch projections and merge the two into edge
//! rows ready for the prop store.

pub mod markets;
pub mod matching;
pub mod merge;
pub mod odds;
pub mod projections;
pub mod props;

use anyhow::Result;
use tracing::{info, warn};

use merge::{merge_props, MergeStats};
use odds::{OddsSource, OverProp};
use projections::ProjectionSource;
use props::EdgeRow;

/// Pull Over props for every listed game. A game whose props fail to load
/// is logged and skipped.
pub async fn fetch_all_props(source: &dyn OddsSource, markets: &[String]) -> Result<Vec<OverProp>> {
    let games = source.games().await?;
    info!(source = source.name(), games = games.len(), "Games listed");

    let mut all = Vec::new();
    for game in &games {
        match source.player_props(&game.game_id, markets).await {
            Ok(props) => {
                info!(
                    game_id = %game.game_id,
                    matchup = format!("{} @ {}", game.away_team, game.home_team),
                    props = props.len(),
                    "Props fetched"
                );
                all.extend(props);
            }
            Err(e) => warn!(game_id = %game.game_id, error = %e, "Failed to fetch props for game"),
        }
    }
    Ok(all)
}

/// Odds + projections → merged edge rows, best edge first.
pub async fn fetch_edges(
    odds: &dyn OddsSource,
    projections: &dyn ProjectionSource,
    markets: &[String],
    match_threshold: f64,
) -> Result<(Vec<EdgeRow>, MergeStats)> {
    let props = fetch_all_props(odds, markets).await?;
    if props.is_empty() {
        warn!("No player props available");
        return Ok((Vec::new(), MergeStats::default()));
    }
    let table = projections.fetch_table().await?;
    merge_props(&props, &table, match_threshold)
}

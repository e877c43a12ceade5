//! Join Over props with player projections into edge rows.

use anyhow::Result;
use tracing::{debug, info};

use super::markets;
use super::matching::NameMatcher;
use super::odds::OverProp;
use super::projections::ProjectionTable;
use super::props::EdgeRow;

/// Counters from one merge, for logging and the CLI summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub props: usize,
    pub unmatched_players: usize,
    pub no_projection: usize,
    pub merged: usize,
}

/// Attach a projection to each prop and compute
/// `edge = projection - line` and `implied_prob = 1 / odds`.
///
/// Props whose player has no match, whose market has no projection column,
/// or whose projection cell is not numeric are dropped. The result is
/// sorted by edge, highest first.
pub fn merge_props(
    props: &[OverProp],
    table: &ProjectionTable,
    threshold: f64,
) -> Result<(Vec<EdgeRow>, MergeStats)> {
    let matcher = NameMatcher::new(table.player_names()?, threshold);
    let name_map = matcher.match_all(props.iter().map(|p| p.player_name.as_str()));

    let mut stats = MergeStats {
        props: props.len(),
        unmatched_players: name_map.values().filter(|m| m.is_none()).count(),
        ..MergeStats::default()
    };

    let mut rows: Vec<EdgeRow> = Vec::new();
    for prop in props {
        let Some(Some(projected_name)) = name_map.get(&prop.player_name) else {
            continue;
        };
        let projection = markets::projection_column(&prop.market_key)
            .and_then(|col| table.value(projected_name, col).map(|v| (col, v)));
        let Some((column, projection)) = projection else {
            stats.no_projection += 1;
            continue;
        };
        if !(prop.price > 0.0) {
            debug!(player = %prop.player_name, price = prop.price, "Non-positive price, skipped");
            continue;
        }

        rows.push(EdgeRow {
            player_name: prop.player_name.clone(),
            market_key: prop.market_key.clone(),
            market_description: prop.market_description.clone(),
            bookmaker: prop.bookmaker.clone(),
            outcome: prop.outcome.clone(),
            odds_decimal: prop.price,
            prop_line: prop.point,
            projection_type: column.to_string(),
            projection,
            edge: projection - prop.point,
            implied_prob: 1.0 / prop.price,
        });
    }

    rows.sort_by(|a, b| b.edge.total_cmp(&a.edge));
    stats.merged = rows.len();

    info!(
        props = stats.props,
        unmatched_players = stats.unmatched_players,
        no_projection = stats.no_projection,
        merged = stats.merged,
        "Props merged with projections"
    );
    Ok((rows, stats))
}

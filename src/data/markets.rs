//! NBA player-prop market catalog.
//!
//! Market keys as used by the odds feed, their report descriptions and the
//! projection-table column each one is measured against.

pub const PLAYER_POINTS: &str = "player_points";
pub const PLAYER_REBOUNDS: &str = "player_rebounds";
pub const PLAYER_ASSISTS: &str = "player_assists";
pub const PLAYER_THREES: &str = "player_threes";
pub const PLAYER_STEALS: &str = "player_steals";
pub const PLAYER_BLOCKS: &str = "player_blocks";
pub const PLAYER_TURNOVERS: &str = "player_turnovers";
pub const PLAYER_POINTS_ALTERNATE: &str = "player_points_alternate";
pub const PLAYER_REBOUNDS_ALTERNATE: &str = "player_rebounds_alternate";
pub const PLAYER_ASSISTS_ALTERNATE: &str = "player_assists_alternate";
pub const PLAYER_BLOCKS_ALTERNATE: &str = "player_blocks_alternate";
pub const PLAYER_STEALS_ALTERNATE: &str = "player_steals_alternate";
pub const PLAYER_TURNOVERS_ALTERNATE: &str = "player_turnovers_alternate";
pub const PLAYER_THREES_ALTERNATE: &str = "player_threes_alternate";
pub const PLAYER_POINTS_ASSISTS_ALTERNATE: &str = "player_points_assists_alternate";
pub const PLAYER_POINTS_REBOUNDS_ALTERNATE: &str = "player_points_rebounds_alternate";
pub const PLAYER_REBOUNDS_ASSISTS_ALTERNATE: &str = "player_rebounds_assists_alternate";
pub const PLAYER_POINTS_REBOUNDS_ASSISTS_ALTERNATE: &str =
    "player_points_rebounds_assists_alternate";

struct MarketInfo {
    key: &'static str,
    description: &'static str,
    /// Projection column, if the projection table carries this statistic.
    projection: Option<&'static str>,
}

const CATALOG: &[MarketInfo] = &[
    MarketInfo { key: PLAYER_POINTS, description: "Player Points (Over/Under)", projection: Some("PTS") },
    MarketInfo { key: PLAYER_REBOUNDS, description: "Player Rebounds (Over/Under)", projection: Some("TRB") },
    MarketInfo { key: PLAYER_ASSISTS, description: "Player Assists (Over/Under)", projection: Some("AST") },
    MarketInfo { key: PLAYER_THREES, description: "Player Three-Pointers Made (Over/Under)", projection: Some("FG") },
    MarketInfo { key: PLAYER_STEALS, description: "Player Steals (Over/Under)", projection: Some("ST") },
    MarketInfo { key: PLAYER_BLOCKS, description: "Player Blocks (Over/Under)", projection: Some("BK") },
    MarketInfo { key: PLAYER_TURNOVERS, description: "Player Turnovers (Over/Under)", projection: Some("TO") },
    MarketInfo { key: PLAYER_POINTS_ALTERNATE, description: "Alternate Points (Over/Under)", projection: Some("PTS") },
    MarketInfo { key: PLAYER_REBOUNDS_ALTERNATE, description: "Alternate Rebounds (Over/Under)", projection: Some("TRB") },
    MarketInfo { key: PLAYER_ASSISTS_ALTERNATE, description: "Alternate Assists (Over/Under)", projection: Some("AST") },
    MarketInfo { key: PLAYER_BLOCKS_ALTERNATE, description: "Alternate Blocks (Over/Under)", projection: Some("BK") },
    MarketInfo { key: PLAYER_STEALS_ALTERNATE, description: "Alternate Steals (Over/Under)", projection: Some("ST") },
    MarketInfo { key: PLAYER_TURNOVERS_ALTERNATE, description: "Alternate Turnovers (Over/Under)", projection: Some("TO") },
    MarketInfo { key: PLAYER_THREES_ALTERNATE, description: "Alternate Three-Pointers (Over/Under)", projection: None },
    MarketInfo { key: PLAYER_POINTS_ASSISTS_ALTERNATE, description: "Alternate Points + Assists (Over/Under)", projection: None },
    MarketInfo { key: PLAYER_POINTS_REBOUNDS_ALTERNATE, description: "Alternate Points + Rebounds (Over/Under)", projection: None },
    MarketInfo { key: PLAYER_REBOUNDS_ASSISTS_ALTERNATE, description: "Alternate Rebounds + Assists (Over/Under)", projection: None },
    MarketInfo {
        key: PLAYER_POINTS_REBOUNDS_ASSISTS_ALTERNATE,
        description: "Alternate Points + Rebounds + Assists (Over/Under)",
        projection: None,
    },
];

/// Markets admitted into the parlay pool by default.
pub const DEFAULT_ALLOWED: &[&str] = &[
    PLAYER_POINTS,
    PLAYER_POINTS_ALTERNATE,
    PLAYER_REBOUNDS,
    PLAYER_REBOUNDS_ALTERNATE,
    PLAYER_ASSISTS,
    PLAYER_ASSISTS_ALTERNATE,
];

/// Every known market key, standard markets first.
pub fn all_markets() -> Vec<&'static str> {
    CATALOG.iter().map(|m| m.key).collect()
}

/// The seven single-stat, main-line markets.
pub fn standard_markets() -> Vec<&'static str> {
    CATALOG[..7].iter().map(|m| m.key).collect()
}

pub fn is_known(market_key: &str) -> bool {
    CATALOG.iter().any(|m| m.key == market_key)
}

/// Report description for a market key.
pub fn description(market_key: &str) -> String {
    CATALOG
        .iter()
        .find(|m| m.key == market_key)
        .map(|m| m.description.to_string())
        .unwrap_or_else(|| format!("Unknown Market: {market_key}"))
}

/// Projection column compared against this market's line.
pub fn projection_column(market_key: &str) -> Option<&'static str> {
    CATALOG
        .iter()
        .find(|m| m.key == market_key)
        .and_then(|m| m.projection)
}

//! PropLeg store.
//!
//! Loads the edges table (one row per Over prop with its projection edge),
//! validates every row up front and applies the pool filters: market
//! allow-list, positive edge, best-first ordering and a top-K cut.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

use super::markets;
use crate::config::FilterConfig;
use crate::types::{ParlayError, PropLeg};

// ---------------------------------------------------------------------------
// Edges table rows
// ---------------------------------------------------------------------------

/// One row of the edges table, as written by the merge step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRow {
    pub player_name: String,
    pub market_key: String,
    pub market_description: String,
    pub bookmaker: String,
    pub outcome: String,
    pub odds_decimal: f64,
    pub prop_line: f64,
    pub projection_type: String,
    pub projection: f64,
    pub edge: f64,
    pub implied_prob: f64,
}

impl EdgeRow {
    pub fn to_leg(&self) -> PropLeg {
        PropLeg::new(
            self.player_name.clone(),
            self.market_key.clone(),
            self.market_description.clone(),
            self.prop_line,
            self.odds_decimal,
            self.implied_prob,
            self.edge,
        )
    }
}

/// Loosely typed row used for validation. Every cell is optional so that a
/// missing column or empty cell is reported by name instead of as a generic
/// deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRow {
    player_name: Option<String>,
    market_key: Option<String>,
    market_description: Option<String>,
    prop_line: Option<String>,
    odds_decimal: Option<String>,
    implied_prob: Option<String>,
    edge: Option<String>,
}

fn required_text(value: Option<String>, row: usize, field: &'static str) -> Result<String, ParlayError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ParlayError::MissingField { row, field }),
    }
}

fn required_number(value: Option<String>, row: usize, field: &'static str) -> Result<f64, ParlayError> {
    let text = required_text(value, row, field)?;
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(ParlayError::InvalidValue { row, field, value: text }),
    }
}

impl RawRow {
    fn into_leg(self, row: usize) -> Result<PropLeg, ParlayError> {
        let player_name = required_text(self.player_name, row, "player_name")?;
        let market_key = required_text(self.market_key, row, "market_key")?;
        let prop_line = required_number(self.prop_line, row, "prop_line")?;
        let odds_decimal = required_number(self.odds_decimal, row, "odds_decimal")?;
        let implied_prob = required_number(self.implied_prob, row, "implied_prob")?;
        let edge = required_number(self.edge, row, "edge")?;

        let market_description = self
            .market_description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| markets::description(&market_key));

        Ok(PropLeg::new(
            player_name,
            market_key,
            market_description,
            prop_line,
            odds_decimal,
            implied_prob,
            edge,
        ))
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PropStore {
    legs: Vec<PropLeg>,
}

impl PropStore {
    pub fn from_legs(legs: Vec<PropLeg>) -> Self {
        Self { legs }
    }

    /// Read legs from CSV. Any row with a missing or non-numeric required
    /// field aborts the load.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut legs = Vec::new();
        for (idx, record) in rdr.deserialize::<RawRow>().enumerate() {
            let row = idx + 1;
            let raw = record.with_context(|| format!("Failed to read props row {row}"))?;
            legs.push(raw.into_leg(row)?);
        }
        debug!(rows = legs.len(), "Props table parsed");
        Ok(Self { legs })
    }

    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open props file {}", path.display()))?;
        let store = Self::from_reader(file)
            .with_context(|| format!("Failed to load props from {}", path.display()))?;
        info!(path = %path.display(), legs = store.len(), "Prop store loaded");
        Ok(store)
    }

    /// Apply the pool filters, in order: allow-list, `edge > 0`, stable
    /// sort by edge descending, truncate to `top_props`.
    pub fn filter(self, config: &FilterConfig) -> Self {
        let total = self.legs.len();
        let allowed: HashSet<&str> = config.allowed_markets.iter().map(String::as_str).collect();

        let mut legs: Vec<PropLeg> = self
            .legs
            .into_iter()
            .filter(|l| allowed.contains(l.market_key.as_str()))
            .filter(|l| l.edge > 0.0)
            .collect();
        let positive = legs.len();

        legs.sort_by(|a, b| b.edge.total_cmp(&a.edge));
        legs.truncate(config.top_props);

        info!(
            total,
            allowed_positive = positive,
            kept = legs.len(),
            "Prop store filtered"
        );
        Self { legs }
    }

    pub fn legs(&self) -> &[PropLeg] {
        &self.legs
    }

    pub fn into_legs(self) -> Vec<PropLeg> {
        self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Edges CSV output
// ---------------------------------------------------------------------------

pub fn write_edges<W: Write>(writer: W, rows: &[EdgeRow]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in rows {
        wtr.serialize(row).context("Failed to serialise edge row")?;
    }
    wtr.flush().context("Failed to flush edges CSV")?;
    Ok(())
}

pub fn save_edges(path: impl AsRef<Path>, rows: &[EdgeRow]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create edges file {}", path.display()))?;
    write_edges(file, rows)?;
    info!(path = %path.display(), rows = rows.len(), "Edges table written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

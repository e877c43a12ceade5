//! File outputs: parlay CSV, Markdown report and JSON snapshot.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use super::markdown::{self, format_number};
use super::ReportSnapshot;
use crate::types::Parlay;

const CSV_FILE: &str = "nba_best_parlays.csv";
const MARKDOWN_FILE: &str = "nba_best_parlays.md";
const JSON_FILE: &str = "nba_best_parlays.json";

#[derive(Debug, Serialize)]
struct ParlayRow {
    num_legs: usize,
    probability: f64,
    avg_edge: f64,
    payout: f64,
    legs: String,
}

impl From<&Parlay> for ParlayRow {
    fn from(p: &Parlay) -> Self {
        let legs = p
            .legs
            .iter()
            .map(|l| {
                format!(
                    "{} {} {} @ {}",
                    l.player_name,
                    l.market_description,
                    format_number(l.prop_line),
                    format_number(l.odds_decimal)
                )
            })
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            num_legs: p.num_legs,
            probability: p.probability,
            avg_edge: p.avg_edge,
            payout: p.payout,
            legs,
        }
    }
}

/// One row per parlay, in generation order.
pub fn write_parlays_csv<W: Write>(writer: W, parlays: &[Parlay]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
    for p in parlays {
        wtr.serialize(ParlayRow::from(p))
            .context("Failed to serialise parlay row")?;
    }
    wtr.flush().context("Failed to flush parlays CSV")?;
    Ok(())
}

/// Paths written by [`write_reports`].
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub csv: PathBuf,
    pub markdown: PathBuf,
    pub json: PathBuf,
}

/// Write CSV, Markdown and JSON outputs for a run into `dir`.
pub fn write_reports(dir: impl AsRef<Path>, snapshot: &ReportSnapshot) -> Result<ReportPaths> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let paths = ReportPaths {
        csv: dir.join(CSV_FILE),
        markdown: dir.join(MARKDOWN_FILE),
        json: dir.join(JSON_FILE),
    };

    let file = File::create(&paths.csv)
        .with_context(|| format!("Failed to create {}", paths.csv.display()))?;
    write_parlays_csv(file, &snapshot.parlays)?;

    fs::write(&paths.markdown, markdown::render(&snapshot.selection))
        .with_context(|| format!("Failed to write {}", paths.markdown.display()))?;

    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialise report snapshot")?;
    fs::write(&paths.json, json)
        .with_context(|| format!("Failed to write {}", paths.json.display()))?;

    info!(
        run_id = %snapshot.run_id,
        parlays = snapshot.parlays.len(),
        dir = %dir.display(),
        "Reports written"
    );
    Ok(paths)
}

//! Player projection table.
//!
//! The projections page publishes one HTML table with a player column and
//! one column per projected statistic (`PTS`, `TRB`, `AST`, ...). Only the
//! first table on the page is read: header cells come from its `<th>`
//! elements, and body rows are kept when they have one `<td>` per header.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::ProjectionsConfig;
use crate::types::ParlayError;

/// Header names (lowercased, trimmed) accepted as the player column.
const PLAYER_HEADERS: &[&str] = &["player", "name", "player name", "playername"];

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ProjectionTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Extract the first `<table>` of an HTML document.
    pub fn parse_html(html: &str) -> Result<Self, ParlayError> {
        let lower = html.to_ascii_lowercase();
        let table = elements(html, &lower, "table")
            .into_iter()
            .next()
            .ok_or_else(|| ParlayError::ProjectionSource("no table found on projections page".into()))?;
        let table_lower = table.to_ascii_lowercase();

        let headers: Vec<String> = elements(table, &table_lower, "th")
            .into_iter()
            .map(cell_text)
            .collect();

        let rows: Vec<Vec<String>> = elements(table, &table_lower, "tr")
            .into_iter()
            .map(|tr| {
                let tr_lower = tr.to_ascii_lowercase();
                elements(tr, &tr_lower, "td").into_iter().map(cell_text).collect::<Vec<_>>()
            })
            .filter(|cells| !cells.is_empty() && cells.len() == headers.len())
            .collect();

        debug!(columns = headers.len(), rows = rows.len(), "Projection table parsed");
        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of the player-name column.
    pub fn player_column(&self) -> Result<usize, ParlayError> {
        self.headers
            .iter()
            .position(|h| PLAYER_HEADERS.contains(&h.trim().to_lowercase().as_str()))
            .ok_or_else(|| {
                ParlayError::ProjectionSource(format!(
                    "no player column among {:?}",
                    self.headers
                ))
            })
    }

    /// Distinct non-empty player names, in table order.
    pub fn player_names(&self) -> Result<Vec<String>, ParlayError> {
        let col = self.player_column()?;
        let mut names: Vec<String> = Vec::new();
        for row in &self.rows {
            let name = row[col].trim();
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    /// Numeric projection for `player` in `column`. `None` when the player
    /// or column is absent or the cell is not a number.
    pub fn value(&self, player: &str, column: &str) -> Option<f64> {
        let player_col = self.player_column().ok()?;
        let col = self.column_index(column)?;
        self.rows
            .iter()
            .find(|row| row[player_col] == player)
            .and_then(|row| row[col].trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

// ---------------------------------------------------------------------------
// HTML extraction
// ---------------------------------------------------------------------------

/// Start of the next `<tag` opening (not `<tagfoo`) at or after `from`.
fn find_open(lower: &str, tag: &str, from: usize) -> Option<usize> {
    let needle = format!("<{tag}");
    let mut pos = from;
    while let Some(rel) = lower[pos..].find(&needle) {
        let start = pos + rel;
        let after = start + needle.len();
        match lower.as_bytes().get(after) {
            Some(b'>') | Some(b'/') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => return Some(start),
            None => return None,
            _ => pos = after,
        }
    }
    None
}

/// Inner HTML of every `<tag ...>...</tag>` element, outermost only.
fn elements<'a>(html: &'a str, lower: &str, tag: &str) -> Vec<&'a str> {
    let close = format!("</{tag}>");
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(start) = find_open(lower, tag, pos) {
        let Some(gt) = lower[start..].find('>') else { break };
        let inner_start = start + gt + 1;
        let Some(end) = lower[inner_start..].find(&close) else { break };
        out.push(&html[inner_start..inner_start + end]);
        pos = inner_start + end + close.len();
    }
    out
}

/// Visible text of a cell: tags removed, common entities decoded,
/// whitespace collapsed.
fn cell_text(inner: &str) -> String {
    let mut text = String::with_capacity(inner.len());
    let mut in_tag = false;
    for c in inner.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ProjectionSource: Send + Sync {
    async fn fetch_table(&self) -> Result<ProjectionTable>;
}

pub struct ProjectionsClient {
    http: Client,
    url: String,
}

impl ProjectionsClient {
    pub fn new(config: &ProjectionsConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("parlay-forge/0.1.0")
            .build()
            .context("Failed to build HTTP client for projections")?;
        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl ProjectionSource for ProjectionsClient {
    async fn fetch_table(&self) -> Result<ProjectionTable> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Projections request failed: {}", self.url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(ParlayError::ProjectionSource(format!("{status} from {}", self.url)).into());
        }

        let html = resp.text().await.context("Failed to read projections page")?;
        let table = ProjectionTable::parse_html(&html)?;
        table.player_column()?;
        info!(players = table.rows.len(), columns = ?table.headers, "Projections fetched");
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Mock odds and projection sources for integration testing.
//!
//! Deterministic in-memory implementations of `OddsSource` and
//! `ProjectionSource`. Games, props and the projection table are fully
//! controllable from test code, and individual games can be made to fail.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use parlay_forge::data::markets;
use parlay_forge::data::odds::{GameInfo, OddsSource, OverProp};
use parlay_forge::data::projections::{ProjectionSource, ProjectionTable};

/// An in-memory odds feed.
pub struct MockOddsSource {
    games: Vec<GameInfo>,
    props: HashMap<String, Vec<OverProp>>,
    /// Game ids whose prop request fails.
    failing: Arc<Mutex<Vec<String>>>,
    /// Every `(game_id, markets)` request seen, in order.
    requests: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl MockOddsSource {
    pub fn new() -> Self {
        Self {
            games: Vec::new(),
            props: HashMap::new(),
            failing: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_game(mut self, game_id: &str, home: &str, away: &str, props: Vec<OverProp>) -> Self {
        self.games.push(GameInfo {
            game_id: game_id.to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            start_time: "2026-10-20T23:30:00Z".to_string(),
        });
        self.props.insert(game_id.to_string(), props);
        self
    }

    /// Make every prop request for `game_id` return an error.
    pub fn fail_game(&self, game_id: &str) {
        self.failing.lock().unwrap().push(game_id.to_string());
    }

    pub fn requests(&self) -> Vec<(String, Vec<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl OddsSource for MockOddsSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn games(&self) -> Result<Vec<GameInfo>> {
        Ok(self.games.clone())
    }

    async fn player_props(&self, game_id: &str, markets: &[String]) -> Result<Vec<OverProp>> {
        self.requests
            .lock()
            .unwrap()
            .push((game_id.to_string(), markets.to_vec()));
        if self.failing.lock().unwrap().iter().any(|g| g == game_id) {
            return Err(anyhow!("mock: props unavailable for {game_id}"));
        }
        Ok(self
            .props
            .get(game_id)
            .map(|props| {
                props
                    .iter()
                    .filter(|p| markets.contains(&p.market_key))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Build one FanDuel Over prop.
pub fn over(player: &str, market: &str, point: f64, price: f64) -> OverProp {
    OverProp {
        player_name: player.to_string(),
        market_key: market.to_string(),
        market_description: markets::description(market),
        bookmaker: "FanDuel".to_string(),
        outcome: "Over".to_string(),
        price,
        point,
    }
}

/// A projection source serving a fixed table.
pub struct MockProjectionSource {
    table: ProjectionTable,
    fetches: Arc<Mutex<usize>>,
}

impl MockProjectionSource {
    pub fn new(headers: &[&str], rows: &[&[&str]]) -> Self {
        let table = ProjectionTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        );
        Self {
            table,
            fetches: Arc::new(Mutex::new(0)),
        }
    }

    pub fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl ProjectionSource for MockProjectionSource {
    async fn fetch_table(&self) -> Result<ProjectionTable> {
        *self.fetches.lock().unwrap() += 1;
        Ok(self.table.clone())
    }
}

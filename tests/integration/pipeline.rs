//! End-to-end pipeline runs: mock feed → edges → parlays → report files.

use std::collections::HashSet;

use parlay_forge::config::AppConfig;
use parlay_forge::data::markets;
use parlay_forge::data::props::{save_edges, PropStore};
use parlay_forge::pipeline;
use parlay_forge::report::export::write_reports;
use parlay_forge::types::{Parlay, Strategy};

use crate::mock_source::{over, MockOddsSource, MockProjectionSource};

fn feed() -> MockOddsSource {
    let feed = MockOddsSource::new()
        .with_game(
            "g1",
            "New York Knicks",
            "Boston Celtics",
            vec![
                over("Jalen Brunson", markets::PLAYER_POINTS, 26.5, 1.87),
                over("Josh Hart", markets::PLAYER_REBOUNDS, 8.5, 1.90),
                over("Mikal Bridges", markets::PLAYER_POINTS, 17.5, 1.95),
                over("Karl-Anthony Towns", markets::PLAYER_ASSISTS, 3.5, 2.10),
                over("Karl-Anthony Towns", markets::PLAYER_BLOCKS, 1.5, 2.40),
                over("Zion Williamson", markets::PLAYER_POINTS, 24.5, 1.80),
            ],
        )
        .with_game(
            "g2",
            "Denver Nuggets",
            "Utah Jazz",
            vec![over("Nikola Jokic", markets::PLAYER_ASSISTS, 9.5, 1.85)],
        );
    feed.fail_game("g2");
    feed
}

fn projections() -> MockProjectionSource {
    MockProjectionSource::new(
        &["Player", "PTS", "TRB", "AST", "BK"],
        &[
            &["Jalen Brunson", "29.1", "3.4", "7.2", "0.2"],
            &["Josh Hart", "10.8", "10.2", "4.9", "0.3"],
            &["Mikal Bridges", "16.0", "4.1", "3.0", "0.5"],
            &["Karl-Anthony Towns", "24.3", "12.1", "4.1", "1.9"],
        ],
    )
}

fn players(parlay: &Parlay) -> HashSet<&str> {
    parlay.legs.iter().map(|l| l.player_name.as_str()).collect()
}

fn temp_dir(tag: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("parlay_forge_{tag}_{}", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn test_fetch_merges_and_skips_failed_game() {
    let cfg = AppConfig::default();
    let odds = feed();
    let proj = projections();

    let rows = pipeline::fetch(&cfg, &odds, &proj).await.unwrap();

    // Zion has no projection row; the g2 request failed.
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.player_name != "Zion Williamson"));
    assert!(rows.iter().all(|r| r.player_name != "Nikola Jokic"));

    assert_eq!(rows[0].player_name, "Jalen Brunson");
    assert_eq!(rows[0].projection_type, "PTS");
    assert!((rows[0].edge - 2.6).abs() < 1e-9);
    assert!((rows[0].implied_prob - 1.0 / 1.87).abs() < 1e-12);
    assert!(rows.windows(2).all(|w| w[0].edge >= w[1].edge));

    let requests = odds.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].1.len(), markets::all_markets().len());
    assert_eq!(proj.fetches(), 1);
}

#[tokio::test]
async fn test_fetch_without_props_skips_projections() {
    let cfg = AppConfig::default();
    let odds = MockOddsSource::new();
    let proj = projections();

    let rows = pipeline::fetch(&cfg, &odds, &proj).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(proj.fetches(), 0);
}

#[tokio::test]
async fn test_greedy_run_writes_reports() {
    let cfg = AppConfig::default();
    let rows = pipeline::fetch(&cfg, &feed(), &projections()).await.unwrap();

    let snapshot = pipeline::generate_from_rows(&cfg, &rows).unwrap();

    // Blocks are outside the default allow-list, Bridges has negative edge.
    assert_eq!(snapshot.leg_pool, 3);
    assert_eq!(snapshot.strategy, "greedy");
    assert!(!snapshot.parlays.is_empty());

    let first = &snapshot.parlays[0];
    assert_eq!(first.num_legs, 2);
    assert_eq!(players(first), HashSet::from(["Jalen Brunson", "Josh Hart"]));

    for parlay in &snapshot.parlays {
        assert!(parlay.num_legs >= 2);
        assert_eq!(players(parlay).len(), parlay.num_legs);
        assert!(parlay.legs.iter().all(|l| l.edge > 0.0));
    }
    assert!(snapshot.selection.best_two_leg.is_some());

    let dir = temp_dir("run");
    let paths = write_reports(&dir, &snapshot).unwrap();
    assert!(paths.csv.exists());

    let markdown = std::fs::read_to_string(&paths.markdown).unwrap();
    assert!(markdown.starts_with("# Top NBA Player Prop Parlays"));
    assert!(markdown.contains("Jalen Brunson"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
    assert_eq!(json["run_id"], snapshot.run_id);
    assert_eq!(json["parlays"].as_array().unwrap().len(), snapshot.parlays.len());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_edges_file_feeds_generation() {
    let cfg = AppConfig::default();
    let rows = pipeline::fetch(&cfg, &feed(), &projections()).await.unwrap();

    let dir = temp_dir("edges");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("nba_player_prop_edges.csv");
    save_edges(&path, &rows).unwrap();

    let store = PropStore::load_csv(&path).unwrap();
    assert_eq!(store.len(), rows.len());

    let from_file = pipeline::generate(&cfg, store).unwrap();
    let in_memory = pipeline::generate_from_rows(&cfg, &rows).unwrap();
    assert_eq!(from_file.parlays, in_memory.parlays);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_exhaustive_run() {
    let mut cfg = AppConfig::default();
    cfg.generator.strategy = Strategy::Exhaustive;
    cfg.generator.workers = 2;

    let rows = pipeline::fetch(&cfg, &feed(), &projections()).await.unwrap();
    let snapshot = pipeline::generate_from_rows(&cfg, &rows).unwrap();

    assert_eq!(snapshot.strategy, "exhaustive");
    assert!(snapshot.parlays.iter().any(|p| p.num_legs == 2));
    for parlay in &snapshot.parlays {
        assert!(parlay.probability >= cfg.generator.min_probability || parlay.num_legs == 2);
        assert_eq!(players(parlay).len(), parlay.num_legs);
    }
}

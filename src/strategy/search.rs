//! Exhaustive parlay search.
//!
//! Enumerates every combination of `k` legs from a bounded candidate pool,
//! scores the valid ones on a rayon worker pool and keeps the best `top_n`
//! per leg count. Escalation to `k + 1` stops once win probability has
//! collapsed. Best-effort by construction: the pool is capped to the
//! highest-edge legs so enumeration stays tractable.

use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use super::scorer::balance_score;
use super::validator::is_valid;
use crate::types::{aggregate, Parlay, ParlayError, PropLeg};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub min_legs: usize,
    pub max_legs: usize,
    /// Combinations below this win probability are discarded unscored.
    pub min_probability: f64,
    /// Parlays kept per leg count.
    pub top_n: usize,
    /// Candidate pool cap (highest-edge legs).
    pub pool_size: usize,
    /// Worker threads; 0 lets rayon size the pool to available parallelism.
    pub workers: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_legs: 3,
            max_legs: 6,
            min_probability: 0.05,
            top_n: 10,
            pool_size: 250,
            workers: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Lazy combinations
// ---------------------------------------------------------------------------

/// Lexicographic `k`-combinations of `0..n`, produced one at a time.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            started: false,
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }

        let k = self.indices.len();
        // Rightmost position that can still move up.
        let Some(i) = (0..k).rev().find(|&i| self.indices[i] < self.n - k + i) else {
            self.done = true;
            return None;
        };
        self.indices[i] += 1;
        for j in (i + 1)..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(self.indices.clone())
    }
}

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// Result of a search run.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Top-N lists of every completed size, concatenated in size order.
    pub parlays: Vec<Parlay>,
    /// Leg counts that ran to completion.
    pub completed_sizes: Vec<usize>,
    /// Whether the run was aborted part-way through a size.
    pub cancelled: bool,
}

/// A surviving combination. Legs are only cloned for the kept top-N.
struct ScoredCombo {
    ordinal: usize,
    score: f64,
    indices: Vec<usize>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ExhaustiveSearch {
    config: SearchConfig,
    pool: ThreadPool,
}

impl ExhaustiveSearch {
    pub fn new(config: SearchConfig) -> Result<Self> {
        if config.min_legs < 2 || config.max_legs < config.min_legs {
            return Err(ParlayError::Config(format!(
                "search needs 2 <= min_legs <= max_legs, got {}..={}",
                config.min_legs, config.max_legs
            ))
            .into());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("parlay-search-{i}"))
            .build()
            .context("Failed to build rayon pool")?;
        Ok(Self { config, pool })
    }

    /// Access the search configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run the search to completion.
    pub fn run(&self, legs: &[PropLeg]) -> SearchOutcome {
        self.run_with_cancel(legs, &AtomicBool::new(false))
    }

    /// Run the search, checking `cancel` between combinations.
    ///
    /// When cancelled mid-size, that size is discarded whole; sizes that
    /// finished earlier are returned untouched.
    pub fn run_with_cancel(&self, legs: &[PropLeg], cancel: &AtomicBool) -> SearchOutcome {
        let candidates = self.candidates(legs);
        let mut outcome = SearchOutcome::default();

        info!(
            candidates = candidates.len(),
            min_legs = self.config.min_legs,
            max_legs = self.config.max_legs,
            workers = self.pool.current_num_threads(),
            "Starting exhaustive search"
        );

        for k in self.config.min_legs..=self.config.max_legs {
            let Some(top) = self.search_size(&candidates, k, cancel) else {
                warn!(legs = k, "Search cancelled, discarding partial size");
                outcome.cancelled = true;
                break;
            };

            let best_probability = top.first().map(|p| p.probability);
            info!(
                legs = k,
                kept = top.len(),
                best_probability = ?best_probability,
                "Size complete"
            );

            outcome.parlays.extend(top);
            outcome.completed_sizes.push(k);

            match best_probability {
                None => {
                    debug!(legs = k, "No surviving combinations, stopping");
                    break;
                }
                Some(p) if p < self.config.min_probability * 2.0 => {
                    debug!(legs = k, best_probability = p, "Probability collapsed, stopping");
                    break;
                }
                Some(_) => {}
            }
        }

        outcome
    }

    /// Usable legs, highest edge first, capped to the pool size.
    fn candidates<'a>(&self, legs: &'a [PropLeg]) -> Vec<&'a PropLeg> {
        let mut candidates: Vec<&PropLeg> = legs.iter().filter(|l| l.has_valid_odds()).collect();
        candidates.sort_by(|a, b| b.edge.total_cmp(&a.edge));
        candidates.truncate(self.config.pool_size);
        candidates
    }

    /// Score every valid `k`-combination and keep the top N by balance
    /// score. Returns `None` if cancelled before all were scored.
    ///
    /// Each worker folds into its own bounded top-N list, so memory stays
    /// at `workers * top_n` combinations regardless of pool size.
    fn search_size(&self, candidates: &[&PropLeg], k: usize, cancel: &AtomicBool) -> Option<Vec<Parlay>> {
        let min_probability = self.config.min_probability;
        let top_n = self.config.top_n;

        let top: Vec<ScoredCombo> = self.pool.install(|| {
            Combinations::new(candidates.len(), k)
                .enumerate()
                .take_while(|_| !cancel.load(Ordering::Relaxed))
                .par_bridge()
                .filter_map(|(ordinal, indices)| {
                    let combo: Vec<&PropLeg> = indices.iter().map(|&i| candidates[i]).collect();
                    if !is_valid(&combo) {
                        return None;
                    }
                    let (probability, avg_edge, _) = aggregate(combo.iter().copied());
                    if probability < min_probability {
                        return None;
                    }
                    Some(ScoredCombo {
                        ordinal,
                        score: balance_score(probability, avg_edge),
                        indices,
                    })
                })
                .fold(Vec::new, |mut top, combo| {
                    keep_best(&mut top, combo, top_n);
                    top
                })
                .reduce(Vec::new, |mut top, other| {
                    for combo in other {
                        keep_best(&mut top, combo, top_n);
                    }
                    top
                })
        });

        if cancel.load(Ordering::Relaxed) {
            return None;
        }

        Some(
            top.into_iter()
                .map(|c| Parlay::from_legs(c.indices.iter().map(|&i| candidates[i].clone()).collect()))
                .collect(),
        )
    }
}

/// Higher score first; completion order is arbitrary, so enumeration order
/// breaks ties.
fn rank(a: &ScoredCombo, b: &ScoredCombo) -> CmpOrdering {
    b.score.total_cmp(&a.score).then(a.ordinal.cmp(&b.ordinal))
}

/// Insert `combo` into the ranked list `top`, holding at most `cap` entries.
fn keep_best(top: &mut Vec<ScoredCombo>, combo: ScoredCombo, cap: usize) {
    if cap == 0 {
        return;
    }
    if top.len() == cap && top.last().is_some_and(|worst| rank(&combo, worst).is_ge()) {
        return;
    }
    let at = top.partition_point(|c| rank(c, &combo).is_lt());
    top.insert(at, combo);
    top.truncate(cap);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

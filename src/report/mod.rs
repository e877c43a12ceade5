//! Best-of-class selection over a generated parlay set, and the report
//! outputs built from it.

pub mod export;
pub mod markdown;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::{PromoSettings, ReportSettings};
use crate::strategy::ladder::ladder;
use crate::strategy::scorer::{promo_expected_value, PromoTerms};
use crate::strategy::validator::is_valid_owned;
use crate::types::{Parlay, PropLeg, ValidityRule};

/// Probability floors of the two filtered 2-leg picks.
const TWO_LEG_FLOOR_LOW: f64 = 0.10;
const TWO_LEG_FLOOR_HIGH: f64 = 0.20;

impl From<&PromoSettings> for PromoTerms {
    fn from(s: &PromoSettings) -> Self {
        Self {
            stake: s.stake,
            free_bet_conversion: s.free_bet_conversion,
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedParlay {
    pub parlay: Parlay,
    /// Next-higher-line variant; absent if legs collapsed.
    pub ladder: Option<Parlay>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromoPick {
    pub parlay: Parlay,
    pub expected_value: f64,
}

/// Every report category. Empty categories are `None` / empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSelection {
    /// Leg count of the "most probable" category.
    pub top_legs: usize,
    pub top_probable: Vec<RankedParlay>,
    /// Highest payout 2-leg parlay, no probability filter.
    pub best_two_leg: Option<Parlay>,
    /// Highest payout 2-leg parlay with probability > 10%.
    pub best_two_leg_over_10: Option<Parlay>,
    /// Highest payout 2-leg parlay with probability >= 20%.
    pub best_two_leg_over_20: Option<Parlay>,
    pub best_promo: Option<PromoPick>,
    pub promo_terms: PromoTerms,
}

/// Highest payout among `candidates`; the earliest wins ties.
fn max_payout<'a>(candidates: impl Iterator<Item = &'a Parlay>) -> Option<Parlay> {
    candidates
        .fold(None::<&Parlay>, |best, p| match best {
            Some(b) if p.payout <= b.payout => Some(b),
            _ => Some(p),
        })
        .cloned()
}

impl ReportSelection {
    /// Select every category from `parlays`. `pool` is the leg store used
    /// for ladder lookups.
    pub fn select(
        parlays: &[Parlay],
        pool: &[PropLeg],
        settings: &ReportSettings,
        terms: PromoTerms,
    ) -> Self {
        let mut ranked: Vec<&Parlay> = parlays.iter().collect();
        ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));

        let top_probable: Vec<RankedParlay> = ranked
            .iter()
            .filter(|p| p.num_legs == settings.top_legs)
            .take(settings.top_count)
            .map(|p| RankedParlay {
                parlay: (*p).clone(),
                ladder: ladder(p, pool),
            })
            .collect();

        let two_leg = || ranked.iter().copied().filter(|p| p.num_legs == 2);
        let best_two_leg = max_payout(two_leg());
        let best_two_leg_over_10 = max_payout(two_leg().filter(|p| p.probability > TWO_LEG_FLOOR_LOW));
        let best_two_leg_over_20 = max_payout(two_leg().filter(|p| p.probability >= TWO_LEG_FLOOR_HIGH));

        let mut best_promo: Option<PromoPick> = None;
        for p in ranked.iter().filter(|p| is_valid_owned(&p.legs, ValidityRule::Promotional)) {
            let ev = promo_expected_value(p, &terms);
            if best_promo.as_ref().map_or(true, |b| ev > b.expected_value) {
                best_promo = Some(PromoPick {
                    parlay: (*p).clone(),
                    expected_value: ev,
                });
            }
        }

        let selection = Self {
            top_legs: settings.top_legs,
            top_probable,
            best_two_leg,
            best_two_leg_over_10,
            best_two_leg_over_20,
            best_promo,
            promo_terms: terms,
        };
        info!(
            top_probable = selection.top_probable.len(),
            ladders = selection.top_probable.iter().filter(|r| r.ladder.is_some()).count(),
            two_leg = selection.best_two_leg.is_some(),
            two_leg_10 = selection.best_two_leg_over_10.is_some(),
            two_leg_20 = selection.best_two_leg_over_20.is_some(),
            promo = selection.best_promo.is_some(),
            "Report selection complete"
        );
        selection
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything one run produced, as served by the API and saved as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSnapshot {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub strategy: String,
    pub leg_pool: usize,
    pub parlays: Vec<Parlay>,
    pub selection: ReportSelection,
}

impl ReportSnapshot {
    pub fn new(strategy: impl Into<String>, leg_pool: usize, parlays: Vec<Parlay>, selection: ReportSelection) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            strategy: strategy.into(),
            leg_pool,
            parlays,
            selection,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

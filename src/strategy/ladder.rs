//! Ladder variants: the same parlay with each leg moved up to the next
//! published line for its player and market.

use crate::types::{Parlay, PropLeg};

/// The lowest line strictly above `leg.prop_line` for the same player and
/// market, or `leg` itself when the pool has none.
pub fn next_higher_leg<'a>(pool: &'a [PropLeg], leg: &'a PropLeg) -> &'a PropLeg {
    pool.iter()
        .filter(|c| c.has_valid_odds())
        .filter(|c| c.same_player_market(leg) && c.prop_line > leg.prop_line)
        .min_by(|a, b| a.prop_line.total_cmp(&b.prop_line))
        .unwrap_or(leg)
}

/// Ladder a parlay against `pool`.
///
/// Returns `None` when two legs land on the same substitute, since the
/// collapsed parlay would no longer have the original leg count.
pub fn ladder(parlay: &Parlay, pool: &[PropLeg]) -> Option<Parlay> {
    let mut laddered: Vec<PropLeg> = Vec::with_capacity(parlay.legs.len());
    for leg in &parlay.legs {
        let next = next_higher_leg(pool, leg);
        if !laddered.contains(next) {
            laddered.push(next.clone());
        }
    }

    if laddered.len() != parlay.num_legs {
        return None;
    }
    Some(Parlay::from_legs(laddered))
}

//! Human-readable Markdown report.

use super::{RankedParlay, ReportSelection};
use crate::types::{format_american, Parlay, PropLeg};

const NONE_FOUND: &str = "- No qualifying parlay found.";

/// Render a number the way the edges table spells it: integral values keep
/// one decimal (`20.0`), others print in shortest form (`26.5`, `1.87`).
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn american(odds: f64) -> String {
    format_american(odds).unwrap_or_else(|_| "n/a".to_string())
}

fn leg_line(leg: &PropLeg) -> String {
    format!(
        "    - {}: {} Over {} @ {}\n",
        leg.player_name,
        leg.market_description,
        format_number(leg.prop_line),
        american(leg.odds_decimal)
    )
}

fn parlay_body(out: &mut String, parlay: &Parlay, ev_line: Option<String>) {
    out.push_str(&format!("- **Probability:** {:.2}%\n", parlay.probability * 100.0));
    out.push_str(&format!("- **Avg Edge:** {:.2}\n", parlay.avg_edge));
    out.push_str(&format!(
        "- **Payout:** {:.2} (Decimal), {} (American)\n",
        parlay.payout,
        american(parlay.payout)
    ));
    if let Some(ev) = ev_line {
        out.push_str(&ev);
    }
    out.push_str("- **Legs:**\n");
    for leg in &parlay.legs {
        out.push_str(&leg_line(leg));
    }
    out.push('\n');
}

fn top_section(out: &mut String, legs: usize, ranked: &[RankedParlay]) {
    if ranked.is_empty() {
        return;
    }
    out.push_str(&format!(
        "## Top {} Most Probable {}-Leg Parlays\n\n",
        ranked.len(),
        legs
    ));
    for (i, r) in ranked.iter().enumerate() {
        let n = i + 1;
        out.push_str(&format!("### Parlay {n} ({legs} legs)\n"));
        parlay_body(out, &r.parlay, None);
        if let Some(ladder) = &r.ladder {
            out.push_str(&format!(
                "#### Parlay {n} Ladder (next higher line for each leg)\n"
            ));
            parlay_body(out, ladder, None);
        }
    }
}

fn optional_section(out: &mut String, heading: &str, parlay: Option<&Parlay>) {
    out.push_str(&format!("## {heading}\n\n"));
    match parlay {
        Some(p) => parlay_body(out, p, None),
        None => {
            out.push_str(NONE_FOUND);
            out.push_str("\n\n");
        }
    }
}

/// Render the full report.
pub fn render(selection: &ReportSelection) -> String {
    let mut out = String::from("# Top NBA Player Prop Parlays\n\n");

    top_section(&mut out, selection.top_legs, &selection.top_probable);

    optional_section(
        &mut out,
        "Best 2-Leg Parlay (No Probability Filter)",
        selection.best_two_leg.as_ref(),
    );
    optional_section(
        &mut out,
        "Highest Value 2-Leg Parlay (with >10% win probability)",
        selection.best_two_leg_over_10.as_ref(),
    );
    optional_section(
        &mut out,
        "Highest Value 2-Leg Parlay (with >20% win probability)",
        selection.best_two_leg_over_20.as_ref(),
    );

    if let Some(pick) = &selection.best_promo {
        let terms = selection.promo_terms;
        out.push_str("## Best Parlay for No Sweat Promo (FanDuel)\n\n");
        let ev_line = format!(
            "- **Expected Value (No Sweat, ${:.0} stake, {:.0}% free bet):** ${:.2}\n",
            terms.stake,
            terms.free_bet_conversion * 100.0,
            pick.expected_value
        );
        parlay_body(&mut out, &pick.parlay, Some(ev_line));
    }

    out
}

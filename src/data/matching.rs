//! Player-name matching between the odds feed and the projection table.
//!
//! The two sources spell names slightly differently (punctuation, hyphens,
//! generational suffixes). Names are normalised into word sets and scored
//! 0–100 with a blend of Jaccard overlap and containment; a match must
//! score strictly above the configured threshold.

use std::collections::{HashMap, HashSet};
use tracing::debug;

const SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "v"];

fn tokens(name: &str) -> HashSet<String> {
    name.to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '’' | '.'))
        .collect::<String>()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !SUFFIXES.contains(w))
        .map(String::from)
        .collect()
}

/// Similarity of two player names in [0, 100].
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let set_a = tokens(a);
    let set_b = tokens(b);
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count() as f64;
    let union = set_a.union(&set_b).count() as f64;
    let jaccard = intersection / union;
    let containment = intersection / set_a.len().min(set_b.len()) as f64;

    (100.0 * (0.6 * jaccard + 0.4 * containment)).min(100.0)
}

pub struct NameMatcher {
    candidates: Vec<String>,
    threshold: f64,
}

impl NameMatcher {
    pub fn new(candidates: Vec<String>, threshold: f64) -> Self {
        Self { candidates, threshold }
    }

    /// Best-scoring candidate and its score, if it clears the threshold.
    /// The first candidate wins ties.
    pub fn best_match(&self, name: &str) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for candidate in &self.candidates {
            let score = name_similarity(name, candidate);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((candidate.as_str(), score));
            }
        }
        best.filter(|&(_, score)| score > self.threshold)
    }

    /// Map every distinct name to its matched candidate, or `None`.
    pub fn match_all<'a, I>(&self, names: I) -> HashMap<String, Option<String>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = HashMap::new();
        for name in names {
            if out.contains_key(name) {
                continue;
            }
            let matched = self.best_match(name).map(|(m, _)| m.to_string());
            if matched.is_none() {
                debug!(player = name, "No projection match");
            }
            out.insert(name.to_string(), matched);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_names() {
        assert_eq!(name_similarity("Jalen Brunson", "Jalen Brunson"), 100.0);
        assert_eq!(name_similarity("jalen brunson", "Jalen Brunson"), 100.0);
    }

    #[test]
    fn test_punctuation_and_suffixes_ignored() {
        assert_eq!(name_similarity("De'Aaron Fox", "DeAaron Fox"), 100.0);
        assert_eq!(name_similarity("Jaren Jackson Jr.", "Jaren Jackson"), 100.0);
        assert_eq!(name_similarity("P.J. Washington", "PJ Washington"), 100.0);
        assert_eq!(name_similarity("Karl-Anthony Towns", "Karl Anthony Towns"), 100.0);
    }

    #[test]
    fn test_different_players_score_low() {
        assert!(name_similarity("Jalen Brunson", "Jalen Williams") < 80.0);
        assert_eq!(name_similarity("Jalen Brunson", "Mikal Bridges"), 0.0);
        assert_eq!(name_similarity("", "Mikal Bridges"), 0.0);
    }

    #[test]
    fn test_matcher_threshold() {
        let matcher = NameMatcher::new(
            vec!["Jalen Williams".into(), "Jalen Brunson".into(), "Jaren Jackson".into()],
            80.0,
        );
        assert_eq!(matcher.best_match("Jalen Brunson").map(|(m, _)| m), Some("Jalen Brunson"));
        assert_eq!(matcher.best_match("Jaren Jackson Jr.").map(|(m, _)| m), Some("Jaren Jackson"));
        assert!(matcher.best_match("Josh Hart").is_none());
    }

    #[test]
    fn test_match_all() {
        let matcher = NameMatcher::new(vec!["Jalen Brunson".into()], 80.0);
        let map = matcher.match_all(["Jalen Brunson", "Josh Hart", "Jalen Brunson"]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["Jalen Brunson"].as_deref(), Some("Jalen Brunson"));
        assert_eq!(map["Josh Hart"], None);
    }
}

// Q9 Lookup Homophone Ranking
// Orders characters sharing a primary phonetic key by secondary-key agreement

use crate::types::PhoneticEntry;
use rustc_hash::FxHashSet;

/// Self-join of `word_meta` on the primary key `ping`.
///
/// Returns every character sharing a `ping` with `?1` together with its own
/// `ping2` and the reference row's `ping2`, in join order. Ranking happens in
/// Rust so that ties keep join order regardless of how SQLite sorts.
pub const HOMOPHONE_SQL: &str = "SELECT w1.char, w1.ping2, w2.ping2 \
     FROM word_meta w1 \
     INNER JOIN word_meta w2 ON w1.ping = w2.ping \
     WHERE w2.char = ?1";

/// A tier rule maps a candidate to its tier given the reference entry.
/// Lower tiers come first.
pub type TierRule = fn(candidate: &PhoneticEntry, reference: &PhoneticEntry) -> usize;

/// Tier 0 when both secondary keys are present and equal, tier 1 otherwise
///
/// A NULL `ping2` never matches, mirroring SQL comparison semantics.
pub fn secondary_key_tier(candidate: &PhoneticEntry, reference: &PhoneticEntry) -> usize {
    match (&candidate.ping2, &reference.ping2) {
        (Some(a), Some(b)) if a == b => 0,
        _ => 1,
    }
}

/// Ranks homophone candidates tier-major, insertion-minor
///
/// The default ranker has a single rule (secondary key), giving the two-tier
/// ordering. Extra rules refine the ordering: a candidate's tier is the
/// vector of rule outputs, compared lexicographically.
#[derive(Clone)]
pub struct HomophoneRanker {
    rules: Vec<TierRule>,
}

impl std::fmt::Debug for HomophoneRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomophoneRanker")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Default for HomophoneRanker {
    fn default() -> Self {
        Self {
            rules: vec![secondary_key_tier],
        }
    }
}

impl HomophoneRanker {
    /// Ranker with a custom rule set (applied in order)
    pub fn with_rules(rules: Vec<TierRule>) -> Self {
        Self { rules }
    }

    /// Order joined rows and collapse duplicates
    ///
    /// # Arguments
    /// * `rows` - `(candidate, reference)` pairs in join order
    ///
    /// # Returns
    /// Distinct characters, lower tiers first; within a tier, first
    /// appearance in `rows` decides the position. A character reached by
    /// several rows keeps only its best tier.
    pub fn rank(&self, rows: Vec<(PhoneticEntry, PhoneticEntry)>) -> Vec<String> {
        let mut keyed: Vec<(Vec<usize>, String)> = rows
            .into_iter()
            .map(|(candidate, reference)| {
                let tier = self
                    .rules
                    .iter()
                    .map(|rule| rule(&candidate, &reference))
                    .collect();
                (tier, candidate.character)
            })
            .collect();

        // sort_by is stable, so join order survives inside a tier
        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut seen = FxHashSet::default();
        keyed
            .into_iter()
            .filter_map(|(_, character)| {
                if seen.insert(character.clone()) {
                    Some(character)
                } else {
                    None
                }
            })
            .collect()
    }
}

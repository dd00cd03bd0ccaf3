//! Odds - Converts horse stats into payout multipliers
//!
//! Each horse is scored under the race type's stat profile, adjusted for
//! health, normalised against the best horse in the field and then jittered.

use std::collections::BTreeMap;

use rand::Rng;

use crate::race_engine::config::{
    BASE_ODDS, MIN_ODDS, ODDS_RANDOM_FACTOR, ODDS_SPREAD, PERFECT_HEALTH_ODDS_FACTOR,
    POOR_HEALTH_ODDS_FACTOR,
};
use crate::race_engine::horse::{HealthBand, Horse, HorseId};
use crate::race_engine::race::RaceType;

/// Payout multiplier per horse
pub type OddsBook = BTreeMap<HorseId, f64>;

/// Stat score under the race profile, adjusted for health
pub fn handicap_score(horse: &Horse, race_type: RaceType) -> f64 {
    let score = horse.stats.weighted_score(race_type.stat_weights());
    match horse.health_band() {
        HealthBand::Poor => score * POOR_HEALTH_ODDS_FACTOR,
        HealthBand::Perfect => score * PERFECT_HEALTH_ODDS_FACTOR,
        HealthBand::Normal => score,
    }
}

/// Multiplier for a horse at `norm` of the favourite's score, after jitter.
///
/// Floored at [`MIN_ODDS`] and rounded to one decimal place.
pub fn multiplier(norm: f64, jitter: f64) -> f64 {
    let base = BASE_ODDS + (1.0 - norm) * ODDS_SPREAD;
    let rounded = (base * jitter * 10.0).round() / 10.0;
    rounded.max(MIN_ODDS)
}

/// Compute the odds book for a field.
///
/// One jitter draw per horse, in field order, so a fixed random source
/// always prices the same field identically.
pub fn calculate_odds(horses: &[Horse], race_type: RaceType, rng: &mut impl Rng) -> OddsBook {
    let scores: Vec<f64> = horses
        .iter()
        .map(|horse| handicap_score(horse, race_type))
        .collect();
    let max_score = scores.iter().copied().fold(0.0_f64, f64::max);

    horses
        .iter()
        .zip(scores)
        .map(|(horse, score)| {
            let norm = if max_score > 0.0 { score / max_score } else { 1.0 };
            let jitter = rng.gen_range(ODDS_RANDOM_FACTOR.0..ODDS_RANDOM_FACTOR.1);
            (horse.id, multiplier(norm, jitter))
        })
        .collect()
}

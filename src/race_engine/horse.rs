//! Horse - Individual horse identity, stats and generation
//!
//! A horse is drawn fresh for every race and never changes afterwards.
//! Stats feed both the odds book and the per-tick simulation.

use std::collections::HashSet;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::race_engine::config::{
    StatWeights, FALLBACK_NAME_RANGE, HORSE_COLORS, HORSE_NAMES, HORSE_NUMBER_ATTEMPTS,
    HORSE_NUMBER_MAX, HORSE_NUMBER_MIN, JOCKEY_NAMES, PERFECT_HEALTH, POOR_HEALTH_THRESHOLD,
    STAT_MAX, STAT_MIN,
};

/// Unique horse identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HorseId(pub u64);

impl fmt::Display for HorseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h-{:x}", self.0)
    }
}

/// Racing stats, each in 1..=10
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorseStats {
    pub top_speed: u8,
    pub stamina: u8,
    pub sprint: u8,
    pub pace: u8,
    pub gate: u8,
}

impl HorseStats {
    /// Weighted sum of all stats under a race type's profile
    pub fn weighted_score(&self, weights: &StatWeights) -> f64 {
        f64::from(self.top_speed) * weights.top_speed
            + f64::from(self.stamina) * weights.stamina
            + f64::from(self.sprint) * weights.sprint
            + f64::from(self.pace) * weights.pace
            + f64::from(self.gate) * weights.gate
    }
}

/// Coarse health band used by the odds and speed modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthBand {
    Poor,
    Normal,
    Perfect,
}

/// A horse entered in a single race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horse {
    pub id: HorseId,
    /// Display name, unique within the race
    pub name: String,
    /// Bib number, unique within the race on a best-effort basis
    pub number: u32,
    /// Colour tag (hex string)
    pub color: String,
    pub jockey: String,
    pub stats: HorseStats,
    /// Health in 1..=10
    pub health: u8,
}

impl Horse {
    pub fn health_band(&self) -> HealthBand {
        if self.health <= POOR_HEALTH_THRESHOLD {
            HealthBand::Poor
        } else if self.health == PERFECT_HEALTH {
            HealthBand::Perfect
        } else {
            HealthBand::Normal
        }
    }
}

/// Generate a horse whose name and number avoid the ones already used in the race.
///
/// The name falls back to a `Horse #NNN` placeholder once the pool is exhausted.
/// The number is retried a bounded number of times and a collision is accepted
/// if every retry hits a used number. Callers record the returned name and
/// number themselves.
pub fn generate_horse(
    rng: &mut impl Rng,
    used_names: &HashSet<String>,
    used_numbers: &HashSet<u32>,
) -> Horse {
    let available: Vec<&str> = HORSE_NAMES
        .iter()
        .copied()
        .filter(|name| !used_names.contains(*name))
        .collect();
    let name = match available.choose(rng) {
        Some(name) => (*name).to_string(),
        None => format!(
            "Horse #{}",
            rng.gen_range(FALLBACK_NAME_RANGE.0..=FALLBACK_NAME_RANGE.1)
        ),
    };

    let mut number = rng.gen_range(HORSE_NUMBER_MIN..=HORSE_NUMBER_MAX);
    let mut attempts = 1;
    while used_numbers.contains(&number) && attempts < HORSE_NUMBER_ATTEMPTS {
        number = rng.gen_range(HORSE_NUMBER_MIN..=HORSE_NUMBER_MAX);
        attempts += 1;
    }

    let color = HORSE_COLORS.choose(rng).copied().unwrap_or(HORSE_COLORS[0]);
    let jockey = JOCKEY_NAMES.choose(rng).copied().unwrap_or(JOCKEY_NAMES[0]);

    Horse {
        id: HorseId(rng.gen()),
        name,
        number,
        color: color.to_string(),
        jockey: jockey.to_string(),
        stats: HorseStats {
            top_speed: rng.gen_range(STAT_MIN..=STAT_MAX),
            stamina: rng.gen_range(STAT_MIN..=STAT_MAX),
            sprint: rng.gen_range(STAT_MIN..=STAT_MAX),
            pace: rng.gen_range(STAT_MIN..=STAT_MAX),
            gate: rng.gen_range(STAT_MIN..=STAT_MAX),
        },
        health: rng.gen_range(STAT_MIN..=STAT_MAX),
    }
}

//! Race - Race type, field generation and the priced race card
//!
//! A race is generated once, priced once, and stays frozen until it is scored.

use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::race_engine::config::{
    StatWeights, HORSES_PER_RACE, LONG_DISTANCE, LONG_WEIGHTS, MEDIUM_DISTANCE, MEDIUM_WEIGHTS,
    SHORT_DISTANCE, SHORT_WEIGHTS,
};
use crate::race_engine::horse::{generate_horse, Horse, HorseId};
use crate::race_engine::odds::{calculate_odds, OddsBook};

/// Race class, each with its own distance range and stat profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RaceType {
    Short,
    Medium,
    Long,
}

impl RaceType {
    pub const ALL: [RaceType; 3] = [RaceType::Short, RaceType::Medium, RaceType::Long];

    /// Inclusive distance range in furlongs
    pub fn distance_range(self) -> (u32, u32) {
        match self {
            RaceType::Short => SHORT_DISTANCE,
            RaceType::Medium => MEDIUM_DISTANCE,
            RaceType::Long => LONG_DISTANCE,
        }
    }

    pub fn stat_weights(self) -> &'static StatWeights {
        match self {
            RaceType::Short => &SHORT_WEIGHTS,
            RaceType::Medium => &MEDIUM_WEIGHTS,
            RaceType::Long => &LONG_WEIGHTS,
        }
    }
}

impl fmt::Display for RaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RaceType::Short => "Short",
            RaceType::Medium => "Medium",
            RaceType::Long => "Long",
        };
        f.write_str(label)
    }
}

/// Freshly generated field, not yet priced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceCard {
    pub race_type: RaceType,
    /// Distance in furlongs
    pub distance: u32,
    pub horses: Vec<Horse>,
}

impl RaceCard {
    /// Compute the odds book once and freeze the race
    pub fn price(self, rng: &mut impl Rng) -> Race {
        let odds = calculate_odds(&self.horses, self.race_type, rng);
        log::debug!(
            "Priced {} race over {}f: {:?}",
            self.race_type,
            self.distance,
            odds
        );
        Race {
            race_type: self.race_type,
            distance: self.distance,
            horses: self.horses,
            odds,
        }
    }
}

/// A priced race ready for betting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub race_type: RaceType,
    /// Distance in furlongs
    pub distance: u32,
    pub horses: Vec<Horse>,
    /// Payout multiplier per horse
    pub odds: OddsBook,
}

impl Race {
    /// Get horse by ID
    pub fn get_horse(&self, id: HorseId) -> Option<&Horse> {
        self.horses.iter().find(|h| h.id == id)
    }

    pub fn odds_for(&self, id: HorseId) -> Option<f64> {
        self.odds.get(&id).copied()
    }

    /// Horses ordered from shortest to longest odds (stable on ties)
    pub fn by_odds(&self) -> Vec<&Horse> {
        sort_by_odds(&self.horses, &self.odds)
    }
}

pub(crate) fn sort_by_odds<'a>(horses: &'a [Horse], odds: &OddsBook) -> Vec<&'a Horse> {
    let mut sorted: Vec<&Horse> = horses.iter().collect();
    sorted.sort_by(|a, b| {
        let oa = odds.get(&a.id).copied().unwrap_or(f64::MAX);
        let ob = odds.get(&b.id).copied().unwrap_or(f64::MAX);
        oa.total_cmp(&ob)
    });
    sorted
}

/// Generate a race with a random type, distance and field.
///
/// Names and bib numbers are kept apart across the field; horse ids are
/// re-rolled on the off chance two draws collide.
pub fn generate_race(rng: &mut impl Rng) -> RaceCard {
    let race_type = RaceType::ALL[rng.gen_range(0..RaceType::ALL.len())];
    let (min_distance, max_distance) = race_type.distance_range();
    let distance = rng.gen_range(min_distance..=max_distance);
    let field_size = rng.gen_range(HORSES_PER_RACE.0..=HORSES_PER_RACE.1);

    let mut used_names = HashSet::new();
    let mut used_numbers = HashSet::new();
    let mut used_ids = HashSet::new();
    let mut horses = Vec::with_capacity(field_size);

    for _ in 0..field_size {
        let mut horse = generate_horse(rng, &used_names, &used_numbers);
        if used_ids.contains(&horse.id) {
            let next = used_ids.iter().map(|id: &HorseId| id.0).max().unwrap_or(0);
            horse.id = HorseId(next.wrapping_add(1));
        }
        used_names.insert(horse.name.clone());
        used_numbers.insert(horse.number);
        used_ids.insert(horse.id);
        horses.push(horse);
    }

    RaceCard {
        race_type,
        distance,
        horses,
    }
}

/// Generate and price a race in one step
pub fn new_race(rng: &mut impl Rng) -> Race {
    let race = generate_race(rng).price(rng);
    log::info!(
        "New {} race: {} furlongs, {} horses",
        race.race_type,
        race.distance,
        race.horses.len()
    );
    race
}

//! Config - Tunable constants for the tournament, races and the loan shark
//!
//! Everything here is a compile-time constant except [`LoanTerms`], which a
//! tournament carries so the loan mechanic can be switched off.

use serde::{Deserialize, Serialize};

// Tournament
pub const MAX_GAME_DAYS: u32 = 5;
pub const RACES_PER_DAY: u32 = 10;
pub const MAX_PLAYERS: usize = 4;
pub const STARTING_BUX: u64 = 100;
/// Real-time interval the driver waits between simulation ticks
pub const RACE_UPDATE_INTERVAL_MS: u64 = 100;

// Race generation
pub const SHORT_DISTANCE: (u32, u32) = (5, 7);
pub const MEDIUM_DISTANCE: (u32, u32) = (8, 10);
pub const LONG_DISTANCE: (u32, u32) = (11, 14);
pub const HORSES_PER_RACE: (usize, usize) = (5, 8);

// Horse generation
pub const STAT_MIN: u8 = 1;
pub const STAT_MAX: u8 = 10;
pub const HORSE_NUMBER_MIN: u32 = 1;
pub const HORSE_NUMBER_MAX: u32 = 50;
pub const HORSE_NUMBER_ATTEMPTS: u32 = 100;
/// Range for the `Horse #NNN` placeholder once the name pool runs dry
pub const FALLBACK_NAME_RANGE: (u32, u32) = (100, 999);

/// Weight of each stat in a race type's score. Each profile sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatWeights {
    pub top_speed: f64,
    pub stamina: f64,
    pub sprint: f64,
    pub pace: f64,
    pub gate: f64,
}

pub const SHORT_WEIGHTS: StatWeights = StatWeights {
    top_speed: 0.4,
    stamina: 0.1,
    sprint: 0.3,
    pace: 0.1,
    gate: 0.1,
};

pub const MEDIUM_WEIGHTS: StatWeights = StatWeights {
    top_speed: 0.3,
    stamina: 0.2,
    sprint: 0.2,
    pace: 0.2,
    gate: 0.1,
};

pub const LONG_WEIGHTS: StatWeights = StatWeights {
    top_speed: 0.2,
    stamina: 0.4,
    sprint: 0.1,
    pace: 0.2,
    gate: 0.1,
};

// Health modifiers
pub const POOR_HEALTH_THRESHOLD: u8 = 5;
pub const PERFECT_HEALTH: u8 = 10;
pub const POOR_HEALTH_ODDS_FACTOR: f64 = 0.85;
pub const PERFECT_HEALTH_ODDS_FACTOR: f64 = 1.05;
pub const POOR_HEALTH_SPEED_FACTOR: f64 = 0.88;
pub const PERFECT_HEALTH_SPEED_FACTOR: f64 = 1.05;

// Odds
pub const BASE_ODDS: f64 = 3.0;
/// Multiplier added per unit of distance from the race favourite
pub const ODDS_SPREAD: f64 = 8.0;
pub const MIN_ODDS: f64 = 1.1;
pub const ODDS_RANDOM_FACTOR: (f64, f64) = (0.8, 1.2);

// Simulation
/// Fraction of the distance a stat-10 horse covers per tick before modifiers
pub const BASE_SPEED: f64 = 0.0065;
pub const TICK_SPEED_FACTOR: (f64, f64) = (0.85, 1.15);
pub const GATE_PHASE_END: f64 = 0.1;
pub const SPRINT_PHASE_START: f64 = 0.8;
/// (base, range) pairs: multiplier = base + (stat / 10) * range
pub const GATE_PHASE_CURVE: (f64, f64) = (0.7, 0.5);
pub const PACE_PHASE_CURVE: (f64, f64) = (0.9, 0.2);
pub const SPRINT_PHASE_CURVE: (f64, f64) = (0.8, 0.4);
/// Every runner below this mark once somebody finished is pulled as DNF
pub const DNF_THRESHOLD: f64 = 0.5;

// Come-from-behind
pub const COMEBACK_CHANCE_PER_TICK: f64 = 0.003;
pub const COMEBACK_MIN_LEADER_POSITION: f64 = 0.3;
pub const COMEBACK_MIN_RUNNERS: usize = 3;
pub const COMEBACK_MAX_DURATION_RATIO: f64 = 0.5;
pub const COMEBACK_SPEED_MULTIPLIER: f64 = 2.0;

// Loan shark
pub const VIG_RATE: f64 = 0.25;
pub const MAX_LOAN_FACTOR: f64 = 0.5;
pub const MIN_LOAN: u64 = 10;

// AI betting
pub const AI_FAVORITE_CHANCE: f64 = 0.4;
pub const AI_MIDDLE_CHANCE: f64 = 0.4;
pub const AI_LONGSHOT_CHANCE: f64 = 0.2;
pub const AI_MAX_BET_RATIO: f64 = 0.5;
pub const BET_INCREMENTS: [u64; 4] = [1, 5, 10, 25];

pub const HORSE_COLORS: [&str; 15] = [
    "#e74c3c", "#3498db", "#2ecc71", "#f39c12", "#9b59b6",
    "#1abc9c", "#d35400", "#27ae60", "#8e44ad", "#16a085",
    "#e67e22", "#2980b9", "#c0392b", "#7f8c8d", "#f1c40f",
];

pub const HORSE_NAMES: [&str; 50] = [
    "Thunder Bolt", "Silver Wind", "Golden Arrow", "Dark Star",
    "Lucky Charm", "Iron Will", "Swift Shadow", "Red Fury",
    "Blue Moon", "Storm Chaser", "Desert Rose", "Midnight Sun",
    "Wild Spirit", "Copper King", "Jade Runner", "Steel Heart",
    "Fire Dancer", "Ocean Wave", "Forest Flash", "Mountain Peak",
    "Crystal Clear", "Diamond Rush", "Emerald Isle", "Sunset Rider",
    "Dawn Breaker", "Twilight Star", "Scarlet Fox", "Arctic Wolf",
    "Neon Dream", "Blazing Trail", "Shadow Dancer", "Glory Run",
    "Rapid Fire", "Silver Lining", "Golden Gate", "Brave Heart",
    "Wind Rider", "Sun Dancer", "Moon Shadow", "Sky Blazer",
    "River Rush", "Valley Run", "Peak Climber", "Sea Breeze",
    "Noble Quest", "Star Gazer", "Earth Shaker", "Copper Flash",
    "Midnight Blaze", "Desert Wind",
];

pub const JOCKEY_NAMES: [&str; 12] = [
    "J. Santos", "M. Garcia", "T. Williams", "R. Johnson",
    "A. Martinez", "D. Lee", "K. Brown", "P. Taylor",
    "S. Chen", "O. Diaz", "F. Kim", "B. Nguyen",
];

pub const AI_NAMES: [&str; 4] = ["Dusty Trail", "Lucky Pete", "Big Money", "The Gambler"];

/// Loan shark limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Interest charged on the outstanding balance per race
    pub vig_rate: f64,
    /// Share of the day-start balance that can be borrowed
    pub max_loan_factor: f64,
    /// Credit line floor, regardless of how small the day-start balance is
    pub min_loan: u64,
}

impl LoanTerms {
    /// Terms under which nothing can ever be borrowed
    pub fn disabled() -> Self {
        Self {
            vig_rate: 0.0,
            max_loan_factor: 0.0,
            min_loan: 0,
        }
    }
}

impl Default for LoanTerms {
    fn default() -> Self {
        Self {
            vig_rate: VIG_RATE,
            max_loan_factor: MAX_LOAN_FACTOR,
            min_loan: MIN_LOAN,
        }
    }
}

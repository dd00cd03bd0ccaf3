//! Player - Bettors in the tournament
//!
//! Players are plain values. Every settlement or loan operation builds a new
//! `Player` rather than touching the old one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::race_engine::config::{AI_NAMES, STARTING_BUX};

/// Unique player identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p-{:x}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_human: bool,
    /// Current balance in bux
    pub balance: u64,
    pub wins: u32,
    /// Cumulative payouts
    pub total_won: u64,
    /// Cumulative stakes lost
    pub total_lost: u64,
    /// Outstanding debt to the loan shark
    pub loan_balance: u64,
}

impl Player {
    pub fn with_balance(&self, balance: u64) -> Self {
        Self {
            balance,
            ..self.clone()
        }
    }

    pub fn with_loan_balance(&self, loan_balance: u64) -> Self {
        Self {
            loan_balance,
            ..self.clone()
        }
    }

    /// Balance minus outstanding debt, can be negative
    pub fn net_worth(&self) -> i64 {
        self.balance as i64 - self.loan_balance as i64
    }

    pub fn is_ai(&self) -> bool {
        !self.is_human
    }
}

/// Create a player with the starting stake
pub fn create_player(name: impl Into<String>, is_human: bool) -> Player {
    Player {
        id: PlayerId(rand::random()),
        name: name.into(),
        is_human,
        balance: STARTING_BUX,
        wins: 0,
        total_won: 0,
        total_lost: 0,
        loan_balance: 0,
    }
}

/// Create the AI opponent for seat `index` (0-based)
pub fn create_ai_player(index: usize) -> Player {
    let name = AI_NAMES
        .get(index)
        .map(|n| n.to_string())
        .unwrap_or_else(|| format!("AI #{}", index + 1));
    create_player(name, false)
}

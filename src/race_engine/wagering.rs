//! Wagering - Bet placement for AI players and settlement against the winner

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::race_engine::config::{
    AI_FAVORITE_CHANCE, AI_MAX_BET_RATIO, AI_MIDDLE_CHANCE, BET_INCREMENTS,
};
use crate::race_engine::horse::{Horse, HorseId};
use crate::race_engine::odds::OddsBook;
use crate::race_engine::player::{Player, PlayerId};
use crate::race_engine::race::sort_by_odds;

/// A win bet on a single horse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub horse_id: HorseId,
    pub amount: u64,
}

/// At most one bet per player per race
pub type Bets = BTreeMap<PlayerId, Bet>;

/// Gross payout of a winning stake, stake included
pub fn potential_payout(amount: u64, odds: f64) -> u64 {
    (amount as f64 * odds).floor() as u64
}

/// Settle every bet against the race winner.
///
/// A winning stake pays `floor(amount * odds)`, which returns the stake plus
/// the profit, so the balance moves by the payout less the amount committed.
/// A losing stake is taken from the balance, floored at zero. Players without
/// a bet come back unchanged.
pub fn apply_bet_results(
    players: &[Player],
    bets: &Bets,
    winner: HorseId,
    odds: &OddsBook,
) -> Vec<Player> {
    players
        .iter()
        .map(|player| {
            let Some(bet) = bets.get(&player.id) else {
                return player.clone();
            };

            if bet.horse_id == winner {
                let payout = potential_payout(bet.amount, odds.get(&winner).copied().unwrap_or(0.0));
                Player {
                    balance: (player.balance + payout).saturating_sub(bet.amount),
                    wins: player.wins + 1,
                    total_won: player.total_won + payout,
                    ..player.clone()
                }
            } else {
                Player {
                    balance: player.balance.saturating_sub(bet.amount),
                    total_lost: player.total_lost + bet.amount,
                    ..player.clone()
                }
            }
        })
        .collect()
}

/// Index into a favourite-first field for a bucket roll in [0, 1)
fn ai_target_index(roll: f64, field_size: usize) -> usize {
    if roll < AI_FAVORITE_CHANCE {
        0
    } else if roll < AI_FAVORITE_CHANCE + AI_MIDDLE_CHANCE {
        field_size / 2
    } else {
        field_size - 1
    }
}

/// Pick a bet for an AI player.
///
/// Returns `None` when the player is broke. Otherwise backs the favourite,
/// a middle-ranked horse or the longest shot, staking one of the fixed
/// increments that fits within the AI's maximum bet ratio.
pub fn make_ai_bet(
    player: &Player,
    horses: &[Horse],
    odds: &OddsBook,
    rng: &mut impl Rng,
) -> Option<Bet> {
    if player.balance == 0 || horses.is_empty() {
        return None;
    }

    let sorted = sort_by_odds(horses, odds);
    let target = sorted[ai_target_index(rng.gen::<f64>(), sorted.len())];

    let max_bet = ((player.balance as f64 * AI_MAX_BET_RATIO).floor() as u64).max(1);
    let increments: Vec<u64> = BET_INCREMENTS
        .iter()
        .copied()
        .filter(|&b| b <= max_bet)
        .collect();
    let amount = increments.choose(rng).copied().unwrap_or(1);

    Some(Bet {
        horse_id: target.id,
        amount,
    })
}

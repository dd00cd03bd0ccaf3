//! Tournament - Day and race sequencing across the whole game
//!
//! `TournamentState` is an immutable value. Every operation returns the next
//! state and leaves the previous one alone; whoever drives the game keeps the
//! single current copy.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::race_engine::config::{LoanTerms, MAX_GAME_DAYS, MAX_PLAYERS, RACES_PER_DAY, STARTING_BUX};
use crate::race_engine::error::{BetError, LoanError, PhaseError, SessionError};
use crate::race_engine::horse::{Horse, HorseId};
use crate::race_engine::loan;
use crate::race_engine::odds::OddsBook;
use crate::race_engine::player::{create_ai_player, create_player, Player};
use crate::race_engine::race::{new_race, Race, RaceType};
use crate::race_engine::simulation::{init_race_state, RaceOutcome, RaceState};
use crate::race_engine::wagering::{apply_bet_results, make_ai_bet, Bet, Bets};

/// Where the tournament is in its betting/racing loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Betting,
    Racing,
    Results,
    GameOver,
}

/// Everything worth showing about the last race once it is scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub outcome: RaceOutcome,
    pub winner: HorseId,
    pub horses: Vec<Horse>,
    pub odds: OddsBook,
    pub bets: Bets,
    pub day: u32,
    pub race_number: u32,
    pub race_type: RaceType,
    pub distance: u32,
}

impl RaceResult {
    /// Horses that truly finished, in order
    pub fn placings(&self) -> Vec<&Horse> {
        self.outcome
            .placings()
            .into_iter()
            .filter_map(|id| self.horses.iter().find(|h| h.id == id))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentState {
    /// Current day, 1-based
    pub day: u32,
    /// Current race within the day, 1-based
    pub race: u32,
    /// Human balance when the day began; basis for the loan cap
    pub day_start_balance: u64,
    pub players: Vec<Player>,
    pub current_race: Option<Race>,
    pub current_bets: Bets,
    pub last_result: Option<RaceResult>,
    pub phase: GamePhase,
    pub game_over: bool,
    pub loan_terms: LoanTerms,
}

impl TournamentState {
    /// Seat the human and up to `MAX_PLAYERS - 1` AI opponents and open the first race
    pub fn new(player_name: &str, ai_count: usize, rng: &mut impl Rng) -> Self {
        let ai_count = ai_count.min(MAX_PLAYERS - 1);
        let mut players = Vec::with_capacity(ai_count + 1);
        players.push(create_player(player_name, true));
        players.extend((0..ai_count).map(create_ai_player));

        log::info!(
            "Tournament started for {} with {} AI opponents",
            player_name,
            ai_count
        );

        Self {
            day: 1,
            race: 1,
            day_start_balance: STARTING_BUX,
            players,
            current_race: Some(new_race(rng)),
            current_bets: Bets::new(),
            last_result: None,
            phase: GamePhase::Betting,
            game_over: false,
            loan_terms: LoanTerms::default(),
        }
    }

    pub fn with_loan_terms(self, loan_terms: LoanTerms) -> Self {
        Self { loan_terms, ..self }
    }

    pub fn human(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_human)
    }

    /// Players ordered by balance, richest first
    pub fn standings(&self) -> Vec<&Player> {
        let mut sorted: Vec<&Player> = self.players.iter().collect();
        sorted.sort_by(|a, b| b.balance.cmp(&a.balance));
        sorted
    }

    /// 1-based rank of the human in the standings
    pub fn human_rank(&self) -> Option<usize> {
        self.standings()
            .iter()
            .position(|p| p.is_human)
            .map(|i| i + 1)
    }

    /// Credit the human can still draw today
    pub fn loan_available(&self) -> u64 {
        self.human()
            .map(|p| loan::max_loan_available(p, self.day_start_balance, &self.loan_terms))
            .unwrap_or(0)
    }

    pub fn human_is_bust(&self) -> bool {
        self.human()
            .map(|p| loan::is_bust(p, self.day_start_balance, &self.loan_terms))
            .unwrap_or(false)
    }

    fn expect_phase(&self, expected: GamePhase) -> Result<(), PhaseError> {
        if self.game_over && expected != GamePhase::Results {
            return Err(PhaseError::GameOver);
        }
        if self.phase != expected {
            return Err(PhaseError::WrongPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn map_human(&self, f: impl Fn(&Player) -> Player) -> Vec<Player> {
        self.players
            .iter()
            .map(|p| if p.is_human { f(p) } else { p.clone() })
            .collect()
    }

    fn validate_bet(&self, bet: &Bet) -> Result<(), BetError> {
        if bet.amount == 0 {
            return Err(BetError::ZeroAmount);
        }
        let known = self
            .current_race
            .as_ref()
            .and_then(|race| race.get_horse(bet.horse_id))
            .is_some();
        if !known {
            return Err(BetError::UnknownHorse(bet.horse_id));
        }
        let balance = self.human().map(|p| p.balance).unwrap_or(0);
        if bet.amount > balance {
            return Err(BetError::InsufficientBalance {
                amount: bet.amount,
                balance,
            });
        }
        Ok(())
    }

    /// Record the human's bet (if any), draw the AI bets and go to the track
    pub fn place_bets(
        &self,
        human_bet: Option<Bet>,
        rng: &mut impl Rng,
    ) -> Result<Self, SessionError> {
        self.expect_phase(GamePhase::Betting)?;
        let Some(race) = self.current_race.as_ref() else {
            return Err(PhaseError::GameOver.into());
        };

        let mut bets = Bets::new();
        if let Some(bet) = human_bet {
            self.validate_bet(&bet)?;
            if let Some(human) = self.human() {
                bets.insert(human.id, bet);
            }
        }
        for ai in self.players.iter().filter(|p| p.is_ai()) {
            if let Some(bet) = make_ai_bet(ai, &race.horses, &race.odds, rng) {
                bets.insert(ai.id, bet);
            }
        }

        log::debug!("{} bets placed on day {} race {}", bets.len(), self.day, self.race);

        Ok(Self {
            current_bets: bets,
            phase: GamePhase::Racing,
            ..self.clone()
        })
    }

    /// Fresh simulation state for the current race
    pub fn start_simulation(&self) -> Option<RaceState> {
        self.current_race
            .as_ref()
            .map(|race| init_race_state(&race.horses, race.race_type))
    }

    /// Score the finished race and advance the day/race counters.
    ///
    /// After the last race of the last day the tournament is over and no
    /// further race is generated. A new day snapshots the human's balance as
    /// the basis for that day's credit line.
    pub fn settle(&self, outcome: &RaceOutcome, rng: &mut impl Rng) -> Result<Self, SessionError> {
        self.expect_phase(GamePhase::Racing)?;
        let race = self.current_race.as_ref().ok_or(PhaseError::GameOver)?;
        let winner = outcome
            .winner()
            .filter(|id| race.get_horse(*id).is_some())
            .ok_or(PhaseError::OutcomeMismatch)?;

        let players = apply_bet_results(&self.players, &self.current_bets, winner, &race.odds);
        let human_balance = players
            .iter()
            .find(|p| p.is_human)
            .map(|p| p.balance)
            .unwrap_or(0);

        let last_result = RaceResult {
            outcome: outcome.clone(),
            winner,
            horses: race.horses.clone(),
            odds: race.odds.clone(),
            bets: self.current_bets.clone(),
            day: self.day,
            race_number: self.race,
            race_type: race.race_type,
            distance: race.distance,
        };

        let is_last_race = self.race >= RACES_PER_DAY;
        let is_last_day = is_last_race && self.day >= MAX_GAME_DAYS;
        let is_new_day = is_last_race && !is_last_day;

        log::info!(
            "Day {} race {} won by {}",
            self.day,
            self.race,
            race.get_horse(winner).map(|h| h.name.as_str()).unwrap_or("?")
        );

        let (day, race_number) = if is_new_day {
            log::info!("Day {} begins", self.day + 1);
            (self.day + 1, 1)
        } else if is_last_race {
            (self.day, self.race)
        } else {
            (self.day, self.race + 1)
        };

        let current_race = if is_last_day {
            log::info!("Tournament over");
            None
        } else {
            Some(new_race(rng))
        };

        Ok(Self {
            day,
            race: race_number,
            day_start_balance: if is_new_day {
                human_balance
            } else {
                self.day_start_balance
            },
            players,
            current_race,
            current_bets: Bets::new(),
            last_result: Some(last_result),
            phase: GamePhase::Results,
            game_over: is_last_day,
            loan_terms: self.loan_terms,
        })
    }

    /// Leave the results screen: charge vig and open betting, or end the game
    pub fn next_race(&self) -> Result<Self, PhaseError> {
        self.expect_phase(GamePhase::Results)?;
        if self.game_over {
            return Ok(Self {
                phase: GamePhase::GameOver,
                ..self.clone()
            });
        }

        let players = self
            .players
            .iter()
            .map(|p| loan::accrue_vig(p, &self.loan_terms))
            .collect();

        Ok(Self {
            players,
            phase: GamePhase::Betting,
            ..self.clone()
        })
    }

    /// Borrow for the human, up to the credit still available today
    pub fn take_loan(&self, amount: u64) -> Result<Self, SessionError> {
        self.expect_phase(GamePhase::Betting)?;
        if amount == 0 {
            return Err(LoanError::ZeroAmount.into());
        }
        let available = self.loan_available();
        if amount > available {
            return Err(LoanError::ExceedsCredit {
                requested: amount,
                available,
            }
            .into());
        }

        log::info!("Loan of {} taken, {} credit left", amount, available - amount);
        Ok(Self {
            players: self.map_human(|p| loan::take_loan(p, amount)),
            ..self.clone()
        })
    }

    /// Pay back as much of `amount` as the human owes and holds
    pub fn repay_loan(&self, amount: u64) -> Result<Self, SessionError> {
        self.expect_phase(GamePhase::Betting)?;
        let players = self.map_human(|p| loan::repay_loan(p, amount));
        if let Some(human) = players.iter().find(|p| p.is_human) {
            log::info!("Loan repaid, {} still owed", human.loan_balance);
        }
        Ok(Self {
            players,
            ..self.clone()
        })
    }

    /// Walk away: the tournament ends immediately
    pub fn forfeit(&self) -> Self {
        log::info!("Tournament forfeited on day {} race {}", self.day, self.race);
        Self {
            current_race: None,
            current_bets: Bets::new(),
            phase: GamePhase::GameOver,
            game_over: true,
            ..self.clone()
        }
    }

    pub fn to_snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_snapshot_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

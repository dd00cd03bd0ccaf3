//! Race Engine Module
//!
//! Horse generation, odds, the tick-by-tick race simulation, bet settlement,
//! the loan shark and tournament sequencing. Rendering and input live with
//! whoever drives a [`GameSession`].

pub mod config;
pub mod error;
pub mod horse;
pub mod loan;
pub mod odds;
pub mod persistence;
pub mod player;
pub mod race;
pub mod session;
pub mod simulation;
pub mod tournament;
pub mod wagering;

pub use config::LoanTerms;
pub use error::{BetError, LoanError, PhaseError, SessionError};
pub use horse::{generate_horse, Horse, HorseId, HorseStats};
pub use loan::{accrue_vig, is_bust, max_loan_available, repay_loan, take_loan};
pub use odds::{calculate_odds, OddsBook};
pub use persistence::{PlayerStore, SavedPlayer};
pub use player::{create_ai_player, create_player, Player, PlayerId};
pub use race::{generate_race, new_race, Race, RaceCard, RaceType};
pub use session::{GameSession, SessionStats};
pub use simulation::{init_race_state, tick_race, RaceOutcome, RaceSnapshot, RaceState, RaceStatus};
pub use tournament::{GamePhase, RaceResult, TournamentState};
pub use wagering::{apply_bet_results, make_ai_bet, Bet, Bets};

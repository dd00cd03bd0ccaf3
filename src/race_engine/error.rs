//! Errors raised when a collaborator asks the tournament for something it
//! cannot do. The engine functions themselves are infallible.

use thiserror::Error;

use crate::race_engine::horse::HorseId;
use crate::race_engine::tournament::GamePhase;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BetError {
    #[error("Bet amount must be positive")]
    ZeroAmount,

    #[error("Horse {0} is not in this race")]
    UnknownHorse(HorseId),

    #[error("Bet of {amount} exceeds balance of {balance}")]
    InsufficientBalance { amount: u64, balance: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanError {
    #[error("Loan amount must be positive")]
    ZeroAmount,

    #[error("Requested {requested} but only {available} is available today")]
    ExceedsCredit { requested: u64, available: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    #[error("The tournament is over")]
    GameOver,

    #[error("Expected {expected:?} phase, tournament is in {actual:?}")]
    WrongPhase { expected: GamePhase, actual: GamePhase },

    #[error("Race outcome does not match the field")]
    OutcomeMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Bet(#[from] BetError),

    #[error(transparent)]
    Loan(#[from] LoanError),

    #[error(transparent)]
    Phase(#[from] PhaseError),
}

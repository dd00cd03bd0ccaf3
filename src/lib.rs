//! Derby Engine - Horse racing betting simulator
//!
//! Procedurally generated races, odds, a tick-driven race simulation, bet
//! settlement and a loan shark, sequenced over a multi-day tournament.

pub mod race_engine;

pub use race_engine::*;

/// Install the `env_logger` backend for the `log` facade.
///
/// Defaults to `info`; `RUST_LOG` overrides. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

//! Session - Driver that owns the live tournament and the race in progress
//!
//! The tournament and race states are immutable values; the session holds
//! the single current copy of each, the random source, and the optional
//! player store. One tick per call, never reentrant.

use std::collections::VecDeque;
use std::time::Instant;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::race_engine::config::RACE_UPDATE_INTERVAL_MS;
use crate::race_engine::error::SessionError;
use crate::race_engine::horse::Horse;
use crate::race_engine::persistence::PlayerStore;
use crate::race_engine::simulation::{tick_race, RaceSnapshot, RaceState, RaceStatus};
use crate::race_engine::tournament::{GamePhase, RaceResult, TournamentState};
use crate::race_engine::wagering::{make_ai_bet, Bet};

/// Number of recent ticks averaged in the stats
const TICK_WINDOW: usize = 60;

/// Session statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub tick_interval_ms: u64,
    pub avg_tick_time_ms: f32,
    pub ticks_run: u64,
    pub races_run: u32,
    pub phase: GamePhase,
}

pub struct GameSession<R: Rng> {
    tournament: TournamentState,
    /// Active race simulation (if any)
    race_state: Option<RaceState>,
    /// Field of the race being simulated
    field: Vec<Horse>,
    rng: R,
    store: Option<PlayerStore>,
    /// Recent tick durations for averaging
    tick_times: VecDeque<f32>,
    ticks_run: u64,
    races_run: u32,
}

impl<R: Rng> GameSession<R> {
    pub fn new(player_name: &str, ai_count: usize, mut rng: R) -> Self {
        let tournament = TournamentState::new(player_name, ai_count, &mut rng);
        Self {
            tournament,
            race_state: None,
            field: Vec::new(),
            rng,
            store: None,
            tick_times: VecDeque::with_capacity(TICK_WINDOW),
            ticks_run: 0,
            races_run: 0,
        }
    }

    /// Save the human's balance after every race
    pub fn with_store(self, store: PlayerStore) -> Self {
        Self {
            store: Some(store),
            ..self
        }
    }

    pub fn tournament(&self) -> &TournamentState {
        &self.tournament
    }

    pub fn race_state(&self) -> Option<&RaceState> {
        self.race_state.as_ref()
    }

    pub fn phase(&self) -> GamePhase {
        self.tournament.phase
    }

    /// The AI betting policy applied to the human seat
    pub fn suggest_bet(&mut self) -> Option<Bet> {
        let human = self.tournament.human()?;
        let race = self.tournament.current_race.as_ref()?;
        make_ai_bet(human, &race.horses, &race.odds, &mut self.rng)
    }

    /// Lock in bets and put the field in the gate
    pub fn place_bets(&mut self, human_bet: Option<Bet>) -> Result<(), SessionError> {
        let next = self.tournament.place_bets(human_bet, &mut self.rng)?;
        self.race_state = next.start_simulation();
        self.field = next
            .current_race
            .as_ref()
            .map(|race| race.horses.clone())
            .unwrap_or_default();
        self.tournament = next;
        Ok(())
    }

    /// Perform a single simulation tick.
    ///
    /// The race is scored on the tick it finishes; after that ticks are
    /// no-ops that keep returning the final snapshot. A race that cannot be
    /// scored is dropped, so later ticks return `None`.
    pub fn tick(&mut self) -> Option<RaceSnapshot> {
        let state = self.race_state.as_ref()?;

        if self.tournament.phase != GamePhase::Racing {
            return Some(state.snapshot(&self.field));
        }

        let tick_start = Instant::now();
        let next = tick_race(state, &self.field, &mut self.rng);
        let snapshot = next.snapshot(&self.field);
        let outcome = next.outcome();
        self.race_state = Some(next);
        self.ticks_run += 1;

        if let Some(outcome) = outcome {
            match self.tournament.settle(&outcome, &mut self.rng) {
                Ok(settled) => {
                    self.tournament = settled;
                    self.races_run += 1;
                    self.save_human();
                }
                Err(e) => {
                    log::error!("Could not settle race, dropping it: {}", e);
                    self.race_state = None;
                }
            }
        }

        let tick_time = tick_start.elapsed().as_secs_f32() * 1000.0;
        self.tick_times.push_back(tick_time);
        if self.tick_times.len() > TICK_WINDOW {
            self.tick_times.pop_front();
        }

        Some(snapshot)
    }

    /// Tick until the current race is scored
    pub fn run_race(&mut self) -> Option<&RaceResult> {
        while self.tournament.phase == GamePhase::Racing {
            let snapshot = self.tick()?;
            if snapshot.status == RaceStatus::Done && self.tournament.phase == GamePhase::Racing {
                return None;
            }
        }
        self.tournament.last_result.as_ref()
    }

    /// Move on from the results: charge vig, open the next race or end the game
    pub fn next_race(&mut self) -> Result<(), SessionError> {
        self.tournament = self.tournament.next_race()?;
        self.race_state = None;
        self.field.clear();
        Ok(())
    }

    pub fn take_loan(&mut self, amount: u64) -> Result<(), SessionError> {
        self.tournament = self.tournament.take_loan(amount)?;
        Ok(())
    }

    pub fn repay_loan(&mut self, amount: u64) -> Result<(), SessionError> {
        self.tournament = self.tournament.repay_loan(amount)?;
        Ok(())
    }

    pub fn forfeit(&mut self) {
        self.tournament = self.tournament.forfeit();
        self.race_state = None;
        self.field.clear();
    }

    /// Forget the saved player, e.g. when starting over
    pub fn clear_saved(&self) {
        if let Some(store) = &self.store {
            store.clear();
        }
    }

    pub fn stats(&self) -> SessionStats {
        let avg_tick_time = if self.tick_times.is_empty() {
            0.0
        } else {
            self.tick_times.iter().sum::<f32>() / self.tick_times.len() as f32
        };

        SessionStats {
            tick_interval_ms: RACE_UPDATE_INTERVAL_MS,
            avg_tick_time_ms: avg_tick_time,
            ticks_run: self.ticks_run,
            races_run: self.races_run,
            phase: self.tournament.phase,
        }
    }

    fn save_human(&self) {
        if let (Some(store), Some(human)) = (&self.store, self.tournament.human()) {
            store.save(&human.name, human.balance);
        }
    }
}

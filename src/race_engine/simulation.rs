//! Simulation - Tick-by-tick race progression
//!
//! A race runs from `Running` to `Done`. Every tick each horse still on the
//! track advances by its intrinsic speed, scaled by a random factor and by the
//! stat that matters in its current phase. One trailing horse per race may get
//! a come-from-behind boost, and once somebody has finished every horse still
//! short of halfway is pulled as DNF.
//!
//! Ticks are pure: [`tick_race`] takes the previous state and returns the next.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::race_engine::config::{
    BASE_SPEED, COMEBACK_CHANCE_PER_TICK, COMEBACK_MAX_DURATION_RATIO,
    COMEBACK_MIN_LEADER_POSITION, COMEBACK_MIN_RUNNERS, COMEBACK_SPEED_MULTIPLIER,
    DNF_THRESHOLD, GATE_PHASE_CURVE, GATE_PHASE_END, PACE_PHASE_CURVE,
    PERFECT_HEALTH_SPEED_FACTOR, POOR_HEALTH_SPEED_FACTOR, SPRINT_PHASE_CURVE,
    SPRINT_PHASE_START, TICK_SPEED_FACTOR,
};
use crate::race_engine::horse::{HealthBand, Horse, HorseId, HorseStats};
use crate::race_engine::race::RaceType;

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    Running,
    Done,
}

/// Section of the track a horse is in, each favouring a different stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    Gate,
    Pace,
    Sprint,
}

impl RacePhase {
    pub fn at(position: f64) -> Self {
        if position < GATE_PHASE_END {
            RacePhase::Gate
        } else if position > SPRINT_PHASE_START {
            RacePhase::Sprint
        } else {
            RacePhase::Pace
        }
    }

    /// Speed multiplier for a horse in this phase
    pub fn multiplier(self, stats: &HorseStats) -> f64 {
        let (stat, (base, range)) = match self {
            RacePhase::Gate => (stats.gate, GATE_PHASE_CURVE),
            RacePhase::Pace => (stats.pace, PACE_PHASE_CURVE),
            RacePhase::Sprint => (stats.sprint, SPRINT_PHASE_CURVE),
        };
        base + (f64::from(stat) / 10.0) * range
    }
}

/// Come-from-behind bookkeeping, one boost per race
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComebackState {
    pub has_been_used: bool,
    pub active_horse: Option<HorseId>,
    /// Last tick on which the boost applies
    pub end_tick: Option<u32>,
}

/// Transient state of a race in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceState {
    /// Fraction of the distance covered, in [0, 1]
    pub positions: BTreeMap<HorseId, f64>,
    /// Intrinsic per-tick speed, fixed for the race
    pub speeds: BTreeMap<HorseId, f64>,
    /// Finish order, DNF horses trailing
    pub finished: Vec<HorseId>,
    /// Horses pulled from the race; always a subset of `finished`
    pub dnf: Vec<HorseId>,
    pub tick: u32,
    pub come_from_behind: ComebackState,
    pub done: bool,
}

/// Finish order and DNF list handed to settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceOutcome {
    pub finish_order: Vec<HorseId>,
    pub dnf: Vec<HorseId>,
}

impl RaceOutcome {
    /// First finisher that was not pulled
    pub fn winner(&self) -> Option<HorseId> {
        self.placings().first().copied()
    }

    /// Finish order without DNF horses
    pub fn placings(&self) -> Vec<HorseId> {
        self.finish_order
            .iter()
            .copied()
            .filter(|id| !self.dnf.contains(id))
            .collect()
    }

    pub fn is_dnf(&self, id: HorseId) -> bool {
        self.dnf.contains(&id)
    }
}

/// Intrinsic speed of a horse for a race of the given type
pub fn intrinsic_speed(horse: &Horse, race_type: RaceType) -> f64 {
    let weighted = horse.stats.weighted_score(race_type.stat_weights());
    let health = match horse.health_band() {
        HealthBand::Poor => POOR_HEALTH_SPEED_FACTOR,
        HealthBand::Perfect => PERFECT_HEALTH_SPEED_FACTOR,
        HealthBand::Normal => 1.0,
    };
    (weighted / 10.0) * BASE_SPEED * health
}

/// Set every horse at the gate
pub fn init_race_state(horses: &[Horse], race_type: RaceType) -> RaceState {
    RaceState {
        positions: horses.iter().map(|h| (h.id, 0.0)).collect(),
        speeds: horses
            .iter()
            .map(|h| (h.id, intrinsic_speed(h, race_type)))
            .collect(),
        finished: Vec::new(),
        dnf: Vec::new(),
        tick: 0,
        come_from_behind: ComebackState::default(),
        done: horses.is_empty(),
    }
}

/// Advance the race by one tick.
///
/// Horses crossing the line in the same tick are appended in `horses` order.
/// A finished race is returned unchanged.
pub fn tick_race(state: &RaceState, horses: &[Horse], rng: &mut impl Rng) -> RaceState {
    if state.done {
        return state.clone();
    }

    let mut next = state.clone();
    next.tick = state.tick + 1;

    let unfinished: Vec<&Horse> = horses
        .iter()
        .filter(|h| !next.finished.contains(&h.id))
        .collect();

    if let Some(comeback) = try_trigger_comeback(&next, &unfinished, rng) {
        log::debug!(
            "Come-from-behind for {} until tick {:?}",
            comeback.active_horse.map(|id| id.to_string()).unwrap_or_default(),
            comeback.end_tick
        );
        next.come_from_behind = comeback;
    }

    if let (Some(_), Some(end_tick)) = (
        next.come_from_behind.active_horse,
        next.come_from_behind.end_tick,
    ) {
        if next.tick > end_tick {
            next.come_from_behind.active_horse = None;
        }
    }

    for horse in &unfinished {
        let progress = next.position(horse.id);
        let mut speed = next.speed(horse.id)
            * rng.gen_range(TICK_SPEED_FACTOR.0..TICK_SPEED_FACTOR.1)
            * RacePhase::at(progress).multiplier(&horse.stats);

        if next.come_from_behind.active_horse == Some(horse.id) {
            speed *= COMEBACK_SPEED_MULTIPLIER;
        }

        let position = (progress + speed).min(1.0);
        next.positions.insert(horse.id, position);
        if position >= 1.0 {
            next.finished.push(horse.id);
        }
    }

    if !next.finished.is_empty() {
        let still_running: Vec<HorseId> = horses
            .iter()
            .map(|h| h.id)
            .filter(|id| !next.finished.contains(id))
            .collect();
        if !still_running.is_empty()
            && still_running
                .iter()
                .all(|&id| next.position(id) < DNF_THRESHOLD)
        {
            log::debug!("Pulling {} horses as DNF", still_running.len());
            next.finished.extend(still_running.iter().copied());
            next.dnf.extend(still_running);
        }
    }

    next.done = next.finished.len() == horses.len();
    next
}

/// Roll for the come-from-behind boost.
///
/// Only considered while no boost is active, the race budget is unspent,
/// enough horses are still running and the leader is past the minimum mark.
/// The boosted horse comes from the back half of the field.
fn try_trigger_comeback(
    state: &RaceState,
    unfinished: &[&Horse],
    rng: &mut impl Rng,
) -> Option<ComebackState> {
    let comeback = &state.come_from_behind;
    if comeback.active_horse.is_some()
        || comeback.has_been_used
        || unfinished.len() < COMEBACK_MIN_RUNNERS
    {
        return None;
    }

    let lead = unfinished
        .iter()
        .map(|h| state.position(h.id))
        .fold(0.0_f64, f64::max);
    if lead <= COMEBACK_MIN_LEADER_POSITION || rng.gen::<f64>() >= COMEBACK_CHANCE_PER_TICK {
        return None;
    }

    let mut by_position = unfinished.to_vec();
    by_position.sort_by(|a, b| state.position(a.id).total_cmp(&state.position(b.id)));
    let back_half = &by_position[..(by_position.len() + 1) / 2];
    let chosen = back_half[rng.gen_range(0..back_half.len())];

    let remaining = 1.0 - state.position(chosen.id);
    let speed = state.speed(chosen.id);
    let duration = if speed > 0.0 {
        ((remaining * COMEBACK_MAX_DURATION_RATIO) / speed).floor() as u32
    } else {
        0
    };

    Some(ComebackState {
        has_been_used: true,
        active_horse: Some(chosen.id),
        end_tick: Some(state.tick + duration),
    })
}

impl RaceState {
    pub fn position(&self, id: HorseId) -> f64 {
        self.positions.get(&id).copied().unwrap_or(0.0)
    }

    pub fn speed(&self, id: HorseId) -> f64 {
        self.speeds.get(&id).copied().unwrap_or(0.0)
    }

    pub fn status(&self) -> RaceStatus {
        if self.done {
            RaceStatus::Done
        } else {
            RaceStatus::Running
        }
    }

    /// Finish order and DNF list, once the race is done
    pub fn outcome(&self) -> Option<RaceOutcome> {
        self.done.then(|| RaceOutcome {
            finish_order: self.finished.clone(),
            dnf: self.dnf.clone(),
        })
    }

    /// Get current leader among horses still running
    pub fn leader(&self) -> Option<HorseId> {
        self.positions
            .iter()
            .filter(|(id, _)| !self.finished.contains(*id))
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(id, _)| *id)
    }

    /// Get compact snapshot for a renderer
    pub fn snapshot(&self, horses: &[Horse]) -> RaceSnapshot {
        let placings: Vec<HorseId> = self
            .finished
            .iter()
            .copied()
            .filter(|id| !self.dnf.contains(id))
            .collect();

        RaceSnapshot {
            status: self.status(),
            tick: self.tick,
            comeback_horse: self.come_from_behind.active_horse,
            horses: horses
                .iter()
                .map(|h| HorseSnapshot {
                    id: h.id,
                    position: self.position(h.id),
                    finished: self.finished.contains(&h.id),
                    dnf: self.dnf.contains(&h.id),
                    place: placings
                        .iter()
                        .position(|id| *id == h.id)
                        .map(|i| i as u32 + 1),
                })
                .collect(),
            finisher_count: placings.len() as u32,
        }
    }
}

/// Compact horse state for a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseSnapshot {
    pub id: HorseId,
    pub position: f64,
    pub finished: bool,
    pub dnf: bool,
    /// 1-based place among horses that truly finished
    pub place: Option<u32>,
}

/// Compact race snapshot for a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    pub tick: u32,
    pub comeback_horse: Option<HorseId>,
    pub horses: Vec<HorseSnapshot>,
    pub finisher_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn horse(id: u64, stat: u8, health: u8) -> Horse {
        Horse {
            id: HorseId(id),
            name: format!("Horse {}", id),
            number: id as u32,
            color: "#3498db".to_string(),
            jockey: "D. Lee".to_string(),
            stats: HorseStats {
                top_speed: stat,
                stamina: stat,
                sprint: stat,
                pace: stat,
                gate: stat,
            },
            health,
        }
    }

    fn field(n: u64) -> Vec<Horse> {
        (1..=n).map(|i| horse(i, 10, 7)).collect()
    }

    fn place(state: &mut RaceState, id: u64, position: f64) {
        state.positions.insert(HorseId(id), position);
    }

    #[test]
    fn test_init_race_state() {
        let horses = vec![horse(1, 10, 7), horse(2, 10, 2), horse(3, 10, 10)];
        let state = init_race_state(&horses, RaceType::Medium);

        assert!(state.positions.values().all(|&p| p == 0.0));
        assert!((state.speed(HorseId(1)) - 0.0065).abs() < 1e-12);
        assert!((state.speed(HorseId(2)) - 0.0065 * 0.88).abs() < 1e-12);
        assert!((state.speed(HorseId(3)) - 0.0065 * 1.05).abs() < 1e-12);
        assert!(state.finished.is_empty());
        assert!(state.dnf.is_empty());
        assert_eq!(state.come_from_behind, ComebackState::default());
        assert_eq!(state.status(), RaceStatus::Running);
    }

    #[test]
    fn test_phase_multipliers() {
        let stats = horse(1, 10, 7).stats;
        assert_eq!(RacePhase::at(0.05), RacePhase::Gate);
        assert_eq!(RacePhase::at(0.1), RacePhase::Pace);
        assert_eq!(RacePhase::at(0.8), RacePhase::Pace);
        assert_eq!(RacePhase::at(0.81), RacePhase::Sprint);
        assert!((RacePhase::Gate.multiplier(&stats) - 1.2).abs() < 1e-12);
        assert!((RacePhase::Pace.multiplier(&stats) - 1.1).abs() < 1e-12);
        assert!((RacePhase::Sprint.multiplier(&stats) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_first_tick_from_the_gate() {
        let horses = field(2);
        let state = init_race_state(&horses, RaceType::Short);
        let mut rng = StepRng::new(0, 0);

        let next = tick_race(&state, &horses, &mut rng);
        // Bottom of the tick factor (0.85) times the stat-10 gate multiplier (1.2)
        let expected = 0.0065 * 0.85 * 1.2;
        assert_eq!(next.tick, 1);
        for h in &horses {
            assert!((next.position(h.id) - expected).abs() < 1e-12);
        }
        assert!(!next.come_from_behind.has_been_used);
        // Input state is left untouched
        assert_eq!(state.tick, 0);
        assert_eq!(state.position(HorseId(1)), 0.0);
    }

    #[test]
    fn test_dnf_pulls_every_back_marker_in_the_same_tick() {
        let horses = field(3);
        let mut state = init_race_state(&horses, RaceType::Short);
        state.come_from_behind.has_been_used = true;
        place(&mut state, 1, 0.999);
        place(&mut state, 2, 0.3);
        place(&mut state, 3, 0.1);

        let next = tick_race(&state, &horses, &mut StepRng::new(0, 0));

        assert_eq!(next.finished, vec![HorseId(1), HorseId(2), HorseId(3)]);
        assert_eq!(next.dnf, vec![HorseId(2), HorseId(3)]);
        assert!(next.done);
        let outcome = next.outcome().expect("race is done");
        assert_eq!(outcome.winner(), Some(HorseId(1)));
        assert_eq!(outcome.placings(), vec![HorseId(1)]);
    }

    #[test]
    fn test_no_dnf_while_someone_is_past_halfway() {
        let horses = field(3);
        let mut state = init_race_state(&horses, RaceType::Short);
        state.come_from_behind.has_been_used = true;
        place(&mut state, 1, 0.999);
        place(&mut state, 2, 0.6);
        place(&mut state, 3, 0.1);

        let next = tick_race(&state, &horses, &mut StepRng::new(0, 0));

        assert_eq!(next.finished, vec![HorseId(1)]);
        assert!(next.dnf.is_empty());
        assert!(!next.done);
    }

    #[test]
    fn test_simultaneous_finish_follows_field_order() {
        let horses = field(2);
        let mut state = init_race_state(&horses, RaceType::Short);
        place(&mut state, 1, 0.9999);
        place(&mut state, 2, 0.9999);

        let next = tick_race(&state, &horses, &mut StepRng::new(0, 0));
        assert_eq!(next.finished, vec![HorseId(1), HorseId(2)]);

        let reversed: Vec<Horse> = horses.iter().rev().cloned().collect();
        let next = tick_race(&state, &reversed, &mut StepRng::new(0, 0));
        assert_eq!(next.finished, vec![HorseId(2), HorseId(1)]);
        assert!(next.done);
    }

    #[test]
    fn test_comeback_boosts_a_back_half_horse() {
        let horses = field(4);
        let mut state = init_race_state(&horses, RaceType::Short);
        place(&mut state, 1, 0.5);
        place(&mut state, 2, 0.2);
        place(&mut state, 3, 0.15);
        place(&mut state, 4, 0.35);

        // A zero source always passes the per-tick roll and picks the rearmost horse
        let next = tick_race(&state, &horses, &mut StepRng::new(0, 0));
        let cfb = &next.come_from_behind;

        assert!(cfb.has_been_used);
        assert_eq!(cfb.active_horse, Some(HorseId(3)));
        let remaining = 1.0 - 0.15;
        let duration = ((remaining * COMEBACK_MAX_DURATION_RATIO) / next.speed(HorseId(3))).floor();
        assert_eq!(cfb.end_tick, Some(1 + duration as u32));

        // Both in the pace phase with equal stats: the boosted horse moves twice as far
        let boosted = next.position(HorseId(3)) - 0.15;
        let normal = next.position(HorseId(2)) - 0.2;
        assert!((boosted - 2.0 * normal).abs() < 1e-12);
    }

    #[test]
    fn test_comeback_needs_leader_past_minimum() {
        let horses = field(4);
        let mut state = init_race_state(&horses, RaceType::Short);
        place(&mut state, 1, 0.3);

        let next = tick_race(&state, &horses, &mut StepRng::new(0, 0));
        assert!(!next.come_from_behind.has_been_used);
    }

    #[test]
    fn test_comeback_needs_three_runners() {
        let horses = field(2);
        let mut state = init_race_state(&horses, RaceType::Short);
        place(&mut state, 1, 0.6);
        place(&mut state, 2, 0.4);

        let next = tick_race(&state, &horses, &mut StepRng::new(0, 0));
        assert!(!next.come_from_behind.has_been_used);
    }

    #[test]
    fn test_comeback_expires_after_end_tick() {
        let horses = field(3);
        let mut state = init_race_state(&horses, RaceType::Short);
        state.tick = 5;
        state.come_from_behind = ComebackState {
            has_been_used: true,
            active_horse: Some(HorseId(2)),
            end_tick: Some(5),
        };

        let next = tick_race(&state, &horses, &mut StepRng::new(0, 0));
        assert_eq!(next.come_from_behind.active_horse, None);
        assert!(next.come_from_behind.has_been_used);
        assert_eq!(next.come_from_behind.end_tick, Some(5));
        // No boost: everyone moved the same distance
        assert_eq!(next.position(HorseId(1)), next.position(HorseId(2)));
    }

    #[test]
    fn test_comeback_still_applies_on_end_tick() {
        let horses = field(3);
        let mut state = init_race_state(&horses, RaceType::Short);
        state.tick = 4;
        state.come_from_behind = ComebackState {
            has_been_used: true,
            active_horse: Some(HorseId(2)),
            end_tick: Some(5),
        };

        let next = tick_race(&state, &horses, &mut StepRng::new(0, 0));
        assert_eq!(next.tick, 5);
        assert_eq!(next.come_from_behind.active_horse, Some(HorseId(2)));
        let boosted = next.position(HorseId(2));
        let normal = next.position(HorseId(1));
        assert!((boosted - 2.0 * normal).abs() < 1e-12);
    }

    #[test]
    fn test_runner_exactly_at_halfway_is_not_pulled() {
        let horses = field(3);
        let mut state = init_race_state(&horses, RaceType::Short);
        state.come_from_behind.has_been_used = true;
        place(&mut state, 1, 0.999);
        place(&mut state, 2, DNF_THRESHOLD);
        place(&mut state, 3, 0.1);
        // Stalled so the back markers sit exactly where they were placed
        state.speeds.insert(HorseId(2), 0.0);
        state.speeds.insert(HorseId(3), 0.0);

        let next = tick_race(&state, &horses, &mut StepRng::new(0, 0));
        assert_eq!(next.position(HorseId(2)), DNF_THRESHOLD);
        assert_eq!(next.finished, vec![HorseId(1)]);
        assert!(next.dnf.is_empty());
        assert!(!next.done);

        place(&mut state, 2, 0.4999);
        let next = tick_race(&state, &horses, &mut StepRng::new(0, 0));
        assert_eq!(next.dnf, vec![HorseId(2), HorseId(3)]);
        assert!(next.done);
    }

    #[test]
    fn test_done_race_is_unchanged() {
        let horses = field(1);
        let mut state = init_race_state(&horses, RaceType::Long);
        place(&mut state, 1, 1.0);
        state.finished.push(HorseId(1));
        state.done = true;

        let next = tick_race(&state, &horses, &mut StepRng::new(0, 0));
        assert_eq!(next, state);
    }

    #[test]
    fn test_snapshot_places_exclude_dnf() {
        let horses = field(3);
        let mut state = init_race_state(&horses, RaceType::Short);
        state.come_from_behind.has_been_used = true;
        place(&mut state, 1, 0.999);
        place(&mut state, 2, 0.3);
        place(&mut state, 3, 0.1);
        let next = tick_race(&state, &horses, &mut StepRng::new(0, 0));

        let snapshot = next.snapshot(&horses);
        assert_eq!(snapshot.status, RaceStatus::Done);
        assert_eq!(snapshot.finisher_count, 1);
        assert_eq!(snapshot.horses[0].place, Some(1));
        assert!(snapshot.horses[1].dnf);
        assert_eq!(snapshot.horses[1].place, None);
    }

    #[test]
    fn test_leader_ignores_finished_horses() {
        let horses = field(3);
        let mut state = init_race_state(&horses, RaceType::Short);
        place(&mut state, 1, 1.0);
        state.finished.push(HorseId(1));
        place(&mut state, 2, 0.7);
        place(&mut state, 3, 0.4);
        assert_eq!(state.leader(), Some(HorseId(2)));
    }

    #[test]
    fn test_race_invariants_hold_across_many_races() {
        for seed in 0..200 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let horses: Vec<Horse> = (1..=8)
                .map(|i| horse(i, rng.gen_range(1..=10), rng.gen_range(1..=10)))
                .collect();
            let race_type = RaceType::ALL[(seed % 3) as usize];
            let mut state = init_race_state(&horses, race_type);
            let mut boosted = HashSet::new();
            let mut ticks = 0;

            while !state.done {
                let next = tick_race(&state, &horses, &mut rng);
                for h in &horses {
                    let (before, after) = (state.position(h.id), next.position(h.id));
                    assert!(after >= before);
                    assert!((0.0..=1.0).contains(&after));
                }
                assert!(next.finished.starts_with(&state.finished));
                assert!(next.dnf.iter().all(|id| next.finished.contains(id)));
                assert_eq!(next.done, next.finished.len() == horses.len());
                if let Some(id) = next.come_from_behind.active_horse {
                    boosted.insert(id);
                }
                state = next;
                ticks += 1;
                assert!(ticks < 20_000, "race {} never finished", seed);
            }

            assert!(boosted.len() <= 1);
            let unique: HashSet<_> = state.finished.iter().collect();
            assert_eq!(unique.len(), horses.len());
            let outcome = state.outcome().expect("done");
            let winner = outcome.winner().expect("someone always finishes");
            assert!(!outcome.is_dnf(winner));
        }
    }
}

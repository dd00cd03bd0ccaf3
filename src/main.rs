//! Headless tournament driver
//!
//! Plays a full tournament with the human seat on autopilot and logs every
//! race. Usage: `derby [player-name] [ai-count] [--realtime]`

use std::thread;
use std::time::Duration;

use clap::Parser;
use derby_engine::config::{MAX_PLAYERS, RACE_UPDATE_INTERVAL_MS};
use derby_engine::{init_logging, GamePhase, GameSession, PlayerStore, RaceStatus, SessionError};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(author, version, about = "Play a headless horse racing tournament", long_about = None)]
struct Args {
    /// Name of the human player
    #[arg(default_value = "Player")]
    player_name: String,

    /// Number of AI opponents
    #[arg(default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..MAX_PLAYERS as i64))]
    ai_count: u8,

    /// Tick at the real race interval instead of as fast as possible
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<(), SessionError> {
    init_logging();
    let args = Args::parse();
    let player_name = args.player_name.as_str();

    let store = PlayerStore::default_location();
    if let Some(saved) = store.as_ref().and_then(|s| s.load()) {
        log::info!("Last session: {} finished with {} bux", saved.player_name, saved.bux);
    }

    let mut session = GameSession::new(player_name, usize::from(args.ai_count), StdRng::from_entropy());
    if let Some(store) = store {
        session = session.with_store(store);
    }

    while session.phase() != GamePhase::GameOver {
        let tournament = session.tournament();
        if tournament.human_is_bust() {
            log::info!("{} is bust", player_name);
            session.forfeit();
            break;
        }

        if let Some(human) = tournament.human() {
            let (balance, owed) = (human.balance, human.loan_balance);
            let available = tournament.loan_available();
            if balance == 0 && available > 0 {
                session.take_loan(available)?;
            } else if owed > 0 && balance > owed * 2 {
                session.repay_loan(owed)?;
            }
        }

        let bet = session.suggest_bet();
        session.place_bets(bet)?;

        if args.realtime {
            while let Some(snapshot) = session.tick() {
                if snapshot.status == RaceStatus::Done {
                    break;
                }
                thread::sleep(Duration::from_millis(RACE_UPDATE_INTERVAL_MS));
            }
        } else {
            session.run_race();
        }

        if let Some(result) = &session.tournament().last_result {
            let placings: Vec<&str> = result.placings().iter().map(|h| h.name.as_str()).collect();
            log::info!(
                "Day {} race {} ({} {}f): {} | DNF: {}",
                result.day,
                result.race_number,
                result.race_type,
                result.distance,
                placings.join(", "),
                result.outcome.dnf.len()
            );
        }

        session.next_race()?;
    }

    let stats = session.stats();
    log::info!(
        "{} races, {} ticks, {:.3}ms average tick",
        stats.races_run,
        stats.ticks_run,
        stats.avg_tick_time_ms
    );
    for (rank, player) in session.tournament().standings().iter().enumerate() {
        log::info!(
            "#{} {}{}: {} bux, {} wins, +{} / -{}, owes {}",
            rank + 1,
            player.name,
            if player.is_human { " (you)" } else { "" },
            player.balance,
            player.wins,
            player.total_won,
            player.total_lost,
            player.loan_balance
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["derby"]).unwrap();
        assert_eq!(args.player_name, "Player");
        assert_eq!(args.ai_count, 3);
        assert!(!args.realtime);
    }

    #[test]
    fn test_args_positional_and_flag() {
        let args = Args::try_parse_from(["derby", "Ada", "1", "--realtime"]).unwrap();
        assert_eq!(args.player_name, "Ada");
        assert_eq!(args.ai_count, 1);
        assert!(args.realtime);
    }

    #[test]
    fn test_args_reject_bad_ai_count() {
        assert!(Args::try_parse_from(["derby", "Ada", "five"]).is_err());
        assert!(Args::try_parse_from(["derby", "Ada", "4"]).is_err());
    }

    #[test]
    fn test_help_is_not_a_tournament() {
        let err = Args::try_parse_from(["derby", "--help"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}

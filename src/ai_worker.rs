//! # Background computer moves
//!
//! Search runs on the blocking pool against a snapshot of the session, so
//! the table stays responsive while the computer thinks. When the result
//! comes back it is only played if the session is still where it was when
//! the search started; otherwise the result is stale and dropped.

use crate::config::StrategyConfig;
use crate::error::EngineError;
use crate::game_wrapper::{GameWrapper, MoveWrapper};
use crate::lobby::SharedSession;
use crate::Outcome;
use tracing::{debug, warn};

/// Picks and plays a computer move without holding the session lock during search.
pub async fn request_cpu_move_async(
    session: SharedSession,
    strategy: StrategyConfig,
) -> Result<(MoveWrapper, GameWrapper, Outcome), EngineError> {
    let (snapshot, revision) = {
        let guard = session.lock();
        if guard.state().is_terminal() {
            return Err(EngineError::GameOver);
        }
        if !guard.is_cpu_turn() {
            return Err(EngineError::NotCpuTurn);
        }
        (guard.state().clone(), guard.revision())
    };

    let searched = snapshot.clone();
    let mv = match tokio::task::spawn_blocking(move || searched.select_move(&strategy)).await {
        Ok(result) => result?,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => return Err(EngineError::StateChanged),
    };

    let mut guard = session.lock();
    if guard.revision() != revision || guard.state() != &snapshot {
        warn!(game = snapshot.id(), %mv, "discarding stale computer move");
        return Err(EngineError::StateChanged);
    }
    guard.play(mv.clone())?;
    debug!(game = snapshot.id(), %mv, "background move played");
    let state = guard.state().clone();
    let outcome = state.outcome();
    Ok((mv, state, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::lobby::SessionTable;
    use crate::Player;

    #[tokio::test]
    async fn plays_for_the_cpu_seat() {
        let table = SessionTable::default();
        let config = SessionConfig {
            cpu_seats: vec![Player::First],
            ..SessionConfig::default()
        };
        let shared = table.open("w-1", "tic-tac-toe", &config).unwrap();
        let (mv, state, outcome) = request_cpu_move_async(shared.clone(), StrategyConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::InProgress);
        assert_eq!(shared.lock().history()[0].move_made, mv);
        assert_eq!(shared.lock().state(), &state);
        assert_eq!(
            request_cpu_move_async(shared, StrategyConfig::default()).await,
            Err(EngineError::NotCpuTurn)
        );
    }
}

//! Engine registry and the uniform control surface a board UI holds.
//!
//! The registry maps a game identifier to the function that builds its
//! starting position; everything after that goes through the session's
//! wrapped state, so no game type leaks out of here.

use crate::config::{SessionConfig, StrategyConfig};
use crate::error::EngineError;
use crate::game_controller::Session;
use crate::game_wrapper::{self, GameWrapper, MoveWrapper, StartFn};
use crate::Outcome;
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// One registered game.
#[derive(Clone, Copy)]
pub struct EngineEntry {
    pub id: &'static str,
    pub title: &'static str,
    pub start: StartFn,
}

impl std::fmt::Debug for EngineEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineEntry").field("id", &self.id).field("title", &self.title).finish()
    }
}

/// Game identifier to engine.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    engines: BTreeMap<&'static str, EngineEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every game this crate implements.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for (id, title, start) in game_wrapper::catalogue() {
            registry.register(EngineEntry { id, title, start });
        }
        registry
    }

    /// Adds or replaces an engine under its id.
    pub fn register(&mut self, entry: EngineEntry) {
        self.engines.insert(entry.id, entry);
    }

    pub fn get(&self, id: &str) -> Result<&EngineEntry, EngineError> {
        self.engines.get(id).ok_or_else(|| EngineError::UnknownGame(id.to_string()))
    }

    /// Registered identifiers in sorted order.
    pub fn ids(&self) -> Vec<&'static str> {
        self.engines.keys().copied().collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &EngineEntry> {
        self.engines.values()
    }
}

/// Starts sessions and routes moves to their engine.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Registry,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Registry::standard())
    }
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// `(id, title)` of every registered game.
    pub fn games(&self) -> Vec<(&'static str, &'static str)> {
        self.registry.entries().map(|e| (e.id, e.title)).collect()
    }

    /// Builds the initial position of `game_id`. Bad setup options fail here,
    /// never mid-game.
    #[instrument(skip(self, config), fields(seed = config.game.seed))]
    pub fn start(&self, game_id: &str, config: &SessionConfig) -> Result<Session, EngineError> {
        let entry = self.registry.get(game_id)?;
        let state = (entry.start)(&config.game)?;
        info!(game = entry.id, cpu_seats = ?config.cpu_seats, "session started");
        Ok(Session::new(state, config.cpu_seats.clone()))
    }

    /// Plays a move for the side to move.
    #[instrument(skip_all, fields(game = session.state().id(), mv = %mv))]
    pub fn submit_move(&self, session: &mut Session, mv: MoveWrapper) -> Result<(GameWrapper, Outcome), EngineError> {
        let state = session.play(mv)?.clone();
        let outcome = state.outcome();
        Ok((state, outcome))
    }

    /// Lets the computer move for the seat to move.
    #[instrument(skip_all, fields(game = session.state().id()))]
    pub fn request_cpu_move(
        &self,
        session: &mut Session,
        strategy: &StrategyConfig,
    ) -> Result<(MoveWrapper, GameWrapper, Outcome), EngineError> {
        let mv = session.play_cpu(strategy)?;
        let state = session.state().clone();
        let outcome = state.outcome();
        Ok((mv, state, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_lists_every_game() {
        let registry = Registry::standard();
        assert_eq!(registry.ids().len(), 22);
        assert!(registry.get("chess").is_ok());
        assert!(registry.get("2048").is_ok());
        assert!(matches!(registry.get("tetris"), Err(EngineError::UnknownGame(_))));
    }

    #[test]
    fn custom_registry_only_knows_its_games() {
        let standard = Registry::standard();
        let mut registry = Registry::new();
        registry.register(*standard.get("hex").unwrap());
        let dispatcher = Dispatcher::new(registry);
        assert!(dispatcher.start("hex", &SessionConfig::default()).is_ok());
        assert!(matches!(
            dispatcher.start("go", &SessionConfig::default()),
            Err(EngineError::UnknownGame(_))
        ));
    }
}

//! Error taxonomy shared by every engine, the session layer and the dispatcher.
//!
//! Every variant is local and recoverable: an operation that fails leaves the
//! session exactly as it was before the call. Only `InvalidConfig` is raised
//! at session start; everything else surfaces mid-game.

/// Errors reported by the engine layer.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum EngineError {
    /// No engine is registered under the requested identifier.
    #[display("unknown game '{}'", _0)]
    UnknownGame(String),

    /// The move is not in the legal move set of the current state.
    #[display("illegal move: {}", _0)]
    IllegalMove(String),

    /// The game already reached a terminal outcome.
    #[display("game is already over")]
    GameOver,

    /// A computer move was requested while a human seat is to move.
    #[display("it is not the computer's turn")]
    NotCpuTurn,

    /// The setup options cannot produce a valid initial position.
    #[display("invalid configuration: {}", _0)]
    InvalidConfig(String),

    /// A background search finished after the session had already moved on.
    #[display("session state changed while the computer was thinking")]
    StateChanged,

    /// No session is open under the given token.
    #[display("unknown session '{}'", _0)]
    UnknownSession(String),
}

impl std::error::Error for EngineError {}

impl EngineError {
    /// Shorthand for building an `IllegalMove` from any debuggable move.
    pub fn illegal<M: std::fmt::Debug>(mv: &M) -> Self {
        EngineError::IllegalMove(format!("{:?}", mv))
    }

    /// Shorthand for building an `InvalidConfig`.
    pub fn config(reason: impl Into<String>) -> Self {
        EngineError::InvalidConfig(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        assert_eq!(
            EngineError::UnknownGame("go-moku".into()).to_string(),
            "unknown game 'go-moku'"
        );
        assert_eq!(EngineError::GameOver.to_string(), "game is already over");
        assert_eq!(
            EngineError::illegal(&(3usize, 4usize)).to_string(),
            "illegal move: (3, 4)"
        );
    }
}

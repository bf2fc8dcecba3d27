//! Glue between the invite/presence layer and the engine.
//!
//! Invites are plain records; once one is accepted, both parties resolve
//! the same session through its token. The accept notification is a
//! one-shot message, so nobody has to poll.

use crate::config::SessionConfig;
use crate::dispatcher::Dispatcher;
use crate::error::EngineError;
use crate::game_controller::Session;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// A session shared between the players at one table.
pub type SharedSession = Arc<Mutex<Session>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InviteStatus {
    Pending,
    Accepted,
    Declined,
}

/// What the invite store hands over; the engine only reads `game_id` and `token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteRecord {
    pub sender: String,
    pub receiver: String,
    pub game_id: String,
    pub board_path: String,
    pub token: String,
    pub status: InviteStatus,
}

impl InviteRecord {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        game_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let game_id = game_id.into();
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            board_path: format!("/games/{}", game_id),
            game_id,
            token: token.into(),
            status: InviteStatus::Pending,
        }
    }

    pub fn accept(&mut self) {
        self.status = InviteStatus::Accepted;
    }

    pub fn decline(&mut self) {
        self.status = InviteStatus::Declined;
    }
}

/// The sender's half of an invite: fires once with the answered record.
#[derive(Debug)]
pub struct InviteNotifier(oneshot::Sender<InviteRecord>);

impl InviteNotifier {
    /// Delivers the answer. Returns the record back if the waiting side is gone.
    pub fn answer(self, record: InviteRecord) -> Result<(), InviteRecord> {
        self.0.send(record)
    }
}

/// One-shot channel for an invite answer.
pub fn invite_channel() -> (InviteNotifier, oneshot::Receiver<InviteRecord>) {
    let (tx, rx) = oneshot::channel();
    (InviteNotifier(tx), rx)
}

/// Open sessions by token.
#[derive(Debug, Default)]
pub struct SessionTable {
    dispatcher: Dispatcher,
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl SessionTable {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Starts a session under `token`, or returns the one already open there.
    pub fn open(&self, token: &str, game_id: &str, config: &SessionConfig) -> Result<SharedSession, EngineError> {
        let mut sessions = self.sessions.lock();
        if let Some(existing) = sessions.get(token) {
            return Ok(Arc::clone(existing));
        }
        let session = Arc::new(Mutex::new(self.dispatcher.start(game_id, config)?));
        sessions.insert(token.to_string(), Arc::clone(&session));
        info!(token, game = game_id, "table opened");
        Ok(session)
    }

    pub fn resolve(&self, token: &str) -> Result<SharedSession, EngineError> {
        self.sessions
            .lock()
            .get(token)
            .cloned()
            .ok_or_else(|| EngineError::UnknownSession(token.to_string()))
    }

    pub fn close(&self, token: &str) -> Result<(), EngineError> {
        self.sessions
            .lock()
            .remove(token)
            .map(|_| debug!(token, "table closed"))
            .ok_or_else(|| EngineError::UnknownSession(token.to_string()))
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Opens the table for an accepted invite. Both players calling this get
    /// the same session; the computer holds no seat.
    pub fn join_accepted(&self, record: &InviteRecord) -> Result<SharedSession, EngineError> {
        if record.status != InviteStatus::Accepted {
            return Err(EngineError::config(format!("invite {} is not accepted", record.token)));
        }
        let config = SessionConfig {
            cpu_seats: Vec::new(),
            ..SessionConfig::default()
        };
        self.open(&record.token, &record.game_id, &config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_players_get_the_same_table() {
        let table = SessionTable::default();
        let mut invite = InviteRecord::new("ana", "bo", "connect-four", "t-1");
        assert!(table.join_accepted(&invite).is_err());
        invite.accept();
        let a = table.join_accepted(&invite).unwrap();
        let b = table.join_accepted(&invite).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 1);
        assert!(!a.lock().is_cpu_turn());
    }

    #[test]
    fn closed_tables_are_gone() {
        let table = SessionTable::default();
        table.open("t-2", "go", &SessionConfig::default()).unwrap();
        assert!(table.resolve("t-2").is_ok());
        table.close("t-2").unwrap();
        assert_eq!(table.resolve("t-2").err(), Some(EngineError::UnknownSession("t-2".into())));
        assert_eq!(table.close("t-2"), Err(EngineError::UnknownSession("t-2".into())));
    }

    #[test]
    fn unknown_game_opens_nothing() {
        let table = SessionTable::default();
        assert!(matches!(
            table.open("t-3", "snakes", &SessionConfig::default()),
            Err(EngineError::UnknownGame(_))
        ));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn accepted_invite_arrives_once() {
        let (notifier, waiting) = invite_channel();
        let mut invite = InviteRecord::new("ana", "bo", "hex", "t-4");
        invite.accept();
        notifier.answer(invite.clone()).unwrap();
        let received = waiting.await.unwrap();
        assert_eq!(received, invite);
        assert_eq!(received.board_path, "/games/hex");
    }
}

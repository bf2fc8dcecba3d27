use lobby::ai_worker::request_cpu_move_async;
use lobby::lobby::{invite_channel, InviteRecord, InviteStatus, SessionTable};
use lobby::{EngineError, Player, SessionConfig, StrategyConfig};

fn cpu_everywhere() -> SessionConfig {
    SessionConfig {
        cpu_seats: vec![Player::First, Player::Second],
        ..SessionConfig::default()
    }
}

#[tokio::test]
async fn stale_search_is_discarded() {
    let table = SessionTable::default();
    let shared = table.open("stale", "connect-four", &cpu_everywhere()).unwrap();
    let worker = tokio::spawn(request_cpu_move_async(shared.clone(), StrategyConfig::default()));
    // Let the worker take its snapshot before the board moves under it.
    tokio::task::yield_now().await;
    {
        let mut session = shared.lock();
        let mv = session.legal_moves()[0].clone();
        session.play(mv).unwrap();
    }
    assert_eq!(worker.await.unwrap(), Err(EngineError::StateChanged));
    assert_eq!(shared.lock().history().len(), 1);
}

#[tokio::test]
async fn racing_workers_commit_once() {
    let table = SessionTable::default();
    let shared = table.open("race", "tic-tac-toe", &cpu_everywhere()).unwrap();
    let a = tokio::spawn(request_cpu_move_async(shared.clone(), StrategyConfig::default()));
    let b = tokio::spawn(request_cpu_move_async(shared.clone(), StrategyConfig::default()));
    tokio::task::yield_now().await;
    let results = [a.await.unwrap(), b.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.contains(&Err(EngineError::StateChanged)));
    assert_eq!(shared.lock().revision(), 1);
}

#[tokio::test]
async fn accepted_invite_leads_both_players_to_one_board() {
    let table = SessionTable::default();
    let (notifier, answer) = invite_channel();
    let invite = InviteRecord::new("guest-17", "guest-42", "tic-tac-toe", "tok-9");
    assert_eq!(invite.status, InviteStatus::Pending);

    let mut reply = invite.clone();
    tokio::spawn(async move {
        reply.accept();
        let _ = notifier.answer(reply);
    });
    let accepted = answer.await.unwrap();
    assert_eq!(accepted.status, InviteStatus::Accepted);

    let sender_side = table.join_accepted(&accepted).unwrap();
    let receiver_side = table.join_accepted(&accepted).unwrap();
    {
        let mut session = sender_side.lock();
        let mv = session.legal_moves()[4].clone();
        session.play(mv).unwrap();
    }
    assert_eq!(receiver_side.lock().revision(), 1);
    assert_eq!(
        request_cpu_move_async(receiver_side, StrategyConfig::default()).await,
        Err(EngineError::NotCpuTurn)
    );

    let mut declined = invite;
    declined.decline();
    assert!(matches!(table.join_accepted(&declined), Err(EngineError::InvalidConfig(_))));
    table.close("tok-9").unwrap();
    assert!(table.resolve("tok-9").is_err());
}

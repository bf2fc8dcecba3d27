use lobby::games::connect4::Connect4Move;
use lobby::games::tictactoe::TicTacToeMove;
use lobby::{Dispatcher, EngineError, GameConfig, MoveWrapper, Outcome, Player, SessionConfig, StrategyConfig};

fn ttt(r: usize, c: usize) -> MoveWrapper {
    MoveWrapper::TicTacToe(TicTacToeMove(r, c))
}

#[test]
fn every_registered_game_starts() {
    let dispatcher = Dispatcher::default();
    let games = dispatcher.games();
    assert_eq!(games.len(), 22);
    for (id, title) in games {
        let session = dispatcher.start(id, &SessionConfig::default()).unwrap();
        assert_eq!(session.state().id(), id);
        assert_eq!(session.state().title(), title);
        assert_eq!(session.outcome(), Outcome::InProgress, "{} starts finished", id);
        assert!(!session.legal_moves().is_empty(), "{} starts with no moves", id);
    }
}

#[test]
fn unknown_game_is_rejected() {
    let dispatcher = Dispatcher::default();
    assert_eq!(
        dispatcher.start("parcheesi", &SessionConfig::default()).err(),
        Some(EngineError::UnknownGame("parcheesi".into()))
    );
}

#[test]
fn bad_setup_fails_at_start() {
    let dispatcher = Dispatcher::default();
    let config = SessionConfig {
        game: GameConfig::default().with_board_size(40),
        ..SessionConfig::default()
    };
    assert!(matches!(dispatcher.start("hex", &config), Err(EngineError::InvalidConfig(_))));
    assert!(matches!(dispatcher.start("go", &config), Err(EngineError::InvalidConfig(_))));

    let setups = [
        ("shogi", "lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b 300P 1"),
        ("shogi", "lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b 200P200P 1"),
        ("chess", "4k3/8/8/8/8/8/8/4K3 w - - 99999999999999999999 1"),
    ];
    for (id, variant) in setups {
        let config = SessionConfig {
            game: GameConfig {
                variant: Some(variant.to_string()),
                ..GameConfig::default()
            },
            ..SessionConfig::default()
        };
        assert!(
            matches!(dispatcher.start(id, &config), Err(EngineError::InvalidConfig(_))),
            "{} accepted '{}'",
            id,
            variant
        );
    }
}

#[test]
fn tic_tac_toe_top_row() {
    let dispatcher = Dispatcher::default();
    let mut session = dispatcher.start("tic-tac-toe", &SessionConfig::default()).unwrap();
    let mut last = Outcome::InProgress;
    for mv in [ttt(0, 0), ttt(1, 1), ttt(0, 1), ttt(2, 2), ttt(0, 2)] {
        let (_, outcome) = dispatcher.submit_move(&mut session, mv).unwrap();
        last = outcome;
    }
    assert_eq!(last, Outcome::Win(Player::First));
    assert!(session.legal_moves().is_empty());

    let before = session.clone();
    assert_eq!(dispatcher.submit_move(&mut session, ttt(2, 0)).err(), Some(EngineError::GameOver));
    assert_eq!(
        dispatcher.request_cpu_move(&mut session, &StrategyConfig::default()).err(),
        Some(EngineError::GameOver)
    );
    assert_eq!(session, before);
}

#[test]
fn refused_moves_leave_the_session_alone() {
    let dispatcher = Dispatcher::default();
    let mut session = dispatcher.start("tic-tac-toe", &SessionConfig::default()).unwrap();
    dispatcher.submit_move(&mut session, ttt(1, 1)).unwrap();
    let before = session.clone();

    assert!(matches!(
        dispatcher.submit_move(&mut session, ttt(1, 1)),
        Err(EngineError::IllegalMove(_))
    ));
    assert!(matches!(
        dispatcher.submit_move(&mut session, ttt(5, 5)),
        Err(EngineError::IllegalMove(_))
    ));
    assert!(matches!(
        dispatcher.submit_move(&mut session, MoveWrapper::Connect4(Connect4Move(3))),
        Err(EngineError::IllegalMove(_))
    ));
    assert_eq!(session, before);
}

#[test]
fn cpu_moves_only_on_its_seats() {
    let dispatcher = Dispatcher::default();
    let strategy = StrategyConfig::default();
    let mut session = dispatcher.start("connect-four", &SessionConfig::default()).unwrap();

    assert_eq!(
        dispatcher.request_cpu_move(&mut session, &strategy).err(),
        Some(EngineError::NotCpuTurn)
    );
    assert_eq!(session.revision(), 0);

    dispatcher
        .submit_move(&mut session, MoveWrapper::Connect4(Connect4Move(3)))
        .unwrap();
    let (mv, state, outcome) = dispatcher.request_cpu_move(&mut session, &strategy).unwrap();
    assert_eq!(&state, session.state());
    assert_eq!(outcome, Outcome::InProgress);
    assert_eq!(session.history()[1].move_made, mv);
    assert_eq!(state.current_player(), Player::First);
}

#[test]
fn solitaire_games_play_on_the_solo_seat() {
    let dispatcher = Dispatcher::default();
    let config = SessionConfig {
        game: GameConfig::seeded(5),
        cpu_seats: vec![Player::Solo],
    };
    for id in ["lights-out", "2048", "mahjong"] {
        let mut session = dispatcher.start(id, &config).unwrap();
        assert_eq!(session.state().current_player(), Player::Solo);
        let (mv, _, _) = dispatcher
            .request_cpu_move(&mut session, &StrategyConfig::default())
            .unwrap();
        assert_eq!(mv.game_id(), id);
    }
}

#[test]
fn same_seed_same_game() {
    let dispatcher = Dispatcher::default();
    let config = SessionConfig {
        game: GameConfig::seeded(11),
        cpu_seats: vec![Player::First, Player::Second],
    };
    let strategy = StrategyConfig::default().with_seed(3);
    let mut traces = Vec::new();
    for _ in 0..2 {
        let mut session = dispatcher.start("backgammon", &config).unwrap();
        for _ in 0..12 {
            if session.state().is_terminal() {
                break;
            }
            dispatcher.request_cpu_move(&mut session, &strategy).unwrap();
        }
        traces.push(session.to_json().unwrap());
    }
    assert_eq!(traces[0], traces[1]);
}

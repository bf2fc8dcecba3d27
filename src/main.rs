//! # Lobby Engines - terminal driver
//!
//! Plays any registered game in the terminal, human against computer or
//! computer against itself.
//!
//! ## Usage
//! ```text
//! play --list
//! play --game chess --difficulty hard --human-first
//! play --game 2048 --ai-only --seed 7
//! ```
//! Set `RUST_LOG=debug` to watch moves and search statistics.

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use lobby::{Difficulty, Dispatcher, GameWrapper, MoveWrapper, Player, Session, SessionConfig, StrategyConfig};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// List the available games and exit.
    #[clap(long, action = clap::ArgAction::SetTrue)]
    list: bool,

    #[clap(short, long)]
    game: Option<String>,

    #[clap(short, long)]
    board_size: Option<usize>,

    #[clap(short, long)]
    seed: Option<u64>,

    /// Search depth for minimax opponents.
    #[clap(short, long)]
    depth: Option<u8>,

    #[clap(long, default_value = "medium")]
    difficulty: Difficulty,

    /// The computer plays every seat.
    #[clap(long, action = clap::ArgAction::SetTrue)]
    ai_only: bool,

    /// The human takes the first seat instead of the second.
    #[clap(long, action = clap::ArgAction::SetTrue)]
    human_first: bool,

    /// JSON session config; flags given on the command line take precedence.
    #[clap(long)]
    config: Option<std::path::PathBuf>,

    /// Stop after this many moves.
    #[clap(long, default_value_t = 500)]
    max_turns: usize,
}

fn session_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SessionConfig::default(),
    };
    if let Some(size) = args.board_size {
        config.game.board_size = Some(size);
    }
    if let Some(seed) = args.seed {
        config.game.seed = seed;
    }
    if args.ai_only {
        config.cpu_seats = vec![Player::First, Player::Second, Player::Solo];
    } else if args.human_first || args.config.is_none() {
        config.cpu_seats = if args.human_first {
            vec![Player::Second]
        } else {
            vec![Player::First]
        };
    }
    Ok(config)
}

fn strategy(args: &Args, seed: u64) -> StrategyConfig {
    let mut strategy = StrategyConfig::for_difficulty(args.difficulty).with_seed(seed);
    if let Some(depth) = args.depth {
        strategy = strategy.with_depth(depth);
    }
    strategy
}

fn print_board(state: &GameWrapper) {
    println!("\n{}", state);
    println!("{} to move", state.current_player().to_string().bold());
}

fn read_human_move(input: &mut impl BufRead, moves: &[MoveWrapper]) -> Result<MoveWrapper> {
    for (i, mv) in moves.iter().enumerate() {
        print!("{:>4}: {:<14}", i, mv.to_string());
        if i % 5 == 4 {
            println!();
        }
    }
    println!();
    loop {
        print!("{} ", "move #>".cyan());
        io::stdout().flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("input closed");
        }
        match line.trim().parse::<usize>() {
            Ok(i) if i < moves.len() => return Ok(moves[i].clone()),
            _ => println!("{}", format!("enter a number from 0 to {}", moves.len() - 1).red()),
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let dispatcher = Dispatcher::default();
    if args.list {
        println!("{}", "Available games".bold().underline());
        for (id, title) in dispatcher.games() {
            println!("  {:<22} {}", id.green(), title);
        }
        return Ok(());
    }
    let Some(game) = args.game.as_deref() else {
        bail!("no game given; run with --list to see the choices");
    };
    let config = session_config(args)?;
    let strategy = strategy(args, config.game.seed);
    let mut session: Session = dispatcher.start(game, &config)?;
    println!("{}", session.state().title().bold().yellow());

    let stdin = io::stdin();
    let mut input = stdin.lock();
    for _ in 0..args.max_turns {
        if session.state().is_terminal() {
            break;
        }
        print_board(session.state());
        if session.is_cpu_turn() {
            let (mv, _, _) = dispatcher.request_cpu_move(&mut session, &strategy)?;
            println!("{} {}", "computer plays".magenta(), mv);
        } else {
            let moves = session.legal_moves();
            let mv = read_human_move(&mut input, &moves)?;
            dispatcher.submit_move(&mut session, mv)?;
        }
    }

    print_board(session.state());
    let outcome = session.outcome();
    if outcome.is_terminal() {
        println!("{}", outcome.to_string().bold().green());
    } else {
        println!("{}", format!("stopped after {} moves", args.max_turns).yellow());
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();
    run(&args)
}

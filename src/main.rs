//! Stack4: an MCTS player for 3D four-in-a-row.
//!
//! ## Usage
//!
//! - `stack4` - Show a demo
//! - `stack4 protocol` - Serve the text protocol on stdin/stdout
//! - `stack4 selfplay` - Let the engine play both sides
//! - `stack4 demo` - Run the demo

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

use stack4::board::{Board, Move, Player};
use stack4::config::{Difficulty, SearchConfig};
use stack4::engine::{apply_and_evaluate, decide, Outcome};
use stack4::protocol::ProtocolEngine;

/// Stack4: an MCTS player for 3D four-in-a-row
#[derive(Parser)]
#[command(name = "stack4")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Search preset: easy, medium or hard
    #[arg(short, long, global = true)]
    difficulty: Option<Difficulty>,

    /// Simulations per move (overrides the preset)
    #[arg(short, long, global = true)]
    simulations: Option<u32>,

    /// UCB1 exploration constant (overrides the preset)
    #[arg(short, long, global = true)]
    exploration: Option<f64>,

    /// Seed for the random generator
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log search decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the line-oriented text protocol on stdin/stdout
    Protocol,
    /// Let the engine play both sides of a game
    Selfplay,
    /// Run a simple demo of the engine
    Demo,
}

impl Cli {
    fn search_config(&self) -> Result<SearchConfig> {
        let base = match self.difficulty {
            Some(d) => d.config(),
            None => SearchConfig::default(),
        };
        let simulations = self.simulations.unwrap_or(base.simulations());
        let exploration = self.exploration.unwrap_or(base.exploration());
        SearchConfig::new(simulations, exploration).context("invalid search settings")
    }

    fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let config = cli.search_config()?;
    let mut rng = cli.rng();

    match cli.command {
        Some(Commands::Protocol) => {
            let mut engine = ProtocolEngine::with_config(config, rng);
            engine.run().context("protocol I/O failed")?;
        }
        Some(Commands::Selfplay) => run_selfplay(&config, &mut rng)?,
        Some(Commands::Demo) | None => run_demo(&config, &mut rng)?,
    }
    Ok(())
}

fn run_selfplay(config: &SearchConfig, rng: &mut fastrand::Rng) -> Result<()> {
    info!("self-play with {config:?}");
    let mut board = Board::new();
    let mut player = Player::One;
    let mut turn = 1;

    let outcome = loop {
        let decision = decide(&board, player, config, rng).context("engine could not move")?;
        let (next, outcome) = apply_and_evaluate(&board, decision.mv, player);
        println!("{turn:>2}. player {player}: {}  ({:?})", decision.mv, decision.reason);
        board = next;
        if outcome.is_over() {
            break outcome;
        }
        player = player.opponent();
        turn += 1;
    };

    println!("\n{board}");
    match outcome {
        Outcome::Win(p) => println!("Player {p} wins after {turn} moves"),
        _ => println!("Draw after {turn} moves"),
    }
    Ok(())
}

fn run_demo(config: &SearchConfig, rng: &mut fastrand::Rng) -> Result<()> {
    println!("Stack4: MCTS player for 3D four-in-a-row\n");

    // Demo 1: search from an empty board
    println!("=== Opening Move ===");
    println!("Running {} simulations...", config.simulations());
    let decision = decide(&Board::new(), Player::One, config, rng)?;
    println!("Best move: {}  ({:?})\n", decision.mv, decision.reason);

    // Demo 2: player 2 threatens a row; player 1 must block
    println!("=== Forced Block ===");
    let mut board = Board::new();
    for (mv, player) in [
        (Move::new(0, 0, 0), Player::One),
        (Move::new(1, 0, 0), Player::Two),
        (Move::new(3, 3, 0), Player::One),
        (Move::new(1, 1, 0), Player::Two),
        (Move::new(3, 2, 0), Player::One),
        (Move::new(1, 2, 0), Player::Two),
    ] {
        board = apply_and_evaluate(&board, mv, player).0;
    }
    print!("{board}");
    let decision = decide(&board, Player::One, config, rng)?;
    println!("Player 1 plays {}  ({:?})", decision.mv, decision.reason);
    Ok(())
}

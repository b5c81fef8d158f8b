use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lookahead_2048::engine::Board;
use lookahead_2048::game::Game;
use lookahead_2048::lookahead::{Lookahead, LookaheadParallel, Recommender, SearchConfig};

#[derive(Parser, Debug)]
#[command(name = "lookahead-2048", version, about = "Play 2048 with the heuristic lookahead")]
struct Args {
    /// Board side length
    #[arg(long, default_value_t = Board::DEFAULT_SIZE)]
    size: usize,
    /// RNG seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Player plies searched per move
    #[arg(long, default_value_t = 3)]
    depth: u32,
    /// Per-move search budget in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,
    /// Search first moves on the rayon pool
    #[arg(long)]
    parallel: bool,
    /// Stop after this many moves
    #[arg(long)]
    max_moves: Option<u64>,
    /// Show a status line instead of printing every board
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let cfg = SearchConfig { depth: args.depth, deadline_ms: args.deadline_ms, ..SearchConfig::default() };
    let mut policy: Box<dyn Recommender> = if args.parallel {
        Box::new(LookaheadParallel::with_config(cfg).context("invalid search settings")?)
    } else {
        Box::new(Lookahead::with_config(cfg).context("invalid search settings")?)
    };
    let mut game = Game::new(args.size, seed).context("invalid board size")?;
    info!(size = args.size, seed, depth = args.depth, parallel = args.parallel, "starting game");

    let pb = if args.quiet {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} | Moves: {msg}")?
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        println!("{}", game.board());
        None
    };

    let start = Instant::now();
    let mut total_nodes: u64 = 0;
    let mut peak_nodes: u64 = 0;
    while !game.is_over() {
        if args.max_moves.is_some_and(|cap| game.moves() >= cap) {
            break;
        }
        let Some((dir, _)) = game.step_with(policy.as_mut()) else {
            break;
        };
        let stats = policy.last_stats();
        total_nodes = total_nodes.saturating_add(stats.nodes);
        peak_nodes = peak_nodes.max(stats.nodes);
        match &pb {
            Some(pb) => pb.set_message(format!("{} | score: {}", game.moves(), game.score())),
            None => println!("{dir}\n{}", game.board()),
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let elapsed = start.elapsed().as_secs_f64().max(1e-6);
    info!(
        moves = game.moves(),
        score = game.score(),
        highest_tile = game.board().highest_tile(),
        moves_per_sec = game.moves() as f64 / elapsed,
        "finished"
    );
    println!(
        "Moves made: {}, States considered: {}, Max states considered for a move: {}",
        game.moves(),
        total_nodes,
        peak_nodes
    );
    Ok(())
}

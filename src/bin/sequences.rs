use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lookahead_2048::engine::Board;
use lookahead_2048::sequences::{enumerate_sequences, write_sequences};

#[derive(Parser, Debug)]
#[command(
    name = "sequences",
    version,
    about = "Dump every playable fixed-length move sequence from a start board"
)]
struct Cli {
    /// Start board: rows separated by '/', cells by ','
    #[arg(short = 'b', long = "board", default_value = "2,4,0,0/4,0,0,0/0,0,0,0/0,0,0,0")]
    board: String,
    /// Number of moves per sequence
    #[arg(short = 'n', long = "length", default_value_t = 5)]
    length: usize,
    /// Output file
    #[arg(short = 'o', long = "out", value_name = "FILE", default_value = "sequences.txt")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let start: Board = cli.board.parse().with_context(|| format!("bad start board '{}'", cli.board))?;
    let records = enumerate_sequences(&start, cli.length);
    info!(length = cli.length, kept = records.len(), of = 4u64.saturating_pow(cli.length as u32), "enumerated sequences");

    let file = File::create(&cli.out).with_context(|| format!("creating {}", cli.out.display()))?;
    write_sequences(BufWriter::new(file), &records).with_context(|| format!("writing {}", cli.out.display()))?;
    info!(path = %cli.out.display(), "wrote dump");
    Ok(())
}

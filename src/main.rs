use std::io;

use chessboard::view::Orientation;
use chessboard::{Controller, Shell};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Interactive chessboard driven by text commands from stdin: `click <sq>`,
/// `drag <sq>`, `enddrag`, `drop <from> <to>`, `flip`, `fen`, `turn`,
/// `status`, `d`, `moves` and `quit`.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Config {
    /// Starting position in Forsyth-Edwards Notation.
    #[arg(long)]
    fen: Option<String>,
    /// Color at the bottom of the board: white or black.
    #[arg(long, default_value = "white")]
    orientation: Orientation,
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    chessboard::print_build_info();

    let controller: Controller = match config.fen.as_deref() {
        Some(fen) => Controller::from_fen(fen)?,
        None => Controller::default(),
    }
    .with_orientation(config.orientation);

    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();
    let mut shell = Shell::new(controller, &mut input, &mut output);
    shell.run()
}

//! HyperRoll headless self-play runner.
//!
//! Usage: hyperroll-selfplay [GAMES] [SEED] [CHAR0] [CHAR1]
//!
//! Prints the batch result as JSON on stdout; progress goes to the log.

use hyperroll_core::{run_batch_selfplay, SelfPlayConfig};
use tracing::info;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "hyperroll_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let games: u32 = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or(10);
    let seed: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(42);

    let mut config = SelfPlayConfig {
        seed,
        ..Default::default()
    };
    if let Some(c0) = args.next() {
        config.characters[0] = c0;
    }
    if let Some(c1) = args.next() {
        config.characters[1] = c1;
    }

    info!(
        "HyperRoll self-play v{}: {} games, seed {}, {} vs {}",
        env!("CARGO_PKG_VERSION"),
        games,
        seed,
        config.characters[0],
        config.characters[1]
    );

    let batch = match run_batch_selfplay(&config, games) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::error!("self-play failed: {e}");
            std::process::exit(1);
        }
    };

    info!(
        "avg length {:.1} rounds, win rates {:?}, balance {:.2}, bankruptcy rate {:.2}",
        batch.aggregate.avg_game_length,
        batch.aggregate.win_rates,
        batch.aggregate.win_rate_balance,
        batch.aggregate.bankruptcy_rate
    );

    match serde_json::to_string_pretty(&batch) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!("failed to serialize results: {e}");
            std::process::exit(1);
        }
    }
}

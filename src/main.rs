mod account;
mod console;
mod defines;
mod error;
mod gateway;
mod impls;
mod types;
mod util;
mod workflow;

#[cfg(test)]
mod testutil;

use clap::Parser;
use console::{Console, Outcome, SessionOptions};
use gateway::BinanceFuturesClient;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use types::*;
use util::*;
use workflow::OrderWorkflow;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // parse arguments via clap
    let cmd_args = CommandlineArgs::parse();

    let mut start = std::time::Instant::now();
    measure_start(&mut start);

    let outcome = run(&cmd_args);
    measure_end(&start);

    match outcome {
        Ok(Outcome::Placed) => {}
        Ok(Outcome::Halted) => std::process::exit(1),
        Err(e) => {
            error!(error = %e, "fatal error");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn run(cmd_args: &CommandlineArgs) -> error::Result<Outcome> {
    let use_testnet = !cmd_args.mainnet;
    if !use_testnet {
        warn!("LIVE MODE: orders will be placed with real funds");
    }

    let trading_context = TradingContext::from_env(use_testnet)?;
    let client = BinanceFuturesClient::new(&trading_context)?;
    let workflow = OrderWorkflow::new(client);

    let opts = SessionOptions {
        auto_transfer: cmd_args.auto_transfer,
        max_retries: cmd_args.max_retries,
        use_testnet: trading_context.use_testnet,
    };

    let stdin = std::io::stdin();
    let mut console = Console::new(stdin.lock(), std::io::stdout());
    console.run(&workflow, &opts)
}

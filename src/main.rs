use clap::Parser;
use std::process::ExitCode;

use credit_sync::config::SyncConfig;
use credit_sync::lifecycle;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    lifecycle::init_logging();
    let config = SyncConfig::parse();

    let outcome = lifecycle::run(&config).await;
    ExitCode::from(lifecycle::exit_status(&outcome))
}

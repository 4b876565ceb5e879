use std::process;
use std::sync::Arc;
mod cli;
mod logging;
mod startup;
use clap::Parser;
use cli::Cli;
use tracing::{error, info};
use zkrun::{ControlLoop, EXIT_ERROR};
use zkrun_leader_election::ZooKeeperClient;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    // nothing is logged to the file until the configuration names it
    let startup = match startup::prepare(&cli) {
        Ok(startup) => startup,
        Err(e) => {
            eprintln!("zkrun: {:#}", e);
            return EXIT_ERROR;
        }
    };

    let log = match logging::init(&startup.service.log_file) {
        Ok(log) => log,
        Err(e) => {
            eprintln!(
                "zkrun: Failed to open log file {}: {}",
                startup.service.log_file.display(),
                e
            );
            return EXIT_ERROR;
        }
    };
    if let Err(e) = logging::reopen_on_hangup(log) {
        error!("Failed to install SIGHUP handler: {}", e);
        return EXIT_ERROR;
    }

    let context = startup.context;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        job = %context.job_name(),
        sync_group = %startup.service.sync_group,
        policy = %context.job().exit_policy,
        "Starting zkrun"
    );

    let client = match ZooKeeperClient::connect(&startup.servers).await {
        Ok(client) => client,
        Err(e) => {
            error!(servers = %startup.servers, "Failed to connect to ZooKeeper: {}", e);
            return EXIT_ERROR;
        }
    };

    let code = ControlLoop::new(Arc::new(client), context).run().await;
    info!(code, "zkrun exiting");
    code
}

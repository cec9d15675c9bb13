//! sqlfan - run SQL statements against many MySQL instances at once.

use std::io::BufWriter;
use std::sync::Arc;

use sqlfan::app::{self, RunPlan};
use sqlfan::cli::Cli;
use sqlfan::db::MySqlConnector;
use sqlfan::error::Result;
use sqlfan::logging;
use tracing::error;

#[tokio::main]
async fn main() {
    logging::init_stderr_logging();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let plan = RunPlan::from_cli(&cli, std::io::stdin().lock())?;

    app::execute(
        plan,
        Arc::new(MySqlConnector),
        BufWriter::new(std::io::stdout()),
    )
    .await?;

    Ok(())
}

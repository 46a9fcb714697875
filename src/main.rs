use anyhow::Context;
use env_logger::Env;
use harvester::{configuration::get_configuration, startup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration.")?;
    let application =
        startup::build(&configuration).context("Failed to build the harvester.")?;

    let summary = startup::run(application)
        .await
        .context("Harvest run aborted.")?;

    log::info!(
        "Done: {} queries, {} results saved, {} failed",
        summary.queries,
        summary.records_saved,
        summary.failed_queries
    );

    Ok(())
}

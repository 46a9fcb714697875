use crate::{
    configuration::Settings,
    dal::{connector::PgConnector, search_result_db::SearchRepository},
    error::HarvestError,
    services::{Harvester, Paginator, RunSummary, SerperClient},
};

pub type Application = Harvester<PgConnector, SerperClient>;

pub fn build(configuration: &Settings) -> anyhow::Result<Application> {
    let connector = PgConnector::new(
        &configuration.backlog.queries_table,
        &configuration.backlog.results_table,
    );
    let repository = SearchRepository::new(connector, configuration.database.with_db());

    let serper = SerperClient::new(&configuration.serper)?;
    let paginator = Paginator::new(serper, configuration.serper.max_pages)?;

    Ok(Harvester::new(
        repository,
        paginator,
        configuration.backlog.limit,
    ))
}

pub async fn run(application: Application) -> Result<RunSummary, HarvestError> {
    application.run().await
}

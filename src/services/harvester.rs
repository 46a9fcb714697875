use crate::{
    dal::{connector::Connector, search_result_db::SearchRepository},
    error::Result,
};

use super::{Paginator, SearchProvider};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub queries: usize,
    pub records_saved: u64,
    pub failed_queries: usize,
}

pub struct Harvester<C: Connector, P: SearchProvider> {
    repository: SearchRepository<C>,
    paginator: Paginator<P>,
    backlog_limit: i64,
}

impl<C: Connector, P: SearchProvider> Harvester<C, P> {
    pub fn new(
        repository: SearchRepository<C>,
        paginator: Paginator<P>,
        backlog_limit: i64,
    ) -> Self {
        Harvester {
            repository,
            paginator,
            backlog_limit,
        }
    }

    /// One pass over the backlog. Only a backlog read failure aborts the run; a query whose
    /// batch cannot be saved is logged and skipped, leaving nothing of it in storage.
    pub async fn run(&self) -> Result<RunSummary> {
        let queries = self.repository.fetch_queries(self.backlog_limit).await?;
        log::info!("Loaded {} queries from database.", queries.len());

        let mut summary = RunSummary::default();

        if queries.is_empty() {
            log::warn!("No queries were returned from the database.");
            return Ok(summary);
        }

        for query in queries.iter() {
            summary.queries += 1;
            log::info!("Executing Serper search for query: {}", query);

            let results = match self.paginator.collect(query).await {
                Ok(results) => results,
                Err(e) => {
                    log::error!("Skipping query '{}': {}", query, e);
                    summary.failed_queries += 1;
                    continue;
                }
            };
            log::info!("Serper returned {} results for query '{}'.", results.len(), query);

            match self.repository.save_batch(&results).await {
                Ok(saved) => summary.records_saved += saved,
                Err(e) => {
                    log::error!("{}", e);
                    summary.failed_queries += 1;
                }
            }
        }

        log::info!(
            "Processed {} queries, saved {} results, {} failed",
            summary.queries,
            summary.records_saved,
            summary.failed_queries
        );

        Ok(summary)
    }
}

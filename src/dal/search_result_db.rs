use sqlx::postgres::PgConnectOptions;

use crate::{
    dal::connector::Connector,
    domain::search_result::SearchResult,
    error::{HarvestError, Result},
};

pub struct SearchRepository<C: Connector> {
    connector: C,
    options: PgConnectOptions,
}

impl<C: Connector> SearchRepository<C> {
    pub fn new(connector: C, options: PgConnectOptions) -> Self {
        SearchRepository { connector, options }
    }

    /// Up to `limit` non-empty queries, in whatever order the store hands them back.
    pub async fn fetch_queries(&self, limit: i64) -> Result<Vec<String>> {
        if limit <= 0 {
            return Err(HarvestError::invalid_input(format!(
                "Limit must be greater than zero. Got: {}",
                limit
            )));
        }

        let rows: std::result::Result<Vec<Option<String>>, sqlx::Error> = async {
            let mut session = self.connector.connect(&self.options).await?;
            session.select_queries(limit).await
        }
        .await;
        let rows = rows.map_err(|e| {
            log::error!("Failed to fetch queries from database: {:?}", e);
            HarvestError::Backlog(e)
        })?;

        Ok(rows
            .into_iter()
            .flatten()
            .filter(|q| !q.is_empty())
            .collect())
    }

    /// Writes every present record in one transaction and returns how many were written.
    ///
    /// Absent entries are skipped. When nothing is left to write no connection is opened.
    /// Any failure rolls the whole batch back.
    pub async fn save_batch<'a, I, R>(&self, results: I) -> Result<u64>
    where
        I: IntoIterator<Item = R>,
        R: Into<Option<&'a SearchResult>>,
    {
        let results: Vec<Option<&SearchResult>> = results.into_iter().map(Into::into).collect();
        if results.is_empty() {
            log::info!("No search results to save into database.");
            return Ok(0);
        }

        let total = results.len();
        let valid: Vec<&SearchResult> = results.into_iter().flatten().collect();
        if valid.len() < total {
            log::warn!(
                "Skipping {} null search results out of {} while saving.",
                total - valid.len(),
                total
            );
        }

        let Some(first) = valid.first() else {
            log::info!("No valid search results to save into database.");
            return Ok(0);
        };
        let query = first.query().to_string();

        let mut session = self
            .connector
            .connect(&self.options)
            .await
            .map_err(|e| HarvestError::persistence(&query, e))?;
        let mut tx = session
            .begin()
            .await
            .map_err(|e| HarvestError::persistence(&query, e))?;

        for result in valid.iter() {
            if let Err(e) = tx.insert(result).await {
                log::error!(
                    "Failed to insert search result for query '{}' page {} position {}: {:?}",
                    result.query(),
                    result.page_number(),
                    result.position(),
                    e
                );
                if let Err(rollback_err) = tx.rollback().await {
                    log::error!("Rollback failed for query '{}': {:?}", query, rollback_err);
                }
                return Err(HarvestError::persistence(&query, e));
            }
        }

        tx.commit().await.map_err(|e| {
            log::error!("Failed to commit search results for query '{}': {:?}", query, e);
            HarvestError::persistence(&query, e)
        })?;

        log::info!("Saved {} search results for query '{}'.", valid.len(), query);

        Ok(valid.len() as u64)
    }
}

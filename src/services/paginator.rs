use crate::{
    domain::search_result::SearchResult,
    error::{HarvestError, Result},
};

use super::{PageOutcome, SearchProvider};

/// Walks pages 1..=max_pages of one query, one request at a time.
pub struct Paginator<P: SearchProvider> {
    provider: P,
    max_pages: i32,
}

impl<P: SearchProvider> Paginator<P> {
    pub fn new(provider: P, max_pages: u32) -> Result<Self> {
        let max_pages = match i32::try_from(max_pages) {
            Ok(max_pages) if max_pages > 0 => max_pages,
            _ => {
                return Err(HarvestError::invalid_input(format!(
                    "Page cap must be between 1 and {}. Got: {}",
                    i32::MAX,
                    max_pages
                )))
            }
        };
        Ok(Paginator {
            provider,
            max_pages,
        })
    }

    /// Every usable result of `query` in fetch order. Provider trouble ends the walk early
    /// but is never an error.
    pub async fn collect(&self, query: &str) -> Result<Vec<SearchResult>> {
        if query.is_empty() {
            return Err(HarvestError::invalid_input("Query must not be empty."));
        }

        let mut results: Vec<SearchResult> = vec![];

        for page in 1..=self.max_pages {
            match self.provider.fetch_page(query, page).await {
                PageOutcome::Organic(page_results) if !page_results.is_empty() => {
                    log::debug!(
                        "Page {} of query '{}' gave {} results",
                        page,
                        query,
                        page_results.len()
                    );
                    results.extend(page_results);
                }
                PageOutcome::Organic(_) => {
                    log::info!("No usable results for query '{}' on page {}", query, page);
                    return Ok(results);
                }
                PageOutcome::Exhausted => return Ok(results),
                PageOutcome::Rejected(status) => {
                    log::warn!(
                        "Stopping query '{}' at page {} after HTTP status {}",
                        query,
                        page,
                        status
                    );
                    return Ok(results);
                }
                PageOutcome::Unreachable | PageOutcome::Unparseable => {
                    log::warn!("Stopping query '{}' at page {}", query, page);
                    return Ok(results);
                }
            }
        }

        log::info!(
            "Reached page cap of {} for query '{}' with {} results",
            self.max_pages,
            query,
            results.len()
        );

        Ok(results)
    }
}

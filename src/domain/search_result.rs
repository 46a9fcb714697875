use crate::error::{HarvestError, Result};

/// One organic hit for a query, flattened into the shape of the `searches` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    description: String,
    link: String,
    page_number: i32,
    position: i32,
    query: String,
    title: String,
}

impl SearchResult {
    pub fn new(
        description: Option<String>,
        link: Option<String>,
        page_number: i32,
        position: i32,
        query: &str,
        title: Option<String>,
    ) -> Result<Self> {
        if query.is_empty() {
            return Err(HarvestError::invalid_input("Query must not be empty."));
        }
        if page_number < 1 {
            return Err(HarvestError::invalid_input(format!(
                "Page number must be positive. Got: {}",
                page_number
            )));
        }
        if position < 0 {
            return Err(HarvestError::invalid_input(format!(
                "Result position must be zero or positive. Got: {}",
                position
            )));
        }

        Ok(SearchResult {
            description: description.unwrap_or_default(),
            link: link.unwrap_or_default(),
            page_number,
            position,
            query: query.to_string(),
            title: title.unwrap_or_default(),
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn page_number(&self) -> i32 {
        self.page_number
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

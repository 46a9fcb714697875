use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarvestError>;

#[derive(Error, Debug)]
pub enum HarvestError {
    /// Caller handed in something the contract forbids (empty query, bad page, bad limit)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The query backlog could not be read
    #[error("Unable to load queries from database: {0}")]
    Backlog(#[source] sqlx::Error),

    /// A batch for one query could not be written; nothing of it was committed
    #[error("Unable to save search results for query '{query}': {source}")]
    Persistence {
        query: String,
        #[source]
        source: sqlx::Error,
    },
}

impl HarvestError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn persistence(query: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Persistence {
            query: query.into(),
            source,
        }
    }
}

use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgConnection},
    Connection, Postgres, Transaction,
};

use crate::domain::search_result::SearchResult;

/// Opens a store session. The only seam between the repository and the database driver.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, options: &PgConnectOptions) -> Result<Box<dyn Session>, sqlx::Error>;
}

#[async_trait]
pub trait Session: Send {
    /// Raw `query` column values, nulls included.
    async fn select_queries(&mut self, limit: i64) -> Result<Vec<Option<String>>, sqlx::Error>;

    async fn begin<'a>(&'a mut self) -> Result<Box<dyn BatchTransaction + 'a>, sqlx::Error>;
}

#[async_trait]
pub trait BatchTransaction: Send {
    async fn insert(&mut self, result: &SearchResult) -> Result<(), sqlx::Error>;

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error>;

    async fn rollback(self: Box<Self>) -> Result<(), sqlx::Error>;
}

/// One dedicated postgres connection per session, no pool: the harvester is
/// strictly sequential.
pub struct PgConnector {
    select_queries_sql: String,
    insert_result_sql: String,
}

impl PgConnector {
    pub fn new(queries_table: &str, results_table: &str) -> Self {
        PgConnector {
            select_queries_sql: format!("select query from {} limit $1", queries_table),
            insert_result_sql: format!(
                r"
                insert into {}
                    (description, link, page_number, position, query, title)
                values
                    ($1, $2, $3, $4, $5, $6)
                ",
                results_table
            ),
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self, options: &PgConnectOptions) -> Result<Box<dyn Session>, sqlx::Error> {
        let con = PgConnection::connect_with(options).await?;

        Ok(Box::new(PgSession {
            con,
            select_queries_sql: self.select_queries_sql.clone(),
            insert_result_sql: self.insert_result_sql.clone(),
        }))
    }
}

struct PgSession {
    con: PgConnection,
    select_queries_sql: String,
    insert_result_sql: String,
}

#[async_trait]
impl Session for PgSession {
    async fn select_queries(&mut self, limit: i64) -> Result<Vec<Option<String>>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<String>>(&self.select_queries_sql)
            .bind(limit)
            .fetch_all(&mut self.con)
            .await
    }

    async fn begin<'a>(&'a mut self) -> Result<Box<dyn BatchTransaction + 'a>, sqlx::Error> {
        let tx = self.con.begin().await?;

        Ok(Box::new(PgBatchTransaction {
            tx,
            insert_result_sql: &self.insert_result_sql,
        }))
    }
}

/// Dropping without `commit` rolls back, so an early return never leaves a partial batch.
struct PgBatchTransaction<'a> {
    tx: Transaction<'a, Postgres>,
    insert_result_sql: &'a str,
}

#[async_trait]
impl<'a> BatchTransaction for PgBatchTransaction<'a> {
    async fn insert(&mut self, result: &SearchResult) -> Result<(), sqlx::Error> {
        sqlx::query(self.insert_result_sql)
            .bind(result.description())
            .bind(result.link())
            .bind(result.page_number())
            .bind(result.position())
            .bind(result.query())
            .bind(result.title())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

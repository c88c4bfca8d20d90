use std::future::Future;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;

use super::error::AdapterError;
use crate::translate::DriverInfo;

/// Something that can run a statement with positional parameters.
///
/// Implemented for a plain client, a transaction and a connection pool,
/// so the adapter works the same whether or not a connection is pinned.
pub trait DatabaseHandle: DriverInfo + Send + Sync {
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Vec<Row>, AdapterError>> + Send;

    /// Runs a statement, returning the number of rows affected.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<u64, AdapterError>> + Send;
}

impl DriverInfo for tokio_postgres::Client {
    fn driver_name(&self) -> &str {
        "postgres"
    }
}

impl DatabaseHandle for tokio_postgres::Client {
    async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, AdapterError> {
        tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(|e| AdapterError::execution(&e, sql))
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64, AdapterError> {
        tokio_postgres::Client::execute(self, sql, params)
            .await
            .map_err(|e| AdapterError::execution(&e, sql))
    }
}

impl DriverInfo for tokio_postgres::Transaction<'_> {
    fn driver_name(&self) -> &str {
        "postgres"
    }
}

impl DatabaseHandle for tokio_postgres::Transaction<'_> {
    async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, AdapterError> {
        tokio_postgres::Transaction::query(self, sql, params)
            .await
            .map_err(|e| AdapterError::execution(&e, sql))
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64, AdapterError> {
        tokio_postgres::Transaction::execute(self, sql, params)
            .await
            .map_err(|e| AdapterError::execution(&e, sql))
    }
}

impl DriverInfo for deadpool_postgres::Pool {
    fn driver_name(&self) -> &str {
        "postgres"
    }
}

/// Checks a connection out for the duration of one statement.
impl DatabaseHandle for deadpool_postgres::Pool {
    async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, AdapterError> {
        let client = self.get().await?;
        tokio_postgres::Client::query(&client, sql, params)
            .await
            .map_err(|e| AdapterError::execution(&e, sql))
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64, AdapterError> {
        let client = self.get().await?;
        tokio_postgres::Client::execute(&client, sql, params)
            .await
            .map_err(|e| AdapterError::execution(&e, sql))
    }
}

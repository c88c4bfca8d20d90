use std::future::Future;
use std::time::{Duration, Instant};
use tokio_postgres::types::{FromSql, FromSqlOwned, ToSql};
use tokio_postgres::Row;
use tracing::{debug, warn};

use super::error::AdapterError;
use super::handle::DatabaseHandle;
use super::query::QueryResult;
use crate::translate::{count_placeholders, detect, Dialect, DriverInfo, Translator};

/// Builds a value from one result row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, AdapterError>;
}

/// Read `column` from `row`, mapping a missing column or a type mismatch
/// to [`AdapterError::Scan`].
pub fn get<'a, T: FromSql<'a>>(row: &'a Row, column: &str) -> Result<T, AdapterError> {
    row.try_get(column).map_err(|source| AdapterError::Scan {
        column: column.to_string(),
        source,
    })
}

/// The first column of a row, for `SELECT COUNT(*)` style queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scalar<T>(pub T);

impl<T: FromSqlOwned> FromRow for Scalar<T> {
    fn from_row(row: &Row) -> Result<Self, AdapterError> {
        row.try_get(0).map(Scalar).map_err(|source| AdapterError::Scan {
            column: row
                .columns()
                .first()
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| "0".to_string()),
            source,
        })
    }
}

/// Runs raw MySQL-flavoured SQL against whatever database the handle
/// points at.
///
/// The dialect is detected once from the handle. For PostgreSQL every
/// statement goes through the rewrite pipeline and placeholder
/// renumbering before it is sent; for any other dialect the text is sent
/// unchanged. One round trip per call, no retries.
pub struct SqlAdapter<H> {
    handle: H,
    translator: Translator,
    statement_timeout: Option<Duration>,
}

impl<H: DatabaseHandle> SqlAdapter<H> {
    pub fn new(handle: H) -> Self {
        let dialect = detect(&handle);
        debug!(%dialect, driver = handle.driver_name(), "detected SQL dialect");
        Self::with_translator(handle, Translator::for_dialect(dialect))
    }

    /// Use a pre-built translator, e.g. one carrying table aliases.
    pub fn with_translator(handle: H, translator: Translator) -> Self {
        Self {
            handle,
            translator,
            statement_timeout: None,
        }
    }

    /// Fail any single round trip that takes longer than `timeout`.
    pub fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn dialect(&self) -> Dialect {
        self.translator.dialect()
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// The exact text [`fetch_all`](Self::fetch_all) and friends would send.
    pub fn translate(&self, sql: &str) -> String {
        self.translator.translate(sql)
    }

    pub async fn fetch_all<T: FromRow>(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<T>, AdapterError> {
        let rows = self.query(sql, params).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Exactly like [`fetch_optional`](Self::fetch_optional) but zero rows
    /// is [`AdapterError::NoRows`].
    pub async fn fetch_one<T: FromRow>(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<T, AdapterError> {
        self.fetch_optional(sql, params)
            .await?
            .ok_or(AdapterError::NoRows)
    }

    /// First row, if any. Further rows are ignored.
    pub async fn fetch_optional<T: FromRow>(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<T>, AdapterError> {
        let rows = self.query(sql, params).await?;
        rows.first().map(T::from_row).transpose()
    }

    /// Rows decoded for display, without a destination type.
    pub async fn fetch_table(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<QueryResult, AdapterError> {
        let started = Instant::now();
        let rows = self.query(sql, params).await?;
        Ok(QueryResult::from_rows(&rows, started.elapsed()))
    }

    pub async fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, AdapterError> {
        let translated = self.prepare(sql, params);
        let started = Instant::now();
        let affected = self
            .with_timeout(self.handle.execute(&translated, params))
            .await?;
        debug!(affected, elapsed_ms = started.elapsed().as_millis() as u64, "statement finished");
        Ok(affected)
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>, AdapterError> {
        let translated = self.prepare(sql, params);
        let started = Instant::now();
        let rows = self
            .with_timeout(self.handle.query(&translated, params))
            .await?;
        debug!(rows = rows.len(), elapsed_ms = started.elapsed().as_millis() as u64, "query finished");
        Ok(rows)
    }

    fn prepare(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> String {
        let expected = count_placeholders(sql);
        if expected != params.len() {
            warn!(
                placeholders = expected,
                arguments = params.len(),
                "placeholder count does not match argument count"
            );
        }
        let translated = self.translator.translate(sql);
        debug!(dialect = %self.dialect(), sql = %translated, "executing");
        translated
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, AdapterError>>,
    ) -> Result<T, AdapterError> {
        match self.statement_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| AdapterError::Timeout(limit))?,
            None => call.await,
        }
    }
}

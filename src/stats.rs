//! Proposal response-time statistics.
//!
//! The queries are written once in MySQL syntax and run unchanged through
//! [`SqlAdapter`], whichever database is behind it.
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio_postgres::Row;
use tracing::{error, warn};
use uuid::Uuid;

use crate::db::{get, AdapterError, DatabaseHandle, FromRow, SqlAdapter};

const RESPONSE_TIME_QUERY: &str = "
    SELECT
        ROUND(AVG(TIMESTAMPDIFF(HOUR, created_at, responded_at)), 2) as avg_response_hours,
        ROUND(MIN(TIMESTAMPDIFF(HOUR, created_at, responded_at)), 2) as min_response_hours,
        ROUND(MAX(TIMESTAMPDIFF(HOUR, created_at, responded_at)), 2) as max_response_hours,
        COUNT(CASE WHEN TIMESTAMPDIFF(HOUR, created_at, responded_at) <= 24 THEN 1 END) as fastest_response_count,
        COUNT(CASE WHEN TIMESTAMPDIFF(HOUR, created_at, responded_at) >= 168 THEN 1 END) as slow_response_count
    FROM proposals
    WHERE user_id = ? AND responded_at IS NOT NULL AND deleted_at IS NULL
";

// `/ 2.0` keeps the midpoint fractional on both databases; PostgreSQL
// would truncate an integer division and pick the lower row twice.
const MEDIAN_QUERY: &str = "
    SELECT ROUND(AVG(response_hours), 2) as median_response_hours
    FROM (
        SELECT
            TIMESTAMPDIFF(HOUR, created_at, responded_at) as response_hours,
            ROW_NUMBER() OVER (ORDER BY TIMESTAMPDIFF(HOUR, created_at, responded_at)) as row_num,
            COUNT(*) OVER () as total_count
        FROM proposals
        WHERE user_id = ? AND responded_at IS NOT NULL AND deleted_at IS NULL
    ) as ordered_times
    WHERE row_num IN (FLOOR((total_count + 1) / 2.0), CEIL((total_count + 1) / 2.0))
";

/// Hours between a proposal being sent and answered, for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseTimeStats {
    pub avg_response_hours: f64,
    pub min_response_hours: f64,
    pub max_response_hours: f64,
    pub median_response_hours: f64,
    /// Answered within 24 hours.
    pub fastest_response_count: i64,
    /// Took a week or more.
    pub slow_response_count: i64,
}

impl FromRow for ResponseTimeStats {
    fn from_row(row: &Row) -> Result<Self, AdapterError> {
        Ok(Self {
            avg_response_hours: hours(get(row, "avg_response_hours")?),
            min_response_hours: hours(get(row, "min_response_hours")?),
            max_response_hours: hours(get(row, "max_response_hours")?),
            median_response_hours: 0.0,
            fastest_response_count: get(row, "fastest_response_count")?,
            slow_response_count: get(row, "slow_response_count")?,
        })
    }
}

struct Median(f64);

impl FromRow for Median {
    fn from_row(row: &Row) -> Result<Self, AdapterError> {
        Ok(Median(hours(get(row, "median_response_hours")?)))
    }
}

/// Aggregates over no rows come back NULL; report those as zero.
fn hours(value: Option<Decimal>) -> f64 {
    value.and_then(|d| d.to_f64()).unwrap_or(0.0)
}

/// Response-time statistics for `user_id`.
///
/// A failure of the main aggregate is returned. The median is secondary:
/// if its query fails the error is logged and the median reported as 0.
pub async fn response_time_stats<H: DatabaseHandle>(
    adapter: &SqlAdapter<H>,
    user_id: Uuid,
) -> Result<ResponseTimeStats, AdapterError> {
    let mut stats: ResponseTimeStats = adapter
        .fetch_one(RESPONSE_TIME_QUERY, &[&user_id])
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "failed to get proposal response time stats");
            e
        })?;

    let median = adapter
        .fetch_one::<Median>(MEDIAN_QUERY, &[&user_id])
        .await
        .map(|m| m.0);
    stats.median_response_hours = median_or_default(median);
    Ok(stats)
}

fn median_or_default(median: Result<f64, AdapterError>) -> f64 {
    median.unwrap_or_else(|e| {
        warn!(error = %e, "failed to get median response time");
        0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ErrorCategory, StructuredError};
    use crate::translate::{check_postgres_syntax, validate, DriverInfo, Translator, Dialect};
    use std::sync::Mutex;
    use tokio_postgres::types::ToSql;

    struct NoRowsHandle {
        seen: Mutex<Vec<String>>,
    }

    impl DriverInfo for NoRowsHandle {
        fn driver_name(&self) -> &str {
            "postgres"
        }
    }

    impl DatabaseHandle for NoRowsHandle {
        async fn query(
            &self,
            sql: &str,
            _params: &[&(dyn ToSql + Sync)],
        ) -> Result<Vec<Row>, AdapterError> {
            self.seen.lock().unwrap().push(sql.to_string());
            Ok(Vec::new())
        }

        async fn execute(&self, _sql: &str, _params: &[&(dyn ToSql + Sync)]) -> Result<u64, AdapterError> {
            Ok(0)
        }
    }

    fn postgres() -> Translator {
        Translator::for_dialect(Dialect::Postgres)
    }

    #[test]
    fn test_queries_translate_cleanly() {
        for sql in [RESPONSE_TIME_QUERY, MEDIAN_QUERY] {
            let translated = postgres().translate(sql);
            assert!(validate(&translated).is_empty(), "{translated}");
            assert!(check_postgres_syntax(&translated).is_ok(), "{translated}");
            assert!(translated.contains("user_id = $1"));
        }
    }

    #[test]
    fn test_response_hours_are_end_minus_start() {
        let translated = postgres().translate(RESPONSE_TIME_QUERY);
        assert!(translated.contains(
            "ROUND(AVG((EXTRACT(EPOCH FROM (responded_at - created_at)) / 3600))::numeric, 2)"
        ));
    }

    #[test]
    fn test_hours_from_null_aggregate() {
        assert_eq!(hours(None), 0.0);
        assert_eq!(hours(Some(Decimal::new(1525, 2))), 15.25);
    }

    #[test]
    fn test_median_failure_degrades_to_zero() {
        let failed = Err(AdapterError::QueryExecution {
            error: StructuredError::new(ErrorCategory::Semantic, "window functions unsupported"),
            sql: MEDIAN_QUERY.to_string(),
        });
        assert_eq!(median_or_default(failed), 0.0);
        assert_eq!(median_or_default(Err(AdapterError::NoRows)), 0.0);
        assert_eq!(median_or_default(Ok(36.5)), 36.5);
    }

    #[tokio::test]
    async fn test_primary_failure_is_returned() {
        let adapter = SqlAdapter::new(NoRowsHandle {
            seen: Mutex::new(Vec::new()),
        });
        let err = response_time_stats(&adapter, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(err.is_no_rows());
        // the median query is never attempted
        assert_eq!(adapter.handle().seen.lock().unwrap().len(), 1);
    }
}

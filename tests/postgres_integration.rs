//! Runs translated SQL against a live PostgreSQL.
//!
//! Ignored by default. Run with
//! `SQLBRIDGE_TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rust_decimal::Decimal;
use sqlbridge::db::{get, AdapterError, ErrorCategory, FromRow, Scalar, SqlAdapter};
use sqlbridge::stats::response_time_stats;
use sqlbridge::translate::Dialect;
use tokio_postgres::{Client, NoTls, Row};
use uuid::Uuid;

const DATABASE_URL_ENV: &str = "SQLBRIDGE_TEST_DATABASE_URL";

async fn adapter() -> Option<SqlAdapter<Client>> {
    let Ok(url) = std::env::var(DATABASE_URL_ENV) else {
        eprintln!("{} not set, skipping", DATABASE_URL_ENV);
        return None;
    };
    let (client, connection) = tokio_postgres::connect(&url, NoTls)
        .await
        .expect("connect to test database");
    tokio::spawn(async move {
        let _ = connection.await;
    });
    Some(SqlAdapter::new(client))
}

fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, 0, 0).unwrap()
}

struct MonthScore {
    month: String,
    score: i32,
}

impl FromRow for MonthScore {
    fn from_row(row: &Row) -> Result<Self, AdapterError> {
        Ok(Self {
            month: get(row, "month")?,
            score: get(row, "score")?,
        })
    }
}

#[tokio::test]
#[ignore]
async fn scenario_query_runs() {
    let Some(db) = adapter().await else { return };
    assert_eq!(db.dialect(), Dialect::Postgres);

    db.execute(
        "CREATE TEMP TABLE t (id int, created_at timestamp, score int)",
        &[],
    )
    .await
    .unwrap();
    let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    for (id, score) in [(1, Some(10)), (2, None)] {
        db.execute(
            "INSERT INTO t (id, created_at, score) VALUES (?, ?, ?)",
            &[&id, &at(day, 9), &score],
        )
        .await
        .unwrap();
    }

    let rows: Vec<MonthScore> = db
        .fetch_all(
            "SELECT DATE_FORMAT(created_at, '%Y-%m') AS month, IFNULL(score, 0) AS score \
             FROM t WHERE id >= ? ORDER BY id LIMIT 0, 10",
            &[&1_i32],
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].month, "2025-03");
    assert_eq!(rows[0].score, 10);
    assert_eq!(rows[1].score, 0);
}

#[tokio::test]
#[ignore]
async fn week_start_matches_mysql() {
    let Some(db) = adapter().await else { return };

    db.execute("CREATE TEMP TABLE days (d timestamp)", &[]).await.unwrap();
    let dates = [
        NaiveDate::from_ymd_opt(2024, 12, 29).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 30).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
    ];
    for d in dates {
        db.execute("INSERT INTO days (d) VALUES (?)", &[&at(d, 15)])
            .await
            .unwrap();
    }

    let starts: Vec<Scalar<NaiveDateTime>> = db
        .fetch_all(
            "SELECT DATE_SUB(d, INTERVAL WEEKDAY(d) DAY) AS week_start FROM days ORDER BY d",
            &[],
        )
        .await
        .unwrap();

    for (d, Scalar(start)) in dates.iter().zip(starts) {
        let expected = *d - Duration::days(i64::from(d.weekday().num_days_from_monday()));
        assert_eq!(start.date(), expected, "week start of {d}");
        assert_eq!(start.date().weekday(), Weekday::Mon);
    }
}

#[tokio::test]
#[ignore]
async fn untranslated_limit_placeholders_fail_as_syntax_error() {
    let Some(db) = adapter().await else { return };

    let err = db
        .fetch_all::<Scalar<i32>>("SELECT 1 LIMIT ?, ?", &[&0_i64, &10_i64])
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Syntax);
    match err {
        AdapterError::QueryExecution { error, sql } => {
            assert_eq!(sql, "SELECT 1 LIMIT $1, $2");
            assert_eq!(error.code, "42601");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
#[ignore]
async fn response_time_stats_with_median() {
    let Some(db) = adapter().await else { return };

    db.execute(
        "CREATE TEMP TABLE proposals (user_id uuid, created_at timestamp, \
         responded_at timestamp, deleted_at timestamp)",
        &[],
    )
    .await
    .unwrap();

    let user = Uuid::new_v4();
    let sent = at(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(), 9);
    for hours in [2, 10, 30, 200] {
        db.execute(
            "INSERT INTO proposals (user_id, created_at, responded_at) VALUES (?, ?, ?)",
            &[&user, &sent, &(sent + Duration::hours(hours))],
        )
        .await
        .unwrap();
    }

    let stats = response_time_stats(&db, user).await.unwrap();
    assert_eq!(stats.avg_response_hours, 60.5);
    assert_eq!(stats.min_response_hours, 2.0);
    assert_eq!(stats.max_response_hours, 200.0);
    assert_eq!(stats.median_response_hours, 20.0);
    assert_eq!(stats.fastest_response_count, 2);
    assert_eq!(stats.slow_response_count, 1);

    let none = response_time_stats(&db, Uuid::new_v4()).await.unwrap();
    assert_eq!(none.avg_response_hours, 0.0);
    assert_eq!(none.median_response_hours, 0.0);
}

#[tokio::test]
#[ignore]
async fn rounded_average_decodes_as_decimal() {
    let Some(db) = adapter().await else { return };

    let Scalar(value): Scalar<Decimal> = db
        .fetch_one("SELECT ROUND(10 / 4.0, 2)", &[])
        .await
        .unwrap();
    assert_eq!(value, Decimal::new(250, 2));
}

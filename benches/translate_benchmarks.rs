//! Benchmarks for the MySQL → PostgreSQL translation path.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sqlbridge::translate::{
    renumber_placeholders, validate, Dialect, Pipeline, TableAliases, Translator,
};

// ---------------------------------------------------------------------------
// Inputs, roughly in order of how much rewriting they need
// ---------------------------------------------------------------------------

const PLAIN: &str = "SELECT id, name, email FROM users WHERE age > ? AND status = ?";

const SCENARIO: &str = "SELECT DATE_FORMAT(created_at, '%Y-%m') AS month, IFNULL(score, 0) \
    FROM t WHERE id = ? LIMIT 5, 10";

const MONTHLY_TREND: &str = "SELECT DATE_FORMAT(created_at, '%Y-%m') as month, \
    COUNT(*) as total, \
    COUNT(CASE WHEN status = 'proceed' THEN 1 END) as proceed_count, \
    ROUND(AVG(TIMESTAMPDIFF(HOUR, created_at, responded_at)), 2) as avg_hours \
    FROM `proposals` \
    WHERE user_id = ? AND created_at >= DATE_SUB(CURDATE(), INTERVAL 12 MONTH) \
    GROUP BY DATE_FORMAT(created_at, '%Y-%m') \
    ORDER BY month DESC";

const WEEKLY: &str = "SELECT \
    DATE_SUB(created_at, INTERVAL WEEKDAY(created_at) DAY) as week_start, \
    DATE_ADD(DATE_SUB(created_at, INTERVAL WEEKDAY(created_at) DAY), INTERVAL 6 DAY) as week_end, \
    ROUND(SUM(CASE WHEN status = 'proceed' THEN 1 ELSE 0 END) * 100.0 / COUNT(*), 2) as conversion_rate \
    FROM proposals WHERE user_id = ? AND created_at BETWEEN ? AND ? \
    GROUP BY week_start, week_end";

const SEARCH: &str = "SELECT e.id, CONCAT(e.last_name, ' ', e.first_name) AS full_name, \
    IFNULL(e.nickname, '') AS nickname, YEAR(e.joined_at) AS joined \
    FROM engineers e \
    WHERE CONCAT(e.last_name, e.first_name) LIKE CONCAT('%', ?, '%') \
    ORDER BY e.id LIMIT 20, 20";

fn cases() -> [(&'static str, &'static str); 5] {
    [
        ("plain", PLAIN),
        ("scenario", SCENARIO),
        ("monthly_trend", MONTHLY_TREND),
        ("weekly", WEEKLY),
        ("search", SEARCH),
    ]
}

// ---------------------------------------------------------------------------
// Benchmark groups
// ---------------------------------------------------------------------------

fn bench_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate");
    let translator = Translator::for_dialect(Dialect::Postgres);

    for (name, sql) in &cases() {
        group.bench_with_input(BenchmarkId::new("postgres", name), sql, |b, sql| {
            b.iter(|| translator.translate(black_box(sql)));
        });
    }

    let passthrough = Translator::for_dialect(Dialect::MySql);
    group.bench_function("mysql_passthrough", |b| {
        b.iter(|| passthrough.translate(black_box(MONTHLY_TREND)));
    });

    group.finish();
}

fn bench_pipeline_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let pipeline = Pipeline::with_defaults();
    let aliases = TableAliases::new()
        .with("proposals", "engineer_proposals")
        .with("engineers", "engineer_profiles");
    let aliased = match Translator::with_aliases(Dialect::Postgres, &aliases) {
        Ok(translator) => translator,
        Err(e) => panic!("alias pattern: {e}"),
    };

    for (name, sql) in &cases() {
        group.bench_with_input(BenchmarkId::new("defaults", name), sql, |b, sql| {
            b.iter(|| pipeline.run(black_box(sql)));
        });
        group.bench_with_input(BenchmarkId::new("with_aliases", name), sql, |b, sql| {
            b.iter(|| aliased.translate(black_box(sql)));
        });
    }

    group.finish();
}

fn bench_renumber(c: &mut Criterion) {
    let mut group = c.benchmark_group("renumber");
    let many: String = (0..200)
        .map(|i| format!("col_{} = ?", i))
        .collect::<Vec<_>>()
        .join(" AND ");

    group.bench_function("three", |b| {
        b.iter(|| renumber_placeholders(black_box(WEEKLY)));
    });
    group.bench_function("two_hundred", |b| {
        b.iter(|| renumber_placeholders(black_box(&many)));
    });

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    let translator = Translator::for_dialect(Dialect::Postgres);

    for (name, sql) in &cases() {
        let translated = translator.translate(sql);
        group.bench_with_input(BenchmarkId::new("raw", name), sql, |b, sql| {
            b.iter(|| validate(black_box(sql)));
        });
        group.bench_with_input(BenchmarkId::new("translated", name), &translated, |b, sql| {
            b.iter(|| validate(black_box(sql)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_translate,
    bench_pipeline_only,
    bench_renumber,
    bench_validate,
);
criterion_main!(benches);

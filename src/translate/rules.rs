//! Built-in MySQL → PostgreSQL rewrite passes.
//!
//! The order of [`default_passes`] is part of the contract: later passes
//! see the output of earlier ones. `WEEKDAY(x)` becomes
//! `(EXTRACT(ISODOW FROM x) - 1)` in `date_part`, and `date_arithmetic`
//! then treats that as a computed day count.
use once_cell::sync::Lazy;
use regex::Regex;

use super::call::parenthesize;
use super::pass::{CallRule, PatternRule, RewritePass};

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("built-in pattern {pattern:?}: {e}"))
}

static DATE_FORMAT_CALL: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\b(DATE_FORMAT)\s*\("));
static TIMESTAMPDIFF_CALL: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\b(TIMESTAMPDIFF)\s*\("));
static CONCAT_CALL: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\b(CONCAT)\s*\("));
static DATE_PART_CALL: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)\b(YEAR|MONTH|DAYOFMONTH|DAYOFWEEK|WEEKDAY|DAY)\s*\(")
});
static IFNULL_CALL: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\b(IFNULL)\s*\("));
static ROUND_CALL: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\b(ROUND)\s*\("));
static DATE_ARITHMETIC_CALL: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\b(DATE_ADD|DATE_SUB)\s*\("));
static INTERVAL_ARG: Lazy<Regex> =
    Lazy::new(|| compile(r"(?is)^INTERVAL\s+(.+?)\s+(DAY|MONTH|YEAR)$"));
static INTEGER: Lazy<Regex> = Lazy::new(|| compile(r"^-?\d+$"));
static LIMIT_OFFSET: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\bLIMIT\s+(\d+)\s*,\s*(\d+)"));
static BACKTICK: Lazy<Regex> = Lazy::new(|| compile(r"`([^`]+)`"));
static CURRENT_DATE_CALL: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)\b(?:CURDATE|CURRENT_DATE)\s*\(\s*\)"));

/// MySQL `DATE_FORMAT` patterns with a `TO_CHAR` equivalent.
pub const DATE_FORMATS: &[(&str, &str)] = &[
    ("%Y-%m-%d", "YYYY-MM-DD"),
    ("%Y-%m", "YYYY-MM"),
    ("%Y", "YYYY"),
    ("%m", "MM"),
    ("%d", "DD"),
];

/// All built-in passes in execution order. Table aliases are added by the
/// caller since they depend on configuration.
pub fn default_passes() -> Vec<Box<dyn RewritePass>> {
    vec![
        Box::new(date_format()),
        Box::new(timestampdiff()),
        Box::new(concat()),
        Box::new(date_part()),
        Box::new(ifnull()),
        Box::new(round()),
        Box::new(date_arithmetic()),
        Box::new(limit_offset()),
        Box::new(backticks()),
        Box::new(current_date()),
    ]
}

pub fn date_format() -> CallRule {
    CallRule::new(
        "date_format",
        "DATE_FORMAT(x, '%Y-%m') -> TO_CHAR(x, 'YYYY-MM'); also %Y-%m-%d, %Y, %m, %d",
        DATE_FORMAT_CALL.clone(),
        rewrite_date_format,
    )
}

fn rewrite_date_format(_: &str, args: &[String]) -> Option<String> {
    let [expr, format] = args else {
        return None;
    };
    let pattern = format.strip_prefix('\'')?.strip_suffix('\'')?;
    let (_, to_char) = DATE_FORMATS.iter().find(|(mysql, _)| *mysql == pattern)?;
    Some(format!("TO_CHAR({}, '{}')", expr, to_char))
}

pub fn timestampdiff() -> CallRule {
    CallRule::new(
        "timestampdiff",
        "TIMESTAMPDIFF(HOUR, a, b) -> (EXTRACT(EPOCH FROM (b - a)) / 3600); MONTH/YEAR via AGE(b, a)",
        TIMESTAMPDIFF_CALL.clone(),
        rewrite_timestampdiff,
    )
}

fn rewrite_timestampdiff(_: &str, args: &[String]) -> Option<String> {
    let [unit, start, end] = args else {
        return None;
    };
    let (start, end) = (parenthesize(start), parenthesize(end));
    let seconds = |divisor: u32| format!("(EXTRACT(EPOCH FROM ({} - {})) / {})", end, start, divisor);

    let text = match unit.to_ascii_uppercase().as_str() {
        "SECOND" => format!("EXTRACT(EPOCH FROM ({} - {}))", end, start),
        "MINUTE" => seconds(60),
        "HOUR" => seconds(3600),
        "DAY" => seconds(86400),
        "MONTH" => format!(
            "(EXTRACT(YEAR FROM AGE({e}, {s})) * 12 + EXTRACT(MONTH FROM AGE({e}, {s})))",
            e = end,
            s = start
        ),
        "YEAR" => format!("EXTRACT(YEAR FROM AGE({}, {}))", end, start),
        _ => return None,
    };
    Some(text)
}

pub fn concat() -> CallRule {
    CallRule::new(
        "concat",
        "CONCAT(a, ' ', b) -> a || ' ' || b",
        CONCAT_CALL.clone(),
        |_, args| (!args.is_empty()).then(|| args.join(" || ")),
    )
}

pub fn date_part() -> CallRule {
    CallRule::new(
        "date_part",
        "YEAR/MONTH/DAY(x) -> EXTRACT(... FROM x); WEEKDAY(x) -> (EXTRACT(ISODOW FROM x) - 1)",
        DATE_PART_CALL.clone(),
        rewrite_date_part,
    )
}

fn rewrite_date_part(function: &str, args: &[String]) -> Option<String> {
    let [expr] = args else {
        return None;
    };
    let text = match function.to_ascii_uppercase().as_str() {
        "YEAR" => format!("EXTRACT(YEAR FROM {})", expr),
        "MONTH" => format!("EXTRACT(MONTH FROM {})", expr),
        "DAY" | "DAYOFMONTH" => format!("EXTRACT(DAY FROM {})", expr),
        // MySQL: Monday = 0 .. Sunday = 6. ISODOW: Monday = 1 .. Sunday = 7.
        "WEEKDAY" => format!("(EXTRACT(ISODOW FROM {}) - 1)", expr),
        // MySQL: Sunday = 1 .. Saturday = 7. DOW: Sunday = 0 .. Saturday = 6.
        "DAYOFWEEK" => format!("(EXTRACT(DOW FROM {}) + 1)", expr),
        _ => return None,
    };
    Some(text)
}

pub fn ifnull() -> CallRule {
    CallRule::new(
        "ifnull",
        "IFNULL(a, b) -> COALESCE(a, b)",
        IFNULL_CALL.clone(),
        |_, args| match args {
            [value, fallback] => Some(format!("COALESCE({}, {})", value, fallback)),
            _ => None,
        },
    )
}

pub fn round() -> CallRule {
    CallRule::new(
        "round",
        "ROUND(v, 2) -> ROUND(v::numeric, 2)",
        ROUND_CALL.clone(),
        |_, args| match args {
            [value, precision] => Some(format!(
                "ROUND({}::numeric, {})",
                parenthesize(value),
                precision
            )),
            _ => None,
        },
    )
}

pub fn date_arithmetic() -> CallRule {
    CallRule::new(
        "date_arithmetic",
        "DATE_SUB(d, INTERVAL 7 DAY) -> (d - INTERVAL '7 days'); computed counts multiply INTERVAL '1 day'",
        DATE_ARITHMETIC_CALL.clone(),
        rewrite_date_arithmetic,
    )
}

fn rewrite_date_arithmetic(function: &str, args: &[String]) -> Option<String> {
    let [date, interval] = args else {
        return None;
    };
    let caps = INTERVAL_ARG.captures(interval)?;
    let amount = caps.get(1)?.as_str().trim();
    let unit = caps.get(2)?.as_str().to_ascii_lowercase();
    let op = if function.eq_ignore_ascii_case("DATE_ADD") {
        '+'
    } else {
        '-'
    };

    // Parenthesized so the infix result binds like the call it replaces.
    if INTEGER.is_match(amount) {
        Some(format!("({} {} INTERVAL '{} {}s')", date, op, amount, unit))
    } else {
        Some(format!(
            "({} {} {}::int * INTERVAL '1 {}')",
            date,
            op,
            parenthesize(amount),
            unit
        ))
    }
}

pub fn limit_offset() -> PatternRule {
    PatternRule::new(
        "limit_offset",
        "LIMIT 10, 5 -> LIMIT 5 OFFSET 10",
        LIMIT_OFFSET.clone(),
        "LIMIT $2 OFFSET $1",
    )
}

pub fn backticks() -> PatternRule {
    PatternRule::new(
        "backticks",
        "`column` -> \"column\"",
        BACKTICK.clone(),
        "\"$1\"",
    )
}

pub fn current_date() -> PatternRule {
    PatternRule::new(
        "current_date",
        "CURDATE() / CURRENT_DATE() -> CURRENT_DATE",
        CURRENT_DATE_CALL.clone(),
        "CURRENT_DATE",
    )
}

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::error::Error;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use uuid::Uuid;

type BoxError = Box<dyn Error + Sync + Send>;

/// A parameter given as text (e.g. on the command line), converted to
/// whatever type the server inferred for its placeholder.
///
/// `WHERE id = $1` infers `int4`, so `TextParam("42")` is sent as the
/// integer 42. Values that do not parse as the inferred type fail the
/// query with the parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextParam(pub String);

impl TextParam {
    pub fn new(value: impl Into<String>) -> Self {
        TextParam(value.into())
    }
}

impl From<&str> for TextParam {
    fn from(value: &str) -> Self {
        TextParam(value.to_string())
    }
}

impl ToSql for TextParam {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        let raw = self.0.as_str();
        let value = raw.trim();
        match *ty {
            Type::BOOL => parse_bool(value)?.to_sql(ty, out),
            Type::INT2 => value.parse::<i16>()?.to_sql(ty, out),
            Type::INT4 => value.parse::<i32>()?.to_sql(ty, out),
            Type::INT8 => value.parse::<i64>()?.to_sql(ty, out),
            Type::OID => value.parse::<u32>()?.to_sql(ty, out),
            Type::FLOAT4 => value.parse::<f32>()?.to_sql(ty, out),
            Type::FLOAT8 => value.parse::<f64>()?.to_sql(ty, out),
            Type::NUMERIC => value.parse::<Decimal>()?.to_sql(ty, out),
            Type::UUID => Uuid::parse_str(value)?.to_sql(ty, out),
            Type::DATE => NaiveDate::parse_from_str(value, "%Y-%m-%d")?.to_sql(ty, out),
            Type::TIMESTAMP => parse_timestamp(value)?.to_sql(ty, out),
            Type::TIMESTAMPTZ => parse_timestamptz(value)?.to_sql(ty, out),
            Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(raw)?.to_sql(ty, out),
            _ if <&str as ToSql>::accepts(ty) => raw.to_sql(ty, out),
            _ => Err(format!("cannot bind text parameter as {}", ty).into()),
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn parse_bool(value: &str) -> Result<bool, BoxError> {
    match value.to_ascii_lowercase().as_str() {
        "t" | "true" | "1" | "yes" | "on" => Ok(true),
        "f" | "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(format!("invalid boolean: {:?}", value).into()),
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, BoxError> {
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ts);
        }
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")?;
    date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid timestamp: {:?}", value).into())
}

/// RFC 3339, or a zone-less timestamp taken as UTC.
fn parse_timestamptz(value: &str) -> Result<DateTime<Utc>, BoxError> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(_) => Ok(parse_timestamp(value)?.and_utc()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &str, ty: &Type) -> Result<Vec<u8>, BoxError> {
        let mut out = BytesMut::new();
        TextParam::from(value).to_sql(ty, &mut out)?;
        Ok(out.to_vec())
    }

    #[test]
    fn test_new_takes_owned_cli_values() {
        let params: Vec<TextParam> = vec!["42".to_string(), "2025-01-06".to_string()]
            .into_iter()
            .map(TextParam::new)
            .collect();
        assert_eq!(params, vec![TextParam::from("42"), TextParam::from("2025-01-06")]);
    }

    #[test]
    fn test_integer_follows_inferred_type() {
        assert_eq!(encode("42", &Type::INT4).unwrap(), vec![0, 0, 0, 42]);
        assert_eq!(encode(" 7 ", &Type::INT2).unwrap(), vec![0, 7]);
        assert_eq!(encode("1", &Type::INT8).unwrap().len(), 8);
    }

    #[test]
    fn test_bad_integer_is_an_error() {
        assert!(encode("abc", &Type::INT4).is_err());
    }

    #[test]
    fn test_text_is_sent_verbatim() {
        assert_eq!(encode("%smith%", &Type::TEXT).unwrap(), b"%smith%".to_vec());
        assert_eq!(encode(" padded ", &Type::VARCHAR).unwrap(), b" padded ".to_vec());
    }

    #[test]
    fn test_bool_spellings() {
        assert_eq!(encode("true", &Type::BOOL).unwrap(), vec![1]);
        assert_eq!(encode("OFF", &Type::BOOL).unwrap(), vec![0]);
        assert!(encode("maybe", &Type::BOOL).is_err());
    }

    #[test]
    fn test_dates_and_timestamps() {
        assert!(encode("2025-01-31", &Type::DATE).is_ok());
        assert!(encode("2025-01-31 10:00:00", &Type::TIMESTAMP).is_ok());
        assert!(encode("2025-01-31T10:00:00.5", &Type::TIMESTAMP).is_ok());
        assert!(encode("2025-01-31", &Type::TIMESTAMP).is_ok());
        assert!(encode("2025-01-31T10:00:00+09:00", &Type::TIMESTAMPTZ).is_ok());
        assert!(encode("2025-01-31 10:00:00", &Type::TIMESTAMPTZ).is_ok());
        assert!(encode("31/01/2025", &Type::DATE).is_err());
    }

    #[test]
    fn test_timestamptz_normalized_to_utc() {
        let ts = parse_timestamptz("2025-01-31T09:00:00+09:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-01-31T00:00:00+00:00");
    }

    #[test]
    fn test_uuid_and_numeric() {
        assert_eq!(
            encode("67e55044-10b1-426f-9247-bb680e5fe0c8", &Type::UUID)
                .unwrap()
                .len(),
            16
        );
        assert!(encode("12.50", &Type::NUMERIC).is_ok());
        assert!(encode("not-a-uuid", &Type::UUID).is_err());
    }

    #[test]
    fn test_unsupported_type() {
        let err = encode("(1,2)", &Type::POINT).unwrap_err();
        assert_eq!(err.to_string(), "cannot bind text parameter as point");
    }
}

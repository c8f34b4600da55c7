//! Literal coercion against schema-declared field types.
//!
//! Everything the parser produces is a string; the builder asks this module
//! to turn each literal into a typed bind parameter. Ordered and equality
//! comparisons against datetime columns accept a bare ISO date, which the
//! predicate compiler later expands into a day-boundary range.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;

use crate::ast::{CmpOp, Value};
use crate::fragment::Param;
use crate::schema::FieldType;

/// Outcome of coercing one literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Param(Param),
    /// A date-only literal against a datetime column; expanded into a
    /// boundary range by the predicate compiler.
    DateOnly(NaiveDate),
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastError {
    /// The literal cannot be cast to the declared type.
    Invalid,
    /// NULL compared with an ordering operator.
    NullOrdering,
}

/// Coerce a single literal for the given operator and column type.
pub fn coerce(ty: &FieldType, op: CmpOp, value: &Value) -> Result<Coerced, CastError> {
    match value {
        Value::Null => {
            if op.is_ordering() {
                Err(CastError::NullOrdering)
            } else {
                Ok(Coerced::Null)
            }
        }
        Value::Str(s) => coerce_str(ty, op, s),
    }
}

fn coerce_str(ty: &FieldType, op: CmpOp, s: &str) -> Result<Coerced, CastError> {
    if ty.is_datetime()
        && !op.is_set()
        && let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
    {
        return Ok(Coerced::DateOnly(date));
    }

    let param = match ty {
        FieldType::String | FieldType::Text => Param::Str(s.to_string()),
        FieldType::Integer => Param::Int(s.parse().map_err(|_| CastError::Invalid)?),
        FieldType::Float => Param::Float(s.parse().map_err(|_| CastError::Invalid)?),
        FieldType::Decimal => {
            Param::Decimal(s.parse::<Decimal>().map_err(|_| CastError::Invalid)?)
        }
        FieldType::Bool => match s {
            "true" => Param::Bool(true),
            "false" => Param::Bool(false),
            _ => return Err(CastError::Invalid),
        },
        FieldType::Date => Param::Date(
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| CastError::Invalid)?,
        ),
        FieldType::UtcDatetime | FieldType::UtcDatetimeUsec => {
            Param::TimestampTz(parse_utc(s).ok_or(CastError::Invalid)?)
        }
        FieldType::NaiveDatetime | FieldType::NaiveDatetimeUsec => {
            Param::Timestamp(parse_naive(s).ok_or(CastError::Invalid)?)
        }
        FieldType::Array(inner) => return coerce_str(inner, op, s),
    };
    Ok(Coerced::Param(param))
}

fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // naive timestamps are taken as UTC
    parse_naive(s).map(|n| n.and_utc())
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// Midnight opening the given day.
pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Midnight opening the following day. `None` only at the calendar's edge.
pub fn day_next(date: NaiveDate) -> Option<NaiveDateTime> {
    date.succ_opt().map(|next| next.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::Str(v.to_string())
    }

    #[test]
    fn casts_scalars() {
        assert_eq!(
            coerce(&FieldType::Integer, CmpOp::Eq, &s("42")),
            Ok(Coerced::Param(Param::Int(42)))
        );
        assert_eq!(
            coerce(&FieldType::Bool, CmpOp::Eq, &s("true")),
            Ok(Coerced::Param(Param::Bool(true)))
        );
        assert_eq!(
            coerce(&FieldType::Text, CmpOp::Eq, &s("live")),
            Ok(Coerced::Param(Param::Str("live".into())))
        );
        assert!(matches!(
            coerce(&FieldType::Decimal, CmpOp::Eq, &s("12.50")),
            Ok(Coerced::Param(Param::Decimal(_)))
        ));
    }

    #[test]
    fn rejects_bad_casts() {
        assert_eq!(
            coerce(&FieldType::Integer, CmpOp::Eq, &s("abc")),
            Err(CastError::Invalid)
        );
        assert_eq!(
            coerce(&FieldType::Bool, CmpOp::Eq, &s("yes")),
            Err(CastError::Invalid)
        );
    }

    #[test]
    fn date_only_detection() {
        assert_eq!(
            coerce(&FieldType::UtcDatetime, CmpOp::Eq, &s("2025-08-07")),
            Ok(Coerced::DateOnly(
                NaiveDate::from_ymd_opt(2025, 8, 7).unwrap()
            ))
        );
        assert_eq!(
            coerce(&FieldType::NaiveDatetimeUsec, CmpOp::Lt, &s("2025-08-07")),
            Ok(Coerced::DateOnly(
                NaiveDate::from_ymd_opt(2025, 8, 7).unwrap()
            ))
        );
        // full timestamps cast normally
        assert!(matches!(
            coerce(&FieldType::UtcDatetime, CmpOp::Eq, &s("2025-08-07T10:30:00Z")),
            Ok(Coerced::Param(Param::TimestampTz(_)))
        ));
        // a plain Date column is not expanded
        assert!(matches!(
            coerce(&FieldType::Date, CmpOp::Eq, &s("2025-08-07")),
            Ok(Coerced::Param(Param::Date(_)))
        ));
    }

    #[test]
    fn null_handling() {
        assert_eq!(
            coerce(&FieldType::Integer, CmpOp::Eq, &Value::Null),
            Ok(Coerced::Null)
        );
        assert_eq!(
            coerce(&FieldType::Integer, CmpOp::Gt, &Value::Null),
            Err(CastError::NullOrdering)
        );
    }

    #[test]
    fn array_elements_cast_to_inner() {
        let ty = FieldType::Array(Box::new(FieldType::Integer));
        assert_eq!(
            coerce(&ty, CmpOp::ContainsAll, &s("7")),
            Ok(Coerced::Param(Param::Int(7)))
        );
    }

    #[test]
    fn day_boundaries() {
        let d = NaiveDate::from_ymd_opt(2025, 8, 7).unwrap();
        assert_eq!(day_start(d).to_string(), "2025-08-07 00:00:00");
        assert_eq!(day_next(d).unwrap().to_string(), "2025-08-08 00:00:00");
    }
}

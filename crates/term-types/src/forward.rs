//! Forward conversion: TypedValue → Term.
//!
//! Encoding is total for every well-formed `TypedValue`; the shapes produced
//! here are the canonical ones accepted back by [`crate::reverse`].

use duck_types::temporal::{civil_from_days, split_timestamp, SECS_PER_HOUR, SECS_PER_MINUTE};
use duck_types::{
    Date, DecimalBacking, Field, Interval, LogicalType, SqlValue, Time, TimeTz, TimestampTz,
    TimestampUnit, TypedValue,
};

use crate::numeric::{split_i128, split_u128};
use crate::term::Term;

/// Encode a typed value as a term.
pub fn encode(tv: &TypedValue) -> Term {
    encode_value(tv.logical_type(), tv.value())
}

impl From<TypedValue> for Term {
    fn from(tv: TypedValue) -> Self {
        encode(&tv)
    }
}

impl From<&TypedValue> for Term {
    fn from(tv: &TypedValue) -> Self {
        encode(tv)
    }
}

fn encode_value(ty: &LogicalType, value: &SqlValue) -> Term {
    match (ty, value) {
        // Null
        (_, SqlValue::Null) => Term::nil(),

        (LogicalType::Boolean, SqlValue::Boolean(b)) => Term::boolean(*b),

        // Integer types
        (LogicalType::TinyInt, SqlValue::TinyInt(i)) => Term::int(*i),
        (LogicalType::SmallInt, SqlValue::SmallInt(i)) => Term::int(*i),
        (LogicalType::Integer, SqlValue::Integer(i)) => Term::int(*i),
        (LogicalType::BigInt, SqlValue::BigInt(i)) => Term::int(*i),
        (LogicalType::UTinyInt, SqlValue::UTinyInt(i)) => Term::int(*i),
        (LogicalType::USmallInt, SqlValue::USmallInt(i)) => Term::int(*i),
        (LogicalType::UInteger, SqlValue::UInteger(i)) => Term::int(*i),
        (LogicalType::UBigInt, SqlValue::UBigInt(i)) => Term::int(*i),
        (LogicalType::HugeInt, SqlValue::HugeInt(i)) => signed_halves(*i),
        (LogicalType::UHugeInt, SqlValue::UHugeInt(i)) => {
            let (high, low) = split_u128(*i);
            Term::tuple(vec![Term::int(high), Term::int(low)])
        }

        // Floating point
        (LogicalType::Float, SqlValue::Float(f)) => float(f64::from(*f)),
        (LogicalType::Double, SqlValue::Double(f)) => float(*f),

        // Decimal - (unscaled, width, scale), unscaled in its storage shape
        (LogicalType::Decimal { width, scale }, SqlValue::Decimal(unscaled)) => {
            let stored = match DecimalBacking::for_width(*width) {
                Some(DecimalBacking::Int128) => signed_halves(*unscaled),
                _ => Term::int(*unscaled),
            };
            Term::tuple(vec![stored, Term::int(*width), Term::int(*scale)])
        }

        // String types
        (LogicalType::Varchar, SqlValue::Varchar(s))
        | (LogicalType::Char, SqlValue::Char(s))
        | (LogicalType::Enum, SqlValue::Enum(s)) => Term::binary(s),
        (LogicalType::Blob, SqlValue::Blob(b)) => Term::binary(b),

        // Date/time types
        (LogicalType::Date, SqlValue::Date(d)) => date(*d),
        (LogicalType::Time, SqlValue::Time(t)) => time(*t),
        (LogicalType::TimeTz, SqlValue::TimeTz(t)) => time_tz(*t),
        (LogicalType::Timestamp, SqlValue::Timestamp(v)) => timestamp(*v, TimestampUnit::Micros),
        (LogicalType::TimestampS, SqlValue::TimestampS(v)) => {
            timestamp(*v, TimestampUnit::Seconds)
        }
        (LogicalType::TimestampMs, SqlValue::TimestampMs(v)) => {
            timestamp(*v, TimestampUnit::Millis)
        }
        (LogicalType::TimestampNs, SqlValue::TimestampNs(v)) => {
            timestamp(*v, TimestampUnit::Nanos)
        }
        (LogicalType::TimestampTz, SqlValue::TimestampTz(ts)) => timestamp_tz(*ts),
        (LogicalType::Interval, SqlValue::Interval(iv)) => interval(*iv),

        (LogicalType::Uuid, SqlValue::Uuid(u)) => Term::binary(u.hyphenated().to_string()),

        // Composite types
        (LogicalType::List { element_type }, SqlValue::List(items))
        | (LogicalType::Array { element_type, .. }, SqlValue::Array(items)) => Term::list(
            items
                .iter()
                .map(|item| encode_value(element_type, item))
                .collect(),
        ),
        (
            LogicalType::Map {
                key_type,
                value_type,
            },
            SqlValue::Map(entries),
        ) => Term::list(
            entries
                .iter()
                .map(|(k, v)| {
                    Term::tuple(vec![encode_value(key_type, k), encode_value(value_type, v)])
                })
                .collect(),
        ),
        (LogicalType::Struct { fields }, SqlValue::Struct(values)) => Term::AssocMap(
            fields
                .iter()
                .zip(values)
                .map(|(field, value)| named(field, value))
                .collect(),
        ),
        (LogicalType::Union { members }, SqlValue::Union { tag, value }) => match members.get(*tag)
        {
            Some(member) => Term::AssocMap(vec![named(member, value)]),
            None => panic!("union tag {tag} out of range for {ty}"),
        },

        // Fallback - TypedValue construction rules this out
        (ty, value) => panic!(
            "payload {} does not match logical type {ty}",
            value.kind_name()
        ),
    }
}

fn named(field: &Field, value: &SqlValue) -> (Term, Term) {
    (
        Term::binary(&field.name),
        encode_value(&field.field_type, value),
    )
}

fn signed_halves(value: i128) -> Term {
    let (high, low) = split_i128(value);
    Term::tuple(vec![Term::int(high), Term::int(low)])
}

fn float(value: f64) -> Term {
    if value.is_nan() {
        Term::tag("nan")
    } else if value == f64::INFINITY {
        Term::tag("infinity")
    } else if value == f64::NEG_INFINITY {
        Term::tag("-infinity")
    } else {
        Term::Float64(value)
    }
}

fn civil(days: i64) -> Term {
    let (year, month, day) = civil_from_days(days);
    Term::tuple(vec![Term::int(year), Term::int(month), Term::int(day)])
}

fn date(value: Date) -> Term {
    civil(i64::from(value.days()))
}

fn clock(hour: i64, minute: i64, second: i64, fraction: i64) -> Term {
    Term::tuple(vec![
        Term::int(hour),
        Term::int(minute),
        Term::int(second),
        Term::int(fraction),
    ])
}

fn time(value: Time) -> Term {
    let (hour, minute, second, micros) = value.hms_micro();
    clock(
        i64::from(hour),
        i64::from(minute),
        i64::from(second),
        i64::from(micros),
    )
}

/// `(hours, minutes)` of an offset; hours truncate toward zero and carry the
/// sign, minutes are unsigned.
fn offset(offset_seconds: i32) -> Term {
    let hours = offset_seconds / SECS_PER_HOUR;
    let minutes = (offset_seconds % SECS_PER_HOUR / SECS_PER_MINUTE).abs();
    Term::tuple(vec![Term::int(hours), Term::int(minutes)])
}

fn time_tz(value: TimeTz) -> Term {
    let (hour, minute, second, micros) = value.time().hms_micro();
    Term::tuple(vec![
        Term::int(hour),
        Term::int(minute),
        Term::int(second),
        Term::int(micros),
        offset(value.offset_seconds()),
    ])
}

/// `((y, m, d), (h, mi, s, fraction))`, with the fraction counted in `unit`.
fn datetime(value: i64, unit: TimestampUnit) -> (Term, Term) {
    let (days, units_of_day) = split_timestamp(value, unit);
    let per_second = unit.per_second();
    let secs = units_of_day / per_second;
    let fraction = match unit {
        TimestampUnit::Seconds => 0,
        _ => units_of_day % per_second,
    };
    (
        civil(days),
        clock(secs / 3_600, secs / 60 % 60, secs % 60, fraction),
    )
}

fn timestamp(value: i64, unit: TimestampUnit) -> Term {
    let (date, clock) = datetime(value, unit);
    Term::tuple(vec![date, clock])
}

fn timestamp_tz(value: TimestampTz) -> Term {
    if value.offset_seconds() == 0 {
        return timestamp(value.micros(), TimestampUnit::Micros);
    }
    let (date, clock) = datetime(value.local_micros(), TimestampUnit::Micros);
    Term::tuple(vec![date, clock, offset(value.offset_seconds())])
}

/// Emitted normalised so the three fields never carry into one another.
fn interval(value: Interval) -> Term {
    let (months, days, micros) = value.normalized();
    Term::tuple(vec![Term::int(months), Term::int(days), Term::int(micros)])
}

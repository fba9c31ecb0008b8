//! Reverse conversion: Term → TypedValue.
//!
//! Decoding is driven entirely by the target [`LogicalType`]: the same term
//! shape can mean different things for different targets (a two-element
//! tuple is a hugeint for HUGEINT, a date/time pair for TIMESTAMP and a
//! member/payload pair for UNION). Where a target accepts several shapes,
//! they are tried in a fixed order and the first match wins.
//!
//! A null marker decodes to NULL for every target. Decoding is
//! all-or-nothing: nested failures surface as a single [`DecodeError`]
//! carrying the path to the offending element.

use std::collections::HashMap;

use duck_types::temporal::{combine_timestamp, MAX_OFFSET_SECONDS, SECS_PER_HOUR, SECS_PER_MINUTE};
use duck_types::{
    Date, Field, Interval, LogicalType, SqlValue, Time, TimeTz, TimestampTz, TimestampUnit,
    TypedValue,
};
use uuid::Uuid;

use crate::error::{DecodeError, Location, Result};
use crate::numeric::{
    fits_width, float_to_decimal, float_to_i128, float_to_u128, join_i128, join_u128,
    parse_decimal_literal, parse_i128, parse_u128, power_of_ten, rescale, LiteralError,
};
use crate::temporal::{
    parse_date, parse_interval, parse_time, parse_time_tz, parse_timestamp, parse_timestamp_tz,
};
use crate::term::{Term, INTEGER_MAX, INTEGER_MIN};

/// Exclusive bound on the hour part of a UTC offset tuple.
const OFFSET_HOUR_LIMIT: i128 = 17;

/// Term paired with schema information for type-directed conversion.
#[derive(Debug, Clone)]
pub struct TermWithSchema {
    /// The term.
    pub term: Term,
    /// The expected logical type.
    pub logical_type: LogicalType,
}

impl TermWithSchema {
    /// Create a new TermWithSchema.
    pub fn new(term: Term, logical_type: LogicalType) -> Self {
        Self { term, logical_type }
    }

    /// Convert to TypedValue.
    pub fn to_typed_value(&self) -> Result<TypedValue> {
        decode(&self.term, &self.logical_type)
    }
}

impl TryFrom<TermWithSchema> for TypedValue {
    type Error = DecodeError;

    fn try_from(tws: TermWithSchema) -> Result<Self> {
        tws.to_typed_value()
    }
}

/// Decode `term` against `target`.
pub fn decode(term: &Term, target: &LogicalType) -> Result<TypedValue> {
    target.validate()?;
    let value = decode_value(term, target)?;
    Ok(TypedValue::new(target.clone(), value)?)
}

/// Decode `term` into a bare payload for `target`.
///
/// `target` is assumed valid; [`decode`] checks it first.
pub fn decode_value(term: &Term, target: &LogicalType) -> Result<SqlValue> {
    if term.is_nil() {
        return Ok(SqlValue::Null);
    }

    match target {
        LogicalType::Null => Err(DecodeError::mismatch(target, term)),

        LogicalType::Boolean => match term.as_tag() {
            Some("true") => Ok(SqlValue::Boolean(true)),
            Some("false") => Ok(SqlValue::Boolean(false)),
            _ => Err(DecodeError::mismatch(target, term)),
        },

        // Integer types
        LogicalType::TinyInt => integer(term, target).map(SqlValue::TinyInt),
        LogicalType::SmallInt => integer(term, target).map(SqlValue::SmallInt),
        LogicalType::Integer => integer(term, target).map(SqlValue::Integer),
        LogicalType::BigInt => integer(term, target).map(SqlValue::BigInt),
        LogicalType::UTinyInt => integer(term, target).map(SqlValue::UTinyInt),
        LogicalType::USmallInt => integer(term, target).map(SqlValue::USmallInt),
        LogicalType::UInteger => integer(term, target).map(SqlValue::UInteger),
        LogicalType::UBigInt => integer(term, target).map(SqlValue::UBigInt),
        LogicalType::HugeInt => hugeint(term, target).map(SqlValue::HugeInt),
        LogicalType::UHugeInt => uhugeint(term, target).map(SqlValue::UHugeInt),

        // Floating point; narrowing to f32 is lossy by contract
        LogicalType::Float => float(term, target).map(|v| SqlValue::Float(v as f32)),
        LogicalType::Double => float(term, target).map(SqlValue::Double),

        LogicalType::Decimal { width, scale } => {
            decimal(term, target, *width, *scale).map(SqlValue::Decimal)
        }

        // String types
        LogicalType::Varchar => text(term, target).map(SqlValue::Varchar),
        LogicalType::Char => text(term, target).map(SqlValue::Char),
        LogicalType::Enum => text(term, target).map(SqlValue::Enum),
        LogicalType::Blob => {
            let mut bytes = Vec::new();
            if flatten_iodata(term, &mut bytes) {
                Ok(SqlValue::Blob(bytes))
            } else {
                Err(DecodeError::mismatch(target, term))
            }
        }

        // Date/time types
        LogicalType::Date => date(term, target).map(SqlValue::Date),
        LogicalType::Time => time(term, target).map(SqlValue::Time),
        LogicalType::TimeTz => time_tz(term, target).map(SqlValue::TimeTz),
        LogicalType::Timestamp => {
            timestamp(term, target, TimestampUnit::Micros).map(SqlValue::Timestamp)
        }
        LogicalType::TimestampS => {
            timestamp(term, target, TimestampUnit::Seconds).map(SqlValue::TimestampS)
        }
        LogicalType::TimestampMs => {
            timestamp(term, target, TimestampUnit::Millis).map(SqlValue::TimestampMs)
        }
        LogicalType::TimestampNs => {
            timestamp(term, target, TimestampUnit::Nanos).map(SqlValue::TimestampNs)
        }
        LogicalType::TimestampTz => timestamp_tz(term, target).map(SqlValue::TimestampTz),
        LogicalType::Interval => interval(term, target).map(SqlValue::Interval),

        LogicalType::Uuid => uuid(term, target).map(SqlValue::Uuid),

        // Composite types
        LogicalType::List { element_type } => match term {
            Term::List(items) => elements(items, element_type).map(SqlValue::List),
            _ => Err(DecodeError::mismatch(target, term)),
        },
        LogicalType::Array { element_type, size } => match term {
            Term::List(items) if items.len() == *size as usize => {
                elements(items, element_type).map(SqlValue::Array)
            }
            Term::List(items) => Err(DecodeError::ArityMismatch {
                target: target.to_string(),
                expected: *size as usize,
                actual: items.len(),
            }),
            _ => Err(DecodeError::mismatch(target, term)),
        },
        LogicalType::Map {
            key_type,
            value_type,
        } => map(term, target, key_type, value_type).map(SqlValue::Map),
        LogicalType::Struct { fields } => structure(term, target, fields).map(SqlValue::Struct),
        LogicalType::Union { members } => union(term, target, members),
    }
}

// ============================================================================
// Numbers
// ============================================================================

/// Integer term within the host range.
fn host_integer(term: &Term, target: &LogicalType) -> Result<Option<i128>> {
    match term {
        Term::Integer(n) if (INTEGER_MIN..=INTEGER_MAX).contains(n) => Ok(Some(*n)),
        Term::Integer(n) => Err(DecodeError::range(target, n)),
        _ => Ok(None),
    }
}

fn integer<T: TryFrom<i128>>(term: &Term, target: &LogicalType) -> Result<T> {
    let n = host_integer(term, target)?.ok_or_else(|| DecodeError::mismatch(target, term))?;
    T::try_from(n).map_err(|_| DecodeError::range(target, n))
}

/// Tuple component that must be an integer within `T`'s range.
fn component<T: TryFrom<i128>>(term: &Term, target: &LogicalType) -> Result<T> {
    match term {
        Term::Integer(n) => T::try_from(*n).map_err(|_| DecodeError::range(target, n)),
        _ => Err(DecodeError::mismatch(target, term)),
    }
}

fn literal_error(target: &LogicalType, literal: &str, err: LiteralError) -> DecodeError {
    match err {
        LiteralError::Malformed => DecodeError::malformed(target, literal),
        LiteralError::OutOfRange => DecodeError::range(target, literal),
    }
}

fn utf8<'a>(bytes: &'a [u8], target: &LogicalType) -> Result<&'a str> {
    std::str::from_utf8(bytes)
        .map_err(|_| DecodeError::malformed(target, String::from_utf8_lossy(bytes)))
}

fn hugeint(term: &Term, target: &LogicalType) -> Result<i128> {
    match term {
        Term::Tuple(parts) if parts.len() == 2 => Ok(join_i128(
            component(&parts[0], target)?,
            component(&parts[1], target)?,
        )),
        Term::ByteString(bytes) => {
            let text = utf8(bytes, target)?;
            parse_i128(text).map_err(|e| literal_error(target, text, e))
        }
        Term::Float64(v) => float_to_i128(*v).ok_or_else(|| DecodeError::range(target, v)),
        _ => host_integer(term, target)?.ok_or_else(|| DecodeError::mismatch(target, term)),
    }
}

fn uhugeint(term: &Term, target: &LogicalType) -> Result<u128> {
    match term {
        Term::Tuple(parts) if parts.len() == 2 => Ok(join_u128(
            component(&parts[0], target)?,
            component(&parts[1], target)?,
        )),
        Term::ByteString(bytes) => {
            let text = utf8(bytes, target)?;
            parse_u128(text).map_err(|e| literal_error(target, text, e))
        }
        Term::Float64(v) => float_to_u128(*v).ok_or_else(|| DecodeError::range(target, v)),
        _ => {
            let n = host_integer(term, target)?
                .ok_or_else(|| DecodeError::mismatch(target, term))?;
            u128::try_from(n).map_err(|_| DecodeError::range(target, n))
        }
    }
}

fn float(term: &Term, target: &LogicalType) -> Result<f64> {
    match term {
        Term::Float64(v) => Ok(*v),
        Term::Integer(n) => Ok(*n as f64),
        Term::Tag(name) => match name.as_str() {
            "infinity" => Ok(f64::INFINITY),
            "-infinity" => Ok(f64::NEG_INFINITY),
            "nan" => Ok(f64::NAN),
            _ => Err(DecodeError::mismatch(target, term)),
        },
        _ => Err(DecodeError::mismatch(target, term)),
    }
}

/// Explicit `(value, width, scale)` decimal, rescaled to the target.
fn explicit_decimal(parts: &[Term], target: &LogicalType, width: u8, scale: u8) -> Result<i128> {
    let value = match &parts[0] {
        Term::Tuple(halves) if halves.len() == 2 => join_i128(
            component(&halves[0], target)?,
            component(&halves[1], target)?,
        ),
        other => host_integer(other, target)?
            .ok_or_else(|| DecodeError::mismatch(target, other))?,
    };
    let source_width: u8 = component(&parts[1], target)?;
    let source_scale: u8 = component(&parts[2], target)?;

    let inconsistent = || {
        DecodeError::range(
            target,
            format!("DECIMAL({source_width},{source_scale}) value {value}"),
        )
    };
    if LogicalType::decimal(source_width, source_scale)
        .validate()
        .is_err()
        || !fits_width(value, source_width)
    {
        return Err(inconsistent());
    }
    let unscaled = rescale(value, source_scale, scale).ok_or_else(inconsistent)?;
    if !fits_width(unscaled, width) {
        return Err(inconsistent());
    }
    Ok(unscaled)
}

fn decimal(term: &Term, target: &LogicalType, width: u8, scale: u8) -> Result<i128> {
    let unscaled = match term {
        Term::Tuple(parts) if parts.len() == 2 && parts[0].as_tag() == Some("decimal") => {
            match &parts[1] {
                Term::Tuple(inner) if inner.len() == 3 => {
                    return explicit_decimal(inner, target, width, scale);
                }
                other => return Err(DecodeError::mismatch(target, other)),
            }
        }
        Term::Tuple(parts) if parts.len() == 3 => {
            return explicit_decimal(parts, target, width, scale);
        }
        Term::ByteString(bytes) => {
            let text = utf8(bytes, target)?;
            parse_decimal_literal(text, scale).map_err(|e| literal_error(target, text, e))?
        }
        Term::Float64(v) => {
            float_to_decimal(*v, scale).ok_or_else(|| DecodeError::range(target, v))?
        }
        Term::Integer(_) | Term::Tuple(_) => {
            let whole = hugeint(term, target)?;
            power_of_ten(u32::from(scale))
                .and_then(|factor| whole.checked_mul(factor))
                .ok_or_else(|| DecodeError::range(target, whole))?
        }
        _ => return Err(DecodeError::mismatch(target, term)),
    };

    if !fits_width(unscaled, width) {
        return Err(DecodeError::range(
            target,
            duck_types::values::format_decimal(unscaled, scale),
        ));
    }
    Ok(unscaled)
}

// ============================================================================
// Strings and bytes
// ============================================================================

fn text(term: &Term, target: &LogicalType) -> Result<String> {
    match term {
        Term::ByteString(bytes) => utf8(bytes, target).map(str::to_owned),
        _ => Err(DecodeError::mismatch(target, term)),
    }
}

/// Flatten a binary or a (nested) list of binaries and bytes.
fn flatten_iodata(term: &Term, out: &mut Vec<u8>) -> bool {
    match term {
        Term::ByteString(bytes) => {
            out.extend_from_slice(bytes);
            true
        }
        Term::Integer(n) => match u8::try_from(*n) {
            Ok(byte) => {
                out.push(byte);
                true
            }
            Err(_) => false,
        },
        Term::List(items) => items.iter().all(|item| flatten_iodata(item, out)),
        _ => false,
    }
}

// ============================================================================
// Date/time
// ============================================================================

fn date_tuple(parts: &[Term], target: &LogicalType) -> Result<Date> {
    let year: i32 = component(&parts[0], target)?;
    let month: u32 = component(&parts[1], target)?;
    let day: u32 = component(&parts[2], target)?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(DecodeError::range(target, format!("{year}-{month}-{day}")));
    }
    Date::from_ymd(year, month, day)
        .ok_or_else(|| DecodeError::range(target, format!("{year}-{month}-{day}")))
}

fn date(term: &Term, target: &LogicalType) -> Result<Date> {
    match term {
        Term::Tuple(parts) if parts.len() == 3 => date_tuple(parts, target),
        Term::ByteString(bytes) => {
            let text = utf8(bytes, target)?;
            parse_date(text).ok_or_else(|| DecodeError::malformed(target, text))
        }
        _ => Err(DecodeError::mismatch(target, term)),
    }
}

/// `(hour, minute, second, fraction)` with each field range-checked.
fn clock_fields(parts: &[Term], target: &LogicalType) -> Result<(u32, u32, u32, i64)> {
    let hour: u32 = component(&parts[0], target)?;
    let minute: u32 = component(&parts[1], target)?;
    let second: u32 = component(&parts[2], target)?;
    let fraction: i64 = component(&parts[3], target)?;
    if hour > 23 || minute > 59 || second > 59 || fraction < 0 {
        return Err(DecodeError::range(
            target,
            format!("{hour}:{minute}:{second}.{fraction}"),
        ));
    }
    Ok((hour, minute, second, fraction))
}

fn time_tuple(parts: &[Term], target: &LogicalType) -> Result<Time> {
    let (hour, minute, second, micros) = clock_fields(parts, target)?;
    Time::from_hms_micro(hour, minute, second, micros)
        .ok_or_else(|| DecodeError::range(target, format!("{hour}:{minute}:{second}.{micros}")))
}

/// `(offset_hours, offset_minutes)` folded into signed seconds; the sign is
/// carried by the hour.
fn offset_tuple(term: &Term, target: &LogicalType) -> Result<i32> {
    let parts = term
        .as_tuple(2)
        .ok_or_else(|| DecodeError::mismatch(target, term))?;
    let hours: i32 = component(&parts[0], target)?;
    let minutes: i32 = component(&parts[1], target)?;
    if i128::from(hours).abs() >= OFFSET_HOUR_LIMIT || !(0..=59).contains(&minutes) {
        return Err(DecodeError::range(target, format!("offset {hours}:{minutes}")));
    }
    let magnitude = hours.abs() * SECS_PER_HOUR + minutes * SECS_PER_MINUTE;
    let offset = if hours < 0 { -magnitude } else { magnitude };
    debug_assert!(offset.abs() <= MAX_OFFSET_SECONDS);
    Ok(offset)
}

fn time(term: &Term, target: &LogicalType) -> Result<Time> {
    match term {
        Term::Tuple(parts) if parts.len() == 4 => time_tuple(parts, target),
        Term::ByteString(bytes) => {
            let text = utf8(bytes, target)?;
            parse_time(text).ok_or_else(|| DecodeError::malformed(target, text))
        }
        _ => Err(DecodeError::mismatch(target, term)),
    }
}

fn time_tz(term: &Term, target: &LogicalType) -> Result<TimeTz> {
    match term {
        Term::Tuple(parts) if parts.len() == 5 => {
            let time = time_tuple(&parts[..4], target)?;
            let offset = offset_tuple(&parts[4], target)?;
            TimeTz::new(time, offset).ok_or_else(|| DecodeError::range(target, offset))
        }
        Term::ByteString(bytes) => {
            let text = utf8(bytes, target)?;
            parse_time_tz(text).ok_or_else(|| DecodeError::malformed(target, text))
        }
        _ => Err(DecodeError::mismatch(target, term)),
    }
}

/// Combine a date tuple and a 4-field clock tuple into a count of `unit`.
///
/// The clock's fourth field is read in `unit` (ignored for whole seconds).
fn datetime_units(
    date_term: &Term,
    clock_parts: &[Term],
    target: &LogicalType,
    unit: TimestampUnit,
) -> Result<i64> {
    let date_parts = date_term
        .as_tuple(3)
        .ok_or_else(|| DecodeError::mismatch(target, date_term))?;
    let date = date_tuple(date_parts, target)?;
    let (hour, minute, second, fraction) = clock_fields(clock_parts, target)?;

    let fraction = match unit {
        TimestampUnit::Seconds => 0,
        _ if fraction >= unit.per_second() => {
            return Err(DecodeError::range(target, format!("sub-second {fraction}")));
        }
        _ => fraction,
    };
    let secs_of_day = i64::from(hour) * 3_600 + i64::from(minute) * 60 + i64::from(second);
    let units_of_day = secs_of_day * unit.per_second() + fraction;

    combine_timestamp(i64::from(date.days()), units_of_day, unit)
        .ok_or_else(|| DecodeError::range(target, format!("{date} {hour}:{minute}:{second}")))
}

fn timestamp(term: &Term, target: &LogicalType, unit: TimestampUnit) -> Result<i64> {
    match term {
        Term::Tuple(parts) if parts.len() == 2 => {
            let clock = parts[1]
                .as_tuple(4)
                .ok_or_else(|| DecodeError::mismatch(target, &parts[1]))?;
            datetime_units(&parts[0], clock, target, unit)
        }
        Term::ByteString(bytes) => {
            let text = utf8(bytes, target)?;
            parse_timestamp(text, unit).ok_or_else(|| DecodeError::malformed(target, text))
        }
        _ => Err(DecodeError::mismatch(target, term)),
    }
}

fn timestamp_tz(term: &Term, target: &LogicalType) -> Result<TimestampTz> {
    let (date_term, clock, offset) = match term {
        // (date, time) in UTC, or (date, time_with_offset)
        Term::Tuple(parts) if parts.len() == 2 => match &parts[1] {
            Term::Tuple(clock) if clock.len() == 4 => (&parts[0], &clock[..], 0),
            Term::Tuple(clock) if clock.len() == 5 => {
                (&parts[0], &clock[..4], offset_tuple(&clock[4], target)?)
            }
            other => return Err(DecodeError::mismatch(target, other)),
        },
        // (date, time, (offset_hours, offset_minutes))
        Term::Tuple(parts) if parts.len() == 3 => {
            let clock = parts[1]
                .as_tuple(4)
                .ok_or_else(|| DecodeError::mismatch(target, &parts[1]))?;
            (&parts[0], clock, offset_tuple(&parts[2], target)?)
        }
        Term::ByteString(bytes) => {
            let text = utf8(bytes, target)?;
            return parse_timestamp_tz(text).ok_or_else(|| DecodeError::malformed(target, text));
        }
        _ => return Err(DecodeError::mismatch(target, term)),
    };

    let local = datetime_units(date_term, clock, target, TimestampUnit::Micros)?;
    TimestampTz::from_local(local, offset).ok_or_else(|| DecodeError::range(target, local))
}

fn interval(term: &Term, target: &LogicalType) -> Result<Interval> {
    match term {
        Term::Tuple(parts) if parts.len() == 3 => {
            let months: i32 = component(&parts[0], target)?;
            let days: i32 = component(&parts[1], target)?;
            let micros: i64 = component(&parts[2], target)?;
            Interval::new(i64::from(months), i64::from(days), micros).ok_or_else(|| {
                DecodeError::range(target, format!("({months}, {days}, {micros})"))
            })
        }
        Term::Integer(_) => {
            let micros: i64 = integer(term, target)?;
            Ok(Interval::from_micros(micros))
        }
        Term::ByteString(bytes) => {
            let text = utf8(bytes, target)?;
            parse_interval(text).map_err(|e| literal_error(target, text, e))
        }
        _ => Err(DecodeError::mismatch(target, term)),
    }
}

fn uuid(term: &Term, target: &LogicalType) -> Result<Uuid> {
    match term {
        Term::ByteString(bytes) => {
            let text = utf8(bytes, target)?;
            Uuid::parse_str(text.trim()).map_err(|_| DecodeError::malformed(target, text))
        }
        Term::Tuple(parts) if parts.len() == 2 => Ok(Uuid::from_u128(join_u128(
            component(&parts[0], target)?,
            component(&parts[1], target)?,
        ))),
        _ => Err(DecodeError::mismatch(target, term)),
    }
}

// ============================================================================
// Composites
// ============================================================================

fn elements(items: &[Term], element_type: &LogicalType) -> Result<Vec<SqlValue>> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            decode_value(item, element_type).map_err(|e| e.at(Location::Index(idx)))
        })
        .collect()
}

fn map(
    term: &Term,
    target: &LogicalType,
    key_type: &LogicalType,
    value_type: &LogicalType,
) -> Result<Vec<(SqlValue, SqlValue)>> {
    let pairs: Vec<(&Term, &Term)> = match term {
        Term::AssocMap(entries) => entries.iter().map(|(k, v)| (k, v)).collect(),
        Term::List(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| match item.as_tuple(2) {
                Some(pair) => Ok((&pair[0], &pair[1])),
                None => Err(DecodeError::mismatch(target, item).at(Location::Index(idx))),
            })
            .collect::<Result<_>>()?,
        _ => return Err(DecodeError::mismatch(target, term)),
    };

    pairs
        .into_iter()
        .enumerate()
        .map(|(idx, (k, v))| {
            let key = decode_value(k, key_type).map_err(|e| e.at(Location::MapKey(idx)))?;
            let value = decode_value(v, value_type).map_err(|e| e.at(Location::MapValue(idx)))?;
            Ok((key, value))
        })
        .collect()
}

/// Field or member name given as a binary or an atom.
fn name_of<'a>(term: &'a Term, target: &LogicalType) -> Result<&'a str> {
    match term {
        Term::ByteString(bytes) => utf8(bytes, target),
        Term::Tag(name) => Ok(name),
        _ => Err(DecodeError::mismatch(target, term)),
    }
}

fn structure(term: &Term, target: &LogicalType, fields: &[Field]) -> Result<Vec<SqlValue>> {
    let Term::AssocMap(entries) = term else {
        return Err(DecodeError::mismatch(target, term));
    };

    let mut by_name: HashMap<&str, &Term> = HashMap::with_capacity(entries.len());
    for (key, value) in entries {
        let name = name_of(key, target)?;
        if !fields.iter().any(|f| f.name == name) {
            return Err(DecodeError::UnknownField(name.to_string()));
        }
        by_name.insert(name, value);
    }

    fields
        .iter()
        .map(|field| {
            let value = by_name
                .get(field.name.as_str())
                .ok_or_else(|| DecodeError::MissingField(field.name.clone()))?;
            decode_value(value, &field.field_type)
                .map_err(|e| e.at(Location::Field(field.name.clone())))
        })
        .collect()
}

fn union(term: &Term, target: &LogicalType, members: &[Field]) -> Result<SqlValue> {
    let (name_term, payload) = match term {
        Term::Tuple(parts) if parts.len() == 2 => (&parts[0], &parts[1]),
        Term::AssocMap(entries) if entries.len() == 1 => (&entries[0].0, &entries[0].1),
        _ => return Err(DecodeError::mismatch(target, term)),
    };
    let name = name_of(name_term, target)?;
    let (tag, member) = members
        .iter()
        .enumerate()
        .find(|(_, m)| m.name == name)
        .ok_or_else(|| DecodeError::UnknownUnionMember(name.to_string()))?;

    let value = decode_value(payload, &member.field_type)
        .map_err(|e| e.at(Location::Member(member.name.clone())))?;
    Ok(SqlValue::Union {
        tag,
        value: Box::new(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use duck_types::temporal::MICROS_PER_HOUR;

    fn bin(s: &str) -> Term {
        Term::binary(s)
    }

    fn tuple(items: Vec<Term>) -> Term {
        Term::tuple(items)
    }

    #[test]
    fn test_nil_decodes_to_null_for_any_type() {
        for ty in [
            LogicalType::Integer,
            LogicalType::Varchar,
            LogicalType::list(LogicalType::Date),
            LogicalType::Null,
        ] {
            let tv = decode(&Term::nil(), &ty).unwrap();
            assert!(tv.is_null());
            assert_eq!(tv.logical_type(), &ty);
        }
        assert!(decode(&Term::Null, &LogicalType::Uuid).unwrap().is_null());
        assert!(decode(&Term::int(1), &LogicalType::Null).is_err());
    }

    #[test]
    fn test_boolean() {
        assert_eq!(
            decode_value(&Term::tag("true"), &LogicalType::Boolean),
            Ok(SqlValue::Boolean(true))
        );
        assert!(matches!(
            decode_value(&Term::int(1), &LogicalType::Boolean),
            Err(DecodeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            decode_value(&bin("true"), &LogicalType::Boolean),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_integer_ranges() {
        assert_eq!(
            decode_value(&Term::int(255), &LogicalType::UTinyInt),
            Ok(SqlValue::UTinyInt(255))
        );
        assert!(matches!(
            decode_value(&Term::int(256), &LogicalType::UTinyInt),
            Err(DecodeError::RangeError { .. })
        ));
        assert!(matches!(
            decode_value(&Term::int(-1), &LogicalType::UBigInt),
            Err(DecodeError::RangeError { .. })
        ));
        assert_eq!(
            decode_value(&Term::int(u64::MAX), &LogicalType::UBigInt),
            Ok(SqlValue::UBigInt(u64::MAX))
        );
        assert_eq!(
            decode_value(&Term::int(i64::MIN), &LogicalType::BigInt),
            Ok(SqlValue::BigInt(i64::MIN))
        );
        assert!(matches!(
            decode_value(&Term::int(-129), &LogicalType::TinyInt),
            Err(DecodeError::RangeError { .. })
        ));
        assert!(matches!(
            decode_value(&Term::Float64(1.0), &LogicalType::Integer),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_hugeint_forms() {
        let ty = LogicalType::HugeInt;
        assert_eq!(
            decode_value(&tuple(vec![Term::int(1), Term::int(0)]), &ty),
            Ok(SqlValue::HugeInt(1 << 64))
        );
        assert_eq!(
            decode_value(&tuple(vec![Term::int(-1), Term::int(u64::MAX)]), &ty),
            Ok(SqlValue::HugeInt(-1))
        );
        assert_eq!(
            decode_value(&bin("-170141183460469231731687303715884105728"), &ty),
            Ok(SqlValue::HugeInt(i128::MIN))
        );
        assert!(matches!(
            decode_value(&bin("170141183460469231731687303715884105728"), &ty),
            Err(DecodeError::RangeError { .. })
        ));
        assert!(matches!(
            decode_value(&bin("12a"), &ty),
            Err(DecodeError::MalformedLiteral { .. })
        ));
        assert_eq!(
            decode_value(&Term::Float64(2.5), &ty),
            Ok(SqlValue::HugeInt(3))
        );
        assert_eq!(decode_value(&Term::int(-7), &ty), Ok(SqlValue::HugeInt(-7)));
    }

    #[test]
    fn test_uhugeint_forms() {
        let ty = LogicalType::UHugeInt;
        assert_eq!(
            decode_value(&tuple(vec![Term::int(u64::MAX), Term::int(u64::MAX)]), &ty),
            Ok(SqlValue::UHugeInt(u128::MAX))
        );
        assert!(matches!(
            decode_value(&tuple(vec![Term::int(-1), Term::int(0)]), &ty),
            Err(DecodeError::RangeError { .. })
        ));
        assert!(matches!(
            decode_value(&Term::int(-1), &ty),
            Err(DecodeError::RangeError { .. })
        ));
    }

    #[test]
    fn test_float_sources() {
        assert_eq!(
            decode_value(&Term::int(3), &LogicalType::Double),
            Ok(SqlValue::Double(3.0))
        );
        assert_eq!(
            decode_value(&Term::tag("-infinity"), &LogicalType::Float),
            Ok(SqlValue::Float(f32::NEG_INFINITY))
        );
        // Out of f32 range narrows to infinity instead of failing
        assert_eq!(
            decode_value(&Term::Float64(1e300), &LogicalType::Float),
            Ok(SqlValue::Float(f32::INFINITY))
        );
        assert!(decode_value(&bin("1.5"), &LogicalType::Double).is_err());
    }

    #[test]
    fn test_decimal_sources() {
        let ty = LogicalType::decimal(5, 2);
        assert_eq!(decode_value(&bin("12.5"), &ty), Ok(SqlValue::Decimal(1250)));
        assert_eq!(
            decode_value(&Term::Float64(1.005), &ty),
            Ok(SqlValue::Decimal(100))
        );
        assert_eq!(decode_value(&Term::int(7), &ty), Ok(SqlValue::Decimal(700)));
        assert!(matches!(
            decode_value(&Term::int(1000), &ty),
            Err(DecodeError::RangeError { .. })
        ));
        assert!(matches!(
            decode_value(&bin("1.2.3"), &ty),
            Err(DecodeError::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn test_decimal_explicit_forms() {
        let ty = LogicalType::decimal(10, 3);
        // Tuple scale 2 widened to the target scale 3
        let explicit = tuple(vec![Term::int(1250), Term::int(5), Term::int(2)]);
        assert_eq!(decode_value(&explicit, &ty), Ok(SqlValue::Decimal(12_500)));

        let tagged = tuple(vec![
            Term::tag("decimal"),
            tuple(vec![Term::int(1250), Term::int(5), Term::int(2)]),
        ]);
        assert_eq!(decode_value(&tagged, &ty), Ok(SqlValue::Decimal(12_500)));

        // Scale beyond the target's would lose digits
        let finer = tuple(vec![Term::int(1), Term::int(10), Term::int(5)]);
        assert!(matches!(
            decode_value(&finer, &ty),
            Err(DecodeError::RangeError { .. })
        ));

        // Invalid tuple parameters
        let invalid = tuple(vec![Term::int(1), Term::int(2), Term::int(3)]);
        assert!(matches!(
            decode_value(&invalid, &ty),
            Err(DecodeError::RangeError { .. })
        ));

        // 128-bit backing in the explicit form
        let wide = LogicalType::decimal(30, 10);
        let explicit = tuple(vec![
            tuple(vec![Term::int(0), Term::int(42)]),
            Term::int(30),
            Term::int(10),
        ]);
        assert_eq!(decode_value(&explicit, &wide), Ok(SqlValue::Decimal(42)));
    }

    #[test]
    fn test_decimal_hugeint_tuple_source() {
        let ty = LogicalType::decimal(38, 0);
        let term = tuple(vec![Term::int(1), Term::int(0)]);
        assert_eq!(decode_value(&term, &ty), Ok(SqlValue::Decimal(1 << 64)));
    }

    #[test]
    fn test_strings_and_blobs() {
        assert_eq!(
            decode_value(&bin("héllo"), &LogicalType::Varchar),
            Ok(SqlValue::Varchar("héllo".to_string()))
        );
        assert!(matches!(
            decode_value(&Term::binary([0xffu8]), &LogicalType::Varchar),
            Err(DecodeError::MalformedLiteral { .. })
        ));
        assert!(matches!(
            decode_value(&Term::tag("abc"), &LogicalType::Enum),
            Err(DecodeError::TypeMismatch { .. })
        ));

        let iodata = Term::list(vec![
            bin("ab"),
            Term::int(99),
            Term::list(vec![Term::binary([0x00u8])]),
        ]);
        assert_eq!(
            decode_value(&iodata, &LogicalType::Blob),
            Ok(SqlValue::Blob(vec![b'a', b'b', b'c', 0x00]))
        );
        assert!(decode_value(&Term::list(vec![Term::int(256)]), &LogicalType::Blob).is_err());
    }

    #[test]
    fn test_date_forms() {
        let expected = Ok(SqlValue::Date(Date::from_ymd(2024, 1, 15).unwrap()));
        let tuple_form = tuple(vec![Term::int(2024), Term::int(1), Term::int(15)]);
        assert_eq!(decode_value(&tuple_form, &LogicalType::Date), expected);
        assert_eq!(decode_value(&bin("2024-01-15"), &LogicalType::Date), expected);

        let bad_month = tuple(vec![Term::int(2024), Term::int(13), Term::int(1)]);
        assert!(matches!(
            decode_value(&bad_month, &LogicalType::Date),
            Err(DecodeError::RangeError { .. })
        ));
        let feb_30 = tuple(vec![Term::int(2024), Term::int(2), Term::int(30)]);
        assert!(matches!(
            decode_value(&feb_30, &LogicalType::Date),
            Err(DecodeError::RangeError { .. })
        ));
        assert!(matches!(
            decode_value(&bin("not a date"), &LogicalType::Date),
            Err(DecodeError::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn test_time_forms() {
        let term = tuple(vec![Term::int(10), Term::int(30), Term::int(5), Term::int(250_000)]);
        assert_eq!(
            decode_value(&term, &LogicalType::Time),
            Ok(SqlValue::Time(Time::from_hms_micro(10, 30, 5, 250_000).unwrap()))
        );
        let overflow = tuple(vec![
            Term::int(23),
            Term::int(59),
            Term::int(59),
            Term::int(1_000_000),
        ]);
        assert!(matches!(
            decode_value(&overflow, &LogicalType::Time),
            Err(DecodeError::RangeError { .. })
        ));
        let bad_hour = tuple(vec![Term::int(24), Term::int(0), Term::int(0), Term::int(0)]);
        assert!(decode_value(&bad_hour, &LogicalType::Time).is_err());
    }

    #[test]
    fn test_time_tz_offset_sign_on_hour() {
        let term = tuple(vec![
            Term::int(10),
            Term::int(0),
            Term::int(0),
            Term::int(0),
            tuple(vec![Term::int(-5), Term::int(30)]),
        ]);
        let Ok(SqlValue::TimeTz(value)) = decode_value(&term, &LogicalType::TimeTz) else {
            panic!("expected TIMETZ");
        };
        assert_eq!(value.offset_seconds(), -(5 * 3_600 + 30 * 60));

        let with_offset = |hours: i64, minutes: i64| {
            tuple(vec![
                Term::int(10),
                Term::int(0),
                Term::int(0),
                Term::int(0),
                tuple(vec![Term::int(hours), Term::int(minutes)]),
            ])
        };
        let accepted = [(16, 59, 61_140), (-16, 59, -61_140), (0, 30, 1_800)];
        for (hours, minutes, expected) in accepted {
            let Ok(SqlValue::TimeTz(value)) =
                decode_value(&with_offset(hours, minutes), &LogicalType::TimeTz)
            else {
                panic!("expected TIMETZ for offset {hours}:{minutes}");
            };
            assert_eq!(value.offset_seconds(), expected);
        }
        for (hours, minutes) in [(17, 0), (-17, 0), (5, 60)] {
            assert!(matches!(
                decode_value(&with_offset(hours, minutes), &LogicalType::TimeTz),
                Err(DecodeError::RangeError { .. })
            ));
        }
    }

    #[test]
    fn test_timestamp_units_follow_target() {
        let term = tuple(vec![
            tuple(vec![Term::int(1970), Term::int(1), Term::int(2)]),
            tuple(vec![Term::int(0), Term::int(0), Term::int(1), Term::int(5)]),
        ]);
        assert_eq!(
            decode_value(&term, &LogicalType::Timestamp),
            Ok(SqlValue::Timestamp(86_401_000_005))
        );
        assert_eq!(
            decode_value(&term, &LogicalType::TimestampMs),
            Ok(SqlValue::TimestampMs(86_401_005))
        );
        assert_eq!(
            decode_value(&term, &LogicalType::TimestampNs),
            Ok(SqlValue::TimestampNs(86_401_000_000_005))
        );
        assert_eq!(
            decode_value(&term, &LogicalType::TimestampS),
            Ok(SqlValue::TimestampS(86_401))
        );

        let too_fine = tuple(vec![
            tuple(vec![Term::int(1970), Term::int(1), Term::int(2)]),
            tuple(vec![Term::int(0), Term::int(0), Term::int(1), Term::int(1_000)]),
        ]);
        assert!(matches!(
            decode_value(&too_fine, &LogicalType::TimestampMs),
            Err(DecodeError::RangeError { .. })
        ));
    }

    #[test]
    fn test_timestamp_tz_forms() {
        let date = tuple(vec![Term::int(2024), Term::int(1), Term::int(15)]);
        let clock = tuple(vec![Term::int(10), Term::int(30), Term::int(0), Term::int(0)]);
        let offset = tuple(vec![Term::int(5), Term::int(0)]);

        let utc = decode_value(&tuple(vec![date.clone(), clock.clone()]), &LogicalType::TimestampTz);
        let Ok(SqlValue::TimestampTz(utc)) = utc else {
            panic!("expected TIMESTAMPTZ");
        };
        assert_eq!(utc.offset_seconds(), 0);

        let three = tuple(vec![date.clone(), clock.clone(), offset.clone()]);
        let Ok(SqlValue::TimestampTz(shifted)) = decode_value(&three, &LogicalType::TimestampTz)
        else {
            panic!("expected TIMESTAMPTZ");
        };
        assert_eq!(shifted.offset_seconds(), 5 * 3_600);
        assert_eq!(shifted.micros(), utc.micros() - 5 * MICROS_PER_HOUR);

        let Term::Tuple(mut clock5) = clock else {
            unreachable!()
        };
        clock5.push(offset);
        let nested = tuple(vec![date, Term::Tuple(clock5)]);
        assert_eq!(
            decode_value(&nested, &LogicalType::TimestampTz),
            Ok(SqlValue::TimestampTz(shifted))
        );

        assert_eq!(
            decode_value(&bin("2024-01-15T10:30:00+05:00"), &LogicalType::TimestampTz),
            Ok(SqlValue::TimestampTz(shifted))
        );

        let edge = tuple(vec![
            tuple(vec![Term::int(2024), Term::int(1), Term::int(15)]),
            tuple(vec![Term::int(10), Term::int(30), Term::int(0), Term::int(0)]),
            tuple(vec![Term::int(-16), Term::int(59)]),
        ]);
        let Ok(SqlValue::TimestampTz(edge)) = decode_value(&edge, &LogicalType::TimestampTz) else {
            panic!("expected TIMESTAMPTZ");
        };
        assert_eq!(edge.offset_seconds(), -61_140);
    }

    #[test]
    fn test_zoned_strings_with_non_ascii_offsets() {
        for text in ["10:30+0é5", "10:30:00+é", "10:30-05:3é"] {
            assert!(matches!(
                decode_value(&bin(text), &LogicalType::TimeTz),
                Err(DecodeError::MalformedLiteral { .. })
            ));
        }
        for text in ["2024-01-15 10:30:00+0é5", "2024-01-15T10:30:00+05:é0"] {
            assert!(matches!(
                decode_value(&bin(text), &LogicalType::TimestampTz),
                Err(DecodeError::MalformedLiteral { .. })
            ));
        }
    }

    #[test]
    fn test_interval_forms() {
        let term = tuple(vec![Term::int(1), Term::int(2), Term::int(3)]);
        assert_eq!(
            decode_value(&term, &LogicalType::Interval),
            Ok(SqlValue::Interval(Interval::new(1, 2, 3).unwrap()))
        );
        let Ok(SqlValue::Interval(hours)) =
            decode_value(&Term::int(MICROS_PER_HOUR * 25), &LogicalType::Interval)
        else {
            panic!("expected INTERVAL");
        };
        assert_eq!(
            (hours.months(), hours.days(), hours.micros()),
            (0, 0, 25 * MICROS_PER_HOUR)
        );

        let Ok(SqlValue::Interval(days)) = decode_value(
            &tuple(vec![Term::int(0), Term::int(45), Term::int(0)]),
            &LogicalType::Interval,
        ) else {
            panic!("expected INTERVAL");
        };
        assert_eq!((days.months(), days.days(), days.micros()), (0, 45, 0));
        assert_eq!(
            decode_value(&bin("2 days"), &LogicalType::Interval),
            Ok(SqlValue::Interval(Interval::new(0, 2, 0).unwrap()))
        );
        assert!(matches!(
            decode_value(&bin("2 fortnights"), &LogicalType::Interval),
            Err(DecodeError::MalformedLiteral { .. })
        ));
        let too_big = tuple(vec![Term::int(i64::from(i32::MAX) + 1), Term::int(0), Term::int(0)]);
        assert!(matches!(
            decode_value(&too_big, &LogicalType::Interval),
            Err(DecodeError::RangeError { .. })
        ));
    }

    #[test]
    fn test_uuid_forms() {
        let text = "550e8400-e29b-41d4-a716-446655440000";
        let expected = Uuid::parse_str(text).unwrap();
        assert_eq!(
            decode_value(&bin(text), &LogicalType::Uuid),
            Ok(SqlValue::Uuid(expected))
        );
        assert_eq!(
            decode_value(&bin("550e8400e29b41d4a716446655440000"), &LogicalType::Uuid),
            Ok(SqlValue::Uuid(expected))
        );
        let (high, low) = crate::numeric::split_u128(expected.as_u128());
        assert_eq!(
            decode_value(&tuple(vec![Term::int(high), Term::int(low)]), &LogicalType::Uuid),
            Ok(SqlValue::Uuid(expected))
        );
        assert!(matches!(
            decode_value(&bin("not-a-uuid"), &LogicalType::Uuid),
            Err(DecodeError::MalformedLiteral { .. })
        ));
    }

    #[test]
    fn test_list_and_array() {
        let list_ty = LogicalType::list(LogicalType::Integer);
        assert_eq!(
            decode_value(&Term::list(vec![]), &list_ty),
            Ok(SqlValue::List(vec![]))
        );

        let err = decode_value(
            &Term::list(vec![Term::int(1), bin("x")]),
            &list_ty,
        )
        .unwrap_err();
        assert_eq!(err.path(), vec![&Location::Index(1)]);
        assert!(matches!(err.root_cause(), DecodeError::TypeMismatch { .. }));

        let array_ty = LogicalType::array(LogicalType::Integer, 2);
        assert_eq!(
            decode_value(&Term::list(vec![Term::int(1), Term::nil()]), &array_ty),
            Ok(SqlValue::Array(vec![SqlValue::Integer(1), SqlValue::Null]))
        );
        assert!(matches!(
            decode_value(&Term::list(vec![Term::int(1)]), &array_ty),
            Err(DecodeError::ArityMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_map_forms_keep_duplicates() {
        let ty = LogicalType::map(LogicalType::Varchar, LogicalType::Integer);
        let pairs = Term::list(vec![
            tuple(vec![bin("a"), Term::int(1)]),
            tuple(vec![bin("a"), Term::int(2)]),
        ]);
        assert_eq!(
            decode_value(&pairs, &ty),
            Ok(SqlValue::Map(vec![
                (SqlValue::Varchar("a".into()), SqlValue::Integer(1)),
                (SqlValue::Varchar("a".into()), SqlValue::Integer(2)),
            ]))
        );

        let assoc = Term::AssocMap(vec![(bin("b"), Term::int(3))]);
        assert_eq!(
            decode_value(&assoc, &ty),
            Ok(SqlValue::Map(vec![(
                SqlValue::Varchar("b".into()),
                SqlValue::Integer(3)
            )]))
        );

        let bad_value = Term::AssocMap(vec![(bin("b"), bin("x"))]);
        let err = decode_value(&bad_value, &ty).unwrap_err();
        assert_eq!(err.path(), vec![&Location::MapValue(0)]);
    }

    #[test]
    fn test_struct_fields() {
        let ty = LogicalType::structure([("a", LogicalType::Integer), ("b", LogicalType::Varchar)]);
        let term = Term::AssocMap(vec![
            (Term::tag("b"), bin("x")),
            (bin("a"), Term::int(1)),
        ]);
        assert_eq!(
            decode_value(&term, &ty),
            Ok(SqlValue::Struct(vec![
                SqlValue::Integer(1),
                SqlValue::Varchar("x".into())
            ]))
        );

        let missing = Term::AssocMap(vec![(bin("a"), Term::int(1))]);
        assert_eq!(
            decode_value(&missing, &ty),
            Err(DecodeError::MissingField("b".to_string()))
        );

        let extra = Term::AssocMap(vec![
            (bin("a"), Term::int(1)),
            (bin("b"), bin("x")),
            (bin("c"), Term::int(2)),
        ]);
        assert_eq!(
            decode_value(&extra, &ty),
            Err(DecodeError::UnknownField("c".to_string()))
        );

        let empty: Vec<(&str, LogicalType)> = Vec::new();
        assert_eq!(
            decode_value(&Term::AssocMap(vec![]), &LogicalType::structure(empty)),
            Ok(SqlValue::Struct(vec![]))
        );
    }

    #[test]
    fn test_union_members() {
        let ty = LogicalType::union([("a", LogicalType::Integer), ("b", LogicalType::Integer)]);
        let expected = Ok(SqlValue::Union {
            tag: 1,
            value: Box::new(SqlValue::Integer(42)),
        });
        assert_eq!(decode_value(&tuple(vec![bin("b"), Term::int(42)]), &ty), expected);
        assert_eq!(
            decode_value(&Term::AssocMap(vec![(bin("b"), Term::int(42))]), &ty),
            expected
        );
        assert_eq!(
            decode_value(&tuple(vec![bin("B"), Term::int(42)]), &ty),
            Err(DecodeError::UnknownUnionMember("B".to_string()))
        );
    }

    #[test]
    fn test_invalid_target_type() {
        let err = decode(&Term::int(1), &LogicalType::decimal(50, 2)).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidType(_)));
    }

    #[test]
    fn test_term_with_schema() {
        let tws = TermWithSchema::new(Term::int(42), LogicalType::BigInt);
        let tv = TypedValue::try_from(tws).unwrap();
        assert_eq!(tv, TypedValue::bigint(42));
    }
}

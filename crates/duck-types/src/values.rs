//! Value representations.
//!
//! [`SqlValue`] is the bare payload, one case per logical kind plus a single
//! kind-independent `Null`. [`TypedValue`] pairs a payload with the
//! [`LogicalType`] it belongs to; it is the unit every codec works with.

use crate::temporal::{write_timestamp, Date, Interval, Time, TimeTz, TimestampTz, TimestampUnit};
use crate::types::{LogicalType, TypeError};
use std::fmt;
use uuid::Uuid;

/// Payload of a SQL value.
///
/// Composite payloads hold child payloads only; their types live in the
/// owning [`TypedValue`]'s type tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL of any type
    Null,

    Boolean(bool),
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    UTinyInt(u8),
    USmallInt(u16),
    UInteger(u32),
    UBigInt(u64),
    HugeInt(i128),
    UHugeInt(u128),
    Float(f32),
    Double(f64),

    /// Unscaled decimal; the scale comes from the type
    Decimal(i128),

    Varchar(String),
    Char(String),
    Blob(Vec<u8>),

    /// Enum label
    Enum(String),

    Date(Date),
    Time(Time),
    TimeTz(TimeTz),

    /// Microseconds since the epoch
    Timestamp(i64),
    /// Seconds since the epoch
    TimestampS(i64),
    /// Milliseconds since the epoch
    TimestampMs(i64),
    /// Nanoseconds since the epoch
    TimestampNs(i64),

    TimestampTz(TimestampTz),
    Interval(Interval),
    Uuid(Uuid),

    List(Vec<SqlValue>),
    Array(Vec<SqlValue>),

    /// Entries in insertion order; duplicate keys are kept
    Map(Vec<(SqlValue, SqlValue)>),

    /// Field values in declared field order
    Struct(Vec<SqlValue>),

    /// Active member index and its payload
    Union { tag: usize, value: Box<SqlValue> },
}

impl SqlValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Name of the payload case, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Boolean(_) => "BOOLEAN",
            Self::TinyInt(_) => "TINYINT",
            Self::SmallInt(_) => "SMALLINT",
            Self::Integer(_) => "INTEGER",
            Self::BigInt(_) => "BIGINT",
            Self::UTinyInt(_) => "UTINYINT",
            Self::USmallInt(_) => "USMALLINT",
            Self::UInteger(_) => "UINTEGER",
            Self::UBigInt(_) => "UBIGINT",
            Self::HugeInt(_) => "HUGEINT",
            Self::UHugeInt(_) => "UHUGEINT",
            Self::Float(_) => "FLOAT",
            Self::Double(_) => "DOUBLE",
            Self::Decimal(_) => "DECIMAL",
            Self::Varchar(_) => "VARCHAR",
            Self::Char(_) => "CHAR",
            Self::Blob(_) => "BLOB",
            Self::Enum(_) => "ENUM",
            Self::Date(_) => "DATE",
            Self::Time(_) => "TIME",
            Self::TimeTz(_) => "TIMETZ",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::TimestampS(_) => "TIMESTAMP_S",
            Self::TimestampMs(_) => "TIMESTAMP_MS",
            Self::TimestampNs(_) => "TIMESTAMP_NS",
            Self::TimestampTz(_) => "TIMESTAMPTZ",
            Self::Interval(_) => "INTERVAL",
            Self::Uuid(_) => "UUID",
            Self::List(_) => "LIST",
            Self::Array(_) => "ARRAY",
            Self::Map(_) => "MAP",
            Self::Struct(_) => "STRUCT",
            Self::Union { .. } => "UNION",
        }
    }
}

/// Check that `value` is a valid payload for `ty`, recursively.
pub fn check_payload(ty: &LogicalType, value: &SqlValue) -> Result<(), TypeError> {
    let mismatch = || TypeError::ValueMismatch {
        expected: ty.to_string(),
        found: value.kind_name(),
    };

    match (ty, value) {
        (_, SqlValue::Null) => Ok(()),
        (LogicalType::Boolean, SqlValue::Boolean(_))
        | (LogicalType::TinyInt, SqlValue::TinyInt(_))
        | (LogicalType::SmallInt, SqlValue::SmallInt(_))
        | (LogicalType::Integer, SqlValue::Integer(_))
        | (LogicalType::BigInt, SqlValue::BigInt(_))
        | (LogicalType::UTinyInt, SqlValue::UTinyInt(_))
        | (LogicalType::USmallInt, SqlValue::USmallInt(_))
        | (LogicalType::UInteger, SqlValue::UInteger(_))
        | (LogicalType::UBigInt, SqlValue::UBigInt(_))
        | (LogicalType::HugeInt, SqlValue::HugeInt(_))
        | (LogicalType::UHugeInt, SqlValue::UHugeInt(_))
        | (LogicalType::Float, SqlValue::Float(_))
        | (LogicalType::Double, SqlValue::Double(_))
        | (LogicalType::Varchar, SqlValue::Varchar(_))
        | (LogicalType::Char, SqlValue::Char(_))
        | (LogicalType::Blob, SqlValue::Blob(_))
        | (LogicalType::Enum, SqlValue::Enum(_))
        | (LogicalType::Date, SqlValue::Date(_))
        | (LogicalType::Time, SqlValue::Time(_))
        | (LogicalType::TimeTz, SqlValue::TimeTz(_))
        | (LogicalType::Timestamp, SqlValue::Timestamp(_))
        | (LogicalType::TimestampS, SqlValue::TimestampS(_))
        | (LogicalType::TimestampMs, SqlValue::TimestampMs(_))
        | (LogicalType::TimestampNs, SqlValue::TimestampNs(_))
        | (LogicalType::TimestampTz, SqlValue::TimestampTz(_))
        | (LogicalType::Interval, SqlValue::Interval(_))
        | (LogicalType::Uuid, SqlValue::Uuid(_)) => Ok(()),
        (LogicalType::Decimal { width, .. }, SqlValue::Decimal(unscaled)) => {
            let limit = 10u128.checked_pow(u32::from(*width)).ok_or(TypeError::InvalidDecimal {
                width: *width,
                scale: 0,
            })?;
            if unscaled.unsigned_abs() >= limit {
                return Err(TypeError::DecimalOverflow {
                    value: *unscaled,
                    width: *width,
                });
            }
            Ok(())
        }
        (LogicalType::List { element_type }, SqlValue::List(items)) => items
            .iter()
            .try_for_each(|item| check_payload(element_type, item)),
        (LogicalType::Array { element_type, size }, SqlValue::Array(items)) => {
            if items.len() != *size as usize {
                return Err(TypeError::ArrayLength {
                    expected: *size,
                    actual: items.len(),
                });
            }
            items
                .iter()
                .try_for_each(|item| check_payload(element_type, item))
        }
        (
            LogicalType::Map {
                key_type,
                value_type,
            },
            SqlValue::Map(entries),
        ) => entries.iter().try_for_each(|(k, v)| {
            check_payload(key_type, k)?;
            check_payload(value_type, v)
        }),
        (LogicalType::Struct { fields }, SqlValue::Struct(values)) => {
            if fields.len() != values.len() {
                return Err(mismatch());
            }
            fields
                .iter()
                .zip(values)
                .try_for_each(|(field, v)| check_payload(&field.field_type, v))
        }
        (LogicalType::Union { members }, SqlValue::Union { tag, value }) => {
            let member = members.get(*tag).ok_or(TypeError::UnionTag {
                tag: *tag,
                members: members.len(),
            })?;
            check_payload(&member.field_type, value)
        }
        _ => Err(mismatch()),
    }
}

/// Typed value: a payload together with its logical type.
///
/// The payload always matches the type; construction goes through
/// [`TypedValue::new`] or one of the checked constructors.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    logical_type: LogicalType,
    value: SqlValue,
}

impl TypedValue {
    /// Create a new typed value, checking the payload against the type.
    pub fn new(logical_type: LogicalType, value: SqlValue) -> Result<Self, TypeError> {
        check_payload(&logical_type, &value)?;
        Ok(Self {
            logical_type,
            value,
        })
    }

    /// Create a null typed value with a specified type.
    pub fn null(logical_type: LogicalType) -> Self {
        Self {
            logical_type,
            value: SqlValue::Null,
        }
    }

    /// Create a boolean typed value.
    pub fn boolean(value: bool) -> Self {
        Self::leaf(LogicalType::Boolean, SqlValue::Boolean(value))
    }

    /// Create an integer typed value.
    pub fn integer(value: i32) -> Self {
        Self::leaf(LogicalType::Integer, SqlValue::Integer(value))
    }

    /// Create a bigint typed value.
    pub fn bigint(value: i64) -> Self {
        Self::leaf(LogicalType::BigInt, SqlValue::BigInt(value))
    }

    /// Create a hugeint typed value.
    pub fn hugeint(value: i128) -> Self {
        Self::leaf(LogicalType::HugeInt, SqlValue::HugeInt(value))
    }

    /// Create a double typed value.
    pub fn double(value: f64) -> Self {
        Self::leaf(LogicalType::Double, SqlValue::Double(value))
    }

    /// Create a varchar typed value.
    pub fn varchar(value: impl Into<String>) -> Self {
        Self::leaf(LogicalType::Varchar, SqlValue::Varchar(value.into()))
    }

    /// Create a blob typed value.
    pub fn blob(value: Vec<u8>) -> Self {
        Self::leaf(LogicalType::Blob, SqlValue::Blob(value))
    }

    /// Create a UUID typed value.
    pub fn uuid(value: Uuid) -> Self {
        Self::leaf(LogicalType::Uuid, SqlValue::Uuid(value))
    }

    /// Create a date typed value.
    pub fn date(value: Date) -> Self {
        Self::leaf(LogicalType::Date, SqlValue::Date(value))
    }

    /// Create a decimal typed value from its unscaled integer.
    pub fn decimal(unscaled: i128, width: u8, scale: u8) -> Result<Self, TypeError> {
        let ty = LogicalType::decimal(width, scale);
        ty.validate()?;
        Self::new(ty, SqlValue::Decimal(unscaled))
    }

    /// Create a list typed value.
    pub fn list(element_type: LogicalType, items: Vec<SqlValue>) -> Result<Self, TypeError> {
        Self::new(LogicalType::list(element_type), SqlValue::List(items))
    }

    fn leaf(logical_type: LogicalType, value: SqlValue) -> Self {
        Self {
            logical_type,
            value,
        }
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }

    pub fn value(&self) -> &SqlValue {
        &self.value
    }

    /// Check if this typed value is null.
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Convert a non-null DECIMAL to `rust_decimal`, `None` if it does not
    /// fit (scale above 28 or more than 96 bits of mantissa).
    pub fn to_rust_decimal(&self) -> Option<rust_decimal::Decimal> {
        match (&self.logical_type, &self.value) {
            (LogicalType::Decimal { scale, .. }, SqlValue::Decimal(unscaled)) => {
                rust_decimal::Decimal::try_from_i128_with_scale(*unscaled, u32::from(*scale)).ok()
            }
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_value(f, &self.logical_type, &self.value)
    }
}

/// Render an unscaled decimal with `scale` fractional digits.
pub fn format_decimal(unscaled: i128, scale: u8) -> String {
    let digits = unscaled.unsigned_abs().to_string();
    let sign = if unscaled < 0 { "-" } else { "" };
    let scale = usize::from(scale);
    if scale == 0 {
        return format!("{sign}{digits}");
    }
    let padded = format!("{digits:0>width$}", width = scale + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{sign}{int_part}.{frac_part}")
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "'{}'", s.replace('\'', "''"))
}

fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_nan() {
        f.write_str("'nan'")
    } else if value.is_infinite() {
        f.write_str(if value > 0.0 { "'inf'" } else { "'-inf'" })
    } else {
        write!(f, "{value}")
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, element_type: &LogicalType, items: &[SqlValue]) -> fmt::Result {
    f.write_str("[")?;
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        fmt_value(f, element_type, item)?;
    }
    f.write_str("]")
}

fn fmt_value(f: &mut fmt::Formatter<'_>, ty: &LogicalType, value: &SqlValue) -> fmt::Result {
    match (ty, value) {
        (_, SqlValue::Null) => f.write_str("NULL"),
        (_, SqlValue::Boolean(b)) => write!(f, "{b}"),
        (_, SqlValue::TinyInt(n)) => write!(f, "{n}"),
        (_, SqlValue::SmallInt(n)) => write!(f, "{n}"),
        (_, SqlValue::Integer(n)) => write!(f, "{n}"),
        (_, SqlValue::BigInt(n)) => write!(f, "{n}"),
        (_, SqlValue::UTinyInt(n)) => write!(f, "{n}"),
        (_, SqlValue::USmallInt(n)) => write!(f, "{n}"),
        (_, SqlValue::UInteger(n)) => write!(f, "{n}"),
        (_, SqlValue::UBigInt(n)) => write!(f, "{n}"),
        (_, SqlValue::HugeInt(n)) => write!(f, "{n}"),
        (_, SqlValue::UHugeInt(n)) => write!(f, "{n}"),
        (_, SqlValue::Float(v)) => write_float(f, f64::from(*v)),
        (_, SqlValue::Double(v)) => write_float(f, *v),
        (LogicalType::Decimal { scale, .. }, SqlValue::Decimal(unscaled)) => {
            f.write_str(&format_decimal(*unscaled, *scale))
        }
        (_, SqlValue::Decimal(unscaled)) => write!(f, "{unscaled}"),
        (_, SqlValue::Varchar(s)) | (_, SqlValue::Char(s)) | (_, SqlValue::Enum(s)) => {
            write_quoted(f, s)
        }
        (_, SqlValue::Blob(bytes)) => {
            f.write_str("'")?;
            for byte in bytes {
                if (byte.is_ascii_graphic() && *byte != b'\\' && *byte != b'\'') || *byte == b' ' {
                    write!(f, "{}", *byte as char)?;
                } else {
                    write!(f, "\\x{byte:02X}")?;
                }
            }
            f.write_str("'")
        }
        (_, SqlValue::Date(d)) => write!(f, "{d}"),
        (_, SqlValue::Time(t)) => write!(f, "{t}"),
        (_, SqlValue::TimeTz(t)) => write!(f, "{t}"),
        (_, SqlValue::Timestamp(v)) => write_timestamp(f, *v, TimestampUnit::Micros),
        (_, SqlValue::TimestampS(v)) => write_timestamp(f, *v, TimestampUnit::Seconds),
        (_, SqlValue::TimestampMs(v)) => write_timestamp(f, *v, TimestampUnit::Millis),
        (_, SqlValue::TimestampNs(v)) => write_timestamp(f, *v, TimestampUnit::Nanos),
        (_, SqlValue::TimestampTz(v)) => write!(f, "{v}"),
        (_, SqlValue::Interval(v)) => write!(f, "{v}"),
        (_, SqlValue::Uuid(v)) => write!(f, "{}", v.hyphenated()),
        (LogicalType::List { element_type }, SqlValue::List(items))
        | (LogicalType::Array { element_type, .. }, SqlValue::Array(items)) => {
            write_list(f, element_type, items)
        }
        (
            LogicalType::Map {
                key_type,
                value_type,
            },
            SqlValue::Map(entries),
        ) => {
            f.write_str("{")?;
            for (idx, (k, v)) in entries.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                fmt_value(f, key_type, k)?;
                f.write_str("=")?;
                fmt_value(f, value_type, v)?;
            }
            f.write_str("}")
        }
        (LogicalType::Struct { fields }, SqlValue::Struct(values)) => {
            f.write_str("{")?;
            for (idx, (field, v)) in fields.iter().zip(values).enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write_quoted(f, &field.name)?;
                f.write_str(": ")?;
                fmt_value(f, &field.field_type, v)?;
            }
            f.write_str("}")
        }
        (LogicalType::Union { members }, SqlValue::Union { tag, value }) => match members.get(*tag) {
            Some(member) => fmt_value(f, &member.field_type, value),
            None => write!(f, "{value:?}"),
        },
        (_, other) => write!(f, "{other:?}"),
    }
}

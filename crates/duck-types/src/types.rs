//! Logical type model.
//!
//! [`LogicalType`] is the declared SQL type of a column, parameter or nested
//! value. It is a closed enum: every conversion site matches on it
//! exhaustively, so adding a kind forces every codec path to be updated.
//!
//! Trees are built by whoever owns the schema (a catalog, a prepared
//! statement, a YAML schema file) and are only ever read by the codec.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Largest DECIMAL width (total digits) supported.
pub const MAX_DECIMAL_WIDTH: u8 = 38;

/// Errors raised while validating a type tree or pairing a value with a type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    /// DECIMAL parameters outside `1..=38` / `0..=width`
    #[error("invalid DECIMAL({width},{scale}): width must be 1-38 and scale at most width")]
    InvalidDecimal { width: u8, scale: u8 },

    /// Two struct fields or union members share a name
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// A struct field or union member without a name
    #[error("{kind} name must not be empty")]
    EmptyName { kind: &'static str },

    /// UNION declared without members
    #[error("UNION must declare at least one member")]
    EmptyUnion,

    /// Payload case does not match the logical type
    #[error("value of kind {found} does not match type {expected}")]
    ValueMismatch { expected: String, found: &'static str },

    /// Unscaled decimal does not fit the declared width
    #[error("unscaled value {value} does not fit DECIMAL width {width}")]
    DecimalOverflow { value: i128, width: u8 },

    /// Fixed-size array payload with the wrong element count
    #[error("ARRAY expects {expected} elements, got {actual}")]
    ArrayLength { expected: u32, actual: usize },

    /// Union tag outside the member list
    #[error("union tag {tag} out of range for {members} members")]
    UnionTag { tag: usize, members: usize },
}

/// Named child of a STRUCT or UNION type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Field or member name
    pub name: String,

    /// Child type
    #[serde(rename = "type")]
    pub field_type: LogicalType,
}

impl Field {
    /// Create a new named child.
    pub fn new(name: impl Into<String>, field_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Native integer width backing a DECIMAL's unscaled value.
///
/// Always derived from the declared width, never from the magnitude of a
/// particular value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalBacking {
    Int16,
    Int32,
    Int64,
    Int128,
}

impl DecimalBacking {
    /// Backing width for a DECIMAL of the given width, `None` if the width is
    /// outside `1..=38`.
    pub fn for_width(width: u8) -> Option<Self> {
        match width {
            1..=4 => Some(Self::Int16),
            5..=9 => Some(Self::Int32),
            10..=18 => Some(Self::Int64),
            19..=MAX_DECIMAL_WIDTH => Some(Self::Int128),
            _ => None,
        }
    }
}

/// Declared SQL type of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicalType {
    /// The type of an untyped NULL literal
    Null,

    /// BOOLEAN
    Boolean,

    // Signed integers
    /// 8-bit signed integer
    TinyInt,
    /// 16-bit signed integer
    SmallInt,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    BigInt,

    // Unsigned integers
    /// 8-bit unsigned integer
    UTinyInt,
    /// 16-bit unsigned integer
    USmallInt,
    /// 32-bit unsigned integer
    UInteger,
    /// 64-bit unsigned integer
    UBigInt,

    // 128-bit integers
    /// 128-bit signed integer
    HugeInt,
    /// 128-bit unsigned integer
    UHugeInt,

    // Floating point
    /// 32-bit IEEE 754 floating point
    Float,
    /// 64-bit IEEE 754 floating point
    Double,

    /// Exact decimal with declared width (total digits) and scale
    Decimal {
        /// Total number of digits, 1-38
        width: u8,
        /// Digits after the decimal point
        scale: u8,
    },

    // Strings and bytes
    /// Variable-length UTF-8 string
    Varchar,
    /// Fixed-length character string
    Char,
    /// Binary large object
    Blob,
    /// Enumeration; values carry their label
    Enum,

    // Temporal types
    /// Calendar date
    Date,
    /// Time of day, microsecond precision
    Time,
    /// Time of day with a UTC offset
    TimeTz,
    /// Timestamp, microsecond precision
    Timestamp,
    /// Timestamp, whole seconds
    TimestampS,
    /// Timestamp, millisecond precision
    TimestampMs,
    /// Timestamp, nanosecond precision
    TimestampNs,
    /// Instant with time zone, microsecond precision
    TimestampTz,
    /// Months/days/microseconds interval
    Interval,

    /// UUID (128-bit)
    Uuid,

    // Composite types
    /// Variable-length list
    List {
        /// Element type
        element_type: Box<LogicalType>,
    },

    /// Fixed-length array
    Array {
        /// Element type
        element_type: Box<LogicalType>,
        /// Number of elements every value must have
        size: u32,
    },

    /// Key/value map
    Map {
        /// Key type
        key_type: Box<LogicalType>,
        /// Value type
        value_type: Box<LogicalType>,
    },

    /// Struct with ordered, uniquely named fields
    Struct {
        /// Fields in declaration order
        fields: Vec<Field>,
    },

    /// Tagged union with ordered, uniquely named members
    Union {
        /// Members in declaration order; the tag is the index
        members: Vec<Field>,
    },
}

impl LogicalType {
    /// Create a DECIMAL type.
    pub fn decimal(width: u8, scale: u8) -> Self {
        Self::Decimal { width, scale }
    }

    /// Create a LIST type.
    pub fn list(element_type: LogicalType) -> Self {
        Self::List {
            element_type: Box::new(element_type),
        }
    }

    /// Create a fixed-size ARRAY type.
    pub fn array(element_type: LogicalType, size: u32) -> Self {
        Self::Array {
            element_type: Box::new(element_type),
            size,
        }
    }

    /// Create a MAP type.
    pub fn map(key_type: LogicalType, value_type: LogicalType) -> Self {
        Self::Map {
            key_type: Box::new(key_type),
            value_type: Box::new(value_type),
        }
    }

    /// Create a STRUCT type from `(name, type)` pairs.
    pub fn structure<N: Into<String>>(fields: impl IntoIterator<Item = (N, LogicalType)>) -> Self {
        Self::Struct {
            fields: fields
                .into_iter()
                .map(|(name, ty)| Field::new(name, ty))
                .collect(),
        }
    }

    /// Create a UNION type from `(name, type)` pairs.
    pub fn union<N: Into<String>>(members: impl IntoIterator<Item = (N, LogicalType)>) -> Self {
        Self::Union {
            members: members
                .into_iter()
                .map(|(name, ty)| Field::new(name, ty))
                .collect(),
        }
    }

    /// Check the structural constraints of this type tree.
    pub fn validate(&self) -> Result<(), TypeError> {
        match self {
            Self::Decimal { width, scale } => {
                if DecimalBacking::for_width(*width).is_none() || scale > width {
                    return Err(TypeError::InvalidDecimal {
                        width: *width,
                        scale: *scale,
                    });
                }
                Ok(())
            }
            Self::List { element_type } | Self::Array { element_type, .. } => {
                element_type.validate()
            }
            Self::Map {
                key_type,
                value_type,
            } => {
                key_type.validate()?;
                value_type.validate()
            }
            Self::Struct { fields } => validate_children("struct field", fields),
            Self::Union { members } => {
                if members.is_empty() {
                    return Err(TypeError::EmptyUnion);
                }
                validate_children("union member", members)
            }
            _ => Ok(()),
        }
    }

    /// Backing integer width for a DECIMAL type, `None` for other kinds.
    pub fn decimal_backing(&self) -> Option<DecimalBacking> {
        match self {
            Self::Decimal { width, .. } => DecimalBacking::for_width(*width),
            _ => None,
        }
    }
}

fn validate_children(kind: &'static str, children: &[Field]) -> Result<(), TypeError> {
    let mut seen = HashSet::new();
    for child in children {
        if child.name.is_empty() {
            return Err(TypeError::EmptyName { kind });
        }
        if !seen.insert(child.name.as_str()) {
            return Err(TypeError::DuplicateName {
                kind,
                name: child.name.clone(),
            });
        }
        child.field_type.validate()?;
    }
    Ok(())
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Boolean => f.write_str("BOOLEAN"),
            Self::TinyInt => f.write_str("TINYINT"),
            Self::SmallInt => f.write_str("SMALLINT"),
            Self::Integer => f.write_str("INTEGER"),
            Self::BigInt => f.write_str("BIGINT"),
            Self::UTinyInt => f.write_str("UTINYINT"),
            Self::USmallInt => f.write_str("USMALLINT"),
            Self::UInteger => f.write_str("UINTEGER"),
            Self::UBigInt => f.write_str("UBIGINT"),
            Self::HugeInt => f.write_str("HUGEINT"),
            Self::UHugeInt => f.write_str("UHUGEINT"),
            Self::Float => f.write_str("FLOAT"),
            Self::Double => f.write_str("DOUBLE"),
            Self::Decimal { width, scale } => write!(f, "DECIMAL({width},{scale})"),
            Self::Varchar => f.write_str("VARCHAR"),
            Self::Char => f.write_str("CHAR"),
            Self::Blob => f.write_str("BLOB"),
            Self::Enum => f.write_str("ENUM"),
            Self::Date => f.write_str("DATE"),
            Self::Time => f.write_str("TIME"),
            Self::TimeTz => f.write_str("TIME WITH TIME ZONE"),
            Self::Timestamp => f.write_str("TIMESTAMP"),
            Self::TimestampS => f.write_str("TIMESTAMP_S"),
            Self::TimestampMs => f.write_str("TIMESTAMP_MS"),
            Self::TimestampNs => f.write_str("TIMESTAMP_NS"),
            Self::TimestampTz => f.write_str("TIMESTAMP WITH TIME ZONE"),
            Self::Interval => f.write_str("INTERVAL"),
            Self::Uuid => f.write_str("UUID"),
            Self::List { element_type } => write!(f, "{element_type}[]"),
            Self::Array { element_type, size } => write!(f, "{element_type}[{size}]"),
            Self::Map {
                key_type,
                value_type,
            } => write!(f, "MAP({key_type}, {value_type})"),
            Self::Struct { fields } => write_children(f, "STRUCT", fields),
            Self::Union { members } => write_children(f, "UNION", members),
        }
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, keyword: &str, children: &[Field]) -> fmt::Result {
    write!(f, "{keyword}(")?;
    for (idx, child) in children.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "\"{}\" {}", child.name, child.field_type)?;
    }
    f.write_str(")")
}

// Custom serialization/deserialization for LogicalType
// Leaf kinds are plain strings ("integer", "uuid"); parameterised kinds are
// maps with a "type" key ({"type": "decimal", "width": 10, "scale": 2}).

impl LogicalType {
    fn simple_name(&self) -> Option<&'static str> {
        let name = match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::TinyInt => "tiny_int",
            Self::SmallInt => "small_int",
            Self::Integer => "integer",
            Self::BigInt => "big_int",
            Self::UTinyInt => "utiny_int",
            Self::USmallInt => "usmall_int",
            Self::UInteger => "uinteger",
            Self::UBigInt => "ubig_int",
            Self::HugeInt => "huge_int",
            Self::UHugeInt => "uhuge_int",
            Self::Float => "float",
            Self::Double => "double",
            Self::Varchar => "varchar",
            Self::Char => "char",
            Self::Blob => "blob",
            Self::Enum => "enum",
            Self::Date => "date",
            Self::Time => "time",
            Self::TimeTz => "time_tz",
            Self::Timestamp => "timestamp",
            Self::TimestampS => "timestamp_s",
            Self::TimestampMs => "timestamp_ms",
            Self::TimestampNs => "timestamp_ns",
            Self::TimestampTz => "timestamp_tz",
            Self::Interval => "interval",
            Self::Uuid => "uuid",
            Self::Decimal { .. }
            | Self::List { .. }
            | Self::Array { .. }
            | Self::Map { .. }
            | Self::Struct { .. }
            | Self::Union { .. } => return None,
        };
        Some(name)
    }

    fn from_simple_name(name: &str) -> Option<Self> {
        let ty = match name {
            "null" => Self::Null,
            "boolean" | "bool" => Self::Boolean,
            "tiny_int" | "tinyint" => Self::TinyInt,
            "small_int" | "smallint" => Self::SmallInt,
            "integer" | "int" => Self::Integer,
            "big_int" | "bigint" => Self::BigInt,
            "utiny_int" | "utinyint" => Self::UTinyInt,
            "usmall_int" | "usmallint" => Self::USmallInt,
            "uinteger" | "uint" => Self::UInteger,
            "ubig_int" | "ubigint" => Self::UBigInt,
            "huge_int" | "hugeint" => Self::HugeInt,
            "uhuge_int" | "uhugeint" => Self::UHugeInt,
            "float" | "real" => Self::Float,
            "double" => Self::Double,
            "varchar" | "text" | "string" => Self::Varchar,
            "char" => Self::Char,
            "blob" | "bytea" => Self::Blob,
            "enum" => Self::Enum,
            "date" => Self::Date,
            "time" => Self::Time,
            "time_tz" | "timetz" => Self::TimeTz,
            "timestamp" | "datetime" => Self::Timestamp,
            "timestamp_s" => Self::TimestampS,
            "timestamp_ms" => Self::TimestampMs,
            "timestamp_ns" => Self::TimestampNs,
            "timestamp_tz" | "timestamptz" => Self::TimestampTz,
            "interval" => Self::Interval,
            "uuid" => Self::Uuid,
            _ => return None,
        };
        Some(ty)
    }
}

impl Serialize for LogicalType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;

        if let Some(name) = self.simple_name() {
            return serializer.serialize_str(name);
        }

        match self {
            Self::Decimal { width, scale } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "decimal")?;
                map.serialize_entry("width", width)?;
                map.serialize_entry("scale", scale)?;
                map.end()
            }
            Self::List { element_type } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "list")?;
                map.serialize_entry("element_type", element_type)?;
                map.end()
            }
            Self::Array { element_type, size } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "array")?;
                map.serialize_entry("element_type", element_type)?;
                map.serialize_entry("size", size)?;
                map.end()
            }
            Self::Map {
                key_type,
                value_type,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "map")?;
                map.serialize_entry("key_type", key_type)?;
                map.serialize_entry("value_type", value_type)?;
                map.end()
            }
            Self::Struct { fields } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "struct")?;
                map.serialize_entry("fields", fields)?;
                map.end()
            }
            Self::Union { members } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "union")?;
                map.serialize_entry("members", members)?;
                map.end()
            }
            _ => unreachable!("simple kinds are serialized by name"),
        }
    }
}

impl<'de> Deserialize<'de> for LogicalType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{Error, MapAccess, Visitor};

        struct LogicalTypeVisitor;

        impl<'de> Visitor<'de> for LogicalTypeVisitor {
            type Value = LogicalType;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or map representing a LogicalType")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: Error,
            {
                LogicalType::from_simple_name(&value.to_ascii_lowercase())
                    .ok_or_else(|| E::custom(format!("unknown simple type: {value}")))
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut type_name: Option<String> = None;
                let mut fields: HashMap<String, serde_yaml::Value> = HashMap::new();

                while let Some(key) = map.next_key::<String>()? {
                    if key == "type" {
                        type_name = Some(map.next_value()?);
                    } else {
                        fields.insert(key, map.next_value()?);
                    }
                }

                let type_name = type_name
                    .ok_or_else(|| M::Error::missing_field("type"))?
                    .to_ascii_lowercase();

                let ty = match type_name.as_str() {
                    "decimal" | "numeric" => LogicalType::Decimal {
                        width: get_field(&fields, "width")?.unwrap_or(18),
                        scale: get_field(&fields, "scale")?.unwrap_or(3),
                    },
                    "list" => LogicalType::List {
                        element_type: Box::new(get_field_required(&fields, "element_type")?),
                    },
                    "array" => LogicalType::Array {
                        element_type: Box::new(get_field_required(&fields, "element_type")?),
                        size: get_field_required(&fields, "size")?,
                    },
                    "map" => LogicalType::Map {
                        key_type: Box::new(get_field_required(&fields, "key_type")?),
                        value_type: Box::new(get_field_required(&fields, "value_type")?),
                    },
                    "struct" => LogicalType::Struct {
                        fields: get_field_required(&fields, "fields")?,
                    },
                    "union" => LogicalType::Union {
                        members: get_field_required(&fields, "members")?,
                    },
                    other => LogicalType::from_simple_name(other)
                        .ok_or_else(|| M::Error::custom(format!("unknown type: {other}")))?,
                };

                ty.validate().map_err(M::Error::custom)?;
                Ok(ty)
            }
        }

        deserializer.deserialize_any(LogicalTypeVisitor)
    }
}

// Helper functions for deserialization

/// `Ok(None)` only when the key is absent; a present value must parse.
fn get_field<T: for<'de> Deserialize<'de>, E: serde::de::Error>(
    fields: &HashMap<String, serde_yaml::Value>,
    key: &'static str,
) -> Result<Option<T>, E> {
    fields
        .get(key)
        .map(|value| {
            serde_yaml::from_value(value.clone())
                .map_err(|e| E::custom(format!("invalid field '{key}': {e}")))
        })
        .transpose()
}

fn get_field_required<T: for<'de> Deserialize<'de>, E: serde::de::Error>(
    fields: &HashMap<String, serde_yaml::Value>,
    key: &'static str,
) -> Result<T, E> {
    let value = fields.get(key).ok_or_else(|| E::missing_field(key))?;
    serde_yaml::from_value(value.clone())
        .map_err(|e| E::custom(format!("invalid field '{key}': {e}")))
}

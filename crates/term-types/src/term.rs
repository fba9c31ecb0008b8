//! The dynamic term representation exchanged with the host runtime.
//!
//! A [`Term`] mirrors the shapes an Erlang node hands over: atoms, integers,
//! floats, binaries, tuples, lists and maps. The codec never builds shapes
//! outside this set.
//!
//! Terms also have a JSON text form used on the command line:
//!
//! | Term                  | JSON                              |
//! |-----------------------|-----------------------------------|
//! | `Null`                | `null`                            |
//! | `Tag("true")`         | `{"tag": "true"}` (or `true`)     |
//! | `Integer(42)`         | `42`                              |
//! | `Float64(1.5)`        | `1.5`, `{"float": "inf"}`         |
//! | UTF-8 `ByteString`    | `"text"`                          |
//! | other `ByteString`    | `{"base64": "AAE="}`              |
//! | `Tuple([..])`         | `{"tuple": [..]}`                 |
//! | `List([..])`          | `[..]`                            |
//! | `AssocMap([..])`      | `{"map": [[k, v], ..]}`           |

use base64::Engine;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Smallest integer the host can hand over.
pub const INTEGER_MIN: i128 = i64::MIN as i128;

/// Largest integer the host can hand over.
pub const INTEGER_MAX: i128 = u64::MAX as i128;

/// Dynamic value exchanged with the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Null marker
    Null,

    /// Atom, used for booleans, `nil`, special floats and names
    Tag(String),

    /// Integer; host values lie within `INTEGER_MIN..=INTEGER_MAX`
    Integer(i128),

    /// IEEE 754 double
    Float64(f64),

    /// Binary
    ByteString(Vec<u8>),

    /// Fixed-arity tuple
    Tuple(Vec<Term>),

    /// Proper list
    List(Vec<Term>),

    /// Map entries; keys are unique
    AssocMap(Vec<(Term, Term)>),
}

impl Term {
    /// The `nil` atom.
    pub fn nil() -> Self {
        Self::Tag("nil".to_string())
    }

    /// An atom.
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(name.into())
    }

    /// A binary.
    pub fn binary(bytes: impl AsRef<[u8]>) -> Self {
        Self::ByteString(bytes.as_ref().to_vec())
    }

    /// An integer.
    pub fn int(value: impl Into<i128>) -> Self {
        Self::Integer(value.into())
    }

    /// A tuple.
    pub fn tuple(items: Vec<Term>) -> Self {
        Self::Tuple(items)
    }

    /// A list.
    pub fn list(items: Vec<Term>) -> Self {
        Self::List(items)
    }

    /// `true`/`false` atom.
    pub fn boolean(value: bool) -> Self {
        Self::tag(if value { "true" } else { "false" })
    }

    /// Check if this term is a null marker (`Null` or the `nil` atom).
    pub fn is_nil(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Tag(name) => name == "nil",
            _ => false,
        }
    }

    pub fn as_tag(&self) -> Option<&str> {
        match self {
            Self::Tag(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::ByteString(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Tuple elements if this is a tuple of exactly `arity` elements.
    pub fn as_tuple(&self, arity: usize) -> Option<&[Term]> {
        match self {
            Self::Tuple(items) if items.len() == arity => Some(items),
            _ => None,
        }
    }

    /// Short name of the term's shape.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Tag(_) => "atom",
            Self::Integer(_) => "integer",
            Self::Float64(_) => "float",
            Self::ByteString(_) => "binary",
            Self::Tuple(_) => "tuple",
            Self::List(_) => "list",
            Self::AssocMap(_) => "map",
        }
    }
}

fn is_plain_atom(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@')
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Term]) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Erlang term syntax.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("nil"),
            Self::Tag(name) if is_plain_atom(name) => f.write_str(name),
            Self::Tag(name) => write!(f, "'{}'", name.replace('\'', "\\'")),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float64(v) => write!(f, "{v:?}"),
            Self::ByteString(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => write!(f, "<<{text:?}>>"),
                Err(_) => {
                    f.write_str("<<")?;
                    for (idx, byte) in bytes.iter().enumerate() {
                        if idx > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{byte}")?;
                    }
                    f.write_str(">>")
                }
            },
            Self::Tuple(items) => {
                f.write_str("{")?;
                write_seq(f, items)?;
                f.write_str("}")
            }
            Self::List(items) => {
                f.write_str("[")?;
                write_seq(f, items)?;
                f.write_str("]")
            }
            Self::AssocMap(entries) => {
                f.write_str("#{")?;
                for (idx, (k, v)) in entries.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{k} => {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl Serialize for Term {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Tag(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("tag", name)?;
                map.end()
            }
            Self::Integer(n) => {
                if let Ok(v) = i64::try_from(*n) {
                    serializer.serialize_i64(v)
                } else if let Ok(v) = u64::try_from(*n) {
                    serializer.serialize_u64(v)
                } else {
                    serializer.serialize_i128(*n)
                }
            }
            Self::Float64(v) if v.is_finite() => serializer.serialize_f64(*v),
            Self::Float64(v) => {
                let name = if v.is_nan() {
                    "nan"
                } else if *v > 0.0 {
                    "inf"
                } else {
                    "-inf"
                };
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("float", name)?;
                map.end()
            }
            Self::ByteString(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => serializer.serialize_str(text),
                Err(_) => {
                    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                    let mut map = serializer.serialize_map(Some(1))?;
                    map.serialize_entry("base64", &encoded)?;
                    map.end()
                }
            },
            Self::Tuple(items) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("tuple", items)?;
                map.end()
            }
            Self::List(items) => items.serialize(serializer),
            Self::AssocMap(entries) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("map", entries)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Term {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TermVisitor;

        impl<'de> Visitor<'de> for TermVisitor {
            type Value = Term;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON encoded term")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Term, E> {
                Ok(Term::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Term, E> {
                Ok(Term::Null)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Term, E> {
                Ok(Term::boolean(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Term, E> {
                Ok(Term::Integer(i128::from(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Term, E> {
                Ok(Term::Integer(i128::from(v)))
            }

            fn visit_i128<E: de::Error>(self, v: i128) -> Result<Term, E> {
                Ok(Term::Integer(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Term, E> {
                Ok(Term::Float64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Term, E> {
                Ok(Term::binary(v))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Term, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Term::List(items))
            }

            fn visit_map<M>(self, mut map: M) -> Result<Term, M::Error>
            where
                M: MapAccess<'de>,
            {
                let key: String = map
                    .next_key()?
                    .ok_or_else(|| de::Error::custom("empty object is not a term"))?;

                let term = match key.as_str() {
                    "tag" => Term::Tag(map.next_value()?),
                    "base64" => {
                        let encoded: String = map.next_value()?;
                        let bytes = base64::engine::general_purpose::STANDARD
                            .decode(encoded)
                            .map_err(|e| de::Error::custom(format!("invalid base64: {e}")))?;
                        Term::ByteString(bytes)
                    }
                    "float" => {
                        let name: String = map.next_value()?;
                        match name.as_str() {
                            "inf" => Term::Float64(f64::INFINITY),
                            "-inf" => Term::Float64(f64::NEG_INFINITY),
                            "nan" => Term::Float64(f64::NAN),
                            other => {
                                return Err(de::Error::custom(format!(
                                    "unknown special float: {other}"
                                )))
                            }
                        }
                    }
                    "tuple" => Term::Tuple(map.next_value()?),
                    "map" => Term::AssocMap(map.next_value()?),
                    other => {
                        return Err(de::Error::unknown_field(
                            other,
                            &["tag", "base64", "float", "tuple", "map"],
                        ))
                    }
                };

                if map.next_key::<String>()?.is_some() {
                    return Err(de::Error::custom("term objects must have exactly one key"));
                }
                Ok(term)
            }
        }

        deserializer.deserialize_any(TermVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_nil() {
        assert!(Term::Null.is_nil());
        assert!(Term::nil().is_nil());
        assert!(!Term::tag("false").is_nil());
        assert!(!Term::binary("nil").is_nil());
    }

    #[test]
    fn test_display() {
        let term = Term::tuple(vec![
            Term::tag("ok"),
            Term::list(vec![Term::int(1), Term::Float64(2.0)]),
            Term::binary("hi"),
            Term::AssocMap(vec![(Term::binary("a"), Term::tag("Upper"))]),
        ]);
        assert_eq!(term.to_string(), r#"{ok,[1,2.0],<<"hi">>,#{<<"a">> => 'Upper'}}"#);
        assert_eq!(Term::binary([0xffu8, 0x00]).to_string(), "<<255,0>>");
    }

    #[test]
    fn test_json_form() {
        let json = r#"{"tuple": [{"tag": "decimal"}, [1, 2.5, "x"], {"map": [["k", null]]}]}"#;
        let term: Term = serde_json::from_str(json).unwrap();
        assert_eq!(
            term,
            Term::tuple(vec![
                Term::tag("decimal"),
                Term::list(vec![Term::int(1), Term::Float64(2.5), Term::binary("x")]),
                Term::AssocMap(vec![(Term::binary("k"), Term::Null)]),
            ])
        );

        let back = serde_json::to_string(&term).unwrap();
        let reparsed: Term = serde_json::from_str(&back).unwrap();
        assert_eq!(reparsed, term);
    }

    #[test]
    fn test_json_binary_and_special_floats() {
        let term = Term::binary([0xdeu8, 0xad]);
        let json = serde_json::to_string(&term).unwrap();
        assert_eq!(json, r#"{"base64":"3q0="}"#);
        assert_eq!(serde_json::from_str::<Term>(&json).unwrap(), term);

        let json = serde_json::to_string(&Term::Float64(f64::NEG_INFINITY)).unwrap();
        assert_eq!(json, r#"{"float":"-inf"}"#);

        let big: Term = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(big, Term::Integer(INTEGER_MAX));

        let flag: Term = serde_json::from_str("true").unwrap();
        assert_eq!(flag, Term::tag("true"));
    }

    #[test]
    fn test_json_rejects_unknown_objects() {
        assert!(serde_json::from_str::<Term>(r#"{"atom": "x"}"#).is_err());
        assert!(serde_json::from_str::<Term>(r#"{"tag": "x", "map": []}"#).is_err());
        assert!(serde_json::from_str::<Term>("{}").is_err());
    }
}

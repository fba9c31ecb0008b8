//! Error types for term-types crate.

use duck_types::{LogicalType, TypeError};
use std::fmt;
use thiserror::Error;

use crate::term::Term;

/// Position of a nested value inside its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// List or array element
    Index(usize),
    /// Key of the n-th map entry
    MapKey(usize),
    /// Value of the n-th map entry
    MapValue(usize),
    /// Struct field
    Field(String),
    /// Union member
    Member(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(idx) => write!(f, "element {idx}"),
            Self::MapKey(idx) => write!(f, "key of entry {idx}"),
            Self::MapValue(idx) => write!(f, "value of entry {idx}"),
            Self::Field(name) => write!(f, "field '{name}'"),
            Self::Member(name) => write!(f, "member '{name}'"),
        }
    }
}

/// Errors that can occur while decoding a term against a logical type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("value out of range for {target}: {value}")]
    RangeError { target: String, value: String },

    #[error("malformed {target} literal: {literal:?}")]
    MalformedLiteral { target: String, literal: String },

    #[error("{target} expects {expected} elements, got {actual}")]
    ArityMismatch {
        target: String,
        expected: usize,
        actual: usize,
    },

    #[error("missing struct field '{0}'")]
    MissingField(String),

    #[error("unknown struct field '{0}'")]
    UnknownField(String),

    #[error("unknown union member '{0}'")]
    UnknownUnionMember(String),

    #[error("invalid target type: {0}")]
    InvalidType(#[from] TypeError),

    #[error("at {location}: {source}")]
    At {
        location: Location,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Shape of `term` does not fit `target`.
    pub fn mismatch(target: &LogicalType, term: &Term) -> Self {
        Self::TypeMismatch {
            expected: target.to_string(),
            actual: describe(term),
        }
    }

    /// Numeric or calendar value outside the domain of `target`.
    pub fn range(target: &LogicalType, value: impl fmt::Display) -> Self {
        Self::RangeError {
            target: target.to_string(),
            value: value.to_string(),
        }
    }

    /// String form of `target` that fails its grammar.
    pub fn malformed(target: &LogicalType, literal: impl Into<String>) -> Self {
        Self::MalformedLiteral {
            target: target.to_string(),
            literal: literal.into(),
        }
    }

    /// Wrap this error with the location it occurred at.
    pub fn at(self, location: Location) -> Self {
        Self::At {
            location,
            source: Box::new(self),
        }
    }

    /// The innermost error, without location wrappers.
    pub fn root_cause(&self) -> &DecodeError {
        let mut current = self;
        while let Self::At { source, .. } = current {
            current = source;
        }
        current
    }

    /// Path of locations from the outermost value to the failure.
    pub fn path(&self) -> Vec<&Location> {
        let mut path = Vec::new();
        let mut current = self;
        while let Self::At { location, source } = current {
            path.push(location);
            current = source;
        }
        path
    }
}

const DESCRIBE_LIMIT: usize = 64;

/// Short rendering of a term for error messages.
fn describe(term: &Term) -> String {
    let text = term.to_string();
    if text.chars().count() <= DESCRIBE_LIMIT {
        return format!("{} {text}", term.kind_name());
    }
    let truncated: String = text.chars().take(DESCRIBE_LIMIT).collect();
    format!("{} {truncated}...", term.kind_name())
}

/// Errors raised by the row and parameter helpers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("expected {expected} parameters, got {actual}")]
    ParamCount { expected: usize, actual: usize },

    #[error("invalid type of parameter #{position}: {source}")]
    Param {
        /// 1-based parameter position
        position: usize,
        #[source]
        source: DecodeError,
    },

    #[error("expected {expected} columns, got {actual}")]
    RowArity { expected: usize, actual: usize },

    #[error("invalid type of column: {index}: {source}")]
    Column {
        /// 0-based column index
        index: usize,
        #[source]
        source: DecodeError,
    },

    #[error("expected a list of column values, got {0}")]
    NotARow(String),

    #[error("row {index}: {source}")]
    Row {
        /// 0-based row index
        index: usize,
        #[source]
        source: Box<RowError>,
    },
}

/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

//! Core types for duckterm.
//!
//! This crate provides the foundational types shared by the codec crates:
//!
//! - [`LogicalType`] - Declared SQL type of a column or value
//! - [`SqlValue`] - Native payload of a SQL value
//! - [`TypedValue`] - Payload paired with its logical type
//! - [`DatabaseSchema`] - Table schemas loaded from YAML
//!
//! # Architecture
//!
//! ```text
//! duck-types (this crate)
//!    │
//!    └─── term-types   (decodes/encodes Terms against these types)
//! ```
//!
//! # Example
//!
//! ```rust
//! use duck_types::{LogicalType, SqlValue, TypedValue};
//!
//! let value = TypedValue::new(LogicalType::decimal(10, 2), SqlValue::Decimal(1250)).unwrap();
//! assert_eq!(value.to_string(), "12.50");
//! ```

pub mod schema;
pub mod temporal;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use schema::{ColumnDefinition, DatabaseSchema, SchemaError, TableDefinition};
pub use temporal::{Date, Interval, Time, TimeTz, TimestampTz, TimestampUnit};
pub use types::{DecimalBacking, Field, LogicalType, TypeError, MAX_DECIMAL_WIDTH};
pub use values::{SqlValue, TypedValue};

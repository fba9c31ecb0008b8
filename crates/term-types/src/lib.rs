//! Erlang term conversions for duck-types values.
//!
//! This crate provides bidirectional, type-directed conversions between the
//! dynamic [`Term`] representation a host runtime hands over and
//! duck-types' [`TypedValue`](duck_types::TypedValue).
//!
//! # Modules
//!
//! - [`reverse`] - Term → TypedValue, driven by an expected `LogicalType`
//! - [`forward`] - TypedValue → Term, driven by the value's own type
//! - [`row`] - parameter lists and rows of column terms
//! - [`term`] - the `Term` value and its JSON text form
//!
//! # Example
//!
//! ```
//! use duck_types::LogicalType;
//! use term_types::{encode, Term, TermWithSchema};
//!
//! // Reverse: Term → TypedValue
//! let ty = LogicalType::decimal(5, 2);
//! let tv = TermWithSchema::new(Term::binary("12.5"), ty).to_typed_value().unwrap();
//! assert_eq!(tv.to_string(), "12.50");
//!
//! // Forward: TypedValue → Term
//! let term = encode(&tv);
//! assert_eq!(term.to_string(), "{1250,5,2}");
//! ```

pub mod error;
pub mod forward;
pub mod numeric;
pub mod reverse;
pub mod row;
pub mod temporal;
pub mod term;

pub use error::{DecodeError, Location, Result, RowError};
pub use forward::encode;
pub use reverse::{decode, decode_value, TermWithSchema};
pub use row::{decode_params, decode_row, decode_rows, decode_table_row, encode_row, encode_rows};
pub use term::Term;

//! duckterm Library
//!
//! Type-directed conversion between DuckDB values and Erlang terms.
//!
//! # Crates
//!
//! - `duck_types` - logical types, typed values and YAML table schemas
//! - `term_types` - the `Term` dynamic value, decoder, encoder and row helpers
//!
//! # CLI Usage
//!
//! ```bash
//! # Decode one term against a type and show the result
//! duckterm value --type '{type: decimal, width: 5, scale: 2}' --value '"12.5"'
//!
//! # Decode JSON-lines rows against a table from a schema file
//! duckterm rows --schema schema.yaml --table events --input rows.jsonl
//! ```

use std::io::{BufRead, Write};

use anyhow::Context;
use serde::Serialize;
use tracing::debug;

pub use duck_types;
pub use term_types;

use duck_types::{DatabaseSchema, LogicalType};
use term_types::{decode, decode_table_row, encode, encode_row, Term};

/// Parse a logical type from its YAML form (`integer`, `{type: list, ...}`).
pub fn parse_logical_type(text: &str) -> anyhow::Result<LogicalType> {
    serde_yaml::from_str(text).with_context(|| format!("Invalid logical type: {text}"))
}

/// Parse a term from its JSON text form.
pub fn parse_term(text: &str) -> anyhow::Result<Term> {
    serde_json::from_str(text).with_context(|| format!("Invalid term JSON: {text}"))
}

/// Outcome of converting a single value.
#[derive(Debug, Clone, Serialize)]
pub struct ValueReport {
    /// Target type in SQL spelling
    pub logical_type: String,
    /// SQL literal rendering of the decoded value
    pub literal: String,
    /// Re-encoded term in Erlang syntax
    pub term: String,
    /// Re-encoded term in its JSON text form
    pub json: serde_json::Value,
}

/// Decode `term_json` against `type_text` and re-encode the result.
pub fn convert_value(type_text: &str, term_json: &str) -> anyhow::Result<ValueReport> {
    let logical_type = parse_logical_type(type_text)?;
    let term = parse_term(term_json)?;
    let typed = decode(&term, &logical_type)
        .with_context(|| format!("Failed to decode {term} as {logical_type}"))?;
    let encoded = encode(&typed);

    Ok(ValueReport {
        logical_type: logical_type.to_string(),
        literal: typed.to_string(),
        term: encoded.to_string(),
        json: serde_json::to_value(&encoded)?,
    })
}

/// Counts reported after converting a stream of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowSummary {
    pub rows: usize,
    pub skipped_blank: usize,
}

/// Convert JSON-lines rows for `table`, writing one re-encoded row per line.
///
/// Each non-blank line is a JSON array holding one term per column. The
/// first failing row aborts the run, with its 1-based line number in the
/// error context.
pub fn convert_rows<R: BufRead, W: Write>(
    schema: &DatabaseSchema,
    table: &str,
    input: R,
    mut output: W,
) -> anyhow::Result<RowSummary> {
    let table = schema.require_table(table)?;
    let mut summary = RowSummary::default();

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("Failed to read line {line_no}"))?;
        if line.trim().is_empty() {
            summary.skipped_blank += 1;
            continue;
        }

        let row = parse_term(&line).with_context(|| format!("Invalid row at line {line_no}"))?;
        let values = decode_table_row(&row, table)
            .with_context(|| format!("Invalid row at line {line_no}"))?;
        let encoded = encode_row(&values);

        serde_json::to_writer(&mut output, &encoded)?;
        writeln!(output)?;
        summary.rows += 1;
    }

    debug!(
        "Converted {} rows for table '{}' ({} blank lines skipped)",
        summary.rows, table.name, summary.skipped_blank
    );
    Ok(summary)
}

//! Command-line interface for duckterm
//!
//! # Usage Examples
//!
//! ## Single Value
//! ```bash
//! # Decode a decimal literal and show its SQL rendering and encoded term
//! duckterm value --type '{type: decimal, width: 5, scale: 2}' --value '"12.5"'
//!
//! # Union member given as a (name, payload) tuple
//! duckterm value \
//!   --type '{type: union, members: [{name: a, type: integer}, {name: b, type: varchar}]}' \
//!   --value '{"tuple": ["b", "hello"]}'
//! ```
//!
//! ## Rows
//! ```bash
//! # Rows as JSON lines, one array of column terms per line
//! duckterm rows --schema schema.yaml --table events --input rows.jsonl
//!
//! # Same, reading from stdin
//! cat rows.jsonl | duckterm rows --schema schema.yaml --table events
//! ```

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use duckterm::duck_types::DatabaseSchema;

#[derive(Parser)]
#[command(name = "duckterm")]
#[command(about = "Convert values between DuckDB logical types and Erlang terms")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one term against a logical type and re-encode it
    Value {
        /// Logical type, as a type name or a YAML map (e.g. 'bigint')
        #[arg(long = "type", value_name = "TYPE")]
        logical_type: String,

        /// Term in its JSON text form (e.g. '42', '{"tag": "true"}')
        #[arg(long)]
        value: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode JSON-lines rows against a table from a schema file
    Rows {
        /// Path to the YAML schema file
        #[arg(long, env = "DUCKTERM_SCHEMA")]
        schema: PathBuf,

        /// Table whose column types the rows follow
        #[arg(long)]
        table: String,

        /// Input file (defaults to stdin)
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Value {
            logical_type,
            value,
            json,
        } => {
            let report = duckterm::convert_value(&logical_type, &value)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("type:    {}", report.logical_type);
                println!("literal: {}", report.literal);
                println!("term:    {}", report.term);
                println!("json:    {}", report.json);
            }
        }
        Commands::Rows {
            schema,
            table,
            input,
        } => {
            let schema = DatabaseSchema::from_file(&schema)
                .with_context(|| format!("Failed to load schema from {schema:?}"))?;

            tracing::info!("Converting rows for table '{table}'");

            let stdout = io::stdout();
            let summary = match input {
                Some(path) => {
                    let file = File::open(&path)
                        .with_context(|| format!("Failed to open input file {path:?}"))?;
                    duckterm::convert_rows(&schema, &table, BufReader::new(file), stdout.lock())?
                }
                None => duckterm::convert_rows(&schema, &table, io::stdin().lock(), stdout.lock())?,
            };

            tracing::info!("Converted {} rows", summary.rows);
        }
    }

    Ok(())
}

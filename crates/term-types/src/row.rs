//! Parameter and row helpers.
//!
//! These wrap [`decode`] and [`encode`] for the shapes a query or append path
//! deals in: a positional parameter list, one row as a list of column terms,
//! and a list of such rows. Each row is decoded all-or-nothing.

use duck_types::{LogicalType, TableDefinition, TypedValue};
use tracing::{debug, trace};

use crate::error::RowError;
use crate::forward::encode;
use crate::reverse::decode;
use crate::term::Term;

/// Decode bound parameters against their declared types.
///
/// Positions in errors are 1-based.
pub fn decode_params(params: &[Term], types: &[LogicalType]) -> Result<Vec<TypedValue>, RowError> {
    if params.len() != types.len() {
        debug!(
            "Rejecting parameters: expected {}, got {}",
            types.len(),
            params.len()
        );
        return Err(RowError::ParamCount {
            expected: types.len(),
            actual: params.len(),
        });
    }

    params
        .iter()
        .zip(types)
        .enumerate()
        .map(|(idx, (param, ty))| {
            decode(param, ty).map_err(|source| {
                debug!("Rejecting parameter #{} as {ty}: {source}", idx + 1);
                RowError::Param {
                    position: idx + 1,
                    source,
                }
            })
        })
        .collect()
}

/// Decode one row, given as a list with one term per column.
pub fn decode_row(row: &Term, columns: &[LogicalType]) -> Result<Vec<TypedValue>, RowError> {
    let Term::List(values) = row else {
        debug!("Rejecting row: not a list ({})", row.kind_name());
        return Err(RowError::NotARow(row.kind_name().to_string()));
    };
    if values.len() != columns.len() {
        debug!(
            "Rejecting row: expected {} columns, got {}",
            columns.len(),
            values.len()
        );
        return Err(RowError::RowArity {
            expected: columns.len(),
            actual: values.len(),
        });
    }

    trace!("Decoding row of {} columns", columns.len());
    values
        .iter()
        .zip(columns)
        .enumerate()
        .map(|(index, (value, ty))| {
            decode(value, ty).map_err(|source| {
                debug!("Rejecting column {index} as {ty}: {source}");
                RowError::Column { index, source }
            })
        })
        .collect()
}

/// Decode a list of rows; the first failing row aborts with its index.
pub fn decode_rows(rows: &Term, columns: &[LogicalType]) -> Result<Vec<Vec<TypedValue>>, RowError> {
    let Term::List(rows) = rows else {
        return Err(RowError::NotARow(rows.kind_name().to_string()));
    };
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            decode_row(row, columns).map_err(|source| RowError::Row {
                index,
                source: Box::new(source),
            })
        })
        .collect()
}

/// Decode a row against a table's column types.
pub fn decode_table_row(row: &Term, table: &TableDefinition) -> Result<Vec<TypedValue>, RowError> {
    decode_row(row, &table.column_types())
}

pub fn encode_row(values: &[TypedValue]) -> Term {
    Term::List(values.iter().map(encode).collect())
}

pub fn encode_rows(rows: &[Vec<TypedValue>]) -> Term {
    Term::List(rows.iter().map(|row| encode_row(row)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use duck_types::ColumnDefinition;

    #[test]
    fn test_decode_params() {
        let types = vec![LogicalType::Integer, LogicalType::Varchar];
        let params = vec![Term::int(1), Term::binary("a")];
        let values = decode_params(&params, &types).unwrap();
        assert_eq!(values, vec![TypedValue::integer(1), TypedValue::varchar("a")]);
    }

    #[test]
    fn test_decode_params_errors() {
        let types = vec![LogicalType::Integer, LogicalType::Boolean, LogicalType::Boolean];
        let err = decode_params(&[Term::int(1)], &types).unwrap_err();
        assert_eq!(
            err,
            RowError::ParamCount {
                expected: 3,
                actual: 1
            }
        );

        let params = vec![Term::int(1), Term::tag("true"), Term::int(1)];
        let err = decode_params(&params, &types).unwrap_err();
        assert!(matches!(err, RowError::Param { position: 3, .. }));
        assert!(err.to_string().starts_with("invalid type of parameter #3"));
    }

    #[test]
    fn test_decode_row() {
        let columns = vec![LogicalType::BigInt, LogicalType::Double];
        let row = Term::list(vec![Term::int(7), Term::nil()]);
        let values = decode_row(&row, &columns).unwrap();
        assert_eq!(values[0], TypedValue::bigint(7));
        assert!(values[1].is_null());

        let err = decode_row(&Term::list(vec![Term::int(7)]), &columns).unwrap_err();
        assert!(matches!(err, RowError::RowArity { expected: 2, actual: 1 }));

        let err = decode_row(&Term::tuple(vec![]), &columns).unwrap_err();
        assert!(matches!(err, RowError::NotARow(_)));

        let bad = Term::list(vec![Term::int(7), Term::binary("x")]);
        let err = decode_row(&bad, &columns).unwrap_err();
        assert!(matches!(
            err,
            RowError::Column {
                index: 1,
                source: DecodeError::TypeMismatch { .. }
            }
        ));
        assert!(err.to_string().starts_with("invalid type of column: 1"));
    }

    #[test]
    fn test_decode_rows_reports_row_index() {
        let columns = vec![LogicalType::UTinyInt];
        let rows = Term::list(vec![
            Term::list(vec![Term::int(1)]),
            Term::list(vec![Term::int(300)]),
        ]);
        let err = decode_rows(&rows, &columns).unwrap_err();
        let RowError::Row { index, source } = err else {
            panic!("expected row error");
        };
        assert_eq!(index, 1);
        assert!(matches!(*source, RowError::Column { index: 0, .. }));
    }

    #[test]
    fn test_table_row_and_encode() {
        let table = TableDefinition::new(
            "events",
            vec![
                ColumnDefinition::new("id", LogicalType::BigInt),
                ColumnDefinition::new("name", LogicalType::Varchar),
            ],
        );
        let row = Term::list(vec![Term::int(1), Term::binary("start")]);
        let values = decode_table_row(&row, &table).unwrap();
        assert_eq!(encode_row(&values), row);
        assert_eq!(
            encode_rows(&[values.clone(), values]),
            Term::list(vec![row.clone(), row])
        );
    }
}

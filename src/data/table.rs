use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, NullArray, StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use arrow::record_batch::RecordBatch;

use super::model::Cell;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Rows → RecordBatch
// ---------------------------------------------------------------------------

/// Build a `RecordBatch` from row-oriented cells.
///
/// The Arrow type of each column is inferred from its non-null cells:
/// * all integers → `Int64`
/// * integers and floats → `Float64`
/// * all booleans → `Boolean`
/// * only nulls → `Null`
/// * anything else → `Utf8` (cells rendered with `Display`)
///
/// Rows shorter than `columns` are padded with nulls.
pub fn record_batch_from_rows<S: AsRef<str>>(
    columns: &[S],
    rows: &[Vec<Cell>],
) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

    for (idx, name) in columns.iter().enumerate() {
        let cells: Vec<&Cell> = rows
            .iter()
            .map(|row| row.get(idx).unwrap_or(&Cell::Null))
            .collect();
        let array = build_column(&cells);
        fields.push(Field::new(name.as_ref(), array.data_type().clone(), true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = if arrays.is_empty() {
        RecordBatch::try_new_with_options(
            schema,
            arrays,
            &arrow::record_batch::RecordBatchOptions::new().with_row_count(Some(rows.len())),
        )?
    } else {
        RecordBatch::try_new(schema, arrays)?
    };
    Ok(batch)
}

fn infer_type(cells: &[&Cell]) -> DataType {
    let mut inferred: Option<DataType> = None;
    for cell in cells {
        let this = match cell {
            Cell::Null => continue,
            Cell::Bool(_) => DataType::Boolean,
            Cell::Integer(_) => DataType::Int64,
            Cell::Float(_) => DataType::Float64,
            Cell::String(_) => DataType::Utf8,
        };
        inferred = Some(match (inferred, this) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(DataType::Int64), DataType::Float64)
            | (Some(DataType::Float64), DataType::Int64) => DataType::Float64,
            _ => DataType::Utf8,
        });
    }
    inferred.unwrap_or(DataType::Null)
}

fn build_column(cells: &[&Cell]) -> ArrayRef {
    match infer_type(cells) {
        DataType::Null => Arc::new(NullArray::new(cells.len())),
        DataType::Boolean => Arc::new(
            cells
                .iter()
                .map(|c| match c {
                    Cell::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        ),
        DataType::Int64 => Arc::new(
            cells
                .iter()
                .map(|c| match c {
                    Cell::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Int64Array>(),
        ),
        DataType::Float64 => Arc::new(
            cells
                .iter()
                .map(|c| match c {
                    Cell::Null => None,
                    other => other.as_f64(),
                })
                .collect::<Float64Array>(),
        ),
        _ => Arc::new(
            cells
                .iter()
                .map(|c| match c {
                    Cell::Null => None,
                    other => Some(other.to_string()),
                })
                .collect::<StringArray>(),
        ),
    }
}

// ---------------------------------------------------------------------------
// Column → cells / values
// ---------------------------------------------------------------------------

/// Read every row of an Arrow column as a [`Cell`].
///
/// Dictionary-encoded and large string columns (as written by Pandas for
/// categoricals) are cast to `Utf8` first; narrower numeric types are widened.
pub fn column_cells(name: &str, col: &ArrayRef) -> Result<Vec<Cell>> {
    let unsupported = || Error::UnsupportedColumnType {
        column: name.to_string(),
        data_type: col.data_type().clone(),
    };

    let cells = match col.data_type() {
        DataType::Null => vec![Cell::Null; col.len()],
        DataType::Utf8 => string_cells(col.as_string::<i32>()),
        DataType::LargeUtf8 | DataType::Utf8View | DataType::Dictionary(_, _) => {
            let utf8 = cast(col, &DataType::Utf8).map_err(|_| unsupported())?;
            string_cells(utf8.as_string::<i32>())
        }
        DataType::Boolean => col
            .as_boolean()
            .iter()
            .map(|v| v.map(Cell::Bool).unwrap_or(Cell::Null))
            .collect(),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => {
            let ints = cast(col, &DataType::Int64)?;
            ints.as_primitive::<Int64Type>()
                .iter()
                .map(|v| v.map(Cell::Integer).unwrap_or(Cell::Null))
                .collect()
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let floats = cast(col, &DataType::Float64)?;
            floats
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| v.map(Cell::Float).unwrap_or(Cell::Null))
                .collect()
        }
        _ => return Err(unsupported()),
    };
    Ok(cells)
}

fn string_cells(arr: &StringArray) -> Vec<Cell> {
    arr.iter()
        .map(|v| v.map(|s| Cell::String(s.to_string())).unwrap_or(Cell::Null))
        .collect()
}

/// Read a numeric column as `f64`, nulls becoming `NaN`.
pub fn column_values(name: &str, col: &ArrayRef) -> Result<Vec<f64>> {
    let numeric = matches!(col.data_type(), DataType::Null) || col.data_type().is_numeric();
    if !numeric {
        return Err(Error::UnsupportedColumnType {
            column: name.to_string(),
            data_type: col.data_type().clone(),
        });
    }
    let floats = cast(col, &DataType::Float64)?;
    Ok(floats
        .as_primitive::<Float64Type>()
        .iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Remove the column called `name`, returning it with the remaining batch.
pub fn take_column(batch: &RecordBatch, name: &str) -> Result<Option<(ArrayRef, RecordBatch)>> {
    let Ok(idx) = batch.schema().index_of(name) else {
        return Ok(None);
    };
    let column = batch.column(idx).clone();
    let keep: Vec<usize> = (0..batch.num_columns()).filter(|&i| i != idx).collect();
    let rest = batch.project(&keep)?;
    Ok(Some((column, rest)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{DictionaryArray, Int32Array};
    use arrow::datatypes::Int32Type;

    #[test]
    fn infers_column_types() {
        let rows = vec![
            vec![Cell::from("a"), Cell::Integer(1), Cell::Integer(2), Cell::Null],
            vec![Cell::from("b"), Cell::Integer(3), Cell::Float(0.5), Cell::Null],
        ];
        let batch = record_batch_from_rows(&["s", "i", "f", "n"], &rows).unwrap();
        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &DataType::Int64);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
        assert_eq!(schema.field(3).data_type(), &DataType::Null);
        assert_eq!(batch.num_rows(), 2);
    }

    #[test]
    fn mixed_types_fall_back_to_strings() {
        let rows = vec![vec![Cell::Integer(1)], vec![Cell::from("x")]];
        let batch = record_batch_from_rows(&["c"], &rows).unwrap();
        let cells = column_cells("c", batch.column(0)).unwrap();
        assert_eq!(cells, vec![Cell::from("1"), Cell::from("x")]);
    }

    #[test]
    fn empty_column_list_keeps_row_count() {
        let batch = record_batch_from_rows::<&str>(&[], &[vec![], vec![]]).unwrap();
        assert_eq!(batch.num_rows(), 2);
    }

    #[test]
    fn dictionary_columns_read_as_strings() {
        let dict: DictionaryArray<Int32Type> = vec!["x", "y", "x"].into_iter().collect();
        let col: ArrayRef = Arc::new(dict);
        let cells = column_cells("d", &col).unwrap();
        assert_eq!(cells, vec![Cell::from("x"), Cell::from("y"), Cell::from("x")]);
    }

    #[test]
    fn values_cast_integers_and_nulls() {
        let col: ArrayRef = Arc::new(Int32Array::from(vec![Some(1), None, Some(3)]));
        let values = column_values("v", &col).unwrap();
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 3.0);

        let col: ArrayRef = Arc::new(StringArray::from(vec!["1"]));
        assert!(matches!(
            column_values("v", &col),
            Err(Error::UnsupportedColumnType { .. })
        ));
    }

    #[test]
    fn take_column_splits_batch() {
        let rows = vec![vec![Cell::from("a"), Cell::from("kg"), Cell::Float(1.0)]];
        let batch = record_batch_from_rows(&["a", "unit", "value"], &rows).unwrap();
        let (unit, rest) = take_column(&batch, "unit").unwrap().unwrap();
        assert_eq!(unit.len(), 1);
        let names: Vec<_> = rest.schema().fields().iter().map(|f| f.name().clone()).collect();
        assert_eq!(names, vec!["a", "value"]);
        assert!(take_column(&batch, "missing").unwrap().is_none());
    }
}

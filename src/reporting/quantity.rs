use std::collections::{BTreeMap, BTreeSet};

use arrow::record_batch::RecordBatch;
use ndarray::{ArrayD, IxDyn};

use crate::data::model::{Cell, LabeledArray, QuantityData, QuantityKind};
use crate::data::source::Scenario;
use crate::data::table::{column_cells, column_values, record_batch_from_rows, take_column};
use crate::error::{Error, Result};

/// Column holding the unit of a quantity.
pub const UNIT_COLUMN: &str = "unit";

/// Placeholder dimension for tables without any dimension column.
pub const INDEX_DIM: &str = "index";

/// Retrieve quantity `name` from `scenario` as labeled arrays.
///
/// Returns one array per value column of `kind`: `value` for parameters,
/// `lvl` and `mrg` for equations and variables. Every array is named after
/// the quantity and carries the `unit` attribute when the table has a unit
/// column.
pub fn quantity_as_array(
    scenario: &dyn Scenario,
    name: &str,
    kind: QuantityKind,
) -> Result<BTreeMap<String, LabeledArray>> {
    let table = match scenario.quantity(kind, name)? {
        QuantityData::Table(batch) => batch,
        // Scalars are not returned as a table
        QuantityData::Scalar(record) => {
            let columns: Vec<&String> = record.keys().collect();
            let row: Vec<Cell> = record.values().cloned().collect();
            record_batch_from_rows(columns.as_slice(), &[row])?
        }
    };

    let (table, attrs) = split_unit(name, table)?;

    let values = kind
        .value_columns()
        .iter()
        .map(|&col| {
            let idx = table
                .schema()
                .index_of(col)
                .map_err(|_| Error::MissingColumn {
                    quantity: name.to_string(),
                    column: col.to_string(),
                })?;
            Ok((col, column_values(col, table.column(idx))?))
        })
        .collect::<Result<Vec<_>>>()?;

    let schema = table.schema();
    let dim_columns: Vec<(String, Vec<Cell>)> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| !kind.value_columns().contains(&f.name().as_str()))
        .map(|(i, f)| Ok((f.name().clone(), column_cells(f.name(), table.column(i))?)))
        .collect::<Result<_>>()?;

    log::debug!(
        "{kind} '{name}': {} rows, dims {:?}, unit {:?}",
        table.num_rows(),
        dim_columns.iter().map(|(d, _)| d.as_str()).collect::<Vec<_>>(),
        attrs.get("unit")
    );

    let index = build_index(name, dim_columns, table.num_rows())?;

    values
        .into_iter()
        .map(|(col, column)| {
            let array = index.reshape(col, &column)?.rename(name).assign_attrs(&attrs);
            Ok((col.to_string(), array))
        })
        .collect()
}

/// Remove the unit column, returning the remaining table and the `unit`
/// attribute. A unit column must hold exactly one distinct value.
fn split_unit(
    name: &str,
    table: RecordBatch,
) -> Result<(RecordBatch, BTreeMap<String, String>)> {
    let mut attrs = BTreeMap::new();
    let Some((unit_col, rest)) = take_column(&table, UNIT_COLUMN)? else {
        // Equations come without units
        return Ok((table, attrs));
    };

    let cells = column_cells(UNIT_COLUMN, &unit_col)?;
    if cells.contains(&Cell::Null) {
        log::warn!("{name}: null entries in the unit column read as ''");
    }
    let units: BTreeSet<String> = cells
        .into_iter()
        .map(|c| match c {
            Cell::Null => String::new(),
            other => other.to_string(),
        })
        .collect();

    if units.len() != 1 {
        return Err(Error::AmbiguousUnit {
            quantity: name.to_string(),
            units: units.into_iter().collect(),
        });
    }
    let unit = units.into_iter().next().unwrap_or_default();
    attrs.insert(UNIT_COLUMN.to_string(), unit);
    Ok((rest, attrs))
}

/// Position of every table row in the n-dimensional array.
struct RowIndex {
    dims: Vec<String>,
    coords: Vec<Vec<Cell>>,
    shape: Vec<usize>,
    positions: Vec<Vec<usize>>,
}

fn build_index(
    name: &str,
    dim_columns: Vec<(String, Vec<Cell>)>,
    n_rows: usize,
) -> Result<RowIndex> {
    if dim_columns.is_empty() {
        // A single row has no index at all; several rows get a positional one.
        if n_rows == 1 {
            return Ok(RowIndex {
                dims: Vec::new(),
                coords: Vec::new(),
                shape: Vec::new(),
                positions: vec![Vec::new()],
            });
        }
        return Ok(RowIndex {
            dims: vec![INDEX_DIM.to_string()],
            coords: vec![(0..n_rows as i64).map(Cell::Integer).collect()],
            shape: vec![n_rows],
            positions: (0..n_rows).map(|i| vec![i]).collect(),
        });
    }

    let mut dims = Vec::with_capacity(dim_columns.len());
    let mut coords = Vec::with_capacity(dim_columns.len());
    let mut columns = Vec::with_capacity(dim_columns.len());
    for (dim, cells) in dim_columns {
        let labels: Vec<Cell> = cells
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        dims.push(dim);
        coords.push(labels);
        columns.push(cells);
    }
    let shape: Vec<usize> = coords.iter().map(Vec::len).collect();

    let mut seen = ArrayD::from_elem(IxDyn(&shape), false);
    let mut positions = Vec::with_capacity(n_rows);
    for row in 0..n_rows {
        let position: Vec<usize> = columns
            .iter()
            .zip(&coords)
            .map(|(cells, labels)| labels.binary_search(&cells[row]).unwrap_or_default())
            .collect();
        let slot = &mut seen[IxDyn(&position)];
        if *slot {
            let labels: Vec<String> = columns.iter().map(|c| c[row].to_string()).collect();
            return Err(Error::DuplicateIndex {
                quantity: name.to_string(),
                index: format!("({})", labels.join(", ")),
            });
        }
        *slot = true;
        positions.push(position);
    }

    Ok(RowIndex {
        dims,
        coords,
        shape,
        positions,
    })
}

impl RowIndex {
    /// Scatter one value column into an array named after the column;
    /// absent combinations are `NaN`.
    fn reshape(&self, column: &str, values: &[f64]) -> Result<LabeledArray> {
        let mut data = ArrayD::from_elem(IxDyn(&self.shape), f64::NAN);
        for (position, &value) in self.positions.iter().zip(values) {
            data[IxDyn(position)] = value;
        }
        LabeledArray::new(column, self.dims.clone(), self.coords.clone(), data)
    }
}

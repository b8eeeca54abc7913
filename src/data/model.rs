use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use arrow::record_batch::RecordBatch;
use ndarray::{ArrayD, Axis, IxDyn};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Cell – a single table cell or coordinate label
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the column types a scenario backend
/// returns. Coordinates are kept in sorted sets, so `Cell` must be `Ord`.
#[derive(Debug, Clone)]
pub enum Cell {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

// -- Manual Eq/Ord so Cell can live in BTreeSet / HashMap keys --

// Equality follows `cmp`: NaN equals NaN, 0.0 and -0.0 differ, as in `Hash`.
impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Cell::*;
        fn discriminant(v: &Cell) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for Cell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::String(s) => s.hash(state),
            Cell::Integer(i) => i.hash(state),
            Cell::Float(f) => f.to_bits().hash(state),
            Cell::Bool(b) => b.hash(state),
            Cell::Null => {}
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::String(s) => write!(f, "{s}"),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Null => write!(f, "<null>"),
        }
    }
}

impl Cell {
    /// Interpret the cell as an `f64`; nulls read as `NaN`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Float(v) => Some(*v),
            Cell::Integer(i) => Some(*i as f64),
            Cell::Null => Some(f64::NAN),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::String(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::String(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

// ---------------------------------------------------------------------------
// QuantityKind – parameter, equation or variable
// ---------------------------------------------------------------------------

/// The kind of a scenario quantity. Each kind has a fixed set of value
/// columns; every other column of its table is a dimension or the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuantityKind {
    Parameter,
    Equation,
    Variable,
}

impl QuantityKind {
    pub const ALL: [QuantityKind; 3] = [
        QuantityKind::Parameter,
        QuantityKind::Equation,
        QuantityKind::Variable,
    ];

    /// Names of the columns holding values: `value` for parameters, level
    /// (`lvl`) and marginal (`mrg`) for equations and variables.
    pub fn value_columns(self) -> &'static [&'static str] {
        match self {
            QuantityKind::Parameter => &["value"],
            QuantityKind::Equation | QuantityKind::Variable => &["lvl", "mrg"],
        }
    }

    /// Short tag used by scenario backends and on disk.
    pub fn tag(self) -> &'static str {
        match self {
            QuantityKind::Parameter => "par",
            QuantityKind::Equation => "equ",
            QuantityKind::Variable => "var",
        }
    }
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for QuantityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "par" | "parameter" => Ok(QuantityKind::Parameter),
            "equ" | "equation" => Ok(QuantityKind::Equation),
            "var" | "variable" => Ok(QuantityKind::Variable),
            other => Err(format!(
                "unknown quantity kind '{other}' (expected par, equ or var)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// QuantityData – what a scenario hands back
// ---------------------------------------------------------------------------

/// Raw data for one quantity. Scalars (no dimensions) come back as a single
/// record instead of a table.
#[derive(Debug, Clone)]
pub enum QuantityData {
    Table(RecordBatch),
    Scalar(BTreeMap<String, Cell>),
}

// ---------------------------------------------------------------------------
// LabeledArray – n-dimensional values with coordinate labels
// ---------------------------------------------------------------------------

/// A named n-dimensional array whose axes are labeled by dimension name and
/// whose positions along each axis are labeled by sorted, unique coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray {
    name: String,
    dims: Vec<String>,
    coords: Vec<Vec<Cell>>,
    data: ArrayD<f64>,
    attrs: BTreeMap<String, String>,
}

impl LabeledArray {
    /// Build an array, checking that every axis has a coordinate list of the
    /// matching length and that coordinates are strictly ascending.
    pub fn new(
        name: impl Into<String>,
        dims: Vec<String>,
        coords: Vec<Vec<Cell>>,
        data: ArrayD<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: String| Error::InvalidArray {
            name: name.clone(),
            reason,
        };

        if dims.len() != coords.len() || dims.len() != data.ndim() {
            return Err(invalid(format!(
                "{} dims, {} coordinate lists, {} axes",
                dims.len(),
                coords.len(),
                data.ndim()
            )));
        }
        for (axis, (dim, labels)) in dims.iter().zip(&coords).enumerate() {
            if labels.len() != data.len_of(Axis(axis)) {
                return Err(invalid(format!(
                    "dimension '{dim}' has {} labels but length {}",
                    labels.len(),
                    data.len_of(Axis(axis))
                )));
            }
            if labels.windows(2).any(|w| w[0] >= w[1]) {
                return Err(invalid(format!(
                    "labels of dimension '{dim}' are not sorted and unique"
                )));
            }
        }

        Ok(LabeledArray {
            name,
            dims,
            coords,
            data,
            attrs: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Coordinate labels along `dim`.
    pub fn coords(&self, dim: &str) -> Option<&[Cell]> {
        self.axis_of(dim).map(|axis| self.coords[axis].as_slice())
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    /// The `unit` attribute, if the quantity has one.
    pub fn unit(&self) -> Option<&str> {
        self.attrs.get("unit").map(String::as_str)
    }

    /// The value of a zero-dimensional array.
    pub fn item(&self) -> Option<f64> {
        if self.dims.is_empty() {
            self.data.iter().next().copied()
        } else {
            None
        }
    }

    /// Look up a value by coordinate labels, one per dimension in order.
    pub fn get(&self, labels: &[Cell]) -> Option<f64> {
        if labels.len() != self.dims.len() {
            return None;
        }
        let index = labels
            .iter()
            .zip(&self.coords)
            .map(|(label, coords)| coords.binary_search(label).ok())
            .collect::<Option<Vec<usize>>>()?;
        self.data.get(IxDyn(&index)).copied()
    }

    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Merge `attrs` into the array's attributes.
    pub fn assign_attrs(mut self, attrs: &BTreeMap<String, String>) -> Self {
        self.attrs
            .extend(attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Sum over the named dimensions, skipping `NaN`. Name and attributes
    /// carry over to the result.
    pub fn sum_over<S: AsRef<str>>(&self, dimensions: &[S]) -> Result<LabeledArray> {
        let mut axes = dimensions
            .iter()
            .map(|dim| {
                let dim = dim.as_ref();
                self.axis_of(dim).ok_or_else(|| Error::UnknownDimension {
                    name: self.name.clone(),
                    dimension: dim.to_string(),
                    dims: self.dims.clone(),
                })
            })
            .collect::<Result<Vec<usize>>>()?;
        axes.sort_unstable();
        axes.dedup();

        let mut data = self.data.clone();
        let mut dims = self.dims.clone();
        let mut coords = self.coords.clone();
        // Highest axis first so the remaining indices stay valid.
        for &axis in axes.iter().rev() {
            data = data.fold_axis(Axis(axis), 0.0, |acc, &x| {
                if x.is_nan() {
                    *acc
                } else {
                    acc + x
                }
            });
            dims.remove(axis);
            coords.remove(axis);
        }

        Ok(LabeledArray {
            name: self.name.clone(),
            dims,
            coords,
            data,
            attrs: self.attrs.clone(),
        })
    }

    /// Long-form table: one column per dimension plus a value column named
    /// after the array. `NaN` positions are left out.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut columns = self.dims.clone();
        columns.push(self.name.clone());

        let rows: Vec<Vec<Cell>> = self
            .data
            .indexed_iter()
            .filter(|(_, v)| !v.is_nan())
            .map(|(index, &v)| {
                let mut row: Vec<Cell> = (0..self.dims.len())
                    .map(|axis| self.coords[axis][index[axis]].clone())
                    .collect();
                row.push(Cell::Float(v));
                row
            })
            .collect();

        super::table::record_batch_from_rows(columns.as_slice(), &rows)
    }
}

impl fmt::Display for LabeledArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self.dims.join(", ");
        write!(f, "<{} ({dims})", self.name)?;
        if let Some(unit) = self.unit() {
            write!(f, " [{unit}]")?;
        }
        writeln!(f, ">")?;

        let batch = self.to_record_batch().map_err(|_| fmt::Error)?;
        let table = arrow::util::pretty::pretty_format_batches(&[batch]).map_err(|_| fmt::Error)?;
        write!(f, "{table}")
    }
}

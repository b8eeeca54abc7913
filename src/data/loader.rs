use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use arrow::compute::concat_batches;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Cell, QuantityData, QuantityKind};
use super::source::Scenario;
use super::table::record_batch_from_rows;

/// Extensions tried for a quantity file, in order of preference.
pub const EXTENSIONS: [&str; 4] = ["parquet", "pq", "csv", "json"];

// ---------------------------------------------------------------------------
// FileScenario
// ---------------------------------------------------------------------------

/// A scenario stored as one file per quantity:
///
/// ```text
///  <root>/
///    par/demand.parquet
///    par/interest_rate.json
///    var/ACT.csv
///    equ/COST_NODAL.json
/// ```
#[derive(Debug, Clone)]
pub struct FileScenario {
    root: PathBuf,
}

impl FileScenario {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the file holding quantity `name`, if one exists.
    pub fn path_of(&self, kind: QuantityKind, name: &str) -> Option<PathBuf> {
        let dir = self.root.join(kind.tag());
        EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{name}.{ext}")))
            .find(|p| p.is_file())
    }

    /// Names of the quantities of `kind` present on disk, sorted.
    pub fn list(&self, kind: QuantityKind) -> Result<Vec<String>> {
        let dir = self.root.join(kind.tag());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        let entries =
            std::fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            let known = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if let (true, Some(stem)) = (known, path.file_stem().and_then(|s| s.to_str())) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }
}

impl Scenario for FileScenario {
    fn quantity(&self, kind: QuantityKind, name: &str) -> Result<QuantityData> {
        let path = self
            .path_of(kind, name)
            .with_context(|| format!("no {kind} '{name}' under {}", self.root.display()))?;
        log::info!("loading {kind} '{name}' from {}", path.display());
        load_file(&path).with_context(|| format!("loading {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load quantity data from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – any flat table (written by Pandas, Polars, or Arrow)
/// * `.csv`     – header row plus one row per index combination
/// * `.json`    – `[{ "node": "east", "value": 1.0, ... }, ...]` for a table,
///   or a single object `{ "value": 0.05, "unit": "-" }` for a scalar
pub fn load_file(path: &Path) -> Result<QuantityData> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Column order follows the key order of the first record; keys that only
/// appear in later records are appended.
fn load_json(path: &Path) -> Result<QuantityData> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    match root {
        JsonValue::Object(obj) => {
            let record = obj
                .iter()
                .map(|(k, v)| (k.clone(), json_to_cell(v)))
                .collect();
            Ok(QuantityData::Scalar(record))
        }
        JsonValue::Array(records) => {
            let mut columns: Vec<String> = Vec::new();
            for (i, rec) in records.iter().enumerate() {
                let obj = rec
                    .as_object()
                    .with_context(|| format!("Row {i} is not a JSON object"))?;
                for key in obj.keys() {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
            }

            let rows: Vec<Vec<Cell>> = records
                .iter()
                .map(|rec| {
                    columns
                        .iter()
                        .map(|col| rec.get(col).map(json_to_cell).unwrap_or(Cell::Null))
                        .collect()
                })
                .collect();

            Ok(QuantityData::Table(record_batch_from_rows(columns.as_slice(), &rows)?))
        }
        _ => bail!("Expected a JSON object or an array of objects"),
    }
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Cell::Float(f)
            } else {
                Cell::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Cell::Bool(*b),
        JsonValue::Null => Cell::Null,
        other => Cell::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then one row per index
/// combination. Cell types are guessed per value; the column type is then
/// inferred from all of its cells.
fn load_csv(path: &Path) -> Result<QuantityData> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: {} fields but {} columns",
                record.len(),
                headers.len()
            );
        }
        rows.push(record.iter().map(guess_cell_type).collect::<Vec<_>>());
    }

    Ok(QuantityData::Table(record_batch_from_rows(headers.as_slice(), &rows)?))
}

fn guess_cell_type(s: &str) -> Cell {
    if s.is_empty() {
        return Cell::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Cell::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Cell::Float(f);
    }
    if s == "true" || s == "false" {
        return Cell::Bool(s == "true");
    }
    Cell::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding one quantity. All record batches are
/// concatenated into a single table.
fn load_parquet(path: &Path) -> Result<QuantityData> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("reading parquet record batch")?;
    log::debug!("{}: {} record batches", path.display(), batches.len());

    let table = concat_batches(&schema, &batches).context("concatenating record batches")?;
    Ok(QuantityData::Table(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::DataType;

    #[test]
    fn guesses_cell_types() {
        assert_eq!(guess_cell_type(""), Cell::Null);
        assert_eq!(guess_cell_type("2030"), Cell::Integer(2030));
        assert_eq!(guess_cell_type("0.5"), Cell::Float(0.5));
        assert_eq!(guess_cell_type("true"), Cell::Bool(true));
        assert_eq!(guess_cell_type("east"), Cell::from("east"));
    }

    #[test]
    fn csv_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demand.csv");
        std::fs::write(
            &path,
            "node,year,unit,value\neast,2020,GWa,1.5\nwest,2020,GWa,2\n",
        )
        .unwrap();

        let QuantityData::Table(batch) = load_file(&path).unwrap() else {
            panic!("expected a table");
        };
        assert_eq!(batch.num_rows(), 2);
        let schema = batch.schema();
        assert_eq!(schema.field(1).data_type(), &DataType::Int64);
        assert_eq!(schema.field(3).data_type(), &DataType::Float64);
    }

    #[test]
    fn json_object_is_scalar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rate.json");
        std::fs::write(&path, r#"{"value": 0.05, "unit": "-"}"#).unwrap();

        let QuantityData::Scalar(record) = load_file(&path).unwrap() else {
            panic!("expected a scalar record");
        };
        assert_eq!(record.get("value"), Some(&Cell::Float(0.05)));
        assert_eq!(record.get("unit"), Some(&Cell::from("-")));
    }

    #[test]
    fn json_records_keep_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ACT.json");
        std::fs::write(
            &path,
            r#"[{"tec": "coal", "year": 2020, "lvl": 1.0, "mrg": 0.0},
                {"tec": "wind", "year": 2020, "lvl": 2.0, "mrg": 0.1}]"#,
        )
        .unwrap();

        let QuantityData::Table(batch) = load_file(&path).unwrap() else {
            panic!("expected a table");
        };
        let names: Vec<_> = batch.schema().fields().iter().map(|f| f.name().clone()).collect();
        assert_eq!(names, vec!["tec", "year", "lvl", "mrg"]);
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = load_file(Path::new("quantity.xlsx")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file extension: .xlsx");
    }

    #[test]
    fn file_scenario_lookup_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("par")).unwrap();
        std::fs::write(dir.path().join("par/b.csv"), "value\n1\n").unwrap();
        std::fs::write(dir.path().join("par/a.json"), r#"{"value": 1}"#).unwrap();
        std::fs::write(dir.path().join("par/notes.txt"), "ignored").unwrap();

        let scenario = FileScenario::new(dir.path());
        assert_eq!(scenario.list(QuantityKind::Parameter).unwrap(), vec!["a", "b"]);
        assert!(scenario.list(QuantityKind::Variable).unwrap().is_empty());
        assert!(scenario.quantity(QuantityKind::Parameter, "a").is_ok());
        assert!(scenario.quantity(QuantityKind::Parameter, "notes").is_err());
    }

    #[test]
    fn file_scenario_prefers_parquet_then_csv() {
        let dir = tempfile::tempdir().unwrap();
        let par = dir.path().join("par");
        std::fs::create_dir(&par).unwrap();
        std::fs::write(par.join("rate.json"), r#"{"value": 2}"#).unwrap();
        std::fs::write(par.join("rate.csv"), "value\n1\n").unwrap();

        let scenario = FileScenario::new(dir.path());
        assert_eq!(
            scenario.path_of(QuantityKind::Parameter, "rate"),
            Some(par.join("rate.csv"))
        );
        let QuantityData::Table(batch) = scenario.quantity(QuantityKind::Parameter, "rate").unwrap()
        else {
            panic!("expected the csv table");
        };
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(scenario.list(QuantityKind::Parameter).unwrap(), vec!["rate"]);

        let batch = record_batch_from_rows(&["value"], &[vec![Cell::Float(3.0)]]).unwrap();
        let file = std::fs::File::create(par.join("rate.pq")).unwrap();
        let mut writer = parquet::arrow::ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        assert_eq!(
            scenario.path_of(QuantityKind::Parameter, "rate"),
            Some(par.join("rate.pq"))
        );

        std::fs::copy(par.join("rate.pq"), par.join("rate.parquet")).unwrap();
        assert_eq!(
            scenario.path_of(QuantityKind::Parameter, "rate"),
            Some(par.join("rate.parquet"))
        );
    }
}

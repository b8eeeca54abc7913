//! Write a small demo scenario directory:
//!
//! ```text
//!  <out>/par/demand.parquet        node × year, unit GWa
//!  <out>/par/interest_rate.json    scalar
//!  <out>/var/ACT.csv               tec × node × year, lvl / mrg
//!  <out>/equ/COST_NODAL.json       node, lvl / mrg, no unit
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[low, high)`
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }
}

const NODES: [&str; 3] = ["east", "north", "west"];
const YEARS: [i64; 3] = [2020, 2030, 2040];
const TECHNOLOGIES: [&str; 3] = ["coal_ppl", "gas_ppl", "wind_ppl"];

fn main() {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_scenario"));
    let mut rng = SimpleRng::new(42);

    for kind in ["par", "var", "equ"] {
        std::fs::create_dir_all(out_dir.join(kind)).expect("Failed to create scenario directory");
    }

    // par/demand.parquet: demand per node and year, growing over time
    let mut nodes = Vec::new();
    let mut years = Vec::new();
    let mut values = Vec::new();
    for (i, node) in NODES.iter().enumerate() {
        for (j, &year) in YEARS.iter().enumerate() {
            nodes.push(*node);
            years.push(year);
            values.push((10.0 + 5.0 * i as f64) * (1.0 + 0.2 * j as f64) + rng.uniform(-0.5, 0.5));
        }
    }
    let units = vec!["GWa"; values.len()];

    let schema = Arc::new(Schema::new(vec![
        Field::new("node", DataType::Utf8, false),
        Field::new("year", DataType::Int64, false),
        Field::new("unit", DataType::Utf8, false),
        Field::new("value", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(nodes)),
            Arc::new(Int64Array::from(years)),
            Arc::new(StringArray::from(units)),
            Arc::new(Float64Array::from(values)),
        ],
    )
    .expect("Failed to create RecordBatch");

    let demand_path = out_dir.join("par/demand.parquet");
    let file = std::fs::File::create(&demand_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    // par/interest_rate.json: a scalar record
    let rate = serde_json::json!({ "value": 0.05, "unit": "-" });
    std::fs::write(out_dir.join("par/interest_rate.json"), rate.to_string())
        .expect("Failed to write interest_rate.json");

    // var/ACT.csv: activity per technology, node and year
    let mut csv_writer =
        csv::Writer::from_path(out_dir.join("var/ACT.csv")).expect("Failed to create ACT.csv");
    csv_writer
        .write_record(["tec", "node", "year", "unit", "lvl", "mrg"])
        .expect("Failed to write header");
    let mut rows = 0;
    for tec in TECHNOLOGIES {
        for node in NODES {
            for year in YEARS {
                // Not every technology is built everywhere.
                if rng.next_f64() < 0.2 {
                    continue;
                }
                let year = year.to_string();
                let lvl = format!("{:.3}", rng.uniform(0.0, 8.0));
                csv_writer
                    .write_record([tec, node, year.as_str(), "GWa", lvl.as_str(), "0"])
                    .expect("Failed to write row");
                rows += 1;
            }
        }
    }
    csv_writer.flush().expect("Failed to flush ACT.csv");

    // equ/COST_NODAL.json: equations carry no unit
    let cost: Vec<serde_json::Value> = NODES
        .iter()
        .map(|node| {
            serde_json::json!({
                "node": node,
                "lvl": rng.uniform(100.0, 200.0),
                "mrg": rng.uniform(0.0, 1.0),
            })
        })
        .collect();
    std::fs::write(
        out_dir.join("equ/COST_NODAL.json"),
        serde_json::to_string_pretty(&cost).expect("Failed to serialise COST_NODAL"),
    )
    .expect("Failed to write COST_NODAL.json");

    println!(
        "Wrote demand ({} rows), interest_rate, ACT ({rows} rows) and COST_NODAL to {}",
        batch.num_rows(),
        out_dir.display()
    );
}

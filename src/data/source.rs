use std::collections::{BTreeMap, HashMap};

use anyhow::{anyhow, Result};
use arrow::record_batch::RecordBatch;

use super::model::{Cell, QuantityData, QuantityKind};

/// A backend that can hand out the raw data of named quantities.
pub trait Scenario {
    /// Retrieve quantity `name` of the given `kind`.
    fn quantity(&self, kind: QuantityKind, name: &str) -> Result<QuantityData>;
}

impl<S: Scenario + ?Sized> Scenario for &S {
    fn quantity(&self, kind: QuantityKind, name: &str) -> Result<QuantityData> {
        (**self).quantity(kind, name)
    }
}

/// A scenario held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryScenario {
    quantities: HashMap<(QuantityKind, String), QuantityData>,
}

impl MemoryScenario {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_table(
        &mut self,
        kind: QuantityKind,
        name: impl Into<String>,
        table: RecordBatch,
    ) {
        self.quantities
            .insert((kind, name.into()), QuantityData::Table(table));
    }

    pub fn insert_scalar(
        &mut self,
        kind: QuantityKind,
        name: impl Into<String>,
        record: BTreeMap<String, Cell>,
    ) {
        self.quantities
            .insert((kind, name.into()), QuantityData::Scalar(record));
    }

    /// Names of all quantities of `kind`, sorted.
    pub fn names(&self, kind: QuantityKind) -> Vec<String> {
        let mut names: Vec<String> = self
            .quantities
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }
}

impl Scenario for MemoryScenario {
    fn quantity(&self, kind: QuantityKind, name: &str) -> Result<QuantityData> {
        self.quantities
            .get(&(kind, name.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("no {kind} '{name}' in scenario"))
    }
}

use std::fmt;

use super::key::Key;
use crate::data::model::LabeledArray;
use crate::error::{Error, Result};

/// Sum `quantity` over `dimensions`.
pub fn aggregate<S: AsRef<str>>(quantity: &LabeledArray, dimensions: &[S]) -> Result<LabeledArray> {
    log::debug!(
        "aggregating '{}' over {:?}",
        quantity.name(),
        dimensions.iter().map(AsRef::as_ref).collect::<Vec<_>>()
    );
    quantity.sum_over(dimensions)
}

/// A deferred aggregation: sum the quantity identified by `source` over
/// `dimensions`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateTask {
    source: Key,
    dimensions: Vec<String>,
}

impl AggregateTask {
    pub fn new(source: Key, dimensions: Vec<String>) -> Self {
        Self { source, dimensions }
    }

    /// Key of the quantity the task consumes.
    pub fn source(&self) -> &Key {
        &self.source
    }

    /// Dimensions summed away.
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Run the task on the source quantity. The array must be indexed by
    /// exactly the source key's dimensions, in order.
    pub fn apply(&self, quantity: &LabeledArray) -> Result<LabeledArray> {
        if quantity.dims() != self.source.dims() {
            return Err(Error::DimensionMismatch {
                key: self.source.to_string(),
                expected: self.source.dims().to_vec(),
                actual: quantity.dims().to_vec(),
            });
        }
        aggregate(quantity, self.dimensions.as_slice())
    }
}

impl fmt::Display for AggregateTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sum({}, [{}])", self.source, self.dimensions.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Cell;
    use ndarray::array;

    fn activity() -> LabeledArray {
        LabeledArray::new(
            "ACT",
            vec!["tec".into(), "year".into()],
            vec![
                vec!["coal".into(), "wind".into()],
                vec![Cell::Integer(2020), Cell::Integer(2030)],
            ],
            array![[10.0, 5.0], [1.0, 4.0]].into_dyn(),
        )
        .unwrap()
    }

    #[test]
    fn aggregate_sums_named_dimension() {
        let by_year = aggregate(&activity(), &["tec"]).unwrap();
        assert_eq!(by_year.dims(), &["year"]);
        assert_eq!(by_year.get(&[Cell::Integer(2020)]), Some(11.0));
        assert_eq!(by_year.get(&[Cell::Integer(2030)]), Some(9.0));
        assert_eq!(by_year.name(), "ACT");
    }

    #[test]
    fn apply_follows_key_aggregates() {
        let key = Key::new("ACT", ["tec", "year"]).unwrap();
        let results: Vec<(Key, LabeledArray)> = key
            .aggregates()
            .map(|(k, task)| (k, task.apply(&activity()).unwrap()))
            .collect();

        assert_eq!(results.len(), 3);
        for (k, array) in &results {
            assert_eq!(k.dims(), array.dims());
        }
        let (total_key, total) = &results[0];
        assert!(total_key.matches("ACT:"));
        assert_eq!(total.item(), Some(20.0));
    }

    #[test]
    fn apply_checks_dimensions() {
        let source = Key::new("ACT", ["year", "tec"]).unwrap();
        let task = AggregateTask::new(source, vec!["tec".into()]);
        assert!(matches!(
            task.apply(&activity()),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn display() {
        let source = Key::new("foo", ["a", "b", "c"]).unwrap();
        let task = AggregateTask::new(source, vec!["b".into(), "c".into()]);
        assert_eq!(task.to_string(), "sum(foo:a-b-c, [b, c])");
    }
}

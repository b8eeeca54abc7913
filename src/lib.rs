//! Helpers for reporting on scenario quantities.
//!
//! * [`Key`] names a quantity together with its dimensions (`foo:a-b-c`) and
//!   enumerates every aggregation of it.
//! * [`combo_partition`] splits a sequence into two complementary,
//!   order-preserving parts in every possible way.
//! * [`quantity_as_array`] turns the table a [`Scenario`] returns into
//!   [`LabeledArray`]s with the unit attached.

pub mod data;
pub mod error;
pub mod reporting;

pub use data::loader::FileScenario;
pub use data::model::{Cell, LabeledArray, QuantityData, QuantityKind};
pub use data::source::{MemoryScenario, Scenario};
pub use error::{Error, Result};
pub use reporting::computations::{aggregate, AggregateTask};
pub use reporting::key::Key;
pub use reporting::partition::combo_partition;
pub use reporting::quantity::quantity_as_array;

//! Reporting utilities: quantity keys, their aggregations, and conversion of
//! scenario tables into labeled arrays.

pub mod computations;
pub mod key;
pub mod partition;
pub mod quantity;

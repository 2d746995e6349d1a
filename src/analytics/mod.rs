//! Analytics over sales, purchases and expenses.

pub mod aggregator;
pub mod period;

pub use aggregator::{aggregate, aggregate_as_of_now, count_undated, Bucket, Dated, Summary};
pub use period::{parse_timestamp, Granularity};

//!  Storage is organized through [usage_store::CsvUsageStore].
//!  The basic idea is:
//!   - There is a single delimited text file with a `Date,Total Time` header.
//!   - Every other row maps a day to the total time the editor was open on it.
//!   - Rows stay in insertion order. Saving rewrites the whole file.

pub mod entities;
pub mod usage_store;
#[cfg(test)]
pub mod memory_store;

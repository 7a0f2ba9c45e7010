//! Keeps track of how long your editor is open each day.
//! A background sampler polls the process list, folds every session into a per-day total and
//! saves it to a small delimited file that the shell can report on.
//!

pub mod cli;
pub mod fs;
pub mod process_api;
pub mod tracker;
pub mod utils;

//! Report generation for case results
//!
//! This crate provides sinks for a [`lockbench_core::CaseReport`]:
//!
//! - Aggregated CSV tables
//! - JSON summaries
//! - Line charts of mean time per thread count

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chart;
pub mod csv_export;
pub mod json_export;

pub use chart::LinePlotter;
pub use csv_export::CsvExporter;
pub use json_export::JsonExporter;

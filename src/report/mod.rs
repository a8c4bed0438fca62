//! Report rendering.
//!
//! This module turns finished runs into the summary lines printed on
//! stdout, or into a JSON document.

pub mod generator;

pub use generator::{generate_json_report, summary_line};

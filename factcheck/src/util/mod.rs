//! Shared helpers for provider code
//!
//! - **batch**: ordered, bounded-concurrency execution
//! - **json**: JSON extraction and parsing from model output

pub mod batch;
pub mod json;

pub use batch::{execute_batch, TaskContext};
pub use json::{extract_json, parse_json, parse_json_object};

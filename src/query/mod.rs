//! Query execution and result rendering for text2sql.
//!
//! This module isolates SQL execution and result formatting from the pipeline.

pub mod executor;
pub mod render;

pub use executor::{missing_table_message, ExecutionOutcome, QueryExecutor, NO_QUERY_MESSAGE};
pub use render::{render, render_table, NO_RECORDS_MESSAGE};

//! Integration tests for text2sql.

pub mod export_test;
pub mod pipeline_test;
pub mod postgres_test;

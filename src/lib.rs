//! text2sql - natural-language questions answered from a PostgreSQL table.
//!
//! This library exposes the pipeline modules for the binary and the
//! integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod query;

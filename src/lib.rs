//! tagboard: count tags across JSONL files, group them into per-user
//! categories and chart the result.

pub mod aggregate;
pub mod categories;
pub mod chart;
pub mod cli;
pub mod config;
pub mod export;
pub mod ingest;
pub mod mirror;
pub mod pipeline;
pub mod settings;
pub mod store;
pub mod web;

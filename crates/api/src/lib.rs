//! HTTP API over the voice licensing ledger.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;

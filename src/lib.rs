//! PARLAY FORGE: NBA player-prop parlay engine
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod data;
pub mod strategy;
pub mod report;
pub mod pipeline;
pub mod api;

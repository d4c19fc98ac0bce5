//! npsearch library
//!
//! Exposes the cache, scrapers and session driver for use by the binary and
//! integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod display;

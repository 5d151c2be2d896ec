//! Cache Engine - an in-process key-value cache
//!
//! Bounded entry table with LRU eviction, per-key TTL expiration (lazy on
//! read plus a background sweep), JSON persistence collaborators and a
//! text command shell.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod persistence;
pub mod tasks;

pub use cache::CacheEngine;
pub use config::Config;
pub use error::{CacheError, Result};

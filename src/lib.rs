// src/lib.rs

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod crawl;
pub mod error;
pub mod geocode;
pub mod provider;
pub mod records;
pub mod resolver;
pub mod runner;

pub mod csv;
pub mod file;
pub mod progress;
pub mod store;

pub use error::{Error, FetchError, Result};

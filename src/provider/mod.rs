// src/provider/mod.rs
//! Geodata providers behind one capability: turn a query string into at
//! most one result.
//!
//! The resolver and the disk cache are generic over [`Provider`]; adding a
//! backend means implementing `search` and nothing else.
//!
//! Contract for `search`:
//! - `Ok(Some(v))` – the provider answered with a match; `v` is cached.
//! - `Ok(None)`    – the provider answered "nothing"; cached as `null`.
//! - `Err(e)`      – the request failed; never cached, retried next run.

pub mod nominatim;
pub mod overpass;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::FetchError;

pub use nominatim::Nominatim;
pub use overpass::{Overpass, OverpassQuery};

pub trait Provider {
    /// What gets cached and returned. Stored as-is.
    type Output: Serialize + DeserializeOwned + Clone;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn search(&mut self, query: &str) -> Result<Option<Self::Output>, FetchError>;
}

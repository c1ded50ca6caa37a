// src/provider/nominatim.rs
//
// Free-text search. The provider ranks candidates; only the first one is
// kept (precision over recall), exactly as returned.

use serde_json::Value;

use super::Provider;
use crate::config::options::NominatimOptions;
use crate::core::RateLimitedClient;
use crate::error::FetchError;

pub struct Nominatim {
    client: RateLimitedClient,
    opts: NominatimOptions,
}

impl Nominatim {
    pub fn new(client: RateLimitedClient, opts: NominatimOptions) -> Self {
        Self { client, opts }
    }

    pub fn params(&self, query: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", s!(query)),
            ("format", s!("jsonv2")),
            ("limit", self.opts.limit.max(1).to_string()),
            ("countrycodes", self.opts.countrycodes.clone()),
        ];
        if self.opts.address_details {
            params.push(("addressdetails", s!("1")));
        }
        params
    }

    pub fn calls(&self) -> u64 {
        self.client.calls()
    }
}

/// First candidate of a search response; `None` for an empty list.
pub fn first_candidate(url: &str, body: Value) -> Result<Option<Value>, FetchError> {
    match body {
        Value::Array(candidates) => Ok(candidates.into_iter().next()),
        other => Err(FetchError::decode(url, format!("expected a JSON array, got {}", kind_of(&other)))),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Provider for Nominatim {
    type Output = Value;

    fn name(&self) -> &'static str {
        "nominatim"
    }

    fn search(&mut self, query: &str) -> Result<Option<Value>, FetchError> {
        let params = self.params(query);
        let body = self.client.get_json(&self.opts.base_url, &params)?;
        first_candidate(&self.opts.base_url, body)
    }
}

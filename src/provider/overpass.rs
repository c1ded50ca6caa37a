// src/provider/overpass.rs
//
// Map-feature queries in Overpass QL. The whole feature collection is the
// result; an empty `elements` array counts as "no match" unless the server
// remarks that the query failed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Provider;
use crate::config::options::OverpassOptions;
use crate::core::RateLimitedClient;
use crate::error::FetchError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

impl std::str::FromStr for BoundingBox {
    type Err = String;

    /// `"south,west,north,east"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>().map_err(|e| format!("bad coordinate {p:?}: {e}")))
            .collect::<Result<_, _>>()?;
        let [south, west, north, east] = parts[..] else {
            return Err(format!("expected 4 comma-separated numbers, got {}", parts.len()));
        };
        if south > north || west > east {
            return Err(format!("box {s:?} is inverted (want south,west,north,east)"));
        }
        Ok(Self { south, west, north, east })
    }
}

/// Which program to send for a query string.
#[derive(Clone, Debug, PartialEq)]
pub enum OverpassQuery {
    /// Nodes whose `name` equals the query, inside a box.
    NameInBox(BoundingBox),
    /// Nodes, ways and relations in the administrative area named by the
    /// query whose name, operator or brand matches `pattern` (case-insensitive).
    OrganisationInArea { pattern: String, timeout_secs: u32 },
}

/// Quote a value for use inside a QL string literal.
fn ql_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

impl OverpassQuery {
    pub fn program(&self, query: &str) -> String {
        match self {
            OverpassQuery::NameInBox(bbox) => {
                format!("[out:json];node[\"name\"=\"{}\"]({bbox});out;", ql_escape(query))
            }
            OverpassQuery::OrganisationInArea { pattern, timeout_secs } => {
                let pattern = ql_escape(pattern);
                let mut ql = format!(
                    "[out:json][timeout:{timeout_secs}];\narea[\"name\"=\"{}\"]->.searchArea;\n(\n",
                    ql_escape(query)
                );
                for tag in ["name", "operator", "brand"] {
                    for kind in ["node", "way", "relation"] {
                        ql.push_str(&format!("  {kind}(area.searchArea)[\"{tag}\"~\"{pattern}\",i];\n"));
                    }
                }
                ql.push_str(");\nout center;");
                ql
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub elements: Vec<Element>,
    /// `version`, `generator`, `osm3s`, … kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Center>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    /// Point coordinates, or the centre Overpass computed for ways/relations.
    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => self.center.map(|c| (c.lat, c.lon)),
        }
    }

    pub fn tag(&self, key: &str) -> &str {
        self.tags.get(key).map(String::as_str).unwrap_or("")
    }

    /// First non-empty tag of `keys` (e.g. `contact:phone`, then `phone`).
    pub fn first_tag(&self, keys: &[&str]) -> &str {
        keys.iter().map(|k| self.tag(k)).find(|v| !v.is_empty()).unwrap_or("")
    }
}

/// The `remark` Overpass adds when it gave up on a query ("runtime error:
/// Query timed out", "runtime error: Query run out of memory"). Such a
/// response has no elements but is not an answer.
pub fn runtime_remark(body: &Value) -> Option<&str> {
    body.get("remark")
        .and_then(Value::as_str)
        .filter(|r| r.to_ascii_lowercase().contains("error"))
}

pub struct Overpass {
    client: RateLimitedClient,
    base_url: String,
    query: OverpassQuery,
}

impl Overpass {
    pub fn new(client: RateLimitedClient, base_url: impl Into<String>, query: OverpassQuery) -> Self {
        Self { client, base_url: base_url.into(), query }
    }

    /// Plain name lookups inside the configured box.
    pub fn name_search(client: RateLimitedClient, opts: &OverpassOptions) -> Self {
        Self::new(client, opts.base_url.clone(), OverpassQuery::NameInBox(opts.bbox))
    }

    /// Organisation sweep over named areas.
    pub fn area_sweep(client: RateLimitedClient, opts: &OverpassOptions) -> Self {
        let query = OverpassQuery::OrganisationInArea {
            pattern: opts.pattern.clone(),
            timeout_secs: opts.area_timeout_secs,
        };
        Self::new(client, opts.base_url.clone(), query)
    }

    pub fn calls(&self) -> u64 {
        self.client.calls()
    }
}

impl Provider for Overpass {
    type Output = FeatureCollection;

    fn name(&self) -> &'static str {
        "overpass"
    }

    fn search(&mut self, query: &str) -> Result<Option<FeatureCollection>, FetchError> {
        let params = [("data", self.query.program(query))];
        let url = self.base_url.clone();
        let body = self.client.get_json_checked(&self.base_url, &params, |body| match runtime_remark(body) {
            Some(remark) => Err(FetchError::Remote { url: url.clone(), remark: s!(remark) }),
            None => Ok(()),
        })?;
        let features: FeatureCollection =
            serde_json::from_value(body).map_err(|e| FetchError::decode(&self.base_url, e))?;
        if features.elements.is_empty() {
            return Ok(None);
        }
        Ok(Some(features))
    }
}

// src/records.rs
//
// The flat location row every export uses, built from either provider's
// payload, plus the per-query record written for JSON output.

use serde::Serialize;
use serde_json::Value;

use crate::error::Failure;
use crate::provider::overpass::{Element, FeatureCollection};
use crate::resolver::Resolution;

pub const HEADERS: [&str; 14] = [
    "id", "region", "type", "name", "street", "housenumber", "postcode", "city",
    "lat", "lon", "phone", "email", "website", "amenity",
];

pub fn headers() -> Vec<String> {
    HEADERS.iter().map(|h| s!(*h)).collect()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LocationRow {
    pub id: String,
    pub region: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub street: String,
    pub housenumber: String,
    pub postcode: String,
    pub city: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub amenity: String,
}

impl LocationRow {
    /// One map feature. `contact:*` tags win over the plain ones; ways and
    /// relations take Overpass' computed centre.
    pub fn from_element(region: &str, el: &Element) -> Self {
        let (lat, lon) = el.coords().unzip();
        Self {
            id: el.id.to_string(),
            region: s!(region),
            kind: el.kind.clone(),
            name: s!(el.tag("name")),
            street: s!(el.tag("addr:street")),
            housenumber: s!(el.tag("addr:housenumber")),
            postcode: s!(el.tag("addr:postcode")),
            city: s!(el.tag("addr:city")),
            lat,
            lon,
            phone: s!(el.first_tag(&["contact:phone", "phone"])),
            email: s!(el.first_tag(&["contact:email", "email"])),
            website: s!(el.first_tag(&["contact:website", "website"])),
            amenity: s!(el.tag("amenity")),
        }
    }

    /// A search candidate (jsonv2 with address details). Coordinates come
    /// as strings there.
    pub fn from_place(query: &str, place: &Value) -> Self {
        let text = |v: &Value, key: &str| v.get(key).and_then(Value::as_str).unwrap_or("").to_string();
        let coord = |key: &str| match place.get(key) {
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(v) => v.as_f64(),
            None => None,
        };
        let addr = place.get("address").cloned().unwrap_or(Value::Null);
        let name = match text(place, "name") {
            n if n.is_empty() => s!(query),
            n => n,
        };
        let amenity = if text(place, "category") == "amenity" { text(place, "type") } else { String::new() };
        Self {
            id: place.get("osm_id").map(|v| v.to_string().trim_matches('"').to_string()).unwrap_or_default(),
            region: s!(query),
            kind: text(place, "osm_type"),
            name,
            street: text(&addr, "road"),
            housenumber: text(&addr, "house_number"),
            postcode: text(&addr, "postcode"),
            city: city_of(&addr),
            lat: coord("lat"),
            lon: coord("lon"),
            amenity,
            ..Self::default()
        }
    }

    pub fn from_features(region: &str, fc: &FeatureCollection) -> Vec<Self> {
        fc.elements.iter().map(|el| Self::from_element(region, el)).collect()
    }

    pub fn coords(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }

    /// Has a position but at least one empty address field.
    pub fn needs_address(&self) -> bool {
        self.coords().is_some() && (self.street.is_empty() || self.postcode.is_empty() || self.city.is_empty())
    }

    pub fn to_cells(&self) -> Vec<String> {
        let num = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        cells![
            self.id, self.region, self.kind, self.name, self.street, self.housenumber,
            self.postcode, self.city, num(self.lat), num(self.lon), self.phone,
            self.email, self.website, self.amenity,
        ]
    }
}

/// Town, then city, then village.
pub fn city_of(addr: &Value) -> String {
    ["town", "city", "village"]
        .iter()
        .filter_map(|k| addr.get(*k).and_then(Value::as_str))
        .find(|v| !v.is_empty())
        .unwrap_or("")
        .to_string()
}

/// JSON export shape for one query: what was asked and what came back.
#[derive(Debug, Serialize)]
pub struct ResolutionRecord<'a, V: Serialize> {
    pub query: &'a str,
    pub status: &'static str,
    pub result: Option<&'a V>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a Failure>,
}

impl<'a, V: Serialize> ResolutionRecord<'a, V> {
    pub fn new(query: &'a str, res: &'a Resolution<V>) -> Self {
        let error = match res {
            Resolution::Failed(f) => Some(f),
            _ => None,
        };
        Self { query, status: res.status(), result: res.value(), error }
    }
}

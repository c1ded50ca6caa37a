// src/geocode.rs
//
// Reverse geocoding: coordinates to a postal address, used to fill the
// address columns map features often lack. Goes through the same cache and
// resolver as the search providers, keyed by "lat,lon".

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::options::{ResolveOptions, ReverseOptions};
use crate::core::RateLimitedClient;
use crate::error::FetchError;
use crate::progress::Progress;
use crate::provider::Provider;
use crate::records::{LocationRow, city_of};
use crate::resolver::{ResolveStats, Resolver};
use crate::store::DiskCache;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub postcode: String,
    pub city: String,
    pub street: String,
    pub housenumber: String,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.postcode.is_empty() && self.city.is_empty() && self.street.is_empty() && self.housenumber.is_empty()
    }
}

/// Cache key for a position: six decimals (about 10 cm).
pub fn coord_key(lat: f64, lon: f64) -> String {
    format!("{lat:.6},{lon:.6}")
}

fn parse_key(key: &str) -> Option<(f64, f64)> {
    let (lat, lon) = key.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

/// Address breakdown of a reverse response; `None` when there is none.
pub fn address_from_response(body: &Value) -> Option<Address> {
    let addr = body.get("address")?;
    let text = |key: &str| addr.get(key).and_then(Value::as_str).unwrap_or("").to_string();
    let address = Address {
        postcode: text("postcode"),
        city: city_of(addr),
        street: text("road"),
        housenumber: text("house_number"),
    };
    (!address.is_empty()).then_some(address)
}

pub struct ReverseGeocoder {
    client: RateLimitedClient,
    opts: ReverseOptions,
}

impl ReverseGeocoder {
    pub fn new(client: RateLimitedClient, opts: ReverseOptions) -> Self {
        Self { client, opts }
    }

    pub fn calls(&self) -> u64 {
        self.client.calls()
    }
}

impl Provider for ReverseGeocoder {
    type Output = Address;

    fn name(&self) -> &'static str {
        "reverse"
    }

    fn search(&mut self, query: &str) -> Result<Option<Address>, FetchError> {
        let (lat, lon) = parse_key(query)
            .ok_or_else(|| FetchError::decode(&self.opts.base_url, format!("{query:?} is not a lat,lon pair")))?;
        let params = [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("format", s!("jsonv2")),
            ("addressdetails", s!("1")),
            ("accept-language", self.opts.language.clone()),
        ];
        let body = self.client.get_json(&self.opts.base_url, &params)?;
        // {"error": "Unable to geocode"} is a clean "nothing here"
        Ok(address_from_response(&body))
    }
}

/// Fill empty street/housenumber/postcode/city fields of rows that have
/// coordinates. Fields that already hold a value are left alone.
pub fn fill_missing_addresses<P>(
    rows: &mut [LocationRow],
    geocoder: &mut P,
    cache: &mut DiskCache<Address>,
    options: ResolveOptions,
    progress: &mut dyn Progress,
) -> ResolveStats
where
    P: Provider<Output = Address>,
{
    let pending: Vec<(usize, String)> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.needs_address())
        .filter_map(|(i, r)| r.coords().map(|(lat, lon)| (i, coord_key(lat, lon))))
        .collect();
    if pending.is_empty() {
        return ResolveStats::default();
    }
    logf!("reverse geocoding {} rows without a full address", pending.len());

    let keys: Vec<&str> = pending.iter().map(|(_, k)| k.as_str()).collect();
    let mut resolver = Resolver::new(geocoder, cache, options);
    let resolutions = resolver.resolve_all(&keys, progress);
    let stats = resolver.stats();

    for ((i, _), res) in pending.iter().zip(resolutions) {
        if let Some(addr) = res.into_value() {
            apply(&mut rows[*i], &addr);
        }
    }
    stats
}

fn apply(row: &mut LocationRow, addr: &Address) {
    let fill = |slot: &mut String, value: &str| {
        if slot.is_empty() {
            *slot = s!(value);
        }
    };
    fill(&mut row.street, &addr.street);
    fill(&mut row.housenumber, &addr.housenumber);
    fill(&mut row.postcode, &addr.postcode);
    fill(&mut row.city, &addr.city);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_round_trips_at_six_decimals() {
        assert_eq!(coord_key(52.52, 13.405), "52.520000,13.405000");
        assert_eq!(parse_key("52.520000,13.405000"), Some((52.52, 13.405)));
        assert_eq!(parse_key("Berlin"), None);
    }

    #[test]
    fn town_beats_city_and_error_body_is_no_address() {
        let body = json!({"address": {"road": "Marktplatz", "house_number": "1",
                                      "postcode": "16225", "town": "Eberswalde", "city": "Barnim"}});
        let addr = address_from_response(&body).unwrap();
        assert_eq!(addr.city, "Eberswalde");
        assert_eq!(addr.street, "Marktplatz");
        assert_eq!(address_from_response(&json!({"error": "Unable to geocode"})), None);
    }

    #[test]
    fn apply_only_fills_blanks() {
        let mut row = LocationRow { city: s!("Berlin"), ..LocationRow::default() };
        let addr = Address { postcode: s!("10961"), city: s!("Kreuzberg"), street: s!("Blücherstraße"), housenumber: s!("62") };
        apply(&mut row, &addr);
        assert_eq!(row.city, "Berlin");
        assert_eq!(row.postcode, "10961");
        assert_eq!(row.street, "Blücherstraße");
    }
}

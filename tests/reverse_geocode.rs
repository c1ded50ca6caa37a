// tests/reverse_geocode.rs
mod common;

use std::collections::HashMap;
use std::fs;

use serde_json::{Value, json};
use tempfile::TempDir;

use awo_locate::config::consts::REVERSE_CACHE_FILE;
use awo_locate::config::options::{AppOptions, ResolveOptions};
use awo_locate::error::FetchError;
use awo_locate::geocode::{Address, coord_key, fill_missing_addresses};
use awo_locate::progress::NullProgress;
use awo_locate::provider::Provider;
use awo_locate::records::LocationRow;
use awo_locate::runner::enrich_addresses;
use awo_locate::store::DiskCache;
use common::{Reply, StubServer};

/// Addresses by coordinate key; unknown keys have no address.
struct AddressBook {
    known: HashMap<String, Address>,
    calls: Vec<String>,
}

impl Provider for AddressBook {
    type Output = Address;

    fn name(&self) -> &'static str {
        "address-book"
    }

    fn search(&mut self, key: &str) -> Result<Option<Address>, FetchError> {
        self.calls.push(key.to_string());
        Ok(self.known.get(key).cloned())
    }
}

fn row(name: &str, coords: Option<(f64, f64)>) -> LocationRow {
    LocationRow {
        name: name.to_string(),
        lat: coords.map(|c| c.0),
        lon: coords.map(|c| c.1),
        ..LocationRow::default()
    }
}

fn rows() -> Vec<LocationRow> {
    let mut partial = row("AWO Kreuzberg", Some((52.4986, 13.4033)));
    partial.city = "Berlin".into();
    let mut complete = row("AWO Bremen", Some((53.0793, 8.8017)));
    complete.street = "Auf den Häfen".into();
    complete.postcode = "28203".into();
    complete.city = "Bremen".into();
    vec![
        row("AWO Eberswalde", Some((52.8333, 13.8167))),
        partial,
        row("AWO ohne Position", None),
        complete,
        row("AWO auf See", Some((54.5, 7.5))),
    ]
}

fn book() -> AddressBook {
    let mut known = HashMap::new();
    known.insert(
        coord_key(52.8333, 13.8167),
        Address { postcode: "16225".into(), city: "Eberswalde".into(), street: "Marktplatz".into(), housenumber: "1".into() },
    );
    known.insert(
        coord_key(52.4986, 13.4033),
        Address { postcode: "10961".into(), city: "Kreuzberg".into(), street: "Blücherstraße".into(), housenumber: "62".into() },
    );
    AddressBook { known, calls: Vec::new() }
}

#[test]
fn fills_blanks_and_skips_rows_without_position_or_gaps() {
    let dir = TempDir::new().unwrap();
    let mut cache = DiskCache::load(dir.path().join(REVERSE_CACHE_FILE));
    let mut geocoder = book();
    let mut rows = rows();

    let stats = fill_missing_addresses(&mut rows, &mut geocoder, &mut cache, ResolveOptions::default(), &mut NullProgress);

    assert_eq!(
        geocoder.calls,
        vec!["52.833300,13.816700", "52.498600,13.403300", "54.500000,7.500000"]
    );
    assert_eq!((stats.provider_calls, stats.found, stats.absent), (3, 2, 1));

    assert_eq!(rows[0].street, "Marktplatz");
    assert_eq!(rows[0].housenumber, "1");
    assert_eq!(rows[0].postcode, "16225");
    assert_eq!(rows[0].city, "Eberswalde");

    // existing value kept, gaps filled
    assert_eq!(rows[1].city, "Berlin");
    assert_eq!(rows[1].street, "Blücherstraße");
    assert_eq!(rows[1].postcode, "10961");

    assert_eq!(rows[2], row("AWO ohne Position", None));
    assert_eq!(rows[3].street, "Auf den Häfen");
    assert!(rows[3].housenumber.is_empty());
    assert!(rows[4].street.is_empty() && rows[4].city.is_empty());
}

#[test]
fn second_run_is_served_from_the_saved_cache() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(REVERSE_CACHE_FILE);

    let mut cache = DiskCache::load(&path);
    let mut first = rows();
    fill_missing_addresses(&mut first, &mut book(), &mut cache, ResolveOptions::default(), &mut NullProgress);
    cache.save().unwrap();

    let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["54.500000,7.500000"], Value::Null);
    assert_eq!(saved["52.833300,13.816700"]["city"], "Eberswalde");

    let mut cache = DiskCache::load(&path);
    let mut empty_book = AddressBook { known: HashMap::new(), calls: Vec::new() };
    let mut second = rows();
    let stats = fill_missing_addresses(&mut second, &mut empty_book, &mut cache, ResolveOptions::default(), &mut NullProgress);

    assert!(empty_book.calls.is_empty());
    assert_eq!((stats.cache_hits, stats.provider_calls), (3, 0));
    assert_eq!(second, first);
}

#[test]
fn runner_queries_reverse_endpoint_and_writes_its_cache() {
    let server = StubServer::start(|_, _| {
        Reply::json(
            200,
            json!({"address": {"road": "Marktplatz", "house_number": "1", "postcode": "16225", "town": "Eberswalde"}})
                .to_string(),
        )
    });
    let dir = TempDir::new().unwrap();
    let mut opts = AppOptions::default();
    opts.store_dir = dir.path().to_path_buf();
    opts.reverse.base_url = server.url("/reverse");
    opts.reverse.rate_limit = 0.0;
    opts.client.max_attempts = 1;

    let mut rows = vec![row("AWO Eberswalde", Some((52.8333, 13.8167))), row("AWO ohne Position", None)];
    let stats = enrich_addresses(&opts, &mut rows, &mut NullProgress).unwrap();

    assert_eq!(stats.provider_calls, 1);
    assert_eq!(rows[0].city, "Eberswalde");
    assert_eq!(server.hits(), 1);
    let path = &server.requests()[0];
    assert!(path.starts_with("/reverse?"));
    assert!(path.contains("lat=52.8333"));
    assert!(path.contains("lon=13.8167"));
    assert!(path.contains("accept-language=de"));

    let saved: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(REVERSE_CACHE_FILE)).unwrap()).unwrap();
    assert_eq!(saved["52.833300,13.816700"]["street"], "Marktplatz");
}

// src/config/consts.rs

// Providers
pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const USER_AGENT: &str = concat!("awo_locate/", env!("CARGO_PKG_VERSION"), " (AWO branch research)");

// Net
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const RATE_LIMIT_PER_SEC: f64 = 1.0; // Nominatim usage policy
pub const REGION_RATE_LIMIT_PER_SEC: f64 = 0.1; // one area query per 10 s
pub const MAX_ATTEMPTS: u32 = 3;
pub const BACKOFF_BASE_MS: u64 = 1_000;
pub const BACKOFF_MAX_MS: u64 = 30_000;

// Queries
pub const COUNTRY_CODES: &str = "de";
pub const AWO_PATTERN: &str = "(AWO|Arbeiterwohlfahrt)";
pub const OVERPASS_AREA_TIMEOUT_SECS: u32 = 180;
/// south, west, north, east
pub const DEFAULT_BBOX: (f64, f64, f64, f64) = (50.0, 8.0, 52.0, 14.0);

/// Default region sweep: the sixteen federal states.
pub const BUNDESLAENDER: [&str; 16] = [
    "Baden-Württemberg",
    "Bayern",
    "Berlin",
    "Brandenburg",
    "Bremen",
    "Hamburg",
    "Hessen",
    "Mecklenburg-Vorpommern",
    "Niedersachsen",
    "Nordrhein-Westfalen",
    "Rheinland-Pfalz",
    "Saarland",
    "Sachsen",
    "Sachsen-Anhalt",
    "Schleswig-Holstein",
    "Thüringen",
];

// Local cache
pub const STORE_DIR: &str = ".store";
pub const LOG_FILE: &str = "debug.log";
pub const NOMINATIM_CACHE_FILE: &str = "cache_results.json";
pub const OVERPASS_CACHE_FILE: &str = "cache_results_overpass.json";
pub const REGIONS_CACHE_FILE: &str = "cache_regions_overpass.json";
pub const REVERSE_CACHE_FILE: &str = "cache_reverse.json";

// Crawl
pub const CRAWL_USER_AGENT: &str = "AWO-Research-Bot/1.0 (Research project; contact@awo.org)";
pub const CRAWL_TIMEOUT_SECS: u64 = 10;
pub const CRAWL_DELAY_MIN_SECS: f64 = 1.0;
pub const CRAWL_DELAY_MAX_SECS: f64 = 3.0;
pub const CRAWL_WORKERS: usize = 4;
pub const RAW_HTML_DIR: &str = "raw_html_text";

// Export
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DEFAULT_FILE: &str = "awo_locations";

// src/config/options.rs
//
// Typed option groups. Every group has a `Default` built from `consts`, and
// the whole tree can be read from a TOML file where any key may be omitted.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::consts::*;
use crate::core::retry::RetryPolicy;
use crate::error::{Error, Result};
use crate::provider::overpass::BoundingBox;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppOptions {
    /// Cache files and the debug log live here.
    pub store_dir: PathBuf,
    pub client: ClientOptions,
    pub nominatim: NominatimOptions,
    pub overpass: OverpassOptions,
    pub reverse: ReverseOptions,
    pub crawl: CrawlOptions,
    pub resolve: ResolveOptions,
    pub export: ExportOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(STORE_DIR),
            client: ClientOptions::default(),
            nominatim: NominatimOptions::default(),
            overpass: OverpassOptions::default(),
            reverse: ReverseOptions::default(),
            crawl: CrawlOptions::default(),
            resolve: ResolveOptions::default(),
            export: ExportOptions::default(),
        }
    }
}

impl AppOptions {
    /// Read options from a TOML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        toml::from_str(&text).map_err(|source| Error::Toml { path: path.to_path_buf(), source })
    }

    pub fn cache_path(&self, file_name: &str) -> PathBuf {
        self.store_dir.join(file_name)
    }

    pub fn log_path(&self) -> PathBuf {
        self.store_dir.join(LOG_FILE)
    }
}

/// Settings shared by the provider clients (search and area queries).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Requests per second; `<= 0` disables the throttle.
    pub rate_limit: f64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: s!(USER_AGENT),
            timeout_secs: REQUEST_TIMEOUT_SECS,
            rate_limit: RATE_LIMIT_PER_SEC,
            max_attempts: MAX_ATTEMPTS,
            backoff_base_ms: BACKOFF_BASE_MS,
            backoff_max_ms: BACKOFF_MAX_MS,
        }
    }
}

impl ClientOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_millis(self.backoff_max_ms),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NominatimOptions {
    pub base_url: String,
    pub countrycodes: String,
    pub limit: u32,
    pub address_details: bool,
}

impl Default for NominatimOptions {
    fn default() -> Self {
        Self {
            base_url: s!(NOMINATIM_SEARCH_URL),
            countrycodes: s!(COUNTRY_CODES),
            limit: 1,
            address_details: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverpassOptions {
    pub base_url: String,
    /// Box for plain name lookups.
    pub bbox: BoundingBox,
    /// Case-insensitive regex matched against name/operator/brand in area sweeps.
    pub pattern: String,
    pub area_timeout_secs: u32,
    /// Area sweeps are heavy; they get their own, slower rate.
    pub region_rate_limit: f64,
}

impl Default for OverpassOptions {
    fn default() -> Self {
        let (south, west, north, east) = DEFAULT_BBOX;
        Self {
            base_url: s!(OVERPASS_URL),
            bbox: BoundingBox { south, west, north, east },
            pattern: s!(AWO_PATTERN),
            area_timeout_secs: OVERPASS_AREA_TIMEOUT_SECS,
            region_rate_limit: REGION_RATE_LIMIT_PER_SEC,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverseOptions {
    pub base_url: String,
    pub language: String,
    pub rate_limit: f64,
}

impl Default for ReverseOptions {
    fn default() -> Self {
        Self {
            base_url: s!(NOMINATIM_REVERSE_URL),
            language: s!("de"),
            rate_limit: RATE_LIMIT_PER_SEC,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlOptions {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub delay_min_secs: f64,
    pub delay_max_secs: f64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub workers: usize,
    pub keep_html: bool,
    pub check_robots: bool,
    pub out_dir: PathBuf,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            user_agent: s!(CRAWL_USER_AGENT),
            timeout_secs: CRAWL_TIMEOUT_SECS,
            delay_min_secs: CRAWL_DELAY_MIN_SECS,
            delay_max_secs: CRAWL_DELAY_MAX_SECS,
            max_attempts: MAX_ATTEMPTS,
            backoff_base_ms: BACKOFF_BASE_MS,
            workers: CRAWL_WORKERS,
            keep_html: false,
            check_robots: false,
            out_dir: PathBuf::from(RAW_HTML_DIR),
        }
    }
}

impl CrawlOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_millis(BACKOFF_MAX_MS),
        }
    }

    /// Minimum spacing between any two page requests of the pool.
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs_f64(self.delay_min_secs.max(0.0))
    }

    /// Extra random delay on top of `min_interval`, in seconds.
    pub fn jitter_secs(&self) -> f64 {
        (self.delay_max_secs - self.delay_min_secs).max(0.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Treat cached explicit nulls as misses and ask the provider again.
    pub requery_absent: bool,
    /// Fill empty address columns via reverse geocoding.
    pub reverse_geocode: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ProviderKind {
    Nominatim,
    Overpass,
}

impl ProviderKind {
    pub fn cache_file(&self) -> &'static str {
        match self {
            ProviderKind::Nominatim => NOMINATIM_CACHE_FILE,
            ProviderKind::Overpass => OVERPASS_CACHE_FILE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ExportFormat {
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn ext(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }

    /// Field separator; `None` for JSON.
    pub fn delim(&self) -> Option<char> {
        match self {
            ExportFormat::Csv => Some(','),
            ExportFormat::Tsv => Some('\t'),
            ExportFormat::Json => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    out_path: OutputPath,
    pub include_headers: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            out_path: OutputPath::default(),
            include_headers: true,
        }
    }
}

impl ExportOptions {
    /// `<dir>/<stem>.<ext>`; the extension follows the format unless the user typed one.
    pub fn out_path(&self) -> PathBuf {
        let ext = self.out_path.ext.as_deref().unwrap_or(self.format.ext());
        self.out_path.dir.join(format!("{}.{}", self.out_path.file_stem, ext))
    }

    /// Parse user text into dir + stem (+ explicit extension, if any).
    /// A trailing separator or an existing directory keeps the default stem.
    pub fn set_path(&mut self, text: &str) {
        let s = text.trim();
        if s.is_empty() {
            return;
        }
        let p = Path::new(s);
        if crate::file::looks_like_dir_hint(p) || p.is_dir() {
            self.out_path.dir = p.to_path_buf();
            return;
        }
        self.out_path.dir = p.parent().map(Path::to_path_buf).unwrap_or_default();
        if let Some(stem) = p.file_stem() {
            self.out_path.file_stem = stem.to_string_lossy().into_owned();
        }
        self.out_path.ext = p.extension().map(|e| e.to_string_lossy().into_owned());
    }

    /// Same directory as the main export, different stem, format extension.
    pub fn sibling_path(&self, stem: &str, ext: &str) -> PathBuf {
        self.out_path.dir.join(format!("{stem}.{ext}"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPath {
    dir: PathBuf,
    file_stem: String, // without extension
    ext: Option<String>,
}

impl Default for OutputPath {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUT_DIR),
            file_stem: s!(DEFAULT_FILE),
            ext: None,
        }
    }
}

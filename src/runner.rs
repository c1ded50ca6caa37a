// src/runner.rs
//
// One function per batch job. Each builds its clients from `AppOptions`,
// runs the pipeline, writes its outputs and says what it wrote.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::consts::{BUNDESLAENDER, REGIONS_CACHE_FILE, REVERSE_CACHE_FILE};
use crate::config::options::{AppOptions, ExportFormat, ProviderKind};
use crate::config::sites::SiteConfig;
use crate::core::RateLimitedClient;
use crate::crawl::{self, CrawlReport, PageFetcher};
use crate::error::Result;
use crate::file::{export_table, write_json};
use crate::geocode::{ReverseGeocoder, fill_missing_addresses};
use crate::progress::Progress;
use crate::provider::{Nominatim, Overpass, Provider};
use crate::records::{self, LocationRow, ResolutionRecord};
use crate::resolver::{Resolution, ResolveStats, run_pipeline};
use crate::store::DiskCache;

/// Summary of what was produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub files_written: Vec<PathBuf>,
    pub stats: ResolveStats,
    /// Present when reverse geocoding ran.
    pub reverse: Option<ResolveStats>,
    pub rows: usize,
    pub failed: usize,
}

/// Look up entity names with one provider and export the hits.
pub fn resolve_entities(
    opts: &AppOptions,
    kind: ProviderKind,
    entities: &[String],
    progress: &mut dyn Progress,
) -> Result<RunSummary> {
    let client = RateLimitedClient::from_options(&opts.client)?;
    let cache_path = opts.cache_path(kind.cache_file());
    progress.log(&format!("Resolving {} names via {kind:?}…", entities.len()));

    match kind {
        ProviderKind::Nominatim => {
            let mut provider = Nominatim::new(client, opts.nominatim.clone());
            let (resolutions, stats) = run_pipeline(&mut provider, &cache_path, entities, opts.resolve, progress)?;
            let rows = entities
                .iter()
                .zip(&resolutions)
                .filter_map(|(q, r)| r.value().map(|place| LocationRow::from_place(q, place)))
                .collect();
            finish(opts, entities, &resolutions, rows, stats, progress)
        }
        ProviderKind::Overpass => {
            let mut provider = Overpass::name_search(client, &opts.overpass);
            let (resolutions, stats) = run_pipeline(&mut provider, &cache_path, entities, opts.resolve, progress)?;
            let rows = entities
                .iter()
                .zip(&resolutions)
                .filter_map(|(q, r)| r.value().map(|fc| LocationRow::from_features(q, fc)))
                .flatten()
                .collect();
            finish(opts, entities, &resolutions, rows, stats, progress)
        }
    }
}

/// Organisation sweep over administrative areas (all 16 states by default).
pub fn collect_regions(opts: &AppOptions, regions: &[String], progress: &mut dyn Progress) -> Result<RunSummary> {
    let regions: Vec<String> = if regions.is_empty() {
        BUNDESLAENDER.iter().map(|r| s!(*r)).collect()
    } else {
        regions.to_vec()
    };

    let client = RateLimitedClient::with_rate(&opts.client, opts.overpass.region_rate_limit)?;
    let mut provider = Overpass::area_sweep(client, &opts.overpass);
    progress.log(&format!("Sweeping {} regions for {}…", regions.len(), opts.overpass.pattern));

    let cache_path = opts.cache_path(REGIONS_CACHE_FILE);
    let (resolutions, stats) = run_pipeline(&mut provider, &cache_path, &regions, opts.resolve, progress)?;

    let rows: Vec<LocationRow> = regions
        .iter()
        .zip(&resolutions)
        .filter_map(|(region, r)| r.value().map(|fc| LocationRow::from_features(region, fc)))
        .flatten()
        .collect();
    finish(opts, &regions, &resolutions, rows, stats, progress)
}

/// Shared tail of the lookup jobs: optional address fill, export, raw results.
fn finish<V: Serialize>(
    opts: &AppOptions,
    queries: &[String],
    resolutions: &[Resolution<V>],
    mut rows: Vec<LocationRow>,
    stats: ResolveStats,
    progress: &mut dyn Progress,
) -> Result<RunSummary> {
    let reverse = if opts.resolve.reverse_geocode {
        Some(enrich_addresses(opts, &mut rows, progress)?)
    } else {
        None
    };

    let mut written = Vec::new();
    written.push(export_rows(opts, &rows)?);

    let records: Vec<ResolutionRecord<'_, V>> = queries
        .iter()
        .zip(resolutions)
        .map(|(q, r)| ResolutionRecord::new(q, r))
        .collect();
    let raw = raw_results_path(opts);
    write_json(&raw, &records)?;
    written.push(raw);

    logf!("wrote {} rows to {}", rows.len(), written[0].display());
    Ok(RunSummary {
        files_written: written,
        stats,
        reverse,
        rows: rows.len(),
        failed: resolutions.iter().filter(|r| r.is_failed()).count(),
    })
}

/// Fill address gaps by reverse geocoding, with its own cache and pace.
pub fn enrich_addresses(
    opts: &AppOptions,
    rows: &mut [LocationRow],
    progress: &mut dyn Progress,
) -> Result<ResolveStats> {
    let client = RateLimitedClient::with_rate(&opts.client, opts.reverse.rate_limit)?;
    let mut geocoder = ReverseGeocoder::new(client, opts.reverse.clone());
    let mut cache = DiskCache::load(opts.cache_path(REVERSE_CACHE_FILE));
    progress.log("Reverse geocoding rows without an address…");
    let stats = fill_missing_addresses(rows, &mut geocoder, &mut cache, opts.resolve, progress);
    cache.save()?;
    logd!("{}: {} reverse lookups", geocoder.name(), geocoder.calls());
    Ok(stats)
}

/// Rows in the configured format. JSON keeps numbers and nulls typed.
pub fn export_rows(opts: &AppOptions, rows: &[LocationRow]) -> Result<PathBuf> {
    let cells: Vec<Vec<String>> = rows.iter().map(LocationRow::to_cells).collect();
    export_table(&opts.export, &records::headers(), &cells, &rows)
}

/// `<stem>_results.json` next to the main export: one entry per query, in order.
fn raw_results_path(opts: &AppOptions) -> PathBuf {
    let main = opts.export.out_path();
    let stem = main.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    opts.export.sibling_path(&format!("{stem}_results"), ExportFormat::Json.ext())
}

/// Crawl every configured page, write the records and a one-row report.
pub fn crawl_sites(
    opts: &AppOptions,
    sites: &SiteConfig,
    report_path: Option<&Path>,
    progress: &mut dyn Progress,
) -> Result<RunSummary> {
    let targets = sites.targets();
    let fetcher = Arc::new(PageFetcher::from_options(&opts.crawl)?);
    progress.log(&format!("Crawling {} pages from {} sites…", targets.len(), sites.sites.len()));

    let records = crawl::crawl_pages(&targets, fetcher, opts.crawl.workers, opts.crawl.keep_html, progress);
    let results = crawl::write_results(&opts.crawl.out_dir, &records)?;

    let report = CrawlReport::from_records(&records);
    let report_path = report_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| opts.crawl.out_dir.join("scraping_report.csv"));
    report.write_csv(&report_path)?;
    logf!(
        "crawl: {}/{} pages fetched ({} skipped), report at {}",
        report.successful,
        report.total_pages,
        report.skipped,
        report_path.display()
    );

    Ok(RunSummary {
        files_written: vec![results, report_path],
        rows: records.len(),
        failed: report.failed,
        ..RunSummary::default()
    })
}

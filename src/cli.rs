// src/cli.rs
//
// Command line front-end. Options come from defaults, then `--config`,
// then flags.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use crate::config::consts::{NOMINATIM_CACHE_FILE, OVERPASS_CACHE_FILE, REGIONS_CACHE_FILE};
use crate::config::options::{AppOptions, ExportFormat, ProviderKind};
use crate::config::sites::SiteConfig;
use crate::error::{Error, Result};
use crate::file::read_entity_list;
use crate::progress::ConsoleProgress;
use crate::provider::overpass::BoundingBox;
use crate::runner::{self, RunSummary};
use crate::store::DiskCache;

/// Locate AWO branches through public geodata services and crawl their websites.
#[derive(Parser, Debug)]
#[command(name = "awo_locate", version)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Default)]
pub struct CommonArgs {
    /// TOML file with option overrides
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for cache files and the debug log
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Output file or directory (a trailing `/` means directory)
    #[arg(short = 'o', long, global = true)]
    pub out: Option<String>,

    #[arg(long, value_enum, global = true)]
    pub format: Option<ExportFormat>,

    /// Requests per second for this job; 0 disables throttling
    #[arg(long, global = true)]
    pub rate_limit: Option<f64>,

    /// Extra attempts after a transient failure
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Omit the header row in CSV/TSV output
    #[arg(long, global = true)]
    pub no_headers: bool,

    /// Log file (default: <store>/debug.log)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up branch names with a search provider
    Resolve {
        /// Names to look up
        names: Vec<String>,

        /// File with one name per line (or first column of a CSV/TSV)
        #[arg(long)]
        entities: Option<PathBuf>,

        #[arg(long, value_enum)]
        provider: Option<ProviderKind>,

        /// Box for Overpass name lookups: south,west,north,east
        #[arg(long)]
        bbox: Option<BoundingBox>,

        /// Ask again for names cached as "no match"
        #[arg(long)]
        requery_absent: bool,

        /// Fill missing address fields by reverse geocoding
        #[arg(long)]
        reverse_geocode: bool,
    },

    /// Sweep whole regions for AWO facilities (all federal states by default)
    Regions {
        regions: Vec<String>,

        #[arg(long)]
        regions_file: Option<PathBuf>,

        /// Name/operator/brand pattern (case-insensitive regex)
        #[arg(long)]
        pattern: Option<String>,

        #[arg(long)]
        requery_absent: bool,

        #[arg(long)]
        reverse_geocode: bool,
    },

    /// Fetch configured websites and extract contact details
    Crawl {
        /// TOML site table ([[site]] entries)
        #[arg(long)]
        sites: PathBuf,

        #[arg(long)]
        workers: Option<usize>,

        /// Keep raw HTML in the results file
        #[arg(long)]
        keep_html: bool,

        /// Skip hosts whose robots.txt disallows everything
        #[arg(long)]
        check_robots: bool,

        /// Where to write the one-row CSV report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show what the caches hold
    Cache,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let opts = build_options(&cli)?;

    let log_file = cli.common.log_file.clone().unwrap_or_else(|| opts.log_path());
    crate::log::init(Some(log_file.as_path()), cli.common.verbose)?;
    logd!("options: {opts:?}");

    let mut progress = ConsoleProgress::default();
    let summary = match &cli.command {
        Command::Resolve { names, entities, provider, .. } => {
            let names = collect_names(names, entities.as_deref())?;
            let kind = provider.unwrap_or(ProviderKind::Nominatim);
            runner::resolve_entities(&opts, kind, &names, &mut progress)?
        }
        Command::Regions { regions, regions_file, .. } => {
            let regions = match regions_file {
                Some(_) => collect_names(regions, regions_file.as_deref())?,
                None => regions.clone(),
            };
            runner::collect_regions(&opts, &regions, &mut progress)?
        }
        Command::Crawl { sites, report, .. } => {
            let sites = SiteConfig::load(sites)?;
            runner::crawl_sites(&opts, &sites, report.as_deref(), &mut progress)?
        }
        Command::Cache => {
            print_cache_stats(&opts);
            return Ok(());
        }
    };
    print_summary(&summary);
    Ok(())
}

/// Defaults, then the config file, then flags.
pub fn build_options(cli: &Cli) -> Result<AppOptions> {
    let mut opts = match &cli.common.config {
        Some(path) => AppOptions::load(path)?,
        None => AppOptions::default(),
    };
    let c = &cli.common;

    if let Some(store) = &c.store {
        opts.store_dir = store.clone();
    }
    if let Some(out) = &c.out {
        opts.export.set_path(out);
    }
    if let Some(format) = c.format {
        opts.export.format = format;
    }
    if c.no_headers {
        opts.export.include_headers = false;
    }
    if let Some(retries) = c.retries {
        opts.client.max_attempts = retries.saturating_add(1);
        opts.crawl.max_attempts = retries.saturating_add(1);
    }
    if let Some(timeout) = c.timeout {
        opts.client.timeout_secs = timeout;
        opts.crawl.timeout_secs = timeout;
    }

    match &cli.command {
        Command::Resolve { bbox, requery_absent, reverse_geocode, .. } => {
            if let Some(rate) = c.rate_limit {
                opts.client.rate_limit = rate;
            }
            if let Some(bbox) = bbox {
                opts.overpass.bbox = *bbox;
            }
            opts.resolve.requery_absent |= *requery_absent;
            opts.resolve.reverse_geocode |= *reverse_geocode;
        }
        Command::Regions { pattern, requery_absent, reverse_geocode, .. } => {
            if let Some(rate) = c.rate_limit {
                opts.overpass.region_rate_limit = rate;
            }
            if let Some(pattern) = pattern {
                opts.overpass.pattern = pattern.clone();
            }
            opts.resolve.requery_absent |= *requery_absent;
            opts.resolve.reverse_geocode |= *reverse_geocode;
        }
        Command::Crawl { workers, keep_html, check_robots, .. } => {
            if let Some(rate) = c.rate_limit {
                let min = if rate > 0.0 { 1.0 / rate } else { 0.0 };
                let spread = opts.crawl.jitter_secs();
                opts.crawl.delay_min_secs = min;
                opts.crawl.delay_max_secs = min + spread;
            }
            if let Some(workers) = workers {
                opts.crawl.workers = (*workers).max(1);
            }
            opts.crawl.keep_html |= *keep_html;
            opts.crawl.check_robots |= *check_robots;
        }
        Command::Cache => {}
    }
    Ok(opts)
}

fn collect_names(inline: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut names: Vec<String> = inline.iter().map(|n| n.trim().to_string()).filter(|n| !n.is_empty()).collect();
    if let Some(path) = file {
        names.extend(read_entity_list(path)?);
    }
    if names.is_empty() {
        return Err(Error::config("no names given (pass them as arguments or via a file)"));
    }
    Ok(names)
}

fn print_summary(summary: &RunSummary) {
    let s = &summary.stats;
    if s.cache_hits + s.provider_calls > 0 {
        println!(
            "{} rows | {} cache hits, {} requests | found {}, no match {}, failed {}",
            summary.rows, s.cache_hits, s.provider_calls, s.found, s.absent, s.failed
        );
    } else {
        println!("{} records, {} failed", summary.rows, summary.failed);
    }
    if let Some(r) = &summary.reverse {
        println!("reverse geocoding: {} cache hits, {} requests, {} filled", r.cache_hits, r.provider_calls, r.found);
    }
    for path in &summary.files_written {
        println!("wrote {}", path.display());
    }
}

fn print_cache_stats(opts: &AppOptions) {
    let files = [
        NOMINATIM_CACHE_FILE,
        OVERPASS_CACHE_FILE,
        REGIONS_CACHE_FILE,
        crate::config::consts::REVERSE_CACHE_FILE,
    ];
    for name in files {
        let path = opts.cache_path(name);
        if !path.exists() {
            println!("{:<32} (none)", name);
            continue;
        }
        let cache: DiskCache<Value> = DiskCache::load(&path);
        let (found, absent) = cache.counts();
        println!("{:<32} {:>6} entries ({found} found, {absent} no match)", name, cache.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "awo_locate", "--retries", "0", "--format", "tsv", "resolve", "AWO Berlin",
            "--provider", "overpass", "--bbox", "52.3,13.0,52.7,13.8", "--requery-absent",
        ]);
        let opts = build_options(&cli).unwrap();
        assert_eq!(opts.client.max_attempts, 1);
        assert_eq!(opts.export.format, ExportFormat::Tsv);
        assert_eq!(opts.overpass.bbox.north, 52.7);
        assert!(opts.resolve.requery_absent);
        assert!(!opts.resolve.reverse_geocode);
    }

    #[test]
    fn huge_retry_count_saturates() {
        let cli = Cli::parse_from(["awo_locate", "--retries", "4294967295", "cache"]);
        let opts = build_options(&cli).unwrap();
        assert_eq!(opts.client.max_attempts, u32::MAX);
        assert_eq!(opts.crawl.max_attempts, u32::MAX);
    }

    #[test]
    fn crawl_rate_keeps_the_jitter_spread() {
        let cli = Cli::parse_from(["awo_locate", "crawl", "--sites", "sites.toml", "--rate-limit", "0.5"]);
        let opts = build_options(&cli).unwrap();
        assert_eq!(opts.crawl.delay_min_secs, 2.0);
        assert_eq!(opts.crawl.delay_max_secs, 4.0);
    }

    #[test]
    fn names_from_args_must_not_be_empty() {
        assert!(collect_names(&[s!("  ")], None).is_err());
        assert_eq!(collect_names(&[s!(" AWO Kiel ")], None).unwrap(), vec!["AWO Kiel"]);
    }
}

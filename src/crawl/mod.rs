// src/crawl/mod.rs
//
// Organisation websites: fetch every configured page with a small worker
// pool, extract contact details, keep results in input order.

pub mod extract;
pub mod fetch;
pub mod report;

use std::path::{Path, PathBuf};
use std::sync::{
    Arc, mpsc,
    atomic::{AtomicUsize, Ordering},
};
use std::thread;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::sites::{Capability, PageTarget};
use crate::core::html::page_text;
use crate::error::{Failure, FailureKind, Result};
use crate::file::write_json;
use crate::progress::Progress;

pub use extract::PageData;
pub use fetch::PageFetcher;
pub use report::{CrawlReport, quality_score};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub region: String,
    pub url: String,
    pub capability: Capability,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,
    /// Bytes of HTML received.
    pub content_length: usize,
    #[serde(default)]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PageData>,
    #[serde(default)]
    pub quality: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl PageRecord {
    fn failed(target: &PageTarget, error: Failure) -> Self {
        Self {
            region: target.region.clone(),
            url: target.url.clone(),
            capability: target.capability,
            success: false,
            timestamp: Utc::now(),
            error: Some(error),
            content_length: 0,
            text: String::new(),
            data: None,
            quality: 0.0,
            html: None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(&self.error, Some(f) if f.kind == FailureKind::Blocked)
    }
}

/// Fetch and extract one page. Never fails; failures are recorded.
pub fn crawl_one(target: &PageTarget, fetcher: &PageFetcher, keep_html: bool) -> PageRecord {
    if fetcher.checks_robots() && !fetcher.robots_allows(&target.url) {
        return PageRecord::failed(target, Failure::blocked(&target.url));
    }

    let html = match fetcher.fetch(&target.url) {
        Ok(html) => html,
        Err(e) => return PageRecord::failed(target, Failure::from(&e)),
    };

    let scoped = extract::scoped(&html, target.page_attribute.as_deref());
    let text = page_text(scoped);
    let mut data = extract::extract_parts(scoped, &text, &target.url);
    if target.capability == Capability::Links {
        data.links = extract::extract_links(scoped, &target.url);
    }

    let mut record = PageRecord {
        region: target.region.clone(),
        url: target.url.clone(),
        capability: target.capability,
        success: true,
        timestamp: Utc::now(),
        error: None,
        content_length: html.len(),
        text,
        data: Some(data),
        quality: 0.0,
        html: None,
    };
    record.quality = quality_score(&record);
    if keep_html {
        record.html = Some(html);
    }
    record
}

/// Crawl `targets` with up to `workers` threads. Requests from all workers
/// pass the fetcher's shared gate. One record per target, in input order.
pub fn crawl_pages(
    targets: &[PageTarget],
    fetcher: Arc<PageFetcher>,
    workers: usize,
    keep_html: bool,
    progress: &mut dyn Progress,
) -> Vec<PageRecord> {
    progress.begin(targets.len());
    if targets.is_empty() {
        progress.finish();
        return Vec::new();
    }

    let shared = Arc::new(targets.to_vec());
    let counter = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel::<(usize, PageRecord)>();

    let workers = workers.clamp(1, targets.len());
    logd!("crawling {} pages with {workers} workers", targets.len());

    for _ in 0..workers {
        let targets = Arc::clone(&shared);
        let idx = Arc::clone(&counter);
        let fetcher = Arc::clone(&fetcher);
        let tx = tx.clone();

        thread::spawn(move || {
            loop {
                let i = idx.fetch_add(1, Ordering::Relaxed);
                if i >= targets.len() {
                    break;
                }
                let record = crawl_one(&targets[i], &fetcher, keep_html);
                if tx.send((i, record)).is_err() {
                    break;
                }
            }
        });
    }
    drop(tx); // receiver ends once every worker is done

    let mut slots: Vec<Option<PageRecord>> = vec![None; targets.len()];
    for (i, record) in rx.iter() {
        match &record.error {
            None => progress.item_done(&record.url),
            Some(f) => progress.item_failed(&record.url, &f.message),
        }
        slots[i] = Some(record);
    }
    progress.finish();

    slots
        .into_iter()
        .zip(targets)
        .map(|(slot, target)| {
            slot.unwrap_or_else(|| {
                loge!("no result for {}; worker stopped early", target.url);
                PageRecord::failed(
                    target,
                    Failure { kind: FailureKind::Network, message: s!("worker stopped before finishing") },
                )
            })
        })
        .collect()
}

/// `<dir>/results_html_text_<YYYYmmdd_HHMMSS>.json`
pub fn results_path(dir: &Path, at: DateTime<chrono::Local>) -> PathBuf {
    dir.join(format!("results_html_text_{}.json", at.format("%Y%m%d_%H%M%S")))
}

pub fn write_results(dir: &Path, records: &[PageRecord]) -> Result<PathBuf> {
    let path = results_path(dir, chrono::Local::now());
    write_json(&path, records)?;
    logf!("saved {} page records to {}", records.len(), path.display());
    Ok(path)
}

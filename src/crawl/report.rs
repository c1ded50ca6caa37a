// src/crawl/report.rs
//
// Run summary for a crawl, written as a one-row CSV next to the results.

use std::path::Path;

use serde::Serialize;

use super::PageRecord;
use crate::csv::to_table_string;
use crate::error::Result;
use crate::file::write_atomic;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CrawlReport {
    pub total_pages: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    /// successful / total, 0.0 for an empty crawl
    pub success_rate: f64,
    pub pages_with_email: usize,
    pub pages_with_phone: usize,
}

impl CrawlReport {
    pub fn from_records(records: &[PageRecord]) -> Self {
        let mut r = CrawlReport { total_pages: records.len(), ..Self::default() };
        for rec in records {
            if rec.success {
                r.successful += 1;
            } else if rec.is_skipped() {
                r.skipped += 1;
            } else {
                r.failed += 1;
            }
            if let Some(data) = &rec.data {
                r.pages_with_email += usize::from(!data.emails.is_empty());
                r.pages_with_phone += usize::from(!data.phones.is_empty());
            }
        }
        if r.total_pages > 0 {
            r.success_rate = r.successful as f64 / r.total_pages as f64;
        }
        r
    }

    pub fn headers() -> Vec<String> {
        cells![
            "total_pages", "successful", "failed", "skipped", "success_rate",
            "pages_with_email", "pages_with_phone",
        ]
    }

    pub fn to_cells(&self) -> Vec<String> {
        cells![
            self.total_pages,
            self.successful,
            self.failed,
            self.skipped,
            format!("{:.1}%", self.success_rate * 100.0),
            self.pages_with_email,
            self.pages_with_phone,
        ]
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let table = to_table_string(Some(Self::headers().as_slice()), &[self.to_cells()], ',');
        write_atomic(path, table.as_bytes())
    }
}

/// Share of {email, phone, social link, non-empty body} present, 0.0..=1.0.
pub fn quality_score(record: &PageRecord) -> f64 {
    let Some(data) = &record.data else {
        return 0.0;
    };
    let checks = [
        !data.emails.is_empty(),
        !data.phones.is_empty(),
        !data.social_links.is_empty(),
        record.content_length > 0,
    ];
    checks.iter().filter(|c| **c).count() as f64 / checks.len() as f64
}

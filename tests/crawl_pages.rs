// tests/crawl_pages.rs
mod common;

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use awo_locate::config::sites::{Capability, SiteConfig};
use awo_locate::core::{SharedThrottle, Throttle, net::HttpClient, retry::RetryPolicy};
use awo_locate::crawl::{self, CrawlReport, PageFetcher, PageRecord};
use awo_locate::error::FailureKind;
use awo_locate::progress::NullProgress;
use common::{Reply, StubServer};

const KITA: &str = r#"<html><body><h3>Kita Sonnenschein</h3>
    <p>E-Mail: kita-sonnenschein@awo-example.de | Telefon 0421 7654321</p>
    <a href="/kontakt/impressum.html">Impressum</a></body></html>"#;

const OVERVIEW: &str = r#"<html><body><ul>
    <li><a href="/ov/nord/">Ortsverein Nord</a></li>
    <li><a href="https://other.example/ov/sued">Ortsverein Süd</a></li></ul></body></html>"#;

fn fetcher() -> PageFetcher {
    let http = HttpClient::new("awo-test", Duration::from_secs(5)).unwrap();
    PageFetcher::new(http, SharedThrottle::new(Throttle::per_second(0.0)), 0.0, RetryPolicy::none())
}

fn sites(server: &StubServer) -> SiteConfig {
    let toml = format!(
        r#"
        [[site]]
        region = "Bremen"
        target_urls = ["{overview}"]
        page_with_links = true

        [[site]]
        region = "Bremen - contacts"
        target_urls = ["{kita}", "{missing}", "{kita2}"]
        page_with_contacts = true
        "#,
        overview = server.url("/overview"),
        kita = server.url("/kita"),
        missing = server.url("/missing"),
        kita2 = server.url("/kita?copy=2"),
    );
    toml::from_str(&toml).unwrap()
}

fn serve() -> StubServer {
    StubServer::start(|path, _| match path {
        "/overview" => Reply::html(200, OVERVIEW),
        p if p.starts_with("/kita") => Reply::html(200, KITA),
        "/robots.txt" => Reply::html(404, ""),
        _ => Reply::html(404, "not here"),
    })
}

#[test]
fn records_come_back_in_target_order() {
    let server = serve();
    let targets = sites(&server).targets();
    let records = crawl::crawl_pages(&targets, Arc::new(fetcher()), 3, false, &mut NullProgress);

    let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
    let expected: Vec<&str> = targets.iter().map(|t| t.url.as_str()).collect();
    assert_eq!(urls, expected);
    assert_eq!(records[0].capability, Capability::Links);
    assert_eq!(records[1].region, "Bremen - contacts");
}

#[test]
fn extraction_and_failures_are_recorded() {
    let server = serve();
    let targets = sites(&server).targets();
    let records = crawl::crawl_pages(&targets, Arc::new(fetcher()), 2, true, &mut NullProgress);

    let overview = records[0].data.as_ref().unwrap();
    assert_eq!(overview.links, vec![server.url("/ov/nord/"), "https://other.example/ov/sued".to_string()]);

    let kita = &records[1];
    assert!(kita.success);
    assert_eq!(kita.content_length, KITA.len());
    assert_eq!(kita.html.as_deref(), Some(KITA));
    let data = kita.data.as_ref().unwrap();
    assert_eq!(data.emails, vec!["kita-sonnenschein@awo-example.de"]);
    assert_eq!(data.phones, vec!["0421 7654321"]);
    assert_eq!(data.impressum_link, Some(server.url("/kontakt/impressum.html")));
    assert!(data.links.is_empty(), "contact pages do not collect links");
    assert_eq!(kita.quality, 0.75);

    let missing = &records[2];
    assert!(!missing.success);
    assert_eq!(missing.error.as_ref().unwrap().kind, FailureKind::Status);
    assert!(missing.data.is_none());
}

#[test]
fn robots_disallow_skips_every_page() {
    let server = StubServer::start(|path, _| match path {
        "/robots.txt" => Reply::html(200, "User-agent: *\nDisallow: /\n"),
        _ => Reply::html(200, KITA),
    });
    let targets = sites(&server).targets();
    let fetcher = fetcher().with_robots_check(true);
    let records = crawl::crawl_pages(&targets, Arc::new(fetcher), 2, false, &mut NullProgress);

    assert!(records.iter().all(PageRecord::is_skipped));
    // one robots.txt lookup per host, no page requests
    assert_eq!(server.requests(), vec!["/robots.txt"]);

    let report = CrawlReport::from_records(&records);
    assert_eq!(report.skipped, 4);
    assert_eq!(report.successful, 0);
}

#[test]
fn results_and_report_are_written() {
    let server = serve();
    let targets = sites(&server).targets();
    let records = crawl::crawl_pages(&targets, Arc::new(fetcher()), 2, false, &mut NullProgress);

    let dir = TempDir::new().unwrap();
    let path = crawl::write_results(dir.path(), &records).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("results_html_text_") && name.ends_with(".json"));
    let back: Vec<PageRecord> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(back.len(), 4);
    assert!(back[1].html.is_none());

    let report = CrawlReport::from_records(&records);
    assert_eq!((report.total_pages, report.successful, report.failed), (4, 3, 1));
    assert_eq!((report.pages_with_email, report.pages_with_phone), (2, 2));
    let csv = dir.path().join("report.csv");
    report.write_csv(&csv).unwrap();
    assert_eq!(
        fs::read_to_string(&csv).unwrap(),
        "total_pages,successful,failed,skipped,success_rate,pages_with_email,pages_with_phone\n4,3,1,0,75.0%,2,2\n"
    );
}

#[test]
fn shared_gate_spaces_requests_across_workers() {
    let server = StubServer::start(|_, _| Reply::html(200, KITA));
    let pages = 6;
    let urls: Vec<String> = (0..pages).map(|i| format!("\"{}\"", server.url(&format!("/kita/{i}")))).collect();
    let toml = format!(
        "[[site]]\nregion = \"Bremen\"\ntarget_urls = [{}]\npage_with_contacts = true\n",
        urls.join(", ")
    );
    let targets = toml::from_str::<SiteConfig>(&toml).unwrap().targets();
    assert_eq!(targets.len(), pages);

    let interval = Duration::from_millis(50);
    let http = HttpClient::new("awo-test", Duration::from_secs(5)).unwrap();
    let fetcher = PageFetcher::new(http, SharedThrottle::new(Throttle::with_interval(interval)), 0.0, RetryPolicy::none());

    let start = Instant::now();
    let records = crawl::crawl_pages(&targets, Arc::new(fetcher), 4, false, &mut NullProgress);
    let elapsed = start.elapsed();

    assert!(records.iter().all(|r| r.success));
    assert_eq!(server.hits(), pages);
    let min = interval * (pages as u32 - 1);
    assert!(elapsed >= min, "{elapsed:?} < {min:?}");
}

#[test]
fn slow_robots_file_does_not_hold_up_other_hosts() {
    let slow = StubServer::start(|path, _| {
        if path == "/robots.txt" {
            thread::sleep(Duration::from_millis(800));
        }
        Reply::html(200, "User-agent: *\nDisallow:\n")
    });
    let fast = StubServer::start(|_, _| Reply::html(200, "User-agent: *\nDisallow: /\n"));
    let fetcher = Arc::new(fetcher().with_robots_check(true));

    let slow_url = slow.url("/kita");
    let waiting = {
        let fetcher = Arc::clone(&fetcher);
        thread::spawn(move || fetcher.robots_allows(&slow_url))
    };
    // let the other thread start its lookup first
    thread::sleep(Duration::from_millis(100));

    let start = Instant::now();
    assert!(!fetcher.robots_allows(&fast.url("/kita")));
    assert!(start.elapsed() < Duration::from_millis(500), "waited {:?}", start.elapsed());

    assert!(waiting.join().unwrap());
    // answers are remembered per origin
    assert!(fetcher.robots_allows(&slow.url("/other")));
    assert_eq!(slow.requests(), vec!["/robots.txt"]);
    assert_eq!(fast.requests(), vec!["/robots.txt"]);
}

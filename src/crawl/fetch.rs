// src/crawl/fetch.rs
//
// Polite page fetching for the crawler pool: one shared gate for the whole
// pool, a random extra pause per request, bounded retries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use rand::Rng;
use url::Url;

use crate::config::options::CrawlOptions;
use crate::core::{SharedThrottle, Throttle, net::HttpClient, retry::RetryPolicy};
use crate::error::{FetchError, Result};

#[derive(Debug)]
pub struct PageFetcher {
    http: HttpClient,
    gate: SharedThrottle,
    jitter_secs: f64,
    retry: RetryPolicy,
    check_robots: bool,
    // origin -> allowed, filled once per origin
    robots: Mutex<HashMap<String, Arc<OnceLock<bool>>>>,
}

impl PageFetcher {
    pub fn new(http: HttpClient, gate: SharedThrottle, jitter_secs: f64, retry: RetryPolicy) -> Self {
        Self {
            http,
            gate,
            jitter_secs: jitter_secs.max(0.0),
            retry,
            check_robots: false,
            robots: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_options(opts: &CrawlOptions) -> Result<Self> {
        let http = HttpClient::new(&opts.user_agent, opts.timeout())?;
        let gate = SharedThrottle::new(Throttle::with_interval(opts.min_interval()));
        let mut fetcher = Self::new(http, gate, opts.jitter_secs(), opts.retry_policy());
        fetcher.check_robots = opts.check_robots;
        Ok(fetcher)
    }

    pub fn with_robots_check(mut self, on: bool) -> Self {
        self.check_robots = on;
        self
    }

    pub fn checks_robots(&self) -> bool {
        self.check_robots
    }

    fn pause(&self) {
        self.gate.wait();
        if self.jitter_secs > 0.0 {
            let extra = rand::thread_rng().gen_range(0.0..=self.jitter_secs);
            thread::sleep(Duration::from_secs_f64(extra));
        }
    }

    /// Page body as text. Every attempt waits its turn at the gate.
    pub fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        self.retry.run(url, |_| {
            self.pause();
            self.http.get_text(url, &[])
        })
    }

    /// False only when the host's robots.txt shuts out everything.
    /// Unreachable or missing robots files allow the crawl. One lookup per host.
    pub fn robots_allows(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return true;
        };
        if parsed.host_str().is_none() {
            return true;
        }
        // scheme://host[:port]
        let origin = parsed.origin().ascii_serialization();

        // the map lock covers only the slot lookup; workers asking about the
        // same origin wait on its cell, other origins go ahead
        let cell = {
            let mut known = self.robots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(known.entry(origin.clone()).or_default())
        };
        *cell.get_or_init(|| self.fetch_robots(&origin))
    }

    fn fetch_robots(&self, origin: &str) -> bool {
        self.pause();
        let allowed = match self.http.get_text(&format!("{origin}/robots.txt"), &[]) {
            Ok(body) => !blocks_everything(&body),
            Err(e) => {
                logd!("robots.txt for {origin}: {e}; assuming allowed");
                true
            }
        };
        if !allowed {
            logw!("{origin}: robots.txt disallows crawling");
        }
        allowed
    }
}

/// A `Disallow: /` rule anywhere in the file. User-agent groups are not
/// told apart.
pub fn blocks_everything(robots: &str) -> bool {
    robots.lines().any(|line| {
        let line = line.split('#').next().unwrap_or("");
        match line.split_once(':') {
            Some((key, value)) => key.trim().eq_ignore_ascii_case("disallow") && value.trim() == "/",
            None => false,
        }
    })
}

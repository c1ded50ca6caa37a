// src/core/client.rs
//
// The provider-facing client: throttle + retry around `HttpClient`.
// Each attempt (retries included) passes through the throttle.

use serde_json::Value;

use crate::config::options::ClientOptions;
use crate::core::{net::HttpClient, retry::RetryPolicy, throttle::Throttle};
use crate::error::{FetchError, Result};

#[derive(Debug)]
pub struct RateLimitedClient {
    http: HttpClient,
    throttle: Throttle,
    retry: RetryPolicy,
    calls: u64,
}

impl RateLimitedClient {
    pub fn new(http: HttpClient, throttle: Throttle, retry: RetryPolicy) -> Self {
        Self { http, throttle, retry, calls: 0 }
    }

    /// Build from client options, overriding the rate (area sweeps and reverse
    /// geocoding run at their own pace).
    pub fn with_rate(opts: &ClientOptions, rate_limit: f64) -> Result<Self> {
        let http = HttpClient::new(&opts.user_agent, opts.timeout())?;
        Ok(Self::new(http, Throttle::per_second(rate_limit), opts.retry_policy()))
    }

    pub fn from_options(opts: &ClientOptions) -> Result<Self> {
        Self::with_rate(opts, opts.rate_limit)
    }

    pub fn get_json(&mut self, url: &str, params: &[(&str, String)]) -> std::result::Result<Value, FetchError> {
        self.get_json_checked(url, params, |_| Ok(()))
    }

    /// Like `get_json`, but `check` may reject a 200 body; a transient
    /// rejection is retried like any other transient failure.
    pub fn get_json_checked<F>(
        &mut self,
        url: &str,
        params: &[(&str, String)],
        check: F,
    ) -> std::result::Result<Value, FetchError>
    where
        F: Fn(&Value) -> std::result::Result<(), FetchError>,
    {
        let retry = self.retry;
        retry.run(url, |attempt| {
            self.throttle.wait();
            self.calls += 1;
            logd!("GET {url} (attempt {})", attempt + 1);
            let body = self.http.get_json(url, params)?;
            check(&body)?;
            Ok(body)
        })
    }

    /// Outbound requests issued so far, retries included.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

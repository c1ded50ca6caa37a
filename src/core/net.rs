// src/core/net.rs
//
// Blocking HTTP GET on top of reqwest. Every failure comes back as a typed
// `FetchError`; nothing here sleeps or retries.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::error::{Error, FetchError, Result};

#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let inner = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(Error::Client)?;
        Ok(Self { inner })
    }

    /// GET `url` with query `params`; body as text on 2xx.
    pub fn get_text(&self, url: &str, params: &[(&str, String)]) -> std::result::Result<String, FetchError> {
        let resp = self
            .inner
            .get(url)
            .query(params)
            .send()
            .map_err(|e| classify(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), url: s!(url) });
        }
        resp.text().map_err(|e| classify(url, e))
    }

    /// GET and parse the body as JSON.
    pub fn get_json(&self, url: &str, params: &[(&str, String)]) -> std::result::Result<Value, FetchError> {
        let body = self.get_text(url, params)?;
        serde_json::from_str(&body).map_err(|e| FetchError::decode(url, e))
    }
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout { url: s!(url) }
    } else if let Some(status) = e.status() {
        FetchError::Status { status: status.as_u16(), url: s!(url) }
    } else if e.is_decode() {
        FetchError::decode(url, e)
    } else {
        FetchError::Transport { url: s!(url), source: e }
    }
}

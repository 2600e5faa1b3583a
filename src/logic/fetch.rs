// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Plain HTTP GET used to download key lists.

use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Status and body of a completed GET request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Source of remote key lists.
///
/// Non-success statuses are returned as responses, not errors, so callers can
/// tell "no such user" apart from an unreachable host.
pub trait Fetcher {
    fn get(&self, url: &Url) -> Result<FetchResponse>;
}

/// Blocking [`reqwest`] client with the library's default timeouts.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("lansync/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &Url) -> Result<FetchResponse> {
        let http_err = |source| Error::Http {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url.clone()).send().map_err(http_err)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(http_err)?;
        debug!(%url, status, bytes = body.len(), "fetched");

        Ok(FetchResponse { status, body })
    }
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Expand `--import` input into validated public keys.
//!
//! Responsibilities:
//! - Classify every input line (path, URL, GitHub user, literal key).
//! - Read or download the candidate lines behind each source.
//! - Validate candidates one by one, skipping the ones that fail.
//!
//! Resolution never fails as a whole: unreadable files, unreachable hosts,
//! unknown users, and malformed keys are logged and contribute no keys.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::logic::fetch::Fetcher;
use crate::models::{KeySource, PublicKey};

/// Where `<username>.keys` lists are served from.
pub const DEFAULT_GITHUB_URL: &str = "https://github.com";

/// Turns raw input into an ordered list of keys.
pub struct KeyResolver<'a, F: Fetcher + ?Sized> {
    fetcher: &'a F,
    github: Url,
}

impl<'a, F: Fetcher + ?Sized> KeyResolver<'a, F> {
    /// `github` is the base URL user key lists are resolved against.
    pub fn new(fetcher: &'a F, mut github: Url) -> Self {
        // Keep any path prefix when joining `<user>.keys` onto the base.
        if !github.path().ends_with('/') {
            let path = format!("{}/", github.path());
            github.set_path(&path);
        }
        Self { fetcher, github }
    }

    /// Resolve every line of `input`, preserving input order.
    ///
    /// Missing or empty input yields no keys.
    pub fn resolve(&self, input: Option<&str>) -> Vec<PublicKey> {
        let Some(input) = input else {
            return Vec::new();
        };

        let mut keys = Vec::new();
        for line in input.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let found = match KeySource::classify(line) {
                KeySource::FilePath(path) => self.keys_from_file(path),
                KeySource::WebUrl(url) => self.keys_from_url(url),
                KeySource::GitHubUser(username) => self.keys_from_github(username),
                KeySource::LiteralKey(text) => parse_key(text).into_iter().collect(),
            };
            keys.extend(found);
        }
        keys
    }

    /// URL of the public key list GitHub serves for `username`.
    pub fn github_keys_url(&self, username: &str) -> Result<Url> {
        let relative = format!("{username}.keys");
        self.github
            .join(&relative)
            .map_err(|source| Error::InvalidUrl {
                url: relative,
                source,
            })
    }

    fn keys_from_file(&self, path: &Path) -> Vec<PublicKey> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                debug!(path = %path.display(), "reading keys from file");
                parse_keys(&contents)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "couldn't read key file");
                Vec::new()
            }
        }
    }

    fn keys_from_url(&self, raw: &str) -> Vec<PublicKey> {
        let url = match parse_web_url(raw) {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "skipping key URL");
                return Vec::new();
            }
        };

        match self.fetcher.get(&url) {
            Ok(response) if response.is_success() => parse_keys(&response.body),
            Ok(response) => {
                warn!(%url, status = response.status, "key URL returned an error status");
                Vec::new()
            }
            Err(err) => {
                warn!(%url, error = %err, "couldn't download keys");
                Vec::new()
            }
        }
    }

    fn keys_from_github(&self, username: &str) -> Vec<PublicKey> {
        let url = match self.github_keys_url(username) {
            Ok(url) => url,
            Err(err) => {
                warn!(username, error = %err, "couldn't build GitHub keys URL");
                return Vec::new();
            }
        };

        match self.fetcher.get(&url) {
            Ok(response) if response.status == 200 => {
                debug!(username, "reading keys from GitHub");
                parse_keys(&response.body)
            }
            Ok(response) => {
                warn!(username, status = response.status, "GitHub user not found");
                Vec::new()
            }
            Err(err) => {
                warn!(username, error = %err, "couldn't download GitHub keys");
                Vec::new()
            }
        }
    }
}

/// Accept schemeless URLs such as `example.com/keys` by defaulting to https.
fn parse_web_url(raw: &str) -> Result<Url> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    Url::parse(&candidate).map_err(|source| Error::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

/// Validate each non-blank line independently. Lines from files and
/// downloads are only ever treated as literal keys.
fn parse_keys(text: &str) -> Vec<PublicKey> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_key)
        .collect()
}

fn parse_key(line: &str) -> Option<PublicKey> {
    match PublicKey::parse(line) {
        Ok(key) => Some(key),
        Err(err) => {
            warn!(error = %err, "skipping invalid key");
            None
        }
    }
}

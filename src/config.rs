// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Config file handling and resolution of effective settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;
use url::Url;

use crate::logic::resolver::DEFAULT_GITHUB_URL;
use crate::models::SharePolicy;
use crate::utils::expand_tilde;

const DEFAULT_PUBLIC_DIR: &str = "~/public/";
const DEFAULT_IMAGE_DIR: &str = "~/.lansync/";
const DEFAULT_IMAGE_NAME: &str = "share.img";
const DEFAULT_AUTHORIZED_KEYS: &str = "~/.ssh/authorized_keys";

/// On-disk configuration; every key is optional.
///
/// ```toml
/// public_dir = "~/public/"
/// image_dir = "~/.lansync/"
/// image_name = "share.img"
/// authorized_keys = "~/.ssh/authorized_keys"
/// github_url = "https://github.com"
/// ```
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub public_dir: Option<String>,
    pub image_dir: Option<String>,
    pub image_name: Option<String>,
    pub authorized_keys: Option<String>,
    pub github_url: Option<String>,
}

impl Config {
    /// Load `path`, or the default location when `path` is `None`.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// file that was asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", path))
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "lansync").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Values given on the command line; they win over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub public_dir: Option<PathBuf>,
    pub authorized_keys: Option<PathBuf>,
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory clients rsync into; the forced command points here.
    pub public_dir: PathBuf,
    /// Directory holding the share image.
    pub image_dir: PathBuf,
    pub image_name: String,
    pub authorized_keys: PathBuf,
    pub github_url: Url,
    /// Local account name, used for the mount options and the client hint.
    pub user: String,
}

impl Settings {
    /// Merge defaults, `config`, and `overrides`, expanding `~/` against `home`.
    pub fn resolve(config: Config, overrides: Overrides, home: &Path, user: String) -> Result<Self> {
        let path_or = |value: Option<String>, default: &str| {
            expand_tilde(value.as_deref().unwrap_or(default), home)
        };

        let public_dir = overrides
            .public_dir
            .unwrap_or_else(|| path_or(config.public_dir, DEFAULT_PUBLIC_DIR));
        let authorized_keys = overrides
            .authorized_keys
            .unwrap_or_else(|| path_or(config.authorized_keys, DEFAULT_AUTHORIZED_KEYS));
        let image_dir = path_or(config.image_dir, DEFAULT_IMAGE_DIR);
        let image_name = config
            .image_name
            .unwrap_or_else(|| DEFAULT_IMAGE_NAME.to_string());

        let github_raw = config
            .github_url
            .unwrap_or_else(|| DEFAULT_GITHUB_URL.to_string());
        let github_url = Url::parse(&github_raw)
            .with_context(|| format!("Invalid github_url {:?}", github_raw))?;

        Ok(Self {
            public_dir,
            image_dir,
            image_name,
            authorized_keys,
            github_url,
            user,
        })
    }

    pub fn image_path(&self) -> PathBuf {
        self.image_dir.join(&self.image_name)
    }

    /// Forced-command policy pointing at the configured public directory.
    pub fn policy(&self) -> SharePolicy {
        SharePolicy::new(&self.public_dir)
    }
}

/// The current user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .context("Could not determine home directory")
}

/// Login name of the invoking user, from the environment.
pub fn current_user() -> String {
    ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "user".to_string())
}

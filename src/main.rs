// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use lansync::config::{self, Config, Overrides, Settings};
use lansync::{app, output};

#[derive(Parser, Debug)]
#[command(name = "lansync")]
#[command(about = "Accept rsync uploads from trusted keys into a size-limited share")]
#[command(version)]
struct Cli {
    /// Public key to import: a key string, a file, a URL, or a GitHub username
    #[arg(short = 'i', long = "import", value_name = "KEY")]
    import: Option<String>,

    /// Directory clients are allowed to send files to [default: ~/public/]
    #[arg(long, value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Size limit of the shared directory, e.g. 512, 1024K, 10M, 2G
    #[arg(long, value_name = "SIZE")]
    size: Option<String>,

    /// authorized_keys file to update [default: ~/.ssh/authorized_keys]
    #[arg(long, env = "LANSYNC_AUTHORIZED_KEYS", value_name = "PATH")]
    authorized_keys: Option<PathBuf>,

    /// Config file
    #[arg(long, env = "LANSYNC_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file_config = Config::load(cli.config.as_deref())?;
    let settings = Settings::resolve(
        file_config,
        Overrides {
            public_dir: cli.dir,
            authorized_keys: cli.authorized_keys,
        },
        &config::home_dir()?,
        config::current_user(),
    )?;
    tracing::debug!(?settings, "resolved settings");

    let request = app::Request {
        import: cli.import.as_deref(),
        size: cli.size.as_deref(),
    };
    if let Err(err) = app::run(&settings, &request) {
        output::print_error(format!("{err:#}"));
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}

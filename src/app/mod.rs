// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! One invocation of lansync: import keys, optionally set up the share, and
//! tell the user how to send files.

use std::fs;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::Settings;
use crate::logic::{
    AuthorizedKeys, Fetcher, HttpFetcher, KeyResolver, ShareImage, ShareProvisioner,
};
use crate::models::PublicKey;
use crate::output::{print_info, print_success, print_warning};
use crate::utils::{CommandRunner, SystemRunner, local_ip, parse_size};

/// What the user asked for on the command line.
#[derive(Clone, Copy, Debug, Default)]
pub struct Request<'a> {
    /// Raw `--import` value: key, path, URL, or GitHub username (one per line).
    pub import: Option<&'a str>,
    /// Raw `--size` value; the share is only set up when present.
    pub size: Option<&'a str>,
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct Report {
    pub imported: Vec<PublicKey>,
    pub already_present: Vec<PublicKey>,
    pub share: Option<ShareImage>,
}

/// Run with the real HTTP client and external tools.
pub fn run(settings: &Settings, request: &Request<'_>) -> Result<Report> {
    let fetcher = HttpFetcher::new().context("Failed to set up HTTP client")?;
    run_with(settings, request, &fetcher, &SystemRunner)
}

/// Run against the given collaborators.
///
/// Key import comes first and is complete before the share is touched, so a
/// bad `--size` never undoes or blocks an import.
pub fn run_with(
    settings: &Settings,
    request: &Request<'_>,
    fetcher: &dyn Fetcher,
    runner: &dyn CommandRunner,
) -> Result<Report> {
    let mut report = Report::default();

    if request.import.is_some() {
        import_keys(settings, request.import, fetcher, &mut report)?;
    }

    if let Some(size) = request.size {
        report.share = Some(set_up_share(settings, size, runner)?);
    }

    let host = local_ip().map_or_else(|| "<this-host>".to_string(), |ip| ip.to_string());
    println!(
        "\nRsync from client with: rsync <src file> {}@{}:{}",
        settings.user,
        host,
        settings.public_dir.display()
    );

    Ok(report)
}

fn import_keys(
    settings: &Settings,
    input: Option<&str>,
    fetcher: &dyn Fetcher,
    report: &mut Report,
) -> Result<()> {
    let keys = KeyResolver::new(fetcher, settings.github_url.clone()).resolve(input);
    if keys.is_empty() {
        print_warning("No valid public keys found in the import value");
        return Ok(());
    }
    debug!(count = keys.len(), "resolved keys");

    let store = AuthorizedKeys::new(&settings.authorized_keys, settings.policy());
    for key in keys {
        let added = store
            .register(&key)
            .with_context(|| format!("Failed to import key {}", key.preview()))?;
        match added {
            Some(key) => {
                print_success(format!("Imported key successfully: {}", key.preview()));
                report.imported.push(key);
            }
            None => {
                print_info(format!("Key already imported: {}", key.preview()));
                report.already_present.push(key);
            }
        }
    }
    Ok(())
}

fn set_up_share(settings: &Settings, size_text: &str, runner: &dyn CommandRunner) -> Result<ShareImage> {
    let size = parse_size(size_text).with_context(|| format!("Invalid share size {size_text:?}"))?;

    if !settings.public_dir.exists() {
        fs::create_dir_all(&settings.public_dir).with_context(|| {
            format!("Failed to create public directory {:?}", settings.public_dir)
        })?;
    }

    let provisioner = ShareProvisioner::new(runner);
    let image_path = settings.image_path();
    let share = if image_path.exists() {
        print_warning(format!(
            "Share \"{}\" already exists; leaving it untouched",
            image_path.display()
        ));
        let existing_size = fs::metadata(&image_path)
            .with_context(|| format!("Failed to inspect share image {:?}", image_path))?
            .len();
        ShareImage {
            offset: provisioner.first_partition_offset(&image_path),
            path: image_path,
            size: existing_size,
        }
    } else {
        let share = provisioner
            .provision(&image_path, size)
            .with_context(|| format!("Failed to create share {:?}", image_path))?;
        print_success(format!(
            "Created share \"{}\" and limited it to {}",
            share.path.display(),
            size_text
        ));
        share
    };

    print_info(format!(
        "Mount share with the following command:\n{}",
        share.mount_command(&settings.user, &settings.public_dir)
    ));
    Ok(share)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::fs;

    use tempfile::TempDir;
    use url::Url;

    use super::{Request, run_with};
    use crate::config::Settings;
    use crate::error::Result;
    use crate::logic::fetch::testing::StaticFetcher;
    use crate::logic::share::DEFAULT_PARTITION_OFFSET;
    use crate::models::public_key::fixtures::{ED25519_ALICE, ED25519_BOB, RSA_CAROL};
    use crate::utils::CommandRunner;

    /// Succeeds silently; `parted ... print` output is empty so the
    /// default partition layout is used.
    struct QuietRunner;

    impl CommandRunner for QuietRunner {
        fn run(&self, _program: &str, _args: &[OsString]) -> Result<String> {
            Ok(String::new())
        }
    }

    fn settings(tmp: &TempDir) -> Settings {
        Settings {
            public_dir: tmp.path().join("public/"),
            image_dir: tmp.path().join(".lansync"),
            image_name: "share.img".into(),
            authorized_keys: tmp.path().join(".ssh").join("authorized_keys"),
            github_url: Url::parse("https://github.com").unwrap(),
            user: "alice".into(),
        }
    }

    #[test]
    fn importing_a_literal_key_twice_writes_one_entry() {
        let tmp = TempDir::new().unwrap();
        let settings = settings(&tmp);
        let fetcher = StaticFetcher::default();
        let request = Request {
            import: Some(RSA_CAROL),
            size: None,
        };

        let first = run_with(&settings, &request, &fetcher, &QuietRunner).unwrap();
        let after_first = fs::read_to_string(&settings.authorized_keys).unwrap();
        let second = run_with(&settings, &request, &fetcher, &QuietRunner).unwrap();
        let after_second = fs::read_to_string(&settings.authorized_keys).unwrap();

        assert_eq!(first.imported.len(), 1);
        assert!(first.already_present.is_empty());
        assert!(second.imported.is_empty());
        assert_eq!(second.already_present.len(), 1);
        assert_eq!(after_first, after_second);
        assert_eq!(
            after_second,
            format!(
                "command=\"rsync --server -e.LsfxC . {}/\",no-pty,no-agent-forwarding,no-port-forwarding {RSA_CAROL}\n",
                tmp.path().join("public").display()
            )
        );
    }

    #[test]
    fn importing_a_key_file_skips_malformed_lines() {
        let tmp = TempDir::new().unwrap();
        let settings = settings(&tmp);
        let key_file = tmp.path().join("team.pub");
        fs::write(&key_file, format!("{ED25519_BOB}\nnot a key\n{ED25519_ALICE}\n")).unwrap();
        let request = Request {
            import: key_file.to_str(),
            size: None,
        };

        let report = run_with(&settings, &request, &StaticFetcher::default(), &QuietRunner).unwrap();

        let imported: Vec<&str> = report.imported.iter().map(|k| k.as_str()).collect();
        assert_eq!(imported, vec![ED25519_BOB, ED25519_ALICE]);
        let contents = fs::read_to_string(&settings.authorized_keys).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn invalid_size_fails_after_keys_are_imported() {
        let tmp = TempDir::new().unwrap();
        let settings = settings(&tmp);
        let request = Request {
            import: Some(ED25519_ALICE),
            size: Some("10Q"),
        };

        let result = run_with(&settings, &request, &StaticFetcher::default(), &QuietRunner);

        assert!(result.is_err());
        assert!(fs::read_to_string(&settings.authorized_keys)
            .unwrap()
            .ends_with(&format!("{ED25519_ALICE}\n")));
        assert!(!settings.image_path().exists());
    }

    #[test]
    fn size_provisions_share_and_public_dir() {
        let tmp = TempDir::new().unwrap();
        let settings = settings(&tmp);
        let request = Request {
            import: None,
            size: Some("10M"),
        };

        let report = run_with(&settings, &request, &StaticFetcher::default(), &QuietRunner).unwrap();

        let share = report.share.unwrap();
        assert_eq!(share.path, settings.image_path());
        assert_eq!(share.size, 10 * 1024 * 1024);
        assert_eq!(share.offset, DEFAULT_PARTITION_OFFSET);
        assert!(settings.public_dir.is_dir());
        assert!(!settings.authorized_keys.exists());
    }

    #[test]
    fn existing_share_is_left_untouched() {
        let tmp = TempDir::new().unwrap();
        let settings = settings(&tmp);
        fs::create_dir_all(&settings.image_dir).unwrap();
        fs::write(settings.image_path(), b"existing image").unwrap();
        let request = Request {
            import: None,
            size: Some("10M"),
        };

        let report = run_with(&settings, &request, &StaticFetcher::default(), &QuietRunner).unwrap();

        assert_eq!(report.share.unwrap().size, b"existing image".len() as u64);
        assert_eq!(fs::read(settings.image_path()).unwrap(), b"existing image");
    }

    #[test]
    fn store_io_failure_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings(&tmp);
        settings.authorized_keys = tmp.path().to_path_buf();
        let request = Request {
            import: Some(ED25519_ALICE),
            size: None,
        };

        assert!(run_with(&settings, &request, &StaticFetcher::default(), &QuietRunner).is_err());
    }
}

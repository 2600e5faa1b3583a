// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Size-limited FAT share images.
//!
//! The share is a sparse raw disk image holding one MBR partition formatted
//! as FAT. Mounting it at the public directory caps how much a client can
//! upload. Partitioning and formatting are delegated to `parted` and
//! `mkfs.fat`.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::utils::CommandRunner;

/// Partition start observed on images partitioned this way; also used
/// where `parted` cannot be queried.
pub const DEFAULT_PARTITION_OFFSET: u64 = 65536;

/// Smallest image worth partitioning and formatting.
pub const MIN_SHARE_SIZE: u64 = 1 << 20;

const SECTOR_SIZE: u64 = 512;

/// A provisioned image and where its filesystem starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareImage {
    pub path: PathBuf,
    pub size: u64,
    pub offset: u64,
}

impl ShareImage {
    /// Command that loop-mounts the share at `mount_point` for `user`,
    /// without setuid binaries and private to that user.
    pub fn mount_command(&self, user: &str, mount_point: &Path) -> String {
        format!(
            "sudo mount -o offset={},nosuid,uid={user},gid={user},umask=0077 {} {}",
            self.offset,
            self.path.display(),
            mount_point.display()
        )
    }
}

/// Byte range of a partition inside an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    pub start: u64,
    pub size: u64,
}

/// Creates share images using external partitioning tools.
pub struct ShareProvisioner<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> ShareProvisioner<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Create a `size`-byte image at `path` with a single FAT partition.
    ///
    /// # Errors
    ///
    /// [`Error::ShareTooSmall`] and [`Error::ShareExists`] before anything
    /// is written, [`Error::ShareIo`] when the image cannot be created, and
    /// [`Error::Spawn`]/[`Error::Command`] when a tool fails.
    pub fn provision(&self, path: &Path, size: u64) -> Result<ShareImage> {
        if size < MIN_SHARE_SIZE {
            return Err(Error::ShareTooSmall {
                size,
                min: MIN_SHARE_SIZE,
            });
        }
        if path.exists() {
            return Err(Error::ShareExists(path.to_path_buf()));
        }

        create_sparse_image(path, size)?;
        let mut guard = PartialImage::new(path);
        debug!(path = %path.display(), size, "created raw image");

        self.runner.run(
            "parted",
            &args([
                "-s".into(),
                "-a".into(),
                "none".into(),
                path.into(),
                "mklabel".into(),
                "msdos".into(),
                "mkpart".into(),
                "primary".into(),
                "fat32".into(),
                format!("{DEFAULT_PARTITION_OFFSET}B").into(),
                "100%".into(),
            ]),
        )?;

        let partition = self.read_partition(path).unwrap_or(Partition {
            start: DEFAULT_PARTITION_OFFSET,
            size: size - DEFAULT_PARTITION_OFFSET,
        });

        self.runner.run(
            "mkfs.fat",
            &args([
                "--offset".into(),
                (partition.start / SECTOR_SIZE).to_string().into(),
                path.into(),
                (partition.size / 1024).to_string().into(),
            ]),
        )?;

        guard.keep();
        info!(path = %path.display(), size, offset = partition.start, "provisioned share image");
        Ok(ShareImage {
            path: path.to_path_buf(),
            size,
            offset: partition.start,
        })
    }

    /// Byte offset of the first partition in `image`.
    ///
    /// Reads the partition table with `parted` on Linux; elsewhere, or when
    /// the table cannot be read, returns [`DEFAULT_PARTITION_OFFSET`].
    pub fn first_partition_offset(&self, image: &Path) -> u64 {
        if !cfg!(target_os = "linux") {
            return DEFAULT_PARTITION_OFFSET;
        }
        self.read_partition(image)
            .map_or(DEFAULT_PARTITION_OFFSET, |p| p.start)
    }

    fn read_partition(&self, image: &Path) -> Option<Partition> {
        let output = self
            .runner
            .run(
                "parted",
                &args(["-s".into(), image.into(), "unit".into(), "B".into(), "print".into()]),
            )
            .inspect_err(|err| warn!(error = %err, "couldn't read partition table"))
            .ok()?;

        let partition = parse_first_partition(&output);
        if partition.is_none() {
            warn!(image = %image.display(), "no partition found in parted output");
        }
        partition
    }
}

/// Removes a freshly created image on drop unless [`PartialImage::keep`] was
/// called, so a failed tool run never leaves an unformatted share behind.
struct PartialImage<'p> {
    path: &'p Path,
    keep: bool,
}

impl<'p> PartialImage<'p> {
    fn new(path: &'p Path) -> Self {
        Self { path, keep: false }
    }

    fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for PartialImage<'_> {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match fs::remove_file(self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed incomplete share image"),
            Err(err) => warn!(
                path = %self.path.display(),
                error = %err,
                "couldn't remove incomplete share image"
            ),
        }
    }
}

fn args<const N: usize>(items: [OsString; N]) -> Vec<OsString> {
    items.into()
}

fn create_sparse_image(path: &Path, size: u64) -> Result<()> {
    let io_err = |source| Error::ShareIo {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(io_err)?;
    if let Err(source) = file.set_len(size) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(io_err(source));
    }
    Ok(())
}

/// Read start and size of the first row below the `Number` header of
/// `parted -s <image> unit B print`.
///
/// ```text
/// Number  Start   End        Size       Type     File system  Flags
///  1      65536B  10485759B  10420224B  primary  fat32        lba
/// ```
pub fn parse_first_partition(output: &str) -> Option<Partition> {
    let row = output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("Number"))
        .skip(1)
        .find(|line| !line.trim().is_empty())?;

    let columns: Vec<&str> = row.split_whitespace().collect();
    let start = digits(columns.get(1)?)?;
    let size = digits(columns.get(3)?)?;
    Some(Partition { start, size })
}

fn digits(column: &str) -> Option<u64> {
    let digits: String = column.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::ffi::OsString;
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::{
        DEFAULT_PARTITION_OFFSET, Partition, ShareImage, ShareProvisioner, parse_first_partition,
    };
    use crate::error::{Error, Result};
    use crate::utils::CommandRunner;

    const PARTED_PRINT: &str = "\
Model:  (file)
Disk /tmp/share.img: 10485760B
Sector size (logical/physical): 512B/512B
Partition Table: msdos
Disk Flags:

Number  Start    End        Size       Type     File system  Flags
 1      1048576B  10485759B  9437184B   primary               lba

";

    /// Records invocations and answers `parted ... print` with canned output.
    struct RecordingRunner {
        print_output: Option<&'static str>,
        calls: RefCell<Vec<(String, Vec<String>)>>,
    }

    impl RecordingRunner {
        fn new(print_output: Option<&'static str>) -> Self {
            Self {
                print_output,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn programs(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(p, _)| p.clone()).collect()
        }

        fn args_of(&self, program: &str) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .find(|(p, _)| p == program)
                .map(|(_, a)| a.clone())
                .unwrap()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, program: &str, args: &[OsString]) -> Result<String> {
            let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
            let is_print = args.last().is_some_and(|a| a == "print");
            self.calls.borrow_mut().push((program.to_string(), args));
            match (is_print, self.print_output) {
                (true, Some(out)) => Ok(out.to_string()),
                (true, None) => Err(Error::Command {
                    program: program.to_string(),
                    status: "exit status: 1".into(),
                    stderr: "unrecognised disk label".into(),
                }),
                (false, _) => Ok(String::new()),
            }
        }
    }

    #[test]
    fn parse_first_partition_reads_start_and_size() {
        assert_eq!(
            parse_first_partition(PARTED_PRINT),
            Some(Partition {
                start: 1_048_576,
                size: 9_437_184
            })
        );
    }

    #[test]
    fn parse_first_partition_handles_missing_rows() {
        assert_eq!(parse_first_partition(""), None);
        assert_eq!(
            parse_first_partition("Partition Table: msdos\n\nNumber  Start  End  Size\n"),
            None
        );
    }

    #[test]
    fn provision_creates_partitions_and_formats_image() {
        let tmp = TempDir::new().unwrap();
        let image = tmp.path().join("state").join("share.img");
        let runner = RecordingRunner::new(Some(PARTED_PRINT));

        let share = ShareProvisioner::new(&runner)
            .provision(&image, 10 * 1024 * 1024)
            .unwrap();

        assert_eq!(share.offset, 1_048_576);
        assert_eq!(share.size, 10 * 1024 * 1024);
        assert_eq!(fs::metadata(&image).unwrap().len(), 10 * 1024 * 1024);
        assert_eq!(runner.programs(), vec!["parted", "parted", "mkfs.fat"]);

        let mkpart = runner.args_of("parted");
        assert!(mkpart.contains(&"mklabel".to_string()));
        assert!(mkpart.contains(&"65536B".to_string()));

        let image_arg = image.to_string_lossy().into_owned();
        assert_eq!(
            runner.args_of("mkfs.fat"),
            vec!["--offset".to_string(), "2048".into(), image_arg, "9216".into()]
        );
    }

    #[test]
    fn provision_falls_back_to_default_layout() {
        let tmp = TempDir::new().unwrap();
        let image = tmp.path().join("share.img");
        let runner = RecordingRunner::new(None);

        let share = ShareProvisioner::new(&runner)
            .provision(&image, 2 * 1024 * 1024)
            .unwrap();

        assert_eq!(share.offset, DEFAULT_PARTITION_OFFSET);
        let mkfs = runner.args_of("mkfs.fat");
        assert_eq!(mkfs[1], "128");
        assert_eq!(mkfs[3], ((2 * 1024 * 1024 - DEFAULT_PARTITION_OFFSET) / 1024).to_string());
    }

    /// Succeeds for everything except the named program.
    struct FailingRunner(&'static str);

    impl CommandRunner for FailingRunner {
        fn run(&self, program: &str, _args: &[OsString]) -> Result<String> {
            if program == self.0 {
                return Err(Error::Command {
                    program: program.to_string(),
                    status: "exit status: 1".into(),
                    stderr: "boom".into(),
                });
            }
            Ok(String::new())
        }
    }

    // A later run would otherwise treat the leftover as an existing share.
    #[test]
    fn provision_removes_image_when_a_tool_fails() {
        let tmp = TempDir::new().unwrap();
        let image = tmp.path().join("share.img");

        for program in ["parted", "mkfs.fat"] {
            let runner = FailingRunner(program);
            let result = ShareProvisioner::new(&runner).provision(&image, 10 * 1024 * 1024);

            assert!(matches!(result, Err(Error::Command { .. })));
            assert!(!image.exists(), "{program} failure left the image behind");
        }
    }

    #[test]
    fn provision_rejects_small_or_existing_images() {
        let tmp = TempDir::new().unwrap();
        let image = tmp.path().join("share.img");
        let runner = RecordingRunner::new(Some(PARTED_PRINT));
        let provisioner = ShareProvisioner::new(&runner);

        assert!(matches!(
            provisioner.provision(&image, 512),
            Err(Error::ShareTooSmall { .. })
        ));

        fs::write(&image, b"keep me").unwrap();
        assert!(matches!(
            provisioner.provision(&image, 10 * 1024 * 1024),
            Err(Error::ShareExists(_))
        ));
        assert_eq!(fs::read(&image).unwrap(), b"keep me");
        assert!(runner.programs().is_empty());
    }

    #[test]
    fn first_partition_offset_falls_back_to_default() {
        let runner = RecordingRunner::new(None);
        let provisioner = ShareProvisioner::new(&runner);

        assert_eq!(
            provisioner.first_partition_offset(Path::new("/nonexistent.img")),
            DEFAULT_PARTITION_OFFSET
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn first_partition_offset_reads_parted_on_linux() {
        let runner = RecordingRunner::new(Some(PARTED_PRINT));
        let provisioner = ShareProvisioner::new(&runner);

        assert_eq!(
            provisioner.first_partition_offset(Path::new("/tmp/share.img")),
            1_048_576
        );
    }

    #[test]
    fn mount_command_limits_access_to_user() {
        let share = ShareImage {
            path: "/home/alice/.lansync/share.img".into(),
            size: 10 * 1024 * 1024,
            offset: 65536,
        };

        assert_eq!(
            share.mount_command("alice", Path::new("/home/alice/public/")),
            "sudo mount -o offset=65536,nosuid,uid=alice,gid=alice,umask=0077 /home/alice/.lansync/share.img /home/alice/public/"
        );
    }
}

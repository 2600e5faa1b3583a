// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! External program invocation used for partitioning and formatting images.

use std::ffi::OsString;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

/// Runs an external program to completion and returns its stdout.
///
/// Share provisioning talks to `parted` and `mkfs.fat` only through this
/// trait so tests can record invocations instead of touching real disks.
pub trait CommandRunner {
    /// # Errors
    ///
    /// [`Error::Spawn`] when the program cannot be started and
    /// [`Error::Command`] when it exits unsuccessfully.
    fn run(&self, program: &str, args: &[OsString]) -> Result<String>;
}

/// [`CommandRunner`] backed by [`std::process::Command`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<String> {
        debug!(program, ?args, "running external command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::Command {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

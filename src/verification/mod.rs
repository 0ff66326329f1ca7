//! Running external check commands on finished layouts.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paths::{out_stderr, out_stdout};

/// Interval between checks for child exit.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Runs a command to completion, redirecting its output to files.
pub trait CommandRunner {
    /// Returns the exit code of `command`.
    fn run(&self, command: &str, work_dir: &Path, stdout: &Path, stderr: &Path) -> Result<i32>;
}

/// Runs commands through `sh -c`, polling for exit.
#[derive(Debug, Default, Copy, Clone)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, work_dir: &Path, stdout: &Path, stderr: &Path) -> Result<i32> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(File::create(stdout)?)
            .stderr(File::create(stderr)?)
            .spawn()?;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            thread::sleep(POLL_INTERVAL);
        };
        status
            .code()
            .ok_or_else(|| Error::Terminated(command.to_string()))
    }
}

/// Outcome of one external check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub command: String,
    pub exit_code: i32,
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

impl CheckReport {
    #[inline]
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs `command` once in `work_dir`, with output logged to `{name}.out` and `{name}.err`.
///
/// A failing command is reported, not retried.
pub fn run_check(
    runner: &dyn CommandRunner,
    command: &str,
    work_dir: &Path,
    name: &str,
) -> Result<CheckReport> {
    std::fs::create_dir_all(work_dir)?;
    let stdout = out_stdout(work_dir, name);
    let stderr = out_stderr(work_dir, name);
    info!("running check `{command}` in {work_dir:?}");
    let exit_code = runner.run(command, work_dir, &stdout, &stderr)?;
    let report = CheckReport {
        command: command.to_string(),
        exit_code,
        stdout,
        stderr,
    };
    if !report.passed() {
        warn!(
            "check `{command}` failed with exit code {exit_code}; see {:?}",
            report.stderr
        );
    }
    Ok(report)
}

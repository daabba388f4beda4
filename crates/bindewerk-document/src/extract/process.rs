// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded execution of external tools (frame decoder, media probe).
//
// Children never inherit our stdio: stdin and stderr are null, and stdout is
// either captured or discarded. A child that outlives its deadline is killed.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use bindewerk_core::error::{BindewerkError, Result};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Output of a child that exited successfully.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Captured stdout; empty unless capture was requested.
    pub stdout: Vec<u8>,
}

/// Run `program` with `args`, waiting at most `timeout`.
///
/// Spawn failures, non-zero exits, and signals are [`BindewerkError::Process`];
/// an expired deadline is [`BindewerkError::ProcessTimeout`] and the child is
/// killed.
#[instrument(skip_all, fields(program = %program.display()))]
pub async fn run_bounded<I, S>(
    program: &Path,
    args: I,
    timeout: Duration,
    capture_stdout: bool,
) -> Result<ProcessOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(if capture_stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| {
            BindewerkError::Process(format!("failed to start {}: {}", program.display(), err))
        })?;

    // Dropping the wait future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            return Err(BindewerkError::Process(format!(
                "failed waiting for {}: {}",
                program.display(),
                err
            )));
        }
        Err(_) => {
            warn!(secs = timeout.as_secs(), "Process timed out, killed");
            return Err(BindewerkError::ProcessTimeout {
                program: program.display().to_string(),
                secs: timeout.as_secs(),
            });
        }
    };

    if !output.status.success() {
        return Err(BindewerkError::Process(format!(
            "{} exited with {}",
            program.display(),
            output.status
        )));
    }

    debug!(stdout_len = output.stdout.len(), "Process finished");
    Ok(ProcessOutput {
        stdout: output.stdout,
    })
}

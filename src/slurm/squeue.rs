// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Slurm CLI integration: fetch the raw queue report via squeue.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

use super::error::QueueError;

/// Fixed squeue arguments: all states, no header, one comma-separated line per job
/// with partition, user, job name, state, cpus and minimum memory.
pub const SQUEUE_ARGS: [&str; 3] = ["--noheader", "--states=all", "--format=%P,%u,%j,%T,%C,%m"];

/// Something that can produce a raw queue report
#[async_trait]
pub trait QueueSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, QueueError>;
}

/// Runs an external program and returns its standard output
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandSource {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    /// squeue with the fixed report arguments. `program` is usually just "squeue".
    pub fn squeue(program: impl Into<String>) -> Self {
        Self::new(program, SQUEUE_ARGS)
    }

    /// Kill the program and fail with `QueueError::Timeout` if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl QueueSource for CommandSource {
    async fn fetch(&self) -> Result<Vec<u8>, QueueError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| QueueError::Execution {
                program: self.program.clone(),
                source,
            })?;

        let Some(limit) = self.timeout else {
            return capture_output(&self.program, &mut child).await;
        };

        let outcome = tokio::time::timeout(limit, capture_output(&self.program, &mut child)).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                // Reap the child now rather than leaving it to kill_on_drop
                let _ = child.kill().await;
                Err(QueueError::Timeout {
                    program: self.program.clone(),
                    timeout: limit,
                })
            }
        }
    }
}

/// Drain stdout and stderr, then wait for the exit status.
///
/// Both pipes are dropped before returning on every path.
async fn capture_output(program: &str, child: &mut Child) -> Result<Vec<u8>, QueueError> {
    let read_error = |source: io::Error| QueueError::Read {
        program: program.to_string(),
        source,
    };

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| read_error(io::Error::other("stdout was not captured")))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| read_error(io::Error::other("stderr was not captured")))?;

    let mut out = Vec::new();
    let mut err = Vec::new();
    let (out_result, err_result) = tokio::join!(stdout.read_to_end(&mut out), stderr.read_to_end(&mut err));
    drop(stdout);
    drop(stderr);
    out_result.map_err(read_error)?;

    let status = child.wait().await.map_err(|e| QueueError::Exit {
        program: program.to_string(),
        detail: format!("wait failed: {}", e),
    })?;

    if !status.success() {
        let mut detail = status.to_string();
        // stderr is diagnostic only, an unreadable one just leaves it out
        if err_result.is_ok() {
            let stderr = String::from_utf8_lossy(&err);
            let stderr = stderr.trim();
            if !stderr.is_empty() {
                detail = format!("{}: {}", detail, stderr);
            }
        }
        return Err(QueueError::Exit {
            program: program.to_string(),
            detail,
        });
    }

    Ok(out)
}

// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

use std::io;
use std::num::ParseFloatError;
use std::time::Duration;

use thiserror::Error;

/// Errors that fail a single queue scrape.
///
/// None of these are retried; the scrape layer logs them and keeps serving.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The query program could not be started
    #[error("failed to execute {program}: {source}")]
    Execution {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The query program exited with a failure status, or waiting on it failed
    #[error("{program} failed: {detail}")]
    Exit { program: String, detail: String },

    /// Reading the query program's standard output failed
    #[error("failed to read output of {program}: {source}")]
    Read {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The query program did not finish within the deadline and was killed
    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    /// A report line could not be parsed
    #[error("line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },
}

/// Why a single report line was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid {field} value {value:?}: {source}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },
}

impl QueueError {
    /// All values returned by [`QueueError::kind`]
    pub const KINDS: [&'static str; 5] = ["execution", "exit", "read", "timeout", "parse"];

    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            QueueError::Execution { .. } => "execution",
            QueueError::Exit { .. } => "exit",
            QueueError::Read { .. } => "read",
            QueueError::Timeout { .. } => "timeout",
            QueueError::Parse { .. } => "parse",
        }
    }
}

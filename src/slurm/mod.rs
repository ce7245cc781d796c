// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Slurm queue monitoring.
//!
//! Data flow per scrape:
//! - squeue: runs `squeue` and returns its raw report
//! - parser: turns the report into a `QueueSnapshot`
//! - collector: turns the snapshot into Prometheus gauge samples

pub mod collector;
pub mod error;
pub mod parser;
pub mod squeue;
pub mod types;

pub use collector::QueueCollector;
pub use error::QueueError;
pub use squeue::{CommandSource, QueueSource};

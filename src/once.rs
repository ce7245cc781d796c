// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! One-shot mode: scrape the queue once and print the snapshot as NDJSON.
//!
//! Unlike `/metrics` this also shows the summed cores and memory per key.

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::slurm::types::{AggregationKey, QueueCounts, QueueSnapshot};
use crate::slurm::{QueueCollector, QueueSource};

/// One output line: the key fields followed by the counters
#[derive(Serialize)]
struct SnapshotLine<'a> {
    #[serde(flatten)]
    key: &'a AggregationKey,
    #[serde(flatten)]
    counts: &'a QueueCounts,
}

/// Run the one-shot mode against the given collector
pub async fn run_once_mode<S: QueueSource>(collector: &QueueCollector<S>) -> Result<()> {
    let snapshot = collector
        .snapshot()
        .await
        .context("Failed to collect queue snapshot")?;

    let mut stdout = io::stdout().lock();
    write_snapshot(&snapshot, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Write one JSON object per key, ordered by key
pub fn write_snapshot(snapshot: &QueueSnapshot, out: &mut impl Write) -> Result<()> {
    for (key, counts) in snapshot.sorted() {
        writeln!(out, "{}", serde_json::to_string(&SnapshotLine { key, counts })?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slurm::parser::parse_queue;

    #[test]
    fn test_write_snapshot_ndjson() {
        let snapshot = parse_queue(
            b"part2,bob,jobB,RUNNING,8,16000\npart1,bob,jobA,PENDING,1,1000\npart1,bob,jobA,PENDING,1,500\n",
        )
        .unwrap();

        let mut out = Vec::new();
        write_snapshot(&snapshot, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["partition"], "part1");
        assert_eq!(first["user"], "bob");
        assert_eq!(first["name"], "jobA");
        assert_eq!(first["state"], "PENDING");
        assert_eq!(first["jobs"], 2);
        assert_eq!(first["cores"], 2.0);
        assert_eq!(first["memory"], 1500.0);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["partition"], "part2");
        assert_eq!(second["jobs"], 1);
    }

    #[test]
    fn test_write_empty_snapshot() {
        let mut out = Vec::new();
        write_snapshot(&QueueSnapshot::default(), &mut out).unwrap();
        assert!(out.is_empty());
    }
}

// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Aggregated queue types.
//!
//! A `QueueSnapshot` is built from scratch for every scrape and dropped once
//! its samples are emitted. Nothing here is shared between scrapes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One `squeue` output line, borrowed from the raw report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueRecord<'a> {
    pub partition: &'a str,
    pub user: &'a str,
    pub name: &'a str,
    pub state: &'a str,
    /// Allocated or requested CPU count (%C)
    pub cores: f64,
    /// Minimum memory, in the scheduler's native unit (%m)
    pub memory: f64,
}

impl QueueRecord<'_> {
    /// Build the grouping key for this record
    pub fn key(&self) -> AggregationKey {
        AggregationKey::new(self.partition, self.user, self.name, self.state)
    }
}

/// Grouping key: (partition, user, job name, state)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AggregationKey {
    pub partition: String,
    pub user: String,
    pub name: String,
    pub state: String,
}

impl AggregationKey {
    pub fn new(partition: &str, user: &str, name: &str, state: &str) -> Self {
        Self {
            partition: partition.to_string(),
            user: user.to_string(),
            name: name.to_string(),
            state: state.to_string(),
        }
    }

    /// Label values in metric label order: partition, user, name, state
    pub fn label_values(&self) -> [&str; 4] {
        [&self.partition, &self.user, &self.name, &self.state]
    }
}

/// Per-key counters accumulated over one parse pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueCounts {
    /// Number of jobs mapping to the key
    pub jobs: u64,
    /// Sum of the cores field
    pub cores: f64,
    /// Sum of the memory field
    pub memory: f64,
}

impl QueueCounts {
    fn add(&mut self, record: &QueueRecord<'_>) {
        self.jobs += 1;
        self.cores += record.cores;
        self.memory += record.memory;
    }
}

/// A single gauge sample: label values plus the job count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueSample<'a> {
    pub labels: [&'a str; 4],
    pub value: f64,
}

/// Aggregated queue state for exactly one scrape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueSnapshot {
    entries: HashMap<AggregationKey, QueueCounts>,
}

impl QueueSnapshot {
    /// Fold one record into the snapshot, creating a zeroed entry on first sight
    pub fn add(&mut self, record: &QueueRecord<'_>) {
        self.entries.entry(record.key()).or_default().add(record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[allow(dead_code)]
    pub fn get(&self, key: &AggregationKey) -> Option<&QueueCounts> {
        self.entries.get(key)
    }

    #[allow(dead_code)]
    pub fn iter(&self) -> impl Iterator<Item = (&AggregationKey, &QueueCounts)> {
        self.entries.iter()
    }

    /// Entries ordered by key, for stable human-facing output
    pub fn sorted(&self) -> Vec<(&AggregationKey, &QueueCounts)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Lazily yield one job-count sample per key.
    ///
    /// Each call starts a fresh iterator over the same snapshot.
    pub fn samples(&self) -> impl Iterator<Item = QueueSample<'_>> + '_ {
        self.entries.iter().map(|(key, counts)| QueueSample {
            labels: key.label_values(),
            value: counts.jobs as f64,
        })
    }
}

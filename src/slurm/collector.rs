// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Prometheus collector for the Slurm queue.
//!
//! Every `collect` runs squeue once, parses the report into a fresh snapshot
//! and turns it into a `slurm_queue_jobs` gauge family. The collector itself
//! holds no mutable state, so concurrent scrapes never interfere.

use std::collections::HashMap;

use prometheus::core::Desc;
use prometheus::proto::{Gauge, LabelPair, Metric, MetricFamily, MetricType};
use tracing::debug;

use super::error::QueueError;
use super::parser::parse_queue;
use super::squeue::QueueSource;
use super::types::{QueueSample, QueueSnapshot};

pub const QUEUE_JOBS_METRIC: &str = "slurm_queue_jobs";
pub const QUEUE_JOBS_HELP: &str = "Pending/running jobs in queue, grouped by partition/user/name/state.";
pub const QUEUE_LABELS: [&str; 4] = ["partition", "user", "name", "state"];

/// Describe/collect pair over a queue source
pub struct QueueCollector<S> {
    source: S,
    jobs_desc: Desc,
}

impl<S: QueueSource> QueueCollector<S> {
    pub fn new(source: S) -> prometheus::Result<Self> {
        let jobs_desc = Desc::new(
            QUEUE_JOBS_METRIC.to_string(),
            QUEUE_JOBS_HELP.to_string(),
            QUEUE_LABELS.iter().map(|l| l.to_string()).collect(),
            HashMap::new(),
        )?;
        Ok(Self { source, jobs_desc })
    }

    /// Static metric descriptors, independent of scheduler state
    pub fn describe(&self) -> Vec<&Desc> {
        vec![&self.jobs_desc]
    }

    /// Fetch and parse one queue report
    pub async fn snapshot(&self) -> Result<QueueSnapshot, QueueError> {
        let raw = self.source.fetch().await?;
        let snapshot = parse_queue(&raw)?;
        debug!(bytes = raw.len(), keys = snapshot.len(), "parsed queue report");
        Ok(snapshot)
    }

    /// Run one scrape.
    ///
    /// Returns no families for an empty queue. Fetch and parse failures are
    /// returned to the caller untouched.
    pub async fn collect(&self) -> Result<Vec<MetricFamily>, QueueError> {
        let snapshot = self.snapshot().await?;
        Ok(gauge_family(&self.jobs_desc, snapshot.samples())
            .into_iter()
            .collect())
    }
}

/// Build a gauge family from samples, `None` when there are no samples
fn gauge_family<'a>(desc: &Desc, samples: impl Iterator<Item = QueueSample<'a>>) -> Option<MetricFamily> {
    let mut family = MetricFamily::default();
    family.set_name(desc.fq_name.clone());
    family.set_help(desc.help.clone());
    family.set_field_type(MetricType::GAUGE);

    for sample in samples {
        let mut metric = Metric::default();
        for (name, value) in desc.variable_labels.iter().zip(sample.labels) {
            let mut pair = LabelPair::default();
            pair.set_name(name.clone());
            pair.set_value(value.to_string());
            metric.mut_label().push(pair);
        }
        let mut gauge = Gauge::default();
        gauge.set_value(sample.value);
        metric.set_gauge(gauge);
        family.mut_metric().push(metric);
    }

    if family.get_metric().is_empty() {
        None
    } else {
        Some(family)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use super::*;
    use crate::slurm::error::ParseErrorKind;
    use crate::slurm::squeue::testing::FakeSource;

    fn labels(metric: &Metric) -> Vec<(String, String)> {
        metric
            .get_label()
            .iter()
            .map(|p| (p.get_name().to_string(), p.get_value().to_string()))
            .collect()
    }

    fn label_pairs(values: [&str; 4]) -> Vec<(String, String)> {
        QUEUE_LABELS
            .iter()
            .zip(values)
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_describe_single_descriptor() {
        let collector = QueueCollector::new(FakeSource::Fail(|| QueueError::Exit {
            program: "squeue".into(),
            detail: "down".into(),
        }))
        .unwrap();

        let descs = collector.describe();
        assert_eq!(descs.len(), 1);
        assert_eq!(descs[0].fq_name, QUEUE_JOBS_METRIC);
        assert_eq!(descs[0].help, QUEUE_JOBS_HELP);
        assert_eq!(descs[0].variable_labels, QUEUE_LABELS);
    }

    #[tokio::test]
    async fn test_collect_two_keys() {
        let collector = QueueCollector::new(FakeSource::Report(
            "part1,bob,jobA,PENDING,1,1000\npart2,bob,jobB,RUNNING,8,16000\n",
        ))
        .unwrap();

        let families = collector.collect().await.unwrap();
        assert_eq!(families.len(), 1);
        let family = &families[0];
        assert_eq!(family.get_name(), QUEUE_JOBS_METRIC);
        assert_eq!(family.get_field_type(), MetricType::GAUGE);
        assert_eq!(family.get_metric().len(), 2);

        let mut seen: Vec<Vec<(String, String)>> = family.get_metric().iter().map(labels).collect();
        seen.sort();
        assert_eq!(
            seen,
            vec![
                label_pairs(["part1", "bob", "jobA", "PENDING"]),
                label_pairs(["part2", "bob", "jobB", "RUNNING"]),
            ]
        );
        assert!(family.get_metric().iter().all(|m| m.get_gauge().get_value() == 1.0));
    }

    #[tokio::test]
    async fn test_collect_value_is_job_count() {
        let collector = QueueCollector::new(FakeSource::Report(
            "debug,alice,job1,RUNNING,4,8192\ndebug,alice,job1,RUNNING,2,4096\n",
        ))
        .unwrap();

        let families = collector.collect().await.unwrap();
        let metrics = families[0].get_metric();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].get_gauge().get_value(), 2.0);
        assert_eq!(labels(&metrics[0]), label_pairs(["debug", "alice", "job1", "RUNNING"]));
    }

    #[tokio::test]
    async fn test_collect_empty_queue() {
        let collector = QueueCollector::new(FakeSource::Report("")).unwrap();
        let families = collector.collect().await.unwrap();
        assert!(families.is_empty());
    }

    #[tokio::test]
    async fn test_collect_propagates_fetch_error() {
        let collector = QueueCollector::new(FakeSource::Fail(|| QueueError::Execution {
            program: "squeue".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        }))
        .unwrap();

        let err = collector.collect().await.unwrap_err();
        assert_eq!(err.kind(), "execution");
    }

    #[tokio::test]
    async fn test_collect_propagates_parse_error() {
        let collector = QueueCollector::new(FakeSource::Report("debug,alice,job1,RUNNING,x,1\n")).unwrap();

        let err = collector.collect().await.unwrap_err();
        assert!(matches!(
            err,
            QueueError::Parse {
                kind: ParseErrorKind::InvalidNumber { field: "cores", .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_snapshot_keeps_resource_sums() {
        let collector = QueueCollector::new(FakeSource::Report(
            "debug,alice,job1,RUNNING,4,8192\ndebug,alice,job1,RUNNING,2,4096\n",
        ))
        .unwrap();

        let snapshot = collector.snapshot().await.unwrap();
        let (_, counts) = snapshot.iter().next().unwrap();
        assert_eq!(counts.cores, 6.0);
        assert_eq!(counts.memory, 12288.0);
    }

    #[tokio::test]
    async fn test_concurrent_collects_are_independent() {
        let collector = Arc::new(
            QueueCollector::new(FakeSource::Report("debug,alice,job1,RUNNING,4,8192\n")).unwrap(),
        );

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let collector = Arc::clone(&collector);
                tokio::spawn(async move { collector.collect().await.unwrap() })
            })
            .collect();

        for task in tasks {
            let families = task.await.unwrap();
            assert_eq!(families[0].get_metric()[0].get_gauge().get_value(), 1.0);
        }
    }
}

// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! HTTP scrape endpoint.
//!
//! A failed queue scrape is logged and counted, then the response goes out
//! with only the exporter's own metrics. The process keeps serving.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, Gauge, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::slurm::{QueueCollector, QueueError, QueueSource};

/// Collector plus the exporter's self-metrics
pub struct ExporterState<S> {
    collector: QueueCollector<S>,
    registry: Registry,
    scrape_errors: IntCounterVec,
    scrape_duration: Gauge,
    scrape_success: IntGauge,
}

impl<S: QueueSource> ExporterState<S> {
    pub fn new(collector: QueueCollector<S>) -> prometheus::Result<Self> {
        let registry = Registry::new();

        let scrape_errors = IntCounterVec::new(
            Opts::new(
                "slurm_queue_scrape_errors_total",
                "Failed queue scrapes by error kind.",
            ),
            &["kind"],
        )?;
        let scrape_duration = Gauge::new(
            "slurm_queue_scrape_duration_seconds",
            "Duration of the last queue scrape.",
        )?;
        let scrape_success = IntGauge::new(
            "slurm_queue_scrape_success",
            "Whether the last queue scrape succeeded (1) or failed (0).",
        )?;

        registry.register(Box::new(scrape_errors.clone()))?;
        registry.register(Box::new(scrape_duration.clone()))?;
        registry.register(Box::new(scrape_success.clone()))?;

        // Expose every kind from the start, even at zero
        for kind in QueueError::KINDS {
            scrape_errors.with_label_values(&[kind]);
        }

        Ok(Self {
            collector,
            registry,
            scrape_errors,
            scrape_duration,
            scrape_success,
        })
    }

    /// Run one scrape and render it in the Prometheus text format
    pub async fn render(&self) -> Result<(String, Vec<u8>)> {
        let started = Instant::now();
        let mut families = match self.collector.collect().await {
            Ok(families) => {
                self.scrape_success.set(1);
                let samples: usize = families.iter().map(|f| f.get_metric().len()).sum();
                debug!(samples, elapsed = ?started.elapsed(), "queue scrape finished");
                families
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "queue scrape failed");
                self.scrape_errors.with_label_values(&[e.kind()]).inc();
                self.scrape_success.set(0);
                Vec::new()
            }
        };
        self.scrape_duration.set(started.elapsed().as_secs_f64());
        families.extend(self.registry.gather());

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .context("Failed to encode metrics")?;
        Ok((encoder.format_type().to_string(), buffer))
    }
}

/// Build the router: `/metrics` plus a landing page
pub fn router<S: QueueSource + 'static>(state: Arc<ExporterState<S>>) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/metrics", get(handle_metrics::<S>))
        .with_state(state)
}

async fn handle_index() -> &'static str {
    "squeue-exporter\n\nMetrics are served at /metrics\n"
}

async fn handle_metrics<S: QueueSource + 'static>(State(state): State<Arc<ExporterState<S>>>) -> Response {
    match state.render().await {
        Ok((content_type, body)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)).into_response()
        }
    }
}

/// Serve until SIGINT/SIGTERM
pub async fn serve<S: QueueSource + 'static>(listen: &str, collector: QueueCollector<S>) -> Result<()> {
    for desc in collector.describe() {
        info!(metric = %desc.fq_name, labels = ?desc.variable_labels, "exporting");
    }
    let state = Arc::new(ExporterState::new(collector).context("Failed to register exporter metrics")?);

    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

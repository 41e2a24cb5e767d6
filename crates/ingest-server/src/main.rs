#![forbid(unsafe_code)]

//! **ingest-server** – HEC-compatible HTTP ingestion endpoint for the
//! Telhawk SIEM data plane (§4.C, §6).
//!
//! Wires every other crate in the workspace into one binary: admission
//! (auth + rate limiting), the bounded Event Queue, the normalization
//! pipeline, the Bulk Indexer, the Ack Manager, the DLQ, and the Stats
//! Collector, behind an axum router.

mod cli;
mod config;
mod health;
mod hec;
mod state;
mod stats;
mod worker;

use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use ingest_ack::AckManager;
use ingest_auth::{CredentialValidator, HttpCredentialValidator, TokenCache};
use ingest_bus::EventQueue;
use ingest_dlq::{DlqWriter, FileDlqBackend, NoopDlqBackend, StreamDlqBackend};
use ingest_indexer::{BulkIndexer, IndexLifecycle, RetentionConfig};
use ingest_metrics::IngestMetrics;
use ingest_normalize::Pipeline;
use ingest_ratelimit::{AlwaysAllowLimiter, MemoryRateLimitStorage, RateLimiter, SlidingWindowLimiter};
use ingest_store::DurableStream;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::config::IngestConfig;
use crate::state::AppState;
use crate::stats::{InMemoryStatsSink, StatsCollector, UnimplementedRedisSink};
use crate::worker::{spawn_workers, IndexingPipeline, WorkerContext};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut config = IngestConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if matches!(cli.command, Some(Command::ValidateConfig)) {
        info!("configuration valid");
        println!("{config:#?}");
        return Ok(());
    }

    info!(version = env!("CARGO_PKG_VERSION"), "starting ingest-server");
    let config = Arc::new(config);

    let opensearch_client = reqwest::Client::builder()
        .danger_accept_invalid_certs(config.opensearch.tls_skip_verify)
        .timeout(Duration::from_secs(10))
        .build()
        .context("failed to build downstream store client")?;

    let retention = RetentionConfig {
        rollover_max_size_bytes: config.opensearch.rollover_size_gb * 1024 * 1024 * 1024,
        rollover_max_age: chrono::Duration::hours(config.opensearch.rollover_age_hours),
        retention_days: config.opensearch.retention_days,
    };
    let lifecycle = IndexLifecycle::new(opensearch_client.clone(), &config.opensearch.url, &config.opensearch.index_prefix, retention);
    lifecycle.ensure_template().await.context("failed to ensure index template")?;
    lifecycle.ensure_retention_policy().await.context("failed to ensure retention policy")?;
    lifecycle.ensure_write_alias().await.context("failed to ensure write alias")?;
    let indexer = Arc::new(BulkIndexer::new(opensearch_client, &config.opensearch.url, &lifecycle.write_alias()));

    let credential_validator: Option<Arc<dyn CredentialValidator>> = Some(Arc::new(HttpCredentialValidator::new(
        &config.authenticate.url,
        Duration::from_secs(2),
        TokenCache::new(chrono::Duration::seconds(config.authenticate.token_validation_cache_ttl_secs as i64)),
    )));

    let (ip_limiter, token_limiter): (Arc<dyn RateLimiter>, Arc<dyn RateLimiter>) = if config.ingestion.rate_limit_enabled {
        let window = chrono::Duration::seconds(config.ingestion.rate_limit_window_secs as i64);
        (
            Arc::new(SlidingWindowLimiter::new(MemoryRateLimitStorage::new(), config.ingestion.rate_limit_requests, window)),
            Arc::new(SlidingWindowLimiter::new(MemoryRateLimitStorage::new(), config.ingestion.rate_limit_requests, window)),
        )
    } else {
        (Arc::new(AlwaysAllowLimiter), Arc::new(AlwaysAllowLimiter))
    };

    let dlq: Arc<dyn DlqWriter> = if !config.dlq.enabled {
        Arc::new(NoopDlqBackend)
    } else {
        match config.dlq.backend.as_str() {
            "stream" => {
                let stream = DurableStream::open(&config.dlq.nats_url).context("failed to open DLQ stream")?;
                Arc::new(StreamDlqBackend::new(Arc::new(stream)))
            }
            _ => Arc::new(FileDlqBackend::new(&config.dlq.base_path).await.context("failed to open file DLQ")?),
        }
    };

    let ack = AckManager::new(Duration::from_secs(config.ack.ttl_secs));
    let queue = Arc::new(EventQueue::new(config.server.queue_capacity));
    let metrics = Arc::new(IngestMetrics::new().context("failed to register metrics")?);

    let stats_sink: Arc<dyn stats::StatsSink> =
        if config.redis.enabled { Arc::new(UnimplementedRedisSink) } else { Arc::new(InMemoryStatsSink::new()) };
    let stats_collector = StatsCollector::new(stats_sink);

    let indexing = IndexingPipeline::new(indexer, dlq.clone(), ack.clone(), metrics.clone());
    let pipeline = Arc::new(Pipeline::default_pipeline());

    let app_state = Arc::new(AppState {
        config: config.clone(),
        credential_validator,
        ip_limiter,
        token_limiter,
        queue: queue.clone(),
        ack: ack.clone(),
        stats: stats_collector.clone(),
        metrics: metrics.clone(),
        ready: Arc::new(AtomicBool::new(false)),
    });

    let worker_ctx = Arc::new(WorkerContext {
        queue: queue.clone(),
        pipeline,
        indexing: indexing.clone(),
        dlq: dlq.clone(),
        ack: ack.clone(),
        metrics: metrics.clone(),
    });

    let (ack_handle, ack_shutdown) = ack.spawn_cleanup_worker();
    let (stats_handle, stats_shutdown) = stats_collector.spawn_flush_worker();
    let (flush_handle, flush_shutdown) = worker::spawn_flush_ticker(indexing.clone());
    let worker_handles = spawn_workers(worker_ctx, config.server.pipeline_workers);

    app_state.mark_ready();

    let app = build_router(app_state.clone(), config.ingestion.max_event_size, config.server.idle_timeout_secs);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "HEC endpoint listening");

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>());
    tokio::select! {
        result = server => {
            if let Err(err) = result {
                error!(error = %err, "HTTP server error");
            }
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received, draining");
        }
    }

    let drain_deadline = Duration::from_secs(config.server.write_timeout_secs);
    let residual = queue.drain(drain_deadline).await;
    if !residual.is_empty() {
        warn!(count = residual.len(), "dropping residual queued events on shutdown");
        for queued in residual {
            if let Some(ack_id) = queued.ack_id {
                ack.fail_event(ack_id, queued.envelope.id);
            }
        }
    }

    for handle in worker_handles {
        let _ = handle.await;
    }
    indexing.flush_pending().await;

    let _ = ack_shutdown.send(());
    let _ = ack_handle.await;
    let _ = stats_shutdown.send(());
    let _ = stats_handle.await;
    let _ = flush_shutdown.send(());
    let _ = flush_handle.await;

    info!("ingest-server stopped");
    Ok(())
}

fn build_router(state: Arc<AppState>, max_event_size: usize, idle_timeout_secs: u64) -> Router {
    Router::new()
        .route("/services/collector/event", post(hec::collector_event))
        .route("/services/collector/event/1.0", post(hec::collector_event))
        .route("/services/collector/raw", post(hec::collector_raw))
        .route("/services/collector/raw/1.0", post(hec::collector_raw))
        .route("/services/collector/health", get(hec::collector_health))
        .route("/services/collector/ack", post(hec::collector_ack))
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(max_event_size))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(idle_timeout_secs)))
                .into_inner(),
        )
}

fn init_logging(log_level: &str) {
    let filter = format!("ingest_server={log_level},ingest_ack={log_level},ingest_auth={log_level},ingest_bus={log_level},ingest_dlq={log_level},ingest_indexer={log_level},ingest_normalize={log_level},ingest_ratelimit={log_level}");
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

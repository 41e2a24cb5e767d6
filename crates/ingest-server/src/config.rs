//! Layered configuration: a TOML/YAML file named by `--config`, overlaid with
//! `INGEST_<SECTION>__<KEY>` environment variables, parsed once at startup
//! into a typed [`IngestConfig`] and handed to every constructor by `Arc`.

use serde::Deserialize;

/// Top-level configuration (§6 CLI/Config).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// `server.*`
    pub server: ServerConfig,
    /// `ingestion.*`
    pub ingestion: IngestionConfig,
    /// `ack.*`
    pub ack: AckConfig,
    /// `dlq.*`
    pub dlq: DlqConfig,
    /// `opensearch.*`
    pub opensearch: OpensearchConfig,
    /// `authenticate.*`
    pub authenticate: AuthenticateConfig,
    /// `redis.*`
    pub redis: RedisConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            ingestion: IngestionConfig::default(),
            ack: AckConfig::default(),
            dlq: DlqConfig::default(),
            opensearch: OpensearchConfig::default(),
            authenticate: AuthenticateConfig::default(),
            redis: RedisConfig::default(),
        }
    }
}

/// `server.{port,read_timeout,write_timeout,idle_timeout}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen port (§6: default 8088).
    pub port: u16,
    /// Socket read timeout, seconds.
    pub read_timeout_secs: u64,
    /// Socket write timeout, seconds; also the shutdown drain deadline (§5).
    pub write_timeout_secs: u64,
    /// Idle keep-alive timeout, seconds.
    pub idle_timeout_secs: u64,
    /// Bounded event queue capacity (§4.E: default 10000).
    pub queue_capacity: usize,
    /// Pipeline worker pool size (§5: "at least one, typically N").
    pub pipeline_workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8088, read_timeout_secs: 10, write_timeout_secs: 10, idle_timeout_secs: 60, queue_capacity: 10_000, pipeline_workers: 4 }
    }
}

/// `ingestion.{max_event_size,rate_limit_enabled,rate_limit_requests,rate_limit_window}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Maximum accepted request body size, bytes (§6: default 1 MiB).
    pub max_event_size: usize,
    /// Whether admission rate limiting is enforced (§4.B).
    pub rate_limit_enabled: bool,
    /// Max admissions per window, per keyspace entry.
    pub rate_limit_requests: u32,
    /// Sliding window length, seconds.
    pub rate_limit_window_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self { max_event_size: 1_048_576, rate_limit_enabled: true, rate_limit_requests: 1000, rate_limit_window_secs: 60 }
    }
}

/// `ack.{enabled,ttl}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AckConfig {
    /// Whether `X-Splunk-Request-Channel` reserves an ack id (§4.C step 11).
    pub enabled: bool,
    /// Ack TTL, seconds (see DESIGN.md Open Question decision (d)).
    pub ttl_secs: u64,
}

impl Default for AckConfig {
    fn default() -> Self {
        Self { enabled: true, ttl_secs: ingest_ack::DEFAULT_TTL.as_secs() }
    }
}

/// `dlq.{enabled,backend,base_path,nats_url}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DlqConfig {
    /// Whether a real backend is wired; `false` selects the noop writer.
    pub enabled: bool,
    /// `"file"` or `"stream"`.
    pub backend: String,
    /// File backend directory.
    pub base_path: String,
    /// Stream backend storage location. Named `nats_url` for config-surface
    /// compatibility with the upstream spec; this deployment's stream
    /// backend is the in-process durable-stream primitive (`ingest-store`),
    /// not an external NATS cluster, so the value is interpreted as a
    /// filesystem path to the stream's sled database.
    pub nats_url: String,
}

impl Default for DlqConfig {
    fn default() -> Self {
        Self { enabled: true, backend: "file".to_string(), base_path: "data/dlq".to_string(), nats_url: "data/dlq-stream".to_string() }
    }
}

/// `opensearch.*`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpensearchConfig {
    /// Base URL of the downstream search engine's HTTP API.
    pub url: String,
    /// Basic-auth username, if required.
    pub username: Option<String>,
    /// Basic-auth password, if required.
    pub password: Option<String>,
    /// Skip TLS certificate verification (self-signed clusters).
    pub tls_skip_verify: bool,
    /// Index/template/alias name prefix.
    pub index_prefix: String,
    /// Shard count for the index template.
    pub shard_count: u32,
    /// Replica count for the index template.
    pub replica_count: u32,
    /// Refresh interval string passed through to the template settings.
    pub refresh_interval: String,
    /// Retention policy: delete after this many days (§4.K default 30).
    pub retention_days: u32,
    /// Retention policy: rollover by size, GB (§4.K default 50).
    pub rollover_size_gb: u64,
    /// Retention policy: rollover by age, hours (§4.K default 24).
    pub rollover_age_hours: i64,
}

impl Default for OpensearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            tls_skip_verify: false,
            index_prefix: "telhawk-events".to_string(),
            shard_count: 3,
            replica_count: 1,
            refresh_interval: "5s".to_string(),
            retention_days: 30,
            rollover_size_gb: 50,
            rollover_age_hours: 24,
        }
    }
}

/// `authenticate.{url,token_validation_cache_ttl}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthenticateConfig {
    /// Base URL of the external credential auth boundary (§6, out of scope).
    pub url: String,
    /// Token cache TTL, seconds (§4.A default 5 min).
    pub token_validation_cache_ttl_secs: u64,
}

impl Default for AuthenticateConfig {
    fn default() -> Self {
        Self { url: "http://localhost:9400".to_string(), token_validation_cache_ttl_secs: 300 }
    }
}

/// `redis.{url,enabled}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Whether the Stats Collector should use a Redis-backed sink instead of
    /// the in-process map. No Redis-backed sink ships yet (see DESIGN.md);
    /// the flag is honored as a config surface and logged as unimplemented
    /// rather than silently ignored.
    pub enabled: bool,
    /// Redis connection URL, if `enabled`.
    pub url: Option<String>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self { enabled: false, url: None }
    }
}

impl IngestConfig {
    /// Load from an optional file path, overlaid with `INGEST_<SECTION>__<KEY>`
    /// environment variables (e.g. `INGEST_SERVER__PORT=9000`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("INGEST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let config = IngestConfig::default();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.ingestion.max_event_size, 1_048_576);
        assert_eq!(config.opensearch.retention_days, 30);
        assert_eq!(config.opensearch.rollover_size_gb, 50);
        assert_eq!(config.opensearch.rollover_age_hours, 24);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = IngestConfig::load(Some("/nonexistent/path/does-not-exist.toml")).unwrap();
        assert_eq!(config.server.port, 8088);
    }

    #[test]
    fn environment_override_takes_precedence() {
        std::env::set_var("INGEST_SERVER__PORT", "9999");
        let config = IngestConfig::load(None).unwrap();
        std::env::remove_var("INGEST_SERVER__PORT");
        assert_eq!(config.server.port, 9999);
    }
}

//! Daemon configuration, read from the environment at startup

use gavel_core::port::ConfigSource;

const DEFAULT_DB_PATH: &str = "~/.gavel/auctions.db";
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9630;
const DEFAULT_SERVICE_NAME: &str = "gavel-daemon";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub db_path: String,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub log_format: LogFormat,
    /// OTLP collector endpoint; span export is off when unset
    pub otel_endpoint: Option<String>,
    pub otel_service_name: String,
}

impl DaemonConfig {
    /// Build the configuration, falling back to defaults for unset or
    /// unparsable values. `AUCTION_INTERVAL` is not read here: it is resolved
    /// per auction by the closing scheduler.
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        let db_path = source
            .get("GAVEL_DB_PATH")
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let rpc_host = source
            .get("GAVEL_RPC_HOST")
            .unwrap_or_else(|| DEFAULT_RPC_HOST.to_string());

        let rpc_port = source
            .get("GAVEL_RPC_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RPC_PORT);

        let log_format = match source.get("GAVEL_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let otel_endpoint = source
            .get("OTEL_EXPORTER_OTLP_ENDPOINT")
            .filter(|s| !s.trim().is_empty());

        let otel_service_name = source
            .get("OTEL_SERVICE_NAME")
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string());

        Self {
            db_path: shellexpand::tilde(&db_path).into_owned(),
            rpc_host,
            rpc_port,
            log_format,
            otel_endpoint,
            otel_service_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_core::port::config_source::mocks::StaticConfigSource;

    #[test]
    fn test_defaults() {
        let config = DaemonConfig::from_source(&StaticConfigSource::new());

        assert!(config.db_path.ends_with(".gavel/auctions.db"));
        assert!(!config.db_path.starts_with('~'));
        assert_eq!(config.rpc_host, "127.0.0.1");
        assert_eq!(config.rpc_port, 9630);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.otel_endpoint.is_none());
        assert_eq!(config.otel_service_name, "gavel-daemon");
    }

    #[test]
    fn test_overrides() {
        let source = StaticConfigSource::with("GAVEL_DB_PATH", "/tmp/gavel-test.db");
        source.set("GAVEL_RPC_PORT", "7001");
        source.set("GAVEL_LOG_FORMAT", "json");

        let config = DaemonConfig::from_source(&source);

        assert_eq!(config.db_path, "/tmp/gavel-test.db");
        assert_eq!(config.rpc_port, 7001);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_otel_settings() {
        let source = StaticConfigSource::with("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317");
        source.set("OTEL_SERVICE_NAME", "gavel-staging");

        let config = DaemonConfig::from_source(&source);
        assert_eq!(config.otel_endpoint.as_deref(), Some("http://localhost:4317"));
        assert_eq!(config.otel_service_name, "gavel-staging");

        source.set("OTEL_EXPORTER_OTLP_ENDPOINT", "  ");
        assert!(DaemonConfig::from_source(&source).otel_endpoint.is_none());
    }

    #[test]
    fn test_bad_port_falls_back() {
        let source = StaticConfigSource::with("GAVEL_RPC_PORT", "not-a-port");
        assert_eq!(DaemonConfig::from_source(&source).rpc_port, 9630);
    }
}

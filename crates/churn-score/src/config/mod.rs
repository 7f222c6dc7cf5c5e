use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub model: ModelConfig,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let model_path = env::var("APP_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH));
        let model_version =
            env::var("APP_MODEL_VERSION").unwrap_or_else(|_| DEFAULT_MODEL_VERSION.to_string());

        let feature_store_path = env::var("APP_FEATURE_STORE_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let recommendations = match env::var("APP_RECOMMENDATIONS") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                var: "APP_RECOMMENDATIONS",
                value: raw,
            })?,
            Err(_) => true,
        };

        let lookup_workers = env::var("APP_LOOKUP_WORKERS")
            .unwrap_or_else(|_| "16".to_string())
            .parse::<usize>()
            .ok()
            .filter(|workers| *workers > 0)
            .ok_or(ConfigError::InvalidLookupWorkers)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            model: ModelConfig {
                path: model_path,
                version: model_version,
            },
            scoring: ScoringConfig {
                feature_store_path,
                recommendations,
                lookup_workers,
            },
        })
    }
}

pub const DEFAULT_MODEL_PATH: &str = "/tmp/model.onnx";
pub const DEFAULT_MODEL_VERSION: &str = "churn_v1";

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Location and tag of the deployed model artifact.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub version: String,
}

/// Feature source and pipeline switches.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// SQLite file holding `churn_feature_mv`; `None` scores against an empty store.
    pub feature_store_path: Option<PathBuf>,
    pub recommendations: bool,
    pub lookup_workers: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { var: &'static str, value: String },
    InvalidLookupWorkers,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { var, value } => {
                write!(f, "{var} must be true or false (got '{value}')")
            }
            ConfigError::InvalidLookupWorkers => {
                write!(f, "APP_LOOKUP_WORKERS must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidLookupWorkers => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_MODEL_PATH",
            "APP_MODEL_VERSION",
            "APP_FEATURE_STORE_PATH",
            "APP_RECOMMENDATIONS",
            "APP_LOOKUP_WORKERS",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.model.path, PathBuf::from("/tmp/model.onnx"));
        assert_eq!(config.model.version, "churn_v1");
        assert!(config.scoring.feature_store_path.is_none());
        assert!(config.scoring.recommendations);
        assert_eq!(config.scoring.lookup_workers, 16);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_model_and_scoring_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_MODEL_PATH", "/srv/models/churn.onnx");
        env::set_var("APP_MODEL_VERSION", "churn_v2");
        env::set_var("APP_FEATURE_STORE_PATH", "/srv/features.db");
        env::set_var("APP_RECOMMENDATIONS", "off");
        env::set_var("APP_LOOKUP_WORKERS", "4");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.model.path, PathBuf::from("/srv/models/churn.onnx"));
        assert_eq!(config.model.version, "churn_v2");
        assert_eq!(
            config.scoring.feature_store_path,
            Some(PathBuf::from("/srv/features.db"))
        );
        assert!(!config.scoring.recommendations);
        assert_eq!(config.scoring.lookup_workers, 4);
        reset_env();
    }

    #[test]
    fn rejects_invalid_switches() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_RECOMMENDATIONS", "sometimes");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFlag { var: "APP_RECOMMENDATIONS", .. })
        ));

        reset_env();
        env::set_var("APP_LOOKUP_WORKERS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidLookupWorkers)
        ));
        reset_env();
    }
}

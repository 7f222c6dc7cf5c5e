use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// ONNX Runtime logs every session build at info; keep it out of service logs.
const RUNTIME_DIRECTIVE: &str = "ort=warn";

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "invalid log filter '{}': unable to build EnvFilter", value)
            }
            TelemetryError::Subscriber(err) => write!(f, "subscriber already installed: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Filter directive built from the configured level, unless it already
/// mentions the runtime target.
pub fn filter_directive(config: &TelemetryConfig) -> String {
    let level = config.log_level.trim();
    let mentions_runtime = level
        .split(',')
        .any(|directive| directive.trim().starts_with("ort="));
    if mentions_runtime {
        level.to_string()
    } else {
        format!("{level},{RUNTIME_DIRECTIVE}")
    }
}

pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directive = filter_directive(config);
    EnvFilter::try_new(&directive).map_err(|source| TelemetryError::EnvFilter {
        value: directive,
        source,
    })
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: level.to_string(),
        }
    }

    #[test]
    fn runtime_target_is_quieted_by_default() {
        assert_eq!(filter_directive(&config("debug")), "debug,ort=warn");
        assert_eq!(
            filter_directive(&config("info,ort=trace")),
            "info,ort=trace"
        );
    }

    #[test]
    fn invalid_level_is_reported_with_value() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        match build_filter(&config("churn_score=loud")) {
            Err(TelemetryError::EnvFilter { value, .. }) => assert!(value.starts_with("churn_score=loud")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("invalid directive must not parse"),
        }
    }
}

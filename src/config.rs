//! Session configuration.
//!
//! Loaded in three layers: a TOML file (optional), then `HYVE_*`
//! environment variables, then command-line flags applied by the binary.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::protocol::CommandRequest;

pub const CONFIG_PATH_ENV: &str = "HYVE_CONFIG_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// What the session is for. Every mode decodes and times frames; the mode
/// picks the start command and what is shown while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Log every raw message
    Monitor,
    /// Request calibration and log the decoded readings
    Calibrate,
    /// Draw a live heat map
    #[default]
    Heatmap,
    /// Collect for a fixed window and report timing
    Timing,
}

impl SessionMode {
    pub fn start_command(&self) -> CommandRequest {
        match self {
            Self::Calibrate => CommandRequest::Cal,
            _ => CommandRequest::Run,
        }
    }

    pub fn renders(&self) -> bool {
        matches!(self, Self::Heatmap)
    }

    pub fn logs_raw(&self) -> bool {
        matches!(self, Self::Monitor)
    }

    pub fn logs_values(&self) -> bool {
        matches!(self, Self::Calibrate)
    }

    pub fn default_window(&self) -> Option<Duration> {
        match self {
            Self::Timing => Some(Duration::from_secs(60)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "broker.mqtt.cool".to_string(),
            port: 1883,
            client_id: format!("hyvestream-{}", std::process::id()),
            keep_alive_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    pub subscribe: String,
    pub command: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            subscribe: "HYVE/#".to_string(),
            command: "HYVE/REQUEST".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub rate_hz: f64,
    pub show_values: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            rate_hz: 20.0,
            show_values: false,
        }
    }
}

/// Fastest refresh the render loop accepts (1 ms period)
pub const MAX_RENDER_RATE_HZ: f64 = 1000.0;
/// Slowest refresh the render loop accepts (one frame per hour)
pub const MIN_RENDER_RATE_HZ: f64 = 1.0 / 3600.0;
/// Longest collection window accepted (30 days)
pub const MAX_WINDOW_SECS: f64 = 30.0 * 24.0 * 3600.0;

impl RenderConfig {
    /// Tick period, clamped to the accepted rate range so it is never zero.
    pub fn period(&self) -> Duration {
        let rate = if self.rate_hz.is_finite() {
            self.rate_hz.clamp(MIN_RENDER_RATE_HZ, MAX_RENDER_RATE_HZ)
        } else {
            RenderConfig::default().rate_hz
        };
        Duration::from_secs_f64(1.0 / rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Collection window in seconds; unset means run until interrupted
    pub window_secs: Option<f64>,
    pub histogram_bins: usize,
    pub max_samples: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            window_secs: None,
            histogram_bins: crate::observability::timing::DEFAULT_HISTOGRAM_BINS,
            max_samples: crate::observability::timing::DEFAULT_MAX_SAMPLES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionConfig {
    pub mode: SessionMode,
    pub broker: BrokerConfig,
    pub topics: TopicConfig,
    pub grid: GridConfig,
    pub render: RenderConfig,
    pub timing: TimingConfig,
    pub teardown: TeardownConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeardownConfig {
    /// Upper bound on waiting for background tasks after STOP
    pub timeout_ms: u64,
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self { timeout_ms: 2000 }
    }
}

impl SessionConfig {
    /// Configured window, falling back to the mode's default
    pub fn collection_window(&self) -> Option<Duration> {
        match self.timing.window_secs {
            Some(secs) => Some(Duration::from_secs_f64(window_in_range(secs))),
            None => self.mode.default_window(),
        }
    }

    pub fn teardown_timeout(&self) -> Duration {
        Duration::from_millis(self.teardown.timeout_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must be non-empty, got {}x{}",
                self.grid.width, self.grid.height
            )));
        }
        let rate = self.render.rate_hz;
        if !(MIN_RENDER_RATE_HZ..=MAX_RENDER_RATE_HZ).contains(&rate) {
            return Err(ConfigError::Invalid(format!(
                "render.rate_hz must be between {} and {}, got {}",
                MIN_RENDER_RATE_HZ, MAX_RENDER_RATE_HZ, rate
            )));
        }
        if let Some(window) = self.timing.window_secs {
            if !(window > 0.0 && window <= MAX_WINDOW_SECS) {
                return Err(ConfigError::Invalid(format!(
                    "timing.window_secs must be in (0, {}], got {}",
                    MAX_WINDOW_SECS, window
                )));
            }
        }
        if self.timing.histogram_bins == 0 {
            return Err(ConfigError::Invalid("timing.histogram_bins must be at least 1".into()));
        }
        if self.timing.max_samples == 0 {
            return Err(ConfigError::Invalid("timing.max_samples must be at least 1".into()));
        }
        if self.broker.host.is_empty() {
            return Err(ConfigError::Invalid("broker.host is empty".into()));
        }
        if self.broker.client_id.is_empty() {
            return Err(ConfigError::Invalid("broker.client_id is empty".into()));
        }
        // rumqttc rejects keep-alives under five seconds
        if self.broker.keep_alive_secs < 5 {
            return Err(ConfigError::Invalid(format!(
                "broker.keep_alive_secs must be at least 5, got {}",
                self.broker.keep_alive_secs
            )));
        }
        if self.topics.subscribe.is_empty() || self.topics.command.is_empty() {
            return Err(ConfigError::Invalid("topics must not be empty".into()));
        }
        Ok(())
    }
}

/// Windows outside (0, MAX_WINDOW_SECS] are rejected by `validate`; clamp
/// here so reading an unvalidated config cannot panic.
fn window_in_range(secs: f64) -> f64 {
    if secs.is_nan() {
        return MAX_WINDOW_SECS;
    }
    secs.clamp(0.0, MAX_WINDOW_SECS)
}

/// Load configuration from `path`, or from `HYVE_CONFIG_PATH`, or defaults,
/// then apply environment overrides.
pub fn load_config(path: Option<&Path>) -> ConfigResult<SessionConfig> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            parse_config(&content)?
        }
        None => SessionConfig::default(),
    };

    apply_environment_overrides(&mut config, |key| env::var(key).ok())?;
    Ok(config)
}

pub fn parse_config(content: &str) -> ConfigResult<SessionConfig> {
    Ok(toml::from_str(content)?)
}

/// Apply `HYVE_BROKER_HOST`, `HYVE_BROKER_PORT` and `HYVE_CLIENT_ID`
pub fn apply_environment_overrides<F>(config: &mut SessionConfig, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("HYVE_BROKER_HOST") {
        config.broker.host = host;
    }
    if let Some(port) = lookup("HYVE_BROKER_PORT") {
        config.broker.port = port
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("HYVE_BROKER_PORT is not a port: {}", port)))?;
    }
    if let Some(client_id) = lookup("HYVE_CLIENT_ID") {
        config.broker.client_id = client_id;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.topics.subscribe, "HYVE/#");
        assert_eq!(config.topics.command, "HYVE/REQUEST");
        assert_eq!(config.render.period(), Duration::from_millis(50));
        assert_eq!(config.collection_window(), None);
    }

    #[test]
    fn test_timing_mode_defaults_to_one_minute() {
        let config = SessionConfig {
            mode: SessionMode::Timing,
            ..Default::default()
        };
        assert_eq!(config.collection_window(), Some(Duration::from_secs(60)));
        assert_eq!(config.mode.start_command(), CommandRequest::Run);
        assert_eq!(SessionMode::Calibrate.start_command(), CommandRequest::Cal);
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = SessionConfig::default();
        apply_environment_overrides(&mut config, |key| match key {
            "HYVE_BROKER_HOST" => Some("localhost".to_string()),
            "HYVE_BROKER_PORT" => Some("1884".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.broker.host, "localhost");
        assert_eq!(config.broker.port, 1884);

        let bad = apply_environment_overrides(&mut config, |key| {
            (key == "HYVE_BROKER_PORT").then(|| "not-a-port".to_string())
        });
        assert!(matches!(bad, Err(ConfigError::Invalid(_))));
    }
}

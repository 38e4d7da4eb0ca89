use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_WINDOW: Duration = Duration::from_secs(20 * 60); // Default window of 20 minutes

// Parses a duration string (e.g., "20m", "1h") into a `std::time::Duration`.
// Used for deserializing duration values from the config file.
fn parse_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

/// Settings for the bounded-repeat policy.
/// Corresponds to the [limiter] section in the TOML config file.
#[derive(Debug, Deserialize, Clone)]
pub struct LimiterConfig {
    // Forwards allowed per signature within one window.
    #[serde(default = "LimiterConfig::default_max_forwards_per_window")]
    pub max_forwards_per_window: u32,

    // Length of the fixed window.
    #[serde(
        default = "LimiterConfig::default_window",
        deserialize_with = "parse_duration"
    )]
    pub window: Duration,
}

impl LimiterConfig {
    fn default_max_forwards_per_window() -> u32 {
        5
    }

    fn default_window() -> Duration {
        DEFAULT_WINDOW
    }

    /// Window as a `chrono::TimeDelta`, the unit the reporter works in.
    pub fn window_delta(&self) -> Result<chrono::TimeDelta> {
        chrono::TimeDelta::from_std(self.window)
            .with_context(|| format!("Window out of range: {:?}", self.window))
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_forwards_per_window: Self::default_max_forwards_per_window(),
            window: Self::default_window(),
        }
    }
}

/// Settings for where forwarded events go.
/// Corresponds to the [output] section in the TOML config file.
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    // Capacity of the channel between the reporter and the outputs.
    #[serde(default = "OutputConfig::default_buffer_len")]
    pub buffer_len: usize,

    // Whether to print events to stdout.
    #[serde(default = "OutputConfig::default_enable_stdout")]
    pub enable_stdout: bool,

    // Optional file path. If specified, events are appended there as JSON lines.
    pub file_path: Option<String>,
}

impl OutputConfig {
    fn default_buffer_len() -> usize {
        1024
    }

    fn default_enable_stdout() -> bool {
        true
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            buffer_len: Self::default_buffer_len(),
            enable_stdout: Self::default_enable_stdout(),
            file_path: None,
        }
    }
}

/// Represents the overall application configuration, loaded from a TOML file.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub limiter: LimiterConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn new(config_path: &Path) -> Result<Self> {
        let config = Self::load_from_file(config_path)?;
        config.validate()?;
        Ok(config)
    }

    // Loads configuration from a TOML file.
    fn load_from_file(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)?;
        toml::from_str::<Config>(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.limiter.max_forwards_per_window == 0 {
            bail!("limiter.max_forwards_per_window must be greater than 0");
        }
        if self.limiter.window.is_zero() {
            bail!("limiter.window must be greater than 0");
        }
        let window = self.limiter.window_delta()?;
        if chrono::Utc::now().checked_add_signed(window).is_none() {
            bail!("limiter.window is too large: {:?}", self.limiter.window);
        }
        if self.output.buffer_len == 0 {
            bail!("output.buffer_len must be greater than 0");
        }
        Ok(())
    }
}

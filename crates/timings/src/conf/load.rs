//! Load: config loading from file and environment variables.

use std::path::Path;
use std::fs::File;
use std::io::Read;

use super::model::TimingsConfig;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/timings/timings.toml";

impl TimingsConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("TIMINGS_CONFIG_FILE")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using defaults", config_path);
            Self::default()
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: TimingsConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Environment variables override file config
    pub fn apply_env(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(parser) = lookup("TIMINGS_PARSER") {
            self.parser = parser.parse()?;
        }
        if let Some(basis) = lookup("TIMINGS_TIME_BASIS") {
            self.time_basis = basis.parse()?;
        }
        if let Some(secs) = lookup("TIMINGS_APDEX_SATISFIED_SECS") {
            self.apdex.satisfied_secs = secs
                .parse()
                .map_err(|e| format!("TIMINGS_APDEX_SATISFIED_SECS={:?}: {}", secs, e))?;
        }
        if let Some(size) = lookup("TIMINGS_MAX_LINE_SIZE") {
            self.max_line_size = size
                .parse()
                .map_err(|e| format!("TIMINGS_MAX_LINE_SIZE={:?}: {}", size, e))?;
        }
        Ok(())
    }
}

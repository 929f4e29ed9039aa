use std::path::PathBuf;

use crate::game::constants::{feed, session, tracking};

/// Session configuration errors, reported before any tick runs
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("At least one tracked object is required")]
    NoObjects,
    #[error("Tracked object '{0}' is listed more than once")]
    DuplicateObject(String),
    #[error("Game duration must be positive, got {0}")]
    NonPositiveDuration(f64),
    #[error("Game axis must be 0 (x) or 1 (y), got {0}")]
    InvalidAxis(usize),
    #[error("Velocity glitch threshold must be positive, got {0}")]
    NonPositiveGlitchThreshold(f64),
}

/// Game configuration
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Names of the markers to track, in display order
    pub objects: Vec<String>,
    /// Coordinate separating the two sides (0 = x, 1 = y)
    pub axis: usize,
    /// Game length in seconds
    pub game_duration_seconds: f64,
    /// Per-tick displacement above which side changes are ignored
    pub velocity_glitch_threshold: f64,
    /// Recorded capture to replay; live feed when unset
    pub frame_file: Option<PathBuf>,
    /// Lines to skip at the start of the recorded capture
    pub skip_lines: u64,
    /// Live feed address
    pub feed_address: String,
    /// Port for the metrics exporter (disabled when unset)
    pub metrics_port: Option<u16>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            axis: session::AXIS,
            game_duration_seconds: session::GAME_DURATION_SECONDS,
            velocity_glitch_threshold: tracking::VELOCITY_GLITCH_THRESHOLD,
            frame_file: None,
            skip_lines: 0,
            feed_address: feed::DEFAULT_ADDRESS.to_string(),
            metrics_port: None,
        }
    }
}

impl GameConfig {
    /// Config tracking the given objects with every other field at its default
    pub fn with_objects<I, S>(objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            objects: objects.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(objects) = std::env::var("POSSESSION_OBJECTS") {
            config.objects = parse_object_list(&objects);
        }

        if let Ok(axis) = std::env::var("POSSESSION_AXIS") {
            match axis.parse::<usize>() {
                Ok(parsed) if parsed <= session::MAX_AXIS => config.axis = parsed,
                Ok(_) => tracing::warn!("POSSESSION_AXIS must be 0 or 1, using default"),
                Err(_) => tracing::warn!("Invalid POSSESSION_AXIS '{}', using default", axis),
            }
        }

        if let Ok(game_time) = std::env::var("POSSESSION_GAME_TIME") {
            match game_time.parse::<f64>() {
                Ok(parsed) if parsed > 0.0 && parsed.is_finite() => {
                    config.game_duration_seconds = parsed;
                }
                Ok(_) => tracing::warn!("POSSESSION_GAME_TIME must be > 0, using default"),
                Err(_) => {
                    tracing::warn!("Invalid POSSESSION_GAME_TIME '{}', using default", game_time)
                }
            }
        }

        if let Ok(threshold) = std::env::var("POSSESSION_GLITCH_THRESHOLD") {
            match threshold.parse::<f64>() {
                Ok(parsed) if parsed > 0.0 => config.velocity_glitch_threshold = parsed,
                Ok(_) => tracing::warn!("POSSESSION_GLITCH_THRESHOLD must be > 0, using default"),
                Err(_) => tracing::warn!(
                    "Invalid POSSESSION_GLITCH_THRESHOLD '{}', using default",
                    threshold
                ),
            }
        }

        if let Ok(path) = std::env::var("POSSESSION_FILE") {
            if !path.trim().is_empty() {
                config.frame_file = Some(PathBuf::from(path));
            }
        }

        if let Ok(skip) = std::env::var("POSSESSION_SKIP_LINES") {
            if let Ok(parsed) = skip.parse::<u64>() {
                config.skip_lines = parsed;
            } else {
                tracing::warn!("Invalid POSSESSION_SKIP_LINES '{}', using default", skip);
            }
        }

        if let Ok(addr) = std::env::var("POSSESSION_FEED_ADDRESS") {
            config.feed_address = addr;
        }

        if let Ok(port) = std::env::var("METRICS_PORT") {
            match port.parse::<u16>() {
                Ok(parsed) if parsed > 0 => config.metrics_port = Some(parsed),
                _ => tracing::warn!("Invalid METRICS_PORT '{}', metrics disabled", port),
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.objects.is_empty() {
            return Err(ConfigError::NoObjects);
        }
        for (i, name) in self.objects.iter().enumerate() {
            if self.objects[..i].contains(name) {
                return Err(ConfigError::DuplicateObject(name.clone()));
            }
        }
        let duration = self.game_duration_seconds;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ConfigError::NonPositiveDuration(self.game_duration_seconds));
        }
        if self.axis > session::MAX_AXIS {
            return Err(ConfigError::InvalidAxis(self.axis));
        }
        let threshold = self.velocity_glitch_threshold;
        if threshold.is_nan() || threshold <= 0.0 {
            return Err(ConfigError::NonPositiveGlitchThreshold(
                self.velocity_glitch_threshold,
            ));
        }
        Ok(())
    }
}

fn parse_object_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

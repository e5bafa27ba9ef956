//! Motion configuration
//!
//! Speeds only. Time units per step are fixed constants in
//! [`crate::schedule`] and are not configurable.

use crate::error::ConfigError;
use botblocks_program::{MoveDirection, TurnDirection};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Linear and angular speeds used when emitting velocity commands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Forward linear speed in m/s
    pub forward_speed: f64,
    /// Backward linear speed magnitude in m/s (emitted negative)
    pub backward_speed: f64,
    /// Angular speed magnitude (left positive, right negative)
    pub turn_rate: f64,
}

impl MotionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With forward speed
    #[inline]
    #[must_use]
    pub fn with_forward_speed(mut self, speed: f64) -> Self {
        self.forward_speed = speed;
        self
    }

    /// With backward speed
    #[inline]
    #[must_use]
    pub fn with_backward_speed(mut self, speed: f64) -> Self {
        self.backward_speed = speed;
        self
    }

    /// With turn rate
    #[inline]
    #[must_use]
    pub fn with_turn_rate(mut self, rate: f64) -> Self {
        self.turn_rate = rate;
        self
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::InvalidSpeed`] on a negative or non-finite speed.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// as [`MotionConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!("Loaded motion config from {}", path.display());
        Ok(config)
    }

    /// Check every speed is finite and non-negative
    ///
    /// # Errors
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("forward_speed", self.forward_speed),
            ("backward_speed", self.backward_speed),
            ("turn_rate", self.turn_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidSpeed { field, value });
            }
        }
        Ok(())
    }

    /// Signed linear velocity for a move
    #[must_use]
    pub fn linear_velocity(&self, direction: MoveDirection) -> f64 {
        let speed = match direction {
            MoveDirection::Forward => self.forward_speed,
            MoveDirection::Backward => self.backward_speed,
        };
        speed * direction.sign()
    }

    /// Signed angular velocity for a turn
    #[must_use]
    pub fn angular_velocity(&self, direction: TurnDirection) -> f64 {
        self.turn_rate * direction.sign()
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            forward_speed: 0.5,
            backward_speed: 0.35,
            turn_rate: 45.0,
        }
    }
}

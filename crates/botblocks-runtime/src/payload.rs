//! Outbound wire messages
//!
//! The host transport publishes each [`OutboundMessage`] verbatim on its
//! topic. Velocity payloads are JSON; speech payloads are the bare clip
//! name.

use botblocks_program::SoundClip;
use serde::{Deserialize, Serialize};

/// Topic for velocity commands
pub const VELOCITY_TOPIC: &str = "/control/target_velocity";

/// Topic for speech commands
pub const SPEECH_TOPIC: &str = "robot/speak";

/// JSON body of a velocity message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityPayload {
    /// Epoch milliseconds at encoding time
    pub timestamp: i64,
    /// Linear velocity in m/s
    pub linear_velocity_mps: f64,
    /// Angular velocity
    pub angular_velocity_radps: f64,
}

/// A message ready for the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Destination topic
    pub topic: String,
    /// Encoded payload
    pub payload: String,
}

impl OutboundMessage {
    /// Encode a velocity command stamped with the current time
    ///
    /// # Errors
    /// Returns the serializer error if the payload cannot be encoded.
    pub fn velocity(linear: f64, angular: f64) -> Result<Self, serde_json::Error> {
        Self::velocity_at(chrono::Utc::now().timestamp_millis(), linear, angular)
    }

    /// Encode a velocity command with an explicit timestamp
    ///
    /// # Errors
    /// Returns the serializer error if the payload cannot be encoded.
    pub fn velocity_at(
        timestamp: i64,
        linear: f64,
        angular: f64,
    ) -> Result<Self, serde_json::Error> {
        let payload = serde_json::to_string(&VelocityPayload {
            timestamp,
            linear_velocity_mps: linear,
            angular_velocity_radps: angular,
        })?;
        Ok(Self {
            topic: VELOCITY_TOPIC.to_string(),
            payload,
        })
    }

    /// Encode a speech command
    #[must_use]
    pub fn speech(clip: SoundClip) -> Self {
        Self {
            topic: SPEECH_TOPIC.to_string(),
            payload: clip.as_str().to_string(),
        }
    }

    /// Decode a velocity payload, if this is a velocity message
    #[must_use]
    pub fn velocity_payload(&self) -> Option<VelocityPayload> {
        if self.topic != VELOCITY_TOPIC {
            return None;
        }
        serde_json::from_str(&self.payload).ok()
    }
}

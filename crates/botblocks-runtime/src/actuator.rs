//! Actuator interface and adapters
//!
//! The interpreter emits [`ActuatorCommand`]s through the [`Actuator`]
//! trait. Emission is fire-and-forget: adapters never report failure back
//! to the run. Provided adapters:
//! - [`ChannelActuator`]: encodes wire messages for a host transport
//! - [`TracingActuator`]: logs commands (dry runs)
//! - [`RecordingActuator`]: keeps a timestamped log

use crate::payload::OutboundMessage;
use botblocks_program::SoundClip;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// A single outbound command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ActuatorCommand {
    /// Drive at the given linear and angular velocity
    Velocity {
        /// Linear velocity, forward positive
        linear: f64,
        /// Angular velocity, left positive
        angular: f64,
    },
    /// Play a clip
    Speech {
        /// Clip to play
        clip: SoundClip,
    },
    /// Zero velocity
    Stop,
}

impl ActuatorCommand {
    /// Velocity carried by this command, if any (`Stop` is zero)
    #[must_use]
    pub fn velocity(&self) -> Option<(f64, f64)> {
        match *self {
            Self::Velocity { linear, angular } => Some((linear, angular)),
            Self::Stop => Some((0.0, 0.0)),
            Self::Speech { .. } => None,
        }
    }

    /// Whether this command leaves the robot stationary
    #[must_use]
    pub fn is_stationary(&self) -> bool {
        self.velocity().map_or(true, |(linear, angular)| {
            linear == 0.0 && angular == 0.0
        })
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Velocity { linear, angular } => {
                write!(f, "velocity(linear={linear}, angular={angular})")
            }
            Self::Speech { clip } => write!(f, "speech({clip})"),
            Self::Stop => f.write_str("stop"),
        }
    }
}

/// Sink for actuator commands
pub trait Actuator: Send + Sync {
    /// Send a velocity command
    fn send_velocity(&self, linear: f64, angular: f64);

    /// Send a speech command
    fn send_speech(&self, clip: SoundClip);

    /// Dispatch a command to the matching primitive
    fn send(&self, command: &ActuatorCommand) {
        match *command {
            ActuatorCommand::Velocity { linear, angular } => self.send_velocity(linear, angular),
            ActuatorCommand::Speech { clip } => self.send_speech(clip),
            ActuatorCommand::Stop => self.send_velocity(0.0, 0.0),
        }
    }
}

/// Encodes commands onto an unbounded channel drained by the host transport
#[derive(Debug, Clone)]
pub struct ChannelActuator {
    sender: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelActuator {
    /// Create the actuator and the receiving end for the transport
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn publish(&self, message: OutboundMessage) {
        if self.sender.send(message).is_err() {
            tracing::warn!("Transport channel closed, dropping actuator message");
        }
    }
}

impl Actuator for ChannelActuator {
    fn send_velocity(&self, linear: f64, angular: f64) {
        match OutboundMessage::velocity(linear, angular) {
            Ok(message) => self.publish(message),
            Err(e) => tracing::warn!("Failed to encode velocity command: {}", e),
        }
    }

    fn send_speech(&self, clip: SoundClip) {
        self.publish(OutboundMessage::speech(clip));
    }
}

/// Logs every command at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActuator;

impl Actuator for TracingActuator {
    fn send_velocity(&self, linear: f64, angular: f64) {
        tracing::info!("velocity linear={} angular={}", linear, angular);
    }

    fn send_speech(&self, clip: SoundClip) {
        tracing::info!("speech clip={}", clip);
    }
}

/// Records each command with the tokio instant it was sent at
///
/// `send` is overridden so `Stop` is recorded as itself rather than as a
/// zero velocity.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    log: Mutex<Vec<(Instant, ActuatorCommand)>>,
}

impl RecordingActuator {
    /// Create an empty recorder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, command: ActuatorCommand) {
        self.log.lock().push((Instant::now(), command));
    }

    /// Commands in emission order
    #[must_use]
    pub fn commands(&self) -> Vec<ActuatorCommand> {
        self.log.lock().iter().map(|(_, command)| *command).collect()
    }

    /// Commands with their emission instants
    #[must_use]
    pub fn entries(&self) -> Vec<(Instant, ActuatorCommand)> {
        self.log.lock().clone()
    }

    /// Number of recorded commands
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Drop all recorded commands
    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl Actuator for RecordingActuator {
    fn send_velocity(&self, linear: f64, angular: f64) {
        self.record(ActuatorCommand::Velocity { linear, angular });
    }

    fn send_speech(&self, clip: SoundClip) {
        self.record(ActuatorCommand::Speech { clip });
    }

    fn send(&self, command: &ActuatorCommand) {
        self.record(*command);
    }
}

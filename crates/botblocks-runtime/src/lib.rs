//! Botblocks Runtime - timed execution of block programs
//!
//! Turns a [`botblocks_program::ProgramTree`] into an ordered stream of
//! actuator commands separated by real-time holds:
//! - [`Actuator`] trait and adapters for a host transport
//! - [`Schedule`]: lazy, repeat-expanded step cursor over a snapshot
//! - [`Interpreter`]: single active run, snapshot isolation, cancellation
//! - [`Session`]: one live tree bound to one interpreter
//!
//! # Example
//!
//! ```rust,no_run
//! use botblocks_program::prelude::*;
//! use botblocks_runtime::{Interpreter, TracingActuator};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = ProgramTree::new().insert(Container::Root, Palette::mint(Block::Forward), None)?;
//!
//! let interpreter = Interpreter::new(Arc::new(TracingActuator));
//! let handle = interpreter.run(&tree)?;
//! let report = handle.wait().await?;
//! println!("{:?} after {:?}", report.outcome, report.elapsed);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod actuator;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod payload;
pub mod schedule;
pub mod session;

pub use actuator::{Actuator, ActuatorCommand, ChannelActuator, RecordingActuator, TracingActuator};
pub use config::MotionConfig;
pub use error::{ConfigError, RunError, SessionError};
pub use interpreter::{Interpreter, RunHandle, RunId, RunOutcome, RunReport, RunState};
pub use payload::{OutboundMessage, VelocityPayload, SPEECH_TOPIC, VELOCITY_TOPIC};
pub use schedule::{Action, Schedule, Step, MOVE_STEP, SOUND_SETTLE, TURN_STEP, WAIT_STEP};
pub use session::Session;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

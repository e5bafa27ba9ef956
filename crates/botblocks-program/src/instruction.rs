//! Instruction data model
//!
//! An instruction is one typed step of a program. Every kind except
//! `Sound` carries a single non-negative magnitude whose unit depends on
//! the kind: steps (Move), degrees (Turn), seconds (Wait), iterations
//! (Repeat). Only `Repeat` instructions own children; the children live
//! in the [`ProgramTree`](crate::ProgramTree) arena, not in the value.

use crate::error::UnknownClip;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use ulid::Ulid;

/// Allowed step counts for `Move`
pub const MOVE_STEPS: RangeInclusive<u32> = 0..=100;
/// Allowed degrees for `Turn`
pub const TURN_DEGREES: RangeInclusive<u32> = 1..=360;
/// Allowed seconds for `Wait`
pub const WAIT_SECONDS: RangeInclusive<u32> = 1..=60;
/// Allowed iteration counts for `Repeat`
pub const REPEAT_TIMES: RangeInclusive<u32> = 1..=100;

/// Unique instruction identifier (ULID, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstructionId(pub Ulid);

impl InstructionId {
    /// Mint a fresh instruction ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for InstructionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstructionId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self)
    }
}

/// Linear direction of a `Move`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    /// Drive forward (positive linear speed)
    #[default]
    Forward,
    /// Drive backward (negative linear speed)
    Backward,
}

impl MoveDirection {
    /// Sign applied to the linear speed
    #[inline]
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }
}

/// Rotational direction of a `Turn`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnDirection {
    /// Counter-clockwise (positive angular speed)
    #[default]
    Left,
    /// Clockwise (negative angular speed)
    Right,
}

impl TurnDirection {
    /// Sign applied to the angular speed
    #[inline]
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
        }
    }
}

/// Sound clips the robot can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SoundClip {
    /// Cat meow
    #[default]
    #[serde(rename = "meow")]
    Meow,
    /// "Bruh"
    #[serde(rename = "bruh")]
    Bruh,
    /// "Another one"
    #[serde(rename = "anotherone")]
    AnotherOne,
    /// "I just wanna rock"
    #[serde(rename = "rockLMFAO")]
    Rock,
}

impl SoundClip {
    /// Every clip, in palette order
    pub const ALL: [SoundClip; 4] = [Self::Meow, Self::Bruh, Self::AnotherOne, Self::Rock];

    /// Name sent to the speech actuator
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Meow => "meow",
            Self::Bruh => "bruh",
            Self::AnotherOne => "anotherone",
            Self::Rock => "rockLMFAO",
        }
    }
}

impl fmt::Display for SoundClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundClip {
    type Err = UnknownClip;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|clip| clip.as_str() == s)
            .ok_or_else(|| UnknownClip(s.to_string()))
    }
}

/// Instruction kind together with its parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InstructionKind {
    /// Drive for `steps` move-steps
    Move {
        /// Direction of travel
        direction: MoveDirection,
        /// Number of steps
        steps: u32,
    },
    /// Rotate in place for `degrees` turn-steps
    Turn {
        /// Direction of rotation
        direction: TurnDirection,
        /// Rotation amount
        degrees: u32,
    },
    /// Play a sound clip
    Sound {
        /// Clip to play
        clip: SoundClip,
    },
    /// Do nothing for `seconds`
    Wait {
        /// Hold length
        seconds: u32,
    },
    /// Run the children `times` times
    Repeat {
        /// Iteration count
        times: u32,
    },
}

impl InstructionKind {
    /// Short kind label, used in logs
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Turn { .. } => "turn",
            Self::Sound { .. } => "sound",
            Self::Wait { .. } => "wait",
            Self::Repeat { .. } => "repeat",
        }
    }

    /// Whether this kind owns a child sequence
    #[inline]
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Repeat { .. })
    }

    /// The magnitude parameter (`None` for `Sound`)
    #[must_use]
    pub fn magnitude(&self) -> Option<u32> {
        match *self {
            Self::Move { steps, .. } => Some(steps),
            Self::Turn { degrees, .. } => Some(degrees),
            Self::Wait { seconds } => Some(seconds),
            Self::Repeat { times } => Some(times),
            Self::Sound { .. } => None,
        }
    }

    /// Replace the magnitude, clamped to the kind's bounds
    ///
    /// Returns `None` for `Sound`, which has no magnitude.
    #[must_use]
    pub fn with_magnitude(self, value: u32) -> Option<Self> {
        let kind = match self {
            Self::Move { direction, .. } => Self::Move {
                direction,
                steps: value,
            },
            Self::Turn { direction, .. } => Self::Turn {
                direction,
                degrees: value,
            },
            Self::Wait { .. } => Self::Wait { seconds: value },
            Self::Repeat { .. } => Self::Repeat { times: value },
            Self::Sound { .. } => return None,
        };
        Some(kind.clamped())
    }

    /// Clamp the magnitude into the kind's bounds
    #[must_use]
    pub fn clamped(self) -> Self {
        fn clamp(value: u32, range: &RangeInclusive<u32>) -> u32 {
            value.clamp(*range.start(), *range.end())
        }

        match self {
            Self::Move { direction, steps } => Self::Move {
                direction,
                steps: clamp(steps, &MOVE_STEPS),
            },
            Self::Turn { direction, degrees } => Self::Turn {
                direction,
                degrees: clamp(degrees, &TURN_DEGREES),
            },
            Self::Wait { seconds } => Self::Wait {
                seconds: clamp(seconds, &WAIT_SECONDS),
            },
            Self::Repeat { times } => Self::Repeat {
                times: clamp(times, &REPEAT_TIMES),
            },
            sound @ Self::Sound { .. } => sound,
        }
    }
}

/// A single program step with a stable identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    id: InstructionId,
    kind: InstructionKind,
}

impl Instruction {
    /// Create an instruction with a freshly minted id
    #[inline]
    #[must_use]
    pub fn new(kind: InstructionKind) -> Self {
        Self::with_id(InstructionId::new(), kind)
    }

    /// Create an instruction with a caller-supplied id
    ///
    /// Used when the host already minted the id (e.g. a drag event).
    #[inline]
    #[must_use]
    pub fn with_id(id: InstructionId, kind: InstructionKind) -> Self {
        Self { id, kind }
    }

    /// Instruction id
    #[inline]
    #[must_use]
    pub fn id(&self) -> InstructionId {
        self.id
    }

    /// Instruction kind and parameter
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &InstructionKind {
        &self.kind
    }

    pub(crate) fn set_kind(&mut self, kind: InstructionKind) {
        self.kind = kind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = InstructionId::new();
        let b = InstructionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn id_display_round_trips() {
        let id = InstructionId::new();
        let parsed: InstructionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn clamp_bounds_per_kind() {
        let turn = InstructionKind::Turn {
            direction: TurnDirection::Left,
            degrees: 0,
        };
        assert_eq!(turn.clamped().magnitude(), Some(1));

        let turn = turn.with_magnitude(1000).unwrap();
        assert_eq!(turn.magnitude(), Some(360));

        let wait = InstructionKind::Wait { seconds: 0 }.clamped();
        assert_eq!(wait.magnitude(), Some(1));

        let repeat = InstructionKind::Repeat { times: 0 }.clamped();
        assert_eq!(repeat.magnitude(), Some(1));

        // Move may be zero
        let mv = InstructionKind::Move {
            direction: MoveDirection::Forward,
            steps: 0,
        };
        assert_eq!(mv.clamped().magnitude(), Some(0));
        assert_eq!(mv.with_magnitude(101).unwrap().magnitude(), Some(100));
    }

    #[test]
    fn sound_has_no_magnitude() {
        let sound = InstructionKind::Sound {
            clip: SoundClip::Bruh,
        };
        assert_eq!(sound.magnitude(), None);
        assert!(sound.with_magnitude(5).is_none());
        assert_eq!(sound.clamped(), sound);
    }

    #[test]
    fn only_repeat_is_container() {
        assert!(InstructionKind::Repeat { times: 2 }.is_container());
        assert!(!InstructionKind::Wait { seconds: 2 }.is_container());
    }

    #[test]
    fn clip_names_match_speech_payloads() {
        assert_eq!(SoundClip::Rock.as_str(), "rockLMFAO");
        assert_eq!("anotherone".parse::<SoundClip>(), Ok(SoundClip::AnotherOne));
        assert!("purr".parse::<SoundClip>().is_err());

        let json = serde_json::to_string(&SoundClip::Rock).unwrap();
        assert_eq!(json, "\"rockLMFAO\"");
    }

    #[test]
    fn direction_signs() {
        assert_eq!(MoveDirection::Forward.sign(), 1.0);
        assert_eq!(MoveDirection::Backward.sign(), -1.0);
        assert_eq!(TurnDirection::Left.sign(), 1.0);
        assert_eq!(TurnDirection::Right.sign(), -1.0);
    }
}

//! Block palette
//!
//! The palette is the fixed set of blocks an operator drags onto the
//! canvas. Minting a block creates a fresh instruction with the palette
//! default for its kind.

use crate::instruction::{Instruction, InstructionKind, MoveDirection, SoundClip, TurnDirection};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default steps for a new `Move`
pub const DEFAULT_MOVE_STEPS: u32 = 1;
/// Default degrees for a new `Turn`
pub const DEFAULT_TURN_DEGREES: u32 = 15;
/// Default seconds for a new `Wait`
pub const DEFAULT_WAIT_SECONDS: u32 = 1;
/// Default iterations for a new `Repeat`
pub const DEFAULT_REPEAT_TIMES: u32 = 2;

/// A palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Block {
    /// Move forward
    Forward,
    /// Move backward
    Backward,
    /// Turn left
    Left,
    /// Turn right
    Right,
    /// Play a sound
    Sound,
    /// Wait
    Wait,
    /// Repeat container
    Repeat,
}

impl Block {
    /// Every block, in palette order
    pub const ALL: [Block; 7] = [
        Self::Forward,
        Self::Backward,
        Self::Left,
        Self::Right,
        Self::Sound,
        Self::Wait,
        Self::Repeat,
    ];

    /// Palette identifier
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Left => "left",
            Self::Right => "right",
            Self::Sound => "sound",
            Self::Wait => "wait",
            Self::Repeat => "repeat",
        }
    }

    /// Instruction kind with the palette default parameter
    #[must_use]
    pub fn default_kind(self) -> InstructionKind {
        match self {
            Self::Forward => InstructionKind::Move {
                direction: MoveDirection::Forward,
                steps: DEFAULT_MOVE_STEPS,
            },
            Self::Backward => InstructionKind::Move {
                direction: MoveDirection::Backward,
                steps: DEFAULT_MOVE_STEPS,
            },
            Self::Left => InstructionKind::Turn {
                direction: TurnDirection::Left,
                degrees: DEFAULT_TURN_DEGREES,
            },
            Self::Right => InstructionKind::Turn {
                direction: TurnDirection::Right,
                degrees: DEFAULT_TURN_DEGREES,
            },
            Self::Sound => InstructionKind::Sound {
                clip: SoundClip::default(),
            },
            Self::Wait => InstructionKind::Wait {
                seconds: DEFAULT_WAIT_SECONDS,
            },
            Self::Repeat => InstructionKind::Repeat {
                times: DEFAULT_REPEAT_TIMES,
            },
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Block {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|block| block.as_str() == s)
            .ok_or_else(|| format!("unknown block: {s}"))
    }
}

/// Instruction factory for palette blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct Palette;

impl Palette {
    /// Mint a new instruction for `block` with a fresh id
    #[must_use]
    pub fn mint(block: Block) -> Instruction {
        Instruction::new(block.default_kind())
    }
}

//! Botblocks Program - instruction tree model and editor
//!
//! A program is an ordered, arbitrarily nested tree of typed robot
//! instructions. This crate provides:
//! - The instruction data model (move, turn, sound, wait, repeat)
//! - An arena-backed, persistent program tree addressed by stable ids
//! - The tree editor: insert, delete, move, and parameter updates that
//!   return a new tree value and keep the tree well-formed
//! - A seeded edit simulator for invariant checking
//!
//! # Example
//!
//! ```rust
//! use botblocks_program::prelude::*;
//!
//! # fn example() -> Result<(), EditError> {
//! let tree = ProgramTree::new();
//! let repeat = Instruction::new(InstructionKind::Repeat { times: 3 });
//! let wait = Instruction::new(InstructionKind::Wait { seconds: 1 });
//!
//! let tree = tree
//!     .insert(Container::Root, repeat.clone(), None)?
//!     .insert(Container::Repeat(repeat.id()), wait, None)?;
//!
//! assert_eq!(tree.len(), 2);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(unreachable_pub)]

pub mod editor;
pub mod error;
pub mod instruction;
pub mod palette;
pub mod test_harness;
pub mod tree;

pub use editor::EditOp;
pub use error::{EditError, TreeViolation};
pub use instruction::{
    Instruction, InstructionId, InstructionKind, MoveDirection, SoundClip, TurnDirection,
};
pub use palette::{Block, Palette};
pub use tree::{Container, Located, ProgramTree};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and editing programs
    pub use crate::{
        Block, Container, EditError, EditOp, Instruction, InstructionId, InstructionKind,
        MoveDirection, Palette, ProgramTree, SoundClip, TurnDirection,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

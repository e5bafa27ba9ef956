//! Error types for program editing
//!
//! Edit errors are local and recoverable: the tree is left unchanged and
//! the caller decides whether to retry, discard, or surface the error.
//! Stale or duplicated UI events (inserting an existing id, deleting an
//! absent id) are not errors at all; they succeed as no-ops.

use crate::instruction::InstructionId;
use crate::tree::Container;

/// Tree edit errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// Target container is absent or not a `Repeat`
    #[error("container not found: {0}")]
    ContainerNotFound(Container),

    /// Move would nest an instruction inside its own subtree
    #[error("cannot move {instruction} into its own subtree at {target}")]
    CycleRejected {
        /// Instruction being moved
        instruction: InstructionId,
        /// Requested container
        target: InstructionId,
    },
}

/// Structural defects found by [`ProgramTree::validate`](crate::ProgramTree::validate)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeViolation {
    /// An id is listed in more than one sequence
    #[error("instruction {0} appears more than once")]
    Duplicated(InstructionId),

    /// A sequence lists an id with no arena entry
    #[error("sequence references missing instruction {0}")]
    Dangling(InstructionId),

    /// An arena entry is not reachable from the root
    #[error("instruction {0} is not reachable from the root")]
    Orphaned(InstructionId),

    /// Stored parent link disagrees with the sequence that lists the id
    #[error("parent link of {0} is inconsistent")]
    ParentMismatch(InstructionId),

    /// Child list presence disagrees with the kind (only `Repeat` owns one)
    #[error("child list of {0} does not match its kind")]
    ContainerShape(InstructionId),
}

/// Unknown sound clip name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sound clip: {0}")]
pub struct UnknownClip(pub String);

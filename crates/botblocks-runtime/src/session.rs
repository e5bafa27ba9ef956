//! Editing session
//!
//! A [`Session`] owns one live program tree and one interpreter. Edits
//! replace the live tree atomically; a run sees the tree as it was when
//! `run` was called.

use crate::actuator::Actuator;
use crate::config::MotionConfig;
use crate::error::SessionError;
use crate::interpreter::{Interpreter, RunHandle, RunId, RunState};
use botblocks_program::{EditOp, ProgramTree};
use parking_lot::RwLock;
use std::sync::Arc;

/// Live tree plus its interpreter
#[derive(Debug)]
pub struct Session {
    tree: RwLock<ProgramTree>,
    interpreter: Interpreter,
}

impl Session {
    /// Create a session with an empty tree
    #[must_use]
    pub fn new(actuator: Arc<dyn Actuator>, motion: MotionConfig) -> Self {
        Self::with_interpreter(Interpreter::with_config(actuator, motion))
    }

    /// Create a session around an existing interpreter
    #[must_use]
    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Self {
            tree: RwLock::new(ProgramTree::new()),
            interpreter,
        }
    }

    /// Apply an edit to the live tree and return the new tree
    ///
    /// # Errors
    /// Returns [`SessionError::Edit`] if the edit is rejected; the live
    /// tree is left as it was.
    pub fn edit(&self, op: &EditOp) -> Result<ProgramTree, SessionError> {
        let mut tree = self.tree.write();
        let next = tree.apply(op)?;
        *tree = next.clone();
        Ok(next)
    }

    /// Snapshot of the live tree
    #[must_use]
    pub fn tree(&self) -> ProgramTree {
        self.tree.read().clone()
    }

    /// Run a snapshot of the live tree
    ///
    /// # Errors
    /// Returns [`SessionError::Run`] if a run is already active.
    pub fn run(&self) -> Result<RunHandle, SessionError> {
        let snapshot = self.tree();
        Ok(self.interpreter.run(&snapshot)?)
    }

    /// Cancel the active run, if any
    pub fn cancel(&self) -> Option<RunId> {
        self.interpreter.cancel_active()
    }

    /// Reset the live tree to empty
    pub fn clear(&self) {
        *self.tree.write() = ProgramTree::new();
        tracing::debug!("Session tree cleared");
    }

    /// Interpreter state
    #[must_use]
    pub fn state(&self) -> RunState {
        self.interpreter.state()
    }

    /// Underlying interpreter
    #[inline]
    #[must_use]
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }
}

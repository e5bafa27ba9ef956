//! Interpreter
//!
//! Runs a program snapshot as a timed command stream on a tokio task.
//!
//! - At most one run is active per interpreter; a second `run` is refused
//!   with [`RunError::RunAlreadyActive`]
//! - The run owns a private snapshot, so edits after `run` never reach it
//! - Cancellation is observed before every step and during every hold,
//!   and always ends with exactly one `Stop`

use crate::actuator::{Actuator, ActuatorCommand};
use crate::config::MotionConfig;
use crate::error::RunError;
use crate::schedule::{Action, Schedule};
use botblocks_program::{InstructionId, ProgramTree};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Unique identifier for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interpreter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run in flight
    Idle,
    /// A run is in flight
    Running(RunId),
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Every step was performed
    Completed,
    /// Cancelled before the end
    Cancelled,
}

/// Summary delivered when a run returns to idle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Run this report is for
    pub run_id: RunId,
    /// How the run ended
    pub outcome: RunOutcome,
    /// Commands sent, including the final stop of a cancelled run
    pub commands_emitted: usize,
    /// Time from start to idle
    pub elapsed: Duration,
    /// Instruction executing, or next up, when cancellation was observed
    pub interrupted_at: Option<InstructionId>,
}

#[derive(Debug)]
struct ActiveRun {
    id: RunId,
    cancel: Arc<watch::Sender<bool>>,
}

/// Handle to an in-flight or finished run
#[derive(Debug, Clone)]
pub struct RunHandle {
    id: RunId,
    cancel: Arc<watch::Sender<bool>>,
    report: watch::Receiver<Option<RunReport>>,
}

impl RunHandle {
    /// Run ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> RunId {
        self.id
    }

    /// Request cancellation; no effect once finished
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Whether the run has reached idle
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.report.borrow().is_some()
    }

    /// Wait for the run to finish
    ///
    /// # Errors
    /// Returns [`RunError::Aborted`] if the run task was dropped before
    /// reporting, e.g. because the runtime shut down.
    pub async fn wait(&self) -> Result<RunReport, RunError> {
        let mut report = self.report.clone();
        loop {
            let current = report.borrow_and_update().clone();
            if let Some(done) = current {
                return Ok(done);
            }
            if report.changed().await.is_err() {
                let last = report.borrow().clone();
                return last.ok_or(RunError::Aborted(self.id));
            }
        }
    }
}

/// Single-run program interpreter
pub struct Interpreter {
    actuator: Arc<dyn Actuator>,
    motion: MotionConfig,
    active: Arc<Mutex<Option<ActiveRun>>>,
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("motion", &self.motion)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Interpreter {
    /// Create an interpreter with default motion speeds
    #[must_use]
    pub fn new(actuator: Arc<dyn Actuator>) -> Self {
        Self::with_config(actuator, MotionConfig::default())
    }

    /// Create an interpreter with custom motion speeds
    #[must_use]
    pub fn with_config(actuator: Arc<dyn Actuator>, motion: MotionConfig) -> Self {
        Self {
            actuator,
            motion,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Motion speeds used for velocity commands
    #[inline]
    #[must_use]
    pub fn motion(&self) -> &MotionConfig {
        &self.motion
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> RunState {
        match self.active.lock().as_ref() {
            Some(run) => RunState::Running(run.id),
            None => RunState::Idle,
        }
    }

    /// Whether a run is in flight
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state(), RunState::Running(_))
    }

    /// Start a run over a snapshot of `tree`
    ///
    /// # Errors
    /// - [`RunError::RunAlreadyActive`] if a run is in flight; that run is
    ///   unaffected
    /// - [`RunError::NoRuntime`] outside a tokio runtime
    pub fn run(&self, tree: &ProgramTree) -> Result<RunHandle, RunError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| RunError::NoRuntime)?;

        let mut active = self.active.lock();
        if let Some(run) = active.as_ref() {
            tracing::warn!("Refusing run: {} is still active", run.id);
            return Err(RunError::RunAlreadyActive(run.id));
        }

        let id = RunId::new();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let cancel_tx = Arc::new(cancel_tx);
        let (report_tx, report_rx) = watch::channel(None);
        *active = Some(ActiveRun {
            id,
            cancel: Arc::clone(&cancel_tx),
        });
        drop(active);

        let schedule = Schedule::new(tree, self.motion);
        tracing::info!(
            "Run {} started: {} instructions, {} commands planned",
            id,
            tree.len(),
            schedule.command_count()
        );

        let span = tracing::info_span!("run", run_id = %id);
        let task = drive(
            id,
            schedule,
            Arc::clone(&self.actuator),
            cancel_rx,
            Arc::clone(&self.active),
            report_tx,
        );
        runtime.spawn(task.instrument(span));

        Ok(RunHandle {
            id,
            cancel: cancel_tx,
            report: report_rx,
        })
    }

    /// Cancel the run behind `handle` if it is this interpreter's active run
    ///
    /// Returns whether a cancellation was requested.
    pub fn cancel(&self, handle: &RunHandle) -> bool {
        match self.active.lock().as_ref() {
            Some(run) if run.id == handle.id => {
                run.cancel.send_replace(true);
                true
            }
            _ => false,
        }
    }

    /// Cancel whatever run is active
    pub fn cancel_active(&self) -> Option<RunId> {
        self.active.lock().as_ref().map(|run| {
            run.cancel.send_replace(true);
            run.id
        })
    }
}

/// Resolves once cancellation is requested; pends forever if nobody can
/// request it any more
async fn cancellation(cancel: &mut watch::Receiver<bool>) {
    loop {
        let requested = *cancel.borrow_and_update();
        if requested {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Owns the active-run slot for one run
///
/// Dropping the guard releases the slot even when the run task unwinds or
/// is dropped mid-hold. The slot is cleared before the report sender goes
/// away, so a waiter never observes a finished run while still `Running`.
struct ActiveSlot {
    id: RunId,
    active: Arc<Mutex<Option<ActiveRun>>>,
    report: watch::Sender<Option<RunReport>>,
}

impl ActiveSlot {
    fn release(&self) {
        let mut slot = self.active.lock();
        if slot.as_ref().is_some_and(|run| run.id == self.id) {
            *slot = None;
        }
    }

    fn finish(self, finished: RunReport) {
        self.release();
        self.report.send_replace(Some(finished));
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.release();
    }
}

async fn drive(
    id: RunId,
    schedule: Schedule,
    actuator: Arc<dyn Actuator>,
    mut cancel: watch::Receiver<bool>,
    active: Arc<Mutex<Option<ActiveRun>>>,
    report: watch::Sender<Option<RunReport>>,
) {
    let slot = ActiveSlot { id, active, report };
    let started = Instant::now();
    let mut commands_emitted = 0;
    let mut interrupted_at = None;

    for step in schedule {
        let requested = *cancel.borrow();
        if requested {
            interrupted_at = Some(step.instruction);
            break;
        }

        match step.action {
            Action::Emit(command) => {
                tracing::trace!("{} emit {}", step.instruction, command);
                actuator.send(&command);
                commands_emitted += 1;
            }
            Action::Hold(duration) if duration.is_zero() => {}
            Action::Hold(duration) => {
                tracing::trace!("{} hold {:?}", step.instruction, duration);
                tokio::select! {
                    () = tokio::time::sleep(duration) => {}
                    () = cancellation(&mut cancel) => {
                        interrupted_at = Some(step.instruction);
                        break;
                    }
                }
            }
        }
    }

    let outcome = if interrupted_at.is_some() {
        actuator.send(&ActuatorCommand::Stop);
        commands_emitted += 1;
        RunOutcome::Cancelled
    } else {
        RunOutcome::Completed
    };

    let finished = RunReport {
        run_id: id,
        outcome,
        commands_emitted,
        elapsed: started.elapsed(),
        interrupted_at,
    };
    tracing::info!(
        "Run {} {:?} after {:?} with {} commands",
        id,
        outcome,
        finished.elapsed,
        commands_emitted
    );

    slot.finish(finished);
}

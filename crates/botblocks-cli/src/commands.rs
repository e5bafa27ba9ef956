//! Subcommand implementations

use crate::program_file::ProgramFile;
use anyhow::Context;
use botblocks_program::test_harness::{run_simulator, SimulatorConfig, SimulatorReport};
use botblocks_program::ProgramTree;
use botblocks_runtime::{
    Actuator, ChannelActuator, Interpreter, MotionConfig, RunHandle, RunReport, Schedule,
    TracingActuator,
};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Options for `run`
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Optional TOML motion config
    pub config: Option<std::path::PathBuf>,
    /// Log commands instead of publishing them
    pub dry_run: bool,
}

/// Load the motion config, falling back to defaults
///
/// # Errors
/// Fails if an explicit config path cannot be loaded.
pub fn motion_config(path: Option<&Path>) -> anyhow::Result<MotionConfig> {
    match path {
        Some(path) => MotionConfig::load(path)
            .with_context(|| format!("loading motion config {}", path.display())),
        None => Ok(MotionConfig::default()),
    }
}

/// Load a program file into a tree
///
/// # Errors
/// Fails if the file cannot be read or assembled.
pub fn load_program(path: &Path) -> anyhow::Result<ProgramTree> {
    let file = ProgramFile::load(path).with_context(|| format!("loading {}", path.display()))?;
    Ok(file.to_tree()?)
}

/// Run a program, publishing to stdout as `topic payload` lines
///
/// Ctrl-C cancels the run, which still ends with a stop command.
///
/// # Errors
/// Fails on load errors or if the run cannot be started.
pub async fn run(path: &Path, options: &RunOptions) -> anyhow::Result<RunReport> {
    let tree = load_program(path)?;
    let motion = motion_config(options.config.as_deref())?;

    let actuator: Arc<dyn Actuator>;
    let mut drain = None;
    if options.dry_run {
        actuator = Arc::new(TracingActuator);
    } else {
        let (channel, mut rx) = ChannelActuator::new();
        drain = Some(tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                println!("{} {}", message.topic, message.payload);
            }
        }));
        actuator = Arc::new(channel);
    }

    let interpreter = Interpreter::with_config(actuator, motion);
    let handle = interpreter.run(&tree)?;
    let report = wait_or_interrupt(&handle, tokio::signal::ctrl_c()).await?;

    // Dropping the interpreter closes the channel so the drain finishes
    drop(interpreter);
    if let Some(drain) = drain {
        drain.await.context("draining actuator output")?;
    }
    Ok(report)
}

/// Wait for the run, cancelling it once `interrupt` resolves `Ok`
///
/// An `Err` from `interrupt` (no signal handler) disables cancellation.
async fn wait_or_interrupt<F>(handle: &RunHandle, interrupt: F) -> anyhow::Result<RunReport>
where
    F: Future<Output = std::io::Result<()>>,
{
    let report = tokio::select! {
        report = handle.wait() => report?,
        Ok(()) = interrupt => {
            tracing::info!("Interrupted, cancelling run {}", handle.id());
            handle.cancel();
            handle.wait().await?
        }
    };
    Ok(report)
}

/// Render the execution plan of a program
///
/// # Errors
/// Fails on load errors.
pub fn plan(path: &Path, config: Option<&Path>) -> anyhow::Result<String> {
    let tree = load_program(path)?;
    let motion = motion_config(config)?;
    Ok(render_plan(&tree, motion))
}

/// Plan text for an already loaded tree
#[must_use]
pub fn render_plan(tree: &ProgramTree, motion: MotionConfig) -> String {
    let schedule = Schedule::new(tree, motion);
    let mut out = String::new();

    for (depth, instruction) in tree.depth_first() {
        let indent = "  ".repeat(depth);
        let kind = instruction.kind();
        match kind.magnitude() {
            Some(value) => out.push_str(&format!("{indent}{} {value}\n", describe(kind))),
            None => out.push_str(&format!("{indent}{}\n", describe(kind))),
        }
    }

    out.push('\n');
    out.push_str(&format!("instructions: {}\n", tree.len()));
    out.push_str(&format!("commands:     {}\n", schedule.command_count()));
    out.push_str(&format!("duration:     {:?}\n", schedule.total_duration()));
    out
}

fn describe(kind: &botblocks_program::InstructionKind) -> String {
    use botblocks_program::InstructionKind;
    match kind {
        InstructionKind::Move { direction, .. } => format!("move {direction:?}").to_lowercase(),
        InstructionKind::Turn { direction, .. } => format!("turn {direction:?}").to_lowercase(),
        InstructionKind::Sound { clip } => format!("sound {clip}"),
        InstructionKind::Wait { .. } => "wait".to_string(),
        InstructionKind::Repeat { .. } => "repeat".to_string(),
    }
}

/// Run the seeded edit simulator
#[must_use]
pub fn simulate(config: SimulatorConfig) -> SimulatorReport {
    run_simulator(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use botblocks_runtime::{RecordingActuator, RunOutcome};
    use botblocks_test_utils::{build_program, forward, wait};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn failed_signal_install_does_not_cancel() {
        let recorder = Arc::new(RecordingActuator::new());
        let interpreter = Interpreter::new(recorder.clone());
        let tree = build_program(vec![wait(2)]);
        let handle = interpreter.run(&tree).unwrap();

        let interrupt = async { Err::<(), _>(std::io::Error::other("no signal handler")) };
        let report = wait_or_interrupt(&handle, interrupt).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert!(report.elapsed >= Duration::from_secs(2));
        assert!(recorder.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_cancels_with_stop() {
        let recorder = Arc::new(RecordingActuator::new());
        let interpreter = Interpreter::new(recorder.clone());
        let tree = build_program(vec![forward(10)]);
        let handle = interpreter.run(&tree).unwrap();

        let interrupt = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<(), std::io::Error>(())
        };
        let report = wait_or_interrupt(&handle, interrupt).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert!(report.elapsed < Duration::from_secs(2));
        assert_eq!(
            recorder.commands().last(),
            Some(&botblocks_runtime::ActuatorCommand::Stop)
        );
    }

    #[test]
    fn plan_text_lists_totals() {
        let tree = build_program(vec![forward(2), wait(1)]);
        let text = render_plan(&tree, MotionConfig::default());

        assert!(text.starts_with("move forward 2\nwait 1\n\n"));
        assert!(text.contains("instructions: 2\n"));
        assert!(text.contains("commands:     2\n"));
        assert!(text.ends_with("duration:     3s\n"));
    }
}

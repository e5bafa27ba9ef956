//! Execution schedule
//!
//! A [`Schedule`] walks a tree snapshot depth-first, left to right, and
//! yields the timed steps of a run one at a time. Repeats are expanded
//! lazily with an explicit frame stack, so a deeply nested program never
//! materializes its full expansion.
//!
//! Per-kind step expansion:
//! - Move: velocity, hold `steps * MOVE_STEP`, stop
//! - Turn: velocity, hold `degrees * TURN_STEP`, stop
//! - Sound: speech, hold `SOUND_SETTLE`
//! - Wait: hold `seconds * WAIT_STEP`
//! - Repeat: its children, `times` over

use crate::actuator::ActuatorCommand;
use crate::config::MotionConfig;
use botblocks_program::{Container, InstructionId, InstructionKind, ProgramTree};
use im::Vector;
use std::collections::VecDeque;
use std::time::Duration;

/// Hold per Move step
pub const MOVE_STEP: Duration = Duration::from_secs(1);
/// Hold per Wait second
pub const WAIT_STEP: Duration = Duration::from_secs(1);
/// Hold per Turn degree step
pub const TURN_STEP: Duration = Duration::from_millis(100);
/// Fixed hold after every Sound
pub const SOUND_SETTLE: Duration = Duration::from_secs(1);

/// What a step does
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Send a command to the actuator
    Emit(ActuatorCommand),
    /// Suspend for a duration
    Hold(Duration),
}

/// One timed step, tagged with the instruction it belongs to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Source instruction
    pub instruction: InstructionId,
    /// Action to perform
    pub action: Action,
}

#[derive(Debug, Clone)]
struct Frame {
    sequence: Vector<InstructionId>,
    position: usize,
    remaining: u32,
}

/// Lazy step cursor over a tree snapshot
#[derive(Debug, Clone)]
pub struct Schedule {
    tree: ProgramTree,
    motion: MotionConfig,
    frames: Vec<Frame>,
    pending: VecDeque<Step>,
}

impl Schedule {
    /// Start a schedule over a snapshot of `tree`
    #[must_use]
    pub fn new(tree: &ProgramTree, motion: MotionConfig) -> Self {
        let root = tree.root().clone();
        let frames = if root.is_empty() {
            Vec::new()
        } else {
            vec![Frame {
                sequence: root,
                position: 0,
                remaining: 1,
            }]
        };
        Self {
            tree: tree.clone(),
            motion,
            frames,
            pending: VecDeque::with_capacity(3),
        }
    }

    /// Snapshot this schedule runs over
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &ProgramTree {
        &self.tree
    }

    /// Total suspension time of a full run
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        cost(&self.tree, self.tree.root()).duration
    }

    /// Number of commands a full run emits
    #[must_use]
    pub fn command_count(&self) -> usize {
        cost(&self.tree, self.tree.root()).commands
    }

    fn expand(&mut self, id: InstructionId, kind: InstructionKind) {
        let emit = |command| Step {
            instruction: id,
            action: Action::Emit(command),
        };
        let hold = |duration| Step {
            instruction: id,
            action: Action::Hold(duration),
        };

        match kind {
            InstructionKind::Move { direction, steps } => {
                self.pending.push_back(emit(ActuatorCommand::Velocity {
                    linear: self.motion.linear_velocity(direction),
                    angular: 0.0,
                }));
                self.pending.push_back(hold(MOVE_STEP.saturating_mul(steps)));
                self.pending.push_back(emit(ActuatorCommand::Stop));
            }
            InstructionKind::Turn { direction, degrees } => {
                self.pending.push_back(emit(ActuatorCommand::Velocity {
                    linear: 0.0,
                    angular: self.motion.angular_velocity(direction),
                }));
                self.pending.push_back(hold(TURN_STEP.saturating_mul(degrees)));
                self.pending.push_back(emit(ActuatorCommand::Stop));
            }
            InstructionKind::Sound { clip } => {
                self.pending.push_back(emit(ActuatorCommand::Speech { clip }));
                self.pending.push_back(hold(SOUND_SETTLE));
            }
            InstructionKind::Wait { seconds } => {
                self.pending.push_back(hold(WAIT_STEP.saturating_mul(seconds)));
            }
            InstructionKind::Repeat { times } => {
                // Empty bodies and zero counts are skipped outright
                let body = self
                    .tree
                    .sequence(Container::Repeat(id))
                    .filter(|body| !body.is_empty() && times > 0)
                    .cloned();
                if let Some(sequence) = body {
                    self.frames.push(Frame {
                        sequence,
                        position: 0,
                        remaining: times,
                    });
                }
            }
        }
    }
}

impl Iterator for Schedule {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        loop {
            if let Some(step) = self.pending.pop_front() {
                return Some(step);
            }

            let frame = self.frames.last_mut()?;
            if frame.position >= frame.sequence.len() {
                frame.remaining -= 1;
                if frame.remaining == 0 {
                    self.frames.pop();
                } else {
                    frame.position = 0;
                }
                continue;
            }

            let id = frame.sequence[frame.position];
            frame.position += 1;
            if let Some(instruction) = self.tree.get(id) {
                let kind = *instruction.kind();
                self.expand(id, kind);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Cost {
    duration: Duration,
    commands: usize,
}

fn cost(tree: &ProgramTree, sequence: &Vector<InstructionId>) -> Cost {
    let mut total = Cost::default();
    for instruction in sequence.iter().filter_map(|id| tree.get(*id)) {
        let step = match *instruction.kind() {
            InstructionKind::Move { steps, .. } => Cost {
                duration: MOVE_STEP.saturating_mul(steps),
                commands: 2,
            },
            InstructionKind::Turn { degrees, .. } => Cost {
                duration: TURN_STEP.saturating_mul(degrees),
                commands: 2,
            },
            InstructionKind::Sound { .. } => Cost {
                duration: SOUND_SETTLE,
                commands: 1,
            },
            InstructionKind::Wait { seconds } => Cost {
                duration: WAIT_STEP.saturating_mul(seconds),
                commands: 0,
            },
            InstructionKind::Repeat { times } => {
                let body = tree
                    .sequence(Container::Repeat(instruction.id()))
                    .map(|body| cost(tree, body))
                    .unwrap_or_default();
                Cost {
                    duration: body.duration.saturating_mul(times),
                    commands: body.commands.saturating_mul(times as usize),
                }
            }
        };
        total.duration = total.duration.saturating_add(step.duration);
        total.commands = total.commands.saturating_add(step.commands);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use botblocks_program::{Instruction, MoveDirection, SoundClip, TurnDirection};
    use pretty_assertions::assert_eq;

    fn leaf(
        tree: ProgramTree,
        container: Container,
        kind: InstructionKind,
    ) -> (ProgramTree, InstructionId) {
        let instruction = Instruction::new(kind);
        let id = instruction.id();
        (tree.insert(container, instruction, None).unwrap(), id)
    }

    fn actions(tree: &ProgramTree) -> Vec<Action> {
        Schedule::new(tree, MotionConfig::default())
            .map(|step| step.action)
            .collect()
    }

    #[test]
    fn move_then_turn() {
        let (tree, _) = leaf(
            ProgramTree::new(),
            Container::Root,
            InstructionKind::Move {
                direction: MoveDirection::Forward,
                steps: 2,
            },
        );
        let (tree, _) = leaf(
            tree,
            Container::Root,
            InstructionKind::Turn {
                direction: TurnDirection::Left,
                degrees: 5,
            },
        );

        assert_eq!(
            actions(&tree),
            vec![
                Action::Emit(ActuatorCommand::Velocity {
                    linear: 0.5,
                    angular: 0.0
                }),
                Action::Hold(Duration::from_secs(2)),
                Action::Emit(ActuatorCommand::Stop),
                Action::Emit(ActuatorCommand::Velocity {
                    linear: 0.0,
                    angular: 45.0
                }),
                Action::Hold(Duration::from_millis(500)),
                Action::Emit(ActuatorCommand::Stop),
            ]
        );
    }

    #[test]
    fn nested_repeats_multiply() {
        let (tree, outer) = leaf(
            ProgramTree::new(),
            Container::Root,
            InstructionKind::Repeat { times: 3 },
        );
        let (tree, inner) = leaf(
            tree,
            Container::Repeat(outer),
            InstructionKind::Repeat { times: 2 },
        );
        let (tree, sound) = leaf(
            tree,
            Container::Repeat(inner),
            InstructionKind::Sound {
                clip: SoundClip::Rock,
            },
        );

        let steps: Vec<Step> = Schedule::new(&tree, MotionConfig::default()).collect();
        assert_eq!(steps.len(), 12);
        assert!(steps.iter().all(|step| step.instruction == sound));

        let schedule = Schedule::new(&tree, MotionConfig::default());
        assert_eq!(schedule.command_count(), 6);
        assert_eq!(schedule.total_duration(), Duration::from_secs(6));
    }

    #[test]
    fn empty_and_zero_containers_yield_nothing() {
        let (tree, _) = leaf(
            ProgramTree::new(),
            Container::Root,
            InstructionKind::Repeat { times: 5 },
        );
        assert!(actions(&tree).is_empty());
        assert!(actions(&ProgramTree::new()).is_empty());
    }

    #[test]
    fn sequential_repeat_bodies_are_ordered() {
        let (tree, repeat) = leaf(
            ProgramTree::new(),
            Container::Root,
            InstructionKind::Repeat { times: 2 },
        );
        let (tree, a) = leaf(tree, Container::Repeat(repeat), InstructionKind::Wait { seconds: 1 });
        let (tree, b) = leaf(tree, Container::Repeat(repeat), InstructionKind::Wait { seconds: 2 });
        let (tree, c) = leaf(tree, Container::Root, InstructionKind::Wait { seconds: 3 });

        let order: Vec<InstructionId> = Schedule::new(&tree, MotionConfig::default())
            .map(|step| step.instruction)
            .collect();
        assert_eq!(order, vec![a, b, a, b, c]);
    }

    #[test]
    fn zero_step_move_still_stops() {
        let (tree, _) = leaf(
            ProgramTree::new(),
            Container::Root,
            InstructionKind::Move {
                direction: MoveDirection::Backward,
                steps: 0,
            },
        );
        assert_eq!(
            actions(&tree),
            vec![
                Action::Emit(ActuatorCommand::Velocity {
                    linear: -0.35,
                    angular: 0.0
                }),
                Action::Hold(Duration::ZERO),
                Action::Emit(ActuatorCommand::Stop),
            ]
        );
    }
}

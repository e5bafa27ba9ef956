//! Edit Simulator - randomized editor invariant checking
//!
//! Replays a seeded stream of drag-and-drop style edits against a
//! [`ProgramTree`], including the duplicate and stale events a fast UI
//! produces, and checks after every step that:
//! - the tree is structurally valid (ids unique, no orphans, no cycles)
//! - rejected edits leave the tree unchanged
//! - duplicate inserts and repeated deletes are no-ops
//! - the instruction count matches the edit history

use crate::editor::EditOp;
use crate::error::EditError;
use crate::instruction::{InstructionId, SoundClip};
use crate::palette::{Block, Palette};
use crate::tree::{Container, ProgramTree};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of edit operations to apply
    pub total_operations: u64,
    /// Inserts are skipped once the tree reaches this size
    pub max_instructions: usize,
    /// Stop on the first violation
    pub stop_on_first_violation: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            total_operations: 10_000,
            max_instructions: 200,
            stop_on_first_violation: true,
        }
    }
}

/// Expected outcome of a generated edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedResult {
    /// Edit applies and changes the tree
    ShouldChange,
    /// Edit is absorbed and leaves the tree unchanged
    ShouldNoop,
    /// Edit fails and leaves the tree unchanged
    ShouldFail,
}

/// A violation detected during simulation
#[derive(Debug, Clone)]
pub enum Violation {
    /// Tree failed structural validation after an edit
    Malformed {
        /// Edit that produced the tree
        operation: EditOp,
        /// Validation message
        reason: String,
    },
    /// Edit outcome differs from the expected one
    UnexpectedOutcome {
        /// Edit applied
        operation: EditOp,
        /// What should have happened
        expected: ExpectedResult,
        /// What happened
        actual: String,
    },
    /// Instruction count drifted from the edit history
    CountMismatch {
        /// Edit applied
        operation: EditOp,
        /// Count derived from the history
        expected: usize,
        /// Count reported by the tree
        actual: usize,
    },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default)]
pub struct SimulatorStats {
    /// Edits applied
    pub operations: u64,
    /// Edits that changed the tree
    pub applied: u64,
    /// Edits absorbed as no-ops
    pub noops: u64,
    /// Edits rejected with `ContainerNotFound`
    pub container_not_found: u64,
    /// Edits rejected with `CycleRejected`
    pub cycles_rejected: u64,
    /// Largest tree seen
    pub peak_instructions: usize,
    /// Deepest nesting seen
    pub peak_depth: usize,
}

/// Final report from simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    /// Configuration used
    pub config: SimulatorConfig,
    /// Counters
    pub stats: SimulatorStats,
    /// Violations found
    pub violations: Vec<Violation>,
    /// Final tree
    pub tree: ProgramTree,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Edit Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Operations: {}\n", self.stats.operations));
        report.push_str(&format!("Applied: {}\n", self.stats.applied));
        report.push_str(&format!("No-ops: {}\n", self.stats.noops));
        report.push_str(&format!(
            "Rejected (container not found): {}\n",
            self.stats.container_not_found
        ));
        report.push_str(&format!(
            "Rejected (cycle): {}\n",
            self.stats.cycles_rejected
        ));
        report.push_str(&format!(
            "Peak instructions: {}\n",
            self.stats.peak_instructions
        ));
        report.push_str(&format!("Peak depth: {}\n", self.stats.peak_depth));
        report.push_str(&format!("Final instructions: {}\n", self.tree.len()));
        report.push_str(&format!("Violations: {}\n", self.violations.len()));

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}\n", i + 1, v));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

/// Run the edit simulator
#[must_use]
pub fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();
    let mut tree = ProgramTree::new();
    let mut last_op: Option<EditOp> = None;

    for _ in 0..config.total_operations {
        let operation = generate_operation(&mut rng, &tree, last_op.as_ref(), &config);
        let expected = classify_expected_result(&tree, &operation);
        let expected_len = expected_len(&tree, &operation, expected);

        stats.operations += 1;
        let outcome = tree.apply(&operation);

        let violation = match (&outcome, expected) {
            (Ok(next), ExpectedResult::ShouldChange) if *next != tree => None,
            (Ok(next), ExpectedResult::ShouldNoop) if *next == tree => None,
            (Err(_), ExpectedResult::ShouldFail) => None,
            (outcome, expected) => Some(Violation::UnexpectedOutcome {
                operation: operation.clone(),
                expected,
                actual: match outcome {
                    Ok(next) if *next == tree => "unchanged".to_string(),
                    Ok(_) => "changed".to_string(),
                    Err(e) => format!("{e:?}"),
                },
            }),
        };

        match &outcome {
            Ok(next) if *next == tree => stats.noops += 1,
            Ok(_) => stats.applied += 1,
            Err(EditError::ContainerNotFound(_)) => stats.container_not_found += 1,
            Err(EditError::CycleRejected { .. }) => stats.cycles_rejected += 1,
        }

        if let Ok(next) = outcome {
            tree = next;
        }

        let violation = violation
            .or_else(|| {
                tree.validate().err().map(|e| Violation::Malformed {
                    operation: operation.clone(),
                    reason: e.to_string(),
                })
            })
            .or_else(|| {
                (tree.len() != expected_len).then(|| Violation::CountMismatch {
                    operation: operation.clone(),
                    expected: expected_len,
                    actual: tree.len(),
                })
            });

        stats.peak_instructions = stats.peak_instructions.max(tree.len());
        stats.peak_depth = stats.peak_depth.max(max_depth(&tree));

        if let Some(v) = violation {
            violations.push(v);
            if config.stop_on_first_violation {
                break;
            }
        }
        last_op = Some(operation);
    }

    SimulatorReport {
        config,
        stats,
        violations,
        tree,
    }
}

/// Generate a random edit, biased towards replaying the previous one
fn generate_operation(
    rng: &mut StdRng,
    tree: &ProgramTree,
    last_op: Option<&EditOp>,
    config: &SimulatorConfig,
) -> EditOp {
    // Duplicate delivery of the previous drag event
    if let Some(op) = last_op {
        if rng.gen_bool(0.1) {
            return op.clone();
        }
    }

    let ids: Vec<InstructionId> = tree.depth_first().iter().map(|(_, i)| i.id()).collect();
    let random_id = |rng: &mut StdRng| -> InstructionId {
        // Occasionally reference an id that was never in the tree
        if ids.is_empty() || rng.gen_bool(0.05) {
            InstructionId::new()
        } else {
            ids[rng.gen_range(0..ids.len())]
        }
    };
    let random_container = |rng: &mut StdRng| -> Container {
        if ids.is_empty() || rng.gen_bool(0.4) {
            Container::Root
        } else {
            Container::Repeat(ids[rng.gen_range(0..ids.len())])
        }
    };

    match rng.gen_range(0..100) {
        0..=39 if tree.len() < config.max_instructions => {
            let block = Block::ALL[rng.gen_range(0..Block::ALL.len())];
            let index = rng.gen_bool(0.5).then(|| rng.gen_range(0..=4));
            EditOp::Insert {
                container: random_container(rng),
                instruction: Palette::mint(block),
                index,
            }
        }
        0..=59 => EditOp::Delete { id: random_id(rng) },
        60..=84 => EditOp::Move {
            id: random_id(rng),
            container: random_container(rng),
            index: rng.gen_range(0..=6),
        },
        85..=94 => EditOp::SetMagnitude {
            id: random_id(rng),
            value: rng.gen_range(0..=400),
        },
        95..=98 => EditOp::SetClip {
            id: random_id(rng),
            clip: SoundClip::ALL[rng.gen_range(0..SoundClip::ALL.len())],
        },
        _ => EditOp::Clear,
    }
}

/// Classify expected result for an operation against the current tree
fn classify_expected_result(tree: &ProgramTree, operation: &EditOp) -> ExpectedResult {
    let resolves = |container: Container| tree.sequence(container).is_some();

    match *operation {
        EditOp::Insert {
            container,
            instruction,
            ..
        } => {
            if tree.contains(instruction.id()) {
                ExpectedResult::ShouldNoop
            } else if resolves(container) {
                ExpectedResult::ShouldChange
            } else {
                ExpectedResult::ShouldFail
            }
        }
        EditOp::Delete { id } => {
            if tree.contains(id) {
                ExpectedResult::ShouldChange
            } else {
                ExpectedResult::ShouldNoop
            }
        }
        EditOp::Move {
            id,
            container,
            index,
        } => {
            let Some(located) = tree.find_path(id) else {
                return ExpectedResult::ShouldNoop;
            };
            if !resolves(container) {
                return ExpectedResult::ShouldFail;
            }
            if let Container::Repeat(target) = container {
                if tree.is_within(target, id) {
                    return ExpectedResult::ShouldFail;
                }
            }
            let last = located.sequence.len() - 1;
            let same_slot = located.container == container && index.min(last) == located.index;
            if same_slot {
                ExpectedResult::ShouldNoop
            } else {
                ExpectedResult::ShouldChange
            }
        }
        EditOp::SetMagnitude { id, value } => match tree.get(id) {
            Some(instruction) => {
                let kind = *instruction.kind();
                match kind.with_magnitude(value) {
                    Some(next) if next != kind => ExpectedResult::ShouldChange,
                    _ => ExpectedResult::ShouldNoop,
                }
            }
            None => ExpectedResult::ShouldNoop,
        },
        EditOp::SetClip { id, clip } => match tree.get(id).map(|i| *i.kind()) {
            Some(crate::InstructionKind::Sound { clip: current }) if current != clip => {
                ExpectedResult::ShouldChange
            }
            _ => ExpectedResult::ShouldNoop,
        },
        EditOp::Clear => {
            if tree.is_empty() {
                ExpectedResult::ShouldNoop
            } else {
                ExpectedResult::ShouldChange
            }
        }
    }
}

/// Instruction count after `operation`, derived from the edit history
fn expected_len(tree: &ProgramTree, operation: &EditOp, expected: ExpectedResult) -> usize {
    if expected != ExpectedResult::ShouldChange {
        return tree.len();
    }
    match *operation {
        EditOp::Insert { .. } => tree.len() + 1,
        EditOp::Delete { id } => tree.len() - tree.subtree_ids(id).len(),
        EditOp::Clear => 0,
        _ => tree.len(),
    }
}

fn max_depth(tree: &ProgramTree) -> usize {
    tree.depth_first()
        .iter()
        .map(|(depth, _)| depth + 1)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_run_passes() {
        let report = run_simulator(SimulatorConfig {
            total_operations: 2_000,
            ..Default::default()
        });
        assert!(report.passed(), "{}", report.generate_text());
        assert!(report.stats.applied > 0);
        assert!(report.stats.noops > 0);
    }

    #[test]
    fn same_seed_is_reproducible() {
        let config = SimulatorConfig {
            total_operations: 500,
            ..Default::default()
        };
        let a = run_simulator(config.clone());
        let b = run_simulator(config);
        assert_eq!(a.stats.applied, b.stats.applied);
        assert_eq!(a.stats.noops, b.stats.noops);
        assert_eq!(a.stats.cycles_rejected, b.stats.cycles_rejected);
    }

    #[test]
    fn report_text_mentions_result() {
        let report = run_simulator(SimulatorConfig {
            total_operations: 10,
            ..Default::default()
        });
        assert!(report.generate_text().contains("Result: PASS"));
    }
}

//! Program tree
//!
//! The tree is an arena of instructions keyed by id, with an explicit
//! parent link per node and an ordered child list per `Repeat`. Both
//! maps are persistent (`im`), so cloning a tree is O(1) and every edit
//! produces a new value that shares structure with the old one. A tree
//! value held by a caller is never mutated.

use crate::error::TreeViolation;
use crate::instruction::{Instruction, InstructionId};
use im::{HashMap, Vector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A sequence owner: the root, or a `Repeat` instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "container", content = "id", rename_all = "lowercase")]
pub enum Container {
    /// The top-level sequence
    Root,
    /// The child sequence of a `Repeat`
    Repeat(InstructionId),
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Repeat(id) => write!(f, "repeat:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Node {
    pub(crate) instruction: Instruction,
    pub(crate) parent: Container,
    /// `Some` iff the instruction is a `Repeat`
    pub(crate) children: Option<Vector<InstructionId>>,
}

impl Node {
    pub(crate) fn new(instruction: Instruction, parent: Container) -> Self {
        let children = instruction.kind().is_container().then(Vector::new);
        Self {
            instruction,
            parent,
            children,
        }
    }
}

/// Result of [`ProgramTree::find_path`]
#[derive(Debug, Clone, Copy)]
pub struct Located<'a> {
    /// The instruction found
    pub instruction: &'a Instruction,
    /// The container whose sequence holds it
    pub container: Container,
    /// Position within that sequence
    pub index: usize,
    /// The containing sequence itself
    pub sequence: &'a Vector<InstructionId>,
}

/// Ordered, nested program of instructions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramTree {
    pub(crate) nodes: HashMap<InstructionId, Node>,
    pub(crate) root: Vector<InstructionId>,
}

impl ProgramTree {
    /// Create an empty tree
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of instructions at every depth
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no instructions
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` occurs anywhere in the tree
    #[inline]
    #[must_use]
    pub fn contains(&self, id: InstructionId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Look up an instruction by id
    #[must_use]
    pub fn get(&self, id: InstructionId) -> Option<&Instruction> {
        self.nodes.get(&id).map(|node| &node.instruction)
    }

    /// Top-level sequence
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Vector<InstructionId> {
        &self.root
    }

    /// Sequence owned by `container`, if it resolves to a container
    #[must_use]
    pub fn sequence(&self, container: Container) -> Option<&Vector<InstructionId>> {
        match container {
            Container::Root => Some(&self.root),
            Container::Repeat(id) => self.nodes.get(&id)?.children.as_ref(),
        }
    }

    /// Instructions of a sequence, in order
    #[must_use]
    pub fn children(&self, container: Container) -> Vec<&Instruction> {
        self.sequence(container)
            .map(|seq| seq.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    /// Container holding `id`
    #[must_use]
    pub fn parent(&self, id: InstructionId) -> Option<Container> {
        self.nodes.get(&id).map(|node| node.parent)
    }

    /// Locate an instruction and the sequence that contains it
    #[must_use]
    pub fn find_path(&self, id: InstructionId) -> Option<Located<'_>> {
        let node = self.nodes.get(&id)?;
        let sequence = self.sequence(node.parent)?;
        let index = sequence.index_of(&id)?;
        Some(Located {
            instruction: &node.instruction,
            container: node.parent,
            index,
            sequence,
        })
    }

    /// Enclosing `Repeat` ids of `id`, innermost first
    #[must_use]
    pub fn ancestors(&self, id: InstructionId) -> Vec<InstructionId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(Container::Repeat(parent)) = current {
            out.push(parent);
            current = self.parent(parent);
        }
        out
    }

    /// Whether `candidate` is `id` itself or lies inside its subtree
    #[must_use]
    pub fn is_within(&self, candidate: InstructionId, id: InstructionId) -> bool {
        candidate == id || self.ancestors(candidate).contains(&id)
    }

    /// Pre-order walk yielding `(depth, instruction)`
    #[must_use]
    pub fn depth_first(&self) -> Vec<(usize, &Instruction)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<(usize, InstructionId)> =
            self.root.iter().rev().map(|id| (0, *id)).collect();

        while let Some((depth, id)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push((depth, &node.instruction));
            if let Some(children) = &node.children {
                stack.extend(children.iter().rev().map(|child| (depth + 1, *child)));
            }
        }
        out
    }

    /// Ids of `id` and everything below it
    pub(crate) fn subtree_ids(&self, id: InstructionId) -> Vec<InstructionId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(children) = self.nodes.get(&current).and_then(|n| n.children.as_ref()) {
                stack.extend(children.iter().copied());
            }
        }
        out
    }

    pub(crate) fn sequence_mut(
        &mut self,
        container: Container,
    ) -> Option<&mut Vector<InstructionId>> {
        match container {
            Container::Root => Some(&mut self.root),
            Container::Repeat(id) => self.nodes.get_mut(&id)?.children.as_mut(),
        }
    }

    /// Check the structural invariants
    ///
    /// Every arena entry must be listed exactly once, by the sequence its
    /// parent link names, and only `Repeat` nodes may own a sequence.
    ///
    /// # Errors
    /// Returns the first [`TreeViolation`] encountered.
    pub fn validate(&self) -> Result<(), TreeViolation> {
        let mut seen = HashSet::with_capacity(self.len());
        let mut stack: Vec<(Container, InstructionId)> =
            self.root.iter().map(|id| (Container::Root, *id)).collect();

        while let Some((container, id)) = stack.pop() {
            if !seen.insert(id) {
                return Err(TreeViolation::Duplicated(id));
            }
            let node = self.nodes.get(&id).ok_or(TreeViolation::Dangling(id))?;
            if node.parent != container {
                return Err(TreeViolation::ParentMismatch(id));
            }
            match (&node.children, node.instruction.kind().is_container()) {
                (Some(children), true) => {
                    stack.extend(children.iter().map(|c| (Container::Repeat(id), *c)));
                }
                (None, false) => {}
                (Some(_), false) | (None, true) => {
                    return Err(TreeViolation::ContainerShape(id));
                }
            }
        }

        if let Some(orphan) = self.nodes.keys().find(|id| !seen.contains(*id)) {
            return Err(TreeViolation::Orphaned(*orphan));
        }
        Ok(())
    }
}

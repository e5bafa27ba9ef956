//! Tree editor
//!
//! Identity-addressed edits over [`ProgramTree`]. Every operation takes
//! the tree by shared reference and returns a new tree; the input value
//! is never modified. Operations address instructions by global id, never
//! by position, so a stale drag coordinate cannot corrupt the tree.
//!
//! Duplicate and stale events are expected under fast dragging and are
//! absorbed as no-ops:
//! - `insert` of an id already in the tree
//! - `delete`, `move_to`, `set_magnitude`, `set_clip` of an absent id

use crate::error::EditError;
use crate::instruction::{Instruction, InstructionId, InstructionKind, SoundClip};
use crate::tree::{Container, Node, ProgramTree};
use serde::{Deserialize, Serialize};

/// An edit event produced by the UI collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    /// Insert a new instruction into a container
    Insert {
        /// Target container
        container: Container,
        /// Instruction to insert
        instruction: Instruction,
        /// Position, or append when `None`
        index: Option<usize>,
    },
    /// Remove an instruction and its subtree
    Delete {
        /// Instruction to remove
        id: InstructionId,
    },
    /// Reorder or reparent an instruction
    Move {
        /// Instruction to move
        id: InstructionId,
        /// Destination container
        container: Container,
        /// Position in the destination after detachment
        index: usize,
    },
    /// Replace the magnitude parameter
    SetMagnitude {
        /// Instruction to update
        id: InstructionId,
        /// New value (clamped)
        value: u32,
    },
    /// Replace the clip of a `Sound`
    SetClip {
        /// Instruction to update
        id: InstructionId,
        /// New clip
        clip: SoundClip,
    },
    /// Remove everything
    Clear,
}

impl ProgramTree {
    /// Insert a newly minted instruction into `container`
    ///
    /// Appends when `index` is `None`; an index past the end appends.
    /// The magnitude is clamped to the kind's bounds.
    ///
    /// # Errors
    /// - `EditError::ContainerNotFound` if `container` does not resolve
    ///   to a `Repeat` currently in the tree
    pub fn insert(
        &self,
        container: Container,
        instruction: Instruction,
        index: Option<usize>,
    ) -> Result<ProgramTree, EditError> {
        if self.contains(instruction.id()) {
            tracing::debug!("Ignoring duplicate insert of {}", instruction.id());
            return Ok(self.clone());
        }

        let mut next = self.clone();
        let sequence = next
            .sequence_mut(container)
            .ok_or(EditError::ContainerNotFound(container))?;
        let at = index.map_or(sequence.len(), |i| i.min(sequence.len()));
        sequence.insert(at, instruction.id());

        let mut instruction = instruction;
        let kind = instruction.kind().clamped();
        instruction.set_kind(kind);
        next.nodes
            .insert(instruction.id(), Node::new(instruction, container));

        tracing::debug!(
            "Inserted {} {} into {} at {}",
            instruction.kind().label(),
            instruction.id(),
            container,
            at
        );
        Ok(next)
    }

    /// Remove the instruction `id` and its whole subtree
    ///
    /// Siblings keep their order. Deleting an absent id returns the
    /// tree unchanged.
    #[must_use]
    pub fn delete(&self, id: InstructionId) -> ProgramTree {
        let Some(located) = self.find_path(id) else {
            tracing::debug!("Ignoring delete of absent {}", id);
            return self.clone();
        };
        let (container, index) = (located.container, located.index);

        let mut next = self.clone();
        if let Some(sequence) = next.sequence_mut(container) {
            sequence.remove(index);
        }
        let removed = self.subtree_ids(id);
        for gone in &removed {
            next.nodes.remove(gone);
        }

        tracing::debug!("Deleted {} ({} instructions) from {}", id, removed.len(), container);
        next
    }

    /// Detach `id` and reinsert it at `index` within `container`
    ///
    /// The index is interpreted after detachment; past the end appends.
    /// Moving an absent id returns the tree unchanged.
    ///
    /// # Errors
    /// - `EditError::ContainerNotFound` if `container` does not resolve
    ///   to a `Repeat` currently in the tree
    /// - `EditError::CycleRejected` if `container` is `id` or lies inside
    ///   its subtree
    pub fn move_to(
        &self,
        id: InstructionId,
        container: Container,
        index: usize,
    ) -> Result<ProgramTree, EditError> {
        let Some(located) = self.find_path(id) else {
            tracing::debug!("Ignoring move of absent {}", id);
            return Ok(self.clone());
        };
        if self.sequence(container).is_none() {
            return Err(EditError::ContainerNotFound(container));
        }
        if let Container::Repeat(target) = container {
            if self.is_within(target, id) {
                return Err(EditError::CycleRejected {
                    instruction: id,
                    target,
                });
            }
        }

        let (from, from_index) = (located.container, located.index);
        let mut next = self.clone();
        if let Some(sequence) = next.sequence_mut(from) {
            sequence.remove(from_index);
        }
        let sequence = next
            .sequence_mut(container)
            .ok_or(EditError::ContainerNotFound(container))?;
        let at = index.min(sequence.len());
        sequence.insert(at, id);
        if let Some(node) = next.nodes.get_mut(&id) {
            node.parent = container;
        }

        tracing::debug!("Moved {} from {} to {} at {}", id, from, container, at);
        Ok(next)
    }

    /// Replace the magnitude of `id`, clamped to its kind's bounds
    ///
    /// No-op for absent ids and for `Sound` instructions.
    #[must_use]
    pub fn set_magnitude(&self, id: InstructionId, value: u32) -> ProgramTree {
        self.update_kind(id, |kind| kind.with_magnitude(value))
    }

    /// Replace the clip of a `Sound` instruction
    ///
    /// No-op for absent ids and for non-`Sound` instructions.
    #[must_use]
    pub fn set_clip(&self, id: InstructionId, clip: SoundClip) -> ProgramTree {
        self.update_kind(id, |kind| match kind {
            InstructionKind::Sound { .. } => Some(InstructionKind::Sound { clip }),
            _ => None,
        })
    }

    /// The empty tree
    #[must_use]
    pub fn clear(&self) -> ProgramTree {
        tracing::debug!("Cleared {} instructions", self.len());
        ProgramTree::new()
    }

    /// Apply an [`EditOp`]
    ///
    /// # Errors
    /// Propagates the errors of [`insert`](Self::insert) and
    /// [`move_to`](Self::move_to).
    pub fn apply(&self, op: &EditOp) -> Result<ProgramTree, EditError> {
        match *op {
            EditOp::Insert {
                container,
                instruction,
                index,
            } => self.insert(container, instruction, index),
            EditOp::Delete { id } => Ok(self.delete(id)),
            EditOp::Move {
                id,
                container,
                index,
            } => self.move_to(id, container, index),
            EditOp::SetMagnitude { id, value } => Ok(self.set_magnitude(id, value)),
            EditOp::SetClip { id, clip } => Ok(self.set_clip(id, clip)),
            EditOp::Clear => Ok(self.clear()),
        }
    }

    fn update_kind(
        &self,
        id: InstructionId,
        f: impl FnOnce(InstructionKind) -> Option<InstructionKind>,
    ) -> ProgramTree {
        let Some(current) = self.get(id) else {
            return self.clone();
        };
        let Some(kind) = f(*current.kind()) else {
            return self.clone();
        };
        if kind == *current.kind() {
            return self.clone();
        }

        let mut next = self.clone();
        if let Some(node) = next.nodes.get_mut(&id) {
            node.instruction.set_kind(kind);
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{MoveDirection, TurnDirection};
    use pretty_assertions::assert_eq;

    fn wait(seconds: u32) -> Instruction {
        Instruction::new(InstructionKind::Wait { seconds })
    }

    fn repeat(times: u32) -> Instruction {
        Instruction::new(InstructionKind::Repeat { times })
    }

    fn sound(clip: SoundClip) -> Instruction {
        Instruction::new(InstructionKind::Sound { clip })
    }

    fn ids(tree: &ProgramTree, container: Container) -> Vec<InstructionId> {
        tree.sequence(container).unwrap().iter().copied().collect()
    }

    #[test]
    fn insert_appends_and_positions() {
        let (a, b, c) = (wait(1), wait(2), wait(3));
        let tree = ProgramTree::new()
            .insert(Container::Root, a, None)
            .unwrap()
            .insert(Container::Root, b, None)
            .unwrap()
            .insert(Container::Root, c, Some(1))
            .unwrap();

        assert_eq!(ids(&tree, Container::Root), vec![a.id(), c.id(), b.id()]);
    }

    #[test]
    fn insert_index_past_end_appends() {
        let (a, b) = (wait(1), wait(2));
        let tree = ProgramTree::new()
            .insert(Container::Root, a, None)
            .unwrap()
            .insert(Container::Root, b, Some(99))
            .unwrap();
        assert_eq!(ids(&tree, Container::Root), vec![a.id(), b.id()]);
    }

    #[test]
    fn insert_duplicate_id_is_noop() {
        let a = wait(1);
        let once = ProgramTree::new().insert(Container::Root, a, None).unwrap();
        let twice = once.insert(Container::Root, a, None).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn insert_duplicate_id_in_other_container_is_noop() {
        let r = repeat(2);
        let a = wait(1);
        let tree = ProgramTree::new()
            .insert(Container::Root, r, None)
            .unwrap()
            .insert(Container::Root, a, None)
            .unwrap();
        let again = tree.insert(Container::Repeat(r.id()), a, None).unwrap();
        assert_eq!(tree, again);
    }

    #[test]
    fn insert_into_missing_container_fails() {
        let ghost = InstructionId::new();
        let tree = ProgramTree::new();
        let result = tree.insert(Container::Repeat(ghost), wait(1), None);
        assert_eq!(result, Err(EditError::ContainerNotFound(Container::Repeat(ghost))));
    }

    #[test]
    fn insert_into_non_repeat_fails() {
        let leaf = wait(1);
        let tree = ProgramTree::new().insert(Container::Root, leaf, None).unwrap();
        let result = tree.insert(Container::Repeat(leaf.id()), wait(2), None);
        assert_eq!(result, Err(EditError::ContainerNotFound(Container::Repeat(leaf.id()))));
    }

    #[test]
    fn insert_clamps_magnitude() {
        let turn = Instruction::new(InstructionKind::Turn {
            direction: TurnDirection::Right,
            degrees: 0,
        });
        let tree = ProgramTree::new().insert(Container::Root, turn, None).unwrap();
        assert_eq!(tree.get(turn.id()).unwrap().kind().magnitude(), Some(1));
    }

    #[test]
    fn insert_leaves_input_untouched() {
        let original = ProgramTree::new().insert(Container::Root, wait(1), None).unwrap();
        let snapshot = original.clone();
        let _next = original.insert(Container::Root, wait(2), None).unwrap();
        assert_eq!(original, snapshot);
    }

    #[test]
    fn delete_nested_preserves_siblings() {
        let r = repeat(2);
        let (x, y, z) = (wait(1), wait(2), wait(3));
        let tree = ProgramTree::new()
            .insert(Container::Root, r, None)
            .unwrap()
            .insert(Container::Repeat(r.id()), x, None)
            .unwrap()
            .insert(Container::Repeat(r.id()), y, None)
            .unwrap()
            .insert(Container::Repeat(r.id()), z, None)
            .unwrap();

        let tree = tree.delete(y.id());
        assert_eq!(ids(&tree, Container::Repeat(r.id())), vec![x.id(), z.id()]);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn delete_repeat_drops_subtree() {
        let r = repeat(2);
        let x = wait(1);
        let tree = ProgramTree::new()
            .insert(Container::Root, r, None)
            .unwrap()
            .insert(Container::Repeat(r.id()), x, None)
            .unwrap();

        let tree = tree.delete(r.id());
        assert!(tree.is_empty());
        assert!(!tree.contains(x.id()));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn delete_is_idempotent() {
        let a = wait(1);
        let tree = ProgramTree::new()
            .insert(Container::Root, a, None)
            .unwrap()
            .insert(Container::Root, wait(2), None)
            .unwrap();
        let once = tree.delete(a.id());
        let twice = once.delete(a.id());
        assert_eq!(once, twice);
    }

    #[test]
    fn move_reorders_within_root() {
        let (a, b, c) = (wait(1), wait(2), wait(3));
        let tree = ProgramTree::new()
            .insert(Container::Root, a, None)
            .unwrap()
            .insert(Container::Root, b, None)
            .unwrap()
            .insert(Container::Root, c, None)
            .unwrap();

        let tree = tree.move_to(a.id(), Container::Root, 2).unwrap();
        assert_eq!(ids(&tree, Container::Root), vec![b.id(), c.id(), a.id()]);

        let tree = tree.move_to(a.id(), Container::Root, 0).unwrap();
        assert_eq!(ids(&tree, Container::Root), vec![a.id(), b.id(), c.id()]);
    }

    #[test]
    fn move_across_container_boundaries() {
        let r = repeat(2);
        let a = wait(1);
        let tree = ProgramTree::new()
            .insert(Container::Root, r, None)
            .unwrap()
            .insert(Container::Root, a, None)
            .unwrap();

        let inside = tree.move_to(a.id(), Container::Repeat(r.id()), 0).unwrap();
        assert_eq!(inside.parent(a.id()), Some(Container::Repeat(r.id())));
        assert_eq!(ids(&inside, Container::Root), vec![r.id()]);
        assert!(inside.validate().is_ok());

        let outside = inside.move_to(a.id(), Container::Root, 0).unwrap();
        assert_eq!(ids(&outside, Container::Root), vec![a.id(), r.id()]);
        assert!(outside.validate().is_ok());
    }

    #[test]
    fn move_into_own_subtree_is_rejected() {
        let outer = repeat(2);
        let inner = repeat(3);
        let tree = ProgramTree::new()
            .insert(Container::Root, outer, None)
            .unwrap()
            .insert(Container::Repeat(outer.id()), inner, None)
            .unwrap();

        let result = tree.move_to(outer.id(), Container::Repeat(inner.id()), 0);
        assert_eq!(
            result,
            Err(EditError::CycleRejected {
                instruction: outer.id(),
                target: inner.id(),
            })
        );

        let result = tree.move_to(outer.id(), Container::Repeat(outer.id()), 0);
        assert!(matches!(result, Err(EditError::CycleRejected { .. })));
    }

    #[test]
    fn move_to_missing_container_fails() {
        let a = wait(1);
        let ghost = InstructionId::new();
        let tree = ProgramTree::new().insert(Container::Root, a, None).unwrap();
        assert_eq!(
            tree.move_to(a.id(), Container::Repeat(ghost), 0),
            Err(EditError::ContainerNotFound(Container::Repeat(ghost)))
        );
    }

    #[test]
    fn move_absent_is_noop() {
        let tree = ProgramTree::new().insert(Container::Root, wait(1), None).unwrap();
        let next = tree.move_to(InstructionId::new(), Container::Root, 0).unwrap();
        assert_eq!(tree, next);
    }

    #[test]
    fn set_magnitude_on_nested_instruction() {
        let r = repeat(2);
        let mv = Instruction::new(InstructionKind::Move {
            direction: MoveDirection::Backward,
            steps: 1,
        });
        let tree = ProgramTree::new()
            .insert(Container::Root, r, None)
            .unwrap()
            .insert(Container::Repeat(r.id()), mv, None)
            .unwrap();

        let tree = tree.set_magnitude(mv.id(), 500);
        assert_eq!(
            *tree.get(mv.id()).unwrap().kind(),
            InstructionKind::Move {
                direction: MoveDirection::Backward,
                steps: 100,
            }
        );

        let tree = tree.set_magnitude(r.id(), 0);
        assert_eq!(tree.get(r.id()).unwrap().kind().magnitude(), Some(1));
        assert_eq!(tree.sequence(Container::Repeat(r.id())).unwrap().len(), 1);
    }

    #[test]
    fn set_magnitude_absent_or_sound_is_noop() {
        let s = sound(SoundClip::Meow);
        let tree = ProgramTree::new().insert(Container::Root, s, None).unwrap();
        assert_eq!(tree.set_magnitude(s.id(), 4), tree);
        assert_eq!(tree.set_magnitude(InstructionId::new(), 4), tree);
    }

    #[test]
    fn set_clip_only_touches_sound() {
        let r = repeat(2);
        let s = sound(SoundClip::Meow);
        let w = wait(1);
        let tree = ProgramTree::new()
            .insert(Container::Root, r, None)
            .unwrap()
            .insert(Container::Repeat(r.id()), s, None)
            .unwrap()
            .insert(Container::Root, w, None)
            .unwrap();

        let tree = tree.set_clip(s.id(), SoundClip::Bruh);
        assert_eq!(
            *tree.get(s.id()).unwrap().kind(),
            InstructionKind::Sound {
                clip: SoundClip::Bruh
            }
        );
        assert_eq!(tree.set_clip(w.id(), SoundClip::Rock), tree);
    }

    #[test]
    fn apply_dispatches_ops() {
        let r = repeat(2);
        let a = wait(1);
        let ops = [
            EditOp::Insert {
                container: Container::Root,
                instruction: r,
                index: None,
            },
            EditOp::Insert {
                container: Container::Root,
                instruction: a,
                index: None,
            },
            EditOp::Move {
                id: a.id(),
                container: Container::Repeat(r.id()),
                index: 0,
            },
            EditOp::SetMagnitude {
                id: a.id(),
                value: 7,
            },
        ];

        let tree = ops
            .iter()
            .try_fold(ProgramTree::new(), |tree, op| tree.apply(op))
            .unwrap();
        assert_eq!(tree.parent(a.id()), Some(Container::Repeat(r.id())));
        assert_eq!(tree.get(a.id()).unwrap().kind().magnitude(), Some(7));

        let cleared = tree.apply(&EditOp::Clear).unwrap();
        assert!(cleared.is_empty());
    }

    #[test]
    fn edit_op_json_shape() {
        let id = InstructionId::new();
        let op = EditOp::Delete { id };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "delete");
        let back: EditOp = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
    }
}

//! Testing utilities for Botblocks workspace
//!
//! Shared fixtures: a small declarative builder for nested programs.

#![allow(missing_docs)]

use botblocks_program::{
    Container, Instruction, InstructionId, InstructionKind, MoveDirection, ProgramTree, SoundClip,
    TurnDirection,
};

/// Declarative program fragment
#[derive(Debug, Clone)]
pub enum Fixture {
    Leaf(InstructionKind),
    Repeat(u32, Vec<Fixture>),
}

pub fn forward(steps: u32) -> Fixture {
    Fixture::Leaf(InstructionKind::Move {
        direction: MoveDirection::Forward,
        steps,
    })
}

pub fn backward(steps: u32) -> Fixture {
    Fixture::Leaf(InstructionKind::Move {
        direction: MoveDirection::Backward,
        steps,
    })
}

pub fn left(degrees: u32) -> Fixture {
    Fixture::Leaf(InstructionKind::Turn {
        direction: TurnDirection::Left,
        degrees,
    })
}

pub fn right(degrees: u32) -> Fixture {
    Fixture::Leaf(InstructionKind::Turn {
        direction: TurnDirection::Right,
        degrees,
    })
}

pub fn sound(clip: SoundClip) -> Fixture {
    Fixture::Leaf(InstructionKind::Sound { clip })
}

pub fn wait(seconds: u32) -> Fixture {
    Fixture::Leaf(InstructionKind::Wait { seconds })
}

pub fn repeat(times: u32, body: Vec<Fixture>) -> Fixture {
    Fixture::Repeat(times, body)
}

/// Build a tree from fixtures, panicking on any edit error
pub fn build_program(fixtures: Vec<Fixture>) -> ProgramTree {
    build_program_with_ids(fixtures).0
}

/// Build a tree and return the ids in pre-order
pub fn build_program_with_ids(fixtures: Vec<Fixture>) -> (ProgramTree, Vec<InstructionId>) {
    let mut tree = ProgramTree::new();
    let mut ids = Vec::new();
    for fixture in fixtures {
        tree = attach(tree, Container::Root, fixture, &mut ids);
    }
    (tree, ids)
}

fn attach(
    tree: ProgramTree,
    container: Container,
    fixture: Fixture,
    ids: &mut Vec<InstructionId>,
) -> ProgramTree {
    match fixture {
        Fixture::Leaf(kind) => {
            let instruction = Instruction::new(kind);
            ids.push(instruction.id());
            tree.insert(container, instruction, None).unwrap()
        }
        Fixture::Repeat(times, body) => {
            let instruction = Instruction::new(InstructionKind::Repeat { times });
            ids.push(instruction.id());
            let mut tree = tree.insert(container, instruction, None).unwrap();
            for child in body {
                tree = attach(tree, Container::Repeat(instruction.id()), child, ids);
            }
            tree
        }
    }
}

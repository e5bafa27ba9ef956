//! Program files
//!
//! A program file is a JSON document holding a nested instruction list:
//!
//! ```json
//! { "program": [
//!     { "type": "move", "direction": "forward", "steps": 2 },
//!     { "type": "repeat", "times": 3, "body": [ { "type": "wait", "seconds": 1 } ] }
//! ] }
//! ```
//!
//! Ids are not stored; loading mints fresh ones.

use botblocks_program::{
    Container, EditError, Instruction, InstructionKind, MoveDirection, ProgramTree, SoundClip,
    TurnDirection,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Program file errors
#[derive(Debug, thiserror::Error)]
pub enum ProgramFileError {
    /// File could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// File is not a valid program document
    #[error("invalid program file: {0}")]
    Json(#[from] serde_json::Error),

    /// Program could not be assembled into a tree
    #[error("invalid program: {0}")]
    Edit(#[from] EditError),
}

/// One entry of a program file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    /// Drive forward or backward
    Move {
        /// Direction
        direction: MoveDirection,
        /// Steps
        steps: u32,
    },
    /// Rotate in place
    Turn {
        /// Direction
        direction: TurnDirection,
        /// Degrees
        degrees: u32,
    },
    /// Play a clip
    Sound {
        /// Clip
        clip: SoundClip,
    },
    /// Pause
    Wait {
        /// Seconds
        seconds: u32,
    },
    /// Repeat a body
    Repeat {
        /// Iterations
        times: u32,
        /// Nested entries
        #[serde(default)]
        body: Vec<Entry>,
    },
}

impl Entry {
    fn kind(&self) -> InstructionKind {
        match *self {
            Self::Move { direction, steps } => InstructionKind::Move { direction, steps },
            Self::Turn { direction, degrees } => InstructionKind::Turn { direction, degrees },
            Self::Sound { clip } => InstructionKind::Sound { clip },
            Self::Wait { seconds } => InstructionKind::Wait { seconds },
            Self::Repeat { times, .. } => InstructionKind::Repeat { times },
        }
    }
}

/// A whole program file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramFile {
    /// Top-level entries in order
    pub program: Vec<Entry>,
}

impl ProgramFile {
    /// Read and parse a program file
    ///
    /// # Errors
    /// Returns [`ProgramFileError::Read`] or [`ProgramFileError::Json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProgramFileError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ProgramFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&source)?)
    }

    /// Parse from a JSON string
    ///
    /// # Errors
    /// Returns [`ProgramFileError::Json`] on malformed input.
    pub fn from_json(source: &str) -> Result<Self, ProgramFileError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Encode as pretty JSON
    ///
    /// # Errors
    /// Returns [`ProgramFileError::Json`] if encoding fails.
    pub fn to_json(&self) -> Result<String, ProgramFileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Assemble a program tree through editor inserts
    ///
    /// Magnitudes are clamped by the editor on the way in.
    ///
    /// # Errors
    /// Propagates any edit error from assembly.
    pub fn to_tree(&self) -> Result<ProgramTree, ProgramFileError> {
        let mut tree = ProgramTree::new();
        // Explicit work list of (container, entry) in insertion order
        let mut pending: Vec<(Container, &Entry)> = self
            .program
            .iter()
            .rev()
            .map(|entry| (Container::Root, entry))
            .collect();

        while let Some((container, entry)) = pending.pop() {
            let instruction = Instruction::new(entry.kind());
            tree = tree.insert(container, instruction, None)?;
            if let Entry::Repeat { body, .. } = entry {
                let inner = Container::Repeat(instruction.id());
                pending.extend(body.iter().rev().map(|child| (inner, child)));
            }
        }
        Ok(tree)
    }

    /// Export a tree
    #[must_use]
    pub fn from_tree(tree: &ProgramTree) -> Self {
        Self {
            program: export(tree, Container::Root),
        }
    }
}

fn export(tree: &ProgramTree, container: Container) -> Vec<Entry> {
    tree.children(container)
        .into_iter()
        .map(|instruction| match *instruction.kind() {
            InstructionKind::Move { direction, steps } => Entry::Move { direction, steps },
            InstructionKind::Turn { direction, degrees } => Entry::Turn { direction, degrees },
            InstructionKind::Sound { clip } => Entry::Sound { clip },
            InstructionKind::Wait { seconds } => Entry::Wait { seconds },
            InstructionKind::Repeat { times } => Entry::Repeat {
                times,
                body: export(tree, Container::Repeat(instruction.id())),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SQUARE: &str = r#"{
        "program": [
            { "type": "sound", "clip": "meow" },
            { "type": "repeat", "times": 4, "body": [
                { "type": "move", "direction": "forward", "steps": 2 },
                { "type": "turn", "direction": "right", "degrees": 90 }
            ] },
            { "type": "repeat", "times": 2 }
        ]
    }"#;

    #[test]
    fn nested_file_builds_nested_tree() {
        let tree = ProgramFile::from_json(SQUARE).unwrap().to_tree().unwrap();
        assert_eq!(tree.len(), 5);
        assert!(tree.validate().is_ok());

        let depths: Vec<(usize, &'static str)> = tree
            .depth_first()
            .into_iter()
            .map(|(depth, instruction)| (depth, instruction.kind().label()))
            .collect();
        assert_eq!(depths.iter().map(|(d, _)| *d).collect::<Vec<_>>(), vec![0, 0, 1, 1, 0]);
    }

    #[test]
    fn export_restores_structure() {
        let file = ProgramFile::from_json(SQUARE).unwrap();
        let tree = file.to_tree().unwrap();
        assert_eq!(ProgramFile::from_tree(&tree), file);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let file = ProgramFile::from_json(
            r#"{ "program": [ { "type": "wait", "seconds": 0 }, { "type": "turn", "direction": "left", "degrees": 9000 } ] }"#,
        )
        .unwrap();
        let exported = ProgramFile::from_tree(&file.to_tree().unwrap());
        assert_eq!(
            exported.program,
            vec![
                Entry::Wait { seconds: 1 },
                Entry::Turn {
                    direction: TurnDirection::Left,
                    degrees: 360
                },
            ]
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(matches!(
            ProgramFile::from_json(r#"{ "program": [ { "type": "jump" } ] }"#),
            Err(ProgramFileError::Json(_))
        ));
    }
}

//! Decision - the closed sum of everything a completed gesture can mean

use crate::catalog::Item;
use std::path::PathBuf;

/// Gesture direction. Carried only so a reversal can animate the card back
/// the way it left; no business logic branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

/// A committed, reversible state transition over one item
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Trash {
        item: Item,
        direction: SwipeDirection,
    },
    Like {
        item: Item,
        direction: SwipeDirection,
    },
    Keep {
        item: Item,
        direction: SwipeDirection,
    },
    Move {
        item: Item,
        direction: SwipeDirection,
        /// Where the file lived before the move, for physical reversal
        source_parent: PathBuf,
        target_folder: PathBuf,
        /// Reversal of a move into a brand-new folder removes the folder's
        /// usage entry; reversal into a pre-existing one only decrements it
        created_folder: bool,
        /// Exact destination the file landed at (collision suffixes included)
        moved_to: Option<PathBuf>,
    },
}

impl Decision {
    pub fn item(&self) -> &Item {
        match self {
            Decision::Trash { item, .. }
            | Decision::Like { item, .. }
            | Decision::Keep { item, .. }
            | Decision::Move { item, .. } => item,
        }
    }

    pub fn direction(&self) -> SwipeDirection {
        match self {
            Decision::Trash { direction, .. }
            | Decision::Like { direction, .. }
            | Decision::Keep { direction, .. }
            | Decision::Move { direction, .. } => *direction,
        }
    }
}

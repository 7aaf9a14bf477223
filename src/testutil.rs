//! Shared fixtures for the crate's test modules

use crate::catalog::{test_item, Catalog, Item};
use crate::decision::SwipeDirection;
use crate::engine::{Action, ApplyOutcome, DecisionEngine};
use crate::error::TriageError;
use crate::mover::{MediaMover, MoveOutcome, MovedFile, PermissionRequest};
use crate::queue::TriageQueue;
use crate::store::{MemoryStore, StateStore};
use crate::undo::{UndoOutcome, UndoStack};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Scripted mover: optionally demands permission once, optionally fails,
/// records every call
pub(crate) struct ScriptedMover {
    pub demand_permission: bool,
    pub fail_with: Option<String>,
    pub fail_restore: bool,
    pub moves: Vec<(i64, PathBuf)>,
    pub restores: Vec<(PathBuf, PathBuf)>,
}

impl ScriptedMover {
    pub fn permissive() -> Self {
        Self {
            demand_permission: false,
            fail_with: None,
            fail_restore: false,
            moves: Vec::new(),
            restores: Vec::new(),
        }
    }
}

impl MediaMover for ScriptedMover {
    fn move_media(&mut self, items: &[Item], dest: &Path) -> Result<MoveOutcome, TriageError> {
        if self.demand_permission {
            self.demand_permission = false;
            return Ok(MoveOutcome::NeedsPermission(PermissionRequest {
                token: 42,
                item_ids: items.iter().map(|i| i.id).collect(),
            }));
        }
        if let Some(reason) = &self.fail_with {
            return Err(TriageError::MoveFailed {
                path: dest.to_path_buf(),
                reason: reason.clone(),
            });
        }
        let files: Vec<MovedFile> = items
            .iter()
            .map(|i| {
                let new_path = dest.join(i.filename());
                self.moves.push((i.id, new_path.clone()));
                MovedFile { id: i.id, new_path }
            })
            .collect();
        Ok(MoveOutcome::Moved(files))
    }

    fn restore_media(&mut self, from: &Path, to: &Path) -> Result<MoveOutcome, TriageError> {
        if self.fail_restore {
            return Err(TriageError::MissingSource(from.to_path_buf()));
        }
        self.restores.push((from.to_path_buf(), to.to_path_buf()));
        Ok(MoveOutcome::Moved(vec![]))
    }
}

/// Everything the engine and undo paths touch, wired together
pub(crate) struct Rig {
    pub catalog: Catalog,
    pub queue: TriageQueue,
    pub store: StateStore,
    pub undo_stack: UndoStack,
    pub engine: DecisionEngine,
    pub mover: ScriptedMover,
}

pub(crate) fn rig(ids: &[i64]) -> Rig {
    let items: Vec<_> = ids.iter().map(|&id| test_item(id, "cam", 100)).collect();
    Rig {
        catalog: Catalog::from_items(items.clone()),
        queue: TriageQueue::load_batch(&items, 100),
        store: StateStore::load(Box::new(MemoryStore::new())),
        undo_stack: UndoStack::with_cooldown(Duration::ZERO),
        engine: DecisionEngine::new(),
        mover: ScriptedMover::permissive(),
    }
}

impl Rig {
    pub fn apply(&mut self, action: Action, direction: SwipeDirection) -> ApplyOutcome {
        self.engine
            .apply(
                action,
                direction,
                &mut self.queue,
                &mut self.catalog,
                &mut self.store,
                &mut self.undo_stack,
                &mut self.mover,
            )
            .unwrap()
    }

    pub fn undo(&mut self) -> UndoOutcome {
        self.undo_stack.undo(
            &mut self.queue,
            &mut self.catalog,
            &mut self.store,
            &mut self.mover,
        )
    }
}

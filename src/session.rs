//! Triage session - the surface the presentation layer drives
//!
//! Owns the catalog, store, queue, undo stack and decision engine, and is the
//! single scheduling context allowed to mutate them. Background work only
//! ever hands back whole immutable snapshots through the store.

use crate::catalog::{Catalog, Item};
use crate::config::Config;
use crate::decision::SwipeDirection;
use crate::drop_target::{rank_targets, FolderTarget, Rect};
use crate::engine::{Action, ApplyOutcome, DecisionEngine};
use crate::error::TriageError;
use crate::filter::{filter_candidates, FilterSpec};
use crate::mover::MediaMover;
use crate::queue::TriageQueue;
use crate::store::{StateStore, Stats};
use crate::undo::{UndoOutcome, UndoStack};
use std::path::Path;

/// What the UI should render right now. The two empty states are distinct:
/// a drained batch offers "load more", an exhausted universe offers
/// "release kept items".
#[derive(Debug, Clone, PartialEq)]
pub enum QueueStatus {
    Card(Item),
    BatchDone { remaining: usize },
    Exhausted,
}

pub struct TriageSession {
    catalog: Catalog,
    store: StateStore,
    queue: TriageQueue,
    undo_stack: UndoStack,
    engine: DecisionEngine,
    mover: Box<dyn MediaMover>,
    filter: FilterSpec,
    batch_size: usize,
}

impl TriageSession {
    pub fn new(
        catalog: Catalog,
        store: StateStore,
        mover: Box<dyn MediaMover>,
        config: &Config,
    ) -> Self {
        let mut session = Self {
            catalog,
            store,
            queue: TriageQueue::new(),
            undo_stack: UndoStack::new(),
            engine: DecisionEngine::new(),
            mover,
            filter: FilterSpec::default(),
            batch_size: config.batch_size.max(1),
        };
        session.reload_batch();
        session
    }

    /// Rebuild the queue from the filter pipeline. Invalidates all undo
    /// context: the stack is truncated.
    pub fn reload_batch(&mut self) {
        let candidates = filter_candidates(
            self.catalog.items(),
            &self.filter,
            self.store.processed_ids(),
        );
        self.queue = TriageQueue::load_batch(&candidates, self.batch_size);
        self.undo_stack.clear();
        self.store.flush_deferred();
    }

    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.filter = filter;
        self.reload_batch();
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn status(&self) -> QueueStatus {
        if let Some(head) = self.queue.head() {
            return QueueStatus::Card(head.clone());
        }
        let remaining = filter_candidates(
            self.catalog.items(),
            &self.filter,
            self.store.processed_ids(),
        )
        .len();
        if remaining > 0 {
            QueueStatus::BatchDone { remaining }
        } else {
            QueueStatus::Exhausted
        }
    }

    pub fn swipe(
        &mut self,
        action: Action,
        direction: SwipeDirection,
    ) -> Result<ApplyOutcome, TriageError> {
        self.engine.apply(
            action,
            direction,
            &mut self.queue,
            &mut self.catalog,
            &mut self.store,
            &mut self.undo_stack,
            self.mover.as_mut(),
        )
    }

    /// Resume or cancel a move suspended on an OS consent dialog
    pub fn resolve_permission(
        &mut self,
        granted: bool,
    ) -> Result<Option<ApplyOutcome>, TriageError> {
        self.engine.resolve_permission(
            granted,
            &mut self.queue,
            &mut self.catalog,
            &mut self.store,
            &mut self.undo_stack,
            self.mover.as_mut(),
        )
    }

    pub fn undo(&mut self) -> UndoOutcome {
        self.undo_stack.undo(
            &mut self.queue,
            &mut self.catalog,
            &mut self.store,
            self.mover.as_mut(),
        )
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Recovery action for an exhausted universe: processed-but-undisposed
    /// items return to circulation. Returns how many were released.
    pub fn release_kept(&mut self) -> usize {
        let released = self.store.release_kept().len();
        self.reload_batch();
        released
    }

    /// Hand the pending-trash set to the platform. The flushed items leave
    /// this app's control, so the undo stack is truncated.
    pub fn flush_trash(&mut self) -> Vec<i64> {
        let flushed = self.store.flush_pending_trash();
        self.undo_stack.clear();
        self.store.flush_deferred();
        flushed
    }

    /// Folder candidates for the drop row, in display rank order. Rects are
    /// zeroed; the presentation layer fills them in each layout pass.
    pub fn folder_targets(&self, base_dir: &Path, now: i64) -> Vec<FolderTarget> {
        let mut targets: Vec<FolderTarget> = self
            .catalog
            .folders()
            .into_iter()
            .map(|(name, item_count)| FolderTarget {
                id: name.clone(),
                path: base_dir.join(&name),
                name,
                item_count,
                rect: Rect::default(),
            })
            .collect();
        rank_targets(&mut targets, self.store.folder_usage(), now);
        targets
    }

    pub fn stats(&self) -> Stats {
        self.store.stats()
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn queue(&self) -> &TriageQueue {
        &self.queue
    }
}

/// Convenience mapping from plain card swipes to actions. A downward drag
/// goes through the folder-drop resolver instead and becomes a Move.
pub fn action_for_swipe(direction: SwipeDirection) -> Option<(Action, SwipeDirection)> {
    match direction {
        SwipeDirection::Left => Some((Action::Trash, direction)),
        SwipeDirection::Right => Some((Action::Keep, direction)),
        SwipeDirection::Up => Some((Action::Like, direction)),
        SwipeDirection::Down => None,
    }
}

/// Build the Move action for a resolved folder drop
pub fn move_action_for_drop(target: &FolderTarget) -> Action {
    Action::Move {
        target_folder: target.path.clone(),
        created_folder: false,
    }
}

/// Build the Move action for a confirmed new-folder drop
pub fn move_action_for_new_folder(base_dir: &Path, name: &str) -> Result<Action, TriageError> {
    crate::drop_target::validate_folder_name(name)?;
    Ok(Action::Move {
        target_folder: base_dir.join(name.trim()),
        created_folder: true,
    })
}

//! Decision engine - turns a completed gesture into durable state

use crate::catalog::Catalog;
use crate::decision::{Decision, SwipeDirection};
use crate::error::TriageError;
use crate::mover::{MediaMover, MoveOutcome, PermissionRequest};
use crate::queue::TriageQueue;
use crate::store::StateStore;
use crate::undo::UndoStack;
use std::path::{Path, PathBuf};

/// What a resolved gesture asks for. Direction travels separately; it only
/// matters for reversal animation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Trash,
    Like,
    Keep,
    Move {
        target_folder: PathBuf,
        created_folder: bool,
    },
}

#[derive(Debug)]
pub enum ApplyOutcome {
    Applied {
        item_id: i64,
        /// Physical move failure, reported but not rolled back: the
        /// bookkeeping proceeds optimistically (the undo path mirrors this
        /// with its best-effort restore)
        move_failure: Option<String>,
    },
    /// The move needs an OS-mediated consent. Nothing was mutated; resolve
    /// or cancel through `resolve_permission`.
    AwaitingPermission(PermissionRequest),
}

struct PendingMove {
    item_id: i64,
    direction: SwipeDirection,
    target_folder: PathBuf,
    created_folder: bool,
}

/// Applies decisions to the queue head. One instance per session; shares the
/// session's single-owner scheduling context.
#[derive(Default)]
pub struct DecisionEngine {
    pending: Option<PendingMove>,
}

impl DecisionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending_permission(&self) -> bool {
        self.pending.is_some()
    }

    /// Pop the head card, persist the transition, push the undo entry.
    pub fn apply(
        &mut self,
        action: Action,
        direction: SwipeDirection,
        queue: &mut TriageQueue,
        catalog: &mut Catalog,
        store: &mut StateStore,
        undo_stack: &mut UndoStack,
        mover: &mut dyn MediaMover,
    ) -> Result<ApplyOutcome, TriageError> {
        let head = queue.head().cloned().ok_or(TriageError::EmptyQueue)?;

        match action {
            Action::Trash => {
                queue.advance();
                store.mark_processed(head.id);
                store.add_pending_trash(head.id);
                if let Some(paired) = &head.paired_video {
                    store.add_pending_trash(paired.id);
                }
                store.count_trashed(head.byte_size);
                let item_id = head.id;
                undo_stack.push(Decision::Trash {
                    item: head,
                    direction,
                });
                Ok(ApplyOutcome::Applied {
                    item_id,
                    move_failure: None,
                })
            }
            Action::Like => {
                queue.advance();
                store.mark_processed(head.id);
                store.add_liked(head.id);
                // Liking counts as a skip in the stats, not as its own
                // counter. Deliberate; undo decrements the same counter.
                store.count_skipped();
                let item_id = head.id;
                undo_stack.push(Decision::Like {
                    item: head,
                    direction,
                });
                Ok(ApplyOutcome::Applied {
                    item_id,
                    move_failure: None,
                })
            }
            Action::Keep => {
                queue.advance();
                store.mark_processed(head.id);
                store.count_skipped();
                let item_id = head.id;
                undo_stack.push(Decision::Keep {
                    item: head,
                    direction,
                });
                Ok(ApplyOutcome::Applied {
                    item_id,
                    move_failure: None,
                })
            }
            Action::Move {
                target_folder,
                created_folder,
            } => self.apply_move(
                direction,
                target_folder,
                created_folder,
                queue,
                catalog,
                store,
                undo_stack,
                mover,
            ),
        }
    }

    /// Resume or cancel a move suspended on a permission token. Cancellation
    /// leaves the queue exactly as if the gesture had never completed.
    pub fn resolve_permission(
        &mut self,
        granted: bool,
        queue: &mut TriageQueue,
        catalog: &mut Catalog,
        store: &mut StateStore,
        undo_stack: &mut UndoStack,
        mover: &mut dyn MediaMover,
    ) -> Result<Option<ApplyOutcome>, TriageError> {
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        if !granted {
            return Ok(None);
        }
        // The suspended item must still be the head card
        if queue.head().map(|i| i.id) != Some(pending.item_id) {
            return Ok(None);
        }

        self.apply_move(
            pending.direction,
            pending.target_folder,
            pending.created_folder,
            queue,
            catalog,
            store,
            undo_stack,
            mover,
        )
        .map(Some)
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_move(
        &mut self,
        direction: SwipeDirection,
        target_folder: PathBuf,
        created_folder: bool,
        queue: &mut TriageQueue,
        catalog: &mut Catalog,
        store: &mut StateStore,
        undo_stack: &mut UndoStack,
        mover: &mut dyn MediaMover,
    ) -> Result<ApplyOutcome, TriageError> {
        let head = queue.head().cloned().ok_or(TriageError::EmptyQueue)?;

        let (moved_to, move_failure) =
            match mover.move_media(std::slice::from_ref(&head), &target_folder) {
                Ok(MoveOutcome::NeedsPermission(request)) => {
                    // Suspend before any mutation; the gesture has not
                    // completed until the consent dialog resolves
                    self.pending = Some(PendingMove {
                        item_id: head.id,
                        direction,
                        target_folder,
                        created_folder,
                    });
                    return Ok(ApplyOutcome::AwaitingPermission(request));
                }
                Ok(MoveOutcome::Moved(files)) => (
                    files
                        .iter()
                        .find(|f| f.id == head.id)
                        .map(|f| f.new_path.clone()),
                    None,
                ),
                // Optimistic forward move: report the physical failure but
                // let the bookkeeping proceed
                Err(e) => (None, Some(e.to_string())),
            };

        queue.advance();
        store.mark_processed(head.id);
        store.add_moved(head.id);
        store.count_skipped();

        let folder_tag = folder_tag_of(&target_folder);
        store.record_folder_use(&folder_tag, chrono::Utc::now().timestamp());

        if let Some(new_path) = &moved_to {
            let relocated = head.relocated(&folder_tag, new_path.clone());
            catalog.replace(relocated.clone());
            queue.replace(relocated);
        }

        let item_id = head.id;
        let source_parent = head.parent_dir().unwrap_or_default();
        undo_stack.push(Decision::Move {
            item: head,
            direction,
            source_parent,
            target_folder,
            created_folder,
            moved_to,
        });

        Ok(ApplyOutcome::Applied {
            item_id,
            move_failure,
        })
    }
}

/// Bucket tag of a destination folder path: its final component
pub fn folder_tag_of(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

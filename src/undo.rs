//! Undo stack - algebraic reversal of committed decisions

use crate::catalog::Catalog;
use crate::decision::Decision;
use crate::engine::folder_tag_of;
use crate::mover::{MediaMover, MoveOutcome};
use crate::queue::TriageQueue;
use crate::store::StateStore;
use std::time::{Duration, Instant};

/// Minimum interval between consecutive undo pops. Guards the stack against
/// duplicate-fire input independent of any UI debouncing.
pub const UNDO_COOLDOWN: Duration = Duration::from_millis(300);

#[derive(Debug, PartialEq)]
pub enum UndoOutcome {
    Reverted {
        item_id: i64,
        /// False when a move's physical reversal could not be carried out;
        /// the bookkeeping was reverted regardless and the file stays where
        /// it is
        physical_restored: bool,
    },
    NothingToUndo,
    /// Rejected by the cooldown guard; the stack was not touched
    CoolingDown,
}

/// LIFO log of reversible decisions. Truncated whenever the queue is
/// reloaded from the filter pipeline and whenever pending trash is flushed
/// to the platform; both events invalidate all undo context.
pub struct UndoStack {
    entries: Vec<Decision>,
    cooldown: Duration,
    last_undo: Option<Instant>,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self::with_cooldown(UNDO_COOLDOWN)
    }

    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            entries: Vec::new(),
            cooldown,
            last_undo: None,
        }
    }

    pub fn push(&mut self, decision: Decision) {
        self.entries.push(decision);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pop the newest decision and invert it step by step: membership,
    /// counters, and for moves the filesystem side effect (best-effort).
    /// A no-op on an empty stack.
    pub fn undo(
        &mut self,
        queue: &mut TriageQueue,
        catalog: &mut Catalog,
        store: &mut StateStore,
        mover: &mut dyn MediaMover,
    ) -> UndoOutcome {
        if let Some(last) = self.last_undo {
            if last.elapsed() < self.cooldown {
                return UndoOutcome::CoolingDown;
            }
        }
        let Some(decision) = self.entries.pop() else {
            return UndoOutcome::NothingToUndo;
        };
        self.last_undo = Some(Instant::now());

        match decision {
            Decision::Trash { item, .. } => {
                store.unmark_processed(item.id);
                store.remove_pending_trash(item.id);
                if let Some(paired) = &item.paired_video {
                    store.remove_pending_trash(paired.id);
                }
                store.uncount_trashed(item.byte_size);
                let item_id = item.id;
                queue.reinsert_at_head(item);
                UndoOutcome::Reverted {
                    item_id,
                    physical_restored: true,
                }
            }
            Decision::Like { item, .. } => {
                store.unmark_processed(item.id);
                store.remove_liked(item.id);
                store.uncount_skipped();
                let item_id = item.id;
                queue.reinsert_at_head(item);
                UndoOutcome::Reverted {
                    item_id,
                    physical_restored: true,
                }
            }
            Decision::Keep { item, .. } => {
                store.unmark_processed(item.id);
                store.uncount_skipped();
                let item_id = item.id;
                queue.reinsert_at_head(item);
                UndoOutcome::Reverted {
                    item_id,
                    physical_restored: true,
                }
            }
            Decision::Move {
                item,
                source_parent,
                target_folder,
                created_folder,
                moved_to,
                ..
            } => {
                store.unmark_processed(item.id);
                store.remove_moved(item.id);
                store.uncount_skipped();
                store.revert_folder_use(&folder_tag_of(&target_folder), created_folder);

                // Physical reversal is best-effort: when it fails the file is
                // left in place and only the flag tells the caller
                let physical_restored = match &moved_to {
                    Some(from) => {
                        let restore_to = item
                            .path
                            .clone()
                            .unwrap_or_else(|| source_parent.join(item.filename()));
                        matches!(
                            mover.restore_media(from, &restore_to),
                            Ok(MoveOutcome::Moved(_))
                        )
                    }
                    // The forward move never landed physically, so there is
                    // nothing to put back
                    None => true,
                };

                catalog.replace(item.clone());
                let item_id = item.id;
                queue.reinsert_at_head(item);
                UndoOutcome::Reverted {
                    item_id,
                    physical_restored,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::SwipeDirection;
    use crate::engine::Action;
    use crate::store::Stats;
    use crate::testutil::rig;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_trash_then_undo_restores_everything() {
        let mut rig = rig(&[1, 2, 3]);
        rig.apply(Action::Trash, SwipeDirection::Left);

        assert_eq!(rig.queue.head().unwrap().id, 2);
        assert_eq!(rig.store.stats().trashed, 1);

        let outcome = rig.undo();
        assert_eq!(
            outcome,
            UndoOutcome::Reverted {
                item_id: 1,
                physical_restored: true
            }
        );
        assert_eq!(rig.queue.head().unwrap().id, 1);
        assert!(!rig.store.is_processed(1));
        assert!(rig.store.pending_trash_ids().is_empty());
        assert_eq!(rig.store.stats(), Stats::default());
    }

    #[test]
    fn test_decision_sequence_fully_reversible() {
        let mut rig = rig(&[1, 2, 3, 4]);
        let before = rig.store.stats();

        rig.apply(Action::Trash, SwipeDirection::Left);
        rig.apply(Action::Like, SwipeDirection::Up);
        rig.apply(Action::Keep, SwipeDirection::Right);
        rig.apply(
            Action::Move {
                target_folder: PathBuf::from("/pictures/trip"),
                created_folder: true,
            },
            SwipeDirection::Down,
        );

        for _ in 0..4 {
            rig.undo();
        }

        assert_eq!(rig.store.stats(), before);
        assert!(rig.store.processed_ids().is_empty());
        assert!(rig.store.liked_ids().is_empty());
        assert!(rig.store.pending_trash_ids().is_empty());
        assert!(rig.store.moved_ids().is_empty());
        assert!(rig.store.folder_usage().is_empty());
        assert_eq!(rig.queue.len(), 4);
        assert_eq!(rig.queue.head().unwrap().id, 1);
    }

    #[test]
    fn test_move_undo_restores_file_and_new_folder_entry() {
        let mut rig = rig(&[1]);
        rig.apply(
            Action::Move {
                target_folder: PathBuf::from("/pictures/trip"),
                created_folder: true,
            },
            SwipeDirection::Down,
        );
        assert_eq!(rig.store.folder_usage().get("trip").unwrap().count, 1);

        let outcome = rig.undo();
        assert_eq!(
            outcome,
            UndoOutcome::Reverted {
                item_id: 1,
                physical_restored: true
            }
        );
        // Created-folder reversal removes the entry rather than decrementing
        assert!(rig.store.folder_usage().get("trip").is_none());

        assert_eq!(rig.mover.restores.len(), 1);
        let (from, to) = &rig.mover.restores[0];
        assert_eq!(from.as_path(), Path::new("/pictures/trip/img_1.jpg"));
        assert_eq!(to.as_path(), Path::new("/dcim/cam/img_1.jpg"));

        let item = rig.catalog.get(1).unwrap();
        assert_eq!(item.folder, "cam");
    }

    #[test]
    fn test_move_undo_into_existing_folder_decrements() {
        let mut rig = rig(&[1, 2]);
        for _ in 0..2 {
            rig.apply(
                Action::Move {
                    target_folder: PathBuf::from("/pictures/trip"),
                    created_folder: false,
                },
                SwipeDirection::Down,
            );
        }
        assert_eq!(rig.store.folder_usage().get("trip").unwrap().count, 2);

        rig.undo();
        assert_eq!(rig.store.folder_usage().get("trip").unwrap().count, 1);
    }

    #[test]
    fn test_failed_physical_restore_still_reverts_state() {
        let mut rig = rig(&[1]);
        rig.apply(
            Action::Move {
                target_folder: PathBuf::from("/pictures/trip"),
                created_folder: false,
            },
            SwipeDirection::Down,
        );
        rig.mover.fail_restore = true;

        let outcome = rig.undo();
        assert_eq!(
            outcome,
            UndoOutcome::Reverted {
                item_id: 1,
                physical_restored: false
            }
        );
        assert!(!rig.store.is_processed(1));
        assert!(rig.store.moved_ids().is_empty());
        assert_eq!(rig.queue.head().unwrap().id, 1);
    }

    #[test]
    fn test_empty_stack_is_silent_noop() {
        let mut rig = rig(&[1]);
        assert_eq!(rig.undo(), UndoOutcome::NothingToUndo);
        assert_eq!(rig.queue.len(), 1);
    }

    #[test]
    fn test_rapid_double_undo_pops_once() {
        let mut rig = rig(&[1, 2]);
        rig.undo_stack = UndoStack::with_cooldown(Duration::from_millis(300));

        rig.apply(Action::Keep, SwipeDirection::Right);
        rig.apply(Action::Keep, SwipeDirection::Right);
        assert_eq!(rig.undo_stack.len(), 2);

        // Two invocations inside the cooldown window mutate the stack once
        let first = rig.undo();
        let second = rig.undo();

        assert!(matches!(first, UndoOutcome::Reverted { .. }));
        assert_eq!(second, UndoOutcome::CoolingDown);
        assert_eq!(rig.undo_stack.len(), 1);
    }
}

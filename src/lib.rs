//! Gallery Triage - swipe queue and decision engine for media cleanup
//!
//! The core of a gallery-triage app: gestures become durable, reversible
//! state transitions over a filterable media catalog. Rendering, media-store
//! queries and analyzers live behind the collaborator traits in `catalog`,
//! `store` and `mover`.

pub mod catalog;
pub mod config;
pub mod decision;
pub mod drop_target;
pub mod engine;
pub mod error;
pub mod filter;
pub mod mover;
pub mod queue;
pub mod session;
pub mod store;
pub mod undo;

#[cfg(test)]
pub(crate) mod testutil;

pub use catalog::{Catalog, CatalogOrder, CatalogSource, Item, MediaKind};
pub use decision::{Decision, SwipeDirection};
pub use drop_target::{DropOutcome, FolderDropResolver, FolderTarget, ResolverState};
pub use engine::{Action, ApplyOutcome, DecisionEngine};
pub use error::TriageError;
pub use filter::{FilterSpec, KindFilter};
pub use mover::{FsMediaMover, MediaMover, MoveOutcome, PermissionRequest};
pub use queue::TriageQueue;
pub use session::{QueueStatus, TriageSession};
pub use store::{StateStore, Stats, StoreBackend};
pub use undo::{UndoOutcome, UndoStack};

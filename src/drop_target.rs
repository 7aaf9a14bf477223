//! Folder-drop resolution - geometry state machine for downward drags
//!
//! The presentation layer feeds raw pointer positions; the resolver decides
//! which folder target (if any) is armed for a release. It holds an immutable
//! snapshot of target rectangles captured once per layout pass, so pointer
//! sampling needs no locking and stays O(visible targets).

use crate::error::TriageError;
use crate::store::FolderUsage;
use std::collections::HashMap;
use std::path::PathBuf;

/// Id of the synthetic "create new folder" target
pub const NEW_FOLDER_ID: &str = "::new::";

/// Targets last used within this window rank first in display order
pub const RECENT_USE_WINDOW_SECS: i64 = 300;

/// Vertical displacement before a drag reads as drop intent
pub const DROP_INTENT_THRESHOLD: f32 = 120.0;
/// Horizontal displacement past which the gesture is a left/right swipe,
/// never a folder drop
pub const SWIPE_EXCLUSION_THRESHOLD: f32 = 100.0;
/// Maximum center distance for targets found outside the vertical band
pub const ACCEPT_RADIUS: f32 = 160.0;
/// Margin around a target's vertical band
pub const BAND_PADDING: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance_to(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether the point falls in the rect's horizontal strip of the screen,
    /// padded above and below
    fn band_contains(&self, p: Point, padding: f32) -> bool {
        p.y >= self.y - padding && p.y <= self.y + self.height + padding
    }
}

/// A folder candidate rectangle, derived per layout pass and never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct FolderTarget {
    /// Folder tag, or `NEW_FOLDER_ID` for the synthetic create target
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub item_count: usize,
    pub rect: Rect,
}

impl FolderTarget {
    pub fn is_new_folder(&self) -> bool {
        self.id == NEW_FOLDER_ID
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolverState {
    Idle,
    Armed {
        /// Id of the currently active target, if the pointer resolves one
        active: Option<String>,
    },
}

/// What a release means for the caller
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Failed drop: restore the card, mutate nothing
    NoTarget,
    /// Emit a Move decision into this folder
    Folder(FolderTarget),
    /// Ask the user for a folder name, then emit the Move
    NewFolder,
}

/// Armed/Idle state machine over live pointer geometry
pub struct FolderDropResolver {
    targets: Vec<FolderTarget>,
    origin: Point,
    state: ResolverState,
    drop_intent: f32,
    swipe_exclusion: f32,
    accept_radius: f32,
    band_padding: f32,
}

impl FolderDropResolver {
    /// `targets` is the per-layout snapshot, synthetic new-folder target
    /// included. `origin` is where the gesture started.
    pub fn new(targets: Vec<FolderTarget>, origin: Point) -> Self {
        Self {
            targets,
            origin,
            state: ResolverState::Idle,
            drop_intent: DROP_INTENT_THRESHOLD,
            swipe_exclusion: SWIPE_EXCLUSION_THRESHOLD,
            accept_radius: ACCEPT_RADIUS,
            band_padding: BAND_PADDING,
        }
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    /// Re-resolve on a pointer frame. Called per pointer-move callback.
    pub fn update(&mut self, pointer: Point) -> ResolverState {
        let dy = pointer.y - self.origin.y;
        let dx = pointer.x - self.origin.x;

        if dy < self.drop_intent {
            self.state = ResolverState::Idle;
            return self.state.clone();
        }

        // Mutual exclusion with trash/like swipes: a wide horizontal pull is
        // never a folder drop, no matter what it hovers over
        if dx.abs() > self.swipe_exclusion {
            self.state = ResolverState::Armed { active: None };
            return self.state.clone();
        }

        self.state = ResolverState::Armed {
            active: self.resolve(pointer),
        };
        self.state.clone()
    }

    /// Gesture ended; consume the armed target if any
    pub fn release(&mut self) -> DropOutcome {
        let state = std::mem::replace(&mut self.state, ResolverState::Idle);
        let ResolverState::Armed { active: Some(id) } = state else {
            return DropOutcome::NoTarget;
        };
        if id == NEW_FOLDER_ID {
            return DropOutcome::NewFolder;
        }
        match self.targets.iter().find(|t| t.id == id) {
            Some(target) => DropOutcome::Folder(target.clone()),
            None => DropOutcome::NoTarget,
        }
    }

    /// Gesture cancelled (Armed -> Idle without a release decision)
    pub fn cancel(&mut self) {
        self.state = ResolverState::Idle;
    }

    /// Band-first nearest-center resolution with an acceptance radius
    fn resolve(&self, pointer: Point) -> Option<String> {
        if self.targets.is_empty() {
            return None;
        }

        let banded: Vec<&FolderTarget> = self
            .targets
            .iter()
            .filter(|t| t.rect.band_contains(pointer, self.band_padding))
            .collect();
        let from_band = !banded.is_empty();
        let pool: Vec<&FolderTarget> = if from_band {
            banded
        } else {
            self.targets.iter().collect()
        };

        let nearest = pool
            .into_iter()
            .min_by(|a, b| {
                let da = a.rect.center().distance_to(pointer);
                let db = b.rect.center().distance_to(pointer);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })?;

        let distance = nearest.rect.center().distance_to(pointer);
        if from_band || distance <= self.accept_radius {
            Some(nearest.id.clone())
        } else {
            None
        }
    }
}

/// Display order for the target row: recently-used first, then usage
/// frequency, then item count. Resolution never consults this.
pub fn rank_targets(targets: &mut [FolderTarget], usage: &HashMap<String, FolderUsage>, now: i64) {
    targets.sort_by(|a, b| {
        let key = |t: &FolderTarget| {
            let u = usage.get(&t.id).copied().unwrap_or_default();
            let recent = u.last_used > 0 && now - u.last_used <= RECENT_USE_WINDOW_SECS;
            (recent, u.count, t.item_count as u64)
        };
        key(b).cmp(&key(a))
    });
}

/// A new-folder name must be a plain single component
pub fn validate_folder_name(name: &str) -> Result<(), TriageError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains('/')
        || trimmed.contains('\\')
    {
        return Err(TriageError::InvalidFolderName(name.to_string()));
    }
    Ok(())
}

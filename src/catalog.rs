//! Item catalog - the per-session snapshot of candidate media

use crate::error::TriageError;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supported photo extensions
/// Includes common formats plus the modern HEIF family used by phone cameras
pub const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif",
    "heic", "heif", "avif", "jxl", "dng",
];

/// Supported video extensions
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "m4v", "webm", "mkv", "avi", "3gp",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Photo,
    Video,
    LivePhoto,
}

/// Companion video of a live photo. Trashing the photo must also trash this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedVideo {
    pub id: i64,
    pub path: PathBuf,
}

/// A single candidate media item. Value object: never mutated in place,
/// replaced wholesale after a successful move (copy-on-write).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub kind: MediaKind,
    /// Bucket/album tag, may be empty
    pub folder: String,
    /// Capture time, seconds since epoch, 0 when unknown
    pub taken_at: i64,
    pub byte_size: u64,
    /// Absent on platform versions that do not expose direct paths
    pub path: Option<PathBuf>,
    pub paired_video: Option<PairedVideo>,
}

impl Item {
    pub fn filename(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Parent directory of the item's file, if a path is known
    pub fn parent_dir(&self) -> Option<PathBuf> {
        self.path.as_deref().and_then(Path::parent).map(Path::to_path_buf)
    }

    /// New value with the folder tag and path updated after a move
    pub fn relocated(&self, folder: &str, new_path: PathBuf) -> Item {
        Item {
            folder: folder.to_string(),
            path: Some(new_path),
            ..self.clone()
        }
    }
}

/// Presentation order of the catalog, chosen once at load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CatalogOrder {
    #[default]
    NewestFirst,
    Shuffled,
}

/// Collaborator that enumerates candidate items (platform media store,
/// filesystem scan, test fixture)
pub trait CatalogSource {
    fn load_all(&self) -> Result<Vec<Item>, TriageError>;
}

/// Immutable-per-load snapshot of all candidate items
pub struct Catalog {
    items: Vec<Item>,
    order: CatalogOrder,
}

impl Catalog {
    pub fn load(source: &dyn CatalogSource, order: CatalogOrder) -> Result<Self, TriageError> {
        let mut items = source.load_all()?;

        match order {
            CatalogOrder::NewestFirst => items.sort_by(|a, b| b.taken_at.cmp(&a.taken_at)),
            CatalogOrder::Shuffled => items.shuffle(&mut rand::thread_rng()),
        }

        Ok(Self { items, order })
    }

    /// Build directly from already-ordered items (tests, snapshots)
    pub fn from_items(items: Vec<Item>) -> Self {
        Self {
            items,
            order: CatalogOrder::NewestFirst,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn order(&self) -> CatalogOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Copy-on-write replacement after a successful move (or its undo)
    pub fn replace(&mut self, item: Item) {
        if let Some(slot) = self.items.iter_mut().find(|i| i.id == item.id) {
            *slot = item;
        }
    }

    /// Distinct folder tags with their item counts, catalog order preserved
    pub fn folders(&self) -> Vec<(String, usize)> {
        let mut folders: Vec<(String, usize)> = Vec::new();
        for item in &self.items {
            if item.folder.is_empty() {
                continue;
            }
            match folders.iter_mut().find(|(name, _)| *name == item.folder) {
                Some((_, count)) => *count += 1,
                None => folders.push((item.folder.clone(), 1)),
            }
        }
        folders
    }
}

/// Derive a stable id for a media file from its path
pub fn media_id_for_path(path: &Path) -> i64 {
    let digest = md5::compute(path.to_string_lossy().as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.0[..8]);
    i64::from_be_bytes(bytes)
}

/// Filesystem-backed catalog source: recursive scan of one or more roots.
/// Live photos are detected by a sibling video file sharing the photo's stem;
/// the sibling is attached as the paired video and not listed on its own.
pub struct FsCatalogSource {
    roots: Vec<PathBuf>,
}

impl FsCatalogSource {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl CatalogSource for FsCatalogSource {
    fn load_all(&self) -> Result<Vec<Item>, TriageError> {
        let mut photos: Vec<PathBuf> = Vec::new();
        let mut videos: Vec<PathBuf> = Vec::new();

        for root in &self.roots {
            if !root.exists() {
                eprintln!("Warning: catalog root does not exist: {}", root.display());
                continue;
            }

            for entry in WalkDir::new(root).follow_links(true).into_iter().filter_map(|e| e.ok()) {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let Some(ext) = path.extension() else { continue };
                let ext = ext.to_string_lossy().to_lowercase();

                if PHOTO_EXTENSIONS.contains(&ext.as_str()) {
                    photos.push(path.to_path_buf());
                } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
                    videos.push(path.to_path_buf());
                }
            }
        }

        let mut items = Vec::with_capacity(photos.len() + videos.len());

        for path in &photos {
            let paired = videos
                .iter()
                .position(|v| v.with_extension("") == path.with_extension(""))
                .map(|idx| videos.swap_remove(idx));

            let mut item = item_from_path(path, MediaKind::Photo)?;
            if let Some(video_path) = paired {
                item.kind = MediaKind::LivePhoto;
                item.paired_video = Some(PairedVideo {
                    id: media_id_for_path(&video_path),
                    path: video_path,
                });
            }
            items.push(item);
        }

        for path in &videos {
            items.push(item_from_path(path, MediaKind::Video)?);
        }

        Ok(items)
    }
}

fn item_from_path(path: &Path, kind: MediaKind) -> Result<Item, TriageError> {
    let meta = std::fs::metadata(path)?;
    let taken_at = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let folder = path
        .parent()
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(Item {
        id: media_id_for_path(path),
        kind,
        folder,
        taken_at,
        byte_size: meta.len(),
        path: Some(path.to_path_buf()),
        paired_video: None,
    })
}

/// Fixture item shared across the crate's test modules
#[cfg(test)]
pub(crate) fn test_item(id: i64, folder: &str, taken_at: i64) -> Item {
    Item {
        id,
        kind: MediaKind::Photo,
        folder: folder.to_string(),
        taken_at,
        byte_size: 1024,
        path: Some(PathBuf::from(format!("/dcim/{}/img_{}.jpg", folder, id))),
        paired_video: None,
    }
}

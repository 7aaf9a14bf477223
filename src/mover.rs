//! Media moving - the filesystem collaborator behind Move decisions

use crate::catalog::Item;
use crate::error::TriageError;
use std::fs;
use std::path::{Path, PathBuf};

/// Opaque token the presentation layer resolves through an OS-mediated
/// consent dialog before the suspended move is retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRequest {
    pub token: u64,
    pub item_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovedFile {
    pub id: i64,
    pub new_path: PathBuf,
}

/// Result of a move attempt: done, or suspended on elevated permission
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Moved(Vec<MovedFile>),
    NeedsPermission(PermissionRequest),
}

/// Collaborator contract for relocating media files
pub trait MediaMover {
    fn move_media(&mut self, items: &[Item], dest: &Path) -> Result<MoveOutcome, TriageError>;

    /// Put a previously moved file back. Best-effort: callers revert their
    /// bookkeeping even when this fails.
    fn restore_media(&mut self, from: &Path, to: &Path) -> Result<MoveOutcome, TriageError>;
}

/// Direct-filesystem mover. Never needs elevated permission; rename first,
/// copy-verify-delete across filesystems.
#[derive(Debug, Default)]
pub struct FsMediaMover;

impl FsMediaMover {
    pub fn new() -> Self {
        Self
    }
}

impl MediaMover for FsMediaMover {
    fn move_media(&mut self, items: &[Item], dest: &Path) -> Result<MoveOutcome, TriageError> {
        fs::create_dir_all(dest)?;

        let mut moved = Vec::with_capacity(items.len());
        for item in items {
            let source = item
                .path
                .clone()
                .ok_or_else(|| TriageError::ItemNotFound(item.id))?;
            let new_path = transfer_file(&source, dest)?;
            moved.push(MovedFile {
                id: item.id,
                new_path,
            });
        }
        Ok(MoveOutcome::Moved(moved))
    }

    fn restore_media(&mut self, from: &Path, to: &Path) -> Result<MoveOutcome, TriageError> {
        if !from.exists() {
            return Err(TriageError::MissingSource(from.to_path_buf()));
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        relocate(from, to)?;
        Ok(MoveOutcome::Moved(vec![]))
    }
}

fn transfer_file(source: &Path, dest_dir: &Path) -> Result<PathBuf, TriageError> {
    if !source.exists() {
        return Err(TriageError::MissingSource(source.to_path_buf()));
    }

    let filename = source
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let dest_path = unique_destination(&filename, dest_dir);

    relocate(source, &dest_path)?;
    Ok(dest_path)
}

/// Rename, falling back to copy + size check + delete-original when the
/// destination is on another filesystem
fn relocate(source: &Path, dest: &Path) -> Result<(), TriageError> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }

    let copied = fs::copy(source, dest).map_err(|e| TriageError::MoveFailed {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;

    let expected = fs::metadata(source).map(|m| m.len()).unwrap_or(copied);
    if copied != expected {
        let _ = fs::remove_file(dest);
        return Err(TriageError::MoveFailed {
            path: source.to_path_buf(),
            reason: format!("copy truncated: {} of {} bytes", copied, expected),
        });
    }

    fs::remove_file(source).map_err(|e| TriageError::MoveFailed {
        path: source.to_path_buf(),
        reason: format!("copied but failed to remove original: {}", e),
    })
}

/// Destination path inside `destination`, suffixing the stem on collision
pub fn unique_destination(filename: &str, destination: &Path) -> PathBuf {
    let mut dest_path = destination.join(filename);

    if !dest_path.exists() {
        return dest_path;
    }

    let stem = dest_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = dest_path
        .extension()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut counter = 1;
    while dest_path.exists() {
        let new_name = if extension.is_empty() {
            format!("{}_{}", stem, counter)
        } else {
            format!("{}_{}.{}", stem, counter, extension)
        };
        dest_path = destination.join(new_name);
        counter += 1;
    }

    dest_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{media_id_for_path, MediaKind};

    fn item_for(path: &Path) -> Item {
        Item {
            id: media_id_for_path(path),
            kind: MediaKind::Photo,
            folder: "cam".to_string(),
            taken_at: 0,
            byte_size: 5,
            path: Some(path.to_path_buf()),
            paired_video: None,
        }
    }

    #[test]
    fn test_move_and_restore_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("cam").join("img_1.jpg");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, b"bytes").unwrap();

        let dest = dir.path().join("trip");
        let mut mover = FsMediaMover::new();
        let outcome = mover.move_media(&[item_for(&source)], &dest).unwrap();

        let MoveOutcome::Moved(files) = outcome else {
            panic!("unexpected permission request")
        };
        assert_eq!(files.len(), 1);
        assert!(files[0].new_path.exists());
        assert!(!source.exists());

        mover.restore_media(&files[0].new_path, &source).unwrap();
        assert!(source.exists());
        assert!(!files[0].new_path.exists());
    }

    #[test]
    fn test_collision_gets_suffixed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("img.jpg"), b"existing").unwrap();

        let dest = unique_destination("img.jpg", dir.path());
        assert_eq!(dest.file_name().unwrap(), "img_1.jpg");
    }

    #[test]
    fn test_missing_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ghost = dir.path().join("gone.jpg");
        let mut mover = FsMediaMover::new();

        let err = mover
            .move_media(&[item_for(&ghost)], &dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, TriageError::MissingSource(_)));
    }
}

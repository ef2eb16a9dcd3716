//! Upload of staged theme images into the host image library

use crate::{StagingError, StagingResult};
use host::{AlbumId, ImageLibrary, ImageUpload};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Outcome of an album upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumUpload {
    /// Album the images went into; `None` when nothing was uploaded
    pub album: Option<AlbumId>,
    pub uploaded: usize,
    /// An album with this title already had images
    pub skipped_existing: bool,
}

/// Upload every file in `folder` into the album titled `title`.
///
/// Skipped when an album with that title already contains images. An
/// existing empty album is reused; otherwise one is created, but only when
/// there is something to upload.
pub fn upload_album_images(
    library: &dyn ImageLibrary,
    folder: &Path,
    title: &str,
    description: &str,
) -> StagingResult<AlbumUpload> {
    let albums = library.find_albums(title)?;
    if albums.iter().any(|a| a.image_count > 0) {
        debug!(album = title, "album already has images, skipping upload");
        return Ok(AlbumUpload {
            album: None,
            uploaded: 0,
            skipped_existing: true,
        });
    }

    let files = image_files(folder)?;
    if files.is_empty() {
        return Ok(AlbumUpload {
            album: None,
            uploaded: 0,
            skipped_existing: false,
        });
    }

    let album = match albums.first() {
        Some(existing) => existing.id,
        None => library.create_album(title, description)?,
    };

    for path in &files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let data = fs::read(path).map_err(StagingError::io(path))?;

        library.upload_image(album, ImageUpload::from_file_name(file_name, extension, data))?;
    }

    info!(album = title, images = files.len(), "uploaded template images");
    Ok(AlbumUpload {
        album: Some(album),
        uploaded: files.len(),
        skipped_existing: false,
    })
}

fn image_files(folder: &Path) -> StagingResult<Vec<std::path::PathBuf>> {
    if !folder.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(folder).map_err(StagingError::io(folder))? {
        let path = entry.map_err(StagingError::io(folder))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

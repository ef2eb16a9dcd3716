//! Media library model: albums and their images

use crate::{AlbumId, ImageId};
use serde::{Deserialize, Serialize};

/// Summary of an album returned by title queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSummary {
    pub id: AlbumId,
    pub title: String,
    pub image_count: usize,
}

/// An image to upload into an album
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub title: String,
    pub description: String,
    pub url_name: String,
    /// File extension including the leading dot, e.g. `.png`
    pub extension: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    /// Build an upload whose title, description and URL name are the file name
    pub fn from_file_name(file_name: impl Into<String>, extension: impl Into<String>, data: Vec<u8>) -> Self {
        let file_name = file_name.into();
        Self {
            title: file_name.clone(),
            description: file_name.clone(),
            url_name: file_name,
            extension: extension.into(),
            data,
        }
    }
}

/// A published image stored in an album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub id: ImageId,
    pub title: String,
    pub description: String,
    pub url_name: String,
    pub extension: String,
    pub size: usize,
}

/// An album with its images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub description: String,
    pub images: Vec<StoredImage>,
}

impl Album {
    pub fn summary(&self) -> AlbumSummary {
        AlbumSummary {
            id: self.id,
            title: self.title.clone(),
            image_count: self.images.len(),
        }
    }
}

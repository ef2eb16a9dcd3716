//! Error types for the import pipeline
//!
//! Every pipeline phase has its own error enum. `ImportError` wraps them so
//! the orchestrator can log and report a typed failure while the external
//! contract stays a plain success flag.

use crate::ImportState;
use host::HostError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors while unpacking the template archive
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The archive file does not exist
    #[error("Archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    /// IO error while reading the archive or writing entries
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Corrupt or unsupported archive
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Entry name resolves outside the destination directory
    #[error("Unsafe archive entry: {0}")]
    UnsafeEntry(String),
}

/// Result type for archive extraction
pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;

/// Errors while reading the layout document
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The layout document is not in the working directory
    #[error("Layout document not found: {}", .0.display())]
    MissingLayout(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML or unexpected document structure
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// A required element is absent
    #[error("Missing required element: {0}")]
    MissingElement(String),

    /// The template title cannot be used as a folder name
    #[error("Invalid template name: {0:?}")]
    InvalidTemplateName(String),
}

impl From<quick_xml::Error> for SchemaError {
    fn from(err: quick_xml::Error) -> Self {
        SchemaError::Xml(err.to_string())
    }
}

impl From<quick_xml::DeError> for SchemaError {
    fn from(err: quick_xml::DeError) -> Self {
        SchemaError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for SchemaError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        SchemaError::Xml(format!("Attribute error: {}", err))
    }
}

/// Result type for layout parsing
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Errors while staging assets into the installation folder
#[derive(Debug, Error)]
pub enum StagingError {
    /// Filesystem failure at a specific path
    #[error("Failed to stage {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Theme registration or album upload failed in the host
    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

impl StagingError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StagingError::Io { path, source }
    }
}

/// Result type for asset staging
pub type StagingResult<T> = std::result::Result<T, StagingError>;

/// Errors while turning widgets into host controls
#[derive(Debug, Error)]
pub enum MappingError {
    /// The host failed while creating or registering a control
    #[error("Host failed on widget {sf_id:?}: {source}")]
    Widget {
        sf_id: String,
        #[source]
        source: HostError,
    },

    /// The host failed outside of a specific widget
    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

impl MappingError {
    pub(crate) fn widget(sf_id: &str) -> impl FnOnce(HostError) -> Self {
        let sf_id = sf_id.to_string();
        move |source| MappingError::Widget { sf_id, source }
    }
}

/// Result type for widget mapping
pub type MappingResult<T> = std::result::Result<T, MappingError>;

/// Steps of the persist-and-publish sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStep {
    Save,
    Edit,
    CheckOut,
    CheckIn,
    Publish,
}

impl std::fmt::Display for PublishStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Save => write!(f, "save"),
            Self::Edit => write!(f, "edit"),
            Self::CheckOut => write!(f, "check out"),
            Self::CheckIn => write!(f, "check in"),
            Self::Publish => write!(f, "publish"),
        }
    }
}

/// Errors while persisting and publishing the template
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Template {step} failed: {source}")]
    Host {
        step: PublishStep,
        #[source]
        source: HostError,
    },
}

impl PublishError {
    pub(crate) fn at(step: PublishStep) -> impl FnOnce(HostError) -> Self {
        move |source| PublishError::Host { step, source }
    }
}

/// Result type for publishing
pub type PublishResult<T> = std::result::Result<T, PublishError>;

/// Coarse classification of an import failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Extraction,
    Schema,
    Staging,
    Mapping,
    Publish,
    Cancelled,
}

/// Failure of an import run
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Layout document rejected: {0}")]
    Schema(#[from] SchemaError),

    /// The layout document parsed to no template at all
    #[error("Layout document contains no template")]
    EmptySchema,

    #[error("Staging failed: {0}")]
    Staging(#[from] StagingError),

    #[error("Mapping failed: {0}")]
    Mapping(#[from] MappingError),

    #[error("Publishing failed: {0}")]
    Publish(#[from] PublishError),

    /// Cancellation was observed before entering `before`
    #[error("Import cancelled before {before:?}")]
    Cancelled { before: ImportState },
}

impl ImportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::Schema(_) | Self::EmptySchema => ErrorKind::Schema,
            Self::Staging(_) => ErrorKind::Staging,
            Self::Mapping(_) => ErrorKind::Mapping,
            Self::Publish(_) => ErrorKind::Publish,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }
}

/// Result type for an import run
pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// A cleanup step that failed; reported, never fatal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupIssue {
    pub path: PathBuf,
    pub message: String,
}

impl CleanupIssue {
    pub fn new(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

/// Errors while loading or saving importer settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for settings operations
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ImportError::EmptySchema.kind(), ErrorKind::Schema);
        assert_eq!(
            ImportError::Cancelled {
                before: ImportState::Parsed
            }
            .kind(),
            ErrorKind::Cancelled
        );
        let publish = PublishError::at(PublishStep::CheckIn)(HostError::Unavailable("down".into()));
        assert_eq!(ImportError::from(publish).kind(), ErrorKind::Publish);
    }

    #[test]
    fn test_publish_error_names_step() {
        let err = PublishError::at(PublishStep::CheckOut)(HostError::Rejected("locked".into()));
        assert_eq!(
            err.to_string(),
            "Template check out failed: Rejected by host: locked"
        );
    }
}

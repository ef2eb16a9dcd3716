//! Template import - turns a packaged page template into host objects
//!
//! This crate handles the whole import pipeline: archive extraction into a
//! private working directory, layout document parsing, staging of theme
//! assets into the template installation folder, theme registration, album
//! upload, widget-to-control mapping and the draft → publish transition.

mod album;
mod archive;
mod cancel;
mod culture;
mod error;
mod importer;
pub mod layout;
mod mapper;
mod settings;
mod staging;
mod theme;
mod workdir;

pub use album::*;
pub use archive::*;
pub use cancel::*;
pub use culture::*;
pub use error::*;
pub use importer::*;
pub use mapper::*;
pub use settings::*;
pub use staging::*;
pub use theme::*;
pub use workdir::*;

// Re-export the layout schema types used across the API
pub use layout::{
    parse_layout, parse_layout_file, Column, Layout, LayoutSchema, LayoutWidget, Metadata,
    MetadataItem, Placeholder, Widget, WidgetKind, WidgetPosition, WidgetProperties,
    LAYOUT_FILE, UNTITLED,
};

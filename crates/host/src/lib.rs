//! Host - the content-management host as seen by the template importer
//!
//! This crate provides:
//! - The host-domain model (page templates, controls, navigation modes,
//!   appearance configuration, image albums, cultures)
//! - The collaborator traits the importer consumes
//! - `MemoryHost`, an in-memory implementation of every collaborator

mod appearance;
mod culture;
mod error;
mod ids;
mod images;
mod memory;
mod services;
mod template;

pub use appearance::*;
pub use culture::*;
pub use error::*;
pub use ids::*;
pub use images::*;
pub use memory::*;
pub use services::*;
pub use template::*;

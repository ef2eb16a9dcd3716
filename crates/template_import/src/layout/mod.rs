//! Layout document model and parsing
//!
//! `layout.xml` describes the template as metadata items plus a tree of
//! placeholders → columns → widgets. The parser accepts leaf values written
//! either as attributes or as child elements.

mod parser;
mod schema;

pub use parser::{parse_layout, parse_layout_file};
pub use schema::*;

/// File name of the layout document inside an extracted archive
pub const LAYOUT_FILE: &str = "layout.xml";

/// Template name used when the layout carries no usable title
pub const UNTITLED: &str = "untitled";

/// Metadata item id holding the template title
pub const TITLE_ITEM: &str = "title";

//! blocknote converts block documents, the tree-shaped content model of
//! rich text block editors, to and from plain data, HTML and markdown.
//!
//! A document is a list of [`Block`](crate::schema::Block)s.  Each block has
//! a type, free-form props, content (styled inline text for all but tables)
//! and nested children.  Every representation has a decoder and an encoder:
//!
//! ```
//! use blocknote::html::to_html;
//! use blocknote::markdown::from_markdown;
//!
//! let blocks = from_markdown("# Hello\n\nSome **bold** text").unwrap();
//! assert_eq!(
//!     to_html(&blocks).unwrap(),
//!     "<h1>Hello</h1>\n<p>Some <strong>bold</strong> text</p>"
//! );
//! ```
//!
//! With the `pdf` feature blocks can also be exported through an external
//! HTML-to-PDF engine, see [`pdf`].
pub mod config;
pub mod dict;
pub mod error;
pub mod html;
pub mod markdown;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod pipeline;
pub mod schema;

pub use crate::error::{Error, Format};
pub use crate::pipeline::Pipeline;
pub use crate::schema::{Block, BlockType, InlineContent, Style, Styles};

/// Gives access to [`serde_json`] value functionality.
///
/// The [`Value`](crate::value::Value) type is used to represent arbitrary data in a few instances.
/// Notable examples are block [`props`](crate::schema::Block::props), inline
/// [`Styles`](crate::schema::Styles) and the [`dict`] wire form.
pub mod value {
    pub use serde_json::value::*;

    /// A re-export of the [`serde_json::json`] macro.
    pub use serde_json::json as value;

    pub use serde_json::{from_value, to_value};
}

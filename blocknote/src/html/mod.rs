//! Converts between blocks and HTML.
//!
//! The encoder emits one element per top-level block, the decoder accepts
//! that output back as well as reasonably similar hand written markup.
mod parse;
mod render;

pub use self::parse::{from_html, BLOCK_CLASS_PREFIX};
pub use self::render::{escape, to_html, HtmlRenderer};

//! Converts between blocks and markdown.
//!
//! Decoding runs the source through [`tokenize`] and interprets the
//! resulting flat token stream, encoding writes a small subset of markdown
//! (headings, paragraphs, lists and bold/italic emphasis).
mod parse;
mod render;
pub mod tokens;

pub use self::parse::{
    from_markdown, from_markdown_with_options, from_tokens, ListItems, MarkdownOptions,
};
pub use self::render::{render_block, to_markdown};
pub use self::tokens::tokenize;

//! Implements the HTML encoder.
use std::io::{self, Write};

use crate::error::{ConversionError, Direction, Error, Format, Position};
use crate::schema::{Block, BlockType, Content, InlineContent, Style};
use crate::value::Value;

/// Escapes text for use in HTML.
///
/// Only applied to literal text, never to generated markup.
pub fn escape(text: &str) -> String {
    let mut rv = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => rv.push_str("&amp;"),
            '<' => rv.push_str("&lt;"),
            '>' => rv.push_str("&gt;"),
            '"' => rv.push_str("&quot;"),
            '\'' => rv.push_str("&#x27;"),
            c => rv.push(c),
        }
    }
    rv
}

/// Object capable of rendering blocks to HTML.
///
/// Every top-level block becomes one element; elements are separated by a
/// newline.
pub struct HtmlRenderer<F> {
    out: F,
    blocks_written: usize,
}

impl<F: Write> HtmlRenderer<F> {
    /// Creates a new renderer that writes into a writer.
    pub fn new(out: F) -> HtmlRenderer<F> {
        HtmlRenderer {
            out,
            blocks_written: 0,
        }
    }

    /// Consumes the renderer and returns the inner writer.
    pub fn into_writer(self) -> F {
        self.out
    }

    fn inline(&mut self, item: &InlineContent) -> Result<(), io::Error> {
        let styles = &item.styles;
        let mut html = escape(&item.text);
        for &(style, tag) in &[
            (Style::Bold, "strong"),
            (Style::Italic, "em"),
            (Style::Underline, "u"),
            (Style::Strike, "s"),
            (Style::Code, "code"),
        ] {
            if styles.is_set(style) {
                html = format!("<{tag}>{}</{tag}>", html, tag = tag);
            }
        }
        if let Some(color) = styles.color(Style::BackgroundColor) {
            html = format!(
                "<span style=\"background-color: {}\">{}</span>",
                color, html
            );
        }
        if let Some(color) = styles.color(Style::TextColor) {
            html = format!("<span style=\"color: {}\">{}</span>", color, html);
        }
        write!(self.out, "{}", html)
    }

    fn content(&mut self, content: &Content) -> Result<(), io::Error> {
        match content {
            Content::Inline(items) => {
                for item in items {
                    self.inline(item)?;
                }
                Ok(())
            }
            Content::Table(value) => self.opaque(value),
        }
    }

    fn opaque(&mut self, value: &Value) -> Result<(), io::Error> {
        match value {
            Value::String(text) => write!(self.out, "{}", escape(text)),
            Value::Array(items) => {
                for (position, item) in items.iter().enumerate() {
                    match InlineContent::from_value(item, position) {
                        Ok(ref inline) if !item.is_string() => self.inline(inline)?,
                        _ => self.opaque(item)?,
                    }
                }
                Ok(())
            }
            Value::Null => Ok(()),
            other => write!(self.out, "{}", escape(&other.to_string())),
        }
    }

    fn list(&mut self, tag: &str, block: &Block) -> Result<(), io::Error> {
        write!(self.out, "<{}>", tag)?;
        if block.children().is_empty() {
            write!(self.out, "<li>")?;
            self.content(block.content())?;
            write!(self.out, "</li>")?;
        } else {
            for child in block.children() {
                if child.block_type() == BlockType::Paragraph {
                    write!(self.out, "<li>")?;
                    self.content(child.content())?;
                    write!(self.out, "</li>")?;
                }
            }
        }
        write!(self.out, "</{}>", tag)
    }

    /// Feeds a single top-level block into the renderer.
    pub fn feed_block(&mut self, block: &Block) -> Result<(), io::Error> {
        if self.blocks_written > 0 {
            writeln!(self.out)?;
        }
        self.blocks_written += 1;

        match block.block_type() {
            BlockType::Heading => {
                let level = block.heading_level();
                write!(self.out, "<h{}>", level)?;
                self.content(block.content())?;
                write!(self.out, "</h{}>", level)
            }
            BlockType::Paragraph => {
                write!(self.out, "<p>")?;
                self.content(block.content())?;
                write!(self.out, "</p>")
            }
            BlockType::BulletListItem => self.list("ul", block),
            BlockType::NumberedListItem => self.list("ol", block),
            BlockType::CheckListItem => {
                write!(
                    self.out,
                    "<div><input type=\"checkbox\" {} disabled> ",
                    if block.is_checked() { "checked" } else { "" }
                )?;
                self.content(block.content())?;
                write!(self.out, "</div>")
            }
            BlockType::Quote => {
                write!(self.out, "<blockquote>")?;
                self.content(block.content())?;
                write!(self.out, "</blockquote>")
            }
            BlockType::Table => {
                write!(self.out, "<div class='table-placeholder'>")?;
                self.content(block.content())?;
                write!(self.out, "</div>")
            }
            other => {
                write!(self.out, "<div class=\"blocknote-{}\">", other)?;
                self.content(block.content())?;
                write!(self.out, "</div>")
            }
        }
    }

    /// Feeds all blocks into the renderer.
    ///
    /// A failing block aborts rendering with an error naming its index.
    pub fn feed_blocks(&mut self, blocks: &[Block]) -> Result<(), Error> {
        for (index, block) in blocks.iter().enumerate() {
            self.feed_block(block).map_err(|err| {
                ConversionError::new(Format::Html, Direction::Encode, Position::Block(index), err)
            })?;
        }
        Ok(())
    }
}

impl HtmlRenderer<Vec<u8>> {
    /// Creates a new html renderer writing into a buffer.
    pub fn new_buffered() -> Self {
        HtmlRenderer::new(Vec::new())
    }

    /// Converts the renderer into a string.
    pub fn into_string(self) -> String {
        // only `str` data is ever written into the buffer
        String::from_utf8_lossy(&self.into_writer()).into_owned()
    }
}

/// Renders blocks into an HTML string.
///
/// An empty block list renders into an empty string.
pub fn to_html(blocks: &[Block]) -> Result<String, Error> {
    let mut renderer = HtmlRenderer::new_buffered();
    renderer.feed_blocks(blocks)?;
    let html = renderer.into_string();
    tracing::debug!(blocks = blocks.len(), bytes = html.len(), "encoded HTML");
    Ok(html)
}

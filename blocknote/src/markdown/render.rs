//! Implements the markdown encoder.
use std::fmt::Write;

use crate::error::{ConversionError, Direction, Error, Format, Position};
use crate::schema::{Block, BlockType, InlineContent, Style};

/// Renders a single inline span.
///
/// Only bold and italic survive, every other style is dropped.
fn inline(item: &InlineContent) -> String {
    let mut text = item.text.clone();
    if item.styles.is_set(Style::Bold) {
        text = format!("**{}**", text);
    }
    if item.styles.is_set(Style::Italic) {
        text = format!("*{}*", text);
    }
    text
}

fn content(block: &Block) -> String {
    block.inline_content().iter().map(inline).collect()
}

fn list_lines<F>(block: &Block, marker: F) -> Result<String, std::fmt::Error>
where
    F: Fn(usize) -> String,
{
    let mut rv = String::new();
    if block.children().is_empty() {
        write!(rv, "{} {}", marker(1), content(block))?;
        return Ok(rv);
    }
    // numbering follows the child position, including skipped children
    for (index, child) in block.children().iter().enumerate() {
        if child.block_type() != BlockType::Paragraph {
            continue;
        }
        if !rv.is_empty() {
            rv.push('\n');
        }
        write!(rv, "{} {}", marker(index + 1), content(child))?;
    }
    Ok(rv)
}

/// Renders one top-level block.
///
/// Block types without a markdown form render into an empty string.
pub fn render_block(block: &Block) -> Result<String, std::fmt::Error> {
    Ok(match block.block_type() {
        BlockType::Heading => format!("{} {}", "#".repeat(block.heading_level()), content(block)),
        BlockType::Paragraph => content(block),
        BlockType::BulletListItem => list_lines(block, |_| "*".to_string())?,
        BlockType::NumberedListItem => list_lines(block, |n| format!("{}.", n))?,
        _ => String::new(),
    })
}

/// Renders blocks into markdown.
///
/// Blocks are separated by a blank line, blocks that render into nothing
/// are left out.
pub fn to_markdown(blocks: &[Block]) -> Result<String, Error> {
    let mut parts = Vec::with_capacity(blocks.len());
    for (index, block) in blocks.iter().enumerate() {
        let part = render_block(block).map_err(|err| {
            ConversionError::new(
                Format::Markdown,
                Direction::Encode,
                Position::Block(index),
                err,
            )
        })?;
        if !part.is_empty() {
            parts.push(part);
        }
    }
    let rv = parts.join("\n\n");
    tracing::debug!(blocks = blocks.len(), bytes = rv.len(), "encoded markdown");
    Ok(rv)
}

#[test]
fn test_inline_styles() {
    use crate::schema::Styles;

    let item = InlineContent::styled(
        "x",
        Styles::new()
            .with(Style::Bold)
            .with(Style::Italic)
            .with(Style::Underline),
    );
    assert_eq!(inline(&item), "***x***");
}

#[test]
fn test_unsupported_blocks_are_dropped() {
    let blocks = vec![
        Block::paragraph("a"),
        Block::new("q", BlockType::Quote).with_text("quoted"),
        Block::new("t", BlockType::Table),
        Block::paragraph("b"),
    ];
    insta::assert_snapshot!(to_markdown(&blocks).unwrap(), @r###"
    a

    b
    "###);
}

#[test]
fn test_numbering_counts_all_children() {
    let block = Block::new("n", BlockType::NumberedListItem).with_children(vec![
        Block::paragraph("one"),
        Block::heading(2, "skipped"),
        Block::paragraph("three"),
    ]);
    assert_eq!(render_block(&block).unwrap(), "1. one\n3. three");
}

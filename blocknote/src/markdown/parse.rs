//! Implements the markdown decoder.
use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, Direction, Error, Format, Position};
use crate::markdown::tokens::{tokenize, InlineToken, Token, TokenKind};
use crate::schema::{generate_id, Block, BlockType, InlineContent, Style, Styles};

/// How lists are turned into blocks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListItems {
    /// One list block whose children are one paragraph per item.
    Extract,
    /// One empty placeholder block per list, skipping a fixed span of three
    /// tokens.  Item text that follows the skipped span is decoded as
    /// ordinary paragraphs.
    Placeholder,
}

impl Default for ListItems {
    fn default() -> ListItems {
        ListItems::Extract
    }
}

/// Configures the markdown decoder.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    /// Enables or disables extraction of list items.
    pub list_items: ListItems,
}

/// Why a token sequence could not be interpreted.
#[derive(Debug, thiserror::Error)]
enum TokenError {
    #[error("unexpected end of token stream, expected {0:?}")]
    UnexpectedEnd(TokenKind),
    #[error("expected {expected:?}, found {found:?}")]
    Unexpected { expected: TokenKind, found: TokenKind },
    #[error("{0:?} is never closed")]
    Unclosed(TokenKind),
}

fn expect(tokens: &[Token], index: usize, kind: TokenKind) -> Result<&Token, TokenError> {
    match tokens.get(index) {
        Some(token) if token.kind == kind => Ok(token),
        Some(token) => Err(TokenError::Unexpected {
            expected: kind,
            found: token.kind,
        }),
        None => Err(TokenError::UnexpectedEnd(kind)),
    }
}

/// Returns the index of the token closing the one at `start`.
fn matching_close(tokens: &[Token], start: usize) -> Result<usize, TokenError> {
    let open = tokens[start].kind;
    let close = match open.closing() {
        Some(close) => close,
        None => return Ok(start),
    };
    let mut depth = 0;
    for (index, token) in tokens.iter().enumerate().skip(start) {
        if token.kind == open {
            depth += 1;
        } else if token.kind == close {
            depth -= 1;
            if depth == 0 {
                return Ok(index);
            }
        }
    }
    Err(TokenError::Unclosed(open))
}

/// Converts inline tokens into inline content.
///
/// A strong or emphasis opener followed by literal text becomes one styled
/// span, consuming the opener, the text and the closer.  Other tokens with
/// literal text become unstyled spans, the rest is skipped.
fn inline_content(children: &[InlineToken]) -> Vec<InlineContent> {
    let mut content = Vec::new();
    let mut i = 0;
    while i < children.len() {
        let style = match children[i] {
            InlineToken::StrongOpen => Some(Style::Bold),
            InlineToken::EmOpen => Some(Style::Italic),
            _ => None,
        };
        match (style, children.get(i + 1).and_then(InlineToken::literal)) {
            (Some(style), Some(text)) => {
                content.push(InlineContent::styled(text, Styles::new().with(style)));
                i += 3;
            }
            (Some(_), None) => i += 1,
            (None, _) => {
                if let Some(text) = children[i].literal() {
                    content.push(InlineContent::text(text));
                }
                i += 1;
            }
        }
    }
    content
}

/// Reads the open/inline/close triple at `start`.
fn read_triple(
    tokens: &[Token],
    start: usize,
    close: TokenKind,
) -> Result<Vec<InlineContent>, TokenError> {
    let inline = expect(tokens, start + 1, TokenKind::Inline)?;
    expect(tokens, start + 2, close)?;
    Ok(inline_content(&inline.children))
}

fn read_heading(tokens: &[Token], start: usize) -> Result<Block, TokenError> {
    let level = tokens[start].level.unwrap_or(1);
    let content = read_triple(tokens, start, TokenKind::HeadingClose)?;
    Ok(Block::new(generate_id(), BlockType::Heading)
        .with_prop("level", level)
        .with_inline(content))
}

fn read_paragraph(tokens: &[Token], start: usize) -> Result<Block, TokenError> {
    let content = read_triple(tokens, start, TokenKind::ParagraphClose)?;
    Ok(Block::new(generate_id(), BlockType::Paragraph).with_inline(content))
}

/// Reads a whole list, returning the block and the index after its close.
fn read_list(tokens: &[Token], start: usize) -> Result<(Block, usize), TokenError> {
    let block_type = if tokens[start].kind == TokenKind::BulletListOpen {
        BlockType::BulletListItem
    } else {
        BlockType::NumberedListItem
    };
    let end = matching_close(tokens, start)?;

    let mut children = Vec::new();
    let mut i = start + 1;
    while i < end {
        if tokens[i].kind != TokenKind::ListItemOpen {
            i += 1;
            continue;
        }
        let item_end = matching_close(tokens, i)?;
        let mut j = i + 1;
        while j < item_end {
            match tokens[j].kind {
                TokenKind::ParagraphOpen => {
                    children.push(read_paragraph(tokens, j)?);
                    break;
                }
                kind if kind.closing().is_some() => j = matching_close(tokens, j)? + 1,
                _ => j += 1,
            }
        }
        i = item_end + 1;
    }

    Ok((
        Block::new(generate_id(), block_type).with_children(children),
        end + 1,
    ))
}

fn read_quote(tokens: &[Token], start: usize) -> Result<(Block, usize), TokenError> {
    let end = matching_close(tokens, start)?;
    let content = match tokens.get(start + 1) {
        Some(token) if token.kind == TokenKind::ParagraphOpen => {
            read_triple(tokens, start + 1, TokenKind::ParagraphClose)?
        }
        _ => Vec::new(),
    };
    Ok((
        Block::new(generate_id(), BlockType::Quote).with_inline(content),
        end + 1,
    ))
}

/// Interprets a token stream.
pub fn from_tokens(tokens: &[Token], options: &MarkdownOptions) -> Result<Vec<Block>, Error> {
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let step = match tokens[i].kind {
            TokenKind::HeadingOpen => read_heading(tokens, i).map(|block| (Some(block), i + 3)),
            TokenKind::ParagraphOpen => {
                read_paragraph(tokens, i).map(|block| (Some(block), i + 3))
            }
            TokenKind::BulletListOpen | TokenKind::OrderedListOpen => match options.list_items {
                ListItems::Extract => read_list(tokens, i).map(|(block, next)| (Some(block), next)),
                ListItems::Placeholder => {
                    let block_type = if tokens[i].kind == TokenKind::BulletListOpen {
                        BlockType::BulletListItem
                    } else {
                        BlockType::NumberedListItem
                    };
                    Ok((Some(Block::new(generate_id(), block_type)), i + 3))
                }
            },
            TokenKind::BlockquoteOpen => read_quote(tokens, i).map(|(block, next)| (Some(block), next)),
            kind => {
                tracing::trace!(position = i, kind = ?kind, "skipping token");
                Ok((None, i + 1))
            }
        };

        let (block, next) = step.map_err(|err| {
            ConversionError::new(Format::Markdown, Direction::Decode, Position::Token(i), err)
        })?;
        blocks.extend(block);
        i = next;
    }

    Ok(blocks)
}

/// Decodes markdown with default options.
pub fn from_markdown(source: &str) -> Result<Vec<Block>, Error> {
    from_markdown_with_options(source, &MarkdownOptions::default())
}

/// Decodes markdown into blocks.
///
/// Empty or whitespace only input yields no blocks.
pub fn from_markdown_with_options(
    source: &str,
    options: &MarkdownOptions,
) -> Result<Vec<Block>, Error> {
    if source.trim().is_empty() {
        return Ok(Vec::new());
    }
    let tokens = tokenize(source);
    let blocks = from_tokens(&tokens, options)?;
    tracing::debug!(tokens = tokens.len(), blocks = blocks.len(), "decoded markdown");
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_rule() {
        let content = inline_content(&[
            InlineToken::Text("a ".into()),
            InlineToken::StrongOpen,
            InlineToken::Text("b".into()),
            InlineToken::StrongClose,
            InlineToken::Other,
            InlineToken::EmOpen,
            InlineToken::Code("c".into()),
            InlineToken::EmClose,
        ]);
        assert_eq!(
            content,
            vec![
                InlineContent::text("a "),
                InlineContent::styled("b", Styles::new().with(Style::Bold)),
                InlineContent::styled("c", Styles::new().with(Style::Italic)),
            ]
        );
    }

    #[test]
    fn test_truncated_stream_is_an_error() {
        let tokens = vec![Token {
            kind: TokenKind::HeadingOpen,
            level: Some(1),
            children: Vec::new(),
            content: String::new(),
        }];
        let err = from_tokens(&tokens, &MarkdownOptions::default()).unwrap_err();
        match err {
            Error::Conversion(err) => assert_eq!(err.position, Position::Token(0)),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_placeholder_lists() {
        let options = MarkdownOptions {
            list_items: ListItems::Placeholder,
        };
        let blocks = from_markdown_with_options("* a\n* b", &options).unwrap();
        let types: Vec<_> = blocks.iter().map(|x| x.block_type()).collect();
        assert_eq!(types, vec![BlockType::BulletListItem, BlockType::Paragraph]);
        assert!(blocks[0].inline_content().is_empty());
        assert!(blocks[0].children().is_empty());
        assert_eq!(blocks[1].plain_text(), "b");
    }
}

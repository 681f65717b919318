//! Implements the HTML decoder.
//!
//! The decoder does not build a DOM.  It feeds the input through the
//! html5ever tokenizer and reacts to individual start tags, end tags and
//! character runs with a small state machine:
//!
//! - a tag stack with all currently open tags, used to find the list an
//!   `<li>` belongs to,
//! - a style stack, pushed by styling tags and popped by the end of any
//!   styling tag,
//! - at most one block under construction.
//!
//! Block level elements do not nest in this model.  Malformed markup is
//! tolerated: tags that are never closed simply never finish their block,
//! and any block closing end tag finishes the open block, matching or not.
use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::Attribute;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Error;
use crate::schema::{generate_id, Block, BlockType, InlineContent, Props, Style, Styles};
use crate::value::Value;

lazy_static! {
    static ref STYLE_DECL_RE: Regex = Regex::new(r"([^:;\s]+)\s*:\s*([^;]*)").unwrap();
}

/// Class prefix marking a generic block container.
pub const BLOCK_CLASS_PREFIX: &str = "blocknote-";

/// Tags whose end finishes the block under construction.
fn is_block_closing(tag: &str) -> bool {
    matches!(
        tag,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "blockquote" | "li" | "div"
    )
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn attr<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|attr| &*attr.name.local == name)
        .map(|attr| &*attr.value)
}

/// Parses the color declarations of a `style` attribute.
fn parse_style_attr(style: &str) -> Styles {
    let mut styles = Styles::new();
    for m in STYLE_DECL_RE.captures_iter(style) {
        let value = m[2].trim();
        match m[1].trim() {
            "color" => styles.set(Style::TextColor, value),
            "background-color" => styles.set(Style::BackgroundColor, value),
            _ => {}
        }
    }
    styles
}

/// Tags whose end pops one style frame.
fn is_style_closing(tag: &str) -> bool {
    tag_style(tag).is_some() || tag == "span"
}

/// The style a formatting tag switches on.
fn tag_style(tag: &str) -> Option<Style> {
    match tag {
        "strong" | "b" => Some(Style::Bold),
        "em" | "i" => Some(Style::Italic),
        "u" => Some(Style::Underline),
        "s" => Some(Style::Strike),
        "code" => Some(Style::Code),
        _ => None,
    }
}

struct PendingBlock {
    block_type: BlockType,
    props: Props,
    content: Vec<InlineContent>,
}

impl PendingBlock {
    fn new(block_type: BlockType) -> PendingBlock {
        PendingBlock {
            block_type,
            props: Props::new(),
            content: Vec::new(),
        }
    }

    fn finish(self) -> Block {
        Block::new(generate_id(), self.block_type)
            .with_props(self.props)
            .with_inline(self.content)
    }
}

/// The decoder state for one call.
#[derive(Default)]
struct DecodeState {
    tag_stack: Vec<String>,
    style_stack: Vec<Styles>,
    current: Option<PendingBlock>,
    text: String,
    after_checkbox: bool,
    blocks: Vec<Block>,
}

impl DecodeState {
    fn enclosing_list_type(&self) -> BlockType {
        for open in self.tag_stack.iter().rev() {
            match open.as_str() {
                "ul" => return BlockType::BulletListItem,
                "ol" => return BlockType::NumberedListItem,
                _ => {}
            }
        }
        tracing::debug!("list item outside of a list, assuming bullet list");
        BlockType::BulletListItem
    }

    fn open_block(&mut self, block_type: BlockType) {
        self.current = Some(PendingBlock::new(block_type));
        self.after_checkbox = false;
    }

    fn start_tag(&mut self, name: &str, attrs: &[Attribute]) {
        if let Some(level) = heading_level(name) {
            self.open_block(BlockType::Heading);
            if let Some(ref mut block) = self.current {
                block.props.insert("level".into(), Value::from(level));
            }
        } else if let Some(style) = tag_style(name) {
            self.style_stack.push(Styles::new().with(style));
        } else {
            match name {
                "p" => self.open_block(BlockType::Paragraph),
                "blockquote" => self.open_block(BlockType::Quote),
                "li" => {
                    let block_type = self.enclosing_list_type();
                    self.open_block(block_type);
                }
                "div" => {
                    let block_type = attr(attrs, "class")
                        .and_then(|class| class.strip_prefix(BLOCK_CLASS_PREFIX))
                        .and_then(|rest| rest.split_whitespace().next())
                        .and_then(|name| name.parse().ok())
                        .unwrap_or(BlockType::Paragraph);
                    self.open_block(block_type);
                }
                "input" => {
                    let is_checkbox = attr(attrs, "type")
                        .map_or(false, |ty| ty.eq_ignore_ascii_case("checkbox"));
                    if is_checkbox {
                        let checked = attr(attrs, "checked").is_some();
                        let block = self
                            .current
                            .get_or_insert_with(|| PendingBlock::new(BlockType::CheckListItem));
                        block.block_type = BlockType::CheckListItem;
                        block.props.insert("checked".into(), Value::from(checked));
                        self.after_checkbox = true;
                    }
                }
                "span" => {
                    let styles = attr(attrs, "style").map(parse_style_attr).unwrap_or_default();
                    if !styles.is_empty() {
                        self.style_stack.push(styles);
                    }
                }
                _ => {}
            }
        }

        self.tag_stack.push(name.to_string());
    }

    fn end_tag(&mut self, name: &str) {
        match self.tag_stack.iter().rposition(|open| open == name) {
            Some(index) => self.tag_stack.truncate(index),
            None => {
                tracing::trace!(tag = name, "unmatched end tag");
                self.tag_stack.pop();
            }
        }

        if is_block_closing(name) {
            if let Some(block) = self.current.take() {
                self.blocks.push(block.finish());
            }
            self.after_checkbox = false;
        } else if is_style_closing(name) {
            self.style_stack.pop();
        }
    }

    fn push_text(&mut self, data: &str) {
        self.text.push_str(data);
    }

    /// Appends the buffered character data to the open block.
    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let mut text = std::mem::take(&mut self.text);
        let block = match self.current {
            Some(ref mut block) => block,
            None => return,
        };

        if self.after_checkbox {
            self.after_checkbox = false;
            if text.starts_with(' ') {
                text.remove(0);
            }
        }
        if text.is_empty() {
            return;
        }

        let mut styles = Styles::new();
        for frame in &self.style_stack {
            styles.merge(frame);
        }
        block.content.push(InlineContent::styled(text, styles));
    }
}

fn handle_tag(state: &mut DecodeState, tag: &Tag) {
    let name: &str = &tag.name;
    match tag.kind {
        TagKind::StartTag => {
            state.start_tag(name, &tag.attrs);
            if tag.self_closing {
                state.end_tag(name);
            }
        }
        TagKind::EndTag => state.end_tag(name),
    }
}

/// Token sink driving the [`DecodeState`].
struct BlockSink {
    state: RefCell<DecodeState>,
}

impl TokenSink for BlockSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let mut state = self.state.borrow_mut();
        match token {
            Token::TagToken(tag) => {
                state.flush_text();
                handle_tag(&mut state, &tag);
            }
            Token::CharacterTokens(text) => state.push_text(&text),
            Token::EOFToken => state.flush_text(),
            Token::ParseError(err) => tracing::trace!(error = %err, "lenient HTML parse error"),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Decodes an HTML string into blocks.
///
/// Every finished block element becomes one block with a fresh id.  Empty
/// or whitespace only input yields no blocks.
pub fn from_html(html: &str) -> Result<Vec<Block>, Error> {
    if html.trim().is_empty() {
        return Ok(Vec::new());
    }

    let sink = BlockSink {
        state: RefCell::new(DecodeState::default()),
    };
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));
    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    let _ = tokenizer.feed(&input);
    tokenizer.end();

    let blocks = std::mem::take(&mut tokenizer.sink.state.borrow_mut().blocks);
    tracing::debug!(blocks = blocks.len(), "decoded HTML");
    Ok(blocks)
}

#[test]
fn test_style_attr() {
    let styles = parse_style_attr("color: red; background-color:#fff ; font-weight: bold");
    assert_eq!(styles.color(Style::TextColor).as_deref(), Some("red"));
    assert_eq!(styles.color(Style::BackgroundColor).as_deref(), Some("#fff"));
    assert_eq!(styles.iter().count(), 2);
}

#[test]
fn test_plain_span_end_pops_a_style_frame() {
    let blocks = from_html("<p><b><span>x</span>y</b></p>").unwrap();
    let items = blocks[0].inline_content();
    assert_eq!(items.len(), 2);
    assert!(items[0].styles.is_set(Style::Bold));
    assert!(items[1].styles.is_empty());
}

#[test]
fn test_style_end_on_empty_stack() {
    let blocks = from_html("<p>a</em>b</p>").unwrap();
    assert_eq!(blocks[0].plain_text(), "ab");
}

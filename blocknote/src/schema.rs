//! Implements the block document model.
//!
//! A document is a list of [`Block`]s.  Every block carries a type tag, a
//! free-form property map, its content and an ordered list of children.  The
//! content of every text bearing block is always a list of [`InlineContent`]
//! spans once the block exists; plain strings handed to the constructors are
//! coerced into a single unstyled span.  Only [`BlockType::Table`] keeps its
//! content as an opaque value.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SchemaError;
use crate::value::{Map, Value};

/// Block specific properties such as a heading's `level`.
pub type Props = Map<String, Value>;

/// Returns a fresh random block identifier.
///
/// Decoders use this for every block they synthesize.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns a short name for the JSON type of a value.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// The type of a block.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum BlockType {
    /// `<p>` equivalent.
    Paragraph,
    /// `<h1>` to `<h6>` equivalent, the level is in the `level` prop.
    Heading,
    /// An item of an unordered list.
    BulletListItem,
    /// An item of an ordered list.
    NumberedListItem,
    /// A checkbox item, the state is in the `checked` prop.
    CheckListItem,
    /// A collapsible list item.
    ToggleListItem,
    /// `<blockquote>` equivalent.
    Quote,
    /// A table.  Its content is passed through untouched.
    Table,
}

impl BlockType {
    /// All block types in declaration order.
    pub const ALL: [BlockType; 8] = [
        BlockType::Paragraph,
        BlockType::Heading,
        BlockType::BulletListItem,
        BlockType::NumberedListItem,
        BlockType::CheckListItem,
        BlockType::ToggleListItem,
        BlockType::Quote,
        BlockType::Table,
    ];

    /// Returns the wire name of the block type.
    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::Heading => "heading",
            BlockType::BulletListItem => "bulletListItem",
            BlockType::NumberedListItem => "numberedListItem",
            BlockType::CheckListItem => "checkListItem",
            BlockType::ToggleListItem => "toggleListItem",
            BlockType::Quote => "quote",
            BlockType::Table => "table",
        }
    }

    /// Returns `true` if the content of this block type is inline content.
    pub fn is_text_bearing(self) -> bool {
        self != BlockType::Table
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<BlockType, SchemaError> {
        BlockType::ALL
            .iter()
            .copied()
            .find(|block_type| block_type.as_str() == s)
            .ok_or_else(|| SchemaError::UnknownBlockType(s.to_string()))
    }
}

/// The kind of an inline content span.
///
/// Only text exists today.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InlineContentKind {
    Text,
}

impl Default for InlineContentKind {
    fn default() -> InlineContentKind {
        InlineContentKind::Text
    }
}

impl InlineContentKind {
    /// Returns the wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            InlineContentKind::Text => "text",
        }
    }
}

impl FromStr for InlineContentKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<InlineContentKind, SchemaError> {
        match s {
            "text" => Ok(InlineContentKind::Text),
            other => Err(SchemaError::UnknownInlineKind(other.to_string())),
        }
    }
}

/// A style key understood by the encoders.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Style {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    TextColor,
    BackgroundColor,
}

impl Style {
    /// Returns the key under which the style is stored.
    pub fn key(self) -> &'static str {
        match self {
            Style::Bold => "bold",
            Style::Italic => "italic",
            Style::Underline => "underline",
            Style::Strike => "strike",
            Style::Code => "code",
            Style::TextColor => "textColor",
            Style::BackgroundColor => "backgroundColor",
        }
    }
}

/// Styles applied to an inline span.
///
/// This is a plain mapping from style name to value.  Keys that are not a
/// known [`Style`] are kept so that documents survive a round trip, but no
/// encoder looks at them.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Styles(Map<String, Value>);

impl Styles {
    /// Creates an empty style set.
    pub fn new() -> Styles {
        Styles(Map::new())
    }

    /// Adds a boolean style switched on.
    pub fn with(mut self, style: Style) -> Styles {
        self.set(style, true);
        self
    }

    /// Adds a color valued style.
    pub fn with_color<S: Into<String>>(mut self, style: Style, color: S) -> Styles {
        self.set(style, color.into());
        self
    }

    /// Sets a style to an arbitrary value.
    pub fn set<V: Into<Value>>(&mut self, style: Style, value: V) {
        self.0.insert(style.key().to_string(), value.into());
    }

    /// Inserts a raw key, known or not.
    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the raw value of a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if a boolean style is switched on.
    ///
    /// Only a literal `true` counts.
    pub fn is_set(&self, style: Style) -> bool {
        matches!(self.0.get(style.key()), Some(Value::Bool(true)))
    }

    /// Returns the value of a color style if present.
    ///
    /// Non-string values are rendered through their JSON representation.
    pub fn color(&self, style: Style) -> Option<String> {
        self.0.get(style.key()).map(|value| match value {
            Value::String(color) => color.clone(),
            other => other.to_string(),
        })
    }

    /// Overlays another style set, its keys win on collision.
    pub fn merge(&mut self, other: &Styles) {
        for (key, value) in other.0.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Returns `true` if no style is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all keys and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Styles {
    fn from(map: Map<String, Value>) -> Styles {
        Styles(map)
    }
}

impl From<Styles> for Value {
    fn from(styles: Styles) -> Value {
        Value::Object(styles.0)
    }
}

/// A styled span of text inside a block.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineContent {
    pub kind: InlineContentKind,
    pub text: String,
    pub styles: Styles,
}

impl InlineContent {
    /// Creates an unstyled text span.
    pub fn text<S: Into<String>>(text: S) -> InlineContent {
        InlineContent::styled(text, Styles::new())
    }

    /// Creates a text span with styles.
    pub fn styled<S: Into<String>>(text: S, styles: Styles) -> InlineContent {
        InlineContent {
            kind: InlineContentKind::Text,
            text: text.into(),
            styles,
        }
    }

    /// Interprets a plain value as inline content.
    ///
    /// Accepts a bare string or a record with a `text` field and optional
    /// `type` (must be `text`) and `styles` fields.  `position` is only used
    /// for error reporting.
    pub fn from_value(value: &Value, position: usize) -> Result<InlineContent, SchemaError> {
        let invalid = |reason: String| SchemaError::InvalidInlineContent { position, reason };
        let record = match value {
            Value::String(text) => return Ok(InlineContent::text(text.as_str())),
            Value::Object(record) => record,
            other => {
                return Err(invalid(format!(
                    "expected a string or a mapping, got {}",
                    value_kind(other)
                )))
            }
        };

        let kind = match record.get("type") {
            None => InlineContentKind::Text,
            Some(Value::String(kind)) => kind.parse()?,
            Some(other) => {
                return Err(invalid(format!(
                    "`type` must be a string, got {}",
                    value_kind(other)
                )))
            }
        };
        let text = match record.get("text") {
            Some(Value::String(text)) => text.clone(),
            Some(other) => {
                return Err(invalid(format!(
                    "`text` must be a string, got {}",
                    value_kind(other)
                )))
            }
            None => return Err(invalid("missing `text`".into())),
        };
        let styles = match record.get("styles") {
            None | Some(Value::Null) => Styles::new(),
            Some(Value::Object(styles)) => Styles(styles.clone()),
            Some(other) => {
                return Err(invalid(format!(
                    "`styles` must be a mapping, got {}",
                    value_kind(other)
                )))
            }
        };

        Ok(InlineContent { kind, text, styles })
    }

    /// Returns the wire representation of the span.
    pub fn to_value(&self) -> Value {
        let mut record = Map::new();
        record.insert("type".into(), self.kind.as_str().into());
        record.insert("text".into(), self.text.clone().into());
        record.insert("styles".into(), self.styles.clone().into());
        Value::Object(record)
    }
}

/// The content of a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Styled spans, used by every text bearing block.
    Inline(Vec<InlineContent>),
    /// Opaque table content.
    Table(Value),
}

impl Content {
    /// Applies the construction time coercion for a block type.
    ///
    /// Strings become a single unstyled span, lists are converted element
    /// wise.  Table content is stored as given.  A missing (`None`) content
    /// is an empty span list.
    pub fn coerce(block_type: BlockType, raw: Option<&Value>) -> Result<Content, SchemaError> {
        if !block_type.is_text_bearing() {
            return Ok(Content::Table(
                raw.cloned().unwrap_or_else(|| Value::Array(Vec::new())),
            ));
        }
        match raw {
            None => Ok(Content::Inline(Vec::new())),
            Some(Value::String(text)) => Ok(Content::Inline(vec![InlineContent::text(
                text.as_str(),
            )])),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(position, item)| InlineContent::from_value(item, position))
                .collect::<Result<Vec<_>, _>>()
                .map(Content::Inline),
            Some(other) => Err(SchemaError::InvalidContent {
                block_type,
                found: value_kind(other),
            }),
        }
    }

    /// Returns the wire representation of the content.
    pub fn to_value(&self) -> Value {
        match self {
            Content::Inline(items) => Value::Array(items.iter().map(|x| x.to_value()).collect()),
            Content::Table(value) => value.clone(),
        }
    }
}

/// A node in the document tree.
///
/// Blocks are values: they are created in one go by a constructor or a
/// decoder and then only read.  Children are owned by their parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    id: String,
    block_type: BlockType,
    props: Props,
    content: Content,
    children: Vec<Block>,
}

impl Block {
    /// Creates a block without content, props or children.
    pub fn new<S: Into<String>>(id: S, block_type: BlockType) -> Block {
        Block {
            id: id.into(),
            block_type,
            props: Props::new(),
            content: if block_type.is_text_bearing() {
                Content::Inline(Vec::new())
            } else {
                Content::Table(Value::Array(Vec::new()))
            },
            children: Vec::new(),
        }
    }

    /// Creates a block from raw wire content, applying the coercion rule.
    pub fn build<S: Into<String>>(
        id: S,
        block_type: BlockType,
        content: Option<&Value>,
    ) -> Result<Block, SchemaError> {
        Ok(Block {
            content: Content::coerce(block_type, content)?,
            ..Block::new(id, block_type)
        })
    }

    /// Replaces the content with a single unstyled span.
    ///
    /// For tables the string is stored as opaque content.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Block {
        let text = text.into();
        self.content = if self.block_type.is_text_bearing() {
            Content::Inline(vec![InlineContent::text(text)])
        } else {
            Content::Table(Value::String(text))
        };
        self
    }

    /// Replaces the content with the given spans.
    ///
    /// For tables the spans are stored in their wire representation.
    pub fn with_inline(mut self, items: Vec<InlineContent>) -> Block {
        self.content = if self.block_type.is_text_bearing() {
            Content::Inline(items)
        } else {
            Content::Table(Content::Inline(items).to_value())
        };
        self
    }

    /// Replaces all props.
    pub fn with_props(mut self, props: Props) -> Block {
        self.props = props;
        self
    }

    /// Sets a single prop.
    pub fn with_prop<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Block {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Replaces the children.
    pub fn with_children(mut self, children: Vec<Block>) -> Block {
        self.children = children;
        self
    }

    /// Shortcut for a paragraph with a fresh id.
    pub fn paragraph<S: Into<String>>(text: S) -> Block {
        Block::new(generate_id(), BlockType::Paragraph).with_text(text)
    }

    /// Shortcut for a heading with a fresh id.
    pub fn heading<S: Into<String>>(level: i64, text: S) -> Block {
        Block::new(generate_id(), BlockType::Heading)
            .with_prop("level", level)
            .with_text(text)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Returns the inline spans, empty for tables.
    pub fn inline_content(&self) -> &[InlineContent] {
        match self.content {
            Content::Inline(ref items) => items,
            Content::Table(_) => &[],
        }
    }

    pub fn children(&self) -> &[Block] {
        &self.children
    }

    /// Returns the heading level clamped for rendering.
    ///
    /// Anything that is not an integer between 1 and 6 renders as level 1.
    pub fn heading_level(&self) -> usize {
        match self.props.get("level").and_then(Value::as_i64) {
            Some(level @ 1..=6) => level as usize,
            _ => 1,
        }
    }

    /// Returns `true` if the `checked` prop is literally `true`.
    pub fn is_checked(&self) -> bool {
        matches!(self.props.get("checked"), Some(Value::Bool(true)))
    }

    /// Returns the unstyled text of the block's own content.
    pub fn plain_text(&self) -> String {
        match self.content {
            Content::Inline(ref items) => items.iter().map(|x| x.text.as_str()).collect(),
            Content::Table(Value::String(ref text)) => text.clone(),
            Content::Table(_) => String::new(),
        }
    }
}

#[test]
fn test_string_content_is_coerced() {
    for &block_type in BlockType::ALL.iter().filter(|x| x.is_text_bearing()) {
        let block = Block::build("1", block_type, Some(&Value::from("hello"))).unwrap();
        assert_eq!(
            block.content(),
            &Content::Inline(vec![InlineContent::text("hello")])
        );
    }
}

#[test]
fn test_table_content_passes_through() {
    let raw = crate::value::value!({"rows": [["a", "b"]]});
    let block = Block::build("1", BlockType::Table, Some(&raw)).unwrap();
    assert_eq!(block.content(), &Content::Table(raw));
    assert!(block.inline_content().is_empty());
}

#[test]
fn test_invalid_content_is_rejected() {
    let err = Block::build("1", BlockType::Paragraph, Some(&Value::from(42))).unwrap_err();
    assert_eq!(
        err,
        SchemaError::InvalidContent {
            block_type: BlockType::Paragraph,
            found: "number"
        }
    );

    let err = Block::build(
        "1",
        BlockType::Quote,
        Some(&crate::value::value!(["ok", true])),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::InvalidInlineContent { position: 1, .. }
    ));

    let err = Block::build(
        "1",
        BlockType::Quote,
        Some(&crate::value::value!([{"type": "image", "text": "x"}])),
    )
    .unwrap_err();
    assert_eq!(err, SchemaError::UnknownInlineKind("image".into()));
}

#[test]
fn test_inline_records_are_coerced() {
    let raw = crate::value::value!([
        "plain",
        {"type": "text", "text": "bold", "styles": {"bold": true, "fancy": 1}},
        {"text": "bare"}
    ]);
    let block = Block::build("1", BlockType::Paragraph, Some(&raw)).unwrap();
    let items = block.inline_content();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0], InlineContent::text("plain"));
    assert!(items[1].styles.is_set(Style::Bold));
    assert_eq!(items[1].styles.get("fancy"), Some(&Value::from(1)));
    assert_eq!(items[2].text, "bare");
}

#[test]
fn test_block_type_names() {
    for &block_type in BlockType::ALL.iter() {
        assert_eq!(block_type.as_str().parse::<BlockType>(), Ok(block_type));
    }
    assert_eq!(
        "bogus".parse::<BlockType>(),
        Err(SchemaError::UnknownBlockType("bogus".into()))
    );
}

#[test]
fn test_heading_level_is_clamped() {
    let level = |value: Value| {
        Block::new("h", BlockType::Heading)
            .with_prop("level", value)
            .heading_level()
    };
    assert_eq!(level(Value::from(3)), 3);
    assert_eq!(level(Value::from(0)), 1);
    assert_eq!(level(Value::from(10)), 1);
    assert_eq!(level(Value::from(2.5)), 1);
    assert_eq!(level(Value::from("2")), 1);
    assert_eq!(Block::new("h", BlockType::Heading).heading_level(), 1);
}

#[test]
fn test_styles_merge_later_wins() {
    let mut styles = Styles::new().with(Style::Bold).with_color(Style::TextColor, "red");
    styles.merge(&Styles::new().with_color(Style::TextColor, "blue"));
    assert!(styles.is_set(Style::Bold));
    assert_eq!(styles.color(Style::TextColor).as_deref(), Some("blue"));
}

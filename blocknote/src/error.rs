//! Error types shared by all codecs.
use std::fmt;

use crate::schema::BlockType;

/// Boxed underlying cause of a [`ConversionError`].
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structurally invalid block or inline content.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// The block type tag is not one of the known block types.
    #[error("unknown block type `{0}`")]
    UnknownBlockType(String),
    /// The inline content kind is not `text`.
    #[error("unknown inline content type `{0}`")]
    UnknownInlineKind(String),
    /// Content of a text bearing block is neither a string nor a list.
    #[error("content for {block_type} must be a string or a list of inline content, got {found}")]
    InvalidContent {
        block_type: BlockType,
        found: &'static str,
    },
    /// A list element cannot be interpreted as inline content.
    #[error("invalid inline content at position {position}: {reason}")]
    InvalidInlineContent { position: usize, reason: String },
}

/// Path of a record inside a nested dict document, e.g. `[0].children[2]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexPath(Vec<usize>);

impl IndexPath {
    /// Path of a top-level record.
    pub fn root(index: usize) -> IndexPath {
        IndexPath(vec![index])
    }

    /// Path of the `index`th child below this record.
    pub fn child(&self, index: usize) -> IndexPath {
        let mut path = self.0.clone();
        path.push(index);
        IndexPath(path)
    }

    /// The individual indices, outermost first.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, index) in self.0.iter().enumerate() {
            if depth == 0 {
                write!(f, "[{}]", index)?;
            } else {
                write!(f, ".children[{}]", index)?;
            }
        }
        Ok(())
    }
}

/// What is wrong with a dict record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationErrorKind {
    #[error("missing required key `{0}`")]
    MissingKey(&'static str),
    #[error("invalid block type `{0}`")]
    InvalidBlockType(String),
    #[error("`{key}` must be {expected}, got {found}")]
    WrongShape {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A dict record could not be turned into a block.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid block at {path}: {kind}")]
pub struct ValidationError {
    pub path: IndexPath,
    pub kind: ValidationErrorKind,
}

/// The external representation a codec works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Plain nested data, carried as JSON text where a string is needed.
    #[serde(alias = "json")]
    Dict,
    Html,
    Markdown,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Dict => "dict",
            Format::Html => "HTML",
            Format::Markdown => "markdown",
        })
    }
}

/// Whether a conversion was going into or out of the block tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encode,
    Decode,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Encode => "encoding",
            Direction::Decode => "decoding",
        })
    }
}

/// Where in the traversal a conversion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Index of a top-level block.
    Block(usize),
    /// Index into the markdown token stream.
    Token(usize),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Position::Block(index) => write!(f, "block at index {}", index),
            Position::Token(index) => write!(f, "token at position {}", index),
        }
    }
}

/// A failure during an encode or decode traversal.
#[derive(Debug, thiserror::Error)]
#[error("{format} {direction} failed at {position}: {source}")]
pub struct ConversionError {
    pub format: Format,
    pub direction: Direction,
    pub position: Position,
    #[source]
    pub source: Cause,
}

impl ConversionError {
    pub(crate) fn new<E: Into<Cause>>(
        format: Format,
        direction: Direction,
        position: Position,
        source: E,
    ) -> ConversionError {
        ConversionError {
            format,
            direction,
            position,
            source: source.into(),
        }
    }
}

/// The error type returned by all public entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The top-level input has the wrong type.
    #[error("expected {expected}, got {found}")]
    Type {
        expected: &'static str,
        found: String,
    },
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "pdf")]
    #[error(transparent)]
    Pdf(#[from] crate::pdf::PdfError),
}

//! Routes documents between representations.
use std::str::FromStr;

use crate::dict::{from_dict, to_dict};
use crate::error::{Error, Format};
use crate::html::{from_html, to_html};
use crate::markdown::{from_markdown_with_options, to_markdown, MarkdownOptions};
use crate::schema::Block;
use crate::value::Value;

/// Raised for unknown format names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown format `{0}` (expected json, dict, html or markdown)")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Format, UnknownFormat> {
        match s.to_ascii_lowercase().as_str() {
            "json" | "dict" => Ok(Format::Dict),
            "html" | "htm" => Ok(Format::Html),
            "markdown" | "md" => Ok(Format::Markdown),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Helper for decoding and encoding with preconfigured options.
#[derive(Debug, Default, Clone)]
pub struct Pipeline {
    markdown: MarkdownOptions,
}

impl Pipeline {
    /// Creates a new pipeline with default options.
    pub fn new() -> Pipeline {
        Pipeline::default()
    }

    /// Changes the markdown decoding options.
    pub fn set_markdown_options(&mut self, options: &MarkdownOptions) {
        self.markdown = options.clone();
    }

    /// Decodes a source document.
    pub fn decode(&self, format: Format, source: &str) -> Result<Vec<Block>, Error> {
        match format {
            Format::Dict => from_dict(&serde_json::from_str::<Value>(source)?),
            Format::Html => from_html(source),
            Format::Markdown => from_markdown_with_options(source, &self.markdown),
        }
    }

    /// Encodes blocks.
    pub fn encode(&self, format: Format, blocks: &[Block]) -> Result<String, Error> {
        match format {
            Format::Dict => Ok(serde_json::to_string_pretty(&to_dict(blocks))?),
            Format::Html => to_html(blocks),
            Format::Markdown => to_markdown(blocks),
        }
    }

    /// Converts a document from one format into another.
    pub fn convert(&self, source: &str, from: Format, to: Format) -> Result<String, Error> {
        let blocks = self.decode(from, source)?;
        tracing::debug!(%from, %to, blocks = blocks.len(), "converting document");
        self.encode(to, &blocks)
    }
}

#[test]
fn test_format_names() {
    assert_eq!("dict".parse::<Format>().unwrap(), Format::Dict);
    assert_eq!("MD".parse::<Format>().unwrap(), Format::Markdown);
    assert_eq!(
        "pdf".parse::<Format>().unwrap_err().to_string(),
        "unknown format `pdf` (expected json, dict, html or markdown)"
    );
}

#[test]
fn test_basic_pipeline() {
    let pipeline = Pipeline::new();
    insta::assert_snapshot!(
        pipeline.convert("# Hello World!\n\nAha **bold**", Format::Markdown, Format::Html).unwrap(),
        @r###"
    <h1>Hello World!</h1>
    <p>Aha <strong>bold</strong></p>
    "###
    );
}

#[test]
fn test_json_roundtrip() {
    let pipeline = Pipeline::new();
    let json = pipeline
        .convert("<p>a</p>", Format::Html, Format::Dict)
        .unwrap();
    let blocks = pipeline.decode(Format::Dict, &json).unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].plain_text(), "a");
    assert!(matches!(
        pipeline.decode(Format::Dict, "{nope"),
        Err(Error::Json(_))
    ));
}

//! Flattens the pulldown-cmark event stream into block tokens.
//!
//! The markdown decoder walks a flat list of tokens in the style of
//! markdown-it: every block level element produces an open and a close
//! token, and the inline content of headings and paragraphs travels in a
//! single [`TokenKind::Inline`] token between them.  Paragraphs of tight
//! list items, which cmark does not wrap, get implicit paragraph tokens so
//! that list items always look the same.
use pulldown_cmark as cm;
use serde::Serialize;

/// The kind of a block token.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    HeadingOpen,
    HeadingClose,
    ParagraphOpen,
    ParagraphClose,
    BulletListOpen,
    BulletListClose,
    OrderedListOpen,
    OrderedListClose,
    ListItemOpen,
    ListItemClose,
    BlockquoteOpen,
    BlockquoteClose,
    /// Inline content of the enclosing heading or paragraph.
    Inline,
    /// A fenced or indented code block.
    CodeBlock,
    /// Anything else (rules, raw HTML blocks, ...).
    Other,
}

impl TokenKind {
    /// Returns the closing kind for an opening kind.
    pub fn closing(self) -> Option<TokenKind> {
        match self {
            TokenKind::HeadingOpen => Some(TokenKind::HeadingClose),
            TokenKind::ParagraphOpen => Some(TokenKind::ParagraphClose),
            TokenKind::BulletListOpen => Some(TokenKind::BulletListClose),
            TokenKind::OrderedListOpen => Some(TokenKind::OrderedListClose),
            TokenKind::ListItemOpen => Some(TokenKind::ListItemClose),
            TokenKind::BlockquoteOpen => Some(TokenKind::BlockquoteClose),
            _ => None,
        }
    }
}

/// An inline token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "content")]
pub enum InlineToken {
    Text(String),
    StrongOpen,
    StrongClose,
    EmOpen,
    EmClose,
    Code(String),
    Html(String),
    SoftBreak,
    HardBreak,
    /// Markup without a literal text representation.
    Other,
}

impl InlineToken {
    /// Returns the literal text carried by the token.
    pub fn literal(&self) -> Option<&str> {
        match self {
            InlineToken::Text(text) | InlineToken::Code(text) | InlineToken::Html(text) => {
                Some(text)
            }
            InlineToken::SoftBreak | InlineToken::HardBreak => Some("\n"),
            _ => None,
        }
    }
}

/// A block token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Heading depth for heading tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    /// Inline children of an [`TokenKind::Inline`] token.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<InlineToken>,
    /// Raw content of code blocks.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
}

impl Token {
    fn new(kind: TokenKind) -> Token {
        Token {
            kind,
            level: None,
            children: Vec::new(),
            content: String::new(),
        }
    }

    fn with_level(kind: TokenKind, level: u8) -> Token {
        Token {
            level: Some(level),
            ..Token::new(kind)
        }
    }
}

/// Inline run being collected.
struct InlineRun {
    children: Vec<InlineToken>,
    /// The run was opened for a tight list item.
    implicit: bool,
}

struct Flattener {
    tokens: Vec<Token>,
    inline: Option<InlineRun>,
}

impl Flattener {
    fn open_inline(&mut self, implicit: bool) {
        self.inline = Some(InlineRun {
            children: Vec::new(),
            implicit,
        });
    }

    fn close_inline(&mut self) {
        if let Some(run) = self.inline.take() {
            self.tokens.push(Token {
                children: run.children,
                ..Token::new(TokenKind::Inline)
            });
            if run.implicit {
                self.tokens.push(Token::new(TokenKind::ParagraphClose));
            }
        }
    }

    /// Closes an implicit paragraph before block level structure.
    fn close_implicit(&mut self) {
        if self.inline.as_ref().map_or(false, |run| run.implicit) {
            self.close_inline();
        }
    }

    fn push_inline(&mut self, token: InlineToken) {
        if self.inline.is_none() {
            self.tokens.push(Token::new(TokenKind::ParagraphOpen));
            self.open_inline(true);
        }
        if let Some(ref mut run) = self.inline {
            // pulldown-cmark splits text around escapes and entities
            if let (InlineToken::Text(new), Some(InlineToken::Text(last))) =
                (&token, run.children.last_mut())
            {
                last.push_str(new);
                return;
            }
            run.children.push(token);
        }
    }

    fn push_block(&mut self, token: Token) {
        self.close_implicit();
        self.tokens.push(token);
    }
}

/// Reads raw text until the end of the current tag.
fn read_raw<'data, I: Iterator<Item = cm::Event<'data>>>(iter: &mut I) -> String {
    let mut depth = 1;
    let mut buf = String::new();
    for event in iter {
        match event {
            cm::Event::Start(..) => depth += 1,
            cm::Event::End(..) => depth -= 1,
            cm::Event::Text(text) | cm::Event::Code(text) | cm::Event::Html(text) => {
                buf.push_str(&text)
            }
            cm::Event::SoftBreak | cm::Event::HardBreak => buf.push('\n'),
            _ => {}
        }
        if depth == 0 {
            break;
        }
    }
    buf
}

/// Tokenizes markdown source.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut iter = cm::Parser::new_ext(source, cm::Options::empty());
    let mut out = Flattener {
        tokens: Vec::new(),
        inline: None,
    };

    while let Some(event) = iter.next() {
        match event {
            cm::Event::Start(cm::Tag::Heading { level, .. }) => {
                out.push_block(Token::with_level(TokenKind::HeadingOpen, level as u8));
                out.open_inline(false);
            }
            cm::Event::End(cm::TagEnd::Heading(level)) => {
                out.close_inline();
                out.tokens
                    .push(Token::with_level(TokenKind::HeadingClose, level as u8));
            }
            cm::Event::Start(cm::Tag::Paragraph) => {
                out.push_block(Token::new(TokenKind::ParagraphOpen));
                out.open_inline(false);
            }
            cm::Event::End(cm::TagEnd::Paragraph) => {
                out.close_inline();
                out.tokens.push(Token::new(TokenKind::ParagraphClose));
            }
            cm::Event::Start(cm::Tag::BlockQuote(_)) => {
                out.push_block(Token::new(TokenKind::BlockquoteOpen))
            }
            cm::Event::End(cm::TagEnd::BlockQuote(_)) => {
                out.push_block(Token::new(TokenKind::BlockquoteClose))
            }
            cm::Event::Start(cm::Tag::List(None)) => {
                out.push_block(Token::new(TokenKind::BulletListOpen))
            }
            cm::Event::Start(cm::Tag::List(Some(_))) => {
                out.push_block(Token::new(TokenKind::OrderedListOpen))
            }
            cm::Event::End(cm::TagEnd::List(ordered)) => out.push_block(Token::new(if ordered {
                TokenKind::OrderedListClose
            } else {
                TokenKind::BulletListClose
            })),
            cm::Event::Start(cm::Tag::Item) => out.push_block(Token::new(TokenKind::ListItemOpen)),
            cm::Event::End(cm::TagEnd::Item) => out.push_block(Token::new(TokenKind::ListItemClose)),
            cm::Event::Start(cm::Tag::CodeBlock(_)) => {
                let content = read_raw(&mut iter);
                out.push_block(Token {
                    content,
                    ..Token::new(TokenKind::CodeBlock)
                });
            }
            cm::Event::Start(cm::Tag::HtmlBlock) => {
                let content = read_raw(&mut iter);
                out.push_block(Token {
                    content,
                    ..Token::new(TokenKind::Other)
                });
            }
            cm::Event::Rule => out.push_block(Token::new(TokenKind::Other)),
            cm::Event::Start(cm::Tag::Strong) => out.push_inline(InlineToken::StrongOpen),
            cm::Event::End(cm::TagEnd::Strong) => out.push_inline(InlineToken::StrongClose),
            cm::Event::Start(cm::Tag::Emphasis) => out.push_inline(InlineToken::EmOpen),
            cm::Event::End(cm::TagEnd::Emphasis) => out.push_inline(InlineToken::EmClose),
            cm::Event::Text(text) => out.push_inline(InlineToken::Text(text.into_string())),
            cm::Event::Code(code) => out.push_inline(InlineToken::Code(code.into_string())),
            cm::Event::InlineHtml(html) => out.push_inline(InlineToken::Html(html.into_string())),
            cm::Event::SoftBreak => out.push_inline(InlineToken::SoftBreak),
            cm::Event::HardBreak => out.push_inline(InlineToken::HardBreak),
            cm::Event::Start(_) | cm::Event::End(_) => {
                if out.inline.is_some() {
                    out.push_inline(InlineToken::Other);
                }
            }
            _ => {}
        }
    }
    out.close_implicit();

    out.tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|x| x.kind).collect()
    }

    #[test]
    fn test_heading_and_paragraph() {
        let tokens = tokenize("## Title\n\nSome *text*");
        assert_eq!(
            tokens.iter().map(|x| x.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::HeadingOpen,
                TokenKind::Inline,
                TokenKind::HeadingClose,
                TokenKind::ParagraphOpen,
                TokenKind::Inline,
                TokenKind::ParagraphClose,
            ]
        );
        assert_eq!(tokens[0].level, Some(2));
        assert_eq!(
            tokens[4].children,
            vec![
                InlineToken::Text("Some ".into()),
                InlineToken::EmOpen,
                InlineToken::Text("text".into()),
                InlineToken::EmClose,
            ]
        );
    }

    #[test]
    fn test_tight_list_items_get_paragraphs() {
        assert_eq!(
            kinds("* a\n* b"),
            vec![
                TokenKind::BulletListOpen,
                TokenKind::ListItemOpen,
                TokenKind::ParagraphOpen,
                TokenKind::Inline,
                TokenKind::ParagraphClose,
                TokenKind::ListItemClose,
                TokenKind::ListItemOpen,
                TokenKind::ParagraphOpen,
                TokenKind::Inline,
                TokenKind::ParagraphClose,
                TokenKind::ListItemClose,
                TokenKind::BulletListClose,
            ]
        );
    }

    #[test]
    fn test_escaped_text_is_coalesced() {
        let tokens = tokenize("a \\* b");
        assert_eq!(tokens[1].children, vec![InlineToken::Text("a * b".into())]);
    }

    #[test]
    fn test_code_block() {
        let tokens = tokenize("```\nlet x = 1;\n```");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::CodeBlock);
        assert_eq!(tokens[0].content, "let x = 1;\n");
    }
}

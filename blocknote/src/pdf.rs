//! Exports blocks as PDF.
//!
//! Blocks are encoded to HTML, wrapped into a complete print document and
//! handed to a [`RenderingEngine`].  The crate does not rasterize anything
//! itself; [`ExternalEngine`] pipes the document through an external
//! HTML-to-PDF program (`weasyprint - -`, `wkhtmltopdf - -` and friends).
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::Error;
use crate::html::to_html;
use crate::schema::Block;

/// The document produced for an empty block list.
pub const EMPTY_DOCUMENT: &str =
    "<!DOCTYPE html><html><head><title>Empty Document</title></head><body></body></html>";

const DEFAULT_CSS: &[&str] = &[
    "body { font-family: -apple-system, sans-serif; line-height: 1.6; color: #333; font-size: 12pt; }",
    "h1,h2,h3,h4,h5,h6 { color: #2c3e50; margin-top: 1.5em; margin-bottom: 0.5em; page-break-after: avoid; }",
    "h1 { font-size: 24pt; }",
    "h2 { font-size: 20pt; }",
    "h3 { font-size: 16pt; }",
    "h4 { font-size: 14pt; }",
    "h5 { font-size: 12pt; }",
    "h6 { font-size: 11pt; }",
    "p { margin-bottom: 1em; orphans: 2; widows: 2; }",
    "ul,ol { margin-bottom: 1em; padding-left: 2em; }",
    "li { margin-bottom: 0.25em; }",
    "blockquote { margin: 1em 0; padding: 0.5em 1em; border-left: 4px solid #3498db; background-color: #f8f9f9; font-style: italic; }",
    "code { background-color: #f1f2f6; padding: 0.2em 0.4em; border-radius: 3px; font-family: Monaco, monospace; font-size: 0.9em; }",
    "strong { font-weight: 600; }",
    "em { font-style: italic; }",
    "u { text-decoration: underline; }",
    "s { text-decoration: line-through; }",
    ".table-placeholder { border: 1px solid #ddd; padding: 1em; background-color: #f9f9f9; text-align: center; font-style: italic; }",
    "input[type='checkbox'] { margin-right: 0.5em; }",
    ".page-break { page-break-before: always; }",
    ".no-break { page-break-inside: avoid; }",
];

/// Errors raised while producing a PDF.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// No engine is configured or the configured one cannot be started.
    #[error("PDF rendering engine is not available: {0}")]
    EngineUnavailable(String),
    /// The engine ran but failed.
    #[error("PDF rendering engine failed ({}): {stderr}", describe_status(.status))]
    Engine { status: Option<i32>, stderr: String },
    /// The template file does not exist.
    #[error("template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".into(),
    }
}

/// A page size understood by CSS `@page` rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PageSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    /// Any other size expression, passed through verbatim.
    Custom(String),
}

impl Default for PageSize {
    fn default() -> PageSize {
        PageSize::A4
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::A3 => write!(f, "A3"),
            PageSize::A4 => write!(f, "A4"),
            PageSize::A5 => write!(f, "A5"),
            PageSize::Letter => write!(f, "letter"),
            PageSize::Legal => write!(f, "legal"),
            PageSize::Custom(size) => write!(f, "{}", size),
        }
    }
}

impl From<String> for PageSize {
    fn from(size: String) -> PageSize {
        match size.to_ascii_lowercase().as_str() {
            "a3" => PageSize::A3,
            "a4" => PageSize::A4,
            "a5" => PageSize::A5,
            "letter" => PageSize::Letter,
            "legal" => PageSize::Legal,
            _ => PageSize::Custom(size),
        }
    }
}

impl From<PageSize> for String {
    fn from(size: PageSize) -> String {
        size.to_string()
    }
}

impl std::str::FromStr for PageSize {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<PageSize, Self::Err> {
        Ok(PageSize::from(s.to_string()))
    }
}

/// Customizes the print document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfOptions {
    /// The page size of the `@page` rule.
    pub page_size: PageSize,
    /// The page margin of the `@page` rule.
    pub margin: String,
    /// Extra CSS appended after the default stylesheet.
    pub css: Option<String>,
}

impl Default for PdfOptions {
    fn default() -> PdfOptions {
        PdfOptions {
            page_size: PageSize::A4,
            margin: "2cm".into(),
            css: None,
        }
    }
}

/// Turns a complete HTML document into PDF bytes.
pub trait RenderingEngine {
    fn render(&self, document: &str) -> Result<Vec<u8>, PdfError>;
}

/// Renders through an external program reading HTML on stdin and writing
/// PDF to stdout.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalEngine {
    /// The executable to run.
    pub cmd: Option<PathBuf>,
    /// The arguments to pass to the external command.
    pub args: Vec<String>,
}

impl ExternalEngine {
    /// Creates an engine for the given command.
    pub fn new<P: Into<PathBuf>>(cmd: P) -> ExternalEngine {
        ExternalEngine {
            cmd: Some(cmd.into()),
            args: Vec::new(),
        }
    }

    /// Adds an argument.
    pub fn arg<S: Into<String>>(mut self, arg: S) -> ExternalEngine {
        self.args.push(arg.into());
        self
    }

    async fn run(&self, cmd: &Path, document: &str) -> Result<Vec<u8>, PdfError> {
        let mut child = Command::new(cmd)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => {
                    PdfError::EngineUnavailable(format!("{} not found", cmd.display()))
                }
                _ => PdfError::Io(err),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PdfError::EngineUnavailable("stdin is not piped".into()))?;
        let write = async move {
            stdin.write_all(document.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            return Err(PdfError::Engine {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written?;
        Ok(output.stdout)
    }
}

impl RenderingEngine for ExternalEngine {
    fn render(&self, document: &str) -> Result<Vec<u8>, PdfError> {
        let cmd = match self.cmd {
            Some(ref cmd) => cmd,
            None => return Err(PdfError::EngineUnavailable("no command configured".into())),
        };
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        tracing::debug!(cmd = %cmd.display(), bytes = document.len(), "running PDF engine");
        rt.block_on(self.run(cmd, document))
    }
}

/// Wraps encoded blocks into a complete print document.
pub fn render_document(blocks: &[Block], options: &PdfOptions) -> Result<String, Error> {
    if blocks.is_empty() {
        return Ok(EMPTY_DOCUMENT.to_string());
    }
    let body = to_html(blocks)?;

    let mut css = format!(
        "@page {{size: {}; margin: {}; }}",
        options.page_size, options.margin
    );
    for rule in DEFAULT_CSS {
        css.push_str("\n        ");
        css.push_str(rule);
    }
    if let Some(ref extra) = options.css {
        if !extra.is_empty() {
            css.push_str("\n\n");
            css.push_str(extra);
        }
    }

    Ok(format!(
        "<!DOCTYPE html><html lang='en'><head><meta charset='UTF-8'>\
         <meta name='viewport' content='width=device-width, initial-scale=1.0'>\
         <title>BlockNote Document</title><style>{}</style></head>\
         <body>{}</body></html>",
        css, body
    ))
}

/// Fills `{{name}}` placeholders of a template, then `{{content}}`.
pub fn fill_template(template: &str, vars: &BTreeMap<String, String>, content: &str) -> String {
    let mut rv = template.to_string();
    for (key, value) in vars {
        rv = rv.replace(&format!("{{{{{}}}}}", key), value);
    }
    rv.replace("{{content}}", content)
}

/// Renders blocks into PDF bytes.
pub fn to_pdf<E: RenderingEngine + ?Sized>(
    blocks: &[Block],
    options: &PdfOptions,
    engine: &E,
) -> Result<Vec<u8>, Error> {
    let document = render_document(blocks, options)?;
    Ok(engine.render(&document)?)
}

/// Renders blocks into PDF bytes and writes them to a file.
pub fn write_pdf<E: RenderingEngine + ?Sized, P: AsRef<Path>>(
    blocks: &[Block],
    path: P,
    options: &PdfOptions,
    engine: &E,
) -> Result<Vec<u8>, Error> {
    let bytes = to_pdf(blocks, options, engine)?;
    std::fs::write(path.as_ref(), &bytes).map_err(PdfError::Io)?;
    tracing::debug!(path = %path.as_ref().display(), bytes = bytes.len(), "wrote PDF");
    Ok(bytes)
}

/// Renders blocks into PDF bytes through a custom HTML template.
///
/// The template receives the encoded blocks (without the default document
/// wrapper) in place of `{{content}}`.
pub fn to_pdf_with_template<E: RenderingEngine + ?Sized, P: AsRef<Path>>(
    blocks: &[Block],
    template_path: P,
    vars: &BTreeMap<String, String>,
    engine: &E,
) -> Result<Vec<u8>, Error> {
    let template_path = template_path.as_ref();
    let template = std::fs::read_to_string(template_path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => PdfError::TemplateNotFound(template_path.to_path_buf()),
        _ => PdfError::Io(err),
    })?;
    let body = to_html(blocks)?;
    let document = fill_template(&template, vars, &body);
    Ok(engine.render(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl RenderingEngine for Echo {
        fn render(&self, document: &str) -> Result<Vec<u8>, PdfError> {
            Ok(document.as_bytes().to_vec())
        }
    }

    #[test]
    fn test_empty_document() {
        let bytes = to_pdf(&[], &PdfOptions::default(), &Echo).unwrap();
        assert_eq!(bytes, EMPTY_DOCUMENT.as_bytes());
    }

    #[test]
    fn test_document_styles() {
        let options = PdfOptions {
            page_size: "letter".parse().unwrap(),
            margin: "1in".into(),
            css: Some("p { color: red; }".into()),
        };
        let doc = render_document(&[Block::paragraph("Hi")], &options).unwrap();
        assert!(doc.contains("<style>@page {size: letter; margin: 1in; }\n        body {"));
        assert!(doc.contains(".no-break { page-break-inside: avoid; }\n\np { color: red; }</style>"));
        assert!(doc.ends_with("<body><p>Hi</p></body></html>"));
    }

    #[test]
    fn test_page_size_serde() {
        let options: PdfOptions = serde_json::from_str(r#"{"page_size": "A5"}"#).unwrap();
        assert_eq!(options.page_size, PageSize::A5);
        assert_eq!(options.margin, "2cm");
        assert_eq!(PageSize::from("210mm 99mm".to_string()).to_string(), "210mm 99mm");
    }

    #[test]
    fn test_fill_template() {
        let mut vars = BTreeMap::new();
        vars.insert("title".to_string(), "Report".to_string());
        let rv = fill_template(
            "<h1>{{title}}</h1>{{content}}{{missing}}",
            &vars,
            "<p>x</p>",
        );
        assert_eq!(rv, "<h1>Report</h1><p>x</p>{{missing}}");
    }

    #[test]
    fn test_missing_template() {
        let err = to_pdf_with_template(
            &[Block::paragraph("x")],
            "/nonexistent/template.html",
            &BTreeMap::new(),
            &Echo,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Pdf(PdfError::TemplateNotFound(_))));
    }

    #[test]
    fn test_unconfigured_engine() {
        let err = ExternalEngine::default().render("x").unwrap_err();
        assert!(matches!(err, PdfError::EngineUnavailable(_)));
        let err = ExternalEngine::new("/nonexistent/pdf-engine")
            .render("x")
            .unwrap_err();
        assert!(matches!(err, PdfError::EngineUnavailable(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_external_engine() {
        let bytes = ExternalEngine::new("cat").render("<p>x</p>").unwrap();
        assert_eq!(bytes, b"<p>x</p>");

        let err = ExternalEngine::new("sh")
            .arg("-c")
            .arg("cat > /dev/null; echo broken >&2; exit 3")
            .render("<p>x</p>")
            .unwrap_err();
        match err {
            PdfError::Engine { status, stderr } => {
                assert_eq!(status, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{fs, io};

use anyhow::{anyhow, bail, Context, Error};
use argh::FromArgs;
use blocknote::config::Config;
use blocknote::pdf::{to_pdf, to_pdf_with_template, PageSize};
use blocknote::{Format, Pipeline};
use tracing_subscriber::EnvFilter;

fn read_file(path: &Path) -> Result<String, Error> {
    if path.as_os_str() == OsStr::new("-") {
        let mut rv = String::new();
        io::stdin().read_to_string(&mut rv)?;
        Ok(rv)
    } else {
        fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))
    }
}

/// Picks the source format from the flag or the file extension.
fn source_format(path: &Path, explicit: Option<Format>) -> Result<Format, Error> {
    if let Some(format) = explicit {
        return Ok(format);
    }
    path.extension()
        .and_then(OsStr::to_str)
        .and_then(|ext| ext.parse().ok())
        .ok_or_else(|| anyhow!("cannot guess the format of {}, pass --from", path.display()))
}

#[derive(FromArgs, Debug)]
/// Converts block editor documents between JSON, HTML, markdown and PDF.
struct Cli {
    /// enable debug logging
    #[argh(switch, short = 'v')]
    verbose: bool,
    /// path to a config file (defaults to a discovered blocknote.yml)
    #[argh(option)]
    config: Option<PathBuf>,
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
enum Command {
    Convert(ConvertCommand),
    Pdf(PdfCommand),
    Tokens(TokensCommand),
}

/// Converts a document into another format.
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "convert")]
struct ConvertCommand {
    #[argh(positional, default = "PathBuf::from(\"-\")")]
    path: PathBuf,
    /// the source format (json, html or markdown)
    #[argh(option)]
    from: Option<Format>,
    /// the target format (json, html or markdown)
    #[argh(option, default = "Format::Dict")]
    to: Format,
    /// write to this file instead of stdout
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,
}

/// Exports a document as PDF.
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "pdf")]
struct PdfCommand {
    #[argh(positional, default = "PathBuf::from(\"-\")")]
    path: PathBuf,
    /// the source format (json, html or markdown)
    #[argh(option)]
    from: Option<Format>,
    /// the PDF file to write
    #[argh(option, short = 'o')]
    output: PathBuf,
    /// an HTML template with a {{content}} placeholder
    #[argh(option)]
    template: Option<PathBuf>,
    /// a template variable as name=value
    #[argh(option)]
    var: Vec<String>,
    /// a CSS file appended to the default stylesheet
    #[argh(option)]
    css: Option<PathBuf>,
    /// the page size (A4, letter, ...)
    #[argh(option)]
    page_size: Option<PageSize>,
    /// the page margin
    #[argh(option)]
    margin: Option<String>,
    /// the HTML-to-PDF command
    #[argh(option)]
    engine: Option<PathBuf>,
    /// an argument for the HTML-to-PDF command
    #[argh(option)]
    engine_arg: Vec<String>,
}

/// Tokenizes a markdown document.
///
/// This emits the block token stream the markdown decoder works with as
/// JSON, one token per line.
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "tokens")]
struct TokensCommand {
    #[argh(positional, default = "PathBuf::from(\"-\")")]
    path: PathBuf,
}

fn pipeline(config: &Config) -> Pipeline {
    let mut pipeline = Pipeline::new();
    pipeline.set_markdown_options(&config.markdown);
    pipeline
}

fn convert_cmd(cmd: ConvertCommand, config: &Config) -> Result<(), Error> {
    let from = source_format(&cmd.path, cmd.from)?;
    let source = read_file(&cmd.path)?;
    let rv = pipeline(config).convert(&source, from, cmd.to)?;
    match cmd.output {
        Some(path) => fs::write(&path, rv)
            .with_context(|| format!("could not write {}", path.display()))?,
        None => println!("{}", rv),
    }
    Ok(())
}

fn pdf_cmd(cmd: PdfCommand, mut config: Config) -> Result<(), Error> {
    let from = source_format(&cmd.path, cmd.from)?;
    let blocks = pipeline(&config).decode(from, &read_file(&cmd.path)?)?;

    if let Some(engine) = cmd.engine {
        config.engine.cmd = Some(engine);
        config.engine.args = cmd.engine_arg;
    } else if !cmd.engine_arg.is_empty() {
        config.engine.args = cmd.engine_arg;
    }

    let bytes = if let Some(template) = cmd.template {
        let mut vars = BTreeMap::new();
        for var in &cmd.var {
            match var.split_once('=') {
                Some((key, value)) => vars.insert(key.to_string(), value.to_string()),
                None => bail!("invalid template variable {:?}, expected name=value", var),
            };
        }
        to_pdf_with_template(&blocks, template, &vars, &config.engine)?
    } else {
        if let Some(css) = cmd.css {
            config.pdf.css = Some(read_file(&css)?);
        }
        if let Some(page_size) = cmd.page_size {
            config.pdf.page_size = page_size;
        }
        if let Some(margin) = cmd.margin {
            config.pdf.margin = margin;
        }
        to_pdf(&blocks, &config.pdf, &config.engine)?
    };

    fs::write(&cmd.output, &bytes)
        .with_context(|| format!("could not write {}", cmd.output.display()))?;
    tracing::info!(path = %cmd.output.display(), bytes = bytes.len(), "wrote PDF");
    Ok(())
}

fn tokens_cmd(cmd: TokensCommand) -> Result<(), Error> {
    let source = read_file(&cmd.path)?;
    for token in blocknote::markdown::tokenize(&source) {
        let out = serde_json::to_string(&token)?;
        println!("{}", out);
    }
    Ok(())
}

fn run() -> Result<(), Error> {
    let cli: Cli = argh::from_env();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Convert(args) => convert_cmd(args, &config)?,
        Command::Pdf(args) => pdf_cmd(args, config)?,
        Command::Tokens(args) => tokens_cmd(args)?,
    }

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

//! Loads converter settings from YAML files.
//!
//! A config file gathers the option structs of the individual codecs:
//!
//! ```yaml
//! markdown:
//!   list_items: extract
//! pdf:
//!   page_size: letter
//!   margin: 1in
//! engine:
//!   cmd: weasyprint
//!   args: ["-", "-"]
//! ```
//!
//! Every section and field is optional.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::markdown::MarkdownOptions;
#[cfg(feature = "pdf")]
use crate::pdf::{ExternalEngine, PdfOptions};

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "blocknote.yml";

/// Raised when a config file cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("could not read configuration file")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration")]
    Parse(#[from] serde_yaml::Error),
}

/// Converter configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Markdown decoding options.
    pub markdown: MarkdownOptions,
    /// Print document options.
    #[cfg(feature = "pdf")]
    pub pdf: PdfOptions,
    /// The external PDF engine.
    #[cfg(feature = "pdf")]
    pub engine: ExternalEngine,
}

impl Config {
    /// Parses a config from YAML source.
    pub fn from_yaml_str(source: &str) -> Result<Config, ConfigError> {
        if source.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(source)?)
    }

    /// Loads a config file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let config = Config::from_yaml_str(&std::fs::read_to_string(path)?)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Looks for [`CONFIG_FILENAME`] in `start` and its parents.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILENAME))
            .find(|candidate| candidate.is_file())
    }

    /// Loads an explicit config file, a discovered one, or the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = explicit {
            return Config::from_path(path);
        }
        let discovered = std::env::current_dir()
            .ok()
            .and_then(|cwd| Config::discover(&cwd));
        match discovered {
            Some(path) => Config::from_path(path),
            None => Ok(Config::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::ListItems;

    #[test]
    fn test_empty_config() {
        let config = Config::from_yaml_str("").unwrap();
        assert_eq!(config.markdown.list_items, ListItems::Extract);
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_yaml_str("markdown:\n  list_items: placeholder\n").unwrap();
        assert_eq!(config.markdown.list_items, ListItems::Placeholder);
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_pdf_sections() {
        use crate::pdf::PageSize;

        let config = Config::from_yaml_str(
            "pdf:\n  page_size: letter\nengine:\n  cmd: weasyprint\n  args: ['-', '-']\n",
        )
        .unwrap();
        assert_eq!(config.pdf.page_size, PageSize::Letter);
        assert_eq!(config.pdf.margin, "2cm");
        assert_eq!(config.engine.cmd, Some(PathBuf::from("weasyprint")));
        assert_eq!(config.engine.args, vec!["-", "-"]);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Config::from_yaml_str("markdown:\n  list_items: sometimes\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::from_path("/nonexistent/blocknote.yml"),
            Err(ConfigError::NotFound(_))
        ));
    }
}

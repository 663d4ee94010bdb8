use markdoc_syntax::ParseOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Widest tab stop accepted in a config file.
const MAX_TAB_WIDTH: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for parser.{field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Settings read from `~/.config/markdoc-syntax/config.toml`.
///
/// ```toml
/// [parser]
/// tab_width = 4
/// frontmatter = true
/// max_nesting = 64
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub tab_width: usize,
    pub frontmatter: bool,
    pub max_nesting: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        let options = ParseOptions::default();
        Self {
            tab_width: options.tab_width,
            frontmatter: options.frontmatter,
            max_nesting: options.max_nesting,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/markdoc-syntax");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Check the values and turn them into parser options.
    pub fn parse_options(&self) -> Result<ParseOptions, ConfigError> {
        let parser = &self.parser;
        if parser.tab_width == 0 || parser.tab_width > MAX_TAB_WIDTH {
            return Err(ConfigError::InvalidValue {
                field: "tab_width",
                reason: format!("must be between 1 and {MAX_TAB_WIDTH}, got {}", parser.tab_width),
            });
        }
        if parser.max_nesting == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_nesting",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(ParseOptions {
            tab_width: parser.tab_width,
            frontmatter: parser.frontmatter,
            max_nesting: parser.max_nesting,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/markdoc-syntax/config.toml"));
    }

    #[test]
    fn test_defaults_match_parser_defaults() {
        let options = Config::default().parse_options().unwrap();
        assert_eq!(options, ParseOptions::default());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = toml::from_str("[parser]\ntab_width = 2\n").unwrap();
        assert_eq!(config.parser.tab_width, 2);
        assert!(config.parser.frontmatter);
        assert_eq!(config.parser.max_nesting, 64);

        let empty: Config = toml::from_str("").unwrap();
        assert_eq!(empty, Config::default());
    }

    #[test]
    fn test_invalid_tab_width() {
        let mut config = Config::default();
        config.parser.tab_width = 0;
        let err = config.parse_options().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "tab_width", .. }));
    }

    #[test]
    fn test_invalid_max_nesting() {
        let mut config = Config::default();
        config.parser.max_nesting = 0;
        let err = config.parse_options().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "max_nesting", .. }));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[parser]\ntab_width = \"wide\"\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/dir/config.toml");
        let test_config = Config {
            parser: ParserConfig {
                tab_width: 8,
                frontmatter: false,
                max_nesting: 10,
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
        let options = loaded_config.parse_options().unwrap();
        assert_eq!(options.tab_width, 8);
        assert!(!options.frontmatter);
    }

    #[test]
    fn test_options_change_parsing() {
        let mut config = Config::default();
        config.parser.frontmatter = false;
        let options = config.parse_options().unwrap();

        let parse = markdoc_syntax::parse_with(
            "---\ntitle: x\n---\n",
            &options,
            markdoc_syntax::ScannerState::default(),
        );
        assert!(
            parse
                .syntax()
                .children()
                .all(|n| n.kind() != markdoc_syntax::SyntaxKind::FRONTMATTER)
        );
    }
}

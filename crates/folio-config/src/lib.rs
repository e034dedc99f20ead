use folio_engine::{AttributeDef, BlotDef, Schema};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

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
}

/// Contents of `config.toml`.
///
/// ```toml
/// log_filter = "folio_engine=debug"
/// inline_order = ["link", "italic", "bold", "mention"]
///
/// [[attributes]]
/// name = "indent"
/// level = "block"
///
/// [[blots]]
/// name = "mention"
/// extends = "embed"
/// level = "inline"
/// shape = "embed"
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// `tracing` filter directives, used when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    /// Replaces the standard inline nesting order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_order: Option<Vec<String>>,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
    /// Extra blot kinds. A kind named like a standard one replaces it.
    #[serde(default)]
    pub blots: Vec<BlotDef>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        let config_path = Self::expand_path(config_path).unwrap_or_else(|| config_path.to_path_buf());
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.clone(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.clone(),
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
        let config_dir = shellexpand::tilde("~/.config/folio");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// The standard schema with this file's additions applied.
    pub fn schema(&self) -> Schema {
        let mut schema = Schema::standard();
        for def in &self.blots {
            schema.register(def.clone());
        }
        for def in &self.attributes {
            schema.register_attribute(def.clone());
        }
        if let Some(order) = &self.inline_order {
            schema.set_inline_order(order.iter().cloned());
        }
        schema
    }

    /// Expands `~` and environment variables in `path`.
    pub fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_engine::{Level, Scroll, Shape};
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
log_filter = "folio_engine=debug"
inline_order = ["link", "italic", "bold", "mention"]

[[attributes]]
name = "indent"
level = "block"

[[blots]]
name = "mention"
extends = "embed"
level = "inline"
shape = "embed"

[[blots]]
name = "callout"
level = "block"
shape = "branch"
allowed_children = ["block"]
policy = "container"
"#;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/folio/config.toml"));
    }

    #[test]
    fn test_parse_sample() {
        let config: Config = toml::from_str(SAMPLE).unwrap();

        assert_eq!(config.log_filter.as_deref(), Some("folio_engine=debug"));
        assert_eq!(config.attributes, vec![AttributeDef::block("indent")]);
        assert_eq!(config.blots.len(), 2);
        assert_eq!(config.blots[0].shape, Shape::Embed);
        assert_eq!(config.blots[1].level, Level::Block);
        assert!(matches!(config.blots[1].shape, Shape::Branch { .. }));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_schema_extends_standard() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let schema = config.schema();

        assert!(schema.get("mention").is_some());
        assert!(schema.get("bold").is_some());
        assert_eq!(
            schema.inline_order,
            vec!["link", "italic", "bold", "mention"]
        );

        let mut scroll = Scroll::new(schema).unwrap();
        scroll
            .insert_embed(0, "mention", "@ada".into())
            .unwrap();
        assert_eq!(scroll.length(), 1);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("FOLIO_TEST_DIR", "/test/env/path");
        }

        let path = PathBuf::from("$FOLIO_TEST_DIR/config.toml");
        let expanded = Config::expand_path(&path).unwrap();
        assert_eq!(expanded, PathBuf::from("/test/env/path/config.toml"));

        unsafe {
            env::remove_var("FOLIO_TEST_DIR");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "inline_order = 3").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            log_filter: Some("warn".into()),
            inline_order: Some(vec!["italic".into(), "bold".into()]),
            attributes: vec![AttributeDef::inline("highlight")],
            blots: Vec::new(),
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }
}

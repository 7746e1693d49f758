//! Host configuration (YAML)
use serde::{Deserialize, Serialize};
use sgen_core::EngineConfig;
use sgen_rules::RulesConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// How additional files are fingerprinted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionMode {
    /// blake3 of the content; files are read during the scan
    #[default]
    Content,
    /// modification time and size; content is read only when a rule needs it
    Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub interval_ms: u64,
    /// Stop after this many runs
    pub max_runs: Option<u64>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_runs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Tree scanned for declarations
    pub source_dir: PathBuf,
    pub declaration_extensions: Vec<String>,
    /// Tree whose files are offered as additional files
    pub additional_dir: PathBuf,
    pub out_dir: PathBuf,
    pub revision: RevisionMode,
    pub engine: EngineConfig,
    pub rules: RulesConfig,
    /// Keep polling instead of running once
    pub watch: Option<WatchConfig>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            declaration_extensions: vec![".rs".to_string()],
            additional_dir: PathBuf::from("additional"),
            out_dir: PathBuf::from("generated"),
            revision: RevisionMode::default(),
            engine: EngineConfig::default(),
            rules: RulesConfig::default(),
            watch: None,
        }
    }
}

impl HostConfig {
    /// Load from a YAML file. Relative directories are resolved against the
    /// file's own directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        Ok(match path.parent() {
            Some(base) => config.relative_to(base),
            None => config,
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Resolve relative directories (and the templates path) against `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        for dir in [&mut self.source_dir, &mut self.additional_dir, &mut self.out_dir] {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        if let Some(templates) = &self.rules.templates_path {
            if Path::new(templates).is_relative() {
                self.rules.templates_path = Some(base.join(templates).to_string_lossy().to_string());
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sgen_rules::LinePolicy;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = HostConfig::from_yaml("out_dir: out\n").unwrap();
        assert_eq!(config.out_dir, PathBuf::from("out"));
        assert_eq!(config.source_dir, PathBuf::from("src"));
        assert_eq!(config.rules.command_suffix, "Command");
        assert!(config.engine.parallel);
        assert!(config.watch.is_none());
    }

    #[test]
    fn test_nested_sections() {
        let yaml = r#"
revision: metadata
engine:
  parallel: false
rules:
  command_suffix: Handler
  line_policy: skip_invalid
  disabled: [sql_queries]
watch:
  interval_ms: 250
"#;
        let config = HostConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.revision, RevisionMode::Metadata);
        assert!(!config.engine.parallel);
        assert_eq!(config.rules.command_suffix, "Handler");
        assert_eq!(config.rules.line_policy, LinePolicy::SkipInvalid);
        assert_eq!(config.rules.disabled, vec!["sql_queries"]);
        assert_eq!(config.watch.unwrap().interval_ms, 250);
    }

    #[test]
    fn test_relative_to() {
        let config = HostConfig {
            out_dir: PathBuf::from("/abs/out"),
            ..HostConfig::default()
        }
        .relative_to(Path::new("/project"));
        assert_eq!(config.source_dir, PathBuf::from("/project/src"));
        assert_eq!(config.out_dir, PathBuf::from("/abs/out"));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            HostConfig::from_yaml("engine: [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }
}

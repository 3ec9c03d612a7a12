//! YAML loader with custom tag support
//!
//! Supported tags:
//! - `!include path` - Include another YAML file, relative to the including file
//! - `!env_var VAR [default]` - Environment variable substitution

use crate::error::{ConfigError, ConfigResult};
use serde_yaml::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// YAML loader resolving `!include` and `!env_var` tags
pub struct YamlLoader {
    /// Base directory for resolving relative paths
    config_dir: PathBuf,
    /// Files currently being loaded, for circular include detection
    include_stack: HashSet<PathBuf>,
}

impl YamlLoader {
    /// Create a new YAML loader for the given config directory
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            include_stack: HashSet::new(),
        }
    }

    /// Load and process a YAML file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<Value> {
        let path = self.resolve_path(path.as_ref());
        debug!("Loading YAML file: {:?}", path);

        if self.include_stack.contains(&path) {
            return Err(ConfigError::CircularInclude { path });
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        self.include_stack.insert(path.clone());
        let result = self.load_string(&content, &path);
        self.include_stack.remove(&path);

        result
    }

    /// Load and process YAML from a string
    pub fn load_string(&mut self, content: &str, source_path: &Path) -> ConfigResult<Value> {
        // An empty document is an empty configuration
        if content.trim().is_empty() {
            return Ok(Value::Mapping(serde_yaml::Mapping::new()));
        }

        let value: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source_path.to_path_buf(),
            source: e,
        })?;

        self.process_value(value, source_path)
    }

    fn process_value(&mut self, value: Value, source_path: &Path) -> ConfigResult<Value> {
        match value {
            Value::Tagged(tagged) => self.process_tagged(*tagged, source_path),
            Value::Mapping(map) => {
                let mut result = serde_yaml::Mapping::new();
                for (k, v) in map {
                    let processed_value = self.process_value(v, source_path)?;
                    result.insert(k, processed_value);
                }
                Ok(Value::Mapping(result))
            }
            Value::Sequence(seq) => {
                let result: ConfigResult<Vec<Value>> = seq
                    .into_iter()
                    .map(|v| self.process_value(v, source_path))
                    .collect();
                Ok(Value::Sequence(result?))
            }
            _ => Ok(value),
        }
    }

    fn process_tagged(
        &mut self,
        tagged: serde_yaml::value::TaggedValue,
        source_path: &Path,
    ) -> ConfigResult<Value> {
        let tag = tagged.tag.to_string();
        trace!("Processing tag '{}' with value {:?}", tag, tagged.value);

        match tag.as_str() {
            "!include" => self.process_include(tagged.value, source_path),
            "!env_var" => process_env_var(tagged.value),
            _ => Err(ConfigError::InvalidValue {
                key: tag,
                reason: "unsupported YAML tag".to_string(),
            }),
        }
    }

    fn process_include(&mut self, value: Value, source_path: &Path) -> ConfigResult<Value> {
        let Value::String(path_str) = value else {
            return Err(ConfigError::InvalidValue {
                key: "!include".to_string(),
                reason: "include path must be a string".to_string(),
            });
        };

        let base_dir = source_path.parent().unwrap_or(&self.config_dir);
        let include_path = if Path::new(&path_str).is_absolute() {
            PathBuf::from(&path_str)
        } else {
            base_dir.join(&path_str)
        };

        if !include_path.exists() {
            return Err(ConfigError::IncludeNotFound { path: include_path });
        }

        debug!("Including file: {:?}", include_path);
        self.load_file(&include_path)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }

    /// Get the config directory
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

/// Resolve `!env_var NAME [default]`
///
/// The substituted text is parsed as a YAML scalar so numbers and booleans
/// keep their type.
fn process_env_var(value: Value) -> ConfigResult<Value> {
    let Value::String(arg) = value else {
        return Err(ConfigError::InvalidValue {
            key: "!env_var".to_string(),
            reason: "environment variable name must be a string".to_string(),
        });
    };

    let (var_name, default) = match arg.trim().split_once(char::is_whitespace) {
        Some((name, default)) => (name.to_string(), Some(default.trim().to_string())),
        None => (arg.trim().to_string(), None),
    };

    let raw = match std::env::var(&var_name) {
        Ok(value) => {
            debug!("Substituted env var: {}", var_name);
            value
        }
        Err(_) => default.ok_or(ConfigError::EnvVarNotFound { var: var_name })?,
    };

    Ok(serde_yaml::from_str::<Value>(&raw).unwrap_or(Value::String(raw)))
}

/// Load a YAML file with tag processing
pub fn load_yaml(config_dir: impl Into<PathBuf>, file: impl AsRef<Path>) -> ConfigResult<Value> {
    YamlLoader::new(config_dir).load_file(file)
}

/// Load a YAML string with tag processing
pub fn load_yaml_string(
    config_dir: impl Into<PathBuf>,
    content: &str,
    source_name: &str,
) -> ConfigResult<Value> {
    YamlLoader::new(config_dir).load_string(content, Path::new(source_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn get<'a>(value: &'a Value, key: &str) -> &'a Value {
        value.as_mapping().unwrap().get(key).unwrap()
    }

    #[test]
    fn test_load_simple_yaml() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "homecore.yaml", "system:\n  log_level: debug\n");

        let value = load_yaml(dir.path(), "homecore.yaml").unwrap();
        assert_eq!(
            get(get(&value, "system"), "log_level"),
            &Value::String("debug".to_string())
        );
    }

    #[test]
    fn test_empty_document_is_empty_mapping() {
        let value = load_yaml_string("/tmp", "  \n", "inline.yaml").unwrap();
        assert!(value.as_mapping().unwrap().is_empty());
    }

    #[test]
    fn test_include() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "devices.yaml", "fan:\n  id: fan_42\n");
        write_file(dir.path(), "homecore.yaml", "devices: !include devices.yaml\n");

        let value = load_yaml(dir.path(), "homecore.yaml").unwrap();
        let fan = get(get(&value, "devices"), "fan");
        assert_eq!(get(fan, "id"), &Value::String("fan_42".to_string()));
    }

    #[test]
    fn test_missing_include() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "homecore.yaml", "devices: !include nope.yaml\n");

        let err = load_yaml(dir.path(), "homecore.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IncludeNotFound { .. }));
    }

    #[test]
    fn test_circular_include() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.yaml", "b: !include b.yaml\n");
        write_file(dir.path(), "b.yaml", "a: !include a.yaml\n");

        let err = load_yaml(dir.path(), "a.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::CircularInclude { .. }));
    }

    #[test]
    fn test_env_var_keeps_scalar_type() {
        std::env::set_var("HC_LOADER_TEST_PORT", "1884");
        let value = load_yaml_string("/tmp", "port: !env_var HC_LOADER_TEST_PORT\n", "inline")
            .unwrap();
        assert_eq!(get(&value, "port").as_u64(), Some(1884));
        std::env::remove_var("HC_LOADER_TEST_PORT");
    }

    #[test]
    fn test_env_var_default() {
        let value = load_yaml_string(
            "/tmp",
            "host: !env_var HC_LOADER_TEST_UNSET_HOST broker.local\n",
            "inline",
        )
        .unwrap();
        assert_eq!(
            get(&value, "host"),
            &Value::String("broker.local".to_string())
        );
    }

    #[test]
    fn test_env_var_missing_without_default() {
        let err = load_yaml_string("/tmp", "host: !env_var HC_LOADER_TEST_UNSET\n", "inline")
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound { var } if var == "HC_LOADER_TEST_UNSET"));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = load_yaml_string("/tmp", "key: !secret password\n", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}

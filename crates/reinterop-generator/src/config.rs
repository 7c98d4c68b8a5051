//! Configuration for a generation pass
//!
//! The configuration is read from a TOML (or YAML) file and is passed by
//! reference, unchanged, into every stage of the generator.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Configuration for one Reinterop generation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReinteropConfig {
    /// Root directory for generated native headers
    pub cpp_output_header_directory: PathBuf,

    /// Root directory for generated native source files
    pub cpp_output_source_directory: PathBuf,

    /// Path of the consolidated generated managed file
    pub csharp_output_path: PathBuf,

    /// Namespace prefix applied to every generated native namespace
    pub base_namespace: String,

    /// Name of the compiled native module, used by managed `DllImport`s
    pub native_library_name: String,

    /// Types always treated as non-blittable regardless of their fields
    #[serde(deserialize_with = "deserialize_type_list")]
    pub non_blittable_types: BTreeSet<String>,

    /// Files or directories holding assembly metadata documents
    pub metadata_paths: Vec<PathBuf>,
}

impl Default for ReinteropConfig {
    fn default() -> Self {
        Self {
            cpp_output_header_directory: PathBuf::from("generated/include"),
            cpp_output_source_directory: PathBuf::from("generated/src"),
            csharp_output_path: PathBuf::from("generated/Reinterop.generated.cs"),
            base_namespace: "DotNet".to_string(),
            native_library_name: "ReinteropNative".to_string(),
            non_blittable_types: BTreeSet::new(),
            metadata_paths: Vec::new(),
        }
    }
}

/// Accept either `"A, B"` or `["A", "B"]`
fn deserialize_type_list<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TypeList {
        Text(String),
        List(Vec<String>),
    }

    let items = match TypeList::deserialize(deserializer)? {
        TypeList::Text(text) => parse_type_list(&text),
        TypeList::List(list) => list.iter().flat_map(|item| parse_type_list(item)).collect(),
    };
    Ok(items)
}

/// Split a comma-separated list of type names, dropping blanks
pub fn parse_type_list(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl ReinteropConfig {
    /// Load configuration from a file; `.yaml`/`.yml` are read as YAML, anything else as TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("Failed to read config file {:?}: {}", path, e)))?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let mut config = if is_yaml {
            Self::from_yaml_str(&content)?
        } else {
            Self::from_str(&content)?
        };

        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML, for `reinterop init`-style scaffolding and tests
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Make relative paths relative to `base` instead of the working directory
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.cpp_output_header_directory);
        resolve(&mut self.cpp_output_source_directory);
        resolve(&mut self.csharp_output_path);
        for path in &mut self.metadata_paths {
            resolve(path);
        }
    }

    /// Apply `REINTEROP_*` overrides looked up through `lookup`
    ///
    /// Recognized variables: `REINTEROP_CPP_OUTPUT_HEADER_DIRECTORY`,
    /// `REINTEROP_CPP_OUTPUT_SOURCE_DIRECTORY`, `REINTEROP_CSHARP_OUTPUT_PATH`,
    /// `REINTEROP_BASE_NAMESPACE`, `REINTEROP_NATIVE_LIBRARY_NAME`,
    /// `REINTEROP_NON_BLITTABLE_TYPES` (comma-separated) and
    /// `REINTEROP_METADATA_PATHS` (platform path-list separated).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("REINTEROP_CPP_OUTPUT_HEADER_DIRECTORY") {
            self.cpp_output_header_directory = PathBuf::from(value);
        }
        if let Some(value) = lookup("REINTEROP_CPP_OUTPUT_SOURCE_DIRECTORY") {
            self.cpp_output_source_directory = PathBuf::from(value);
        }
        if let Some(value) = lookup("REINTEROP_CSHARP_OUTPUT_PATH") {
            self.csharp_output_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("REINTEROP_BASE_NAMESPACE") {
            self.base_namespace = value;
        }
        if let Some(value) = lookup("REINTEROP_NATIVE_LIBRARY_NAME") {
            self.native_library_name = value;
        }
        if let Some(value) = lookup("REINTEROP_NON_BLITTABLE_TYPES") {
            self.non_blittable_types = parse_type_list(&value);
        }
        if let Some(value) = lookup("REINTEROP_METADATA_PATHS") {
            self.metadata_paths = std::env::split_paths(&value).collect();
        }
        self.validate()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let namespace_pattern = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$")
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let library_pattern =
            Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*$").map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let type_pattern = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*(`[0-9]+)?$")
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if self.base_namespace.is_empty() {
            return Err(ConfigError::MissingField("base_namespace".to_string()));
        }
        if !namespace_pattern.is_match(&self.base_namespace) {
            return Err(ConfigError::invalid(
                "base_namespace",
                format!("'{}' is not a valid native namespace", self.base_namespace),
            ));
        }

        if self.native_library_name.is_empty() {
            return Err(ConfigError::MissingField("native_library_name".to_string()));
        }
        if !library_pattern.is_match(&self.native_library_name) {
            return Err(ConfigError::invalid(
                "native_library_name",
                format!("'{}' is not a valid library name", self.native_library_name),
            ));
        }

        for (field, path) in [
            ("cpp_output_header_directory", &self.cpp_output_header_directory),
            ("cpp_output_source_directory", &self.cpp_output_source_directory),
            ("csharp_output_path", &self.csharp_output_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::invalid(field, "cannot be empty"));
            }
        }

        for name in &self.non_blittable_types {
            if !type_pattern.is_match(name) {
                return Err(ConfigError::invalid(
                    "non_blittable_types",
                    format!("'{}' is not a fully-qualified type name", name),
                ));
            }
        }

        Ok(())
    }

    /// Native namespace segments of the base namespace
    pub fn base_namespace_segments(&self) -> Vec<String> {
        self.base_namespace.split("::").map(str::to_string).collect()
    }

    pub fn is_forced_non_blittable(&self, full_name: &str) -> bool {
        self.non_blittable_types.contains(full_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReinteropConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_namespace, "DotNet");
    }

    #[test]
    fn test_parse_toml_with_comma_separated_types() {
        let config = ReinteropConfig::from_str(
            r#"
            cpp_output_header_directory = "native/include"
            cpp_output_source_directory = "native/src"
            native_library_name = "CesiumForUnityNative"
            non_blittable_types = "Game.Handle, Game.Buffer ,"
            "#,
        )
        .unwrap();
        assert_eq!(config.native_library_name, "CesiumForUnityNative");
        assert!(config.is_forced_non_blittable("Game.Handle"));
        assert!(config.is_forced_non_blittable("Game.Buffer"));
        assert_eq!(config.non_blittable_types.len(), 2);
        assert_eq!(config.base_namespace, "DotNet");
    }

    #[test]
    fn test_parse_toml_with_type_list() {
        let config = ReinteropConfig::from_str(r#"non_blittable_types = ["Game.Handle"]"#).unwrap();
        assert!(config.is_forced_non_blittable("Game.Handle"));
    }

    #[test]
    fn test_parse_yaml() {
        let config = ReinteropConfig::from_yaml_str("base_namespace: Interop\nnative_library_name: Native\n").unwrap();
        assert_eq!(config.base_namespace, "Interop");
    }

    #[test]
    fn test_invalid_namespace_rejected() {
        let err = ReinteropConfig::from_str(r#"base_namespace = "Dot Net""#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "base_namespace"));
        assert!(ReinteropConfig::from_str(r#"base_namespace = "Outer::Inner""#).is_ok());
    }

    #[test]
    fn test_empty_library_name_rejected() {
        let err = ReinteropConfig::from_str(r#"native_library_name = """#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<&str, &str> = [
            ("REINTEROP_BASE_NAMESPACE", "Managed"),
            ("REINTEROP_NON_BLITTABLE_TYPES", "A.B,C.D"),
        ]
        .into_iter()
        .collect();

        let mut config = ReinteropConfig::default();
        config
            .apply_overrides(|name| vars.get(name).map(|value| value.to_string()))
            .unwrap();
        assert_eq!(config.base_namespace, "Managed");
        assert_eq!(config.non_blittable_types.len(), 2);

        let result = config.apply_overrides(|name| (name == "REINTEROP_BASE_NAMESPACE").then(|| "1bad".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_round_trip_keeps_type_list() {
        let mut config = ReinteropConfig::default();
        config.non_blittable_types.insert("Game.Handle".to_string());
        let text = config.to_toml_string().unwrap();
        let parsed = ReinteropConfig::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_relative_paths_resolved_against_config_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reinterop.toml");
        std::fs::write(&path, "metadata_paths = [\"metadata\"]\n").unwrap();
        let config = ReinteropConfig::from_file(&path).unwrap();
        assert_eq!(config.metadata_paths[0], dir.path().join("metadata"));
        assert_eq!(config.cpp_output_header_directory, dir.path().join("generated/include"));
    }
}

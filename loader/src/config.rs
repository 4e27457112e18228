//! Generator configuration.
//!
//! Defines the YAML-serializable configuration that controls naming of the
//! generated members, which schemas are planned, the plan file format and
//! consolidation parallelism. Every field has a default, so an empty file is
//! a valid configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! naming:
//!   value_type_suffix: Bean
//!   copy_update_prefix: with
//!   factory_name: of
//!   step_type_prefix: "$"
//! generation:
//!   jobs: 4
//!   format: yaml
//!   include: [Pet, Dog]
//!   exclude: [Legacy]
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use databean_core::NamingConvention;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Serialization format of written plan files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanFormat {
    #[default]
    Json,
    Yaml,
}

impl PlanFormat {
    /// File extension for plan files in this format.
    pub fn extension(self) -> &'static str {
        match self {
            PlanFormat::Json => "json",
            PlanFormat::Yaml => "yaml",
        }
    }
}

/// Settings controlling a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Consolidation workers: `0` runs sequentially, `N` uses a pool of `N`.
    pub jobs: usize,
    pub format: PlanFormat,
    /// Schemas to plan (empty = every top-level schema).
    pub include: Vec<String>,
    /// Schemas to skip.
    pub exclude: Vec<String>,
}

/// Top-level generator configuration.
///
/// Loaded from a YAML file (typically `databean.yml` next to the schemas).
///
/// # Examples
///
/// ```no_run
/// use databean_loader::GeneratorConfig;
///
/// let config = GeneratorConfig::load("databean.yml").unwrap();
/// if config.is_selected("Pet") {
///     println!("Pet value type: {}", config.naming().value_type("Pet"));
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    pub naming: NamingConvention,
    pub generation: GenerationConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            naming: NamingConvention::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot be
    /// read, or [`YamlError`](crate::LoaderError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot be
    /// written, or [`YamlError`](crate::LoaderError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Naming convention for the emission planner.
    pub fn naming(&self) -> NamingConvention {
        self.naming.clone()
    }

    /// Returns `true` if `schema` is in the exclusion list.
    pub fn is_excluded(&self, schema: &str) -> bool {
        self.generation.exclude.iter().any(|s| s == schema)
    }

    /// Returns `true` if `schema` should be planned.
    ///
    /// An empty include list selects every schema that is not excluded.
    /// Exclusions are always honored.
    ///
    /// # Examples
    ///
    /// ```
    /// # let yaml = "generation: { include: [Pet, Dog], exclude: [Dog] }";
    /// # let config: databean_loader::GeneratorConfig = serde_yaml::from_str(yaml).unwrap();
    /// assert!(config.is_selected("Pet"));
    /// assert!(!config.is_selected("Dog"));
    /// assert!(!config.is_selected("Cat"));
    /// ```
    pub fn is_selected(&self, schema: &str) -> bool {
        if self.is_excluded(schema) {
            return false;
        }
        if self.generation.include.is_empty() {
            return true;
        }
        self.generation.include.iter().any(|s| s == schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
naming:
  value_type_suffix: Impl
  copy_update_prefix: but
generation:
  jobs: 8
  format: yaml
  include:
    - Pet
    - Dog
  exclude:
    - Legacy
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: GeneratorConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.generation.jobs, 8);
        assert_eq!(config.generation.format, PlanFormat::Yaml);
        assert_eq!(config.generation.include, vec!["Pet", "Dog"]);

        let naming = config.naming();
        assert_eq!(naming.value_type("Pet"), "PetImpl");
        assert_eq!(naming.copy_update_prefix, "but");
        // Unset naming fields keep their defaults.
        assert_eq!(naming.factory_name, "of");
        assert_eq!(naming.step_type_prefix, "$");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: GeneratorConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.generation.jobs, 0);
        assert_eq!(config.generation.format, PlanFormat::Json);
        assert!(config.is_selected("Anything"));
    }

    #[test]
    fn test_selection() {
        let config: GeneratorConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert!(config.is_selected("Pet"));
        assert!(!config.is_selected("Cat"));

        let mut open = GeneratorConfig::default();
        open.generation.exclude.push("Legacy".to_string());
        assert!(open.is_selected("Cat"));
        assert!(!open.is_selected("Legacy"));
        assert!(open.is_excluded("Legacy"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("databean.yml");

        let config: GeneratorConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        config.save(&path).unwrap();
        let loaded = GeneratorConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(GeneratorConfig::load("/nonexistent/databean.yml").is_err());
    }

    #[test]
    fn test_plan_format_extension() {
        assert_eq!(PlanFormat::Json.extension(), "json");
        assert_eq!(PlanFormat::Yaml.extension(), "yaml");
    }
}

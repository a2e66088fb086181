use crate::error::{OverlapError, Result};
use crate::models::{
    CheckParams, CrsPolicy, ValidityMode, DEFAULT_MIN_AREA, DEFAULT_OPENING_DISTANCE,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

pub const ENV_OPENING_DISTANCE: &str = "OVERLAPCHECK_OPENING_DISTANCE";
pub const ENV_MIN_AREA: &str = "OVERLAPCHECK_MIN_AREA";
pub const ENV_CRS_POLICY: &str = "OVERLAPCHECK_CRS_POLICY";
pub const ENV_GEOMETRY_VALIDITY: &str = "OVERLAPCHECK_GEOMETRY_VALIDITY";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConfigSource::Default => "default",
            ConfigSource::File => "file",
            ConfigSource::Environment => "env",
            ConfigSource::Cli => "cli",
        };
        write!(f, "{}", label)
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Check parameters resolved from defaults, a TOML file, the environment
/// and command-line flags, in increasing precedence
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub opening_distance: ConfigValue<f64>,
    pub min_area: ConfigValue<f64>,
    pub crs_policy: ConfigValue<CrsPolicy>,
    pub geometry_validity: ConfigValue<ValidityMode>,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            opening_distance: ConfigValue::new(DEFAULT_OPENING_DISTANCE, ConfigSource::Default),
            min_area: ConfigValue::new(DEFAULT_MIN_AREA, ConfigSource::Default),
            crs_policy: ConfigValue::new(CrsPolicy::default(), ConfigSource::Default),
            geometry_validity: ConfigValue::new(ValidityMode::default(), ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| OverlapError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| OverlapError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(distance) = file_config.opening_distance {
            self.opening_distance.update(distance, ConfigSource::File);
        }

        if let Some(min_area) = file_config.min_area {
            self.min_area.update(min_area, ConfigSource::File);
        }

        if let Some(policy) = file_config.crs_policy {
            self.crs_policy.update(parse_crs_policy(&policy)?, ConfigSource::File);
        }

        if let Some(validity) = file_config.geometry_validity {
            self.geometry_validity.update(parse_validity_mode(&validity)?, ConfigSource::File);
        }

        tracing::debug!(path = %path.as_ref().display(), "Loaded configuration file");
        Ok(self)
    }

    /// Load configuration from environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn load_from_env(mut self) -> Self {
        if let Ok(value) = env::var(ENV_OPENING_DISTANCE) {
            match value.trim().parse::<f64>() {
                Ok(distance) => self.opening_distance.update(distance, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid {} value '{}': expected a number",
                    ENV_OPENING_DISTANCE,
                    value
                ),
            }
        }

        if let Ok(value) = env::var(ENV_MIN_AREA) {
            match value.trim().parse::<f64>() {
                Ok(min_area) => self.min_area.update(min_area, ConfigSource::Environment),
                Err(_) => {
                    tracing::warn!("Invalid {} value '{}': expected a number", ENV_MIN_AREA, value)
                }
            }
        }

        if let Ok(value) = env::var(ENV_CRS_POLICY) {
            match parse_crs_policy(&value) {
                Ok(policy) => self.crs_policy.update(policy, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid {} value '{}': expected reject, override, or reproject",
                    ENV_CRS_POLICY,
                    value
                ),
            }
        }

        if let Ok(value) = env::var(ENV_GEOMETRY_VALIDITY) {
            match parse_validity_mode(&value) {
                Ok(mode) => self.geometry_validity.update(mode, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid {} value '{}': expected strict or lenient",
                    ENV_GEOMETRY_VALIDITY,
                    value
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(distance) = overrides.opening_distance {
            self.opening_distance.update(distance, ConfigSource::Cli);
        }

        if let Some(min_area) = overrides.min_area {
            self.min_area.update(min_area, ConfigSource::Cli);
        }

        if let Some(policy) = overrides.crs_policy {
            self.crs_policy.update(policy, ConfigSource::Cli);
        }

        if let Some(mode) = overrides.geometry_validity {
            self.geometry_validity.update(mode, ConfigSource::Cli);
        }
    }

    /// Resolve into validated check parameters
    pub fn to_params(&self) -> Result<CheckParams> {
        let params = CheckParams::new(self.opening_distance.value, self.min_area.value)
            .crs_policy(self.crs_policy.value)
            .validity_mode(self.geometry_validity.value);
        params.validate()?;
        Ok(params)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "opening_distance".to_string(),
            (self.opening_distance.value.to_string(), self.opening_distance.source),
        );

        map.insert("min_area".to_string(), (self.min_area.value.to_string(), self.min_area.source));

        map.insert(
            "crs_policy".to_string(),
            (format!("{:?}", self.crs_policy.value), self.crs_policy.source),
        );

        map.insert(
            "geometry_validity".to_string(),
            (format!("{:?}", self.geometry_validity.value), self.geometry_validity.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    opening_distance: Option<f64>,
    min_area: Option<f64>,
    crs_policy: Option<String>,
    geometry_validity: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub opening_distance: Option<f64>,
    pub min_area: Option<f64>,
    pub crs_policy: Option<CrsPolicy>,
    pub geometry_validity: Option<ValidityMode>,
}

/// Parse CRS policy from string
pub fn parse_crs_policy(s: &str) -> Result<CrsPolicy> {
    match s.trim().to_lowercase().as_str() {
        "reject" => Ok(CrsPolicy::Reject),
        "override" => Ok(CrsPolicy::Override),
        "reproject" => Ok(CrsPolicy::Reproject),
        _ => Err(OverlapError::ConfigInvalid {
            key: "crs_policy".to_string(),
            reason: format!("Invalid CRS policy: {}. Use reject, override, or reproject", s),
        }),
    }
}

/// Parse validity mode from string
pub fn parse_validity_mode(s: &str) -> Result<ValidityMode> {
    match s.trim().to_lowercase().as_str() {
        "strict" => Ok(ValidityMode::Strict),
        "lenient" => Ok(ValidityMode::Lenient),
        _ => Err(OverlapError::ConfigInvalid {
            key: "geometry_validity".to_string(),
            reason: format!("Invalid validity mode: {}. Use strict or lenient", s),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.opening_distance.value, 10.0);
        assert_eq!(config.opening_distance.source, ConfigSource::Default);
        assert_eq!(config.min_area.value, 10_000.0);
        assert_eq!(config.crs_policy.value, CrsPolicy::Reject);
        assert_eq!(config.geometry_validity.value, ValidityMode::Lenient);
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(1.0, ConfigSource::Default);

        value.update(2.0, ConfigSource::File);
        assert_eq!(value.value, 2.0);
        assert_eq!(value.source, ConfigSource::File);

        value.update(3.0, ConfigSource::Environment);
        assert_eq!(value.value, 3.0);

        value.update(4.0, ConfigSource::Cli);
        assert_eq!(value.value, 4.0);
        assert_eq!(value.source, ConfigSource::Cli);

        value.update(5.0, ConfigSource::File);
        assert_eq!(value.value, 4.0);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
opening_distance = 2.5
min_area = 500.0
crs_policy = "override"
geometry_validity = "Strict"
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.opening_distance.value, 2.5);
        assert_eq!(config.opening_distance.source, ConfigSource::File);
        assert_eq!(config.min_area.value, 500.0);
        assert_eq!(config.crs_policy.value, CrsPolicy::Override);
        assert_eq!(config.geometry_validity.value, ValidityMode::Strict);
    }

    #[test]
    fn test_load_from_file_rejects_bad_policy() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"crs_policy = "guess""#).unwrap();

        let err = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, OverlapError::ConfigInvalid { ref key, .. } if key == "crs_policy"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = LayeredConfig::with_defaults()
            .load_from_file("/nonexistent/overlapcheck.toml")
            .unwrap_err();
        assert!(matches!(err, OverlapError::ConfigInvalid { ref key, .. } if key == "file"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            opening_distance: Some(1.0),
            min_area: None,
            crs_policy: Some(CrsPolicy::Override),
            geometry_validity: None,
        });

        assert_eq!(config.opening_distance.value, 1.0);
        assert_eq!(config.opening_distance.source, ConfigSource::Cli);
        assert_eq!(config.crs_policy.value, CrsPolicy::Override);
        assert_eq!(config.min_area.source, ConfigSource::Default);
        assert_eq!(config.geometry_validity.source, ConfigSource::Default);
    }

    #[test]
    fn test_to_params_validates() {
        let mut config = LayeredConfig::with_defaults();
        let params = config.to_params().unwrap();
        assert_eq!(params, CheckParams::default());

        config.update_from_cli(CliConfigOverrides { min_area: Some(-1.0), ..Default::default() });
        assert!(config.to_params().is_err());
    }

    #[test]
    fn test_parse_crs_policy() {
        assert_eq!(parse_crs_policy("reject").unwrap(), CrsPolicy::Reject);
        assert_eq!(parse_crs_policy("OVERRIDE").unwrap(), CrsPolicy::Override);
        assert_eq!(parse_crs_policy(" reproject ").unwrap(), CrsPolicy::Reproject);
        assert!(parse_crs_policy("ignore").is_err());
    }

    #[test]
    fn test_parse_validity_mode() {
        assert_eq!(parse_validity_mode("strict").unwrap(), ValidityMode::Strict);
        assert_eq!(parse_validity_mode("LENIENT").unwrap(), ValidityMode::Lenient);
        assert!(parse_validity_mode("invalid").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let map = LayeredConfig::with_defaults().to_inspection_map();

        assert_eq!(map.len(), 4);
        let (distance, source) = &map["opening_distance"];
        assert_eq!(distance, "10");
        assert_eq!(*source, ConfigSource::Default);
        assert_eq!(map["crs_policy"].0, "Reject");
    }
}

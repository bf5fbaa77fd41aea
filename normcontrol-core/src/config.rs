use crate::error::AuditError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use tracing::warn;

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_profile_name() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Profile name this config registers under in the ConfigManager
    #[serde(default = "default_profile_name")]
    pub profile: String,
    #[serde(default)]
    pub zones: ZoneConfig,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub datum: DatumConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Pipeline configuration - defines which rules to run and in what order
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Sheet fractions locating the title block (lower right) and the
/// technical-requirements block (upper right).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub title_block_min_x: f64,
    pub title_block_min_y: f64,
    pub tech_requirements_min_x: f64,
    pub tech_requirements_max_y: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            title_block_min_x: 0.6,
            title_block_min_y: 0.7,
            tech_requirements_min_x: 0.55,
            tech_requirements_max_y: 0.65,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Max perpendicular distance from a dimension to a line counted as nearby
    pub proximity_radius: f64,
    /// Max distance for a near-horizontal line to act as a leader shelf
    pub shelf_distance: f64,
    /// Degrees from horizontal still accepted as a shelf
    pub shelf_angle_tolerance: f64,
    pub arrow_min_length: f64,
    pub arrow_max_length: f64,
    /// Inclusive angle bands (degrees) of arrowhead wedge strokes
    pub arrow_angle_bands: Vec<(f64, f64)>,
    /// Half-width of the near-horizontal and near-vertical bands of the 30° zone
    pub zone_band: f64,
    /// Degrees from 0/180 at which span text still reads as horizontal
    pub horizontal_text_tolerance: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            proximity_radius: 20.0,
            shelf_distance: 8.0,
            shelf_angle_tolerance: 15.0,
            arrow_min_length: 2.0,
            arrow_max_length: 8.0,
            arrow_angle_bands: vec![(50.0, 70.0), (110.0, 130.0)],
            zone_band: 30.0,
            horizontal_text_tolerance: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatumConfig {
    pub search_radius: f64,
    /// Confirmed occurrences a datum letter needs on one page
    pub min_instances: usize,
}

impl Default for DatumConfig {
    fn default() -> Self {
        Self {
            search_radius: 20.0,
            min_instances: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Letters too common in prose and sheet furniture to act as designators
    pub stop_letters: Vec<char>,
    /// Geometric-tolerance glyphs followed by base letters
    pub tolerance_symbols: Vec<String>,
    /// Separator allowed between base letters, e.g. `А—Б`
    pub base_separator: String,
    /// Search the page text by content when the tech-requirements zone is empty
    #[serde(default = "default_true")]
    pub tech_requirements_fallback: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            stop_letters: "ABCDXYZIVLMNOPRSTHТН".chars().collect(),
            tolerance_symbols: ["⏊", "⊥", "∥", "∠", "○", "⌒", "⏋"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            base_separator: "—".to_string(),
            tech_requirements_fallback: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// List of rules to run in order
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Name of the rule
    pub name: String,
    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl RuleConfig {
    pub fn enabled(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
        }
    }
}

/// Rule family names understood by the RuleEngine, in default order
pub const RULE_NAMES: [&str; 7] = [
    "TitleBlock",
    "LetterConsistency",
    "FootnoteMarkers",
    "DimensionOrientation",
    "AngularDimensionOrientation",
    "DatumPairing",
    "RoughnessBrackets",
];

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rules: RULE_NAMES.iter().map(|name| RuleConfig::enabled(name)).collect(),
        }
    }
}

impl PipelineConfig {
    pub fn enabled_rules(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(|r| r.enabled)
            .map(|r| r.name.as_str())
    }
}

impl AuditConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: AuditConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no sheet layout could produce
    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("zones.title_block_min_x", self.zones.title_block_min_x),
            ("zones.title_block_min_y", self.zones.title_block_min_y),
            ("zones.tech_requirements_min_x", self.zones.tech_requirements_min_x),
            ("zones.tech_requirements_max_y", self.zones.tech_requirements_max_y),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(AuditError::Config(format!("{name} must be within [0, 1], got {value}")).into());
            }
        }
        if self.geometry.arrow_min_length > self.geometry.arrow_max_length {
            return Err(AuditError::Config(
                "geometry.arrow_min_length exceeds geometry.arrow_max_length".to_string(),
            )
            .into());
        }
        if !(0.0..=90.0).contains(&self.geometry.zone_band) {
            return Err(AuditError::Config(format!(
                "geometry.zone_band must be within [0, 90], got {}",
                self.geometry.zone_band
            ))
            .into());
        }
        if self.datum.min_instances == 0 {
            return Err(AuditError::Config("datum.min_instances must be at least 1".to_string()).into());
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            profile: default_profile_name(),
            zones: ZoneConfig::default(),
            geometry: GeometryConfig::default(),
            datum: DatumConfig::default(),
            extraction: ExtractionConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Named audit profiles: the built-ins plus any loaded from disk
#[derive(Debug, Clone)]
pub struct ConfigManager {
    configs: BTreeMap<String, AuditConfig>,
    default_config: AuditConfig,
}

impl ConfigManager {
    pub fn new() -> Self {
        let mut manager = Self {
            configs: BTreeMap::new(),
            default_config: AuditConfig::default(),
        };
        manager.load_builtin_configs();
        manager
    }

    /// Config for a profile, falling back to the default profile
    pub fn get_config(&self, profile: &str) -> &AuditConfig {
        self.configs.get(profile).unwrap_or_else(|| {
            warn!("Unknown config profile '{}', using default", profile);
            &self.default_config
        })
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }

    /// Load a YAML config and register it under its `profile` name
    pub fn load_config_from_file(&mut self, path: &str) -> Result<String> {
        let config = AuditConfig::load_from_file(path)?;
        let name = config.profile.clone();
        self.configs.insert(name.clone(), config);
        Ok(name)
    }

    /// Load a YAML config if it reads and validates; otherwise warn and keep
    /// the built-in profiles
    pub fn load_config_with_fallback(&mut self, path: &str) -> Option<String> {
        match self.load_config_from_file(path) {
            Ok(name) => Some(name),
            Err(e) => {
                warn!("Failed to load config from {}: {:#}, using built-in profiles", path, e);
                None
            }
        }
    }

    pub fn insert(&mut self, config: AuditConfig) {
        self.configs.insert(config.profile.clone(), config);
    }

    fn load_builtin_configs(&mut self) {
        self.configs
            .insert("default".to_string(), AuditConfig::default());

        // Strict: wider search radius and tighter horizontality
        let strict = AuditConfig {
            profile: "strict".to_string(),
            geometry: GeometryConfig {
                proximity_radius: 25.0,
                zone_band: 35.0,
                horizontal_text_tolerance: 5.0,
                ..GeometryConfig::default()
            },
            datum: DatumConfig {
                search_radius: 25.0,
                ..DatumConfig::default()
            },
            ..AuditConfig::default()
        };
        self.configs.insert(strict.profile.clone(), strict);

        // Lenient: narrower zone, forgiving rotation, no datum pairing
        let mut lenient = AuditConfig {
            profile: "lenient".to_string(),
            geometry: GeometryConfig {
                zone_band: 20.0,
                horizontal_text_tolerance: 15.0,
                ..GeometryConfig::default()
            },
            ..AuditConfig::default()
        };
        for rule in &mut lenient.pipeline.rules {
            if rule.name == "DatumPairing" {
                rule.enabled = false;
            }
        }
        self.configs.insert(lenient.profile.clone(), lenient);
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        let config = AuditConfig::default();
        assert_eq!(config.zones.title_block_min_x, 0.6);
        assert_eq!(config.zones.tech_requirements_max_y, 0.65);
        assert_eq!(config.geometry.proximity_radius, 20.0);
        assert_eq!(config.geometry.shelf_distance, 8.0);
        assert_eq!(config.datum.min_instances, 2);
        assert!(config.extraction.stop_letters.contains(&'Т'));
        assert_eq!(config.pipeline.enabled_rules().count(), 7);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
profile: wide
geometry:
  proximity_radius: 30.0
pipeline:
  rules:
    - name: TitleBlock
    - name: DatumPairing
      enabled: false
"#;
        let config = AuditConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.profile, "wide");
        assert_eq!(config.geometry.proximity_radius, 30.0);
        assert_eq!(config.geometry.shelf_distance, 8.0);
        assert_eq!(config.zones, ZoneConfig::default());
        let enabled: Vec<&str> = config.pipeline.enabled_rules().collect();
        assert_eq!(enabled, vec!["TitleBlock"]);
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        let yaml = "zones:\n  title_block_min_x: 1.5\n";
        let err = AuditConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("title_block_min_x"));
    }

    #[test]
    fn test_fallback_on_missing_file() {
        let mut manager = ConfigManager::new();
        assert_eq!(manager.load_config_with_fallback("/nonexistent/normcontrol.yaml"), None);
        assert_eq!(manager.get_config("default"), &AuditConfig::default());
    }

    #[test]
    fn test_fallback_on_malformed_file() {
        let path = std::env::temp_dir().join(format!("normcontrol_malformed_{}.yaml", std::process::id()));
        fs::write(&path, "zones: [unclosed\n").unwrap();

        let mut manager = ConfigManager::new();
        assert!(manager.load_config_from_file(&path.to_string_lossy()).is_err());
        assert_eq!(manager.load_config_with_fallback(&path.to_string_lossy()), None);
        let names: Vec<&str> = manager.profile_names().collect();
        assert_eq!(names, vec!["default", "lenient", "strict"]);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_empty_pipeline_section_keeps_all_rules() {
        let config = AuditConfig::from_yaml_str("pipeline: {}\n").unwrap();
        let enabled: Vec<&str> = config.pipeline.enabled_rules().collect();
        assert_eq!(enabled, RULE_NAMES.to_vec());
    }

    #[test]
    fn test_builtin_profiles() {
        let manager = ConfigManager::new();
        let names: Vec<&str> = manager.profile_names().collect();
        assert_eq!(names, vec!["default", "lenient", "strict"]);
        assert_eq!(manager.get_config("strict").geometry.zone_band, 35.0);
        assert!(!manager
            .get_config("lenient")
            .pipeline
            .enabled_rules()
            .any(|r| r == "DatumPairing"));
        assert_eq!(manager.get_config("missing").profile, "default");
    }
}

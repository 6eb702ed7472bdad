//! Detector configuration

use std::path::Path;
use std::sync::OnceLock;

use mantic_governance::GovernanceConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DetectError, DetectResult};

/// Confidence tiers for an emergence window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergenceTiers {
    /// Alignment floor above which a window is OPTIMAL
    pub optimal_floor: f64,
    pub optimal_confidence: f64,
    pub favorable_confidence: f64,
}

impl Default for EmergenceTiers {
    fn default() -> Self {
        Self {
            optimal_floor: 0.8,
            optimal_confidence: 0.95,
            favorable_confidence: 0.75,
        }
    }
}

/// Detector configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub governance: GovernanceConfig,

    /// Domain names user registrations may not take (compared case-insensitively)
    pub reserved_domains: Vec<String>,

    pub min_layers: usize,
    pub max_layers: usize,

    /// Layers that must carry a value for a detection to run
    pub min_present_layers: usize,

    /// Accepted deviation of the raw weight sum from 1.0 before renormalization
    pub registration_tolerance: f64,

    /// Detection threshold when a request does not name one
    pub default_detection_threshold: f64,

    /// Pairwise agreement below this is reported as tension
    pub tension_threshold: f64,

    pub emergence: EmergenceTiers,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            governance: GovernanceConfig::default(),
            reserved_domains: [
                "healthcare",
                "finance",
                "cyber",
                "climate",
                "legal",
                "military",
                "social",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_layers: 3,
            max_layers: 6,
            min_present_layers: 2,
            registration_tolerance: 0.05,
            default_detection_threshold: 0.4,
            tension_threshold: mantic_kernel::DEFAULT_TENSION_THRESHOLD,
            emergence: EmergenceTiers::default(),
        }
    }
}

static DEFAULT_CONFIG: OnceLock<DetectorConfig> = OnceLock::new();

impl DetectorConfig {
    /// Process-wide default configuration, built once.
    pub fn global() -> &'static DetectorConfig {
        DEFAULT_CONFIG.get_or_init(DetectorConfig::default)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> DetectResult<Self> {
        let config: DetectorConfig =
            toml::from_str(contents).map_err(|e| DetectError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file. A missing file yields the defaults.
    pub fn load(path: &Path) -> DetectResult<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(DetectorConfig::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            DetectError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), "Loaded detector config");
        Ok(config)
    }

    pub fn is_reserved(&self, domain: &str) -> bool {
        let lower = domain.to_lowercase();
        self.reserved_domains.iter().any(|r| r.to_lowercase() == lower)
    }

    pub fn validate(&self) -> DetectResult<()> {
        self.governance.validate()?;

        if self.min_layers < 2 || self.min_layers > self.max_layers {
            return Err(DetectError::Configuration(format!(
                "layer count limits [{}, {}] are not usable",
                self.min_layers, self.max_layers
            )));
        }
        if self.min_present_layers == 0 || self.min_present_layers > self.min_layers {
            return Err(DetectError::Configuration(format!(
                "min_present_layers must be in [1, {}], got {}",
                self.min_layers, self.min_present_layers
            )));
        }
        if !(0.0..1.0).contains(&self.registration_tolerance) {
            return Err(DetectError::Configuration(format!(
                "registration_tolerance must be in [0, 1), got {}",
                self.registration_tolerance
            )));
        }
        for (name, value) in [
            ("default_detection_threshold", self.default_detection_threshold),
            ("tension_threshold", self.tension_threshold),
            ("emergence.optimal_floor", self.emergence.optimal_floor),
            ("emergence.optimal_confidence", self.emergence.optimal_confidence),
            ("emergence.favorable_confidence", self.emergence.favorable_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DetectError::Configuration(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

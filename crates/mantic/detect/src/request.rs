use std::collections::BTreeMap;
use std::fmt;

use mantic_governance::{InteractionMode, InteractionOverride, OverrideMode, TemporalConfig};
use serde::{Deserialize, Serialize};

use crate::visibility::HierarchyLevel;

/// Interpretation applied to the layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Divergence across layers signals risk
    Friction,
    /// Alignment across layers signals opportunity
    Emergence,
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionMode::Friction => f.write_str("friction"),
            DetectionMode::Emergence => f.write_str("emergence"),
        }
    }
}

fn default_f_time() -> f64 {
    1.0
}

/// A detection call against a caller-defined domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionRequest {
    pub domain_name: String,
    pub layer_names: Vec<String>,
    pub weights: Vec<f64>,
    /// `None` (JSON `null`) marks a missing layer
    pub layer_values: Vec<Option<f64>>,
    pub mode: DetectionMode,

    #[serde(default = "default_f_time")]
    pub f_time: f64,

    /// Override for the `detection` threshold, bounded by governance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_override: Option<BTreeMap<String, f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_config: Option<TemporalConfig>,

    #[serde(default)]
    pub interaction_mode: InteractionMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_override: Option<InteractionOverride>,

    #[serde(default)]
    pub interaction_override_mode: OverrideMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_hierarchy: Option<BTreeMap<String, HierarchyLevel>>,

    /// Falls back to the configured default (0.4) when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_threshold: Option<f64>,
}

impl DetectionRequest {
    /// Request with every optional field at its default.
    pub fn new(
        domain_name: impl Into<String>,
        layer_names: &[&str],
        weights: &[f64],
        layer_values: &[Option<f64>],
        mode: DetectionMode,
    ) -> Self {
        Self {
            domain_name: domain_name.into(),
            layer_names: layer_names.iter().map(|s| s.to_string()).collect(),
            weights: weights.to_vec(),
            layer_values: layer_values.to_vec(),
            mode,
            f_time: default_f_time(),
            threshold_override: None,
            temporal_config: None,
            interaction_mode: InteractionMode::default(),
            interaction_override: None,
            interaction_override_mode: OverrideMode::default(),
            layer_hierarchy: None,
            detection_threshold: None,
        }
    }
}

/// Optional knobs for a preset detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetOptions {
    pub f_time: f64,
    pub threshold_override: Option<BTreeMap<String, f64>>,
    pub temporal_config: Option<TemporalConfig>,
    pub interaction_mode: InteractionMode,
    pub interaction_override: Option<InteractionOverride>,
    pub interaction_override_mode: OverrideMode,
}

impl Default for PresetOptions {
    fn default() -> Self {
        Self {
            f_time: default_f_time(),
            threshold_override: None,
            temporal_config: None,
            interaction_mode: InteractionMode::default(),
            interaction_override: None,
            interaction_override_mode: OverrideMode::default(),
        }
    }
}

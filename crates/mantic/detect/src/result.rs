use std::collections::BTreeMap;

use mantic_governance::OverridesAudit;
use mantic_kernel::{LayerCoupling, LayerMap};
use serde::{Deserialize, Serialize};

use crate::interpret::Outcome;
use crate::request::DetectionMode;
use crate::visibility::LayerVisibility;

/// Where a domain registration came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainType {
    UserDefined,
    BuiltinPreset,
}

/// Domain calibration metadata attached to every result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub domain_type: DomainType,
    pub domain_name: String,
    pub preset: Option<String>,
    pub mode: DetectionMode,
    pub layer_count: usize,
    /// Registered weights after renormalization, keyed by layer
    pub weight_distribution: LayerMap<f64>,
    pub kernel_version: String,
    pub note: String,
}

/// Output of one detection.
///
/// The mode-specific fields are flattened in next to the universal ones, so
/// the JSON object carries both without nesting. Layer-keyed maps keep the
/// registered layer order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionResult {
    #[serde(flatten)]
    pub outcome: Outcome,
    pub m_score: f64,
    pub spatial_component: f64,
    pub layer_attribution: LayerMap<f64>,
    /// Governed thresholds in effect for this call
    pub thresholds: BTreeMap<String, f64>,
    pub overrides_applied: OverridesAudit,
    pub layer_coupling: LayerCoupling,
    pub layer_visibility: Option<LayerVisibility>,
    pub calibration: Calibration,
    /// Clamped input values; `null` for missing layers
    pub layer_values: LayerMap<Option<f64>>,
}

impl DetectionResult {
    pub fn mode(&self) -> DetectionMode {
        self.outcome.mode()
    }

    /// True when friction alerted or emergence found a window.
    pub fn triggered(&self) -> bool {
        self.outcome.triggered()
    }
}

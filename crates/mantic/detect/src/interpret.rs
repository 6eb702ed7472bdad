//! Mode-specific interpretation of clamped layer values.
//!
//! Each outcome type keeps one fixed field set across its branches; fields
//! that do not apply are `None` and serialize as `null`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EmergenceTiers;
use crate::request::DetectionMode;

/// Friction: divergence across layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrictionOutcome {
    pub alert: Option<String>,
    /// min(divergence, 1) when alerting, else 0
    pub severity: f64,
    /// max − min over present layers
    pub mismatch_score: f64,
    pub highest_layer: Option<String>,
    pub lowest_layer: Option<String>,
    /// Highest escalation threshold the divergence exceeds while alerting
    pub escalation: Option<String>,
}

/// Emergence: alignment across layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmergenceOutcome {
    pub window_detected: bool,
    pub window_type: Option<String>,
    pub confidence: Option<f64>,
    /// Weakest present layer value
    pub alignment_floor: f64,
    pub limiting_factor: Option<String>,
    pub recommended_action: Option<String>,
    pub status: Option<String>,
    /// Present layers at or below the threshold
    pub improvement_needed: Option<Vec<String>>,
}

/// Outcome of either interpretation, flattened into the result.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Friction(FrictionOutcome),
    Emergence(EmergenceOutcome),
}

impl Outcome {
    pub fn mode(&self) -> DetectionMode {
        match self {
            Outcome::Friction(_) => DetectionMode::Friction,
            Outcome::Emergence(_) => DetectionMode::Emergence,
        }
    }

    /// Whether the interpretation fired: an alert or a window.
    pub fn triggered(&self) -> bool {
        match self {
            Outcome::Friction(f) => f.alert.is_some(),
            Outcome::Emergence(e) => e.window_detected,
        }
    }
}

/// Present (name, value) pairs in declaration order.
fn present<'a>(names: &'a [String], values: &[Option<f64>]) -> Vec<(&'a str, f64)> {
    names
        .iter()
        .zip(values)
        .filter_map(|(n, v)| v.map(|v| (n.as_str(), v)))
        .collect()
}

/// First highest and first lowest present layer.
fn extremes<'a>(layers: &[(&'a str, f64)]) -> Option<((&'a str, f64), (&'a str, f64))> {
    let first = *layers.first()?;
    let (mut hi, mut lo) = (first, first);
    for &(name, v) in &layers[1..] {
        if v > hi.1 {
            hi = (name, v);
        }
        if v < lo.1 {
            lo = (name, v);
        }
    }
    Some((hi, lo))
}

/// Interpret divergence against `threshold`.
///
/// `escalations` are named levels above the detection threshold; an alert
/// reports the highest one the divergence strictly exceeds.
pub fn interpret_friction(
    names: &[String],
    values: &[Option<f64>],
    threshold: f64,
    escalations: &[(&str, f64)],
) -> FrictionOutcome {
    let layers = present(names, values);
    let Some((hi, lo)) = extremes(&layers) else {
        return FrictionOutcome {
            alert: None,
            severity: 0.0,
            mismatch_score: 0.0,
            highest_layer: None,
            lowest_layer: None,
            escalation: None,
        };
    };

    let divergence = hi.1 - lo.1;
    let alerting = divergence > threshold;
    let escalation = escalations
        .iter()
        .filter(|(_, level)| alerting && divergence > *level)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name.to_string());
    debug!(divergence, threshold, alerting, ?escalation, "Friction interpreted");

    let alert = alerting.then(|| {
        format!(
            "DIVERGENCE: {} ({:.2}) vs {} ({:.2}) - cross-layer conflict detected (range={:.3})",
            hi.0, hi.1, lo.0, lo.1, divergence
        )
    });

    FrictionOutcome {
        alert,
        severity: if alerting { divergence.min(1.0) } else { 0.0 },
        mismatch_score: divergence,
        highest_layer: Some(hi.0.to_string()),
        lowest_layer: Some(lo.0.to_string()),
        escalation,
    }
}

pub fn interpret_emergence(
    names: &[String],
    values: &[Option<f64>],
    threshold: f64,
    tiers: &EmergenceTiers,
) -> EmergenceOutcome {
    let layers = present(names, values);
    let (floor_name, floor) = extremes(&layers).map_or(("", 0.0), |(_, lo)| lo);
    let window_detected = !layers.is_empty() && floor > threshold;
    debug!(floor, threshold, window_detected, "Emergence interpreted");

    if window_detected {
        let optimal = floor > tiers.optimal_floor;
        let (window_type, confidence, action) = if optimal {
            (
                "OPTIMAL: All layers strongly aligned",
                tiers.optimal_confidence,
                "High-confidence window - act now",
            )
        } else {
            (
                "FAVORABLE: Layers aligned above threshold",
                tiers.favorable_confidence,
                "Good alignment - proceed with awareness",
            )
        };
        return EmergenceOutcome {
            window_detected,
            window_type: Some(window_type.to_string()),
            confidence: Some(confidence),
            alignment_floor: floor,
            limiting_factor: Some(floor_name.to_string()),
            recommended_action: Some(action.to_string()),
            status: None,
            improvement_needed: None,
        };
    }

    let below: Vec<String> = layers
        .iter()
        .filter(|(_, v)| *v <= threshold)
        .map(|(n, _)| n.to_string())
        .collect();

    EmergenceOutcome {
        window_detected,
        window_type: None,
        confidence: None,
        alignment_floor: floor,
        limiting_factor: None,
        recommended_action: None,
        status: Some(format!(
            "Layers not aligned. {} below threshold.",
            below.join(", ")
        )),
        improvement_needed: Some(below),
    }
}

//! Domain registration validation.
//!
//! Runs before anything is computed. A registration that passes has unique
//! names, weights renormalized to sum exactly to 1, and layer values clamped
//! to [0, 1] with missing entries preserved.

use std::collections::BTreeSet;

use tracing::warn;

use crate::config::DetectorConfig;
use crate::error::{DetectError, DetectResult};

/// A validated domain registration.
#[derive(Clone, Debug, PartialEq)]
pub struct Registration {
    pub domain_name: String,
    pub layer_names: Vec<String>,
    /// Raw weights divided by their sum
    pub weights: Vec<f64>,
    /// Clamped to [0, 1]; `None` for missing layers
    pub values: Vec<Option<f64>>,
}

impl Registration {
    pub fn layer_count(&self) -> usize {
        self.layer_names.len()
    }
}

/// Inputs to [`validate_registration`].
#[derive(Clone, Copy, Debug)]
pub struct RegistrationInput<'a> {
    pub domain_name: &'a str,
    pub layer_names: &'a [String],
    pub weights: &'a [f64],
    pub layer_values: &'a [Option<f64>],
    /// Built-in presets own the reserved names, so they skip that check
    pub allow_reserved: bool,
}

pub fn validate_registration(
    input: RegistrationInput<'_>,
    config: &DetectorConfig,
) -> DetectResult<Registration> {
    let domain_name = input.domain_name.trim();
    if domain_name.is_empty() {
        return Err(DetectError::registration(
            "domain_name",
            "must be a non-empty string",
        ));
    }
    if !input.allow_reserved && config.is_reserved(domain_name) {
        return Err(DetectError::registration(
            "domain_name",
            format!(
                "'{domain_name}' collides with a built-in domain; reserved: {}",
                config.reserved_domains.join(", ")
            ),
        ));
    }

    let names = input.layer_names;
    if !(config.min_layers..=config.max_layers).contains(&names.len()) {
        return Err(DetectError::registration(
            "layer_names",
            format!(
                "must have {}-{} entries, got {}",
                config.min_layers,
                config.max_layers,
                names.len()
            ),
        ));
    }
    if let Some(blank) = names.iter().position(|n| n.trim().is_empty()) {
        return Err(DetectError::registration(
            "layer_names",
            format!("layer_names[{blank}] must be a non-empty string"),
        ));
    }
    let unique: BTreeSet<&str> = names.iter().map(String::as_str).collect();
    if unique.len() != names.len() {
        return Err(DetectError::registration("layer_names", "must be unique"));
    }

    let weights = normalize_weights(input.weights, names.len(), config.registration_tolerance)?;

    if input.layer_values.len() != names.len() {
        return Err(DetectError::registration(
            "layer_values",
            format!(
                "length ({}) must match layer_names length ({})",
                input.layer_values.len(),
                names.len()
            ),
        ));
    }

    let mut values = Vec::with_capacity(names.len());
    for (name, value) in names.iter().zip(input.layer_values) {
        values.push(match value {
            None => None,
            Some(v) if v.is_nan() => None,
            Some(v) if v.is_infinite() => {
                return Err(DetectError::range(
                    "layer_values",
                    format!("'{name}' must be finite, got {v}"),
                ));
            }
            Some(v) => {
                let clamped = v.clamp(0.0, 1.0);
                if clamped != *v {
                    warn!(layer = %name, value = v, clamped, "Layer value clamped to [0, 1]");
                }
                Some(clamped)
            }
        });
    }

    let present = values.iter().filter(|v| v.is_some()).count();
    if present < config.min_present_layers {
        return Err(DetectError::range(
            "layer_values",
            format!(
                "at least {} layers must have values, got {present}",
                config.min_present_layers
            ),
        ));
    }

    let present_weight: f64 = weights
        .iter()
        .zip(&values)
        .filter(|(_, v)| v.is_some())
        .map(|(w, _)| w)
        .sum();
    if present_weight <= f64::EPSILON {
        return Err(DetectError::registration(
            "weights",
            "layers with values must carry non-zero total weight",
        ));
    }

    Ok(Registration {
        domain_name: domain_name.to_string(),
        layer_names: names.to_vec(),
        weights,
        values,
    })
}

/// Check weights against the registration tolerance, then divide by their sum.
fn normalize_weights(raw: &[f64], expected: usize, tolerance: f64) -> DetectResult<Vec<f64>> {
    if raw.len() != expected {
        return Err(DetectError::registration(
            "weights",
            format!(
                "length ({}) must match layer_names length ({expected})",
                raw.len()
            ),
        ));
    }
    if let Some((i, w)) = raw.iter().enumerate().find(|(_, w)| !w.is_finite() || **w < 0.0) {
        return Err(DetectError::registration(
            "weights",
            format!("weights[{i}] must be a non-negative finite number, got {w}"),
        ));
    }

    let sum: f64 = raw.iter().sum();
    if (sum - 1.0).abs() > tolerance {
        return Err(DetectError::registration(
            "weights",
            format!("must sum to 1.0 (±{tolerance}), got {sum:.4}"),
        ));
    }

    Ok(raw.iter().map(|w| w / sum).collect())
}

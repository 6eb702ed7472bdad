//! Interaction coefficient resolution.
//!
//! The final vector is built in three steps: a starting vector (neutral or
//! dynamic), an optional caller override, then clamping into the configured
//! bounds.

use std::collections::BTreeMap;

use mantic_kernel::LayerMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Bounds;
use crate::error::GovernanceError;
use crate::temporal::{Clamp, Rejection};

/// Which vector the override is applied on top of.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Domain rules computed from the current layer values
    #[default]
    Dynamic,
    /// All coefficients neutral (1.0)
    Base,
}

/// How override values combine with the starting vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideMode {
    /// Multiply the starting vector, then re-clamp
    #[default]
    Scale,
    /// Use the override value directly
    Replace,
}

/// Caller override, by position or by layer name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InteractionOverride {
    Positional(Vec<f64>),
    Named(BTreeMap<String, f64>),
}

/// `I[target] = min(cap, base + gain·signal)`.
///
/// The signal is `|L[driver]|`, or `max(0, L[driver] − L[relative_to])` when
/// `relative_to` is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionRule {
    pub target: String,
    pub driver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_to: Option<String>,
    pub base: f64,
    pub gain: f64,
    pub cap: f64,
}

impl InteractionRule {
    pub fn new(target: &str, driver: &str, base: f64, gain: f64, cap: f64) -> Self {
        Self {
            target: target.to_string(),
            driver: driver.to_string(),
            relative_to: None,
            base,
            gain,
            cap,
        }
    }

    pub fn relative_to(mut self, layer: &str) -> Self {
        self.relative_to = Some(layer.to_string());
        self
    }

    fn signal(&self, names: &[String], values: &[Option<f64>]) -> Option<f64> {
        let value_of = |name: &str| {
            names
                .iter()
                .position(|n| n == name)
                .and_then(|i| values.get(i).copied().flatten())
                .filter(|v| v.is_finite())
        };
        let driver = value_of(&self.driver)?;
        match &self.relative_to {
            Some(other) => Some((driver - value_of(other)?).max(0.0)),
            None => Some(driver.abs()),
        }
    }
}

/// Audit of the `interaction` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionAudit {
    pub interaction_mode: InteractionMode,
    pub override_mode: OverrideMode,
    pub requested: Option<InteractionOverride>,
    /// Vector before the override, keyed by layer
    pub starting: LayerMap<f64>,
    /// Final coefficients, keyed by layer
    pub used: LayerMap<f64>,
    /// Override entries pulled into bounds
    pub clamped: LayerMap<Clamp>,
    /// Scaled products pulled back into bounds
    pub final_clamped: LayerMap<Clamp>,
    /// Non-finite override entries, replaced by 1.0
    pub rejected: LayerMap<Rejection>,
    /// Override names that match no layer
    pub ignored_keys: Vec<String>,
}

/// Apply dynamic rules to the current layer values.
///
/// Rules naming an unknown target are skipped; a missing driver leaves the
/// target neutral.
pub fn dynamic_interactions(
    names: &[String],
    values: &[Option<f64>],
    rules: &[InteractionRule],
    bounds: &Bounds,
) -> Vec<f64> {
    let mut out = vec![1.0; names.len()];
    for rule in rules {
        let Some(target) = names.iter().position(|n| *n == rule.target) else {
            continue;
        };
        if let Some(signal) = rule.signal(names, values) {
            out[target] = bounds.clamp((rule.base + rule.gain * signal).min(rule.cap));
        }
    }
    out
}

/// Resolves the final interaction vector for one call.
pub struct InteractionResolver<'a> {
    bounds: &'a Bounds,
}

impl<'a> InteractionResolver<'a> {
    pub fn new(bounds: &'a Bounds) -> Self {
        Self { bounds }
    }

    pub fn resolve(
        &self,
        names: &[String],
        values: &[Option<f64>],
        rules: &[InteractionRule],
        mode: InteractionMode,
        requested: Option<&InteractionOverride>,
        override_mode: OverrideMode,
    ) -> Result<(Vec<f64>, InteractionAudit), GovernanceError> {
        let starting = match mode {
            InteractionMode::Base => vec![1.0; names.len()],
            InteractionMode::Dynamic => dynamic_interactions(names, values, rules, self.bounds),
        };

        let mut audit = InteractionAudit {
            interaction_mode: mode,
            override_mode,
            requested: requested.cloned(),
            starting: keyed(names, &starting),
            used: LayerMap::new(),
            clamped: LayerMap::new(),
            final_clamped: LayerMap::new(),
            rejected: LayerMap::new(),
            ignored_keys: Vec::new(),
        };

        let Some(requested) = requested else {
            audit.used = audit.starting.clone();
            return Ok((starting, audit));
        };

        let raw = self.align(names, requested, &mut audit)?;
        let mut used = Vec::with_capacity(names.len());
        for ((name, start), value) in names.iter().zip(&starting).zip(raw) {
            let entry = self.bound_entry(name, value, &mut audit);
            let final_value = match override_mode {
                OverrideMode::Replace => entry,
                OverrideMode::Scale => {
                    let product = start * entry;
                    let clamped = self.bounds.clamp(product);
                    if clamped != product {
                        audit.final_clamped.insert(
                            name.as_str(),
                            Clamp {
                                requested: product,
                                used: clamped,
                            },
                        );
                    }
                    clamped
                }
            };
            used.push(final_value);
        }

        debug!(?override_mode, ?used, "Interaction override resolved");
        audit.used = keyed(names, &used);
        Ok((used, audit))
    }

    /// Line the override up with the layer order. Missing names are neutral.
    fn align(
        &self,
        names: &[String],
        requested: &InteractionOverride,
        audit: &mut InteractionAudit,
    ) -> Result<Vec<f64>, GovernanceError> {
        match requested {
            InteractionOverride::Positional(values) => {
                if values.len() != names.len() {
                    return Err(GovernanceError::InteractionLength {
                        expected: names.len(),
                        got: values.len(),
                    });
                }
                Ok(values.clone())
            }
            InteractionOverride::Named(map) => {
                audit.ignored_keys = map
                    .keys()
                    .filter(|k| !names.contains(k))
                    .cloned()
                    .collect();
                if !audit.ignored_keys.is_empty() {
                    warn!(ignored = ?audit.ignored_keys, "Interaction override names no layer");
                }
                Ok(names
                    .iter()
                    .map(|n| map.get(n).copied().unwrap_or(1.0))
                    .collect())
            }
        }
    }

    fn bound_entry(&self, name: &str, value: f64, audit: &mut InteractionAudit) -> f64 {
        if !value.is_finite() {
            warn!(layer = name, "Non-finite interaction override, using 1.0");
            audit.rejected.insert(
                name.to_string(),
                Rejection {
                    requested: serde_json::Value::Null,
                    reason: "non-finite coefficient; 1.0 used".into(),
                },
            );
            return 1.0;
        }
        let used = self.bounds.clamp(value);
        if used != value {
            warn!(layer = name, requested = value, used, "Interaction override clamped");
            audit.clamped.insert(
                name.to_string(),
                Clamp {
                    requested: value,
                    used,
                },
            );
        }
        used
    }
}

fn keyed(names: &[String], values: &[f64]) -> LayerMap<f64> {
    names.iter().cloned().zip(values.iter().copied()).collect()
}

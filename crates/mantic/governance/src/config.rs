//! Governance bounds.
//!
//! Every limit the governor enforces lives here so a deployment can tighten
//! them from a config file without touching code. Defaults match the built-in
//! policy.

use std::collections::BTreeMap;

use mantic_kernel::{TemporalKernel, INTERACTION_MAX, INTERACTION_MIN};
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

/// Domain key whose allowlist permits every temporal kernel.
pub const GENERIC_DOMAIN: &str = "generic";

/// Closed numeric interval.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    fn check(&self, name: &str) -> Result<(), GovernanceError> {
        if self.min.is_finite() && self.max.is_finite() && self.min <= self.max {
            Ok(())
        } else {
            Err(GovernanceError::InvalidConfig(format!(
                "{name}: [{}, {}] is not a valid interval",
                self.min, self.max
            )))
        }
    }
}

/// How far a threshold override may drift from its registered base.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdPolicy {
    /// Relative drift allowed either side of the base (0.2 = ±20%)
    pub max_drift: f64,
    /// Hard legal domain for any threshold, intersected with the drift band
    pub legal: Bounds,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            max_drift: 0.2,
            legal: Bounds::new(0.05, 0.95),
        }
    }
}

/// Per-parameter bounds for an accepted temporal config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalBounds {
    pub t: Bounds,
    pub alpha: Bounds,
    pub n: Bounds,
    pub t0: Bounds,
    pub exponent: Bounds,
    pub frequency: Bounds,
    pub memory_strength: Bounds,
}

impl Default for TemporalBounds {
    fn default() -> Self {
        Self {
            t: Bounds::new(-1000.0, 1000.0),
            alpha: Bounds::new(0.01, 0.5),
            n: Bounds::new(-2.0, 2.0),
            t0: Bounds::new(-1000.0, 1000.0),
            exponent: Bounds::new(0.1, 3.0),
            frequency: Bounds::new(0.0, 10.0),
            memory_strength: Bounds::new(0.0, 2.0),
        }
    }
}

impl TemporalBounds {
    fn fields(&self) -> [(&'static str, &Bounds); 7] {
        [
            ("temporal.t", &self.t),
            ("temporal.alpha", &self.alpha),
            ("temporal.n", &self.n),
            ("temporal.t0", &self.t0),
            ("temporal.exponent", &self.exponent),
            ("temporal.frequency", &self.frequency),
            ("temporal.memory_strength", &self.memory_strength),
        ]
    }
}

/// Immutable governance configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    pub thresholds: ThresholdPolicy,
    /// Safe interval for the temporal multiplier handed to the formula
    pub f_time: Bounds,
    pub temporal: TemporalBounds,
    /// Bounds on every interaction coefficient
    pub interaction: Bounds,
    /// Domain → permitted temporal kernels. Domains absent here permit none.
    pub kernel_allowlists: BTreeMap<String, Vec<TemporalKernel>>,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdPolicy::default(),
            f_time: Bounds::new(0.1, 3.0),
            temporal: TemporalBounds::default(),
            interaction: Bounds::new(INTERACTION_MIN, INTERACTION_MAX),
            kernel_allowlists: default_kernel_allowlists(),
        }
    }
}

impl GovernanceConfig {
    /// Permitted kernels for a domain, or `None` when the domain has no allowlist.
    pub fn allowlist(&self, domain: &str) -> Option<&[TemporalKernel]> {
        self.kernel_allowlists.get(domain).map(Vec::as_slice)
    }

    /// Reject configurations the governor cannot enforce safely.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        let drift = self.thresholds.max_drift;
        if !drift.is_finite() || !(0.0..1.0).contains(&drift) {
            return Err(GovernanceError::InvalidConfig(format!(
                "thresholds.max_drift must be in [0, 1), got {drift}"
            )));
        }
        self.thresholds.legal.check("thresholds.legal")?;
        self.f_time.check("f_time")?;
        if self.f_time.min <= 0.0 {
            return Err(GovernanceError::InvalidConfig(format!(
                "f_time.min must be positive, got {}",
                self.f_time.min
            )));
        }
        for (name, bounds) in self.temporal.fields() {
            bounds.check(name)?;
        }
        self.interaction.check("interaction")?;
        if self.interaction.min < INTERACTION_MIN || self.interaction.max > INTERACTION_MAX {
            return Err(GovernanceError::InvalidConfig(format!(
                "interaction bounds must lie within [{INTERACTION_MIN}, {INTERACTION_MAX}]"
            )));
        }
        if self.interaction.min > 1.0 || self.interaction.max < 1.0 {
            return Err(GovernanceError::InvalidConfig(
                "interaction bounds must include the neutral coefficient 1.0".into(),
            ));
        }
        Ok(())
    }
}

/// Built-in kernel allowlists per domain.
pub fn default_kernel_allowlists() -> BTreeMap<String, Vec<TemporalKernel>> {
    use TemporalKernel::*;

    let table: [(&str, &[TemporalKernel]); 11] = [
        ("healthcare", &[Exponential, Linear, SCurve, Memory, Logistic]),
        ("finance", &[Exponential, Linear, Oscillatory, PowerLaw, Logistic]),
        ("cyber", &[Exponential, Linear, PowerLaw, SCurve]),
        ("climate", &[Exponential, Linear, Logistic, SCurve, Memory]),
        ("legal", &[Linear, SCurve, Memory, PowerLaw]),
        ("military", &[Exponential, Linear, Oscillatory, Logistic]),
        ("social", &[Exponential, Linear, SCurve, Memory, Oscillatory]),
        ("planning", &[Linear, SCurve, Logistic]),
        ("codebase", &[Linear, SCurve, Memory, Logistic]),
        ("system_lock", &[Linear, Memory, SCurve]),
        (GENERIC_DOMAIN, &TemporalKernel::ALL),
    ];

    table
        .into_iter()
        .map(|(domain, kernels)| (domain.to_string(), kernels.to_vec()))
        .collect()
}

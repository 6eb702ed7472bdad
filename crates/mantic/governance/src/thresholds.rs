use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{Bounds, ThresholdPolicy};

/// A registered threshold: its base value and optional per-threshold legal domain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    pub base: f64,
    /// Falls back to the policy's legal domain when `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal: Option<Bounds>,
}

impl ThresholdSpec {
    pub fn new(base: f64) -> Self {
        Self { base, legal: None }
    }

    /// The band an override may land in: ±drift around base, intersected
    /// with the legal domain. Collapses to a point if the two do not meet.
    pub fn band(&self, policy: &ThresholdPolicy) -> Bounds {
        let legal = self.legal.unwrap_or(policy.legal);
        let lo = (self.base * (1.0 - policy.max_drift)).max(legal.min);
        let hi = (self.base * (1.0 + policy.max_drift)).min(legal.max);
        if lo <= hi {
            Bounds::new(lo, hi)
        } else {
            let point = legal.clamp(self.base);
            Bounds::new(point, point)
        }
    }
}

/// Named thresholds registered for one detector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdSet(BTreeMap<String, ThresholdSpec>);

impl ThresholdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(name: impl Into<String>, base: f64) -> Self {
        let mut set = Self::new();
        set.insert(name, ThresholdSpec::new(base));
        set
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: ThresholdSpec) {
        self.0.insert(name.into(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&ThresholdSpec> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ThresholdSpec)> {
        self.0.iter()
    }

    /// Base values, before any override.
    pub fn bases(&self) -> BTreeMap<String, f64> {
        self.0.iter().map(|(k, v)| (k.clone(), v.base)).collect()
    }
}

/// Outcome for one governed threshold override.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdDecision {
    pub requested: f64,
    pub used: f64,
    pub was_clamped: bool,
    pub reason: Option<String>,
}

/// Bound a requested threshold to its drift band and legal domain.
pub fn bound_threshold(
    requested: f64,
    spec: &ThresholdSpec,
    policy: &ThresholdPolicy,
) -> ThresholdDecision {
    let band = spec.band(policy);

    if !requested.is_finite() {
        return ThresholdDecision {
            requested,
            used: spec.base,
            was_clamped: true,
            reason: Some("non-finite override; base value kept".into()),
        };
    }

    let used = band.clamp(requested);
    let was_clamped = used != requested;
    ThresholdDecision {
        requested,
        used,
        was_clamped,
        reason: was_clamped.then(|| format!("clamped to [{:.4}, {:.4}]", band.min, band.max)),
    }
}

/// Audit of the `threshold_overrides` section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdAudit {
    /// Caller's raw overrides; `None` when none were supplied
    pub requested: Option<BTreeMap<String, f64>>,
    /// Decision per registered threshold that was overridden
    pub decisions: BTreeMap<String, ThresholdDecision>,
    /// Any decision clamped
    pub clamped: bool,
    /// Names that match no registered threshold
    pub ignored_keys: Vec<String>,
}

/// Apply overrides to a registered set. Returns the active thresholds and the audit.
pub fn govern_thresholds(
    registered: &ThresholdSet,
    overrides: Option<&BTreeMap<String, f64>>,
    policy: &ThresholdPolicy,
) -> (BTreeMap<String, f64>, ThresholdAudit) {
    let mut active = registered.bases();
    let mut audit = ThresholdAudit::default();

    let Some(overrides) = overrides.filter(|o| !o.is_empty()) else {
        return (active, audit);
    };
    audit.requested = Some(overrides.clone());

    for (name, &requested) in overrides {
        let Some(spec) = registered.get(name) else {
            warn!(threshold = %name, "Ignoring override for unregistered threshold");
            audit.ignored_keys.push(name.clone());
            continue;
        };

        let decision = bound_threshold(requested, spec, policy);
        if decision.was_clamped {
            warn!(
                threshold = %name,
                requested,
                used = decision.used,
                "Threshold override clamped"
            );
            audit.clamped = true;
        }
        active.insert(name.clone(), decision.used);
        audit.decisions.insert(name.clone(), decision);
    }

    (active, audit)
}

//! Governance of caller-supplied temporal configuration.

use std::collections::BTreeMap;

use mantic_kernel::{temporal_multiplier, TemporalKernel, TemporalParams};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{Bounds, GovernanceConfig, TemporalBounds};

/// Caller's temporal configuration.
///
/// Only the listed keys are recognized; anything else is collected in
/// `extra` and reported as ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    /// Accepted in place of `alpha`; `alpha` wins when both are given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t0: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exponent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_strength: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TemporalConfig {
    pub fn new(kernel_type: impl Into<String>, t: f64) -> Self {
        Self {
            kernel_type: Some(kernel_type.into()),
            t: Some(t),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn alpha_or_decay_rate(&self) -> Option<f64> {
        self.alpha.or(self.decay_rate)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalStatus {
    NotRequested,
    Applied,
    Rejected,
}

/// A value that was refused, with the reason.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub requested: Value,
    pub reason: String,
}

/// A value that was pulled inside its bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clamp {
    pub requested: f64,
    pub used: f64,
}

/// Audit of the `temporal_config` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemporalAudit {
    pub status: TemporalStatus,
    pub domain: String,
    pub requested: Option<TemporalConfig>,
    /// Kernel actually used when applied
    pub kernel_type: Option<TemporalKernel>,
    /// Parameters actually used when applied
    pub params: Option<TemporalParams>,
    /// Multiplier computed from the applied config, before the f_time clamp
    pub f_time_computed: Option<f64>,
    pub allowed_kernels: Vec<TemporalKernel>,
    pub rejected: BTreeMap<String, Rejection>,
    pub clamped: BTreeMap<String, Clamp>,
    pub ignored_keys: Vec<String>,
}

impl TemporalAudit {
    fn new(domain: &str, allowed: &[TemporalKernel]) -> Self {
        Self {
            status: TemporalStatus::NotRequested,
            domain: domain.to_string(),
            requested: None,
            kernel_type: None,
            params: None,
            f_time_computed: None,
            allowed_kernels: allowed.to_vec(),
            rejected: BTreeMap::new(),
            clamped: BTreeMap::new(),
            ignored_keys: Vec::new(),
        }
    }

    fn reject(&mut self, key: &str, requested: Value, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(domain = %self.domain, key, %reason, "Temporal config rejected");
        self.status = TemporalStatus::Rejected;
        self.rejected
            .insert(key.to_string(), Rejection { requested, reason });
    }
}

fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Bound one sub-parameter. Absent keeps the default; non-finite is rejected
/// back to the default; out-of-range is clamped.
fn bound_param(
    key: &str,
    requested: Option<f64>,
    default: f64,
    bounds: &Bounds,
    audit: &mut TemporalAudit,
) -> f64 {
    let Some(value) = requested else {
        return default;
    };
    if !value.is_finite() {
        warn!(key, "Non-finite temporal parameter, using default");
        audit.rejected.insert(
            key.to_string(),
            Rejection {
                requested: Value::Null,
                reason: format!("non-finite value; default {default} used"),
            },
        );
        return default;
    }
    let used = bounds.clamp(value);
    if used != value {
        warn!(key, requested = value, used, "Temporal parameter clamped");
        audit.clamped.insert(
            key.to_string(),
            Clamp {
                requested: value,
                used,
            },
        );
    }
    used
}

fn bound_params(
    config: &TemporalConfig,
    t: f64,
    bounds: &TemporalBounds,
    audit: &mut TemporalAudit,
) -> TemporalParams {
    let defaults = TemporalParams::default();
    let alpha = config.alpha_or_decay_rate();
    TemporalParams {
        t: bound_param("t", Some(t), defaults.t, &bounds.t, audit),
        alpha: bound_param("alpha", alpha, defaults.alpha, &bounds.alpha, audit),
        n: bound_param("n", config.n, defaults.n, &bounds.n, audit),
        t0: bound_param("t0", config.t0, defaults.t0, &bounds.t0, audit),
        exponent: bound_param(
            "exponent",
            config.exponent,
            defaults.exponent,
            &bounds.exponent,
            audit,
        ),
        frequency: bound_param(
            "frequency",
            config.frequency,
            defaults.frequency,
            &bounds.frequency,
            audit,
        ),
        memory_strength: bound_param(
            "memory_strength",
            config.memory_strength,
            defaults.memory_strength,
            &bounds.memory_strength,
            audit,
        ),
    }
}

/// Resolve `kernel_type` against the domain allowlist, recording a rejection
/// when it is absent, unknown or not allowed.
fn allowed_kernel(
    domain: &str,
    requested: &TemporalConfig,
    config: &GovernanceConfig,
    audit: &mut TemporalAudit,
) -> Option<TemporalKernel> {
    let Some(kernel_name) = requested.kernel_type.as_deref() else {
        audit.reject("kernel_type", Value::Null, "kernel_type is required");
        return None;
    };
    let kernel = match kernel_name.parse::<TemporalKernel>() {
        Ok(kernel) => kernel,
        Err(err) => {
            audit.reject("kernel_type", Value::from(kernel_name), err.to_string());
            return None;
        }
    };
    let Some(allowed) = config.allowlist(domain) else {
        audit.reject(
            "kernel_type",
            Value::from(kernel_name),
            format!("unknown domain '{domain}' has no kernel allowlist"),
        );
        return None;
    };
    if !allowed.contains(&kernel) {
        let names: Vec<&str> = allowed.iter().map(|k| k.as_str()).collect();
        audit.reject(
            "kernel_type",
            Value::from(kernel_name),
            format!(
                "kernel '{kernel}' not allowed for domain '{domain}'; allowed: {}",
                names.join(", ")
            ),
        );
        return None;
    }
    Some(kernel)
}

/// Check a temporal config against the domain allowlist and bounds.
///
/// Returns the computed multiplier when the config is applied, `None` when it
/// was absent or rejected (the caller's f_time then stands).
pub fn govern_temporal(
    domain: &str,
    requested: Option<&TemporalConfig>,
    config: &GovernanceConfig,
) -> (Option<f64>, TemporalAudit) {
    let allowed = config.allowlist(domain).unwrap_or_default();
    let mut audit = TemporalAudit::new(domain, allowed);

    let Some(requested) = requested.filter(|r| !r.is_empty()) else {
        return (None, audit);
    };
    audit.requested = Some(requested.clone());
    audit.ignored_keys = requested.extra.keys().cloned().collect();
    if !audit.ignored_keys.is_empty() {
        debug!(domain, ignored = ?audit.ignored_keys, "Unrecognized temporal keys ignored");
    }

    // Check both required fields so every problem lands in the audit
    let kernel = allowed_kernel(domain, requested, config, &mut audit);
    let t = match requested.t {
        Some(t) if t.is_finite() => Some(t),
        Some(t) => {
            audit.reject("t", number(t), "t must be finite");
            None
        }
        None => {
            audit.reject("t", Value::Null, "t is required");
            None
        }
    };
    let (Some(kernel), Some(t)) = (kernel, t) else {
        return (None, audit);
    };

    let params = bound_params(requested, t, &config.temporal, &mut audit);
    let f_time = temporal_multiplier(kernel, &params);

    debug!(domain, %kernel, f_time, "Temporal config applied");
    audit.status = TemporalStatus::Applied;
    audit.kernel_type = Some(kernel);
    audit.params = Some(params);
    audit.f_time_computed = Some(f_time);

    (Some(f_time), audit)
}

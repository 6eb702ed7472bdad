use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// Smallest multiplier the scaler ever returns.
pub const TEMPORAL_FLOOR: f64 = 1e-10;

/// Exponent arguments are saturated here so `exp` stays finite.
const EXP_ARG_LIMIT: f64 = 700.0;

/// Temporal kernel modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKernel {
    /// Growth or decay, by the sign of n·alpha
    Exponential,
    /// Clamped linear decay
    Linear,
    /// Sigmoid saturation
    Logistic,
    /// Sigmoid with inflection at t0
    SCurve,
    /// Power law on (1 + t)
    PowerLaw,
    /// Exponential envelope modulated by a sine
    Oscillatory,
    /// One plus a decaying memory term
    Memory,
}

impl TemporalKernel {
    pub const ALL: [TemporalKernel; 7] = [
        TemporalKernel::Exponential,
        TemporalKernel::Linear,
        TemporalKernel::Logistic,
        TemporalKernel::SCurve,
        TemporalKernel::PowerLaw,
        TemporalKernel::Oscillatory,
        TemporalKernel::Memory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemporalKernel::Exponential => "exponential",
            TemporalKernel::Linear => "linear",
            TemporalKernel::Logistic => "logistic",
            TemporalKernel::SCurve => "s_curve",
            TemporalKernel::PowerLaw => "power_law",
            TemporalKernel::Oscillatory => "oscillatory",
            TemporalKernel::Memory => "memory",
        }
    }
}

impl fmt::Display for TemporalKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemporalKernel {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemporalKernel::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| KernelError::UnknownKernel(s.to_string()))
    }
}

/// Numeric inputs to the temporal scaler.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemporalParams {
    /// Time delta (0 = now, positive = future, negative = past)
    pub t: f64,
    /// Rate
    pub alpha: f64,
    /// Novelty / direction multiplier
    pub n: f64,
    /// Inflection point for `s_curve`
    pub t0: f64,
    /// Extra exponent for `power_law`
    pub exponent: f64,
    /// Angular frequency for `oscillatory`
    pub frequency: f64,
    /// Amplitude of the `memory` term
    pub memory_strength: f64,
}

impl Default for TemporalParams {
    fn default() -> Self {
        Self {
            t: 0.0,
            alpha: 0.1,
            n: 1.0,
            t0: 0.0,
            exponent: 1.0,
            frequency: 1.0,
            memory_strength: 1.0,
        }
    }
}

impl TemporalParams {
    pub fn at(t: f64) -> Self {
        Self {
            t,
            ..Self::default()
        }
    }
}

fn saturating_exp(x: f64) -> f64 {
    x.clamp(-EXP_ARG_LIMIT, EXP_ARG_LIMIT).exp()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + saturating_exp(-x))
}

/// Compute the temporal multiplier f(t). Always finite and `>= TEMPORAL_FLOOR`.
pub fn temporal_multiplier(kernel: TemporalKernel, p: &TemporalParams) -> f64 {
    let raw = match kernel {
        TemporalKernel::Exponential => saturating_exp(p.n * p.alpha * p.t),
        TemporalKernel::Linear => (1.0 - p.alpha * p.t.abs()).max(0.0),
        TemporalKernel::Logistic => sigmoid(p.n * p.alpha * p.t),
        TemporalKernel::SCurve => sigmoid(p.alpha * (p.t - p.t0)),
        TemporalKernel::PowerLaw => {
            let base = (1.0 + p.t).max(TEMPORAL_FLOOR);
            base.powf(p.n * p.alpha * p.exponent)
        }
        TemporalKernel::Oscillatory => {
            saturating_exp(p.n * p.alpha * p.t) * 0.5 * (1.0 + 0.5 * (p.frequency * p.t).sin())
        }
        TemporalKernel::Memory => 1.0 + p.memory_strength * saturating_exp(-p.t),
    };

    if raw.is_nan() {
        TEMPORAL_FLOOR
    } else {
        raw.clamp(TEMPORAL_FLOOR, f64::MAX)
    }
}

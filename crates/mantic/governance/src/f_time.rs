use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Bounds;

/// Neutral temporal multiplier.
pub const NEUTRAL_F_TIME: f64 = 1.0;

/// Where the pre-clamp f_time came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FTimeSource {
    Caller,
    TemporalConfig,
}

/// Audit of the `f_time` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FTimeAudit {
    pub source: FTimeSource,
    pub requested: f64,
    pub used: f64,
    pub was_clamped: bool,
    pub reason: Option<String>,
}

/// Bring f_time into the safe interval before it reaches the formula.
pub fn clamp_f_time(requested: f64, source: FTimeSource, bounds: &Bounds) -> FTimeAudit {
    if !requested.is_finite() {
        let used = bounds.clamp(NEUTRAL_F_TIME);
        warn!(requested, used, "Non-finite f_time replaced");
        return FTimeAudit {
            source,
            requested,
            used,
            was_clamped: true,
            reason: Some("non-finite f_time; neutral value used".into()),
        };
    }

    let used = bounds.clamp(requested);
    let was_clamped = used != requested;
    if was_clamped {
        warn!(requested, used, "f_time clamped");
    }
    FTimeAudit {
        source,
        requested,
        used,
        was_clamped,
        reason: was_clamped.then(|| format!("clamped to [{}, {}]", bounds.min, bounds.max)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFE: Bounds = Bounds::new(0.1, 3.0);

    #[test]
    fn in_range_passes_through() {
        let audit = clamp_f_time(1.5, FTimeSource::Caller, &SAFE);
        assert_eq!(audit.used, 1.5);
        assert!(!audit.was_clamped);
    }

    #[test]
    fn extremes_are_clamped() {
        assert_eq!(clamp_f_time(100.0, FTimeSource::Caller, &SAFE).used, 3.0);
        assert_eq!(clamp_f_time(0.0, FTimeSource::Caller, &SAFE).used, 0.1);
        assert_eq!(clamp_f_time(-5.0, FTimeSource::TemporalConfig, &SAFE).used, 0.1);
    }

    #[test]
    fn non_finite_falls_back_to_neutral() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let audit = clamp_f_time(bad, FTimeSource::Caller, &SAFE);
            assert_eq!(audit.used, 1.0);
            assert!(audit.was_clamped);
        }
    }
}

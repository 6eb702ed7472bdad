use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GovernanceConfig;
use crate::f_time::{clamp_f_time, FTimeAudit, FTimeSource};
use crate::interaction::InteractionAudit;
use crate::temporal::{govern_temporal, TemporalAudit, TemporalConfig};
use crate::thresholds::{govern_thresholds, ThresholdAudit, ThresholdSet};

/// Everything the caller asked to change, ahead of governance.
#[derive(Clone, Copy, Debug)]
pub struct OverrideRequest<'a> {
    /// Domain key for the kernel allowlist
    pub domain: &'a str,
    pub f_time: f64,
    pub threshold_override: Option<&'a BTreeMap<String, f64>>,
    pub temporal_config: Option<&'a TemporalConfig>,
}

/// Parameters after governance, ready for the formula.
#[derive(Clone, Debug, PartialEq)]
pub struct GovernedParameters {
    pub thresholds: BTreeMap<String, f64>,
    pub f_time: f64,
    pub threshold_audit: ThresholdAudit,
    pub temporal_audit: TemporalAudit,
    pub f_time_audit: FTimeAudit,
}

/// The full governance record attached to every result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverridesAudit {
    pub threshold_overrides: ThresholdAudit,
    pub temporal_config: TemporalAudit,
    pub f_time: FTimeAudit,
    pub interaction: InteractionAudit,
}

impl OverridesAudit {
    pub fn new(governed: &GovernedParameters, interaction: InteractionAudit) -> Self {
        Self {
            threshold_overrides: governed.threshold_audit.clone(),
            temporal_config: governed.temporal_audit.clone(),
            f_time: governed.f_time_audit.clone(),
            interaction,
        }
    }

    /// True if any governed input was clamped or rejected.
    pub fn any_deviation(&self) -> bool {
        self.threshold_overrides.clamped
            || !self.threshold_overrides.ignored_keys.is_empty()
            || !self.temporal_config.rejected.is_empty()
            || !self.temporal_config.clamped.is_empty()
            || self.f_time.was_clamped
            || !self.interaction.clamped.is_empty()
            || !self.interaction.final_clamped.is_empty()
            || !self.interaction.rejected.is_empty()
            || !self.interaction.ignored_keys.is_empty()
    }
}

/// Honors caller overrides only within the configured safe ranges.
#[derive(Clone, Copy, Debug)]
pub struct OverrideGovernor<'a> {
    config: &'a GovernanceConfig,
}

impl<'a> OverrideGovernor<'a> {
    pub fn new(config: &'a GovernanceConfig) -> Self {
        Self { config }
    }

    /// Govern thresholds, temporal config and f_time for one call.
    ///
    /// An applied temporal config replaces the caller's f_time; either way the
    /// result is clamped to the safe interval.
    pub fn govern(
        &self,
        registered: &ThresholdSet,
        request: OverrideRequest<'_>,
    ) -> GovernedParameters {
        let (thresholds, threshold_audit) = govern_thresholds(
            registered,
            request.threshold_override,
            &self.config.thresholds,
        );

        let (computed, temporal_audit) =
            govern_temporal(request.domain, request.temporal_config, self.config);

        let (pre_clamp, source) = match computed {
            Some(f) => (f, FTimeSource::TemporalConfig),
            None => (request.f_time, FTimeSource::Caller),
        };
        let f_time_audit = clamp_f_time(pre_clamp, source, &self.config.f_time);

        debug!(
            domain = request.domain,
            f_time = f_time_audit.used,
            ?thresholds,
            "Overrides governed"
        );

        GovernedParameters {
            thresholds,
            f_time: f_time_audit.used,
            threshold_audit,
            temporal_audit,
            f_time_audit,
        }
    }
}

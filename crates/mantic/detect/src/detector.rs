//! Detection orchestrator.
//!
//! One pipeline serves both caller-defined domains and built-in presets:
//! registration, governance, interaction resolution, the formula, then
//! interpretation, coupling and visibility. Nothing is retained between
//! calls.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use mantic_governance::{
    InteractionMode, InteractionOverride, InteractionResolver, InteractionRule, OverrideGovernor,
    OverrideMode, OverrideRequest, OverridesAudit, TemporalConfig, ThresholdSet, GENERIC_DOMAIN,
};
use mantic_kernel::{analyze_coupling, evaluate_checked, LayerMap, KERNEL_VERSION};
use tracing::{debug, info, warn};

use crate::config::{DetectorConfig, EmergenceTiers};
use crate::error::{DetectError, DetectResult};
use crate::interpret::{interpret_emergence, interpret_friction, Outcome};
use crate::preset::{find_preset, Preset};
use crate::registration::{validate_registration, RegistrationInput};
use crate::request::{DetectionMode, DetectionRequest, PresetOptions};
use crate::result::{Calibration, DetectionResult, DomainType};
use crate::visibility::{compute_visibility, HierarchyLevel};

/// Name of the single threshold a caller-defined domain registers.
pub const DETECTION_THRESHOLD: &str = "detection";

/// Normalization constant passed to the formula.
const K_N: f64 = 1.0;

/// Everything one pipeline run needs, borrowed from a request or a preset.
struct Plan<'a> {
    domain_name: &'a str,
    /// Key into the kernel allowlists
    allowlist_domain: &'a str,
    domain_type: DomainType,
    preset: Option<&'static str>,
    mode: DetectionMode,
    layer_names: &'a [String],
    weights: &'a [f64],
    layer_values: &'a [Option<f64>],
    thresholds: ThresholdSet,
    detection_key: &'a str,
    /// Threshold standing in for the configured OPTIMAL floor
    optimal_key: Option<&'a str>,
    escalation_keys: Vec<&'a str>,
    rules: &'a [InteractionRule],
    hierarchy: Option<&'a BTreeMap<String, HierarchyLevel>>,
    f_time: f64,
    threshold_override: Option<&'a BTreeMap<String, f64>>,
    temporal_config: Option<&'a TemporalConfig>,
    interaction_mode: InteractionMode,
    interaction_override: Option<&'a InteractionOverride>,
    interaction_override_mode: OverrideMode,
}

/// Runs detections under one immutable configuration.
#[derive(Clone, Debug, Default)]
pub struct Detector {
    config: DetectorConfig,
}

static GLOBAL: OnceLock<Detector> = OnceLock::new();

impl Detector {
    pub fn new(config: DetectorConfig) -> DetectResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Process-wide detector with the default configuration.
    pub fn global() -> &'static Detector {
        GLOBAL.get_or_init(|| Detector {
            config: DetectorConfig::global().clone(),
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect over a caller-defined domain.
    pub fn detect(&self, request: &DetectionRequest) -> DetectResult<DetectionResult> {
        let threshold = request
            .detection_threshold
            .unwrap_or(self.config.default_detection_threshold);
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(DetectError::range(
                "detection_threshold",
                format!("must be a finite number in [0, 1], got {threshold}"),
            ));
        }

        self.run(
            Plan {
                domain_name: &request.domain_name,
                allowlist_domain: GENERIC_DOMAIN,
                domain_type: DomainType::UserDefined,
                preset: None,
                mode: request.mode,
                layer_names: &request.layer_names,
                weights: &request.weights,
                layer_values: &request.layer_values,
                thresholds: ThresholdSet::single(DETECTION_THRESHOLD, threshold),
                detection_key: DETECTION_THRESHOLD,
                optimal_key: None,
                escalation_keys: Vec::new(),
                rules: &[],
                hierarchy: request.layer_hierarchy.as_ref(),
                f_time: request.f_time,
                threshold_override: request.threshold_override.as_ref(),
                temporal_config: request.temporal_config.as_ref(),
                interaction_mode: request.interaction_mode,
                interaction_override: request.interaction_override.as_ref(),
                interaction_override_mode: request.interaction_override_mode,
            },
            false,
        )
    }

    /// Detect with a built-in preset. `layer_values` follow the preset's
    /// layer order.
    pub fn detect_preset(
        &self,
        name: &str,
        layer_values: &[Option<f64>],
        options: &PresetOptions,
    ) -> DetectResult<DetectionResult> {
        let preset = find_preset(name).ok_or_else(|| {
            DetectError::registration("preset", format!("unknown preset '{name}'"))
        })?;
        self.run_preset(preset, layer_values, options)
    }

    fn run_preset(
        &self,
        preset: &'static Preset,
        layer_values: &[Option<f64>],
        options: &PresetOptions,
    ) -> DetectResult<DetectionResult> {
        let layer_names = preset.layer_names();
        let rules = preset.interaction_rules();
        let hierarchy = preset.hierarchy_map();
        let (detection_key, _) = preset.detection_threshold();

        self.run(
            Plan {
                domain_name: preset.domain,
                allowlist_domain: preset.domain,
                domain_type: DomainType::BuiltinPreset,
                preset: Some(preset.name),
                mode: preset.mode,
                layer_names: &layer_names,
                weights: preset.weights,
                layer_values,
                thresholds: preset.threshold_set(),
                detection_key,
                optimal_key: preset.optimal_tier(),
                escalation_keys: preset.escalations(),
                rules: &rules,
                hierarchy: Some(&hierarchy),
                f_time: options.f_time,
                threshold_override: options.threshold_override.as_ref(),
                temporal_config: options.temporal_config.as_ref(),
                interaction_mode: options.interaction_mode,
                interaction_override: options.interaction_override.as_ref(),
                interaction_override_mode: options.interaction_override_mode,
            },
            true,
        )
    }

    fn run(&self, plan: Plan<'_>, allow_reserved: bool) -> DetectResult<DetectionResult> {
        let registration = validate_registration(
            RegistrationInput {
                domain_name: plan.domain_name,
                layer_names: plan.layer_names,
                weights: plan.weights,
                layer_values: plan.layer_values,
                allow_reserved,
            },
            &self.config,
        )?;
        let names = &registration.layer_names;
        let values = &registration.values;

        let governed = OverrideGovernor::new(&self.config.governance).govern(
            &plan.thresholds,
            OverrideRequest {
                domain: plan.allowlist_domain,
                f_time: plan.f_time,
                threshold_override: plan.threshold_override,
                temporal_config: plan.temporal_config,
            },
        );

        let (interactions, interaction_audit) =
            InteractionResolver::new(&self.config.governance.interaction).resolve(
                names,
                values,
                plan.rules,
                plan.interaction_mode,
                plan.interaction_override,
                plan.interaction_override_mode,
            )?;

        let overrides = OverridesAudit::new(&governed, interaction_audit);
        if overrides.any_deviation() {
            warn!(domain = %registration.domain_name, "Overrides clamped or rejected, see audit");
        }

        let output = evaluate_checked(
            &registration.weights,
            values,
            &interactions,
            governed.f_time,
            K_N,
        )?;
        debug!(
            spatial = output.spatial,
            f_time = governed.f_time,
            "Formula evaluated"
        );

        let threshold = governed
            .thresholds
            .get(plan.detection_key)
            .copied()
            .ok_or_else(|| {
                DetectError::Configuration(format!(
                    "detection threshold '{}' is not registered",
                    plan.detection_key
                ))
            })?;

        let outcome = match plan.mode {
            DetectionMode::Friction => {
                let escalations: Vec<(&str, f64)> = plan
                    .escalation_keys
                    .iter()
                    .filter_map(|k| governed.thresholds.get(*k).map(|v| (*k, *v)))
                    .collect();
                Outcome::Friction(interpret_friction(names, values, threshold, &escalations))
            }
            DetectionMode::Emergence => {
                let tiers = match plan.optimal_key.and_then(|k| governed.thresholds.get(k)) {
                    Some(&optimal_floor) => EmergenceTiers {
                        optimal_floor,
                        ..self.config.emergence.clone()
                    },
                    None => self.config.emergence.clone(),
                };
                Outcome::Emergence(interpret_emergence(names, values, threshold, &tiers))
            }
        };

        let layer_coupling = analyze_coupling(names, values, self.config.tension_threshold);

        let layer_visibility = plan.hierarchy.and_then(|h| {
            compute_visibility(
                names,
                &output.effective_weights,
                &output.contributions,
                h,
                &registration.domain_name,
            )
        });

        let keyed = |xs: &[f64]| -> LayerMap<f64> {
            names.iter().cloned().zip(xs.iter().copied()).collect()
        };

        let calibration = Calibration {
            domain_type: plan.domain_type,
            domain_name: registration.domain_name.clone(),
            preset: plan.preset.map(str::to_string),
            mode: plan.mode,
            layer_count: registration.layer_count(),
            weight_distribution: keyed(&registration.weights),
            kernel_version: KERNEL_VERSION.to_string(),
            note: match plan.domain_type {
                DomainType::UserDefined => {
                    "User-defined domain; thresholds and weights are caller-supplied".to_string()
                }
                DomainType::BuiltinPreset => {
                    "Built-in preset; thresholds and weights are pre-registered".to_string()
                }
            },
        };

        info!(
            domain = %registration.domain_name,
            mode = %plan.mode,
            m_score = output.m_score,
            triggered = outcome.triggered(),
            "Detection complete"
        );

        Ok(DetectionResult {
            outcome,
            m_score: output.m_score,
            spatial_component: output.spatial,
            layer_attribution: keyed(&output.attribution),
            thresholds: governed.thresholds,
            overrides_applied: overrides,
            layer_coupling,
            layer_visibility,
            calibration,
            layer_values: names.iter().cloned().zip(values.iter().copied()).collect(),
        })
    }
}

/// [`Detector::detect`] on the process-wide detector.
pub fn detect(request: &DetectionRequest) -> DetectResult<DetectionResult> {
    Detector::global().detect(request)
}

/// [`Detector::detect_preset`] on the process-wide detector.
pub fn detect_preset(
    name: &str,
    layer_values: &[Option<f64>],
    options: &PresetOptions,
) -> DetectResult<DetectionResult> {
    Detector::global().detect_preset(name, layer_values, options)
}

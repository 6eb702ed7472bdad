//! End-to-end detection scenarios through the public API.

use std::collections::{BTreeMap, BTreeSet};

use mantic_detect::governance::{
    FTimeSource, InteractionOverride, OverrideMode, TemporalConfig, TemporalStatus,
};
use mantic_detect::kernel::TemporalKernel;
use mantic_detect::*;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const LAYERS: [&str; 4] = ["supply", "demand", "logistics", "regulatory"];

fn request(values: &[Option<f64>], weights: &[f64], mode: DetectionMode) -> DetectionRequest {
    DetectionRequest::new("supply_chain", &LAYERS, weights, values, mode)
}

fn mixed(mode: DetectionMode) -> DetectionRequest {
    request(
        &[Some(0.8), Some(0.3), Some(0.6), Some(0.7)],
        &[0.3, 0.3, 0.2, 0.2],
        mode,
    )
}

fn keys(result: &DetectionResult) -> BTreeSet<String> {
    match serde_json::to_value(result).unwrap() {
        Value::Object(map) => map.into_iter().map(|(k, _)| k).collect(),
        other => panic!("result is not an object: {other}"),
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn uniform_reference_case() {
    let result = detect(&request(
        &[Some(0.5); 4],
        &[0.25; 4],
        DetectionMode::Friction,
    ))
    .unwrap();

    assert!(close(result.m_score, 0.5));
    assert!(close(result.spatial_component, 0.5));
    for layer in LAYERS {
        assert!(close(result.layer_attribution[layer], 0.25));
    }
    assert!(!result.triggered());
}

#[test]
fn friction_names_the_extremes() {
    let result = detect(&mixed(DetectionMode::Friction)).unwrap();
    let Outcome::Friction(f) = &result.outcome else {
        panic!("expected friction outcome");
    };

    let alert = f.alert.as_deref().unwrap();
    assert!(alert.contains("supply"));
    assert!(alert.contains("demand"));
    assert!(close(f.severity, 0.5));
    assert!(close(f.mismatch_score, 0.5));
}

#[test]
fn emergence_below_threshold_has_no_window() {
    let result = detect(&mixed(DetectionMode::Emergence)).unwrap();
    let Outcome::Emergence(e) = &result.outcome else {
        panic!("expected emergence outcome");
    };

    assert!(!e.window_detected);
    assert!(close(e.alignment_floor, 0.3));
    assert_eq!(e.improvement_needed.as_deref(), Some(&["demand".to_string()][..]));
}

#[test]
fn threshold_override_is_clamped_to_band() {
    let mut req = mixed(DetectionMode::Friction);
    req.threshold_override = Some(BTreeMap::from([("detection".to_string(), 0.9)]));
    let result = detect(&req).unwrap();

    assert!(close(result.thresholds["detection"], 0.48));
    let decision = &result.overrides_applied.threshold_overrides.decisions["detection"];
    assert!(decision.was_clamped);
    assert_eq!(decision.requested, 0.9);
    assert!(result.overrides_applied.threshold_overrides.clamped);

    // 0.5 divergence still beats the clamped 0.48
    assert!(result.triggered());
}

#[test]
fn weight_only_on_missing_layers_is_rejected() {
    let err = detect(&DetectionRequest::new(
        "supply_chain",
        &["supply", "demand", "logistics"],
        &[1.0, 0.0, 0.0],
        &[None, Some(0.5), Some(0.6)],
        DetectionMode::Friction,
    ))
    .unwrap_err();
    assert!(matches!(err, DetectError::Registration { ref field, .. } if field == "weights"));
}

#[test]
fn reserved_domain_is_rejected() {
    let mut req = mixed(DetectionMode::Friction);
    req.domain_name = "Healthcare".into();
    let err = detect(&req).unwrap_err();
    assert!(matches!(err, DetectError::Registration { ref field, .. } if field == "domain_name"));
}

#[test]
fn disallowed_kernel_leaves_f_time_alone() {
    let mut config = DetectorConfig::default();
    config.governance.kernel_allowlists.insert(
        "generic".into(),
        vec![TemporalKernel::Linear, TemporalKernel::Memory, TemporalKernel::SCurve],
    );
    let detector = Detector::new(config).unwrap();

    let mut req = mixed(DetectionMode::Friction);
    req.temporal_config = Some(TemporalConfig::new("exponential", 1.0));
    let result = detector.detect(&req).unwrap();

    let audit = &result.overrides_applied;
    assert_eq!(audit.temporal_config.status, TemporalStatus::Rejected);
    assert_eq!(audit.f_time.source, FTimeSource::Caller);
    assert_eq!(audit.f_time.used, 1.0);
    assert!(close(result.m_score, result.spatial_component));
}

#[test]
fn preset_allowlist_rejects_outside_kernels() {
    let options = PresetOptions {
        temporal_config: Some(TemporalConfig::new("exponential", 1.0)),
        ..PresetOptions::default()
    };
    let result = detect_preset(
        "system_lock_recursive_control",
        &[Some(0.3), Some(0.4), Some(0.8), Some(0.6)],
        &options,
    )
    .unwrap();
    assert_eq!(
        result.overrides_applied.temporal_config.status,
        TemporalStatus::Rejected
    );
}

#[test]
fn allowed_kernel_scales_the_score() {
    let mut req = mixed(DetectionMode::Friction);
    req.temporal_config = Some(TemporalConfig::new("memory", 1.0));
    let result = detect(&req).unwrap();

    let audit = &result.overrides_applied;
    assert_eq!(audit.temporal_config.status, TemporalStatus::Applied);
    assert_eq!(audit.f_time.source, FTimeSource::TemporalConfig);
    // 1 + e^-1 with the default memory strength
    assert!(close(audit.f_time.used, 1.0 + (-1.0f64).exp()));
    assert!(close(result.m_score, result.spatial_component * audit.f_time.used));
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[test]
fn key_set_is_stable_within_each_mode() {
    let quiet = [Some(0.6); 4];
    let loud = [Some(0.95), Some(0.1), Some(0.5), Some(0.5)];
    let aligned = [Some(0.9); 4];

    let f_alert = detect(&request(&loud, &[0.25; 4], DetectionMode::Friction)).unwrap();
    let f_quiet = detect(&request(&quiet, &[0.25; 4], DetectionMode::Friction)).unwrap();
    assert!(f_alert.triggered() && !f_quiet.triggered());
    assert_eq!(keys(&f_alert), keys(&f_quiet));

    let e_window = detect(&request(&aligned, &[0.25; 4], DetectionMode::Emergence)).unwrap();
    let e_none = detect(&request(&loud, &[0.25; 4], DetectionMode::Emergence)).unwrap();
    assert!(e_window.triggered() && !e_none.triggered());
    assert_eq!(keys(&e_window), keys(&e_none));
}

#[test]
fn universal_keys_present_in_both_modes() {
    let universal = [
        "m_score",
        "spatial_component",
        "layer_attribution",
        "thresholds",
        "overrides_applied",
        "layer_coupling",
        "layer_visibility",
        "calibration",
        "layer_values",
    ];
    for mode in [DetectionMode::Friction, DetectionMode::Emergence] {
        let k = keys(&detect(&mixed(mode)).unwrap());
        for key in universal {
            assert!(k.contains(key), "{mode} result missing {key}");
        }
    }
}

#[test]
fn missing_layers_serialize_as_null() {
    let result = detect(&request(
        &[Some(0.8), None, Some(0.6), Some(0.7)],
        &[0.3, 0.3, 0.2, 0.2],
        DetectionMode::Friction,
    ))
    .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["layer_values"]["demand"].is_null());
    assert_eq!(json["escalation"], Value::Null);
    assert_eq!(json["layer_attribution"]["demand"], 0.0);
    assert!(json["layer_coupling"]["layers"]["demand"]["mean_agreement"].is_null());
}

#[test]
fn layer_maps_keep_registration_order() {
    let names = ["zulu", "alpha", "mike"];
    let result = detect(&DetectionRequest::new(
        "ordering",
        &names,
        &[0.4, 0.3, 0.3],
        &[Some(0.2), Some(0.9), Some(0.5)],
        DetectionMode::Friction,
    ))
    .unwrap();

    let text = serde_json::to_string(&result).unwrap();
    for section in [
        "\"layer_attribution\":{",
        "\"layer_values\":{",
        "\"weight_distribution\":{",
        "\"used\":{",
    ] {
        let start = text.find(section).unwrap() + section.len();
        let body = &text[start..];
        let positions: Vec<usize> = names
            .iter()
            .map(|n| body.find(&format!("\"{n}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{section}");
    }
    assert_eq!(result.layer_coupling.layers.keys().collect::<Vec<_>>(), names);
}

// ---------------------------------------------------------------------------
// Cross-mode and visibility
// ---------------------------------------------------------------------------

#[test]
fn modes_share_the_score() {
    let f = detect(&mixed(DetectionMode::Friction)).unwrap();
    let e = detect(&mixed(DetectionMode::Emergence)).unwrap();

    assert_eq!(f.m_score, e.m_score);
    assert_eq!(f.spatial_component, e.spatial_component);
    assert_eq!(f.layer_attribution, e.layer_attribution);
    assert_eq!(f.layer_coupling, e.layer_coupling);
}

#[test]
fn hierarchy_never_moves_the_score() {
    let plain = detect(&mixed(DetectionMode::Emergence)).unwrap();

    let mut req = mixed(DetectionMode::Emergence);
    req.layer_hierarchy = Some(
        LAYERS
            .iter()
            .zip(HierarchyLevel::ALL)
            .map(|(n, l)| (n.to_string(), l))
            .collect(),
    );
    let with = detect(&req).unwrap();

    assert_eq!(plain.m_score, with.m_score);
    let vis = with.layer_visibility.unwrap();
    let total: f64 = vis.contributions_by_layer.values().sum();
    assert!(close(total, with.spatial_component));
    assert!(vis.unmapped.is_empty());
    // supply: 0.3 · 0.8 is the largest single contribution
    assert_eq!(vis.dominant, HierarchyLevel::Micro);
}

// ---------------------------------------------------------------------------
// Interactions
// ---------------------------------------------------------------------------

#[test]
fn positional_override_of_wrong_length_fails() {
    let mut req = mixed(DetectionMode::Friction);
    req.interaction_override = Some(InteractionOverride::Positional(vec![1.0, 1.0]));
    let err = detect(&req).unwrap_err();
    assert!(matches!(
        err,
        DetectError::Registration { ref field, .. } if field == "interaction_override"
    ));
}

#[test]
fn named_replace_override_is_bounded() {
    let mut req = mixed(DetectionMode::Friction);
    req.interaction_override = Some(InteractionOverride::Named(BTreeMap::from([
        ("supply".to_string(), 5.0),
        ("nonexistent".to_string(), 1.5),
    ])));
    req.interaction_override_mode = OverrideMode::Replace;
    let result = detect(&req).unwrap();

    let audit = &result.overrides_applied.interaction;
    assert_eq!(audit.used["supply"], 2.0);
    assert!(audit.clamped.contains_key("supply"));
    assert_eq!(audit.ignored_keys, vec!["nonexistent".to_string()]);
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

#[test]
fn every_preset_runs() {
    for preset in PRESETS {
        let values: Vec<Option<f64>> = (0..preset.layers.len())
            .map(|i| Some(0.35 + 0.15 * i as f64))
            .collect();
        let result = detect_preset(preset.name, &values, &PresetOptions::default())
            .unwrap_or_else(|e| panic!("{} failed: {e}", preset.name));

        assert_eq!(result.mode(), preset.mode, "{}", preset.name);
        assert_eq!(result.calibration.domain_type, DomainType::BuiltinPreset);
        assert_eq!(result.thresholds.len(), preset.thresholds.len());
        let sum: f64 = result.layer_attribution.values().sum();
        assert!(close(sum, 1.0), "{} attribution sums to {sum}", preset.name);
        assert!(result.layer_visibility.is_some());
    }
}

fn emergence_of(result: &DetectionResult) -> &EmergenceOutcome {
    match &result.outcome {
        Outcome::Emergence(e) => e,
        Outcome::Friction(_) => panic!("expected emergence outcome"),
    }
}

fn friction_of(result: &DetectionResult) -> &FrictionOutcome {
    match &result.outcome {
        Outcome::Friction(f) => f,
        Outcome::Emergence(_) => panic!("expected friction outcome"),
    }
}

fn overriding(pairs: &[(&str, f64)]) -> PresetOptions {
    PresetOptions {
        threshold_override: Some(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
        ..PresetOptions::default()
    }
}

#[test]
fn preset_optimal_tier_decides_window_type() {
    let values = [Some(0.85); 4];

    let default = detect_preset(
        "healthcare_precision_therapeutic",
        &values,
        &PresetOptions::default(),
    )
    .unwrap();
    let e = emergence_of(&default);
    assert!(e.window_type.as_deref().unwrap().starts_with("OPTIMAL"));
    assert_eq!(e.confidence, Some(0.95));

    // Raising the preset's own optimal tier demotes the same window
    let raised = detect_preset(
        "healthcare_precision_therapeutic",
        &values,
        &overriding(&[("optimal", 0.95), ("bogus", 0.1)]),
    )
    .unwrap();
    assert!(close(raised.thresholds["optimal"], 0.95));
    assert_eq!(raised.thresholds["alignment"], 0.65);
    assert_eq!(
        raised.overrides_applied.threshold_overrides.ignored_keys,
        vec!["bogus".to_string()]
    );
    let e = emergence_of(&raised);
    assert!(e.window_detected);
    assert!(e.window_type.as_deref().unwrap().starts_with("FAVORABLE"));
    assert_eq!(e.confidence, Some(0.75));
}

#[test]
fn preset_optimal_tier_below_default_floor_promotes() {
    // dissolution_window sits at 0.70, under the configured 0.8 floor
    let result = detect_preset(
        "system_lock_dissolution_window",
        &[Some(0.75); 4],
        &PresetOptions::default(),
    )
    .unwrap();
    assert!(emergence_of(&result)
        .window_type
        .as_deref()
        .unwrap()
        .starts_with("OPTIMAL"));
}

#[test]
fn preset_escalation_thresholds_grade_friction() {
    let name = "climate_maladaptation";
    let mild = [Some(0.8), Some(0.3), Some(0.5), Some(0.5)];
    let severe = [Some(0.9), Some(0.2), Some(0.5), Some(0.5)];

    let result = detect_preset(name, &mild, &PresetOptions::default()).unwrap();
    let f = friction_of(&result);
    assert!(f.alert.is_some());
    assert_eq!(f.escalation, None);

    let result = detect_preset(name, &severe, &PresetOptions::default()).unwrap();
    assert_eq!(friction_of(&result).escalation.as_deref(), Some("block"));

    // Pushing `block` to the top of its band takes 0.7 divergence back out
    let result = detect_preset(name, &severe, &overriding(&[("block", 0.9)])).unwrap();
    assert!(close(result.thresholds["block"], 0.72));
    let f = friction_of(&result);
    assert!(f.alert.is_some());
    assert_eq!(f.escalation, None);
}

#[test]
fn user_domains_never_escalate() {
    let loud = [Some(1.0), Some(0.0), Some(0.5), Some(0.5)];
    let result = detect(&request(&loud, &[0.25; 4], DetectionMode::Friction)).unwrap();
    let f = friction_of(&result);
    assert!(f.alert.is_some());
    assert_eq!(f.escalation, None);
    assert!(serde_json::to_value(&result).unwrap()["escalation"].is_null());
}

#[test]
fn preset_value_count_must_match() {
    let err = detect_preset(
        "climate_maladaptation",
        &[Some(0.5); 3],
        &PresetOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DetectError::Registration { ref field, .. } if field == "layer_values"));
}

#[test]
fn request_json_round_trip_through_detector() {
    let req: DetectionRequest = serde_json::from_value(serde_json::json!({
        "domain_name": "team_health",
        "layer_names": ["morale", "velocity", "quality"],
        "weights": [0.4, 0.3, 0.3],
        "layer_values": [0.9, 0.85, null],
        "mode": "emergence",
        "detection_threshold": 0.6
    }))
    .unwrap();

    let result = detect(&req).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["window_detected"], true);
    assert_eq!(json["limiting_factor"], "velocity");
    assert_eq!(json["calibration"]["domain_type"], "user_defined");
    assert_eq!(json["calibration"]["mode"], "emergence");
}

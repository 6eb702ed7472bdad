//! Built-in domain presets.
//!
//! Each preset is a registration expressed as data: layers, weights, mode,
//! thresholds, hierarchy and dynamic interaction rules. They all run through
//! the same orchestrator as caller-defined domains.

use std::collections::BTreeMap;

use mantic_governance::{InteractionRule, ThresholdSet, ThresholdSpec};
use serde::Serialize;

use crate::request::DetectionMode::{self, Emergence, Friction};
use crate::visibility::HierarchyLevel::{self, Macro, Meso, Meta, Micro};

/// Static form of an [`InteractionRule`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RuleDef {
    pub target: &'static str,
    pub driver: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_to: Option<&'static str>,
    pub base: f64,
    pub gain: f64,
    pub cap: f64,
}

impl RuleDef {
    pub fn to_rule(&self) -> InteractionRule {
        let rule = InteractionRule::new(self.target, self.driver, self.base, self.gain, self.cap);
        match self.relative_to {
            Some(other) => rule.relative_to(other),
            None => rule,
        }
    }
}

/// What a preset threshold feeds into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdRole {
    /// Compared against the divergence or alignment floor to trigger
    Detection,
    /// Alignment floor an emergence window must clear to be OPTIMAL
    OptimalTier,
    /// Divergence level that escalates a friction alert
    Escalation,
}

/// One named preset threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PresetThreshold {
    pub name: &'static str,
    pub base: f64,
    pub role: ThresholdRole,
}

const fn detection(name: &'static str, base: f64) -> PresetThreshold {
    PresetThreshold {
        name,
        base,
        role: ThresholdRole::Detection,
    }
}

const fn optimal_tier(name: &'static str, base: f64) -> PresetThreshold {
    PresetThreshold {
        name,
        base,
        role: ThresholdRole::OptimalTier,
    }
}

const fn escalation(name: &'static str, base: f64) -> PresetThreshold {
    PresetThreshold {
        name,
        base,
        role: ThresholdRole::Escalation,
    }
}

/// A built-in registration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Preset {
    pub name: &'static str,
    /// Domain key, also used for the kernel allowlist
    pub domain: &'static str,
    pub mode: DetectionMode,
    pub description: &'static str,
    pub layers: &'static [&'static str],
    pub weights: &'static [f64],
    /// The first entry is the detection threshold
    pub thresholds: &'static [PresetThreshold],
    /// Parallel to `layers`
    pub hierarchy: &'static [HierarchyLevel],
    pub rules: &'static [RuleDef],
}

impl Preset {
    pub fn layer_names(&self) -> Vec<String> {
        self.layers.iter().map(|s| s.to_string()).collect()
    }

    /// Name and base of the threshold the interpretation compares against.
    pub fn detection_threshold(&self) -> (&'static str, f64) {
        let first = &self.thresholds[0];
        (first.name, first.base)
    }

    /// Threshold whose governed value replaces the default OPTIMAL floor.
    pub fn optimal_tier(&self) -> Option<&'static str> {
        self.thresholds
            .iter()
            .find(|t| t.role == ThresholdRole::OptimalTier)
            .map(|t| t.name)
    }

    pub fn escalations(&self) -> Vec<&'static str> {
        self.thresholds
            .iter()
            .filter(|t| t.role == ThresholdRole::Escalation)
            .map(|t| t.name)
            .collect()
    }

    pub fn threshold_set(&self) -> ThresholdSet {
        let mut set = ThresholdSet::new();
        for t in self.thresholds {
            set.insert(t.name, ThresholdSpec::new(t.base));
        }
        set
    }

    pub fn hierarchy_map(&self) -> BTreeMap<String, HierarchyLevel> {
        self.layers
            .iter()
            .zip(self.hierarchy)
            .map(|(name, level)| (name.to_string(), *level))
            .collect()
    }

    pub fn interaction_rules(&self) -> Vec<InteractionRule> {
        self.rules.iter().map(RuleDef::to_rule).collect()
    }
}

const UNIFORM_4: &[f64] = &[0.25, 0.25, 0.25, 0.25];
const LADDER: &[HierarchyLevel] = &[Micro, Meso, Macro, Meta];

/// Every built-in preset.
pub static PRESETS: &[Preset] = &[
    Preset {
        name: "healthcare_phenotype_genotype",
        domain: "healthcare",
        mode: Friction,
        description: "Phenotype/genotype mismatch under environmental and psychosocial load",
        layers: &["phenotypic", "genomic", "environmental", "psychosocial"],
        weights: &[0.40, 0.20, 0.25, 0.15],
        thresholds: &[detection("buffering", 0.4)],
        hierarchy: &[Micro, Micro, Meso, Meso],
        rules: &[],
    },
    Preset {
        name: "healthcare_precision_therapeutic",
        domain: "healthcare",
        mode: Emergence,
        description: "Window where genomic, environmental, phenotypic and engagement factors align",
        layers: &["genomic", "environmental", "phenotypic", "psychosocial"],
        weights: UNIFORM_4,
        thresholds: &[detection("alignment", 0.65), optimal_tier("optimal", 0.80)],
        hierarchy: &[Micro, Meso, Micro, Meso],
        rules: &[],
    },
    Preset {
        name: "finance_regime_conflict",
        domain: "finance",
        mode: Friction,
        description: "Technical, macro, flow and risk signals disagreeing about the market regime",
        layers: &["technical", "macro", "flow", "risk"],
        weights: &[0.35, 0.30, 0.20, 0.15],
        thresholds: &[detection("conflict", 0.4)],
        hierarchy: &[Micro, Macro, Meso, Meso],
        rules: &[],
    },
    Preset {
        name: "finance_confluence_alpha",
        domain: "finance",
        mode: Emergence,
        description: "Confluence of technical setup, macro tailwind, flow and risk compression",
        layers: &["technical", "macro", "flow", "risk"],
        weights: &[0.30, 0.30, 0.20, 0.20],
        thresholds: &[detection("alignment", 0.60)],
        hierarchy: &[Micro, Macro, Meso, Meso],
        rules: &[
            RuleDef {
                target: "technical",
                driver: "flow",
                relative_to: None,
                base: 0.9,
                gain: 0.2,
                cap: 1.0,
            },
            RuleDef {
                target: "flow",
                driver: "flow",
                relative_to: None,
                base: 0.9,
                gain: 0.3,
                cap: 1.0,
            },
        ],
    },
    Preset {
        name: "cyber_attribution_resolver",
        domain: "cyber",
        mode: Friction,
        description: "Attribution gap across evidence, threat intel, impact and geopolitics",
        layers: &["technical", "threat_intel", "operational_impact", "geopolitical"],
        weights: &[0.30, 0.25, 0.25, 0.20],
        thresholds: &[detection("attribution_gap", 0.35)],
        hierarchy: &[Micro, Meso, Meso, Macro],
        rules: &[],
    },
    Preset {
        name: "cyber_adversary_overreach",
        domain: "cyber",
        mode: Emergence,
        description: "Adversary stretched thin while defenders harden",
        layers: &[
            "threat_stretch",
            "geopolitical_pressure",
            "operational_hardening",
            "tool_reuse_fatigue",
        ],
        weights: &[0.30, 0.20, 0.30, 0.20],
        thresholds: &[detection("overreach", 0.70)],
        hierarchy: &[Meso, Macro, Meso, Micro],
        rules: &[],
    },
    Preset {
        name: "climate_maladaptation",
        domain: "climate",
        mode: Friction,
        description: "Interventions that help one layer while harming another",
        layers: &["atmospheric", "ecological", "infrastructure", "policy"],
        weights: &[0.25, 0.30, 0.25, 0.20],
        thresholds: &[detection("caution", 0.4), escalation("block", 0.6)],
        hierarchy: LADDER,
        rules: &[],
    },
    Preset {
        name: "climate_resilience_multiplier",
        domain: "climate",
        mode: Emergence,
        description: "Interventions whose benefits reinforce across every layer",
        layers: &["atmospheric", "ecological", "infrastructure", "policy"],
        weights: UNIFORM_4,
        thresholds: &[detection("min_layer", 0.50), optimal_tier("multiplier", 0.70)],
        hierarchy: LADDER,
        rules: &[],
    },
    Preset {
        name: "legal_precedent_drift",
        domain: "legal",
        mode: Friction,
        description: "Statute, precedent, practice and politics pulling doctrine apart",
        layers: &["black_letter", "precedent", "operational", "socio_political"],
        weights: &[0.30, 0.35, 0.20, 0.15],
        thresholds: &[detection("drift", 0.4)],
        hierarchy: LADDER,
        rules: &[],
    },
    Preset {
        name: "legal_precedent_seeding",
        domain: "legal",
        mode: Emergence,
        description: "Ripeness of a jurisdiction for new precedent",
        layers: &[
            "socio_political",
            "institutional_capacity",
            "statutory_ambiguity",
            "circuit_split",
        ],
        weights: &[0.30, 0.20, 0.30, 0.20],
        thresholds: &[detection("ripeness", 0.60)],
        hierarchy: &[Meta, Macro, Meso, Meso],
        rules: &[],
    },
    Preset {
        name: "military_friction_forecast",
        domain: "military",
        mode: Friction,
        description: "Where maneuver, intelligence, sustainment and authorization diverge",
        layers: &["maneuver", "intelligence", "sustainment", "political"],
        weights: &[0.30, 0.25, 0.25, 0.20],
        thresholds: &[detection("bottleneck", 0.4), escalation("risk_high", 0.6)],
        hierarchy: LADDER,
        rules: &[],
    },
    Preset {
        name: "military_strategic_initiative",
        domain: "military",
        mode: Emergence,
        description: "Window to seize the initiative",
        layers: &[
            "enemy_ambiguity",
            "positional_advantage",
            "logistic_readiness",
            "authorization_clarity",
        ],
        weights: UNIFORM_4,
        thresholds: &[detection("initiative", 0.70)],
        hierarchy: &[Meso, Micro, Macro, Meta],
        rules: &[],
    },
    Preset {
        name: "social_narrative_rupture",
        domain: "social",
        mode: Friction,
        description: "Individual, network, institutional and cultural narratives splitting",
        layers: &["individual", "network", "institutional", "cultural"],
        weights: &[0.25, 0.30, 0.25, 0.20],
        thresholds: &[detection("rupture", 0.5), escalation("rapid_propagation", 0.7)],
        hierarchy: LADDER,
        rules: &[],
    },
    Preset {
        name: "social_catalytic_alignment",
        domain: "social",
        mode: Emergence,
        description: "Readiness, bridges, policy window and paradigm momentum aligning",
        layers: &[
            "individual_readiness",
            "network_bridges",
            "policy_window",
            "paradigm_momentum",
        ],
        weights: &[0.20, 0.30, 0.30, 0.20],
        thresholds: &[detection("catalyst", 0.65), optimal_tier("transformative", 0.80)],
        hierarchy: LADDER,
        rules: &[RuleDef {
            target: "network_bridges",
            driver: "network_bridges",
            relative_to: None,
            base: 0.9,
            gain: 0.1,
            cap: 1.0,
        }],
    },
    Preset {
        name: "plan_alignment_window",
        domain: "planning",
        mode: Emergence,
        description: "Plan readiness across actions, coordination, constraints and adaptation",
        layers: &["immediate_actions", "coordination", "constraints", "adaptation"],
        weights: UNIFORM_4,
        thresholds: &[detection("readiness", 0.60), optimal_tier("optimal", 0.80)],
        hierarchy: LADDER,
        rules: &[],
    },
    Preset {
        name: "codebase_layer_conflict",
        domain: "codebase",
        mode: Friction,
        description: "Architecture, implementation, tests and docs telling different stories",
        layers: &["architecture", "implementation", "testing", "documentation"],
        weights: &[0.30, 0.25, 0.25, 0.20],
        thresholds: &[detection("conflict", 0.35)],
        hierarchy: &[Macro, Micro, Meso, Meta],
        rules: &[],
    },
    Preset {
        name: "codebase_alignment_window",
        domain: "codebase",
        mode: Emergence,
        description: "Codebase layers aligned enough for a safe change",
        layers: &["architecture", "implementation", "testing", "documentation"],
        weights: UNIFORM_4,
        thresholds: &[detection("alignment", 0.65), optimal_tier("optimal", 0.80)],
        hierarchy: &[Macro, Micro, Meso, Meta],
        rules: &[],
    },
    Preset {
        name: "system_lock_recursive_control",
        domain: "system_lock",
        mode: Friction,
        description: "Concentrated control outpacing agent autonomy and reinforcing itself",
        layers: &[
            "agent_autonomy",
            "collective_capacity",
            "concentration_control",
            "recursive_depth",
        ],
        weights: &[0.30, 0.25, 0.25, 0.20],
        thresholds: &[
            detection("asymmetry_warning", 0.40),
            escalation("lock_active", 0.52),
            escalation("lock_irreversible", 0.72),
        ],
        hierarchy: LADDER,
        rules: &[RuleDef {
            target: "recursive_depth",
            driver: "concentration_control",
            relative_to: Some("agent_autonomy"),
            base: 1.0,
            gain: 1.0,
            cap: 1.5,
        }],
    },
    Preset {
        name: "system_lock_dissolution_window",
        domain: "system_lock",
        mode: Emergence,
        description: "A locked system becoming dissolvable",
        layers: &[
            "autonomy_momentum",
            "alternative_readiness",
            "control_vulnerability",
            "pattern_flexibility",
        ],
        weights: &[0.20, 0.30, 0.30, 0.20],
        thresholds: &[
            detection("dissolution_forming", 0.50),
            optimal_tier("dissolution_window", 0.70),
        ],
        hierarchy: LADDER,
        rules: &[RuleDef {
            target: "alternative_readiness",
            driver: "control_vulnerability",
            relative_to: None,
            base: 1.0,
            gain: 0.3,
            cap: 1.5,
        }],
    },
];

pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use mantic_governance::GovernanceConfig;

    use super::*;
    use crate::config::DetectorConfig;

    #[test]
    fn presets_are_well_formed() {
        let config = DetectorConfig::default();
        let mut names = BTreeSet::new();

        for p in PRESETS {
            assert!(names.insert(p.name), "duplicate preset {}", p.name);
            assert!(
                (config.min_layers..=config.max_layers).contains(&p.layers.len()),
                "{}",
                p.name
            );
            assert_eq!(p.weights.len(), p.layers.len(), "{}", p.name);
            assert_eq!(p.hierarchy.len(), p.layers.len(), "{}", p.name);
            let sum: f64 = p.weights.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "{} weights sum to {sum}", p.name);
            assert_eq!(p.thresholds[0].role, ThresholdRole::Detection, "{}", p.name);
            let detection_base = p.thresholds[0].base;
            for t in &p.thresholds[1..] {
                assert_ne!(t.role, ThresholdRole::Detection, "{}.{}", p.name, t.name);
                assert!(t.base > detection_base, "{}.{}", p.name, t.name);
            }
            match p.mode {
                Emergence => assert!(p.escalations().is_empty(), "{}", p.name),
                Friction => assert!(p.optimal_tier().is_none(), "{}", p.name),
            }

            let layers: BTreeSet<_> = p.layers.iter().collect();
            assert_eq!(layers.len(), p.layers.len(), "{}", p.name);
            for rule in p.rules {
                assert!(layers.contains(&rule.target), "{}", p.name);
                assert!(layers.contains(&rule.driver), "{}", p.name);
                if let Some(other) = rule.relative_to {
                    assert!(layers.contains(&other), "{}", p.name);
                }
            }
        }
    }

    #[test]
    fn every_preset_domain_has_an_allowlist() {
        let governance = GovernanceConfig::default();
        for p in PRESETS {
            assert!(governance.allowlist(p.domain).is_some(), "{}", p.domain);
        }
    }

    #[test]
    fn lookup_and_accessors() {
        let p = find_preset("finance_confluence_alpha").unwrap();
        assert_eq!(p.detection_threshold(), ("alignment", 0.60));
        assert_eq!(p.threshold_set().bases().len(), 1);
        assert_eq!(p.optimal_tier(), None);
        assert_eq!(p.hierarchy_map()["macro"], HierarchyLevel::Macro);
        assert_eq!(p.interaction_rules().len(), 2);
        assert!(find_preset("astrology").is_none());
    }

    #[test]
    fn roles_pick_out_secondary_thresholds() {
        let p = find_preset("social_catalytic_alignment").unwrap();
        assert_eq!(p.optimal_tier(), Some("transformative"));

        let p = find_preset("system_lock_recursive_control").unwrap();
        assert_eq!(p.escalations(), vec!["lock_active", "lock_irreversible"]);
        assert_eq!(p.detection_threshold(), ("asymmetry_warning", 0.40));
    }

    #[test]
    fn relative_rules_convert() {
        let p = find_preset("system_lock_recursive_control").unwrap();
        let rule = &p.interaction_rules()[0];
        assert_eq!(rule.relative_to.as_deref(), Some("agent_autonomy"));
    }
}

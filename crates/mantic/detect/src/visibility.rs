//! Layer visibility: an explanatory grouping of per-layer contributions by
//! hierarchy level. Computed after the formula; never feeds back into it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Hierarchy level a layer belongs to, from granular to adaptive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HierarchyLevel {
    /// Granular signal, individual data points
    #[serde(alias = "micro")]
    Micro,
    /// Local coupling within the domain
    #[serde(alias = "meso")]
    Meso,
    /// Domain-wide structure and constraints
    #[serde(alias = "macro")]
    Macro,
    /// Long-term drift, learning, memory
    #[serde(alias = "meta")]
    Meta,
}

impl HierarchyLevel {
    pub const ALL: [HierarchyLevel; 4] = [
        HierarchyLevel::Micro,
        HierarchyLevel::Meso,
        HierarchyLevel::Macro,
        HierarchyLevel::Meta,
    ];
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HierarchyLevel::Micro => "Micro",
            HierarchyLevel::Meso => "Meso",
            HierarchyLevel::Macro => "Macro",
            HierarchyLevel::Meta => "Meta",
        };
        f.write_str(name)
    }
}

/// Contribution and weight totals per hierarchy level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerVisibility {
    /// Level with the highest total contribution
    pub dominant: HierarchyLevel,
    pub weights_by_layer: BTreeMap<HierarchyLevel, f64>,
    pub contributions_by_layer: BTreeMap<HierarchyLevel, f64>,
    /// Layers the hierarchy does not place
    pub unmapped: Vec<String>,
    pub rationale: String,
    pub input_driven: bool,
    #[serde(rename = "_note")]
    pub note: String,
}

/// Group per-layer weights and contributions by level.
///
/// `weights` and `contributions` are the formula's effective values, parallel
/// to `names`. Returns `None` for an empty hierarchy. Ties for dominant go to
/// the more granular level.
pub fn compute_visibility(
    names: &[String],
    weights: &[f64],
    contributions: &[f64],
    hierarchy: &BTreeMap<String, HierarchyLevel>,
    domain_label: &str,
) -> Option<LayerVisibility> {
    if hierarchy.is_empty() {
        return None;
    }

    let mut weights_by_layer: BTreeMap<HierarchyLevel, f64> =
        HierarchyLevel::ALL.iter().map(|l| (*l, 0.0)).collect();
    let mut contributions_by_layer = weights_by_layer.clone();
    let mut unmapped = Vec::new();

    for ((name, w), c) in names.iter().zip(weights).zip(contributions) {
        match hierarchy.get(name) {
            Some(level) => {
                *weights_by_layer.entry(*level).or_default() += w;
                *contributions_by_layer.entry(*level).or_default() += c;
            }
            None => unmapped.push(name.clone()),
        }
    }

    let mut dominant = HierarchyLevel::Micro;
    for level in HierarchyLevel::ALL {
        if contributions_by_layer[&level] > contributions_by_layer[&dominant] {
            dominant = level;
        }
    }

    Some(LayerVisibility {
        dominant,
        weights_by_layer,
        contributions_by_layer,
        unmapped,
        rationale: format!("{dominant} layer has highest contribution in {domain_label}"),
        input_driven: true,
        note: "Interpretive aid for reasoning; does not affect M-score calculation".into(),
    })
}

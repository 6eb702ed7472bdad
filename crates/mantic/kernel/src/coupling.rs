use serde::{Deserialize, Serialize};

use crate::layer_map::LayerMap;

/// Pairs whose agreement falls below this are reported as in tension.
pub const DEFAULT_TENSION_THRESHOLD: f64 = 0.5;

/// Agreement between two present layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairAgreement {
    pub a: String,
    pub b: String,
    /// 1 − |La − Lb|, in [0, 1]
    pub agreement: f64,
    pub in_tension: bool,
}

/// Per-layer view of the pairwise agreements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerCouplingDetail {
    /// Mean agreement with every other present layer; `None` if the layer is missing
    pub mean_agreement: Option<f64>,
    /// Layers this one is in tension with
    pub tension_with: Vec<String>,
}

/// Layer coupling diagnostic. Purely descriptive; never feeds the score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerCoupling {
    /// Mean pairwise agreement in [0, 1]
    pub coherence: f64,
    pub pairs: Vec<PairAgreement>,
    pub tension_count: usize,
    /// Keyed in the order the layers were given
    pub layers: LayerMap<LayerCouplingDetail>,
}

/// Compute pairwise agreement across present layers.
///
/// `names` and `values` are parallel; values are expected already clamped to
/// [0, 1]. With fewer than two present layers coherence is 1.0 and there are
/// no pairs.
pub fn analyze_coupling(
    names: &[String],
    values: &[Option<f64>],
    tension_threshold: f64,
) -> LayerCoupling {
    let present: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|v| !v.is_nan()).map(|v| (i, v)))
        .collect();

    let mut pairs = Vec::new();
    let mut sums = vec![0.0; names.len()];
    let mut counts = vec![0usize; names.len()];
    let mut tensions: Vec<Vec<String>> = vec![Vec::new(); names.len()];

    for (x, &(i, li)) in present.iter().enumerate() {
        for &(j, lj) in &present[x + 1..] {
            let agreement = (1.0 - (li - lj).abs()).clamp(0.0, 1.0);
            let in_tension = agreement < tension_threshold;

            sums[i] += agreement;
            sums[j] += agreement;
            counts[i] += 1;
            counts[j] += 1;
            if in_tension {
                tensions[i].push(names[j].clone());
                tensions[j].push(names[i].clone());
            }

            pairs.push(PairAgreement {
                a: names[i].clone(),
                b: names[j].clone(),
                agreement,
                in_tension,
            });
        }
    }

    let coherence = if pairs.is_empty() {
        1.0
    } else {
        pairs.iter().map(|p| p.agreement).sum::<f64>() / pairs.len() as f64
    };
    let tension_count = pairs.iter().filter(|p| p.in_tension).count();

    let layers = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mean_agreement = match (values[i].filter(|v| !v.is_nan()), counts[i]) {
                (None, _) => None,
                (Some(_), 0) => Some(1.0),
                (Some(_), n) => Some(sums[i] / n as f64),
            };
            (
                name.clone(),
                LayerCouplingDetail {
                    mean_agreement,
                    tension_with: std::mem::take(&mut tensions[i]),
                },
            )
        })
        .collect();

    LayerCoupling {
        coherence,
        pairs,
        tension_count,
        layers,
    }
}

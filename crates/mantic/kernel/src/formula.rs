use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::KernelError;

/// Formula revision marker. Bumped only if the scoring formula itself changes.
pub const KERNEL_VERSION: &str = "1.0.0";

/// Tolerance on the weight sum at formula entry.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Below this spatial component, attribution is reported as all zeros.
pub const ATTRIBUTION_EPSILON: f64 = 1e-10;

/// Lowest interaction coefficient the kernel accepts.
pub const INTERACTION_MIN: f64 = 0.1;

/// Highest interaction coefficient the kernel accepts.
pub const INTERACTION_MAX: f64 = 2.0;

/// Output of one formula evaluation.
///
/// All vectors keep the caller's length and order; entries for missing
/// layers are zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KernelOutput {
    /// Final score M = S · f_time / k_n
    pub m_score: f64,
    /// Spatial component S = Σ Wi·Li·Ii
    pub spatial: f64,
    /// Share of S contributed by each layer
    pub attribution: Vec<f64>,
    /// Weights actually used (renormalized over present layers)
    pub effective_weights: Vec<f64>,
    /// Per-layer terms Wi·Li·Ii
    pub contributions: Vec<f64>,
}

fn is_present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// The immutable core formula: `M = (Σ W·L·I) · f_time / k_n`.
///
/// Missing layer values (`None` or NaN) are excluded and the weights are
/// renormalized over the layers that remain. The caller guarantees
/// `k_n > 0`; use [`evaluate_checked`] when that is not already known.
pub fn evaluate(
    weights: &[f64],
    layers: &[Option<f64>],
    interactions: &[f64],
    f_time: f64,
    k_n: f64,
) -> Result<KernelOutput, KernelError> {
    if weights.len() != layers.len() || layers.len() != interactions.len() {
        return Err(KernelError::LengthMismatch {
            weights: weights.len(),
            layers: layers.len(),
            interactions: interactions.len(),
        });
    }

    let present: Vec<Option<f64>> = layers.iter().copied().map(is_present).collect();
    if present.iter().all(Option::is_none) {
        return Err(KernelError::AllLayersMissing);
    }

    let effective_weights: Vec<f64> = if present.iter().all(Option::is_some) {
        weights.to_vec()
    } else {
        let surviving: f64 = weights
            .iter()
            .zip(&present)
            .filter(|(_, l)| l.is_some())
            .map(|(w, _)| *w)
            .sum();
        if surviving <= 0.0 || !surviving.is_finite() {
            return Err(KernelError::WeightSum { sum: surviving });
        }
        weights
            .iter()
            .zip(&present)
            .map(|(w, l)| if l.is_some() { w / surviving } else { 0.0 })
            .collect()
    };

    let weight_sum: f64 = effective_weights.iter().sum();
    if weight_sum.is_nan() || (weight_sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(KernelError::WeightSum { sum: weight_sum });
    }

    for (index, w) in effective_weights.iter().enumerate() {
        check_range("W", index, *w, 0.0, 1.0)?;
    }
    for (index, l) in present.iter().enumerate() {
        if let Some(l) = l {
            check_range("L", index, *l, 0.0, 1.0)?;
        }
    }
    for (index, i) in interactions.iter().enumerate() {
        check_range("I", index, *i, INTERACTION_MIN, INTERACTION_MAX)?;
    }

    let contributions: Vec<f64> = effective_weights
        .iter()
        .zip(&present)
        .zip(interactions)
        .map(|((w, l), i)| l.map_or(0.0, |l| w * l * i))
        .collect();

    let spatial: f64 = contributions.iter().sum();
    let m_score = spatial * f_time / k_n;

    let attribution = if spatial > ATTRIBUTION_EPSILON {
        contributions.iter().map(|c| c / spatial).collect()
    } else {
        vec![0.0; contributions.len()]
    };

    trace!(spatial, m_score, f_time, k_n, "Kernel evaluated");

    Ok(KernelOutput {
        m_score,
        spatial,
        attribution,
        effective_weights,
        contributions,
    })
}

/// [`evaluate`] behind a guard on the normalization constant.
pub fn evaluate_checked(
    weights: &[f64],
    layers: &[Option<f64>],
    interactions: &[f64],
    f_time: f64,
    k_n: f64,
) -> Result<KernelOutput, KernelError> {
    if !k_n.is_finite() || k_n <= 0.0 {
        return Err(KernelError::NonPositiveNormalization(k_n));
    }
    evaluate(weights, layers, interactions, f_time, k_n)
}

fn check_range(
    vector: &'static str,
    index: usize,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), KernelError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(KernelError::OutOfRange {
            vector,
            index,
            value,
            min,
            max,
        })
    }
}

/// Re-run the reference case and confirm the formula is intact.
pub fn verify_integrity() -> bool {
    let weights = [0.25; 4];
    let layers = [Some(0.5); 4];
    let interactions = [1.0; 4];

    match evaluate(&weights, &layers, &interactions, 1.0, 1.0) {
        Ok(out) => {
            (out.m_score - 0.5).abs() < 1e-10
                && (out.spatial - 0.5).abs() < 1e-10
                && out.attribution.len() == 4
                && out.attribution.iter().all(|a| (a - 0.25).abs() < 1e-10)
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: usize) -> Vec<f64> {
        vec![1.0 / n as f64; n]
    }

    #[test]
    fn reference_case() {
        let out = evaluate(&[0.25; 4], &[Some(0.5); 4], &[1.0; 4], 1.0, 1.0).unwrap();
        assert!((out.m_score - 0.5).abs() < 1e-12);
        assert!((out.spatial - 0.5).abs() < 1e-12);
        assert_eq!(out.attribution, vec![0.25; 4]);
        assert!(verify_integrity());
    }

    #[test]
    fn f_time_and_k_n_scale_m_only() {
        let out = evaluate(&[0.25; 4], &[Some(0.5); 4], &[1.0; 4], 2.0, 4.0).unwrap();
        assert!((out.spatial - 0.5).abs() < 1e-12);
        assert!((out.m_score - 0.25).abs() < 1e-12);
    }

    #[test]
    fn all_zero_layers_give_zero_attribution() {
        let out = evaluate(&[0.25; 4], &[Some(0.0); 4], &[1.0; 4], 1.0, 1.0).unwrap();
        assert_eq!(out.m_score, 0.0);
        assert_eq!(out.spatial, 0.0);
        assert_eq!(out.attribution, vec![0.0; 4]);
    }

    #[test]
    fn missing_layers_renormalize_weights() {
        let layers = [Some(0.5), None, Some(f64::NAN), None];
        let out = evaluate(&[0.25; 4], &layers, &[1.0; 4], 1.0, 1.0).unwrap();

        assert_eq!(out.effective_weights, vec![1.0, 0.0, 0.0, 0.0]);
        assert!((out.spatial - 0.5).abs() < 1e-12);
        assert!((out.attribution[0] - 1.0).abs() < 1e-12);
        assert!(out.attribution[1..].iter().all(|a| *a == 0.0));
    }

    #[test]
    fn all_missing_is_domain_error() {
        let err = evaluate(&[0.25; 4], &[None; 4], &[1.0; 4], 1.0, 1.0).unwrap_err();
        assert_eq!(err, KernelError::AllLayersMissing);
    }

    #[test]
    fn surviving_weights_all_zero_rejected() {
        let err = evaluate(
            &[0.5, 0.5, 0.0],
            &[None, None, Some(0.4)],
            &[1.0; 3],
            1.0,
            1.0,
        )
        .unwrap_err();
        assert!(matches!(err, KernelError::WeightSum { .. }));
    }

    #[test]
    fn length_mismatch_rejected() {
        let err = evaluate(&[0.5, 0.5], &[Some(0.5); 3], &[1.0; 3], 1.0, 1.0).unwrap_err();
        assert!(matches!(err, KernelError::LengthMismatch { weights: 2, .. }));
    }

    #[test]
    fn weight_sum_outside_tolerance_rejected() {
        let err = evaluate(&[0.1; 4], &[Some(0.5); 4], &[1.0; 4], 1.0, 1.0).unwrap_err();
        assert!(matches!(err, KernelError::WeightSum { .. }));
    }

    #[test]
    fn layer_out_of_range_rejected() {
        let layers = [Some(1.5), Some(0.5), Some(0.5), Some(0.5)];
        let err = evaluate(&[0.25; 4], &layers, &[1.0; 4], 1.0, 1.0).unwrap_err();
        assert!(matches!(err, KernelError::OutOfRange { vector: "L", index: 0, .. }));
    }

    #[test]
    fn interaction_bounds_enforced() {
        let err = evaluate(&[0.25; 4], &[Some(0.5); 4], &[2.5, 1.0, 1.0, 1.0], 1.0, 1.0)
            .unwrap_err();
        assert!(matches!(err, KernelError::OutOfRange { vector: "I", .. }));

        // Amplification inside the bounds is legal
        let out = evaluate(&[0.25; 4], &[Some(0.5); 4], &[1.2, 1.0, 1.0, 1.0], 1.0, 1.0).unwrap();
        assert!(out.spatial > 0.5);
    }

    #[test]
    fn zero_weight_layer_contributes_nothing() {
        let layers = [Some(0.8), Some(0.6), Some(1.0), Some(1.0)];
        let out = evaluate(&[0.5, 0.5, 0.0, 0.0], &layers, &[1.0; 4], 1.0, 1.0).unwrap();
        assert_eq!(out.attribution[2], 0.0);
        assert_eq!(out.attribution[3], 0.0);
        assert!(out.attribution[0] > 0.0 && out.attribution[1] > 0.0);
    }

    #[test]
    fn checked_wrapper_rejects_bad_k_n() {
        for k_n in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = evaluate_checked(&uniform(3), &[Some(0.5); 3], &[1.0; 3], 1.0, k_n)
                .unwrap_err();
            assert!(matches!(err, KernelError::NonPositiveNormalization(_)));
        }
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let weights = [0.30, 0.25, 0.25, 0.20];
        let layers = [Some(0.73), Some(0.41), Some(0.88), Some(0.55)];
        let interactions = [0.9, 1.0, 0.8, 0.7];
        let reference = evaluate(&weights, &layers, &interactions, 1.5, 1.0).unwrap();
        for _ in 0..100 {
            assert_eq!(
                evaluate(&weights, &layers, &interactions, 1.5, 1.0).unwrap(),
                reference
            );
        }
    }

    #[test]
    fn m_nondecreasing_in_single_layer() {
        let mut last = f64::NEG_INFINITY;
        for v in [0.0, 0.1, 0.3, 0.5, 0.7, 0.9, 1.0] {
            let layers = [Some(v), Some(0.5), Some(0.5), Some(0.5)];
            let out = evaluate(&[0.25; 4], &layers, &[1.0; 4], 1.0, 1.0).unwrap();
            assert!(out.m_score >= last - 1e-12);
            last = out.m_score;
        }
    }
}

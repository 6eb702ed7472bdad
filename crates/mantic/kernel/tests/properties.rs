//! Property tests: formula closure and temporal positivity.

use mantic_kernel::*;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Normalized weights, layer values and interactions of a shared length 3..=6.
fn arb_inputs() -> impl Strategy<Value = (Vec<f64>, Vec<Option<f64>>, Vec<f64>)> {
    (3usize..=6).prop_flat_map(|n| {
        (
            prop::collection::vec(0.01f64..1.0, n),
            prop::collection::vec(prop::option::weighted(0.85, 0.0f64..=1.0), n),
            prop::collection::vec(INTERACTION_MIN..=INTERACTION_MAX, n),
        )
            .prop_map(|(raw, layers, interactions)| {
                let total: f64 = raw.iter().sum();
                let weights = raw.iter().map(|w| w / total).collect();
                (weights, layers, interactions)
            })
    })
}

fn arb_kernel() -> impl Strategy<Value = TemporalKernel> {
    prop::sample::select(TemporalKernel::ALL.to_vec())
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Attribution sums to 1 whenever S is meaningfully positive, else is all zero.
    #[test]
    fn attribution_closes((weights, layers, interactions) in arb_inputs()) {
        prop_assume!(layers.iter().any(Option::is_some));
        let out = evaluate(&weights, &layers, &interactions, 1.0, 1.0).unwrap();

        let effective: f64 = out.effective_weights.iter().sum();
        prop_assert!((effective - 1.0).abs() <= WEIGHT_TOLERANCE);

        let total: f64 = out.attribution.iter().sum();
        if out.spatial > ATTRIBUTION_EPSILON {
            prop_assert!((total - 1.0).abs() <= 1e-9, "attribution sum {}", total);
        } else {
            prop_assert!(out.attribution.iter().all(|a| *a == 0.0));
        }
        prop_assert_eq!(out.attribution.len(), layers.len());
    }

    /// The temporal multiplier is strictly positive and finite everywhere in range.
    #[test]
    fn temporal_output_positive(
        kernel in arb_kernel(),
        t in -1000.0f64..=1000.0,
        alpha in 0.0f64..=1.0,
        n in -5.0f64..=5.0,
        t0 in -10.0f64..=10.0,
        frequency in 0.0f64..=10.0,
        memory_strength in 0.0f64..=2.0,
    ) {
        let params = TemporalParams { t, alpha, n, t0, exponent: 1.0, frequency, memory_strength };
        let v = temporal_multiplier(kernel, &params);
        prop_assert!(v > 0.0, "{} at t={} gave {}", kernel, t, v);
        prop_assert!(v.is_finite());
    }

    /// f_time scales M linearly and leaves S untouched.
    #[test]
    fn f_time_only_scales_m(
        (weights, layers, interactions) in arb_inputs(),
        f_time in 0.1f64..=3.0,
    ) {
        prop_assume!(layers.iter().any(Option::is_some));
        let base = evaluate(&weights, &layers, &interactions, 1.0, 1.0).unwrap();
        let scaled = evaluate(&weights, &layers, &interactions, f_time, 1.0).unwrap();
        prop_assert_eq!(base.spatial, scaled.spatial);
        prop_assert!((scaled.m_score - base.m_score * f_time).abs() < 1e-12);
    }
}

//! # mantic-kernel
//!
//! The leaf mathematics of Mantic detection.
//!
//! - **Formula**: the immutable score `M = (Σ W·L·I) · f_time / k_n` with
//!   graceful degradation over missing layers and per-layer attribution.
//! - **Temporal**: seven temporal kernels producing a strictly positive
//!   multiplier `f(t)`.
//! - **Coupling**: pairwise layer agreement, a diagnostic that never feeds
//!   back into the score.
//!
//! Everything here is pure: no I/O, no shared state, no allocation beyond the
//! returned values. Callers are expected to have bounded their inputs (see
//! `mantic-governance`); this crate only checks that they did.

pub mod coupling;
pub mod error;
pub mod formula;
pub mod layer_map;
pub mod temporal;

pub use coupling::{
    analyze_coupling, LayerCoupling, LayerCouplingDetail, PairAgreement,
    DEFAULT_TENSION_THRESHOLD,
};
pub use error::KernelError;
pub use formula::{
    evaluate, evaluate_checked, verify_integrity, KernelOutput, ATTRIBUTION_EPSILON,
    INTERACTION_MAX, INTERACTION_MIN, KERNEL_VERSION, WEIGHT_TOLERANCE,
};
pub use layer_map::LayerMap;
pub use temporal::{temporal_multiplier, TemporalKernel, TemporalParams, TEMPORAL_FLOOR};

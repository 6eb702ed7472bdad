//! # mantic-governance
//!
//! Bounded overrides for Mantic detection. A caller may ask to move a
//! threshold, swap the temporal kernel, or reshape interaction coefficients;
//! the governor honors each request only inside a pre-registered safe range
//! and records every deviation.
//!
//! Nothing here fails because an override was out of range. Clamps and
//! rejections are written to [`OverridesAudit`], which is attached to every
//! detection result whether or not overrides were supplied.

pub mod config;
pub mod error;
pub mod f_time;
pub mod governor;
pub mod interaction;
pub mod temporal;
pub mod thresholds;

pub use config::{
    default_kernel_allowlists, Bounds, GovernanceConfig, TemporalBounds, ThresholdPolicy,
    GENERIC_DOMAIN,
};
pub use error::GovernanceError;
pub use f_time::{clamp_f_time, FTimeAudit, FTimeSource, NEUTRAL_F_TIME};
pub use governor::{GovernedParameters, OverrideGovernor, OverrideRequest, OverridesAudit};
pub use interaction::{
    dynamic_interactions, InteractionAudit, InteractionMode, InteractionOverride,
    InteractionResolver, InteractionRule, OverrideMode,
};
pub use temporal::{
    govern_temporal, Clamp, Rejection, TemporalAudit, TemporalConfig, TemporalStatus,
};
pub use thresholds::{
    bound_threshold, govern_thresholds, ThresholdAudit, ThresholdDecision, ThresholdSet,
    ThresholdSpec,
};

use thiserror::Error;

/// Errors from the governance layer.
///
/// Clamps and rejections of caller overrides are not errors; they land in the
/// audit trail. Only shape failures and broken configuration surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GovernanceError {
    #[error("interaction_override list length ({got}) must match layer count ({expected})")]
    InteractionLength { expected: usize, got: usize },

    #[error("invalid governance config: {0}")]
    InvalidConfig(String),
}

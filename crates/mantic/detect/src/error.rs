use mantic_governance::GovernanceError;
use mantic_kernel::KernelError;
use thiserror::Error;

/// Errors from detection.
///
/// Clamped or rejected overrides are not errors; they are reported in the
/// result's audit. These variants mean no result was produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    /// Malformed domain registration
    #[error("registration error in {field}: {reason}")]
    Registration { field: String, reason: String },

    /// A numeric input that cannot be used
    #[error("range error in {field}: {reason}")]
    Range { field: String, reason: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    /// Upstream normalization failed to hold at formula entry
    #[error("formula invariant violated: {0}")]
    FormulaInvariant(String),
}

impl DetectError {
    pub fn registration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Registration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn range(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Range {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<KernelError> for DetectError {
    fn from(err: KernelError) -> Self {
        match &err {
            KernelError::WeightSum { .. } => Self::FormulaInvariant(err.to_string()),
            KernelError::LengthMismatch { .. } => {
                Self::registration("layer_values", err.to_string())
            }
            KernelError::UnknownKernel(_) => Self::Configuration(err.to_string()),
            KernelError::AllLayersMissing => Self::range("layer_values", err.to_string()),
            KernelError::OutOfRange { vector, .. } => Self::range(*vector, err.to_string()),
            KernelError::NonPositiveNormalization(_) => Self::range("k_n", err.to_string()),
        }
    }
}

impl From<GovernanceError> for DetectError {
    fn from(err: GovernanceError) -> Self {
        match &err {
            GovernanceError::InteractionLength { .. } => {
                Self::registration("interaction_override", err.to_string())
            }
            GovernanceError::InvalidConfig(_) => Self::Configuration(err.to_string()),
        }
    }
}

/// Result type for detection operations.
pub type DetectResult<T> = Result<T, DetectError>;

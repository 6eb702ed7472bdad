use thiserror::Error;

/// Errors from the Mantic kernel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    #[error("array length mismatch: W={weights}, L={layers}, I={interactions}")]
    LengthMismatch {
        weights: usize,
        layers: usize,
        interactions: usize,
    },

    #[error("all layer values are missing - cannot compute mantic score")]
    AllLayersMissing,

    #[error("weights must sum to 1.0, got {sum}")]
    WeightSum { sum: f64 },

    #[error("{vector}[{index}] = {value} outside [{min}, {max}]")]
    OutOfRange {
        vector: &'static str,
        index: usize,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("normalization constant k_n must be positive, got {0}")]
    NonPositiveNormalization(f64),

    #[error("unknown kernel type: {0}")]
    UnknownKernel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_sum_display() {
        let err = KernelError::WeightSum { sum: 0.4 };
        assert!(err.to_string().contains("sum to 1.0"));
        assert!(err.to_string().contains("0.4"));
    }

    #[test]
    fn out_of_range_names_vector_and_index() {
        let err = KernelError::OutOfRange {
            vector: "L",
            index: 2,
            value: 1.5,
            min: 0.0,
            max: 1.0,
        };
        assert_eq!(err.to_string(), "L[2] = 1.5 outside [0, 1]");
    }
}

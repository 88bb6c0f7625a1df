use thiserror::Error;

/// Violated precondition of model construction, snapshot loading or a forward pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResonanceError {
    #[error("d_model ({d_model}) must be divisible by n_heads ({n_heads})")]
    HeadsNotDivisible { d_model: usize, n_heads: usize },

    #[error("invalid model config: {0}")]
    InvalidConfig(String),

    #[error("sequence length {seq_len} exceeds max_seq_len {max_len}")]
    SequenceTooLong { seq_len: usize, max_len: usize },

    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("shape mismatch for {name}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("{field} value {value} at (batch {batch}, step {step}) outside [0, {max}]")]
    IndexOutOfRange {
        field: &'static str,
        value: i64,
        max: usize,
        batch: usize,
        step: usize,
    },

    #[error("attention mask of shape {shape:?} is not broadcastable to {target:?}")]
    MaskNotBroadcastable {
        shape: Vec<usize>,
        target: [usize; 3],
    },

    #[error("non-finite value in {0}")]
    NonFinite(String),

    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("unexpected parameter: {0}")]
    UnexpectedParameter(String),

    #[error("parameter {name} carries {actual} values but shape {shape:?} requires {expected}")]
    ParameterLength {
        name: String,
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, ResonanceError>;

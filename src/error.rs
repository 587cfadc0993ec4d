use thiserror::Error;

#[derive(Debug, Error)]
pub enum BkwError {
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("category {category} out of range (step has {num_categories} categories)")]
    CategoryOutOfRange { category: usize, num_categories: usize },

    #[error("local category value {value} outside [0, {cardinality})")]
    LocalValueOutOfRange { value: i64, cardinality: usize },

    #[error("storage holds {available} categories, step needs {required}")]
    CapacityExceeded { required: usize, available: usize },

    #[error("failed to allocate {bytes} bytes of sample storage")]
    Allocation { bytes: usize },

    #[error("insufficient samples: got {got}, need at least {required}")]
    InsufficientSamples { got: usize, required: usize },

    #[error("thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, BkwError>;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SnbGraphError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("dangling reference: {0}")]
    DanglingReference(String),
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("no fixpoint after {iterations} iterations")]
    NonConvergence { iterations: usize },
    #[error("unknown dense index {index} in vertex index '{name}'")]
    UnknownDenseIndex { name: String, index: usize },
    #[error("no attribute rows loaded for vertex index '{0}'")]
    MissingAttributes(String),
    #[error("mask element {element} out of bounds for dimension {bound}")]
    MaskOutOfBounds { element: usize, bound: usize },
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(String),
}

impl SnbGraphError {
    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        SnbGraphError::Configuration(msg.into())
    }

    pub fn invalid_config<T: Into<String>>(msg: T) -> Self {
        SnbGraphError::InvalidConfig(msg.into())
    }

    pub fn dangling<T: Into<String>>(msg: T) -> Self {
        SnbGraphError::DanglingReference(msg.into())
    }

    pub fn dimension<T: Into<String>>(msg: T) -> Self {
        SnbGraphError::DimensionMismatch(msg.into())
    }

    pub fn out_of_bounds<T: Into<String>>(msg: T) -> Self {
        SnbGraphError::IndexOutOfBounds(msg.into())
    }
}

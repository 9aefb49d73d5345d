use thiserror::Error;

use crate::types::Dimension;

pub type DiversityResult<T> = Result<T, DiversityError>;

#[derive(Error, Debug)]
pub enum DiversityError {
    #[error("Catalog has no values for dimension {dimension}")]
    CatalogEmpty { dimension: Dimension },

    #[error("Content generation failed after {attempts} attempts: {source}")]
    GenerationFailed {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

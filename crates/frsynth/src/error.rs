//! Crate-level error type.

use crate::classifier::ExtractError;
use crate::config::ParamValidationError;
use crate::dataset::DatasetError;
use crate::emit::PredicateError;
use crate::model::ModelError;

/// Any failure of a full compilation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Params(#[from] ParamValidationError),

    #[error(transparent)]
    Predicate(#[from] PredicateError),

    #[error("failed to write program: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

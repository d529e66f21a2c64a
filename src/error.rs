//! Error types in linfa-imbalance
//!

use ndarray::ShapeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImbalanceError>;

#[derive(Error, Debug)]
pub enum ImbalanceError {
    #[error("invalid selection kind `{0}`, expected one of `all` or `mode`")]
    InvalidSelectionKind(String),
    #[error("threshold_cleaning is a value between 0 and 1, but is {0}")]
    InvalidThreshold(f32),
    #[error("number of neighbours must be at least 1, but is {0}")]
    InvalidNeighbors(usize),
    #[error("number of jobs must be at least 1, but is {0}")]
    InvalidJobs(usize),
    #[error("the target needs more than one class to be resampled")]
    SingleClass,
    #[error("class {0} is not present in the targets")]
    UnknownClass(String),
    #[error("records have {0} samples but targets have {1}")]
    MismatchedShapes(usize, usize),
    #[error("dataset has no samples or no features")]
    EmptyDataset,
    #[error("model was fitted with {expected} features, but records have {found}")]
    FeatureMismatch { expected: usize, found: usize },
    #[error("{requested} neighbours requested, but only {available} samples are available")]
    NotEnoughSamples { requested: usize, available: usize },
    #[error("could not build worker pool: {0}")]
    ThreadPool(String),
    #[error(transparent)]
    NnBuild(#[from] linfa_nn::BuildError),
    #[error(transparent)]
    NnQuery(#[from] linfa_nn::NnError),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
}

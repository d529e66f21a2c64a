//!
//! # Under-sampling for imbalanced datasets
//! `linfa-imbalance` provides pure Rust implementations of neighbourhood based cleaning
//! methods for imbalanced classification datasets.
//!
//! # The big picture
//!
//! `linfa-imbalance` is a crate in the [linfa](https://github.com/rust-ml/linfa) ecosystem,
//! an effort to create a toolkit for classical Machine Learning implemented in pure Rust, akin
//! to Python's scikit-learn.
//!
//! When one class vastly outnumbers another, classifiers tend to ignore the rare class.
//! Cleaning methods remove samples of the frequent classes which sit in regions dominated by
//! other classes, sharpening the boundary around the rare class without generating new data.
//!
//! # Current state
//!
//! `linfa-imbalance` currently provides
//!
//! * the [Neighbourhood Cleaning Rule](NeighbourhoodCleaningRule)
//! * [Edited Nearest Neighbours](EditedNearestNeighbours), which the former builds upon
//!
//! Nearest neighbour search is delegated to [`linfa-nn`](https://crates.io/crates/linfa-nn).
//!
//! ## Examples
//!
//! There is an usage example in the `demos/` directory. To run, use:
//!
//! ```bash
//! $ cargo run --example imbalanced_blobs
//! ```
//!

mod edited_nearest_neighbours;
pub mod error;
mod neighbors;
mod neighbourhood_cleaning_rule;
mod resampled;
mod selection;
mod strategy;

pub use edited_nearest_neighbours::*;
pub use error::{ImbalanceError, Result};
pub use neighbors::{FittedKNeighbors, KNeighbors, NeighborsParam};
pub use neighbourhood_cleaning_rule::*;
pub use resampled::Resampled;
pub use selection::{mode, SelectionKind};
pub use strategy::{ClassCounts, SamplingStrategy};

// Re-export the neighbour search algorithms, so a provider can be configured without
// depending on linfa-nn directly
pub use linfa_nn::CommonNearestNeighbour;

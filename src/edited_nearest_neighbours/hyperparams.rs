use linfa::ParamGuard;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::ImbalanceError;
use crate::neighbors::{KNeighbors, NeighborsParam};
use crate::selection::SelectionKind;
use crate::strategy::SamplingStrategy;

/// A verified hyper-parameter set ready for fitting
/// [Edited Nearest Neighbours](crate::EditedNearestNeighbours)
///
/// See [`EnnParams`] for more information.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug)]
pub struct EnnValidParams<L> {
    pub(crate) neighbors: NeighborsParam,
    pub(crate) kind_sel: SelectionKind,
    pub(crate) n_jobs: usize,
    pub(crate) return_indices: bool,
    pub(crate) random_state: Option<u64>,
    pub(crate) sampling_strategy: SamplingStrategy<L>,
}

impl<L> EnnValidParams<L> {
    pub fn neighbors(&self) -> &NeighborsParam {
        &self.neighbors
    }

    pub fn n_neighbors(&self) -> usize {
        self.neighbors.n_neighbors()
    }

    pub fn kind_sel(&self) -> SelectionKind {
        self.kind_sel
    }

    pub fn n_jobs(&self) -> usize {
        self.n_jobs
    }

    pub fn return_indices(&self) -> bool {
        self.return_indices
    }

    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }

    pub fn sampling_strategy(&self) -> &SamplingStrategy<L> {
        &self.sampling_strategy
    }
}

/// The set of hyperparameters that can be specified for cleaning a dataset with
/// [Edited Nearest Neighbours](crate::EditedNearestNeighbours).
///
/// ### Example
///
/// ```rust
/// use linfa::prelude::*;
/// use linfa_imbalance::{EditedNearestNeighbours, SelectionKind};
/// use ndarray::array;
///
/// let dataset = Dataset::new(
///     array![[0.0], [0.1], [0.2], [0.15], [5.0], [5.1], [5.2], [5.3]],
///     array![0usize, 0, 0, 1, 1, 1, 1, 1],
/// );
///
/// let enn = EditedNearestNeighbours::params()
///     .n_neighbors(2)
///     .kind_sel(SelectionKind::Mode)
///     .fit(&dataset)
///     .unwrap();
/// let cleaned = enn.sample(&dataset).unwrap();
/// // the class 1 sample sitting among class 0 is gone
/// assert_eq!(cleaned.dataset().nsamples(), 7);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug)]
pub struct EnnParams<L>(pub(crate) EnnValidParams<L>);

impl<L> Default for EnnParams<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> EnnParams<L> {
    pub fn new() -> Self {
        Self(EnnValidParams {
            neighbors: NeighborsParam::default(),
            kind_sel: SelectionKind::All,
            n_jobs: 1,
            return_indices: false,
            random_state: None,
            sampling_strategy: SamplingStrategy::Auto,
        })
    }

    /// Sets the size of the neighbourhood, not counting the sample itself.
    ///
    /// Defaults to `3`.
    pub fn n_neighbors(mut self, n_neighbors: usize) -> Self {
        self.0.neighbors = NeighborsParam::Count(n_neighbors);
        self
    }

    /// Uses a pre-configured neighbour search. Its `n_neighbors` is the neighbourhood size.
    pub fn neighbors(mut self, neighbors: KNeighbors) -> Self {
        self.0.neighbors = NeighborsParam::Provider(neighbors);
        self
    }

    pub(crate) fn neighbors_param(mut self, neighbors: NeighborsParam) -> Self {
        self.0.neighbors = neighbors;
        self
    }

    /// Sets how a neighbourhood decides whether a sample is kept.
    ///
    /// Defaults to [`SelectionKind::All`].
    pub fn kind_sel(mut self, kind_sel: SelectionKind) -> Self {
        self.0.kind_sel = kind_sel;
        self
    }

    /// Sets the number of threads used for neighbour queries.
    ///
    /// Defaults to `1`.
    pub fn n_jobs(mut self, n_jobs: usize) -> Self {
        self.0.n_jobs = n_jobs;
        self
    }

    /// Whether the positions of the retained samples are returned with the cleaned dataset.
    ///
    /// Defaults to `false`.
    pub fn return_indices(mut self, return_indices: bool) -> Self {
        self.0.return_indices = return_indices;
        self
    }

    /// Accepted for symmetry with randomized samplers. Edited Nearest Neighbours is
    /// deterministic and never reads it.
    pub fn random_state(mut self, random_state: Option<u64>) -> Self {
        self.0.random_state = random_state;
        self
    }

    /// Sets the classes which may lose samples.
    ///
    /// Defaults to [`SamplingStrategy::Auto`].
    pub fn sampling_strategy(mut self, sampling_strategy: SamplingStrategy<L>) -> Self {
        self.0.sampling_strategy = sampling_strategy;
        self
    }
}

impl<L> ParamGuard for EnnParams<L> {
    type Checked = EnnValidParams<L>;
    type Error = ImbalanceError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let n_neighbors = self.0.neighbors.n_neighbors();
        if n_neighbors == 0 {
            Err(ImbalanceError::InvalidNeighbors(n_neighbors))
        } else if self.0.n_jobs == 0 {
            Err(ImbalanceError::InvalidJobs(self.0.n_jobs))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

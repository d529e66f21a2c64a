use linfa::{Float, ParamGuard};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::edited_nearest_neighbours::EnnParams;
use crate::error::ImbalanceError;
use crate::neighbors::{KNeighbors, NeighborsParam};
use crate::selection::SelectionKind;
use crate::strategy::SamplingStrategy;

/// A verified hyper-parameter set ready for fitting the
/// [Neighbourhood Cleaning Rule](crate::NeighbourhoodCleaningRule)
///
/// See [`NcrParams`] for more information.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug)]
pub struct NcrValidParams<F, L> {
    pub(crate) neighbors: NeighborsParam,
    pub(crate) kind_sel: SelectionKind,
    pub(crate) threshold_cleaning: F,
    pub(crate) n_jobs: usize,
    pub(crate) return_indices: bool,
    pub(crate) random_state: Option<u64>,
    pub(crate) sampling_strategy: SamplingStrategy<L>,
}

impl<F: Float, L: Clone> NcrValidParams<F, L> {
    pub fn neighbors(&self) -> &NeighborsParam {
        &self.neighbors
    }

    pub fn n_neighbors(&self) -> usize {
        self.neighbors.n_neighbors()
    }

    pub fn kind_sel(&self) -> SelectionKind {
        self.kind_sel
    }

    pub fn threshold_cleaning(&self) -> F {
        self.threshold_cleaning
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

    /// The Edited Nearest Neighbours pass run before the neighbourhood cleaning. It always
    /// selects by mode, whatever `kind_sel` is set to here.
    pub(crate) fn edited_nearest_neighbours(&self) -> EnnParams<L> {
        EnnParams::new()
            .neighbors_param(self.neighbors.clone())
            .kind_sel(SelectionKind::Mode)
            .n_jobs(self.n_jobs)
            .return_indices(true)
            .random_state(self.random_state)
            .sampling_strategy(self.sampling_strategy.clone())
    }
}

/// The set of hyperparameters that can be specified for cleaning a dataset with the
/// [Neighbourhood Cleaning Rule](crate::NeighbourhoodCleaningRule).
///
/// ### Example
///
/// ```rust
/// use linfa::prelude::*;
/// use linfa_imbalance::{NeighbourhoodCleaningRule, SelectionKind};
/// use ndarray::array;
///
/// let dataset = Dataset::new(
///     array![[0.0], [0.1], [0.3], [0.25], [5.0], [5.1], [5.3], [5.6], [6.0], [6.5]],
///     array![0usize, 0, 0, 1, 1, 1, 1, 1, 1, 1],
/// );
///
/// let cleaned = NeighbourhoodCleaningRule::params()
///     .n_neighbors(2)
///     .kind_sel(SelectionKind::Mode)
///     .threshold_cleaning(0.5)
///     .fit_sample(&dataset)
///     .unwrap();
///
/// // the class 1 sample among class 0 is removed, class 0 is untouched
/// assert_eq!(cleaned.class_counts().get(&0), 3);
/// assert_eq!(cleaned.class_counts().get(&1), 6);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug)]
pub struct NcrParams<F, L>(pub(crate) NcrValidParams<F, L>);

impl<F: Float, L: Clone> Default for NcrParams<F, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, L: Clone> NcrParams<F, L> {
    pub fn new() -> Self {
        Self(NcrValidParams {
            neighbors: NeighborsParam::Count(3),
            kind_sel: SelectionKind::All,
            threshold_cleaning: F::cast(0.5),
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

    /// Uses a pre-configured neighbour search instead of a plain neighbourhood size. Its
    /// `n_neighbors` is the neighbourhood size.
    pub fn neighbors(mut self, neighbors: KNeighbors) -> Self {
        self.0.neighbors = NeighborsParam::Provider(neighbors);
        self
    }

    /// Sets how the neighbourhood of a minority sample is judged.
    ///
    /// Defaults to [`SelectionKind::All`].
    pub fn kind_sel(mut self, kind_sel: SelectionKind) -> Self {
        self.0.kind_sel = kind_sel;
        self
    }

    /// Sets the fraction of all samples a class has to exceed to be cleaned around the
    /// minority class.
    ///
    /// Defaults to `0.5`.
    ///
    /// `threshold_cleaning` must be between `0.0` and `1.0`.
    pub fn threshold_cleaning(mut self, threshold_cleaning: F) -> Self {
        self.0.threshold_cleaning = threshold_cleaning;
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

    /// Accepted for symmetry with randomized samplers and passed on to the Edited Nearest
    /// Neighbours pass. No step of the cleaning is random.
    pub fn random_state(mut self, random_state: Option<u64>) -> Self {
        self.0.random_state = random_state;
        self
    }

    /// Sets the classes which may lose samples.
    ///
    /// Defaults to [`SamplingStrategy::Auto`], every class except the minority.
    pub fn sampling_strategy(mut self, sampling_strategy: SamplingStrategy<L>) -> Self {
        self.0.sampling_strategy = sampling_strategy;
        self
    }
}

impl<F: Float, L> ParamGuard for NcrParams<F, L> {
    type Checked = NcrValidParams<F, L>;
    type Error = ImbalanceError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let n_neighbors = self.0.neighbors.n_neighbors();
        if !(F::zero()..=F::one()).contains(&self.0.threshold_cleaning) {
            Err(ImbalanceError::InvalidThreshold(
                self.0.threshold_cleaning.to_f32().unwrap_or(f32::NAN),
            ))
        } else if n_neighbors == 0 {
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

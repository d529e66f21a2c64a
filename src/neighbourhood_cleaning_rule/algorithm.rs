use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use linfa::dataset::AsSingleTargets;
use linfa::traits::Fit;
use linfa::{DatasetBase, Float, Label, ParamGuard};
use ndarray::{ArrayBase, Axis, Data, Ix2};
use tracing::{debug, info};

use super::hyperparams::{NcrParams, NcrValidParams};
use crate::error::{ImbalanceError, Result};
use crate::neighbors::KNeighbors;
use crate::resampled::{selected, Resampled};
use crate::strategy::{check_dataset, ClassCounts};

/// Samples flagged as noise by the two stages of the Neighbourhood Cleaning Rule
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleaningNoise {
    /// Removed by the Edited Nearest Neighbours pass
    pub edited: BTreeSet<usize>,
    /// Neighbours of misclassified minority samples, from classes large enough to be cleaned
    pub neighbourhood: BTreeSet<usize>,
}

impl CleaningNoise {
    /// Every noisy position, ascending
    pub fn union(&self) -> BTreeSet<usize> {
        self.edited.union(&self.neighbourhood).copied().collect()
    }
}

/// Neighbourhood Cleaning Rule under-sampling
///
/// Cleaning happens in two stages over the same dataset:
///
/// 1. an [Edited Nearest Neighbours](crate::EditedNearestNeighbours) pass, selecting by mode,
///    flags samples of the classes in the sampling strategy which disagree with their
///    neighbourhood.
/// 2. every sample of the minority class looks at its `n_neighbors` nearest neighbours. If
///    the neighbourhood is not consistent with the minority class, according to the
///    [selection kind](crate::SelectionKind), its neighbours are flagged as long as their
///    class is in the sampling strategy and holds more than
///    `threshold_cleaning * n_samples` samples.
///
/// The samples flagged by either stage are dropped. The others keep their original relative
/// order. Neither the records nor the targets of the input are modified.
///
/// With [`SelectionKind::All`] a minority neighbourhood is consistent only when every neighbour
/// carries the minority label.
///
/// ### Example
///
/// ```rust
/// use linfa::prelude::*;
/// use linfa_imbalance::NeighbourhoodCleaningRule;
/// use ndarray::array;
///
/// let dataset = Dataset::new(
///     array![[0.0], [0.1], [0.3], [1.2], [0.25], [1.5], [1.65], [1.85], [10.0], [10.1], [10.3], [10.6], [11.0], [11.5]],
///     array![0usize, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
/// );
///
/// let ncr = NeighbourhoodCleaningRule::params()
///     .return_indices(true)
///     .fit(&dataset)
///     .unwrap();
/// let cleaned = ncr.sample(&dataset).unwrap();
///
/// assert_eq!(
///     cleaned.indices().unwrap().to_vec(),
///     vec![0, 1, 2, 3, 8, 9, 10, 11, 12, 13]
/// );
/// ```
///
/// ### References
///
/// J. Laurikkala, "Improving identification of difficult small classes by balancing class
/// distribution", Springer Berlin Heidelberg, 2001.
#[derive(Clone, Debug)]
pub struct NeighbourhoodCleaningRule<F, L> {
    params: NcrValidParams<F, L>,
    nn: KNeighbors,
    ratio: BTreeMap<L, usize>,
    shape: (usize, usize),
}

impl<F: Float, L: Label + Ord + Debug> NeighbourhoodCleaningRule<F, L> {
    /// Create default hyperparameters
    pub fn params() -> NcrParams<F, L> {
        NcrParams::new()
    }

    /// Classes which may lose samples, mapped to the minority count
    pub fn ratio(&self) -> &BTreeMap<L, usize> {
        &self.ratio
    }

    /// Shape of the records seen during fitting
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn hyperparams(&self) -> &NcrValidParams<F, L> {
        &self.params
    }

    /// Cleans `dataset`
    pub fn sample<D: Data<Elem = F>, T: AsSingleTargets<Elem = L>>(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Resampled<F, L>> {
        let noise = self.noise(dataset)?.union();
        let targets = dataset.targets().as_single_targets();

        let mut mask = vec![true; targets.len()];
        noise.iter().for_each(|&idx| mask[idx] = false);

        let resampled = Resampled::gather(
            dataset.records(),
            targets,
            selected(&mask),
            self.params.return_indices,
        );

        info!(
            classes = ?resampled.class_counts().as_map(),
            "under-sampling performed"
        );

        Ok(resampled)
    }

    /// Runs both stages and returns the samples each of them flags, without removing anything
    pub fn noise<D: Data<Elem = F>, T: AsSingleTargets<Elem = L>>(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<CleaningNoise> {
        let records = dataset.records();
        if records.ncols() != self.shape.1 {
            return Err(ImbalanceError::FeatureMismatch {
                expected: self.shape.1,
                found: records.ncols(),
            });
        }

        let edited = self.edited_noise(dataset)?;
        let neighbourhood = self.neighbourhood_noise(dataset)?;

        debug!(
            edited = edited.len(),
            neighbourhood = neighbourhood.len(),
            "noisy samples found"
        );

        Ok(CleaningNoise {
            edited,
            neighbourhood,
        })
    }

    /// Samples removed by Edited Nearest Neighbours
    fn edited_noise<D: Data<Elem = F>, T: AsSingleTargets<Elem = L>>(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<BTreeSet<usize>> {
        let enn = self.params.edited_nearest_neighbours().check()?.fit(dataset)?;
        let kept: BTreeSet<usize> = enn.retained_indices(dataset)?.into_iter().collect();

        Ok((0..dataset.records().nrows())
            .filter(|idx| !kept.contains(idx))
            .collect())
    }

    /// Neighbours of minority samples whose neighbourhood is not consistent with the minority
    /// class, restricted to classes eligible for cleaning
    fn neighbourhood_noise<D: Data<Elem = F>, T: AsSingleTargets<Elem = L>>(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<BTreeSet<usize>> {
        let records = dataset.records();
        let targets = dataset.targets().as_single_targets();

        let counts = ClassCounts::from_targets(targets.iter());
        let minority = counts.minority().ok_or(ImbalanceError::EmptyDataset)?;

        let limit = self.params.threshold_cleaning * F::cast(targets.len());
        let eligible: BTreeSet<&L> = counts
            .iter()
            .filter(|(class, n)| self.ratio.contains_key(*class) && F::cast(*n) > limit)
            .map(|(class, _)| class)
            .collect();

        let minority_idx: Vec<usize> = targets
            .iter()
            .enumerate()
            .filter(|(_, label)| *label == minority)
            .map(|(idx, _)| idx)
            .collect();

        let nn = self.nn.fit(records)?;
        let nnhood = nn.kneighbors_excluding_self(&records.select(Axis(0), &minority_idx))?;

        let mut noise = BTreeSet::new();
        for row in nnhood.rows() {
            let consistent = self
                .params
                .kind_sel
                .is_consistent(minority, row.iter().map(|&n| &targets[n]));
            if !consistent {
                noise.extend(
                    row.iter()
                        .copied()
                        .filter(|&n| eligible.contains(&targets[n])),
                );
            }
        }

        Ok(noise)
    }
}

impl<F: Float, L: Label + Ord + Debug, D, T> Fit<ArrayBase<D, Ix2>, T, ImbalanceError>
    for NcrValidParams<F, L>
where
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L>,
{
    type Object = NeighbourhoodCleaningRule<F, L>;

    /// Collects the class statistics of the dataset and prepares the neighbour search
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let counts = check_dataset(dataset)?;
        let ratio = self.sampling_strategy.resolve(&counts)?;
        let records = dataset.records();

        Ok(NeighbourhoodCleaningRule {
            params: self.clone(),
            nn: self.neighbors.resolve(self.n_jobs),
            ratio,
            shape: (records.nrows(), records.ncols()),
        })
    }
}

impl<F: Float, L: Label + Ord + Debug> NcrValidParams<F, L> {
    /// Fits the sampler on `dataset` and cleans it
    pub fn fit_sample<D: Data<Elem = F>, T: AsSingleTargets<Elem = L>>(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Resampled<F, L>> {
        self.fit(dataset)?.sample(dataset)
    }
}

impl<F: Float, L: Label + Ord + Debug> NcrParams<F, L> {
    /// Checks the hyperparameters, fits the sampler on `dataset` and cleans it
    pub fn fit_sample<D: Data<Elem = F>, T: AsSingleTargets<Elem = L>>(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Resampled<F, L>> {
        self.check_ref()?.fit_sample(dataset)
    }
}

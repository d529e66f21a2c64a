use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use linfa::dataset::AsSingleTargets;
use linfa::traits::Fit;
use linfa::{DatasetBase, Float, Label, ParamGuard};
use ndarray::{ArrayBase, Axis, Data, Ix2};
use tracing::info;

use super::hyperparams::{EnnParams, EnnValidParams};
use crate::error::{ImbalanceError, Result};
use crate::neighbors::KNeighbors;
use crate::resampled::{selected, Resampled};
use crate::strategy::check_dataset;

/// Edited Nearest Neighbours under-sampling
///
/// Every sample of a class selected by the sampling strategy is compared with its
/// `n_neighbors` nearest neighbours, taken over the whole dataset. Samples whose
/// neighbourhood disagrees with their own label, according to the
/// [selection kind](crate::SelectionKind), are removed. Classes outside the sampling
/// strategy are kept untouched.
///
/// The model is obtained by fitting [`EnnParams`] and cleans datasets with
/// [`sample`](EditedNearestNeighbours::sample).
#[derive(Clone, Debug)]
pub struct EditedNearestNeighbours<L> {
    params: EnnValidParams<L>,
    nn: KNeighbors,
    ratio: BTreeMap<L, usize>,
    shape: (usize, usize),
}

impl<L: Label + Ord + Debug> EditedNearestNeighbours<L> {
    /// Create default hyperparameters
    pub fn params() -> EnnParams<L> {
        EnnParams::new()
    }

    /// Classes which may lose samples, mapped to the minority count
    pub fn ratio(&self) -> &BTreeMap<L, usize> {
        &self.ratio
    }

    /// Shape of the records seen during fitting
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn hyperparams(&self) -> &EnnValidParams<L> {
        &self.params
    }

    /// Removes the samples whose neighbourhood disagrees with their label
    pub fn sample<F: Float, D: Data<Elem = F>, T: AsSingleTargets<Elem = L>>(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Resampled<F, L>> {
        let retained = self.retained_indices(dataset)?;
        let resampled = Resampled::gather(
            dataset.records(),
            dataset.targets().as_single_targets(),
            retained,
            self.params.return_indices,
        );

        info!(
            classes = ?resampled.class_counts().as_map(),
            "under-sampling performed"
        );

        Ok(resampled)
    }

    /// Positions of the samples the cleaning keeps, ascending
    pub(crate) fn retained_indices<F: Float, D: Data<Elem = F>, T: AsSingleTargets<Elem = L>>(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Vec<usize>> {
        let records = dataset.records();
        let targets = dataset.targets().as_single_targets();
        if records.ncols() != self.shape.1 {
            return Err(ImbalanceError::FeatureMismatch {
                expected: self.shape.1,
                found: records.ncols(),
            });
        }

        let nn = self.nn.fit(records)?;
        let mut keep = vec![false; targets.len()];

        let classes: BTreeSet<&L> = targets.iter().collect();
        for class in classes {
            let class_idx: Vec<usize> = targets
                .iter()
                .enumerate()
                .filter(|(_, label)| *label == class)
                .map(|(idx, _)| idx)
                .collect();

            if !self.ratio.contains_key(class) {
                class_idx.iter().for_each(|&idx| keep[idx] = true);
                continue;
            }

            let nnhood = nn.kneighbors_excluding_self(&records.select(Axis(0), &class_idx))?;
            for (row, &idx) in nnhood.rows().into_iter().zip(class_idx.iter()) {
                keep[idx] = self
                    .params
                    .kind_sel
                    .is_consistent(class, row.iter().map(|&n| &targets[n]));
            }
        }

        Ok(selected(&keep))
    }
}

impl<F: Float, L: Label + Ord + Debug, D, T> Fit<ArrayBase<D, Ix2>, T, ImbalanceError>
    for EnnValidParams<L>
where
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L>,
{
    type Object = EditedNearestNeighbours<L>;

    /// Collects the class statistics of the dataset and prepares the neighbour search
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let counts = check_dataset(dataset)?;
        let ratio = self.sampling_strategy.resolve(&counts)?;
        let records = dataset.records();

        Ok(EditedNearestNeighbours {
            params: self.clone(),
            nn: self.neighbors.resolve(self.n_jobs),
            ratio,
            shape: (records.nrows(), records.ncols()),
        })
    }
}

impl<L: Label + Ord + Debug> EnnValidParams<L> {
    /// Fits the sampler on `dataset` and cleans it
    pub fn fit_sample<F: Float, D: Data<Elem = F>, T: AsSingleTargets<Elem = L>>(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Resampled<F, L>> {
        self.fit(dataset)?.sample(dataset)
    }
}

impl<L: Label + Ord + Debug> EnnParams<L> {
    /// Checks the hyperparameters, fits the sampler on `dataset` and cleans it
    pub fn fit_sample<F: Float, D: Data<Elem = F>, T: AsSingleTargets<Elem = L>>(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Resampled<F, L>> {
        self.check_ref()?.fit_sample(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SamplingStrategy, SelectionKind};
    use linfa::Dataset;
    use ndarray::{array, Array1, Array2, Ix1};

    /// Class 0 around the origin with one class 1 intruder (4), a small class 1 group next
    /// to the class 0 sample at 1.2 (5, 6, 7) and a class 1 cluster far away.
    fn line() -> Dataset<f64, usize, Ix1> {
        let x = [
            0.0, 0.1, 0.3, 1.2, 0.25, 1.5, 1.65, 1.85, 10.0, 10.1, 10.3, 10.6, 11.0, 11.5,
        ];
        let y = array![0usize, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1];
        let records = Array2::from_shape_vec((x.len(), 1), x.to_vec()).unwrap();
        Dataset::new(records, y)
    }

    #[test]
    fn default_params() {
        let params = EditedNearestNeighbours::<usize>::params().check().unwrap();
        assert_eq!(params.n_neighbors(), 3);
        assert_eq!(params.kind_sel(), SelectionKind::All);
        assert_eq!(params.n_jobs(), 1);
        assert!(!params.return_indices());
        assert_eq!(params.sampling_strategy(), &SamplingStrategy::Auto);
    }

    #[test]
    fn invalid_params() {
        let res = EditedNearestNeighbours::<usize>::params().n_neighbors(0).check();
        assert!(matches!(res, Err(ImbalanceError::InvalidNeighbors(0))));

        let res = EditedNearestNeighbours::<usize>::params().n_jobs(0).check();
        assert!(matches!(res, Err(ImbalanceError::InvalidJobs(0))));
    }

    #[test]
    fn mode_removes_intruder() -> Result<()> {
        let dataset = line();
        let enn = EditedNearestNeighbours::params()
            .kind_sel(SelectionKind::Mode)
            .return_indices(true)
            .fit(&dataset)?;
        assert_eq!(enn.ratio().keys().collect::<Vec<_>>(), vec![&1]);

        let out = enn.sample(&dataset)?;
        let expected: Array1<usize> = [0, 1, 2, 3, 5, 6, 7, 8, 9, 10, 11, 12, 13]
            .iter()
            .copied()
            .collect();
        assert_eq!(out.indices(), Some(&expected));
        assert_eq!(out.class_counts().get(&0), 4);
        Ok(())
    }

    #[test]
    fn all_is_stricter() -> Result<()> {
        let dataset = line();
        let out = EditedNearestNeighbours::params()
            .kind_sel(SelectionKind::All)
            .return_indices(true)
            .fit_sample(&dataset)?;

        // 5 has the class 0 sample at 1.2 among its neighbours
        let indices = out.indices().unwrap();
        assert!(!indices.iter().any(|&i| i == 4 || i == 5));
        assert!(indices.iter().any(|&i| i == 8));
        Ok(())
    }

    #[test]
    fn classes_outside_ratio_are_kept() -> Result<()> {
        let dataset = line();
        let out = EditedNearestNeighbours::params()
            .kind_sel(SelectionKind::Mode)
            .sampling_strategy(SamplingStrategy::Classes(vec![0]))
            .fit_sample(&dataset)?;

        // only the class 0 sample at 1.2 is surrounded by class 1
        assert_eq!(out.class_counts().get(&0), 3);
        assert_eq!(out.class_counts().get(&1), 10);
        assert!(out.indices().is_none());
        Ok(())
    }

    #[test]
    fn feature_mismatch() -> Result<()> {
        let enn = EditedNearestNeighbours::params().fit(&line())?;
        let other = Dataset::new(array![[0.0, 1.0], [1.0, 0.0]], array![0usize, 1]);
        assert!(matches!(
            enn.sample(&other),
            Err(ImbalanceError::FeatureMismatch {
                expected: 1,
                found: 2
            })
        ));
        Ok(())
    }

    #[test]
    fn not_enough_samples() -> Result<()> {
        let dataset = Dataset::new(array![[0.0], [1.0], [2.0]], array![0usize, 1, 1]);
        let enn = EditedNearestNeighbours::params().n_neighbors(3).fit(&dataset)?;
        assert!(matches!(
            enn.sample(&dataset),
            Err(ImbalanceError::NotEnoughSamples {
                requested: 4,
                available: 3
            })
        ));
        Ok(())
    }
}

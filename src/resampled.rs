use linfa::{Dataset, DatasetBase, Float, Label};
use ndarray::{Array1, ArrayBase, ArrayView1, Axis, Data, Ix1, Ix2};

use crate::strategy::ClassCounts;

/// Output of a cleaning pass
///
/// Holds the retained samples in their original relative order and, when the sampler was
/// configured with `return_indices`, the positions of those samples in the input dataset.
#[derive(Debug, Clone)]
pub struct Resampled<F, L> {
    dataset: Dataset<F, L, Ix1>,
    indices: Option<Array1<usize>>,
}

impl<F: Float, L: Label + Ord> Resampled<F, L> {
    /// Gathers the rows at `indices` from `records` and `targets`
    pub(crate) fn gather<D: Data<Elem = F>>(
        records: &ArrayBase<D, Ix2>,
        targets: ArrayView1<L>,
        indices: Vec<usize>,
        return_indices: bool,
    ) -> Self {
        let dataset = DatasetBase::new(
            records.select(Axis(0), &indices),
            targets.select(Axis(0), &indices),
        );

        Resampled {
            dataset,
            indices: if return_indices {
                Some(Array1::from(indices))
            } else {
                None
            },
        }
    }

    pub fn dataset(&self) -> &Dataset<F, L, Ix1> {
        &self.dataset
    }

    /// Positions of the retained samples in the input, if they were requested
    pub fn indices(&self) -> Option<&Array1<usize>> {
        self.indices.as_ref()
    }

    /// Class distribution of the retained samples
    pub fn class_counts(&self) -> ClassCounts<L> {
        ClassCounts::from_targets(self.dataset.targets().iter())
    }

    pub fn into_dataset(self) -> Dataset<F, L, Ix1> {
        self.dataset
    }

    pub fn into_parts(self) -> (Dataset<F, L, Ix1>, Option<Array1<usize>>) {
        (self.dataset, self.indices)
    }
}

/// Positions in `0..nsamples` whose mask entry is set, ascending
pub(crate) fn selected(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter(|(_, keep)| **keep)
        .map(|(idx, _)| idx)
        .collect()
}

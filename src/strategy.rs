//! Class statistics and the choice of classes a cleaning sampler may touch
//!
use std::collections::BTreeMap;
use std::fmt::Debug;

use linfa::dataset::{AsSingleTargets, DatasetBase};
use linfa::Label;
use ndarray::{ArrayBase, Data, Ix2};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{ImbalanceError, Result};

/// Number of samples carrying each label, in label order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassCounts<L: Ord>(BTreeMap<L, usize>);

impl<L: Label + Ord> ClassCounts<L> {
    /// Counts the labels yielded by `targets`
    pub fn from_targets<'a, I>(targets: I) -> Self
    where
        I: IntoIterator<Item = &'a L>,
        L: 'a,
    {
        let mut counts = BTreeMap::new();
        for label in targets {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
        ClassCounts(counts)
    }

    pub fn get(&self, label: &L) -> usize {
        self.0.get(label).copied().unwrap_or(0)
    }

    /// Number of distinct classes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&L, usize)> {
        self.0.iter().map(|(label, n)| (label, *n))
    }

    pub fn as_map(&self) -> &BTreeMap<L, usize> {
        &self.0
    }

    /// The least frequent class. Among equally rare classes the smallest label wins.
    pub fn minority(&self) -> Option<&L> {
        self.iter().min_by_key(|(_, n)| *n).map(|(label, _)| label)
    }

    /// The most frequent class. Among equally frequent classes the smallest label wins.
    pub fn majority(&self) -> Option<&L> {
        self.iter()
            .max_by(|(l1, n1), (l2, n2)| n1.cmp(n2).then_with(|| l2.cmp(l1)))
            .map(|(label, _)| label)
    }
}

/// Which classes a cleaning sampler is allowed to remove samples from
///
/// A cleaning sampler never targets a number of samples, so only the set of selected classes
/// matters. The resolved ratio still maps every selected class to the minority count.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SamplingStrategy<L> {
    /// Same as `NotMinority`
    Auto,
    /// Every class
    All,
    /// Only the most frequent class
    Majority,
    /// Every class except the least frequent one
    NotMinority,
    /// Every class except the most frequent one
    NotMajority,
    /// An explicit list of classes, each of which must occur in the targets
    Classes(Vec<L>),
}

impl<L> Default for SamplingStrategy<L> {
    fn default() -> Self {
        SamplingStrategy::Auto
    }
}

impl<L: Label + Ord + Debug> SamplingStrategy<L> {
    /// Resolves the strategy against the class distribution of a dataset
    pub fn resolve(&self, counts: &ClassCounts<L>) -> Result<BTreeMap<L, usize>> {
        let minority = counts.minority().ok_or(ImbalanceError::EmptyDataset)?;
        let majority = counts.majority().ok_or(ImbalanceError::EmptyDataset)?;
        let n_minority = counts.get(minority);

        let selected: Vec<&L> = match self {
            SamplingStrategy::All => counts.iter().map(|(label, _)| label).collect(),
            SamplingStrategy::Majority => vec![majority],
            SamplingStrategy::Auto | SamplingStrategy::NotMinority => counts
                .iter()
                .map(|(label, _)| label)
                .filter(|label| *label != minority)
                .collect(),
            SamplingStrategy::NotMajority => counts
                .iter()
                .map(|(label, _)| label)
                .filter(|label| *label != majority)
                .collect(),
            SamplingStrategy::Classes(classes) => {
                if let Some(missing) = classes.iter().find(|c| counts.get(c) == 0) {
                    return Err(ImbalanceError::UnknownClass(format!("{:?}", missing)));
                }
                classes.iter().collect()
            }
        };

        Ok(selected
            .into_iter()
            .map(|label| (label.clone(), n_minority))
            .collect())
    }
}

/// Checks that records and targets line up and that there is something to resample.
/// Returns the class distribution of the targets.
pub(crate) fn check_dataset<F, L, D, T>(
    dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
) -> Result<ClassCounts<L>>
where
    L: Label + Ord,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L>,
{
    let records = dataset.records();
    let targets = dataset.targets().as_single_targets();

    if records.nrows() != targets.len() {
        return Err(ImbalanceError::MismatchedShapes(
            records.nrows(),
            targets.len(),
        ));
    }
    if records.nrows() == 0 || records.ncols() == 0 {
        return Err(ImbalanceError::EmptyDataset);
    }

    let counts = ClassCounts::from_targets(targets.iter());
    if counts.len() < 2 {
        return Err(ImbalanceError::SingleClass);
    }

    Ok(counts)
}

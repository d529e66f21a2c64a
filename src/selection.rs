use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::ImbalanceError;

/// Rule deciding whether the neighbourhood of a sample agrees with a label
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionKind {
    /// Every neighbour has to carry the label
    All,
    /// The most frequent neighbour label has to be the label. Ties between
    /// equally frequent labels go to the smallest one.
    Mode,
}

impl SelectionKind {
    /// Whether the neighbour labels agree with `label`
    pub fn is_consistent<'a, L, I>(&self, label: &L, neighbours: I) -> bool
    where
        L: Ord + 'a,
        I: IntoIterator<Item = &'a L>,
    {
        match self {
            SelectionKind::All => neighbours.into_iter().all(|n| n == label),
            SelectionKind::Mode => mode(neighbours) == Some(label),
        }
    }
}

impl Default for SelectionKind {
    fn default() -> Self {
        SelectionKind::All
    }
}

impl FromStr for SelectionKind {
    type Err = ImbalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(SelectionKind::All),
            "mode" => Ok(SelectionKind::Mode),
            other => Err(ImbalanceError::InvalidSelectionKind(other.to_string())),
        }
    }
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionKind::All => write!(f, "all"),
            SelectionKind::Mode => write!(f, "mode"),
        }
    }
}

/// Most frequent element, the smallest one among ties. `None` for an empty input.
pub fn mode<'a, L, I>(labels: I) -> Option<&'a L>
where
    L: Ord + 'a,
    I: IntoIterator<Item = &'a L>,
{
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0usize) += 1;
    }

    // strict comparison keeps the first (smallest) label on ties
    counts
        .into_iter()
        .fold(None, |best: Option<(&L, usize)>, (label, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((label, n)),
        })
        .map(|(label, _)| label)
}

//! Nearest neighbour queries backed by `linfa-nn`
//!
use linfa::Float;
use linfa_nn::{distance::L2Dist, CommonNearestNeighbour, NearestNeighbour, NearestNeighbourIndex};
use ndarray::{s, Array2, ArrayBase, ArrayView1, Axis, Data, Ix2};
use rayon::prelude::*;
use tracing::debug;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{ImbalanceError, Result};

/// A configured k-nearest neighbours search
///
/// The provider is cheap to clone. [`fit`](KNeighbors::fit) builds a spatial index over a
/// set of records, which can then be queried with
/// [`kneighbors`](FittedKNeighbors::kneighbors). Distances are euclidean.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug)]
pub struct KNeighbors {
    n_neighbors: usize,
    algorithm: CommonNearestNeighbour,
    leaf_size: usize,
    n_jobs: usize,
}

impl Default for KNeighbors {
    fn default() -> Self {
        Self::new(5)
    }
}

impl KNeighbors {
    /// Search for the `n_neighbors` closest points, using a KD-tree
    pub fn new(n_neighbors: usize) -> Self {
        KNeighbors {
            n_neighbors,
            algorithm: CommonNearestNeighbour::KdTree,
            leaf_size: 30,
            n_jobs: 1,
        }
    }

    /// Sets the spatial index used for searching
    pub fn with_algorithm(mut self, algorithm: CommonNearestNeighbour) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the leaf size of tree based indices. Ignored by linear search.
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    /// Sets the number of worker threads answering queries
    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    pub fn algorithm(&self) -> &CommonNearestNeighbour {
        &self.algorithm
    }

    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    pub fn n_jobs(&self) -> usize {
        self.n_jobs
    }

    pub(crate) fn with_additional_neighbors(mut self, additional: usize) -> Self {
        self.n_neighbors += additional;
        self
    }

    /// Builds the search index over `records`
    pub fn fit<'a, F: Float, D: Data<Elem = F>>(
        &self,
        records: &'a ArrayBase<D, Ix2>,
    ) -> Result<FittedKNeighbors<'a, F>> {
        let index = self
            .algorithm
            .from_batch_with_leaf_size(records, self.leaf_size, L2Dist)?;

        debug!(
            nsamples = records.nrows(),
            nfeatures = records.ncols(),
            algorithm = ?self.algorithm,
            "built nearest neighbour index"
        );

        let pool = if self.n_jobs > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.n_jobs)
                    .build()
                    .map_err(|e| ImbalanceError::ThreadPool(e.to_string()))?,
            )
        } else {
            None
        };

        Ok(FittedKNeighbors {
            index,
            n_neighbors: self.n_neighbors,
            pool,
            nsamples: records.nrows(),
        })
    }
}

/// A search index built by [`KNeighbors::fit`]. Borrows the records it was built over.
///
/// With more than one job the worker pool is created along with the index and shared by
/// every query.
pub struct FittedKNeighbors<'a, F: Float> {
    index: Box<dyn 'a + NearestNeighbourIndex<F>>,
    n_neighbors: usize,
    pool: Option<rayon::ThreadPool>,
    nsamples: usize,
}

impl<'a, F: Float> FittedKNeighbors<'a, F> {
    /// Returns the positions of the `n_neighbors` closest fitted samples for every row of
    /// `queries`, nearest first. A query that is itself part of the fitted records is its own
    /// nearest neighbour and shows up in the first column.
    pub fn kneighbors<D: Data<Elem = F>>(
        &self,
        queries: &ArrayBase<D, Ix2>,
    ) -> Result<Array2<usize>> {
        if self.n_neighbors > self.nsamples {
            return Err(ImbalanceError::NotEnoughSamples {
                requested: self.n_neighbors,
                available: self.nsamples,
            });
        }

        let queries = queries.view();
        let rows = if let Some(pool) = &self.pool {
            pool.install(|| {
                queries
                    .axis_iter(Axis(0))
                    .into_par_iter()
                    .map(|query| self.query(query))
                    .collect::<Result<Vec<_>>>()
            })?
        } else {
            queries
                .axis_iter(Axis(0))
                .map(|query| self.query(query))
                .collect::<Result<Vec<_>>>()?
        };

        let flat = rows.into_iter().flatten().collect::<Vec<_>>();
        Ok(Array2::from_shape_vec(
            (queries.nrows(), self.n_neighbors),
            flat,
        )?)
    }

    /// Like [`kneighbors`](FittedKNeighbors::kneighbors), with the first column dropped.
    /// Meant for queries drawn from the fitted records.
    pub fn kneighbors_excluding_self<D: Data<Elem = F>>(
        &self,
        queries: &ArrayBase<D, Ix2>,
    ) -> Result<Array2<usize>> {
        Ok(self.kneighbors(queries)?.slice(s![.., 1..]).to_owned())
    }

    fn query(&self, point: ArrayView1<F>) -> Result<Vec<usize>> {
        Ok(self
            .index
            .k_nearest(point, self.n_neighbors)?
            .into_iter()
            .map(|(_, idx)| idx)
            .collect())
    }
}

/// How the neighbourhood of a sample is searched: a plain neighbourhood size, or a
/// pre-configured provider
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug)]
pub enum NeighborsParam {
    Count(usize),
    Provider(KNeighbors),
}

impl NeighborsParam {
    /// Size of the neighbourhood, not counting the sample itself
    pub fn n_neighbors(&self) -> usize {
        match self {
            NeighborsParam::Count(n) => *n,
            NeighborsParam::Provider(nn) => nn.n_neighbors(),
        }
    }

    /// The provider used for cleaning. It looks for one extra point, since every queried
    /// sample finds itself first.
    pub(crate) fn resolve(&self, n_jobs: usize) -> KNeighbors {
        let nn = match self {
            NeighborsParam::Count(n) => KNeighbors::new(*n),
            NeighborsParam::Provider(nn) => nn.clone(),
        };
        nn.with_additional_neighbors(1).with_n_jobs(n_jobs)
    }
}

impl Default for NeighborsParam {
    fn default() -> Self {
        NeighborsParam::Count(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, array};

    fn points() -> Array2<f64> {
        arr2(&[[0.0, 2.0], [10.0, 4.0], [4.0, 5.0], [7.0, 1.0], [1.0, 7.2]])
    }

    #[test]
    fn nearest_first() {
        let points = points();
        for algo in [
            CommonNearestNeighbour::LinearSearch,
            CommonNearestNeighbour::KdTree,
            CommonNearestNeighbour::BallTree,
        ] {
            let nn = KNeighbors::new(3).with_algorithm(algo).fit(&points).unwrap();
            let idx = nn.kneighbors(&points.slice(s![0..2, ..])).unwrap();
            assert_eq!(idx, array![[0, 2, 4], [1, 3, 2]]);
        }
    }

    #[test]
    fn self_is_dropped() {
        let points = points();
        let nn = KNeighbors::new(3).fit(&points).unwrap();
        let idx = nn.kneighbors_excluding_self(&points).unwrap();
        assert_eq!(idx.dim(), (5, 2));
        assert_eq!(idx.row(0), array![2, 4]);
        assert_eq!(idx.row(3), array![1, 2]);
    }

    #[test]
    fn parallel_queries_match() {
        let points = points();
        let serial = KNeighbors::new(4).fit(&points).unwrap();
        let parallel = KNeighbors::new(4).with_n_jobs(3).fit(&points).unwrap();
        assert_eq!(
            serial.kneighbors(&points).unwrap(),
            parallel.kneighbors(&points).unwrap()
        );
    }

    #[test]
    fn pool_is_built_once() {
        let points = points();
        let serial = KNeighbors::new(2).fit(&points).unwrap();
        assert!(serial.pool.is_none());

        let parallel = KNeighbors::new(2).with_n_jobs(3).fit(&points).unwrap();
        assert_eq!(parallel.pool.as_ref().unwrap().current_num_threads(), 3);

        let first = parallel.kneighbors(&points).unwrap();
        let second = parallel.kneighbors(&points.slice(s![1..3, ..])).unwrap();
        assert_eq!(second, first.slice(s![1..3, ..]));
    }

    #[test]
    fn too_many_neighbours() {
        let points = points();
        let nn = KNeighbors::new(6).fit(&points).unwrap();
        assert!(matches!(
            nn.kneighbors(&points),
            Err(ImbalanceError::NotEnoughSamples {
                requested: 6,
                available: 5
            })
        ));
    }

    #[test]
    fn resolve_adds_self() {
        let nn = NeighborsParam::Count(3).resolve(2);
        assert_eq!(nn.n_neighbors(), 4);
        assert_eq!(nn.n_jobs(), 2);

        let provider = KNeighbors::new(5).with_algorithm(CommonNearestNeighbour::LinearSearch);
        let param = NeighborsParam::Provider(provider);
        assert_eq!(param.n_neighbors(), 5);
        let nn = param.resolve(1);
        assert_eq!(nn.n_neighbors(), 6);
        assert!(matches!(nn.algorithm(), CommonNearestNeighbour::LinearSearch));
    }
}

use std::collections::BTreeSet;

use approx::assert_abs_diff_eq;
use linfa::prelude::*;
use ndarray::{concatenate, s, Array, Array1, Array2, Axis, Ix1};
use ndarray_rand::{rand::SeedableRng, rand_distr::StandardNormal, RandomExt};
use rand_xoshiro::Xoshiro256Plus;

use linfa_imbalance::{
    CommonNearestNeighbour, ImbalanceError, KNeighbors, NeighbourhoodCleaningRule,
    SelectionKind,
};

/// 100 samples of class 0 around the origin, 900 samples of class 1 around (3, 3). The last
/// class 1 sample is moved onto the origin.
fn imbalanced_blobs() -> Dataset<f64, usize, Ix1> {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);

    let minority = Array::random_using((100, 2), StandardNormal, &mut rng);
    let mut majority = Array::random_using((900, 2), StandardNormal, &mut rng) + 3.0;
    majority.slice_mut(s![899, ..]).fill(0.0);

    let records = concatenate(Axis(0), &[minority.view(), majority.view()]).unwrap();
    let targets: Array1<usize> = std::iter::repeat(0)
        .take(100)
        .chain(std::iter::repeat(1).take(900))
        .collect();

    Dataset::new(records, targets)
}

fn count(targets: &Array1<usize>, class: usize) -> usize {
    targets.iter().filter(|&&t| t == class).count()
}

#[test]
fn cleans_only_the_majority() -> Result<(), ImbalanceError> {
    let dataset = imbalanced_blobs();
    let cleaned = NeighbourhoodCleaningRule::params()
        .random_state(Some(42))
        .fit_sample(&dataset)?;

    let targets = cleaned.dataset().targets();
    assert_eq!(count(targets, 0), 100);
    assert!(count(targets, 1) < 900);
    assert!(cleaned.indices().is_none());
    Ok(())
}

#[test]
fn retained_samples_avoid_noise() -> Result<(), ImbalanceError> {
    let dataset = imbalanced_blobs();
    let ncr = NeighbourhoodCleaningRule::params()
        .return_indices(true)
        .fit(&dataset)?;

    let noise = ncr.noise(&dataset)?.union();
    let cleaned = ncr.sample(&dataset)?;
    let indices = cleaned.indices().unwrap();

    assert!(noise.contains(&999));
    assert_eq!(indices.len() + noise.len(), 1000);
    assert!(indices.iter().all(|i| *i < 1000 && !noise.contains(i)));
    assert!(indices.windows(2).into_iter().all(|w| w[0] < w[1]));
    Ok(())
}

#[test]
fn rows_match_input() -> Result<(), ImbalanceError> {
    let dataset = imbalanced_blobs();
    let cleaned = NeighbourhoodCleaningRule::params()
        .kind_sel(SelectionKind::Mode)
        .return_indices(true)
        .fit_sample(&dataset)?;

    let indices = cleaned.indices().unwrap().to_vec();
    assert_abs_diff_eq!(
        cleaned.dataset().records(),
        &dataset.records().select(Axis(0), &indices)
    );
    assert_eq!(
        cleaned.dataset().targets(),
        &dataset.targets().select(Axis(0), &indices)
    );
    Ok(())
}

#[test]
fn deterministic_across_calls_and_workers() -> Result<(), ImbalanceError> {
    let dataset = imbalanced_blobs();
    let ncr = NeighbourhoodCleaningRule::params()
        .return_indices(true)
        .fit(&dataset)?;
    let first = ncr.sample(&dataset)?;
    let second = ncr.sample(&dataset)?;
    assert_eq!(first.indices(), second.indices());

    let parallel = NeighbourhoodCleaningRule::params()
        .n_jobs(4)
        .return_indices(true)
        .fit_sample(&dataset)?;
    assert_eq!(first.indices(), parallel.indices());

    let ball_tree = NeighbourhoodCleaningRule::params()
        .neighbors(KNeighbors::new(3).with_algorithm(CommonNearestNeighbour::BallTree))
        .return_indices(true)
        .fit_sample(&dataset)?;
    assert_eq!(first.indices(), ball_tree.indices());
    Ok(())
}

#[test]
fn input_is_untouched() -> Result<(), ImbalanceError> {
    let dataset = imbalanced_blobs();
    let before = dataset.clone();
    let _ = NeighbourhoodCleaningRule::params().fit_sample(&dataset)?;

    assert_eq!(dataset.records(), before.records());
    assert_eq!(dataset.targets(), before.targets());
    Ok(())
}

#[test]
fn invalid_configuration() {
    let dataset = imbalanced_blobs();

    for threshold in [1.5, -0.1] {
        let res = NeighbourhoodCleaningRule::params()
            .threshold_cleaning(threshold)
            .fit(&dataset);
        assert!(matches!(res, Err(ImbalanceError::InvalidThreshold(_))));
    }

    let res = "nearest".parse::<SelectionKind>();
    assert!(matches!(res, Err(ImbalanceError::InvalidSelectionKind(_))));
}

#[test]
fn neighbourhood_larger_than_dataset() -> Result<(), ImbalanceError> {
    let dataset = Dataset::new(
        Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 2.0, 3.0]).unwrap(),
        Array1::from(vec![0usize, 1, 1, 1]),
    );
    let ncr = NeighbourhoodCleaningRule::params()
        .n_neighbors(5)
        .fit(&dataset)?;
    assert!(matches!(
        ncr.sample(&dataset),
        Err(ImbalanceError::NotEnoughSamples { .. })
    ));
    Ok(())
}

#[test]
fn single_class_is_rejected() {
    let dataset = Dataset::new(Array2::<f64>::zeros((5, 2)), Array1::from(vec![3usize; 5]));
    let res = NeighbourhoodCleaningRule::params().fit(&dataset);
    assert!(matches!(res, Err(ImbalanceError::SingleClass)));
}

#[test]
fn edited_stage_is_a_subset_of_noise() -> Result<(), ImbalanceError> {
    let dataset = imbalanced_blobs();
    let noise = NeighbourhoodCleaningRule::params()
        .fit(&dataset)?
        .noise(&dataset)?;

    let union = noise.union();
    assert!(noise.edited.is_subset(&union));
    assert!(noise.neighbourhood.is_subset(&union));

    // neither stage touches the minority class
    let targets = dataset.targets();
    let flagged: BTreeSet<usize> = union.iter().map(|&i| targets[i]).collect();
    assert_eq!(flagged.into_iter().collect::<Vec<_>>(), vec![1]);
    Ok(())
}

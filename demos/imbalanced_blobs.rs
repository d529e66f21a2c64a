use linfa::prelude::*;
use linfa_imbalance::{NeighbourhoodCleaningRule, SelectionKind};
use ndarray::{concatenate, Array, Array1, Axis};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 100 samples of class 0 overlapping 900 samples of class 1
    let mut rng = Xoshiro256Plus::seed_from_u64(10);
    let minority = Array::<f64, _>::random_using((100, 5), StandardNormal, &mut rng);
    let majority = Array::<f64, _>::random_using((900, 5), StandardNormal, &mut rng) + 1.0;
    let records = concatenate(Axis(0), &[minority.view(), majority.view()])?;
    let targets = (0..1000)
        .map(|i| if i < 100 { 0 } else { 1 })
        .collect::<Array1<usize>>();
    let dataset = Dataset::new(records, targets);

    for kind_sel in [SelectionKind::All, SelectionKind::Mode] {
        let ncr = NeighbourhoodCleaningRule::params()
            .kind_sel(kind_sel)
            .return_indices(true)
            .fit(&dataset)?;
        let noise = ncr.noise(&dataset)?;
        let cleaned = ncr.sample(&dataset)?;

        info!(
            %kind_sel,
            edited = noise.edited.len(),
            neighbourhood = noise.neighbourhood.len(),
            "cleaning stages"
        );
        println!(
            "kind_sel={}: {:?} -> {:?}",
            kind_sel,
            ncr.ratio(),
            cleaned.class_counts().as_map()
        );
    }

    Ok(())
}

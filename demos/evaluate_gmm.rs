use clusterval::cluster::{Gmm, Kmeans};
use clusterval::{Dataset, Evaluation, Instance};
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=clusterval=debug shows per-fold progress.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Three labeled Gaussian blobs in 2D.
    let mut rng = StdRng::seed_from_u64(2024);
    let noise = Normal::new(0.0, 0.8)?;
    let centers = [(0.0, 0.0), (6.0, 0.0), (3.0, 5.0)];
    let mut instances = Vec::new();
    for (label, &(cx, cy)) in centers.iter().enumerate() {
        for _ in 0..60 {
            let x: f64 = cx + noise.sample(&mut rng);
            let y: f64 = cy + noise.sample(&mut rng);
            instances.push(Instance::numeric(&[x, y]).with_label(label as u32));
        }
    }
    let data = Dataset::new(instances)?;

    for k in 1..=4 {
        let report = Evaluation::new()
            .with_folds(10)
            .with_seed(1)
            .run(&|| Gmm::new().with_n_components(k).with_seed(7), &data)?;
        println!("--- GMM, {k} components ---\n{report}");
    }

    // Plain clusterers report cluster sizes only.
    let report = Evaluation::new()
        .with_folds(10)
        .run(&|| Kmeans::new(3).with_seed(7), &data)?;
    println!("--- K-means, k = 3 ---\n{report}");

    Ok(())
}

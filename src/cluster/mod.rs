//! Clusterer capabilities and the bundled reference clusterers.
//!
//! The evaluation engine only ever talks to the [`Clusterer`] and
//! [`DistributionClusterer`] traits. Any algorithm can be evaluated by
//! implementing them.
//!
//! ## Plain vs Distribution Clusterers
//!
//! A **plain clusterer** assigns each instance to exactly one cluster. That is
//! enough to report how instances spread over clusters.
//!
//! A **distribution clusterer** additionally reports a non-negative weight per
//! cluster. The sum of those weights is the model's confidence mass for the
//! instance; averaging its logarithm over held-out data gives a log-likelihood
//! score, which is what cross-validation estimates.
//!
//! The capability is queried once through [`Clusterer::as_distribution`],
//! not per instance.
//!
//! ## Bundled algorithms (feature `cluster`)
//!
//! | Type | Kind | Notes |
//! |------|------|-------|
//! | [`Gmm`] | distribution | diagonal Gaussian mixture fitted by EM |
//! | [`Kmeans`] | plain | Lloyd's algorithm with k-means++ seeding |
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "cluster")] {
//! use clusterval::cluster::{Clusterer, DistributionClusterer, Gmm};
//! use clusterval::Dataset;
//!
//! let data = Dataset::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ]).unwrap();
//!
//! let mut gmm = Gmm::new().with_n_components(2).with_seed(42);
//! gmm.build(&data).unwrap();
//!
//! let x = data.instance_at(0).unwrap();
//! let weights = gmm.distribution(x).unwrap();
//! assert_eq!(weights.len(), 2);
//! # }
//! ```

#[cfg(feature = "cluster")]
mod gmm;
#[cfg(feature = "cluster")]
mod kmeans;
mod traits;

#[cfg(feature = "cluster")]
pub use gmm::Gmm;
#[cfg(feature = "cluster")]
pub use kmeans::Kmeans;
pub use traits::{Clusterer, DistributionClusterer};

#[cfg(feature = "cluster")]
use crate::data::Dataset;
#[cfg(feature = "cluster")]
use ndarray::{Array2, ArrayView1};
#[cfg(feature = "cluster")]
use rand::Rng;
#[cfg(feature = "cluster")]
use crate::error::{Error, Result};

/// Dense `n × d` matrix of a numeric dataset.
#[cfg(feature = "cluster")]
fn to_matrix(data: &Dataset) -> Result<Array2<f64>> {
    let n = data.len();
    let d = data.n_attributes();
    let mut flat: Vec<f64> = Vec::with_capacity(n * d);
    for inst in data {
        flat.extend(inst.to_numeric()?);
    }
    Array2::from_shape_vec((n, d), flat).map_err(|e| Error::Other(e.to_string()))
}

#[cfg(feature = "cluster")]
fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// k-means++ seeding: `k` rows of `data`, each drawn with probability
/// proportional to its squared distance from the nearest row already drawn.
#[cfg(feature = "cluster")]
fn kmeans_plus_plus<R: Rng + ?Sized>(data: &Array2<f64>, k: usize, rng: &mut R) -> Array2<f64> {
    let n = data.nrows();
    let mut centers = Array2::zeros((k, data.ncols()));
    if k == 0 {
        return centers;
    }

    let first = rng.random_range(0..n);
    centers.row_mut(0).assign(&data.row(first));

    for i in 1..k {
        let distances: Vec<f64> = data
            .rows()
            .into_iter()
            .map(|point| {
                (0..i)
                    .map(|c| squared_distance(point, centers.row(c)))
                    .fold(f64::MAX, f64::min)
            })
            .collect();

        let total: f64 = distances.iter().sum();
        if total == 0.0 {
            let idx = rng.random_range(0..n);
            centers.row_mut(i).assign(&data.row(idx));
            continue;
        }

        let threshold = rng.random::<f64>() * total;
        let mut cumsum = 0.0;
        let mut selected = n - 1;
        for (j, &dist) in distances.iter().enumerate() {
            cumsum += dist;
            if cumsum >= threshold {
                selected = j;
                break;
            }
        }

        centers.row_mut(i).assign(&data.row(selected));
    }

    centers
}

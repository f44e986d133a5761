//! K-means clustering.
//!
//! The bundled **plain clusterer**: it assigns each instance to its nearest
//! centroid but has no notion of likelihood, so it can be scored for
//! cluster sizes only and is rejected by cross-validation.
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids via k-means++
//! 2. **Assign**: Each point → nearest centroid
//! 3. **Update**: Each centroid → mean of assigned points
//! 4. Repeat until the centroids move less than `tol`
//!
//! ## K-means++ Initialization
//!
//! 1. Choose first centroid uniformly at random
//! 2. Choose next centroid with probability proportional to D(x)²
//!    (squared distance to nearest existing centroid)

use super::{kmeans_plus_plus, squared_distance, to_matrix};
use super::traits::Clusterer;
use crate::data::{Dataset, Instance};
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum iterations.
    max_iter: usize,
    /// Convergence tolerance.
    tol: f64,
    /// Random seed.
    seed: Option<u64>,
    centroids: Option<Array2<f64>>,
}

impl Kmeans {
    /// Create a new, unbuilt K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 100,
            tol: 1e-4,
            seed: None,
            centroids: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Trained centroids, one row per cluster.
    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.centroids.as_ref()
    }
}

fn nearest(point: ArrayView1<'_, f64>, centroids: &Array2<f64>) -> usize {
    let mut best_cluster = 0;
    let mut best_dist = f64::MAX;
    for (k, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = squared_distance(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best_cluster = k;
        }
    }
    best_cluster
}

impl Clusterer for Kmeans {
    fn build(&mut self, data: &Dataset) -> Result<()> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        let n = data.len();
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }

        let data_arr = to_matrix(data)?;
        let d = data_arr.ncols();

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut centroids = kmeans_plus_plus(&data_arr, self.k, &mut rng);
        let mut labels = vec![0usize; n];

        for _iter in 0..self.max_iter {
            #[cfg(feature = "parallel")]
            {
                let centroids_ref = &centroids;
                labels.par_iter_mut().enumerate().for_each(|(i, label)| {
                    *label = nearest(data_arr.row(i), centroids_ref);
                });
            }

            #[cfg(not(feature = "parallel"))]
            for (i, label) in labels.iter_mut().enumerate() {
                *label = nearest(data_arr.row(i), &centroids);
            }

            // Update step
            let mut new_centroids = Array2::<f64>::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];

            for (i, &k) in labels.iter().enumerate() {
                let mut row = new_centroids.row_mut(k);
                row += &data_arr.row(i);
                counts[k] += 1;
            }

            for (k, &count) in counts.iter().enumerate() {
                if count > 0 {
                    new_centroids.row_mut(k).mapv_inplace(|v| v / count as f64);
                } else {
                    // Empty cluster: reinitialize randomly
                    let idx = rng.random_range(0..n);
                    new_centroids.row_mut(k).assign(&data_arr.row(idx));
                }
            }

            let shift: f64 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();

            centroids = new_centroids;

            if shift < self.tol {
                break;
            }
        }

        self.centroids = Some(centroids);
        Ok(())
    }

    fn assign(&self, instance: &Instance) -> Result<usize> {
        let centroids = self.centroids.as_ref().ok_or(Error::NotBuilt)?;
        let point = instance.to_numeric()?;
        if point.len() != centroids.ncols() {
            return Err(Error::DimensionMismatch {
                expected: centroids.ncols(),
                found: point.len(),
            });
        }
        Ok(nearest(ArrayView1::from(&point[..]), centroids))
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

//! Gaussian Mixture Model clustering.
//!
//! GMM is the bundled **distribution clusterer**: besides a hard assignment it
//! reports, for every cluster, the joint weight
//!
//! ```text
//! wₖ(x) = πₖ × N(x | μₖ, diag(σ²ₖ))
//! ```
//!
//! so that `Σₖ wₖ(x) = P(x)`, the mixture density at `x`. The log of that sum
//! is exactly what log-likelihood scoring averages over held-out data.
//!
//! # The EM Algorithm
//!
//! **E-step**: Compute "responsibilities" (soft assignments):
//! ```text
//! γₙₖ = πₖ × N(xₙ | μₖ, Σₖ) / Σⱼ πⱼ × N(xₙ | μⱼ, Σⱼ)
//! ```
//!
//! **M-step**: Update parameters using responsibilities:
//! - μₖ = Σₙ γₙₖ xₙ / Σₙ γₙₖ  (weighted mean)
//! - σ²ₖ = Σₙ γₙₖ (xₙ - μₖ)² / Σₙ γₙₖ  (weighted variance, floored)
//! - πₖ = (1/N) Σₙ γₙₖ  (fraction of responsibility)
//!
//! Iteration stops after `max_iter` rounds or once the mean log-likelihood of
//! the training data moves by less than `tol`.
//!
//! # Failure Modes
//!
//! - **Local optima**: EM converges to local maxima; initialization matters
//! - **Singular covariance**: Small clusters can collapse; variances are floored at `reg_covar`
//! - **Underflow**: far from every component the density rounds to 0; such
//!   instances are non-informative for log-likelihood scoring

use super::{kmeans_plus_plus, to_matrix};
use super::traits::{Clusterer, DistributionClusterer};
use crate::data::{Dataset, Instance};
use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;

/// Gaussian Mixture Model with diagonal covariances.
#[derive(Debug, Clone)]
pub struct Gmm {
    /// Number of components (clusters).
    n_components: usize,
    /// Maximum EM iterations.
    max_iter: usize,
    /// Convergence tolerance on mean log-likelihood.
    tol: f64,
    /// Random seed.
    seed: Option<u64>,
    /// Variance floor.
    reg_covar: f64,
    fitted: Option<Mixture>,
}

#[derive(Debug, Clone)]
struct Mixture {
    means: Array2<f64>,
    variances: Array2<f64>,
    weights: Array1<f64>,
}

impl Mixture {
    /// `ln πₖ + ln N(x | μₖ, σ²ₖ)` for every component.
    fn log_joint(&self, point: ArrayView1<'_, f64>) -> Vec<f64> {
        (0..self.weights.len())
            .map(|c| {
                self.weights[c].ln()
                    + log_gaussian(point, self.means.row(c), self.variances.row(c))
            })
            .collect()
    }

    fn log_joint_for(&self, instance: &Instance) -> Result<Vec<f64>> {
        let point = Array1::from(instance.to_numeric()?);
        if point.len() != self.means.ncols() {
            return Err(Error::DimensionMismatch {
                expected: self.means.ncols(),
                found: point.len(),
            });
        }
        Ok(self.log_joint(point.view()))
    }
}

/// Log-density of a point under a diagonal Gaussian.
fn log_gaussian(point: ArrayView1<'_, f64>, mean: ArrayView1<'_, f64>, var: ArrayView1<'_, f64>) -> f64 {
    let d = point.len() as f64;
    let mut log_prob = -0.5 * d * (2.0 * std::f64::consts::PI).ln();

    for i in 0..point.len() {
        let diff = point[i] - mean[i];
        log_prob -= 0.5 * var[i].ln();
        log_prob -= 0.5 * diff * diff / var[i];
    }

    log_prob
}

/// Log-sum-exp for numerical stability.
fn logsumexp(values: &[f64]) -> f64 {
    let max_val = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max_val.is_infinite() {
        return max_val;
    }
    max_val
        + values
            .iter()
            .map(|&v| (v - max_val).exp())
            .sum::<f64>()
            .ln()
}

impl Gmm {
    /// Create an unbuilt GMM with default settings.
    pub fn new() -> Self {
        Self {
            n_components: 8,
            max_iter: 100,
            tol: 1e-3,
            seed: None,
            reg_covar: 1e-6,
            fitted: None,
        }
    }

    /// Set number of components.
    pub fn with_n_components(mut self, n: usize) -> Self {
        self.n_components = n;
        self
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

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the variance floor.
    pub fn with_reg_covar(mut self, reg_covar: f64) -> Self {
        self.reg_covar = reg_covar;
        self
    }

    /// Whether [`Clusterer::build`] has completed.
    pub fn is_built(&self) -> bool {
        self.fitted.is_some()
    }

    /// Mixing weights of the trained model.
    pub fn mixing_weights(&self) -> Option<Vec<f64>> {
        self.fitted.as_ref().map(|m| m.weights.to_vec())
    }

    fn mixture(&self) -> Result<&Mixture> {
        self.fitted.as_ref().ok_or(Error::NotBuilt)
    }
}

impl Default for Gmm {
    fn default() -> Self {
        Self::new()
    }
}

impl Clusterer for Gmm {
    fn build(&mut self, data: &Dataset) -> Result<()> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        if self.n_components == 0 {
            return Err(Error::InvalidParameter {
                name: "n_components",
                message: "must be > 0",
            });
        }

        let x = to_matrix(data)?;
        let (n, d) = x.dim();
        let k = self.n_components.min(n);

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        // Means: k-means++ seeding
        let means = kmeans_plus_plus(&x, k, &mut rng);

        // Variances: per-dimension data variance
        let mut variances = Array2::from_elem((k, d), 1.0);
        for j in 0..d {
            let col = x.column(j);
            let mean = col.sum() / n as f64;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
            variances.column_mut(j).fill(var.max(self.reg_covar));
        }

        let mut mixture = Mixture {
            means,
            variances,
            weights: Array1::from_elem(k, 1.0 / k as f64),
        };

        let mut resp = Array2::<f64>::zeros((n, k));
        let mut prev_ll = f64::NEG_INFINITY;

        for _iter in 0..self.max_iter {
            // E-step
            let mut ll = 0.0;
            for i in 0..n {
                let log_probs = mixture.log_joint(x.row(i));
                let log_sum = logsumexp(&log_probs);

                if log_sum.is_finite() {
                    ll += log_sum;
                    for c in 0..k {
                        resp[[i, c]] = (log_probs[c] - log_sum).exp();
                    }
                } else {
                    resp.row_mut(i).fill(1.0 / k as f64);
                }
            }
            ll /= n as f64;

            // M-step
            let resp_sum: Vec<f64> = (0..k).map(|c| resp.column(c).sum()).collect();
            let total: f64 = resp_sum.iter().sum();

            for c in 0..k {
                mixture.weights[c] = (resp_sum[c] / total).max(f64::MIN_POSITIVE);
            }

            for c in 0..k {
                if resp_sum[c] <= 1e-10 {
                    continue;
                }
                let mut mean = Array1::<f64>::zeros(d);
                for i in 0..n {
                    mean.scaled_add(resp[[i, c]], &x.row(i));
                }
                mean /= resp_sum[c];

                let mut var = Array1::<f64>::zeros(d);
                for i in 0..n {
                    let diff = &x.row(i) - &mean;
                    var.scaled_add(resp[[i, c]], &(&diff * &diff));
                }
                var /= resp_sum[c];
                var.mapv_inplace(|v| v.max(self.reg_covar));

                mixture.means.row_mut(c).assign(&mean);
                mixture.variances.row_mut(c).assign(&var);
            }

            if (ll - prev_ll).abs() < self.tol {
                break;
            }
            prev_ll = ll;
        }

        self.fitted = Some(mixture);
        Ok(())
    }

    fn assign(&self, instance: &Instance) -> Result<usize> {
        let log_probs = self.mixture()?.log_joint_for(instance)?;

        // Hard assignment: argmax
        Ok(log_probs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0))
    }

    fn n_clusters(&self) -> usize {
        self.fitted
            .as_ref()
            .map_or(self.n_components, |m| m.weights.len())
    }

    fn as_distribution(&self) -> Option<&dyn DistributionClusterer> {
        Some(self)
    }
}

impl DistributionClusterer for Gmm {
    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>> {
        let log_probs = self.mixture()?.log_joint_for(instance)?;
        Ok(log_probs.into_iter().map(f64::exp).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use rand_distr::{Distribution, Normal};

    fn blobs(seed: u64, per_blob: usize) -> Dataset {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 0.3).unwrap();
        let mut rows = Vec::new();
        for center in [0.0, 10.0] {
            for _ in 0..per_blob {
                rows.push(vec![
                    center + noise.sample(&mut rng),
                    center + noise.sample(&mut rng),
                ]);
            }
        }
        Dataset::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_gmm_basic() {
        let data = Dataset::from_rows(&[
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
        ])
        .unwrap();

        let mut gmm = Gmm::new().with_n_components(2).with_seed(42);
        gmm.build(&data).unwrap();

        let labels: Vec<usize> = data.iter().map(|x| gmm.assign(x).unwrap()).collect();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
    }

    #[test]
    fn test_gmm_separates_blobs() {
        let data = blobs(7, 30);
        let mut gmm = Gmm::new().with_n_components(2).with_seed(1);
        gmm.build(&data).unwrap();

        let labels: Vec<usize> = data.iter().map(|x| gmm.assign(x).unwrap()).collect();
        assert!(labels[..30].iter().all(|&l| l == labels[0]));
        assert!(labels[30..].iter().all(|&l| l == labels[30]));
        assert_ne!(labels[0], labels[30]);

        let weights = gmm.mixing_weights().unwrap();
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_distribution_is_joint_density() {
        let data = blobs(3, 20);
        let mut gmm = Gmm::new().with_n_components(2).with_seed(5);
        gmm.build(&data).unwrap();

        let x = data.instance_at(0).unwrap();
        let dist = gmm.distribution(x).unwrap();
        assert_eq!(dist.len(), gmm.n_clusters());
        assert!(dist.iter().all(|&w| w >= 0.0));
        assert!(dist.iter().sum::<f64>() > 0.0);

        // argmax of the weights agrees with the hard assignment
        let best = dist
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(best, gmm.assign(x).unwrap());
    }

    #[test]
    fn test_gmm_far_point_underflows_to_zero() {
        let data = blobs(11, 20);
        let mut gmm = Gmm::new().with_n_components(2).with_seed(2);
        gmm.build(&data).unwrap();

        let far = Instance::numeric(&[1e6, -1e6]);
        let dist = gmm.distribution(&far).unwrap();
        assert_eq!(dist.iter().sum::<f64>(), 0.0);
    }

    #[test]
    fn test_gmm_unbuilt_and_bad_input() {
        let gmm = Gmm::new().with_n_components(2);
        let x = Instance::numeric(&[0.0, 0.0]);
        assert_eq!(gmm.assign(&x), Err(Error::NotBuilt));
        assert_eq!(gmm.n_clusters(), 2);
        assert!(gmm.as_distribution().is_some());

        let mut gmm = Gmm::new().with_n_components(2).with_seed(0);
        gmm.build(&blobs(1, 5)).unwrap();
        assert_eq!(
            gmm.assign(&Instance::numeric(&[0.0])),
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
        let nominal = Instance::new(vec![Value::Numeric(0.0), Value::Nominal(1)]);
        assert_eq!(
            gmm.distribution(&nominal),
            Err(Error::NonNumericAttribute { index: 1 })
        );
    }

    #[test]
    fn test_gmm_empty_and_zero_components() {
        let mut gmm = Gmm::new();
        assert_eq!(gmm.build(&Dataset::default()), Err(Error::EmptyInput));

        let mut gmm = Gmm::new().with_n_components(0);
        assert!(gmm.build(&blobs(1, 3)).is_err());
    }

    #[test]
    fn test_gmm_deterministic_with_seed() {
        let data = blobs(9, 15);
        let mut a = Gmm::new().with_n_components(3).with_seed(42);
        let mut b = Gmm::new().with_n_components(3).with_seed(42);
        a.build(&data).unwrap();
        b.build(&data).unwrap();

        for x in &data {
            assert_eq!(a.distribution(x).unwrap(), b.distribution(x).unwrap());
        }
    }
}

//! K-fold cross-validated log-likelihood for distribution clusterers.
//!
//! The protocol:
//!
//! 1. Partition the dataset once ([`partition`]) with the configured seed.
//! 2. For each fold `i`, one at a time: create a fresh clusterer from the
//!    factory, reject it unless it is a distribution clusterer, build it on
//!    every instance outside fold `i`, then [`score`] it on a stream over
//!    fold `i`. The fold's value is its mean log-likelihood, or `0` when no
//!    held-out instance was informative.
//! 3. Average the fold values.
//!
//! Any failure aborts the whole run: there is no average over the folds
//! that happened to succeed.
//!
//! ```rust
//! # #[cfg(feature = "cluster")] {
//! use clusterval::cluster::Gmm;
//! use clusterval::{CrossValidation, Dataset};
//!
//! let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![(i % 2) as f64 * 10.0 + (i as f64) * 0.01]).collect();
//! let data = Dataset::from_rows(&rows).unwrap();
//!
//! let result = CrossValidation::new()
//!     .with_folds(4)
//!     .with_seed(7)
//!     .run(&|| Gmm::new().with_n_components(2).with_seed(1), &data)
//!     .unwrap();
//! assert_eq!(result.folds().len(), 4);
//! # }
//! ```

use crate::cluster::Clusterer;
use crate::data::Dataset;
use crate::error::{Error, Result};
use crate::partition::partition;
use crate::stats::score;
use core::fmt;
use tracing::{debug, info};

/// Produces fresh, identically configured, untrained clusterers.
pub trait ClustererFactory {
    /// Clusterer type produced.
    type Output: Clusterer;

    /// A new untrained clusterer.
    fn create(&self) -> Result<Self::Output>;
}

impl<F, C> ClustererFactory for F
where
    F: Fn() -> C,
    C: Clusterer,
{
    type Output = C;

    fn create(&self) -> Result<C> {
        Ok(self())
    }
}

/// Outcome of one fold.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldScore {
    /// Fold index.
    pub fold: usize,
    /// Training instances (all other folds).
    pub n_train: usize,
    /// Held-out instances.
    pub n_test: usize,
    /// Held-out instances with a strictly positive weight sum.
    pub n_informative: u64,
    /// Mean log-likelihood over informative held-out instances, `0` if none.
    pub mean_log_likelihood: f64,
}

/// Cross-validated log-likelihood estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidationResult {
    folds: Vec<FoldScore>,
    mean_log_likelihood: f64,
}

impl CrossValidationResult {
    /// Number of folds.
    pub fn n_folds(&self) -> usize {
        self.folds.len()
    }

    /// Per-fold detail, in fold order.
    pub fn folds(&self) -> &[FoldScore] {
        &self.folds
    }

    /// Mean over folds of each fold's mean log-likelihood.
    pub fn mean_log_likelihood(&self) -> f64 {
        self.mean_log_likelihood
    }
}

impl fmt::Display for CrossValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} fold CV Log Likelihood: {:.4}",
            self.n_folds(),
            self.mean_log_likelihood
        )
    }
}

/// Cross-validation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossValidation {
    n_folds: usize,
    seed: u64,
}

impl CrossValidation {
    /// Ten folds, seed 1.
    pub fn new() -> Self {
        Self {
            n_folds: 10,
            seed: 1,
        }
    }

    /// Set the number of folds.
    pub fn with_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    /// Set the partitioning seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Configured fold count.
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Configured seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run cross-validation of clusterers from `factory` over `data`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPartitionRequest`] for an unusable fold count.
    /// - [`Error::UnsupportedClustererKind`] before any training when the
    ///   factory yields a plain clusterer.
    /// - [`Error::BuildFailed`] / [`Error::ClusterAssignment`] tagged with
    ///   the failing fold.
    pub fn run<F>(&self, factory: &F, data: &Dataset) -> Result<CrossValidationResult>
    where
        F: ClustererFactory + ?Sized,
    {
        let folds = partition(data, self.n_folds, self.seed)?;
        let mut scores = Vec::with_capacity(self.n_folds);

        for fold in 0..self.n_folds {
            let train_idx = folds.train_indices(fold);
            let test_idx = folds.test_indices(fold);

            let mut clusterer = factory.create().map_err(|e| Error::BuildFailed {
                fold: Some(fold),
                source: Box::new(e),
            })?;
            if clusterer.as_distribution().is_none() {
                return Err(Error::UnsupportedClustererKind {
                    clusterer: std::any::type_name::<F::Output>(),
                });
            }

            let train = data.subset(&train_idx)?;
            clusterer.build(&train).map_err(|e| Error::BuildFailed {
                fold: Some(fold),
                source: Box::new(e),
            })?;
            drop(train);

            let stats =
                score(&clusterer, data.stream_indices(&test_idx)).map_err(|e| e.in_fold(fold))?;
            let mean_log_likelihood = stats.mean_log_likelihood().unwrap_or(0.0);

            debug!(
                fold,
                n_train = train_idx.len(),
                n_test = test_idx.len(),
                mean_log_likelihood,
                "fold scored"
            );

            scores.push(FoldScore {
                fold,
                n_train: train_idx.len(),
                n_test: test_idx.len(),
                n_informative: stats.n_informative(),
                mean_log_likelihood,
            });
        }

        let mean_log_likelihood =
            scores.iter().map(|s| s.mean_log_likelihood).sum::<f64>() / self.n_folds as f64;
        info!(
            n_folds = self.n_folds,
            seed = self.seed,
            mean_log_likelihood,
            "cross-validation complete"
        );

        Ok(CrossValidationResult {
            folds: scores,
            mean_log_likelihood,
        })
    }
}

impl Default for CrossValidation {
    fn default() -> Self {
        Self::new()
    }
}

/// Cross-validate with `n_folds` folds partitioned by `seed`.
pub fn cross_validate<F>(
    factory: &F,
    data: &Dataset,
    n_folds: usize,
    seed: u64,
) -> Result<CrossValidationResult>
where
    F: ClustererFactory + ?Sized,
{
    CrossValidation::new()
        .with_folds(n_folds)
        .with_seed(seed)
        .run(factory, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{labeled_dataset, values_dataset, BuildLog, Scripted};
    use std::cell::Cell;

    #[test]
    fn test_builds_one_model_per_fold() {
        let data = labeled_dataset(60, 4);
        let log = BuildLog::default();
        let factory = || Scripted::fixed(vec![1.0, 0.0, 0.0]).with_log(log.clone());

        let result = cross_validate(&factory, &data, 6, 3).unwrap();
        assert_eq!(log.sizes(), vec![50; 6]);
        assert_eq!(result.n_folds(), 6);
        for (i, fold) in result.folds().iter().enumerate() {
            assert_eq!(fold.fold, i);
            assert_eq!(fold.n_train, 50);
            assert_eq!(fold.n_test, 10);
        }
        assert_eq!(result.mean_log_likelihood(), 0.0);
    }

    #[test]
    fn test_constant_mass_averages_to_log() {
        let data = values_dataset(&[0.0; 23]);
        let factory = || Scripted::fixed(vec![2.0, 2.0]);

        let result = cross_validate(&factory, &data, 5, 11).unwrap();
        assert!((result.mean_log_likelihood() - 4f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_uninformative_folds_count_as_zero() {
        let data = values_dataset(&[0.0; 10]);
        let factory = || Scripted::fixed(vec![0.0, 0.0]);

        let result = cross_validate(&factory, &data, 2, 0).unwrap();
        assert_eq!(result.mean_log_likelihood(), 0.0);
        assert!(result.folds().iter().all(|f| f.n_informative == 0));
    }

    #[test]
    fn test_plain_clusterer_rejected_before_training() {
        let data = values_dataset(&[0.0; 10]);
        let log = BuildLog::default();
        let factory = || Scripted::plain(2).with_log(log.clone());

        let err = cross_validate(&factory, &data, 5, 1).unwrap_err();
        assert!(matches!(err, Error::UnsupportedClustererKind { .. }));
        assert!(log.sizes().is_empty());
    }

    #[test]
    fn test_failure_in_fold_aborts_everything() {
        let data = values_dataset(&[1.0; 50]);
        let log = BuildLog::default();
        let created = Cell::new(0usize);
        let factory = || {
            let i = created.get();
            created.set(i + 1);
            let c = Scripted::fixed(vec![1.0, 1.0, 1.0]).with_log(log.clone());
            if i == 3 {
                c.failing_at(6)
            } else {
                c
            }
        };

        let err = cross_validate(&factory, &data, 5, 42).unwrap_err();
        match &err {
            Error::ClusterAssignment {
                fold: Some(3),
                position: 6,
                ..
            } => {}
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(log.sizes().len(), 4);
        assert_eq!(created.get(), 4);
    }

    #[test]
    fn test_build_failure_tagged_with_fold() {
        let data = values_dataset(&[0.0; 6]);
        let factory = || Scripted::fixed(vec![1.0]).failing_build();

        let err = cross_validate(&factory, &data, 3, 0).unwrap_err();
        assert_eq!(err.fold(), Some(0));
        assert!(matches!(err, Error::BuildFailed { .. }));
    }

    #[test]
    fn test_invalid_fold_count() {
        let data = values_dataset(&[0.0; 3]);
        let factory = || Scripted::fixed(vec![1.0]);
        assert_eq!(
            cross_validate(&factory, &data, 4, 0),
            Err(Error::InvalidPartitionRequest {
                n_folds: 4,
                n_instances: 3
            })
        );
    }

    #[test]
    fn test_boxed_clusterers_from_factory() {
        let data = values_dataset(&[0.0; 8]);
        let factory = || -> Box<dyn Clusterer> { Box::new(Scripted::fixed(vec![1.0, 1.0])) };

        let result = cross_validate(&factory, &data, 4, 2).unwrap();
        assert!((result.mean_log_likelihood() - 2f64.ln()).abs() < 1e-12);

        let plain = || -> Box<dyn Clusterer> { Box::new(Scripted::plain(2)) };
        assert!(matches!(
            cross_validate(&plain, &data, 4, 2),
            Err(Error::UnsupportedClustererKind { .. })
        ));
    }

    #[test]
    fn test_config_defaults_and_report() {
        let cv = CrossValidation::default();
        assert_eq!(cv.n_folds(), 10);
        assert_eq!(cv.seed(), 1);

        let data = values_dataset(&[0.0; 10]);
        let result = cv
            .run(&|| Scripted::fixed(vec![0.5, 0.5]), &data)
            .unwrap();
        assert_eq!(result.to_string(), "10 fold CV Log Likelihood: 0.0000\n");
    }
}

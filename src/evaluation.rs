//! End-to-end evaluation of a clusterer configuration.
//!
//! An [`Evaluation`] builds one clusterer on the training data and reports
//! its cluster statistics on that data and, optionally, on a streamed test
//! set. Without a test set, and if a fold count is configured and the
//! clusterer is a distribution clusterer, it also appends a cross-validated
//! log-likelihood computed from fresh clusterers.
//!
//! Loading data, parsing options and persisting the trained model stay with
//! the caller; the report hands back the trained clusterer for that purpose.

use crate::cluster::Clusterer;
use crate::cross_validation::{ClustererFactory, CrossValidation, CrossValidationResult};
use crate::data::{Dataset, Instance};
use crate::error::{Error, Result};
use crate::stats::{score, ClusterStats};
use core::fmt;
use std::borrow::Borrow;
use tracing::debug;

/// Evaluation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    n_folds: Option<usize>,
    seed: u64,
}

impl Evaluation {
    /// No cross-validation, seed 1.
    pub fn new() -> Self {
        Self {
            n_folds: None,
            seed: 1,
        }
    }

    /// Cross-validate with `n_folds` folds when no test set is supplied.
    pub fn with_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = Some(n_folds);
        self
    }

    /// Set the seed used for fold partitioning.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build on `train`, score `train`, then cross-validate if configured.
    pub fn run<F>(&self, factory: &F, train: &Dataset) -> Result<EvaluationReport<F::Output>>
    where
        F: ClustererFactory + ?Sized,
    {
        let (clusterer, train_stats) = build_and_score(factory, train)?;

        let cross_validation = match self.n_folds {
            Some(n_folds) if clusterer.as_distribution().is_some() => Some(
                CrossValidation::new()
                    .with_folds(n_folds)
                    .with_seed(self.seed)
                    .run(factory, train)?,
            ),
            Some(_) => {
                debug!("skipping cross-validation for a plain clusterer");
                None
            }
            None => None,
        };

        Ok(EvaluationReport {
            clusterer,
            train: train_stats,
            test: None,
            cross_validation,
        })
    }

    /// Build on `train`, score `train`, then score the `test` stream.
    ///
    /// Cross-validation never runs when a test set is given.
    pub fn run_with_test<F, I, T>(
        &self,
        factory: &F,
        train: &Dataset,
        test: I,
    ) -> Result<EvaluationReport<F::Output>>
    where
        F: ClustererFactory + ?Sized,
        I: IntoIterator<Item = Result<T>>,
        T: Borrow<Instance>,
    {
        let (clusterer, train_stats) = build_and_score(factory, train)?;
        let test_stats = score(&clusterer, test)?;

        Ok(EvaluationReport {
            clusterer,
            train: train_stats,
            test: Some(test_stats),
            cross_validation: None,
        })
    }
}

impl Default for Evaluation {
    fn default() -> Self {
        Self::new()
    }
}

fn build_and_score<F>(factory: &F, train: &Dataset) -> Result<(F::Output, ClusterStats)>
where
    F: ClustererFactory + ?Sized,
{
    let mut clusterer = factory.create()?;
    clusterer.build(train).map_err(|e| Error::BuildFailed {
        fold: None,
        source: Box::new(e),
    })?;
    let stats = score(&clusterer, train.stream())?;
    Ok((clusterer, stats))
}

/// Everything an evaluation produced.
#[derive(Debug, Clone)]
pub struct EvaluationReport<C> {
    clusterer: C,
    train: ClusterStats,
    test: Option<ClusterStats>,
    cross_validation: Option<CrossValidationResult>,
}

impl<C> EvaluationReport<C> {
    /// The clusterer trained on the full training set.
    pub fn clusterer(&self) -> &C {
        &self.clusterer
    }

    /// Take ownership of the trained clusterer.
    pub fn into_clusterer(self) -> C {
        self.clusterer
    }

    /// Statistics on the training data.
    pub fn train_stats(&self) -> &ClusterStats {
        &self.train
    }

    /// Statistics on the test stream, if one was given.
    pub fn test_stats(&self) -> Option<&ClusterStats> {
        self.test.as_ref()
    }

    /// Cross-validation result, if it ran.
    pub fn cross_validation(&self) -> Option<&CrossValidationResult> {
        self.cross_validation.as_ref()
    }
}

impl<C> fmt::Display for EvaluationReport<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "=== Clustering stats for training data ===\n\n{}",
            self.train
        )?;
        if let Some(test) = &self.test {
            write!(f, "\n=== Clustering stats for testing data ===\n\n{test}")?;
        }
        if let Some(cv) = &self.cross_validation {
            write!(f, "\n{cv}")?;
        }
        Ok(())
    }
}

//! # clusterval
//!
//! Evaluation and cross-validation of clustering models.
//!
//! - [`partition`]: seeded, label-stratified k-fold partitioning.
//! - [`score`]: single-pass cluster-size histogram and log-likelihood over a
//!   stream of instances, independent of dataset size.
//! - [`CrossValidation`]: per-fold build-and-score of fresh distribution
//!   clusterers, averaged into one log-likelihood estimate.
//! - [`Evaluation`]: the whole routine (train, test, cross-validate) with a
//!   plain-text report.
//!
//! Clustering algorithms plug in through the [`cluster::Clusterer`] and
//! [`cluster::DistributionClusterer`] traits. Two reference implementations,
//! [`cluster::Gmm`] and [`cluster::Kmeans`], ship behind the default
//! `cluster` feature.
//!
//! ```rust
//! # #[cfg(feature = "cluster")] {
//! use clusterval::cluster::Gmm;
//! use clusterval::{Dataset, Evaluation};
//!
//! let rows: Vec<Vec<f64>> = (0..30)
//!     .map(|i| vec![if i % 2 == 0 { 0.0 } else { 8.0 } + (i as f64) * 0.05])
//!     .collect();
//! let data = Dataset::from_rows(&rows).unwrap();
//!
//! let report = Evaluation::new()
//!     .with_folds(3)
//!     .with_seed(42)
//!     .run(&|| Gmm::new().with_n_components(2).with_seed(1), &data)
//!     .unwrap();
//!
//! assert_eq!(report.train_stats().n_instances(), 30);
//! assert!(report.cross_validation().is_some());
//! println!("{report}");
//! # }
//! ```

pub mod cluster;
pub mod cross_validation;
pub mod data;
/// Error types used across `clusterval`.
pub mod error;
pub mod evaluation;
pub mod partition;
pub mod stats;

#[cfg(test)]
mod testing;

pub use cross_validation::{
    cross_validate, ClustererFactory, CrossValidation, CrossValidationResult, FoldScore,
};
pub use data::{Dataset, Instance, InstanceStream, Value};
pub use error::{Error, Result};
pub use evaluation::{Evaluation, EvaluationReport};
pub use partition::{partition, partition_with_rng, Folds};
pub use stats::{assignments, score, ClusterStats, StatsCollector};

#[cfg(feature = "cluster")]
pub use cluster::{Gmm, Kmeans};
pub use cluster::{Clusterer, DistributionClusterer};

//! Clusterer capabilities consumed by the evaluation engine.

use crate::data::{Dataset, Instance};
use crate::error::Result;

/// A trainable model that assigns each instance to one cluster.
pub trait Clusterer {
    /// Train the model on a materialized dataset.
    fn build(&mut self, data: &Dataset) -> Result<()>;

    /// Cluster index for `instance`, in `[0, n_clusters())`.
    fn assign(&self, instance: &Instance) -> Result<usize>;

    /// Number of clusters the trained model distinguishes.
    fn n_clusters(&self) -> usize;

    /// Capability query for per-cluster weights.
    ///
    /// Distribution clusterers override this to return `Some(self)`.
    fn as_distribution(&self) -> Option<&dyn DistributionClusterer> {
        None
    }
}

/// A clusterer that reports non-negative weights over clusters.
///
/// The sum of the weights is the model's confidence mass for the instance;
/// its logarithm is what log-likelihood scoring accumulates.
pub trait DistributionClusterer: Clusterer {
    /// Weight vector of length `n_clusters()`.
    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>>;
}

impl<C: Clusterer + ?Sized> Clusterer for Box<C> {
    fn build(&mut self, data: &Dataset) -> Result<()> {
        (**self).build(data)
    }

    fn assign(&self, instance: &Instance) -> Result<usize> {
        (**self).assign(instance)
    }

    fn n_clusters(&self) -> usize {
        (**self).n_clusters()
    }

    fn as_distribution(&self) -> Option<&dyn DistributionClusterer> {
        (**self).as_distribution()
    }
}

//! Streaming cluster statistics.
//!
//! [`score`] walks an instance stream exactly once and, for each instance,
//!
//! 1. asks the clusterer for its cluster and bumps that histogram slot;
//! 2. for distribution clusterers, sums the weight vector and, if the sum is
//!    strictly positive, adds its natural log to the running total.
//!
//! Instances whose weight sum is zero, negative or NaN still count toward
//! the histogram but are **non-informative** for log-likelihood: they are
//! left out of both the log sum and the divisor. When no instance is
//! informative the mean log-likelihood is absent, never `0` or `NaN`.
//!
//! Only one instance is held at a time, so memory does not depend on the
//! length of the stream.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "cluster")] {
//! use clusterval::cluster::{Clusterer, Gmm};
//! use clusterval::{score, Dataset};
//!
//! let data = Dataset::from_rows(&[
//!     vec![0.0], vec![0.2], vec![5.0], vec![5.2],
//! ]).unwrap();
//! let mut gmm = Gmm::new().with_n_components(2).with_seed(3);
//! gmm.build(&data).unwrap();
//!
//! let stats = score(&gmm, data.stream()).unwrap();
//! assert_eq!(stats.n_instances(), 4);
//! assert!(stats.mean_log_likelihood().is_some());
//! # }
//! ```

use crate::cluster::{Clusterer, DistributionClusterer};
use crate::data::{Instance, InstanceStream};
use crate::error::{Error, Result};
use core::fmt;
use std::borrow::Borrow;
use tracing::{debug, trace};

/// Cluster-size histogram plus accumulated log-likelihood.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterStats {
    histogram: Vec<u64>,
    log_likelihood_sum: f64,
    informative: u64,
    distribution: bool,
}

impl ClusterStats {
    fn new(n_clusters: usize, distribution: bool) -> Self {
        Self {
            histogram: vec![0; n_clusters],
            log_likelihood_sum: 0.0,
            informative: 0,
            distribution,
        }
    }

    /// Instances assigned to each cluster.
    pub fn histogram(&self) -> &[u64] {
        &self.histogram
    }

    /// Number of clusters in the histogram.
    pub fn n_clusters(&self) -> usize {
        self.histogram.len()
    }

    /// Instances processed (the histogram total).
    pub fn n_instances(&self) -> u64 {
        self.histogram.iter().sum()
    }

    /// Instances with a strictly positive weight sum.
    pub fn n_informative(&self) -> u64 {
        self.informative
    }

    /// Sum of `ln(Σ weights)` over informative instances.
    pub fn log_likelihood_sum(&self) -> f64 {
        self.log_likelihood_sum
    }

    /// Whether the scored clusterer was a distribution clusterer.
    pub fn is_distribution(&self) -> bool {
        self.distribution
    }

    /// Mean log-likelihood over informative instances.
    ///
    /// `None` for plain clusterers and when no instance was informative.
    pub fn mean_log_likelihood(&self) -> Option<f64> {
        (self.distribution && self.informative > 0)
            .then(|| self.log_likelihood_sum / self.informative as f64)
    }

    /// Share of instances per cluster, in percent. All zeros when empty.
    pub fn percentages(&self) -> Vec<f64> {
        let total = self.n_instances();
        self.histogram
            .iter()
            .map(|&c| {
                if total == 0 {
                    0.0
                } else {
                    c as f64 / total as f64 * 100.0
                }
            })
            .collect()
    }
}

impl fmt::Display for ClusterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cluster Instances")?;
        for (cluster, (count, pct)) in self
            .histogram
            .iter()
            .zip(self.percentages())
            .enumerate()
        {
            writeln!(f, "{cluster:>8} {count:>9} ({pct:>3.0}%)")?;
        }
        if self.distribution {
            match self.mean_log_likelihood() {
                Some(ll) => writeln!(f, "\nLog likelihood: {ll:.5}")?,
                None => writeln!(f, "\nLog likelihood: undefined")?,
            }
        }
        Ok(())
    }
}

fn assignment_error(position: usize, source: Error) -> Error {
    Error::ClusterAssignment {
        fold: None,
        position,
        source: Box::new(source),
    }
}

/// Incremental accumulator behind [`score`].
///
/// The distribution capability is resolved once, in [`StatsCollector::new`].
pub struct StatsCollector<'a, C: Clusterer + ?Sized> {
    clusterer: &'a C,
    distribution: Option<&'a dyn DistributionClusterer>,
    stats: ClusterStats,
    position: usize,
}

impl<'a, C: Clusterer + ?Sized> StatsCollector<'a, C> {
    /// Start collecting for a trained clusterer.
    pub fn new(clusterer: &'a C) -> Self {
        let distribution = clusterer.as_distribution();
        Self {
            clusterer,
            distribution,
            stats: ClusterStats::new(clusterer.n_clusters(), distribution.is_some()),
            position: 0,
        }
    }

    /// Account for one instance.
    ///
    /// Any clusterer failure, out-of-range cluster index, or wrong-length
    /// weight vector becomes [`Error::ClusterAssignment`] tagged with the
    /// instance position.
    pub fn observe(&mut self, instance: &Instance) -> Result<()> {
        let position = self.position;
        self.position += 1;
        let n_clusters = self.stats.histogram.len();

        let cluster = self
            .clusterer
            .assign(instance)
            .map_err(|e| assignment_error(position, e))?;
        if cluster >= n_clusters {
            return Err(assignment_error(
                position,
                Error::ClusterIndexOutOfRange {
                    index: cluster,
                    n_clusters,
                },
            ));
        }

        if let Some(dist) = self.distribution {
            let weights = dist
                .distribution(instance)
                .map_err(|e| assignment_error(position, e))?;
            if weights.len() != n_clusters {
                return Err(assignment_error(
                    position,
                    Error::DistributionLength {
                        expected: n_clusters,
                        found: weights.len(),
                    },
                ));
            }

            let total: f64 = weights.iter().sum();
            if total > 0.0 {
                self.stats.log_likelihood_sum += total.ln();
                self.stats.informative += 1;
            } else {
                trace!(position, total, "non-informative instance");
            }
        }

        self.stats.histogram[cluster] += 1;
        Ok(())
    }

    /// Statistics so far.
    pub fn stats(&self) -> &ClusterStats {
        &self.stats
    }

    /// Finish and hand over the statistics.
    pub fn finish(self) -> ClusterStats {
        self.stats
    }
}

/// Score a trained clusterer over a single pass of `instances`.
///
/// Aborts on the first failure; no partial statistics are returned.
pub fn score<C, I, T>(clusterer: &C, instances: I) -> Result<ClusterStats>
where
    C: Clusterer + ?Sized,
    I: IntoIterator<Item = Result<T>>,
    T: Borrow<Instance>,
{
    let mut stream = InstanceStream::new(instances);
    let mut collector = StatsCollector::new(clusterer);

    while stream.has_next() {
        let instance = stream.pull()?;
        collector.observe(instance.borrow())?;
    }

    let stats = collector.finish();
    debug!(
        n_instances = stats.n_instances(),
        n_informative = stats.n_informative(),
        mean_log_likelihood = ?stats.mean_log_likelihood(),
        "scored instance stream"
    );
    Ok(stats)
}

/// Cluster index for every instance of a single pass, as `(position, cluster)`.
pub fn assignments<C, I, T>(clusterer: &C, instances: I) -> Result<Vec<(usize, usize)>>
where
    C: Clusterer + ?Sized,
    I: IntoIterator<Item = Result<T>>,
    T: Borrow<Instance>,
{
    let n_clusters = clusterer.n_clusters();
    let mut stream = InstanceStream::new(instances);
    let mut out = Vec::new();

    while stream.has_next() {
        let position = stream.position();
        let instance = stream.pull()?;
        let cluster = clusterer
            .assign(instance.borrow())
            .map_err(|e| assignment_error(position, e))?;
        if cluster >= n_clusters {
            return Err(assignment_error(
                position,
                Error::ClusterIndexOutOfRange {
                    index: cluster,
                    n_clusters,
                },
            ));
        }
        out.push((position, cluster));
    }

    Ok(out)
}

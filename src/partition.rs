//! Seeded, optionally stratified, k-fold partitioning.
//!
//! Every instance of a [`Dataset`] lands in exactly one of `n_folds` folds,
//! and fold sizes differ by at most one.
//!
//! - **Stratified** (any instance carries a label): shuffle, group by label
//!   (stable, ascending, unlabeled first), then deal round-robin over the
//!   folds with a single cursor that carries over between groups. Each fold
//!   receives `⌊c/k⌋` or `⌈c/k⌉` members of a label with `c` instances.
//! - **Unlabeled**: shuffle, then cut into contiguous blocks; the first
//!   `n % k` folds take one extra instance.
//!
//! The same `(dataset order, n_folds, seed)` always yields the same folds.
//!
//! ```rust
//! use clusterval::{partition, Dataset, Instance};
//!
//! let data = Dataset::new(
//!     (0..20).map(|i| Instance::numeric(&[i as f64]).with_label(i % 2)).collect(),
//! ).unwrap();
//!
//! let folds = partition(&data, 5, 42).unwrap();
//! assert_eq!(folds.sizes(), vec![4; 5]);
//! assert_eq!(folds, partition(&data, 5, 42).unwrap());
//! ```

use crate::data::Dataset;
use crate::error::{Error, Result};
use rand::prelude::*;
use tracing::debug;

/// Assignment of every instance position to a fold index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folds {
    assignment: Vec<usize>,
    n_folds: usize,
}

impl Folds {
    /// Number of folds.
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Number of partitioned instances.
    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    /// Whether no instances were partitioned.
    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    /// Fold of the instance at `index`.
    pub fn fold_of(&self, index: usize) -> Option<usize> {
        self.assignment.get(index).copied()
    }

    /// Fold index per instance position.
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    /// Positions held out in `fold`, ascending.
    pub fn test_indices(&self, fold: usize) -> Vec<usize> {
        self.positions(|f| f == fold)
    }

    /// Positions used for training when `fold` is held out, ascending.
    pub fn train_indices(&self, fold: usize) -> Vec<usize> {
        self.positions(|f| f != fold)
    }

    /// Instance count per fold.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_folds];
        for &f in &self.assignment {
            sizes[f] += 1;
        }
        sizes
    }

    fn positions(&self, keep: impl Fn(usize) -> bool) -> Vec<usize> {
        self.assignment
            .iter()
            .enumerate()
            .filter(|&(_, &f)| keep(f))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Partition `data` into `n_folds` folds using a generator seeded with `seed`.
pub fn partition(data: &Dataset, n_folds: usize, seed: u64) -> Result<Folds> {
    let mut rng = StdRng::seed_from_u64(seed);
    partition_with_rng(data, n_folds, &mut rng)
}

/// Partition `data` into `n_folds` folds, drawing randomness from `rng`.
///
/// Fails with [`Error::InvalidPartitionRequest`] when `n_folds < 2` or
/// `n_folds > data.len()`.
pub fn partition_with_rng<R: Rng + ?Sized>(
    data: &Dataset,
    n_folds: usize,
    rng: &mut R,
) -> Result<Folds> {
    let n = data.len();
    if n_folds < 2 || n_folds > n {
        return Err(Error::InvalidPartitionRequest {
            n_folds,
            n_instances: n,
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut assignment = vec![0usize; n];
    let stratified = data.has_labels();

    if stratified {
        // Stable: keeps the shuffled order within each label.
        order.sort_by_key(|&i| data.label_of(i));
        for (pos, &i) in order.iter().enumerate() {
            assignment[i] = pos % n_folds;
        }
    } else {
        let base = n / n_folds;
        let extra = n % n_folds;
        let mut start = 0;
        for fold in 0..n_folds {
            let size = base + usize::from(fold < extra);
            for &i in &order[start..start + size] {
                assignment[i] = fold;
            }
            start += size;
        }
    }

    debug!(n_instances = n, n_folds, stratified, "partitioned dataset");

    Ok(Folds {
        assignment,
        n_folds,
    })
}

//! Scripted clusterers and dataset builders shared by the unit tests.

use crate::cluster::{Clusterer, DistributionClusterer};
use crate::data::{Dataset, Instance, Value};
use crate::error::{Error, Result};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Training-set sizes seen by every clusterer sharing this log.
#[derive(Debug, Clone, Default)]
pub(crate) struct BuildLog(Rc<RefCell<Vec<usize>>>);

impl BuildLog {
    pub(crate) fn sizes(&self) -> Vec<usize> {
        self.0.borrow().clone()
    }

    fn record(&self, n: usize) {
        self.0.borrow_mut().push(n);
    }
}

#[derive(Debug, Clone)]
enum Weights {
    /// No distribution capability; assign by first attribute modulo `k`.
    Plain { k: usize },
    /// Same vector for every instance; assign to its argmax.
    Fixed(Vec<f64>),
    /// `[x₀, 0, …, 0]` where `x₀` is the first attribute; assign to 0.
    FirstValue { k: usize },
}

/// A clusterer whose every answer is predetermined.
#[derive(Debug, Clone)]
pub(crate) struct Scripted {
    weights: Weights,
    fail_at: Option<usize>,
    fail_build: bool,
    calls: Cell<usize>,
    log: BuildLog,
}

impl Scripted {
    fn with_weights(weights: Weights) -> Self {
        Self {
            weights,
            fail_at: None,
            fail_build: false,
            calls: Cell::new(0),
            log: BuildLog::default(),
        }
    }

    pub(crate) fn plain(k: usize) -> Self {
        Self::with_weights(Weights::Plain { k })
    }

    pub(crate) fn fixed(weights: Vec<f64>) -> Self {
        Self::with_weights(Weights::Fixed(weights))
    }

    pub(crate) fn first_value(k: usize) -> Self {
        Self::with_weights(Weights::FirstValue { k })
    }

    /// Fail on the `n`-th (zero-based) call to `assign`.
    pub(crate) fn failing_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    pub(crate) fn failing_build(mut self) -> Self {
        self.fail_build = true;
        self
    }

    pub(crate) fn with_log(mut self, log: BuildLog) -> Self {
        self.log = log;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }
}

fn first_value(instance: &Instance) -> f64 {
    match instance.values().first() {
        Some(Value::Numeric(x)) => *x,
        Some(Value::Nominal(v)) => f64::from(*v),
        None => 0.0,
    }
}

impl Clusterer for Scripted {
    fn build(&mut self, data: &Dataset) -> Result<()> {
        if self.fail_build {
            return Err(Error::Other("scripted build failure".into()));
        }
        self.log.record(data.len());
        Ok(())
    }

    fn assign(&self, instance: &Instance) -> Result<usize> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if self.fail_at == Some(call) {
            return Err(Error::Other(format!("scripted failure at call {call}")));
        }
        Ok(match &self.weights {
            Weights::Plain { k } => first_value(instance).abs() as usize % k,
            Weights::Fixed(w) => w
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (i, &v)| {
                    if v > best.1 {
                        (i, v)
                    } else {
                        best
                    }
                })
                .0,
            Weights::FirstValue { .. } => 0,
        })
    }

    fn n_clusters(&self) -> usize {
        match &self.weights {
            Weights::Plain { k } | Weights::FirstValue { k } => *k,
            Weights::Fixed(w) => w.len(),
        }
    }

    fn as_distribution(&self) -> Option<&dyn DistributionClusterer> {
        match self.weights {
            Weights::Plain { .. } => None,
            _ => Some(self),
        }
    }
}

impl DistributionClusterer for Scripted {
    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>> {
        match &self.weights {
            Weights::Plain { .. } => Err(Error::Other("no distribution".into())),
            Weights::Fixed(w) => Ok(w.clone()),
            Weights::FirstValue { k } => {
                let mut w = vec![0.0; *k];
                w[0] = first_value(instance);
                Ok(w)
            }
        }
    }
}

/// `n` one-attribute instances with values `0..n`, labeled `i % n_labels`.
pub(crate) fn labeled_dataset(n: usize, n_labels: u32) -> Dataset {
    Dataset::new(
        (0..n)
            .map(|i| Instance::numeric(&[i as f64]).with_label(i as u32 % n_labels))
            .collect(),
    )
    .expect("uniform arity")
}

/// One-attribute unlabeled instances with the given values.
pub(crate) fn values_dataset(values: &[f64]) -> Dataset {
    Dataset::new(values.iter().map(|&v| Instance::numeric(&[v])).collect())
        .expect("uniform arity")
}

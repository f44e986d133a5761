//! Instances, materialized datasets and forward-only instance streams.
//!
//! Two access modes are supported:
//!
//! - [`Dataset`]: random access over an in-memory table. Fold partitioning
//!   and model building need this.
//! - [`InstanceStream`]: forward-only, single pass over any iterator of
//!   `Result<T>` where `T: Borrow<Instance>`. Scoring only ever needs this,
//!   so it runs over sources larger than memory.
//!
//! Parsing a file format into instances is left to the caller: any reader
//! that yields `Result<Instance>` one record at a time plugs straight into
//! [`InstanceStream::new`].

use crate::error::{Error, Result};
use std::borrow::Borrow;
use std::iter::Peekable;

/// A single attribute value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Real-valued attribute.
    Numeric(f64),
    /// Index into a nominal attribute's value list.
    Nominal(u32),
}

impl Value {
    /// Numeric payload, if this is a numeric value.
    pub fn as_numeric(&self) -> Option<f64> {
        match *self {
            Value::Numeric(x) => Some(x),
            Value::Nominal(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Numeric(x)
    }
}

/// One data record: attribute values plus an optional grouping label.
///
/// The label is only used to stratify folds. Clusterers never see it through
/// this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    values: Vec<Value>,
    label: Option<u32>,
}

impl Instance {
    /// Create an unlabeled instance.
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            label: None,
        }
    }

    /// Create an unlabeled instance from numeric values.
    pub fn numeric(values: &[f64]) -> Self {
        Self::new(values.iter().copied().map(Value::Numeric).collect())
    }

    /// Set the grouping label.
    pub fn with_label(mut self, label: u32) -> Self {
        self.label = Some(label);
        self
    }

    /// Attribute values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the instance has no attributes.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Grouping label, if any.
    pub fn label(&self) -> Option<u32> {
        self.label
    }

    /// All values as `f64`, failing on the first nominal attribute.
    pub fn to_numeric(&self) -> Result<Vec<f64>> {
        self.values
            .iter()
            .enumerate()
            .map(|(index, v)| v.as_numeric().ok_or(Error::NonNumericAttribute { index }))
            .collect()
    }
}

/// A materialized collection of instances sharing one attribute schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    instances: Vec<Instance>,
}

impl Dataset {
    /// Build a dataset, checking that every instance has the same arity.
    pub fn new(instances: Vec<Instance>) -> Result<Self> {
        if let Some(first) = instances.first() {
            let d = first.len();
            for inst in &instances {
                if inst.len() != d {
                    return Err(Error::DimensionMismatch {
                        expected: d,
                        found: inst.len(),
                    });
                }
            }
        }
        Ok(Self { instances })
    }

    /// Build an unlabeled dataset from numeric rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        Self::new(rows.iter().map(|r| Instance::numeric(r)).collect())
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Number of attributes (0 for an empty dataset).
    pub fn n_attributes(&self) -> usize {
        self.instances.first().map_or(0, Instance::len)
    }

    /// Instance at `index`.
    pub fn instance_at(&self, index: usize) -> Option<&Instance> {
        self.instances.get(index)
    }

    /// Label of the instance at `index`.
    pub fn label_of(&self, index: usize) -> Option<u32> {
        self.instances.get(index).and_then(Instance::label)
    }

    /// Whether any instance carries a label.
    pub fn has_labels(&self) -> bool {
        self.instances.iter().any(|i| i.label.is_some())
    }

    /// Iterate over instances in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Instance> {
        self.instances.iter()
    }

    /// Copy the instances at `indices` into a new dataset.
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        let instances = indices
            .iter()
            .map(|&i| self.get_checked(i).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { instances })
    }

    /// Borrowing stream over every instance.
    pub fn stream(&self) -> InstanceStream<impl Iterator<Item = Result<&Instance>> + '_> {
        InstanceStream::new(self.instances.iter().map(Ok))
    }

    /// Borrowing stream over the instances at `indices`, in that order.
    pub fn stream_indices<'a>(
        &'a self,
        indices: &'a [usize],
    ) -> InstanceStream<impl Iterator<Item = Result<&'a Instance>> + 'a> {
        InstanceStream::new(indices.iter().map(move |&i| self.get_checked(i)))
    }

    fn get_checked(&self, index: usize) -> Result<&Instance> {
        self.instances.get(index).ok_or_else(|| {
            Error::Other(format!(
                "instance index {index} out of bounds for dataset of {}",
                self.instances.len()
            ))
        })
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Instance;
    type IntoIter = std::slice::Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.iter()
    }
}

/// Forward-only, single-pass sequence of instances.
///
/// Holds at most one look-ahead item. Once consumed, a stream cannot be
/// rewound; scoring the same data again needs a fresh stream.
pub struct InstanceStream<I: Iterator> {
    inner: Peekable<I>,
    position: usize,
}

impl<I, T> InstanceStream<I>
where
    I: Iterator<Item = Result<T>>,
    T: Borrow<Instance>,
{
    /// Wrap an iterator of instances (or read errors).
    pub fn new(source: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            inner: source.into_iter().peekable(),
            position: 0,
        }
    }

    /// Whether another item is available.
    pub fn has_next(&mut self) -> bool {
        self.inner.peek().is_some()
    }

    /// Take the next instance.
    ///
    /// Fails with [`Error::StreamExhausted`] past the end, or with whatever
    /// error the underlying source produced for this item.
    pub fn pull(&mut self) -> Result<T> {
        match self.inner.next() {
            Some(item) => {
                self.position += 1;
                item
            }
            None => Err(Error::StreamExhausted {
                position: self.position,
            }),
        }
    }

    /// Number of items consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<I, T> Iterator for InstanceStream<I>
where
    I: Iterator<Item = Result<T>>,
    T: Borrow<Instance>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            Some(self.pull())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(n: usize) -> Dataset {
        Dataset::new(
            (0..n)
                .map(|i| Instance::numeric(&[i as f64]).with_label((i % 3) as u32))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_dataset_rejects_mixed_arity() {
        let result = Dataset::from_rows(&[vec![0.0, 1.0], vec![2.0]]);
        assert_eq!(
            result,
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_random_access() {
        let data = labeled(5);
        assert_eq!(data.len(), 5);
        assert_eq!(data.n_attributes(), 1);
        assert_eq!(data.label_of(4), Some(1));
        assert_eq!(data.instance_at(2).unwrap().values(), &[Value::Numeric(2.0)]);
        assert!(data.instance_at(5).is_none());
        assert!(data.has_labels());
    }

    #[test]
    fn test_subset_preserves_order() {
        let data = labeled(6);
        let sub = data.subset(&[4, 1]).unwrap();
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.instance_at(0), data.instance_at(4));
        assert_eq!(sub.instance_at(1), data.instance_at(1));
        assert!(data.subset(&[6]).is_err());
    }

    #[test]
    fn test_to_numeric_rejects_nominal() {
        let inst = Instance::new(vec![Value::Numeric(1.0), Value::Nominal(2)]);
        assert_eq!(
            inst.to_numeric(),
            Err(Error::NonNumericAttribute { index: 1 })
        );
    }

    #[test]
    fn test_stream_pull_past_end() {
        let data = labeled(2);
        let mut stream = data.stream();
        assert!(stream.has_next());
        assert!(stream.pull().is_ok());
        assert!(stream.pull().is_ok());
        assert!(!stream.has_next());
        assert_eq!(stream.position(), 2);
        assert_eq!(
            stream.pull().map(|_| ()),
            Err(Error::StreamExhausted { position: 2 })
        );
    }

    #[test]
    fn test_stream_passes_source_errors() {
        let items = vec![
            Ok(Instance::numeric(&[1.0])),
            Err(Error::Other("bad record".into())),
        ];
        let mut stream = InstanceStream::new(items);
        assert!(stream.pull().is_ok());
        assert_eq!(stream.pull(), Err(Error::Other("bad record".into())));
        assert_eq!(stream.position(), 2);
    }

    #[test]
    fn test_stream_indices_is_lazy_iterator() {
        let data = labeled(4);
        let idx = [3, 0];
        let got: Vec<u32> = data
            .stream_indices(&idx)
            .map(|r| r.unwrap().label().unwrap())
            .collect();
        assert_eq!(got, vec![0, 0]);
    }
}

use core::fmt;

/// Result alias for `clusterval`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by partitioning, scoring, cross-validation and the bundled clusterers.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Attribute count mismatch between instances.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// A numeric-only clusterer met a nominal attribute.
    NonNumericAttribute {
        /// Attribute index.
        index: usize,
    },

    /// Fold count is below 2 or exceeds the number of instances.
    InvalidPartitionRequest {
        /// Requested fold count.
        n_folds: usize,
        /// Number of instances available.
        n_instances: usize,
    },

    /// The clusterer lacks the distribution capability.
    UnsupportedClustererKind {
        /// Type name of the offending clusterer.
        clusterer: &'static str,
    },

    /// The clusterer failed on a specific instance during a scoring pass.
    ClusterAssignment {
        /// Cross-validation fold, when raised inside one.
        fold: Option<usize>,
        /// Zero-based position of the instance in the scored sequence.
        position: usize,
        /// Underlying failure.
        source: Box<Error>,
    },

    /// A clusterer returned a cluster index outside `[0, n_clusters)`.
    ClusterIndexOutOfRange {
        /// Returned index.
        index: usize,
        /// Number of clusters the model reports.
        n_clusters: usize,
    },

    /// A distribution vector had the wrong length.
    DistributionLength {
        /// Number of clusters the model reports.
        expected: usize,
        /// Length of the returned vector.
        found: usize,
    },

    /// Building a clusterer failed.
    BuildFailed {
        /// Cross-validation fold, when raised inside one.
        fold: Option<usize>,
        /// Underlying failure.
        source: Box<Error>,
    },

    /// A clusterer was used before being built.
    NotBuilt,

    /// More instances were pulled than the stream contains.
    StreamExhausted {
        /// Number of instances already consumed.
        position: usize,
    },

    /// Generic error with message.
    Other(String),
}

impl Error {
    /// Attach a fold index to fold-scoped failures.
    ///
    /// Other variants pass through unchanged.
    pub fn in_fold(self, fold: usize) -> Self {
        match self {
            Error::ClusterAssignment {
                position, source, ..
            } => Error::ClusterAssignment {
                fold: Some(fold),
                position,
                source,
            },
            Error::BuildFailed { source, .. } => Error::BuildFailed {
                fold: Some(fold),
                source,
            },
            other => other,
        }
    }

    /// Fold index carried by this error, if any.
    pub fn fold(&self) -> Option<usize> {
        match self {
            Error::ClusterAssignment { fold, .. } | Error::BuildFailed { fold, .. } => *fold,
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::NonNumericAttribute { index } => {
                write!(f, "attribute {index} is nominal; a numeric value is required")
            }
            Error::InvalidPartitionRequest {
                n_folds,
                n_instances,
            } => write!(
                f,
                "cannot split {n_instances} instances into {n_folds} folds"
            ),
            Error::UnsupportedClustererKind { clusterer } => {
                write!(f, "{clusterer} must be a distribution clusterer")
            }
            Error::ClusterAssignment {
                fold,
                position,
                source,
            } => {
                write!(f, "unable to cluster instance {position}")?;
                if let Some(fold) = fold {
                    write!(f, " in fold {fold}")?;
                }
                write!(f, ": {source}")
            }
            Error::ClusterIndexOutOfRange { index, n_clusters } => {
                write!(f, "cluster index {index} out of range for {n_clusters} clusters")
            }
            Error::DistributionLength { expected, found } => {
                write!(f, "distribution has {found} entries, expected {expected}")
            }
            Error::BuildFailed { fold, source } => {
                write!(f, "building clusterer failed")?;
                if let Some(fold) = fold {
                    write!(f, " in fold {fold}")?;
                }
                write!(f, ": {source}")
            }
            Error::NotBuilt => write!(f, "clusterer has not been built"),
            Error::StreamExhausted { position } => {
                write!(f, "instance stream exhausted after {position} instances")
            }
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ClusterAssignment { source, .. } | Error::BuildFailed { source, .. } => {
                Some(source.as_ref())
            }
            _ => None,
        }
    }
}

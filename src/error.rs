use thiserror::Error;

/// Simplified `Result` using [`RecommendError`](crate::RecommendError) as error type
pub type Result<T> = std::result::Result<T, RecommendError>;

/// Error variants from hyperparameter construction, model estimation and the
/// storage collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecommendError {
    #[error("invalid learning rate {0}")]
    InvalidLearningRate(f32),
    #[error("invalid regularization {0}")]
    InvalidRegularization(f32),
    #[error("invalid number of factors {0}")]
    InvalidFactors(usize),
    #[error("invalid number of epochs {0}")]
    InvalidEpochs(usize),
    #[error("invalid neighborhood size k={k}, min_k={min_k}")]
    InvalidNeighbors { k: usize, min_k: usize },
    #[error("invalid shrinkage {0}")]
    InvalidShrinkage(f32),
    #[error("invalid initialization range [{0}, {1})")]
    InvalidInitRange(f32, f32),
    #[error("invalid initialization mean {0}")]
    InvalidInitMean(f32),
    #[error("invalid initialization standard deviation {0}")]
    InvalidInitStdDev(f32),
    #[error("invalid confidence weight {0}")]
    InvalidAlpha(f32),
    #[error("invalid number of clusters ({users} user, {items} item)")]
    InvalidClusters { users: usize, items: usize },
    #[error("invalid tolerance {0}")]
    InvalidTolerance(f32),
    #[error("invalid number of folds {0}")]
    InvalidFolds(usize),
    #[error("invalid test ratio {0}")]
    InvalidTestRatio(f32),
    #[error("invalid cutoff {0}")]
    InvalidCutoff(usize),
    #[error("{folds} folds requested on a dataset of {ratings} ratings")]
    NotEnoughRatings { folds: usize, ratings: usize },
    #[error("cannot fit a model on an empty dataset")]
    EmptyDataset,

    /// A learned parameter became NaN or infinite.
    #[error("{model} diverged at epoch {epoch}: non-finite parameters")]
    Diverged { model: &'static str, epoch: usize },
    #[error("no convergence after {epochs} epochs")]
    NotConverged { epochs: usize },
    #[error("singular linear system while solving for {0}")]
    SingularSystem(&'static str),

    #[error("{operation} is not supported by {model}")]
    Unsupported {
        operation: &'static str,
        model: &'static str,
    },

    #[error("missing metadata entry {0:?}")]
    MissingMeta(String),
    #[error("line {line}: {message}")]
    Ingest { line: u64, message: String },
    #[error("i/o error: {0}")]
    Io(String),
}

impl RecommendError {
    /// Whether the error was raised by hyper-parameter or splitter validation,
    /// before any training work started.
    pub fn is_configuration_error(&self) -> bool {
        use RecommendError::*;
        matches!(
            self,
            InvalidLearningRate(_)
                | InvalidRegularization(_)
                | InvalidFactors(_)
                | InvalidEpochs(_)
                | InvalidNeighbors { .. }
                | InvalidShrinkage(_)
                | InvalidInitRange(..)
                | InvalidInitMean(_)
                | InvalidInitStdDev(_)
                | InvalidAlpha(_)
                | InvalidClusters { .. }
                | InvalidTolerance(_)
                | InvalidFolds(_)
                | InvalidTestRatio(_)
                | InvalidCutoff(_)
                | NotEnoughRatings { .. }
                | EmptyDataset
        )
    }

    /// Whether the error aborted a model fit.
    pub fn is_fit_error(&self) -> bool {
        matches!(
            self,
            RecommendError::Diverged { .. }
                | RecommendError::NotConverged { .. }
                | RecommendError::SingularSystem(_)
        )
    }
}

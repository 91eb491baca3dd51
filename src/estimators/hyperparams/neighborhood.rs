use super::{check_count, check_non_negative, BaselineParams, BaselineValidParams, KnnMode};
use crate::error::{RecommendError, Result};
use crate::estimators::param_guard::ParamGuard;
use crate::similarity::Similarity;
use crate::Float;

/// A verified hyperparameter set ready for the fitting of a neighborhood model
#[derive(Debug, Clone, PartialEq)]
pub struct KnnValidParams<F> {
    mode: KnnMode,
    similarity: Similarity,
    user_based: bool,
    k: usize,
    min_k: usize,
    shrinkage: F,
    baseline: BaselineParams<F>,
    verbose: bool,
}

impl<F: Float> KnnValidParams<F> {
    pub fn mode(&self) -> KnnMode {
        self.mode
    }

    pub fn similarity(&self) -> Similarity {
        self.similarity
    }

    pub fn user_based(&self) -> bool {
        self.user_based
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn min_k(&self) -> usize {
        self.min_k
    }

    pub fn shrinkage(&self) -> F {
        self.shrinkage
    }

    /// The checked baseline parameters, used in [`KnnMode::Baseline`] only.
    pub fn baseline(&self) -> Result<&BaselineValidParams<F>> {
        self.baseline.check_ref()
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// A hyper-parameter set during construction
///
/// The neighborhood model predicts `r_ui` from the ratings of the `k` users
/// most similar to `u` that rated `i` (user-based), or from the ratings of
/// `u` on the `k` items most similar to `i` (item-based).
#[derive(Debug, Clone, PartialEq)]
pub struct KnnParams<F>(KnnValidParams<F>);

impl<F: Float> Default for KnnParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit a neighborhood model
impl<F: Float> KnnParams<F> {
    /// Create default neighborhood hyper parameters
    pub fn new() -> KnnParams<F> {
        Self(KnnValidParams {
            mode: KnnMode::Basic,
            similarity: Similarity::Msd,
            user_based: true,
            k: 40,
            min_k: 1,
            shrinkage: F::zero(),
            baseline: BaselineParams::new(),
            verbose: false,
        })
    }

    /// Set the aggregation of the neighbor ratings.
    /// Defaults to [`KnnMode::Basic`] if not set.
    pub fn mode(mut self, mode: KnnMode) -> Self {
        self.0.mode = mode;
        self
    }

    /// Set the similarity measure between neighbors.
    /// Defaults to [`Similarity::Msd`] if not set.
    pub fn similarity(mut self, similarity: Similarity) -> Self {
        self.0.similarity = similarity;
        self
    }

    /// Compare users (`true`) or items (`false`).
    /// Defaults to `true` if not set.
    pub fn user_based(mut self, user_based: bool) -> Self {
        self.0.user_based = user_based;
        self
    }

    /// Set the maximum number of neighbors taken into account.
    /// Defaults to `40` if not set.
    pub fn k(mut self, k: usize) -> Self {
        self.0.k = k;
        self
    }

    /// Set the minimum number of qualifying neighbors below which the model
    /// falls back to its default estimate.
    /// Defaults to `1` if not set.
    pub fn min_k(mut self, min_k: usize) -> Self {
        self.0.min_k = min_k;
        self
    }

    /// Set the shrinkage constant applied to the raw similarities.
    /// Defaults to `0` if not set.
    pub fn shrinkage(mut self, shrinkage: F) -> Self {
        self.0.shrinkage = shrinkage;
        self
    }

    /// Set the parameters of the baseline fitted in [`KnnMode::Baseline`].
    /// Defaults to [`BaselineParams::new`] if not set.
    pub fn baseline(mut self, baseline: BaselineParams<F>) -> Self {
        self.0.baseline = baseline;
        self
    }

    /// Sets the verbosity level of the solver.
    /// Defaults to `false` if not set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for KnnParams<F> {
    type Checked = KnnValidParams<F>;
    type Error = RecommendError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.k == 0 || self.0.min_k > self.0.k {
            return Err(RecommendError::InvalidNeighbors {
                k: self.0.k,
                min_k: self.0.min_k,
            });
        }
        check_non_negative(self.0.shrinkage, RecommendError::InvalidShrinkage)?;
        if self.0.mode == KnnMode::Baseline {
            self.0.baseline.check_ref()?;
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the fitting of a SlopeOne model
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlopeOneValidParams {
    verbose: bool,
}

impl SlopeOneValidParams {
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// A hyper-parameter set during construction
///
/// Weighted SlopeOne has no tunable parameter besides its verbosity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlopeOneParams(SlopeOneValidParams);

impl SlopeOneParams {
    pub fn new() -> SlopeOneParams {
        Self::default()
    }

    /// Defaults to `false` if not set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl ParamGuard for SlopeOneParams {
    type Checked = SlopeOneValidParams;
    type Error = RecommendError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the fitting of a co-clustering
/// model
#[derive(Debug, Clone, PartialEq)]
pub struct CoClusteringValidParams {
    n_user_clusters: usize,
    n_item_clusters: usize,
    n_epochs: usize,
    seed: u64,
    verbose: bool,
}

impl CoClusteringValidParams {
    pub fn n_user_clusters(&self) -> usize {
        self.n_user_clusters
    }

    pub fn n_item_clusters(&self) -> usize {
        self.n_item_clusters
    }

    pub fn n_epochs(&self) -> usize {
        self.n_epochs
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// A hyper-parameter set during construction
///
/// Co-clustering assigns every user to one of `n_user_clusters` and every item
/// to one of `n_item_clusters`, and predicts
/// ```ignore
/// r_ui = C_ui + (mu_u - C_u) + (mu_i - C_i)
/// ```
/// where `C_ui` is the mean of the co-cluster of `(u, i)`, `C_u` and `C_i` the
/// means of the user and item clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct CoClusteringParams(CoClusteringValidParams);

impl Default for CoClusteringParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit a co-clustering model
impl CoClusteringParams {
    /// Create default co-clustering hyper parameters
    pub fn new() -> CoClusteringParams {
        Self(CoClusteringValidParams {
            n_user_clusters: 3,
            n_item_clusters: 3,
            n_epochs: 20,
            seed: 0,
            verbose: false,
        })
    }

    /// Set the number of user clusters.
    /// Defaults to `3` if not set.
    pub fn n_user_clusters(mut self, n_user_clusters: usize) -> Self {
        self.0.n_user_clusters = n_user_clusters;
        self
    }

    /// Set the number of item clusters.
    /// Defaults to `3` if not set.
    pub fn n_item_clusters(mut self, n_item_clusters: usize) -> Self {
        self.0.n_item_clusters = n_item_clusters;
        self
    }

    /// Set the number of relocation passes.
    /// Defaults to `20` if not set.
    pub fn n_epochs(mut self, n_epochs: usize) -> Self {
        self.0.n_epochs = n_epochs;
        self
    }

    /// Set the seed of the initial random assignment.
    /// Defaults to `0` if not set.
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }

    /// Defaults to `false` if not set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl ParamGuard for CoClusteringParams {
    type Checked = CoClusteringValidParams;
    type Error = RecommendError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.n_user_clusters == 0 || self.0.n_item_clusters == 0 {
            return Err(RecommendError::InvalidClusters {
                users: self.0.n_user_clusters,
                items: self.0.n_item_clusters,
            });
        }
        check_count(self.0.n_epochs, RecommendError::InvalidEpochs)?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the fitting of an item popularity
/// model
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemPopValidParams {
    verbose: bool,
}

impl ItemPopValidParams {
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemPopParams(ItemPopValidParams);

impl ItemPopParams {
    pub fn new() -> ItemPopParams {
        Self::default()
    }

    /// Defaults to `false` if not set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl ParamGuard for ItemPopParams {
    type Checked = ItemPopValidParams;
    type Error = RecommendError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        Ok(self.0)
    }
}

use super::{
    check_count, check_finite, check_init_range, check_non_negative, check_positive, Optimizer,
};
use crate::error::{RecommendError, Result};
use crate::estimators::param_guard::ParamGuard;
use crate::Float;

/// A verified hyperparameter set ready for the fitting of a baseline model
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineValidParams<F> {
    reg_user: F,
    reg_item: F,
    max_epochs: usize,
    tolerance: F,
    require_convergence: bool,
    verbose: bool,
}

impl<F: Float> BaselineValidParams<F> {
    pub fn reg_user(&self) -> F {
        self.reg_user
    }

    pub fn reg_item(&self) -> F {
        self.reg_item
    }

    pub fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    pub fn require_convergence(&self) -> bool {
        self.require_convergence
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// A hyper-parameter set during construction
///
/// Configures the alternating least squares estimation of the biases of
/// ```ignore
/// r_ui = mu + b_u + b_i
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineParams<F>(BaselineValidParams<F>);

impl<F: Float> Default for BaselineParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit a baseline model
impl<F: Float> BaselineParams<F> {
    /// Create default baseline hyper parameters
    pub fn new() -> BaselineParams<F> {
        Self(BaselineValidParams {
            reg_user: F::cast(15),
            reg_item: F::cast(10),
            max_epochs: 10,
            tolerance: F::cast(1e-6),
            require_convergence: false,
            verbose: false,
        })
    }

    /// Set the regularization of the user biases.
    /// Defaults to `15` if not set.
    pub fn reg_user(mut self, reg_user: F) -> Self {
        self.0.reg_user = reg_user;
        self
    }

    /// Set the regularization of the item biases.
    /// Defaults to `10` if not set.
    pub fn reg_item(mut self, reg_item: F) -> Self {
        self.0.reg_item = reg_item;
        self
    }

    /// Set the maximum number of alternating passes.
    /// Defaults to `10` if not set.
    pub fn max_epochs(mut self, max_epochs: usize) -> Self {
        self.0.max_epochs = max_epochs;
        self
    }

    /// Set the stopping criterion: the largest bias change over a pass.
    /// Defaults to `1e-6` if not set.
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    /// Fail with [`RecommendError::NotConverged`] when the tolerance is not
    /// reached within `max_epochs`.
    /// Defaults to `false` if not set.
    pub fn require_convergence(mut self, require_convergence: bool) -> Self {
        self.0.require_convergence = require_convergence;
        self
    }

    /// Sets the verbosity level of the solver.
    /// Defaults to `false` if not set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for BaselineParams<F> {
    type Checked = BaselineValidParams<F>;
    type Error = RecommendError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked> {
        check_non_negative(self.0.reg_user, RecommendError::InvalidRegularization)?;
        check_non_negative(self.0.reg_item, RecommendError::InvalidRegularization)?;
        check_count(self.0.max_epochs, RecommendError::InvalidEpochs)?;
        check_non_negative(self.0.tolerance, RecommendError::InvalidTolerance)?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the fitting of a SVD model
#[derive(Debug, Clone, PartialEq)]
pub struct SvdValidParams<F> {
    n_factors: usize,
    n_epochs: usize,
    learning_rate: F,
    reg: F,
    init_mean: F,
    init_std: F,
    optimizer: Optimizer,
    shuffle: bool,
    seed: u64,
    verbose: bool,
}

impl<F: Float> SvdValidParams<F> {
    pub fn n_factors(&self) -> usize {
        self.n_factors
    }

    pub fn n_epochs(&self) -> usize {
        self.n_epochs
    }

    pub fn learning_rate(&self) -> F {
        self.learning_rate
    }

    pub fn reg(&self) -> F {
        self.reg
    }

    pub fn init_mean(&self) -> F {
        self.init_mean
    }

    pub fn init_std(&self) -> F {
        self.init_std
    }

    pub fn optimizer(&self) -> Optimizer {
        self.optimizer
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
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
/// With the [`Optimizer::Sgd`] optimizer, minimizes by stochastic gradient
/// descent
/// ```ignore
/// sum_{(u, i) observed} (r_ui - mu - b_u - b_i - p_u . q_i)^2
///     + reg * (b_u^2 + b_i^2 + ||p_u||^2 + ||q_i||^2)
/// ```
/// With [`Optimizer::Bpr`], maximizes the pairwise ranking likelihood of
/// observed over unobserved items instead.
#[derive(Debug, Clone, PartialEq)]
pub struct SvdParams<F>(SvdValidParams<F>);

impl<F: Float> Default for SvdParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit a SVD model
impl<F: Float> SvdParams<F> {
    /// Create default SVD hyper parameters
    pub fn new() -> SvdParams<F> {
        Self(SvdValidParams {
            n_factors: 100,
            n_epochs: 20,
            learning_rate: F::cast(0.005),
            reg: F::cast(0.02),
            init_mean: F::zero(),
            init_std: F::cast(0.1),
            optimizer: Optimizer::Sgd,
            shuffle: false,
            seed: 0,
            verbose: false,
        })
    }

    /// Set the number of latent factors.
    /// Defaults to `100` if not set.
    pub fn n_factors(mut self, n_factors: usize) -> Self {
        self.0.n_factors = n_factors;
        self
    }

    /// Set the number of passes over the training ratings.
    /// Defaults to `20` if not set.
    pub fn n_epochs(mut self, n_epochs: usize) -> Self {
        self.0.n_epochs = n_epochs;
        self
    }

    /// Set the step size of the gradient updates.
    /// Defaults to `0.005` if not set.
    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Set the L2 penalty applied to every learned term.
    /// Defaults to `0.02` if not set.
    pub fn reg(mut self, reg: F) -> Self {
        self.0.reg = reg;
        self
    }

    /// Set the mean of the normal distribution the factors are drawn from.
    /// Defaults to `0` if not set.
    pub fn init_mean(mut self, init_mean: F) -> Self {
        self.0.init_mean = init_mean;
        self
    }

    /// Set the standard deviation of the normal distribution the factors are
    /// drawn from.
    /// Defaults to `0.1` if not set.
    pub fn init_std(mut self, init_std: F) -> Self {
        self.0.init_std = init_std;
        self
    }

    /// Set the training objective.
    /// Defaults to [`Optimizer::Sgd`] if not set.
    pub fn optimizer(mut self, optimizer: Optimizer) -> Self {
        self.0.optimizer = optimizer;
        self
    }

    /// Visit the training ratings in a random order at every epoch.
    /// Defaults to `false` if not set.
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.0.shuffle = shuffle;
        self
    }

    /// Set the seed of the random number generator.
    /// Defaults to `0` if not set.
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }

    /// Sets the verbosity level of the solver.
    /// Defaults to `false` if not set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for SvdParams<F> {
    type Checked = SvdValidParams<F>;
    type Error = RecommendError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked> {
        check_count(self.0.n_factors, RecommendError::InvalidFactors)?;
        check_count(self.0.n_epochs, RecommendError::InvalidEpochs)?;
        check_positive(self.0.learning_rate, RecommendError::InvalidLearningRate)?;
        check_non_negative(self.0.reg, RecommendError::InvalidRegularization)?;
        check_finite(self.0.init_mean, RecommendError::InvalidInitMean)?;
        check_non_negative(self.0.init_std, RecommendError::InvalidInitStdDev)?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the fitting of a SVD++ model
#[derive(Debug, Clone, PartialEq)]
pub struct SvdppValidParams<F> {
    n_factors: usize,
    n_epochs: usize,
    learning_rate: F,
    reg: F,
    init_mean: F,
    init_std: F,
    seed: u64,
    verbose: bool,
}

impl<F: Float> SvdppValidParams<F> {
    pub fn n_factors(&self) -> usize {
        self.n_factors
    }

    pub fn n_epochs(&self) -> usize {
        self.n_epochs
    }

    pub fn learning_rate(&self) -> F {
        self.learning_rate
    }

    pub fn reg(&self) -> F {
        self.reg
    }

    pub fn init_mean(&self) -> F {
        self.init_mean
    }

    pub fn init_std(&self) -> F {
        self.init_std
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
/// SVD++ adds the implicit feedback of every rated item to the user factor:
/// ```ignore
/// r_ui = mu + b_u + b_i + q_i . (p_u + |N(u)|^-1/2 * sum_{j in N(u)} y_j)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SvdppParams<F>(SvdppValidParams<F>);

impl<F: Float> Default for SvdppParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit a SVD++ model
impl<F: Float> SvdppParams<F> {
    /// Create default SVD++ hyper parameters
    pub fn new() -> SvdppParams<F> {
        Self(SvdppValidParams {
            n_factors: 20,
            n_epochs: 20,
            learning_rate: F::cast(0.007),
            reg: F::cast(0.02),
            init_mean: F::zero(),
            init_std: F::cast(0.1),
            seed: 0,
            verbose: false,
        })
    }

    /// Set the number of latent factors.
    /// Defaults to `20` if not set.
    pub fn n_factors(mut self, n_factors: usize) -> Self {
        self.0.n_factors = n_factors;
        self
    }

    /// Set the number of passes over the training ratings.
    /// Defaults to `20` if not set.
    pub fn n_epochs(mut self, n_epochs: usize) -> Self {
        self.0.n_epochs = n_epochs;
        self
    }

    /// Set the step size of the gradient updates.
    /// Defaults to `0.007` if not set.
    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Set the L2 penalty applied to every learned term.
    /// Defaults to `0.02` if not set.
    pub fn reg(mut self, reg: F) -> Self {
        self.0.reg = reg;
        self
    }

    /// Defaults to `0` if not set.
    pub fn init_mean(mut self, init_mean: F) -> Self {
        self.0.init_mean = init_mean;
        self
    }

    /// Defaults to `0.1` if not set.
    pub fn init_std(mut self, init_std: F) -> Self {
        self.0.init_std = init_std;
        self
    }

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

impl<F: Float> ParamGuard for SvdppParams<F> {
    type Checked = SvdppValidParams<F>;
    type Error = RecommendError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked> {
        check_count(self.0.n_factors, RecommendError::InvalidFactors)?;
        check_count(self.0.n_epochs, RecommendError::InvalidEpochs)?;
        check_positive(self.0.learning_rate, RecommendError::InvalidLearningRate)?;
        check_non_negative(self.0.reg, RecommendError::InvalidRegularization)?;
        check_finite(self.0.init_mean, RecommendError::InvalidInitMean)?;
        check_non_negative(self.0.init_std, RecommendError::InvalidInitStdDev)?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the fitting of a NMF model
#[derive(Debug, Clone, PartialEq)]
pub struct NmfValidParams<F> {
    n_factors: usize,
    n_epochs: usize,
    reg: F,
    init_low: F,
    init_high: F,
    seed: u64,
    verbose: bool,
}

impl<F: Float> NmfValidParams<F> {
    pub fn n_factors(&self) -> usize {
        self.n_factors
    }

    pub fn n_epochs(&self) -> usize {
        self.n_epochs
    }

    pub fn reg(&self) -> F {
        self.reg
    }

    pub fn init_low(&self) -> F {
        self.init_low
    }

    pub fn init_high(&self) -> F {
        self.init_high
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
/// Non-negative matrix factorization `r_ui = p_u . q_i` with `p_u, q_i >= 0`,
/// trained by regularized multiplicative updates.
#[derive(Debug, Clone, PartialEq)]
pub struct NmfParams<F>(NmfValidParams<F>);

impl<F: Float> Default for NmfParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit a NMF model
impl<F: Float> NmfParams<F> {
    /// Create default NMF hyper parameters
    pub fn new() -> NmfParams<F> {
        Self(NmfValidParams {
            n_factors: 15,
            n_epochs: 50,
            reg: F::cast(0.06),
            init_low: F::zero(),
            init_high: F::one(),
            seed: 0,
            verbose: false,
        })
    }

    /// Set the number of latent factors.
    /// Defaults to `15` if not set.
    pub fn n_factors(mut self, n_factors: usize) -> Self {
        self.0.n_factors = n_factors;
        self
    }

    /// Set the number of multiplicative update passes.
    /// Defaults to `50` if not set.
    pub fn n_epochs(mut self, n_epochs: usize) -> Self {
        self.0.n_epochs = n_epochs;
        self
    }

    /// Set the L2 penalty of both factor matrices.
    /// Defaults to `0.06` if not set.
    pub fn reg(mut self, reg: F) -> Self {
        self.0.reg = reg;
        self
    }

    /// Set the lower bound of the uniform initialization.
    /// Defaults to `0` if not set.
    pub fn init_low(mut self, init_low: F) -> Self {
        self.0.init_low = init_low;
        self
    }

    /// Set the (excluded) upper bound of the uniform initialization.
    /// Defaults to `1` if not set.
    pub fn init_high(mut self, init_high: F) -> Self {
        self.0.init_high = init_high;
        self
    }

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

impl<F: Float> ParamGuard for NmfParams<F> {
    type Checked = NmfValidParams<F>;
    type Error = RecommendError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked> {
        check_count(self.0.n_factors, RecommendError::InvalidFactors)?;
        check_count(self.0.n_epochs, RecommendError::InvalidEpochs)?;
        check_non_negative(self.0.reg, RecommendError::InvalidRegularization)?;
        check_init_range(self.0.init_low, self.0.init_high)?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the fitting of a WRMF model
#[derive(Debug, Clone, PartialEq)]
pub struct WrmfValidParams<F> {
    n_factors: usize,
    n_epochs: usize,
    reg: F,
    alpha: F,
    init_mean: F,
    init_std: F,
    seed: u64,
    verbose: bool,
}

impl<F: Float> WrmfValidParams<F> {
    pub fn n_factors(&self) -> usize {
        self.n_factors
    }

    pub fn n_epochs(&self) -> usize {
        self.n_epochs
    }

    pub fn reg(&self) -> F {
        self.reg
    }

    pub fn alpha(&self) -> F {
        self.alpha
    }

    pub fn init_mean(&self) -> F {
        self.init_mean
    }

    pub fn init_std(&self) -> F {
        self.init_std
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
/// Weighted regularized matrix factorization on implicit feedback, minimizing
/// over every `(user, item)` pair
/// ```ignore
/// sum_{u, i} c_ui (p_ui - x_u . y_i)^2 + reg * (||X||^2 + ||Y||^2)
/// ```
/// where `p_ui = 1` and `c_ui = 1 + alpha * r_ui` for observed pairs, and
/// `p_ui = 0`, `c_ui = 1` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct WrmfParams<F>(WrmfValidParams<F>);

impl<F: Float> Default for WrmfParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit a WRMF model
impl<F: Float> WrmfParams<F> {
    /// Create default WRMF hyper parameters
    pub fn new() -> WrmfParams<F> {
        Self(WrmfValidParams {
            n_factors: 15,
            n_epochs: 50,
            reg: F::cast(0.06),
            alpha: F::one(),
            init_mean: F::zero(),
            init_std: F::cast(0.1),
            seed: 0,
            verbose: false,
        })
    }

    /// Set the number of latent factors.
    /// Defaults to `15` if not set.
    pub fn n_factors(mut self, n_factors: usize) -> Self {
        self.0.n_factors = n_factors;
        self
    }

    /// Set the number of alternating passes.
    /// Defaults to `50` if not set.
    pub fn n_epochs(mut self, n_epochs: usize) -> Self {
        self.0.n_epochs = n_epochs;
        self
    }

    /// Set the ridge penalty of the per-entity linear systems.
    /// Defaults to `0.06` if not set.
    pub fn reg(mut self, reg: F) -> Self {
        self.0.reg = reg;
        self
    }

    /// Set the confidence weight of observed pairs.
    /// Defaults to `1` if not set.
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Defaults to `0` if not set.
    pub fn init_mean(mut self, init_mean: F) -> Self {
        self.0.init_mean = init_mean;
        self
    }

    /// Defaults to `0.1` if not set.
    pub fn init_std(mut self, init_std: F) -> Self {
        self.0.init_std = init_std;
        self
    }

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

impl<F: Float> ParamGuard for WrmfParams<F> {
    type Checked = WrmfValidParams<F>;
    type Error = RecommendError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked> {
        check_count(self.0.n_factors, RecommendError::InvalidFactors)?;
        check_count(self.0.n_epochs, RecommendError::InvalidEpochs)?;
        check_non_negative(self.0.reg, RecommendError::InvalidRegularization)?;
        check_non_negative(self.0.alpha, RecommendError::InvalidAlpha)?;
        check_finite(self.0.init_mean, RecommendError::InvalidInitMean)?;
        check_non_negative(self.0.init_std, RecommendError::InvalidInitStdDev)?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

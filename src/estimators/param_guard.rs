use super::traits::Fit;
use crate::datasets::Dataset;
use crate::error::{RecommendError, Result};
use crate::Float;
use std::error::Error;

/// A set of hyperparameters whose values have not been checked for validity. A reference to the
/// checked hyperparameters can only be obtained after checking has completed. If the `Fit` trait
/// has been implemented on the checked hyperparameters, it is also implemented on the unchecked
/// hyperparameters with the checking step done automatically.
///
/// The hyperparameter validation done in `check_ref()` and `check()` should be identical.
pub trait ParamGuard {
    /// The checked hyperparameters
    type Checked;
    /// Error type resulting from failed hyperparameter checking
    type Error: Error;

    /// Checks the hyperparameters and returns a reference to the checked hyperparameters if
    /// successful
    fn check_ref(&self) -> std::result::Result<&Self::Checked, Self::Error>;

    /// Checks the hyperparameters and returns the checked hyperparameters if successful
    fn check(self) -> std::result::Result<Self::Checked, Self::Error>;
}

/// Performs checking step and calls `fit` on the checked hyperparameters. If checking failed, the
/// checking error is converted to [`RecommendError`] and returned before any training work.
impl<F: Float, P: ParamGuard> Fit<F> for P
where
    P::Checked: Fit<F>,
    RecommendError: From<P::Error>,
{
    type Object = <<P as ParamGuard>::Checked as Fit<F>>::Object;

    fn fit(&self, dataset: &Dataset<F>) -> Result<Self::Object> {
        let checked = self.check_ref()?;
        checked.fit(dataset)
    }
}

//! Collaborative filtering over sparse rating matrices.
//!
//! `sparsecf` trains models that predict the rating a user would give to an
//! item, or rank items for a user, from historical `(user, item, rating)`
//! observations, and evaluates them reproducibly by cross-validation.
//!
//! ```no_run
//! use sparsecf::datasets::{Dataset, Rating};
//! use sparsecf::estimators::Svd;
//! use sparsecf::metrics::Evaluator;
//! use sparsecf::model_selection::{cross_validate, KFold};
//!
//! let ratings = vec![
//!     Rating::new(1, 10, 4.), Rating::new(1, 11, 3.), Rating::new(2, 10, 5.),
//!     Rating::new(2, 12, 2.), Rating::new(3, 11, 4.), Rating::new(3, 12, 1.),
//! ];
//! let dataset = Dataset::new(ratings);
//! let params = Svd::<f64>::params().n_factors(4).n_epochs(10);
//!
//! let result = cross_validate(
//!     &params,
//!     &dataset,
//!     &[Evaluator::Rmse, Evaluator::Mae],
//!     &KFold::new(3),
//!     0,
//! )
//! .unwrap();
//! println!("RMSE: {}", result.get("RMSE").unwrap().mean());
//! ```
#![allow(non_snake_case)]

use ndarray::ScalarOperand;

use num_traits::{AsPrimitive, FromPrimitive, NumAssignOps, NumCast, Signed};

use std::cmp::PartialOrd;
use std::fmt;
use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

/// Float point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point
/// number and implement them for 32bit and 64bit float points.
/// Ref: https://github.com/rust-ml/linfa/blob/master/src/dataset/mod.rs#L36
pub trait Float:
    FromPrimitive
    + num_traits::Float
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Signed
    + Sum
    + NumAssignOps
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + num_traits::MulAdd<Output = Self>
    + ScalarOperand
    + approx::AbsDiffEq
{
    /// Casts a primitive number into `Self`.
    ///
    /// Only meant for literals and counts, which every float can represent.
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap_or_else(Self::nan)
    }

    /// Lossy conversion used for error payloads and log fields.
    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl Float for f32 {}

impl Float for f64 {}

/// Raw user identifier, as found in the rating source.
pub type UserId = i64;

/// Raw item identifier, as found in the rating source.
pub type ItemId = i64;

pub mod datasets;
pub mod error;
pub mod estimators;
pub mod helpers;
pub mod ingest;
pub mod metrics;
pub mod model_selection;
pub mod pipeline;
pub mod similarity;
pub mod solvers;
pub mod storage;

pub use error::{RecommendError, Result};

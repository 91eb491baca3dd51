
/// This module contains small numerical helpers shared by the estimators.
pub mod helpers {
    use crate::Float;
    use ndarray::{ArrayBase, Data, Ix1};
    use std::cmp::Ordering;

    /// This is a helper method that sorts the indices of an array based on some
    /// `compare` closure. It is used when ranking candidate items by score.
    /// Reference: `https://github.com/rust-ndarray/ndarray/issues/1145`
    pub fn argsort_by<S, F>(arr: &ArrayBase<S, Ix1>, mut compare: F) -> Vec<usize>
    where
        S: Data,
        F: FnMut(&S::Elem, &S::Elem) -> Ordering,
    {
        let mut indices: Vec<usize> = (0..arr.len()).collect();
        indices.sort_by(move |&i, &j| compare(&arr[i], &arr[j]));
        indices
    }

    /// The logistic function, written to stay finite for large `|x|`.
    pub fn sigmoid<F: Float>(x: F) -> F {
        if x >= F::zero() {
            F::one() / (F::one() + (-x).exp())
        } else {
            let e = x.exp();
            e / (F::one() + e)
        }
    }

    /// Orders two scores descending, treating NaN as the lowest score.
    pub fn descending<F: Float>(a: &F, b: &F) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => b.partial_cmp(a).unwrap_or(Ordering::Equal),
        }
    }
}

/// This module solves the small symmetric positive definite systems that
/// arise in alternating least squares. We made the choice not to use a LAPACK
/// subroutine since the systems are `n_factors x n_factors` and it keeps the
/// crate free of a BLAS backend.
pub mod cholesky {
    use crate::Float;
    use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

    /// Computes the lower triangular `L` such that `A = L L^T`.
    pub fn cholesky_factorization<F: Float>(A: ArrayView2<F>) -> Result<Array2<F>, &'static str> {
        let n = A.nrows();
        if A.ncols() != n {
            return Err("Matrix must be square");
        }
        let mut L = Array2::<F>::zeros((n, n));
        for j in 0..n {
            let mut diag = A[[j, j]];
            for k in 0..j {
                diag -= L[[j, k]] * L[[j, k]];
            }
            if !(diag > F::zero()) {
                return Err("Matrix is not positive definite");
            }
            let l_jj = diag.sqrt();
            L[[j, j]] = l_jj;
            for i in (j + 1)..n {
                let mut s = A[[i, j]];
                for k in 0..j {
                    s -= L[[i, k]] * L[[j, k]];
                }
                L[[i, j]] = s / l_jj;
            }
        }
        Ok(L)
    }

    /// Solves `L y = b` for a lower triangular `L`.
    pub fn forward_substitution<F: Float>(
        L: ArrayView2<F>,
        b: ArrayView1<F>,
    ) -> Result<Array1<F>, &'static str> {
        let n = b.len();
        let mut y = Array1::<F>::zeros(n);
        for i in 0..n {
            if L[[i, i]] == F::zero() {
                return Err("Singular triangular matrix");
            }
            let mut s = b[i];
            for k in 0..i {
                s -= L[[i, k]] * y[k];
            }
            y[i] = s / L[[i, i]];
        }
        Ok(y)
    }

    /// Solves `U x = b` in place for an upper triangular `U`.
    pub fn backward_substitution<F: Float>(
        U: ArrayView2<F>,
        b: &mut Array1<F>,
    ) -> Result<Array1<F>, &'static str> {
        let n = b.len();
        for i in (0..n).rev() {
            if U[[i, i]] == F::zero() {
                return Err("Singular triangular matrix");
            }
            let mut s = b[i];
            for k in (i + 1)..n {
                s -= U[[i, k]] * b[k];
            }
            b[i] = s / U[[i, i]];
        }
        Ok(b.clone())
    }

    /// Solves the symmetric positive definite system `A x = b`.
    pub fn solve_lin_sys_by_cholesky<F: Float>(
        A: ArrayView2<F>,
        b: ArrayView1<F>,
    ) -> Result<Array1<F>, &'static str> {
        let L = cholesky_factorization(A)?;
        let mut y = forward_substitution(L.view(), b)?;
        backward_substitution(L.t(), &mut y)
    }
}

/// This module contains helpers functions to efficiently write tests.
pub mod test_helpers {
    use crate::datasets::{Dataset, Rating};
    use crate::Float;
    use approx::AbsDiffEq;
    use ndarray::{ArrayView1, ArrayView2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    pub fn assert_array_all_close<F>(x: ArrayView1<F>, y: ArrayView1<F>, delta: F)
    where
        F: Float + AbsDiffEq<Epsilon = F>,
    {
        assert_eq!(x.len(), y.len());
        for i in 0..x.len() {
            if x[i].abs_diff_ne(&y[i], delta) {
                panic!("x: {}, y: {} ; with precision level {}", x[i], y[i], delta);
            }
        }
    }

    pub fn assert_array2d_all_close<F>(x: ArrayView2<F>, y: ArrayView2<F>, delta: F)
    where
        F: Float + AbsDiffEq<Epsilon = F>,
    {
        assert_eq!(x.shape()[0], y.shape()[0]);
        assert_eq!(x.shape()[1], y.shape()[1]);
        for i in 0..x.shape()[0] {
            for j in 0..x.shape()[1] {
                if x[[i, j]].abs_diff_ne(&y[[i, j]], delta) {
                    panic!(
                        "x: {}, y: {} ; with precision level {}",
                        x[[i, j]],
                        y[[i, j]],
                        delta
                    );
                }
            }
        }
    }

    /// Generates a 1-to-5 star rating dataset from a random rank-3 model plus
    /// noise. Every user rates at least one item; each other `(user, item)`
    /// pair is observed with probability `density`.
    pub fn generate_random_ratings(
        n_users: usize,
        n_items: usize,
        density: f64,
        seed: u64,
    ) -> Dataset<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0., 1.).unwrap();
        let rank = 3;

        let user_factors: Vec<f64> = (0..n_users * rank).map(|_| normal.sample(&mut rng)).collect();
        let item_factors: Vec<f64> = (0..n_items * rank).map(|_| normal.sample(&mut rng)).collect();

        let mut ratings = Vec::new();
        for u in 0..n_users {
            let forced = rng.gen_range(0..n_items);
            for i in 0..n_items {
                if i != forced && rng.gen::<f64>() >= density {
                    continue;
                }
                let dot: f64 = (0..rank)
                    .map(|f| user_factors[u * rank + f] * item_factors[i * rank + f])
                    .sum();
                let value = (3. + 0.6 * dot + 0.3 * normal.sample(&mut rng))
                    .round()
                    .clamp(1., 5.);
                ratings.push(Rating::new(u as i64 * 7 + 1, i as i64 * 3 + 100, value));
            }
        }
        Dataset::new(ratings)
    }
}

use ndarray::{Array2, ArrayView1};
use tracing::debug;

use crate::Float;

#[cfg(test)]
mod tests;

/// The similarity measures between two sparse rating rows. All of them are
/// computed over co-rated entries only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Similarity {
    /// Cosine of the angle between the two co-rated sub-vectors.
    Cosine,
    /// Cosine between the co-rated entries, each row centered on its own mean
    /// over all of its ratings.
    Pearson,
    /// `1 / (1 + msd)` where `msd` is the mean squared difference of the
    /// co-rated entries.
    Msd,
}

impl Similarity {
    /// Computes the raw similarity of two rows sorted by index, together with
    /// the number of co-rated entries. A zero denominator or an empty overlap
    /// yields a similarity of zero.
    pub fn compute<F: Float>(
        &self,
        a: &[(usize, F)],
        mean_a: F,
        b: &[(usize, F)],
        mean_b: F,
    ) -> (F, usize) {
        let mut overlap = 0;
        let (mut dot, mut norm_a, mut norm_b) = (F::zero(), F::zero(), F::zero());
        for_each_common(a, b, |x, y| {
            overlap += 1;
            match self {
                Similarity::Cosine => {
                    dot += x * y;
                    norm_a += x * x;
                    norm_b += y * y;
                }
                Similarity::Pearson => {
                    let (x, y) = (x - mean_a, y - mean_b);
                    dot += x * y;
                    norm_a += x * x;
                    norm_b += y * y;
                }
                Similarity::Msd => dot += (x - y) * (x - y),
            }
        });
        if overlap == 0 {
            return (F::zero(), 0);
        }
        let sim = match self {
            Similarity::Msd => F::one() / (F::one() + dot / F::cast(overlap)),
            _ => {
                let denom = norm_a.sqrt() * norm_b.sqrt();
                if denom == F::zero() {
                    F::zero()
                } else {
                    dot / denom
                }
            }
        };
        (sim, overlap)
    }
}

/// Calls `f` on the pair of values of every index present in both rows.
/// Both rows must be sorted by index.
pub fn for_each_common<F: Copy>(a: &[(usize, F)], b: &[(usize, F)], mut f: impl FnMut(F, F)) {
    let (mut p, mut q) = (0, 0);
    while p < a.len() && q < b.len() {
        match a[p].0.cmp(&b[q].0) {
            std::cmp::Ordering::Less => p += 1,
            std::cmp::Ordering::Greater => q += 1,
            std::cmp::Ordering::Equal => {
                f(a[p].1, b[q].1);
                p += 1;
                q += 1;
            }
        }
    }
}

/// Discounts a similarity estimated from few co-rated entries:
/// `sim / (1 + shrinkage / overlap)`. Zero overlap gives zero.
pub fn shrink<F: Float>(sim: F, overlap: usize, shrinkage: F) -> F {
    if overlap == 0 {
        return F::zero();
    }
    sim / (F::one() + shrinkage / F::cast(overlap))
}

/// Dense symmetric matrix of shrunk pairwise similarities between all rows of
/// one orientation of the rating matrix, along with their overlap counts.
/// The diagonal is zero: an entity is never its own neighbor.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix<F> {
    values: Array2<F>,
    overlaps: Array2<u32>,
}

impl<F: Float> SimilarityMatrix<F> {
    pub fn compute(
        rows: &[Vec<(usize, F)>],
        means: ArrayView1<F>,
        kind: Similarity,
        shrinkage: F,
    ) -> SimilarityMatrix<F> {
        let n = rows.len();
        let mut values = Array2::<F>::zeros((n, n));
        let mut overlaps = Array2::<u32>::zeros((n, n));
        for a in 0..n {
            for b in (a + 1)..n {
                let (sim, overlap) = kind.compute(&rows[a], means[a], &rows[b], means[b]);
                let sim = shrink(sim, overlap, shrinkage);
                values[[a, b]] = sim;
                values[[b, a]] = sim;
                overlaps[[a, b]] = overlap as u32;
                overlaps[[b, a]] = overlap as u32;
            }
        }
        debug!(entities = n, ?kind, "computed similarity matrix");
        SimilarityMatrix { values, overlaps }
    }

    pub fn get(&self, a: usize, b: usize) -> F {
        self.values[[a, b]]
    }

    pub fn overlap(&self, a: usize, b: usize) -> usize {
        self.overlaps[[a, b]] as usize
    }

    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }
}

use super::*;
use approx::assert_abs_diff_eq;
use ndarray::array;

#[test]
fn test_cosine() {
    let a = vec![(0, 1.), (1, 2.), (3, 3.)];
    let b = vec![(1, 4.), (2, 9.), (3, 6.)];
    let (sim, overlap) = Similarity::Cosine.compute(&a, 0., &b, 0.);
    assert_eq!(overlap, 2);
    // Common entries: (2, 3) and (4, 6) are colinear.
    assert_abs_diff_eq!(sim, 1., epsilon = 1e-12);
}

#[test]
fn test_pearson_uses_full_row_means() {
    let a = vec![(0, 5.), (1, 3.), (2, 1.)];
    let b = vec![(0, 1.), (1, 3.), (2, 5.)];
    let (sim, overlap) = Similarity::Pearson.compute(&a, 3., &b, 3.);
    assert_eq!(overlap, 3);
    assert_abs_diff_eq!(sim, -1., epsilon = 1e-12);
}

#[test]
fn test_msd() {
    let a = vec![(0, 5.), (1, 3.)];
    let b = vec![(0, 4.), (1, 1.)];
    let (sim, _) = Similarity::Msd.compute(&a, 0., &b, 0.);
    // msd = (1 + 4) / 2
    assert_abs_diff_eq!(sim, 1. / 3.5, epsilon = 1e-12);
}

#[test]
fn test_no_overlap_and_zero_denominator() {
    let a = vec![(0, 5.), (2, 3.)];
    let b = vec![(1, 4.), (3, 1.)];
    for kind in [Similarity::Cosine, Similarity::Pearson, Similarity::Msd] {
        assert_eq!(kind.compute(&a, 4., &b, 2.5), (0., 0));
    }
    let c = vec![(0, 4.), (2, 4.)];
    let (sim, overlap) = Similarity::Pearson.compute(&c, 4., &a, 4.);
    assert_eq!(overlap, 2);
    assert_eq!(sim, 0.);
}

#[test]
fn test_shrinkage_is_monotone() {
    let raw: f64 = 0.8;
    let overlap = 5;
    assert_eq!(shrink(raw, overlap, 0.), raw);
    let mut previous = raw;
    for shrinkage in [1., 10., 25., 100., 2500.] {
        let shrunk: f64 = shrink(raw, overlap, shrinkage);
        assert!(shrunk.abs() < previous.abs());
        previous = shrunk;
    }
    assert!(shrink(-0.5f64, 3, 10.) > -0.5);
    assert_eq!(shrink(0.9f64, 0, 10.), 0.);
}

#[test]
fn test_similarity_matrix_is_symmetric() {
    let rows = vec![
        vec![(0, 5.), (1, 3.), (2, 4.)],
        vec![(0, 4.), (1, 2.)],
        vec![(2, 1.)],
    ];
    let means = array![4., 3., 1.];
    let matrix = SimilarityMatrix::compute(&rows, means.view(), Similarity::Cosine, 2.);
    assert_eq!(matrix.len(), 3);
    for a in 0..3 {
        assert_eq!(matrix.get(a, a), 0.);
        for b in 0..3 {
            assert_eq!(matrix.get(a, b), matrix.get(b, a));
            assert_eq!(matrix.overlap(a, b), matrix.overlap(b, a));
        }
    }
    assert_eq!(matrix.overlap(0, 1), 2);
    assert_eq!(matrix.overlap(1, 2), 0);
    assert_eq!(matrix.get(1, 2), 0.);

    let (raw, _) = Similarity::Cosine.compute(&rows[0], 4., &rows[1], 3.);
    assert_abs_diff_eq!(matrix.get(0, 1), raw / 2., epsilon = 1e-12);
}

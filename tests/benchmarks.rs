//! Accuracy scenarios on the MovieLens 100k dataset.
//!
//! The scenarios are ignored by default. Point `SPARSECF_ML100K` to the
//! `u.data` file and run them with `cargo test --release -- --ignored`.

use std::fs::File;

use sparsecf::datasets::Dataset;
use sparsecf::estimators::{
    Baseline, CoClustering, Fit, ItemPop, Knn, KnnMode, Nmf, Optimizer, Recommender, SlopeOne,
    Svd, SvdPlusPlus, Wrmf,
};
use sparsecf::ingest::{read_ratings, DelimitedFormat};
use sparsecf::metrics::{Evaluator, UNBOUNDED};
use sparsecf::model_selection::{cross_validate, KFold};
use sparsecf::similarity::Similarity;

const REGRESSION_TOLERANCE: f64 = 0.005;
const RANKING_TOLERANCE: f64 = 0.008;

fn ml_100k() -> Dataset<f64> {
    let path = std::env::var("SPARSECF_ML100K").expect("SPARSECF_ML100K is not set");
    let file = File::open(&path).expect("cannot open the MovieLens 100k file");
    Dataset::new(read_ratings(file, &DelimitedFormat::tab_separated()).unwrap())
}

/// Errors must not exceed the expected values by more than the tolerance.
fn check_regression<P>(params: &P, rmse: f64, mae: f64)
where
    P: Fit<f64> + Sync,
    P::Object: Recommender<f64>,
{
    let dataset = ml_100k();
    let result = cross_validate(
        params,
        &dataset,
        &[Evaluator::Rmse, Evaluator::Mae],
        &KFold::new(5),
        0,
    )
    .unwrap();
    for (name, expected) in [("RMSE", rmse), ("MAE", mae)] {
        let mean = result.get(name).unwrap().mean();
        assert!(
            mean <= expected + REGRESSION_TOLERANCE,
            "{}: {:.4} > {:.3}",
            name,
            mean,
            expected
        );
    }
}

/// Scores must not fall short of the expected values by more than the
/// tolerance.
fn check_ranking<P>(params: &P, expectations: &[(Evaluator, f64)])
where
    P: Fit<f64> + Sync,
    P::Object: Recommender<f64>,
{
    let dataset = ml_100k();
    let evaluators: Vec<Evaluator> = expectations.iter().map(|&(e, _)| e).collect();
    let result = cross_validate(params, &dataset, &evaluators, &KFold::new(5), 0).unwrap();
    for &(evaluator, expected) in expectations {
        let mean = result.get(&evaluator.name()).unwrap().mean();
        assert!(
            mean >= expected - RANKING_TOLERANCE,
            "{}: {:.4} < {:.3}",
            evaluator,
            mean,
            expected
        );
    }
}

#[test]
#[ignore]
fn test_baseline() {
    check_regression(&Baseline::<f64>::params(), 0.944, 0.748);
}

#[test]
#[ignore]
fn test_svd() {
    check_regression(&Svd::<f64>::params(), 0.934, 0.737);
}

#[test]
#[ignore]
fn test_svd_librec() {
    let params = Svd::<f64>::params()
        .learning_rate(0.007)
        .n_epochs(100)
        .n_factors(80)
        .reg(0.1);
    check_regression(&params, 0.911, 0.718);
}

#[test]
#[ignore]
fn test_svdpp_librec() {
    let params = SvdPlusPlus::<f64>::params()
        .learning_rate(0.01)
        .n_epochs(100)
        .n_factors(20)
        .reg(0.1)
        .init_mean(0.)
        .init_std(0.001);
    check_regression(&params, 0.911, 0.718);
}

#[test]
#[ignore]
fn test_nmf() {
    check_regression(&Nmf::<f64>::params(), 0.963, 0.758);
}

#[test]
#[ignore]
fn test_slope_one() {
    check_regression(&SlopeOne::<f64>::params(), 0.946, 0.743);
}

#[test]
#[ignore]
fn test_slope_one_librec() {
    check_regression(&SlopeOne::<f64>::params(), 0.940, 0.739);
}

#[test]
#[ignore]
fn test_co_clustering() {
    check_regression(&CoClustering::<f64>::params(), 0.963, 0.753);
}

#[test]
#[ignore]
fn test_knn_modes() {
    for (mode, rmse, mae) in [
        (KnnMode::Basic, 0.98, 0.774),
        (KnnMode::Centered, 0.951, 0.749),
        (KnnMode::ZScore, 0.951, 0.746),
        (KnnMode::Baseline, 0.931, 0.733),
    ] {
        check_regression(&Knn::<f64>::params().mode(mode), rmse, mae);
    }
}

#[test]
#[ignore]
fn test_knn_user_based_pearson() {
    let params = Knn::<f64>::params()
        .mode(KnnMode::Centered)
        .similarity(Similarity::Pearson)
        .shrinkage(25.)
        .k(60);
    check_regression(&params, 0.944, 0.737);
}

#[test]
#[ignore]
fn test_knn_item_based_pearson() {
    let params = Knn::<f64>::params()
        .mode(KnnMode::Centered)
        .similarity(Similarity::Pearson)
        .user_based(false)
        .shrinkage(2500.)
        .k(40);
    check_regression(&params, 0.924, 0.723);
}

#[test]
#[ignore]
fn test_item_pop() {
    check_ranking(
        &ItemPop::<f64>::params(),
        &[
            (Evaluator::Precision(5), 0.211),
            (Evaluator::Precision(10), 0.190),
            (Evaluator::Recall(5), 0.070),
            (Evaluator::Recall(10), 0.116),
            (Evaluator::Map(UNBOUNDED), 0.135),
            (Evaluator::Ndcg(UNBOUNDED), 0.477),
            (Evaluator::Mrr(UNBOUNDED), 0.417),
        ],
    );
}

#[test]
#[ignore]
fn test_svd_bpr() {
    let params = Svd::<f64>::params()
        .optimizer(Optimizer::Bpr)
        .n_factors(10)
        .reg(0.01)
        .learning_rate(0.05)
        .n_epochs(100)
        .init_mean(0.)
        .init_std(0.001);
    check_ranking(
        &params,
        &[
            (Evaluator::Precision(5), 0.378),
            (Evaluator::Precision(10), 0.321),
            (Evaluator::Recall(5), 0.129),
            (Evaluator::Recall(10), 0.209),
            (Evaluator::Map(UNBOUNDED), 0.260),
            (Evaluator::Ndcg(UNBOUNDED), 0.601),
        ],
    );
}

#[test]
#[ignore]
fn test_wrmf() {
    let params = Wrmf::<f64>::params()
        .n_factors(20)
        .reg(0.015)
        .alpha(1.)
        .n_epochs(10);
    check_ranking(
        &params,
        &[
            (Evaluator::Precision(5), 0.416),
            (Evaluator::Precision(10), 0.353),
            (Evaluator::Recall(5), 0.142),
            (Evaluator::Recall(10), 0.227),
            (Evaluator::Map(UNBOUNDED), 0.287),
            (Evaluator::Ndcg(UNBOUNDED), 0.624),
        ],
    );
}

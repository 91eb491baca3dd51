use super::*;
use crate::datasets::Rating;
use crate::estimators::{Fit, ItemPop};
use crate::helpers::test_helpers::generate_random_ratings;
use crate::model_selection::{KFold, Splitter};
use approx::assert_abs_diff_eq;
use std::collections::HashMap;

/// Scores items from a fixed table, zero for unlisted items.
struct FixedScores(HashMap<ItemId, f64>);

impl Recommender<f64> for FixedScores {
    fn name(&self) -> &'static str {
        "fixed scores"
    }

    fn predict(&self, _user: UserId, item: ItemId) -> Result<f64> {
        Ok(self.0.get(&item).copied().unwrap_or(0.))
    }
}

fn fixture() -> (FixedScores, Dataset<f64>, Dataset<f64>) {
    let model = FixedScores([(12, 0.9), (13, 0.8), (14, 0.5), (15, 0.7)].into_iter().collect());
    let train = Dataset::new(vec![
        Rating::new(1, 10, 1.),
        Rating::new(1, 11, 1.),
        Rating::new(2, 13, 1.),
        Rating::new(2, 15, 1.),
    ]);
    let test = Dataset::new(vec![Rating::new(1, 12, 1.), Rating::new(1, 14, 1.)]);
    (model, train, test)
}

#[test]
fn test_names() {
    assert_eq!(Evaluator::Rmse.name(), "RMSE");
    assert_eq!(Evaluator::Mae.name(), "MAE");
    assert_eq!(Evaluator::Precision(5).name(), "Precision@5");
    assert_eq!(Evaluator::Recall(10).name(), "Recall@10");
    assert_eq!(Evaluator::Ndcg(UNBOUNDED).name(), "NDCG");
    assert_eq!(Evaluator::Map(UNBOUNDED).to_string(), "MAP");
    assert_eq!(Evaluator::Mrr(3).to_string(), "MRR@3");
}

#[test]
fn test_zero_cutoff_is_a_configuration_error() {
    let (model, train, test) = fixture();
    let err = Evaluator::Precision(0)
        .evaluate(&model, &test, &train)
        .unwrap_err();
    assert_eq!(err, RecommendError::InvalidCutoff(0));
    assert!(err.is_configuration_error());
}

#[test]
fn test_regression_metrics() {
    let (model, train, test) = fixture();
    // Errors are -0.1 and -0.5.
    assert_abs_diff_eq!(
        Evaluator::Rmse.evaluate(&model, &test, &train).unwrap(),
        0.13f64.sqrt(),
        epsilon = 1e-12
    );
    assert_abs_diff_eq!(
        Evaluator::Mae.evaluate(&model, &test, &train).unwrap(),
        0.3,
        epsilon = 1e-12
    );
}

#[test]
fn test_ranking_metrics() {
    // Candidates of user 1 rank as [12, 13, 15, 14]: hits at ranks 1 and 4.
    let (model, train, test) = fixture();
    let score = |e: Evaluator| e.evaluate(&model, &test, &train).unwrap();

    assert_abs_diff_eq!(score(Evaluator::Precision(2)), 0.5);
    assert_abs_diff_eq!(score(Evaluator::Precision(10)), 0.5);
    assert_abs_diff_eq!(score(Evaluator::Precision(1)), 1.);
    assert_abs_diff_eq!(score(Evaluator::Recall(2)), 0.5);
    assert_abs_diff_eq!(score(Evaluator::Recall(UNBOUNDED)), 1.);
    assert_abs_diff_eq!(score(Evaluator::Map(UNBOUNDED)), 0.75);
    assert_abs_diff_eq!(score(Evaluator::Map(2)), 0.5);
    assert_abs_diff_eq!(score(Evaluator::Mrr(UNBOUNDED)), 1.);
    let ndcg = (1. + 1. / 5f64.log2()) / (1. + 1. / 3f64.log2());
    assert_abs_diff_eq!(score(Evaluator::Ndcg(UNBOUNDED)), ndcg, epsilon = 1e-12);
}

#[test]
fn test_scores_are_averaged_over_test_users() {
    let (model, train, _) = fixture();
    let test = Dataset::new(vec![
        Rating::new(1, 12, 1.),
        Rating::new(1, 14, 1.),
        Rating::new(2, 10, 1.),
    ]);
    // User 2 ranks [12, 14, 10, 11]: first hit at rank 3.
    let scores = evaluate_all(
        &[Evaluator::Mrr(UNBOUNDED), Evaluator::Precision(1), Evaluator::Rmse],
        &model,
        &test,
        &train,
    )
    .unwrap();
    assert_abs_diff_eq!(scores[0], 2. / 3., epsilon = 1e-12);
    assert_abs_diff_eq!(scores[1], 0.5);
    assert!(scores[2] > 0.);
}

#[test]
fn test_ranking_metrics_are_bounded() {
    let dataset = generate_random_ratings(40, 30, 0.2, 12);
    let folds = KFold::new(3).split(&dataset, 0).unwrap();
    let evaluators = [
        Evaluator::Precision(5),
        Evaluator::Recall(5),
        Evaluator::Map(10),
        Evaluator::Ndcg(UNBOUNDED),
        Evaluator::Mrr(UNBOUNDED),
    ];
    for fold in &folds {
        let model: ItemPop<f64> = ItemPop::<f64>::params().fit(&fold.train).unwrap();
        let scores = evaluate_all(&evaluators, &model, &fold.test, &fold.train).unwrap();
        for score in scores {
            assert!((0. ..=1.).contains(&score), "{score}");
        }
    }
}

#[test]
fn test_regression_on_rank_only_model_is_unsupported() {
    let dataset = generate_random_ratings(10, 10, 0.3, 13);
    let model: ItemPop<f64> = ItemPop::<f64>::params().fit(&dataset).unwrap();
    let err = Evaluator::Rmse.evaluate(&model, &dataset, &dataset).unwrap_err();
    assert!(matches!(err, RecommendError::Unsupported { .. }));
}

use super::traits::rank_by_scores;
use super::*;
use crate::datasets::{Dataset, Rating};
use crate::helpers::test_helpers::generate_random_ratings;
use crate::similarity::Similarity;
use approx::assert_abs_diff_eq;
use ndarray::array;

fn train_rmse<R: Recommender<f64>>(model: &R, dataset: &Dataset<f64>) -> f64 {
    let sum: f64 = dataset
        .ratings()
        .iter()
        .map(|r| (model.predict(r.user, r.item).unwrap() - r.value).powi(2))
        .sum();
    (sum / dataset.n_ratings() as f64).sqrt()
}

fn global_mean_rmse(dataset: &Dataset<f64>) -> f64 {
    let mu = dataset.global_mean();
    let sum: f64 = dataset.ratings().iter().map(|r| (r.value - mu).powi(2)).sum();
    (sum / dataset.n_ratings() as f64).sqrt()
}

fn ratings(triples: &[(i64, i64, f64)]) -> Dataset<f64> {
    triples
        .iter()
        .map(|&(u, i, r)| Rating::new(u, i, r))
        .collect()
}

#[test]
fn test_invalid_params_are_rejected() {
    let errors = vec![
        Svd::<f64>::params().n_factors(0).check().unwrap_err(),
        Svd::<f64>::params().learning_rate(-0.1).check().unwrap_err(),
        Svd::<f64>::params().reg(f64::NAN).check().unwrap_err(),
        SvdPlusPlus::<f64>::params().n_epochs(0).check().unwrap_err(),
        Nmf::<f64>::params().init_low(1.).init_high(0.5).check().unwrap_err(),
        Nmf::<f64>::params().init_low(-1.).check().unwrap_err(),
        Wrmf::<f64>::params().alpha(-1.).check().unwrap_err(),
        Baseline::<f64>::params().tolerance(-1.).check().unwrap_err(),
        Knn::<f64>::params().k(0).check().unwrap_err(),
        Knn::<f64>::params().k(5).min_k(6).check().unwrap_err(),
        Knn::<f64>::params().shrinkage(-1.).check().unwrap_err(),
        CoClustering::<f64>::params().n_item_clusters(0).check().unwrap_err(),
    ];
    for err in errors {
        assert!(err.is_configuration_error(), "{err}");
    }
    assert_eq!(
        Knn::<f64>::params().k(5).min_k(6).check_ref().unwrap_err(),
        RecommendError::InvalidNeighbors { k: 5, min_k: 6 }
    );
}

#[test]
fn test_non_finite_init_mean_is_a_configuration_error() {
    let dataset = generate_random_ratings(10, 10, 0.3, 0);
    let err = Svd::params().init_mean(f64::NAN).fit(&dataset).unwrap_err();
    assert!(matches!(err, RecommendError::InvalidInitMean(m) if m.is_nan()));
    assert_eq!(
        SvdPlusPlus::<f64>::params().init_mean(f64::INFINITY).check().unwrap_err(),
        RecommendError::InvalidInitMean(f32::INFINITY)
    );
    assert_eq!(
        Wrmf::<f64>::params().init_mean(f64::NEG_INFINITY).check().unwrap_err(),
        RecommendError::InvalidInitMean(f32::NEG_INFINITY)
    );
    assert!(Svd::<f64>::params().init_mean(-0.5).check().is_ok());
}

#[test]
fn test_invalid_params_fail_before_training() {
    let dataset = generate_random_ratings(10, 10, 0.3, 0);
    let err = Svd::params().n_factors(0).fit(&dataset).unwrap_err();
    assert_eq!(err, RecommendError::InvalidFactors(0));

    let knn = Knn::params()
        .mode(KnnMode::Baseline)
        .baseline(Baseline::params().max_epochs(0));
    assert_eq!(knn.fit(&dataset).unwrap_err(), RecommendError::InvalidEpochs(0));
}

#[test]
fn test_empty_dataset_is_rejected() {
    let empty: Dataset<f64> = Dataset::new(vec![]);
    assert_eq!(
        Baseline::params().fit(&empty).unwrap_err(),
        RecommendError::EmptyDataset
    );
    assert_eq!(
        ItemPop::<f64>::params().fit(&empty).map(|_: ItemPop<f64>| ()),
        Err(RecommendError::EmptyDataset)
    );
}

#[test]
fn test_baseline_biases() {
    let dataset = ratings(&[(1, 10, 4.), (2, 10, 2.), (2, 11, 3.)]);
    let model = Baseline::params()
        .reg_user(0.)
        .reg_item(0.)
        .max_epochs(200)
        .fit(&dataset)
        .unwrap();
    assert_abs_diff_eq!(model.global_mean(), 3.);
    // Unregularized biases reproduce the three ratings exactly.
    for r in dataset.ratings() {
        assert_abs_diff_eq!(model.predict(r.user, r.item).unwrap(), r.value, epsilon = 1e-4);
    }
    assert_eq!(model.user_biases().len(), 2);
    assert_eq!(model.item_biases().len(), 2);
}

#[test]
fn test_baseline_unknown_entities() {
    let dataset = generate_random_ratings(20, 15, 0.3, 1);
    let model = Baseline::params().fit(&dataset).unwrap();
    let known_item = dataset.item_ids()[0];
    let i = dataset.item_index().get(known_item).unwrap();
    let (low, high) = dataset.rating_scale();
    assert_abs_diff_eq!(
        model.predict(-1, known_item).unwrap(),
        (model.global_mean() + model.item_biases()[i]).clamp(low, high)
    );
    assert_abs_diff_eq!(model.predict(-1, -1).unwrap(), dataset.global_mean());
    assert!(train_rmse(&model, &dataset) < global_mean_rmse(&dataset));
}

#[test]
fn test_baseline_convergence_requirement() {
    let dataset = generate_random_ratings(20, 15, 0.3, 2);
    let params = Baseline::params().max_epochs(1).tolerance(0.);
    assert!(params.fit(&dataset).is_ok());
    let err = params.require_convergence(true).fit(&dataset).unwrap_err();
    assert_eq!(err, RecommendError::NotConverged { epochs: 1 });
    assert!(err.is_fit_error());
}

#[test]
fn test_svd_is_deterministic_and_learns() {
    let dataset = generate_random_ratings(40, 30, 0.3, 3);
    let params = Svd::params().n_factors(5).n_epochs(30).learning_rate(0.01).seed(11);
    let first = params.fit(&dataset).unwrap();
    let second = params.fit(&dataset).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.user_factors().dim(), (dataset.n_users(), 5));

    let baseline = Baseline::params().fit(&dataset).unwrap();
    assert!(train_rmse(&first, &dataset) < train_rmse(&baseline, &dataset));

    let shuffled = params.clone().shuffle(true).fit(&dataset).unwrap();
    assert_ne!(first, shuffled);
}

#[test]
fn test_svd_divergence_is_a_fit_error() {
    let dataset = generate_random_ratings(20, 20, 0.4, 4);
    let err = Svd::params()
        .learning_rate(10.)
        .reg(0.)
        .n_epochs(50)
        .fit(&dataset)
        .unwrap_err();
    assert!(matches!(err, RecommendError::Diverged { model: "svd", .. }));
}

#[test]
fn test_svd_unknown_user_gets_item_estimate() {
    let dataset = generate_random_ratings(20, 15, 0.3, 5);
    let model = Svd::params().n_factors(3).fit(&dataset).unwrap();
    assert_abs_diff_eq!(model.predict(-1, -1).unwrap(), dataset.global_mean());
    let est = model.predict(-1, dataset.item_ids()[0]).unwrap();
    assert!(est.is_finite() && (1. ..=5.).contains(&est));
}

#[test]
fn test_bpr_ranks_popular_items_first() {
    // Items 0..4 are rated by every user, items 4..10 by one user in six.
    let mut triples = Vec::new();
    for u in 0..30 {
        for i in 0..4 {
            triples.push((u, i, 5.));
        }
        triples.push((u, 4 + u % 6, 5.));
    }
    let dataset = ratings(&triples);
    let model = Svd::params()
        .optimizer(Optimizer::Bpr)
        .n_factors(4)
        .n_epochs(20)
        .learning_rate(0.05)
        .init_std(0.01)
        .fit(&dataset)
        .unwrap();

    let candidates: Vec<i64> = (0..10).rev().collect();
    let mut top = model.rank(1000, &candidates).unwrap()[..4].to_vec();
    top.sort_unstable();
    assert_eq!(top, vec![0, 1, 2, 3]);
}

#[test]
fn test_svdpp_learns() {
    let dataset = generate_random_ratings(30, 25, 0.3, 6);
    let params = SvdPlusPlus::params().n_factors(4).n_epochs(30).seed(2);
    let model = params.fit(&dataset).unwrap();
    assert_eq!(model, params.fit(&dataset).unwrap());
    assert!(train_rmse(&model, &dataset) < global_mean_rmse(&dataset));
    assert_abs_diff_eq!(model.predict(-1, -1).unwrap(), dataset.global_mean());
}

#[test]
fn test_nmf_factors_stay_non_negative() {
    let dataset = generate_random_ratings(30, 25, 0.3, 7);
    let model = Nmf::params().n_factors(5).n_epochs(30).fit(&dataset).unwrap();
    assert!(model.user_factors().iter().all(|&x| x >= 0.));
    assert!(model.item_factors().iter().all(|&x| x >= 0.));
    for r in dataset.ratings() {
        let est = model.predict(r.user, r.item).unwrap();
        assert!((1. ..=5.).contains(&est));
    }
    assert_abs_diff_eq!(model.predict(-1, 100).unwrap(), dataset.global_mean());
}

#[test]
fn test_wrmf_scores_observed_block_higher() {
    // Two blocks of users and items; user 0 has not seen item 104 yet.
    let mut triples = Vec::new();
    for u in 0..10 {
        for i in 100..105 {
            if (u, i) != (0, 104) {
                triples.push((u, i, 1.));
            }
        }
    }
    for u in 10..20 {
        for i in 105..110 {
            triples.push((u, i, 1.));
        }
    }
    let dataset = ratings(&triples);
    let model = Wrmf::params()
        .n_factors(4)
        .n_epochs(10)
        .reg(0.1)
        .fit(&dataset)
        .unwrap();
    let ranked = model.rank(0, &[105, 106, 107, 108, 109, 104]).unwrap();
    assert_eq!(ranked[0], 104);
    assert_eq!(model.predict(0, 999).unwrap(), 0.);
}

#[test]
fn test_knn_basic_weighted_average() {
    let dataset = ratings(&[
        (1, 1, 5.),
        (1, 2, 3.),
        (2, 1, 5.),
        (2, 2, 3.),
        (2, 3, 4.),
        (3, 1, 1.),
        (3, 2, 5.),
        (3, 3, 2.),
    ]);
    let params = Knn::params().similarity(Similarity::Cosine);
    let model = params.fit(&dataset).unwrap();
    let s = 20. / (34f64.sqrt() * 26f64.sqrt());
    assert_abs_diff_eq!(
        model.predict(1, 3).unwrap(),
        (4. + 2. * s) / (1. + s),
        epsilon = 1e-12
    );

    let nearest = params.k(1).fit(&dataset).unwrap();
    assert_abs_diff_eq!(nearest.predict(1, 3).unwrap(), 4., epsilon = 1e-12);
}

/// Users 1 and 2 agree on the items they share, user 3 disagrees with both.
fn knn_toy_ratings() -> Dataset<f64> {
    ratings(&[
        (1, 1, 5.),
        (1, 2, 3.),
        (2, 1, 5.),
        (2, 2, 3.),
        (2, 3, 4.),
        (3, 1, 1.),
        (3, 2, 5.),
        (3, 3, 2.),
    ])
}

#[test]
fn test_knn_centered_and_zscore_estimates() {
    let dataset = knn_toy_ratings();
    // Cosine similarities of user 1 with users 2 and 3.
    let s = 20. / (34f64.sqrt() * 26f64.sqrt());
    // User means: 4, 4 and 8/3. Population deviations: 1, sqrt(2/3), sqrt(26)/3.
    let mean_3 = 8. / 3.;
    let std_3 = 26f64.sqrt() / 3.;

    let centered = Knn::params()
        .similarity(Similarity::Cosine)
        .mode(KnnMode::Centered)
        .fit(&dataset)
        .unwrap();
    assert_abs_diff_eq!(
        centered.predict(1, 3).unwrap(),
        4. + (1. * (4. - 4.) + s * (2. - mean_3)) / (1. + s),
        epsilon = 1e-12
    );

    let zscore = Knn::params()
        .similarity(Similarity::Cosine)
        .mode(KnnMode::ZScore)
        .fit(&dataset)
        .unwrap();
    assert_abs_diff_eq!(
        zscore.predict(1, 3).unwrap(),
        4. + 1. * (s * (2. - mean_3) / std_3) / (1. + s),
        epsilon = 1e-12
    );
}

#[test]
fn test_knn_baseline_estimate() {
    let dataset = knn_toy_ratings();
    let s = 20. / (34f64.sqrt() * 26f64.sqrt());
    let baseline = Baseline::params().fit(&dataset).unwrap();
    let b = |user, item| baseline.predict(user, item).unwrap();

    let model = Knn::params()
        .similarity(Similarity::Cosine)
        .mode(KnnMode::Baseline)
        .fit(&dataset)
        .unwrap();
    let expected = b(1, 3) + (1. * (4. - b(2, 3)) + s * (2. - b(3, 3))) / (1. + s);
    assert_abs_diff_eq!(model.predict(1, 3).unwrap(), expected, epsilon = 1e-12);

    let nearest = Knn::params()
        .similarity(Similarity::Cosine)
        .mode(KnnMode::Baseline)
        .k(1)
        .fit(&dataset)
        .unwrap();
    assert_abs_diff_eq!(
        nearest.predict(1, 3).unwrap(),
        b(1, 3) + 4. - b(2, 3),
        epsilon = 1e-12
    );
}

#[test]
fn test_knn_fallbacks_without_co_raters() {
    // User 99 shares no item with anyone.
    let mut triples = vec![(99, 500, 2.)];
    for u in 0..5 {
        triples.push((u, 1, 4.));
        triples.push((u, 2, 3. + (u % 2) as f64));
    }
    let dataset = ratings(&triples);

    let basic = Knn::params().fit(&dataset).unwrap();
    assert_eq!(basic.predict(99, 1).unwrap(), dataset.global_mean());

    let centered = Knn::params().mode(KnnMode::Centered).fit(&dataset).unwrap();
    assert_eq!(centered.predict(99, 1).unwrap(), 2.);
    assert_eq!(centered.predict(-5, 1).unwrap(), dataset.global_mean());

    let baseline = Baseline::params().fit(&dataset).unwrap();
    let knn_baseline = Knn::params().mode(KnnMode::Baseline).fit(&dataset).unwrap();
    assert_abs_diff_eq!(
        knn_baseline.predict(99, 1).unwrap(),
        baseline.predict(99, 1).unwrap()
    );

    for mode in [KnnMode::Basic, KnnMode::Centered, KnnMode::ZScore, KnnMode::Baseline] {
        let model = Knn::params().mode(mode).user_based(false).fit(&dataset).unwrap();
        assert!(model.predict(99, 1).unwrap().is_finite());
        assert!(model.predict(123, 456).unwrap().is_finite());
    }
}

#[test]
fn test_knn_modes_on_synthetic_data() {
    let dataset = generate_random_ratings(30, 20, 0.5, 8);
    for mode in [KnnMode::Basic, KnnMode::Centered, KnnMode::ZScore, KnnMode::Baseline] {
        for user_based in [true, false] {
            let model = Knn::params()
                .mode(mode)
                .user_based(user_based)
                .similarity(Similarity::Pearson)
                .shrinkage(10.)
                .k(10)
                .fit(&dataset)
                .unwrap();
            assert!(train_rmse(&model, &dataset) < global_mean_rmse(&dataset));
        }
    }
}

#[test]
fn test_slope_one_weighted_deviations() {
    let dataset = ratings(&[
        (1, 1, 5.),
        (1, 2, 3.),
        (1, 3, 2.),
        (2, 1, 3.),
        (2, 2, 4.),
        (3, 2, 2.),
        (3, 3, 5.),
    ]);
    let model = SlopeOne::<f64>::params().fit(&dataset).unwrap();
    let (i1, i2) = (
        dataset.item_index().get(1).unwrap(),
        dataset.item_index().get(2).unwrap(),
    );
    assert_eq!(model.deviation(i1, i2), (0.5, 2));
    assert_eq!(model.deviation(i2, i1), (-0.5, 2));
    assert_abs_diff_eq!(model.predict(3, 1).unwrap(), 13. / 3., epsilon = 1e-12);

    // Unknown item: the user's mean, unknown user: the global mean.
    assert_abs_diff_eq!(model.predict(3, 42).unwrap(), 3.5);
    assert_abs_diff_eq!(model.predict(42, 1).unwrap(), dataset.global_mean());
}

#[test]
fn test_co_clustering_single_cluster() {
    let dataset = generate_random_ratings(15, 10, 0.5, 9);
    let model = CoClustering::<f64>::params()
        .n_user_clusters(1)
        .n_item_clusters(1)
        .fit(&dataset)
        .unwrap();
    let mu = dataset.global_mean();
    let (low, high) = dataset.rating_scale();
    for r in dataset.ratings().iter().take(20) {
        let expected = dataset.user_mean(r.user).unwrap() + dataset.item_mean(r.item).unwrap() - mu;
        assert_abs_diff_eq!(
            model.predict(r.user, r.item).unwrap(),
            expected.clamp(low, high),
            epsilon = 1e-12
        );
    }
}

#[test]
fn test_co_clustering_assignments() {
    let dataset = generate_random_ratings(25, 20, 0.4, 10);
    let params = CoClustering::<f64>::params().n_user_clusters(3).n_item_clusters(2).seed(5);
    let model: CoClustering<f64> = params.fit(&dataset).unwrap();
    assert_eq!(model, params.fit(&dataset).unwrap());
    assert_eq!(model.user_clusters().len(), dataset.n_users());
    assert!(model.user_clusters().iter().all(|&c| c < 3));
    assert!(model.item_clusters().iter().all(|&c| c < 2));
    let user = dataset.user_ids()[0];
    assert_abs_diff_eq!(
        model.predict(user, -1).unwrap(),
        dataset.user_mean(user).unwrap()
    );
}

#[test]
fn test_item_pop_ranking() {
    let dataset = ratings(&[
        (1, 30, 1.),
        (2, 30, 1.),
        (3, 30, 1.),
        (1, 20, 1.),
        (2, 20, 1.),
        (1, 10, 1.),
        (2, 10, 1.),
        (3, 40, 1.),
    ]);
    let model: ItemPop<f64> = ItemPop::<f64>::params().fit(&dataset).unwrap();
    assert_eq!(model.popularity(30), 3);
    assert_eq!(model.popularity(99), 0);
    assert_eq!(
        model.rank(7, &[99, 40, 20, 30, 10]).unwrap(),
        vec![30, 10, 20, 40, 99]
    );
    assert_eq!(
        model.predict(1, 10).unwrap_err(),
        RecommendError::Unsupported {
            operation: "predict",
            model: "item popularity"
        }
    );
    assert_eq!(
        <ItemPop<f64> as Recommender<f64>>::check_predict().unwrap_err(),
        model.predict(1, 10).unwrap_err()
    );
    assert!(<Baseline<f64> as Recommender<f64>>::check_predict().is_ok());
}

#[test]
fn test_rank_tie_break_and_recommend() {
    let scores = array![1., 3., 3., f64::NAN, 2.];
    assert_eq!(
        rank_by_scores(&[5, 9, 4, 1, 7], scores.view()),
        vec![4, 9, 7, 5, 1]
    );

    let dataset = ratings(&[(1, 30, 1.), (2, 30, 1.), (2, 20, 1.), (3, 10, 1.)]);
    let model: ItemPop<f64> = ItemPop::<f64>::params().fit(&dataset).unwrap();
    assert_eq!(recommend(&model, &dataset, 1, 5).unwrap(), vec![10, 20]);
    assert_eq!(recommend(&model, &dataset, 1, 1).unwrap(), vec![10]);
    assert_eq!(recommend(&model, &dataset, 42, 2).unwrap(), vec![30, 10]);
}

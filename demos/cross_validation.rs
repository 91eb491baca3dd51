extern crate sparsecf;

use std::fs::File;

use sparsecf::{
    datasets::Dataset,
    estimators::{Baseline, Fit, Knn, KnnMode, Recommender, SlopeOne, Svd},
    helpers::test_helpers::generate_random_ratings,
    ingest::{read_ratings, DelimitedFormat},
    metrics::Evaluator,
    model_selection::{cross_validate, CrossValidationResult, KFold},
};

fn report(name: &str, result: &CrossValidationResult<f64>) {
    for series in result.iter() {
        println!(
            "{:<14} {:<6} {:.4} ± {:.4}",
            name,
            series.name,
            series.mean(),
            series.std()
        );
    }
}

fn run<P>(name: &str, params: &P, dataset: &Dataset<f64>)
where
    P: Fit<f64> + Sync,
    P::Object: Recommender<f64>,
{
    let result = cross_validate(
        params,
        dataset,
        &[Evaluator::Rmse, Evaluator::Mae],
        &KFold::new(5),
        0,
    )
    .unwrap();
    report(name, &result);
}

fn main() {
    // Pass the path of a tab separated MovieLens `u.data` file, or use
    // synthetic ratings.
    let dataset = match std::env::args().nth(1) {
        Some(path) => {
            let file = File::open(path).unwrap();
            Dataset::new(read_ratings(file, &DelimitedFormat::tab_separated()).unwrap())
        }
        None => generate_random_ratings(300, 200, 0.1, 0),
    };
    println!(
        "#### {} ratings, {} users, {} items",
        dataset.n_ratings(),
        dataset.n_users(),
        dataset.n_items()
    );

    run("baseline", &Baseline::<f64>::params(), &dataset);
    run("svd", &Svd::<f64>::params(), &dataset);
    run("slope one", &SlopeOne::<f64>::params(), &dataset);
    run(
        "knn centered",
        &Knn::<f64>::params().mode(KnnMode::Centered),
        &dataset,
    );
}

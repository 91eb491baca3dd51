//! Train/test splitting and cross-validation of recommendation models.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex};
use std::thread;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::datasets::{Dataset, Fold};
use crate::error::{RecommendError, Result};
use crate::estimators::{Fit, Recommender};
use crate::metrics::{evaluate_all, Evaluator};
use crate::Float;


/// Partitions a dataset into `(train, test)` folds.
///
/// Splitting is deterministic: the same dataset and seed always give the same
/// folds.
pub trait Splitter {
    fn split<F: Float>(&self, dataset: &Dataset<F>, seed: u64) -> Result<Vec<Fold<F>>>;
}

/// K-Fold splitter.
///
/// Shuffles the ratings with the seed, then cuts them into `k` consecutive
/// groups whose sizes differ by at most one, the first `n mod k` groups
/// holding the extra rating. Fold `i` tests on group `i` and trains on the
/// others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KFold {
    n_splits: usize,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Test indices of every fold, in fold order.
    fn test_groups(&self, n_ratings: usize, seed: u64) -> Result<Vec<Vec<usize>>> {
        if self.n_splits < 2 {
            return Err(RecommendError::InvalidFolds(self.n_splits));
        }
        if self.n_splits > n_ratings {
            return Err(RecommendError::NotEnoughRatings {
                folds: self.n_splits,
                ratings: n_ratings,
            });
        }

        let indices = shuffled_indices(n_ratings, seed);
        let fold_size = n_ratings / self.n_splits;
        let remainder = n_ratings % self.n_splits;

        let mut groups = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for i in 0..self.n_splits {
            let size = if i < remainder { fold_size + 1 } else { fold_size };
            groups.push(indices[start..start + size].to_vec());
            start += size;
        }
        Ok(groups)
    }
}

impl Splitter for KFold {
    fn split<F: Float>(&self, dataset: &Dataset<F>, seed: u64) -> Result<Vec<Fold<F>>> {
        let groups = self.test_groups(dataset.n_ratings(), seed)?;
        let folds = (0..groups.len())
            .map(|i| {
                let train: Vec<usize> = groups
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .flat_map(|(_, group)| group.iter().copied())
                    .collect();
                Fold {
                    train: dataset.subset(&train),
                    test: dataset.subset(&groups[i]),
                }
            })
            .collect();
        debug!(folds = self.n_splits, ratings = dataset.n_ratings(), "k-fold split");
        Ok(folds)
    }
}

/// Single train/test splitter holding out `round(n * test_ratio)` random
/// ratings, and at least one rating on each side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioSplit {
    test_ratio: f64,
}

impl RatioSplit {
    pub fn new(test_ratio: f64) -> Self {
        Self { test_ratio }
    }

    pub fn test_ratio(&self) -> f64 {
        self.test_ratio
    }
}

impl Splitter for RatioSplit {
    fn split<F: Float>(&self, dataset: &Dataset<F>, seed: u64) -> Result<Vec<Fold<F>>> {
        if !(self.test_ratio > 0. && self.test_ratio < 1.) {
            return Err(RecommendError::InvalidTestRatio(self.test_ratio as f32));
        }
        let n = dataset.n_ratings();
        if n < 2 {
            return Err(RecommendError::NotEnoughRatings {
                folds: 2,
                ratings: n,
            });
        }
        let n_test = ((n as f64 * self.test_ratio).round() as usize).clamp(1, n - 1);
        let indices = shuffled_indices(n, seed);
        Ok(vec![Fold {
            train: dataset.subset(&indices[n_test..]),
            test: dataset.subset(&indices[..n_test]),
        }])
    }
}

fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);
    indices
}

/// The scores of one evaluator, one per fold in fold order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSeries<F> {
    pub name: String,
    pub test_scores: Vec<F>,
}

impl<F: Float> ScoreSeries<F> {
    /// Mean score across folds, zero without folds.
    pub fn mean(&self) -> F {
        if self.test_scores.is_empty() {
            return F::zero();
        }
        self.test_scores.iter().copied().sum::<F>() / F::cast(self.test_scores.len())
    }

    /// Population standard deviation of the scores.
    pub fn std(&self) -> F {
        if self.test_scores.is_empty() {
            return F::zero();
        }
        let mean = self.mean();
        let variance = self
            .test_scores
            .iter()
            .map(|&score| (score - mean) * (score - mean))
            .sum::<F>()
            / F::cast(self.test_scores.len());
        variance.sqrt()
    }
}

/// Results of a cross-validation: one [`ScoreSeries`] per evaluator, in
/// evaluator order.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidationResult<F> {
    series: Vec<ScoreSeries<F>>,
}

impl<F: Float> CrossValidationResult<F> {
    /// The series of the evaluator reported as `name`, e.g. `"Precision@5"`.
    pub fn get(&self, name: &str) -> Option<&ScoreSeries<F>> {
        self.series.iter().find(|s| s.name == name)
    }

    pub fn series(&self) -> &[ScoreSeries<F>] {
        &self.series
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoreSeries<F>> {
        self.series.iter()
    }

    pub fn n_folds(&self) -> usize {
        self.series.first().map_or(0, |s| s.test_scores.len())
    }
}

/// Cross-validates the model configured by `params` on a worker pool sized by
/// the available parallelism, capped at the number of folds.
///
/// Evaluator cutoffs, and `predict` support when a regression evaluator is
/// requested, are checked before the dataset is split. Each fold fits a fresh
/// model on its train partition and scores it on its test partition with
/// every evaluator. Scores are reported in fold order
/// whatever the completion order. The first failing fold aborts the run: no
/// new fold is started, and the error of the lowest failing fold index is
/// returned.
///
/// # Example
///
/// ```no_run
/// use sparsecf::datasets::{Dataset, Rating};
/// use sparsecf::estimators::{Knn, KnnMode};
/// use sparsecf::metrics::Evaluator;
/// use sparsecf::model_selection::{cross_validate, KFold};
///
/// let dataset: Dataset<f64> = (0..100)
///     .map(|k| Rating::new(k % 10, k / 10, (1 + k % 5) as f64))
///     .collect();
/// let params = Knn::<f64>::params().mode(KnnMode::Centered);
/// let result = cross_validate(&params, &dataset, &[Evaluator::Mae], &KFold::new(5), 42).unwrap();
/// println!("MAE: {:.3} ± {:.3}", result.get("MAE").unwrap().mean(), result.get("MAE").unwrap().std());
/// ```
pub fn cross_validate<F, P, S>(
    params: &P,
    dataset: &Dataset<F>,
    evaluators: &[Evaluator],
    splitter: &S,
    seed: u64,
) -> Result<CrossValidationResult<F>>
where
    F: Float,
    P: Fit<F> + Sync,
    P::Object: Recommender<F>,
    S: Splitter + ?Sized,
{
    let n_jobs = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cross_validate_with_jobs(params, dataset, evaluators, splitter, seed, n_jobs)
}

/// [`cross_validate`] on at most `n_jobs` worker threads.
pub fn cross_validate_with_jobs<F, P, S>(
    params: &P,
    dataset: &Dataset<F>,
    evaluators: &[Evaluator],
    splitter: &S,
    seed: u64,
    n_jobs: usize,
) -> Result<CrossValidationResult<F>>
where
    F: Float,
    P: Fit<F> + Sync,
    P::Object: Recommender<F>,
    S: Splitter + ?Sized,
{
    for evaluator in evaluators {
        evaluator.check()?;
    }
    if evaluators.iter().any(|e| e.cutoff().is_none()) {
        <P::Object as Recommender<F>>::check_predict()?;
    }
    let folds = splitter.split(dataset, seed)?;
    let n_folds = folds.len();
    let n_workers = n_jobs.clamp(1, n_folds.max(1));
    info!(folds = n_folds, workers = n_workers, "cross-validation started");

    let (job_tx, job_rx) = mpsc::channel::<(usize, &Fold<F>)>();
    for job in folds.iter().enumerate() {
        // The receiver outlives this loop.
        let _ = job_tx.send(job);
    }
    drop(job_tx);
    let job_rx = Mutex::new(job_rx);
    let (result_tx, result_rx) = mpsc::channel::<(usize, Result<Vec<F>>)>();
    let abort = AtomicBool::new(false);

    thread::scope(|scope| {
        for _ in 0..n_workers {
            let result_tx = result_tx.clone();
            let (job_rx, abort) = (&job_rx, &abort);
            scope.spawn(move || loop {
                if abort.load(Ordering::SeqCst) {
                    break;
                }
                let job = match job_rx.lock() {
                    Ok(rx) => rx.recv(),
                    Err(_) => break,
                };
                let (index, fold) = match job {
                    Ok(job) => job,
                    Err(_) => break,
                };
                let outcome = run_fold(params, fold, evaluators, index);
                if outcome.is_err() {
                    abort.store(true, Ordering::SeqCst);
                }
                if result_tx.send((index, outcome)).is_err() {
                    break;
                }
            });
        }
    });
    drop(result_tx);

    let mut fold_scores: Vec<Option<Vec<F>>> = vec![None; n_folds];
    let mut failure: Option<(usize, RecommendError)> = None;
    for (index, outcome) in result_rx {
        match outcome {
            Ok(scores) => fold_scores[index] = Some(scores),
            Err(err) => {
                if failure.as_ref().map_or(true, |(first, _)| index < *first) {
                    failure = Some((index, err));
                }
            }
        }
    }
    if let Some((index, err)) = failure {
        warn!(fold = index, error = %err, "cross-validation aborted");
        return Err(err);
    }

    let mut series: Vec<ScoreSeries<F>> = evaluators
        .iter()
        .map(|e| ScoreSeries {
            name: e.name(),
            test_scores: Vec::with_capacity(n_folds),
        })
        .collect();
    for scores in fold_scores.into_iter().flatten() {
        for (s, score) in series.iter_mut().zip(scores) {
            s.test_scores.push(score);
        }
    }
    for s in &series {
        info!(
            evaluator = %s.name,
            mean = s.mean().as_f64(),
            std = s.std().as_f64(),
            "cross-validation score"
        );
    }
    Ok(CrossValidationResult { series })
}

fn run_fold<F, P>(
    params: &P,
    fold: &Fold<F>,
    evaluators: &[Evaluator],
    index: usize,
) -> Result<Vec<F>>
where
    F: Float,
    P: Fit<F>,
    P::Object: Recommender<F>,
{
    debug!(
        fold = index,
        train = fold.train.n_ratings(),
        test = fold.test.n_ratings(),
        "fold started"
    );
    let model = params.fit(&fold.train)?;
    let scores = evaluate_all(evaluators, &model, &fold.test, &fold.train)?;
    info!(fold = index, model = model.name(), "fold done");
    Ok(scores)
}

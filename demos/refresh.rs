extern crate sparsecf;

use sparsecf::{
    estimators::{Optimizer, Svd},
    ingest::{ingest_items, ingest_ratings, DelimitedFormat},
    pipeline::{refresh_recommendations, RefreshPolicy},
    storage::{MemoryStore, RecommendationStore},
};

const RATINGS: &str = "user,item,rating
1,10,5
1,11,3
1,12,4
2,10,4
2,13,5
3,11,2
3,12,5
3,13,4
4,10,3
4,14,4
";

fn main() {
    let mut store = MemoryStore::<f64>::new();
    ingest_ratings(&mut store, RATINGS.as_bytes(), &DelimitedFormat::default()).unwrap();
    ingest_items(
        &mut store,
        "15\n16\n".as_bytes(),
        &DelimitedFormat::default().has_header(false),
    )
    .unwrap();

    let params = Svd::<f64>::params()
        .optimizer(Optimizer::Bpr)
        .n_factors(4)
        .n_epochs(50)
        .learning_rate(0.05);
    let policy = RefreshPolicy::new().top_n(3).min_new_ratings(1);

    println!("#### First refresh");
    let outcome = refresh_recommendations(&mut store, &params, &policy).unwrap();
    println!("{:?}", outcome);
    for user in 1..=4 {
        println!("user {}: {:?}", user, store.recommendations(user).unwrap());
    }

    println!("#### Nothing new");
    let outcome = refresh_recommendations(&mut store, &params, &policy).unwrap();
    println!("{:?}", outcome);
}

use super::*;
use crate::storage::MemoryStore;

#[test]
fn test_read_ratings_with_header() {
    let data = "user,item,rating\n1,10,4\n1, 11 ,2.5\n2,10,5\n";
    let ratings: Vec<Rating<f64>> = read_ratings(data.as_bytes(), &DelimitedFormat::default()).unwrap();
    assert_eq!(
        ratings,
        vec![
            Rating::new(1, 10, 4.),
            Rating::new(1, 11, 2.5),
            Rating::new(2, 10, 5.)
        ]
    );
}

#[test]
fn test_read_movielens_layout() {
    // user, item, rating, timestamp
    let data = "196\t242\t3\t881250949\n186\t302\t3\t891717742\n";
    let ratings: Vec<Rating<f32>> = read_ratings(data.as_bytes(), &DelimitedFormat::tab_separated()).unwrap();
    assert_eq!(ratings.len(), 2);
    assert_eq!(ratings[1], Rating::new(186, 302, 3.));
}

#[test]
fn test_malformed_lines_report_their_number() {
    let format = DelimitedFormat::default();
    let err = read_ratings::<f64, _>("user,item,rating\n1,10,4\n1,x,3\n".as_bytes(), &format)
        .unwrap_err();
    assert!(matches!(err, RecommendError::Ingest { line: 3, .. }), "{err}");

    let err = read_ratings::<f64, _>("1;10\n".as_bytes(), &format.delimiter(b';').has_header(false))
        .unwrap_err();
    assert_eq!(
        err,
        RecommendError::Ingest {
            line: 1,
            message: "missing rating field".to_string()
        }
    );

    let err = read_ratings::<f64, _>("1,10,NaN\n".as_bytes(), &format.has_header(false)).unwrap_err();
    assert!(matches!(err, RecommendError::Ingest { line: 1, .. }));
}

#[test]
fn test_ingest_into_store() {
    let mut store = MemoryStore::<f64>::new();
    let n = ingest_ratings(
        &mut store,
        "1 2 3\n1 3 4\n1 2 5\n".as_bytes(),
        &DelimitedFormat::new(b' ', false),
    )
    .unwrap();
    assert_eq!(n, 3);
    assert_eq!(store.rating_count().unwrap(), 2);
    assert_eq!(store.ratings().unwrap()[0], Rating::new(1, 2, 5.));

    let n = ingest_items(&mut store, "item\n7\n2\n".as_bytes(), &DelimitedFormat::default()).unwrap();
    assert_eq!(n, 2);
    assert_eq!(store.items().unwrap(), vec![2, 3, 7]);
    assert_eq!(
        read_items("4\n5\n".as_bytes(), &DelimitedFormat::default().has_header(false)).unwrap(),
        vec![4, 5]
    );
}

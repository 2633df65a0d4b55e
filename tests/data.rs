use std::collections::BTreeMap;

use ringer_nn::data::{NormalizationOperator, TargetEncoding};
use ringer_nn::{Database, Error, Header, PatternSet, RandomInteger};

fn numbered(rows: usize, cols: usize) -> PatternSet {
    PatternSet::from_rows(
        (0..rows)
            .map(|i| (0..cols).map(|j| (i * cols + j) as f64).collect())
            .collect(),
    )
    .unwrap()
}

#[test]
fn split_of_one_hundred_rows() {
    let set = numbered(100, 3);
    let (train, test) = set.split(0.3).unwrap();
    assert_eq!(train.size() + test.size(), 100);
    assert_eq!(train.size(), 30);
    assert_eq!(train.row(0).unwrap(), set.row(0).unwrap());
    assert_eq!(test.row(0).unwrap(), set.row(30).unwrap());

    let (train, test) = set.split(-0.3).unwrap();
    assert_eq!((train.size(), test.size()), (70, 30));
    assert_eq!(test.row(0).unwrap(), set.row(0).unwrap());

    assert!(matches!(set.split(1.0), Err(Error::InvalidProportion(_))));
}

#[test]
fn merge_with_other_width_leaves_set_untouched() {
    let mut left = numbered(4, 3);
    let before = left.clone();
    let right = numbered(2, 4);
    assert!(left.merge(&right).is_err());
    assert_eq!(left, before);
}

#[test]
fn merge_appends_rows() {
    let mut a = numbered(3, 2);
    let b = numbered(5, 2);
    let original = a.clone();
    a.merge(&b).unwrap();
    assert_eq!(a.size(), 8);
    for i in 0..3 {
        assert_eq!(a.row(i).unwrap(), original.row(i).unwrap());
    }
    assert_eq!(a.row(3).unwrap(), b.row(0).unwrap());
}

#[test]
fn select_copies_requested_rows() {
    let set = numbered(6, 2);
    let picks = [5, 0, 5, 2];
    let sub = set.select(&picks).unwrap();
    for (k, &i) in picks.iter().enumerate() {
        assert_eq!(sub.pattern(k).unwrap(), set.pattern(i).unwrap());
    }
    assert!(set.select(&[6]).is_err());
}

#[test]
fn shuffle_is_a_reproducible_bijection() {
    let original = numbered(20, 2);
    let mut a = original.clone();
    let mut b = original.clone();
    a.shuffle(&mut RandomInteger::with_seed(17));
    b.shuffle(&mut RandomInteger::with_seed(17));
    assert_eq!(a, b);

    let mut firsts: Vec<f64> = a.patterns().map(|p| p[0]).collect();
    firsts.sort_by(f64::total_cmp);
    let expected: Vec<f64> = original.patterns().map(|p| p[0]).collect();
    assert_eq!(firsts, expected);
}

#[test]
fn database_pipeline() {
    let mut classes = BTreeMap::new();
    classes.insert("electron".to_string(), numbered(10, 2));
    classes.insert("jet".to_string(), numbered(40, 2));
    let db = Database::new(Header::new("tests", "rings", "1", ""), classes).unwrap();

    let (mut train, test) = db.split(0.5).unwrap();
    assert_eq!(train.total_patterns() + test.total_patterns(), 50);
    assert!(train.header().name.ends_with("(TRAIN)"));

    train.normalise().unwrap();
    let sizes: Vec<usize> = train.classes().values().map(PatternSet::size).collect();
    assert!(sizes[0] as f64 >= 0.9 * sizes[1] as f64);

    let merged = train.merge().unwrap();
    let target = train.merge_target(TargetEncoding::Minimal, -1.0, 1.0).unwrap();
    assert_eq!(target.size(), merged.size());
    assert_eq!(target.pattern_size(), 1);
    assert_eq!(target.get(0, 0).unwrap(), -1.0);
    assert_eq!(target.get(merged.size() - 1, 0).unwrap(), 1.0);

    let one_hot = train.merge_target(TargetEncoding::Normal, 0.0, 1.0).unwrap();
    assert_eq!(one_hot.row(0).unwrap(), &[1.0, 0.0]);

    let norm = NormalizationOperator::new(&merged);
    let mut normalized = merged.clone();
    normalized.apply_pattern_op(&norm).unwrap();
    for column in normalized.ensembles() {
        assert!(column.mean().abs() < 1e-9);
    }
    assert_eq!(norm.mean().len(), 2);
    assert!(norm.std_dev().iter().all(|&s| s > 0.0));
}

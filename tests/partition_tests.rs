//! Integration tests for lazy partitioning

use pbatch::{partition, Error};
use std::collections::{BTreeSet, HashSet};

/// (items, chunk size, expected chunks)
fn expected_partitions() -> Vec<(Vec<i32>, Option<usize>, Vec<Vec<i32>>)> {
    vec![
        (vec![], None, vec![]),
        (vec![1], None, vec![vec![1]]),
        (vec![1, 2, 3], None, vec![vec![1, 2, 3]]),
        (vec![], Some(1), vec![]),
        (vec![1], Some(1), vec![vec![1]]),
        (vec![1, 2, 3], Some(1), vec![vec![1], vec![2], vec![3]]),
        (
            (0..15).collect(),
            Some(4),
            vec![
                vec![0, 1, 2, 3],
                vec![4, 5, 6, 7],
                vec![8, 9, 10, 11],
                vec![12, 13, 14],
            ],
        ),
        (
            (0..16).collect(),
            Some(8),
            vec![(0..8).collect(), (8..16).collect()],
        ),
    ]
}

#[test]
fn test_partitions() {
    for (items, chunk_size, expected) in expected_partitions() {
        let actual: Vec<Vec<i32>> = partition(items, chunk_size).unwrap().collect();
        assert_eq!(actual, expected);
    }
}

#[test]
fn test_lazy_first_chunk() {
    for (items, chunk_size, expected) in expected_partitions() {
        let mut parts = partition(items, chunk_size).unwrap();
        match expected.first() {
            Some(first) => assert_eq!(parts.next().as_ref(), Some(first)),
            None => assert!(parts.next().is_none()),
        }
        let rest: Vec<_> = parts.collect();
        assert_eq!(rest, expected.iter().skip(1).cloned().collect::<Vec<_>>());
    }
}

#[test]
fn test_generator_items() {
    for (items, chunk_size, expected) in expected_partitions() {
        let generated = items.iter().copied().filter(|_| true);
        let actual: Vec<Vec<i32>> = partition(generated, chunk_size).unwrap().collect();
        assert_eq!(actual, expected);
    }
}

#[test]
fn test_unordered_items() {
    for (items, chunk_size, expected) in expected_partitions() {
        let set: HashSet<i32> = items.into_iter().collect();
        let actual: BTreeSet<i32> = partition(set, chunk_size).unwrap().flatten().collect();
        let expected: BTreeSet<i32> = expected.into_iter().flatten().collect();
        assert_eq!(actual, expected);
    }
}

#[test]
fn test_string_and_map_items() {
    let parts: Vec<_> = partition(vec!["a", "b", "c"], Some(10)).unwrap().collect();
    assert_eq!(parts, vec![vec!["a", "b", "c"]]);

    let maps = vec![
        std::collections::HashMap::from([("a", 1)]),
        std::collections::HashMap::from([("b", 2)]),
    ];
    let parts: Vec<_> = partition(maps.clone(), Some(3)).unwrap().collect();
    assert_eq!(parts, vec![maps]);
}

#[test]
fn test_non_positive_chunk_size() {
    let err = partition(Vec::<i32>::new(), Some(0)).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert_eq!(
        err.to_string(),
        "Invalid argument: Chunk size must be a positive int (or None)"
    );
}

#[test]
fn test_consumes_iterator() {
    let mut iterator = vec![1, 2, 3, 4].into_iter();
    let mut partitions = partition(iterator.by_ref(), Some(2)).unwrap();

    assert_eq!(partitions.next(), Some(vec![1, 2]));
    drop(partitions);

    assert_eq!(iterator.by_ref().collect::<Vec<_>>(), vec![3, 4]);
    assert!(partition(iterator, Some(2)).unwrap().next().is_none());
}

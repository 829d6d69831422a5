//! Integration tests for the chunked parallel map
//!
//! These tests verify ordering, zip truncation, chunk-scoped failure
//! reporting, nested maps, and the timing behavior of bounded concurrency.

use pbatch::{pmap, pmap_zip, Error, FailureKind, MapConfig, ParallelMap, PoolConfig, PoolExecutor};
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const PERFORMANCE_SLEEP_TIME: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
struct ValueError(String);

/// Collect a map into a Vec, panicking on failure
fn collect_ok<T: std::fmt::Debug>(
    results: impl Iterator<Item = Result<T, pbatch::AggregatedFailure<T>>>,
) -> Vec<T> {
    results.collect::<Result<Vec<_>, _>>().unwrap()
}

#[derive(Debug, Clone, Copy)]
enum Item {
    Int(i64),
    Text(&'static str),
}

fn square(item: Item) -> Result<i64, ValueError> {
    match item {
        Item::Int(x) => Ok(x * x),
        Item::Text(_) => Err(ValueError("Expected an int".to_string())),
    }
}

// =============================================================================
// Results
// =============================================================================

#[test]
fn test_square_function() {
    let cases: Vec<(Vec<Item>, Vec<i64>)> = vec![
        (vec![], vec![]),
        (vec![Item::Int(0)], vec![0]),
        (vec![Item::Int(1), Item::Int(2), Item::Int(3)], vec![1, 4, 9]),
        (
            (0..10).map(Item::Int).collect(),
            vec![0, 1, 4, 9, 16, 25, 36, 49, 64, 81],
        ),
    ];

    for (items, expected) in cases {
        assert_eq!(collect_ok(pmap(square, items, None).unwrap()), expected);
    }
}

#[test]
fn test_square_function_failures() {
    let failure = pmap(square, vec![Item::Text("not an int")], None)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();
    assert_eq!(failure.results.len(), 1);
    assert_eq!(failure.failures.len(), 1);

    let failure = pmap(
        square,
        vec![Item::Int(1), Item::Int(2), Item::Text("not an int")],
        None,
    )
    .unwrap()
    .collect::<Result<Vec<_>, _>>()
    .unwrap_err();

    assert_eq!(failure.chunk_index, 0);
    assert_eq!(failure.results[0].as_ref().unwrap(), &1);
    assert_eq!(failure.results[1].as_ref().unwrap(), &4);
    let err = failure.results[2].as_ref().unwrap_err();
    assert_eq!(err.kind(), FailureKind::Error);
    assert_eq!(
        err.downcast_ref::<ValueError>(),
        Some(&ValueError("Expected an int".to_string()))
    );
    assert!(failure.failures[0].ptr_eq(err));
}

#[test]
fn test_multi_arity() {
    fn formula((a, b, c): (i64, i64, i64)) -> Result<i64, Infallible> {
        Ok(a + b * c)
    }

    let results = collect_ok(pmap_zip(formula, (0..0, 0..1000, 0..100), None).unwrap());
    assert!(results.is_empty());

    let results = collect_ok(pmap_zip(formula, (vec![1], 0..1000, 0..100), None).unwrap());
    assert_eq!(results, vec![1]);

    let results = collect_ok(
        pmap_zip(
            formula,
            ((0..10), (0..100).step_by(10), (0..1000).step_by(100)),
            Some(3),
        )
        .unwrap(),
    );
    assert_eq!(
        results,
        vec![0, 1001, 4002, 9003, 16004, 25005, 36006, 49007, 64008, 81009]
    );
}

#[test]
fn test_zip_truncates_to_shortest() {
    let results = collect_ok(
        pmap_zip(
            |(a, b): (i32, i32)| Ok::<_, Infallible>(a + b),
            (vec![1], vec![1, 2, 3]),
            None,
        )
        .unwrap(),
    );
    assert_eq!(results, vec![2]);
}

#[test]
fn test_config_from_json() {
    let config = MapConfig::from_json_str(r#"{"chunkSize": 2}"#).unwrap();
    let results = collect_ok(
        ParallelMap::new(|x: i32| Ok::<_, Infallible>(x + 1))
            .config(config)
            .run(vec![1, 2, 3])
            .unwrap(),
    );
    assert_eq!(results, vec![2, 3, 4]);

    let err = MapConfig::from_json_str(r#"{"chunkSize": 2, "retries": 3}"#).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
}

// =============================================================================
// Chunk Failures
// =============================================================================

#[test]
fn test_failure_reports_only_current_chunk() {
    let mut results = pmap(
        |x: i32| {
            if x == 3 {
                Err(ValueError("three".to_string()))
            } else {
                Ok(x * 10)
            }
        },
        vec![1, 2, 3, 4],
        Some(2),
    )
    .unwrap();

    assert_eq!(results.next().unwrap().unwrap(), 10);
    assert_eq!(results.next().unwrap().unwrap(), 20);

    let failure = results.next().unwrap().unwrap_err();
    assert_eq!(failure.results.len(), 2);
    assert_eq!(failure.failures.len(), 1);
    assert_eq!(failure.results[1].as_ref().unwrap(), &40);
    assert_eq!(failure.to_string(), "1 of 2 items failed in chunk 1");

    assert!(results.next().is_none());
}

#[test]
fn test_failing_item_does_not_stop_its_chunk() {
    let side_effect = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&side_effect);

    let failure = pmap(
        move |x: i32| {
            if x == 0 {
                return Err(ValueError("first".to_string()));
            }
            thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
            Ok(x)
        },
        vec![0, 1],
        Some(2),
    )
    .unwrap()
    .collect::<Result<Vec<_>, _>>()
    .unwrap_err();

    assert!(side_effect.load(Ordering::SeqCst));
    assert_eq!(failure.failures.len(), 1);
    assert_eq!(failure.results[1].as_ref().unwrap(), &1);
}

// =============================================================================
// Nesting
// =============================================================================

#[test]
fn test_nested() {
    fn sum_squares(numbers: std::ops::Range<i64>) -> Result<i64, pbatch::AggregatedFailure<i64>> {
        pmap(|x: i64| Ok::<_, Infallible>(x * x), numbers, None)
            .unwrap()
            .sum()
    }

    let results = collect_ok(pmap(sum_squares, vec![0..1, 0..2, 0..3, 0..4], None).unwrap());
    assert_eq!(results, vec![0, 1, 5, 14]);
}

#[test]
fn test_nested_exceptions() {
    fn map_raises_exception(
        items: (i32, i32),
    ) -> Result<Vec<i32>, pbatch::AggregatedFailure<i32>> {
        pmap(
            |_: i32| Err::<i32, _>(ValueError("Nested exception".to_string())),
            [items.0, items.1],
            None,
        )
        .unwrap()
        .collect()
    }

    let failure = pmap(map_raises_exception, vec![(1, 2), (3, 4)], None)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();

    assert_eq!(failure.results.len(), 2);
    assert_eq!(failure.failures.len(), 2);

    for (result, outer) in failure.results.iter().zip(&failure.failures) {
        assert!(result.as_ref().unwrap_err().ptr_eq(outer));

        let inner = outer
            .downcast_ref::<pbatch::AggregatedFailure<i32>>()
            .unwrap();
        assert_eq!(inner.failures.len(), 2);
        assert_eq!(inner.failures[0].message(), "Nested exception");
    }
}

// =============================================================================
// Performance
// =============================================================================

#[test]
fn test_pmap_performance() {
    fn sleep_exp((x, power): (u32, u32)) -> Result<u32, Infallible> {
        thread::sleep(PERFORMANCE_SLEEP_TIME);
        Ok(x.pow(power))
    }

    let items = 0..10u32;
    let max_time = PERFORMANCE_SLEEP_TIME * items.len() as u32;

    for chunk_size in [Some(2), Some(3), Some(5), Some(10), Some(100), None] {
        let start = Instant::now();
        let results = collect_ok(
            pmap_zip(sleep_exp, (items.clone(), std::iter::repeat(3)), chunk_size).unwrap(),
        );
        let duration = start.elapsed();

        assert_eq!(results, vec![0, 1, 8, 27, 64, 125, 216, 343, 512, 729]);
        assert!(
            duration < max_time,
            "chunk size {:?} took {:?}",
            chunk_size,
            duration
        );
    }
}

#[test]
fn test_chunks_run_sequentially() {
    let start = Instant::now();
    let results = collect_ok(
        pmap(
            |x: u32| {
                thread::sleep(PERFORMANCE_SLEEP_TIME);
                Ok::<_, Infallible>(x)
            },
            0..4,
            Some(2),
        )
        .unwrap(),
    );
    let duration = start.elapsed();

    assert_eq!(results, vec![0, 1, 2, 3]);
    // Two chunks, each one sleep long
    assert!(duration >= PERFORMANCE_SLEEP_TIME * 2);
}

#[test]
fn test_bounded_pool_executor() {
    let pool = PoolExecutor::new(PoolConfig {
        num_threads: 4,
        thread_name: "pmap-it".to_string(),
    })
    .unwrap();

    let results = collect_ok(
        ParallelMap::new(|x: u64| {
            let name = thread::current().name().unwrap_or("").to_string();
            assert!(name.starts_with("pmap-it-"));
            Ok::<_, Infallible>(x * 2)
        })
        .chunk_size(4)
        .unwrap()
        .executor(pool)
        .run(0..20)
        .unwrap(),
    );
    assert_eq!(results, (0..20).map(|x| x * 2).collect::<Vec<_>>());
}

// =============================================================================
// Async Callers
// =============================================================================

#[test]
fn test_pmap_inside_current_thread_runtime() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    let results = runtime.block_on(async {
        pmap(|x: i32| Ok::<_, Infallible>(x), vec![1, 2], None)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
    });
    assert_eq!(results.unwrap(), vec![1, 2]);
}

#[tokio::test]
async fn test_pmap_inside_tokio_test() {
    let results = collect_ok(pmap(square, (0..6).map(Item::Int), Some(4)).unwrap());
    assert_eq!(results, vec![0, 1, 4, 9, 16, 25]);
}

use reposync::{ChangeEvent, RepositoryId, aggregate, resolve_repository};
use std::collections::HashSet;

/// Deterministic batches covering separators, extensions and repeats.
fn sample_batches() -> Vec<Vec<String>> {
    let segments = ["projA", "projB.git", "notes.txt", "x", ".cfg", "a.b.c"];
    let tails = ["", "/f", "/dir/file.rs", "/.git/index"];

    let mut batches = Vec::new();
    for size in 1..=8 {
        for offset in 0..segments.len() {
            let batch = (0..size)
                .map(|i| {
                    let segment = segments[(offset + i * 5) % segments.len()];
                    let tail = tails[(offset + i) % tails.len()];
                    format!("{segment}{tail}")
                })
                .collect();
            batches.push(batch);
        }
    }
    batches
}

#[test]
fn test_triggered_set_never_larger_than_batch() {
    for batch in sample_batches() {
        assert!(aggregate(&batch).len() <= batch.len(), "batch {batch:?}");
    }
}

#[test]
fn test_every_path_maps_into_triggered_set() {
    for batch in sample_batches() {
        let triggered = aggregate(&batch);
        for path in &batch {
            let id = resolve_repository(path);
            assert!(triggered.contains(id.as_str()), "{path} missing from {triggered:?}");
        }
    }
}

#[test]
fn test_every_member_comes_from_the_batch() {
    for batch in sample_batches() {
        let resolved: HashSet<RepositoryId> =
            batch.iter().map(|p| resolve_repository(p)).collect();
        for id in &aggregate(&batch) {
            assert!(resolved.contains(id));
        }
    }
}

#[test]
fn test_aggregate_is_deterministic() {
    for batch in sample_batches() {
        assert_eq!(aggregate(&batch), aggregate(&batch));
    }
}

#[test]
fn test_duplicated_batch_adds_nothing() {
    for batch in sample_batches() {
        let doubled: Vec<&String> = batch.iter().chain(batch.iter()).collect();
        assert_eq!(aggregate(&batch), aggregate(&doubled));
    }
}

#[test]
fn test_order_reflects_first_occurrence() {
    let triggered = aggregate(["b/1", "a/1", "b/2", "c/1", "a/2"]);
    let names: Vec<_> = triggered.iter().map(RepositoryId::as_str).collect();
    assert_eq!(names, vec!["b", "a", "c"]);
}

#[test]
fn test_burst_collapse_and_extension_examples() {
    let triggered = aggregate([
        "projA/file1.txt",
        "projA/file2.txt",
        "projB/readme",
        "projA/file3.txt",
    ]);
    assert_eq!(
        triggered.into_vec(),
        vec![RepositoryId::new("projA"), RepositoryId::new("projB")]
    );

    assert_eq!(resolve_repository("projC.git/index").as_str(), "projC");
    assert_eq!(resolve_repository("projD/x").as_str(), "projD");
}

#[test]
fn test_change_events_and_strings_agree() {
    let paths = ["docs/a", "code.git/HEAD", "docs/b"];
    let events: Vec<ChangeEvent> = paths.iter().map(|p| ChangeEvent::modified(*p)).collect();
    assert_eq!(aggregate(&events), aggregate(paths));
}

#[test]
fn test_concurrent_aggregation_does_not_interfere() {
    let batches = sample_batches();
    let expected: Vec<_> = batches.iter().map(aggregate).collect();

    std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| batches.iter().map(aggregate).collect::<Vec<_>>()))
            .collect();
        for worker in workers {
            assert_eq!(worker.join().unwrap(), expected);
        }
    });
}

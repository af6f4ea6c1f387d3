//! Readers keep a consistent view while a writer commits.

use std::sync::Barrier;
use std::thread;

use crate::e2e_tests::helpers::{TestStore, pattern, statement};
use crate::query::{Query, executor};

#[test]
fn test_snapshot_ignores_later_commits() {
    let store = TestStore::with(&[("a", "p", "b")]);
    let before = store.database.snapshot().expect("snapshot");
    store.insert(&[statement("a", "p", "c"), statement("a", "p", "d")]);

    let query = Query::select_all(pattern("a", "p", "?o"));
    let mut old = executor::execute(before, &query).expect("execute");
    assert_eq!(old.row_count().expect("count"), 1);
    old.close().expect("close");
    assert_eq!(store.rows(&query).len(), 3);
}

#[test]
fn test_readers_run_alongside_writer() {
    let store = TestStore::with(&[("n0", "next", "n1")]);
    let query = Query::select_all(pattern("?x", "next", "?y"));
    let readers = 4;
    let barrier = Barrier::new(readers + 1);

    thread::scope(|scope| {
        for _ in 0..readers {
            scope.spawn(|| {
                barrier.wait();
                for _ in 0..20 {
                    let snapshot = store.database.snapshot().expect("snapshot");
                    let expected = snapshot.statement_count();
                    let mut answer = executor::execute(snapshot, &query).expect("execute");
                    let rows = answer.row_count().expect("count");
                    answer.close().expect("close");
                    assert_eq!(usize::try_from(rows).expect("fits"), expected);
                }
            });
        }
        scope.spawn(|| {
            barrier.wait();
            for i in 1..20 {
                store.insert(&[statement(&format!("n{i}"), "next", &format!("n{}", i + 1))]);
            }
        });
    });

    assert_eq!(store.rows(&query).len(), 20);
    assert_eq!(store.database.cursor_pool().busy(), 0);
}

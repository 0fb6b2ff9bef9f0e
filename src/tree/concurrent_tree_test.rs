use std::sync::Arc;
use std::thread;

use super::*;
use crate::TreeConfig;

#[test]
fn named_operations_delegate_to_tree() {
    let tree: ConcurrentTree<String, u32> = ConcurrentTree::new(3);

    tree.upsert("a".into(), 1);
    tree.upsert("b".into(), 2);

    assert_eq!(tree.len(), 2);
    assert_eq!(tree.find(&"b".into()), Some(2));
    assert!(tree.has(&"a".into()));
    assert!(!tree.is_empty());
    assert_eq!(tree.adjacency_list().len(), 2);

    tree.delete_by_key(&"a".into());
    tree.delete_by_key(&"b".into());
    assert!(tree.is_empty());
    assert!(!tree.is_retired());
}

#[test]
fn blocking_read_and_write_expose_the_tree() {
    let tree: ConcurrentTree<String, u32> = ConcurrentTree::with_config(&TreeConfig { max_degree: 4 });

    let modified = tree.blocking_write(|t| t.upsert("x".into(), 10));
    let (degree, root) = tree.blocking_read(|t| (t.max_degree(), t.root_key().cloned()));

    assert_eq!(modified.len(), 1);
    assert_eq!(degree, 4);
    assert_eq!(root, Some("x".to_string()));
}

#[test]
fn concurrent_writers_lose_no_updates() {
    let tree: Arc<ConcurrentTree<String, usize>> = Arc::new(ConcurrentTree::new(3));

    let handles: Vec<_> = (0..2)
        .map(|writer| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                for i in 0..500 {
                    tree.upsert(format!("w{writer}-{i}"), i);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(tree.len(), 1000);
    tree.blocking_read(|t| t.check_invariants()).unwrap();
}

#[test]
fn readers_run_alongside_writer() {
    let tree: Arc<ConcurrentTree<u32, u32>> = Arc::new(ConcurrentTree::new(3));
    let writer = {
        let tree = Arc::clone(&tree);
        thread::spawn(move || {
            for i in 0..300 {
                tree.upsert(i, i);
            }
        })
    };
    let reader = {
        let tree = Arc::clone(&tree);
        thread::spawn(move || {
            for _ in 0..300 {
                // Every snapshot a reader sees is a whole tree
                tree.blocking_read(|t| t.check_invariants()).unwrap();
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(tree.len(), 300);
}

#[test]
fn retired_tree_rejects_registry_upserts() {
    let tree: ConcurrentTree<String, u32> = ConcurrentTree::new(3);
    tree.upsert("only".into(), 1);

    let (modified, retired) = tree.delete_and_retire_if_empty(&"only".into());
    assert!(retired);
    assert_eq!(modified.len(), 1);
    assert!(tree.is_retired());

    let rejected = tree.upsert_if_live("late".into(), 2);
    assert_eq!(rejected, Err(("late".to_string(), 2)));
    assert!(tree.is_empty());
}

#[test]
fn non_empty_tree_is_not_retired() {
    let tree: ConcurrentTree<String, u32> = ConcurrentTree::new(3);
    tree.upsert("a".into(), 1);
    tree.upsert("b".into(), 2);

    let (_, retired) = tree.delete_and_retire_if_empty(&"a".into());

    assert!(!retired);
    assert!(tree.upsert_if_live("c".into(), 3).is_ok());
}

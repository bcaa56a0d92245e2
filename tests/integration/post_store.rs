//! Post store durability and dedupe

use postsmith::error::StorageError;
use postsmith::store::{NewPost, PostStore, SledPostStore};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

#[test]
fn test_posts_survive_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("posts.db");

    {
        let store = SledPostStore::open(&path).unwrap();
        store.insert(NewPost::new("Weights", "# Weights\nbody", "intro, A, B")).unwrap();
        store.insert(NewPost::new("Biases", "# Biases\nbody", "intro, A, B")).unwrap();
        store.flush().unwrap();
    }

    let store = SledPostStore::open(&path).unwrap();
    assert_eq!(store.count().unwrap(), 2);
    assert!(store.exists("Weights", "intro, A, B").unwrap());

    // Ids keep increasing after reopen.
    let third = store.insert(NewPost::new("Loss", "# Loss\nbody", "intro, A, C")).unwrap();
    let recent = store.list_recent(10).unwrap();
    assert_eq!(recent[0].id, third.id);
    assert!(recent.windows(2).all(|pair| pair[0].id > pair[1].id));
}

#[test]
fn test_duplicate_rejected_after_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("posts.db");
    {
        let store = SledPostStore::open(&path).unwrap();
        store.insert(NewPost::new("Weights", "first", "intro, A, B")).unwrap();
        store.flush().unwrap();
    }

    let store = SledPostStore::open(&path).unwrap();
    let err = store
        .insert(NewPost::new("Weights", "second", "intro, A, B"))
        .unwrap_err();
    assert!(matches!(err, StorageError::DuplicateKey { .. }));

    let posts = store.list_by_category("intro, A, B", 10).unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].content, "first");
}

#[test]
fn test_racing_inserts_across_titles() {
    let store = Arc::new(SledPostStore::temporary().unwrap());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                let mut won = 0;
                for i in 0..10 {
                    let title = format!("Topic {}", i);
                    match store.insert(NewPost::new(title, format!("by {}", t), "race, A, B")) {
                        Ok(_) => won += 1,
                        Err(StorageError::DuplicateKey { .. }) => {}
                        Err(other) => panic!("unexpected error: {}", other),
                    }
                }
                won
            })
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 10);
    assert_eq!(store.count().unwrap(), 10);
    assert_eq!(store.list_by_category("race, A, B", 100).unwrap().len(), 10);
}

//! Cache behavior across runs and under concurrent access

use super::test_utils::{
    build_pipeline, good_article, Behavior, ScriptedProvider, TestWorkspace, INTRO_OUTLINE,
};
use postsmith::cache::{CacheKey, CacheRecord, CacheStore, FileCacheStore};
use postsmith::outline::extract_leaf_items;
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_readers_never_see_partial_records() {
    let temp = tempfile::TempDir::new().unwrap();
    let store = Arc::new(FileCacheStore::new(temp.path()).unwrap());
    let item = extract_leaf_items("intro", "# A\n## B\n### Weights\n").pop().unwrap();
    let key = CacheKey::for_item(&item, "llama3");

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let store = store.clone();
            let item = item.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    let content = format!("{}\nwriter {} pass {}", good_article("Weights"), w, i);
                    let record = CacheRecord::new(&item, "llama3", content, true, "OK".to_string(), false);
                    store.write(&key, &record).unwrap();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    if let Some(record) = store.lookup(&key).unwrap() {
                        assert!(record.content.starts_with("# Weights"));
                        assert!(record.content.contains("writer "));
                    }
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }
    assert!(store.lookup(&key).unwrap().is_some());
}

#[tokio::test]
async fn test_corrupt_record_is_regenerated() {
    let workspace = TestWorkspace::new();
    workspace.write_document("intro.md", INTRO_OUTLINE);

    {
        let (pipeline, _posts) = build_pipeline(&workspace, ScriptedProvider::new(Behavior::Good));
        pipeline.run(&workspace.source_dir()).await.unwrap();
    }

    let cache = FileCacheStore::new(&workspace.config.workspace.cache_dir).unwrap();
    let items = extract_leaf_items("intro", INTRO_OUTLINE);
    let key = CacheKey::for_item(&items[1], "scripted-model");
    std::fs::write(cache.record_path(&key), b"{ truncated").unwrap();

    let provider = ScriptedProvider::new(Behavior::Good);
    let (pipeline, _posts) = build_pipeline(&workspace, provider.clone());
    let summary = pipeline.run(&workspace.source_dir()).await.unwrap();

    assert_eq!(summary.cache_hits, 2);
    assert_eq!(summary.generated, 1);
    assert_eq!(summary.skipped_duplicate, 3);
    assert_eq!(provider.calls(), 1);

    // The regenerated attempt replaced the corrupt file.
    assert!(cache.lookup(&key).unwrap().unwrap().accepted);
}

#[tokio::test]
async fn test_generator_change_misses_cache() {
    let workspace = TestWorkspace::new();
    workspace.write_document("intro.md", INTRO_OUTLINE);

    {
        let (pipeline, _posts) = build_pipeline(&workspace, ScriptedProvider::new(Behavior::Good));
        pipeline.run(&workspace.source_dir()).await.unwrap();
    }

    let other = ScriptedProvider::with_model(Behavior::Good, "other-model");
    let (pipeline, _posts) = build_pipeline(&workspace, other.clone());
    let summary = pipeline.run(&workspace.source_dir()).await.unwrap();

    assert_eq!(summary.cache_hits, 0);
    assert_eq!(summary.generated, 3);
    // Posts are keyed by (title, category) only.
    assert_eq!(summary.skipped_duplicate, 3);
    assert_eq!(other.calls(), 3);
}

#[tokio::test]
async fn test_stricter_gate_invalidates_cached_acceptance() {
    let mut workspace = TestWorkspace::new();
    workspace.write_document("intro.md", INTRO_OUTLINE);

    {
        let (pipeline, _posts) = build_pipeline(&workspace, ScriptedProvider::new(Behavior::Good));
        pipeline.run(&workspace.source_dir()).await.unwrap();
    }

    workspace.config.quality.required_sections.push("Further reading".to_string());
    workspace.config.quality.repair = false;
    let provider = ScriptedProvider::new(Behavior::Good);
    let (pipeline, _posts) = build_pipeline(&workspace, provider.clone());
    let summary = pipeline.run(&workspace.source_dir()).await.unwrap();

    assert_eq!(summary.cache_hits, 0);
    assert_eq!(summary.generated, 3);
    assert_eq!(summary.rejected, 3);
    assert_eq!(provider.calls(), 3);
}

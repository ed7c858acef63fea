//! Filesystem cache behavior across separate store instances, the way a
//! process restart would see it.

use std::collections::BTreeMap;
use std::fs;
use std::time::{Duration, Instant};

use semhl_cache::{CacheData, CacheStore, FsCacheStore, MemCacheStore, SaveDebouncer};

fn sample_data() -> CacheData {
    let mut colors = BTreeMap::new();
    colors.insert("alpha".to_owned(), "#D2691E".to_owned());
    colors.insert("beta".to_owned(), "#20B2AA".to_owned());
    CacheData {
        settings_hash: "bg=dark,de=5/15,L=50/100".to_owned(),
        colors,
    }
}

#[test]
fn colors_survive_a_new_store_instance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("color_cache.json");
    let data = sample_data();

    let mut writer = FsCacheStore::new(path.clone());
    writer.save(&data);
    drop(writer);

    let mut reader = FsCacheStore::new(path);
    assert_eq!(reader.load(), data);
}

#[test]
fn cleared_cache_reads_empty_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("color_cache.json");

    let mut store = FsCacheStore::new(path.clone());
    store.save(&sample_data());
    store.clear();
    drop(store);

    let mut reader = FsCacheStore::new(path);
    assert_eq!(reader.load(), CacheData::default());
}

#[test]
fn corrupt_cache_file_degrades_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("color_cache.json");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "settings_hash = maybe?").unwrap();

    let mut store = FsCacheStore::new(path);
    assert_eq!(store.load(), CacheData::default());
}

#[test]
fn repeated_saves_keep_the_latest_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("color_cache.json");
    let mut store = FsCacheStore::new(path);

    let mut data = sample_data();
    store.save(&data);
    data.colors
        .insert("gamma".to_owned(), "#FF00FF".to_owned());
    store.save(&data);

    assert_eq!(store.load(), data);
}

#[test]
fn debouncer_coalesces_a_burst_into_one_save() {
    let mut store = MemCacheStore::new();
    let mut debouncer = SaveDebouncer::new(Duration::from_secs(5));
    let data = sample_data();
    let start = Instant::now();

    // A burst of changes inside the window arms a single save.
    for offset in 0..4 {
        debouncer.mark_dirty(start + Duration::from_millis(offset * 500));
    }
    assert!(!debouncer.take_ready(start + Duration::from_secs(5)));
    if debouncer.take_ready(start + Duration::from_secs(7)) {
        store.save(&data);
    }
    assert_eq!(store.save_count(), 1);

    // Quiet afterwards: nothing else fires.
    assert!(!debouncer.take_ready(start + Duration::from_secs(60)));
    assert_eq!(store.persisted(), Some(&data));
}

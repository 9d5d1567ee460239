use super::*;

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "aura-tryon-persist-{tag}-{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn memory_store_round_trip() {
    let s = MemoryStore::new();
    assert_eq!(s.get(CART_KEY).unwrap(), None);
    s.set(CART_KEY, "[]").unwrap();
    assert_eq!(s.get(CART_KEY).unwrap().as_deref(), Some("[]"));
    s.remove(CART_KEY).unwrap();
    assert_eq!(s.get(CART_KEY).unwrap(), None);
}

#[test]
fn json_file_store_writes_one_file_per_key() {
    let dir = temp_dir("files");
    let s = JsonFileStore::new(&dir);
    assert_eq!(s.get(WISHLIST_KEY).unwrap(), None);

    s.set(WISHLIST_KEY, r#"[{"x":1}]"#).unwrap();
    assert!(dir.join("aura-wishlist.json").exists());
    assert_eq!(
        JsonFileStore::new(&dir).get(WISHLIST_KEY).unwrap().as_deref(),
        Some(r#"[{"x":1}]"#)
    );

    s.remove(WISHLIST_KEY).unwrap();
    s.remove(WISHLIST_KEY).unwrap();
    assert_eq!(s.get(WISHLIST_KEY).unwrap(), None);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn json_file_store_rejects_path_like_keys() {
    let s = JsonFileStore::new(temp_dir("keys"));
    assert!(s.get("../etc/passwd").is_err());
    assert!(s.set("", "x").is_err());
}

#[test]
fn corrupt_collection_loads_empty() {
    let s = MemoryStore::new();
    s.set(CART_KEY, "{not json").unwrap();
    let items: Vec<u32> = load_collection(&s, CART_KEY);
    assert!(items.is_empty());

    save_collection(&s, CART_KEY, &[1u32, 2, 3]).unwrap();
    let items: Vec<u32> = load_collection(&s, CART_KEY);
    assert_eq!(items, vec![1, 2, 3]);
}

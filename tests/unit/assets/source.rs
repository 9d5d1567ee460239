use super::*;

#[test]
fn parse_classifies_uris() {
    assert!(matches!(
        ImageSource::parse("data:image/png;base64,AAAA"),
        ImageSource::DataUri(_)
    ));
    assert!(matches!(
        ImageSource::parse("https://images.example.com/a.png"),
        ImageSource::Url(_)
    ));
    assert_eq!(
        ImageSource::parse("file:///tmp/a.png"),
        ImageSource::Path(PathBuf::from("/tmp/a.png"))
    );
    assert_eq!(
        ImageSource::parse(" clothes/top1.png "),
        ImageSource::Path(PathBuf::from("clothes/top1.png"))
    );
}

#[test]
fn data_uri_roundtrip_and_errors() {
    let uri = format!("data:image/png;base64,{}", BASE64_STANDARD.encode([1u8, 2, 3]));
    assert_eq!(decode_data_uri(&uri).unwrap(), vec![1, 2, 3]);

    assert!(decode_data_uri("data:image/png,plain").is_err());
    assert!(decode_data_uri("data:image/png;base64").is_err());
    assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
    assert!(decode_data_uri("http://x").is_err());
}

#[test]
fn default_loader_reads_bytes_and_files() {
    let loader = DefaultImageLoader::new();
    let src = ImageSource::from_bytes(vec![9u8, 8]);
    assert_eq!(&loader.load(&src).unwrap()[..], &[9, 8]);

    let dir = std::env::temp_dir().join(format!("aura_tryon_loader_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("x.bin"), [4u8, 5, 6]).unwrap();

    let rooted = DefaultImageLoader::with_root(&dir);
    let rel = ImageSource::Path(PathBuf::from("x.bin"));
    let bytes = rooted.load(&rel).unwrap();
    assert_eq!(&bytes[..], &[4, 5, 6]);

    assert!(
        rooted
            .load(&ImageSource::Path(PathBuf::from("missing.bin")))
            .is_err()
    );
    std::fs::remove_dir_all(&dir).ok();
}

#[cfg(not(feature = "remote-images"))]
#[test]
fn urls_need_remote_feature() {
    let err = DefaultImageLoader::new()
        .load(&ImageSource::parse("https://example.com/a.png"))
        .unwrap_err();
    assert!(err.to_string().contains("remote-images"));
}

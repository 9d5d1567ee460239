use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TryOnError::missing_input("x")
            .to_string()
            .contains("missing input:")
    );
    assert!(
        TryOnError::camera_access("x")
            .to_string()
            .contains("camera access error:")
    );
    assert!(
        TryOnError::overlay_load("x")
            .to_string()
            .contains("overlay load error:")
    );
    assert!(TryOnError::encode("x").to_string().contains("encode error:"));
    assert!(
        TryOnError::persistence("x")
            .to_string()
            .contains("persistence error:")
    );
    assert!(
        TryOnError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TryOnError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn relabel_keeps_message_and_is_idempotent() {
    let err = TryOnError::validation("bad png").into_overlay_load();
    assert!(matches!(&err, TryOnError::OverlayLoad(m) if m.contains("bad png")));

    let err = TryOnError::overlay_load("x").into_overlay_load();
    assert!(matches!(&err, TryOnError::OverlayLoad(m) if m == "x"));

    let err = TryOnError::Other(anyhow::anyhow!("truncated")).into_base_load();
    assert!(matches!(&err, TryOnError::BaseLoad(m) if m.contains("truncated")));
}

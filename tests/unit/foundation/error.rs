use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        UmbraError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        UmbraError::geometry("x")
            .to_string()
            .contains("geometry error:")
    );
    assert!(UmbraError::worker("x").to_string().contains("worker error:"));
    assert!(
        UmbraError::storage("x")
            .to_string()
            .contains("storage error:")
    );
    assert!(UmbraError::host("x").to_string().contains("host error:"));
    assert!(
        UmbraError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = UmbraError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn serde_json_errors_map_to_serde_variant() {
    let err: UmbraError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, UmbraError::Serde(_)));
}

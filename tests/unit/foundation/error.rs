use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TesseraError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        TesseraError::invariant("x")
            .to_string()
            .contains("invariant violation:")
    );
    assert!(
        TesseraError::resource_exhausted("x")
            .to_string()
            .contains("resource exhausted:")
    );
    assert!(
        TesseraError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TesseraError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let err: TesseraError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, TesseraError::Serde(_)));
}

#[test]
fn zeroed_alloc_has_requested_len() {
    let buf = try_alloc_zeroed(17, "test").unwrap();
    assert_eq!(buf.len(), 17);
    assert!(buf.iter().all(|&b| b == 0));
    assert!(!TesseraError::validation("x").is_resource_exhausted());
}

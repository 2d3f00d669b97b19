use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        KakijunError::invalid_input("x")
            .to_string()
            .contains("invalid input:")
    );
    assert!(KakijunError::not_found("x").to_string().contains("not found:"));
    assert!(KakijunError::parse("x").to_string().contains("parse failure:"));
    assert!(KakijunError::cancelled("x").to_string().contains("cancelled:"));
    assert!(
        KakijunError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        KakijunError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = KakijunError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

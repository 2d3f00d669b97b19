use super::*;

#[test]
fn equal_inputs_give_equal_keys() {
    let a = Artifact::from("<svg><path d=\"M0,0\"/></svg>");
    let b = Artifact::from(a.as_str().to_string());
    assert_eq!(fingerprint_base(&a), fingerprint_base(&b));
}

#[test]
fn full_content_is_hashed() {
    // Same length and same long prefix; only the tail differs.
    let prefix = "<svg>".to_string() + &"x".repeat(256);
    let a = Artifact::from(format!("{prefix}<a/></svg>"));
    let b = Artifact::from(format!("{prefix}<b/></svg>"));
    assert_eq!(a.len(), b.len());
    assert_ne!(fingerprint_base(&a), fingerprint_base(&b));
}

#[test]
fn tags_and_parameters_separate_keys() {
    let doc = Artifact::from("<svg/>");
    let key = |tag: OpTag, x: f64| {
        let mut h = StableHasher::tagged(tag);
        h.write_artifact(&doc);
        h.write_f64(x);
        h.finish()
    };
    assert_ne!(key(OpTag::Transform, 1.0), key(OpTag::Composite, 1.0));
    assert_ne!(key(OpTag::Transform, 1.0), key(OpTag::Transform, 2.0));
    assert_eq!(key(OpTag::Transform, 1.0), key(OpTag::Transform, 1.0));
}

#[test]
fn input_boundaries_are_unambiguous() {
    let mut left = StableHasher::new();
    left.write_str("ab");
    left.write_str("c");
    let mut right = StableHasher::new();
    right.write_str("a");
    right.write_str("bc");
    assert_ne!(left.finish(), right.finish());
}

#[test]
fn display_is_32_hex_digits() {
    let fp = Fingerprint { hi: 1, lo: 0xabc };
    assert_eq!(fp.to_string(), "0000000000000001".to_string() + "0000000000000abc");
}

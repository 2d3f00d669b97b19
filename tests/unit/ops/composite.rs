use super::*;

const A: &str = r#"<svg viewBox="0 0 10 10"><path id="a" d="M0,0"/></svg>"#;
const B: &str = r#"<svg viewBox="0 0 20 20"><path id="b" d="M1,1"/><circle id="c" r="1"/></svg>"#;

fn child_ids(doc: &Artifact) -> Vec<String> {
    let parsed = SvgDocument::parse(doc.as_str()).unwrap();
    parsed
        .root
        .child_elements()
        .map(|e| e.attr("id").unwrap_or(e.local_name()).to_string())
        .collect()
}

#[test]
fn composite_with_itself_is_identity() {
    let a = Artifact::from(A);
    let out = composite(&a, &a.clone());
    assert!(out.same(&a));
    let copy = Artifact::from(A.to_string());
    assert_eq!(composite(&a, &copy), a);
}

#[test]
fn composite_appends_b_after_a_under_a_root() {
    let out = composite(&Artifact::from(A), &Artifact::from(B));
    assert_eq!(child_ids(&out), vec!["a", "b", "c"]);
    let parsed = SvgDocument::parse(out.as_str()).unwrap();
    assert_eq!(parsed.root.attr("viewBox"), Some("0 0 10 10"));
}

#[test]
fn alpha_groups_follow_paint_order() {
    let a = Artifact::from(A);
    let b = Artifact::from(B);
    let out = composite_alpha(
        &a,
        &b,
        AlphaParams {
            alpha_a: 0.25,
            alpha_b: 3.0,
            swap: false,
        },
    );
    let parsed = SvgDocument::parse(out.as_str()).unwrap();
    let groups: Vec<_> = parsed.root.child_elements().collect();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].attr("opacity"), Some("0.25"));
    assert_eq!(groups[0].child_elements().next().unwrap().attr("id"), Some("a"));
    assert_eq!(groups[1].attr("opacity"), Some("1"));
    assert_eq!(groups[1].child_elements().count(), 2);

    let swapped = composite_alpha(
        &a,
        &b,
        AlphaParams {
            swap: true,
            ..AlphaParams::default()
        },
    );
    let parsed = SvgDocument::parse(swapped.as_str()).unwrap();
    let first = parsed.root.child_elements().next().unwrap();
    assert_eq!(first.child_elements().next().unwrap().attr("id"), Some("b"));
}

#[test]
fn non_finite_alpha_clamps_to_zero() {
    let out = composite_alpha(
        &Artifact::from(A),
        &Artifact::from(B),
        AlphaParams {
            alpha_a: f64::NAN,
            alpha_b: -1.0,
            swap: false,
        },
    );
    let parsed = SvgDocument::parse(out.as_str()).unwrap();
    for g in parsed.root.child_elements() {
        assert_eq!(g.attr("opacity"), Some("0"));
    }
}

#[test]
fn opaque_alpha_composite_paints_the_same_leaves_as_plain_composite() {
    let a = Artifact::from(A);
    let b = Artifact::from(B);
    let plain = SvgDocument::parse(composite(&a, &b).as_str()).unwrap();
    let alpha = SvgDocument::parse(composite_alpha(&a, &b, AlphaParams::default()).as_str()).unwrap();
    let plain_leaves: Vec<_> = plain.root.child_elements().cloned().collect();
    let alpha_leaves: Vec<_> = alpha
        .root
        .child_elements()
        .flat_map(|g| g.child_elements().cloned().collect::<Vec<_>>())
        .collect();
    assert_eq!(plain_leaves, alpha_leaves);
}

#[test]
fn unparseable_b_leaves_a_untouched() {
    let a = Artifact::from(A);
    assert!(composite(&a, &Artifact::from("<nope")).same(&a));
    assert!(composite_alpha(&a, &Artifact::from("<nope"), AlphaParams::default()).same(&a));
}

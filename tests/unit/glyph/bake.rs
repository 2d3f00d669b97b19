use super::*;

const EI: &str = include_str!("../../fixtures/06c38.svg");

fn stroke_groups(svg: &str) -> Vec<u32> {
    let doc = SvgDocument::parse(svg).unwrap();
    doc.root
        .child_elements()
        .filter_map(|e| e.attr(ATTR_STROKE).and_then(|v| v.parse().ok()))
        .collect()
}

#[test]
fn bake_ei_yields_five_ascending_groups() {
    let baked = bake(EI).unwrap();
    assert_eq!(baked.count, 5);
    assert!(baked.has_strokes());
    assert_eq!(stroke_groups(baked.svg.as_str()), vec![1, 2, 3, 4, 5]);
    assert!(!baked.svg.as_str().contains("StrokeNumbers"));
    assert!(!baked.svg.as_str().contains("<text"));
}

#[test]
fn bake_normalizes_root_geometry() {
    let baked = bake(r#"<svg width="300" height="300"><path id="a-s1" d="M0,0"/></svg>"#).unwrap();
    let doc = SvgDocument::parse(baked.svg.as_str()).unwrap();
    assert_eq!(doc.root.attr("width"), Some("100%"));
    assert_eq!(doc.root.attr("height"), Some("100%"));
    assert_eq!(doc.root.attr("viewBox"), Some(DEFAULT_VIEW_BOX));
    assert_eq!(doc.root.attr("preserveAspectRatio"), Some("xMidYMid meet"));
    let leaf = doc
        .root
        .child_elements()
        .next()
        .and_then(|g| g.child_elements().next())
        .unwrap();
    assert_eq!(leaf.attr("vector-effect"), Some("non-scaling-stroke"));
}

#[test]
fn carriers_sharing_an_index_merge_into_one_group() {
    let raw = r#"<svg viewBox="0 0 10 10">
        <g id="x-s2"><path d="M0,0"/><circle r="1"/></g>
        <path id="y-s1" d="M1,1"/>
        <g id="z-s2"><g><line x2="1"/></g></g>
    </svg>"#;
    let baked = bake(raw).unwrap();
    assert_eq!(baked.count, 2);
    let doc = SvgDocument::parse(baked.svg.as_str()).unwrap();
    let groups: Vec<_> = doc.root.child_elements().collect();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].attr(ATTR_STROKE), Some("1"));
    assert_eq!(groups[1].attr(ATTR_STROKE), Some("2"));
    let names: Vec<_> = groups[1].child_elements().map(|e| e.local_name()).collect();
    assert_eq!(names, vec!["path", "circle", "line"]);
}

#[test]
fn no_carriers_means_zero_count() {
    let baked = bake(r#"<svg><path d="M0,0"/></svg>"#).unwrap();
    assert_eq!(baked.count, 0);
    assert!(!baked.has_strokes());
    assert!(stroke_groups(baked.svg.as_str()).is_empty());
}

#[test]
fn zero_only_indices_fall_back_to_distinct_count() {
    let baked = bake(r#"<svg><path id="a-s0" d="M0,0"/></svg>"#).unwrap();
    assert_eq!(baked.count, 1);
}

#[test]
fn sparse_indices_count_the_maximum() {
    let baked = bake(r#"<svg><path id="a-s1" d="M0,0"/><path id="a-s4" d="M1,1"/></svg>"#)
        .unwrap();
    assert_eq!(baked.count, 4);
    assert_eq!(stroke_groups(baked.svg.as_str()), vec![1, 4]);
}

#[test]
fn lifted_leaves_keep_inherited_presentation() {
    let raw = r##"<svg>
        <g transform="translate(5 5)" opacity="0.5" style="stroke:#000;fill:none">
          <g stroke="#c00"><path id="p-s1" d="M0,0" stroke-width="2"/></g>
          <path id="p-s2" d="M1,1" stroke="#00f" transform="scale(2)"/>
        </g>
    </svg>"##;
    let baked = bake(raw).unwrap();
    let doc = SvgDocument::parse(baked.svg.as_str()).unwrap();
    let leaves: Vec<Element> = doc
        .root
        .child_elements()
        .flat_map(|g| g.child_elements().cloned().collect::<Vec<_>>())
        .collect();
    assert_eq!(leaves.len(), 2);

    assert_eq!(leaves[0].attr("transform"), Some("translate(5 5)"));
    assert_eq!(leaves[0].attr("opacity"), Some("0.5"));
    assert_eq!(leaves[0].attr("stroke"), Some("#c00"));
    assert_eq!(leaves[0].attr("fill"), Some("none"));
    assert_eq!(leaves[0].attr("stroke-width"), Some("2"));

    assert_eq!(leaves[1].attr("transform"), Some("translate(5 5) scale(2)"));
    assert_eq!(leaves[1].attr("stroke"), Some("#00f"));
}

#[test]
fn hidden_containers_keep_their_leaves_hidden() {
    let raw = r#"<svg><g display="none"><path id="p-s1" d="M0,0"/></g></svg>"#;
    let baked = bake(raw).unwrap();
    let doc = SvgDocument::parse(baked.svg.as_str()).unwrap();
    let leaf = doc.root.child_elements().next().unwrap().child_elements().next().unwrap();
    assert!(is_hidden(leaf));
}

#[test]
fn root_style_and_defs_survive_baking() {
    let raw = r#"<svg><style>path{stroke:red}</style><defs><linearGradient id="lg"/></defs><path id="p-s1" d="M0,0"/></svg>"#;
    let baked = bake(raw).unwrap();
    let doc = SvgDocument::parse(baked.svg.as_str()).unwrap();
    let names: Vec<_> = doc.root.child_elements().map(|e| e.local_name()).collect();
    assert_eq!(names, vec!["style", "defs", "g"]);
}

#[test]
fn annotate_tags_leaves_and_hides_unowned_ones() {
    let raw = r#"<svg><g id="k-s1"><path d="M0,0"/></g><path id="frame" d="M9,9"/></svg>"#;
    let svg = annotate(raw, true).unwrap();
    let doc = SvgDocument::parse(svg.as_str()).unwrap();
    let group = doc.root.child_elements().next().unwrap();
    let owned = group.child_elements().next().unwrap();
    assert_eq!(owned.attr(ATTR_STROKE), Some("1"));
    let loose = doc.root.child_elements().nth(1).unwrap();
    assert_eq!(loose.attr(ATTR_IGNORE), Some("1"));
    assert!(is_hidden(loose));

    let shown = annotate(raw, false).unwrap();
    let doc = SvgDocument::parse(shown.as_str()).unwrap();
    assert!(!is_hidden(doc.root.child_elements().nth(1).unwrap()));
}

#[test]
fn annotate_ei_tags_every_stroke_and_strips_numbers() {
    let svg = annotate(EI, true).unwrap();
    for i in 1..=5 {
        assert!(svg.as_str().contains(&format!("data-stroke=\"{i}\"")));
    }
    assert!(!svg.as_str().contains("StrokeNumbers"));
    assert!(!svg.as_str().contains(ATTR_IGNORE));
}

#[test]
fn malformed_source_is_a_parse_failure() {
    assert!(matches!(
        bake("<svg><path></svg>"),
        Err(crate::foundation::error::KakijunError::Parse(_))
    ));
    assert!(annotate("not xml", true).is_err());
}

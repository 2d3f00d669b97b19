use super::*;

const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10" width="100%" height="100%"><rect x="0" y="0" width="5" height="5" fill="#ff0000"/></svg>"##;

#[test]
fn renders_onto_a_square_background() {
    let img = rasterize(
        &Artifact::from(SQUARE),
        &RasterOpts {
            size: 40,
            background: [0, 0, 255, 255],
        },
    )
    .unwrap();
    assert_eq!(img.dimensions(), (40, 40));
    assert_eq!(img.get_pixel(5, 5).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(35, 35).0, [0, 0, 255, 255]);
}

#[test]
fn png_bytes_carry_the_signature() {
    let png = rasterize_png(&Artifact::from(SQUARE), &RasterOpts::default()).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (512, 512));
}

#[test]
fn rejects_bad_sizes_and_documents() {
    let zero = RasterOpts {
        size: 0,
        ..RasterOpts::default()
    };
    assert!(matches!(
        rasterize(&Artifact::from(SQUARE), &zero),
        Err(KakijunError::InvalidInput(_))
    ));
    assert!(matches!(
        rasterize(&Artifact::from("<svg"), &RasterOpts::default()),
        Err(KakijunError::Parse(_))
    ));
}

#[test]
fn hex_colors() {
    assert_eq!(parse_hex_color("#fff").unwrap(), [255, 255, 255, 255]);
    assert_eq!(parse_hex_color("#102030").unwrap(), [16, 32, 48, 255]);
    assert_eq!(parse_hex_color("#10203080").unwrap(), [16, 32, 48, 128]);
    for bad in ["fff", "#ffff", "#gg0000", "#é00"] {
        assert!(parse_hex_color(bad).is_err(), "{bad}");
    }
}

#[test]
fn separately_colored_glyphs_keep_their_colors_when_composited() {
    use crate::ops::{AlphaParams, composite, composite_alpha, force_stroke_color};

    let left = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100"><path d="M10,10 L10,90"/></svg>"#;
    let right = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100"><path d="M90,10 L90,90"/></svg>"#;
    let red = force_stroke_color(&Artifact::from(left), "#ff0000");
    let blue = force_stroke_color(&Artifact::from(right), "#0000ff");
    let opts = RasterOpts {
        size: 100,
        background: [255, 255, 255, 255],
    };

    for merged in [
        composite(&red, &blue),
        composite_alpha(&red, &blue, AlphaParams::default()),
    ] {
        let img = rasterize(&merged, &opts).unwrap();
        let [r, g, b, _] = img.get_pixel(10, 50).0;
        assert!(r > 200 && g < 60 && b < 60, "left stroke should be red: {r},{g},{b}");
        let [r, g, b, _] = img.get_pixel(90, 50).0;
        assert!(b > 200 && r < 60 && g < 60, "right stroke should be blue: {r},{g},{b}");
    }
}

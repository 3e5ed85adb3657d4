use image::{imageops, DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use qrcode::QrCode;
use qrgate_core::{DecodeOptions, DecodedPayload, Decoder, Inversion};
use qrgate_decode::QrDecoder;

const ADDRESS: &str = "https://a.test";

/// Dark modules on white, with the standard quiet zone.
fn render(payload: &str) -> GrayImage {
    QrCode::new(payload.as_bytes())
        .expect("encode")
        .render::<Luma<u8>>()
        .module_dimensions(6, 6)
        .build()
}

fn to_rgba(gray: GrayImage) -> RgbaImage {
    DynamicImage::ImageLuma8(gray).to_rgba8()
}

fn decode(img: &RgbaImage, inversion: Inversion) -> Option<DecodedPayload> {
    let options = DecodeOptions { inversion };
    QrDecoder::new()
        .decode(img.as_raw(), img.width(), img.height(), &options)
        .expect("valid frame")
}

#[test]
fn rendered_code_decodes_to_its_payload() {
    let frame = to_rgba(render(ADDRESS));
    let expected = Some(DecodedPayload::new(ADDRESS));
    assert_eq!(decode(&frame, Inversion::DontInvert), expected);
    assert_eq!(decode(&frame, Inversion::AttemptBoth), expected);
    assert_eq!(decode(&frame, Inversion::InvertFirst), expected);
}

#[test]
fn inverted_code_needs_an_inverting_pass() {
    let mut gray = render(ADDRESS);
    imageops::invert(&mut gray);
    let frame = to_rgba(gray);
    let expected = Some(DecodedPayload::new(ADDRESS));

    assert_eq!(decode(&frame, Inversion::DontInvert), None);
    assert_eq!(decode(&frame, Inversion::OnlyInvert), expected);
    assert_eq!(decode(&frame, Inversion::AttemptBoth), expected);
}

#[test]
fn code_inside_a_larger_colored_frame_decodes() {
    let code = to_rgba(render(ADDRESS));
    let mut frame = RgbaImage::from_pixel(
        code.width() + 160,
        code.height() + 90,
        Rgba([120, 140, 100, 255]),
    );
    imageops::overlay(&mut frame, &code, 100, 40);

    assert_eq!(
        decode(&frame, Inversion::DontInvert),
        Some(DecodedPayload::new(ADDRESS))
    );
}

#[test]
fn non_url_payload_is_returned_verbatim() {
    let frame = to_rgba(render("hello, scanner"));
    assert_eq!(
        decode(&frame, Inversion::DontInvert),
        Some(DecodedPayload::new("hello, scanner"))
    );
}

mod common;

use std::io::{Cursor, Read};

use certmint::{
    FaceStyle, FontBook, Position, Record, RenderError, StyleConfig, package_archive,
    render_batch, render_one, sanitize_file_stem,
};
use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use zip::ZipArchive;

use common::{DEJAVU_SANS, DEJAVU_SANS_MONO, blank_template, fonts};

fn underlined_style() -> StyleConfig {
    StyleConfig {
        position: Position { x: 50.0, y: 50.0 },
        font_size_px: 40.0,
        font_family: "sans-serif".to_string(),
        font_color: "#000000".to_string(),
        bold: false,
        italic: false,
        underline: true,
    }
}

fn decode(png: &[u8]) -> RgbaImage {
    image::load_from_memory(png).unwrap().to_rgba8()
}

fn ink_bounds(image: &RgbaImage) -> (u32, u32, u32, u32) {
    let dark: Vec<(u32, u32)> = image
        .enumerate_pixels()
        .filter(|(_, _, pixel)| pixel[0] < 128)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!dark.is_empty(), "no ink found");
    (
        dark.iter().map(|p| p.0).min().unwrap(),
        dark.iter().map(|p| p.1).min().unwrap(),
        dark.iter().map(|p| p.0).max().unwrap(),
        dark.iter().map(|p| p.1).max().unwrap(),
    )
}

fn archive_entries(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

#[test]
fn name_is_centered_and_underlined_on_800x600_template() {
    let template = blank_template(800, 600);
    let book = fonts();
    let underlined = decode(&render_one(&template, "Jane Doe", &underlined_style(), &book).unwrap());
    let plain_style = StyleConfig {
        underline: false,
        ..underlined_style()
    };
    let plain = decode(&render_one(&template, "Jane Doe", &plain_style, &book).unwrap());

    assert_eq!(underlined.dimensions(), (800, 600));
    assert_eq!(*underlined.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    assert_eq!(*underlined.get_pixel(799, 599), Rgba([255, 255, 255, 255]));

    let (x0, y0, x1, y1) = ink_bounds(&plain);
    let center_x = (x0 + x1) as f32 / 2.0;
    let center_y = (y0 + y1) as f32 / 2.0;
    assert!((center_x - 400.0).abs() <= 6.0, "text center x {center_x}");
    assert!((center_y - 300.0).abs() <= 6.0, "text center y {center_y}");

    // Everything the underline adds sits on rows 303..=304, centered on x=400.
    let changed: Vec<(u32, u32)> = underlined
        .enumerate_pixels()
        .filter(|(x, y, pixel)| *pixel != plain.get_pixel(*x, *y))
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!changed.is_empty());
    assert!(changed.iter().all(|&(_, y)| (303..=304).contains(&y)));
    let left = changed.iter().map(|p| p.0).min().unwrap();
    let right = changed.iter().map(|p| p.0).max().unwrap();
    let line_center = (left + right) as f32 / 2.0;
    assert!((line_center - 400.0).abs() <= 4.0, "underline center {line_center}");
    assert!(right - left > 100, "underline too short: {left}..{right}");
}

#[test]
fn rendering_is_deterministic() {
    let template = blank_template(320, 200);
    let book = fonts();
    let style = StyleConfig {
        bold: true,
        italic: true,
        ..underlined_style()
    };
    let first = render_one(&template, "Grace Hopper", &style, &book).unwrap();
    let second = render_one(&template, "Grace Hopper", &style, &book).unwrap();
    assert_eq!(first, second);
}

#[test]
fn batch_fails_fast_on_unrenderable_name() {
    let template = blank_template(200, 100);
    let book = fonts();
    let records = vec![
        Record::new("Alice", "alice@example.com"),
        Record::new("李雷", "lilei@example.com"),
        Record::new("Bob", "bob@example.com"),
    ];

    let err = render_batch(&template, &records, &underlined_style(), &book).unwrap_err();
    assert!(matches!(err, RenderError::MissingGlyph { .. }));

    let err = package_archive(&template, &records, &underlined_style(), &book).unwrap_err();
    assert!(matches!(err, RenderError::MissingGlyph { .. }));
}

#[test]
fn names_outside_the_primary_font_use_another_registered_face() {
    let template = blank_template(240, 100);
    let style = StyleConfig {
        font_family: "DejaVu Sans Mono, monospace".to_string(),
        ..underlined_style()
    };
    let records = vec![
        Record::new("Ada", "ada@example.com"),
        Record::new("\u{5d0}\u{5d1}\u{5d9}", "avi@example.com"),
    ];

    let mut book = FontBook::new();
    book.register("DejaVu Sans Mono", FaceStyle::REGULAR, DEJAVU_SANS_MONO.to_vec())
        .unwrap();
    let err = package_archive(&template, &records, &style, &book).unwrap_err();
    assert!(matches!(err, RenderError::MissingGlyph { ch: '\u{5d0}', .. }));

    book.register("DejaVu Sans", FaceStyle::REGULAR, DEJAVU_SANS.to_vec())
        .unwrap();
    let entries = archive_entries(package_archive(&template, &records, &style, &book).unwrap());
    let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["Ada_certificate.png", "____certificate.png"]);

    let hebrew = decode(&entries[1].1);
    let (x0, _, x1, _) = ink_bounds(&hebrew);
    let center_x = (x0 + x1) as f32 / 2.0;
    assert!((center_x - 120.0).abs() <= 6.0, "text center x {center_x}");
}

#[test]
fn batch_preserves_order_and_records() {
    let template = blank_template(200, 100);
    let book = fonts();
    let records = vec![
        Record::new("Zed", "zed@example.com"),
        Record::new("Amy", "amy@example.com"),
        Record::new("Zed", "zed2@example.com"),
    ];
    let rendered = render_batch(&template, &records, &underlined_style(), &book).unwrap();
    let emails: Vec<&str> = rendered.iter().map(|c| c.record.email.as_str()).collect();
    assert_eq!(emails, vec!["zed@example.com", "amy@example.com", "zed2@example.com"]);
    assert_eq!(rendered[0].png, rendered[2].png);
    assert_ne!(rendered[0].png, rendered[1].png);
}

#[test]
fn archive_names_entries_after_recipients() {
    let template = blank_template(200, 100);
    let book = fonts();
    let records = vec![
        Record::new("Jane O'Brien", "jane@example.com"),
        Record::new("Bob", "bob@example.com"),
    ];
    let entries = archive_entries(
        package_archive(&template, &records, &underlined_style(), &book).unwrap(),
    );
    let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["Jane_O_Brien_certificate.png", "Bob_certificate.png"]);

    let expected = render_one(&template, "Bob", &underlined_style(), &book).unwrap();
    assert_eq!(entries[1].1, expected);
}

// Known behavior: names that sanitize identically share one entry and the
// later record's certificate replaces the earlier one.
#[test]
fn colliding_file_names_keep_the_last_certificate() {
    let template = blank_template(200, 100);
    let book = fonts();
    let records = vec![
        Record::new("A!", "first@example.com"),
        Record::new("A?", "second@example.com"),
    ];
    assert_eq!(sanitize_file_stem("A!"), sanitize_file_stem("A?"));

    let entries = archive_entries(
        package_archive(&template, &records, &underlined_style(), &book).unwrap(),
    );
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "A__certificate.png");

    let second = render_one(&template, "A?", &underlined_style(), &book).unwrap();
    let first = render_one(&template, "A!", &underlined_style(), &book).unwrap();
    assert_eq!(entries[0].1, second);
    assert_ne!(entries[0].1, first);
}

#[test]
fn template_decode_failure_is_reported() {
    assert!(matches!(
        certmint::TemplateImage::decode(&[0u8; 16]),
        Err(RenderError::TemplateDecode(_))
    ));
}

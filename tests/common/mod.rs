#![allow(dead_code)]

use certmint::{FaceStyle, FontBook, TemplateImage};
use image::{Rgba, RgbaImage};
use rust_xlsxwriter::Workbook;

pub const DEJAVU_SANS: &[u8] = include_bytes!("../fixtures/DejaVuSans.ttf");
/// Covers Latin but not Hebrew, unlike [`DEJAVU_SANS`].
pub const DEJAVU_SANS_MONO: &[u8] = include_bytes!("../fixtures/DejaVuSansMono.ttf");

pub fn fonts() -> FontBook {
    let mut book = FontBook::new();
    book.register("sans-serif", FaceStyle::REGULAR, DEJAVU_SANS.to_vec())
        .unwrap();
    book
}

pub fn blank_template(width: u32, height: u32) -> TemplateImage {
    TemplateImage::from_rgba(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
        .unwrap()
}

/// Single-sheet workbook of string cells; empty strings leave the cell unset.
pub fn xlsx(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

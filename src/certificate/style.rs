use std::fmt;

use image::Rgba;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("position {axis} must be within 0..=100 (got {value})")]
    PositionOutOfRange { axis: char, value: f32 },
    #[error("font size must be a positive number of pixels (got {0})")]
    InvalidFontSize(f32),
    #[error("unsupported color '{0}'")]
    InvalidColor(String),
}

/// Text anchor as percentages of the template's width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Default for Position {
    fn default() -> Self {
        Self { x: 50.0, y: 50.0 }
    }
}

/// Everything that decides how a name is drawn onto a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub position: Position,
    pub font_size_px: f32,
    /// Comma separated family list, most preferred first.
    pub font_family: String,
    /// CSS color: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()` or a basic name.
    pub font_color: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            position: Position::default(),
            font_size_px: 48.0,
            font_family: "Arial, sans-serif".to_string(),
            font_color: "#000000".to_string(),
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

impl StyleConfig {
    /// Check ranges and parse the color.
    pub fn validate(&self) -> Result<Rgba<u8>, StyleError> {
        for (axis, value) in [('x', self.position.x), ('y', self.position.y)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(StyleError::PositionOutOfRange { axis, value });
            }
        }
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(StyleError::InvalidFontSize(self.font_size_px));
        }
        parse_css_color(&self.font_color)
    }

    pub fn font_descriptor(&self) -> FontDescriptor {
        FontDescriptor {
            italic: self.italic,
            bold: self.bold,
            size_px: self.font_size_px,
            family: self.font_family.clone(),
        }
    }
}

/// Font request in CSS shorthand order: `italic bold <size>px <family>`.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescriptor {
    pub italic: bool,
    pub bold: bool,
    pub size_px: f32,
    pub family: String,
}

impl FontDescriptor {
    /// Family names in preference order, unquoted.
    pub fn families(&self) -> impl Iterator<Item = &str> + '_ {
        self.family
            .split(',')
            .map(normalize_family)
            .filter(|name| !name.is_empty())
    }
}

impl fmt::Display for FontDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.italic {
            f.write_str("italic ")?;
        }
        if self.bold {
            f.write_str("bold ")?;
        }
        write!(f, "{}px {}", self.size_px, self.family)
    }
}

pub(crate) fn normalize_family(name: &str) -> &str {
    name.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}

/// Parse the subset of CSS colors accepted for text.
pub fn parse_css_color(input: &str) -> Result<Rgba<u8>, StyleError> {
    let invalid = || StyleError::InvalidColor(input.to_string());
    let value = input.trim().to_ascii_lowercase();

    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(invalid);
    }
    if let Some(args) = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_function(args).ok_or_else(invalid);
    }
    named_color(&value).ok_or_else(invalid)
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, 255])),
        4 => Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?])),
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

fn parse_rgb_function(args: &str) -> Option<Rgba<u8>> {
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    if !(3..=4).contains(&parts.len()) {
        return None;
    }
    let channel = |part: &str| -> Option<u8> {
        let value = match part.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok()? * 2.55,
            None => part.parse::<f32>().ok()?,
        };
        Some(value.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(part) => {
            let value = match part.strip_suffix('%') {
                Some(pct) => pct.parse::<f32>().ok()? / 100.0,
                None => part.parse::<f32>().ok()?,
            };
            (value.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };
    Some(Rgba([
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ]))
}

fn named_color(name: &str) -> Option<Rgba<u8>> {
    let rgb = match name {
        "transparent" => return Some(Rgba([0, 0, 0, 0])),
        "black" => [0x00, 0x00, 0x00],
        "white" => [0xff, 0xff, 0xff],
        "red" => [0xff, 0x00, 0x00],
        "green" => [0x00, 0x80, 0x00],
        "blue" => [0x00, 0x00, 0xff],
        "yellow" => [0xff, 0xff, 0x00],
        "orange" => [0xff, 0xa5, 0x00],
        "purple" => [0x80, 0x00, 0x80],
        "gray" | "grey" => [0x80, 0x80, 0x80],
        "silver" => [0xc0, 0xc0, 0xc0],
        "maroon" => [0x80, 0x00, 0x00],
        "navy" => [0x00, 0x00, 0x80],
        "teal" => [0x00, 0x80, 0x80],
        "gold" => [0xff, 0xd7, 0x00],
        _ => return None,
    };
    Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

//! Color values for fills, blank canvases, and text.
//!
//! Accepted string forms:
//!
//! | Form | Example |
//! |---|---|
//! | short hex | `#08f`, `#08f8` |
//! | long hex | `#000088`, `#fac89664` |
//! | functional | `rgb(0, 0, 136)`, `rgba(250, 200, 150, 100)` |
//! | name | `black`, `white`, `transparent`, ... |
//!
//! Tuples `(r, g, b)` and `(r, g, b, a)` convert directly. The canonical
//! [`Display`](fmt::Display) form is always `#rrggbbaa`, which is what ends up
//! in operation descriptors.

use image::Rgba;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color '{input}': {reason}")]
pub struct ColorError {
    pub input: String,
    pub reason: &'static str,
}

impl ColorError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

const NAMED: &[(&str, Color)] = &[
    ("transparent", Color::rgba(0, 0, 0, 0)),
    ("black", Color::rgb(0, 0, 0)),
    ("white", Color::rgb(255, 255, 255)),
    ("red", Color::rgb(255, 0, 0)),
    ("green", Color::rgb(0, 128, 0)),
    ("lime", Color::rgb(0, 255, 0)),
    ("blue", Color::rgb(0, 0, 255)),
    ("navy", Color::rgb(0, 0, 128)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("gray", Color::rgb(128, 128, 128)),
    ("grey", Color::rgb(128, 128, 128)),
];

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_opaque(self) -> bool {
        self.a == 255
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

fn parse_hex(input: &str, digits: &str) -> Result<Color, ColorError> {
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorError::new(input, "non-hex digit"));
    }
    let expand = |s: &str| -> u8 {
        // Single digits are doubled: `f` → `ff`.
        let v = u8::from_str_radix(s, 16).unwrap_or(0);
        if s.len() == 1 { v * 17 } else { v }
    };
    let width = match digits.len() {
        3 | 4 => 1,
        6 | 8 => 2,
        _ => return Err(ColorError::new(input, "expected 3, 4, 6 or 8 hex digits")),
    };
    let channels: Vec<u8> = (0..digits.len() / width)
        .map(|i| expand(&digits[i * width..(i + 1) * width]))
        .collect();
    Ok(Color {
        r: channels[0],
        g: channels[1],
        b: channels[2],
        a: channels.get(3).copied().unwrap_or(255),
    })
}

fn parse_functional(input: &str, args: &str, expected: usize) -> Result<Color, ColorError> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != expected {
        return Err(ColorError::new(input, "wrong number of components"));
    }
    let mut channels = [255u8; 4];
    for (slot, part) in channels.iter_mut().zip(&parts) {
        *slot = part
            .parse::<u8>()
            .map_err(|_| ColorError::new(input, "component must be 0-255"))?;
    }
    Ok(Color::rgba(channels[0], channels[1], channels[2], channels[3]))
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();

        if let Some(digits) = lower.strip_prefix('#') {
            return parse_hex(s, digits);
        }
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_functional(s, args, 4);
        }
        if let Some(args) = lower
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_functional(s, args, 3);
        }
        NAMED
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, color)| *color)
            .ok_or_else(|| ColorError::new(s, "unknown color name"))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<&str> for Color {
    type Error = ColorError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}

impl From<(u8, u8, u8, u8)> for Color {
    fn from((r, g, b, a): (u8, u8, u8, u8)) -> Self {
        Self::rgba(r, g, b, a)
    }
}

impl From<Rgba<u8>> for Color {
    fn from(Rgba([r, g, b, a]): Rgba<u8>) -> Self {
        Self::rgba(r, g, b, a)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

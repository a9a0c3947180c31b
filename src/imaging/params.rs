//! Parameter types for image operations.
//!
//! ## Types
//!
//! - [`HAlign`] / [`VAlign`] — Where a pasted image or a line of text sits on the canvas.
//! - [`Anchor`] — Axis-independent form of an alignment, used by the calculations.
//! - [`TextParams`] — Everything `text()` needs besides the font itself.

use crate::color::Color;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid alignment '{input}', expected one of: {expected}")]
pub struct AlignError {
    pub input: String,
    pub expected: &'static str,
}

/// Position along one axis: start edge, middle, or end edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Center,
    End,
}

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

/// Vertical alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

impl HAlign {
    pub fn anchor(self) -> Anchor {
        match self {
            HAlign::Left => Anchor::Start,
            HAlign::Center => Anchor::Center,
            HAlign::Right => Anchor::End,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HAlign::Left => "left",
            HAlign::Center => "center",
            HAlign::Right => "right",
        }
    }
}

impl VAlign {
    pub fn anchor(self) -> Anchor {
        match self {
            VAlign::Top => Anchor::Start,
            VAlign::Center => Anchor::Center,
            VAlign::Bottom => Anchor::End,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VAlign::Top => "top",
            VAlign::Center => "center",
            VAlign::Bottom => "bottom",
        }
    }
}

impl FromStr for HAlign {
    type Err = AlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(HAlign::Left),
            "center" => Ok(HAlign::Center),
            "right" => Ok(HAlign::Right),
            _ => Err(AlignError {
                input: s.to_string(),
                expected: "left, center, right",
            }),
        }
    }
}

impl FromStr for VAlign {
    type Err = AlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(VAlign::Top),
            "center" => Ok(VAlign::Center),
            "bottom" => Ok(VAlign::Bottom),
            _ => Err(AlignError {
                input: s.to_string(),
                expected: "top, center, bottom",
            }),
        }
    }
}

impl fmt::Display for HAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for VAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout and style of a text overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    pub h_align: HAlign,
    /// Pixels between the top edge and the top of the text box.
    pub v_offset: i32,
    /// Font size in pixels.
    pub size: f32,
    pub color: Color,
}

//! Shared domain enumerations and value types for render requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::color::Rgba;

/// How a token's vertical position is derived from `y_offset_ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CenterMode {
    /// `y_offset_ratio` places the baseline within the canvas height.
    #[default]
    Visual,
    /// `y_offset_ratio` places the ink bounding box within the canvas height.
    Geometry,
}

impl CenterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CenterMode::Visual => "visual",
            CenterMode::Geometry => "geometry",
        }
    }
}

impl FromStr for CenterMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "visual" => Ok(CenterMode::Visual),
            "geometry" => Ok(CenterMode::Geometry),
            other => Err(format!(
                "unknown center_mode `{other}` (expected visual or geometry)"
            )),
        }
    }
}

/// Rule used to cut content into one token per output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    #[default]
    Single,
    Char,
    Word,
    Line,
    Token,
}

impl SplitMode {
    /// Parse a mode name; anything unrecognised behaves as [`SplitMode::Single`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "char" => SplitMode::Char,
            "word" => SplitMode::Word,
            "line" => SplitMode::Line,
            "token" => SplitMode::Token,
            _ => SplitMode::Single,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SplitMode::Single => "single",
            SplitMode::Char => "char",
            SplitMode::Word => "word",
            SplitMode::Line => "line",
            SplitMode::Token => "token",
        }
    }
}

/// Identifier of whoever submitted a job; deliveries are addressed to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequesterId(String);

impl RequesterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe form used in working directory names.
    pub fn path_component(&self) -> String {
        let sanitized: String = self
            .0
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        if sanitized.is_empty() {
            "anonymous".to_string()
        } else {
            sanitized
        }
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully-resolved layout parameters for rendering a single token.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub font_size: u32,
    pub canvas_height: u32,
    /// Derived from the measured text width plus padding when absent.
    pub canvas_width: Option<u32>,
    pub dpi: u32,
    pub center_mode: CenterMode,
    pub x_offset_ratio: f32,
    pub y_offset_ratio: f32,
    pub padding: u32,
    pub text_color: Rgba,
    pub bg_color: Rgba,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            font_size: 48,
            canvas_height: 128,
            canvas_width: None,
            dpi: 72,
            center_mode: CenterMode::Visual,
            x_offset_ratio: 0.5,
            y_offset_ratio: 0.5,
            padding: 0,
            text_color: Rgba::new(0, 0, 0, 255),
            bg_color: Rgba::TRANSPARENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_split_mode_is_single() {
        assert_eq!(SplitMode::from_name("paragraph"), SplitMode::Single);
        assert_eq!(SplitMode::from_name("line"), SplitMode::Line);
    }

    #[test]
    fn requester_component_is_filesystem_safe() {
        assert_eq!(RequesterId::new("user/42:x").path_component(), "user_42_x");
        assert_eq!(RequesterId::new("").path_component(), "anonymous");
    }

    #[test]
    fn center_mode_rejects_unknown_values() {
        assert_eq!("geometry".parse::<CenterMode>(), Ok(CenterMode::Geometry));
        assert!("middle".parse::<CenterMode>().is_err());
    }
}

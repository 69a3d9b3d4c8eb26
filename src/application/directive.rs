//! Directive grammar: leading `key:value` words followed by literal content.
//!
//! ```text
//! font_size:64 text_color:#FF0000 mode:word hello there
//! ```
//!
//! Directive words are consumed left to right. The first word that is not a
//! recognised `key:value` pair ends the directive section; it and everything
//! after it is content, even when it contains colons.

use thiserror::Error;

use crate::domain::color::{ColorError, Rgba, parse_color};
use crate::domain::types::{CenterMode, RenderParams, SplitMode};

/// Layout options accepted in a directive.
pub const LAYOUT_KEYS: [&str; 10] = [
    "font_size",
    "canvas_height",
    "canvas_width",
    "dpi",
    "center_mode",
    "x_offset_ratio",
    "y_offset_ratio",
    "padding",
    "text_color",
    "bg_color",
];

/// Keys that steer the job rather than the layout.
pub const CONTROL_KEYS: [&str; 2] = ["mode", "font"];

/// Largest accepted size for any single pixel dimension option.
pub const MAX_DIMENSION: i64 = 16_384;

#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveValue {
    Int(i64),
    Float(f64),
    Text(String),
    Color(Rgba),
}

impl DirectiveValue {
    /// Cast a raw value: integer first, then float, otherwise plain text.
    pub fn cast(raw: &str) -> Self {
        if let Ok(value) = raw.parse::<i64>() {
            return DirectiveValue::Int(value);
        }
        if let Ok(value) = raw.parse::<f64>() {
            return DirectiveValue::Float(value);
        }
        DirectiveValue::Text(raw.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectiveError {
    #[error("`{key}`: {source}")]
    Color {
        key: &'static str,
        #[source]
        source: ColorError,
    },
    #[error("`{key}` expects {expected}, got `{value}`")]
    Type {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("`{key}` {reason}")]
    Range { key: &'static str, reason: String },
}

/// Output of [`parse`]: recognised options, control keys and the residual content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedDirective {
    /// Layout options in the order they appeared; later entries win.
    pub options: Vec<(&'static str, DirectiveValue)>,
    pub mode: Option<String>,
    pub font: Option<String>,
    /// Per-directive format errors (malformed colors). Parsing continues past them.
    pub errors: Vec<DirectiveError>,
    pub content: String,
}

impl ParsedDirective {
    pub fn split_mode(&self) -> SplitMode {
        self.mode
            .as_deref()
            .map(SplitMode::from_name)
            .unwrap_or_default()
    }

    /// Overlay the parsed options onto `base`, validating types and ranges.
    pub fn apply(&self, base: &RenderParams) -> Result<RenderParams, DirectiveError> {
        if let Some(error) = self.errors.first() {
            return Err(error.clone());
        }

        let mut params = base.clone();
        for (key, value) in &self.options {
            let key = *key;
            match key {
                "font_size" => params.font_size = positive_dimension(key, value)?,
                "canvas_height" => params.canvas_height = positive_dimension(key, value)?,
                "dpi" => params.dpi = positive_dimension(key, value)?,
                "canvas_width" => params.canvas_width = Some(dimension(key, value)?),
                "padding" => params.padding = dimension(key, value)?,
                "x_offset_ratio" => params.x_offset_ratio = ratio(key, value)?,
                "y_offset_ratio" => params.y_offset_ratio = ratio(key, value)?,
                "center_mode" => {
                    params.center_mode = match value {
                        DirectiveValue::Text(text) => text
                            .parse::<CenterMode>()
                            .map_err(|reason| DirectiveError::Range { key, reason })?,
                        other => return Err(type_error(key, "visual or geometry", other)),
                    }
                }
                "text_color" | "bg_color" => {
                    let DirectiveValue::Color(color) = value else {
                        return Err(type_error(key, "a color", value));
                    };
                    if key == "text_color" {
                        params.text_color = *color;
                    } else {
                        params.bg_color = *color;
                    }
                }
                _ => {}
            }
        }

        Ok(params)
    }
}

/// Split `raw` into directives and literal content.
pub fn parse(raw: &str) -> ParsedDirective {
    let mut parsed = ParsedDirective::default();
    let mut rest = raw;

    loop {
        let trimmed = rest.trim_start();
        let word_len = trimmed
            .find(char::is_whitespace)
            .unwrap_or(trimmed.len());
        let word = &trimmed[..word_len];

        let Some((key, value)) = word.split_once(':') else {
            break;
        };
        let Some(key) = recognised_key(key) else {
            break;
        };

        match key {
            "mode" => parsed.mode = Some(value.to_string()),
            "font" => parsed.font = Some(value.to_string()),
            "text_color" | "bg_color" => match parse_color(value) {
                Ok(color) => parsed.options.push((key, DirectiveValue::Color(color))),
                Err(source) => parsed.errors.push(DirectiveError::Color { key, source }),
            },
            _ => parsed.options.push((key, DirectiveValue::cast(value))),
        }

        rest = &trimmed[word_len..];
    }

    parsed.content = normalize_content(rest.trim_start());
    parsed
}

fn recognised_key(key: &str) -> Option<&'static str> {
    LAYOUT_KEYS
        .iter()
        .chain(CONTROL_KEYS.iter())
        .find(|candidate| **candidate == key)
        .copied()
}

fn normalize_content(rest: &str) -> String {
    let lines: Vec<String> = rest
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    lines.join("\n").trim_end().to_string()
}

fn type_error(key: &'static str, expected: &'static str, value: &DirectiveValue) -> DirectiveError {
    let value = match value {
        DirectiveValue::Int(v) => v.to_string(),
        DirectiveValue::Float(v) => v.to_string(),
        DirectiveValue::Text(v) => v.clone(),
        DirectiveValue::Color(c) => format!("#{:02X}{:02X}{:02X}{:02X}", c.r, c.g, c.b, c.a),
    };
    DirectiveError::Type {
        key,
        expected,
        value,
    }
}

fn dimension(key: &'static str, value: &DirectiveValue) -> Result<u32, DirectiveError> {
    let DirectiveValue::Int(raw) = value else {
        return Err(type_error(key, "an integer", value));
    };
    if !(0..=MAX_DIMENSION).contains(raw) {
        return Err(DirectiveError::Range {
            key,
            reason: format!("must be between 0 and {MAX_DIMENSION}"),
        });
    }
    Ok(*raw as u32)
}

fn positive_dimension(key: &'static str, value: &DirectiveValue) -> Result<u32, DirectiveError> {
    let parsed = dimension(key, value)?;
    if parsed == 0 {
        return Err(DirectiveError::Range {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(parsed)
}

fn ratio(key: &'static str, value: &DirectiveValue) -> Result<f32, DirectiveError> {
    let raw = match value {
        DirectiveValue::Int(v) => *v as f64,
        DirectiveValue::Float(v) => *v,
        other => return Err(type_error(key, "a number", other)),
    };
    if !raw.is_finite() {
        return Err(DirectiveError::Range {
            key,
            reason: "must be a finite number".to_string(),
        });
    }
    Ok(raw as f32)
}

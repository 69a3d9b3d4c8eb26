//! Content splitting: one token per output image.

use crate::domain::types::SplitMode;

/// Split `text` into ordered tokens according to `mode`.
///
/// An empty result is legal here; callers must reject it before queueing work.
pub fn split(text: &str, mode: SplitMode) -> Vec<String> {
    match mode {
        SplitMode::Char => text
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .map(String::from)
            .collect(),
        SplitMode::Word => text.split_whitespace().map(String::from).collect(),
        SplitMode::Line => text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(String::from)
            .collect(),
        SplitMode::Token => text
            .split('|')
            .filter(|entry| !entry.trim().is_empty())
            .map(String::from)
            .collect(),
        SplitMode::Single => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
    }
}

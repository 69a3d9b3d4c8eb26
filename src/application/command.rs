//! Host command payloads: `[texttool] generate <directive> | task | font_list`.

/// Group word the host may leave in front of the subcommand.
pub const COMMAND_GROUP: &str = "texttool";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Raw directive text after `generate`, leading whitespace removed, newlines kept.
    Generate(String),
    Task,
    FontList,
    Unknown(String),
}

impl HostCommand {
    pub fn parse(raw: &str) -> Self {
        let mut rest = raw.trim_start();
        if let Some(after) = strip_word(rest, COMMAND_GROUP) {
            rest = after;
        }

        if let Some(directive) = strip_word(rest, "generate") {
            return Self::Generate(directive.to_string());
        }

        match rest.trim() {
            "task" => Self::Task,
            "font_list" => Self::FontList,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Strip `word` when it is the first whitespace-delimited word of `text`.
fn strip_word<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(word)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.starts_with(char::is_whitespace)
        .then(|| rest.trim_start())
}

//! Structure of a generated battle log
//!
//! Blank lines separate paragraphs, `"> "` starts a line of dialogue and
//! `**...**` marks an ability being used.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Ability(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    Break,
    Dialogue(Vec<Span>),
    Prose(Vec<Span>),
}

pub fn parse_battle_log(text: &str) -> Vec<LogLine> {
    text.lines()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                LogLine::Break
            } else if let Some(speech) = trimmed.strip_prefix("> ") {
                LogLine::Dialogue(parse_spans(speech))
            } else {
                LogLine::Prose(parse_spans(trimmed))
            }
        })
        .collect()
}

/// Splits a line on non-greedy `**...**` pairs; an unmatched `**` stays literal text
pub fn parse_spans(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = line;

    while let Some(start) = rest.find("**") {
        let after_open = &rest[start + 2..];
        let Some(len) = after_open.find("**") else {
            break;
        };
        if start > 0 {
            spans.push(Span::Text(rest[..start].to_string()));
        }
        spans.push(Span::Ability(after_open[..len].to_string()));
        rest = &after_open[len + 2..];
    }

    if !rest.is_empty() {
        spans.push(Span::Text(rest.to_string()));
    }
    spans
}

/// Every distinct ability mentioned in the log, in order of first use
pub fn mentioned_abilities(text: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for line in parse_battle_log(text) {
        let spans = match line {
            LogLine::Dialogue(spans) | LogLine::Prose(spans) => spans,
            LogLine::Break => continue,
        };
        for span in spans {
            if let Span::Ability(name) = span {
                if !name.is_empty() && !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
    }
    seen
}

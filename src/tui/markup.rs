//! Console markup used for log lines and the status footer.
//!
//! Styles are written inline as `[style]text[/]`, e.g. `[bold white]done[/]` or
//! `[grey53 on black]x[/grey53 on black]`. A literal bracket is written as `\[`
//! and a literal backslash as `\\`; [`escape`] produces that form from arbitrary
//! text so user supplied strings can never open or close a style.

use std::str::FromStr;

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Escape `text` so that it renders literally when embedded into markup.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '[' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Render `markup` into a styled line.
///
/// Malformed markup never fails: tags whose style can't be parsed and closing
/// tags without a matching opener are kept as literal text, and styles still
/// open at the end of the input are closed implicitly.
pub fn to_line(markup: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut stack: Vec<(String, Style)> = Vec::new();
    let mut text = String::new();

    let mut rest = markup;
    while let Some(ch) = rest.chars().next() {
        match ch {
            '\\' => {
                let mut chars = rest.chars();
                chars.next();
                match chars.next() {
                    Some(next @ ('[' | '\\')) => {
                        text.push(next);
                        rest = &rest[2..];
                    }
                    _ => {
                        text.push('\\');
                        rest = &rest[1..];
                    }
                }
            }
            '[' => {
                let Some(end) = tag_end(rest) else {
                    text.push('[');
                    rest = &rest[1..];
                    continue;
                };
                let tag = &rest[1..end];
                let consumed = &rest[..=end];
                rest = &rest[end + 1..];

                if let Some(name) = tag.strip_prefix('/') {
                    let name = name.trim();
                    let position = if name.is_empty() {
                        stack.len().checked_sub(1)
                    } else {
                        stack.iter().rposition(|(open, _)| open == name)
                    };
                    match position {
                        Some(index) => {
                            flush(&mut spans, &mut text, &stack);
                            stack.remove(index);
                        }
                        None => text.push_str(consumed),
                    }
                } else if let Some(style) = parse_style(tag) {
                    flush(&mut spans, &mut text, &stack);
                    stack.push((tag.trim().to_string(), style));
                } else {
                    text.push_str(consumed);
                }
            }
            _ => {
                text.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    flush(&mut spans, &mut text, &stack);

    Line::from(spans)
}

/// Plain text of a rendered line, without any styling.
pub fn plain_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

/// Parse a style description such as `bold white on grey15`.
pub fn parse_style(spec: &str) -> Option<Style> {
    let mut style = Style::default();
    let mut words = spec.split_whitespace().peekable();
    words.peek()?;

    while let Some(word) = words.next() {
        let lowered = word.to_ascii_lowercase();
        match lowered.as_str() {
            "on" => style = style.bg(parse_color(words.next()?)?),
            "not" => style = style.remove_modifier(parse_modifier(words.next()?)?),
            _ => {
                if let Some(modifier) = parse_modifier(&lowered) {
                    style = style.add_modifier(modifier);
                } else {
                    style = style.fg(parse_color(&lowered)?);
                }
            }
        }
    }
    Some(style)
}

fn parse_modifier(word: &str) -> Option<Modifier> {
    Some(match word {
        "bold" | "b" => Modifier::BOLD,
        "dim" | "d" => Modifier::DIM,
        "italic" | "i" => Modifier::ITALIC,
        "underline" | "u" => Modifier::UNDERLINED,
        "reverse" | "r" => Modifier::REVERSED,
        "strike" | "s" => Modifier::CROSSED_OUT,
        "blink" => Modifier::SLOW_BLINK,
        _ => return None,
    })
}

fn parse_color(word: &str) -> Option<Color> {
    let lowered = word.to_ascii_lowercase();
    if lowered == "default" {
        return Some(Color::Reset);
    }
    // greyNN / grayNN: NN percent of full brightness
    if let Some(level) = lowered
        .strip_prefix("grey")
        .or_else(|| lowered.strip_prefix("gray"))
        .filter(|digits| !digits.is_empty())
    {
        let percent: u32 = level.parse().ok().filter(|percent| *percent <= 100)?;
        let value = ((percent * 255 + 50) / 100) as u8;
        return Some(Color::Rgb(value, value, value));
    }
    Color::from_str(&lowered).ok()
}

/// Byte index of the `]` closing the tag that starts at `rest[0]`.
fn tag_end(rest: &str) -> Option<usize> {
    for (index, ch) in rest.char_indices().skip(1) {
        match ch {
            ']' if index > 1 => return Some(index),
            ']' | '[' | '\\' | '\n' => return None,
            _ => {}
        }
    }
    None
}

fn flush(spans: &mut Vec<Span<'static>>, text: &mut String, stack: &[(String, Style)]) {
    if text.is_empty() {
        return;
    }
    let style = stack
        .iter()
        .fold(Style::default(), |acc, (_, style)| acc.patch(*style));
    spans.push(Span::styled(std::mem::take(text), style));
}

use anyhow::{anyhow, Result};
use std::str::FromStr;

use strum::{Display, EnumString};
use unicode_width::UnicodeWidthStr;

use crate::logging::record::LogRecord;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which optional columns a rendered log line carries.
///
/// The wall-clock timestamp and the message are always present; each toggle
/// adds exactly one column between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub show_level: bool,
    /// Time elapsed since the log context was created.
    pub show_time: bool,
    pub show_name: bool,
    pub show_callstack: bool,
    pub show_funcname: bool,
    pub show_tid: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            show_level: true,
            show_time: true,
            show_name: true,
            show_callstack: false,
            show_funcname: false,
            show_tid: false,
        }
    }
}

impl FormatOptions {
    /// All optional columns disabled.
    pub fn minimal() -> Self {
        Self {
            show_level: false,
            show_time: false,
            show_name: false,
            show_callstack: false,
            show_funcname: false,
            show_tid: false,
        }
    }

    /// Assemble the line template for the enabled columns.
    pub fn format_string(&self) -> String {
        let mut format = String::from("│ {asctime} ");
        if self.show_level {
            format.push_str("{level:<8} ");
        }
        if self.show_time {
            format.push_str("│ {relative:>9} ");
        }
        if self.show_tid {
            format.push_str("│ [grey53]{tid:<8}[/] ");
        }
        if self.show_name {
            format.push_str("│ [grey53]{name:<16}[/] ");
        }
        if self.show_funcname {
            format.push_str("│ [grey53]{funcname:<32}[/] ");
        }
        if self.show_callstack {
            format.push_str("│ [grey53]{callstack:<32}[/] ");
        }
        format.push_str("│ [bold white]{message}[/]");
        format
    }
}

/// Record attributes a template can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Field {
    Asctime,
    Level,
    Relative,
    Tid,
    Name,
    Funcname,
    Callstack,
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Field {
        field: Field,
        width: usize,
        align: Align,
    },
}

/// A parsed line template such as `│ {asctime} │ [bold]{message}[/]`.
///
/// Placeholders are `{field}`, `{field:<N}`, `{field:>N}` or `{field:N}`,
/// padded to N display columns. `{{` and `}}` produce literal braces. The
/// text around placeholders is markup and passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    pub fn parse(format: &str) -> Result<Self> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = format.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut placeholder = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => placeholder.push(ch),
                            None => {
                                return Err(anyhow!("unterminated placeholder in '{format}'"))
                            }
                        }
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(parse_placeholder(&placeholder)?);
                }
                '}' => return Err(anyhow!("unmatched '}}' in '{format}'")),
                _ => literal.push(ch),
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self { pieces })
    }

    pub fn for_options(options: &FormatOptions) -> Result<Self> {
        Self::parse(&options.format_string())
    }

    /// Fields referenced by the template, in order.
    pub fn fields(&self) -> Vec<Field> {
        self.pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Field { field, .. } => Some(*field),
                Piece::Literal(_) => None,
            })
            .collect()
    }

    /// Render `record` into markup. The record's text attributes are expected
    /// to be escaped already; missing optional attributes render as blanks.
    pub fn render(&self, record: &LogRecord) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Field {
                    field,
                    width,
                    align,
                } => {
                    let value = field_value(*field, record);
                    let padded = pad(&value, *width, *align);
                    match field_style(*field, record) {
                        Some(style) => {
                            out.push('[');
                            out.push_str(style);
                            out.push(']');
                            out.push_str(&padded);
                            out.push_str("[/]");
                        }
                        None => out.push_str(&padded),
                    }
                }
            }
        }
        out
    }
}

fn parse_placeholder(placeholder: &str) -> Result<Piece> {
    let (name, spec) = match placeholder.split_once(':') {
        Some((name, spec)) => (name.trim(), spec.trim()),
        None => (placeholder.trim(), ""),
    };
    let field =
        Field::from_str(name).map_err(|_| anyhow!("unknown log format field '{name}'"))?;

    let (align, digits) = if let Some(digits) = spec.strip_prefix('>') {
        (Align::Right, digits)
    } else if let Some(digits) = spec.strip_prefix('<') {
        (Align::Left, digits)
    } else {
        (Align::Left, spec)
    };
    let width = if digits.is_empty() {
        0
    } else {
        digits
            .parse()
            .map_err(|_| anyhow!("invalid width '{spec}' for field '{name}'"))?
    };

    Ok(Piece::Field {
        field,
        width,
        align,
    })
}

fn field_value(field: Field, record: &LogRecord) -> String {
    match field {
        Field::Asctime => record.timestamp.format(DATE_FORMAT).to_string(),
        Field::Level => record.level.to_string(),
        Field::Relative => format!("{:.3}s", record.relative.as_secs_f64()),
        Field::Tid => record.thread_id.clone().unwrap_or_default(),
        Field::Name => record.name.clone(),
        Field::Funcname => record.function.clone().unwrap_or_default(),
        Field::Callstack => record.callstack.clone().unwrap_or_default(),
        Field::Message => {
            let mut message = record.message.clone();
            for (key, value) in &record.args {
                message.push(' ');
                message.push_str(key);
                message.push('=');
                message.push_str(value);
            }
            message
        }
    }
}

fn field_style(field: Field, record: &LogRecord) -> Option<&'static str> {
    match field {
        Field::Level => Some(level_style(record.level)),
        _ => None,
    }
}

/// Markup style of the level column.
pub fn level_style(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "bold red",
        log::Level::Warn => "red",
        log::Level::Info => "blue",
        log::Level::Debug => "green",
        log::Level::Trace => "dim",
    }
}

/// Pad to `width` display columns. Longer values are kept whole; escape
/// backslashes do not count towards the width.
fn pad(value: &str, width: usize, align: Align) -> String {
    let visible = value.width().saturating_sub(escapes(value));
    let fill = " ".repeat(width.saturating_sub(visible));
    match align {
        Align::Left => format!("{value}{fill}"),
        Align::Right => format!("{fill}{value}"),
    }
}

/// Number of escape backslashes, i.e. those in front of `[` or `\`.
fn escapes(value: &str) -> usize {
    let mut count = 0;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' && matches!(chars.next(), Some('[' | '\\')) {
            count += 1;
        }
    }
    count
}

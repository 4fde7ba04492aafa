//! Record filters applied by the log pane handler before formatting.
//!
//! Every filter is a plain function taking the record by value; returning
//! `None` drops the record. Filters that inspect the calling context (thread id,
//! call stack) must run on the emitting thread, which the dispatcher in
//! [`crate::logging::context`] guarantees.

use std::backtrace::Backtrace;

use unicode_width::UnicodeWidthStr;

use crate::{logging::record::LogRecord, tui::markup};

pub type RecordFilter = fn(LogRecord) -> Option<LogRecord>;

/// Display width logger names are shortened to.
pub const LOGGER_NAME_WIDTH: usize = 16;

/// Number of application frames kept in the call-stack summary.
const CALLSTACK_DEPTH: usize = 6;

/// Frames from these crates are never part of a call-stack summary.
const RUNTIME_CRATES: &[&str] = &["std::", "core::", "alloc::", "test::", "log::", "backtrace::"];

/// Process entry and thread start symbols.
const RUNTIME_SYMBOLS: &[&str] = &["main", "_start", "start_thread", "clone", "clone3", "<unknown>"];

/// Attach a summary of the application frames that led to the log call.
pub fn callstack_filter(mut record: LogRecord) -> Option<LogRecord> {
    let frames = application_frames(&capture_frames());
    record.callstack = Some(summarize_callstack(&frames));
    Some(record)
}

/// Attach the name of the function that emitted the record.
pub fn function_name_filter(mut record: LogRecord) -> Option<LogRecord> {
    let frames = application_frames(&capture_frames());
    record.function = innermost_function(&frames, record.module_path.as_deref());
    Some(record)
}

/// Attach the OS thread id of the emitting thread.
pub fn thread_id_filter(mut record: LogRecord) -> Option<LogRecord> {
    record.thread_id = Some(current_thread_id());
    Some(record)
}

/// Escape the free-text attributes injected by earlier filters.
pub fn markup_escape_filter(mut record: LogRecord) -> Option<LogRecord> {
    record.name = markup::escape(&record.name);
    record.callstack = record.callstack.as_deref().map(markup::escape);
    record.function = record.function.as_deref().map(markup::escape);
    Some(record)
}

/// Normalize the logger name to dotted form and abbreviate it to fit
/// [`LOGGER_NAME_WIDTH`] columns.
pub fn logger_name_filter(mut record: LogRecord) -> Option<LogRecord> {
    record.name = shorten_logger_name(&record.name, LOGGER_NAME_WIDTH);
    Some(record)
}

/// `trickkiste::tui::scrollback` becomes `t.tui.scrollback`: leading segments
/// collapse to their first character, left to right, until the name fits.
/// The last segment is never shortened.
pub fn shorten_logger_name(name: &str, width: usize) -> String {
    let mut segments: Vec<String> = name
        .split("::")
        .flat_map(|part| part.split('.'))
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();

    let joined = |segments: &[String]| segments.join(".");
    let last = segments.len().saturating_sub(1);
    for index in 0..last {
        if joined(&segments).width() <= width {
            break;
        }
        // an escaped bracket is abbreviated together with its backslash
        let mut chars = segments[index].chars();
        let abbreviated = match chars.next() {
            Some('\\') => chars.next().map(|escaped| format!("\\{escaped}")),
            first => first.map(String::from),
        };
        if let Some(abbreviated) = abbreviated {
            segments[index] = abbreviated;
        }
    }
    joined(&segments)
}

/// OS level id of the calling thread.
#[cfg(target_os = "linux")]
pub fn current_thread_id() -> String {
    // SAFETY: gettid has no preconditions and cannot fail.
    let tid = unsafe { libc::gettid() };
    tid.to_string()
}

/// Id of the calling thread as assigned by the standard library.
#[cfg(not(target_os = "linux"))]
pub fn current_thread_id() -> String {
    let id = format!("{:?}", std::thread::current().id());
    id.trim_start_matches("ThreadId(")
        .trim_end_matches(')')
        .to_string()
}

/// Symbol names of the current call stack, innermost first.
fn capture_frames() -> Vec<String> {
    parse_backtrace(&Backtrace::force_capture().to_string())
}

/// Extract frame symbols from the textual form of a `std::backtrace::Backtrace`.
pub(crate) fn parse_backtrace(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let (index, symbol) = line.trim().split_once(": ")?;
            index.parse::<usize>().ok()?;
            Some(strip_symbol_hash(symbol.trim()).to_string())
        })
        .collect()
}

/// Frames above the logging machinery, innermost first, shortened to
/// `module::function`.
pub(crate) fn application_frames(frames: &[String]) -> Vec<String> {
    let start = frames
        .iter()
        .rposition(|frame| is_logging_frame(frame))
        .map_or(0, |index| index + 1);

    let mut kept: Vec<String> = frames[start..]
        .iter()
        .filter(|frame| !is_runtime_frame(frame))
        .map(|frame| short_frame_name(frame))
        .collect();
    kept.dedup();
    kept.reverse();
    kept
}

/// Innermost application frame, else the module path of the call site.
fn innermost_function(frames: &[String], module_path: Option<&str>) -> Option<String> {
    frames
        .last()
        .cloned()
        .or_else(|| module_path.map(str::to_string))
}

/// Outermost first, limited to the innermost [`CALLSTACK_DEPTH`] frames.
fn summarize_callstack(frames: &[String]) -> String {
    let skip = frames.len().saturating_sub(CALLSTACK_DEPTH);
    frames[skip..].join(" > ")
}

fn is_logging_frame(frame: &str) -> bool {
    let frame = frame.trim_start_matches('<');
    (frame.starts_with("trickkiste::logging::") && !frame.contains("::tests::"))
        || frame.starts_with("log::")
        || frame.starts_with("std::backtrace")
}

fn is_runtime_crate(path: &str) -> bool {
    RUNTIME_CRATES.iter().any(|prefix| path.starts_with(prefix))
}

fn is_runtime_frame(frame: &str) -> bool {
    if frame.starts_with("__") || RUNTIME_SYMBOLS.contains(&frame) {
        return true;
    }
    match split_trait_impl(frame) {
        // `<F as core::ops::FnOnce<()>>::call_once` is a runtime shim, while
        // `<myapp::Port as core::fmt::Display>::fmt` is application code.
        Some((self_type, trait_path, _)) => {
            is_runtime_crate(self_type)
                || (is_runtime_crate(trait_path) && !self_type.contains("::"))
        }
        None => is_runtime_crate(frame.trim_start_matches('<')),
    }
}

/// `<Type as Trait>::method` split into its three parts.
fn split_trait_impl(frame: &str) -> Option<(&str, &str, &str)> {
    let (self_type, rest) = frame.strip_prefix('<')?.split_once(" as ")?;
    let (trait_path, method) = rest.rsplit_once(">::")?;
    Some((self_type, trait_path, method))
}

fn short_frame_name(frame: &str) -> String {
    let frame = match split_trait_impl(frame) {
        Some((self_type, _, method)) => format!("{self_type}::{method}"),
        None => frame.to_string(),
    };
    let segments: Vec<&str> = frame
        .split("::")
        .filter(|segment| !segment.starts_with("{{closure}}"))
        .collect();
    let skip = segments.len().saturating_sub(2);
    segments[skip..].join("::")
}

fn strip_symbol_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::h") {
        Some((head, hash))
            if hash.len() == 16 && hash.chars().all(|ch| ch.is_ascii_hexdigit()) =>
        {
            head
        }
        _ => symbol,
    }
}

//! Log records as seen by the log pane.
//!
//! A [`LogRecord`] is an owned snapshot of a `log::Record` plus the
//! attributes the record filters attach later on (thread id, call stack,
//! function name).
use chrono::{DateTime, Local};
use log::kv::{self, VisitSource};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: log::Level,
    /// Logger name, i.e. the `log` target.
    pub name: String,
    pub timestamp: DateTime<Local>,
    /// Time elapsed since the owning log context was created.
    pub relative: Duration,
    pub message: String,
    /// Key/value pairs attached at the call site, rendered after the message.
    pub args: Vec<(String, String)>,
    pub module_path: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub thread_id: Option<String>,
    pub callstack: Option<String>,
    pub function: Option<String>,
}

impl LogRecord {
    /// Create a record with the current timestamp and no optional attributes.
    pub fn new(level: log::Level, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            name: name.into(),
            timestamp: Local::now(),
            relative: Duration::ZERO,
            message: message.into(),
            args: Vec::new(),
            module_path: None,
            file: None,
            line: None,
            thread_id: None,
            callstack: None,
            function: None,
        }
    }

    /// Snapshot a `log::Record`. `relative` is the time since the log context
    /// started.
    pub fn from_log(record: &log::Record<'_>, relative: Duration) -> Self {
        let mut args = ArgsCollector::default();
        // A failing visitor only truncates the argument list.
        let _ = record.key_values().visit(&mut args);

        Self {
            level: record.level(),
            name: record.target().to_string(),
            timestamp: Local::now(),
            relative,
            message: record.args().to_string(),
            args: args.0,
            module_path: record.module_path().map(str::to_string),
            file: record.file().map(str::to_string),
            line: record.line(),
            thread_id: None,
            callstack: None,
            function: None,
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push((key.into(), value.into()));
        self
    }
}

#[derive(Default)]
struct ArgsCollector(Vec<(String, String)>);

impl<'kvs> VisitSource<'kvs> for ArgsCollector {
    fn visit_pair(&mut self, key: kv::Key<'kvs>, value: kv::Value<'kvs>) -> Result<(), kv::Error> {
        self.0.push((key.to_string(), value.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_log_copies_record_fields() {
        let kvs = [("port", "/dev/ttyUSB0"), ("attempt", "3")];
        let converted = LogRecord::from_log(
            &log::Record::builder()
                .level(log::Level::Warn)
                .target("myapp::serial")
                .module_path(Some("myapp::serial"))
                .file(Some("src/serial.rs"))
                .line(Some(42))
                .key_values(&kvs)
                .args(format_args!("retrying {}", "now"))
                .build(),
            Duration::from_millis(1500),
        );
        assert_eq!(converted.level, log::Level::Warn);
        assert_eq!(converted.name, "myapp::serial");
        assert_eq!(converted.message, "retrying now");
        assert_eq!(converted.relative, Duration::from_millis(1500));
        assert_eq!(converted.line, Some(42));
        assert_eq!(
            converted.args,
            vec![
                ("port".to_string(), "/dev/ttyUSB0".to_string()),
                ("attempt".to_string(), "3".to_string()),
            ]
        );
        assert!(converted.thread_id.is_none());
        assert!(converted.callstack.is_none());
    }
}

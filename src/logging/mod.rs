//! Bridge between the `log` facade and the log pane.
//!
//! [`LogContext`] is the entry point: it is handed to the application shell,
//! installed into `log` on mount and owns the thresholds and the
//! [`LogHandler`] that renders records into styled lines.

pub mod context;
pub mod filters;
pub mod format;
pub mod handler;
pub mod levels;
pub mod record;

pub use context::LogContext;
pub use filters::RecordFilter;
pub use format::{FormatOptions, Template};
pub use handler::LogHandler;
pub use levels::{LevelSpec, LevelTable};
pub use record::LogRecord;

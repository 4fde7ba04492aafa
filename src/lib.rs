//! A base for terminal applications that want a live log pane.
//!
//! [`TuiBaseApp`] composes a scrollable, auto-following log pane with a one
//! line status footer. On mount it routes the `log` facade into the pane
//! through an explicitly owned [`LogContext`]: every record is escaped,
//! passed through the record filters, formatted according to the enabled
//! [`FormatOptions`] columns and appended as a styled line. Concrete
//! applications plug in through the [`AppHooks`] trait and add the common
//! logging flags to their own `clap` parser with [`cli::add_default_arguments`].

pub mod cli;
pub mod logging;
pub mod tui;

pub use logging::{FormatOptions, LevelSpec, LogContext, LogHandler, LogRecord};
pub use tui::{AppContext, AppHooks, AppOptions, TuiBaseApp};

use anyhow::{anyhow, Result};
use std::{sync::Arc, time::Instant};

use flume::{Receiver, Sender};
use log::{LevelFilter, Metadata, Record};
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;
use ratatui::text::Line;

use crate::logging::{
    handler::LogHandler,
    levels::{LevelSpec, LevelTable, DEFAULT_OTHERS_LEVEL},
    record::LogRecord,
};

/// Context currently wired to the `log` facade.
static ACTIVE: Lazy<RwLock<Option<Arc<Shared>>>> = Lazy::new(|| RwLock::new(None));
static INSTALLED: OnceCell<()> = OnceCell::new();
static DISPATCHER: Dispatcher = Dispatcher;

struct Shared {
    levels: RwLock<LevelTable>,
    handler: RwLock<Option<Arc<LogHandler>>>,
    started: Instant,
}

impl Shared {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.levels
            .read()
            .enabled(metadata.level(), metadata.target())
    }

    fn dispatch(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Some(handler) = self.handler.read().clone() else {
            return;
        };
        handler.emit(LogRecord::from_log(record, self.started.elapsed()));
    }
}

/// Forwards `log` records to whichever [`LogContext`] is installed.
struct Dispatcher;

impl log::Log for Dispatcher {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        ACTIVE
            .read()
            .as_ref()
            .is_some_and(|shared| shared.enabled(metadata))
    }

    fn log(&self, record: &Record<'_>) {
        let active = ACTIVE.read().clone();
        if let Some(shared) = active {
            shared.dispatch(record);
        }
    }

    fn flush(&self) {}
}

/// Owns the logging setup of an application: severity thresholds, the single
/// installed [`LogHandler`] and the channel rendered lines travel through on
/// their way to the log pane.
///
/// Records can be emitted from any thread. They are filtered and rendered on
/// the emitting thread and only the finished [`Line`] crosses over to the UI.
pub struct LogContext {
    shared: Arc<Shared>,
    line_tx: Sender<Line<'static>>,
    line_rx: Receiver<Line<'static>>,
}

impl LogContext {
    /// Context whose application loggers live below `trickkiste`. Use
    /// [`LogContext::with_root`] to add the host application's own crate.
    pub fn new() -> Self {
        let (line_tx, line_rx) = flume::unbounded();
        Self {
            shared: Arc::new(Shared {
                levels: RwLock::new(LevelTable::new([env!("CARGO_CRATE_NAME")])),
                handler: RwLock::new(None),
                started: Instant::now(),
            }),
            line_tx,
            line_rx,
        }
    }

    /// Treat loggers below `root` as application loggers.
    pub fn with_root(self, root: &str) -> Self {
        self.shared.levels.write().add_root(root);
        self
    }

    /// Route the process-wide `log` facade to this context, replacing any
    /// context installed before. Fails if a logger other than ours was already
    /// registered with `log`.
    pub fn install(&self) -> Result<()> {
        INSTALLED.get_or_try_init(|| {
            log::set_logger(&DISPATCHER)
                .map_err(|err| anyhow!("failed to register log dispatcher: {err}"))
        })?;
        *ACTIVE.write() = Some(Arc::clone(&self.shared));
        log::set_max_level(self.shared.levels.read().max_level());
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        ACTIVE
            .read()
            .as_ref()
            .is_some_and(|shared| Arc::ptr_eq(shared, &self.shared))
    }

    /// Make `handler` the only destination of this context's records.
    pub fn set_handler(&self, handler: LogHandler) {
        *self.shared.handler.write() = Some(Arc::new(handler));
    }

    pub fn has_handler(&self) -> bool {
        self.shared.handler.read().is_some()
    }

    /// Sending side of the pane channel, for building a [`LogHandler`].
    pub fn line_sender(&self) -> Sender<Line<'static>> {
        self.line_tx.clone()
    }

    /// Rendered lines waiting for the pane, in emission order.
    pub fn drain_lines(&self) -> Vec<Line<'static>> {
        self.line_rx.try_iter().collect()
    }

    /// Set the thresholds; see [`LevelTable::apply`].
    pub fn set_levels(&self, levels: &[LevelSpec], others: LevelFilter) {
        let max_level = {
            let mut table = self.shared.levels.write();
            table.apply(levels, others);
            table.max_level()
        };
        if self.is_installed() {
            log::set_max_level(max_level);
        }
    }

    /// Reset to the default thresholds with `levels` applied on top.
    pub fn set_app_levels(&self, levels: &[LevelSpec]) {
        self.set_levels(levels, DEFAULT_OTHERS_LEVEL);
    }

    pub fn levels(&self) -> LevelTable {
        self.shared.levels.read().clone()
    }

    /// Feed a record directly, bypassing the `log` facade.
    pub fn log(&self, record: &Record<'_>) {
        self.shared.dispatch(record);
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LogContext {
    fn drop(&mut self) {
        let mut active = ACTIVE.write();
        if active
            .as_ref()
            .is_some_and(|shared| Arc::ptr_eq(shared, &self.shared))
        {
            *active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{logging::format::FormatOptions, tui::markup::plain_text};

    fn context(options: FormatOptions) -> Result<LogContext> {
        let context = LogContext::new().with_root("myapp");
        context.set_handler(LogHandler::for_options(&options, context.line_sender())?);
        Ok(context)
    }

    fn emit(context: &LogContext, level: log::Level, target: &str, message: &str) {
        context.log(
            &Record::builder()
                .level(level)
                .target(target)
                .args(format_args!("{message}"))
                .build(),
        );
    }

    fn lines(context: &LogContext) -> Vec<String> {
        context
            .drain_lines()
            .iter()
            .map(|line| plain_text(line))
            .collect()
    }

    #[test]
    fn test_thresholds_decide_what_reaches_the_pane() -> Result<()> {
        let context = context(FormatOptions::minimal())?;
        emit(&context, log::Level::Info, "myapp::worker", "app info");
        emit(&context, log::Level::Debug, "myapp::worker", "app debug");
        emit(&context, log::Level::Info, "hyper::client", "lib info");
        emit(&context, log::Level::Warn, "hyper::client", "lib warn");

        let lines = lines(&context);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("app info"));
        assert!(lines[1].ends_with("lib warn"));
        Ok(())
    }

    #[test]
    fn test_set_levels_applies_to_following_records() -> Result<()> {
        let context = context(FormatOptions::minimal())?;
        context.set_levels(
            &[
                LevelSpec::App(LevelFilter::Debug),
                LevelSpec::Target("hyper".to_string(), LevelFilter::Info),
            ],
            LevelFilter::Error,
        );
        emit(&context, log::Level::Debug, "myapp", "1");
        emit(&context, log::Level::Info, "hyper::client", "2");
        emit(&context, log::Level::Warn, "tokio", "3");
        emit(&context, log::Level::Error, "tokio", "4");

        let lines = lines(&context);
        let tails: Vec<&str> = lines
            .iter()
            .filter_map(|line| line.rsplit(' ').next())
            .collect();
        assert_eq!(tails, vec!["1", "2", "4"]);
        Ok(())
    }

    #[test]
    fn test_without_handler_records_are_dropped() {
        let context = LogContext::new();
        emit(&context, log::Level::Error, "trickkiste", "lost");
        assert!(!context.has_handler());
        assert!(context.drain_lines().is_empty());
    }

    #[test]
    fn test_replacing_handler_switches_format() -> Result<()> {
        let context = context(FormatOptions::minimal())?;
        emit(&context, log::Level::Info, "myapp", "before");
        context.set_handler(LogHandler::for_options(
            &FormatOptions {
                show_name: true,
                ..FormatOptions::minimal()
            },
            context.line_sender(),
        )?);
        emit(&context, log::Level::Info, "myapp", "after");

        let lines = lines(&context);
        assert!(!lines[0].contains("myapp"));
        assert!(lines[1].contains("myapp"));
        Ok(())
    }
}

use anyhow::Result;

use flume::Sender;
use ratatui::text::Line;

use crate::{
    logging::{
        filters::{
            callstack_filter, function_name_filter, logger_name_filter, markup_escape_filter,
            thread_id_filter, RecordFilter,
        },
        format::{FormatOptions, Template},
        record::LogRecord,
    },
    tui::markup,
};

/// Filters matching `options`, in the order they have to run.
pub fn standard_filters(options: &FormatOptions) -> Vec<RecordFilter> {
    let mut filters: Vec<RecordFilter> = Vec::new();
    if options.show_callstack {
        filters.push(callstack_filter);
    }
    if options.show_funcname {
        filters.push(function_name_filter);
    }
    if options.show_tid {
        filters.push(thread_id_filter);
    }
    filters.push(markup_escape_filter);
    filters.push(logger_name_filter);
    filters
}

/// Turns log records into styled lines for the log pane.
///
/// Each record has its message and arguments escaped, runs through the
/// filters in installation order, is formatted with the template and is then
/// sent to the pane as a ready-made [`Line`].
pub struct LogHandler {
    template: Template,
    filters: Vec<RecordFilter>,
    sink: Sender<Line<'static>>,
}

impl LogHandler {
    pub fn new(template: Template, sink: Sender<Line<'static>>) -> Self {
        Self {
            template,
            filters: Vec::new(),
            sink,
        }
    }

    /// Handler with the template and the filter chain for `options`.
    pub fn for_options(options: &FormatOptions, sink: Sender<Line<'static>>) -> Result<Self> {
        let mut handler = Self::new(Template::for_options(options)?, sink);
        for filter in standard_filters(options) {
            handler.add_filter(filter);
        }
        Ok(handler)
    }

    pub fn add_filter(&mut self, filter: RecordFilter) {
        self.filters.push(filter);
    }

    pub fn filters(&self) -> &[RecordFilter] {
        &self.filters
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Escape the user supplied text of `record` and run the filter chain.
    /// `None` means a filter dropped the record.
    pub fn prepare(&self, mut record: LogRecord) -> Option<LogRecord> {
        record.message = markup::escape(&record.message);
        for (_, value) in record.args.iter_mut() {
            *value = markup::escape(value);
        }
        self.filters
            .iter()
            .try_fold(record, |record, filter| filter(record))
    }

    /// Markup for `record`, or `None` if it was filtered out.
    pub fn format(&self, record: LogRecord) -> Option<String> {
        self.prepare(record)
            .map(|record| self.template.render(&record))
    }

    pub fn render(&self, record: LogRecord) -> Option<Line<'static>> {
        self.format(record).map(|markup| markup::to_line(&markup))
    }

    /// Render `record` and hand it to the pane. Lines for a pane that is gone
    /// are dropped.
    pub fn emit(&self, record: LogRecord) {
        if let Some(line) = self.render(record) {
            let _ = self.sink.send(line);
        }
    }
}

//! Base application shell: a log pane, a status footer and the event loop
//! that keeps both up to date.

pub mod input;
pub mod markup;
pub mod rendering;
pub mod scrollback;
pub mod status;

use anyhow::Result;
use std::{io, time::Duration};

use clap::Command;
use crossterm::event::{Event, KeyEvent};
use log::LevelFilter;
use ratatui::{backend::CrosstermBackend, prelude::*};

use crate::{
    logging::{
        levels::{LevelSpec, DEFAULT_APP_LEVEL, DEFAULT_OTHERS_LEVEL},
        FormatOptions, LogContext, LogHandler,
    },
    tui::{input::Action, scrollback::Scrollback, status::StatusHandle},
};

/// Construction time settings of a [`TuiBaseApp`].
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub format: FormatOptions,
    /// Lines kept in the log pane before the oldest are dropped.
    pub max_lines: usize,
    /// Longest time the loop waits for input before redrawing.
    pub tick_rate: Duration,
    pub title: String,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            format: FormatOptions::default(),
            max_lines: 10_000,
            tick_rate: Duration::from_millis(100),
            title: "log".to_string(),
        }
    }
}

/// Extension points of a concrete application. Every hook has a no-op
/// default, so implementors only override what they need.
pub trait AppHooks {
    /// Called once after the log pane is mounted and logging is routed to it.
    fn initialize(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called for every key press before the built-in bindings. Return `true`
    /// to consume the key.
    fn on_key(&mut self, _key: &KeyEvent, _ctx: &mut AppContext<'_>) -> Result<bool> {
        Ok(false)
    }

    /// Called once per loop iteration, before drawing.
    fn on_tick(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called after the event loop has ended and the terminal is restored.
    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }
}

impl AppHooks for () {}

/// What hooks get to touch while the application runs.
pub struct AppContext<'a> {
    logging: &'a LogContext,
    status: &'a StatusHandle,
    log_levels: &'a mut Vec<LevelSpec>,
    others_level: &'a mut LevelFilter,
    quit: &'a mut bool,
}

impl AppContext<'_> {
    pub fn update_status_bar(&self, text: impl Into<String>) {
        self.status.set(text);
    }

    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    pub fn set_log_levels(&mut self, levels: &[LevelSpec], others: LevelFilter) {
        apply_log_levels(
            self.logging,
            self.log_levels,
            self.others_level,
            levels,
            others,
        );
    }

    pub fn log_levels(&self) -> &[LevelSpec] {
        self.log_levels.as_slice()
    }

    pub fn logging(&self) -> &LogContext {
        self.logging
    }

    /// Leave the event loop after the current iteration.
    pub fn quit(&mut self) {
        *self.quit = true;
    }
}

fn apply_log_levels(
    logging: &LogContext,
    current: &mut Vec<LevelSpec>,
    current_others: &mut LevelFilter,
    levels: &[LevelSpec],
    others: LevelFilter,
) {
    logging.set_levels(levels, others);
    *current = levels.to_vec();
    *current_others = others;
}

/// A terminal application with a live log pane and a status footer.
///
/// On [`mount`](TuiBaseApp::mount) the application's [`LogContext`] is
/// routed to the pane: the handler is built from the format toggles, the
/// thresholds are applied and [`AppHooks::initialize`] runs.
/// [`execute`](TuiBaseApp::execute) does all of that inside a real terminal.
pub struct TuiBaseApp<H: AppHooks = ()> {
    options: AppOptions,
    logging: LogContext,
    scrollback: Scrollback,
    status: StatusHandle,
    log_levels: Vec<LevelSpec>,
    others_level: LevelFilter,
    hooks: H,
    mounted: bool,
    quit: bool,
}

impl<H: AppHooks> TuiBaseApp<H> {
    pub fn new(options: AppOptions, logging: LogContext, hooks: H) -> Self {
        let scrollback = Scrollback::new()
            .with_max_lines(options.max_lines)
            .with_title(options.title.clone());
        Self {
            options,
            logging,
            scrollback,
            status: StatusHandle::default(),
            log_levels: vec![LevelSpec::App(DEFAULT_APP_LEVEL)],
            others_level: DEFAULT_OTHERS_LEVEL,
            hooks,
            mounted: false,
            quit: false,
        }
    }

    /// Add the common logging flags to the host application's parser.
    pub fn add_default_arguments(command: Command) -> Command {
        crate::cli::add_default_arguments(command)
    }

    pub fn update_status_bar(&self, text: impl Into<String>) {
        self.status.set(text);
    }

    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Minimum levels shown in the log pane. `others` applies to every logger
    /// that is neither an application logger nor named in `levels`.
    pub fn set_log_levels(&mut self, levels: &[LevelSpec], others: LevelFilter) {
        apply_log_levels(
            &self.logging,
            &mut self.log_levels,
            &mut self.others_level,
            levels,
            others,
        );
    }

    pub fn log_levels(&self) -> &[LevelSpec] {
        &self.log_levels
    }

    pub fn options(&self) -> &AppOptions {
        &self.options
    }

    pub fn logging(&self) -> &LogContext {
        &self.logging
    }

    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    pub fn scrollback_mut(&mut self) -> &mut Scrollback {
        &mut self.scrollback
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    fn split(&mut self) -> (&mut H, AppContext<'_>) {
        let Self {
            logging,
            status,
            log_levels,
            others_level,
            hooks,
            quit,
            ..
        } = self;
        (
            hooks,
            AppContext {
                logging,
                status,
                log_levels,
                others_level,
                quit,
            },
        )
    }

    /// Route logging to the pane and run [`AppHooks::initialize`]. Mounting
    /// twice is a no-op.
    pub fn mount(&mut self) -> Result<()> {
        if self.mounted {
            return Ok(());
        }

        self.logging.install()?;
        self.logging.set_handler(LogHandler::for_options(
            &self.options.format,
            self.logging.line_sender(),
        )?);
        let levels = self.log_levels.clone();
        self.set_log_levels(&levels, self.others_level);
        self.mounted = true;
        log::debug!("log pane mounted with levels {levels:?}");

        let (hooks, mut ctx) = self.split();
        hooks.initialize(&mut ctx)
    }

    /// Move lines rendered since the last call into the pane.
    pub fn pump_logs(&mut self) -> usize {
        let lines = self.logging.drain_lines();
        let count = lines.len();
        for line in lines {
            self.scrollback.write(line);
        }
        count
    }

    pub fn handle_event(&mut self, event: &Event) -> Result<()> {
        if let Event::Key(key) = event {
            let (hooks, mut ctx) = self.split();
            if hooks.on_key(key, &mut ctx)? {
                return Ok(());
            }
        }

        match input::map_event(event) {
            Action::Quit => self.quit = true,
            Action::ScrollUp(amount) => self.scrollback.scroll_up(amount),
            Action::ScrollDown(amount) => self.scrollback.scroll_down(amount),
            Action::PageUp => self.scrollback.page_up(),
            Action::PageDown => self.scrollback.page_down(),
            Action::ScrollHome => self.scrollback.scroll_home(),
            Action::ScrollEnd => self.scrollback.scroll_end(),
            Action::ClearLog => self.scrollback.clear(),
            Action::None => {}
        }
        Ok(())
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let status = self.status.get();
        rendering::render_ui(frame, &mut self.scrollback, &status);
    }

    /// One loop iteration without waiting for input.
    pub fn tick<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.pump_logs();
        let (hooks, mut ctx) = self.split();
        hooks.on_tick(&mut ctx)?;
        // lines logged by the hook show up in the same frame
        self.pump_logs();
        terminal.draw(|frame| self.draw(frame))?;
        Ok(())
    }

    /// Drive the event loop on `terminal` until a quit is requested.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.mount()?;
        while !self.quit {
            self.tick(terminal)?;
            if self.quit {
                break;
            }
            if crossterm::event::poll(self.options.tick_rate)? {
                let event = crossterm::event::read()?;
                self.handle_event(&event)?;
            }
        }
        terminal.clear()?;
        Ok(())
    }

    /// Take over the terminal, run until the user quits, restore the terminal
    /// and finally run [`AppHooks::cleanup`].
    pub fn execute(mut self) -> Result<()> {
        let mut stdout = io::stdout();
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            stdout,
            crossterm::terminal::EnterAlternateScreen,
            crossterm::event::EnableMouseCapture
        )?;

        let result = (|| {
            let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
            self.run(&mut terminal)
        })();

        let restored = restore_terminal();
        let cleaned = self.hooks.cleanup();

        result?;
        restored?;
        cleaned
    }
}

fn restore_terminal() -> Result<()> {
    crossterm::execute!(
        io::stdout(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableMouseCapture
    )?;
    crossterm::terminal::disable_raw_mode()?;
    Ok(())
}

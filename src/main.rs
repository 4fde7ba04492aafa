use anyhow::{anyhow, Result};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use clap::{Arg, ArgAction, Command};
use crossterm::event::{KeyCode, KeyEvent};
use log::LevelFilter;

use trickkiste::{
    cli::{add_default_arguments, log_levels_from_matches},
    AppContext, AppHooks, AppOptions, FormatOptions, LevelSpec, LogContext, TuiBaseApp,
};

/// Demo application: a worker thread produces log records of every level
/// and reports its progress in the status footer.
#[derive(Default)]
struct Demo {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    verbose: bool,
}

impl AppHooks for Demo {
    fn initialize(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        let status = ctx.status_handle();
        let stop = Arc::clone(&self.stop);
        status.set("[bold]demo[/] starting worker");

        self.worker = Some(
            thread::Builder::new()
                .name("demo-worker".to_string())
                .spawn(move || {
                    let mut round: u64 = 0;
                    while !stop.load(Ordering::Relaxed) {
                        round += 1;
                        match round % 5 {
                            0 => log::warn!("round {round}: queue is getting long"),
                            1 => log::info!(attempt = round; "polling [device] #{round}"),
                            2 => log::debug!("round {round}: nothing to do"),
                            3 => log::trace!("round {round}: heartbeat"),
                            _ => log::error!(target: "thirdparty::driver", "round {round}: timeout"),
                        }
                        status.set(format!(
                            "[bold]demo[/] │ round [green]{round}[/] │ q quit  v verbose  c clear"
                        ));
                        thread::sleep(Duration::from_millis(400));
                    }
                })?,
        );
        log::info!("demo initialized");
        Ok(())
    }

    fn on_key(&mut self, key: &KeyEvent, ctx: &mut AppContext<'_>) -> Result<bool> {
        if key.code != KeyCode::Char('v') {
            return Ok(false);
        }
        self.verbose = !self.verbose;
        let level = if self.verbose {
            LevelFilter::Trace
        } else {
            LevelFilter::Info
        };
        // keep per-target levels and the third-party level from the command line
        let mut levels: Vec<LevelSpec> = ctx
            .log_levels()
            .iter()
            .filter(|spec| matches!(spec, LevelSpec::Target(..)))
            .cloned()
            .collect();
        levels.push(LevelSpec::App(level));
        let others = ctx.logging().levels().others_level();
        ctx.set_log_levels(&levels, others);
        log::info!("log level set to {level}");
        Ok(true)
    }

    fn cleanup(&mut self) -> Result<()> {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| anyhow!("demo worker panicked"))?;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let matches = add_default_arguments(
        Command::new("trickkiste")
            .about("Log pane demo")
            .arg(
                Arg::new("tid")
                    .long("tid")
                    .help("Show the thread id of every record")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("callstack")
                    .long("callstack")
                    .help("Show the call stack of every record")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("funcname")
                    .long("funcname")
                    .help("Show the emitting function of every record")
                    .action(ArgAction::SetTrue),
            ),
    )
    .get_matches();

    let options = AppOptions {
        format: FormatOptions {
            show_tid: matches.get_flag("tid"),
            show_callstack: matches.get_flag("callstack"),
            show_funcname: matches.get_flag("funcname"),
            ..FormatOptions::default()
        },
        title: "trickkiste demo".to_string(),
        ..AppOptions::default()
    };

    let mut app = TuiBaseApp::new(options, LogContext::new(), Demo::default());
    let (levels, others) = log_levels_from_matches(&matches);
    app.set_log_levels(&levels, others);
    app.update_status_bar("[bold]demo[/]");
    app.execute()
}

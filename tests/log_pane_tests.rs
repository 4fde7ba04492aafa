// End-to-end checks of records travelling from a `LogContext` into the log pane.
// Records are fed through `LogContext::log` so these tests do not depend on
// which context currently owns the process-wide `log` facade.

use anyhow::Result;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use log::{Level, LevelFilter, Record};
use ratatui::{backend::TestBackend, Terminal};
use regex::Regex;

use trickkiste::{
    tui::markup::plain_text, AppOptions, FormatOptions, LevelSpec, LogContext, LogHandler,
    TuiBaseApp,
};

/// Replace the wall clock and elapsed time columns with placeholders.
fn normalize(line: &str) -> Result<String> {
    let asctime = Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}")?;
    let relative = Regex::new(r"\d+\.\d{3}s")?;
    let line = asctime.replace_all(line, "XXXX-XX-XX XX:XX:XX");
    Ok(relative.replace_all(&line, "X.XXXs").to_string())
}

fn emit(context: &LogContext, level: Level, target: &str, message: &str) {
    context.log(
        &Record::builder()
            .level(level)
            .target(target)
            .args(format_args!("{message}"))
            .build(),
    );
}

fn app_with(format: FormatOptions) -> Result<TuiBaseApp> {
    let mut app = TuiBaseApp::new(
        AppOptions {
            format,
            ..AppOptions::default()
        },
        LogContext::new().with_root("myapp"),
        (),
    );
    app.mount()?;
    Ok(app)
}

fn pane_text(app: &mut TuiBaseApp) -> Result<Vec<String>> {
    app.pump_logs();
    app.scrollback()
        .lines()
        .map(|line| normalize(&plain_text(line)))
        .collect()
}

#[test]
fn test_minimal_line_is_timestamp_and_message() -> Result<()> {
    let mut app = app_with(FormatOptions::minimal())?;
    emit(app.logging(), Level::Info, "myapp", "hello");

    assert_eq!(
        pane_text(&mut app)?,
        vec!["│ XXXX-XX-XX XX:XX:XX │ hello".to_string()]
    );
    Ok(())
}

#[test]
fn test_default_columns() -> Result<()> {
    let mut app = app_with(FormatOptions::default())?;
    emit(app.logging(), Level::Warn, "myapp::net::pool", "slow peer");

    let lines = pane_text(&mut app)?;
    assert_eq!(lines.len(), 1);
    let line = &lines[0];
    assert!(line.starts_with("│ XXXX-XX-XX XX:XX:XX WARN     │ "), "{line}");
    assert!(line.contains("X.XXXs"), "{line}");
    assert!(line.contains("myapp.net.pool"), "{line}");
    assert!(line.ends_with("│ slow peer"), "{line}");
    Ok(())
}

#[test]
fn test_markup_in_messages_is_shown_literally() -> Result<()> {
    let mut app = app_with(FormatOptions::minimal())?;
    emit(app.logging(), Level::Error, "myapp", "value [red] and [/] path C:\\tmp");

    let lines = pane_text(&mut app)?;
    assert!(
        lines[0].ends_with("value [red] and [/] path C:\\tmp"),
        "{}",
        lines[0]
    );
    Ok(())
}

#[test]
fn test_records_keep_emission_order_across_threads() -> Result<()> {
    let mut app = app_with(FormatOptions::minimal())?;
    let logging = app.logging();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for n in 0..10 {
                emit(logging, Level::Info, "myapp::worker", &format!("w{n}"));
            }
        });
    });
    for n in 10..20 {
        emit(logging, Level::Info, "myapp", &format!("w{n}"));
    }

    let lines = pane_text(&mut app)?;
    let messages: Vec<String> = lines
        .iter()
        .filter_map(|line| line.rsplit(' ').next().map(str::to_string))
        .collect();
    let expected: Vec<String> = (0..20).map(|n| format!("w{n}")).collect();
    assert_eq!(messages, expected);
    Ok(())
}

#[test]
fn test_level_changes_take_effect_immediately() -> Result<()> {
    let mut app = app_with(FormatOptions::minimal())?;
    emit(app.logging(), Level::Debug, "myapp", "hidden");
    emit(app.logging(), Level::Info, "tokio::runtime", "hidden too");

    app.set_log_levels(
        &[
            LevelSpec::Target("myapp".to_string(), LevelFilter::Debug),
            LevelSpec::Target("tokio".to_string(), LevelFilter::Info),
        ],
        LevelFilter::Error,
    );
    emit(app.logging(), Level::Debug, "myapp", "shown");
    emit(app.logging(), Level::Info, "tokio::runtime", "shown too");
    emit(app.logging(), Level::Warn, "hyper", "dropped");

    let lines = pane_text(&mut app)?;
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("shown"));
    assert!(lines[1].ends_with("shown too"));
    Ok(())
}

#[test]
fn test_replaced_handler_is_the_only_destination() -> Result<()> {
    let mut app = app_with(FormatOptions::minimal())?;
    let (tx, rx) = flume::unbounded();
    app.logging()
        .set_handler(LogHandler::for_options(&FormatOptions::minimal(), tx)?);

    emit(app.logging(), Level::Info, "myapp", "elsewhere");
    assert!(pane_text(&mut app)?.is_empty());
    assert_eq!(rx.try_iter().count(), 1);
    Ok(())
}

#[test]
fn test_pane_follows_until_scrolled_away() -> Result<()> {
    let mut app = app_with(FormatOptions::minimal())?;
    let mut terminal = Terminal::new(TestBackend::new(60, 12))?;

    for n in 0..40 {
        emit(app.logging(), Level::Info, "myapp", &format!("line {n}"));
    }
    app.tick(&mut terminal)?;
    let viewport = app.scrollback().viewport_height();
    assert_eq!(viewport, 9);
    assert!(app.scrollback().auto_scroll());
    assert_eq!(app.scrollback().offset(), 40 - viewport);

    app.handle_event(&Event::Mouse(MouseEvent {
        kind: MouseEventKind::ScrollUp,
        column: 0,
        row: 0,
        modifiers: KeyModifiers::NONE,
    }))?;
    assert!(!app.scrollback().auto_scroll());
    let parked = app.scrollback().offset();
    assert_eq!(parked, 40 - viewport - 3);

    emit(app.logging(), Level::Info, "myapp", "line 40");
    app.tick(&mut terminal)?;
    assert_eq!(app.scrollback().offset(), parked);
    assert_eq!(app.scrollback().len(), 41);

    app.handle_event(&Event::Key(KeyEvent::new(KeyCode::End, KeyModifiers::NONE)))?;
    assert!(app.scrollback().auto_scroll());
    emit(app.logging(), Level::Info, "myapp", "line 41");
    app.tick(&mut terminal)?;
    assert_eq!(app.scrollback().offset(), 42 - viewport);

    let buffer = terminal.backend().buffer().clone();
    let bottom: String = (0..60).map(|x| buffer[(x, 9)].symbol()).collect();
    assert!(bottom.contains("line 41"), "{bottom}");
    Ok(())
}

#[test]
fn test_status_footer_shows_latest_text() -> Result<()> {
    let mut app = app_with(FormatOptions::minimal())?;
    let status = app.status_handle();
    let mut terminal = Terminal::new(TestBackend::new(40, 6))?;

    status.set("connecting");
    std::thread::scope(|scope| {
        scope.spawn(|| status.set("[green]online[/]"));
    });
    app.tick(&mut terminal)?;

    let buffer = terminal.backend().buffer();
    let footer: String = (0..40).map(|x| buffer[(x, 5)].symbol()).collect();
    assert!(footer.starts_with("online"), "{footer}");
    Ok(())
}

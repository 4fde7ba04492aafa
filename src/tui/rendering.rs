use ratatui::{layout::*, prelude::*, widgets::*};

use crate::tui::{markup, scrollback::Scrollback};

/// Log pane on top, one line of status footer below.
pub fn render_ui(frame: &mut Frame, scrollback: &mut Scrollback, status: &str) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Min(3),    // log pane
            Constraint::Length(1), // footer
        ])
        .split(area);

    scrollback.render(frame, chunks[0]);
    render_footer(frame, chunks[1], status);
}

fn render_footer(frame: &mut Frame, area: Rect, status: &str) {
    let footer_block = Block::default()
        .borders(Borders::NONE)
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let footer = Paragraph::new(markup::to_line(status))
        .alignment(Alignment::Left)
        .block(footer_block);
    frame.render_widget(footer, area);
}

use std::collections::VecDeque;

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

/// Scrollable log buffer that follows new lines until the user scrolls away.
///
/// `auto_scroll` is recomputed on every manual scroll: it is set exactly when
/// the scroll left the view at the end of the content. While it is set,
/// appended lines keep the view pinned to the end.
#[derive(Debug, Clone)]
pub struct Scrollback {
    lines: VecDeque<Line<'static>>,
    max_lines: Option<usize>,
    offset: usize,
    viewport_height: usize,
    auto_scroll: bool,
    title: String,
}

impl Default for Scrollback {
    fn default() -> Self {
        Self::new()
    }
}

impl Scrollback {
    pub fn new() -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: None,
            offset: 0,
            viewport_height: 0,
            auto_scroll: true,
            title: String::new(),
        }
    }

    /// Keep at most `max_lines` lines, dropping the oldest first.
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = Some(max_lines.max(1));
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn write(&mut self, line: Line<'static>) {
        self.lines.push_back(line);

        if let Some(max_lines) = self.max_lines {
            let excess = self.lines.len().saturating_sub(max_lines);
            if excess > 0 {
                self.lines.drain(..excess);
                self.offset = self.offset.saturating_sub(excess);
            }
        }

        if self.auto_scroll {
            self.offset = self.max_offset();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.offset = 0;
        self.auto_scroll = true;
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line<'static>> {
        self.lines.iter()
    }

    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    /// Index of the first visible line.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    pub fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.viewport_height)
    }

    pub fn is_vertical_scroll_end(&self) -> bool {
        self.offset >= self.max_offset()
    }

    /// Resizing is not a manual scroll: a following view stays at the end, any
    /// other view is only clamped.
    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height;
        if self.auto_scroll {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    /// Manual scroll to the absolute line `y`.
    pub fn scroll_to(&mut self, y: usize) {
        self.offset = y.min(self.max_offset());
        self.on_scroll_to();
    }

    fn on_scroll_to(&mut self) {
        self.auto_scroll = self.is_vertical_scroll_end();
    }

    pub fn scroll_up(&mut self, amount: usize) {
        self.scroll_to(self.offset.saturating_sub(amount));
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.scroll_to(self.offset.saturating_add(amount));
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport_height.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport_height.max(1));
    }

    pub fn scroll_home(&mut self) {
        self.scroll_to(0);
    }

    pub fn scroll_end(&mut self) {
        self.scroll_to(self.max_offset());
    }

    /// Draw into `area`, updating the viewport height from the area first.
    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.set_viewport_height(area.height.saturating_sub(2) as usize);

        let visible: Vec<Line<'static>> = self
            .lines
            .iter()
            .skip(self.offset)
            .take(self.viewport_height)
            .cloned()
            .collect();

        let (follow_label, follow_color) = if self.auto_scroll {
            ("follow", Color::Green)
        } else {
            ("free view", Color::Blue)
        };
        let title = Line::from(vec![
            Span::raw(format!(" {} ", self.title)),
            Span::styled(
                format!("{}/{}  {follow_label} ", self.visible_end(), self.lines.len()),
                Style::default()
                    .fg(follow_color)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);

        let block = Block::default().borders(Borders::ALL).title(title);
        frame.render_widget(Paragraph::new(visible).block(block), area);

        if self.max_offset() > 0 {
            let mut state = ScrollbarState::new(self.max_offset()).position(self.offset);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut state,
            );
        }
    }

    /// One past the last visible line.
    fn visible_end(&self) -> usize {
        (self.offset + self.viewport_height).min(self.lines.len())
    }
}

//! Log widget - displays the message stream, newest first
//!
//! Wide mode: logs on the left, category sidebar on the right
//! Narrow mode: logs only

use crate::constants::{SIDEBAR_WIDTH, WIDE_THRESHOLD};
use crate::logstream::{
    BoundedMessageBuffer, DebugQualifier, LogMessage, LogTypeRegistry, Origin,
};
use crate::ui::theme::{
    category_color, message_color, STYLE_BORDER, STYLE_DIM, STYLE_LABEL, STYLE_MUTED,
    SYMBOL_IN, SYMBOL_OUT,
};
use crate::ui::widgets::categories::CategoriesWidget;
use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget,
        Widget,
    },
};

/// Width of the category column
const CATEGORY_WIDTH: usize = 16;

pub struct LogWidget<'a> {
    messages: &'a BoundedMessageBuffer,
    registry: &'a LogTypeRegistry,
    scroll: usize,
    show_utc: bool,
    selected_category: Option<usize>,
}

impl<'a> LogWidget<'a> {
    pub fn new(
        messages: &'a BoundedMessageBuffer,
        registry: &'a LogTypeRegistry,
        scroll: usize,
        show_utc: bool,
    ) -> Self {
        Self {
            messages,
            registry,
            scroll,
            show_utc,
            selected_category: None,
        }
    }

    /// Highlight the n-th numbered category in the sidebar
    pub fn selected_category(mut self, index: usize) -> Self {
        self.selected_category = Some(index);
        self
    }

    fn is_wide(&self, width: u16) -> bool {
        width > WIDE_THRESHOLD
    }
}

impl Widget for LogWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.is_wide(area.width) {
            let chunks =
                Layout::horizontal([Constraint::Min(40), Constraint::Length(SIDEBAR_WIDTH)])
                    .split(area);
            self.render_logs(chunks[0], buf);
            let mut categories = CategoriesWidget::new(self.registry);
            if let Some(index) = self.selected_category {
                categories = categories.selected(index);
            }
            categories.render(chunks[1], buf);
        } else {
            self.render_logs(area, buf);
        }
    }
}

impl LogWidget<'_> {
    /// Render the main logs area
    fn render_logs(&self, area: Rect, buf: &mut Buffer) {
        let inner_height = area.height.saturating_sub(2) as usize;
        let inner_width = area.width.saturating_sub(3) as usize; // -2 for borders, -1 for scrollbar
        let total_lines = self.messages.len();

        let lines: Vec<Line> = self
            .messages
            .iter()
            .skip(self.scroll)
            .take(inner_height)
            .map(|msg| self.format_message(msg, inner_width))
            .collect();

        let title_right = if self.scroll > 0 {
            Line::from(Span::styled(
                format!("↑ {} newer  End/Home ", self.scroll),
                STYLE_MUTED,
            ))
        } else {
            Line::from(Span::styled("following ", STYLE_DIM))
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(STYLE_BORDER)
            .title(Span::styled(" Logs ", STYLE_LABEL))
            .title_bottom(title_right);

        Paragraph::new(lines).block(block).render(area, buf);

        // Render scrollbar if needed
        if total_lines > inner_height && area.width > 0 {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));

            let mut scrollbar_state = ScrollbarState::new(total_lines).position(self.scroll);

            let scrollbar_area = Rect {
                x: area.x + area.width - 1,
                y: area.y + 1,
                width: 1,
                height: area.height.saturating_sub(2),
            };

            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);
        }
    }

    /// Format a message into a styled Line
    fn format_message(&self, msg: &LogMessage, max_width: usize) -> Line<'static> {
        let time = time_label(msg, self.show_utc);
        let category = self
            .registry
            .get(&msg.category)
            .map(|c| c.display_name.as_str())
            .unwrap_or(msg.category.as_str());
        let marker = match msg.origin {
            Origin::Sent | Origin::Debug(DebugQualifier::Sent) => SYMBOL_OUT,
            Origin::Received | Origin::Debug(DebugQualifier::Received) => SYMBOL_IN,
            _ => " ",
        };

        // "  " + time + " " + category + " " + marker + " "
        let fixed = 2 + time.chars().count() + 1 + CATEGORY_WIDTH + 3;
        let text_width = max_width.saturating_sub(fixed);

        let mut spans = vec![
            Span::styled(format!("  {} ", time), STYLE_MUTED),
            Span::styled(
                pad_or_truncate(category, CATEGORY_WIDTH),
                Style::new().fg(category_color(&msg.category)),
            ),
            Span::styled(format!(" {} ", marker), STYLE_DIM),
        ];
        if let Some(class) = msg.http_status_class {
            spans.push(Span::styled(
                format!("[{}] ", class),
                Style::new().fg(message_color(msg)),
            ));
        }
        spans.push(Span::styled(
            truncate(&single_line(&msg.text), text_width),
            Style::new().fg(message_color(msg)),
        ));
        Line::from(spans)
    }
}

/// Timestamp in UTC or local time; raw server text if it never parsed
pub fn time_label(msg: &LogMessage, utc: bool) -> String {
    match msg.timestamp {
        Some(ts) if !utc => ts
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S %:z")
            .to_string(),
        _ => msg.display_time.clone(),
    }
}

/// One plain-text line for headless output
///
/// `<time> [<category>] [http-status-<class>] <text>`, the status token only
/// when the line carried one.
pub fn plain_line(msg: &LogMessage, utc: bool) -> String {
    let time = time_label(msg, utc);
    match msg.http_status_token() {
        Some(token) => format!("{} [{}] [{}] {}", time, msg.category, token, msg.text),
        None => format!("{} [{}] {}", time, msg.category, msg.text),
    }
}

fn single_line(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
}

/// Truncate to `width` characters, marking the cut
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else if width > 3 {
        let head: String = s.chars().take(width - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(width).collect()
    }
}

/// Pad or truncate a string to exactly the given width
fn pad_or_truncate(s: &str, width: usize) -> String {
    let cut = truncate(s, width);
    format!("{:<width$}", cut, width = width)
}

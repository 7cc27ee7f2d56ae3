//! Actions widget - displays keyboard shortcuts bar
//!
//! Shows the filter prompt instead while it is open.

use crate::app::AppState;
use crate::ui::theme::{STYLE_ACTION, STYLE_BRIGHT, STYLE_DIM, STYLE_KEY, STYLE_LABEL};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub struct ActionsWidget<'a> {
    state: &'a AppState<'a>,
}

impl<'a> ActionsWidget<'a> {
    pub fn new(state: &'a AppState<'a>) -> Self {
        Self { state }
    }
}

fn key_spans(pairs: &[(&'static str, String)]) -> Vec<Span<'static>> {
    let mut spans = vec![Span::raw("  ")];
    for (key, action) in pairs {
        spans.push(Span::styled(*key, STYLE_KEY));
        spans.push(Span::styled(format!(" {}  ", action), STYLE_ACTION));
    }
    spans
}

impl Widget for ActionsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(STYLE_DIM);

        if let Some(text) = self.state.editing {
            let line = Line::from(vec![
                Span::styled("  Filter /", STYLE_LABEL),
                Span::styled(text.to_string(), STYLE_BRIGHT),
                Span::styled("▏", STYLE_KEY),
                Span::styled("/   Enter apply  Esc cancel", STYLE_DIM),
            ]);
            Paragraph::new(line).block(block).render(area, buf);
            return;
        }

        if let Some(msg) = self.state.status_message {
            let line = Line::from(vec![
                Span::raw("  "),
                Span::styled(msg.to_string(), STYLE_BRIGHT),
            ]);
            Paragraph::new(line).block(block).render(area, buf);
            return;
        }

        let mut spans = if self.state.has_credentials {
            key_spans(&[("C", self.state.connect_action.label().to_string())])
        } else {
            vec![Span::raw("  "), Span::styled("C Connect:–  ", STYLE_DIM)]
        };
        let mine = if self.state.only_mine { "All" } else { "Mine" };
        let debug = if self.state.show_debug { "Hide debug" } else { "Debug" };
        let rest = key_spans(&[
            ("S", "Site".to_string()),
            ("E", "Env".to_string()),
            ("R", "Refresh".to_string()),
            ("M", mine.to_string()),
            ("/", "Filter".to_string()),
            ("D", debug.to_string()),
            ("1-9", "Types".to_string()),
            ("T", "Pick".to_string()),
            ("Spc", "Toggle".to_string()),
            ("X", "Clear".to_string()),
            ("Q", "Quit".to_string()),
        ]);
        // Drop the leading indent, the connect key already has one
        spans.extend(rest.into_iter().skip(1));

        Paragraph::new(Line::from(spans)).block(block).render(area, buf);
    }
}

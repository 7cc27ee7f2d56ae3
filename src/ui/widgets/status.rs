//! Status widget - displays site, environment, connection and filters

use crate::app::AppState;
use crate::ui::theme::*;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub struct StatusWidget<'a> {
    state: &'a AppState<'a>,
}

impl<'a> StatusWidget<'a> {
    pub fn new(state: &'a AppState<'a>) -> Self {
        Self { state }
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "–"
    } else {
        value
    }
}

fn on_off(on: bool) -> (&'static str, Style) {
    if on {
        ("on", Style::new().fg(COLOR_SUCCESS))
    } else {
        ("off", STYLE_MUTED)
    }
}

impl Widget for StatusWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.state;
        let (symbol, color) = session_state_style(state.session_state);

        let connection = if state.has_credentials {
            Line::from(vec![
                Span::styled("  Stream     ", STYLE_LABEL),
                Span::styled(format!("{} ", symbol), Style::new().fg(color)),
                Span::styled(state.session_state.as_str(), STYLE_TEXT),
            ])
        } else {
            Line::from(vec![
                Span::styled("  Stream     ", STYLE_LABEL),
                Span::styled(
                    "No API credentials, set [api] in config.toml",
                    Style::new().fg(COLOR_WARNING),
                ),
            ])
        };

        let (mine, mine_style) = on_off(state.only_mine);
        let (debug, debug_style) = on_off(state.show_debug);
        let filter = if state.filter.is_empty() {
            Span::styled("none", STYLE_MUTED)
        } else {
            Span::styled(format!("/{}/", state.filter), STYLE_BRIGHT)
        };

        let tag = match &state.request_header {
            Some(header) => Span::styled(header.clone(), STYLE_BRIGHT),
            None => Span::styled("off, press M to track your own requests", STYLE_MUTED),
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("  Site       ", STYLE_LABEL),
                Span::styled(or_dash(state.site).to_string(), STYLE_BRIGHT),
                Span::styled(format!("  ({} known)", state.site_count), STYLE_DIM),
            ]),
            Line::from(vec![
                Span::styled("  Env        ", STYLE_LABEL),
                Span::styled(or_dash(state.environment).to_string(), STYLE_BRIGHT),
                Span::styled(format!("  ({} known)", state.environment_count), STYLE_DIM),
            ]),
            connection,
            Line::from(vec![
                Span::styled("  Filter     ", STYLE_LABEL),
                filter,
                Span::styled("   Mine ", STYLE_LABEL),
                Span::styled(mine, mine_style),
                Span::styled("   Debug ", STYLE_LABEL),
                Span::styled(debug, debug_style),
            ]),
            Line::from(vec![Span::styled("  Tag        ", STYLE_LABEL), tag]),
        ];

        let time_zone = if state.show_utc { "UTC" } else { "local" };
        let right = format!(
            " {}/{} lines · {} ",
            state.retained, state.max_retained, time_zone
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(STYLE_BORDER)
            .title(Span::styled(" Cloud Logstream ", STYLE_TITLE))
            .title_bottom(Line::from(Span::styled(right, STYLE_MUTED)).right_aligned());

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ConnectAction, SessionState};

    fn state<'a>() -> AppState<'a> {
        AppState {
            site: "mysite",
            environment: "prod",
            site_count: 3,
            environment_count: 2,
            session_state: SessionState::Open,
            connect_action: ConnectAction::Disconnect,
            has_credentials: true,
            only_mine: true,
            request_header: Some("X-Request-ID: ac-ls-ce-abc-def".into()),
            filter: "cron",
            show_debug: false,
            retained: 12,
            max_retained: 1000,
            editing: None,
            status_message: None,
            show_utc: true,
        }
    }

    fn render(state: &AppState) -> Vec<String> {
        let area = Rect::new(0, 0, 70, 7);
        let mut buf = Buffer::empty(area);
        StatusWidget::new(state).render(area, &mut buf);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_shows_selection_and_filters() {
        let rows = render(&state());
        assert!(rows[1].contains("Site       mysite"));
        assert!(rows[2].contains("Env        prod"));
        assert!(rows[3].contains("● Open"));
        assert!(rows[4].contains("/cron/"));
        assert!(rows[4].contains("Mine on"));
        assert!(rows[5].contains("Tag        X-Request-ID: ac-ls-ce-abc-def"));
        assert!(rows[6].contains("12/1000 lines"));
    }

    #[test]
    fn test_tag_row_hints_when_off() {
        let mut s = state();
        s.only_mine = false;
        s.request_header = None;
        let rows = render(&s);
        assert!(rows[4].contains("Mine off"));
        assert!(rows[5].contains("press M"));
    }

    #[test]
    fn test_warns_without_credentials() {
        let mut s = state();
        s.has_credentials = false;
        s.site = "";
        let rows = render(&s);
        assert!(rows[1].contains("Site       –"));
        assert!(rows[3].contains("No API credentials"));
    }
}

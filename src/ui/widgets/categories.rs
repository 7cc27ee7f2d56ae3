//! Categories widget - numbered list of the log types the user can toggle
//!
//! The first nine carry their number key. The cursor row is marked and can be
//! toggled with Space whatever its position.

use crate::logstream::LogTypeRegistry;
use crate::ui::theme::{
    category_color, STYLE_BORDER, STYLE_DIM, STYLE_KEY, STYLE_LABEL, SYMBOL_OFF, SYMBOL_ON,
};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub struct CategoriesWidget<'a> {
    registry: &'a LogTypeRegistry,
    selected: Option<usize>,
}

impl<'a> CategoriesWidget<'a> {
    pub fn new(registry: &'a LogTypeRegistry) -> Self {
        Self {
            registry,
            selected: None,
        }
    }

    pub fn selected(mut self, index: usize) -> Self {
        self.selected = Some(index);
        self
    }
}

impl Widget for CategoriesWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines: Vec<Line> = self
            .registry
            .numbered()
            .enumerate()
            .map(|(i, cat)| {
                let key = if i < 9 {
                    format!("{}", i + 1)
                } else {
                    " ".to_string()
                };
                let cursor = if self.selected == Some(i) { "›" } else { " " };
                let (symbol, style) = if cat.enabled {
                    (SYMBOL_ON, Style::new().fg(category_color(&cat.key)))
                } else {
                    (SYMBOL_OFF, STYLE_DIM)
                };
                Line::from(vec![
                    Span::styled(format!("{}{} ", cursor, key), STYLE_KEY),
                    Span::styled(format!("{} ", symbol), style),
                    Span::styled(cat.display_name.clone(), style),
                ])
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(STYLE_BORDER)
            .title(Span::styled(" Types ", STYLE_LABEL));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

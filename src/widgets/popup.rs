use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::widgets::centered;

/// Modal message box: a warning to acknowledge or a yes/no question.
pub struct Popup<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub hint: &'a str,
    pub colour: Color,
}

impl<'a> Popup<'a> {
    pub fn warning(text: &'a str) -> Self {
        Self {
            title: "Warning",
            text,
            hint: "Enter/Esc: OK",
            colour: Color::Red,
        }
    }

    pub fn confirm(text: &'a str) -> Self {
        Self {
            title: "Confirm",
            text,
            hint: "y/Enter: Yes  n/Esc: No",
            colour: Color::Blue,
        }
    }

    /// Height needed for the text wrapped into `width` columns.
    fn height(&self, width: u16) -> u16 {
        let usable = width.saturating_sub(4).max(1) as usize;
        let lines: usize = self
            .text
            .lines()
            .map(|l| l.chars().count().div_ceil(usable).max(1))
            .sum();
        lines as u16 + 4
    }
}

impl Widget for Popup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = (area.width / 2).max(50).min(area.width);
        let percent = ((width as u32 * 100) / area.width.max(1) as u32) as u16;
        let rect = centered(area, percent, self.height(width).min(area.height));

        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .style(Style::default().bg(self.colour).fg(Color::White));
        let mut lines: Vec<ratatui::text::Line> =
            self.text.lines().map(ratatui::text::Line::from).collect();
        lines.push("".into());
        lines.push(ratatui::text::Line::from(self.hint).alignment(Alignment::Right));

        Clear.render(rect, buf);
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(rect, buf);
    }
}

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::Line,
    widgets::{Block, Clear, Paragraph, Widget},
};

use crate::{
    command::PipCommand,
    runner::{Outcome, OutputLine},
};

/// Dialog showing a running command and its output. It can only be closed
/// once the command has finished.
#[derive(Debug, Clone)]
pub struct OutputWidget {
    label: String,
    command_line: String,
    started: String,
    lines: Vec<OutputLine>,
    outcome: Option<Outcome>,
    //lines scrolled up from the bottom, 0 follows new output
    scroll: usize,
}

impl OutputWidget {
    pub fn new(command: &PipCommand) -> Self {
        let started = jiff::Zoned::now().strftime("%H:%M:%S").to_string();
        Self {
            label: command.label.clone(),
            command_line: command.to_string(),
            started,
            lines: vec![],
            outcome: None,
            scroll: 0,
        }
    }

    pub fn push(&mut self, line: OutputLine) {
        self.lines.push(line);
        if self.scroll > 0 {
            //keep the view still while the user reads back
            self.scroll += 1;
        }
    }

    pub fn finish(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn status_text(&self) -> String {
        match &self.outcome {
            None => format!("{}...", self.label),
            Some(o) if o.success => format!("✔ {}", o.message(&self.label)),
            Some(o) => format!("✘ {}", o.message(&self.label)),
        }
    }

    /// Returns true when the dialog should close.
    pub fn handle_key_event(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(-1),
            KeyCode::PageUp => self.scroll_by(10),
            KeyCode::PageDown => self.scroll_by(-10),
            KeyCode::End => self.scroll = 0,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => return self.is_finished(),
            _ => {}
        }
        false
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.lines.len().saturating_sub(1);
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
    }

    /// Lines that fit in `height` rows given the current scroll offset.
    fn window(&self, height: usize) -> &[OutputLine] {
        let end = self.lines.len().saturating_sub(self.scroll);
        let start = end.saturating_sub(height);
        &self.lines[start..end]
    }
}

impl Widget for &OutputWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::bordered()
            .title(format!(" {} (started {}) ", self.label, self.started))
            .style(Style::default().bg(Color::Black).fg(Color::White));
        let inner = block.inner(area);
        block.render(area, buf);

        let status_height = match &self.outcome {
            Some(o) if !o.success => (o.stderr_tail.len().min(5) + 1) as u16,
            _ => 1,
        };
        let [cmd_area, out_area, status_area, hint_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(status_height),
            Constraint::Length(1),
        ])
        .areas(inner);

        Paragraph::new(self.command_line.as_str())
            .block(Block::bordered().title("Command"))
            .render(cmd_area, buf);

        let out_block = Block::bordered().title(format!("Output ({} lines)", self.lines.len()));
        let height = out_block.inner(out_area).height as usize;
        let lines: Vec<Line> = self
            .window(height)
            .iter()
            .map(|l| match l {
                OutputLine::Stdout(s) => Line::raw(s.as_str()),
                OutputLine::Stderr(s) => Line::raw(s.as_str()).fg(Color::Yellow),
            })
            .collect();
        Paragraph::new(lines).block(out_block).render(out_area, buf);

        let status_colour = match &self.outcome {
            None => Color::Cyan,
            Some(o) if o.success => Color::Green,
            Some(_) => Color::Red,
        };
        Paragraph::new(self.status_text())
            .style(Style::default().fg(status_colour).bold())
            .render(status_area, buf);

        let hint = if self.is_finished() {
            "Esc/Enter: Close  ↑/↓: Scroll"
        } else {
            "↑/↓: Scroll  End: Follow output"
        };
        Paragraph::new(hint).dark_gray().render(hint_area, buf);
    }
}

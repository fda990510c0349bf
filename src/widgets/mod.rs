use crossterm::event::KeyEvent;
use ratatui::layout::{Constraint, Flex, Layout, Rect};

use crate::structs::event::EventResult;

pub mod environment;
pub mod output;
pub mod paths;
pub mod popup;
pub mod requirements;
pub mod table;

pub trait Commands {
    /// (key, help text, short status bar text; empty to leave it out)
    fn command_descriptions(&self) -> Vec<(&str, &str, &str)>;
    fn handle_key_event(&mut self, key: &KeyEvent) -> Option<EventResult>;
}

/// Rect of `width` percent and `height` rows centred in `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Percentage(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

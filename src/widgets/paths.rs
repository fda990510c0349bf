use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Block, Clear, Paragraph, Widget},
};
use tui_textarea::TextArea;

pub enum PathsAction {
    None,
    Cancel,
    Apply {
        manifest: Option<PathBuf>,
        python: Option<PathBuf>,
    },
}

/// Form for the manifest file and the Python environment.
#[derive(Debug, Clone)]
pub struct PathsForm {
    manifest: TextArea<'static>,
    python: TextArea<'static>,
    focus_python: bool,
}

impl PathsForm {
    pub fn new(manifest: Option<&PathBuf>, python: Option<&PathBuf>) -> Self {
        let mut form = Self {
            manifest: field(
                "Requirements file",
                "path to requirements.txt",
                manifest,
            ),
            python: field(
                "Python environment",
                "environment directory or interpreter",
                python,
            ),
            focus_python: false,
        };
        form.update_styles();
        form
    }

    pub fn handle_key_event(&mut self, key: &KeyEvent) -> PathsAction {
        match key.code {
            KeyCode::Esc => return PathsAction::Cancel,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus_python = !self.focus_python;
                self.update_styles();
            }
            KeyCode::Enter => {
                return PathsAction::Apply {
                    manifest: value(&self.manifest),
                    python: value(&self.python),
                };
            }
            _ => {
                let area = if self.focus_python {
                    &mut self.python
                } else {
                    &mut self.manifest
                };
                area.input(*key);
            }
        }
        PathsAction::None
    }

    fn update_styles(&mut self) {
        let (active, inactive) = if self.focus_python {
            (&mut self.python, &mut self.manifest)
        } else {
            (&mut self.manifest, &mut self.python)
        };
        active.set_cursor_style(Style::default().bg(Color::White));
        active.set_style(Style::default().fg(Color::Yellow));
        inactive.set_cursor_style(Style::default());
        inactive.set_style(Style::default().fg(Color::Gray));
    }
}

fn field(title: &'static str, placeholder: &str, value: Option<&PathBuf>) -> TextArea<'static> {
    let text = value.map(|p| p.display().to_string()).unwrap_or_default();
    let mut area = TextArea::new(vec![text]);
    area.move_cursor(tui_textarea::CursorMove::End);
    area.set_block(Block::bordered().title(title));
    area.set_placeholder_text(placeholder);
    area
}

fn value(area: &TextArea) -> Option<PathBuf> {
    let text = area.lines().join("");
    let text = text.trim().trim_matches('"');
    (!text.is_empty()).then(|| PathBuf::from(text))
}

impl Widget for &PathsForm {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::bordered().title(" Paths ").bg(Color::Black);
        let inner = block.inner(area);
        block.render(area, buf);

        let [manifest, python, hint] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(inner);
        self.manifest.render(manifest, buf);
        self.python.render(python, buf);
        Paragraph::new("Tab: Switch field  Enter: Apply and refresh  Esc: Cancel")
            .dark_gray()
            .render(hint, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(f: &mut PathsForm, code: KeyCode) -> PathsAction {
        f.handle_key_event(&KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn edits_both_fields() {
        let start = PathBuf::from("/work/req");
        let mut form = PathsForm::new(Some(&start), None);
        for c in ".txt".chars() {
            press(&mut form, KeyCode::Char(c));
        }
        press(&mut form, KeyCode::Tab);
        for c in "\"/env\"".chars() {
            press(&mut form, KeyCode::Char(c));
        }
        match press(&mut form, KeyCode::Enter) {
            PathsAction::Apply { manifest, python } => {
                assert_eq!(manifest, Some(PathBuf::from("/work/req.txt")));
                assert_eq!(python, Some(PathBuf::from("/env")));
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn empty_fields_are_none() {
        let mut form = PathsForm::new(None, None);
        assert!(matches!(press(&mut form, KeyCode::Esc), PathsAction::Cancel));
        match press(&mut form, KeyCode::Enter) {
            PathsAction::Apply { manifest, python } => {
                assert_eq!(manifest, None);
                assert_eq!(python, None);
            }
            _ => panic!("expected apply"),
        }
    }
}

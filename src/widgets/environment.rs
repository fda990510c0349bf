use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{buffer::Buffer, layout::Constraint, layout::Rect, style::Color, widgets::Widget};

use crate::{
    pip::InstalledPackage,
    structs::event::EventResult,
    utils::normalize_name,
    widgets::{
        Commands,
        table::{TableRow, TableWidget},
    },
};

/// Every package installed in the selected environment.
#[derive(Debug, Clone)]
pub struct EnvironmentWidget {
    data: Vec<InstalledPackage>,
    required: HashSet<String>,
    table: TableWidget,
}

impl Default for EnvironmentWidget {
    fn default() -> Self {
        Self {
            data: vec![],
            required: HashSet::new(),
            table: TableWidget::new(
                &["Name", "Version", "In manifest"],
                vec![
                    Constraint::Percentage(60),
                    Constraint::Length(20),
                    Constraint::Length(12),
                ],
            ),
        }
    }
}

impl EnvironmentWidget {
    /// `required` holds normalised names of manifest requirements.
    pub fn set_data(&mut self, data: &[InstalledPackage], required: HashSet<String>) {
        if data == self.data && required == self.required {
            return;
        }
        self.data = data.to_vec();
        self.required = required;
        self.table.set_data(
            self.data
                .iter()
                .map(|pkg| {
                    let in_manifest = self.required.contains(&normalize_name(&pkg.name));
                    TableRow::new(vec![
                        pkg.name.clone(),
                        pkg.version.clone(),
                        if in_manifest { "yes" } else { "" }.to_string(),
                    ])
                    .with_highlight(in_manifest.then_some(Color::Green))
                })
                .collect(),
        );
        self.update_title();
    }

    fn update_title(&mut self) {
        let shown = self.table.rows().len();
        let required = self
            .table
            .rows()
            .iter()
            .filter(|r| !r.cells[2].is_empty())
            .count();
        self.table
            .set_title(&format!("{shown} Installed packages ({required} in manifest)"));
    }

    pub fn current_package(&self) -> Option<&InstalledPackage> {
        let row = self.table.get_current()?;
        self.data.iter().find(|p| p.name == row.key())
    }

    /// Selected rows, or the row under the cursor when nothing is selected.
    fn targets(&self) -> Vec<String> {
        let selected: Vec<String> = self
            .table
            .get_selected()
            .iter()
            .map(|r| r.key().to_string())
            .collect();
        if !selected.is_empty() {
            return selected;
        }
        self.current_package()
            .map(|p| vec![p.name.clone()])
            .unwrap_or_default()
    }
}

impl Widget for EnvironmentWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.table.render(area, buf);
    }
}

impl Commands for EnvironmentWidget {
    fn command_descriptions(&self) -> Vec<(&str, &str, &str)> {
        vec![("x", "Uninstall selected packages", "Uninstall")]
    }

    fn handle_key_event(&mut self, key: &KeyEvent) -> Option<EventResult> {
        if self.table.handle_key_event(key) {
            self.update_title();
            return Some(EventResult::None);
        }
        if let KeyCode::Char('x') = key.code {
            let names = self.targets();
            if names.is_empty() {
                return Some(EventResult::None);
            }
            return Some(EventResult::confirm_uninstall(names));
        }
        None
    }
}

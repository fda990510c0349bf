use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{buffer::Buffer, layout::Constraint, layout::Rect, style::Color, widgets::Widget};

use crate::{
    structs::{
        dependency::{Dependency, Status},
        event::{EventCommand, EventResult},
    },
    widgets::{
        Commands,
        table::{TableRow, TableWidget},
    },
};

/// Manifest requirements with their install status.
#[derive(Debug, Clone)]
pub struct RequirementsWidget {
    data: Vec<Dependency>,
    table: TableWidget,
}

impl Default for RequirementsWidget {
    fn default() -> Self {
        Self {
            data: vec![],
            table: TableWidget::new(
                &["Name", "Required", "Status"],
                vec![
                    Constraint::Percentage(45),
                    Constraint::Percentage(30),
                    Constraint::Percentage(25),
                ],
            ),
        }
    }
}

impl RequirementsWidget {
    pub fn set_data(&mut self, data: &[Dependency]) {
        if data == self.data {
            return;
        }
        self.data = data.to_vec();
        self.table.set_data(
            self.data
                .iter()
                .map(|dep| {
                    let status = dep.status();
                    let colour = match status {
                        Status::Missing => Color::Red,
                        Status::Mismatch { .. } => Color::Yellow,
                        Status::Installed(_) => Color::Green,
                    };
                    TableRow::new(vec![
                        dep.requirement.name.clone(),
                        dep.requirement.required_display(),
                        status.to_string(),
                    ])
                    .with_highlight(Some(colour))
                })
                .collect(),
        );
        self.update_title();
    }

    fn update_title(&mut self) {
        let shown = self.table.rows().len();
        let installed = self.data.iter().filter(|d| d.is_installed()).count();
        let missing = self.data.len() - installed;
        self.table.set_title(&format!(
            "{shown} Requirements ({installed} installed, {missing} missing)"
        ));
    }

    pub fn current_dependency(&self) -> Option<&Dependency> {
        let row = self.table.get_current()?;
        self.data.iter().find(|d| d.requirement.name == row.key())
    }

    /// Selected rows, or the row under the cursor when nothing is selected.
    fn targets(&self) -> Vec<&Dependency> {
        let selected = self
            .table
            .get_selected()
            .iter()
            .filter_map(|r| self.data.iter().find(|d| d.requirement.name == r.key()))
            .collect::<Vec<_>>();
        if !selected.is_empty() {
            return selected;
        }
        self.current_dependency().into_iter().collect()
    }

    /// Missing targets get installed. When every target is installed they
    /// are uninstalled instead, after confirmation.
    fn toggle(&self) -> Option<EventResult> {
        let targets = self.targets();
        if targets.is_empty() {
            return None;
        }
        let missing = targets
            .iter()
            .filter(|d| !d.is_installed())
            .map(|d| d.requirement.clone())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Some(EventResult::Command(EventCommand::Install(missing)));
        }
        let names = targets.iter().map(|d| d.requirement.base_name()).collect();
        Some(EventResult::confirm_uninstall(names))
    }

    /// With a selection only the selected installed rows are removed.
    fn uninstall_all(&self) -> EventResult {
        if self.table.get_selected().is_empty() {
            return EventResult::Confirm(
                "Uninstall all installed requirements?".to_string(),
                EventCommand::UninstallManifest,
            );
        }
        let names = self
            .targets()
            .iter()
            .filter(|d| d.is_installed())
            .map(|d| d.requirement.base_name())
            .collect::<Vec<_>>();
        if names.is_empty() {
            return EventResult::None;
        }
        EventResult::confirm_uninstall(names)
    }
}

impl Widget for RequirementsWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.table.render(area, buf);
    }
}

impl Commands for RequirementsWidget {
    fn command_descriptions(&self) -> Vec<(&str, &str, &str)> {
        vec![
            (
                "Enter",
                "Install missing or uninstall installed (current or selected)",
                "Install/Uninstall",
            ),
            ("a", "Install all requirements", "Install all"),
            ("X", "Uninstall installed requirements (all or selected)", "Uninstall all"),
        ]
    }

    fn handle_key_event(&mut self, key: &KeyEvent) -> Option<EventResult> {
        if self.table.handle_key_event(key) {
            self.update_title(); //may have filtered
            return Some(EventResult::None);
        }
        match key.code {
            KeyCode::Enter => self.toggle(),
            KeyCode::Char('a') => Some(EventResult::Command(EventCommand::InstallManifest)),
            KeyCode::Char('X') => Some(self.uninstall_all()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::Requirement;
    use crossterm::event::KeyModifiers;

    fn deps() -> Vec<Dependency> {
        [("numpy>=1.24", Some("1.26.4")), ("requests", None)]
            .iter()
            .map(|(line, installed)| Dependency {
                requirement: Requirement::parse(1, line).unwrap().unwrap(),
                installed: installed.map(str::to_string),
            })
            .collect()
    }

    fn press(w: &mut RequirementsWidget, code: KeyCode) -> Option<EventResult> {
        w.handle_key_event(&KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn enter_toggles_by_status() {
        let mut w = RequirementsWidget::default();
        w.set_data(&deps());

        assert_eq!(
            press(&mut w, KeyCode::Enter),
            Some(EventResult::Confirm(
                "Uninstall numpy?".into(),
                EventCommand::Uninstall(vec!["numpy".into()])
            ))
        );

        press(&mut w, KeyCode::Down);
        match press(&mut w, KeyCode::Enter) {
            Some(EventResult::Command(EventCommand::Install(reqs))) => {
                assert_eq!(reqs.len(), 1);
                assert_eq!(reqs[0].name, "requests");
            }
            _ => panic!("expected install"),
        }
    }

    #[test]
    fn bulk_commands() {
        let mut w = RequirementsWidget::default();
        w.set_data(&deps());
        assert_eq!(
            press(&mut w, KeyCode::Char('a')),
            Some(EventResult::Command(EventCommand::InstallManifest))
        );
        assert!(matches!(
            press(&mut w, KeyCode::Char('X')),
            Some(EventResult::Confirm(_, EventCommand::UninstallManifest))
        ));
        assert_eq!(press(&mut w, KeyCode::Char('z')), None);
    }

    #[test]
    fn acts_on_selection() {
        let mut w = RequirementsWidget::default();
        let mut data = deps();
        data.push(Dependency {
            requirement: Requirement::parse(3, "six").unwrap().unwrap(),
            installed: Some("1.16.0".into()),
        });
        w.set_data(&data);

        //rows: numpy (installed), requests (missing), six (installed)
        press(&mut w, KeyCode::Char(' '));
        press(&mut w, KeyCode::Char(' '));
        match press(&mut w, KeyCode::Enter) {
            Some(EventResult::Command(EventCommand::Install(reqs))) => {
                let names: Vec<_> = reqs.iter().map(|r| r.name.as_str()).collect();
                assert_eq!(names, vec!["requests"]);
            }
            other => panic!("expected install, got {other:?}"),
        }
        assert_eq!(
            press(&mut w, KeyCode::Char('X')),
            Some(EventResult::Confirm(
                "Uninstall numpy?".into(),
                EventCommand::Uninstall(vec!["numpy".into()])
            ))
        );

        //only installed rows selected: Enter uninstalls them
        press(&mut w, KeyCode::Up);
        press(&mut w, KeyCode::Char(' '));
        press(&mut w, KeyCode::Char(' '));
        assert_eq!(
            press(&mut w, KeyCode::Enter),
            Some(EventResult::Confirm(
                "Uninstall 2 packages?".into(),
                EventCommand::Uninstall(vec!["numpy".into(), "six".into()])
            ))
        );
    }
}

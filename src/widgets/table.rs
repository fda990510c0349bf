use crate::utils::natural_cmp;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Style, Stylize},
    text::Line,
    widgets::{Block, Cell, Clear, Row, StatefulWidget, Table, TableState, Widget},
};
use tui_textarea::TextArea;

/// Sortable, searchable table with multi-select. Rows are identified by
/// their first cell, so selection survives re-sorting and filtering.
#[derive(Debug, Clone)]
pub struct TableWidget {
    columns: Vec<String>,
    widths: Vec<Constraint>,
    data: Vec<TableRow>,
    visible: Vec<TableRow>,
    state: TableState,
    sort_by: (usize, Sort),
    selected: Vec<String>,
    title: String,
    search: TextArea<'static>,
    searching: bool,
}

#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub enum Sort {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub highlight: Option<Color>,
}

impl TableRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self {
            cells,
            highlight: None,
        }
    }
    pub fn with_highlight(self, highlight: Option<Color>) -> Self {
        Self { highlight, ..self }
    }
    pub fn key(&self) -> &str {
        self.cells.first().map(String::as_str).unwrap_or_default()
    }
}

impl TableWidget {
    pub fn new(columns: &[&str], widths: Vec<Constraint>) -> Self {
        Self {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            widths,
            data: vec![],
            visible: vec![],
            state: TableState::default(),
            sort_by: (0, Sort::Asc),
            selected: vec![],
            title: String::new(),
            search: search_box(),
            searching: false,
        }
    }

    ///return true if the key was consumed
    pub(crate) fn handle_key_event(&mut self, key: &KeyEvent) -> bool {
        if self.searching {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => self.searching = false,
                _ => {
                    self.search.input(*key);
                    self.apply_filter();
                }
            }
            return true;
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_by(1),
            KeyCode::Home => self.move_by(isize::MIN),
            KeyCode::End => self.move_by(isize::MAX),
            KeyCode::PageUp => self.move_by(-10),
            KeyCode::PageDown => self.move_by(10),
            KeyCode::Char(c @ '1'..='9') => self.sort_column(c as usize - '1' as usize),
            KeyCode::Char(' ') => self.toggle_current(),
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.selected.len() == self.visible.len() {
                    self.clear_selection();
                } else {
                    self.select_all();
                }
            }
            KeyCode::Esc if self.has_filter_or_selection() => {
                self.clear_search();
                self.clear_selection();
            }
            _ => return false,
        }
        true
    }

    fn has_filter_or_selection(&self) -> bool {
        !self.selected.is_empty() || !self.search.is_empty()
    }

    pub(crate) fn set_data(&mut self, rows: Vec<TableRow>) {
        if rows == self.data {
            return;
        }
        self.data = rows;
        //drop selections whose rows are gone
        let keys: Vec<&str> = self.data.iter().map(TableRow::key).collect();
        self.selected.retain(|k| keys.contains(&k.as_str()));
        self.apply_filter();
    }

    fn move_by(&mut self, change: isize) {
        if self.visible.is_empty() {
            return;
        }
        let last = self.visible.len() - 1;
        let current = self.state.selected().unwrap_or(0);
        let next = if change < 0 {
            current.saturating_sub(change.unsigned_abs())
        } else {
            current.saturating_add(change as usize).min(last)
        };
        self.state.select(Some(next));
    }

    fn toggle_current(&mut self) {
        let Some(key) = self.get_current().map(|r| r.key().to_string()) else {
            return;
        };
        if let Some(pos) = self.selected.iter().position(|k| *k == key) {
            self.selected.remove(pos);
        } else {
            self.selected.push(key);
        }
        self.move_by(1);
    }

    fn sort_column(&mut self, column: usize) {
        if column >= self.columns.len() {
            return;
        }
        self.sort_by = match self.sort_by {
            (c, Sort::Asc) if c == column => (c, Sort::Desc),
            _ => (column, Sort::Asc),
        };
        self.apply_filter();
    }

    /// Rebuild the visible rows from data, search text and sort order,
    /// keeping the cursor on the same row when it is still visible.
    fn apply_filter(&mut self) {
        let current = self.get_current().map(|r| r.key().to_string());

        let filter = self.search.lines().join(" ").to_lowercase();
        self.visible = self
            .data
            .iter()
            .filter(|row| {
                filter.is_empty()
                    || row
                        .cells
                        .iter()
                        .any(|cell| cell.to_lowercase().contains(&filter))
            })
            .cloned()
            .collect();

        let (col, dir) = self.sort_by;
        self.visible.sort_by(|a, b| {
            let a = a.cells.get(col).map(String::as_str).unwrap_or_default();
            let b = b.cells.get(col).map(String::as_str).unwrap_or_default();
            match dir {
                Sort::Asc => natural_cmp(a, b),
                Sort::Desc => natural_cmp(b, a),
            }
        });

        let index = current
            .and_then(|key| self.visible.iter().position(|r| r.key() == key))
            .or(if self.visible.is_empty() { None } else { Some(0) });
        self.state.select(index);
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub(crate) fn select_all(&mut self) {
        self.selected = self.visible.iter().map(|r| r.key().to_string()).collect();
    }

    pub fn get_selected(&self) -> Vec<&TableRow> {
        self.visible
            .iter()
            .filter(|r| self.selected.iter().any(|k| k == r.key()))
            .collect()
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub(crate) fn rows(&self) -> &[TableRow] {
        &self.visible
    }

    pub fn clear_search(&mut self) {
        self.search.select_all();
        self.search.cut();
        self.apply_filter();
    }

    pub(crate) fn get_current(&self) -> Option<&TableRow> {
        self.state.selected().and_then(|i| self.visible.get(i))
    }
}

impl Widget for TableWidget {
    fn render(mut self, area: Rect, buf: &mut Buffer) {
        let footer = if self.selected.is_empty() {
            String::new()
        } else {
            format!("{} selected", self.selected.len())
        };
        let block = Block::bordered()
            .title(self.title.clone())
            .title_bottom(Line::from(footer).bg(Color::LightBlue).black());

        let rows = self.visible.iter().map(|item| {
            let mut row = Row::new(item.cells.iter().map(|c| c.as_str()));
            if self.selected.iter().any(|k| k == item.key()) {
                row = row.bg(Color::LightBlue).fg(Color::Black).underlined();
            } else if let Some(col) = item.highlight {
                row = row.fg(col);
            }
            row
        });
        let header = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let label = match self.sort_by {
                    (s, Sort::Asc) if s == i => format!("{c} ↑"),
                    (s, Sort::Desc) if s == i => format!("{c} ↓"),
                    _ => c.clone(),
                };
                Cell::from(label).black()
            })
            .collect::<Row>()
            .bold()
            .bg(Color::Cyan);

        let table = Table::new(rows, self.widths.clone())
            .header(header)
            .row_highlight_style(Style::new().bg(Color::Yellow).fg(Color::Black))
            .block(block);
        StatefulWidget::render(table, area, buf, &mut self.state);

        let search_area = Rect {
            x: area.x + area.width.saturating_sub(26),
            y: area.y,
            width: 25.min(area.width),
            height: 1,
        };
        draw_search(&mut self.search, search_area, buf, self.searching);
    }
}

fn draw_search(search: &mut TextArea<'static>, area: Rect, buf: &mut Buffer, searching: bool) {
    if !searching && search.is_empty() {
        return;
    }
    Clear.render(area, buf);
    if searching {
        search.set_cursor_style(Style::default().bg(Color::White));
        search.set_style(Style::default().bg(Color::Blue).fg(Color::Black));
    } else {
        search.set_cursor_style(Style::default());
        search.set_style(Style::default().bg(Color::Gray).fg(Color::Black));
    }
    search.render(area, buf);
}

fn search_box() -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_placeholder_text("Search...");
    textarea.set_style(Style::default().bg(Color::Blue).fg(Color::Black));
    textarea.set_placeholder_style(Style::default().bg(Color::Blue).fg(Color::DarkGray));
    textarea
}

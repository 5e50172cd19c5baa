// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Interactive mapping table widget and state management.
//!
//! Displays the persisted index-to-video mappings, ordered by index
//! ascending, and tracks which row the operator has selected for removal.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Cell, Padding, Row, Table, TableState},
};

use crate::{mapping::MappingRow, theme::Theme, util};

pub(crate) struct MappingTable {
    rows: Vec<MappingRow>,
    table_state: TableState,
}

impl MappingTable {
    pub(crate) fn new() -> Self {
        Self {
            rows: vec![],
            table_state: TableState::new(),
        }
    }

    /// Replaces the table contents, keeping the selection on a valid row.
    pub(crate) fn set_rows(&mut self, rows: Vec<MappingRow>) {
        self.rows = rows;
        match self.table_state.selected() {
            Some(i) if i >= self.rows.len() => {
                self.table_state
                    .select(self.rows.len().checked_sub(1));
            }
            None if !self.rows.is_empty() => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    /// The index of the currently selected mapping row, if any.
    pub(crate) fn selected_index(&self) -> Option<u8> {
        self.table_state
            .selected()
            .and_then(|i| self.rows.get(i))
            .map(|row| row.index)
    }

    pub(crate) fn goto_next(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub(crate) fn goto_previous(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub(crate) fn draw(&mut self, f: &mut Frame, area: Rect, theme: &Theme) {
        let rows = self.rows.iter().map(|item| {
            let time = item
                .duration
                .map(|duration| util::format::format_time(duration.as_secs()))
                .unwrap_or_else(|| "--:--".to_string());

            Row::new(vec![
                Cell::from(
                    Line::from(item.index.to_string())
                        .style(Style::default().fg(theme.table_index_fg))
                        .alignment(Alignment::Right),
                ),
                Cell::from(
                    Line::from(item.file_name.as_str())
                        .style(Style::default().fg(theme.table_file_fg)),
                ),
                Cell::from(
                    Line::from(time)
                        .style(Style::default().fg(theme.table_time_fg))
                        .alignment(Alignment::Right),
                ),
            ])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(5),
                Constraint::Min(0),
                Constraint::Length(8),
            ],
        )
        .header(
            Row::new(vec![
                Cell::from(Line::from("Index").alignment(Alignment::Right)),
                Cell::from("File"),
                Cell::from(Line::from("Time").alignment(Alignment::Right)),
            ])
            .style(Style::default().bold().fg(theme.accent_colour))
            .bottom_margin(1),
        )
        .row_highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border_colour))
                .title(" Video Mapping ")
                .padding(Padding::horizontal(1)),
        );

        f.render_stateful_widget(table, area, &mut self.table_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: u8) -> MappingRow {
        MappingRow {
            index,
            file_name: format!("clip-{index}.mp4"),
            duration: None,
        }
    }

    #[test]
    fn navigation_wraps_and_tracks_the_selected_index() {
        let mut table = MappingTable::new();
        table.set_rows(vec![row(1), row(5), row(9)]);

        assert_eq!(table.selected_index(), Some(1));
        table.goto_next();
        assert_eq!(table.selected_index(), Some(5));
        table.goto_previous();
        table.goto_previous();
        assert_eq!(table.selected_index(), Some(9));
    }

    #[test]
    fn the_selection_survives_a_shrinking_refresh() {
        let mut table = MappingTable::new();
        table.set_rows(vec![row(1), row(5), row(9)]);
        table.goto_next();
        table.goto_next();
        assert_eq!(table.selected_index(), Some(9));

        table.set_rows(vec![row(1)]);
        assert_eq!(table.selected_index(), Some(1));

        table.set_rows(vec![]);
        assert_eq!(table.selected_index(), None);
    }
}

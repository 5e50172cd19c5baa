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

//! User interface rendering logic.
//!
//! This module handles the translation of the [`App`] state into visual
//! widgets using the `ratatui` framework: the controller status panel, the
//! mapping table and the commander/footer line.

pub(crate) mod mappings;
mod status;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Style, Stylize},
    text::Line,
    widgets::{Block, Paragraph},
};

use crate::App;

/// Renders the user interface to the terminal frame.
///
/// This function calculates the layout constraints and populates the frame
/// with widgets based on the current state of the [`App`]: a status panel at
/// the top, the mapping table in the middle, and a single footer line which
/// shows either the commander input, the last error, or the key help.
pub(crate) fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();

    f.render_widget(
        Block::default().style(Style::default().bg(app.theme.background_colour)),
        area,
    );

    // Outer layout: status, mapping table, footer
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    status::draw_status(f, outer[0], app);
    app.mappings.draw(f, outer[1], &app.theme);
    draw_footer(f, outer[2], app);
}

fn draw_footer(f: &mut Frame, area: ratatui::layout::Rect, app: &App) {
    let line = if app.commander.active() {
        Line::from(format!(":{}", app.commander.input.value())).fg(app.theme.accent_colour)
    } else if let Some(error) = &app.last_error {
        Line::from(error.as_str()).fg(app.theme.alert_colour)
    } else {
        Line::from(
            " q quit | c connect | m monitor | s simulate | p/u/r/x play/pause/resume/stop | d unmap | :map :unmap :idx",
        )
        .fg(app.theme.border_colour)
    };

    f.render_widget(Paragraph::new(line), area);
}

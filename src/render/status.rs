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

//! Render the controller and playback status panel.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::{App, deck::PlayerState, interpret::MediaDisplay};

/// Renders the status panel: link, monitor and simulation state, the last
/// observed register sample, and what the playback engine is doing.
pub(super) fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_colour))
        .title(" plcue ")
        .title_style(Style::default().fg(app.theme.accent_colour).add_modifier(Modifier::BOLD))
        .padding(Padding::horizontal(1));

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let lines = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner_area);

    f.render_widget(Paragraph::new(link_line(app)), lines[0]);
    f.render_widget(Paragraph::new(sample_line(app)), lines[1]);
    f.render_widget(Paragraph::new(simulation_line(app)), lines[2]);
    f.render_widget(Paragraph::new(showing_line(app)), lines[3]);
    f.render_widget(Paragraph::new(player_line(app)), lines[4]);
}

fn link_line(app: &App) -> Line<'_> {
    let (link_text, link_colour) = if app.connected {
        (
            format!("Connected ({})", app.config.plc_host),
            app.theme.ok_colour,
        )
    } else {
        ("Disconnected".to_string(), app.theme.alert_colour)
    };

    let (monitor_text, monitor_colour) = if app.monitoring {
        ("Running", app.theme.ok_colour)
    } else {
        ("Stopped", app.theme.border_colour)
    };

    Line::from(vec![
        Span::raw("Link: "),
        Span::styled(link_text, Style::default().fg(link_colour)),
        Span::raw("   Monitor: "),
        Span::styled(monitor_text, Style::default().fg(monitor_colour)),
    ])
}

fn sample_line(app: &App) -> Line<'_> {
    let mut spans = match app.last_sample {
        Some(sample) => vec![
            Span::raw("Command: "),
            Span::styled(
                format!("{} ({})", sample.command.raw(), sample.command.label()),
                Style::default().fg(app.theme.accent_colour),
            ),
            Span::raw("   Index: "),
            Span::styled(
                sample.index.to_string(),
                Style::default().fg(app.theme.accent_colour),
            ),
        ],
        None => vec![Span::raw("Command: -   Index: -")],
    };

    if let Some(error) = &app.poll_error {
        spans.push(Span::raw("   Poll: "));
        spans.push(Span::styled(
            error.as_str(),
            Style::default().fg(app.theme.alert_colour),
        ));
    }

    Line::from(spans)
}

fn simulation_line(app: &App) -> Line<'_> {
    let (mode_text, mode_colour) = if app.simulating {
        ("Simulation", app.theme.accent_colour)
    } else {
        ("Register", app.theme.border_colour)
    };

    Line::from(vec![
        Span::raw("Source: "),
        Span::styled(mode_text, Style::default().fg(mode_colour)),
        Span::raw(format!("   Sim index: {}", app.sim_index)),
    ])
}

fn showing_line(app: &App) -> Line<'_> {
    let text = match &app.now_showing {
        Some(MediaDisplay::Media(name)) => name.clone(),
        Some(MediaDisplay::Missing(index)) => format!("no video for index {index}"),
        None => "None".to_string(),
    };

    let colour = match &app.now_showing {
        Some(MediaDisplay::Media(_)) => app.theme.ok_colour,
        Some(MediaDisplay::Missing(_)) => app.theme.alert_colour,
        None => app.theme.border_colour,
    };

    Line::from(vec![
        Span::raw("Now showing: "),
        Span::styled(text, Style::default().fg(colour).add_modifier(Modifier::BOLD)),
    ])
}

fn player_line(app: &App) -> Line<'_> {
    let state = match app.player_state {
        PlayerState::Playing => "Playing",
        PlayerState::Paused => "Paused",
        PlayerState::Stopped => "Stopped",
    };

    Line::from(vec![Span::raw("Player: "), Span::raw(state).bold()])
}

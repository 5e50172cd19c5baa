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

//! Application event distribution and orchestration.
//!
//! This module defines the central event-handling logic for the
//! application, bridging user input (keyboard), background worker updates
//! (task worker, playback deck, monitor loop), and the UI rendering
//! pipeline.
//!
//! # Architecture
//!
//! The system follows a reactive event-loop pattern:
//!
//! 1. **Capture**: Events are received via the [`AppEvent`] enum through an
//!    asynchronous channel.
//! 2. **Process**: The [`process_events`] function updates the [`App`]
//!    state and forwards operator actions to the background task worker.
//! 3. **Render**: After each event is processed, the UI is re-drawn using
//!    the `ratatui` terminal.
//!
//! Status fields mutated here are only ever written from this loop, which
//! keeps the display consistent no matter how the background threads
//! interleave.

use std::io::Stdout;

use anyhow::{Result, bail};
use crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{Terminal, prelude::CrosstermBackend};

use crate::{
    App,
    actions::commands::AppTask,
    deck::PlayerState,
    interpret::{CommandCode, MediaDisplay, Sample},
    mapping::MappingRow,
    render::draw,
};

#[derive(Debug)]
pub(crate) enum AppEvent {
    Key(KeyEvent),

    ConnectionChanged(bool),
    MonitorChanged(bool),
    SimulationChanged(bool),
    SimIndexChanged(u8),

    SampleObserved(Sample),
    PollFailed(String),

    NowShowing(MediaDisplay),
    PlayerStateChanged(PlayerState),

    MappingsChanged(Vec<MappingRow>),

    Tick,

    ExitApplication,

    Error(String),
    FatalError(String),
}

/// Runs the main application loop, handling events and rendering the UI in
/// the terminal.
///
/// This function loops until a 'quit' event is received or the event
/// channel is closed.
pub(crate) fn process_events(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> Result<()> {
    while let Ok(event) = app.event_rx.recv() {
        if matches!(event, AppEvent::ExitApplication) {
            break;
        }

        match event {
            AppEvent::Key(key) => process_key_event(app, key)?,

            AppEvent::ConnectionChanged(connected) => {
                app.connected = connected;
                if !connected {
                    app.poll_error = None;
                }
            }
            AppEvent::MonitorChanged(monitoring) => {
                app.monitoring = monitoring;
                if !monitoring {
                    app.poll_error = None;
                }
            }
            AppEvent::SimulationChanged(simulating) => app.simulating = simulating,
            AppEvent::SimIndexChanged(index) => app.sim_index = index,

            AppEvent::SampleObserved(sample) => {
                app.last_sample = Some(sample);
                app.poll_error = None;
            }
            AppEvent::PollFailed(message) => app.poll_error = Some(message),

            AppEvent::NowShowing(display) => app.now_showing = Some(display),
            AppEvent::PlayerStateChanged(state) => app.player_state = state,

            AppEvent::MappingsChanged(rows) => app.mappings.set_rows(rows),

            AppEvent::Tick => {}

            AppEvent::Error(message) => app.last_error = Some(message),
            AppEvent::FatalError(message) => bail!(message),

            AppEvent::ExitApplication => {}
        }

        // Render after every event processed
        terminal.draw(|f| draw(f, app))?;
    }

    Ok(())
}

/// Maps keyboard input to application tasks.
///
/// This function acts as the primary input router for the TUI, translating
/// low-level [`KeyEvent`]s into operator actions. It handles:
///
/// * **Application Control**: Exiting the program.
/// * **Controller Control**: Connecting, disconnecting and monitoring.
/// * **Simulation**: Toggling the simulator and firing single-shot
///   commands.
/// * **Mapping Management**: Navigating the table and removing entries.
///
/// Everything parameterized (adding a mapping, setting the simulated index)
/// goes through the `:` commander instead of a direct key.
fn process_key_event(app: &mut App, key: KeyEvent) -> Result<()> {
    app.last_error = None;

    let event = Event::Key(key);
    if app.commander.handle_event(event, &mut app.task_tx) {
        return Ok(());
    }

    process_global_key_event(app, key)
}

fn process_global_key_event(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('q') => app.event_tx.send(AppEvent::ExitApplication)?,

        KeyCode::Char('c') => app.task_tx.send(AppTask::ToggleConnection)?,
        KeyCode::Char('m') => app.task_tx.send(AppTask::ToggleMonitor)?,
        KeyCode::Char('s') => app.task_tx.send(AppTask::ToggleSimulation)?,

        // Single-shot simulated commands
        KeyCode::Char('p') => app.task_tx.send(AppTask::Simulate(CommandCode::Play))?,
        KeyCode::Char('u') | KeyCode::Char(' ') => {
            app.task_tx.send(AppTask::Simulate(CommandCode::Pause))?
        }
        KeyCode::Char('r') => app.task_tx.send(AppTask::Simulate(CommandCode::Resume))?,
        KeyCode::Char('x') => app.task_tx.send(AppTask::Simulate(CommandCode::Stop))?,

        // Mapping table
        KeyCode::Char('j') | KeyCode::Down => app.mappings.goto_next(),
        KeyCode::Char('k') | KeyCode::Up => app.mappings.goto_previous(),
        KeyCode::Char('d') => {
            if let Some(index) = app.mappings.selected_index() {
                app.task_tx.send(AppTask::RemoveMapping(index))?;
            }
        }

        _ => {}
    }

    Ok(())
}

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

//! # PLC Video Cueing Console.
//!
//! A terminal application that bridges a programmable controller's
//! command register to local video playback: it polls a two-byte
//! `(command, index)` register - or an operator-driven simulator - and
//! drives play/pause/resume/stop transitions against a locally persisted
//! index-to-video mapping.
//!
//! This application coordinates a TUI frontend built with `ratatui` and a
//! background processing layer.
//!
//! It uses an event-driven architecture where:
//!
//! * The **Main Thread** manages the terminal lifecycle and UI rendering.
//! * **Background Workers** handle the controller connection, the monitor
//!   loop and the playback engine via asynchronous command processing.
//! * **Event Loops** capture user input and system ticks to drive the UI
//!   state.
//!
//! ## Architecture
//!
//! The application follows a strict setup-run-teardown pattern to ensure
//! the terminal state is preserved even in the event of a crash.
//! Communication between the UI and background workers is handled via
//! `std::sync::mpsc` channels; playback selection state is owned by a
//! single worker thread that both the poll loop and operator single-shots
//! feed through the same channel.

mod actions;
mod commander;
mod config;
mod controller;
mod deck;
mod interpret;
mod mapping;
mod monitor;
mod render;
mod theme;
mod util;

use anyhow::{Context, Result};
use crossterm::{
    event::{self},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{self},
    path::Path,
    sync::{Arc, Mutex, mpsc::{self, Receiver, Sender}},
    thread,
    time::Duration,
};

use crate::{
    actions::{
        commands::AppTask,
        events::{AppEvent, process_events},
    },
    commander::Commander,
    config::AppConfig,
    controller::SimControls,
    deck::{PlayerState, VideoDeck},
    interpret::{MediaDisplay, Sample},
    mapping::MappingStore,
    render::mappings::MappingTable,
    theme::Theme,
};

/// Application state.
struct App {
    pub config: AppConfig,
    pub theme: Theme,

    pub event_tx: Sender<AppEvent>,
    pub event_rx: Receiver<AppEvent>,

    pub task_tx: Sender<AppTask>,

    pub commander: Commander,
    pub mappings: MappingTable,

    pub connected: bool,
    pub monitoring: bool,
    pub simulating: bool,
    pub sim_index: u8,

    pub last_sample: Option<Sample>,
    pub poll_error: Option<String>,
    pub now_showing: Option<MediaDisplay>,
    pub player_state: PlayerState,

    pub last_error: Option<String>,
}

impl App {
    /// Create a new instance of application state.
    pub fn new(
        config: AppConfig,
        task_tx: Sender<AppTask>,
        event_tx: Sender<AppEvent>,
        event_rx: Receiver<AppEvent>,
    ) -> Self {
        Self {
            config,
            theme: Theme::default(),
            event_tx,
            event_rx,
            task_tx,
            commander: Commander::new(),
            mappings: MappingTable::new(),
            connected: false,
            monitoring: false,
            simulating: false,
            sim_index: 0,
            last_sample: None,
            poll_error: None,
            now_showing: None,
            player_state: PlayerState::Stopped,
            last_error: None,
        }
    }
}

/// The entry point of the application.
///
/// Sets up the communication channels, spawns the playback and task
/// workers, manages the terminal lifecycle, and returns an error if any
/// part of the execution fails.
fn main() -> Result<()> {
    let config = config::load_config();

    let store = MappingStore::open(Path::new(&config.data_dir))
        .context("Failed to open the mapping store")?;
    let store = Arc::new(Mutex::new(store));
    let controls = Arc::new(SimControls::new());

    let (task_tx, task_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();

    let deck = VideoDeck::new(Arc::clone(&store), event_tx.clone())
        .context("Failed to start the playback engine")?;
    actions::commands::spawn_task_worker(
        &config,
        store,
        controls,
        deck,
        task_rx,
        event_tx.clone(),
    );

    let mut app = App::new(config, task_tx, event_tx, event_rx);

    let mut terminal = setup_terminal()?;
    let res = run(&mut terminal, &mut app);
    restore_terminal(&mut terminal);

    res.context("Application error occurred")
}

/// Prepares the terminal for the TUI application.
///
/// Enables raw mode to capture all keyboard input and switches the
/// terminal to the alternate screen buffer.
///
/// # Errors
///
/// Returns an error if raw mode cannot be enabled or if the alternate
/// screen cannot be entered.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;

    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// This reverses the changes made by [`setup_terminal`], including
/// disabling raw mode and leaving the alternate screen. It also ensures
/// the cursor is made visible again.
///
/// This function is designed to be "best-effort" and does not return a
/// result, as it is typically called during cleanup or panic handling.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) {
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();
}

/// Starts the application's input threads and enters the main event loop.
///
/// This function spawns two long-running background threads:
/// * An input thread to poll for system keyboard events.
/// * A tick thread to trigger periodic UI refreshes.
///
/// After spawning them, it hands control to [`process_events`] to manage
/// the UI and state updates.
///
/// # Errors
///
/// Returns an error if the event processing loop encounters an
/// unrecoverable application error.
fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Spawn a thread to translate raw key events to application events.
    let tx_keys = app.event_tx.clone();
    thread::spawn(move || {
        loop {
            if let Ok(event::Event::Key(key)) = event::read() {
                tx_keys.send(AppEvent::Key(key)).ok();
            }
        }
    });

    // Spawn a thread to send a periodic tick application event, this is
    // effectively the minimum "frame rate" for rendering the TUI
    // application.
    let tx_tick = app.event_tx.clone();
    thread::spawn(move || {
        loop {
            let _ = tx_tick.send(AppEvent::Tick);
            thread::sleep(Duration::from_millis(250));
        }
    });

    // Initial trigger to populate the mapping table from the store
    app.task_tx.send(AppTask::RefreshMappings)?;

    // Application event loop, process events until the user quits
    process_events(terminal, app)
}

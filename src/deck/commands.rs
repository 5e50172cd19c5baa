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

//! MPV-backed playback engine and decision application.
//!
//! This module provides the core playback logic, leveraging `libmpv` for
//! decoding and presentation. It manages a background worker thread that
//! owns the MPV context, the current playback selection, and the bridge
//! between incoming register samples and transport commands.
//!
//! # Architecture
//!
//! The engine operates using a dual-channel communication pattern:
//! 1. **Command Channel**: Receives [`DeckCommand`]s carrying sampled
//!    `(command, index)` pairs to interpret and apply.
//! 2. **Event Channel**: Broadcasts [`AppEvent`]s to notify the UI of state
//!    changes, such as the current video and the play/pause/stop state.
//!
//! Decisions are applied in a fixed order: when a sample switches the
//! selection, the new file is loaded (held paused) before the transport
//! action of the same decision runs.

use anyhow::{Context, Result};
use mpv::Format;
use std::{
    path::PathBuf,
    sync::{Arc, Mutex, mpsc::{self, Receiver, Sender}},
    thread,
};

use crate::{
    actions::events::AppEvent,
    deck::{PlayerState, VideoDeck},
    interpret::{self, Sample, TransportAction},
    mapping::MappingStore,
};

#[derive(Debug)]
pub(crate) enum DeckCommand {
    Apply(Sample),
}

/// Spawns the playback worker thread to process incoming samples.
///
/// This function takes ownership of the command receiver and the event
/// sender, moving them into a dedicated background thread.
///
/// If the internal worker returns an error, it is caught here and broadcast
/// as a fatal application event.
pub(crate) fn spawn_deck_worker(
    command_rx: Receiver<DeckCommand>,
    store: Arc<Mutex<MappingStore>>,
    event_tx: Sender<AppEvent>,
) {
    let error_tx = event_tx.clone();

    thread::spawn(move || {
        if let Err(e) = deck_worker(command_rx, store, event_tx) {
            let _ = error_tx.send(AppEvent::FatalError(format!("MPV worker failure: {:?}", e)));
        }
    });
}

// Selection state owned exclusively by the worker thread.
struct Playhead {
    /// The index currently loaded into the engine, if any.
    selection: Option<u8>,
    /// The file backing that selection; kept so an explicit stop can be
    /// replayed without a media switch.
    current: Option<PathBuf>,
    is_paused: bool,
    is_idle: bool,
}

/// The primary execution loop for the playback backend.
///
/// Initializes a local `libmpv` context and alternates between draining
/// pending deck commands and pumping engine events.
///
/// # Errors
///
/// Returns an error if the MPV context fails to initialize or if the
/// command/event loops encounter an unrecoverable failure.
fn deck_worker(
    command_rx: Receiver<DeckCommand>,
    store: Arc<Mutex<MappingStore>>,
    event_tx: Sender<AppEvent>,
) -> Result<()> {
    let mut handler = (|| {
        let mut builder = mpv::MpvHandlerBuilder::new().context("Failed to create MPV builder")?;
        builder
            .set_option("force-window", "yes")
            .context("Failed to set window creation")?;
        builder
            .set_option("keep-open", "yes")
            .context("Failed to set keep-open")?;
        builder.build().context("Failed to build MPV handler")
    })()?;

    handler
        .observe_property::<bool>("pause", 0)
        .context("Failed to observe pause")?;
    handler
        .observe_property::<bool>("idle-active", 0)
        .context("Failed to observe idle-active")?;

    let mut playhead = Playhead {
        selection: None,
        current: None,
        is_paused: false,
        is_idle: true,
    };

    let mut player_state = PlayerState::Stopped;

    loop {
        process_commands(&mut handler, &command_rx, &store, &mut playhead, &event_tx)?;
        process_player_events(&mut handler, &mut playhead, &mut player_state, &event_tx)?;
    }
}

/// Drains and applies all pending samples from the funnel channel.
fn process_commands(
    handler: &mut mpv::MpvHandler,
    command_rx: &mpsc::Receiver<DeckCommand>,
    store: &Arc<Mutex<MappingStore>>,
    playhead: &mut Playhead,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<()> {
    while let Ok(command) = command_rx.try_recv() {
        match command {
            DeckCommand::Apply(sample) => {
                let decision = {
                    let store = store.lock().expect("mapping store lock poisoned");
                    interpret::decide(playhead.selection, sample, &store)
                };

                // Media switch strictly before the transport action.
                if let Some(path) = &decision.load {
                    let target = path.to_string_lossy();
                    handler
                        .command(&["loadfile", target.as_ref(), "replace"])
                        .context(format!("Failed to load file: {}", target))?;
                    // Hold the fresh file paused; the transport action of
                    // this same decision determines whether it starts.
                    handler.set_property("pause", true)?;
                    playhead.selection = Some(sample.index);
                    playhead.current = Some(path.clone());
                    playhead.is_idle = false;
                }

                apply_transport(handler, decision.transport, playhead)?;

                event_tx.send(AppEvent::NowShowing(decision.display))?;
            }
        }
    }

    Ok(())
}

fn apply_transport(
    handler: &mut mpv::MpvHandler,
    transport: Option<TransportAction>,
    playhead: &mut Playhead,
) -> Result<()> {
    match transport {
        Some(TransportAction::Play) => {
            if playhead.is_idle
                && let Some(current) = playhead.current.clone()
            {
                // An explicit stop unloads the file; play restarts the
                // current selection from the top, it is not a media switch.
                let target = current.to_string_lossy();
                handler
                    .command(&["loadfile", target.as_ref(), "replace"])
                    .context(format!("Failed to reload file: {}", target))?;
                playhead.is_idle = false;
            }
            handler.set_property("pause", false)?;
        }
        Some(TransportAction::Pause) => {
            handler.set_property("pause", true)?;
        }
        Some(TransportAction::Stop) => {
            handler.command(&["stop"])?;
            playhead.is_idle = true;
        }
        None => {}
    }

    Ok(())
}

/// Polls for MPV events and synchronizes the application state.
///
/// Waits for up to 50ms for an event from the MPV context, updates the
/// worker's engine flags and broadcasts a [`PlayerState`] change when one
/// occurs.
fn process_player_events(
    handler: &mut mpv::MpvHandler,
    playhead: &mut Playhead,
    current_state: &mut PlayerState,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<()> {
    if let Some(player_event) = handler.wait_event(0.05) {
        if let mpv::Event::PropertyChange { name, change, .. } = player_event {
            match (name, change) {
                ("pause", Format::Flag(pause)) => playhead.is_paused = pause,
                ("idle-active", Format::Flag(idle_active)) => playhead.is_idle = idle_active,
                _ => {}
            }
        }

        let new_player_state = VideoDeck::player_state(playhead.is_paused, playhead.is_idle);

        if new_player_state != *current_state {
            *current_state = new_player_state;
            event_tx
                .send(AppEvent::PlayerStateChanged(new_player_state))
                .context("Failed to send player state event")?;
        }
    }

    Ok(())
}

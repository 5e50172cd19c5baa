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

//! Video playback control and selection state.
//!
//! This module provides the [`VideoDeck`] handle used to drive playback. It
//! manages a background worker thread that owns the underlying media engine
//! (MPV) together with the current playback selection.
//!
//! The worker is the single writer for the selection: every sample - whether
//! it arrived through the monitor loop or through an operator single-shot -
//! is funneled into the same command channel, interpreted against the
//! mapping store and applied in order. Concurrent observers can therefore
//! never see a half-applied decision.

pub(crate) mod commands;

use std::sync::{Arc, Mutex, mpsc};

use anyhow::Result;

use crate::{
    actions::events::AppEvent,
    deck::commands::DeckCommand,
    interpret::Sample,
    mapping::MappingStore,
};

/// Represents the current status of the playback engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum PlayerState {
    Playing,
    Paused,
    Stopped,
}

/// A handle to the playback engine.
///
/// This struct acts as a command proxy; it does not perform playback itself
/// but instead sends instructions to a background worker thread.
pub(crate) struct VideoDeck {
    /// Channel for sending commands to the background worker thread.
    command_tx: mpsc::Sender<DeckCommand>,
}

impl VideoDeck {
    /// Spawns the playback worker thread and returns a new deck handle.
    ///
    /// # Arguments
    ///
    /// * `store` - The mapping store the worker interprets samples against.
    /// * `event_tx` - A channel to send application-level events (status
    ///   updates or errors) back to the main event loop.
    pub(crate) fn new(
        store: Arc<Mutex<MappingStore>>,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel::<DeckCommand>();

        commands::spawn_deck_worker(command_rx, store, event_tx);

        Ok(Self { command_tx })
    }

    // Maps internal playback engine flags to a simplified [`PlayerState`].
    fn player_state(is_paused: bool, is_idle: bool) -> PlayerState {
        if is_idle {
            PlayerState::Stopped
        } else if is_paused {
            PlayerState::Paused
        } else {
            PlayerState::Playing
        }
    }

    /// Feeds one sample into the interpretation funnel.
    pub(crate) fn apply(&self, sample: Sample) -> Result<()> {
        self.command_tx.send(DeckCommand::Apply(sample))?;
        Ok(())
    }

    /// A sender other threads can use to feed samples into the same funnel.
    pub(crate) fn sender(&self) -> mpsc::Sender<DeckCommand> {
        self.command_tx.clone()
    }
}

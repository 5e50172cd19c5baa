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

//! Interpretation of controller register samples.
//!
//! This module turns a raw `(command, index)` pair read from the controller
//! (or from the simulator) into a playback [`Decision`]: whether a different
//! video has to be loaded, and which transport action to apply to it.
//!
//! Two rules here are load-bearing and must not be weakened:
//!
//! 1. A video is only (re)loaded when the sampled index differs from the
//!    current selection. Repeated samples at the same index never reload the
//!    media, no matter how the command code changes between them.
//! 2. When a switch does happen, the load is applied strictly before the
//!    transport action of the same decision.
//!
//! The decision logic is a pure function of the previous selection, the
//! sample, and the mapping store, which keeps it testable without any
//! playback engine.

use std::path::PathBuf;

use crate::mapping::MappingStore;

/// A transport instruction sampled from the controller register.
///
/// The register is a raw byte; only 0-3 are enumerated. Anything else is
/// preserved as [`CommandCode::Other`] so the operator can see exactly what
/// the controller wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandCode {
    Stop,
    Play,
    Pause,
    Resume,
    Other(u8),
}

impl CommandCode {
    pub(crate) fn from_raw(raw: u8) -> Self {
        match raw {
            0 => CommandCode::Stop,
            1 => CommandCode::Play,
            2 => CommandCode::Pause,
            3 => CommandCode::Resume,
            other => CommandCode::Other(other),
        }
    }

    pub(crate) fn raw(self) -> u8 {
        match self {
            CommandCode::Stop => 0,
            CommandCode::Play => 1,
            CommandCode::Pause => 2,
            CommandCode::Resume => 3,
            CommandCode::Other(raw) => raw,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            CommandCode::Stop => "Stop",
            CommandCode::Play => "Play",
            CommandCode::Pause => "Pause",
            CommandCode::Resume => "Resume",
            CommandCode::Other(_) => "?",
        }
    }
}

/// One atomic poll result: the command byte and the video index byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Sample {
    pub(crate) command: CommandCode,
    pub(crate) index: u8,
}

impl Sample {
    /// Builds a sample from the two raw register bytes, `[command, index]`.
    pub(crate) fn from_raw(command: u8, index: u8) -> Self {
        Self {
            command: CommandCode::from_raw(command),
            index,
        }
    }
}

/// The transport half of a decision. `Play` covers both Play and Resume;
/// resuming does not require a pre-existing pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransportAction {
    Play,
    Pause,
    Stop,
}

/// What the operator display should say about the sampled index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MediaDisplay {
    /// The file name of the mapped video.
    Media(String),
    /// No playable video for this index, either unmapped or gone from disk.
    Missing(u8),
}

/// The outcome of interpreting one sample.
///
/// When `load` is set it must be applied before `transport`; the applying
/// side also takes the sample's index as its new selection.
#[derive(Debug, PartialEq)]
pub(crate) struct Decision {
    pub(crate) load: Option<PathBuf>,
    pub(crate) transport: Option<TransportAction>,
    pub(crate) display: MediaDisplay,
}

/// Decides what playback should do about one sample.
///
/// # Arguments
///
/// * `selection` - The index currently loaded into the playback engine, if
///   any.
/// * `sample` - The `(command, index)` pair read this cycle.
/// * `store` - The mapping store, read-only.
pub(crate) fn decide(selection: Option<u8>, sample: Sample, store: &MappingStore) -> Decision {
    let path = match store.resolve(sample.index) {
        Ok(path) => path.to_path_buf(),
        // Unmapped and mapped-but-gone are the same from here: nothing to
        // drive, but the display still reflects the sampled index.
        Err(_) => {
            return Decision {
                load: None,
                transport: None,
                display: MediaDisplay::Missing(sample.index),
            };
        }
    };

    let display = MediaDisplay::Media(file_name_of(&path));
    let load = (selection != Some(sample.index)).then_some(path);
    let transport = transport_for(sample.command);

    Decision {
        load,
        transport,
        display,
    }
}

fn transport_for(command: CommandCode) -> Option<TransportAction> {
    match command {
        CommandCode::Play | CommandCode::Resume => Some(TransportAction::Play),
        CommandCode::Pause => Some(TransportAction::Pause),
        CommandCode::Stop => Some(TransportAction::Stop),
        CommandCode::Other(_) => None,
    }
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    // A store with "b.mp4" mapped at index 7. The TempDir keeps the backing
    // files alive for the duration of the test.
    fn store_with_index_seven(dir: &TempDir) -> MappingStore {
        let mut store = MappingStore::open(dir.path()).expect("store");
        let source = dir.path().join("b.mp4");
        fs::write(&source, b"clip").expect("source file");
        store.add(7, &source).expect("add");
        store
    }

    fn sample(command: u8, index: u8) -> Sample {
        Sample::from_raw(command, index)
    }

    #[test]
    fn an_index_change_loads_the_mapped_video() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with_index_seven(&dir);

        let decision = decide(Some(5), sample(1, 7), &store);

        let load = decision.load.expect("a media switch");
        assert_eq!(load.file_name().unwrap(), "b.mp4");
        assert_eq!(decision.transport, Some(TransportAction::Play));
        assert_eq!(decision.display, MediaDisplay::Media("b.mp4".to_string()));
    }

    #[test]
    fn a_repeated_index_never_reloads_the_video() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with_index_seven(&dir);

        let first = decide(None, sample(1, 7), &store);
        assert!(first.load.is_some());

        // Same index again, even with a different command code.
        let second = decide(Some(7), sample(1, 7), &store);
        assert!(second.load.is_none());
        let third = decide(Some(7), sample(2, 7), &store);
        assert!(third.load.is_none());
        assert_eq!(third.transport, Some(TransportAction::Pause));
    }

    #[test]
    fn an_unmapped_index_yields_no_transport_action() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with_index_seven(&dir);

        let decision = decide(Some(7), sample(1, 42), &store);

        assert_eq!(
            decision,
            Decision {
                load: None,
                transport: None,
                display: MediaDisplay::Missing(42),
            }
        );
    }

    #[test]
    fn a_vanished_video_is_treated_like_an_unmapped_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with_index_seven(&dir);
        let managed = store.resolve(7).expect("resolve").to_path_buf();
        fs::remove_file(&managed).expect("delete managed copy");

        let decision = decide(None, sample(1, 7), &store);

        assert!(decision.load.is_none());
        assert!(decision.transport.is_none());
        assert_eq!(decision.display, MediaDisplay::Missing(7));
    }

    #[test]
    fn the_command_table_maps_raw_codes_to_transport_actions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with_index_seven(&dir);

        let cases = [
            (0, Some(TransportAction::Stop)),
            (1, Some(TransportAction::Play)),
            (2, Some(TransportAction::Pause)),
            (3, Some(TransportAction::Play)),
            (4, None),
            (255, None),
        ];

        for (raw, expected) in cases {
            let decision = decide(Some(7), sample(raw, 7), &store);
            assert_eq!(decision.transport, expected, "command code {raw}");
        }
    }

    #[test]
    fn an_unknown_command_with_a_changed_index_still_switches_media() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with_index_seven(&dir);

        let decision = decide(None, sample(9, 7), &store);

        assert!(decision.load.is_some());
        assert!(decision.transport.is_none());
    }

    #[test]
    fn raw_command_codes_round_trip_and_label() {
        assert_eq!(CommandCode::from_raw(0), CommandCode::Stop);
        assert_eq!(CommandCode::from_raw(3), CommandCode::Resume);
        assert_eq!(CommandCode::from_raw(9), CommandCode::Other(9));
        assert_eq!(CommandCode::Other(9).raw(), 9);
        assert_eq!(CommandCode::Resume.label(), "Resume");
        assert_eq!(CommandCode::Other(9).label(), "?");
    }

    #[test]
    fn paths_stay_usable_even_without_a_file_name() {
        assert_eq!(file_name_of(Path::new("/videos/clip.mp4")), "clip.mp4");
        assert_eq!(file_name_of(Path::new("/")), "/");
    }
}

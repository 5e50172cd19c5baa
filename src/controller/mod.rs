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

//! Sources of `(command, index)` samples.
//!
//! The monitor loop does not care where a sample comes from: the live PLC
//! register and the operator-driven simulator both sit behind the
//! [`SampleSource`] trait. Which of the two is consulted is decided afresh
//! on every poll cycle from the shared [`SimControls`], so the operator can
//! flip between them while monitoring runs.

pub(crate) mod link;

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU8, Ordering},
};

use crate::controller::link::{LinkError, PlcLink};
use crate::interpret::Sample;

/// The connection slot. Whoever holds the lock owns the link for the
/// duration of the operation; `None` means disconnected.
pub(crate) type SharedLink = Arc<Mutex<Option<PlcLink>>>;

pub(crate) trait SampleSource: Send {
    /// Produces the sample for one poll cycle.
    fn sample(&mut self) -> Result<Sample, LinkError>;
}

/// Reads the command register from the live controller connection.
pub(crate) struct LiveSource {
    link: SharedLink,
    db_number: u16,
}

impl LiveSource {
    pub(crate) fn new(link: SharedLink, db_number: u16) -> Self {
        Self { link, db_number }
    }
}

impl SampleSource for LiveSource {
    /// Reads two raw bytes from the configured data block: `[command,
    /// index]`. The command byte is forwarded unvalidated; values outside
    /// the enumerated set stay visible to the operator as unknown codes.
    fn sample(&mut self) -> Result<Sample, LinkError> {
        let mut slot = self.link.lock().expect("plc link lock poisoned");
        let link = slot.as_mut().ok_or(LinkError::NotConnected)?;

        let bytes = link.read_block(self.db_number, 0, 2)?;
        Ok(Sample::from_raw(bytes[0], bytes[1]))
    }
}

/// Shared state behind the simulation surface.
///
/// The command is sticky: it holds whatever the operator last invoked
/// (default Play) and is re-reported on every simulated poll cycle until a
/// different command is invoked. The index field is read fresh each cycle.
pub(crate) struct SimControls {
    enabled: AtomicBool,
    command: AtomicU8,
    index: AtomicU8,
}

impl SimControls {
    pub(crate) fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            command: AtomicU8::new(1),
            index: AtomicU8::new(0),
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn command(&self) -> u8 {
        self.command.load(Ordering::Relaxed)
    }

    pub(crate) fn set_command(&self, command: u8) {
        self.command.store(command, Ordering::Relaxed);
    }

    pub(crate) fn index(&self) -> u8 {
        self.index.load(Ordering::Relaxed)
    }

    pub(crate) fn set_index(&self, index: u8) {
        self.index.store(index, Ordering::Relaxed);
    }
}

/// Reports the operator's sticky simulated command instead of the register.
pub(crate) struct SimulatedSource {
    controls: Arc<SimControls>,
}

impl SimulatedSource {
    pub(crate) fn new(controls: Arc<SimControls>) -> Self {
        Self { controls }
    }
}

impl SampleSource for SimulatedSource {
    fn sample(&mut self) -> Result<Sample, LinkError> {
        Ok(Sample::from_raw(
            self.controls.command(),
            self.controls.index(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::interpret::CommandCode;

    #[test]
    fn the_simulated_source_reports_the_sticky_command_every_cycle() {
        let controls = Arc::new(SimControls::new());
        let mut source = SimulatedSource::new(Arc::clone(&controls));

        // Default is Play until the operator invokes something else.
        let sample = source.sample().expect("sample");
        assert_eq!(sample.command, CommandCode::Play);

        controls.set_command(2);
        controls.set_index(9);
        for _ in 0..3 {
            let sample = source.sample().expect("sample");
            assert_eq!(sample.command, CommandCode::Pause);
            assert_eq!(sample.index, 9);
        }
    }

    #[test]
    fn a_live_source_without_a_connection_reports_the_failure() {
        let link: SharedLink = Arc::new(Mutex::new(None));
        let mut source = LiveSource::new(link, 1);

        assert!(matches!(source.sample(), Err(LinkError::NotConnected)));
    }
}

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

//! The register polling loop.
//!
//! [`Monitor`] owns a background thread that samples the controller port on
//! a fixed cadence, forwards each sample into the playback funnel and
//! publishes it for the status display. Cancellation is cooperative: the
//! thread checks a stop flag every cycle, so stopping takes effect within
//! one poll interval.
//!
//! A failed read never stops the loop. The cycle is skipped, the failure is
//! published as status, and the next tick retries - indefinitely, with no
//! backoff. Cycles never overlap; a slow read simply pushes the next cycle
//! out.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::{
    actions::events::AppEvent,
    controller::{SampleSource, SimControls},
    deck::commands::DeckCommand,
};

#[derive(Debug, Error)]
pub(crate) enum MonitorError {
    #[error("monitoring is already running")]
    AlreadyRunning,

    #[error("monitoring is not running")]
    NotRunning,
}

/// Everything one polling thread needs.
pub(crate) struct PollPorts {
    pub(crate) live: Box<dyn SampleSource>,
    pub(crate) sim: Box<dyn SampleSource>,
    pub(crate) controls: Arc<SimControls>,
    pub(crate) deck_tx: Sender<DeckCommand>,
    pub(crate) event_tx: Sender<AppEvent>,
}

/// Handle to the polling thread. At most one poller runs per handle.
pub(crate) struct Monitor {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Monitor {
    pub(crate) fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Starts the polling thread.
    ///
    /// # Errors
    ///
    /// Fails with [`MonitorError::AlreadyRunning`] when a poller is already
    /// active; the existing poller is left untouched.
    pub(crate) fn start(&mut self, interval: Duration, ports: PollPorts) -> Result<(), MonitorError> {
        if self.handle.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        self.running.store(true, Ordering::Relaxed);
        let running = Arc::clone(&self.running);
        self.handle = Some(thread::spawn(move || poll_loop(running, interval, ports)));

        Ok(())
    }

    /// Signals the polling thread to stop and waits for it to finish.
    ///
    /// Individual cycle steps are bounded, so the join completes within
    /// roughly one poll interval plus one read timeout.
    pub(crate) fn stop(&mut self) -> Result<(), MonitorError> {
        let handle = self.handle.take().ok_or(MonitorError::NotRunning)?;

        self.running.store(false, Ordering::Relaxed);
        let _ = handle.join();

        Ok(())
    }
}

fn poll_loop(running: Arc<AtomicBool>, interval: Duration, mut ports: PollPorts) {
    while running.load(Ordering::Relaxed) {
        let cycle_started = Instant::now();

        // The source toggle is re-read on every cycle so the operator can
        // flip between the register and the simulator mid-run.
        let source: &mut dyn SampleSource = if ports.controls.enabled() {
            &mut *ports.sim
        } else {
            &mut *ports.live
        };

        match source.sample() {
            Ok(sample) => {
                if ports.event_tx.send(AppEvent::SampleObserved(sample)).is_err() {
                    break;
                }
                if ports.deck_tx.send(DeckCommand::Apply(sample)).is_err() {
                    break;
                }
            }
            Err(e) => {
                // Skip this cycle; the next tick retries.
                if ports.event_tx.send(AppEvent::PollFailed(e.to_string())).is_err() {
                    break;
                }
            }
        }

        if let Some(remaining) = interval.checked_sub(cycle_started.elapsed()) {
            thread::sleep(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc;

    use crate::controller::{SimulatedSource, link::LinkError};
    use crate::interpret::Sample;

    const TEST_INTERVAL: Duration = Duration::from_millis(10);

    // A live stand-in that fails on one specific call and succeeds
    // otherwise.
    struct FlakySource {
        calls: usize,
        failing_call: usize,
    }

    impl SampleSource for FlakySource {
        fn sample(&mut self) -> Result<Sample, LinkError> {
            self.calls += 1;
            if self.calls == self.failing_call {
                Err(LinkError::Protocol("scripted failure"))
            } else {
                Ok(Sample::from_raw(1, 7))
            }
        }
    }

    fn ports(
        live: Box<dyn SampleSource>,
        controls: Arc<SimControls>,
    ) -> (PollPorts, mpsc::Receiver<DeckCommand>, mpsc::Receiver<AppEvent>) {
        let (deck_tx, deck_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let sim = Box::new(SimulatedSource::new(Arc::clone(&controls)));
        let ports = PollPorts {
            live,
            sim,
            controls,
            deck_tx,
            event_tx,
        };
        (ports, deck_rx, event_rx)
    }

    #[test]
    fn a_failed_read_skips_the_cycle_and_the_loop_keeps_polling() {
        let controls = Arc::new(SimControls::new());
        let live = Box::new(FlakySource {
            calls: 0,
            failing_call: 2,
        });
        let (ports, deck_rx, event_rx) = ports(live, controls);

        let mut monitor = Monitor::new();
        monitor.start(TEST_INTERVAL, ports).expect("start");
        thread::sleep(TEST_INTERVAL * 10);
        monitor.stop().expect("stop");

        let events: Vec<_> = event_rx.try_iter().collect();
        let failures = events
            .iter()
            .filter(|e| matches!(e, AppEvent::PollFailed(_)))
            .count();
        let samples = events
            .iter()
            .filter(|e| matches!(e, AppEvent::SampleObserved(_)))
            .count();

        assert_eq!(failures, 1);
        assert!(samples >= 3, "polling should have continued, saw {samples}");
        // The failed cycle forwarded nothing to the deck.
        assert_eq!(deck_rx.try_iter().count(), samples);
    }

    #[test]
    fn starting_twice_does_not_spawn_a_second_poller() {
        let controls = Arc::new(SimControls::new());
        controls.set_enabled(true);
        let live = Box::new(FlakySource {
            calls: 0,
            failing_call: usize::MAX,
        });
        let (first, _deck_rx, _event_rx) = ports(live, Arc::clone(&controls));

        let mut monitor = Monitor::new();
        monitor.start(TEST_INTERVAL, first).expect("start");

        let second_live = Box::new(FlakySource {
            calls: 0,
            failing_call: usize::MAX,
        });
        let (second, _second_deck, _second_events) = ports(second_live, controls);
        assert!(matches!(
            monitor.start(TEST_INTERVAL, second),
            Err(MonitorError::AlreadyRunning)
        ));
        assert!(monitor.is_running());

        monitor.stop().expect("stop");
    }

    #[test]
    fn stopping_a_stopped_monitor_reports_not_running() {
        let mut monitor = Monitor::new();
        assert!(matches!(monitor.stop(), Err(MonitorError::NotRunning)));
        assert!(!monitor.is_running());
    }

    #[test]
    fn stop_halts_sampling() {
        let controls = Arc::new(SimControls::new());
        controls.set_enabled(true);
        let live = Box::new(FlakySource {
            calls: 0,
            failing_call: usize::MAX,
        });
        let (ports, deck_rx, _event_rx) = ports(live, controls);

        let mut monitor = Monitor::new();
        monitor.start(TEST_INTERVAL, ports).expect("start");
        thread::sleep(TEST_INTERVAL * 5);
        monitor.stop().expect("stop");
        assert!(!monitor.is_running());

        // Drain whatever was produced before the stop, then confirm silence.
        while deck_rx.try_recv().is_ok() {}
        thread::sleep(TEST_INTERVAL * 5);
        assert!(deck_rx.try_recv().is_err());
    }

    #[test]
    fn the_source_toggle_is_consulted_every_cycle() {
        let controls = Arc::new(SimControls::new());
        controls.set_index(9);
        let live = Box::new(FlakySource {
            calls: 0,
            failing_call: usize::MAX,
        });
        let (ports, _deck_rx, event_rx) = ports(live, Arc::clone(&controls));

        let mut monitor = Monitor::new();
        monitor.start(TEST_INTERVAL, ports).expect("start");
        thread::sleep(TEST_INTERVAL * 5);

        // Flip to the simulator mid-run; the loop must pick it up without a
        // restart.
        controls.set_enabled(true);
        thread::sleep(TEST_INTERVAL * 5);
        monitor.stop().expect("stop");

        let indices: Vec<u8> = event_rx
            .try_iter()
            .filter_map(|e| match e {
                AppEvent::SampleObserved(sample) => Some(sample.index),
                _ => None,
            })
            .collect();

        assert!(indices.contains(&7), "live samples expected");
        assert!(indices.contains(&9), "simulated samples expected");
    }
}

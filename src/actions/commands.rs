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

//! Asynchronous operator task processing.
//!
//! This module implements the command pattern used to offload potentially
//! blocking operations - connecting to the controller, copying video files,
//! starting and stopping the monitor - from the main UI thread. It provides
//! a dedicated worker loop that executes [`AppTask`] requests and broadcasts
//! the results back to the application via
//! [`AppEvent`](crate::actions::events::AppEvent)s.
//!
//! The worker owns the controller link slot and the monitor handle, which
//! enforces the required ordering between them: a disconnect always stops
//! the monitor before the link is dropped.

use anyhow::{Context, Result};
use lofty::prelude::*;
use lofty::probe::Probe;
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex, mpsc::{Receiver, Sender}},
    thread,
    time::Duration,
};

use crate::{
    actions::events::AppEvent,
    config::AppConfig,
    controller::{LiveSource, SharedLink, SimControls, SimulatedSource, link::PlcLink},
    deck::VideoDeck,
    interpret::{CommandCode, Sample},
    mapping::{MappingRow, MappingStore},
    monitor::{Monitor, MonitorError, PollPorts},
};

#[derive(Debug)]
pub(crate) enum AppTask {
    ToggleConnection,
    ToggleMonitor,
    ToggleSimulation,

    SetSimIndex(u8),
    Simulate(CommandCode),

    AddMapping { index: i64, source: PathBuf },
    RemoveMapping(u8),
    RefreshMappings,

    ExitApplication,
}

/// Spawns a background thread to process operator tasks.
///
/// The worker owns the controller link slot and the monitor handle for the
/// lifetime of the application and enters a blocking loop, listening for
/// incoming [`AppTask`]s.
///
/// # Arguments
///
/// * `config` - The application configuration.
/// * `store` - The shared mapping store.
/// * `controls` - The shared simulation controls.
/// * `deck` - The playback deck handle.
/// * `task_rx` - The receiving end of the task channel.
/// * `event_tx` - The sending end of the channel for broadcasting results.
pub(crate) fn spawn_task_worker(
    config: &AppConfig,
    store: Arc<Mutex<MappingStore>>,
    controls: Arc<SimControls>,
    deck: VideoDeck,
    task_rx: Receiver<AppTask>,
    event_tx: Sender<AppEvent>,
) {
    let config = config.clone();

    thread::spawn(move || {
        let mut ctx = TaskContext {
            config,
            store,
            controls,
            deck,
            link: Arc::new(Mutex::new(None)),
            monitor: Monitor::new(),
            event_tx,
        };

        while let Ok(task) = task_rx.recv() {
            if let Err(e) = handle_task(task, &mut ctx) {
                let _ = ctx.event_tx.send(AppEvent::Error(e.to_string()));
            }
        }
    });
}

/// Bundles shared resources required by task handlers to simplify resource
/// passing when invoking those handler functions.
struct TaskContext {
    config: AppConfig,
    store: Arc<Mutex<MappingStore>>,
    controls: Arc<SimControls>,
    deck: VideoDeck,
    link: SharedLink,
    monitor: Monitor,
    event_tx: Sender<AppEvent>,
}

/// Orchestrates the execution of a single task.
///
/// This function implements the logic for each task and sends the result
/// back through the application event channel.
fn handle_task(task: AppTask, ctx: &mut TaskContext) -> Result<()> {
    match task {
        AppTask::ToggleConnection => toggle_connection(ctx),
        AppTask::ToggleMonitor => toggle_monitor(ctx),
        AppTask::ToggleSimulation => toggle_simulation(ctx),

        AppTask::SetSimIndex(index) => set_sim_index(ctx, index),
        AppTask::Simulate(command) => simulate(ctx, command),

        AppTask::AddMapping { index, source } => add_mapping(ctx, index, &source),
        AppTask::RemoveMapping(index) => remove_mapping(ctx, index),
        AppTask::RefreshMappings => refresh_mappings(ctx),

        AppTask::ExitApplication => {
            ctx.event_tx.send(AppEvent::ExitApplication)?;
            Ok(())
        }
    }
}

fn toggle_connection(ctx: &mut TaskContext) -> Result<()> {
    let connected = ctx.link.lock().expect("plc link lock poisoned").is_some();
    if connected {
        disconnect(ctx)
    } else {
        connect(ctx)
    }
}

fn connect(ctx: &mut TaskContext) -> Result<()> {
    let cfg = &ctx.config;
    let link = PlcLink::connect(&cfg.plc_host, cfg.plc_port, cfg.plc_rack, cfg.plc_slot)
        .context("Failed to connect to the controller")?;

    *ctx.link.lock().expect("plc link lock poisoned") = Some(link);
    ctx.event_tx.send(AppEvent::ConnectionChanged(true))?;

    Ok(())
}

fn disconnect(ctx: &mut TaskContext) -> Result<()> {
    // The monitor reads through the link while running; stop it before the
    // connection is dropped.
    if ctx.monitor.is_running() {
        stop_monitor(ctx)?;
    }

    *ctx.link.lock().expect("plc link lock poisoned") = None;
    ctx.event_tx.send(AppEvent::ConnectionChanged(false))?;

    Ok(())
}

fn toggle_monitor(ctx: &mut TaskContext) -> Result<()> {
    if ctx.monitor.is_running() {
        stop_monitor(ctx)
    } else {
        start_monitor(ctx)
    }
}

fn start_monitor(ctx: &mut TaskContext) -> Result<()> {
    let connected = ctx.link.lock().expect("plc link lock poisoned").is_some();
    if !connected && !ctx.controls.enabled() {
        ctx.event_tx.send(AppEvent::Error(
            "Connect to the controller or enable simulation first".to_string(),
        ))?;
        return Ok(());
    }

    let ports = PollPorts {
        live: Box::new(LiveSource::new(
            Arc::clone(&ctx.link),
            ctx.config.plc_db_number,
        )),
        sim: Box::new(SimulatedSource::new(Arc::clone(&ctx.controls))),
        controls: Arc::clone(&ctx.controls),
        deck_tx: ctx.deck.sender(),
        event_tx: ctx.event_tx.clone(),
    };

    let interval = Duration::from_millis(ctx.config.poll_interval_ms);
    match ctx.monitor.start(interval, ports) {
        Ok(()) => ctx.event_tx.send(AppEvent::MonitorChanged(true))?,
        // Benign: a poller is already active and stays the only one.
        Err(MonitorError::AlreadyRunning) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

fn stop_monitor(ctx: &mut TaskContext) -> Result<()> {
    match ctx.monitor.stop() {
        Ok(()) => ctx.event_tx.send(AppEvent::MonitorChanged(false))?,
        // Benign: there was nothing to stop.
        Err(MonitorError::NotRunning) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

fn toggle_simulation(ctx: &mut TaskContext) -> Result<()> {
    let enabled = !ctx.controls.enabled();
    ctx.controls.set_enabled(enabled);
    ctx.event_tx.send(AppEvent::SimulationChanged(enabled))?;

    Ok(())
}

fn set_sim_index(ctx: &mut TaskContext, index: u8) -> Result<()> {
    ctx.controls.set_index(index);
    ctx.event_tx.send(AppEvent::SimIndexChanged(index))?;

    Ok(())
}

// A single-shot simulated command: applied through the same interpreter
// funnel as polled samples, whether or not the monitor is running, and made
// the sticky command for subsequent simulated poll cycles.
fn simulate(ctx: &mut TaskContext, command: CommandCode) -> Result<()> {
    if !ctx.controls.enabled() {
        ctx.event_tx
            .send(AppEvent::Error("Enable simulation first".to_string()))?;
        return Ok(());
    }

    ctx.controls.set_command(command.raw());

    let sample = Sample::from_raw(command.raw(), ctx.controls.index());
    ctx.event_tx.send(AppEvent::SampleObserved(sample))?;
    ctx.deck.apply(sample)?;

    Ok(())
}

fn add_mapping(ctx: &mut TaskContext, index: i64, source: &Path) -> Result<()> {
    {
        let mut store = ctx.store.lock().expect("mapping store lock poisoned");
        store.add(index, source)?;
    }

    refresh_mappings(ctx)
}

fn remove_mapping(ctx: &mut TaskContext, index: u8) -> Result<()> {
    {
        let mut store = ctx.store.lock().expect("mapping store lock poisoned");
        store.remove(index)?;
    }

    refresh_mappings(ctx)
}

fn refresh_mappings(ctx: &mut TaskContext) -> Result<()> {
    let rows: Vec<MappingRow> = {
        let store = ctx.store.lock().expect("mapping store lock poisoned");
        store
            .all()
            .map(|(index, path)| MappingRow {
                index,
                file_name: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                duration: probe_duration(path),
            })
            .collect()
    };

    ctx.event_tx.send(AppEvent::MappingsChanged(rows))?;

    Ok(())
}

// Best-effort duration probe for the table display; files the probe cannot
// parse simply show no duration.
fn probe_duration(path: &Path) -> Option<Duration> {
    let tagged_file = Probe::open(path).and_then(|probe| probe.read()).ok()?;
    Some(tagged_file.properties().duration())
}

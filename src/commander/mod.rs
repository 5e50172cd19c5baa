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

//! Command-line input logic and state management.
//!
//! This module implements the logic for the command-line processing
//! component, handling a text input component and dispatching a
//! corresponding application task when typing is finished and a command is
//! submitted. Parameterized operations - mapping an index to a file,
//! removing a mapping, setting the simulated index - all go through here.

use std::sync::mpsc::Sender;

use anyhow::Result;
use crossterm::event::{Event, KeyCode};
use tui_input::{Input, backend::crossterm::EventHandler};

use crate::actions::commands::AppTask;

pub(crate) struct Commander {
    active: bool,
    pub(crate) input: Input,
}

impl Commander {
    pub(crate) fn new() -> Self {
        Self {
            active: false,
            input: Input::default(),
        }
    }

    pub(crate) fn active(&self) -> bool {
        self.active
    }

    pub(crate) fn handle_event(&mut self, event: Event, task_sender: &mut Sender<AppTask>) -> bool {
        if self.active {
            match event {
                Event::Key(key_event) => match key_event.code {
                    KeyCode::Esc => {
                        self.active = false;
                        self.input.reset();
                        true
                    }

                    KeyCode::Enter => {
                        let buffer = self.input.value().trim().to_string();
                        if !buffer.is_empty() {
                            let _ = self.run_command(&buffer, task_sender);
                        }
                        self.input.reset();
                        self.active = false;
                        true
                    }

                    _ => {
                        // Delegate all key events to the managed input
                        // component.
                        self.input.handle_event(&event);
                        true
                    }
                },

                _ => false,
            }
        } else {
            match event {
                Event::Key(key_event) => match key_event.code {
                    KeyCode::Char(':') => {
                        self.active = true;
                        true
                    }

                    _ => false,
                },

                _ => false,
            }
        }
    }

    fn run_command(&self, buffer: &str, task_sender: &mut Sender<AppTask>) -> Result<()> {
        let parts: Vec<&str> = buffer.split_whitespace().collect();

        match parts.as_slice() {
            ["q"] => task_sender.send(AppTask::ExitApplication)?,

            // map <index> <path>  (paths may contain spaces)
            ["map", index, path_parts @ ..] if !path_parts.is_empty() => {
                if let Ok(index) = index.parse::<i64>() {
                    let source = path_parts.join(" ").into();
                    task_sender.send(AppTask::AddMapping { index, source })?;
                }
            }

            ["unmap", index] => {
                if let Ok(index) = index.parse::<u8>() {
                    task_sender.send(AppTask::RemoveMapping(index))?;
                }
            }

            // idx <n> sets the simulated index
            ["idx", index] => {
                if let Ok(index) = index.parse::<u8>() {
                    task_sender.send(AppTask::SetSimIndex(index))?;
                }
            }

            [] => {} // empty (no command)

            [_cmd, ..] => {} // unknown command (and params)
        }

        Ok(())
    }
}

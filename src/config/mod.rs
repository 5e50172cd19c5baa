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

//! Application configuration.
//!
//! This module manages the application configuration file: the controller
//! address and CPU position, the data block holding the command register,
//! the poll cadence, and the data directory for the mapping file and the
//! managed video library. The core treats the connection parameters as
//! opaque; they are read once at startup and handed to the link constructor.

use serde::{Deserialize, Serialize};

const CONFIG_NAME: &str = "plcue";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub version: u32,
    pub plc_host: String,
    pub plc_port: u16,
    pub plc_rack: u8,
    pub plc_slot: u8,
    pub plc_db_number: u16,
    pub poll_interval_ms: u64,
    pub data_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            plc_host: "192.168.1.100".to_string(),
            plc_port: 102,
            plc_rack: 0,
            plc_slot: 1,
            plc_db_number: 1,
            poll_interval_ms: 100,
            data_dir: ".".to_string(),
        }
    }
}

pub fn load_config() -> AppConfig {
    confy::load(CONFIG_NAME, None).unwrap_or_default()
}

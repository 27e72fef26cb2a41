// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Machine configuration.
//!
//! Read from an optional TOML file layered with `ATM__SECTION__KEY`
//! environment variables. Every key has a default, so an empty
//! configuration yields a factory-fresh machine:
//!
//! ```toml
//! [machine]
//! id = "ATM-001"
//! software_version = "1.0"
//! log_level = "info"
//!
//! [reserve]
//! ink_level = 5
//! paper_level = 6
//!
//! [reserve.notes]
//! "100" = 1
//! "50" = 2
//! "20" = 5
//! "10" = 5
//!
//! [[accounts]]
//! account = "ACC001"
//! owner = "USR001"
//! kind = "checking"
//! balance = "200.00"
//! ```

use crate::account::AccountRecord;
use crate::denomination::{Denomination, NoteCounts, UnsupportedDenomination};
use crate::maintenance::{ParseVersionError, SoftwareVersion};
use crate::reserve::CashReserveState;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "atm";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    pub id: String,
    pub software_version: String,
    pub log_level: String,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            id: "ATM-001".into(),
            software_version: "1.0".into(),
            log_level: "info".into(),
        }
    }
}

/// Starting inventory, used only when no saved machine state exists.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReserveSettings {
    /// Note counts keyed by face value.
    pub notes: BTreeMap<String, u32>,
    pub ink_level: i64,
    pub paper_level: i64,
}

impl Default for ReserveSettings {
    fn default() -> Self {
        let notes = [("100", 1), ("50", 2), ("20", 5), ("10", 5)]
            .into_iter()
            .map(|(d, c)| (d.to_owned(), c))
            .collect();
        Self {
            notes,
            ink_level: 5,
            paper_level: 6,
        }
    }
}

impl ReserveSettings {
    pub fn to_state(&self) -> Result<CashReserveState, UnsupportedDenomination> {
        let notes = self
            .notes
            .iter()
            .map(
                |(denomination, count)| -> Result<(Denomination, u32), UnsupportedDenomination> {
                    Ok((denomination.parse()?, *count))
                },
            )
            .collect::<Result<NoteCounts, _>>()?;
        Ok(CashReserveState::new(notes, self.ink_level, self.paper_level))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub machine: MachineSettings,
    pub reserve: ReserveSettings,
    /// Accounts provisioned at start-up.
    pub accounts: Vec<AccountRecord>,
}

impl Settings {
    /// Loads settings from `path`, or from an optional `atm.*` file in the
    /// working directory when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("ATM").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn software_version(&self) -> Result<SoftwareVersion, ParseVersionError> {
        self.machine.software_version.parse()
    }
}

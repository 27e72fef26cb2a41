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

//! Maintenance permissions and machine status.
//!
//! What a technician may do is a [`MaintenancePolicy`] value derived from
//! the running [`SoftwareVersion`]:
//!
//! | Version | Policy | Allowed |
//! |---------|--------|---------|
//! | < 2.0 | `ReadOnly` | status reports |
//! | >= 2.0 | `Full` | status, cash, ink, paper, software updates |

use crate::denomination::Denomination;
use crate::error::AtmError;
use crate::reserve::CashReserveState;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Who is driving the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Customer,
    Technician,
}

/// `major.minor` software version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SoftwareVersion {
    pub major: u32,
    pub minor: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed software version: {0:?}")]
pub struct ParseVersionError(pub String);

impl SoftwareVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

/// Accepts `"2"` and `"2.1"`.
impl FromStr for SoftwareVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseVersionError(s.to_owned());
        let trimmed = s.trim();
        let (major, minor) = match trimmed.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (trimmed, "0"),
        };
        Ok(Self {
            major: major.parse().map_err(|_| malformed())?,
            minor: minor.parse().map_err(|_| malformed())?,
        })
    }
}

impl fmt::Display for SoftwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenancePolicy {
    ReadOnly,
    Full,
}

impl MaintenancePolicy {
    /// First version with full maintenance.
    pub const FULL_SINCE: SoftwareVersion = SoftwareVersion::new(2, 0);

    pub fn for_version(version: SoftwareVersion) -> Self {
        if version >= Self::FULL_SINCE {
            MaintenancePolicy::Full
        } else {
            MaintenancePolicy::ReadOnly
        }
    }

    /// Checks that `role` may change the machine under this policy.
    ///
    /// # Errors
    ///
    /// [`AtmError::Unauthorized`] for customers, or for anyone while the
    /// policy is read-only.
    pub fn authorize(self, role: Role, version: SoftwareVersion) -> Result<(), AtmError> {
        if role != Role::Technician {
            return Err(AtmError::Unauthorized("technician role required".into()));
        }
        match self {
            MaintenancePolicy::Full => Ok(()),
            MaintenancePolicy::ReadOnly => Err(AtmError::Unauthorized(format!(
                "maintenance is read-only on software version {version}; \
                 upgrade to {} for full maintenance",
                Self::FULL_SINCE
            ))),
        }
    }
}

/// Point-in-time machine report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineStatus {
    pub machine_id: String,
    pub software_version: SoftwareVersion,
    pub policy: MaintenancePolicy,
    pub reserve: CashReserveState,
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "================================")?;
        writeln!(f, "       ATM STATUS REPORT        ")?;
        writeln!(f, "================================")?;
        writeln!(f, "ATM ID: {}", self.machine_id)?;
        writeln!(f, "Software Version: {}", self.software_version)?;
        writeln!(f, "Total Cash: €{:.2}", self.reserve.total_cash())?;
        writeln!(f, "Cash by Denomination:")?;
        for denomination in Denomination::DESCENDING {
            writeln!(
                f,
                "  €{} notes: {}",
                denomination,
                self.reserve.notes().get(denomination)
            )?;
        }
        writeln!(f, "Ink Level: {}%", self.reserve.ink_level())?;
        writeln!(f, "Paper Level: {} sheets", self.reserve.paper_level())?;
        writeln!(f, "================================")
    }
}

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

//! Note denominations and per-denomination note counts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A note value the machine can hold and dispense.
///
/// Ordering follows face value, so `Ten < Hundred`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Denomination {
    Ten,
    Twenty,
    Fifty,
    Hundred,
}

/// Rejected note value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported denomination: {0}")]
pub struct UnsupportedDenomination(pub String);

impl Denomination {
    /// All denominations, largest first. Dispensing walks this order.
    pub const DESCENDING: [Denomination; 4] = [
        Denomination::Hundred,
        Denomination::Fifty,
        Denomination::Twenty,
        Denomination::Ten,
    ];

    pub const SMALLEST: Denomination = Denomination::Ten;

    pub const fn value(self) -> u32 {
        match self {
            Denomination::Ten => 10,
            Denomination::Twenty => 20,
            Denomination::Fifty => 50,
            Denomination::Hundred => 100,
        }
    }
}

impl From<Denomination> for u32 {
    fn from(denomination: Denomination) -> Self {
        denomination.value()
    }
}

impl TryFrom<u32> for Denomination {
    type Error = UnsupportedDenomination;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(Denomination::Ten),
            20 => Ok(Denomination::Twenty),
            50 => Ok(Denomination::Fifty),
            100 => Ok(Denomination::Hundred),
            other => Err(UnsupportedDenomination(other.to_string())),
        }
    }
}

impl FromStr for Denomination {
    type Err = UnsupportedDenomination;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| UnsupportedDenomination(s.to_owned()))?;
        Denomination::try_from(value)
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Note count per denomination.
///
/// Used both for the machine's holdings and for a dispensing plan. Zero
/// counts are dropped on every path in, deserialization included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Denomination, u32>", into = "BTreeMap<Denomination, u32>")]
pub struct NoteCounts(BTreeMap<Denomination, u32>);

impl NoteCounts {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Number of notes held for `denomination` (zero when absent).
    pub fn get(&self, denomination: Denomination) -> u32 {
        self.0.get(&denomination).copied().unwrap_or(0)
    }

    /// Sets the count for `denomination`. Zero counts are not stored, so two
    /// holdings compare equal whenever every count agrees.
    pub fn set(&mut self, denomination: Denomination, count: u32) {
        if count == 0 {
            self.0.remove(&denomination);
        } else {
            self.0.insert(denomination, count);
        }
    }

    /// Adds `count` notes, saturating at `u32::MAX`.
    pub fn add(&mut self, denomination: Denomination, count: u32) {
        if count == 0 {
            return;
        }
        let entry = self.0.entry(denomination).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Entries in ascending denomination order.
    pub fn iter(&self) -> impl Iterator<Item = (Denomination, u32)> + '_ {
        self.0.iter().map(|(d, c)| (*d, *c))
    }

    /// Σ denomination × count.
    pub fn total_value(&self) -> Decimal {
        self.0
            .iter()
            .map(|(d, c)| Decimal::from(d.value()) * Decimal::from(*c))
            .sum()
    }

    pub fn note_count(&self) -> u64 {
        self.0.values().map(|c| u64::from(*c)).sum()
    }

    /// True when no notes are held at all.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|c| *c == 0)
    }

    /// Denominations with at least one note.
    pub fn len(&self) -> usize {
        self.0.values().filter(|c| **c > 0).count()
    }
}

impl FromIterator<(Denomination, u32)> for NoteCounts {
    fn from_iter<I: IntoIterator<Item = (Denomination, u32)>>(iter: I) -> Self {
        let mut notes = NoteCounts::new();
        for (denomination, count) in iter {
            notes.add(denomination, count);
        }
        notes
    }
}

impl From<BTreeMap<Denomination, u32>> for NoteCounts {
    fn from(counts: BTreeMap<Denomination, u32>) -> Self {
        counts.into_iter().collect()
    }
}

impl From<NoteCounts> for BTreeMap<Denomination, u32> {
    fn from(notes: NoteCounts) -> Self {
        notes.0
    }
}

/// Parses `"100:2 50:1"` (whitespace or comma separated `denomination:count` pairs).
impl FromStr for NoteCounts {
    type Err = UnsupportedDenomination;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(|part| -> Result<(Denomination, u32), UnsupportedDenomination> {
                let (denomination, count) = part
                    .split_once(':')
                    .ok_or_else(|| UnsupportedDenomination(part.to_owned()))?;
                let count = count
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| UnsupportedDenomination(part.to_owned()))?;
                Ok((denomination.parse::<Denomination>()?, count))
            })
            .collect()
    }
}

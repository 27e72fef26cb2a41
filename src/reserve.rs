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

//! Physical resources held by the machine: notes, ink and paper.
//!
//! Total cash is always derived from the note counts and never stored.
//! Ink is a percentage clamped to `0..=100`; paper is a sheet count that
//! never goes below zero. Every mutation path, including deserializing a
//! saved state, goes through the same clamping.
//!
//! # Example
//!
//! ```
//! use atm_ledger_rs::{CashReserveState, Denomination, NoteCounts};
//! use rust_decimal_macros::dec;
//!
//! let mut reserve = CashReserveState::new(NoteCounts::new(), 150, -3);
//! assert_eq!(reserve.ink_level(), 100);
//! assert_eq!(reserve.paper_level(), 0);
//!
//! reserve.add_cash(Denomination::Fifty, 2);
//! assert_eq!(reserve.total_cash(), dec!(100));
//! ```

use crate::denomination::{Denomination, NoteCounts};
use crate::error::{AtmError, Shortage};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Full ink cartridge, in percent.
pub const MAX_INK_LEVEL: u8 = 100;

/// The machine's note, ink and paper inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ReserveRepr")]
pub struct CashReserveState {
    notes: NoteCounts,
    ink_level: u8,
    paper_level: u32,
}

/// Unchecked wire shape; clamped on the way in.
#[derive(Deserialize)]
struct ReserveRepr {
    #[serde(default)]
    notes: NoteCounts,
    #[serde(default)]
    ink_level: i64,
    #[serde(default)]
    paper_level: i64,
}

impl From<ReserveRepr> for CashReserveState {
    fn from(repr: ReserveRepr) -> Self {
        CashReserveState::new(repr.notes, repr.ink_level, repr.paper_level)
    }
}

impl CashReserveState {
    /// Builds a reserve, clamping ink to `0..=100` and paper to `>= 0`.
    pub fn new(notes: NoteCounts, ink_level: i64, paper_level: i64) -> Self {
        let mut state = Self {
            notes,
            ink_level: 0,
            paper_level: 0,
        };
        state.set_ink_level(ink_level);
        state.set_paper_level(paper_level);
        state
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.ink_level <= MAX_INK_LEVEL,
            "Invariant violated: ink level above {MAX_INK_LEVEL}: {}",
            self.ink_level
        );
    }

    pub fn notes(&self) -> &NoteCounts {
        &self.notes
    }

    pub fn ink_level(&self) -> u8 {
        self.ink_level
    }

    pub fn paper_level(&self) -> u32 {
        self.paper_level
    }

    /// Σ denomination × count, recomputed on every call.
    pub fn total_cash(&self) -> Decimal {
        self.notes.total_value()
    }

    pub fn has_sufficient_cash(&self, amount: Decimal) -> bool {
        self.total_cash() >= amount
    }

    /// Takes `count` notes out of the machine.
    ///
    /// # Errors
    ///
    /// [`Shortage::InsufficientCash`] if fewer than `count` notes of that
    /// denomination are held; the reserve is left untouched.
    pub fn remove_cash(&mut self, denomination: Denomination, count: u32) -> Result<(), AtmError> {
        let held = self.notes.get(denomination);
        if count > held {
            return Err(Shortage::InsufficientCash.into());
        }
        self.notes.set(denomination, held - count);
        Ok(())
    }

    pub fn add_cash(&mut self, denomination: Denomination, count: u32) {
        self.notes.add(denomination, count);
    }

    /// Adds every entry of `notes`.
    pub fn add_notes(&mut self, notes: &NoteCounts) {
        for (denomination, count) in notes.iter() {
            self.add_cash(denomination, count);
        }
    }

    pub fn can_print_receipt(&self) -> bool {
        self.ink_level > 0 && self.paper_level > 0
    }

    /// Uses one percent of ink and one sheet of paper.
    ///
    /// Does nothing when a receipt cannot be printed; callers check
    /// [`can_print_receipt`](Self::can_print_receipt) first.
    pub fn consume_receipt_resources(&mut self) {
        if !self.can_print_receipt() {
            return;
        }
        self.ink_level = self.ink_level.saturating_sub(1);
        self.paper_level = self.paper_level.saturating_sub(1);
        self.assert_invariants();
    }

    /// The first resource that blocks printing, if any. Ink is reported first.
    pub fn receipt_shortage(&self) -> Option<Shortage> {
        if self.ink_level == 0 {
            Some(Shortage::OutOfInk)
        } else if self.paper_level == 0 {
            Some(Shortage::OutOfPaper)
        } else {
            None
        }
    }

    pub fn set_ink_level(&mut self, level: i64) {
        self.ink_level = level.clamp(0, i64::from(MAX_INK_LEVEL)) as u8;
        self.assert_invariants();
    }

    pub fn set_paper_level(&mut self, sheets: i64) {
        self.paper_level = sheets.clamp(0, i64::from(u32::MAX)) as u32;
    }

    pub fn refill_ink(&mut self) {
        self.set_ink_level(i64::from(MAX_INK_LEVEL));
    }

    pub fn restock_paper(&mut self, sheets: u32) {
        self.paper_level = self.paper_level.saturating_add(sheets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn factory_reserve() -> CashReserveState {
        let notes = [
            (Denomination::Hundred, 1),
            (Denomination::Fifty, 2),
            (Denomination::Twenty, 5),
            (Denomination::Ten, 5),
        ]
        .into_iter()
        .collect();
        CashReserveState::new(notes, 5, 6)
    }

    #[test]
    fn total_cash_is_derived_from_notes() {
        let mut reserve = factory_reserve();
        assert_eq!(reserve.total_cash(), dec!(350));
        reserve.add_cash(Denomination::Hundred, 2);
        assert_eq!(reserve.total_cash(), dec!(550));
        reserve.remove_cash(Denomination::Ten, 5).unwrap();
        assert_eq!(reserve.total_cash(), dec!(500));
    }

    #[test]
    fn remove_more_notes_than_held_fails_without_change() {
        let mut reserve = factory_reserve();
        let result = reserve.remove_cash(Denomination::Hundred, 2);
        assert_eq!(
            result,
            Err(AtmError::ResourceUnavailable(Shortage::InsufficientCash))
        );
        assert_eq!(reserve.notes().get(Denomination::Hundred), 1);
    }

    #[test]
    fn sufficiency_is_inclusive() {
        let reserve = factory_reserve();
        assert!(reserve.has_sufficient_cash(dec!(350)));
        assert!(!reserve.has_sufficient_cash(dec!(350.01)));
    }

    #[test]
    fn receipts_consume_until_empty() {
        let mut reserve = CashReserveState::new(NoteCounts::new(), 2, 10);
        reserve.consume_receipt_resources();
        reserve.consume_receipt_resources();
        assert_eq!(reserve.ink_level(), 0);
        assert_eq!(reserve.paper_level(), 8);
        assert!(!reserve.can_print_receipt());
        assert_eq!(reserve.receipt_shortage(), Some(Shortage::OutOfInk));

        // No-op once printing is impossible.
        reserve.consume_receipt_resources();
        assert_eq!(reserve.paper_level(), 8);
    }

    #[test]
    fn paper_shortage_reported_when_ink_present() {
        let reserve = CashReserveState::new(NoteCounts::new(), 40, 0);
        assert_eq!(reserve.receipt_shortage(), Some(Shortage::OutOfPaper));
    }

    #[test]
    fn setters_clamp() {
        let mut reserve = factory_reserve();
        reserve.set_ink_level(250);
        assert_eq!(reserve.ink_level(), 100);
        reserve.set_ink_level(-1);
        assert_eq!(reserve.ink_level(), 0);
        reserve.set_paper_level(-20);
        assert_eq!(reserve.paper_level(), 0);
        reserve.restock_paper(u32::MAX);
        reserve.restock_paper(5);
        assert_eq!(reserve.paper_level(), u32::MAX);
    }

    #[test]
    fn refill_ink_fills_to_max() {
        let mut reserve = factory_reserve();
        reserve.refill_ink();
        assert_eq!(reserve.ink_level(), MAX_INK_LEVEL);
    }

    #[test]
    fn deserializing_clamps_out_of_range_levels() {
        let json = r#"{"notes":{"100":3,"10":1},"ink_level":400,"paper_level":-7}"#;
        let reserve: CashReserveState = serde_json::from_str(json).unwrap();
        assert_eq!(reserve.ink_level(), 100);
        assert_eq!(reserve.paper_level(), 0);
        assert_eq!(reserve.total_cash(), dec!(310));
    }
}

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

//! Note selection for cash withdrawals and deposits.
//!
//! Both passes walk [`Denomination::DESCENDING`] and take as many notes of the
//! current denomination as fit in what is left. For `{10, 20, 50, 100}` with
//! unlimited notes this yields the minimum note count. With limited notes the
//! pass can report a split as infeasible even when another mix exists
//! (60 from `{50: 1, 20: 3}`); callers treat that as "no exact split".
//!
//! # Example
//!
//! ```
//! use atm_ledger_rs::{Denomination, NoteCounts, dispenser};
//! use rust_decimal_macros::dec;
//!
//! let available: NoteCounts = [(Denomination::Fifty, 2), (Denomination::Ten, 5)]
//!     .into_iter()
//!     .collect();
//! let plan = dispenser::allocate(dec!(70), &available).unwrap();
//! assert_eq!(plan.get(Denomination::Fifty), 1);
//! assert_eq!(plan.get(Denomination::Ten), 2);
//! ```

use crate::denomination::{Denomination, NoteCounts};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Strategy the engine uses to turn an amount into notes.
pub trait CashDispenser: Send + Sync {
    /// Returns the notes to hand out, or `None` when `amount` cannot be
    /// formed exactly from `available`. Must not exceed any available count.
    fn allocate(&self, amount: Decimal, available: &NoteCounts) -> Option<NoteCounts>;
}

/// Largest-denomination-first dispenser.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyDispenser;

impl CashDispenser for GreedyDispenser {
    fn allocate(&self, amount: Decimal, available: &NoteCounts) -> Option<NoteCounts> {
        allocate(amount, available)
    }
}

/// Greedy exact split of `amount` against `available` notes.
///
/// `amount` must be a non-negative whole multiple of the smallest
/// denomination, otherwise the split is always infeasible. Only
/// denominations actually used appear in the result.
pub fn allocate(amount: Decimal, available: &NoteCounts) -> Option<NoteCounts> {
    let mut remaining = whole_units(amount)?;
    if remaining % u64::from(Denomination::SMALLEST.value()) != 0 {
        return None;
    }

    let mut plan = NoteCounts::new();
    for denomination in Denomination::DESCENDING {
        let value = u64::from(denomination.value());
        let take = (remaining / value).min(u64::from(available.get(denomination)));
        if take > 0 {
            // `take` is bounded by an available u32 count.
            plan.set(denomination, take as u32);
            remaining -= take * value;
        }
    }

    (remaining == 0).then_some(plan)
}

/// Splits a deposited amount into notes with no availability limit.
///
/// Returns the notes and the part of `amount` too small for any note
/// (fractions and anything below the smallest denomination).
pub fn decompose(amount: Decimal) -> (NoteCounts, Decimal) {
    let mut notes = NoteCounts::new();
    let Some(mut remaining) = whole_units(amount.trunc()) else {
        return (notes, amount);
    };

    for denomination in Denomination::DESCENDING {
        let value = u64::from(denomination.value());
        let count = remaining / value;
        if count > 0 {
            notes.add(denomination, u32::try_from(count).unwrap_or(u32::MAX));
            remaining %= value;
        }
    }

    let remainder = amount - notes.total_value();
    (notes, remainder)
}

/// Converts a non-negative whole amount into integer currency units.
fn whole_units(amount: Decimal) -> Option<u64> {
    if amount.is_sign_negative() || !amount.fract().is_zero() {
        return None;
    }
    amount.to_u64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn notes(entries: &[(Denomination, u32)]) -> NoteCounts {
        entries.iter().copied().collect()
    }

    #[test]
    fn whole_units_rejects_fractions_and_negatives() {
        assert_eq!(whole_units(dec!(120)), Some(120));
        assert_eq!(whole_units(dec!(120.00)), Some(120));
        assert_eq!(whole_units(dec!(120.5)), None);
        assert_eq!(whole_units(dec!(-10)), None);
    }

    #[test]
    fn zero_amount_is_an_empty_plan() {
        let available = notes(&[(Denomination::Ten, 1)]);
        assert_eq!(allocate(Decimal::ZERO, &available), Some(NoteCounts::new()));
    }

    #[test]
    fn decompose_of_sub_note_amount_tracks_nothing() {
        let (tracked, remainder) = decompose(dec!(7.25));
        assert!(tracked.is_empty());
        assert_eq!(remainder, dec!(7.25));
    }

    #[test]
    fn greedy_dispenser_delegates_to_allocate() {
        let available = notes(&[(Denomination::Twenty, 3)]);
        assert_eq!(
            GreedyDispenser.allocate(dec!(40), &available),
            allocate(dec!(40), &available)
        );
    }
}

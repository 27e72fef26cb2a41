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

//! Note allocation tests.

use atm_ledger_rs::dispenser::{self, CashDispenser, GreedyDispenser};
use atm_ledger_rs::{Denomination, NoteCounts};
use rust_decimal_macros::dec;

fn notes(list: &str) -> NoteCounts {
    list.parse().unwrap()
}

#[test]
fn factory_reserve_split_for_230() {
    let plan = dispenser::allocate(dec!(230), &notes("100:1 50:2 20:5 10:5")).unwrap();
    assert_eq!(plan, notes("100:1 50:2 20:1 10:1"));
    assert_eq!(plan.total_value(), dec!(230));
}

#[test]
fn prefers_largest_notes() {
    let available = notes("100:10 50:10 20:10 10:10");
    assert_eq!(dispenser::allocate(dec!(380), &available), Some(notes("100:3 50:1 20:1 10:1")));
    assert_eq!(dispenser::allocate(dec!(40), &available), Some(notes("20:2")));
    assert_eq!(dispenser::allocate(dec!(10), &available), Some(notes("10:1")));
}

#[test]
fn falls_back_to_smaller_notes_when_large_run_out() {
    let available = notes("100:1 20:10");
    assert_eq!(dispenser::allocate(dec!(260), &available), Some(notes("100:1 20:8")));
}

#[test]
fn never_exceeds_available_counts() {
    let available = notes("50:1 10:3");
    let plan = dispenser::allocate(dec!(80), &available).unwrap();
    for (denomination, count) in plan.iter() {
        assert!(count <= available.get(denomination));
    }
    assert_eq!(plan, notes("50:1 10:3"));
}

#[test]
fn whole_reserve_can_be_dispensed() {
    let available = notes("100:1 50:2 20:5 10:5");
    assert_eq!(dispenser::allocate(dec!(350), &available), Some(available.clone()));
    assert_eq!(dispenser::allocate(dec!(360), &available), None);
}

#[test]
fn amounts_off_the_note_grid_are_infeasible() {
    let available = notes("100:10 50:10 20:10 10:10");
    for amount in [dec!(5), dec!(15), dec!(99), dec!(10.50), dec!(-10)] {
        assert_eq!(dispenser::allocate(amount, &available), None, "amount {amount}");
    }
}

#[test]
fn trailing_zero_scale_is_accepted() {
    let available = notes("50:2");
    assert_eq!(dispenser::allocate(dec!(100.00), &available), Some(notes("50:2")));
}

#[test]
fn missing_small_notes_make_split_infeasible() {
    // 30 needs a 10; only 20s held.
    assert_eq!(dispenser::allocate(dec!(30), &notes("20:5")), None);
}

#[test]
fn greedy_does_not_backtrack() {
    // 20×3 would work, greedy commits to the 50 first.
    assert_eq!(dispenser::allocate(dec!(60), &notes("50:1 20:3")), None);
}

#[test]
fn empty_reserve_dispenses_nothing() {
    assert_eq!(dispenser::allocate(dec!(10), &NoteCounts::new()), None);
}

#[test]
fn trait_object_matches_free_function() {
    let greedy: Box<dyn CashDispenser> = Box::new(GreedyDispenser);
    let available = notes("100:1 50:2 20:5 10:5");
    assert_eq!(
        greedy.allocate(dec!(230), &available),
        dispenser::allocate(dec!(230), &available)
    );
}

#[test]
fn decompose_deposits() {
    let (deposited, remainder) = dispenser::decompose(dec!(385));
    assert_eq!(deposited, notes("100:3 50:1 20:1 10:1"));
    assert_eq!(remainder, dec!(5));

    let (deposited, remainder) = dispenser::decompose(dec!(20.99));
    assert_eq!(deposited.get(Denomination::Twenty), 1);
    assert_eq!(deposited.note_count(), 1);
    assert_eq!(remainder, dec!(0.99));
}

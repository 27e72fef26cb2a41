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

//! Benchmarks for the ATM engine.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Note allocation
//! - Single-threaded withdrawals, deposits and transfers
//! - Multi-threaded throughput and contention on the reserve

use atm_ledger_rs::dispenser;
use atm_ledger_rs::{
    AccountId, AccountKind, AccountRecord, CashReserveState, Denomination, Engine, NoteCounts,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn account(i: usize) -> AccountId {
    AccountId::new(format!("ACC{i:05}"))
}

fn plenty_of_notes() -> NoteCounts {
    Denomination::DESCENDING
        .into_iter()
        .map(|d| (d, 1_000_000))
        .collect()
}

fn engine_with(accounts: usize) -> Engine {
    let mut builder = Engine::builder()
        .initial_reserve(CashReserveState::new(plenty_of_notes(), 100, 1_000_000));
    for i in 0..accounts {
        builder = builder.account(AccountRecord::new(
            account(i).as_str(),
            "USR",
            AccountKind::Checking,
            dec!(1000000),
        ));
    }
    builder.build().unwrap()
}

// =============================================================================
// Allocation Benchmarks
// =============================================================================

fn bench_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate");
    let available = plenty_of_notes();
    let sparse: NoteCounts = "100:1 50:2 20:5 10:5".parse().unwrap();

    for amount in [dec!(10), dec!(230), dec!(9990)] {
        group.bench_with_input(BenchmarkId::new("plenty", amount), &amount, |b, amount| {
            b.iter(|| dispenser::allocate(black_box(*amount), black_box(&available)))
        });
    }
    group.bench_function("sparse_infeasible", |b| {
        b.iter(|| dispenser::allocate(black_box(dec!(360)), black_box(&sparse)))
    });
    group.finish();
}

// =============================================================================
// Single-Threaded Benchmarks
// =============================================================================

fn bench_single_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("single");
    let engine = engine_with(2);
    let (a, b_id) = (account(0), account(1));

    // Paired so the balance and the reserve never run dry.
    group.bench_function("withdraw_deposit", |b| {
        b.iter(|| {
            engine.withdraw(black_box(&a), black_box(dec!(80))).unwrap();
            engine.deposit(black_box(&a), black_box(dec!(80))).unwrap();
        })
    });
    group.bench_function("transfer", |b| {
        b.iter(|| {
            engine
                .transfer(black_box(&a), black_box(&b_id), dec!(1))
                .unwrap();
            engine
                .transfer(black_box(&b_id), black_box(&a), dec!(1))
                .unwrap();
        })
    });
    group.bench_function("balance", |b| {
        b.iter(|| engine.balance(black_box(&a)).unwrap())
    });
    group.finish();
}

fn bench_mixed_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_operations");

    for count in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let engine = engine_with(10);
                for i in 0..count {
                    let id = account(i % 10);
                    engine.deposit(&id, dec!(100)).unwrap();
                    let _ = engine.withdraw(&id, dec!(70));
                }
                black_box(&engine);
            })
        });
    }
    group.finish();
}

// =============================================================================
// Multi-Threaded Benchmarks
// =============================================================================

fn bench_parallel_withdrawals(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_withdrawals");
    let total_ops = 10_000usize;

    for num_threads in [1, 2, 4, 8].iter() {
        group.throughput(Throughput::Elements(total_ops as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_threads),
            num_threads,
            |b, &num_threads| {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .unwrap();

                b.iter(|| {
                    let engine = Arc::new(engine_with(1_000));
                    pool.install(|| {
                        (0..total_ops).into_par_iter().for_each(|i| {
                            let _ = engine.withdraw(&account(i % 1_000), dec!(50));
                        });
                    });
                    black_box(&engine);
                })
            },
        );
    }
    group.finish();
}

fn bench_transfer_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfer_contention");
    let total_ops = 10_000usize;

    // Fewer accounts = more threads competing for the same account locks
    for num_accounts in [2, 10, 100, 1_000].iter() {
        group.throughput(Throughput::Elements(total_ops as u64));
        group.bench_with_input(
            BenchmarkId::new("accounts", num_accounts),
            num_accounts,
            |b, &num_accounts| {
                b.iter(|| {
                    let engine = Arc::new(engine_with(num_accounts));
                    (0..total_ops).into_par_iter().for_each(|i| {
                        let from = account(i % num_accounts);
                        let to = account((i + 1) % num_accounts);
                        let _ = engine.transfer(&from, &to, Decimal::ONE);
                    });
                    black_box(&engine);
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_allocate,
    bench_single_operations,
    bench_mixed_operations,
    bench_parallel_withdrawals,
    bench_transfer_contention,
);
criterion_main!(benches);

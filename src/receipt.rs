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

//! Receipt formatting.
//!
//! The engine checks and consumes ink and paper, then hands the content to
//! a [`ReceiptPrinter`]. Printers only format and emit.

use crate::base::AccountId;
use crate::transaction::Transaction;
use rust_decimal::Decimal;
use std::io::Write;

const RULE: &str = "================================";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Receives content once the machine has paid for the paper.
pub trait ReceiptPrinter {
    fn print_transaction(&mut self, transaction: &Transaction);

    fn print_balance(&mut self, account: &AccountId, balance: Decimal);
}

/// Plain-text receipts written to any [`Write`] sink.
#[derive(Debug)]
pub struct TextReceipt<W: Write> {
    out: W,
}

impl<W: Write> TextReceipt<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()) {
            tracing::warn!("failed to write receipt: {err}");
        }
    }
}

impl<W: Write> ReceiptPrinter for TextReceipt<W> {
    fn print_transaction(&mut self, transaction: &Transaction) {
        let text = render_transaction(transaction);
        self.emit(&text);
    }

    fn print_balance(&mut self, account: &AccountId, balance: Decimal) {
        let text = render_balance(account, balance);
        self.emit(&text);
    }
}

pub fn render_transaction(transaction: &Transaction) -> String {
    let na = |id: Option<&AccountId>| id.map_or_else(|| "N/A".to_owned(), ToString::to_string);
    format!(
        "{RULE}\n       TRANSACTION RECEIPT       \n{RULE}\n\
         Transaction ID: {}\n\
         Type: {}\n\
         Amount: €{:.2}\n\
         From Account: {}\n\
         To Account: {}\n\
         Timestamp: {}\n\
         {RULE}\n",
        transaction.id(),
        transaction.kind(),
        transaction.amount(),
        na(transaction.from()),
        na(transaction.to()),
        transaction.timestamp().format(TIMESTAMP_FORMAT),
    )
}

pub fn render_balance(account: &AccountId, balance: Decimal) -> String {
    format!(
        "{RULE}\n       BALANCE RECEIPT          \n{RULE}\n\
         Account: {account}\n\
         Balance: €{balance:.2}\n\
         {RULE}\n"
    )
}

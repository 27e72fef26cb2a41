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

//! Transaction engine.
//!
//! The [`Engine`] owns the ledger and the machine's cash reserve and drives
//! every customer and technician workflow against them.
//!
//! # Workflows
//!
//! - **Withdrawals**: check funds, check total cash, plan an exact note split,
//!   then debit and remove the notes. Nothing is mutated until the plan is
//!   known to be feasible.
//! - **Deposits**: credit the exact amount, then absorb whole notes into the
//!   reserve. Amounts below the smallest note are not tracked physically.
//! - **Transfers**: ledger only; no cash moves.
//! - **Receipts**: paid for with one percent of ink and one sheet of paper.
//! - **Maintenance**: technician-only and gated by [`MaintenancePolicy`].
//!
//! Each committed mutation is written through the stores while the lock
//! guarding the mutated state is still held, so the last write always
//! matches the live state. A store failure at that point is logged; the
//! mutation is not undone.
//!
//! # Thread Safety
//!
//! The reserve sits behind a single mutex and each account behind its own.
//! A withdrawal holds the reserve lock and then the account lock for its
//! whole check-and-commit sequence. No workflow takes the reserve lock while
//! already holding an account lock.

use crate::account::{Account, AccountRecord};
use crate::audit::AuditTrail;
use crate::base::{AccountId, TransactionId};
use crate::denomination::NoteCounts;
use crate::dispenser::{self, CashDispenser, GreedyDispenser};
use crate::error::{AtmError, Shortage};
use crate::ledger::Ledger;
use crate::maintenance::{MachineStatus, MaintenancePolicy, Role, SoftwareVersion};
use crate::receipt::ReceiptPrinter;
use crate::reserve::CashReserveState;
use crate::store::{
    AccountStore, MachineStateStore, MemoryAccountStore, MemoryMachineStore, TransactionStore,
};
use crate::transaction::Transaction;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Checks that `amount` is positive and carries at most minor-unit precision.
fn validate_amount(amount: Decimal) -> Result<(), AtmError> {
    if amount <= Decimal::ZERO || amount.round_dp(Account::DECIMAL_PRECISION) != amount {
        return Err(AtmError::InvalidAmount);
    }
    Ok(())
}

/// Transaction engine for one machine.
pub struct Engine {
    machine_id: String,
    ledger: Ledger,
    reserve: Mutex<CashReserveState>,
    software: RwLock<SoftwareVersion>,
    dispenser: Box<dyn CashDispenser>,
    account_store: Arc<dyn AccountStore>,
    machine_store: Arc<dyn MachineStateStore>,
    transactions: Arc<dyn TransactionStore>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    // === Accounts ===

    /// Provisions an account. Returns `false` if it already exists.
    ///
    /// # Errors
    ///
    /// [`AtmError::InvalidAmount`] for a negative opening balance.
    pub fn open_account(&self, record: AccountRecord) -> Result<bool, AtmError> {
        let inserted = self.ledger.open(record.clone())?;
        if inserted {
            let account = self.ledger.get(&record.id)?;
            self.persist_account(&account.lock().record());
            info!(account = %record.id, kind = %record.kind, "account opened");
        }
        Ok(inserted)
    }

    /// Looks an account up in the ledger, loading it from the account store
    /// on first use.
    fn account(&self, id: &AccountId) -> Result<Arc<Account>, AtmError> {
        if let Ok(account) = self.ledger.get(id) {
            return Ok(account);
        }
        let record = self
            .account_store
            .find_by_id(id)?
            .ok_or_else(|| AtmError::AccountNotFound(id.clone()))?;
        self.ledger.open(record)?;
        self.ledger.get(id)
    }

    pub fn balance(&self, id: &AccountId) -> Result<Decimal, AtmError> {
        Ok(self.account(id)?.balance())
    }

    /// Snapshots of every account loaded into the ledger, ordered by ID.
    pub fn accounts(&self) -> Vec<AccountRecord> {
        self.ledger.records()
    }

    // === Customer workflows ===

    /// Dispenses cash from an account.
    ///
    /// # Errors
    ///
    /// - [`AtmError::InvalidAmount`] - amount is not positive or has sub-cent precision.
    /// - [`AtmError::AccountNotFound`] - unknown account.
    /// - [`AtmError::InsufficientFunds`] - amount exceeds the balance.
    /// - [`AtmError::ResourceUnavailable`] with [`Shortage::InsufficientCash`] - the
    ///   machine holds less cash than requested.
    /// - [`AtmError::ResourceUnavailable`] with [`Shortage::NoExactSplit`] - the notes
    ///   held cannot form the amount exactly (including non-multiples of 10).
    ///
    /// A failed withdrawal changes neither the balance nor the reserve.
    pub fn withdraw(&self, id: &AccountId, amount: Decimal) -> Result<Transaction, AtmError> {
        validate_amount(amount)?;
        let account = self.account(id)?;

        {
            let mut reserve = self.reserve.lock();
            let mut data = account.lock();

            if data.balance() < amount {
                warn!(account = %id, %amount, balance = %data.balance(), "withdrawal rejected: insufficient funds");
                return Err(AtmError::InsufficientFunds);
            }
            if !reserve.has_sufficient_cash(amount) {
                warn!(account = %id, %amount, available = %reserve.total_cash(), "withdrawal rejected: machine out of cash");
                return Err(Shortage::InsufficientCash.into());
            }
            let plan = self
                .dispenser
                .allocate(amount, reserve.notes())
                .filter(|plan| Self::plan_fits(plan, amount, &reserve))
                .ok_or_else(|| {
                    warn!(account = %id, %amount, "withdrawal rejected: no exact note split");
                    AtmError::ResourceUnavailable(Shortage::NoExactSplit)
                })?;
            debug!(account = %id, %amount, ?plan, "dispensing plan");

            data.debit(amount)?;
            for (denomination, count) in plan.iter() {
                reserve.remove_cash(denomination, count)?;
            }
            self.persist_account(&data.record());
            self.persist_reserve(&reserve);
        }

        let transaction = Transaction::withdrawal(id.clone(), amount);
        self.append(&transaction);
        info!(account = %id, %amount, tx = %transaction.id(), "withdrawal committed");
        Ok(transaction)
    }

    /// A plan is only committed if it sums to the amount and every count is
    /// actually held.
    fn plan_fits(plan: &NoteCounts, amount: Decimal, reserve: &CashReserveState) -> bool {
        plan.total_value() == amount
            && plan
                .iter()
                .all(|(denomination, count)| count <= reserve.notes().get(denomination))
    }

    /// Credits cash paid into the machine.
    ///
    /// The ledger receives the exact amount. The reserve absorbs the amount
    /// as whole notes, largest first; anything below the smallest note is
    /// not tracked physically.
    ///
    /// # Errors
    ///
    /// - [`AtmError::InvalidAmount`] - amount is not positive or has sub-cent precision.
    /// - [`AtmError::AccountNotFound`] - unknown account.
    pub fn deposit(&self, id: &AccountId, amount: Decimal) -> Result<Transaction, AtmError> {
        validate_amount(amount)?;
        let account = self.account(id)?;

        {
            let mut data = account.lock();
            data.credit(amount).inspect_err(|err| {
                warn!(account = %id, %amount, "deposit rejected: {err}");
            })?;
            self.persist_account(&data.record());
        }

        let (notes, untracked) = dispenser::decompose(amount);
        if !notes.is_empty() {
            let mut reserve = self.reserve.lock();
            reserve.add_notes(&notes);
            self.persist_reserve(&reserve);
        }
        if !untracked.is_zero() {
            debug!(account = %id, %untracked, "deposit remainder not tracked in reserve");
        }

        let transaction = Transaction::deposit(id.clone(), amount);
        self.append(&transaction);
        info!(account = %id, %amount, tx = %transaction.id(), "deposit committed");
        Ok(transaction)
    }

    /// Moves funds between two accounts. No cash changes hands.
    ///
    /// # Errors
    ///
    /// - [`AtmError::InvalidAmount`] - amount is invalid or `from == to`.
    /// - [`AtmError::AccountNotFound`] - either account is unknown.
    /// - [`AtmError::InsufficientFunds`] - amount exceeds the source balance.
    pub fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Decimal,
    ) -> Result<Transaction, AtmError> {
        validate_amount(amount)?;
        if from == to {
            return Err(AtmError::InvalidAmount);
        }
        self.account(from)?;
        self.account(to)?;

        self.ledger
            .transfer_with(from, to, amount, |source, destination| {
                self.persist_account(source);
                self.persist_account(destination);
            })
            .inspect_err(|err| {
                warn!(%from, %to, %amount, "transfer rejected: {err}");
            })?;

        let transaction = Transaction::transfer(from.clone(), to.clone(), amount);
        self.append(&transaction);
        info!(%from, %to, %amount, tx = %transaction.id(), "transfer committed");
        Ok(transaction)
    }

    /// Transactions involving `id`, oldest first.
    pub fn history(&self, id: &AccountId) -> Result<Vec<Transaction>, AtmError> {
        self.account(id)?;
        Ok(self.transactions.find_by_account(id)?)
    }

    pub fn transaction(&self, id: &TransactionId) -> Result<Transaction, AtmError> {
        self.transactions
            .find_by_id(id)?
            .ok_or_else(|| AtmError::TransactionNotFound(id.clone()))
    }

    // === Receipts ===

    /// Pays for a receipt and hands `transaction` to the printer.
    ///
    /// # Errors
    ///
    /// [`AtmError::ResourceUnavailable`] with [`Shortage::OutOfInk`] or
    /// [`Shortage::OutOfPaper`]; nothing is consumed or printed.
    pub fn print_receipt(
        &self,
        transaction: &Transaction,
        printer: &mut dyn ReceiptPrinter,
    ) -> Result<(), AtmError> {
        self.consume_receipt()?;
        printer.print_transaction(transaction);
        Ok(())
    }

    /// Prints a balance slip and returns the balance shown on it.
    ///
    /// Use [`balance`](Self::balance) for the read alone; it never depends on
    /// ink or paper.
    pub fn print_balance_receipt(
        &self,
        id: &AccountId,
        printer: &mut dyn ReceiptPrinter,
    ) -> Result<Decimal, AtmError> {
        let balance = self.balance(id)?;
        self.consume_receipt()?;
        printer.print_balance(id, balance);
        Ok(balance)
    }

    fn consume_receipt(&self) -> Result<(), AtmError> {
        let mut reserve = self.reserve.lock();
        if let Some(shortage) = reserve.receipt_shortage() {
            warn!("receipt not printed: {shortage}");
            return Err(shortage.into());
        }
        reserve.consume_receipt_resources();
        self.persist_reserve(&reserve);
        Ok(())
    }

    // === Machine state & maintenance ===

    /// Copy of the current reserve.
    pub fn reserve(&self) -> CashReserveState {
        self.reserve.lock().clone()
    }

    pub fn software_version(&self) -> SoftwareVersion {
        *self.software.read()
    }

    pub fn policy(&self) -> MaintenancePolicy {
        MaintenancePolicy::for_version(self.software_version())
    }

    /// Status report; available to every role and version.
    pub fn status(&self) -> MachineStatus {
        let software_version = self.software_version();
        MachineStatus {
            machine_id: self.machine_id.clone(),
            software_version,
            policy: MaintenancePolicy::for_version(software_version),
            reserve: self.reserve(),
        }
    }

    fn authorize(&self, role: Role) -> Result<(), AtmError> {
        let version = self.software_version();
        MaintenancePolicy::for_version(version)
            .authorize(role, version)
            .inspect_err(|err| warn!(?role, "maintenance rejected: {err}"))
    }

    /// Loads notes into the machine and returns the new reserve.
    ///
    /// # Errors
    ///
    /// - [`AtmError::Unauthorized`] - not a technician, or maintenance is read-only.
    /// - [`AtmError::InvalidAmount`] - no notes supplied.
    pub fn replenish_cash(
        &self,
        role: Role,
        notes: &NoteCounts,
    ) -> Result<CashReserveState, AtmError> {
        self.authorize(role)?;
        if notes.is_empty() {
            return Err(AtmError::InvalidAmount);
        }
        let reserve_snapshot = {
            let mut reserve = self.reserve.lock();
            reserve.add_notes(notes);
            self.persist_reserve(&reserve);
            reserve.clone()
        };
        info!(
            added = %notes.total_value(),
            total = %reserve_snapshot.total_cash(),
            "cash replenished"
        );
        Ok(reserve_snapshot)
    }

    /// Fills the ink cartridge and returns the new level.
    pub fn refill_ink(&self, role: Role) -> Result<u8, AtmError> {
        self.authorize(role)?;
        let ink = {
            let mut reserve = self.reserve.lock();
            reserve.refill_ink();
            self.persist_reserve(&reserve);
            reserve.ink_level()
        };
        info!(ink, "ink refilled");
        Ok(ink)
    }

    /// Adds paper and returns the new sheet count.
    ///
    /// # Errors
    ///
    /// [`AtmError::InvalidAmount`] when `sheets` is zero.
    pub fn restock_paper(&self, role: Role, sheets: u32) -> Result<u32, AtmError> {
        self.authorize(role)?;
        if sheets == 0 {
            return Err(AtmError::InvalidAmount);
        }
        let paper = {
            let mut reserve = self.reserve.lock();
            reserve.restock_paper(sheets);
            self.persist_reserve(&reserve);
            reserve.paper_level()
        };
        info!(sheets, paper, "paper restocked");
        Ok(paper)
    }

    /// Moves the machine to a newer software version and returns the policy
    /// that now applies. The new version is saved to the machine store.
    ///
    /// # Errors
    ///
    /// - [`AtmError::Unauthorized`] - not a technician, or maintenance is read-only.
    /// - [`AtmError::InvalidVersion`] - `version` is not newer than the running one.
    pub fn update_software(
        &self,
        role: Role,
        version: SoftwareVersion,
    ) -> Result<MaintenancePolicy, AtmError> {
        let mut current = self.software.write();
        MaintenancePolicy::for_version(*current).authorize(role, *current)?;
        if version <= *current {
            return Err(AtmError::InvalidVersion {
                current: current.to_string(),
                requested: version.to_string(),
            });
        }
        let previous = *current;
        *current = version;
        if let Err(err) = self.machine_store.save_version(version) {
            error!(machine = %self.machine_id, "failed to persist software version: {err}");
        }
        info!(from = %previous, to = %version, "software updated");
        Ok(MaintenancePolicy::for_version(version))
    }

    // === Persistence ===

    fn persist_account(&self, record: &AccountRecord) {
        if let Err(err) = self.account_store.update(record) {
            error!(account = %record.id, "failed to persist account: {err}");
        }
    }

    fn persist_reserve(&self, state: &CashReserveState) {
        if let Err(err) = self.machine_store.save(state) {
            error!(machine = %self.machine_id, "failed to persist machine state: {err}");
        }
    }

    fn append(&self, transaction: &Transaction) {
        if let Err(err) = self.transactions.append(transaction.clone()) {
            error!(tx = %transaction.id(), "failed to record transaction: {err}");
        }
    }
}

/// Assembles an [`Engine`] from its collaborators.
///
/// Every collaborator has an in-memory default; an unconfigured builder
/// yields machine `ATM-001` on software 1.0 with an empty reserve.
pub struct EngineBuilder {
    machine_id: String,
    software_version: SoftwareVersion,
    initial_reserve: CashReserveState,
    accounts: Vec<AccountRecord>,
    dispenser: Box<dyn CashDispenser>,
    account_store: Arc<dyn AccountStore>,
    machine_store: Arc<dyn MachineStateStore>,
    transactions: Arc<dyn TransactionStore>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            machine_id: "ATM-001".into(),
            software_version: SoftwareVersion::new(1, 0),
            initial_reserve: CashReserveState::default(),
            accounts: Vec::new(),
            dispenser: Box::new(GreedyDispenser),
            account_store: Arc::new(MemoryAccountStore::new()),
            machine_store: Arc::new(MemoryMachineStore::new()),
            transactions: Arc::new(AuditTrail::new()),
        }
    }
}

impl EngineBuilder {
    pub fn machine_id(mut self, id: impl Into<String>) -> Self {
        self.machine_id = id.into();
        self
    }

    /// Version to run when the machine store has no saved update, or when
    /// the saved one is older.
    pub fn software_version(mut self, version: SoftwareVersion) -> Self {
        self.software_version = version;
        self
    }

    /// Reserve to start from when the machine store has nothing saved.
    pub fn initial_reserve(mut self, reserve: CashReserveState) -> Self {
        self.initial_reserve = reserve;
        self
    }

    /// Provisions an account unless the account store already knows it.
    pub fn account(mut self, record: AccountRecord) -> Self {
        self.accounts.push(record);
        self
    }

    pub fn dispenser(mut self, dispenser: impl CashDispenser + 'static) -> Self {
        self.dispenser = Box::new(dispenser);
        self
    }

    pub fn account_store(mut self, store: Arc<dyn AccountStore>) -> Self {
        self.account_store = store;
        self
    }

    pub fn machine_store(mut self, store: Arc<dyn MachineStateStore>) -> Self {
        self.machine_store = store;
        self
    }

    pub fn transaction_store(mut self, store: Arc<dyn TransactionStore>) -> Self {
        self.transactions = store;
        self
    }

    /// Loads the saved reserve (or saves the initial one) and provisions
    /// accounts.
    ///
    /// # Errors
    ///
    /// - [`AtmError::Storage`] - a store could not be read or written.
    /// - [`AtmError::InvalidAmount`] - a provisioned account has a negative balance.
    pub fn build(self) -> Result<Engine, AtmError> {
        let reserve = match self.machine_store.load()? {
            Some(saved) => saved,
            None => {
                self.machine_store.save(&self.initial_reserve)?;
                self.initial_reserve
            }
        };

        // An update saved by a technician outlives the configured baseline.
        let software_version = self
            .machine_store
            .load_version()?
            .map_or(self.software_version, |saved| saved.max(self.software_version));

        let ledger = Ledger::new();
        for record in self.accounts {
            match self.account_store.find_by_id(&record.id)? {
                Some(stored) => {
                    ledger.open(stored)?;
                }
                None => {
                    ledger.open(record.clone())?;
                    self.account_store.update(&record)?;
                }
            }
        }

        info!(
            machine = %self.machine_id,
            version = %software_version,
            cash = %reserve.total_cash(),
            accounts = ledger.len(),
            "engine ready"
        );

        Ok(Engine {
            machine_id: self.machine_id,
            ledger,
            reserve: Mutex::new(reserve),
            software: RwLock::new(software_version),
            dispenser: self.dispenser,
            account_store: self.account_store,
            machine_store: self.machine_store,
            transactions: self.transactions,
        })
    }
}

use crate::{
    data::{to_cents, Account, AccountId, AccountRecord, Error, Summary, CENTS},
    read::SnapshotUser,
};
use rust_decimal::Decimal;
use std::collections::{btree_map::Entry, BTreeMap};

/// The registry owning every account. Ids come from `next_id` and are never
/// handed out twice, so iterating the map walks accounts in creation order.
/// Single-threaded: every mutation goes through `&mut self`.
#[derive(Debug)]
pub struct Bank {
    accounts: BTreeMap<AccountId, Account>,
    next_id: AccountId,
}

impl Default for Bank {
    fn default() -> Self {
        Self::new()
    }
}

impl Bank {
    pub fn new() -> Self {
        Self {
            accounts: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Seed a bank with `(name, initial_balance)` pairs, ids assigned in order.
    pub fn with_accounts<I, S>(seed: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let mut bank = Self::new();
        for (name, balance) in seed {
            bank.create_account(name.as_ref(), balance)?;
        }
        Ok(bank)
    }

    pub fn create_account(&mut self, name: &str, initial_balance: Decimal) -> Result<AccountId, Error> {
        let id = self.next_id;
        let next_id = id.checked_add(1).ok_or(Error::IdsExhausted)?;
        let account = Account::new(id, name, initial_balance)?;
        match self.accounts.entry(id) {
            Entry::Occupied(_) => return Err(Error::DuplicateAccount(id)),
            Entry::Vacant(slot) => slot.insert(account),
        };
        self.next_id = next_id;
        Ok(id)
    }

    /// Re-insert an account read back from a snapshot, keeping its id.
    /// The id must leave room for `next_id` to move past it.
    pub fn restore_account(&mut self, record: AccountRecord) -> Result<AccountId, Error> {
        let id = record.id;
        let after = id.checked_add(1).ok_or(Error::IdsExhausted)?;
        if self.accounts.contains_key(&id) {
            return Err(Error::DuplicateAccount(id));
        }
        let account = Account::new(id, &record.name, record.balance)?;
        self.accounts.insert(id, account);
        self.next_id = self.next_id.max(after);
        Ok(id)
    }

    pub fn get_account(&self, id: AccountId) -> Result<&Account, Error> {
        self.accounts.get(&id).ok_or(Error::AccountNotFound(id))
    }

    fn account_mut(&mut self, id: AccountId) -> Result<&mut Account, Error> {
        self.accounts.get_mut(&id).ok_or(Error::AccountNotFound(id))
    }

    pub fn get_balance(&self, id: AccountId) -> Result<Decimal, Error> {
        Ok(self.get_account(id)?.balance())
    }

    pub fn deposit(&mut self, id: AccountId, amount: Decimal) -> Result<Decimal, Error> {
        self.account_mut(id)?.deposit(amount)
    }

    pub fn withdraw(&mut self, id: AccountId, amount: Decimal) -> Result<Decimal, Error> {
        self.account_mut(id)?.withdraw(amount)
    }

    /// Withdraw from `from`, then deposit into `to`. If the deposit fails the
    /// source gets its exact pre-transfer balance back before the error is
    /// returned, so the two balances only ever change together.
    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: Decimal) -> Result<(), Error> {
        if from == to {
            return Err(Error::SameAccountTransfer(from));
        }
        self.get_account(to)?;
        let source = self.account_mut(from)?;
        let before = source.balance();
        source.withdraw(amount)?;
        if let Err(e) = self.account_mut(to).and_then(|dest| dest.deposit(amount)) {
            self.account_mut(from)?.restore(before);
            return Err(e);
        }
        Ok(())
    }

    /// All accounts in creation order.
    pub fn list_accounts(&self) -> impl Iterator<Item = &Account> + '_ {
        self.accounts.values()
    }

    /// Fails with `SummaryOverflow` when the total can't be held to the cent.
    pub fn get_summary(&self) -> Result<Summary, Error> {
        let total_accounts = self.accounts.len();
        if total_accounts == 0 {
            return Ok(Summary::default());
        }
        let balances = || self.accounts.values().map(Account::balance);
        let total_balance = balances().try_fold(Decimal::ZERO, |total, balance| {
            total
                .checked_add(balance)
                .filter(|sum| sum.scale() == CENTS)
                .ok_or(Error::SummaryOverflow)
        })?;
        Ok(Summary {
            total_accounts,
            total_balance,
            average_balance: to_cents(total_balance / Decimal::from(total_accounts))
                .unwrap_or_default(),
            min_balance: balances().min().unwrap_or_default(),
            max_balance: balances().max().unwrap_or_default(),
        })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }
}

impl SnapshotUser for Bank {
    fn use_record(&mut self, record: AccountRecord) -> Result<(), Error> {
        self.restore_account(record).map(|_| ())
    }
}

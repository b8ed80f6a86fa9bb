use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type AccountId = u32;

/// Balances and amounts are kept in cents.
pub const CENTS: u32 = 2;

/// Header of the CSV snapshot, in column order.
pub const SNAPSHOT_COLUMNS: [&str; 3] = ["id", "name", "balance"];

/// Bring an amount to exactly two decimal places, rounding half away from zero.
/// Returns `None` for values too large to be held at cent precision.
pub fn to_cents(amount: Decimal) -> Option<Decimal> {
    let rounded = amount.round_dp_with_strategy(CENTS, RoundingStrategy::MidpointAwayFromZero);
    let mantissa = rounded.mantissa() * 10i128.pow(CENTS - rounded.scale());
    Decimal::try_from_i128_with_scale(mantissa, CENTS).ok()
}

/// A single holder's balance. Fields are private so the only way to move money
/// is through `deposit`/`withdraw`, which keep `balance >= 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    name: String,
    balance: Decimal,
}

impl Account {
    pub(crate) fn new(id: AccountId, name: &str, initial_balance: Decimal) -> Result<Self, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("account name cannot be empty".into()));
        }
        if initial_balance < Decimal::ZERO {
            return Err(Error::InvalidInput(format!(
                "initial balance cannot be negative (got {initial_balance})"
            )));
        }
        let balance = to_cents(initial_balance).ok_or_else(|| {
            Error::InvalidInput(format!("initial balance {initial_balance} is out of range"))
        })?;
        Ok(Self {
            id,
            name: name.to_owned(),
            balance,
        })
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn deposit(&mut self, amount: Decimal) -> Result<Decimal, Error> {
        let amount = positive_cents(amount)?;
        // Decimal addition silently drops scale instead of failing when the
        // mantissa overflows, so a lost cent digit counts as overflow too.
        self.balance = match self.balance.checked_add(amount) {
            Some(balance) if balance.scale() == CENTS => balance,
            _ => return Err(Error::BalanceOverflow(self.id)),
        };
        Ok(self.balance)
    }

    pub fn withdraw(&mut self, amount: Decimal) -> Result<Decimal, Error> {
        let amount = positive_cents(amount)?;
        if self.balance < amount {
            return Err(Error::InsufficientFunds {
                account: self.id,
                asked: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }

    /// Put the balance back to a value previously read from `balance()`.
    pub(crate) fn restore(&mut self, balance: Decimal) {
        self.balance = balance;
    }
}

fn positive_cents(amount: Decimal) -> Result<Decimal, Error> {
    match to_cents(amount) {
        Some(cents) if cents > Decimal::ZERO => Ok(cents),
        _ => Err(Error::InvalidAmount(amount)),
    }
}

/// One row of the CSV snapshot. `Bank::restore_account` validates it the same
/// way as a freshly created account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub name: String,
    pub balance: Decimal,
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            balance: account.balance,
        }
    }
}

/// Aggregate figures over every account, recomputed on each request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total_accounts: usize,
    pub total_balance: Decimal,
    pub average_balance: Decimal,
    pub min_balance: Decimal,
    pub max_balance: Decimal,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid amount {0}, amount must be positive")]
    InvalidAmount(Decimal),
    #[error("Insufficient funds in account #{account} (asked {asked} while {available} available)")]
    InsufficientFunds {
        account: AccountId,
        asked: Decimal,
        available: Decimal,
    },
    #[error("Account #{0} not found")]
    AccountNotFound(AccountId),
    #[error("Cannot transfer from account #{0} to itself")]
    SameAccountTransfer(AccountId),
    #[error("Balance of account #{0} would overflow")]
    BalanceOverflow(AccountId),
    #[error("Account #{0} already exists")]
    DuplicateAccount(AccountId),
    #[error("No account ids left to assign")]
    IdsExhausted,
    #[error("Total balance is too large to report")]
    SummaryOverflow,
}

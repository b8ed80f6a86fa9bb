//! A small in-memory banking ledger: accounts with non-negative balances,
//! deposits, withdrawals, transfers that roll back on failure, and a CSV
//! snapshot to carry the state between runs.

pub mod bank;
pub mod data;
pub mod logging;
pub mod read;
pub mod write;

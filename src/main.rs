use clap::{Parser, Subcommand};
use ledger::{
    bank::Bank,
    data::AccountId,
    logging,
    read::load_bank,
    write::{save_bank, write_accounts},
};
use rust_decimal::Decimal;
use std::{io::Write, path::PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV snapshot the bank is loaded from and saved back to
    #[arg(long, env = "LEDGER_SNAPSHOT", default_value = "bank_accounts.csv")]
    snapshot: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a new account
    Create {
        name: String,
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        initial_balance: Decimal,
    },
    Deposit {
        id: AccountId,
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
    },
    Withdraw {
        id: AccountId,
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
    },
    Balance {
        id: AccountId,
    },
    /// Print every account as CSV
    List,
    Summary,
}

/// Run one command against the bank, printing its outcome to `out`.
/// Returns whether the bank changed and needs saving.
fn execute<W: Write>(bank: &mut Bank, command: Command, mut out: W) -> Result<bool, anyhow::Error> {
    match command {
        Command::Create {
            name,
            initial_balance,
        } => {
            let id = bank.create_account(&name, initial_balance)?;
            info!(id, initial_balance = %initial_balance, "created account");
            writeln!(out, "Created account #{id} with balance {}", bank.get_balance(id)?)?;
            Ok(true)
        }
        Command::Deposit { id, amount } => {
            let balance = bank.deposit(id, amount)?;
            info!(id, amount = %amount, "deposit");
            writeln!(out, "Account #{id} balance: {balance}")?;
            Ok(true)
        }
        Command::Withdraw { id, amount } => {
            let balance = bank.withdraw(id, amount)?;
            info!(id, amount = %amount, "withdrawal");
            writeln!(out, "Account #{id} balance: {balance}")?;
            Ok(true)
        }
        Command::Transfer { from, to, amount } => {
            bank.transfer(from, to, amount)?;
            info!(from, to, amount = %amount, "transfer");
            writeln!(out, "Account #{from} balance: {}", bank.get_balance(from)?)?;
            writeln!(out, "Account #{to} balance: {}", bank.get_balance(to)?)?;
            Ok(true)
        }
        Command::Balance { id } => {
            let account = bank.get_account(id)?;
            writeln!(out, "Account #{id} ({}): {}", account.name(), account.balance())?;
            Ok(false)
        }
        Command::List => {
            write_accounts(out, bank)?;
            Ok(false)
        }
        Command::Summary => {
            let summary = bank.get_summary()?;
            writeln!(out, "Total accounts: {}", summary.total_accounts)?;
            writeln!(out, "Total balance: {:.2}", summary.total_balance)?;
            if summary.total_accounts > 0 {
                writeln!(out, "Average balance: {:.2}", summary.average_balance)?;
                writeln!(out, "Minimum balance: {:.2}", summary.min_balance)?;
                writeln!(out, "Maximum balance: {:.2}", summary.max_balance)?;
            }
            Ok(false)
        }
    }
}

/// Load the snapshot, run the command, and write the snapshot back only if
/// the command changed something.
fn run<W: Write>(args: Args, out: W) -> Result<(), anyhow::Error> {
    let mut bank = load_bank(&args.snapshot)?;
    if execute(&mut bank, args.command, out)? {
        save_bank(&args.snapshot, &bank)?;
    }
    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    logging::init();
    run(Args::parse(), std::io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::{execute, run as run_with_snapshot, Args, Command};
    use clap::{CommandFactory, Parser};
    use ledger::{bank::Bank, data::Error, read::load_bank};
    use rust_decimal_macros::dec;
    use std::path::{Path, PathBuf};

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ledger-main-{}-{name}.csv", std::process::id()))
    }

    fn invoke(snapshot: &Path, command: &[&str]) -> Result<String, anyhow::Error> {
        let snapshot = snapshot.to_str().unwrap();
        let prefix = ["ledger", "--snapshot", snapshot];
        let line = prefix.iter().chain(command).copied();
        let args = Args::try_parse_from(line).unwrap();
        let mut out = Vec::new();
        run_with_snapshot(args, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn run(bank: &mut Bank, line: &str) -> (bool, String) {
        let args = Args::try_parse_from(line.split_whitespace()).unwrap();
        let mut out = Vec::new();
        let mutated = execute(bank, args.command, &mut out).unwrap();
        (mutated, String::from_utf8(out).unwrap())
    }

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn parse_negative_amount() {
        let args = Args::try_parse_from(["ledger", "deposit", "1", "-5"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Deposit { id: 1, amount } if amount == dec!(-5)
        ));
    }

    #[test]
    fn commands() {
        let mut bank = Bank::new();
        assert_eq!(
            run(&mut bank, "ledger create Alice --initial-balance 100"),
            (true, "Created account #1 with balance 100.00\n".into())
        );
        assert_eq!(
            run(&mut bank, "ledger create Bob --initial-balance 50"),
            (true, "Created account #2 with balance 50.00\n".into())
        );
        assert_eq!(
            run(&mut bank, "ledger transfer 1 2 30"),
            (
                true,
                "Account #1 balance: 70.00\nAccount #2 balance: 80.00\n".into()
            )
        );
        assert_eq!(
            run(&mut bank, "ledger balance 2"),
            (false, "Account #2 (Bob): 80.00\n".into())
        );
        assert_eq!(
            run(&mut bank, "ledger list"),
            (false, "id,name,balance\n1,Alice,70.00\n2,Bob,80.00\n".into())
        );
        assert_eq!(
            run(&mut bank, "ledger summary"),
            (
                false,
                "Total accounts: 2\nTotal balance: 150.00\nAverage balance: 75.00\n\
                 Minimum balance: 70.00\nMaximum balance: 80.00\n"
                    .into()
            )
        );
    }

    #[test]
    fn command_errors() {
        let mut bank = Bank::with_accounts([("Alice", dec!(10))]).unwrap();
        let args = Args::try_parse_from(["ledger", "withdraw", "1", "20"]).unwrap();
        let err = execute(&mut bank, args.command, Vec::new()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::InsufficientFunds {
                account: 1,
                asked: dec!(20.00),
                available: dec!(10.00),
            })
        );
        let args = Args::try_parse_from(["ledger", "transfer", "1", "1", "5"]).unwrap();
        let err = execute(&mut bank, args.command, Vec::new()).unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::SameAccountTransfer(1)));
        assert_eq!(bank.get_balance(1), Ok(dec!(10)));
    }

    #[test]
    fn snapshot_saved_only_after_changes() {
        let path = scratch_path("gating");
        let _ = std::fs::remove_file(&path);

        invoke(&path, &["summary"]).unwrap();
        assert!(!path.exists());
        invoke(&path, &["list"]).unwrap();
        assert!(!path.exists());

        invoke(&path, &["create", "Alice", "--initial-balance", "100"]).unwrap();
        invoke(&path, &["create", "Bob", "--initial-balance", "50"]).unwrap();
        assert_eq!(
            invoke(&path, &["transfer", "1", "2", "30"]).unwrap(),
            "Account #1 balance: 70.00\nAccount #2 balance: 80.00\n"
        );
        let saved = std::fs::read_to_string(&path).unwrap();
        assert_eq!(saved, "id,name,balance\n1,Alice,70.00\n2,Bob,80.00\n");

        // a read-only command leaves the file alone
        std::fs::write(&path, "id,name,balance\n1,Alice,70.00\n2,Bob,80.00\n9,Zed,1.00\n").unwrap();
        invoke(&path, &["balance", "2"]).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("9,Zed,1.00"));

        // a failed command saves nothing
        let before = std::fs::read_to_string(&path).unwrap();
        assert!(invoke(&path, &["withdraw", "1", "1000"]).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

        let bank = load_bank(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(bank.len(), 3);
        assert_eq!(bank.get_balance(1), Ok(dec!(70)));
    }
}

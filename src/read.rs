use crate::{
    bank::Bank,
    data::{AccountRecord, Error, SNAPSHOT_COLUMNS},
};
use anyhow::Context;
use std::{fs::File, io::ErrorKind, path::Path};
use tracing::{info, warn};

/// Trait for doing something with an `AccountRecord` read from a snapshot.
/// `Bank` restores the account; tests use it to check what the CSV decodes to.
pub trait SnapshotUser {
    fn use_record(&mut self, record: AccountRecord) -> Result<(), Error>;
}

/// What a snapshot import did: rows handed over successfully, and the file
/// line of every row that was skipped.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReadOutcome {
    pub accepted: usize,
    pub skipped_lines: Vec<u64>,
}

/// CSV importer for account snapshots. Rows that can't be decoded or that the
/// user rejects are logged and skipped.
pub fn read_accounts<R: std::io::Read, U: SnapshotUser>(
    reader: R,
    user: &mut U,
) -> Result<ReadOutcome, anyhow::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Ok(ReadOutcome::default());
    }
    let missing: Vec<&str> = SNAPSHOT_COLUMNS
        .into_iter()
        .filter(|column| !headers.iter().any(|header| header == *column))
        .collect();
    if !missing.is_empty() {
        anyhow::bail!("snapshot is missing columns: {}", missing.join(", "));
    }
    let mut outcome = ReadOutcome::default();
    let mut raw = csv::StringRecord::new();
    loop {
        match rdr.read_record(&mut raw) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                let line = e.position().map_or(0, csv::Position::line);
                warn!(line, error = %e, "skipping malformed snapshot row");
                outcome.skipped_lines.push(line);
                continue;
            }
        }
        let line = raw.position().map_or(0, csv::Position::line);
        let record: AccountRecord = match raw.deserialize(Some(&headers)) {
            Ok(record) => record,
            Err(e) => {
                warn!(line, error = %e, "skipping unreadable snapshot row");
                outcome.skipped_lines.push(line);
                continue;
            }
        };
        let id = record.id;
        match user.use_record(record) {
            Ok(()) => outcome.accepted += 1,
            Err(e) => {
                warn!(line, id, error = %e, "skipping rejected snapshot row");
                outcome.skipped_lines.push(line);
            }
        }
    }
    Ok(outcome)
}

/// Build a `Bank` from the snapshot at `path`. A missing file is a fresh bank.
pub fn load_bank(path: &Path) -> Result<Bank, anyhow::Error> {
    let mut bank = Bank::new();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "no snapshot yet, starting empty");
            return Ok(bank);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("opening snapshot {}", path.display()));
        }
    };
    let outcome = read_accounts(file, &mut bank)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    info!(
        path = %path.display(),
        restored = outcome.accepted,
        skipped = outcome.skipped_lines.len(),
        "loaded snapshot"
    );
    Ok(bank)
}

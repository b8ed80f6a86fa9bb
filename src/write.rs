use crate::{
    bank::Bank,
    data::{AccountRecord, SNAPSHOT_COLUMNS},
};
use anyhow::Context;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::info;

/// Basic CSV exporter for the accounts of a `Bank`, in creation order
pub fn write_accounts<W: std::io::Write>(writer: W, bank: &Bank) -> Result<(), anyhow::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    // serialize() only emits the header alongside the first record
    if bank.is_empty() {
        wtr.write_record(SNAPSHOT_COLUMNS)?;
    }
    for account in bank.list_accounts() {
        wtr.serialize(AccountRecord::from(account))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Sibling file the snapshot is written to before being renamed over `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    PathBuf::from(staging)
}

/// Save the bank to `path`. The previous snapshot stays intact until the new
/// one is completely written.
pub fn save_bank(path: &Path, bank: &Bank) -> Result<(), anyhow::Error> {
    let staging = staging_path(path);
    let written = File::create(&staging)
        .with_context(|| format!("creating snapshot {}", staging.display()))
        .and_then(|file| {
            write_accounts(&file, bank)?;
            file.sync_all()?;
            Ok(())
        })
        .with_context(|| format!("writing snapshot {}", staging.display()));
    if let Err(e) = written {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }
    fs::rename(&staging, path).with_context(|| format!("replacing snapshot {}", path.display()))?;
    info!(path = %path.display(), accounts = bank.len(), "saved snapshot");
    Ok(())
}

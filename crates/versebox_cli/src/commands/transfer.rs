//! Snapshot export and import commands.

use std::path::Path;
use versebox_core::{SnapshotService, Store};

pub fn export(db_path: &Path, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(db_path)?;
    let service = SnapshotService::new(&store);
    service.export_snapshot_to_file(file)?;
    println!("Exported snapshot to {}", file.display());
    Ok(())
}

/// Replaces the whole collection; the store is untouched when the file is
/// rejected.
pub fn import(db_path: &Path, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(db_path)?;
    let summary = SnapshotService::new(&store).restore_snapshot_from_file(file)?;
    println!(
        "Restored {} author(s) and {} piece(s) from {}",
        summary.authors,
        summary.pieces,
        file.display()
    );
    Ok(())
}

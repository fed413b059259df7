//! Offline cache inspection.

use std::path::Path;
use versebox_core::offline::{CacheStorage, SqliteCacheStorage};

pub fn status(cache_db: &Path, current_generation: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !cache_db.exists() {
        return Err(format!("cache database `{}` does not exist", cache_db.display()).into());
    }
    let storage = SqliteCacheStorage::open(cache_db)?;
    let generations = storage.generations()?;
    if generations.is_empty() {
        println!("No cached generations");
        return Ok(());
    }
    for generation in generations {
        let marker = if generation == current_generation {
            "current"
        } else {
            "stale"
        };
        let keys = storage.keys(&generation)?;
        println!("{generation}  [{marker}]  entries={}", keys.len());
        for key in keys {
            println!("    {key}");
        }
    }
    Ok(())
}

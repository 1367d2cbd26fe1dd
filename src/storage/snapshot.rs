//! On-disk snapshot format: a single bincode file holding every collection.
//! Indexes are not stored; they are rebuilt from the documents on load.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::{Collections, StoreResult};
use crate::models::{Order, Restaurant, User};

const SNAPSHOT_VERSION: u32 = 1;

pub(crate) fn snapshot_path(root: &Path) -> PathBuf { root.join("store.bin") }

#[derive(Serialize, Deserialize)]
pub(crate) struct Snapshot {
    pub(crate) version: u32,
    pub(crate) created_ms: i64,
    pub(crate) users: Vec<User>,
    pub(crate) restaurants: Vec<Restaurant>,
    pub(crate) orders: Vec<Order>,
}

impl Snapshot {
    pub(crate) fn capture(c: &Collections) -> Self {
        let created_ms = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0);
        Self {
            version: SNAPSHOT_VERSION,
            created_ms,
            users: c.users.values().cloned().collect(),
            restaurants: c.restaurants.values().cloned().collect(),
            orders: c.orders.values().cloned().collect(),
        }
    }
}

/// Write to a temp file then rename so a crash never leaves a torn snapshot.
pub(crate) fn save(path: &Path, snap: &Snapshot) -> StoreResult<()> {
    let bytes = bincode::serialize(snap)?;
    let tmp = path.with_extension("bin.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(tmp, path)?;
    Ok(())
}

pub(crate) fn load(path: &Path) -> StoreResult<Collections> {
    if !path.exists() { return Ok(Collections::default()); }
    let bytes = std::fs::read(path)?;
    let snap: Snapshot = bincode::deserialize(&bytes)?;
    Ok(Collections::from_documents(snap.users, snap.restaurants, snap.orders))
}

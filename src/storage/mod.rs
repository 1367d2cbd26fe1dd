//!
//! forkful storage module
//! -----------------------
//! Embedded document store holding the `users`, `restaurants` and `orders`
//! collections in memory, keyed by internal id. Two unique indexes are kept
//! alongside the collections:
//!
//! - `users.auth0Id` -> user id (one account per external identity)
//! - `restaurants.user` -> restaurant id (one restaurant per account)
//!
//! Inserts check the unique index and write the document inside the same write
//! lock, so concurrent inserts for the same key cannot both succeed. The loser
//! receives `StoreError::DuplicateKey`.
//!
//! When opened with a root folder the store persists to `<root>/store.bin`
//! (bincode). Mutations mark the store dirty; `spawn_snapshot_task` flushes
//! dirty state periodically and `close` performs the final flush. After `close`
//! every operation fails with `StoreError::Unavailable`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::{Order, Restaurant, User};

mod orders;
mod restaurants;
mod snapshot;
mod users;


#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key in {collection}.{index}: {key}")]
    DuplicateKey { collection: &'static str, index: &'static str, key: String },
    #[error("{collection} document not found: {id}")]
    NotFound { collection: &'static str, id: String },
    #[error("store is closed")]
    Unavailable,
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { .. } => AppError::conflict("duplicate_key".to_string(), err.to_string()),
            StoreError::NotFound { .. } => AppError::not_found("not_found".to_string(), err.to_string()),
            StoreError::Unavailable => AppError::io("store_unavailable".to_string(), err.to_string()),
            StoreError::Io(_) | StoreError::Encoding(_) => AppError::internal("store_error".to_string(), err.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Account lookups and writes needed by identity resolution and provisioning.
pub trait IdentityStore: Send + Sync {
    fn find_user_by_auth0_id(&self, auth0_id: &str) -> StoreResult<Option<User>>;
    fn find_user(&self, id: &str) -> StoreResult<Option<User>>;
    /// Insert a new account; fails with `DuplicateKey` when the external identity is already bound.
    fn insert_user(&self, user: User) -> StoreResult<User>;
    /// Overwrite an existing account document; `auth0Id` and `_id` are never changed.
    fn update_user(&self, user: &User) -> StoreResult<User>;
}

#[derive(Default)]
pub(crate) struct Collections {
    pub(crate) users: HashMap<String, User>,
    pub(crate) restaurants: HashMap<String, Restaurant>,
    pub(crate) orders: HashMap<String, Order>,
    user_by_auth0: HashMap<String, String>,
    restaurant_by_owner: HashMap<String, String>,
}

impl Collections {
    pub(crate) fn from_documents(users: Vec<User>, restaurants: Vec<Restaurant>, orders: Vec<Order>) -> Self {
        let mut c = Collections::default();
        for u in users {
            c.user_by_auth0.insert(u.auth0_id.clone(), u.id.clone());
            c.users.insert(u.id.clone(), u);
        }
        for r in restaurants {
            c.restaurant_by_owner.insert(r.user.clone(), r.id.clone());
            c.restaurants.insert(r.id.clone(), r);
        }
        for o in orders {
            c.orders.insert(o.id.clone(), o);
        }
        c
    }
}

struct Inner {
    root: Option<PathBuf>,
    data: RwLock<Collections>,
    dirty: AtomicBool,
    closed: AtomicBool,
    reads: AtomicU64,
}

/// Process-wide store handle; clones share the same collections.
#[derive(Clone)]
pub struct SharedStore(Arc<Inner>);

impl SharedStore {
    /// Open a persistent store rooted at `root`, loading `store.bin` when present.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        let collections = snapshot::load(&snapshot::snapshot_path(&root))?;
        info!(
            target: "forkful::store",
            "store opened: root='{}' users={} restaurants={} orders={}",
            root.display(), collections.users.len(), collections.restaurants.len(), collections.orders.len()
        );
        Ok(Self::with_collections(Some(root), collections))
    }

    /// Non-persistent store; nothing is written to disk.
    pub fn in_memory() -> Self { Self::with_collections(None, Collections::default()) }

    fn with_collections(root: Option<PathBuf>, data: Collections) -> Self {
        Self(Arc::new(Inner {
            root,
            data: RwLock::new(data),
            dirty: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            reads: AtomicU64::new(0),
        }))
    }

    /// Number of read operations served so far.
    pub fn read_count(&self) -> u64 { self.0.reads.load(Ordering::Relaxed) }

    pub fn is_closed(&self) -> bool { self.0.closed.load(Ordering::Acquire) }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&Collections) -> T) -> StoreResult<T> {
        if self.is_closed() { return Err(StoreError::Unavailable); }
        self.0.reads.fetch_add(1, Ordering::Relaxed);
        let guard = self.0.data.read();
        Ok(f(&*guard))
    }

    pub(crate) fn write<T>(&self, f: impl FnOnce(&mut Collections) -> StoreResult<T>) -> StoreResult<T> {
        if self.is_closed() { return Err(StoreError::Unavailable); }
        let mut guard = self.0.data.write();
        let out = f(&mut *guard)?;
        self.0.dirty.store(true, Ordering::Release);
        Ok(out)
    }

    /// Persist the current state if anything changed since the last flush.
    pub fn flush(&self) -> StoreResult<()> {
        let Some(root) = self.0.root.as_ref() else { return Ok(()); };
        if !self.0.dirty.swap(false, Ordering::AcqRel) { return Ok(()); }
        let snap = {
            let guard = self.0.data.read();
            snapshot::Snapshot::capture(&guard)
        };
        if let Err(e) = snapshot::save(&snapshot::snapshot_path(root), &snap) {
            self.0.dirty.store(true, Ordering::Release);
            return Err(e);
        }
        debug!(target: "forkful::store", users = snap.users.len(), restaurants = snap.restaurants.len(), orders = snap.orders.len(), "snapshot written");
        Ok(())
    }

    /// Final flush; the store rejects all operations afterwards.
    pub fn close(&self) -> StoreResult<()> {
        let res = self.flush();
        self.0.closed.store(true, Ordering::Release);
        info!(target: "forkful::store", "store closed");
        res
    }

    /// Periodically flush dirty state until the store is closed.
    /// Flushes run on the blocking pool; a zero interval is treated as 1 ms.
    pub fn spawn_snapshot_task(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        let interval = interval.max(Duration::from_millis(1));
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if store.is_closed() { break; }
                let flushing = store.clone();
                match tokio::task::spawn_blocking(move || flushing.flush()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(target: "forkful::store", "snapshot flush failed: {}", e),
                    Err(e) => warn!(target: "forkful::store", "snapshot flush task failed: {}", e),
                }
            }
        })
    }
}

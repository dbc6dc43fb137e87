//! Per-medicine stock locks
//!
//! The datastore has no conditional write, so every read-modify-write of a
//! stock quantity happens while holding the lock for that medicine name.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of async mutexes keyed by exact medicine name
#[derive(Debug, Default)]
pub struct StockLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Holds one or more medicine locks until dropped
#[derive(Debug)]
pub struct StockGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

/// Deduplicated names in acquisition order
fn lock_order<I, N>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let mut names: Vec<String> = names.into_iter().map(|n| n.as_ref().to_string()).collect();
    names.sort();
    names.dedup();
    names
}

impl StockLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutex_for(&self, name: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Lock every named medicine
    ///
    /// Names are deduplicated and acquired in sorted order so two saves
    /// touching overlapping sets cannot deadlock.
    pub async fn lock_all<I, N>(&self, names: I) -> StockGuard
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let names = lock_order(names);
        let mut guards = Vec::with_capacity(names.len());
        for name in &names {
            guards.push(self.mutex_for(name).lock_owned().await);
        }

        StockGuard { _guards: guards }
    }
}

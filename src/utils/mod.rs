//! Fast path for "is this user registered?" in front of the store.

pub mod user_cache;
pub mod user_filter;

use sqlx::MySqlPool;
use std::sync::atomic::{AtomicBool, Ordering};

use user_cache::UserCache;
use user_filter::UserFilter;

const WARMUP_BATCH: usize = 1_000;
const CACHE_WARMUP_DAYS: u32 = 30;

/// Combines the definite-positive cache with the definite-negative filter.
/// The filter only answers "no" once it holds every registered id, i.e. after
/// a warmup or when the backing store started empty.
pub struct UserRegistry {
    cache: UserCache,
    filter: UserFilter,
    complete: AtomicBool,
}

impl UserRegistry {
    /// Registry for a store that starts with no users.
    pub fn empty() -> Self {
        Self {
            cache: UserCache::new(),
            filter: UserFilter::new(),
            complete: AtomicBool::new(true),
        }
    }

    /// Registry for a pre-populated store; negative answers are withheld
    /// until [`UserRegistry::warmup`] finishes.
    pub fn cold() -> Self {
        Self {
            complete: AtomicBool::new(false),
            ..Self::empty()
        }
    }

    /// `Some(true)`/`Some(false)` when known for sure, `None` when the
    /// store has to be asked.
    pub async fn lookup(&self, user_id: &str) -> Option<bool> {
        if self.cache.is_registered(user_id).await {
            return Some(true);
        }
        if self.complete.load(Ordering::Acquire) && !self.filter.might_exist(user_id) {
            return Some(false);
        }
        None
    }

    pub async fn remember(&self, user_id: &str) {
        self.filter.insert(user_id);
        self.cache.mark_registered(user_id).await;
    }

    pub async fn warmup(&self, pool: &MySqlPool) -> anyhow::Result<()> {
        self.filter.warmup(pool, WARMUP_BATCH).await?;
        self.complete.store(true, Ordering::Release);
        self.cache.warmup(pool, CACHE_WARMUP_DAYS, WARMUP_BATCH).await?;
        Ok(())
    }
}

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Probabilistic set of registered user ids. A miss is definite; a hit may
/// be a false positive and must be confirmed against the store.
pub struct UserFilter {
    inner: RwLock<CuckooFilter<String>>,
}

impl Default for UserFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl UserFilter {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
        }
    }

    /// A poisoned filter answers "maybe" so callers fall through to the store.
    pub fn might_exist(&self, user_id: &str) -> bool {
        let user_id = user_id.to_string();
        match self.inner.read() {
            Ok(filter) => filter.contains(&user_id),
            Err(_) => true,
        }
    }

    pub fn insert(&self, user_id: &str) {
        let user_id = user_id.to_string();
        if let Ok(mut filter) = self.inner.write() {
            if !filter.contains(&user_id) {
                filter.add(&user_id);
            }
        }
    }

    fn insert_batch(&self, user_ids: &[String]) {
        if let Ok(mut filter) = self.inner.write() {
            for user_id in user_ids {
                if !filter.contains(user_id) {
                    filter.add(user_id);
                }
            }
        }
    }

    /// Streams every registered id from MySQL into the filter.
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<usize> {
        let mut stream = sqlx::query_as::<_, (String,)>("SELECT user_id FROM users").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (user_id,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
            batch.push(user_id);
            total += 1;

            if batch.len() == batch_size {
                self.insert_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch);
        }

        log::info!("User filter warmup complete: {} users", total);
        Ok(total)
    }
}

use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::time::Duration;

/// Recently seen registered user ids. A hit is definite.
pub struct UserCache {
    inner: Cache<String, ()>,
}

impl Default for UserCache {
    fn default() -> Self {
        Self::new()
    }
}

impl UserCache {
    pub fn new() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(500_000)
                .time_to_live(Duration::from_secs(86400))
                .build(),
        }
    }

    pub async fn mark_registered(&self, user_id: &str) {
        self.inner.insert(user_id.to_string(), ()).await;
    }

    pub async fn is_registered(&self, user_id: &str) -> bool {
        self.inner.get(user_id).await.is_some()
    }

    async fn batch_mark(&self, user_ids: &[String]) {
        let futures: Vec<_> = user_ids
            .iter()
            .map(|u| self.inner.insert(u.clone(), ()))
            .collect();
        futures::future::join_all(futures).await;
    }

    /// Loads users with leave activity in the last `days` days.
    pub async fn warmup(&self, pool: &MySqlPool, days: u32, batch_size: usize) -> Result<usize> {
        let mut stream = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT DISTINCT user_id
            FROM leave_requests
            WHERE created_at >= NOW() - INTERVAL ? DAY
            "#,
        )
        .bind(days)
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (user_id,) = row?;
            batch.push(user_id);
            total += 1;

            if batch.len() >= batch_size {
                self.batch_mark(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.batch_mark(&batch).await;
        }

        log::info!(
            "User cache warmup complete: {} active users (last {} days)",
            total,
            days
        );
        Ok(total)
    }
}

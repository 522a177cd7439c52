use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::time::Duration;

use super::username_filter::normalize;

/// Positive cache of usernames known to be taken.
pub struct UsernameCache {
    inner: Cache<String, bool>,
}

impl Default for UsernameCache {
    fn default() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(500_000)
                .time_to_live(Duration::from_secs(86_400))
                .build(),
        }
    }
}

impl UsernameCache {
    pub async fn mark_taken(&self, username: &str) {
        self.inner.insert(normalize(username), true).await;
    }

    pub async fn is_taken(&self, username: &str) -> bool {
        self.inner.get(&normalize(username)).await.unwrap_or(false)
    }

    pub async fn forget(&self, username: &str) {
        self.inner.invalidate(&normalize(username)).await;
    }

    async fn batch_mark(&self, usernames: &[String]) {
        let inserts: Vec<_> = usernames
            .iter()
            .map(|u| self.inner.insert(normalize(u), true))
            .collect();
        futures::future::join_all(inserts).await;
    }

    /// Caches the `limit` most recently created accounts, in batches.
    pub async fn warmup(&self, pool: &MySqlPool, limit: u32, batch_size: usize) -> Result<usize> {
        let mut stream = sqlx::query_as::<_, (String,)>(
            "SELECT username FROM users ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (username,) = row?;
            batch.push(username);
            total += 1;

            if batch.len() >= batch_size {
                self.batch_mark(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.batch_mark(&batch).await;
        }

        tracing::info!(total, limit, "Username cache warmup complete");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn remembers_and_forgets() {
        let cache = UsernameCache::default();
        assert!(!cache.is_taken("ravi").await);
        cache.mark_taken("Ravi").await;
        assert!(cache.is_taken("ravi").await);
        cache.forget("RAVI").await;
        assert!(!cache.is_taken("ravi").await);
    }
}

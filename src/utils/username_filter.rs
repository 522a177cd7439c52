use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use sqlx::MySqlPool;
use std::sync::{PoisonError, RwLock};

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
pub fn normalize(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Probabilistic set of every known username. A miss is definitive.
pub struct UsernameFilter {
    inner: RwLock<CuckooFilter<String>>,
}

impl Default for UsernameFilter {
    fn default() -> Self {
        Self {
            inner: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
        }
    }
}

impl UsernameFilter {
    /// False positives possible, false negatives not.
    pub fn might_exist(&self, username: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&normalize(username))
    }

    pub fn insert(&self, username: &str) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&normalize(username));
    }

    pub fn remove(&self, username: &str) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&normalize(username));
    }

    fn insert_batch(&self, usernames: &[String]) {
        let mut filter = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        for username in usernames {
            filter.add(username);
        }
    }

    /// Loads every username, streaming rows and taking the write lock once per batch.
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<usize> {
        let mut stream = sqlx::query_as::<_, (String,)>("SELECT username FROM users").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (username,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

            batch.push(normalize(&username));
            total += 1;

            if batch.len() == batch_size {
                self.insert_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch);
        }

        tracing::info!(total, "Username filter warmup complete");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_names_match_case_insensitively() {
        let filter = UsernameFilter::default();
        assert!(!filter.might_exist("Asha"));
        filter.insert("Asha");
        assert!(filter.might_exist("asha"));
        assert!(filter.might_exist(" ASHA "));
        filter.remove("asha");
        assert!(!filter.might_exist("asha"));
    }
}

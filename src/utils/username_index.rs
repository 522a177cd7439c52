use sqlx::MySqlPool;

use super::{username_cache::UsernameCache, username_filter::{UsernameFilter, normalize}};

/// Answers "is this username free?" without hitting the database in the
/// common cases. Constructed once in `main` and shared through `web::Data`.
#[derive(Default)]
pub struct UsernameIndex {
    pub filter: UsernameFilter,
    pub cache: UsernameCache,
}

impl UsernameIndex {
    /// true => available, false => taken. Database errors count as taken.
    pub async fn is_available(&self, username: &str, pool: &MySqlPool) -> bool {
        let username = normalize(username);

        // Cuckoo filter: fast negative
        if !self.filter.might_exist(&username) {
            return true;
        }

        // Moka cache: fast positive
        if self.cache.is_taken(&username).await {
            return false;
        }

        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = ? LIMIT 1)",
        )
        .bind(&username)
        .fetch_one(pool)
        .await
        .map(|found| found != 0)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Username lookup failed");
            true
        });

        if exists {
            self.cache.mark_taken(&username).await;
        }

        !exists
    }

    pub async fn mark_taken(&self, username: &str) {
        self.filter.insert(username);
        self.cache.mark_taken(username).await;
    }

    pub async fn forget(&self, username: &str) {
        self.filter.remove(username);
        self.cache.forget(username).await;
    }
}

use sqlx::MySqlPool;

use crate::auth::auth::AuthUser;

/// Writes an action to the log stream and, for authenticated actors, to the
/// `audit_logs` table. A failed insert is logged and swallowed.
pub async fn record(pool: &MySqlPool, actor: Option<&AuthUser>, action: &str) {
    let username = actor.map(|a| a.username.as_str()).unwrap_or("anonymous");
    tracing::info!(target: "audit", user = username, "{action}");

    let Some(actor) = actor else {
        return;
    };

    if let Err(e) = sqlx::query("INSERT INTO audit_logs (user_id, action, timestamp) VALUES (?, ?, UTC_TIMESTAMP())")
        .bind(actor.user_id)
        .bind(action)
        .execute(pool)
        .await
    {
        tracing::error!(error = %e, user_id = actor.user_id, "Failed to store audit log");
    }
}

// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-tenant quota counters. Initialized to zero on first reference,
//! checked before persistence, incremented by the serialized byte length of
//! accepted Statement bodies (spec §3, §5: best-effort, not transactionally
//! coupled with the envelope insert).

use crate::{config, db::Pool, emit_db_error, MyError};

/// Return the current byte usage recorded for `tenant_user`, `0` if none yet.
pub async fn usage(pool: &Pool, tenant_user: &str) -> Result<i64, MyError> {
    let row = sqlx::query_scalar::<_, i64>(
        r#"SELECT bytes_used FROM quota WHERE tenant_user = $1"#,
    )
    .bind(tenant_user)
    .fetch_optional(pool)
    .await;

    match row {
        Ok(x) => Ok(x.unwrap_or(0)),
        Err(x) => emit_db_error!(x, "Failed reading quota for {}", tenant_user),
    }
}

/// Return TRUE if charging `additional` bytes to `tenant_user` would exceed
/// the configured per-tenant ceiling.
pub async fn would_exceed(pool: &Pool, tenant_user: &str, additional: i64) -> Result<bool, MyError> {
    let current = usage(pool, tenant_user).await?;
    Ok(current.saturating_add(additional) > config().quota_user_max_usage)
}

/// Add `additional` bytes to `tenant_user`'s recorded usage, creating the row
/// if it did not already exist.
pub async fn charge(pool: &Pool, tenant_user: &str, additional: i64) -> Result<(), MyError> {
    let result = sqlx::query(
        r#"INSERT INTO quota (tenant_user, bytes_used) VALUES ($1, $2)
           ON CONFLICT (tenant_user) DO UPDATE SET bytes_used = quota.bytes_used + EXCLUDED.bytes_used"#,
    )
    .bind(tenant_user)
    .bind(additional)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(x) => emit_db_error!(x, "Failed charging quota for {}", tenant_user),
    }
}

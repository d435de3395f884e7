use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;

use crate::model::shift::Shift;

const SHIFT_COLUMNS: &str =
    "id, name, login_time, grace_time, lunch_start_time, lunch_duration, logout_time, is_active";

/// Shift policies by id. Attendance marking reads these on every login and
/// lunch-in; HR edits invalidate entries.
static SHIFT_CACHE: Lazy<Cache<u64, Arc<Shift>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(3600))
        .build()
});

pub async fn get(pool: &MySqlPool, shift_id: u64) -> Result<Option<Arc<Shift>>, sqlx::Error> {
    if let Some(shift) = SHIFT_CACHE.get(&shift_id).await {
        return Ok(Some(shift));
    }

    let shift = sqlx::query_as::<_, Shift>(&format!(
        "SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?"
    ))
    .bind(shift_id)
    .fetch_optional(pool)
    .await?;

    match shift {
        Some(shift) => {
            let shift = Arc::new(shift);
            SHIFT_CACHE.insert(shift_id, shift.clone()).await;
            Ok(Some(shift))
        }
        None => Ok(None),
    }
}

/// Active shift assigned to a user, if any.
pub async fn for_user(pool: &MySqlPool, user_id: u64) -> Result<Option<Arc<Shift>>, sqlx::Error> {
    let shift_id = sqlx::query_scalar::<_, Option<u64>>("SELECT shift_id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .flatten();

    let Some(shift_id) = shift_id else {
        return Ok(None);
    };

    Ok(get(pool, shift_id).await?.filter(|s| s.is_active))
}

pub async fn invalidate(shift_id: u64) {
    SHIFT_CACHE.invalidate(&shift_id).await;
}

pub async fn list_all(pool: &MySqlPool) -> Result<Vec<Shift>, sqlx::Error> {
    sqlx::query_as::<_, Shift>(&format!("SELECT {SHIFT_COLUMNS} FROM shifts ORDER BY name"))
        .fetch_all(pool)
        .await
}

/// Loads every active shift into the cache.
pub async fn warmup_shift_cache(pool: &MySqlPool) -> Result<()> {
    let shifts = list_all(pool).await?;
    let mut loaded = 0usize;

    for shift in shifts.into_iter().filter(|s| s.is_active) {
        SHIFT_CACHE.insert(shift.id, Arc::new(shift)).await;
        loaded += 1;
    }

    tracing::info!(loaded, "Shift cache warmup complete");
    Ok(())
}

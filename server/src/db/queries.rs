//! Database Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).
//!
//! Soft-deleted rows (`deleted_at IS NOT NULL`) are treated as missing.

use sqlx::{PgPool, Postgres, Transaction};
use tracing::error;

use crate::access::ChannelId;

use super::models::{CustomerGroup, SalesChannel};

/// Log and return a database error with context.
macro_rules! db_error {
    ($query:expr, $($field:tt)*) => {
        |e| {
            error!(query = $query, $($field)*, error = %e, "Database query failed");
            e
        }
    };
}

const GROUP_COLUMNS: &str = "id, name, sales_channel_id, created_at, updated_at";
const CHANNEL_COLUMNS: &str = "id, name, description, is_disabled, created_at, updated_at";

// ============================================================================
// Lookups
// ============================================================================

/// Find a customer group by ID.
pub async fn find_customer_group(pool: &PgPool, id: &str) -> sqlx::Result<Option<CustomerGroup>> {
    sqlx::query_as::<_, CustomerGroup>(&format!(
        "SELECT {GROUP_COLUMNS} FROM customer_group WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("find_customer_group", group_id = %id))
}

/// Find a sales channel by ID.
pub async fn find_sales_channel(pool: &PgPool, id: &str) -> sqlx::Result<Option<SalesChannel>> {
    sqlx::query_as::<_, SalesChannel>(&format!(
        "SELECT {CHANNEL_COLUMNS} FROM sales_channel WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("find_sales_channel", channel_id = %id))
}

/// Get the sales channel bound to a group.
///
/// Returns `None` if the group has no binding or the bound channel is deleted.
pub async fn get_group_sales_channel(
    pool: &PgPool,
    group_id: &str,
) -> sqlx::Result<Option<SalesChannel>> {
    sqlx::query_as::<_, SalesChannel>(
        r"
        SELECT sc.id, sc.name, sc.description, sc.is_disabled, sc.created_at, sc.updated_at
        FROM customer_group cg
        INNER JOIN sales_channel sc ON sc.id = cg.sales_channel_id
        WHERE cg.id = $1
          AND cg.deleted_at IS NULL
          AND sc.deleted_at IS NULL
        ",
    )
    .bind(group_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("get_group_sales_channel", group_id = %group_id))
}

// ============================================================================
// Binding
// ============================================================================

/// Outcome of a bind attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// Group now bound to the channel.
    Bound(SalesChannel),
    /// Group does not exist.
    GroupNotFound,
    /// Channel does not exist.
    ChannelNotFound,
}

async fn lock_group(
    tx: &mut Transaction<'_, Postgres>,
    group_id: &str,
) -> sqlx::Result<Option<CustomerGroup>> {
    sqlx::query_as::<_, CustomerGroup>(&format!(
        "SELECT {GROUP_COLUMNS} FROM customer_group WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
    ))
    .bind(group_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Bind a group to a sales channel, replacing any previous binding.
pub async fn set_group_sales_channel(
    pool: &PgPool,
    group_id: &str,
    channel_id: &str,
) -> sqlx::Result<BindOutcome> {
    let mut tx = pool.begin().await?;

    if lock_group(&mut tx, group_id)
        .await
        .map_err(db_error!("set_group_sales_channel", group_id = %group_id))?
        .is_none()
    {
        return Ok(BindOutcome::GroupNotFound);
    }

    let channel = sqlx::query_as::<_, SalesChannel>(&format!(
        "SELECT {CHANNEL_COLUMNS} FROM sales_channel WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(channel_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(db_error!("set_group_sales_channel", channel_id = %channel_id))?;

    let Some(channel) = channel else {
        return Ok(BindOutcome::ChannelNotFound);
    };

    sqlx::query(
        "UPDATE customer_group SET sales_channel_id = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(group_id)
    .bind(channel_id)
    .execute(&mut *tx)
    .await
    .map_err(db_error!("set_group_sales_channel", group_id = %group_id))?;

    tx.commit().await?;
    Ok(BindOutcome::Bound(channel))
}

/// Outcome of an unbind attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// Binding removed; carries the previously bound channel.
    Cleared(ChannelId),
    /// Group exists but had no binding.
    NotBound,
    /// Group does not exist.
    GroupNotFound,
}

/// Clear a group's binding, reopening its channel to implicit access.
pub async fn clear_group_sales_channel(pool: &PgPool, group_id: &str) -> sqlx::Result<ClearOutcome> {
    let mut tx = pool.begin().await?;

    let Some(group) = lock_group(&mut tx, group_id)
        .await
        .map_err(db_error!("clear_group_sales_channel", group_id = %group_id))?
    else {
        return Ok(ClearOutcome::GroupNotFound);
    };

    let Some(previous) = group.sales_channel_id else {
        return Ok(ClearOutcome::NotBound);
    };

    sqlx::query(
        "UPDATE customer_group SET sales_channel_id = NULL, updated_at = NOW() WHERE id = $1",
    )
    .bind(group_id)
    .execute(&mut *tx)
    .await
    .map_err(db_error!("clear_group_sales_channel", group_id = %group_id))?;

    tx.commit().await?;
    Ok(ClearOutcome::Cleared(previous))
}

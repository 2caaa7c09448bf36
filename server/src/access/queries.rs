//! PostgreSQL-backed channel access queries.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::PgPool;

use super::error::AccessResult;
use super::models::{ChannelId, CustomerId};
use super::store::ChannelAccessStore;

/// [`ChannelAccessStore`] reading the storefront tables directly.
#[derive(Debug, Clone)]
pub struct PgChannelStore {
    pool: PgPool,
}

impl PgChannelStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelAccessStore for PgChannelStore {
    #[tracing::instrument(skip(self, credential), fields(has_credential = credential.is_some()))]
    async fn find_explicit_channels(
        &self,
        customer_id: &CustomerId,
        credential: Option<&str>,
    ) -> AccessResult<BTreeSet<ChannelId>> {
        // $2 only narrows the result when it names an active key.
        let rows: Vec<(ChannelId,)> = sqlx::query_as(
            r"
            SELECT DISTINCT sc.id
            FROM sales_channel sc
            INNER JOIN customer_group cg
                ON cg.sales_channel_id = sc.id AND cg.deleted_at IS NULL
            INNER JOIN customer_group_customers cgc
                ON cgc.customer_group_id = cg.id AND cgc.customer_id = $1
            WHERE sc.is_disabled = FALSE
              AND sc.deleted_at IS NULL
              AND (
                  $2::varchar IS NULL
                  OR NOT EXISTS (
                      SELECT 1 FROM publishable_api_key pak
                      WHERE pak.api_key = $2
                        AND pak.revoked_at IS NULL
                        AND pak.revoked_by IS NULL
                  )
                  OR EXISTS (
                      SELECT 1
                      FROM publishable_api_key pak
                      INNER JOIN publishable_api_key_sales_channel paksc
                          ON paksc.publishable_api_key_id = pak.id
                      WHERE pak.api_key = $2
                        AND pak.revoked_at IS NULL
                        AND pak.revoked_by IS NULL
                        AND paksc.sales_channel_id = sc.id
                  )
              )
            ",
        )
        .bind(customer_id)
        .bind(credential)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    #[tracing::instrument(skip(self, credential), fields(has_credential = credential.is_some()))]
    async fn find_implicit_channels(
        &self,
        credential: Option<&str>,
        limit_by_credential: bool,
    ) -> AccessResult<BTreeSet<ChannelId>> {
        let scope_key = credential.filter(|_| limit_by_credential);

        let rows: Vec<(ChannelId,)> = sqlx::query_as(
            r"
            SELECT sc.id
            FROM sales_channel sc
            WHERE sc.is_disabled = FALSE
              AND sc.deleted_at IS NULL
              AND NOT EXISTS (
                  SELECT 1 FROM customer_group cg
                  WHERE cg.sales_channel_id = sc.id
                    AND cg.deleted_at IS NULL
              )
              AND (
                  $1::varchar IS NULL
                  OR NOT EXISTS (
                      SELECT 1 FROM publishable_api_key pak
                      WHERE pak.api_key = $1
                        AND pak.revoked_at IS NULL
                        AND pak.revoked_by IS NULL
                  )
                  OR EXISTS (
                      SELECT 1
                      FROM publishable_api_key pak
                      INNER JOIN publishable_api_key_sales_channel paksc
                          ON paksc.publishable_api_key_id = pak.id
                      WHERE pak.api_key = $1
                        AND pak.revoked_at IS NULL
                        AND pak.revoked_by IS NULL
                        AND paksc.sales_channel_id = sc.id
                  )
              )
            ",
        )
        .bind(scope_key)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

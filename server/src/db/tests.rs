//! Database Integration Tests
//!
//! Binding administration against `PostgreSQL`.

#[cfg(test)]
mod postgres_tests {
    use super::super::*;
    use sqlx::PgPool;

    use crate::access::ChannelId;

    async fn seed(pool: &PgPool) {
        sqlx::raw_sql(
            r"
            INSERT INTO sales_channel (id, name, description, deleted_at) VALUES
                ('sc_b2b', 'B2B', 'Wholesale catalog', NULL),
                ('sc_retail', 'Retail', NULL, NULL),
                ('sc_removed', 'Removed', NULL, NOW());

            INSERT INTO customer_group (id, name, sales_channel_id, deleted_at) VALUES
                ('cg_b2b', 'B2B buyers', 'sc_b2b', NULL),
                ('cg_new', 'New group', NULL, NULL),
                ('cg_gone', 'Archived', NULL, NOW());
            ",
        )
        .execute(pool)
        .await
        .expect("Failed to seed storefront tables");
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    #[sqlx::test]
    async fn test_find_group_and_channel(pool: PgPool) {
        seed(&pool).await;

        let group = find_customer_group(&pool, "cg_b2b")
            .await
            .expect("Query failed")
            .expect("Group not found");
        assert_eq!(group.name, "B2B buyers");
        assert_eq!(group.sales_channel_id, Some(ChannelId::from("sc_b2b")));

        let channel = find_sales_channel(&pool, "sc_b2b")
            .await
            .expect("Query failed")
            .expect("Channel not found");
        assert_eq!(channel.description.as_deref(), Some("Wholesale catalog"));
        assert!(!channel.is_disabled);
    }

    #[sqlx::test]
    async fn test_soft_deleted_rows_are_missing(pool: PgPool) {
        seed(&pool).await;

        assert!(find_customer_group(&pool, "cg_gone").await.unwrap().is_none());
        assert!(find_sales_channel(&pool, "sc_removed").await.unwrap().is_none());
        assert!(find_customer_group(&pool, "cg_nope").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_get_group_sales_channel(pool: PgPool) {
        seed(&pool).await;

        let bound = get_group_sales_channel(&pool, "cg_b2b").await.unwrap();
        assert_eq!(bound.map(|c| c.id), Some(ChannelId::from("sc_b2b")));

        let unbound = get_group_sales_channel(&pool, "cg_new").await.unwrap();
        assert!(unbound.is_none());
    }

    // ========================================================================
    // Binding
    // ========================================================================

    #[sqlx::test]
    async fn test_bind_replaces_previous_channel(pool: PgPool) {
        seed(&pool).await;

        let outcome = set_group_sales_channel(&pool, "cg_b2b", "sc_retail")
            .await
            .expect("Bind failed");
        let BindOutcome::Bound(channel) = outcome else {
            panic!("Expected binding, got {outcome:?}");
        };
        assert_eq!(channel.id, ChannelId::from("sc_retail"));

        let group = find_customer_group(&pool, "cg_b2b").await.unwrap().unwrap();
        assert_eq!(group.sales_channel_id, Some(ChannelId::from("sc_retail")));
    }

    #[sqlx::test]
    async fn test_bind_missing_group_or_channel(pool: PgPool) {
        seed(&pool).await;

        assert_eq!(
            set_group_sales_channel(&pool, "cg_gone", "sc_retail").await.unwrap(),
            BindOutcome::GroupNotFound
        );
        assert_eq!(
            set_group_sales_channel(&pool, "cg_new", "sc_removed").await.unwrap(),
            BindOutcome::ChannelNotFound
        );

        // Failed bind leaves the group untouched
        let group = find_customer_group(&pool, "cg_new").await.unwrap().unwrap();
        assert!(group.sales_channel_id.is_none());
    }

    #[sqlx::test]
    async fn test_clear_binding(pool: PgPool) {
        seed(&pool).await;

        assert_eq!(
            clear_group_sales_channel(&pool, "cg_b2b").await.unwrap(),
            ClearOutcome::Cleared(ChannelId::from("sc_b2b"))
        );
        assert_eq!(
            clear_group_sales_channel(&pool, "cg_b2b").await.unwrap(),
            ClearOutcome::NotBound
        );
        assert_eq!(
            clear_group_sales_channel(&pool, "cg_gone").await.unwrap(),
            ClearOutcome::GroupNotFound
        );
    }

    #[sqlx::test]
    async fn test_deleting_channel_unbinds_group(pool: PgPool) {
        seed(&pool).await;

        sqlx::query("DELETE FROM sales_channel WHERE id = 'sc_b2b'")
            .execute(&pool)
            .await
            .unwrap();

        let group = find_customer_group(&pool, "cg_b2b").await.unwrap().unwrap();
        assert!(group.sales_channel_id.is_none());
    }
}

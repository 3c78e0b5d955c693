use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Sent Alert Repository
// ============================================================================

/// Ledger of alerts already sent per (user, info request, alert type).
///
/// Rows are append-only. Nothing here prevents a second row for the same
/// triple; the notifier is expected to call `has_been_sent` before sending.
pub struct AlertSentRepository;

impl AlertSentRepository {
    /// Record that an alert was sent, validating the raw alert type first.
    pub async fn record_sent(
        pool: &SqlitePool,
        user_id: i64,
        info_request_id: i64,
        alert_type: &str,
    ) -> AppResult<AlertSent> {
        let alert_type = AlertType::from_str(alert_type).ok_or_else(|| {
            AppError::Validation(crate::i18n::t_with(
                "validation.alert_type_invalid",
                &[("alert_type", alert_type)],
            ))
        })?;

        Self::create(
            pool,
            CreateAlertSent {
                user_id,
                info_request_id,
                alert_type,
            },
        )
        .await
    }

    pub async fn create(pool: &SqlitePool, alert: CreateAlertSent) -> AppResult<AlertSent> {
        let now = Utc::now().naive_utc();

        let created = sqlx::query_as::<_, AlertSent>(
            r#"
            INSERT INTO user_info_request_sent_alerts (
                user_id, info_request_id, alert_type, created_at
            )
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, info_request_id, alert_type, created_at
            "#,
        )
        .bind(alert.user_id)
        .bind(alert.info_request_id)
        .bind(alert.alert_type.as_str())
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        tracing::debug!(
            "Recorded {} alert for user {} on info request {}",
            alert.alert_type,
            alert.user_id,
            alert.info_request_id
        );

        Ok(created)
    }

    pub async fn has_been_sent(
        pool: &SqlitePool,
        user_id: i64,
        info_request_id: i64,
        alert_type: AlertType,
    ) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_info_request_sent_alerts WHERE info_request_id = ? AND user_id = ? AND alert_type = ?",
        )
        .bind(info_request_id)
        .bind(user_id)
        .bind(alert_type.as_str())
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(count > 0)
    }

    /// Count rows for one info request and alert type. More than one per user
    /// means a caller skipped `has_been_sent`.
    pub async fn count_for_info_request(
        pool: &SqlitePool,
        info_request_id: i64,
        alert_type: AlertType,
    ) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_info_request_sent_alerts WHERE info_request_id = ? AND alert_type = ?",
        )
        .bind(info_request_id)
        .bind(alert_type.as_str())
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// All alerts sent about an info request, oldest first.
    pub async fn list_for_info_request(
        pool: &SqlitePool,
        info_request_id: i64,
    ) -> AppResult<Vec<AlertSent>> {
        sqlx::query_as::<_, AlertSent>(
            r#"
            SELECT id, user_id, info_request_id, alert_type, created_at
            FROM user_info_request_sent_alerts
            WHERE info_request_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(info_request_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Cascade for a deleted info request. Returns the number of rows removed.
    pub async fn delete_for_info_request(pool: &SqlitePool, info_request_id: i64) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM user_info_request_sent_alerts WHERE info_request_id = ?")
                .bind(info_request_id)
                .execute(pool)
                .await
                .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    /// Cascade for a deleted user. Returns the number of rows removed.
    pub async fn delete_for_user(pool: &SqlitePool, user_id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM user_info_request_sent_alerts WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn record_sent_accepts_both_alert_types() {
        let pool = test_pool().await;

        for raw in ["overdue_1", "new_response_reminder_1"] {
            let row = AlertSentRepository::record_sent(&pool, 1, 10, raw)
                .await
                .unwrap();
            assert_eq!(row.alert_type, raw);
            assert_eq!(row.user_id, 1);
            assert_eq!(row.info_request_id, 10);
            assert!(row.kind().is_some());
        }
    }

    #[tokio::test]
    async fn record_sent_rejects_unknown_alert_type() {
        let pool = test_pool().await;

        let err = AlertSentRepository::record_sent(&pool, 1, 10, "overdue_2")
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("overdue_2")),
            other => panic!("expected validation error, got {other:?}"),
        }

        // nothing was written
        assert!(AlertSentRepository::list_for_info_request(&pool, 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn database_rejects_unknown_alert_type() {
        let pool = test_pool().await;

        let res = sqlx::query(
            "INSERT INTO user_info_request_sent_alerts (user_id, info_request_id, alert_type) VALUES (1, 1, 'weekly')",
        )
        .execute(&pool)
        .await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn has_been_sent_matches_exact_triple() {
        let pool = test_pool().await;

        assert!(
            !AlertSentRepository::has_been_sent(&pool, 1, 10, AlertType::Overdue1)
                .await
                .unwrap()
        );

        AlertSentRepository::record_sent(&pool, 1, 10, "overdue_1")
            .await
            .unwrap();

        assert!(
            AlertSentRepository::has_been_sent(&pool, 1, 10, AlertType::Overdue1)
                .await
                .unwrap()
        );
        // different alert type, user or request
        assert!(
            !AlertSentRepository::has_been_sent(&pool, 1, 10, AlertType::NewResponseReminder1)
                .await
                .unwrap()
        );
        assert!(
            !AlertSentRepository::has_been_sent(&pool, 2, 10, AlertType::Overdue1)
                .await
                .unwrap()
        );
        assert!(
            !AlertSentRepository::has_been_sent(&pool, 1, 11, AlertType::Overdue1)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn duplicates_are_representable() {
        let pool = test_pool().await;

        for _ in 0..2 {
            AlertSentRepository::create(
                &pool,
                CreateAlertSent {
                    user_id: 3,
                    info_request_id: 30,
                    alert_type: AlertType::NewResponseReminder1,
                },
            )
            .await
            .unwrap();
        }

        let count = AlertSentRepository::count_for_info_request(
            &pool,
            30,
            AlertType::NewResponseReminder1,
        )
        .await
        .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn list_is_oldest_first() {
        let pool = test_pool().await;

        let first = AlertSentRepository::record_sent(&pool, 1, 50, "overdue_1")
            .await
            .unwrap();
        let second = AlertSentRepository::record_sent(&pool, 2, 50, "new_response_reminder_1")
            .await
            .unwrap();
        AlertSentRepository::record_sent(&pool, 1, 51, "overdue_1")
            .await
            .unwrap();

        let rows = AlertSentRepository::list_for_info_request(&pool, 50)
            .await
            .unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn cascades_remove_only_owned_rows() {
        let pool = test_pool().await;

        AlertSentRepository::record_sent(&pool, 1, 60, "overdue_1")
            .await
            .unwrap();
        AlertSentRepository::record_sent(&pool, 2, 60, "overdue_1")
            .await
            .unwrap();
        AlertSentRepository::record_sent(&pool, 1, 61, "overdue_1")
            .await
            .unwrap();

        assert_eq!(
            AlertSentRepository::delete_for_info_request(&pool, 60)
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            AlertSentRepository::delete_for_user(&pool, 1).await.unwrap(),
            1
        );
        assert_eq!(AlertSentRepository::delete_for_user(&pool, 1).await.unwrap(), 0);
    }
}

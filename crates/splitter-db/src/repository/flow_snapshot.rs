//! # Flow Snapshot Repository
//!
//! Cross-device resume records, one row per user.
//!
//! ```text
//! POST /api/flow/actions ──► reduce ──► upsert(user_id, snapshot)
//!                                             │
//!                                             ▼
//!                              flow_snapshots (user_id PRIMARY KEY)
//!                                             │
//! GET /api/flow (new device) ◄── get(user_id) ┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use splitter_core::types::Bill;
use splitter_core::FlowSnapshot;

#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    flow_name: Option<String>,
    step_index: i64,
    bill_json: Option<String>,
}

impl TryFrom<SnapshotRow> for FlowSnapshot {
    type Error = crate::DbError;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        let bill = row
            .bill_json
            .as_deref()
            .map(serde_json::from_str::<Bill>)
            .transpose()?;

        Ok(FlowSnapshot {
            flow_name: row.flow_name,
            step_index: row.step_index.max(0) as usize,
            bill,
        })
    }
}

/// Repository for flow resume snapshots.
#[derive(Debug, Clone)]
pub struct FlowSnapshotRepository {
    pool: SqlitePool,
}

impl FlowSnapshotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        FlowSnapshotRepository { pool }
    }

    /// Inserts or replaces the user's snapshot.
    pub async fn upsert(&self, user_id: &str, snapshot: &FlowSnapshot) -> DbResult<()> {
        debug!(
            user_id = %user_id,
            flow = ?snapshot.flow_name,
            step_index = snapshot.step_index,
            "Saving flow snapshot"
        );

        let bill_json = snapshot.bill.as_ref().map(serde_json::to_string).transpose()?;

        sqlx::query(
            r#"
            INSERT INTO flow_snapshots (user_id, flow_name, step_index, bill_json, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (user_id) DO UPDATE SET
                flow_name = excluded.flow_name,
                step_index = excluded.step_index,
                bill_json = excluded.bill_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(&snapshot.flow_name)
        .bind(snapshot.step_index as i64)
        .bind(bill_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads the user's snapshot, if any.
    pub async fn get(&self, user_id: &str) -> DbResult<Option<FlowSnapshot>> {
        debug!(user_id = %user_id, "Loading flow snapshot");

        let row = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT flow_name, step_index, bill_json
            FROM flow_snapshots
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FlowSnapshot::try_from).transpose()
    }

    /// Deletes the user's snapshot. Returns whether one existed.
    pub async fn delete(&self, user_id: &str) -> DbResult<bool> {
        debug!(user_id = %user_id, "Deleting flow snapshot");

        let result = sqlx::query("DELETE FROM flow_snapshots WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};
    use chrono::NaiveDate;
    use splitter_core::money::{Money, DISCREPANCY_TOLERANCE};
    use splitter_core::types::Item;

    fn bill() -> Bill {
        Bill::new(
            "Bakery",
            NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            vec![Item::new(0, "Croissant", Money::from_cents(325), 2)],
            None,
            None,
            None,
            Money::from_cents(650),
            DISCREPANCY_TOLERANCE,
        )
    }

    async fn repo() -> (Database, FlowSnapshotRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.snapshots();
        (db, repo)
    }

    #[tokio::test]
    async fn test_upsert_then_get() {
        let (_db, repo) = repo().await;
        let snapshot = FlowSnapshot {
            flow_name: Some("scan".to_string()),
            step_index: 2,
            bill: Some(bill()),
        };

        repo.upsert("u1", &snapshot).await.unwrap();
        assert_eq!(repo.get("u1").await.unwrap(), Some(snapshot));
        assert_eq!(repo.get("u2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing() {
        let (_db, repo) = repo().await;
        let first = FlowSnapshot {
            flow_name: Some("scan".to_string()),
            step_index: 1,
            bill: Some(bill()),
        };
        let second = FlowSnapshot {
            flow_name: Some("manual".to_string()),
            step_index: 1,
            bill: None,
        };

        repo.upsert("u1", &first).await.unwrap();
        repo.upsert("u1", &second).await.unwrap();

        assert_eq!(repo.get("u1").await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_db, repo) = repo().await;
        let snapshot = FlowSnapshot {
            flow_name: None,
            step_index: 0,
            bill: None,
        };
        repo.upsert("u1", &snapshot).await.unwrap();

        assert!(repo.delete("u1").await.unwrap());
        assert!(!repo.delete("u1").await.unwrap());
        assert_eq!(repo.get("u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_bill_is_serialization_error() {
        let (db, repo) = repo().await;
        sqlx::query(
            "INSERT INTO flow_snapshots (user_id, flow_name, step_index, bill_json, updated_at) \
             VALUES ('u1', 'scan', 1, '{not json', '2026-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        assert!(matches!(repo.get("u1").await, Err(DbError::Serialization(_))));
    }
}

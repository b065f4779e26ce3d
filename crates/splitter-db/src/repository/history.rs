//! # Expense History Repository
//!
//! Point-in-time records of finalized expenses. The bill and the splits are
//! stored as JSON exactly as they were at submit time; later changes to the
//! group or to the extraction schema never rewrite history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use splitter_core::types::{Bill, FinalSplit};
use splitter_core::{FlowType, Money};

/// One finalized expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: String,
    pub user_id: String,
    pub flow_type: FlowType,
    pub group_id: String,
    pub description: String,
    pub expense_date: NaiveDate,
    pub total: Money,
    /// Absent for manual expenses.
    pub bill: Option<Bill>,
    pub splits: Vec<FinalSplit>,
    pub created_at: DateTime<Utc>,
}

impl ExpenseRecord {
    /// Creates a record with a fresh id, timestamped now.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: impl Into<String>,
        flow_type: FlowType,
        group_id: impl Into<String>,
        description: impl Into<String>,
        expense_date: NaiveDate,
        total: Money,
        bill: Option<Bill>,
        splits: Vec<FinalSplit>,
    ) -> Self {
        ExpenseRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            flow_type,
            group_id: group_id.into(),
            description: description.into(),
            expense_date,
            total,
            bill,
            splits,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: String,
    user_id: String,
    flow_type: FlowType,
    group_id: String,
    description: String,
    expense_date: NaiveDate,
    total_cents: i64,
    bill_json: Option<String>,
    splits_json: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for ExpenseRecord {
    type Error = DbError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(ExpenseRecord {
            id: row.id,
            user_id: row.user_id,
            flow_type: row.flow_type,
            group_id: row.group_id,
            description: row.description,
            expense_date: row.expense_date,
            total: Money::from_cents(row.total_cents),
            bill: row
                .bill_json
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            splits: serde_json::from_str(&row.splits_json)?,
            created_at: row.created_at,
        })
    }
}

/// Repository for expense history.
#[derive(Debug, Clone)]
pub struct ExpenseHistoryRepository {
    pool: SqlitePool,
}

impl ExpenseHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseHistoryRepository { pool }
    }

    /// Stores a finalized expense.
    pub async fn record(&self, entry: &ExpenseRecord) -> DbResult<()> {
        debug!(
            id = %entry.id,
            user_id = %entry.user_id,
            total = %entry.total,
            "Recording expense history"
        );

        let bill_json = entry.bill.as_ref().map(serde_json::to_string).transpose()?;
        let splits_json = serde_json::to_string(&entry.splits)?;

        sqlx::query(
            r#"
            INSERT INTO expense_history (
                id, user_id, flow_type, group_id, description,
                expense_date, total_cents, bill_json, splits_json, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10
            )
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(entry.flow_type)
        .bind(&entry.group_id)
        .bind(&entry.description)
        .bind(entry.expense_date)
        .bind(entry.total.cents())
        .bind(bill_json)
        .bind(splits_json)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The user's most recent expenses, newest first.
    pub async fn list_for_user(&self, user_id: &str, limit: u32) -> DbResult<Vec<ExpenseRecord>> {
        debug!(user_id = %user_id, limit = limit, "Listing expense history");

        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, user_id, flow_type, group_id, description,
                   expense_date, total_cents, bill_json, splits_json, created_at
            FROM expense_history
            WHERE user_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ExpenseRecord::try_from).collect()
    }

    /// Looks up one record by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<ExpenseRecord>> {
        debug!(id = %id, "Loading expense history entry");

        let row = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, user_id, flow_type, group_id, description,
                   expense_date, total_cents, bill_json, splits_json, created_at
            FROM expense_history
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ExpenseRecord::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Duration;
    use splitter_core::types::MemberId;

    fn record(user: &str, description: &str) -> ExpenseRecord {
        ExpenseRecord::new(
            user,
            FlowType::Manual,
            "g1",
            description,
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            Money::from_cents(1000),
            None,
            vec![
                FinalSplit {
                    member_id: MemberId::new("a"),
                    amount_owed: Money::from_cents(500),
                },
                FinalSplit {
                    member_id: MemberId::new("b"),
                    amount_owed: Money::from_cents(500),
                },
            ],
        )
    }

    #[tokio::test]
    async fn test_record_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.history();
        let entry = record("u1", "Taxi");

        repo.record(&entry).await.unwrap();
        let loaded = repo.get(&entry.id).await.unwrap().unwrap();

        assert_eq!(loaded.description, "Taxi");
        assert_eq!(loaded.flow_type, FlowType::Manual);
        assert_eq!(loaded.splits, entry.splits);
        assert_eq!(loaded.total, entry.total);
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_for_user_newest_first_and_scoped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.history();

        let mut older = record("u1", "Older");
        older.created_at -= Duration::hours(1);
        repo.record(&older).await.unwrap();
        repo.record(&record("u1", "Newer")).await.unwrap();
        repo.record(&record("u2", "Someone else")).await.unwrap();

        let list = repo.list_for_user("u1", 10).await.unwrap();
        let titles: Vec<&str> = list.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(titles, vec!["Newer", "Older"]);

        assert_eq!(repo.list_for_user("u1", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_unique_violation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.history();
        let entry = record("u1", "Taxi");

        repo.record(&entry).await.unwrap();
        assert!(matches!(
            repo.record(&entry).await,
            Err(DbError::UniqueViolation { .. })
        ));
    }
}

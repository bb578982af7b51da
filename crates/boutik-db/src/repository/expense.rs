//! # Expense Repository
//!
//! Shop expenses (rent, electricity, transport...). They are dated by
//! calendar day, not by timestamp, and feed the financial summary and the
//! daily cash report.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use boutik_core::report::DateRange;
use boutik_core::validation::validate_new_expense;
use boutik_core::{Expense, NewExpense};

const EXPENSE_COLUMNS: &str = r#"
    id, tenant_id, date, description, amount, category, receipt_url, created_at
"#;

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        ExpenseRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    pub async fn insert(&self, new: &NewExpense) -> DbResult<Expense> {
        validate_new_expense(new)?;

        let expense = Expense {
            id: new_id(),
            tenant_id: self.tenant_id.clone(),
            date: new.date,
            description: new.description.trim().to_string(),
            amount: new.amount,
            category: new.category.clone(),
            receipt_url: new.receipt_url.clone(),
            created_at: Utc::now(),
        };

        debug!(id = %expense.id, date = %expense.date, amount = expense.amount.minor(), "Inserting expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, tenant_id, date, description, amount, category, receipt_url, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.tenant_id)
        .bind(expense.date)
        .bind(&expense.description)
        .bind(expense.amount)
        .bind(&expense.category)
        .bind(&expense.receipt_url)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Expenses newest day first, optionally limited to `range`.
    pub async fn list(&self, range: Option<&DateRange>) -> DbResult<Vec<Expense>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM expenses
            WHERE tenant_id = ?1
              AND (?2 IS NULL OR date >= ?2)
              AND (?3 IS NULL OR date <= ?3)
            ORDER BY date DESC, created_at DESC
            "#,
            EXPENSE_COLUMNS
        );
        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .bind(&self.tenant_id)
            .bind(range.map(|r| r.start))
            .bind(range.map(|r| r.end))
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting expense");

        let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(&self.tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use boutik_core::Money;
    use chrono::NaiveDate;

    fn expense(date: NaiveDate, description: &str, amount: i64) -> NewExpense {
        NewExpense {
            date,
            description: description.to_string(),
            amount: Money::from_minor(amount),
            category: None,
            receipt_url: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_list_by_range() {
        let db = test_db().await;
        let repo = db.expenses(TENANT);

        repo.insert(&expense(day(1), "Loyer", 25_000)).await.unwrap();
        repo.insert(&expense(day(5), "Électricité", 7_500)).await.unwrap();
        repo.insert(&expense(day(9), "Transport", 1_000)).await.unwrap();

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].description, "Transport");

        let range = DateRange::new(day(1), day(5)).unwrap();
        let first_week = repo.list(Some(&range)).await.unwrap();
        assert_eq!(first_week.len(), 2);
        assert_eq!(first_week[1].date, day(1));

        assert!(db.expenses(OTHER_TENANT).list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_expense_rejected() {
        let db = test_db().await;
        let repo = db.expenses(TENANT);

        assert!(repo.insert(&expense(day(1), "Loyer", 0)).await.is_err());
        assert!(repo.insert(&expense(day(1), "  ", 500)).await.is_err());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let repo = db.expenses(TENANT);
        let created = repo.insert(&expense(day(2), "Sacs", 2_000)).await.unwrap();

        assert!(matches!(
            db.expenses(OTHER_TENANT).delete(&created.id).await,
            Err(DbError::NotFound { .. })
        ));
        repo.delete(&created.id).await.unwrap();
        assert!(repo.list(None).await.unwrap().is_empty());
    }
}

//! # Customer Repository
//!
//! Customers and their side of the credit ledger.
//!
//! ## Credit Balance
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  customers.current_credit == Σ sales.amount_remaining                  │
//! │                              WHERE customer_id = c                      │
//! │                                AND payment_status IN (partial, credit) │
//! │                                                                         │
//! │  maintained by:   record_sale()    += amount_remaining  ┐ same         │
//! │                   apply_payment()  -= amount            ┘ transaction  │
//! │                                                                         │
//! │  repaired by:     reconcile_credit()  recompute from the sales rows    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `current_credit` and `total_purchases` are never taken from the form
//! payload; only checkout, payments and reconciliation write them.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::sale::SALE_COLUMNS;
use crate::repository::{begin_write, log_rejection, new_id};
use boutik_core::settlement::outstanding_credit;
use boutik_core::validation::{validate_new_customer, validate_search_query};
use boutik_core::{CoreError, Customer, Money, NewCustomer, Sale};

pub(crate) const CUSTOMER_COLUMNS: &str = r#"
    id, tenant_id, name, phone, email, address,
    credit_limit, current_credit, total_purchases,
    created_at, updated_at, sync_version
"#;

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        CustomerRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    pub async fn insert(&self, new: &NewCustomer) -> DbResult<Customer> {
        validate_new_customer(new)?;

        let now = Utc::now();
        let customer = Customer {
            id: new_id(),
            tenant_id: self.tenant_id.clone(),
            name: new.name.trim().to_string(),
            phone: new.phone.clone(),
            email: new.email.clone(),
            address: new.address.clone(),
            credit_limit: new.credit_limit,
            current_credit: Money::zero(),
            total_purchases: Money::zero(),
            created_at: now,
            updated_at: now,
            sync_version: 0,
        };

        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, tenant_id, name, phone, email, address,
                credit_limit, current_credit, total_purchases,
                created_at, updated_at, sync_version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.tenant_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.credit_limit)
        .bind(customer.current_credit)
        .bind(customer.total_purchases)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .bind(customer.sync_version)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!(
            "SELECT {} FROM customers WHERE id = ? AND tenant_id = ?",
            CUSTOMER_COLUMNS
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Customers sorted by name, optionally matching `search` on name or
    /// phone.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<Customer>> {
        let search = match search {
            Some(q) => Some(validate_search_query(q)?.to_lowercase()).filter(|q| !q.is_empty()),
            None => None,
        };

        let sql = format!(
            r#"
            SELECT {}
            FROM customers
            WHERE tenant_id = ?1
              AND (?2 IS NULL
                   OR instr(lower(name), ?2) > 0
                   OR instr(COALESCE(phone, ''), ?2) > 0)
            ORDER BY name
            "#,
            CUSTOMER_COLUMNS
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(&self.tenant_id)
            .bind(search)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Customers currently owing money, largest balance first.
    pub async fn list_debtors(&self) -> DbResult<Vec<Customer>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM customers
            WHERE tenant_id = ? AND current_credit > 0
            ORDER BY current_credit DESC, name
            "#,
            CUSTOMER_COLUMNS
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Updates contact details and credit limit.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - No such customer for this tenant
    /// * `CoreError::ConcurrentModification` - Stale `expected_version`
    pub async fn update(
        &self,
        id: &str,
        expected_version: i64,
        update: &NewCustomer,
    ) -> DbResult<Customer> {
        validate_new_customer(update)?;
        debug!(id = %id, expected_version, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?,
                phone = ?,
                email = ?,
                address = ?,
                credit_limit = ?,
                updated_at = ?,
                sync_version = sync_version + 1
            WHERE id = ? AND tenant_id = ? AND sync_version = ?
            "#,
        )
        .bind(update.name.trim())
        .bind(&update.phone)
        .bind(&update.email)
        .bind(&update.address)
        .bind(update.credit_limit)
        .bind(Utc::now())
        .bind(id)
        .bind(&self.tenant_id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(id).await? {
                Some(_) => Err(DbError::concurrent("Customer", id)),
                None => Err(DbError::not_found("Customer", id)),
            };
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Deletes a customer who owes nothing.
    ///
    /// Their past sales stay, detached from the customer.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query(
            "DELETE FROM customers WHERE id = ? AND tenant_id = ? AND current_credit = 0",
        )
        .bind(id)
        .bind(&self.tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let err = match self.get_by_id(id).await? {
                Some(customer) => DbError::Core(CoreError::OutstandingCredit {
                    customer: customer.name,
                    outstanding: customer.current_credit.minor(),
                }),
                None => DbError::not_found("Customer", id),
            };
            log_rejection("delete_customer", &err);
            return Err(err);
        }

        Ok(())
    }

    /// The customer's partial and credit sales still owing, oldest first.
    pub async fn outstanding_sales(&self, customer_id: &str) -> DbResult<Vec<Sale>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM sales
            WHERE tenant_id = ? AND customer_id = ?
              AND payment_status IN ('partial', 'credit') AND amount_remaining > 0
            ORDER BY created_at, sale_number
            "#,
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(&self.tenant_id)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Recomputes `current_credit` from the customer's outstanding sales
    /// and stores it.
    ///
    /// Returns the customer as stored afterwards. A corrected balance is
    /// logged as a warning, since checkout and payments keep it exact.
    pub async fn reconcile_credit(&self, customer_id: &str) -> DbResult<Customer> {
        let mut tx = begin_write(&self.pool).await?;

        let sql = format!(
            "SELECT {} FROM customers WHERE id = ? AND tenant_id = ?",
            CUSTOMER_COLUMNS
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(customer_id)
            .bind(&self.tenant_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", customer_id))?;

        let sql = format!(
            r#"
            SELECT {}
            FROM sales
            WHERE tenant_id = ? AND customer_id = ?
              AND payment_status IN ('partial', 'credit') AND amount_remaining > 0
            "#,
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(&self.tenant_id)
            .bind(customer_id)
            .fetch_all(&mut *tx)
            .await?;

        let expected = outstanding_credit(&sales);
        if expected == customer.current_credit {
            debug!(id = %customer_id, credit = expected.minor(), "Customer credit consistent");
            tx.commit().await?;
            return Ok(customer);
        }

        warn!(
            id = %customer_id,
            stored = customer.current_credit.minor(),
            expected = expected.minor(),
            "Customer credit drifted, correcting"
        );

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE customers
            SET current_credit = ?, updated_at = ?, sync_version = sync_version + 1
            WHERE id = ? AND tenant_id = ?
            "#,
        )
        .bind(expected)
        .bind(now)
        .bind(customer_id)
        .bind(&self.tenant_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(id = %customer_id, credit = expected.minor(), "Customer credit reconciled");

        Ok(Customer {
            current_credit: expected,
            updated_at: now,
            sync_version: customer.sync_version + 1,
            ..customer
        })
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE tenant_id = ?")
            .bind(&self.tenant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

//! # Payment Repository
//!
//! Payments against partial and credit sales.
//!
//! ## Applying a Payment
//! ```text
//! BEGIN IMMEDIATE                      lock held past busy_timeout
//!                                      → ConcurrentModification
//!   load sale                          missing → SaleNotFound
//!   PaymentApplication::apply()        overdraw / settled / credit → rejected
//!   UPDATE sales ... WHERE sync_version = read version
//!                                      0 rows → ConcurrentModification
//!   UPDATE customers SET current_credit -= amount
//!   INSERT payments
//! COMMIT
//! ```
//!
//! Writers take the lock at `BEGIN`, so two payments on the same balance
//! apply one after the other, each against the balance the other left.
//! The sale row is still compared-and-set on `sync_version`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::sale::SALE_COLUMNS;
use crate::repository::{begin_write, log_rejection, new_id};
use boutik_core::settlement::{PaymentApplication, PaymentRequest};
use boutik_core::validation::{validate_optional_text, validate_uuid};
use boutik_core::{CoreError, Payment, Sale};

pub(crate) const PAYMENT_COLUMNS: &str = r#"
    id, sale_id, amount, payment_method, notes, recorded_by, created_at
"#;

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        PaymentRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    /// Applies a payment and returns the sale as it now stands.
    ///
    /// ## Errors
    /// * `CoreError::SaleNotFound` - No such sale for this tenant
    /// * `CoreError::InvalidPaymentAmount` - Zero, negative or above the balance
    /// * `CoreError::SaleAlreadySettled` - Nothing left to pay
    /// * `CoreError::ConcurrentModification` - Another payment landed first
    pub async fn apply_payment(&self, request: &PaymentRequest) -> DbResult<Sale> {
        let result = self.apply_payment_inner(request).await;
        if let Err(err) = &result {
            log_rejection("apply_payment", err);
        }
        result
    }

    async fn apply_payment_inner(&self, request: &PaymentRequest) -> DbResult<Sale> {
        validate_uuid("sale_id", &request.sale_id)?;
        validate_optional_text("notes", request.notes.as_deref(), 500)?;
        debug!(
            sale_id = %request.sale_id,
            amount = request.amount.minor(),
            method = request.payment_method.as_str(),
            "Applying payment"
        );

        let mut tx = begin_write(&self.pool).await?;

        let sql = format!(
            "SELECT {} FROM sales WHERE id = ? AND tenant_id = ?",
            SALE_COLUMNS
        );
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(&request.sale_id)
            .bind(&self.tenant_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(request.sale_id.clone()))?;

        let applied = PaymentApplication::apply(&sale, request.amount, request.payment_method)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                amount_paid = ?,
                amount_remaining = ?,
                payment_status = ?,
                updated_at = ?,
                sync_version = sync_version + 1
            WHERE id = ? AND tenant_id = ? AND sync_version = ?
            "#,
        )
        .bind(applied.amount_paid)
        .bind(applied.amount_remaining)
        .bind(applied.payment_status)
        .bind(now)
        .bind(&sale.id)
        .bind(&self.tenant_id)
        .bind(sale.sync_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::concurrent("Sale", &sale.id));
        }

        if let Some(customer_id) = &sale.customer_id {
            sqlx::query(
                r#"
                UPDATE customers SET
                    current_credit = current_credit - ?,
                    updated_at = ?,
                    sync_version = sync_version + 1
                WHERE id = ? AND tenant_id = ?
                "#,
            )
            .bind(applied.amount)
            .bind(now)
            .bind(customer_id)
            .bind(&self.tenant_id)
            .execute(&mut *tx)
            .await?;
        }

        let payment = Payment {
            id: new_id(),
            sale_id: sale.id.clone(),
            amount: applied.amount,
            payment_method: request.payment_method,
            notes: request.notes.clone(),
            recorded_by: request.recorded_by.clone(),
            created_at: now,
        };
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, sale_id, amount, payment_method, notes, recorded_by, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(payment.amount)
        .bind(payment.payment_method)
        .bind(&payment.notes)
        .bind(&payment.recorded_by)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            amount = applied.amount.minor(),
            remaining = applied.amount_remaining.minor(),
            status = applied.payment_status.as_str(),
            "Payment applied"
        );

        Ok(Sale {
            amount_paid: applied.amount_paid,
            amount_remaining: applied.amount_remaining,
            payment_status: applied.payment_status,
            updated_at: now,
            sync_version: sale.sync_version + 1,
            ..sale
        })
    }

    /// Payments of one sale, oldest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.id, p.sale_id, p.amount, p.payment_method, p.notes, p.recorded_by,
                   p.created_at
            FROM payments p
            JOIN sales s ON s.id = p.sale_id
            WHERE p.sale_id = ? AND s.tenant_id = ?
            ORDER BY p.created_at, p.rowid
            "#,
        )
        .bind(sale_id)
        .bind(&self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use boutik_core::settlement::{outstanding_credit, CheckoutLine, CheckoutRequest};
    use boutik_core::{Money, PaymentMethod, PaymentStatus};

    /// A 5000 credit sale to a fresh customer; returns (sale id, customer id).
    async fn credit_sale(db: &crate::Database) -> (String, String) {
        let product = seed_product(db, "Pagne wax", 5000, 10).await;
        let customer = seed_customer(db, "Fatou Diallo", 0).await;
        let request = CheckoutRequest::new(
            vec![CheckoutLine {
                product_id: product.id,
                unit_price: Money::from_minor(5000),
                quantity: 1,
            }],
            PaymentMethod::Credit,
        )
        .with_customer(customer.id.clone());

        let receipt = db.sales(TENANT).record_sale(&request).await.unwrap();
        (receipt.sale_id, customer.id)
    }

    async fn credit_of(db: &crate::Database, customer_id: &str) -> Money {
        db.customers(TENANT)
            .get_by_id(customer_id)
            .await
            .unwrap()
            .unwrap()
            .current_credit
    }

    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let db = test_db().await;
        let (sale_id, customer_id) = credit_sale(&db).await;
        let repo = db.payments(TENANT);

        let sale = repo
            .apply_payment(&PaymentRequest::new(
                &sale_id,
                Money::from_minor(2000),
                PaymentMethod::OrangeMoney,
            ))
            .await
            .unwrap();
        assert_eq!(sale.payment_status, PaymentStatus::Partial);
        assert_eq!(sale.amount_remaining, Money::from_minor(3000));
        assert_eq!(credit_of(&db, &customer_id).await, Money::from_minor(3000));

        let sale = repo
            .apply_payment(&PaymentRequest::new(
                &sale_id,
                Money::from_minor(3000),
                PaymentMethod::Cash,
            ))
            .await
            .unwrap();
        assert_eq!(sale.payment_status, PaymentStatus::Completed);
        assert_eq!(sale.amount_paid, Money::from_minor(5000));
        assert_eq!(credit_of(&db, &customer_id).await, Money::zero());

        let payments = repo.list_for_sale(&sale_id).await.unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].amount, Money::from_minor(2000));
    }

    #[tokio::test]
    async fn test_overdraw_rejected_without_mutation() {
        let db = test_db().await;
        let (sale_id, customer_id) = credit_sale(&db).await;

        let result = db
            .payments(TENANT)
            .apply_payment(&PaymentRequest::new(
                &sale_id,
                Money::from_minor(6000),
                PaymentMethod::Cash,
            ))
            .await;
        assert!(matches!(
            result,
            Err(DbError::Core(CoreError::InvalidPaymentAmount { .. }))
        ));

        let sale = db.sales(TENANT).get_by_id(&sale_id).await.unwrap().unwrap();
        assert_eq!(sale.amount_remaining, Money::from_minor(5000));
        assert_eq!(credit_of(&db, &customer_id).await, Money::from_minor(5000));
        assert!(db.payments(TENANT).list_for_sale(&sale_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settled_sale_refuses_payment() {
        let db = test_db().await;
        let (sale_id, _) = credit_sale(&db).await;
        let repo = db.payments(TENANT);

        repo.apply_payment(&PaymentRequest::new(
            &sale_id,
            Money::from_minor(5000),
            PaymentMethod::Cash,
        ))
        .await
        .unwrap();

        let again = repo
            .apply_payment(&PaymentRequest::new(
                &sale_id,
                Money::from_minor(1),
                PaymentMethod::Cash,
            ))
            .await;
        assert!(matches!(
            again,
            Err(DbError::Core(CoreError::SaleAlreadySettled(_)))
        ));
    }

    #[tokio::test]
    async fn test_credit_ledger_matches_outstanding_sales() {
        let db = test_db().await;
        let (first, customer_id) = credit_sale(&db).await;

        // Second sale for the same customer
        let product = seed_product(&db, "Savon", 1200, 10).await;
        let request = CheckoutRequest::new(
            vec![CheckoutLine {
                product_id: product.id,
                unit_price: Money::from_minor(1200),
                quantity: 1,
            }],
            PaymentMethod::Credit,
        )
        .with_customer(customer_id.clone());
        db.sales(TENANT).record_sale(&request).await.unwrap();

        db.payments(TENANT)
            .apply_payment(&PaymentRequest::new(
                &first,
                Money::from_minor(1500),
                PaymentMethod::MoovMoney,
            ))
            .await
            .unwrap();

        let outstanding = db.customers(TENANT).outstanding_sales(&customer_id).await.unwrap();
        assert_eq!(outstanding_credit(&outstanding), Money::from_minor(4700));
        assert_eq!(credit_of(&db, &customer_id).await, Money::from_minor(4700));
    }

    #[tokio::test]
    async fn test_other_tenant_cannot_pay() {
        let db = test_db().await;
        let (sale_id, _) = credit_sale(&db).await;

        let result = db
            .payments(OTHER_TENANT)
            .apply_payment(&PaymentRequest::new(
                &sale_id,
                Money::from_minor(1000),
                PaymentMethod::Cash,
            ))
            .await;
        assert!(matches!(result, Err(DbError::Core(CoreError::SaleNotFound(_)))));
    }

    #[tokio::test]
    async fn test_credit_method_not_accepted_for_payment() {
        let db = test_db().await;
        let (sale_id, _) = credit_sale(&db).await;

        let result = db
            .payments(TENANT)
            .apply_payment(&PaymentRequest::new(
                &sale_id,
                Money::from_minor(1000),
                PaymentMethod::Credit,
            ))
            .await;
        assert!(matches!(result, Err(DbError::Core(CoreError::Validation(_)))));
    }

    #[tokio::test]
    async fn test_concurrent_payments_on_one_sale_all_land() {
        let (db, path) = file_db(|config| config.max_connections(4)).await;
        let (sale_id, customer_id) = credit_sale(&db).await;
        let first = db.payments(TENANT);
        let second = db.payments(TENANT);
        let payment = PaymentRequest::new(&sale_id, Money::from_minor(100), PaymentMethod::Cash);

        for _ in 0..10 {
            let (a, b) = tokio::join!(first.apply_payment(&payment), second.apply_payment(&payment));
            a.unwrap();
            b.unwrap();
        }

        let sale = db.sales(TENANT).get_by_id(&sale_id).await.unwrap().unwrap();
        assert_eq!(sale.amount_paid, Money::from_minor(2000));
        assert_eq!(sale.amount_remaining, Money::from_minor(3000));
        assert_eq!(credit_of(&db, &customer_id).await, Money::from_minor(3000));
        assert_eq!(first.list_for_sale(&sale_id).await.unwrap().len(), 20);

        remove_file_db(db, path).await;
    }

    #[tokio::test]
    async fn test_write_lock_timeout_is_concurrent_modification() {
        let (db, path) = file_db(|config| {
            config
                .max_connections(2)
                .connect_timeout(std::time::Duration::from_millis(200))
        })
        .await;
        let (sale_id, customer_id) = credit_sale(&db).await;
        let payment = PaymentRequest::new(&sale_id, Money::from_minor(1000), PaymentMethod::Cash);

        let holder = begin_write(db.pool()).await.unwrap();
        let result = db.payments(TENANT).apply_payment(&payment).await;
        assert!(matches!(
            result,
            Err(DbError::Core(CoreError::ConcurrentModification { .. }))
        ));
        holder.rollback().await.unwrap();

        let sale = db.payments(TENANT).apply_payment(&payment).await.unwrap();
        assert_eq!(sale.amount_remaining, Money::from_minor(4000));
        assert_eq!(credit_of(&db, &customer_id).await, Money::from_minor(4000));

        remove_file_db(db, path).await;
    }
}

//! # Sale Repository
//!
//! Checkout and sale history.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     record_sale(&CheckoutRequest)                       │
//! │                                                                         │
//! │  validated_lines()            (no I/O, rejects empty / malformed)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE ───────────────────────────────────────────────────┐  │
//! │  │ load products         missing/inactive → ProductNotFound         │  │
//! │  │                       short          → InsufficientStock         │  │
//! │  │ SaleTotals + Settlement                                          │  │
//! │  │ load customer         balance left without one → CustomerRequired│  │
//! │  │ credit limit          (policy)       → CreditLimitExceeded       │  │
//! │  │ next sale number      SALE-YYYYMMDD-NNNN                         │  │
//! │  │ INSERT sales, sale_items                                         │  │
//! │  │ UPDATE products SET stock -= qty  WHERE stock >= qty             │  │
//! │  │ INSERT stock_movements (type sale, reference = sale id)          │  │
//! │  │ UPDATE customers SET total_purchases += total,                   │  │
//! │  │                      current_credit  += amount_remaining         │  │
//! │  COMMIT ────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Any error drops the transaction: nothing of the sale is visible.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are never deleted or edited after checkout; only payments move
//! their balance (see `PaymentRepository`).

use chrono::Utc;
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::customer::CUSTOMER_COLUMNS;
use crate::repository::payment::PAYMENT_COLUMNS;
use crate::repository::product::PRODUCT_COLUMNS;
use crate::repository::settings::SettingsRepository;
use crate::repository::{begin_write, log_rejection, new_id};
use boutik_core::export::Invoice;
use boutik_core::report::DateRange;
use boutik_core::settlement::{
    check_credit_limit, format_sale_number, quantities_by_product, sale_number_prefix,
    CheckoutPolicy, CheckoutRequest, SaleReceipt, SaleTotals, Settlement,
};
use boutik_core::{
    CoreError, Customer, MovementType, Payment, Product, Sale, SaleItem, StoreSettings, TaxRate,
};

pub(crate) const SALE_COLUMNS: &str = r#"
    id, tenant_id, sale_number, customer_id, cashier_id,
    subtotal, tax, discount, total,
    payment_method, payment_status, amount_paid, amount_remaining,
    notes, created_at, updated_at, sync_version
"#;

const SALE_ITEM_COLUMNS: &str = r#"
    id, sale_id, product_id, product_name, unit_price, quantity, subtotal, created_at
"#;

/// A sale with everything the invoice screen shows.
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payments: Vec<Payment>,
    pub customer_name: Option<String>,
}

impl SaleDetail {
    /// Renders the printable invoice with the store's header and currency.
    pub fn invoice(&self, settings: &StoreSettings) -> String {
        Invoice {
            settings,
            sale: &self.sale,
            items: &self.items,
            payments: &self.payments,
            customer_name: self.customer_name.as_deref(),
        }
        .render()
    }
}

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    tenant_id: String,
    policy: CheckoutPolicy,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str, policy: CheckoutPolicy) -> Self {
        SaleRepository {
            pool,
            tenant_id: tenant_id.to_string(),
            policy,
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Records a sale atomically: the sale and its items, the stock
    /// decrements with their movements, and the customer's ledger update
    /// all commit together or not at all.
    ///
    /// ## Errors
    /// * `CoreError::EmptyCart` / `CoreError::Validation` - Malformed request
    /// * `CoreError::ProductNotFound` - Unknown or deactivated product
    /// * `CoreError::InsufficientStock` - A line asks for more than is on hand
    /// * `CoreError::CustomerNotFound` - `customer_id` not in this tenant
    /// * `CoreError::CustomerRequired` - Balance left without a customer
    /// * `CoreError::CreditLimitExceeded` - Policy on and limit passed
    /// * `CoreError::ConcurrentModification` - Write lock not obtained within
    ///   the busy timeout
    pub async fn record_sale(&self, request: &CheckoutRequest) -> DbResult<SaleReceipt> {
        let result = self.record_sale_inner(request).await;
        if let Err(err) = &result {
            log_rejection("record_sale", err);
        }
        result
    }

    async fn record_sale_inner(&self, request: &CheckoutRequest) -> DbResult<SaleReceipt> {
        let lines = request.validated_lines()?;
        debug!(
            lines = lines.len(),
            method = request.payment_method.as_str(),
            customer = ?request.customer_id,
            "Recording sale"
        );

        let mut tx = begin_write(&self.pool).await?;

        // Products, checked against the total asked for across lines
        let requested = quantities_by_product(&lines)?;
        let mut products: Vec<Product> = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = self
                .fetch_product(&mut tx, &line.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let wanted = requested
                .iter()
                .find(|(id, _)| *id == product.id)
                .map_or(line.quantity, |(_, quantity)| *quantity);
            if !product.can_sell(wanted) {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock_quantity,
                    requested: wanted,
                }
                .into());
            }
            products.push(product);
        }

        let totals = SaleTotals::compute(
            &lines,
            request.discount,
            TaxRate::from_bps(request.tax_rate_bps),
        )?;
        let settlement =
            Settlement::settle(totals.total, request.payment_method, request.amount_tendered)?;

        // Customer carrying the balance
        let customer = match &request.customer_id {
            Some(id) => Some(
                self.fetch_customer(&mut tx, id)
                    .await?
                    .ok_or_else(|| CoreError::CustomerNotFound(id.clone()))?,
            ),
            None => None,
        };
        if settlement.requires_customer() && customer.is_none() {
            return Err(CoreError::CustomerRequired.into());
        }
        if let Some(customer) = &customer {
            if self.policy.enforce_credit_limit {
                check_credit_limit(customer, settlement.amount_remaining)?;
            }
        }

        let now = Utc::now();
        let sale_number = self.next_sale_number(&mut tx, now.date_naive()).await?;

        let sale = Sale {
            id: new_id(),
            tenant_id: self.tenant_id.clone(),
            sale_number,
            customer_id: customer.as_ref().map(|c| c.id.clone()),
            cashier_id: request.cashier_id.clone(),
            subtotal: totals.subtotal,
            tax: totals.tax,
            discount: totals.discount,
            total: totals.total,
            payment_method: request.payment_method,
            payment_status: settlement.payment_status,
            amount_paid: settlement.amount_paid,
            amount_remaining: settlement.amount_remaining,
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
            sync_version: 0,
        };
        insert_sale(&mut tx, &sale).await?;

        for (line, product) in lines.iter().zip(&products) {
            let item = SaleItem {
                id: new_id(),
                sale_id: sale.id.clone(),
                product_id: Some(product.id.clone()),
                product_name: product.name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                subtotal: line.unit_price.checked_mul_quantity(line.quantity)?,
                created_at: now,
            };
            insert_item(&mut tx, &item).await?;

            self.decrement_stock(&mut tx, product, line.quantity).await?;

            sqlx::query(
                r#"
                INSERT INTO stock_movements (
                    id, tenant_id, product_id, movement_type, quantity,
                    reference_id, notes, user_id, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?)
                "#,
            )
            .bind(new_id())
            .bind(&self.tenant_id)
            .bind(&product.id)
            .bind(MovementType::Sale)
            .bind(-line.quantity)
            .bind(&sale.id)
            .bind(&request.cashier_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(customer) = &customer {
            sqlx::query(
                r#"
                UPDATE customers SET
                    total_purchases = total_purchases + ?,
                    current_credit = current_credit + ?,
                    updated_at = ?,
                    sync_version = sync_version + 1
                WHERE id = ? AND tenant_id = ?
                "#,
            )
            .bind(sale.total)
            .bind(sale.amount_remaining)
            .bind(now)
            .bind(&customer.id)
            .bind(&self.tenant_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            id = %sale.id,
            sale_number = %sale.sale_number,
            total = sale.total.minor(),
            status = sale.payment_status.as_str(),
            "Sale recorded"
        );

        Ok(SaleReceipt {
            sale_id: sale.id,
            sale_number: sale.sale_number,
            total: sale.total,
            amount_paid: sale.amount_paid,
            amount_remaining: sale.amount_remaining,
            change_due: settlement.change_due,
            payment_status: sale.payment_status,
        })
    }

    async fn fetch_product(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE id = ? AND tenant_id = ?",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&self.tenant_id)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(product)
    }

    async fn fetch_customer(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
    ) -> DbResult<Option<Customer>> {
        let sql = format!(
            "SELECT {} FROM customers WHERE id = ? AND tenant_id = ?",
            CUSTOMER_COLUMNS
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(&self.tenant_id)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(customer)
    }

    /// The day's next number: count of the tenant's sales sharing today's
    /// prefix, plus one. Read under the write lock, so checkouts number in
    /// commit order; `UNIQUE (tenant_id, sale_number)` backs it up.
    async fn next_sale_number(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        date: chrono::NaiveDate,
    ) -> DbResult<String> {
        let prefix = sale_number_prefix(date);
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sales WHERE tenant_id = ? AND substr(sale_number, 1, ?) = ?",
        )
        .bind(&self.tenant_id)
        .bind(prefix.len() as i64)
        .bind(&prefix)
        .fetch_one(&mut **tx)
        .await?;

        let sequence = u32::try_from(count + 1)
            .map_err(|_| DbError::Internal("sale sequence overflow".to_string()))?;
        Ok(format_sale_number(date, sequence))
    }

    /// Guarded decrement; zero rows means the stock moved since it was read.
    async fn decrement_stock(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        product: &Product,
        quantity: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                stock_quantity = stock_quantity - ?1,
                updated_at = ?2,
                sync_version = sync_version + 1
            WHERE id = ?3 AND tenant_id = ?4 AND stock_quantity >= ?1
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(&product.id)
        .bind(&self.tenant_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock_quantity,
                requested: quantity,
            }
            .into());
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE id = ? AND tenant_id = ?",
            SALE_COLUMNS
        );
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Lines of a sale in insertion order.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM sale_items
            WHERE sale_id = ?
              AND EXISTS (SELECT 1 FROM sales s WHERE s.id = sale_items.sale_id AND s.tenant_id = ?)
            ORDER BY rowid
            "#,
            SALE_ITEM_COLUMNS
        );
        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Most recent sales first.
    pub async fn list(&self, limit: i64) -> DbResult<Vec<Sale>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM sales
            WHERE tenant_id = ?
            ORDER BY created_at DESC, sale_number DESC
            LIMIT ?
            "#,
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(&self.tenant_id)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Sales created within `range` (whole UTC days), oldest first.
    pub async fn list_in_range(&self, range: &DateRange) -> DbResult<Vec<Sale>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM sales
            WHERE tenant_id = ? AND created_at >= ? AND created_at < ?
            ORDER BY created_at, sale_number
            "#,
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(&self.tenant_id)
            .bind(range.start_at())
            .bind(range.end_before())
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Sale with its items, payments and customer name.
    pub async fn detail(&self, id: &str) -> DbResult<SaleDetail> {
        let sale = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::Core(CoreError::SaleNotFound(id.to_string())))?;
        let items = self.items(id).await?;

        let sql = format!(
            "SELECT {} FROM payments WHERE sale_id = ? ORDER BY created_at, rowid",
            PAYMENT_COLUMNS
        );
        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        let customer_name = match &sale.customer_id {
            Some(customer_id) => {
                sqlx::query_scalar::<_, String>(
                    "SELECT name FROM customers WHERE id = ? AND tenant_id = ?",
                )
                .bind(customer_id)
                .bind(&self.tenant_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => None,
        };

        Ok(SaleDetail {
            sale,
            items,
            payments,
            customer_name,
        })
    }

    /// Printable invoice using the tenant's saved settings.
    pub async fn invoice(&self, id: &str) -> DbResult<String> {
        let detail = self.detail(id).await?;
        let settings = SettingsRepository::new(self.pool.clone(), &self.tenant_id)
            .get()
            .await?;
        Ok(detail.invoice(&settings))
    }
}

async fn insert_sale(tx: &mut Transaction<'_, Sqlite>, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, tenant_id, sale_number, customer_id, cashier_id,
            subtotal, tax, discount, total,
            payment_method, payment_status, amount_paid, amount_remaining,
            notes, created_at, updated_at, sync_version
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13,
            ?14, ?15, ?16, ?17
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.tenant_id)
    .bind(&sale.sale_number)
    .bind(&sale.customer_id)
    .bind(&sale.cashier_id)
    .bind(sale.subtotal)
    .bind(sale.tax)
    .bind(sale.discount)
    .bind(sale.total)
    .bind(sale.payment_method)
    .bind(sale.payment_status)
    .bind(sale.amount_paid)
    .bind(sale.amount_remaining)
    .bind(&sale.notes)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .bind(sale.sync_version)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_item(tx: &mut Transaction<'_, Sqlite>, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, product_name, unit_price, quantity, subtotal, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(item.unit_price)
    .bind(item.quantity)
    .bind(item.subtotal)
    .bind(item.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

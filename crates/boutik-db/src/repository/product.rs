//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD with optimistic concurrency on `sync_version`
//! - Listing by category and name/SKU/barcode search
//! - Low-stock listing
//!
//! ## Stock Is Not Edited Here
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert()         opening stock_quantity                               │
//! │  update()         name, price, cost, tax, threshold... NOT stock       │
//! │                                                                         │
//! │  stock changes only through:                                           │
//! │    StockRepository::apply_movement()   (in / out)                      │
//! │    SaleRepository::record_sale()       (sale)                          │
//! │  both of which write a stock_movements row in the same transaction     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use boutik_core::stock::low_stock;
use boutik_core::validation::{
    validate_new_product, validate_product_update, validate_search_query, validate_uuid,
};
use boutik_core::{NewProduct, Product, ProductUpdate};

pub(crate) const PRODUCT_COLUMNS: &str = r#"
    id, tenant_id, category_id, supplier_id,
    name, description, sku, barcode,
    price, cost_price, tax_rate_bps,
    stock_quantity, min_stock_level, is_active,
    created_at, updated_at, sync_version
"#;

/// Listing filter for the product screen.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<String>,
    /// Case-insensitive match on name, SKU or barcode.
    pub search: Option<String>,
    pub include_inactive: bool,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        ProductRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated fields
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown category or supplier
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        validate_new_product(new)?;

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            tenant_id: self.tenant_id.clone(),
            category_id: new.category_id.clone(),
            supplier_id: new.supplier_id.clone(),
            name: new.name.trim().to_string(),
            description: new.description.clone(),
            sku: new.sku.clone(),
            barcode: new.barcode.clone(),
            price: new.price,
            cost_price: new.cost_price,
            tax_rate_bps: new.tax_rate_bps,
            stock_quantity: new.stock_quantity,
            min_stock_level: new.min_stock_level,
            is_active: true,
            created_at: now,
            updated_at: now,
            sync_version: 0,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, category_id, supplier_id,
                name, description, sku, barcode,
                price, cost_price, tax_rate_bps,
                stock_quantity, min_stock_level, is_active,
                created_at, updated_at, sync_version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(product.price)
        .bind(product.cost_price)
        .bind(product.tax_rate_bps)
        .bind(product.stock_quantity)
        .bind(product.min_stock_level)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.sync_version)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found for this tenant
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE id = ? AND tenant_id = ?",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists products sorted by name.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        let search = match filter.search.as_deref() {
            Some(q) => Some(validate_search_query(q)?.to_lowercase()).filter(|q| !q.is_empty()),
            None => None,
        };

        debug!(
            category = ?filter.category_id,
            search = ?search,
            "Listing products"
        );

        let sql = format!(
            r#"
            SELECT {}
            FROM products
            WHERE tenant_id = ?1
              AND (?2 IS NULL OR category_id = ?2)
              AND (?3 IS NULL
                   OR instr(lower(name), ?3) > 0
                   OR instr(lower(COALESCE(sku, '')), ?3) > 0
                   OR instr(lower(COALESCE(barcode, '')), ?3) > 0)
              AND (?4 OR is_active = 1)
            ORDER BY name
            "#,
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(&self.tenant_id)
            .bind(&filter.category_id)
            .bind(search)
            .bind(filter.include_inactive)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Updates a product's catalog fields.
    ///
    /// `expected_version` is the `sync_version` the caller read; a product
    /// changed since then is not overwritten.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - No such product for this tenant
    /// * `CoreError::ConcurrentModification` - Stale `expected_version`
    pub async fn update(
        &self,
        id: &str,
        expected_version: i64,
        update: &ProductUpdate,
    ) -> DbResult<Product> {
        validate_product_update(update)?;

        debug!(id = %id, expected_version, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                category_id = ?,
                supplier_id = ?,
                name = ?,
                description = ?,
                sku = ?,
                barcode = ?,
                price = ?,
                cost_price = ?,
                tax_rate_bps = ?,
                min_stock_level = ?,
                updated_at = ?,
                sync_version = sync_version + 1
            WHERE id = ? AND tenant_id = ? AND sync_version = ?
            "#,
        )
        .bind(&update.category_id)
        .bind(&update.supplier_id)
        .bind(update.name.trim())
        .bind(&update.description)
        .bind(&update.sku)
        .bind(&update.barcode)
        .bind(update.price)
        .bind(update.cost_price)
        .bind(update.tax_rate_bps)
        .bind(update.min_stock_level)
        .bind(Utc::now())
        .bind(id)
        .bind(&self.tenant_id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(id).await? {
                Some(_) => Err(DbError::concurrent("Product", id)),
                None => Err(DbError::not_found("Product", id)),
            };
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// The product disappears from the till and from low-stock alerts but
    /// keeps its cost for the reports of past sales.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = 0, updated_at = ?, sync_version = sync_version + 1
            WHERE id = ? AND tenant_id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .bind(&self.tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product row.
    ///
    /// Sale items keep their name and price snapshot with a null
    /// `product_id`, and from then on count zero purchase cost.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        validate_uuid("id", id)?;
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(&self.tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Active products at or below their low-stock threshold, lowest
    /// stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = self.list(&ProductFilter::default()).await?;
        Ok(low_stock(&products).into_iter().cloned().collect())
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE tenant_id = ? AND is_active = 1",
        )
        .bind(&self.tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

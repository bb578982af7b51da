//! # Stock Repository
//!
//! Manual stock movements and the movement history.
//!
//! Every change of `products.stock_quantity` has a matching row in
//! `stock_movements`: checkout writes `sale` rows, this repository writes
//! `in` and `out` rows. The update is guarded with
//! `stock_quantity + delta >= 0`, so stock never goes negative even if it
//! moved after the product was read.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::product::PRODUCT_COLUMNS;
use crate::repository::{begin_write, log_rejection, new_id};
use boutik_core::stock::{plan_movement, StockMovementRequest};
use boutik_core::{CoreError, Product, StockMovement};

const MOVEMENT_COLUMNS: &str = r#"
    id, tenant_id, product_id, movement_type, quantity,
    reference_id, notes, user_id, created_at
"#;

#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl StockRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        StockRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    /// Applies an `in` or `out` movement and records it.
    ///
    /// ## Errors
    /// * `CoreError::Validation` - `sale` type, non-positive quantity
    /// * `CoreError::ProductNotFound` - Unknown product for this tenant
    /// * `CoreError::InsufficientStock` - `out` larger than stock on hand
    pub async fn apply_movement(&self, request: &StockMovementRequest) -> DbResult<StockMovement> {
        let result = self.apply_movement_inner(request).await;
        if let Err(err) = &result {
            log_rejection("apply_movement", err);
        }
        result
    }

    async fn apply_movement_inner(&self, request: &StockMovementRequest) -> DbResult<StockMovement> {
        let delta = request.validate()?;
        debug!(
            product_id = %request.product_id,
            movement = ?request.movement_type,
            delta,
            "Applying stock movement"
        );

        let mut tx = begin_write(&self.pool).await?;

        let sql = format!(
            "SELECT {} FROM products WHERE id = ? AND tenant_id = ?",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(&request.product_id)
            .bind(&self.tenant_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

        let change = plan_movement(&product, delta)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                stock_quantity = stock_quantity + ?1,
                updated_at = ?2,
                sync_version = sync_version + 1
            WHERE id = ?3 AND tenant_id = ?4 AND stock_quantity + ?1 >= 0
            "#,
        )
        .bind(change.delta)
        .bind(now)
        .bind(&product.id)
        .bind(&self.tenant_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::InsufficientStock {
                product: product.name,
                available: product.stock_quantity,
                requested: -change.delta,
            }
            .into());
        }

        let movement = StockMovement {
            id: new_id(),
            tenant_id: self.tenant_id.clone(),
            product_id: Some(product.id.clone()),
            movement_type: request.movement_type,
            quantity: change.delta,
            reference_id: None,
            notes: request.notes.clone(),
            user_id: request.user_id.clone(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, tenant_id, product_id, movement_type, quantity,
                reference_id, notes, user_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.tenant_id)
        .bind(&movement.product_id)
        .bind(movement.movement_type)
        .bind(movement.quantity)
        .bind(&movement.reference_id)
        .bind(&movement.notes)
        .bind(&movement.user_id)
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            product = %product.name,
            delta = change.delta,
            stock = change.new_quantity,
            "Stock updated"
        );

        Ok(movement)
    }

    /// Movements of one product, newest first.
    pub async fn history(&self, product_id: &str) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM stock_movements
            WHERE tenant_id = ? AND product_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
            MOVEMENT_COLUMNS
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(&self.tenant_id)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Latest movements across all products.
    pub async fn list(&self, limit: i64) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM stock_movements
            WHERE tenant_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
            MOVEMENT_COLUMNS
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(&self.tenant_id)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::test_support::*;
    use boutik_core::MovementType;

    #[tokio::test]
    async fn test_restock_and_loss() {
        let db = test_db().await;
        let sugar = seed_product(&db, "Sucre 1kg", 800, 3).await;
        let repo = db.stock(TENANT);

        let restock = repo
            .apply_movement(&StockMovementRequest::new(&sugar.id, MovementType::In, 12))
            .await
            .unwrap();
        assert_eq!(restock.quantity, 12);

        let mut loss = StockMovementRequest::new(&sugar.id, MovementType::Out, 2);
        loss.notes = Some("Sac déchiré".to_string());
        let loss = repo.apply_movement(&loss).await.unwrap();
        assert_eq!(loss.quantity, -2);

        let product = db.products(TENANT).get_by_id(&sugar.id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 13);

        let history = repo.history(&sugar.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].movement_type, MovementType::Out);
        assert_eq!(history[0].notes.as_deref(), Some("Sac déchiré"));
    }

    #[tokio::test]
    async fn test_out_beyond_stock_rejected() {
        let db = test_db().await;
        let sugar = seed_product(&db, "Sucre 1kg", 800, 3).await;

        let result = db
            .stock(TENANT)
            .apply_movement(&StockMovementRequest::new(&sugar.id, MovementType::Out, 5))
            .await;
        assert!(matches!(
            result,
            Err(DbError::Core(CoreError::InsufficientStock {
                available: 3,
                requested: 5,
                ..
            }))
        ));

        let product = db.products(TENANT).get_by_id(&sugar.id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 3);
        assert!(db.stock(TENANT).history(&sugar.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sale_type_and_bad_quantity_rejected() {
        let db = test_db().await;
        let sugar = seed_product(&db, "Sucre 1kg", 800, 3).await;
        let repo = db.stock(TENANT);

        for request in [
            StockMovementRequest::new(&sugar.id, MovementType::Sale, 1),
            StockMovementRequest::new(&sugar.id, MovementType::In, 0),
        ] {
            assert!(matches!(
                repo.apply_movement(&request).await,
                Err(DbError::Core(CoreError::Validation(_)))
            ));
        }
    }

    #[tokio::test]
    async fn test_foreign_product_not_found() {
        let db = test_db().await;
        let sugar = seed_product(&db, "Sucre 1kg", 800, 3).await;

        let result = db
            .stock(OTHER_TENANT)
            .apply_movement(&StockMovementRequest::new(&sugar.id, MovementType::In, 5))
            .await;
        assert!(matches!(result, Err(DbError::Core(CoreError::ProductNotFound(_)))));
        assert!(db.stock(OTHER_TENANT).list(10).await.unwrap().is_empty());
    }
}

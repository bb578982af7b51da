//! # Catalog Repositories
//!
//! Categories and suppliers: plain per-tenant CRUD. Deleting either leaves
//! its products in place with a null reference.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use boutik_core::validation::{validate_new_category, validate_new_supplier};
use boutik_core::{Category, NewCategory, NewSupplier, Supplier};

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        CategoryRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    pub async fn insert(&self, new: &NewCategory) -> DbResult<Category> {
        validate_new_category(new)?;

        let category = Category {
            id: new_id(),
            tenant_id: self.tenant_id.clone(),
            name: new.name.trim().to_string(),
            description: new.description.clone(),
            icon: new.icon.clone(),
            color: new.color.clone(),
            category_type: new.category_type,
            created_at: Utc::now(),
        };

        debug!(id = %category.id, name = %category.name, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (
                id, tenant_id, name, description, icon, color, category_type, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&category.id)
        .bind(&category.tenant_id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.icon)
        .bind(&category.color)
        .bind(category.category_type)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, tenant_id, name, description, icon, color, category_type, created_at
            FROM categories
            WHERE id = ? AND tenant_id = ?
            "#,
        )
        .bind(id)
        .bind(&self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// All categories sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, tenant_id, name, description, icon, color, category_type, created_at
            FROM categories
            WHERE tenant_id = ?
            ORDER BY name
            "#,
        )
        .bind(&self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn update(&self, id: &str, update: &NewCategory) -> DbResult<Category> {
        validate_new_category(update)?;
        debug!(id = %id, "Updating category");

        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name = ?, description = ?, icon = ?, color = ?, category_type = ?
            WHERE id = ? AND tenant_id = ?
            "#,
        )
        .bind(update.name.trim())
        .bind(&update.description)
        .bind(&update.icon)
        .bind(&update.color)
        .bind(update.category_type)
        .bind(id)
        .bind(&self.tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(&self.tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }
        Ok(())
    }
}

// =============================================================================
// Suppliers
// =============================================================================

const SUPPLIER_COLUMNS: &str = r#"
    id, tenant_id, name, contact_person, phone, email, address, notes,
    created_at, updated_at
"#;

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        SupplierRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    pub async fn insert(&self, new: &NewSupplier) -> DbResult<Supplier> {
        validate_new_supplier(new)?;

        let now = Utc::now();
        let supplier = Supplier {
            id: new_id(),
            tenant_id: self.tenant_id.clone(),
            name: new.name.trim().to_string(),
            contact_person: new.contact_person.clone(),
            phone: new.phone.clone(),
            email: new.email.clone(),
            address: new.address.clone(),
            notes: new.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %supplier.id, name = %supplier.name, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, tenant_id, name, contact_person, phone, email, address, notes,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.tenant_id)
        .bind(&supplier.name)
        .bind(&supplier.contact_person)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(&supplier.notes)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let sql = format!(
            "SELECT {} FROM suppliers WHERE id = ? AND tenant_id = ?",
            SUPPLIER_COLUMNS
        );
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!(
            "SELECT {} FROM suppliers WHERE tenant_id = ? ORDER BY name",
            SUPPLIER_COLUMNS
        );
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    pub async fn update(&self, id: &str, update: &NewSupplier) -> DbResult<Supplier> {
        validate_new_supplier(update)?;
        debug!(id = %id, "Updating supplier");

        let result = sqlx::query(
            r#"
            UPDATE suppliers
            SET name = ?, contact_person = ?, phone = ?, email = ?, address = ?, notes = ?,
                updated_at = ?
            WHERE id = ? AND tenant_id = ?
            "#,
        )
        .bind(update.name.trim())
        .bind(&update.contact_person)
        .bind(&update.phone)
        .bind(&update.email)
        .bind(&update.address)
        .bind(&update.notes)
        .bind(Utc::now())
        .bind(id)
        .bind(&self.tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting supplier");

        let result = sqlx::query("DELETE FROM suppliers WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(&self.tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use boutik_core::{CategoryType, NewProduct};

    #[tokio::test]
    async fn test_category_crud() {
        let db = test_db().await;
        let repo = db.categories(TENANT);

        let created = repo
            .insert(&NewCategory {
                name: "Coiffure".to_string(),
                color: Some("#FF8800".to_string()),
                category_type: CategoryType::Service,
                ..NewCategory::default()
            })
            .await
            .unwrap();
        assert_eq!(created.category_type, CategoryType::Service);

        let updated = repo
            .update(
                &created.id,
                &NewCategory {
                    name: "Salon".to_string(),
                    color: Some("#00AA00".to_string()),
                    category_type: CategoryType::Service,
                    ..NewCategory::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Salon");
        assert_eq!(updated.color.as_deref(), Some("#00AA00"));

        assert_eq!(repo.list().await.unwrap().len(), 1);
        assert!(db.categories(OTHER_TENANT).list().await.unwrap().is_empty());

        repo.delete(&created.id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_category_rejects_bad_color() {
        let db = test_db().await;
        let result = db
            .categories(TENANT)
            .insert(&NewCategory {
                name: "Boissons".to_string(),
                color: Some("red".to_string()),
                ..NewCategory::default()
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_deleting_category_keeps_products() {
        let db = test_db().await;
        let category = db
            .categories(TENANT)
            .insert(&NewCategory {
                name: "Épicerie".to_string(),
                ..NewCategory::default()
            })
            .await
            .unwrap();
        let product = db
            .products(TENANT)
            .insert(&NewProduct {
                name: "Sel".to_string(),
                category_id: Some(category.id.clone()),
                ..NewProduct::default()
            })
            .await
            .unwrap();

        db.categories(TENANT).delete(&category.id).await.unwrap();

        let product = db.products(TENANT).get_by_id(&product.id).await.unwrap().unwrap();
        assert!(product.category_id.is_none());
    }

    #[tokio::test]
    async fn test_supplier_crud() {
        let db = test_db().await;
        let repo = db.suppliers(TENANT);

        let created = repo
            .insert(&NewSupplier {
                name: "Grossiste Dantokpa".to_string(),
                phone: Some("+229 97 12 34 56".to_string()),
                ..NewSupplier::default()
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                &created.id,
                &NewSupplier {
                    name: "Grossiste Dantokpa".to_string(),
                    contact_person: Some("Mme Adjovi".to_string()),
                    ..NewSupplier::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.contact_person.as_deref(), Some("Mme Adjovi"));
        assert!(updated.phone.is_none());

        assert!(repo
            .insert(&NewSupplier {
                name: "X".to_string(),
                phone: Some("call me".to_string()),
                ..NewSupplier::default()
            })
            .await
            .is_err());

        repo.delete(&created.id).await.unwrap();
        assert!(matches!(
            repo.delete(&created.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}

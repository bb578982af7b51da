//! # Repository Module
//!
//! Database repository implementations for Boutik POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and Their Tables                        │
//! │                                                                         │
//! │  db.sales(tenant).record_sale(&request)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleRepository ── one transaction ──► sales, sale_items,              │
//! │                                        products (stock),               │
//! │                                        stock_movements, customers      │
//! │                                                                         │
//! │  PaymentRepository ─ one transaction ─► sales (CAS), customers,        │
//! │                                         payments                       │
//! │                                                                         │
//! │  StockRepository ── one transaction ──► products, stock_movements      │
//! │                                                                         │
//! │  Product / Customer / Category / Supplier / Expense / Settings         │
//! │  Subscription / Plan ──► single-table CRUD                              │
//! │                                                                         │
//! │  ReportRepository ──► read-only folds over sales, sale_items,          │
//! │                       expenses (computed by boutik_core::report)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every repository is bound to one tenant at construction and adds
//! `tenant_id = ?` to each query.

pub mod catalog;
pub mod customer;
pub mod expense;
pub mod payment;
pub mod product;
pub mod report;
pub mod sale;
pub mod settings;
pub mod stock;
pub mod subscription;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::warn;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Generates a new primary key.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Opens a transaction that takes SQLite's write lock up front.
///
/// Concurrent writers queue on `busy_timeout` at `BEGIN` instead of failing
/// halfway when a read lock cannot be upgraded.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Logs a business-rule rejection; storage failures are left to the caller.
pub(crate) fn log_rejection(operation: &str, err: &DbError) {
    if let Some(core) = err.as_core() {
        warn!(operation = operation, error = %core, "Operation rejected");
    }
}

/// Fixtures shared by the repository tests.
#[cfg(test)]
pub(crate) mod test_support {
    use boutik_core::{Customer, Money, NewCustomer, NewProduct, Product, DEFAULT_TENANT_ID};

    use std::path::PathBuf;

    use crate::pool::{Database, DbConfig};

    pub const TENANT: &str = DEFAULT_TENANT_ID;
    pub const OTHER_TENANT: &str = "00000000-0000-0000-0000-000000000002";

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    /// A fresh database file in the temp dir, for tests that need more than
    /// one connection. Remove it with [`remove_file_db`].
    pub async fn file_db(config: impl FnOnce(DbConfig) -> DbConfig) -> (Database, PathBuf) {
        let path = std::env::temp_dir().join(format!("boutik-test-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(config(DbConfig::new(&path)))
            .await
            .expect("file database");
        (db, path)
    }

    pub async fn remove_file_db(db: Database, path: PathBuf) {
        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }

    pub async fn seed_product(db: &Database, name: &str, price: i64, stock: i64) -> Product {
        db.products(TENANT)
            .insert(&NewProduct {
                name: name.to_string(),
                price: Money::from_minor(price),
                stock_quantity: stock,
                ..NewProduct::default()
            })
            .await
            .expect("seed product")
    }

    pub async fn seed_customer(db: &Database, name: &str, credit_limit: i64) -> Customer {
        db.customers(TENANT)
            .insert(&NewCustomer {
                name: name.to_string(),
                credit_limit: Money::from_minor(credit_limit),
                ..NewCustomer::default()
            })
            .await
            .expect("seed customer")
    }
}

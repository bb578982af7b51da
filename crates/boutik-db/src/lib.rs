//! # boutik-db: Database Layer for Boutik POS
//!
//! SQLite storage for Boutik POS, built on sqlx. Every repository is bound
//! to one tenant; every operation touching more than one table runs in a
//! single transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Boutik POS Data Flow                             │
//! │                                                                         │
//! │  Frontend action (checkout, pay balance, restock, report)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    boutik-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ SaleRepo       │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ PaymentRepo    │    │ 001_initial  │  │   │
//! │  │   │ CheckoutPolicy│    │ StockRepo      │    │   _schema    │  │   │
//! │  │   │               │    │ ReportRepo ... │    │              │  │   │
//! │  │   └───────────────┘    └───────┬────────┘    └──────────────┘  │   │
//! │  │                                │ rules                          │   │
//! │  │                                ▼                                │   │
//! │  │                         boutik-core                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           SQLite database (BOUTIK_DB_PATH, WAL mode)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - `BOUTIK_*` environment configuration
//! - [`pool`] - Connection pool creation and repository accessors
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use boutik_db::{Database, StoreConfig};
//!
//! let config = StoreConfig::load()?;
//! let db = Database::new(config.to_db_config())
//!     .await?
//!     .with_checkout_policy(config.checkout_policy());
//!
//! let receipt = db.sales(&config.tenant_id).record_sale(&request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, StoreConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::{CategoryRepository, SupplierRepository};
pub use repository::customer::CustomerRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::payment::PaymentRepository;
pub use repository::product::{ProductFilter, ProductRepository};
pub use repository::report::ReportRepository;
pub use repository::sale::{SaleDetail, SaleRepository};
pub use repository::settings::SettingsRepository;
pub use repository::stock::StockRepository;
pub use repository::subscription::{PlanRepository, SubscriptionRepository};

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,boutik=debug,sqlx=warn";

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` overrides [`DEFAULT_LOG_FILTER`]. Calling it twice is
/// harmless; the second call is ignored.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

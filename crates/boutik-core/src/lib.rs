//! # boutik-core: Pure Business Logic for Boutik POS
//!
//! This crate holds the business rules of the point-of-sale as pure
//! functions with zero I/O dependencies. The database crate calls into it
//! inside its transactions; the web frontend consumes its types through the
//! generated TypeScript bindings.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Boutik POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (React)                             │   │
//! │  │    Catalog ──► Cart ──► Payment dialog ──► Invoice / Reports    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ boutik-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   money · currency · cart · settlement · stock · report         │   │
//! │  │   subscription · export · validation · types                    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   boutik-db (Database Layer)                    │   │
//! │  │        SQLite repositories, one transaction per operation       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, Sale, Customer, Payment, ...)
//! - [`money`] - Integer money in minor units
//! - [`currency`] - Currency table, formatting and parsing
//! - [`cart`] - Interactive cart with stock-aware quantity rules
//! - [`settlement`] - Checkout totals, tender settlement, payment application
//! - [`stock`] - Stock movement rules and the low-stock predicate
//! - [`report`] - Financial summary, cash report and dashboard folds
//! - [`subscription`] - Subscription lifecycle rules
//! - [`export`] - Invoice text and CSV rendering
//! - [`validation`] - Field validators
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use boutik_core::currency::Currency;
//! use boutik_core::money::Money;
//!
//! let total = Money::from_minor(3000);
//! assert_eq!(Currency::Xof.format(total), "3000 FCFA");
//! assert_eq!(Currency::Xof.parse("3000 FCFA").unwrap(), total);
//! ```

pub mod cart;
pub mod currency;
pub mod error;
pub mod export;
pub mod money;
pub mod report;
pub mod settlement;
pub mod stock;
pub mod subscription;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use currency::Currency;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tenant used by the seed binary and single-store deployments.
///
/// Every row carries a `tenant_id` (the owning account); repositories are
/// always constructed for one tenant.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Low-stock threshold applied when a product has no `min_stock_level`.
pub const DEFAULT_MIN_STOCK_LEVEL: i64 = 10;

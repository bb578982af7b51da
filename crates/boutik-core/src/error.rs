//! # Error Types
//!
//! Domain-specific error types for boutik-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  boutik-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  boutik-db errors (separate crate)                                     │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → frontend notification   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every business rule is checked before the first write of an operation, so
//! a `CoreError` never leaves partially applied state behind.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product does not exist for this tenant (or was deleted).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Customer does not exist for this tenant.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Sale does not exist for this tenant.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Insufficient stock to complete a sale or an outbound movement.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Riz 5kg", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Stock insuffisant"
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Checkout was attempted with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Product is not part of the cart.
    #[error("Product {0} not in cart")]
    ProductNotInCart(String),

    /// Tendered or applied amount is invalid (zero, negative, overdraw).
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Sale has no remaining balance to pay.
    #[error("Sale {0} is already fully paid")]
    SaleAlreadySettled(String),

    /// A sale leaving a balance must be linked to a customer.
    #[error("A customer is required for credit or partial payment")]
    CustomerRequired,

    /// Sale would push the customer's outstanding credit above the limit.
    #[error("Credit limit exceeded for {customer}: limit {limit}, would owe {requested}")]
    CreditLimitExceeded {
        customer: String,
        limit: i64,
        requested: i64,
    },

    /// Customer still owes money and cannot be deleted.
    #[error("Customer {customer} still owes {outstanding}")]
    OutstandingCredit { customer: String, outstanding: i64 },

    /// Row changed between read and write (compare-and-set lost).
    #[error("{entity} {id} was modified concurrently, retry the operation")]
    ConcurrentModification { entity: String, id: String },

    /// Tenant's subscription does not grant access.
    #[error("Subscription is {status}, access denied")]
    SubscriptionInactive { status: String },

    /// Report range ends before it starts.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: String, end: String },

    /// Monetary arithmetic overflowed i64 minor units.
    #[error("Amount overflow")]
    AmountOverflow,

    /// Rendering an export document failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid colour).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Riz 5kg".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Riz 5kg: available 3, requested 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::TooLong {
            field: "phone".to_string(),
            max: 20,
        };
        assert_eq!(err.to_string(), "phone must be at most 20 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "description".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

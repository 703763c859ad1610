//! Core business logic - framework-agnostic data access, validation and aggregation.
//!
//! Nothing in here knows about Discord. Data-access functions take any `SeaORM`
//! connection so they can run inside a transaction.

/// Spend distribution, budget comparisons, renewal timeline and statistics
pub mod analytics;
/// Category CRUD, cascade delete and default seeding
pub mod category;
/// Key-value preferences and the theme setting
pub mod preference;
/// Subscription CRUD and billing date roll-forward
pub mod subscription;
/// Totals, per-category summaries and display formatting
pub mod summary;
/// Form validation
pub mod validation;

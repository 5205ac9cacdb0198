//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Single-statement methods accept any `PgExecutor`, so callers pass either
//! `&PgPool` or `&mut *tx` from an open transaction. Methods that must run
//! several statements take `&mut PgConnection`.

pub mod case_history_repo;
pub mod case_repo;
pub mod discount_code_repo;
pub mod discount_usage_repo;
pub mod notification_repo;
pub mod payment_repo;
pub mod profile_repo;
pub mod quote_repo;

pub use case_history_repo::CaseHistoryRepo;
pub use case_repo::CaseRepo;
pub use discount_code_repo::DiscountCodeRepo;
pub use discount_usage_repo::DiscountUsageRepo;
pub use notification_repo::NotificationRepo;
pub use payment_repo::PaymentRepo;
pub use profile_repo::ProfileRepo;
pub use quote_repo::QuoteRepo;

//! Service implementations.
//!
//! Each service holds the shared [`AppState`](crate::AppState) and exposes
//! typed operations. Callers authenticate first and pass the resulting
//! [`Identity`](billing_core::Identity).

pub mod auth_service;
pub mod dashboard_service;
pub mod product_service;
pub mod receipt_service;
pub mod scheduler_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use dashboard_service::DashboardService;
pub use product_service::ProductService;
pub use receipt_service::ReceiptService;
pub use scheduler_service::SchedulerService;
pub use user_service::UserService;

//! # Repository Module
//!
//! Database repository implementations for the billing backend.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Service call                                                           │
//! │       │                                                                 │
//! │       │  db.receipts().find_receipts(&filter)                          │
//! │       ▼                                                                 │
//! │  ReceiptRepository                                                     │
//! │  ├── create(&self, request, created_by, policy)   (one transaction)    │
//! │  ├── get_by_id / get_by_number                                         │
//! │  ├── list(&self, page, created_by)                                     │
//! │  ├── find_receipts(&self, filter)  ──► dashboard engine input          │
//! │  └── soft_delete(&self, id)                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Reads never return soft-deleted rows.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Accounts and credentials
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD
//! - [`ReceiptRepository`](receipt::ReceiptRepository) - Receipts and items

pub mod product;
pub mod receipt;
pub mod user;

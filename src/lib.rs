pub mod api;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;
pub mod storage;

pub use application::{AccountService, AppError};
pub use domain::*;
pub use storage::{InMemoryStore, LedgerStore, PgLedgerStore, StoreError};

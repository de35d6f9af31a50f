// Application layer: input validation and orchestration between the
// request boundary and the ledger store. No transactional logic lives here.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;

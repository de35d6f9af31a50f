mod account;
mod error;
mod ledger;
mod money;
mod transfer;

pub use account::*;
pub use error::*;
pub use ledger::*;
pub use money::*;
pub use transfer::*;

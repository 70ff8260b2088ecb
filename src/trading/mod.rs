pub mod ledger;
pub mod position;
pub mod reconcile;
pub mod scan;
pub mod store;

pub use ledger::PositionLedger;
pub use position::Position;
pub use store::{JsonFileStore, MemoryStore, PositionStore};

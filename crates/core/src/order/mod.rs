mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteOrderStore;
pub use store::{OrderError, OrderStore, UpsertOrderRequest};
pub use types::*;

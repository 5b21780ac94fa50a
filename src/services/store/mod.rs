pub mod client;
pub mod memory;
pub mod postgres;

pub use client::{DocumentStore, Query, Sort, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;

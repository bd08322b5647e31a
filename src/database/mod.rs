pub mod postgres_service;
pub mod property_store;
pub mod redis_manager;

pub use postgres_service::{DatabaseError, DatabaseService};
pub use property_store::{PgPropertyStore, PropertyStore, StoreError};
pub use redis_manager::{KeyValueCache, RedisService};
